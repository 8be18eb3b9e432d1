use std::sync::Arc;

use actix_web::{dev::Payload, http::header::HeaderValue, web, FromRequest, HttpRequest};
use chrono::Utc;
use futures::future::{ready, Ready};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    credentials::{PasswordHasher, TokenSigner},
    error::AppError,
    schemas::{new_id, User, UserId},
    state::AppState,
    store::{Store, StoreError},
};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User exists")]
    DuplicateEmail,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid token")]
    InvalidToken,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => AuthError::DuplicateEmail,
            other => AuthError::Store(other),
        }
    }
}

pub struct AuthService {
    store: Arc<dyn Store>,
    signer: TokenSigner,
    hasher: PasswordHasher,
    // Verified against when the email is unknown
    dummy_hash: String,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, signer: TokenSigner, hasher: PasswordHasher) -> Self {
        let dummy_hash = hasher.hash(&new_id());
        AuthService {
            store,
            signer,
            hasher,
            dummy_hash,
        }
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<(), AuthError> {
        if self.store.find_user_by_email(email).await?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }
        let password = password.to_owned();
        let hasher = self.hasher;
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|err| AuthError::Hashing(err.to_string()))?;
        let user = User {
            id: new_id(),
            email: email.to_owned(),
            password_hash,
        };
        // The store's unique email check settles registrations racing past the lookup
        self.store.insert_user(&user).await?;
        info!(user_id = %user.id, "user registered");
        Ok(())
    }

    /// Returns a fresh token for the user.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let user = self.store.find_user_by_email(email).await?;
        let stored = match &user {
            Some(user) => user.password_hash.clone(),
            None => self.dummy_hash.clone(),
        };
        let matches = self.check_password(password, stored).await?;
        match user {
            Some(user) if matches => Ok(self.signer.issue(&user.id, Utc::now())),
            Some(user) => {
                warn!(user_id = %user.id, "login with wrong password");
                Err(AuthError::InvalidCredentials)
            }
            None => {
                warn!("login for unknown email");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    async fn check_password(&self, password: &str, stored: String) -> Result<bool, AuthError> {
        let password = password.to_owned();
        let hasher = self.hasher;
        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
            .await
            .map_err(|err| AuthError::Hashing(err.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        self.signer
            .verify(token, Utc::now())
            .map_err(|_| AuthError::InvalidToken)
    }
}

/// The user behind the request's token. Handlers taking a `Caller` reject unauthenticated requests.
#[derive(Debug, Clone, PartialEq)]
pub struct Caller(pub UserId);

impl FromRequest for Caller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(request: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(resolve_caller(request))
    }
}

fn resolve_caller(request: &HttpRequest) -> Result<Caller, AppError> {
    let token = request
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .map(HeaderValue::to_str)
        .and_then(Result::ok)
        .map(|value| value.trim())
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value))
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::InvalidToken)?;
    let state = request
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("application state is not configured".to_owned()))?;
    Ok(Caller(state.auth.verify(token)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use rstest::{fixture, rstest};

    #[fixture]
    fn service() -> AuthService {
        AuthService::new(
            Arc::new(MemoryStore::new()),
            TokenSigner::new("secret", None),
            PasswordHasher::new(1_000),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn register_then_login(service: AuthService) {
        service.register("alice@x.com", "pw1").await.unwrap();
        let token = service.login("alice@x.com", "pw1").await.unwrap();
        let user_id = service.verify(&token).unwrap();
        assert_eq!(user_id.len(), 24);
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_email_is_rejected(service: AuthService) {
        service.register("alice@x.com", "pw1").await.unwrap();
        let err = service.register("alice@x.com", "other").await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));
    }

    #[rstest]
    #[case("bob@x.com", "pw1")]
    #[case("alice@x.com", "wrong")]
    #[tokio::test]
    async fn bad_credentials_are_rejected(
        service: AuthService,
        #[case] email: &str,
        #[case] password: &str,
    ) {
        service.register("alice@x.com", "pw1").await.unwrap();
        let err = service.login(email, password).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[rstest]
    fn dummy_hash_uses_configured_rounds(service: AuthService) {
        let rounds = format!("pbkdf2-sha256${}$", service.hasher.rounds());
        assert!(service.dummy_hash.starts_with(&rounds));
        assert!(!service.hasher.verify("", &service.dummy_hash));
    }

    #[rstest]
    #[tokio::test]
    async fn stored_hashes_use_configured_rounds(service: AuthService) {
        service.register("alice@x.com", "pw1").await.unwrap();
        let user = service
            .store
            .find_user_by_email("alice@x.com")
            .await
            .unwrap()
            .unwrap();
        assert!(user.password_hash.starts_with("pbkdf2-sha256$1000$"));
    }

    #[rstest]
    fn garbage_token_is_invalid(service: AuthService) {
        assert!(matches!(
            service.verify("not-a-token"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn duplicate_store_error_means_duplicate_email() {
        assert!(matches!(
            AuthError::from(StoreError::Duplicate),
            AuthError::DuplicateEmail
        ));
        assert!(matches!(
            AuthError::from(StoreError::Unavailable("down".to_owned())),
            AuthError::Store(_)
        ));
    }
}

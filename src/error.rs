use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::{auth::AuthError, membership::MembershipError, store::StoreError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Membership(#[from] MembershipError),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    msg: String,
}

impl AppError {
    /// Stable machine-readable code sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Auth(AuthError::DuplicateEmail) => "duplicate_email",
            AppError::Auth(AuthError::InvalidCredentials) => "invalid_credentials",
            AppError::Auth(AuthError::InvalidToken) => "invalid_token",
            AppError::Membership(MembershipError::TripNotFound) => "trip_not_found",
            AppError::Membership(MembershipError::ActivityNotFound) => "activity_not_found",
            AppError::Membership(MembershipError::NotAuthorized) => "not_authorized",
            AppError::Validation(_) => "validation_error",
            AppError::Auth(AuthError::Store(_)) | AppError::Membership(MembershipError::Store(_)) => {
                "store_unavailable"
            }
            AppError::Auth(AuthError::Hashing(_)) | AppError::Internal(_) => "internal_error",
        }
    }

    fn store_error(&self) -> Option<&StoreError> {
        match self {
            AppError::Auth(AuthError::Store(err))
            | AppError::Membership(MembershipError::Store(err)) => Some(err),
            _ => None,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(AuthError::DuplicateEmail | AuthError::InvalidCredentials)
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(AuthError::InvalidToken) => StatusCode::UNAUTHORIZED,
            AppError::Membership(MembershipError::NotAuthorized) => StatusCode::FORBIDDEN,
            AppError::Membership(
                MembershipError::TripNotFound | MembershipError::ActivityNotFound,
            ) => StatusCode::NOT_FOUND,
            AppError::Auth(AuthError::Store(_) | AuthError::Hashing(_))
            | AppError::Membership(MembershipError::Store(_))
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        // Internal details stay in the logs
        let msg = if status.is_server_error() {
            error!(error = %self, code = self.code(), "request failed");
            match self.store_error() {
                Some(_) => "Store unavailable, try again later".to_owned(),
                None => "Internal server error".to_owned(),
            }
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(ErrorBody {
            code: self.code(),
            msg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use rstest::rstest;
    use serde_json::Value;

    #[rstest]
    #[case(AuthError::DuplicateEmail.into(), StatusCode::BAD_REQUEST, "duplicate_email")]
    #[case(AuthError::InvalidCredentials.into(), StatusCode::BAD_REQUEST, "invalid_credentials")]
    #[case(AuthError::InvalidToken.into(), StatusCode::UNAUTHORIZED, "invalid_token")]
    #[case(MembershipError::NotAuthorized.into(), StatusCode::FORBIDDEN, "not_authorized")]
    #[case(MembershipError::TripNotFound.into(), StatusCode::NOT_FOUND, "trip_not_found")]
    #[case(MembershipError::ActivityNotFound.into(), StatusCode::NOT_FOUND, "activity_not_found")]
    #[case(AppError::Validation("name is required".to_owned()), StatusCode::BAD_REQUEST, "validation_error")]
    #[case(
        MembershipError::Store(StoreError::Unavailable("down".to_owned())).into(),
        StatusCode::INTERNAL_SERVER_ERROR,
        "store_unavailable"
    )]
    fn maps_errors_to_status_and_code(
        #[case] err: AppError,
        #[case] status: StatusCode,
        #[case] code: &str,
    ) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.code(), code);
    }

    #[actix_web::test]
    async fn body_carries_code_and_message() {
        let response = AppError::from(MembershipError::TripNotFound).error_response();
        let body: Value = serde_json::from_slice(&to_bytes(response.into_body()).await.unwrap())
            .unwrap();
        assert_eq!(body["code"], "trip_not_found");
        assert_eq!(body["msg"], "Trip not found");
    }

    #[actix_web::test]
    async fn store_faults_hide_driver_details() {
        let err = AppError::from(AuthError::Store(StoreError::Unavailable(
            "connection refused to 10.0.0.3".to_owned(),
        )));
        let body: Value =
            serde_json::from_slice(&to_bytes(err.error_response().into_body()).await.unwrap())
                .unwrap();
        assert_eq!(body["code"], "store_unavailable");
        assert_eq!(body["msg"], "Store unavailable, try again later");
    }
}

//! Runs against a live server when `PLANIT_TEST_MONGODB_URI` is set, and
//! passes trivially otherwise. Each test works in its own throwaway database.

use std::sync::Arc;

use planit::{
    auth::{AuthError, AuthService},
    credentials::{PasswordHasher, TokenSigner},
    schemas::{new_id, User},
    store::{mongo::MongoStore, Store, StoreError, UserStore},
};

struct Scratch {
    uri: String,
    database: String,
    store: MongoStore,
}

impl Scratch {
    async fn discard(self) {
        self.store.close().await;
        let client = mongodb::Client::with_uri_str(&self.uri).await.unwrap();
        client.database(&self.database).drop(None).await.unwrap();
        client.shutdown().await;
    }
}

async fn scratch() -> Option<Scratch> {
    let Ok(uri) = std::env::var("PLANIT_TEST_MONGODB_URI") else {
        eprintln!("PLANIT_TEST_MONGODB_URI not set, skipping");
        return None;
    };
    let database = format!("planit_test_{}", new_id());
    let store = MongoStore::connect(&uri, &database).await.unwrap();
    Some(Scratch {
        uri,
        database,
        store,
    })
}

fn user(email: &str) -> User {
    User {
        id: new_id(),
        email: email.to_owned(),
        password_hash: "x".to_owned(),
    }
}

#[tokio::test]
async fn second_insert_with_same_email_is_a_duplicate() {
    let Some(scratch) = scratch().await else {
        return;
    };
    scratch.store.insert_user(&user("alice@x.com")).await.unwrap();
    let err = scratch
        .store
        .insert_user(&user("alice@x.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate), "got {err:?}");

    scratch.store.insert_user(&user("bob@x.com")).await.unwrap();
    scratch.discard().await;
}

#[tokio::test]
async fn racing_registrations_yield_one_user() {
    let Some(scratch) = scratch().await else {
        return;
    };
    let store = Arc::new(
        MongoStore::connect(&scratch.uri, &scratch.database)
            .await
            .unwrap(),
    );
    let auth = Arc::new(AuthService::new(
        store.clone(),
        TokenSigner::new("secret", None),
        PasswordHasher::new(1_000),
    ));

    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let auth = auth.clone();
            tokio::spawn(async move { auth.register("carol@x.com", "pw1").await })
        })
        .collect();
    let mut registered = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(()) => registered += 1,
            Err(AuthError::DuplicateEmail) => {}
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }
    assert_eq!(registered, 1);

    store.close().await;
    scratch.discard().await;
}

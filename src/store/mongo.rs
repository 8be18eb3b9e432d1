use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    error::{ErrorKind, WriteError, WriteFailure},
    options::IndexOptions,
    Client, Collection, Database, IndexModel,
};
use tracing::{error, info};

use super::{Store, StoreError, TripStore, UserStore};
use crate::schemas::{Trip, User};

const DUPLICATE_KEY: i32 = 11000;

pub struct MongoStore {
    client: Client,
    database: Database,
}

impl MongoStore {
    /// Connects, checks the server answers and makes sure emails are unique.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await.map_err(unavailable)?;
        let store = MongoStore {
            database: client.database(database),
            client,
        };
        store.ping().await?;

        let unique_email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        store
            .users()
            .create_index(unique_email, None)
            .await
            .map_err(unavailable)?;

        info!(database, "connected to MongoDB");
        Ok(store)
    }

    fn users(&self) -> Collection<User> {
        self.database.collection("Users")
    }

    fn trips(&self) -> Collection<Trip> {
        self.database.collection("Trips")
    }
}

fn unavailable(err: mongodb::error::Error) -> StoreError {
    error!(error = %err, "MongoDB operation failed");
    StoreError::Unavailable(err.to_string())
}

fn map_insert_error(err: mongodb::error::Error) -> StoreError {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(WriteError {
            code: DUPLICATE_KEY,
            ..
        })) => StoreError::Duplicate,
        _ => unavailable(err),
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.users()
            .insert_one(user, None)
            .await
            .map_err(map_insert_error)?;
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.users()
            .find_one(doc! { "email": email }, None)
            .await
            .map_err(unavailable)
    }
}

#[async_trait]
impl TripStore for MongoStore {
    async fn insert_trip(&self, trip: &Trip) -> Result<(), StoreError> {
        self.trips()
            .insert_one(trip, None)
            .await
            .map_err(map_insert_error)?;
        Ok(())
    }

    async fn find_trip(&self, id: &str) -> Result<Option<Trip>, StoreError> {
        self.trips()
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(unavailable)
    }

    async fn trips_for_participant(&self, user: &str) -> Result<Vec<Trip>, StoreError> {
        let cursor = self
            .trips()
            .find(doc! { "participants": user }, None)
            .await
            .map_err(unavailable)?;
        cursor.try_collect().await.map_err(unavailable)
    }

    async fn save_trip(&self, trip: &Trip) -> Result<(), StoreError> {
        let result = self
            .trips()
            .replace_one(doc! { "_id": trip.id.as_str() }, trip, None)
            .await
            .map_err(unavailable)?;
        if result.matched_count == 0 {
            return Err(StoreError::Unavailable(format!(
                "trip {} vanished before save",
                trip.id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.database
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
        info!("MongoDB connection closed");
    }
}

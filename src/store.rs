//! Persistence seams for users and trips.
//!
//! Trips are stored as whole documents with their activities and votes
//! embedded, so a trip is the unit of mutation.

use async_trait::async_trait;
use thiserror::Error;

use crate::schemas::{Trip, User};

pub mod memory;
pub mod mongo;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("document already exists")]
    Duplicate,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the email is taken.
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait TripStore: Send + Sync {
    async fn insert_trip(&self, trip: &Trip) -> Result<(), StoreError>;

    async fn find_trip(&self, id: &str) -> Result<Option<Trip>, StoreError>;

    /// Trips the user participates in, in insertion order.
    async fn trips_for_participant(&self, user: &str) -> Result<Vec<Trip>, StoreError>;

    /// Replaces the stored document with the same id.
    async fn save_trip(&self, trip: &Trip) -> Result<(), StoreError>;
}

/// A backing store holding both collections, with a connection lifecycle.
#[async_trait]
pub trait Store: UserStore + TripStore {
    async fn ping(&self) -> Result<(), StoreError>;

    async fn close(&self);
}

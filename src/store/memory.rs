use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Store, StoreError, TripStore, UserStore};
use crate::schemas::{Trip, User};

/// Keeps everything in process memory. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    trips: RwLock<Vec<Trip>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate);
        }
        users.push(user.clone());
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl TripStore for MemoryStore {
    async fn insert_trip(&self, trip: &Trip) -> Result<(), StoreError> {
        let mut trips = self.trips.write().await;
        if trips.iter().any(|t| t.id == trip.id) {
            return Err(StoreError::Duplicate);
        }
        trips.push(trip.clone());
        Ok(())
    }

    async fn find_trip(&self, id: &str) -> Result<Option<Trip>, StoreError> {
        let trips = self.trips.read().await;
        Ok(trips.iter().find(|t| t.id == id).cloned())
    }

    async fn trips_for_participant(&self, user: &str) -> Result<Vec<Trip>, StoreError> {
        let trips = self.trips.read().await;
        Ok(trips
            .iter()
            .filter(|t| t.is_participant(user))
            .cloned()
            .collect())
    }

    async fn save_trip(&self, trip: &Trip) -> Result<(), StoreError> {
        let mut trips = self.trips.write().await;
        match trips.iter_mut().find(|t| t.id == trip.id) {
            Some(stored) => {
                *stored = trip.clone();
                Ok(())
            }
            None => Err(StoreError::Unavailable(format!(
                "trip {} vanished before save",
                trip.id
            ))),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn trip(creator: &str) -> Trip {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Trip::new(creator.to_owned(), "Trip".to_owned(), day, day, None)
    }

    #[tokio::test]
    async fn rejects_second_user_with_same_email() {
        let store = MemoryStore::new();
        let user = User {
            id: "1".to_owned(),
            email: "alice@x.com".to_owned(),
            password_hash: "h".to_owned(),
        };
        store.insert_user(&user).await.unwrap();
        let again = User {
            id: "2".to_owned(),
            ..user
        };
        assert!(matches!(
            store.insert_user(&again).await,
            Err(StoreError::Duplicate)
        ));
    }

    #[tokio::test]
    async fn lists_only_trips_the_user_participates_in() {
        let store = MemoryStore::new();
        let first = trip("alice");
        let second = trip("bob");
        let mut third = trip("carol");
        third.add_participant("alice");
        for t in [&first, &second, &third] {
            store.insert_trip(t).await.unwrap();
        }

        let ids: Vec<_> = store
            .trips_for_participant("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![first.id, third.id]);
    }

    #[tokio::test]
    async fn save_replaces_stored_trip() {
        let store = MemoryStore::new();
        let mut t = trip("alice");
        store.insert_trip(&t).await.unwrap();
        t.add_participant("bob");
        store.save_trip(&t).await.unwrap();

        let stored = store.find_trip(&t.id).await.unwrap().unwrap();
        assert_eq!(stored.participant_ids, vec!["alice", "bob"]);
    }
}

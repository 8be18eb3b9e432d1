//! Trip membership and activity voting rules.
//!
//! Every mutation of an existing trip loads the whole document, changes it
//! and writes it back while holding that trip's lock from [`TripLocks`], so
//! concurrent joins or votes on one trip cannot lose each other's updates.

use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    locks::TripLocks,
    schemas::{Activity, Category, IndexedActivity, Trip},
    store::{Store, StoreError},
};

#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("Trip not found")]
    TripNotFound,
    #[error("Activity not found")]
    ActivityNotFound,
    #[error("Not authorized")]
    NotAuthorized,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewTrip {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub budget: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewActivity {
    pub title: String,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub category: Category,
    pub estimated_cost: Option<f64>,
    pub notes: Option<String>,
}

pub struct TripService {
    store: Arc<dyn Store>,
    locks: TripLocks,
}

impl TripService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        TripService {
            store,
            locks: TripLocks::new(),
        }
    }

    pub async fn create_trip(&self, caller: &str, new: NewTrip) -> Result<Trip, MembershipError> {
        let trip = Trip::new(
            caller.to_owned(),
            new.name,
            new.start_date,
            new.end_date,
            new.budget,
        );
        self.store.insert_trip(&trip).await?;
        info!(trip_id = %trip.id, user_id = caller, "trip created");
        Ok(trip)
    }

    pub async fn list_trips(&self, caller: &str) -> Result<Vec<Trip>, MembershipError> {
        Ok(self.store.trips_for_participant(caller).await?)
    }

    /// Joining a trip the caller already belongs to changes nothing.
    pub async fn join_trip(&self, caller: &str, trip_id: &str) -> Result<Trip, MembershipError> {
        let _guard = self.locks.lock(trip_id).await;
        let mut trip = self.load(trip_id).await?;
        if trip.add_participant(caller) {
            self.store.save_trip(&trip).await?;
            info!(trip_id, user_id = caller, "joined trip");
        }
        Ok(trip)
    }

    pub async fn add_activity(
        &self,
        caller: &str,
        trip_id: &str,
        new: NewActivity,
    ) -> Result<Activity, MembershipError> {
        let _guard = self.locks.lock(trip_id).await;
        let mut trip = self.load_as_participant(caller, trip_id).await?;
        let activity = Activity {
            title: new.title,
            date: new.date,
            time: new.time,
            category: new.category,
            estimated_cost: new.estimated_cost,
            notes: new.notes,
            votes: vec![],
        };
        trip.activities.push(activity.clone());
        self.store.save_trip(&trip).await?;
        info!(
            trip_id,
            user_id = caller,
            index = trip.activities.len() - 1,
            "activity added"
        );
        Ok(activity)
    }

    /// Activities ordered by date, ties in the order they were proposed.
    pub async fn list_activities(
        &self,
        caller: &str,
        trip_id: &str,
    ) -> Result<Vec<IndexedActivity>, MembershipError> {
        let trip = self.load_as_participant(caller, trip_id).await?;
        let mut activities: Vec<_> = trip
            .activities
            .into_iter()
            .enumerate()
            .map(|(index, activity)| IndexedActivity { index, activity })
            .collect();
        activities.sort_by_key(|a| a.activity.date);
        Ok(activities)
    }

    pub async fn toggle_vote(
        &self,
        caller: &str,
        trip_id: &str,
        index: usize,
    ) -> Result<Activity, MembershipError> {
        let _guard = self.locks.lock(trip_id).await;
        let mut trip = self.load_as_participant(caller, trip_id).await?;
        let activity = trip
            .activities
            .get_mut(index)
            .ok_or(MembershipError::ActivityNotFound)?;
        let voted = activity.toggle_vote(caller);
        let activity = activity.clone();
        self.store.save_trip(&trip).await?;
        debug!(trip_id, user_id = caller, index, voted, "vote toggled");
        Ok(activity)
    }

    async fn load(&self, trip_id: &str) -> Result<Trip, MembershipError> {
        self.store
            .find_trip(trip_id)
            .await?
            .ok_or(MembershipError::TripNotFound)
    }

    async fn load_as_participant(
        &self,
        caller: &str,
        trip_id: &str,
    ) -> Result<Trip, MembershipError> {
        let trip = self.load(trip_id).await?;
        if !trip.is_participant(caller) {
            return Err(MembershipError::NotAuthorized);
        }
        Ok(trip)
    }
}

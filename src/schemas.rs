use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type UserId = String;
pub type TripId = String;

/// Fresh document id, the same shape MongoDB would assign.
pub fn new_id() -> String {
    bson::oid::ObjectId::new().to_hex()
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub email: String,
    #[serde(rename = "password")]
    pub password_hash: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    #[serde(rename = "_id")]
    pub id: TripId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(rename = "creator")]
    pub creator_id: UserId,
    // The creator always sits at index 0
    #[serde(rename = "participants")]
    pub participant_ids: Vec<UserId>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

impl Trip {
    pub fn new(
        creator: UserId,
        name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        budget: Option<f64>,
    ) -> Self {
        Trip {
            id: new_id(),
            name,
            start_date,
            end_date,
            budget,
            creator_id: creator.clone(),
            participant_ids: vec![creator],
            activities: vec![],
        }
    }

    pub fn is_participant(&self, user: &str) -> bool {
        self.participant_ids.iter().any(|id| id == user)
    }

    /// Returns false when the user was already in the trip.
    pub fn add_participant(&mut self, user: &str) -> bool {
        if self.is_participant(user) {
            return false;
        }
        self.participant_ids.push(user.to_owned());
        true
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum Category {
    Adventure,
    Food,
    Sightseeing,
    Other,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub title: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub votes: Vec<UserId>,
}

impl Activity {
    pub fn has_vote(&self, user: &str) -> bool {
        self.votes.iter().any(|id| id == user)
    }

    /// Flips the user's vote. Returns true when the user now votes for the activity.
    pub fn toggle_vote(&mut self, user: &str) -> bool {
        if self.has_vote(user) {
            self.votes.retain(|id| id != user);
            false
        } else {
            self.votes.push(user.to_owned());
            true
        }
    }
}

/// An activity as listed to clients, carrying the position it is addressed by when voting.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct IndexedActivity {
    pub index: usize,
    #[serde(flatten)]
    pub activity: Activity,
}

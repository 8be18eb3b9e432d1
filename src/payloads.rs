//! Request bodies as clients send them, and their validation into domain inputs.
//!
//! Fields are optional at the serde layer so a missing field surfaces as a
//! `validation_error` naming the field rather than a generic parse failure.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    error::AppError,
    membership::{NewActivity, NewTrip},
    schemas::Category,
};

/// Amounts arrive as numbers or, from form inputs, as strings.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CredentialsPayload {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripPayload {
    pub name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub budget: Option<Amount>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct JoinPayload {
    pub code: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPayload {
    pub title: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub category: Option<String>,
    pub estimated_cost: Option<Amount>,
    pub notes: Option<String>,
}

pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl CredentialsPayload {
    pub fn validate(self) -> Result<Credentials, AppError> {
        let email = required("email", self.email)?.to_lowercase();
        // Blank passwords are rejected, others are kept exactly as typed
        let password = match self.password {
            Some(password) if !password.trim().is_empty() => password,
            _ => return Err(missing("password")),
        };
        Ok(Credentials { email, password })
    }
}

impl TripPayload {
    pub fn validate(self) -> Result<NewTrip, AppError> {
        Ok(NewTrip {
            name: required("name", self.name)?,
            start_date: date("startDate", self.start_date)?,
            end_date: date("endDate", self.end_date)?,
            budget: amount("budget", self.budget)?,
        })
    }
}

impl JoinPayload {
    pub fn validate(self) -> Result<String, AppError> {
        required("code", self.code)
    }
}

impl ActivityPayload {
    pub fn validate(self) -> Result<NewActivity, AppError> {
        let category = match required("category", self.category)?.as_str() {
            "Adventure" => Category::Adventure,
            "Food" => Category::Food,
            "Sightseeing" => Category::Sightseeing,
            "Other" => Category::Other,
            other => {
                return Err(AppError::Validation(format!(
                    "category must be one of Adventure, Food, Sightseeing, Other, got {other:?}"
                )))
            }
        };
        Ok(NewActivity {
            title: required("title", self.title)?,
            date: date("date", self.date)?,
            time: optional(self.time),
            category,
            estimated_cost: amount("estimatedCost", self.estimated_cost)?,
            notes: optional(self.notes),
        })
    }
}

fn missing(field: &str) -> AppError {
    AppError::Validation(format!("{field} is required"))
}

fn required(field: &str, value: Option<String>) -> Result<String, AppError> {
    optional(value).ok_or_else(|| missing(field))
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn date(field: &str, value: Option<String>) -> Result<NaiveDate, AppError> {
    let value = required(field, value)?;
    NaiveDate::parse_from_str(&value, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("{field} must be a YYYY-MM-DD date")))
}

fn amount(field: &str, value: Option<Amount>) -> Result<Option<f64>, AppError> {
    let number = match value {
        None => return Ok(None),
        Some(Amount::Number(n)) => n,
        Some(Amount::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<f64>()
                .map_err(|_| AppError::Validation(format!("{field} must be a number")))?
        }
    };
    if !number.is_finite() || number < 0.0 {
        return Err(AppError::Validation(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(Some(number))
}

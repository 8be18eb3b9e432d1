//! PlanIt backend: users plan trips together, propose activities and vote on them.

pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod locks;
pub mod membership;
pub mod payloads;
pub mod routes;
pub mod schemas;
pub mod state;
pub mod store;

//! Roster API Server module
//!
//! HTTP REST API over the roster queries.
//! Run with `roster-server`.

pub mod handlers;
pub mod server;

pub use server::{router, run_api_server};

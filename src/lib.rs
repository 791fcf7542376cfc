//! Client for the MindSync task service.
//!
//! [`store::TaskStore`] keeps the signed-in user's tasks in sync with the
//! server through [`api::TaskApi`]; [`grouping`] sorts them into display
//! buckets and [`editor::TaskForm`] turns form input into requests.

pub mod api;
pub mod auth;
pub mod config;
pub mod editor;
pub mod error;
pub mod grouping;
pub mod models;
pub mod parser;
pub mod session;
pub mod store;

pub use error::{Error, Result};

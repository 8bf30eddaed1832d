//! HTTP request handlers for the fleet manager API.
//!
//! This module is organized by domain:
//! - `common` - Shared response envelope and error mapping
//! - `jobs` - Deferred task creation, listing, cancellation and history
//! - `containers` - Live status listings and immediate actions

pub mod common;
pub mod containers;
pub mod jobs;

pub use containers::*;
pub use jobs::*;

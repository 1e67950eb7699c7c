//! compact-http - Compact HTTP/1.1 client engine
//!
//! Drives single requests over a cooperative, callback-driven transport while
//! presenting a blocking call to the caller. Every phase of a request is
//! bounded by a time budget.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;

pub use client::{Connection, ResponseSink};
pub use config::Config;
pub use error::{HttpApiError, Result};

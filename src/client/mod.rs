//! Request engine.
//!
//! A [`Connection`] owns the transport and credentials for one host and runs
//! requests through an [`exchange`] state machine. The engine is synchronous
//! from the caller's point of view: it sleeps and pumps the transport until
//! each phase completes or runs out of budget.

pub mod accumulator;
pub mod connection;
pub mod events;
pub mod exchange;
pub mod options;
pub mod poll;

pub use connection::Connection;
pub use exchange::{Exchange, Phase, ResponseSink};
pub use options::{Credentials, OptionName};

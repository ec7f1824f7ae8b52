//! Shared wire objects and HTTP client for the fin-track services.
//!
//! The `objects` module holds the JSON shapes exchanged between the ledger
//! API, the analytics side and the event channel. The `client` module
//! (behind the `client` cargo feature) is a typed `reqwest` client for the
//! ledger API.

pub mod objects;

#[cfg(feature = "client")]
pub mod client;

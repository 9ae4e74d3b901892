//! Persistence-facing traits for the event log (component C) and identity
//! verification (component D), plus reference implementations suitable for
//! tests and a standalone `holomush-cli serve --in-memory` mode.

pub mod credential_verifier;
pub mod error;
pub mod event_store;

pub use credential_verifier::{Authenticated, CredentialVerifier, StaticCredentialVerifier, UnconfiguredVerifier};
pub use error::{Error, Result};
pub use event_store::{EventStore, InMemoryEventStore};

//! # printdesk-store
//!
//! Durable storage for the printdesk order service, backed by flat JSON
//! documents on disk.
//!
//! The crate exposes a generic [`RecordStore`] (one serialized document,
//! atomic replace-on-write, single-writer mutation) and two typed facades
//! built on top of it: [`OrderRepository`] for customer print orders and
//! [`CredentialStore`] for the admin login singleton.

pub mod admin;
pub mod models;
pub mod orders;
pub mod record_store;

mod error;

pub use admin::CredentialStore;
pub use error::StoreError;
pub use models::*;
pub use orders::OrderRepository;
pub use record_store::RecordStore;

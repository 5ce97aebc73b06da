// Migration tool - pedantic lints relaxed for CLI ergonomics
#![allow(clippy::pedantic)]

//! # audience-migrate
//!
//! `audience-migrate` is a CLI tool and library that copies templates,
//! audiences and database connections from one tenant of the REST API to
//! another.
//!
//! ## Flows
//!
//! | Flow | Source calls | Destination calls |
//! |------|--------------|-------------------|
//! | templates | paginated listing, then one detail fetch per template | one create per template |
//! | audiences | paginated listing | one create per audience |
//! | databases | paginated listing, merged with local secrets | one create per merged connection |
//!
//! A failed record is reported and skipped. Only configuration errors stop a run.
//!
//! ## Quick Start
//!
//! ```bash
//! audience-migrate --config migration.yaml
//!
//! # Read everything, create nothing
//! audience-migrate --config migration.yaml --dry-run
//! ```
//!
//! ## Configuration Example
//!
//! ```yaml
//! source:
//!   url: https://api.source.example.com/
//!   ApiKey: source-api-key
//!   CustomerId: source-customer
//!
//! destination:
//!   url: https://api.destination.example.com/
//!   ApiKey: destination-api-key
//!   CustomerId: destination-customer
//!
//! databases:
//!   - name: warehouse
//!     host: warehouse.internal
//!     port: 5432
//!     user: etl
//!     password: secret
//!
//! migrating:
//!   templates: true
//!   audiences: true
//!   databases: true
//! ```

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod paginator;
pub mod pipeline;
pub mod reconcile;
pub mod records;

#[cfg(test)]
mod testing;

pub use crate::client::{ApiClient, RestApi};
pub use crate::config::{ConnectionSecrets, MigrationConfig, MigrationFlags, RawConfig};
pub use crate::endpoint::{Record, ResourceKind};
pub use crate::error::{Error, Result};
pub use crate::paginator::{fetch_all, Page, PageRequest};
pub use crate::pipeline::{FlowReport, MigrationReport, Migrator, Outcome, RecordEvent};
pub use crate::reconcile::reconcile;
pub use crate::records::{create_record, fetch_record};

//! Migration pipeline orchestration.
//!
//! Three flows (templates, audiences, databases) run one after the other, each
//! gated by its flag. Every record yields a [`RecordEvent`]; a failed record
//! never stops its flow, and a flow never affects another.

use std::fmt;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

use crate::client::{ApiClient, RestApi};
use crate::config::{ApiEndpoint, MigrationConfig};
use crate::endpoint::{Record, ResourceKind};
use crate::error::Result;
use crate::paginator::fetch_all;
use crate::reconcile::reconcile;
use crate::records::{create_record, fetch_record};

/// What happened to a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Created at the destination.
    Created,
    /// The detail fetch from the source failed.
    FetchFailed,
    /// The create request failed.
    CreateFailed,
    /// Not created because the run is a dry run.
    Skipped,
}

impl Outcome {
    /// Returns true for failure outcomes.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::FetchFailed | Self::CreateFailed)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Created => "created",
            Self::FetchFailed => "fetch failed",
            Self::CreateFailed => "create failed",
            Self::Skipped => "skipped (dry run)",
        };
        f.write_str(text)
    }
}

/// Per-record result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEvent {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Record identifier (`id` for templates, `name` otherwise).
    pub identifier: String,
    /// What happened.
    pub outcome: Outcome,
}

/// Result of one flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowReport {
    /// Resource kind migrated by this flow.
    pub kind: ResourceKind,
    /// Records returned by the source listing.
    pub listed: usize,
    /// One event per record the flow attempted.
    pub events: Vec<RecordEvent>,
}

impl FlowReport {
    fn new(kind: ResourceKind, listed: usize) -> Self {
        Self {
            kind,
            listed,
            events: Vec::with_capacity(listed),
        }
    }

    fn record(&mut self, identifier: String, outcome: Outcome) {
        match outcome {
            Outcome::Created => {}
            Outcome::Skipped => info!("Dry run: would create {} '{}'", self.kind, identifier),
            Outcome::FetchFailed => warn!("Skipping {} '{}': fetch failed", self.kind, identifier),
            Outcome::CreateFailed => {
                warn!("Skipping {} '{}': create failed", self.kind, identifier)
            }
        }
        self.events.push(RecordEvent {
            kind: self.kind,
            identifier,
            outcome,
        });
    }

    /// Number of events with `outcome`.
    #[must_use]
    pub fn count(&self, outcome: Outcome) -> usize {
        self.events.iter().filter(|e| e.outcome == outcome).count()
    }

    /// Records created at the destination.
    #[must_use]
    pub fn created(&self) -> usize {
        self.count(Outcome::Created)
    }

    /// Records that failed to fetch or create.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.events.iter().filter(|e| e.outcome.is_failure()).count()
    }

    /// Records skipped by a dry run.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(Outcome::Skipped)
    }
}

/// Result of a whole run.
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    /// Reports of the flows that ran, in execution order.
    pub flows: Vec<FlowReport>,
    /// Duration in seconds.
    pub duration_secs: f64,
}

impl MigrationReport {
    /// Report of the flow for `kind`, if it ran.
    #[must_use]
    pub fn flow(&self, kind: ResourceKind) -> Option<&FlowReport> {
        self.flows.iter().find(|f| f.kind == kind)
    }

    /// Every record event of the run, in order.
    pub fn events(&self) -> impl Iterator<Item = &RecordEvent> {
        self.flows.iter().flat_map(|f| f.events.iter())
    }

    /// Total records created.
    #[must_use]
    pub fn created(&self) -> usize {
        self.flows.iter().map(FlowReport::created).sum()
    }

    /// Total records failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.flows.iter().map(FlowReport::failed).sum()
    }

    /// Total records skipped by a dry run.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.flows.iter().map(FlowReport::skipped).sum()
    }
}

/// Drives the migration from a source API to a destination API.
pub struct Migrator<S, D> {
    config: MigrationConfig,
    source: S,
    destination: D,
}

impl Migrator<ApiClient, ApiClient> {
    /// Loads the configuration file and connects HTTP clients to both sides.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file is missing or invalid.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_config(MigrationConfig::from_file(path)?)
    }

    /// Connects HTTP clients to both sides of an already validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if either client cannot be built.
    pub fn from_config(config: MigrationConfig) -> Result<Self> {
        Self::from_config_with(config, |endpoint| ApiClient::new(endpoint.clone()))
    }
}

impl<A: RestApi> Migrator<A, A> {
    /// Loads the configuration file and builds both sides with `connect`.
    ///
    /// `connect` is only called once the configuration has been validated.
    ///
    /// # Errors
    ///
    /// Returns the first configuration or `connect` error.
    pub fn from_file_with<F>(path: &Path, connect: F) -> Result<Self>
    where
        F: FnMut(&ApiEndpoint) -> Result<A>,
    {
        let config = MigrationConfig::from_file(path)?;
        Self::from_config_with(config, connect)
    }

    /// Builds the source then the destination side with `connect`.
    ///
    /// # Errors
    ///
    /// Returns the first `connect` error.
    pub fn from_config_with<F>(config: MigrationConfig, mut connect: F) -> Result<Self>
    where
        F: FnMut(&ApiEndpoint) -> Result<A>,
    {
        let source = connect(&config.source)?;
        let destination = connect(&config.destination)?;
        Ok(Self::new(config, source, destination))
    }
}

impl<S: RestApi, D: RestApi> Migrator<S, D> {
    /// Creates a migrator over already-built API clients.
    pub fn new(config: MigrationConfig, source: S, destination: D) -> Self {
        Self {
            config,
            source,
            destination,
        }
    }

    /// The validated configuration.
    #[must_use]
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Runs every enabled flow in order: templates, audiences, databases.
    pub async fn run(&self) -> MigrationReport {
        let start = Instant::now();
        let flags = self.config.migrating;
        let mut report = MigrationReport::default();

        if flags.is_empty() {
            warn!("No migration flow enabled in the 'migrating' section");
        }
        if self.config.dry_run {
            info!("Dry run mode - not writing to destination");
        }

        if flags.templates {
            report.flows.push(self.migrate_templates().await);
        }
        if flags.audiences {
            report.flows.push(self.migrate_audiences().await);
        }
        if flags.databases {
            report.flows.push(self.migrate_databases().await);
        }

        report.duration_secs = start.elapsed().as_secs_f64();
        info!(
            "Migration complete: {} created, {} failed, {} skipped in {:.2}s",
            report.created(),
            report.failed(),
            report.skipped(),
            report.duration_secs
        );
        report
    }

    /// Lists templates, fetches each one's detail and creates it.
    pub async fn migrate_templates(&self) -> FlowReport {
        let kind = ResourceKind::Templates;
        info!("Fetching templates...");
        let listing = fetch_all(&self.source, kind, &self.config.page_request).await;
        let mut flow = FlowReport::new(kind, listing.len());

        for summary in &listing {
            let Some(id) = kind.identifier(summary) else {
                flow.record(kind.display_id(summary), Outcome::FetchFailed);
                continue;
            };
            info!("Migrating template ID: {}", id);

            let outcome = match fetch_record(&self.source, kind, &id).await {
                Some(detail) => self.submit(kind, &detail).await,
                None => Outcome::FetchFailed,
            };
            flow.record(id, outcome);
        }

        flow
    }

    /// Lists audiences and creates each one as listed.
    pub async fn migrate_audiences(&self) -> FlowReport {
        let kind = ResourceKind::Audiences;
        info!("Fetching audiences...");
        let listing = fetch_all(&self.source, kind, &self.config.page_request).await;
        let mut flow = FlowReport::new(kind, listing.len());

        for audience in &listing {
            let name = kind.display_id(audience);
            info!("Migrating audience: {}", name);
            let outcome = self.submit(kind, audience).await;
            flow.record(name, outcome);
        }

        flow
    }

    /// Lists connections, merges local secrets and creates the merged records.
    pub async fn migrate_databases(&self) -> FlowReport {
        let kind = ResourceKind::Connections;
        info!("Fetching connections...");
        let listing = fetch_all(&self.source, kind, &self.config.page_request).await;
        let merged = reconcile(&listing, &self.config.databases);
        info!(
            "{} of {} connections have local secrets",
            merged.len(),
            listing.len()
        );
        let mut flow = FlowReport::new(kind, listing.len());

        for connection in &merged {
            let name = kind.display_id(connection);
            let outcome = self.submit(kind, connection).await;
            flow.record(name, outcome);
        }

        flow
    }

    async fn submit(&self, kind: ResourceKind, record: &Record) -> Outcome {
        if self.config.dry_run {
            return Outcome::Skipped;
        }
        match create_record(&self.destination, kind, record).await {
            Some(_) => Outcome::Created,
            None => Outcome::CreateFailed,
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;

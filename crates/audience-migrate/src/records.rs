//! Single-record fetch and create.
//!
//! Both operations absorb failures: they log a notice and return `None` so the
//! caller can move on to the next record.

use tracing::{info, warn};

use crate::client::RestApi;
use crate::endpoint::{Record, ResourceKind};

/// Fetches the full detail of one record, or `None` on any failure.
pub async fn fetch_record<A>(api: &A, kind: ResourceKind, id: &str) -> Option<Record>
where
    A: RestApi + ?Sized,
{
    match api.fetch(kind, id).await {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("Failed to fetch {} '{}': {}", kind, id, e);
            None
        }
    }
}

/// Creates one record, or returns `None` on any failure.
///
/// Emits a success or failure notice for every call.
pub async fn create_record<A>(api: &A, kind: ResourceKind, record: &Record) -> Option<Record>
where
    A: RestApi + ?Sized,
{
    let id = kind.display_id(record);
    match api.create(kind, record).await {
        Ok(created) => {
            info!("Created {} '{}'", kind, id);
            Some(created)
        }
        Err(e) => {
            warn!("Failed to create {} '{}': {}", kind, id, e);
            None
        }
    }
}

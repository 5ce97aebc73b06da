//! Connection reconciliation.
//!
//! The source API never exposes connection secrets. They live in the local
//! configuration and are merged into the source records here, matched by
//! lower-cased connection name. Local entries cannot introduce connections the
//! source does not already have.

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::ConnectionSecrets;
use crate::endpoint::Record;

/// Fields taken from the local configuration, overriding the source record.
pub const SECRET_FIELDS: [&str; 4] = ["password", "port", "host", "user"];

/// Normalized join key for connection names.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
}

/// Merges source connections with local secrets.
///
/// Only connections present on both sides are returned, ordered by normalized
/// name. Missing local secrets are emitted as `null`.
#[must_use]
pub fn reconcile(source: &[Record], local: &[ConnectionSecrets]) -> Vec<Record> {
    let source_map: BTreeMap<String, &Record> = source
        .iter()
        .filter_map(|record| match record.get("name") {
            Some(Value::String(name)) => Some((normalize_name(name), record)),
            _ => {
                debug!("Skipping source connection without a name");
                None
            }
        })
        .collect();

    let local_map: BTreeMap<String, &ConnectionSecrets> = local
        .iter()
        .map(|secrets| (normalize_name(&secrets.name), secrets))
        .collect();

    for name in local_map.keys().filter(|k| !source_map.contains_key(*k)) {
        debug!("Connection '{}' is only configured locally, skipping", name);
    }

    source_map
        .into_iter()
        .filter_map(|(name, record)| match local_map.get(&name) {
            Some(secrets) => Some(merge(record, secrets)),
            None => {
                debug!("Connection '{}' has no local secrets, skipping", name);
                None
            }
        })
        .collect()
}

fn merge(source: &Record, secrets: &ConnectionSecrets) -> Record {
    let mut merged = source.clone();
    merged.insert("password".to_string(), optional_string(&secrets.password));
    merged.insert(
        "port".to_string(),
        secrets.port.map_or(Value::Null, Value::from),
    );
    merged.insert("host".to_string(), optional_string(&secrets.host));
    merged.insert("user".to_string(), optional_string(&secrets.user));
    merged
}

fn optional_string(value: &Option<String>) -> Value {
    value.clone().map_or(Value::Null, Value::String)
}

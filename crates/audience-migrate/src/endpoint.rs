//! Resource kinds, endpoint resolution and the record type shared by every flow.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One migratable unit: an opaque JSON object as returned by the API.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Identifier reported for records that lack their identity field.
pub const UNKNOWN_ID: &str = "<unknown>";

/// The closed set of resources the API exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Database connection definitions.
    Connections,
    /// Message templates.
    Templates,
    /// Audience queries.
    Audiences,
}

impl ResourceKind {
    /// URL suffix of the listing/create endpoint, relative to the API base URL.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Connections => "beta/audience/connection",
            Self::Templates => "beta/template",
            Self::Audiences => "beta/audience/query",
        }
    }

    /// Field carrying the identity of a record of this kind.
    #[must_use]
    pub const fn id_field(self) -> &'static str {
        match self {
            Self::Templates => "id",
            Self::Connections | Self::Audiences => "name",
        }
    }

    /// Resolves the full endpoint URL against `base_url`.
    ///
    /// Exactly one `/` separates the base and the suffix.
    #[must_use]
    pub fn url(self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.path())
    }

    /// Resolves the detail URL of a single record.
    #[must_use]
    pub fn record_url(self, base_url: &str, id: &str) -> String {
        format!("{}/{}", self.url(base_url), id)
    }

    /// Extracts the identifier of `record`, stringifying numeric ids.
    #[must_use]
    pub fn identifier(self, record: &Record) -> Option<String> {
        match record.get(self.id_field())? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Like [`identifier`](Self::identifier) but falls back to [`UNKNOWN_ID`].
    #[must_use]
    pub fn display_id(self, record: &Record) -> String {
        self.identifier(record)
            .unwrap_or_else(|| UNKNOWN_ID.to_string())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connections => "connection",
            Self::Templates => "template",
            Self::Audiences => "audience",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_paths() {
        assert_eq!(ResourceKind::Connections.path(), "beta/audience/connection");
        assert_eq!(ResourceKind::Templates.path(), "beta/template");
        assert_eq!(ResourceKind::Audiences.path(), "beta/audience/query");
    }

    #[test]
    fn test_url_with_and_without_trailing_slash() {
        assert_eq!(
            ResourceKind::Templates.url("https://api.example.com/"),
            "https://api.example.com/beta/template"
        );
        assert_eq!(
            ResourceKind::Templates.url("https://api.example.com"),
            "https://api.example.com/beta/template"
        );
    }

    #[test]
    fn test_record_url() {
        assert_eq!(
            ResourceKind::Templates.record_url("http://localhost:8080/", "42"),
            "http://localhost:8080/beta/template/42"
        );
    }

    #[test]
    fn test_identifier_numeric_and_string() {
        let numeric = record(json!({"id": 7, "name": "welcome"}));
        let text = record(json!({"id": "tpl-7"}));

        assert_eq!(ResourceKind::Templates.identifier(&numeric), Some("7".into()));
        assert_eq!(ResourceKind::Templates.identifier(&text), Some("tpl-7".into()));
        assert_eq!(
            ResourceKind::Audiences.identifier(&numeric),
            Some("welcome".into())
        );
    }

    #[test]
    fn test_display_id_missing() {
        let anonymous = record(json!({"description": "no id"}));
        assert_eq!(ResourceKind::Audiences.display_id(&anonymous), UNKNOWN_ID);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&ResourceKind::Audiences).unwrap();
        assert_eq!(json, "\"audiences\"");
    }
}

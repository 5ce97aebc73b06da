//! Configuration types and loaders for audience-migrate.
//!
//! Configuration files come in three formats (INI, JSON, YAML). Each format
//! has its own loader, and all of them produce the same [`RawConfig`] shape.
//! [`RawConfig::validate`] is then run exactly once and yields the typed
//! [`MigrationConfig`] that the rest of the crate consumes.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};
use crate::paginator::{PageRequest, DEFAULT_PAGE_SIZE};

/// Prefix of INI sections that carry connection secrets (`[database.<name>]`).
const INI_DATABASE_SECTION: &str = "database";

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.ini`
    Ini,
    /// `.json`
    Json,
    /// `.yaml` / `.yml`
    Yaml,
}

impl ConfigFormat {
    /// Detects the format from the file extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns a configuration error for any other extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "ini" => Ok(Self::Ini),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(Error::Config(format!(
                "Unsupported file type: '.{ext}'. Supported types are: INI, JSON, YAML."
            ))),
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ini => f.write_str("INI"),
            Self::Json => f.write_str("JSON"),
            Self::Yaml => f.write_str("YAML"),
        }
    }
}

/// Which side of the migration an endpoint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// System records are read from.
    Source,
    /// System records are created in.
    Destination,
}

impl Role {
    /// Name of the configuration section for this role.
    #[must_use]
    pub const fn section(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Destination => "destination",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section())
    }
}

/// Validated connection details for one side of the migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    /// Source or destination.
    pub role: Role,
    /// API base URL.
    pub url: String,
    /// Value of the `ApiKey` header.
    pub api_key: String,
    /// Value of the `CustomerId` header.
    pub customer_id: String,
}

/// Flags gating each migration flow. All default to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationFlags {
    /// Migrate templates.
    #[serde(deserialize_with = "lenient_bool")]
    pub templates: bool,
    /// Migrate audiences.
    #[serde(deserialize_with = "lenient_bool")]
    pub audiences: bool,
    /// Migrate database connections.
    #[serde(deserialize_with = "lenient_bool")]
    pub databases: bool,
}

impl MigrationFlags {
    /// Returns true when no flow is enabled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.templates || self.audiences || self.databases)
    }
}

/// Locally configured secrets for one database connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSecrets {
    /// Connection name, matched case-insensitively against the source.
    pub name: String,
    /// Database host.
    #[serde(default, deserialize_with = "lenient_text")]
    pub host: Option<String>,
    /// Database port.
    #[serde(default, deserialize_with = "lenient_port")]
    pub port: Option<u16>,
    /// Database user.
    #[serde(default, deserialize_with = "lenient_text")]
    pub user: Option<String>,
    /// Database password.
    #[serde(default, deserialize_with = "lenient_text")]
    pub password: Option<String>,
}

/// Run options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationOptions {
    /// Listing page size.
    #[serde(deserialize_with = "lenient_u32")]
    pub page_size: u32,
    /// Read from the source but never create at the destination.
    #[serde(deserialize_with = "lenient_bool")]
    pub dry_run: bool,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            dry_run: false,
        }
    }
}

/// Endpoint section as written in the file, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEndpoint {
    /// API base URL.
    #[serde(default)]
    pub url: Option<String>,
    /// API key.
    #[serde(default, rename = "ApiKey", alias = "apikey", alias = "api_key")]
    pub api_key: Option<String>,
    /// Customer id.
    #[serde(
        default,
        rename = "CustomerId",
        alias = "customerid",
        alias = "customer_id"
    )]
    pub customer_id: Option<String>,
}

/// Configuration as loaded from disk: every format converges on this shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfig {
    /// `source` section.
    #[serde(default)]
    pub source: Option<RawEndpoint>,
    /// `destination` section.
    #[serde(default)]
    pub destination: Option<RawEndpoint>,
    /// Local connection secrets.
    #[serde(default)]
    pub databases: Vec<ConnectionSecrets>,
    /// Flow flags.
    #[serde(default)]
    pub migrating: MigrationFlags,
    /// Run options.
    #[serde(default)]
    pub options: MigrationOptions,
}

impl RawConfig {
    /// Loads a configuration file, choosing the loader by extension.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file does not exist, cannot be
    /// read, has an unsupported extension or cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Config(format!(
                "The file '{}' does not exist.",
                path.display()
            )));
        }

        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read '{}': {e}", path.display()))
        })?;

        Self::parse(&content, format).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Parses configuration text in the given format.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the text cannot be parsed.
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let parsed = match format {
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Ini => Self::from_ini(content),
        };

        parsed.map_err(|e| Error::Config(format!("Failed to parse {format} configuration: {e}")))
    }

    fn from_ini(content: &str) -> std::result::Result<Self, String> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from_str(content, ::config::FileFormat::Ini))
            .build()
            .map_err(|e| e.to_string())?;

        let mut tree: serde_json::Value = settings.try_deserialize().map_err(|e| e.to_string())?;
        collect_ini_databases(&mut tree);

        serde_json::from_value(tree).map_err(|e| e.to_string())
    }

    /// Checks required sections and fields and produces the typed configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first missing or invalid item.
    pub fn validate(self) -> Result<MigrationConfig> {
        let source = validate_endpoint(self.source, Role::Source)?;
        let destination = validate_endpoint(self.destination, Role::Destination)?;

        for (index, db) in self.databases.iter().enumerate() {
            if db.name.trim().is_empty() {
                return Err(Error::Config(format!(
                    "Database entry #{} in 'databases' has an empty name.",
                    index + 1
                )));
            }
        }

        let page_request = PageRequest::with_size(self.options.page_size)?;

        Ok(MigrationConfig {
            source,
            destination,
            databases: self.databases,
            migrating: self.migrating,
            page_request,
            dry_run: self.options.dry_run,
        })
    }
}

/// Validated migration configuration.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Source API.
    pub source: ApiEndpoint,
    /// Destination API.
    pub destination: ApiEndpoint,
    /// Local connection secrets.
    pub databases: Vec<ConnectionSecrets>,
    /// Flow flags.
    pub migrating: MigrationFlags,
    /// Page size and filters used for every listing.
    pub page_request: PageRequest,
    /// Skip create requests.
    pub dry_run: bool,
}

impl MigrationConfig {
    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if loading or validation fails.
    pub fn from_file(path: &Path) -> Result<Self> {
        RawConfig::from_file(path)?.validate()
    }
}

fn validate_endpoint(section: Option<RawEndpoint>, role: Role) -> Result<ApiEndpoint> {
    let name = role.section();
    let section = section.ok_or_else(|| {
        Error::Config(format!("Missing '{name}' section in configuration."))
    })?;

    let missing = |field: &str| Error::Config(format!("Missing '{field}' in '{name}' section."));

    let url = section.url.ok_or_else(|| missing("url"))?;
    let api_key = section.api_key.ok_or_else(|| missing("ApiKey"))?;
    let customer_id = section.customer_id.ok_or_else(|| missing("CustomerId"))?;

    validate_url(&url).map_err(|e| match e {
        Error::Config(msg) => Error::Config(format!("{msg} (in '{name}' section)")),
        other => other,
    })?;

    Ok(ApiEndpoint {
        role,
        url,
        api_key,
        customer_id,
    })
}

/// Validates that a base URL uses an HTTP scheme.
pub fn validate_url(url: &str) -> Result<()> {
    let has_valid_scheme = ["http://", "https://"].iter().any(|s| url.starts_with(s));

    if !has_valid_scheme {
        return Err(Error::Config(format!(
            "Invalid URL scheme in '{url}'. Allowed: http, https"
        )));
    }

    if url.len() <= "http://".len() {
        return Err(Error::Config(format!("Invalid URL format: {url}")));
    }

    Ok(())
}

/// Moves `[database.<name>]` INI sections into the canonical `databases` list.
fn collect_ini_databases(tree: &mut serde_json::Value) {
    let Some(root) = tree.as_object_mut() else {
        return;
    };

    let mut sections: Vec<(String, serde_json::Value)> = Vec::new();

    // Dotted section names are either nested by the INI source or kept flat.
    if let Some(serde_json::Value::Object(nested)) = root.remove(INI_DATABASE_SECTION) {
        sections.extend(nested);
    }
    let prefix = format!("{INI_DATABASE_SECTION}.");
    let flat: Vec<String> = root
        .keys()
        .filter(|k| k.starts_with(&prefix))
        .cloned()
        .collect();
    for key in flat {
        if let Some(value) = root.remove(&key) {
            sections.push((key[prefix.len()..].to_string(), value));
        }
    }

    if sections.is_empty() {
        return;
    }

    let databases: Vec<serde_json::Value> = sections
        .into_iter()
        .filter_map(|(name, value)| {
            let mut fields = value.as_object()?.clone();
            fields
                .entry("name")
                .or_insert_with(|| serde_json::Value::String(name));
            Some(serde_json::Value::Object(fields))
        })
        .collect();

    root.insert(
        "databases".to_string(),
        serde_json::Value::Array(databases),
    );
}

/// Scalar that INI files hand over as text.
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    use serde::de::Error as _;

    match Lenient::deserialize(deserializer)? {
        Lenient::Bool(b) => Ok(b),
        Lenient::Int(i) => Ok(i != 0),
        Lenient::Float(f) => Err(D::Error::custom(format!("invalid boolean '{f}'"))),
        Lenient::Text(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" | "" => Ok(false),
            other => Err(D::Error::custom(format!("invalid boolean '{other}'"))),
        },
    }
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    use serde::de::Error as _;

    match Lenient::deserialize(deserializer)? {
        Lenient::Int(i) => u32::try_from(i).map_err(D::Error::custom),
        Lenient::Text(s) => s.trim().parse().map_err(D::Error::custom),
        Lenient::Bool(b) => Err(D::Error::custom(format!("expected an integer, got {b}"))),
        Lenient::Float(f) => Err(D::Error::custom(format!("expected an integer, got {f}"))),
    }
}

fn lenient_port<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<u16>, D::Error> {
    use serde::de::Error as _;

    match Option::<Lenient>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Lenient::Int(i)) => u16::try_from(i).map(Some).map_err(D::Error::custom),
        Some(Lenient::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Lenient::Text(s)) => s.trim().parse().map(Some).map_err(D::Error::custom),
        Some(Lenient::Bool(b)) => Err(D::Error::custom(format!("expected a port, got {b}"))),
        Some(Lenient::Float(f)) => Err(D::Error::custom(format!("expected a port, got {f}"))),
    }
}

/// Secrets are passed through as text, whatever scalar type the file used.
fn lenient_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(Option::<Lenient>::deserialize(deserializer)?.map(|value| match value {
        Lenient::Bool(b) => b.to_string(),
        Lenient::Int(i) => i.to_string(),
        Lenient::Float(f) => f.to_string(),
        Lenient::Text(s) => s,
    }))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

use crate::clause::Dialect;
use crate::error::ChainResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a [`ConnectionHandler`](super::ConnectionHandler).
///
/// Loadable from TOML:
///
/// ```
/// use sqlchain::{ConnectionConfig, Dialect};
/// use std::time::Duration;
///
/// let config = ConnectionConfig::from_toml_str(r#"
///     table_prefix = "app_"
///     dialect = "sqlite"
///     slow_query_threshold_ms = 250
/// "#)?;
/// assert_eq!(config.dialect, Dialect::Sqlite);
/// assert_eq!(config.slow_query_threshold, Some(Duration::from_millis(250)));
/// assert!(config.cache_enabled);
/// # Ok::<(), sqlchain::ChainError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Prepended to every resolved table name.
    pub table_prefix: String,
    /// DDL phrasing.
    pub dialect: Dialect,
    /// Whether SELECT/SHOW results are cached.
    pub cache_enabled: bool,
    /// Whether statements are appended to the in-process query log.
    pub log_queries: bool,
    /// Statements slower than this are reported as slow.
    #[serde(
        rename = "slow_query_threshold_ms",
        with = "opt_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub slow_query_threshold: Option<Duration>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            table_prefix: String::new(),
            dialect: Dialect::MySql,
            cache_enabled: true,
            log_queries: true,
            slow_query_threshold: None,
        }
    }
}

impl ConnectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with the SQLite dialect.
    pub fn sqlite() -> Self {
        Self::default().dialect(Dialect::Sqlite)
    }

    pub fn from_toml_str(s: &str) -> ChainResult<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn log_queries(mut self, enabled: bool) -> Self {
        self.log_queries = enabled;
        self
    }

    pub fn slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }
}

mod opt_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => {
                serializer.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            }
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

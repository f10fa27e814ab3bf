//! Builder and registry configuration.
//!
//! [`QbConfig`] is what the builders consult at call time. [`WeaveConfig`] is the
//! file-level form, loadable from TOML:
//!
//! ```toml
//! qualify_columns = true
//!
//! [functions]
//! extra = ["GREATEST", "LEAST"]
//! replace_defaults = false
//!
//! [registry]
//! slow_query_ms = 250
//! query_timeout_ms = 5000
//! ```

use crate::error::{WeaveError, WeaveResult};
use crate::functions::FunctionAllowList;
use crate::registry::RegistryConfig;
use serde::Deserialize;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Settings consulted by the query builders.
#[derive(Debug, Clone, PartialEq)]
pub struct QbConfig {
    /// Functions whose calls are embedded verbatim instead of bound.
    pub functions: FunctionAllowList,
    /// Prefix unqualified columns with the query table.
    pub qualify_columns: bool,
}

impl Default for QbConfig {
    fn default() -> Self {
        Self {
            functions: FunctionAllowList::default(),
            qualify_columns: true,
        }
    }
}

impl QbConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide default configuration used by `qb::select` & co.
    pub fn shared() -> Arc<QbConfig> {
        static SHARED: OnceLock<Arc<QbConfig>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(QbConfig::default())).clone()
    }

    /// Replace the function allow-list.
    pub fn functions(mut self, functions: FunctionAllowList) -> Self {
        self.functions = functions;
        self
    }

    /// Add one function name to the allow-list.
    pub fn allow_function(mut self, name: impl Into<String>) -> Self {
        self.functions.insert(name);
        self
    }

    /// Enable or disable default table qualification.
    pub fn qualify_columns(mut self, qualify: bool) -> Self {
        self.qualify_columns = qualify;
        self
    }
}

fn default_true() -> bool {
    true
}

/// `[functions]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionsConfig {
    /// Names added to the allow-list.
    #[serde(default)]
    pub extra: Vec<String>,
    /// Use only `extra`, dropping the built-in names.
    #[serde(default)]
    pub replace_defaults: bool,
}

/// `[registry]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrySection {
    pub slow_query_ms: Option<u64>,
    pub query_timeout_ms: Option<u64>,
}

/// File-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WeaveConfig {
    #[serde(default = "default_true")]
    pub qualify_columns: bool,

    #[serde(default)]
    pub functions: FunctionsConfig,

    #[serde(default)]
    pub registry: RegistrySection,
}

impl Default for WeaveConfig {
    fn default() -> Self {
        Self {
            qualify_columns: true,
            functions: FunctionsConfig::default(),
            registry: RegistrySection::default(),
        }
    }
}

impl WeaveConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(raw: &str) -> WeaveResult<Self> {
        let config: WeaveConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> WeaveResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            WeaveError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    fn validate(&self) -> WeaveResult<()> {
        for name in &self.functions.extra {
            let valid = !name.is_empty()
                && name
                    .chars()
                    .all(|c| c == '_' || c.is_ascii_uppercase() || c.is_ascii_digit());
            if !valid {
                return Err(WeaveError::Config(format!(
                    "function names must be upper-case identifiers, got '{name}'"
                )));
            }
        }
        Ok(())
    }

    /// Builder settings described by this file.
    pub fn qb_config(&self) -> QbConfig {
        let mut functions = if self.functions.replace_defaults {
            FunctionAllowList::empty()
        } else {
            FunctionAllowList::default()
        };
        for name in &self.functions.extra {
            functions.insert(name.clone());
        }
        QbConfig {
            functions,
            qualify_columns: self.qualify_columns,
        }
    }

    /// Registry settings described by this file.
    pub fn registry_config(&self) -> RegistryConfig {
        let mut config = RegistryConfig::new();
        if let Some(ms) = self.registry.slow_query_ms {
            config = config.with_slow_query_threshold(Duration::from_millis(ms));
        }
        if let Some(ms) = self.registry.query_timeout_ms {
            config = config.with_query_timeout(Duration::from_millis(ms));
        }
        config
    }
}

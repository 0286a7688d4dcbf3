//! Job configuration and reader options.
//!
//! The host passes a generic [`JobConfig`] through [`TaskContext`]; the
//! reader picks out the few keys it understands via
//! [`ReaderOptions::from_config`] and ignores everything else.

use crate::error::{ReaderError, Result};
use serde::{Deserialize, Serialize};
use split_reader_file::{FileSystem, LocalFileSystem, DEFAULT_BUFFER_SIZE};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Key selecting the record boundary rule (`naive` or `quote-aware`).
pub const QUOTE_MODE_KEY: &str = "split_reader.quote_mode";
/// Key selecting the quote character used in quote-aware mode.
pub const QUOTE_CHAR_KEY: &str = "split_reader.quote_char";
/// Key selecting the decoder buffer capacity in bytes.
pub const BUFFER_SIZE_KEY: &str = "split_reader.buffer_size";

/// Generic string key/value job configuration.
///
/// Nested YAML mappings are flattened into dotted keys, so
///
/// ```yaml
/// split_reader:
///   quote_mode: quote-aware
/// ```
///
/// and `split_reader.quote_mode: quote-aware` are equivalent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobConfig {
    properties: BTreeMap<String, String>,
}

impl JobConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ReaderError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::new());
        }
        let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        let mut config = Self::new();
        match value {
            serde_yaml::Value::Null => {}
            serde_yaml::Value::Mapping(mapping) => flatten_into(&mut config, "", mapping)?,
            _ => {
                return Err(ReaderError::Config(
                    "job configuration must be a mapping".to_string(),
                ))
            }
        }
        Ok(config)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Builder form of [`JobConfig::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

fn flatten_into(config: &mut JobConfig, prefix: &str, mapping: serde_yaml::Mapping) -> Result<()> {
    for (key, value) in mapping {
        let key = match key {
            serde_yaml::Value::String(s) => s,
            other => scalar_to_string(&other).ok_or_else(|| {
                ReaderError::Config(format!("unsupported key type under '{prefix}'"))
            })?,
        };
        let full_key = if prefix.is_empty() {
            key
        } else {
            format!("{prefix}.{key}")
        };

        match value {
            serde_yaml::Value::Mapping(nested) => flatten_into(config, &full_key, nested)?,
            serde_yaml::Value::Null => {}
            other => {
                let value = scalar_to_string(&other).ok_or_else(|| {
                    ReaderError::Config(format!("value for '{full_key}' must be a scalar"))
                })?;
                config.set(full_key, value);
            }
        }
    }
    Ok(())
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Rule deciding which newline ends a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteMode {
    /// Every newline ends a record, including one inside a quoted field.
    #[default]
    Naive,
    /// A newline ends a record only outside a quoted region. Each `quote`
    /// byte toggles the region, so a doubled quote escape leaves it unchanged.
    QuoteAware { quote: u8 },
}

impl QuoteMode {
    /// Quote-aware mode with the usual `"` quote character.
    pub fn quote_aware() -> Self {
        QuoteMode::QuoteAware { quote: b'"' }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteMode::Naive => "naive",
            QuoteMode::QuoteAware { .. } => "quote-aware",
        }
    }
}

impl fmt::Display for QuoteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteMode {
    type Err = ReaderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "naive" => Ok(QuoteMode::Naive),
            "quote-aware" | "quote_aware" => Ok(QuoteMode::quote_aware()),
            other => Err(ReaderError::Config(format!(
                "unknown quote mode '{other}' (expected 'naive' or 'quote-aware')"
            ))),
        }
    }
}

/// Options the line reader consumes from the job configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    pub quote_mode: QuoteMode,
    pub buffer_size: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            quote_mode: QuoteMode::Naive,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl ReaderOptions {
    /// Read options from the job configuration, falling back to defaults for
    /// absent keys.
    pub fn from_config(config: &JobConfig) -> Result<Self> {
        let mut options = Self::default();

        if let Some(mode) = config.get(QUOTE_MODE_KEY) {
            options.quote_mode = mode.parse()?;
        }

        if let Some(quote) = config.get(QUOTE_CHAR_KEY) {
            let quote = parse_quote_char(quote)?;
            match &mut options.quote_mode {
                QuoteMode::QuoteAware { quote: q } => *q = quote,
                QuoteMode::Naive => {
                    tracing::debug!("Ignoring {QUOTE_CHAR_KEY} in naive quote mode");
                }
            }
        }

        if let Some(size) = config.get(BUFFER_SIZE_KEY) {
            let size: usize = size.trim().parse().map_err(|e| {
                ReaderError::Config(format!("invalid {BUFFER_SIZE_KEY} '{size}': {e}"))
            })?;
            if size == 0 {
                return Err(ReaderError::Config(format!(
                    "{BUFFER_SIZE_KEY} must be greater than zero"
                )));
            }
            options.buffer_size = size;
        }

        Ok(options)
    }
}

fn parse_quote_char(value: &str) -> Result<u8> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() && c != '\n' => Ok(c as u8),
        _ => Err(ReaderError::Config(format!(
            "{QUOTE_CHAR_KEY} must be a single ASCII character other than newline, got '{value}'"
        ))),
    }
}

/// Per-task context handed to `initialize`.
#[derive(Clone)]
pub struct TaskContext {
    config: JobConfig,
    file_system: Arc<dyn FileSystem>,
    task_id: String,
}

impl TaskContext {
    /// Context reading from the local filesystem.
    pub fn new(config: JobConfig) -> Self {
        Self {
            config,
            file_system: Arc::new(LocalFileSystem),
            task_id: "local".to_string(),
        }
    }

    pub fn with_file_system(mut self, file_system: Arc<dyn FileSystem>) -> Self {
        self.file_system = file_system;
        self
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = task_id.into();
        self
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.file_system
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }
}

impl Default for TaskContext {
    fn default() -> Self {
        Self::new(JobConfig::default())
    }
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("config", &self.config)
            .field("file_system", &self.file_system.scheme())
            .field("task_id", &self.task_id)
            .finish()
    }
}

//! Environment lookup with `_FILE` indirection.
//!
//! # Responsibilities
//! - Abstract the process environment behind [`EnvSource`]
//! - Resolve `X` / `X_FILE` pairs into a single trimmed value
//! - Memoize every key for the lifetime of one [`EnvResolver`]
//!
//! # Design Decisions
//! - The cache lives in the resolver, not in a global; build one per run
//! - Only the raw lookup is cached, defaults are applied on read
//! - Errors are not cached: the caller aborts on the first one anyway

use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::validation::ConfigError;

/// Suffix marking a key whose value is the path of a file holding the real value.
pub const FILE_SUFFIX: &str = "_FILE";

/// A read-only view of key/value environment state.
pub trait EnvSource {
    /// Returns the raw value bound to `key`, if any.
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<S: EnvSource + ?Sized> EnvSource for &S {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}

/// Resolution context owning the per-key memoization cache.
pub struct EnvResolver<S> {
    source: S,
    cache: HashMap<String, Option<String>>,
}

impl<S: EnvSource> EnvResolver<S> {
    /// Create a resolver with an empty cache.
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: HashMap::new(),
        }
    }

    /// Look up `key`, following `key_FILE` when the direct key is unset.
    ///
    /// The first successful lookup of a key is cached; later calls return the
    /// cached value even if the source has changed since.
    pub fn get(&mut self, key: &str) -> Result<Option<String>, ConfigError> {
        if let Some(cached) = self.cache.get(key) {
            return Ok(cached.clone());
        }

        let value = self.lookup(key)?;
        self.cache.insert(key.to_string(), value.clone());
        Ok(value)
    }

    /// Like [`get`](Self::get), falling back to `default` when unset.
    pub fn get_or(&mut self, key: &str, default: &str) -> Result<String, ConfigError> {
        Ok(self.get(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// True if either `key` or `key_FILE` is bound.
    pub fn is_set(&mut self, key: &str) -> Result<bool, ConfigError> {
        Ok(self.get(key)?.is_some())
    }

    /// Number of keys resolved so far.
    pub fn cached_keys(&self) -> usize {
        self.cache.len()
    }

    fn lookup(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let file_key = format!("{key}{FILE_SUFFIX}");
        let direct = self.source.var(key);
        let file = self.source.var(&file_key);

        match (direct, file) {
            (Some(_), Some(_)) => Err(ConfigError::BothSet {
                key: key.to_string(),
                file_key,
            }),
            (Some(value), None) => Ok(Some(value.trim().to_string())),
            (None, Some(path)) => {
                let path = PathBuf::from(path);
                let contents = std::fs::read_to_string(&path).map_err(|source| {
                    ConfigError::ReadFile {
                        key: file_key.clone(),
                        path: path.clone(),
                        source,
                    }
                })?;
                tracing::debug!(key, path = %path.display(), "Value read from file");
                Ok(Some(contents.trim().to_string()))
            }
            (None, None) => Ok(None),
        }
    }
}

//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults, `config.toml`, `config.<env>.toml`
//! and `DOCSEARCH_*` env vars (`__` separates nested keys, e.g.
//! `DOCSEARCH_SEARCH__DEFAULT_LIMIT=20`).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::types::{Field, FieldWeights};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub search: SearchSettings,
    pub weights: FieldWeights,
    pub lite: LiteSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub corpus_dir: String,
    pub index_path: String,
    pub history_path: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            corpus_dir: "./docs".to_string(),
            index_path: "./data/search_index.json".to_string(),
            history_path: "~/.docsearch/history.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub default_limit: usize,
    pub max_limit: usize,
    /// Suggested keystroke debounce for interactive callers.
    pub debounce_ms: u64,
    pub excerpt_len: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { default_limit: 50, max_limit: 200, debounce_ms: 300, excerpt_len: 200 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiteSettings {
    pub title_boost: f32,
    pub sections_boost: f32,
    /// Allowed edit distance as a fraction of the query word length.
    pub fuzzy: f32,
    pub prefix: bool,
}

impl Default for LiteSettings {
    fn default() -> Self {
        Self { title_boost: 2.0, sections_boost: 1.5, fuzzy: 0.2, prefix: true }
    }
}

impl Settings {
    pub fn validate(&self) -> crate::Result<()> {
        for field in Field::ALL {
            let weight = self.weights.weight(field);
            if !weight.is_finite() || weight <= 0.0 {
                return Err(Error::InvalidConfig(format!("weights.{} must be positive, got {}", field, weight)));
            }
        }
        if self.search.default_limit == 0 || self.search.max_limit == 0 {
            return Err(Error::InvalidConfig("search limits must be greater than zero".to_string()));
        }
        if self.search.default_limit > self.search.max_limit {
            return Err(Error::InvalidConfig(format!(
                "search.default_limit ({}) exceeds search.max_limit ({})",
                self.search.default_limit, self.search.max_limit
            )));
        }
        if !(0.0..=1.0).contains(&self.lite.fuzzy) {
            return Err(Error::InvalidConfig(format!("lite.fuzzy must be within 0..=1, got {}", self.lite.fuzzy)));
        }
        Ok(())
    }

    /// Clamps a caller-supplied limit to `search.max_limit`, defaulting when absent.
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.search.default_limit).clamp(1, self.search.max_limit)
    }

    pub fn corpus_dir(&self) -> PathBuf {
        expand_path(&self.data.corpus_dir)
    }

    pub fn index_path(&self) -> PathBuf {
        expand_path(&self.data.index_path)
    }

    pub fn history_path(&self) -> PathBuf {
        expand_path(&self.data.history_path)
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_from(Path::new("."), &env_name)
    }

    /// Loads config files from `dir` for the given environment name.
    pub fn load_from(dir: &Path, env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("DOCSEARCH_").split("__"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};

use crate::secret::Secret;

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if the resulting values fail [`Config::validate`].
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Read credentials from the environment.
    ///
    /// Blank values are treated as absent.
    pub fn resolve_secrets(&mut self) {
        if let Ok(v) = std::env::var("REPOSIFT_GITHUB_TOKEN") {
            self.secrets.github_token = Secret::non_empty(v);
        }
        if let Ok(v) = std::env::var("REPOSIFT_OPENAI_API_KEY") {
            self.secrets.openai_api_key = Secret::non_empty(v);
        }
    }

    /// # Errors
    ///
    /// Returns an error for a zero `chunk_size`, `functions_per_chunk` or
    /// `top_k`, or an `overlap_size` not smaller than `chunk_size`.
    pub fn validate(&self) -> anyhow::Result<()> {
        let c = &self.chunking;
        if c.chunk_size == 0 {
            bail!("chunking.chunk_size must be positive");
        }
        if c.overlap_size >= c.chunk_size {
            bail!(
                "chunking.overlap_size ({}) must be smaller than chunking.chunk_size ({})",
                c.overlap_size,
                c.chunk_size
            );
        }
        if c.functions_per_chunk == 0 {
            bail!("chunking.functions_per_chunk must be at least 1");
        }
        if c.tokenizer_model.trim().is_empty() {
            bail!("chunking.tokenizer_model must not be empty");
        }
        if self.index.top_k == 0 {
            bail!("index.top_k must be at least 1");
        }
        if self.index.path.trim().is_empty() {
            bail!("index.path must not be empty");
        }
        Ok(())
    }
}

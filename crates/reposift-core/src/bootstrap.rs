//! Build runtime components from a loaded [`Config`].

use std::path::{Path, PathBuf};

use anyhow::Context;
use reposift_index::ChunkingOptions;
use reposift_index::windower::TiktokenCodec;
use reposift_llm::any::AnyEmbedder;
#[cfg(feature = "mock")]
use reposift_llm::mock::MockEmbedder;
use reposift_llm::ollama::{self, OllamaEmbedder};
use reposift_llm::openai::{self, OpenAiEmbedder};
use reposift_repo::github::GithubFetcher;

use crate::config::{Config, ProviderKind};

/// `--config` path from the environment, then `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("REPOSIFT_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

/// Load the config at `path` and resolve secrets from the environment.
///
/// # Errors
///
/// Returns an error if the file cannot be parsed or fails validation.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let mut config = Config::load(path)?;
    config.resolve_secrets();
    tracing::debug!(
        path = %path.display(),
        provider = %config.embedding.provider,
        model = %config.embedding.model,
        "configuration loaded"
    );
    Ok(config)
}

/// # Errors
///
/// Returns an error when the hosted `OpenAI` endpoint is selected without an
/// API key.
pub fn create_embedder(config: &Config) -> anyhow::Result<AnyEmbedder> {
    let cfg = &config.embedding;
    match cfg.provider {
        ProviderKind::OpenAi => {
            let base_url = cfg
                .base_url
                .clone()
                .unwrap_or_else(|| openai::DEFAULT_BASE_URL.to_owned());
            let api_key = config
                .secrets
                .openai_api_key
                .as_ref()
                .map(|s| s.expose().to_owned());
            if api_key.is_none() && base_url.trim_end_matches('/') == openai::DEFAULT_BASE_URL {
                anyhow::bail!("REPOSIFT_OPENAI_API_KEY is required for the OpenAI embedding API");
            }
            let embedder = OpenAiEmbedder::new(api_key, base_url, cfg.model.clone())
                .with_max_retries(cfg.max_retries);
            Ok(AnyEmbedder::OpenAi(embedder))
        }
        ProviderKind::Ollama => {
            let base_url = cfg.base_url.as_deref().unwrap_or(ollama::DEFAULT_BASE_URL);
            Ok(AnyEmbedder::Ollama(OllamaEmbedder::new(
                base_url,
                cfg.model.clone(),
            )))
        }
        #[cfg(feature = "mock")]
        ProviderKind::Mock => Ok(AnyEmbedder::Mock(
            MockEmbedder::default().with_model(cfg.model.clone()),
        )),
    }
}

/// # Errors
///
/// Returns an error when tiktoken has no encoding for the configured model.
pub fn create_codec(config: &Config) -> anyhow::Result<TiktokenCodec> {
    let model = &config.chunking.tokenizer_model;
    TiktokenCodec::for_model(model).with_context(|| format!("failed to load tokenizer for {model}"))
}

#[must_use]
pub fn create_fetcher(config: &Config) -> GithubFetcher {
    let token = config
        .secrets
        .github_token
        .as_ref()
        .map(|s| s.expose().to_owned());
    if token.is_none() {
        tracing::debug!("no GitHub token configured, requests are unauthenticated");
    }
    GithubFetcher::new(token)
        .with_api_url(config.github.api_url.clone())
        .with_default_branch(config.github.default_branch.clone())
        .with_exclude(config.github.exclude.clone())
        .with_max_retries(config.github.max_retries)
}

#[must_use]
pub fn chunking_options(config: &Config) -> ChunkingOptions {
    config.chunking.options()
}

#[must_use]
pub fn index_dir(config: &Config, cli: Option<&Path>) -> PathBuf {
    cli.map_or_else(|| PathBuf::from(&config.index.path), Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use reposift_llm::EmbeddingProvider;

    use super::*;
    use crate::secret::Secret;

    #[test]
    fn openai_without_key_errors() {
        let config = Config::default();
        let err = create_embedder(&config).unwrap_err();
        assert!(err.to_string().contains("REPOSIFT_OPENAI_API_KEY"));
    }

    #[test]
    fn openai_with_key() {
        let mut config = Config::default();
        config.secrets.openai_api_key = Some(Secret::new("sk-test"));
        let embedder = create_embedder(&config).unwrap();
        assert!(matches!(embedder, AnyEmbedder::OpenAi(_)));
        assert_eq!(embedder.name(), "openai");
        assert_eq!(embedder.model(), "text-embedding-ada-002");
    }

    #[test]
    fn openai_compatible_gateway_needs_no_key() {
        let mut config = Config::default();
        config.embedding.base_url = Some("http://localhost:8080/v1".into());
        assert!(create_embedder(&config).is_ok());
    }

    #[test]
    fn ollama_embedder() {
        let mut config = Config::default();
        config.embedding.provider = ProviderKind::Ollama;
        config.embedding.model = "nomic-embed-text".into();
        let embedder = create_embedder(&config).unwrap();
        assert!(matches!(embedder, AnyEmbedder::Ollama(_)));
        assert_eq!(embedder.model(), "nomic-embed-text");
    }

    #[test]
    fn codec_for_default_model() {
        let codec = create_codec(&Config::default()).unwrap();
        assert_eq!(codec.model(), "gpt-3.5-turbo");
    }

    #[test]
    fn codec_for_unknown_model_errors() {
        let mut config = Config::default();
        config.chunking.tokenizer_model = "no-such-model".into();
        let err = create_codec(&config).unwrap_err();
        assert!(err.to_string().contains("no-such-model"));
    }

    #[test]
    fn fetcher_debug_hides_token() {
        let mut config = Config::default();
        config.secrets.github_token = Some(Secret::new("ghp_secret"));
        let fetcher = create_fetcher(&config);
        assert!(!format!("{fetcher:?}").contains("ghp_secret"));
    }

    #[test]
    fn cli_paths_take_precedence() {
        let config = Config::default();
        assert_eq!(index_dir(&config, None), PathBuf::from("faiss_index"));
        assert_eq!(
            index_dir(&config, Some(Path::new("/tmp/idx"))),
            PathBuf::from("/tmp/idx")
        );
        assert_eq!(
            resolve_config_path(Some(Path::new("custom.toml"))),
            PathBuf::from("custom.toml")
        );
    }
}

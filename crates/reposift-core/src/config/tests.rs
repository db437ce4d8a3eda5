use std::io::Write;

use serial_test::serial;

use super::*;

const ENV_KEYS: [&str; 17] = [
    "REPOSIFT_GITHUB_API_URL",
    "REPOSIFT_GITHUB_DEFAULT_BRANCH",
    "REPOSIFT_GITHUB_EXCLUDE",
    "REPOSIFT_GITHUB_MAX_RETRIES",
    "REPOSIFT_GITHUB_TOKEN",
    "REPOSIFT_CHUNK_SIZE",
    "REPOSIFT_OVERLAP_SIZE",
    "REPOSIFT_FUNCTIONS_PER_CHUNK",
    "REPOSIFT_FUNCTION_CHUNKING",
    "REPOSIFT_INCLUDE_SUBMODULES",
    "REPOSIFT_TOKENIZER_MODEL",
    "REPOSIFT_EMBEDDING_PROVIDER",
    "REPOSIFT_EMBEDDING_BASE_URL",
    "REPOSIFT_EMBEDDING_MODEL",
    "REPOSIFT_OPENAI_API_KEY",
    "REPOSIFT_INDEX_PATH",
    "REPOSIFT_INDEX_TOP_K",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn defaults_when_file_missing() {
    clear_env();
    let config = Config::load(Path::new("/nonexistent/reposift.toml")).unwrap();

    assert_eq!(config.github.api_url, "https://api.github.com");
    assert_eq!(config.github.default_branch, "main");
    assert!(config.github.exclude.iter().any(|p| p == ".DS_Store"));
    assert_eq!(config.chunking.chunk_size, 500);
    assert_eq!(config.chunking.overlap_size, 50);
    assert_eq!(config.chunking.functions_per_chunk, 2);
    assert!(config.chunking.function_chunking);
    assert!(config.chunking.include_submodules);
    assert_eq!(config.chunking.tokenizer_model, "gpt-3.5-turbo");
    assert_eq!(config.embedding.provider, ProviderKind::OpenAi);
    assert_eq!(config.embedding.model, "text-embedding-ada-002");
    assert!(config.embedding.base_url.is_none());
    assert_eq!(config.index.path, "faiss_index");
    assert_eq!(config.index.top_k, 5);
}

#[test]
#[serial]
fn parses_partial_file() {
    clear_env();
    let file = write_config(
        r#"
[chunking]
chunk_size = 20
overlap_size = 5

[embedding]
provider = "ollama"
model = "nomic-embed-text"
base_url = "http://gpu-box:11434"

[index]
path = "/var/lib/reposift/idx"
"#,
    );
    let config = Config::load(file.path()).unwrap();

    assert_eq!(config.chunking.chunk_size, 20);
    assert_eq!(config.chunking.overlap_size, 5);
    assert_eq!(config.chunking.functions_per_chunk, 2);
    assert_eq!(config.embedding.provider, ProviderKind::Ollama);
    assert_eq!(config.embedding.model, "nomic-embed-text");
    assert_eq!(
        config.embedding.base_url.as_deref(),
        Some("http://gpu-box:11434")
    );
    assert_eq!(config.index.path, "/var/lib/reposift/idx");
    assert_eq!(config.index.top_k, 5);
    assert_eq!(config.github.max_retries, 3);
}

#[test]
#[serial]
fn malformed_file_is_error() {
    clear_env();
    let file = write_config("[chunking\nchunk_size = ");
    let err = Config::load(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse config file"));
}

#[test]
#[serial]
fn env_overrides_file_values() {
    clear_env();
    let file = write_config("[chunking]\nchunk_size = 100\n");
    unsafe {
        std::env::set_var("REPOSIFT_CHUNK_SIZE", "300");
        std::env::set_var("REPOSIFT_OVERLAP_SIZE", "30");
        std::env::set_var("REPOSIFT_FUNCTION_CHUNKING", "false");
        std::env::set_var("REPOSIFT_EMBEDDING_PROVIDER", "ollama");
        std::env::set_var("REPOSIFT_INDEX_TOP_K", "9");
        std::env::set_var("REPOSIFT_GITHUB_EXCLUDE", ".lock, vendor/ ,,");
    }
    let config = Config::load(file.path()).unwrap();
    clear_env();

    assert_eq!(config.chunking.chunk_size, 300);
    assert_eq!(config.chunking.overlap_size, 30);
    assert!(!config.chunking.function_chunking);
    assert_eq!(config.embedding.provider, ProviderKind::Ollama);
    assert_eq!(config.index.top_k, 9);
    assert_eq!(config.github.exclude, vec![".lock", "vendor/"]);
}

#[test]
#[serial]
fn unparseable_env_values_are_ignored() {
    clear_env();
    unsafe {
        std::env::set_var("REPOSIFT_CHUNK_SIZE", "lots");
        std::env::set_var("REPOSIFT_EMBEDDING_PROVIDER", "carrier-pigeon");
        std::env::set_var("REPOSIFT_INCLUDE_SUBMODULES", "maybe");
    }
    let config = Config::load(Path::new("/nonexistent/reposift.toml")).unwrap();
    clear_env();

    assert_eq!(config.chunking.chunk_size, 500);
    assert_eq!(config.embedding.provider, ProviderKind::OpenAi);
    assert!(config.chunking.include_submodules);
}

#[test]
#[serial]
fn overlap_not_smaller_than_chunk_is_rejected() {
    clear_env();
    let file = write_config("[chunking]\nchunk_size = 10\noverlap_size = 10\n");
    let err = Config::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("overlap_size (10)"));
}

#[test]
fn validate_rejects_zero_values() {
    let mut config = Config::default();
    config.chunking.chunk_size = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.chunking.functions_per_chunk = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.index.top_k = 0;
    assert!(config.validate().is_err());

    assert!(Config::default().validate().is_ok());
}

#[test]
#[serial]
fn secrets_resolved_from_env() {
    clear_env();
    unsafe {
        std::env::set_var("REPOSIFT_GITHUB_TOKEN", "ghp_test");
        std::env::set_var("REPOSIFT_OPENAI_API_KEY", "  ");
    }
    let mut config = Config::default();
    config.resolve_secrets();
    clear_env();

    assert_eq!(
        config.secrets.github_token.as_ref().map(Secret::expose),
        Some("ghp_test")
    );
    assert!(config.secrets.openai_api_key.is_none());
    assert!(!format!("{config:?}").contains("ghp_test"));
}

#[test]
#[serial]
fn secrets_are_never_read_from_file() {
    clear_env();
    let file = write_config("[secrets]\ngithub_token = \"from-file\"\n");
    let config = Config::load(file.path()).unwrap();
    assert!(config.secrets.github_token.is_none());
}

#[test]
fn chunking_options_mirror_config() {
    let mut config = Config::default();
    config.chunking.chunk_size = 20;
    config.chunking.include_submodules = false;
    let options = config.chunking.options();
    assert_eq!(options.chunk_size, 20);
    assert_eq!(options.overlap_size, 50);
    assert!(!options.include_submodules);
}

#[test]
fn provider_kind_round_trips_lowercase() {
    assert_eq!(ProviderKind::OpenAi.to_string(), "openai");
    let kind: ProviderKind = serde_json::from_str("\"ollama\"").unwrap();
    assert_eq!(kind, ProviderKind::Ollama);
}

#[test]
fn shipped_default_config_matches_builtin_defaults() {
    let shipped: Config = toml::from_str(include_str!("../../../../config/default.toml")).unwrap();
    let builtin = Config::default();
    assert_eq!(shipped.github.exclude, builtin.github.exclude);
    assert_eq!(shipped.chunking.options(), builtin.chunking.options());
    assert_eq!(shipped.embedding.model, builtin.embedding.model);
    assert_eq!(shipped.index.path, builtin.index.path);
    assert!(shipped.validate().is_ok());
}

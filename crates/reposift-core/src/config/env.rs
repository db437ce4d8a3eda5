use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_github();
        self.apply_env_overrides_chunking();
        self.apply_env_overrides_embedding();

        if let Ok(v) = std::env::var("REPOSIFT_INDEX_PATH") {
            self.index.path = v;
        }
        if let Ok(v) = std::env::var("REPOSIFT_INDEX_TOP_K")
            && let Ok(k) = v.parse::<usize>()
        {
            self.index.top_k = k;
        }
    }

    fn apply_env_overrides_github(&mut self) {
        if let Ok(v) = std::env::var("REPOSIFT_GITHUB_API_URL") {
            self.github.api_url = v;
        }
        if let Ok(v) = std::env::var("REPOSIFT_GITHUB_DEFAULT_BRANCH") {
            self.github.default_branch = v;
        }
        if let Ok(v) = std::env::var("REPOSIFT_GITHUB_EXCLUDE") {
            self.github.exclude = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Ok(v) = std::env::var("REPOSIFT_GITHUB_MAX_RETRIES")
            && let Ok(n) = v.parse::<u32>()
        {
            self.github.max_retries = n;
        }
    }

    fn apply_env_overrides_chunking(&mut self) {
        if let Ok(v) = std::env::var("REPOSIFT_CHUNK_SIZE")
            && let Ok(n) = v.parse::<usize>()
        {
            self.chunking.chunk_size = n;
        }
        if let Ok(v) = std::env::var("REPOSIFT_OVERLAP_SIZE")
            && let Ok(n) = v.parse::<usize>()
        {
            self.chunking.overlap_size = n;
        }
        if let Ok(v) = std::env::var("REPOSIFT_FUNCTIONS_PER_CHUNK")
            && let Ok(n) = v.parse::<usize>()
        {
            self.chunking.functions_per_chunk = n;
        }
        if let Ok(v) = std::env::var("REPOSIFT_FUNCTION_CHUNKING")
            && let Ok(enabled) = v.parse::<bool>()
        {
            self.chunking.function_chunking = enabled;
        }
        if let Ok(v) = std::env::var("REPOSIFT_INCLUDE_SUBMODULES")
            && let Ok(enabled) = v.parse::<bool>()
        {
            self.chunking.include_submodules = enabled;
        }
        if let Ok(v) = std::env::var("REPOSIFT_TOKENIZER_MODEL") {
            self.chunking.tokenizer_model = v;
        }
    }

    fn apply_env_overrides_embedding(&mut self) {
        if let Ok(v) = std::env::var("REPOSIFT_EMBEDDING_PROVIDER") {
            if let Ok(kind) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.embedding.provider = kind;
            } else {
                tracing::warn!("ignoring invalid REPOSIFT_EMBEDDING_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("REPOSIFT_EMBEDDING_BASE_URL") {
            self.embedding.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("REPOSIFT_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("REPOSIFT_EMBEDDING_MAX_RETRIES")
            && let Ok(n) = v.parse::<u32>()
        {
            self.embedding.max_retries = n;
        }
    }
}

use super::{Config, IndexBackend};

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_llm();
        self.apply_env_overrides_index();
        self.apply_env_overrides_retrieval();
    }

    fn apply_env_overrides_llm(&mut self) {
        if let Ok(v) = std::env::var("EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Ok(v) = std::env::var("CHAT_MODEL") {
            self.llm.chat_model = v;
        }
        if let Ok(v) = std::env::var("FINRAG_OPENAI_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("FINRAG_TEMPERATURE") {
            if let Ok(t) = v.parse::<f32>() {
                self.llm.temperature = t;
            } else {
                tracing::warn!("ignoring invalid FINRAG_TEMPERATURE value: {v}");
            }
        }
        if let Ok(v) = std::env::var("FINRAG_MAX_TOKENS") {
            if let Ok(n) = v.parse::<u32>() {
                self.llm.max_tokens = n;
            } else {
                tracing::warn!("ignoring invalid FINRAG_MAX_TOKENS value: {v}");
            }
        }
        if let Ok(v) = std::env::var("FINRAG_TIMEOUT_CONNECT")
            && let Ok(secs) = v.parse::<u64>()
        {
            self.timeouts.connect_secs = secs;
        }
        if let Ok(v) = std::env::var("FINRAG_TIMEOUT_REQUEST")
            && let Ok(secs) = v.parse::<u64>()
        {
            self.timeouts.request_secs = secs;
        }
    }

    fn apply_env_overrides_index(&mut self) {
        if let Ok(v) = std::env::var("FINRAG_INDEX_BACKEND") {
            if let Ok(kind) =
                serde_json::from_value::<IndexBackend>(serde_json::Value::String(v.clone()))
            {
                self.index.backend = kind;
            } else {
                tracing::warn!("ignoring invalid FINRAG_INDEX_BACKEND value: {v}");
            }
        }
        if let Ok(v) = std::env::var("FINRAG_INDEX_PATH") {
            self.index.path = v;
        }
        if let Ok(v) = std::env::var("FINRAG_QDRANT_URL") {
            self.index.qdrant_url = v;
        }
        if let Ok(v) = std::env::var("FINRAG_COLLECTION") {
            self.index.collection = v;
        }
        if let Ok(v) = std::env::var("FINRAG_VECTOR_SIZE") {
            if let Ok(n) = v.parse::<u64>() {
                self.index.vector_size = Some(n);
            } else {
                tracing::warn!("ignoring invalid FINRAG_VECTOR_SIZE value: {v}");
            }
        }
    }

    fn apply_env_overrides_retrieval(&mut self) {
        if let Ok(v) = std::env::var("FINRAG_CHUNK_SIZE")
            && let Ok(n) = v.parse::<usize>()
        {
            self.chunking.chunk_size = n;
        }
        if let Ok(v) = std::env::var("FINRAG_CHUNK_OVERLAP")
            && let Ok(n) = v.parse::<usize>()
        {
            self.chunking.chunk_overlap = n;
        }
        if let Ok(v) = std::env::var("FINRAG_TOP_K")
            && let Ok(n) = v.parse::<usize>()
        {
            self.retrieval.top_k = n;
        }
    }
}

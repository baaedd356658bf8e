use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CiptError, Result};

/// Top-level configuration for the CIPT assistant.
///
/// Loaded from `cipt.toml` by default. Each section corresponds to one
/// subsystem crate; every field has a default so a partial (or missing)
/// file still yields a runnable configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CiptConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
}

impl CiptConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CiptConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file is missing
    /// or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| CiptError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Port for the HTTP control surface.
    pub port: u16,
    /// Plain-text log of inbound messages. Empty disables it.
    pub message_log_path: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            port: 3000,
            message_log_path: "mensagens.log".to_string(),
        }
    }
}

/// Knowledge base build settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Extracted text of the internal regulations document.
    pub policy_path: String,
    /// Supplementary practical notes.
    pub notes_path: String,
    /// Cache artifact with chunks and their vectors.
    pub cache_path: String,
    /// Window size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive windows in characters.
    pub chunk_overlap: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            policy_path: "regimento.txt".to_string(),
            notes_path: "fontes.txt".to_string(),
            cache_path: "embeddings.json".to_string(),
            chunk_size: 1200,
            chunk_overlap: 200,
        }
    }
}

/// Semantic retrieval tunables.
///
/// Threshold and cap are deliberately configuration, not constants: observed
/// deployments ran with caps anywhere from 3 to 12.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Minimum cosine similarity for a chunk to count as relevant.
    pub relevance_threshold: f32,
    /// Maximum number of chunks returned per query.
    pub max_chunks: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: 0.72,
            max_chunks: 8,
        }
    }
}

/// Conversation session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum history entries kept per chat (oldest evicted first).
    pub history_limit: usize,
    /// Quiet period after which a session is closed, in seconds.
    pub idle_close_secs: u64,
    /// How often the sweeper scans for quiet sessions, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_limit: 6,
            idle_close_secs: 5 * 60,
            sweep_interval_secs: 30,
        }
    }
}

/// Hosted LLM and embedding service settings.
///
/// The API key is read from the `OPENAI_API_KEY` environment variable, never
/// from this file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,
    /// Chat completion model.
    pub chat_model: String,
    /// Embedding model.
    pub embedding_model: String,
    /// Token budget for composed answers.
    pub max_answer_tokens: u32,
    /// Sampling temperature for composed answers.
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            max_answer_tokens: 700,
            temperature: 0.2,
        }
    }
}

/// Billing (DAR) API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// Base URL of the billing API. Empty disables the billing flow.
    pub base_url: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
        }
    }
}

/// Ticket routing and human-contact settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Chat id of the support group notified about new tickets.
    pub support_group_id: String,
    /// Chat ids allowed to issue `<protocol> - <option>` status commands.
    pub responders: Vec<String>,
    /// Contact card for auditorium reservations.
    pub auditorium_contact_name: String,
    pub auditorium_contact_phone: String,
    /// Contact card for meeting-room questions (reception).
    pub reception_contact_name: String,
    pub reception_contact_phone: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            support_group_id: String::new(),
            responders: Vec::new(),
            auditorium_contact_name: "Reservas Auditório CIPT".to_string(),
            auditorium_contact_phone: "558287145526".to_string(),
            reception_contact_name: "Recepção CIPT".to_string(),
            reception_contact_phone: "558288334368".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = CiptConfig::default();
        assert_eq!(config.general.port, 3000);
        assert_eq!(config.knowledge.chunk_size, 1200);
        assert_eq!(config.knowledge.chunk_overlap, 200);
        assert!((config.retrieval.relevance_threshold - 0.72).abs() < f32::EPSILON);
        assert_eq!(config.retrieval.max_chunks, 8);
        assert_eq!(config.session.history_limit, 6);
        assert_eq!(config.session.idle_close_secs, 300);
        assert_eq!(config.llm.chat_model, "gpt-4o-mini");
        assert_eq!(config.llm.embedding_model, "text-embedding-3-small");
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"
port = 8080

[retrieval]
relevance_threshold = 0.65
max_chunks = 4

[routing]
support_group_id = "12036304@g.us"
responders = ["558200000001", "558200000002"]
"#;
        let file = create_temp_config(content);
        let config = CiptConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.port, 8080);
        assert!((config.retrieval.relevance_threshold - 0.65).abs() < f32::EPSILON);
        assert_eq!(config.retrieval.max_chunks, 4);
        assert_eq!(config.routing.support_group_id, "12036304@g.us");
        assert_eq!(config.routing.responders.len(), 2);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[session]
history_limit = 10
"#;
        let file = create_temp_config(content);
        let config = CiptConfig::load(file.path()).unwrap();
        assert_eq!(config.session.history_limit, 10);
        assert_eq!(config.session.idle_close_secs, 300);
        assert_eq!(config.knowledge.chunk_size, 1200);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = CiptConfig::load_or_default(Path::new("/nonexistent/cipt.toml"));
        assert_eq!(config.general.port, 3000);
    }

    #[test]
    fn test_load_invalid_toml_is_error() {
        let file = create_temp_config("this is {{ not valid TOML");
        assert!(CiptConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cipt.toml");

        let mut config = CiptConfig::default();
        config.routing.support_group_id = "grupo@g.us".to_string();
        config.save(&path).unwrap();

        let reloaded = CiptConfig::load(&path).unwrap();
        assert_eq!(reloaded.routing.support_group_id, "grupo@g.us");
        assert_eq!(reloaded.retrieval.max_chunks, config.retrieval.max_chunks);
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = CiptConfig::load(file.path()).unwrap();
        assert_eq!(config.session.history_limit, 6);
        assert_eq!(config.llm.max_answer_tokens, 700);
    }

    #[test]
    fn test_default_contacts() {
        let routing = RoutingConfig::default();
        assert_eq!(routing.auditorium_contact_phone, "558287145526");
        assert_eq!(routing.reception_contact_phone, "558288334368");
    }
}

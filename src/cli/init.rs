//! Init command implementation
//!
//! Writes a starter `research.toml`, `.env.example` and `.gitignore`.

use super::output::Output;
use super::SearchBackend;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
#[derive(Debug)]
pub enum InitResult {
    Success,
    /// research.toml already exists and `--force` was not given
    AlreadyExists,
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    pub path: PathBuf,
    pub force: bool,
    /// Web search backend for the `[search]` section
    pub search: SearchBackend,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing deep-research");

    let base_path = &config.path;
    if !base_path.exists() {
        if let Err(e) = fs::create_dir_all(base_path) {
            output.error(&format!("Failed to create {}: {}", base_path.display(), e));
            return InitResult::Error(e.to_string());
        }
        output.created_dir(&base_path.display().to_string());
    }

    let config_path = base_path.join("research.toml");
    if config_path.exists() && !config.force {
        output.warning("research.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    let toml_content = generate_research_toml(config.search);

    output.subheader("Creating configuration files");
    if let Err(e) = write_file(&config_path, &toml_content, config.force) {
        output.error(&format!("Failed to create research.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("config", "research.toml");

    let env_example_path = base_path.join(".env.example");
    if let Err(e) = write_file(&env_example_path, ENV_EXAMPLE, config.force) {
        output.error(&format!("Failed to create .env.example: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("env", ".env.example");

    let gitignore_path = base_path.join(".gitignore");
    if gitignore_path.exists() {
        output.skipped(".gitignore", "already exists");
    } else if let Err(e) = write_file(&gitignore_path, GITIGNORE, false) {
        output.warning(&format!("Failed to create .gitignore: {}", e));
    } else {
        output.created("file", ".gitignore");
    }

    output.complete("deep-research initialized");

    output.header("Next Steps");
    output.info("1. Set up environment variables:");
    output.command("cp .env.example .env");
    output.newline();
    output.info("2. Start Ollama (if not running):");
    output.command("ollama serve");
    output.command("ollama pull llama3.2");
    output.newline();
    output.info("3. Research a topic:");
    output.command("deep-research run \"quantum computing\"");

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(());
    }
    fs::write(path, content)
}

fn search_section(backend: SearchBackend) -> &'static str {
    match backend {
        SearchBackend::Tavily => "backend = \"tavily\"\napi_key_env = \"TAVILY_API_KEY\"",
        SearchBackend::Perplexity => {
            "backend = \"perplexity\"\napi_key_env = \"PERPLEXITY_API_KEY\"\nmodel = \"sonar-pro\""
        }
        SearchBackend::Duckduckgo => "backend = \"duckduckgo\"",
    }
}

fn generate_research_toml(backend: SearchBackend) -> String {
    let search = search_section(backend);
    format!(
        r#"# deep-research configuration
log_level = "info"

[llm]
base_url = "http://localhost:11434"
model = "llama3.2"
temperature = 0.0

[research]
# Reflection loops back while completed cycles <= max_loops,
# so max_loops + 1 fetch cycles run.
max_loops = 3
recall_top_k = 5
source_timeout_secs = 30
transcript_timeout_secs = 10
web_max_results = 1
web_max_tokens = 1000

[search]
# tavily | perplexity | duckduckgo
{search}

[youtube]
api_key_env = "YOUTUBE_API_KEY"

[memory]
# in-memory | pinecone
provider = "in-memory"
# provider = "pinecone"
# index_host = "my-index-abc123.svc.aped-1234.pinecone.io"
# namespace = "research"

# Both channels are attempted on every run. Without a recipient or
# webhook URL the attempt is reported as a failed notification.
[notify.email]
recipient = ""
# smtp_server = "smtp.gmail.com"
# smtp_port = 587

[notify.discord]
webhook_url_env = "DISCORD_WEBHOOK_URL"
"#
    )
}

const ENV_EXAMPLE: &str = r#"# deep-research environment variables
# Copy this file to .env and fill in the values.

# Web search (whichever backend research.toml selects)
TAVILY_API_KEY=
# PERPLEXITY_API_KEY=

# Video search
YOUTUBE_API_KEY=

# Memory store (provider = "pinecone")
# PINECONE_API_KEY=

# Email delivery
# SMTP_USERNAME=
# SMTP_PASSWORD=

# Chat webhook delivery
# DISCORD_WEBHOOK_URL=

# Optional: overrides log_level
# RUST_LOG=info,deep_research=debug
"#;

const GITIGNORE: &str = r#"# Environment
.env
.env.local

# Reports
reports/

# Rust
/target/
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::toml_config::ResearchConfig;
    use tempfile::TempDir;

    fn init_config(temp_dir: &TempDir, force: bool, search: SearchBackend) -> InitConfig {
        InitConfig {
            path: temp_dir.path().to_path_buf(),
            force,
            search,
        }
    }

    #[test]
    fn test_generated_toml_parses_for_every_backend() {
        for (backend, name) in [
            (SearchBackend::Tavily, "tavily"),
            (SearchBackend::Perplexity, "perplexity"),
        ] {
            let content = generate_research_toml(backend);
            let config = ResearchConfig::parse(&content).unwrap();
            assert_eq!(config.search.name(), name);
            assert!(config.notify.email.recipient.is_empty());
        }
    }

    #[cfg(feature = "duckduckgo")]
    #[test]
    fn test_generated_toml_parses_for_duckduckgo() {
        let content = generate_research_toml(SearchBackend::Duckduckgo);
        let config = ResearchConfig::parse(&content).unwrap();
        assert_eq!(config.search.name(), "duckduckgo");
    }

    #[test]
    fn test_write_file_skips_existing_without_force() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("f.txt");
        fs::write(&path, "original").unwrap();

        write_file(&path, "new", false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");

        write_file(&path, "new", true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_run_creates_all_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let result = run(init_config(&temp_dir, false, SearchBackend::Tavily), &Output::no_color());

        assert!(matches!(result, InitResult::Success));
        assert!(temp_dir.path().join("research.toml").exists());
        assert!(temp_dir.path().join(".env.example").exists());
        assert!(temp_dir.path().join(".gitignore").exists());
    }

    #[test]
    fn test_run_already_exists_without_force() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join("research.toml"), "existing").unwrap();

        let result = run(init_config(&temp_dir, false, SearchBackend::Tavily), &Output::no_color());
        assert!(matches!(result, InitResult::AlreadyExists));
    }

    #[test]
    fn test_run_force_overwrites() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join("research.toml"), "existing").unwrap();

        let result = run(init_config(&temp_dir, true, SearchBackend::Perplexity), &Output::no_color());
        assert!(matches!(result, InitResult::Success));

        let content = fs::read_to_string(temp_dir.path().join("research.toml")).unwrap();
        assert!(content.contains("backend = \"perplexity\""));
        assert!(!content.contains("existing"));
    }
}

//! Service configuration
//!
//! Values come from `config.toml` in the root folder, overridable per key
//! with `MDL_*` environment variables. Everything has a working default,
//! so a bare root folder is enough to start.

use mdl_common::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 5730;

/// Download service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP bind address
    pub bind_addr: String,
    /// Where downloaded audio lands
    pub output_dir: PathBuf,
    /// Failure exports and other per-job artifacts
    pub logs_dir: PathBuf,
    /// Durable job map
    pub jobs_file: PathBuf,
    /// Generation backend base URL
    pub ollama_url: String,
    /// Generation model name
    pub ollama_model: String,
    /// Media resolver binary name or path
    pub ytdlp_binary: String,
    /// Track count for generated playlists when the request omits one
    pub default_track_count: usize,
}

/// Raw `config.toml` shape; every key optional
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    port: Option<u16>,
    output_dir: Option<PathBuf>,
    logs_dir: Option<PathBuf>,
    jobs_file: Option<PathBuf>,
    ollama_url: Option<String>,
    ollama_model: Option<String>,
    ytdlp_binary: Option<String>,
    default_track_count: Option<usize>,
}

impl Config {
    /// Resolve configuration for a root folder
    pub fn load(root: &Path, port_override: Option<u16>) -> Result<Self> {
        let file = read_config_file(&root.join("config.toml"))?;

        let port = port_override
            .or_else(|| env_parse("MDL_PORT"))
            .or(file.port)
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            bind_addr: format!("127.0.0.1:{}", port),
            output_dir: env_path("MDL_OUTPUT_DIR")
                .or(file.output_dir)
                .unwrap_or_else(|| root.join("downloads")),
            logs_dir: env_path("MDL_LOGS_DIR")
                .or(file.logs_dir)
                .unwrap_or_else(|| root.join("logs")),
            jobs_file: env_path("MDL_JOBS_FILE")
                .or(file.jobs_file)
                .unwrap_or_else(|| root.join("jobs.json")),
            ollama_url: env_string("MDL_OLLAMA_URL")
                .or(file.ollama_url)
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
            ollama_model: env_string("MDL_OLLAMA_MODEL")
                .or(file.ollama_model)
                .unwrap_or_else(|| "ministral-3".to_string()),
            ytdlp_binary: env_string("MDL_YTDLP_BINARY")
                .or(file.ytdlp_binary)
                .unwrap_or_else(|| "yt-dlp".to_string()),
            default_track_count: env_parse("MDL_NUM_TRACKS")
                .or(file.default_track_count)
                .unwrap_or(30),
        })
    }

    /// Create the directories the service writes into
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir)?;
        std::fs::create_dir_all(&self.logs_dir)?;
        if let Some(parent) = self.jobs_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    match std::fs::read_to_string(path) {
        Ok(raw) => {
            toml::from_str(&raw).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(e.into()),
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_path(name: &str) -> Option<PathBuf> {
    env_string(name).map(PathBuf::from)
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_string(name).and_then(|v| v.parse().ok())
}

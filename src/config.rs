use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default well-known address of the engine progress channel. The engine
/// carries the same default, so both sides agree without any handshake.
pub const DEFAULT_CHANNEL_ADDR: &str = "127.0.0.1:47613";

const DEFAULT_ENGINE_CMD: &str = "bindery-engine";

/// Runtime configuration.
///
/// Resolution order for each value: CLI flag, environment variable,
/// `bindery.toml` in the data directory, built-in default.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub store_file: PathBuf,
    pub engine_cmd: String,
    pub channel_addr: SocketAddr,
    pub verbose: bool,
}

/// `bindery.toml` layout.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    engine: EngineSection,
}

#[derive(Debug, Default, Deserialize)]
struct EngineSection {
    command: Option<String>,
    channel: Option<String>,
}

/// Values supplied on the command line that override everything else.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub engine_cmd: Option<String>,
    pub channel: Option<String>,
    pub verbose: bool,
}

impl Config {
    pub fn load(overrides: Overrides) -> Result<Self> {
        let data_dir = match overrides.data_dir {
            Some(dir) => dir,
            None => match std::env::var_os("BINDERY_DATA_DIR") {
                Some(dir) => PathBuf::from(dir),
                None => dirs::data_dir()
                    .ok_or_else(|| anyhow!("could not determine a data directory"))?
                    .join("bindery"),
            },
        };

        let file = Self::read_config_file(&data_dir)?;

        let engine_cmd = overrides
            .engine_cmd
            .or_else(|| std::env::var("BINDERY_ENGINE").ok())
            .or(file.engine.command)
            .unwrap_or_else(|| DEFAULT_ENGINE_CMD.to_string());

        let channel = overrides
            .channel
            .or_else(|| std::env::var("BINDERY_CHANNEL").ok())
            .or(file.engine.channel)
            .unwrap_or_else(|| DEFAULT_CHANNEL_ADDR.to_string());
        let channel_addr: SocketAddr = channel
            .parse()
            .with_context(|| format!("invalid progress channel address: {channel}"))?;

        let store_file = data_dir.join("cases.json");

        Ok(Self {
            data_dir,
            store_file,
            engine_cmd,
            channel_addr,
            verbose: overrides.verbose,
        })
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("failed to create data directory {}", self.data_dir.display()))
    }

    fn read_config_file(data_dir: &PathBuf) -> Result<ConfigFile> {
        let path = data_dir.join("bindery.toml");
        if !path.exists() {
            return Ok(ConfigFile::default());
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }
}

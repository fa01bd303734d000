use std::{
    env, fs,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::{
    board::MIN_PLAYERS,
    error::{GameError, Result},
    player::DEFAULT_HAND_CAPACITY,
};

pub const CONFIG_ENV_VAR: &str = "APPLES_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub hand_capacity: usize,
    /// Bots fill the table up to this many players.
    pub min_players: usize,
    pub prompt_deck: PathBuf,
    pub answer_deck: PathBuf,
    pub network: NetworkConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            hand_capacity: DEFAULT_HAND_CAPACITY,
            min_players: MIN_PLAYERS,
            prompt_deck: PathBuf::from("resources/prompts.txt"),
            answer_deck: PathBuf::from("resources/answers.txt"),
            network: NetworkConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub host: IpAddr,
    pub port: u16,
    pub protocol_id: u64,
    pub max_clients: usize,
    /// Unset means a remote player is waited for indefinitely.
    pub request_timeout_secs: Option<u64>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            protocol_id: 0,
            max_clients: 16,
            request_timeout_secs: None,
        }
    }
}

impl NetworkConfig {
    pub fn address(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl GameConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| GameError::Resource {
            path: path.to_path_buf(),
            source,
        })?;
        let config: GameConfig =
            serde_json::from_str(&text).map_err(|source| GameError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Takes the config path from the first argument, else from
    /// `APPLES_CONFIG`, else falls back to the defaults.
    pub fn from_args<I>(mut args: I) -> Result<Self>
    where
        I: Iterator<Item = String>,
    {
        match args.next().or_else(|| env::var(CONFIG_ENV_VAR).ok()) {
            Some(path) => GameConfig::load(path),
            None => Ok(GameConfig::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.hand_capacity == 0 {
            return Err(GameError::Config(
                "hand_capacity must be at least 1".to_string(),
            ));
        }
        if self.min_players < MIN_PLAYERS {
            return Err(GameError::Config(format!(
                "min_players must be at least {MIN_PLAYERS}"
            )));
        }
        if self.network.max_clients == 0 {
            return Err(GameError::Config(
                "network.max_clients must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

use std::{path::Path, time::Duration};

use serde::Deserialize;
use uuid::Uuid;

use crate::error::SessionError;

pub const ORIGIN_ENV: &str = "BATTLE_SERVER_ORIGIN";
pub const SESSION_ID_ENV: &str = "BATTLE_SESSION_ID";
pub const TOOLS_URL_ENV: &str = "BATTLE_TOOLS_URL";

const WEBSOCKET_PATH: &str = "/ws/pokemon-game";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub origin: String,
    pub session_id: String,
    pub connect_timeout_ms: u64,
    pub reconnect_base_delay_ms: u64,
    pub max_reconnect_attempts: u32,
    pub log_capacity: usize,
    pub tools_base_url: String,
}

/// Values given on the command line. They win over everything else.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub origin: Option<String>,
    pub session_id: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8000".to_string(),
            session_id: Uuid::new_v4().to_string(),
            connect_timeout_ms: 10_000,
            reconnect_base_delay_ms: 2_000,
            max_reconnect_attempts: 5,
            log_capacity: 20,
            tools_base_url: "http://localhost:8000".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn from_cli_or_env_or_yaml(
        cli: CliOverrides,
        yaml_path: Option<&Path>,
    ) -> Result<Self, SessionError> {
        let yaml = yaml_path.map(std::fs::read_to_string).transpose()?;
        Self::resolve(cli, |key| std::env::var(key).ok(), yaml.as_deref())
    }

    /// Precedence per field: CLI, then environment, then YAML, then defaults.
    pub fn resolve<E>(cli: CliOverrides, env: E, yaml: Option<&str>) -> Result<Self, SessionError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut config = match yaml {
            Some(text) => serde_yaml::from_str(text)?,
            None => ClientConfig::default(),
        };

        if let Some(origin) = cli.origin.or_else(|| env(ORIGIN_ENV)) {
            config.origin = origin;
        }
        if let Some(session_id) = cli.session_id.or_else(|| env(SESSION_ID_ENV)) {
            config.session_id = session_id;
        }
        if let Some(tools_url) = env(TOOLS_URL_ENV) {
            config.tools_base_url = tools_url;
        }

        if config.session_id.trim().is_empty() {
            return Err(SessionError::Config("session id must not be empty".to_string()));
        }
        Ok(config)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn reconnect_base_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_base_delay_ms)
    }

    pub fn websocket_url(&self) -> Result<String, SessionError> {
        websocket_url(&self.origin, &self.session_id)
    }
}

/// Derives the socket address from the page origin, upgrading to `wss` when the origin is secure.
pub fn websocket_url(origin: &str, session_id: &str) -> Result<String, SessionError> {
    let origin = origin.trim().trim_end_matches('/');
    let (scheme, host) = if let Some(host) = origin.strip_prefix("https://") {
        ("wss", host)
    } else if let Some(host) = origin.strip_prefix("http://") {
        ("ws", host)
    } else if let Some(host) = origin.strip_prefix("wss://") {
        ("wss", host)
    } else if let Some(host) = origin.strip_prefix("ws://") {
        ("ws", host)
    } else {
        return Err(SessionError::InvalidOrigin(origin.to_string()));
    };
    if host.is_empty() {
        return Err(SessionError::InvalidOrigin(origin.to_string()));
    }
    if session_id.is_empty() || session_id.contains('/') {
        return Err(SessionError::Config(format!(
            "invalid session id {session_id:?}"
        )));
    }
    Ok(format!("{scheme}://{host}{WEBSOCKET_PATH}/{session_id}"))
}

use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_servers_file")]
    pub servers_file: String,

    #[serde(default = "default_server_ttl_secs")]
    pub server_ttl_secs: i64,
}

fn default_port() -> u16 {
    8080
}

fn default_servers_file() -> String {
    "servers.ini".to_string()
}

fn default_server_ttl_secs() -> i64 {
    // Game servers heartbeat roughly once a minute; six minutes of silence
    // means the server is gone.
    360
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;

        let settings: Config = config
            .try_deserialize()
            .unwrap_or_else(|_| Config::default());

        Ok(settings)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            servers_file: default_servers_file(),
            server_ttl_secs: default_server_ttl_secs(),
        }
    }
}

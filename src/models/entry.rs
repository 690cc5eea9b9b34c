use serde::{Deserialize, Serialize};

/// A game server known to the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    /// "host:port", unique key within the directory
    pub address: String,
    pub name: String,
    pub info: String,
    pub protocol: u32,
    /// Unix seconds of the last accepted heartbeat
    pub last_heartbeat: i64,
}

/// Parameters accepted by the directory endpoint.
///
/// Everything is optional on the wire: a heartbeat carries `port`, `name`,
/// `info` and `protocol`; a removal carries `port` alone; a pure listing
/// carries at most `format`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryParams {
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

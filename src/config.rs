use std::time::Duration;

use serde::Deserialize;

use crate::sources::LocationFix;

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpSettings {
    pub bind_addr: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestSettings {
    pub location_timeout_ms: u64,
    pub queue_capacity: usize,
    /// Treat stdin as a line-oriented scan source
    #[serde(default)]
    pub read_stdin: bool,
}

impl IngestSettings {
    pub fn location_timeout(&self) -> Duration {
        Duration::from_millis(self.location_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub database: DatabaseSettings,
    pub server: HttpSettings,
    pub ingest: IngestSettings,
    /// Fixed scanner position, if the scanner does not move
    pub location: Option<LocationFix>,
}

impl ServerConfig {
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .set_default("database.path", "tailgate.db")?
            .set_default("server.bind_addr", "0.0.0.0:3000")?
            .set_default("ingest.location_timeout_ms", 5000)?
            .set_default("ingest.queue_capacity", 256)?
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("TAILGATE").separator("__"))
            .build()?
            .try_deserialize::<ServerConfig>()?;

        Ok(settings)
    }
}

use anyhow::{anyhow, Context, Result};
use url::Url;

// ---------------------------------------------------------------------------
// BrokerAddress
// ---------------------------------------------------------------------------

/// Host/port pair extracted from `MQTT_BROKER`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddress {
    pub host: String,
    pub port: u16,
}

const DEFAULT_MQTT_PORT: u16 = 1883;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    /// SQLite connection string, e.g. `sqlite://energy_data.db`.
    pub database_url: String,
    pub broker: BrokerAddress,
    pub mqtt_client_id: String,
    /// Price per energy unit applied by the analytics endpoint.
    pub energy_cost_rate: f64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("PORT", "3000")
                .parse()
                .context("PORT must be a valid port number")?,
            database_url: optional("DATABASE_URL", "sqlite://energy_data.db"),
            broker: parse_broker_url(&optional("MQTT_BROKER", "mqtt://localhost:1883"))?,
            mqtt_client_id: optional("MQTT_CLIENT_ID", "smart-energy-api"),
            energy_cost_rate: parse_rate(&optional("ENERGY_COST_RATE", "0.12"))?,
        })
    }
}

/// Parse `mqtt://host[:port]` (or `tcp://`) into a [`BrokerAddress`].
fn parse_broker_url(raw: &str) -> Result<BrokerAddress> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid MQTT_BROKER: {raw:?}"))?;

    match url.scheme() {
        "mqtt" | "tcp" => {}
        other => return Err(anyhow!("unsupported MQTT_BROKER scheme: {other:?}")),
    }

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| anyhow!("MQTT_BROKER missing host: {raw:?}"))?
        .to_owned();

    Ok(BrokerAddress {
        host,
        port: url.port().unwrap_or(DEFAULT_MQTT_PORT),
    })
}

fn parse_rate(raw: &str) -> Result<f64> {
    let rate: f64 = raw
        .trim()
        .parse()
        .context("ENERGY_COST_RATE must be a number")?;
    if !rate.is_finite() || rate < 0.0 {
        return Err(anyhow!("ENERGY_COST_RATE must be a non-negative number, got {rate}"));
    }
    Ok(rate)
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

use anyhow::{bail, Context, Result};

// ---------------------------------------------------------------------------
// Broker address
// ---------------------------------------------------------------------------

/// Where the MQTT broker lives and whether to talk TLS to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddr {
    pub host: String,
    pub port: u16,
    pub tls: bool,
}

impl BrokerAddr {
    /// Parse `[scheme://]host[:port]`.
    ///
    /// `tls`/`ssl`/`mqtts` select an encrypted channel (default port 8883),
    /// `tcp`/`mqtt` select plain TCP (default port 1883).
    /// Without a scheme the channel is encrypted when the port is 8883 or
    /// when no port is given.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let (scheme, rest) = match raw.split_once("://") {
            Some((scheme, rest)) => (Some(scheme.to_ascii_lowercase()), rest),
            None => (None, raw),
        };
        let rest = rest.trim_end_matches('/');

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .with_context(|| format!("invalid MQTT broker port in {raw:?}"))?;
                (host, Some(port))
            }
            None => (rest, None),
        };

        if host.is_empty() {
            bail!("MQTT broker address has no host: {raw:?}");
        }

        let tls = match scheme.as_deref() {
            Some("tls" | "ssl" | "mqtts") => true,
            Some("tcp" | "mqtt") => false,
            Some(other) => bail!("unsupported MQTT broker scheme {other:?}"),
            None => port.map_or(true, |p| p == 8883),
        };

        Ok(Self {
            host: host.to_owned(),
            port: port.unwrap_or(if tls { 8883 } else { 1883 }),
            tls,
        })
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub mqtt_broker: BrokerAddr,
    pub mqtt_client_id: String,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    /// Topic (or filter) carrying device telemetry.
    pub readings_topic: String,
    /// Commands go to `{command_prefix}/{device_id}`.
    pub command_prefix: String,
    pub mqtt_keep_alive_secs: u64,
    pub server_host: String,
    pub server_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: required_any(&["DATABASE_URL", "POSTGRES_CONN_STR"])?,
            database_max_connections: optional("DATABASE_MAX_CONNECTIONS", "10")
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            mqtt_broker: BrokerAddr::parse(&required("MQTT_BROKER")?)?,
            mqtt_client_id: required("MQTT_CLIENT_ID")?,
            mqtt_username: std::env::var("MQTT_USERNAME").ok().filter(|s| !s.is_empty()),
            mqtt_password: std::env::var("MQTT_PASSWORD").ok(),
            readings_topic: optional("MQTT_READINGS_TOPIC", "sensors/readings"),
            command_prefix: optional("MQTT_COMMAND_PREFIX", "light"),
            mqtt_keep_alive_secs: optional("MQTT_KEEP_ALIVE_SECS", "30")
                .parse()
                .context("MQTT_KEEP_ALIVE_SECS must be a positive integer")?,
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional_any(&["PORT", "SERVER_PORT"], "8080")
                .parse()
                .context("PORT must be a valid port number")?,
        })
    }
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("missing required env var: {key}"))
}

fn required_any(keys: &[&str]) -> Result<String> {
    keys.iter()
        .find_map(|key| std::env::var(key).ok())
        .with_context(|| format!("missing required env var: one of {}", keys.join(", ")))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn optional_any(keys: &[&str], default: &str) -> String {
    keys.iter()
        .find_map(|key| std::env::var(key).ok())
        .unwrap_or_else(|| default.to_owned())
}

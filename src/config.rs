use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub mqtt: MqttConfig,
    #[serde(default)]
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub topics: TopicsConfig,
    /// Interval of the retained status re-publish, in seconds.
    #[serde(default = "default_publish_interval")]
    pub publish_interval_secs: u64,
    /// Snapshots older than this many days are swept daily; unset disables
    /// the sweep.
    pub retention_days: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive_secs: Option<u64>,
    pub clean_session: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: default_http_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicsConfig {
    #[serde(default = "default_heartbeat_topic")]
    pub heartbeat: String,
    #[serde(default = "default_control_topic")]
    pub control: String,
    #[serde(default = "default_feedback_topic")]
    pub feedback: String,
    #[serde(default = "default_status_topic")]
    pub status: String,
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            heartbeat: default_heartbeat_topic(),
            control: default_control_topic(),
            feedback: default_feedback_topic(),
            status: default_status_topic(),
        }
    }
}

fn default_publish_interval() -> u64 {
    5
}

fn default_http_port() -> u16 {
    8080
}

fn default_heartbeat_topic() -> String {
    "gateway/heartbeat".into()
}

fn default_control_topic() -> String {
    "pump/control".into()
}

fn default_feedback_topic() -> String {
    "pump/feedback".into()
}

fn default_status_topic() -> String {
    "pump/status".into()
}

impl Config {
    /// Load YAML from disk, substitute $(VAR)/${VAR} with env vars, then
    /// parse. `$$` escapes a literal `$`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let raw = fs::read_to_string(path)?;
        let expanded = expand_env_placeholders(&raw)?;
        let cfg: Self = serde_yaml::from_str(&expanded)?;
        anyhow::ensure!(
            !cfg.database.path.is_empty(),
            "config must set database.path"
        );
        anyhow::ensure!(
            cfg.publish_interval_secs > 0,
            "publish_interval_secs must be positive"
        );
        Ok(cfg)
    }
}

fn expand_env_placeholders(input: &str) -> Result<String, anyhow::Error> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        let (close, skip) = match tail.chars().next() {
            Some('$') => {
                out.push('$');
                rest = &tail[1..];
                continue;
            }
            Some('(') => (')', 1),
            Some('{') => ('}', 1),
            _ => {
                // Plain '$' (e.g. inside a password); keep as-is.
                out.push('$');
                rest = tail;
                continue;
            }
        };
        let body = &tail[skip..];
        let end = body
            .find(close)
            .ok_or_else(|| anyhow::anyhow!("unterminated env placeholder: missing '{}'", close))?;
        let var = &body[..end];
        let value = std::env::var(var)
            .map_err(|_| anyhow::anyhow!("missing environment variable: {}", var))?;
        out.push_str(&value);
        rest = &body[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_both_placeholder_styles() {
        std::env::set_var("PUMP_GATEWAY_TEST_HOST", "broker.local");
        let out =
            expand_env_placeholders("host: $(PUMP_GATEWAY_TEST_HOST) and ${PUMP_GATEWAY_TEST_HOST}")
                .unwrap();
        assert_eq!(out, "host: broker.local and broker.local");
    }

    #[test]
    fn double_dollar_escapes() {
        assert_eq!(expand_env_placeholders("pa$$word").unwrap(), "pa$word");
    }

    #[test]
    fn missing_variable_is_an_error() {
        assert!(expand_env_placeholders("$(PUMP_GATEWAY_TEST_UNSET_VAR)").is_err());
    }

    #[test]
    fn plain_dollar_passes_through() {
        assert_eq!(expand_env_placeholders("cost: $5").unwrap(), "cost: $5");
    }
}

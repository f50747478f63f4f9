use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use toml;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub app: App,
    pub auth: Auth,
    pub endpoints: Endpoints,
    pub http: Http,
}

// application identity, used to identify outbound requests
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct App {
    pub name: String,
    pub version: String,
}

impl Default for App {
    fn default() -> Self {
        App {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Auth {
    pub user_agent: String,
}

// base URLs; query strings are appended by the backends
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Endpoints {
    pub search: String,
    pub quote: String,
    pub market_data: String,
    pub close_prices: String,
    pub intraday_prices: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            search: "https://search.euroinvestor.dk/instruments".to_string(),
            quote: "https://api.euroinvestor.dk/instruments".to_string(),
            market_data: "https://api.euroinvestor.dk/instruments".to_string(),
            close_prices: "https://api.euroinvestor.dk/instruments".to_string(),
            intraday_prices: "https://api.euroinvestor.dk/instruments".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Http {
    pub timeout_secs: u64,
}

impl Default for Http {
    fn default() -> Self {
        Http { timeout_secs: 30 }
    }
}

impl Config {
    /// Every endpoint pointed at one base URL; handy for local mocks.
    pub fn with_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Config {
            endpoints: Endpoints {
                search: format!("{base}/search"),
                quote: format!("{base}/instruments"),
                market_data: format!("{base}/marketdata"),
                close_prices: format!("{base}/instruments"),
                intraday_prices: format!("{base}/instruments"),
            },
            ..Config::default()
        }
    }

    /// User agent sent on identified requests: `auth.user_agent`, or `name/version`.
    pub fn user_agent(&self) -> String {
        if self.auth.user_agent.is_empty() {
            format!("{}/{}", self.app.name, self.app.version)
        } else {
            self.auth.user_agent.clone()
        }
    }
}

pub fn load_toml(path: &str) -> Result<Config> {
    let mut file = File::open(path).with_context(|| format!("failed to open {path}"))?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .with_context(|| format!("failed to read {path}"))?;

    let mut config: Config =
        toml::from_str(&contents).with_context(|| format!("failed to parse {path} as TOML"))?;
    apply_env(&mut config);

    Ok(config)
}

/// Like [`load_toml`], but a missing file means built-in defaults.
pub fn load_or_default(path: &str) -> Result<Config> {
    if Path::new(path).exists() {
        return load_toml(path);
    }
    log::info!("{path} not found, using default configuration");
    let mut config = Config::default();
    apply_env(&mut config);
    Ok(config)
}

// .env (or the shell) wins over the file
fn apply_env(config: &mut Config) {
    if let Ok(user_agent) = std::env::var("USER_AGENT") {
        config.auth.user_agent = user_agent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: Config = toml::from_str("[app]\nname = \"harbour\"\n").unwrap();
        assert_eq!(config.app.name, "harbour");
        assert_eq!(config.app.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(config.http.timeout_secs, 30);
        assert!(config.endpoints.search.starts_with("https://search.euroinvestor.dk"));
    }

    #[test]
    fn user_agent_derived_from_identity() {
        let mut config = Config::default();
        config.app.name = "harbour".to_string();
        config.app.version = "1.2".to_string();
        assert_eq!(config.user_agent(), "harbour/1.2");

        config.auth.user_agent = "custom".to_string();
        assert_eq!(config.user_agent(), "custom");
    }

    #[test]
    fn load_missing_file_is_an_error() {
        assert!(load_toml("./does/not/exist.toml").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_or_default("./does/not/exist.toml").unwrap();
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn base_url_override() {
        let config = Config::with_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.endpoints.quote, "http://127.0.0.1:9000/instruments");
        assert_eq!(config.endpoints.search, "http://127.0.0.1:9000/search");
    }
}

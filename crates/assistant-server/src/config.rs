//! Server Configuration

use std::fmt;
use std::str::FromStr;

/// Where historical prices come from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PriceSource {
    #[default]
    Yahoo,
    /// Synthetic offline series
    Static,
}

impl FromStr for PriceSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yahoo" => Ok(Self::Yahoo),
            "static" | "demo" => Ok(Self::Static),
            other => Err(format!("unknown price source '{other}'")),
        }
    }
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yahoo => "yahoo",
            Self::Static => "static",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub price_source: PriceSource,
    /// Ask the LLM to explain rejected answers
    pub llm_enabled: bool,
    pub llm_model: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".into(),
            price_source: PriceSource::default(),
            llm_enabled: false,
            llm_model: "llama3.2".into(),
        }
    }
}

fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| {
            let port = match var("PORT").map(|p| p.parse::<u16>()) {
                Some(Ok(port)) => port,
                Some(Err(e)) => {
                    tracing::warn!("Ignoring invalid PORT: {}", e);
                    5000
                }
                None => 5000,
            };
            format!("0.0.0.0:{port}")
        });

        let price_source = match var("PRICE_SOURCE").map(|s| s.parse::<PriceSource>()) {
            Some(Ok(source)) => source,
            Some(Err(e)) => {
                tracing::warn!("Ignoring PRICE_SOURCE: {}", e);
                defaults.price_source
            }
            None => defaults.price_source,
        };

        Self {
            bind_addr,
            price_source,
            llm_enabled: var("LLM_ENABLED").is_some_and(|v| truthy(&v)),
            llm_model: var("LLM_MODEL").unwrap_or(defaults.llm_model),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(config(&[]), ServerConfig::default());
    }

    #[test]
    fn test_port_and_bind_addr() {
        assert_eq!(config(&[("PORT", "8080")]).bind_addr, "0.0.0.0:8080");
        assert_eq!(config(&[("PORT", "nope")]).bind_addr, "0.0.0.0:5000");
        assert_eq!(
            config(&[("PORT", "8080"), ("BIND_ADDR", "127.0.0.1:9000")]).bind_addr,
            "127.0.0.1:9000"
        );
    }

    #[test]
    fn test_price_source_and_llm() {
        let cfg = config(&[
            ("PRICE_SOURCE", "Static"),
            ("LLM_ENABLED", "true"),
            ("LLM_MODEL", "qwen2.5"),
        ]);
        assert_eq!(cfg.price_source, PriceSource::Static);
        assert!(cfg.llm_enabled);
        assert_eq!(cfg.llm_model, "qwen2.5");

        assert_eq!(config(&[("PRICE_SOURCE", "bloomberg")]).price_source, PriceSource::Yahoo);
        assert!(!config(&[("LLM_ENABLED", "0")]).llm_enabled);
    }
}

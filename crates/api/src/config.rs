//! Process configuration from environment variables.
//!
//! Every setting has a dev default; a value that fails to parse falls back to
//! the default with a warning instead of aborting startup.

use std::path::PathBuf;
use std::str::FromStr;

use shelfwise_ai::MAX_SUGGESTIONS;
use shelfwise_inventory::DemoConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// `BIND_ADDR`
    pub bind_addr: String,
    /// `MODEL_PATH`: where the trained demand model is persisted.
    pub model_path: PathBuf,
    /// `DEMO_BOOKS`, `DEMO_BRANCHES`, `DEMO_PERIODS`, `DEMO_SEED`
    pub demo: DemoConfig,
    /// `MAX_SUGGESTIONS`
    pub max_suggestions: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            model_path: PathBuf::from("data/demand_model.json"),
            demo: DemoConfig::default(),
            max_suggestions: MAX_SUGGESTIONS,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let model_path = lookup("MODEL_PATH").map(PathBuf::from).unwrap_or_else(|| {
            tracing::warn!(
                path = %defaults.model_path.display(),
                "MODEL_PATH not set; using dev default"
            );
            defaults.model_path.clone()
        });

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            model_path,
            demo: DemoConfig {
                books: parsed(&lookup, "DEMO_BOOKS", defaults.demo.books),
                branches: parsed(&lookup, "DEMO_BRANCHES", defaults.demo.branches),
                periods: parsed(&lookup, "DEMO_PERIODS", defaults.demo.periods),
                seed: parsed(&lookup, "DEMO_SEED", defaults.demo.seed),
            },
            max_suggestions: parsed(&lookup, "MAX_SUGGESTIONS", defaults.max_suggestions),
        }
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + core::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(key, value = %raw, default = %default, "unparseable setting; using default");
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        assert_eq!(ApiConfig::from_lookup(|_| None), ApiConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let cfg = ApiConfig::from_lookup(lookup_from(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("MODEL_PATH", "/tmp/model.json"),
            ("DEMO_BOOKS", "10"),
            ("DEMO_SEED", "7"),
            ("MAX_SUGGESTIONS", "5"),
        ]));
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
        assert_eq!(cfg.model_path, PathBuf::from("/tmp/model.json"));
        assert_eq!(cfg.demo.books, 10);
        assert_eq!(cfg.demo.branches, 5);
        assert_eq!(cfg.demo.seed, 7);
        assert_eq!(cfg.max_suggestions, 5);
    }

    #[test]
    fn unparseable_numbers_fall_back_to_defaults() {
        let cfg = ApiConfig::from_lookup(lookup_from(&[("DEMO_PERIODS", "lots")]));
        assert_eq!(cfg.demo.periods, 52);
    }
}

// src/config/crawler.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analyze::filters::{FilterRules, DEFAULT_AUTHOR_BLACKLIST, DEFAULT_URL_RULES};
use crate::analyze::gateway::ClassificationGateway;
use crate::analyze::spam::SpamRules;
use crate::ingest::fetch::DEFAULT_USER_AGENT;
use crate::pipeline::FailurePolicy;

pub const ENV_CONFIG_PATH: &str = "CRAWLER_CONFIG_PATH";

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;
const DEFAULT_CLASSIFY_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FiltersConfig {
    /// Regexes checked against blog entry links, first match wins.
    pub url_rules: Vec<String>,
    /// Exact Twitter display names to drop.
    pub author_blacklist: Vec<String>,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            url_rules: DEFAULT_URL_RULES.iter().map(|s| s.to_string()).collect(),
            author_blacklist: DEFAULT_AUTHOR_BLACKLIST
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CrawlerConfig {
    pub fetch_timeout_secs: u64,
    pub classify_timeout_secs: u64,
    /// Projects crawled in parallel. 1 = sequential.
    pub concurrency: usize,
    pub failure_policy: FailurePolicy,
    pub projects_path: PathBuf,
    pub database_path: PathBuf,
    pub user_agent: String,
    /// Code reported by the language detector when the text gives no signal.
    pub language_fallback: String,
    pub filters: FiltersConfig,
    pub spam: SpamRules,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            classify_timeout_secs: DEFAULT_CLASSIFY_TIMEOUT_SECS,
            concurrency: 1,
            failure_policy: FailurePolicy::default(),
            projects_path: PathBuf::from("config/projects.toml"),
            database_path: PathBuf::from("data/feedback.sqlite3"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            language_fallback: "en".to_string(),
            filters: FiltersConfig::default(),
            spam: SpamRules::default(),
        }
    }
}

impl CrawlerConfig {
    /// Load from an explicit path. TOML or JSON, picked by extension.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading crawler config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_config(&content, ext.as_str())
            .with_context(|| format!("parsing crawler config from {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// Load using env var + fallbacks:
    /// 1) $CRAWLER_CONFIG_PATH
    /// 2) config/crawler.toml
    /// 3) config/crawler.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        let toml_p = PathBuf::from("config/crawler.toml");
        if toml_p.exists() {
            return Self::load_from(&toml_p);
        }
        let json_p = PathBuf::from("config/crawler.json");
        if json_p.exists() {
            return Self::load_from(&json_p);
        }
        Ok(Self::default())
    }

    fn sanitized(mut self) -> Self {
        if self.fetch_timeout_secs == 0 {
            self.fetch_timeout_secs = DEFAULT_FETCH_TIMEOUT_SECS;
        }
        if self.classify_timeout_secs == 0 {
            self.classify_timeout_secs = DEFAULT_CLASSIFY_TIMEOUT_SECS;
        }
        self.concurrency = self.concurrency.max(1);
        if self.user_agent.trim().is_empty() {
            self.user_agent = DEFAULT_USER_AGENT.to_string();
        }
        if self.language_fallback.trim().is_empty() {
            self.language_fallback = "en".to_string();
        }
        self
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn classify_timeout(&self) -> Duration {
        Duration::from_secs(self.classify_timeout_secs)
    }

    /// Compile the blacklists. A bad URL pattern is a config error.
    pub fn filter_rules(&self) -> Result<FilterRules> {
        FilterRules::from_patterns(
            &self.filters.url_rules,
            self.filters.author_blacklist.iter().cloned(),
        )
        .context("compiling filters.url_rules")
    }

    /// Gateway over the built-in classifiers, with the configured timeout.
    pub fn local_gateway(&self) -> ClassificationGateway {
        crate::analyze::local_gateway(&self.language_fallback, &self.spam)
            .with_timeout(self.classify_timeout())
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<CrawlerConfig> {
    if hint_ext == "json" {
        return Ok(serde_json::from_str(s)?);
    }
    match toml::from_str::<CrawlerConfig>(s) {
        Ok(v) => Ok(v),
        Err(toml_err) => serde_json::from_str(s).map_err(|_| anyhow!(toml_err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = parse_config("", "toml").unwrap();
        assert_eq!(cfg, CrawlerConfig::default());
        assert_eq!(cfg.filters.url_rules.len(), 3);
        assert_eq!(cfg.failure_policy, FailurePolicy::PerEntry);
    }

    #[test]
    fn partial_toml_overrides_only_given_keys() {
        let s = r#"
concurrency = 4
failure_policy = "per_feed"

[filters]
author_blacklist = ["spammer (spammer)"]

[spam]
max_links = 1
"#;
        let cfg = parse_config(s, "toml").unwrap();
        assert_eq!(cfg.concurrency, 4);
        assert_eq!(cfg.failure_policy, FailurePolicy::PerFeed);
        assert_eq!(cfg.filters.author_blacklist, vec!["spammer (spammer)"]);
        assert_eq!(cfg.filters.url_rules.len(), 3);
        assert_eq!(cfg.spam.max_links, 1);
        assert!(!cfg.spam.phrases.is_empty());
    }

    #[test]
    fn zero_values_are_sanitized() {
        let cfg = parse_config(r#"{"concurrency": 0, "fetch_timeout_secs": 0}"#, "json")
            .unwrap()
            .sanitized();
        assert_eq!(cfg.concurrency, 1);
        assert_eq!(cfg.fetch_timeout(), Duration::from_secs(20));
    }

    #[test]
    fn bad_url_rule_is_a_config_error() {
        let mut cfg = CrawlerConfig::default();
        cfg.filters.url_rules = vec!["(".into()];
        assert!(cfg.filter_rules().is_err());
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_CONFIG_PATH);

        assert_eq!(CrawlerConfig::load_default().unwrap(), CrawlerConfig::default());

        fs::create_dir_all(tmp.path().join("config")).unwrap();
        fs::write(tmp.path().join("config/crawler.toml"), "concurrency = 3").unwrap();
        assert_eq!(CrawlerConfig::load_default().unwrap().concurrency, 3);

        let p_env = tmp.path().join("other.json");
        fs::write(&p_env, r#"{"concurrency": 5}"#).unwrap();
        env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
        assert_eq!(CrawlerConfig::load_default().unwrap().concurrency, 5);

        env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml"));
        assert!(CrawlerConfig::load_default().is_err());
        env::remove_var(ENV_CONFIG_PATH);

        env::set_current_dir(&old).unwrap();
    }
}

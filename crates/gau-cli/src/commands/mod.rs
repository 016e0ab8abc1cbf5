//! Command handler modules for the `gau` binary.
//!
//! Shared wiring (config → store → session) lives here.
//! Command-specific logic lives in the submodules.

pub mod allocate;
pub mod search;

use std::sync::Arc;

use anyhow::{bail, Result};
use gau_alloc::{
    AllocationSession, AllocationStore, CategorySearch, Notifier, TracingNotifier,
};
use gau_config::{AppConfig, StoreConfig};
use gau_store::{HttpAllocationStore, JsonFileStore};
use tracing::debug;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Everything a command needs, built once from the layered config.
pub struct Context {
    pub config: AppConfig,
    pub store: Arc<dyn AllocationStore>,
    pub search: Arc<dyn CategorySearch>,
    pub notifier: Arc<dyn Notifier>,
}

impl Context {
    pub fn from_paths(paths: &[String]) -> Result<Self> {
        let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
        let loaded = gau_config::load_layered_yaml(&refs)?;
        let config = AppConfig::from_loaded(&loaded)?;
        debug!(config_hash = %config.config_hash, "config loaded");

        let (store, search) = match &config.store {
            StoreConfig::File { path } => backend(JsonFileStore::new(path)),
            StoreConfig::Http {
                base_url,
                token_env,
            } => {
                let token = token_env.as_deref().and_then(|k| std::env::var(k).ok());
                backend(HttpAllocationStore::new(base_url).with_bearer_token(token))
            }
        };

        Ok(Self {
            config,
            store,
            search,
            notifier: Arc::new(TracingNotifier),
        })
    }

    pub fn session(&self) -> AllocationSession {
        AllocationSession::new(self.store.clone(), self.notifier.clone())
            .with_messages(self.config.messages.session_messages())
    }
}

fn backend<T>(s: T) -> (Arc<dyn AllocationStore>, Arc<dyn CategorySearch>)
where
    T: AllocationStore + CategorySearch + 'static,
{
    let s = Arc::new(s);
    (s.clone(), s)
}

/// Right-hand side of an `--line GAU=VALUE` argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineValue {
    Amount(String),
    Percent(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocationLine {
    pub gau_id: String,
    pub value: LineValue,
}

/// Parse `GAU=400` or `GAU=30%`.
pub fn parse_line(raw: &str) -> Result<AllocationLine> {
    let Some((gau, value)) = raw.split_once('=') else {
        bail!("invalid --line '{raw}'. expected GAU=AMOUNT or GAU=PERCENT%");
    };
    let gau = gau.trim();
    if gau.is_empty() {
        bail!("invalid --line '{raw}'. GAU id is empty");
    }
    let value = value.trim();
    let value = match value.strip_suffix('%') {
        Some(p) => LineValue::Percent(p.trim().to_string()),
        None => LineValue::Amount(value.to_string()),
    };
    Ok(AllocationLine {
        gau_id: gau.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_amount_and_percent_lines() {
        assert_eq!(
            parse_line("g1=400").unwrap(),
            AllocationLine {
                gau_id: "g1".into(),
                value: LineValue::Amount("400".into())
            }
        );
        assert_eq!(
            parse_line(" g2 = 30 % ").unwrap().value,
            LineValue::Percent("30".into())
        );
    }

    #[test]
    fn blank_value_is_kept_for_coercion() {
        assert_eq!(parse_line("g1=").unwrap().value, LineValue::Amount(String::new()));
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!(parse_line("g1").is_err());
        assert!(parse_line("=40").is_err());
    }
}

use anyhow::{anyhow, bail, Result};
use gau_alloc::{LookupSettings, SessionMessages};
use serde::Deserialize;

use crate::LoadedConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    File,
    Http,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreConfig {
    File { path: String },
    /// `token_env` names the environment variable holding a bearer token.
    Http {
        base_url: String,
        token_env: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub min_term_length: usize,
    pub default_icon: String,
    pub error_message: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        let s = LookupSettings::default();
        Self {
            min_term_length: s.min_term_length,
            default_icon: s.default_icon,
            error_message: s.error_message,
        }
    }
}

impl LookupConfig {
    pub fn settings(&self) -> LookupSettings {
        LookupSettings {
            min_term_length: self.min_term_length,
            default_icon: self.default_icon.clone(),
            error_message: self.error_message.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    pub save_success: String,
    pub missing_fields: Option<String>,
    /// Overrides `lookup.error_message` when set.
    pub lookup_error: Option<String>,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        let m = SessionMessages::default();
        Self {
            save_success: m.save_success,
            missing_fields: m.missing_fields,
            lookup_error: None,
        }
    }
}

impl MessagesConfig {
    pub fn session_messages(&self) -> SessionMessages {
        SessionMessages {
            save_success: self.save_success.clone(),
            missing_fields: self.missing_fields.clone(),
        }
    }
}

/// Typed view of a [`LoadedConfig`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub lookup: LookupConfig,
    pub messages: MessagesConfig,
    pub config_hash: String,
}

#[derive(Deserialize)]
struct RawStore {
    kind: StoreKind,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    token_env: Option<String>,
}

#[derive(Deserialize)]
struct RawApp {
    store: Option<RawStore>,
    #[serde(default)]
    lookup: LookupConfig,
    #[serde(default)]
    messages: MessagesConfig,
}

impl AppConfig {
    pub fn from_loaded(loaded: &LoadedConfig) -> Result<Self> {
        let raw: RawApp = serde_json::from_value(loaded.config_json.clone())
            .map_err(|e| anyhow!("CONFIG_INVALID {e}"))?;

        let Some(store) = raw.store else {
            bail!("CONFIG_INVALID missing key=/store");
        };
        let store = match store.kind {
            StoreKind::File => match non_empty(store.path) {
                Some(path) => StoreConfig::File { path },
                None => bail!("CONFIG_INVALID missing key=/store/path"),
            },
            StoreKind::Http => match non_empty(store.base_url) {
                Some(url) => StoreConfig::Http {
                    base_url: url.trim_end_matches('/').to_string(),
                    token_env: non_empty(store.token_env),
                },
                None => bail!("CONFIG_INVALID missing key=/store/base_url"),
            },
        };

        if raw.lookup.min_term_length == 0 {
            bail!("CONFIG_INVALID key=/lookup/min_term_length must be >= 1");
        }
        let mut lookup = raw.lookup;
        if let Some(msg) = raw.messages.lookup_error.clone() {
            lookup.error_message = msg;
        }

        Ok(Self {
            store,
            lookup,
            messages: raw.messages,
            config_hash: loaded.config_hash.clone(),
        })
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

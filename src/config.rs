use crate::canvas::FontStack;
use log::warn;
use std::env;
use std::path::PathBuf;

// Debug vs release address
#[cfg(debug_assertions)]
const DEFAULT_ADDRESS: &str = "127.0.0.1:8080";
#[cfg(not(debug_assertions))]
const DEFAULT_ADDRESS: &str = "0.0.0.0:8080";

const DEFAULT_BACKGROUND: &str = "./assets/tkb_background.png";
const DEFAULT_FONT_DIR: &str = "./fonts";
const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq)]
pub struct TlsFiles {
    pub private_key: PathBuf,
    pub certificate_chain: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub address: String,
    /// Background template reference: path, http(s) URL or data URI
    pub background: String,
    pub fonts: FontStack,
    pub tls: Option<TlsFiles>,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            address: DEFAULT_ADDRESS.to_string(),
            background: DEFAULT_BACKGROUND.to_string(),
            fonts: FontStack::for_families(&PathBuf::from(DEFAULT_FONT_DIR)),
            tls: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset or empty keys keep their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = ServerConfig::default();

        if let Some(address) = get("TKB_ADDRESS") {
            config.address = address;
        }

        if let Some(background) = get("TKB_BACKGROUND") {
            config.background = background;
        }

        if let Some(fonts) = get("TKB_FONTS") {
            config.fonts = FontStack::from_paths(env::split_paths(&fonts).collect());
        } else if let Some(dir) = get("TKB_FONT_DIR") {
            config.fonts = FontStack::for_families(&PathBuf::from(dir));
        }

        match (get("TKB_TLS_KEY"), get("TKB_TLS_CERT")) {
            (Some(key), Some(cert)) => {
                config.tls = Some(TlsFiles {
                    private_key: PathBuf::from(key),
                    certificate_chain: PathBuf::from(cert),
                })
            }
            (None, None) => {}
            _ => warn!("Only one of TKB_TLS_KEY and TKB_TLS_CERT is set, serving plain HTTP"),
        }

        if let Some(limit) = get("TKB_MAX_BODY_BYTES") {
            match limit.trim().parse::<usize>() {
                Ok(limit) => config.max_body_bytes = limit,
                Err(_) => warn!(
                    "TKB_MAX_BODY_BYTES={} is not a number, using {}",
                    limit, config.max_body_bytes
                ),
            }
        }

        config
    }
}

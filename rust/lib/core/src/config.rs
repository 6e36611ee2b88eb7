use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Where a context keeps its devices and sales.
///
/// Serialized as a tagged table inside the client config:
///
/// ```toml
/// [contexts.store]
/// backend = "sqlite"
/// path = "/var/lib/celcontrol/shop.sqlite"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Local SQLite database file.
    Sqlite {
        path: PathBuf,
    },

    /// Remote PostgREST endpoint (e.g. `https://<project>.supabase.co/rest/v1`).
    Rest {
        url: String,

        /// Sent as both `apikey` and bearer token.
        #[serde(default, skip_serializing_if = "String::is_empty")]
        api_key: String,
    },
}

impl StoreConfig {
    /// Build a SQLite store config, resolving relative paths against `base_dir`.
    pub fn sqlite(path: &str, base_dir: &Path) -> Self {
        let path = PathBuf::from(path);
        let path = if path.is_absolute() {
            path
        } else {
            base_dir.join(path)
        };
        StoreConfig::Sqlite { path }
    }

    /// Check the config is usable before opening a gateway.
    pub fn validate(&self) -> Result<(), ServiceError> {
        match self {
            StoreConfig::Sqlite { path } => {
                if path.as_os_str().is_empty() {
                    return Err(ServiceError::Config("sqlite path is empty".into()));
                }
            }
            StoreConfig::Rest { url, .. } => {
                let url = url.trim();
                if url.is_empty() {
                    return Err(ServiceError::Config("store url is empty".into()));
                }
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ServiceError::Config(format!(
                        "store url must start with http:// or https://, got \"{url}\""
                    )));
                }
            }
        }
        Ok(())
    }

    /// Short human-readable description, never including the API key.
    pub fn describe(&self) -> String {
        match self {
            StoreConfig::Sqlite { path } => format!("sqlite:{}", path.display()),
            StoreConfig::Rest { url, .. } => url.trim_end_matches('/').to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_relative_path() {
        let cfg = StoreConfig::sqlite("shop.sqlite", Path::new("/home/ana/.celcontrol"));
        assert_eq!(
            cfg,
            StoreConfig::Sqlite {
                path: PathBuf::from("/home/ana/.celcontrol/shop.sqlite")
            }
        );

        let cfg = StoreConfig::sqlite("/data/shop.sqlite", Path::new("/ignored"));
        assert_eq!(cfg.describe(), "sqlite:/data/shop.sqlite");
    }

    #[test]
    fn test_validate_rest_url() {
        let ok = StoreConfig::Rest {
            url: "https://abc.supabase.co/rest/v1/".into(),
            api_key: "k".into(),
        };
        assert!(ok.validate().is_ok());
        assert_eq!(ok.describe(), "https://abc.supabase.co/rest/v1");

        let empty = StoreConfig::Rest {
            url: "  ".into(),
            api_key: String::new(),
        };
        assert!(matches!(empty.validate(), Err(ServiceError::Config(_))));

        let bad = StoreConfig::Rest {
            url: "ftp://example.com".into(),
            api_key: String::new(),
        };
        assert!(matches!(bad.validate(), Err(ServiceError::Config(_))));
    }

    #[test]
    fn test_toml_tagged_roundtrip() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            store: StoreConfig,
        }

        let w = Wrapper {
            store: StoreConfig::Rest {
                url: "http://localhost:3000".into(),
                api_key: String::new(),
            },
        };
        let s = toml::to_string(&w).unwrap();
        assert!(s.contains("backend = \"rest\""));
        assert!(!s.contains("api_key"));

        let back: Wrapper = toml::from_str(&s).unwrap();
        assert_eq!(back.store, w.store);
    }
}

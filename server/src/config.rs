use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr};

use foodgram_core::PageSettings;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub media_root: PathBuf,
    /// URL prefix under which files in `media_root` are served.
    pub media_url: String,
    pub pages: PageSettings,
    pub short_link_base: String,
    pub session_ttl_days: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            media_root: PathBuf::from("media"),
            media_url: "/media/".to_string(),
            pages: PageSettings::default(),
            short_link_base: "https://foodgram.example.org".to_string(),
            session_ttl_days: 30,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let settings = Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            bind_addr: try_load("BIND_ADDR", defaults.bind_addr)?,
            media_root: PathBuf::from(try_load::<String>("MEDIA_ROOT", "media".to_string())?),
            media_url: normalize_media_url(&try_load("MEDIA_URL", defaults.media_url)?),
            pages: PageSettings {
                default_size: try_load("PAGE_SIZE", defaults.pages.default_size)?,
                max_size: try_load("MAX_PAGE_SIZE", defaults.pages.max_size)?,
            },
            short_link_base: try_load("SHORT_LINK_BASE", defaults.short_link_base)?
                .trim_end_matches('/')
                .to_string(),
            session_ttl_days: try_load("SESSION_TTL_DAYS", defaults.session_ttl_days)?,
        };

        let pages = settings.pages;
        if pages.default_size < 1 || pages.max_size < pages.default_size {
            return Err(ConfigError::Invalid {
                key: "PAGE_SIZE",
                value: pages.default_size.to_string(),
                reason: format!("must be between 1 and MAX_PAGE_SIZE ({})", pages.max_size),
            });
        }

        Ok(settings)
    }
}

fn try_load<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

/// Media URLs always start and end with a slash.
fn normalize_media_url(url: &str) -> String {
    let trimmed = url.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

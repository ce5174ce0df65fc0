use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::qr::DEFAULT_DURATION;

const DEFAULT_API_URL: &str = "https://sunnysidecode.com/miagepresences/api";

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub api_base_url: String,
    pub data_dir: PathBuf,
    pub http_timeout_secs: u64,
    pub sync_interval_secs: u64,
    pub scan_cooldown_ms: u64,
    pub qr_duration_mins: u32,
    pub pdf_command: Option<String>,
}

impl Config {
    /// Builds the configuration from an arbitrary key lookup, so tests never touch the process env.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("PRESENCES_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        reqwest::Url::parse(&api_base_url)
            .map_err(|e| AppError::Config(format!("PRESENCES_API_URL: {}", e)))?;

        let data_dir = match lookup("PRESENCES_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir(),
        };

        let sync_interval_secs = match lookup("PRESENCES_SYNC_INTERVAL") {
            Some(raw) => parse_interval_secs(&raw)
                .ok_or_else(|| AppError::Config(format!("PRESENCES_SYNC_INTERVAL: {}", raw)))?,
            None => 3600,
        };

        Ok(Config {
            api_base_url,
            data_dir,
            http_timeout_secs: lookup("PRESENCES_HTTP_TIMEOUT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            sync_interval_secs,
            scan_cooldown_ms: lookup("PRESENCES_SCAN_COOLDOWN_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(2000),
            qr_duration_mins: lookup("PRESENCES_QR_DURATION")
                .and_then(|v| v.trim_end_matches('m').parse().ok())
                .unwrap_or(DEFAULT_DURATION),
            pdf_command: lookup("PRESENCES_PDF_COMMAND").filter(|c| !c.trim().is_empty()),
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    pub fn scan_cooldown(&self) -> Duration {
        Duration::from_millis(self.scan_cooldown_ms)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("local.db")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.data_dir.join("reports")
    }
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("fr", "miage", "presences")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".presences"))
}

/// Accepts `1h`, `30m`, `45s` or a bare number of seconds.
fn parse_interval_secs(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let (digits, factor) = if let Some(v) = raw.strip_suffix('h') {
        (v, 3600)
    } else if let Some(v) = raw.strip_suffix('m') {
        (v, 60)
    } else if let Some(v) = raw.strip_suffix('s') {
        (v, 1)
    } else {
        (raw, 1)
    };
    let value: u64 = digits.trim().parse().ok()?;
    if value == 0 {
        return None;
    }
    Some(value * factor)
}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;

use crate::models::Coordinates;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_PAGE_TITLE: &str = "Recommendify";
const LOG_FILE_NAME: &str = "recommendify.log";

/// Where the client gets the device position from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationSource {
    /// Look the position up from the public IP address.
    Auto,
    /// Behaves like a user who refused location access.
    Disabled,
    Fixed(Coordinates),
}

impl LocationSource {
    fn parse(raw: &str) -> Result<Self> {
        let value = raw.trim();
        match value.to_ascii_lowercase().as_str() {
            "" | "auto" => return Ok(Self::Auto),
            "off" | "none" | "disabled" => return Ok(Self::Disabled),
            _ => {}
        }

        let Some((lat, lon)) = value.split_once(',') else {
            bail!("expected 'auto', 'off' or '<lat>,<lon>', got '{value}'");
        };
        let latitude: f64 = lat
            .trim()
            .parse()
            .with_context(|| format!("invalid latitude '{}'", lat.trim()))?;
        let longitude: f64 = lon
            .trim()
            .parse()
            .with_context(|| format!("invalid longitude '{}'", lon.trim()))?;

        let coordinates = Coordinates::new(latitude, longitude);
        if !coordinates.is_valid() {
            bail!("coordinates out of range: {latitude},{longitude}");
        }
        Ok(Self::Fixed(coordinates))
    }
}

/// Settings handed to the client once at startup. Nothing mutates them afterwards.
#[derive(Clone, Debug)]
pub struct AppConfig {
    api_base_url: String,
    page_title: String,
    location_source: LocationSource,
    log_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            page_title: DEFAULT_PAGE_TITLE.to_string(),
            location_source: LocationSource::Auto,
            log_path: default_log_dir().join(LOG_FILE_NAME),
        }
    }
}

impl AppConfig {
    /// Reads `RECOMMENDIFY_*` variables, after merging a local `.env` if one exists.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("RECOMMENDIFY_API_URL").filter(|v| !v.trim().is_empty()) {
            config.api_base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(title) = lookup("RECOMMENDIFY_TITLE").filter(|v| !v.trim().is_empty()) {
            config.page_title = title;
        }
        if let Some(raw) = lookup("RECOMMENDIFY_LOCATION") {
            config.location_source = LocationSource::parse(&raw)
                .context("invalid RECOMMENDIFY_LOCATION")?;
        }
        if let Some(path) = lookup("RECOMMENDIFY_LOG").filter(|v| !v.trim().is_empty()) {
            config.log_path = PathBuf::from(path);
        }

        Ok(config)
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn page_title(&self) -> &str {
        &self.page_title
    }

    pub fn location_source(&self) -> LocationSource {
        self.location_source
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Ensures the directory holding the log file exists.
    pub fn ensure_filesystem(&self) -> Result<()> {
        if let Some(dir) = self.log_path().parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }
}

fn default_log_dir() -> PathBuf {
    ProjectDirs::from("", "", "recommendify")
        .map(|dirs| dirs.data_local_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("data"))
}

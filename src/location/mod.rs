pub mod ip;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::config::{AppConfig, LocationSource};
use crate::models::Coordinates;

pub use ip::IpLocator;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("location access denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    PositionUnavailable(String),
    #[error("timed out waiting for a position")]
    Timeout,
}

/// One-shot "where is the device right now" capability.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_location(&self) -> Result<Coordinates, LocationError>;
}

#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_location(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledLocation;

#[async_trait]
impl LocationProvider for DisabledLocation {
    async fn current_location(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::PermissionDenied)
    }
}

pub fn from_config(config: &AppConfig) -> Result<Arc<dyn LocationProvider>> {
    let provider: Arc<dyn LocationProvider> = match config.location_source() {
        LocationSource::Auto => Arc::new(IpLocator::new()?),
        LocationSource::Disabled => Arc::new(DisabledLocation),
        LocationSource::Fixed(coordinates) => Arc::new(FixedLocation(coordinates)),
    };
    Ok(provider)
}

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::models::Coordinates;

use super::{LocationError, LocationProvider};

const IP_API_ENDPOINT: &str = "http://ip-api.com/json/?fields=status,message,lat,lon";

/// Approximates the device position from its public IP address.
#[derive(Clone)]
pub struct IpLocator {
    http: Client,
    endpoint: Url,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

impl IpLocator {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .build()
            .context("unable to construct http client for location lookup")?;
        Self::with_endpoint(http, IP_API_ENDPOINT)
    }

    pub fn with_endpoint(http: Client, endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("invalid location endpoint: {endpoint}"))?;
        Ok(Self { http, endpoint })
    }
}

#[async_trait]
impl LocationProvider for IpLocator {
    async fn current_location(&self) -> Result<Coordinates, LocationError> {
        let response = self
            .http
            .get(self.endpoint.clone())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(lookup_error)?;

        let body: IpApiResponse = response.json().await.map_err(lookup_error)?;
        coordinates_from(body)
    }
}

fn lookup_error(err: reqwest::Error) -> LocationError {
    if err.is_timeout() {
        LocationError::Timeout
    } else {
        LocationError::PositionUnavailable(err.to_string())
    }
}

fn coordinates_from(body: IpApiResponse) -> Result<Coordinates, LocationError> {
    if body.status != "success" {
        let reason = body.message.unwrap_or_else(|| body.status.clone());
        return Err(LocationError::PositionUnavailable(reason));
    }

    match (body.lat, body.lon) {
        (Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
        _ => Err(LocationError::PositionUnavailable(
            "lookup returned no coordinates".to_string(),
        )),
    }
}

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

const LOCAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Body of a `POST /recommend` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendRequest {
    pub lat: f64,
    pub lon: f64,
    pub user_input: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Weather {
    pub description: String,
    #[serde(rename = "temperature")]
    pub temperature_celsius: f64,
    #[serde(default)]
    pub feels_like: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct RecommendationItem {
    pub name: String,
    pub artist: String,
    pub genre: String,
    pub mood: String,
    #[serde(rename = "album_cover", deserialize_with = "nullable_string")]
    pub album_cover_url: String,
    pub spotify_url: Option<String>,
}

impl RecommendationItem {
    /// The listen link, only when the server resolved a non-empty Spotify url.
    pub fn listen_link(&self) -> Option<&str> {
        self.spotify_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
    }

    pub fn meta_line(&self) -> String {
        format!("{} • Mood: {}", self.genre, self.mood)
    }

    pub fn has_cover(&self) -> bool {
        !self.album_cover_url.is_empty()
    }
}

/// Full response bundle of a successful recommendation request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultPayload {
    pub time_of_day: String,
    pub weather: Weather,
    pub recommendations: Vec<RecommendationItem>,
    #[serde(default, deserialize_with = "local_time")]
    pub local_time: Option<NaiveDateTime>,
}

impl ResultPayload {
    pub fn temperature_label(&self) -> String {
        format!("{}°C", self.weather.temperature_celsius)
    }
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// The server formats this itself; a malformed value just hides the line.
fn local_time<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| NaiveDateTime::parse_from_str(&value, LOCAL_TIME_FORMAT).ok()))
}

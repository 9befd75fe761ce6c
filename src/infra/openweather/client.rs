use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::fetch::auth::UrlParam;
use crate::fetch::{BasicClient, HttpClient, fetch_bytes};
use crate::services::weather_api::{Coordinates, CurrentConditions, WeatherApi};

#[derive(Deserialize)]
struct CurrentWeatherResponse {
    main: MainBlock,
    clouds: CloudsBlock,
    /// Metres; the API omits it occasionally.
    visibility: Option<f64>,
    weather: Vec<ConditionBlock>,
}

#[derive(Deserialize)]
struct MainBlock {
    temp: f64,
    humidity: f64,
}

#[derive(Deserialize)]
struct CloudsBlock {
    /// Percent, 0–100.
    all: f64,
}

#[derive(Deserialize)]
struct ConditionBlock {
    main: String,
    icon: String,
}

/// Client for the OpenWeatherMap current-weather endpoint.
///
/// The API key is sent as the `appid` query parameter. `base_url` may point
/// at a proxy that forwards to `https://api.openweathermap.org/data/2.5`.
pub struct OpenWeatherClient<C = BasicClient> {
    base_url: String,
    http: UrlParam<C>,
}

impl OpenWeatherClient<BasicClient> {
    pub fn new(base_url: &str, api_key: String) -> Self {
        Self::with_client(BasicClient::new(), base_url, api_key)
    }
}

impl<C: HttpClient> OpenWeatherClient<C> {
    pub fn with_client(inner: C, base_url: &str, api_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: UrlParam::new(inner, "appid", api_key),
        }
    }

    fn weather_url(&self, at: Coordinates) -> String {
        format!(
            "{}/weather?lat={}&lon={}&units=metric",
            self.base_url, at.latitude, at.longitude
        )
    }
}

/// Decodes a current-weather JSON body into [`CurrentConditions`].
pub(crate) fn parse_current_conditions(body: &[u8]) -> Result<CurrentConditions> {
    let resp: CurrentWeatherResponse =
        serde_json::from_slice(body).context("Failed to parse weather response")?;

    let condition = resp
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Weather response has no condition entry"))?;

    Ok(CurrentConditions {
        temperature: resp.main.temp,
        humidity: resp.main.humidity,
        cloud_fraction: (resp.clouds.all / 100.0).clamp(0.0, 1.0),
        visibility_km: resp.visibility.unwrap_or(10_000.0) / 1000.0,
        condition: condition.main,
        icon: condition.icon,
    })
}

#[async_trait]
impl<C: HttpClient> WeatherApi for OpenWeatherClient<C> {
    #[tracing::instrument(skip(self))]
    async fn current_conditions(&self, at: Coordinates) -> Result<CurrentConditions> {
        let body = fetch_bytes(&self.http, &self.weather_url(at))
            .await
            .context("Weather API request failed")?;
        debug!(bytes = body.len(), "Weather response received");

        parse_current_conditions(&body)
    }
}

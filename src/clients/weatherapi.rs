//! Weather provider client (WeatherAPI current conditions).

use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::field::Empty;
use tracing::{Instrument, Span};
use url::Url;

use super::{join_url, WeatherLookup};
use crate::domain::WeatherSample;
use crate::observability::span::{attrs, names, SpanScope};

/// Value of the `api` span attribute.
pub const API_NAME: &str = "weatherapi";

#[derive(Debug, Error)]
pub enum WeatherLookupError {
    #[error("weather provider returned status {0}")]
    Status(u16),

    #[error("weather provider request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct WeatherApiClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl fmt::Debug for WeatherApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl WeatherApiClient {
    pub fn new(
        http: Client,
        base_url: &str,
        api_key: impl Into<String>,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            api_key: api_key.into(),
        })
    }

    async fn fetch(&self, locality: &str) -> Result<WeatherSample, WeatherLookupError> {
        let span = Span::current();

        // Query pairs are percent-encoded by reqwest.
        let response = self
            .http
            .get(join_url(&self.base_url, "/v1/current.json"))
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", locality),
                ("lang", "pt"),
            ])
            .send()
            .await?;

        let status = response.status();
        span.record(attrs::HTTP_STATUS_CODE, i64::from(status.as_u16()));
        if status != StatusCode::OK {
            return Err(WeatherLookupError::Status(status.as_u16()));
        }

        let sample = WeatherSample::from(response.json::<CurrentPayload>().await?);
        span.record(attrs::WEATHER_LOCATION, sample.location.as_str());
        span.record(attrs::WEATHER_TEMP_C, sample.temp_c);
        span.record(attrs::WEATHER_CONDITION, sample.condition.as_str());

        Ok(sample)
    }
}

#[async_trait]
impl WeatherLookup for WeatherApiClient {
    async fn current(&self, locality: &str) -> Result<WeatherSample, WeatherLookupError> {
        let scope = SpanScope::open(tracing::info_span!(
            names::GET_WEATHER_INFO,
            otel.kind = "client",
            localidade = locality,
            api = API_NAME,
            http.status_code = Empty,
            weather.location = Empty,
            weather.temp_c = Empty,
            weather.condition = Empty,
            otel.status_code = Empty,
            otel.status_message = Empty,
        ));

        let result = self.fetch(locality).instrument(scope.span().clone()).await;
        scope.close(result)
    }
}

#[derive(Debug, Deserialize)]
struct CurrentPayload {
    location: LocationPayload,
    current: ConditionsPayload,
}

#[derive(Debug, Deserialize)]
struct LocationPayload {
    name: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct ConditionsPayload {
    temp_c: f64,
    #[serde(default)]
    condition: ConditionText,
}

#[derive(Debug, Default, Deserialize)]
struct ConditionText {
    #[serde(default)]
    text: String,
}

impl From<CurrentPayload> for WeatherSample {
    fn from(payload: CurrentPayload) -> Self {
        Self {
            location: payload.location.name,
            region: payload.location.region,
            country: payload.location.country,
            temp_c: payload.current.temp_c,
            condition: payload.current.condition.text,
        }
    }
}

//! Postal code registry client (ViaCEP).
//!
//! A lookup is "not found" when the registry answers 200 with the `erro`
//! flag set, or with an empty `localidade`. Both are checked independently.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::field::Empty;
use tracing::{Instrument, Span};
use url::Url;

use super::{join_url, PostalLookup};
use crate::domain::{Cep, PostalCodeRecord};
use crate::observability::span::{attrs, names, SpanScope};

/// Value of the `api` span attribute.
pub const API_NAME: &str = "viacep";

#[derive(Debug, Error)]
pub enum PostalLookupError {
    #[error("zipcode not found in postal registry")]
    NotFound,

    #[error("postal registry returned status {0}")]
    Status(u16),

    #[error("postal registry request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct ViaCepClient {
    http: Client,
    base_url: Url,
}

impl ViaCepClient {
    pub fn new(http: Client, base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
        })
    }

    fn endpoint(&self, cep: &Cep) -> String {
        join_url(&self.base_url, &format!("/ws/{cep}/json/"))
    }

    async fn fetch(&self, cep: &Cep) -> Result<PostalCodeRecord, PostalLookupError> {
        let span = Span::current();

        let response = self.http.get(self.endpoint(cep)).send().await?;
        let status = response.status();
        span.record(attrs::HTTP_STATUS_CODE, i64::from(status.as_u16()));

        if status != StatusCode::OK {
            return Err(PostalLookupError::Status(status.as_u16()));
        }

        let payload: ViaCepPayload = response.json().await?;
        let record = payload.into_record();
        span.record(attrs::CEP_FOUND, record.is_ok());

        let record = record?;
        span.record(attrs::LOCALIDADE, record.locality.as_str());
        span.record(attrs::UF, record.region.as_str());
        tracing::debug!(cep = %cep, locality = %record.locality, "postal code resolved");

        Ok(record)
    }
}

#[async_trait]
impl PostalLookup for ViaCepClient {
    async fn lookup(&self, cep: &Cep) -> Result<PostalCodeRecord, PostalLookupError> {
        let scope = SpanScope::open(tracing::info_span!(
            names::GET_CEP_INFO,
            otel.kind = "client",
            cep = %cep,
            api = API_NAME,
            http.status_code = Empty,
            cep.found = Empty,
            localidade = Empty,
            uf = Empty,
            otel.status_code = Empty,
            otel.status_message = Empty,
        ));

        let result = self.fetch(cep).instrument(scope.span().clone()).await;
        scope.close(result)
    }
}

/// Registry response body. Every field may be absent on an error reply.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ViaCepPayload {
    cep: String,
    logradouro: String,
    complemento: String,
    bairro: String,
    localidade: String,
    uf: String,
    ibge: String,
    ddd: String,
    #[serde(deserialize_with = "flag")]
    erro: bool,
}

impl ViaCepPayload {
    fn into_record(self) -> Result<PostalCodeRecord, PostalLookupError> {
        if self.erro || self.localidade.trim().is_empty() {
            return Err(PostalLookupError::NotFound);
        }

        Ok(PostalCodeRecord {
            cep: self.cep,
            street: self.logradouro,
            complement: self.complemento,
            neighborhood: self.bairro,
            locality: self.localidade,
            region: self.uf,
            ibge: self.ibge,
            ddd: self.ddd,
        })
    }
}

/// The registry sends `"erro": true` or `"erro": "true"`.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Text(text) => text.trim().eq_ignore_ascii_case("true"),
    })
}

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::country::RawCountry;
use crate::domain::CVError;

pub const COUNTRIES_QUERY: &str =
    "query GetCountries { countries { code name emoji continent { name } } }";

/// Anything that can hand out the raw country list.
#[async_trait]
pub trait CountrySource: Send + Sync {
    async fn fetch_countries(&self) -> Result<Vec<RawCountry>, CVError>;
}

#[derive(Serialize)]
struct GraphQLRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct GraphQLResponse {
    data: Option<CountriesData>,
    #[serde(default)]
    errors: Vec<GraphQLErrorMessage>,
}

#[derive(Deserialize)]
struct GraphQLErrorMessage {
    message: String,
}

#[derive(Deserialize)]
struct CountriesData {
    countries: Option<Vec<RawCountry>>,
}

/// GraphQL client for the countries API. Answers repeated queries from an
/// in-memory response cache that lives as long as the client.
pub struct GraphQLClient {
    http: Client,
    endpoint: String,
    cache: Mutex<HashMap<String, Vec<RawCountry>>>,
}

impl GraphQLClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, CVError> {
        let endpoint = endpoint.into();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(CVError::InvalidEndpoint(endpoint));
        }
        Ok(Self {
            http: Client::new(),
            endpoint,
            cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn query(&self, query: &str) -> Result<Vec<RawCountry>, CVError> {
        if let Some(cached) = self.cache.lock().await.get(query) {
            debug!("Answering query from cache ({} countries)", cached.len());
            return Ok(cached.clone());
        }

        info!("Querying {} ...", self.endpoint);
        let response = self
            .http
            .post(&self.endpoint)
            .json(&GraphQLRequest { query })
            .send()
            .await?
            .error_for_status()?;
        let body = response.bytes().await?;
        let parsed: GraphQLResponse = serde_json::from_slice(&body)?;

        if !parsed.errors.is_empty() {
            let messages: Vec<String> = parsed.errors.into_iter().map(|e| e.message).collect();
            warn!("GraphQL errors: {:?}", messages);
            return Err(CVError::GraphQL(messages));
        }

        let countries = parsed
            .data
            .and_then(|d| d.countries)
            .ok_or(CVError::MissingData)?;
        info!("Received {} countries", countries.len());

        self.cache
            .lock()
            .await
            .insert(query.to_string(), countries.clone());
        Ok(countries)
    }
}

#[async_trait]
impl CountrySource for GraphQLClient {
    async fn fetch_countries(&self) -> Result<Vec<RawCountry>, CVError> {
        self.query(COUNTRIES_QUERY).await
    }
}

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::auth::CredentialProvider;
use crate::error::{Result, RfError};
use crate::pagination::{Page, PageFetcher, RouteToggler};
use crate::types::{
    Aircraft, Airline, AirlineFleet, Airport, AuthSession, RouteDetails, SavedRoute,
    SavedRouteDetails, SearchCriteria, SearchRoute,
};

pub const DEFAULT_BASE_URL: &str = "https://routes-api.cnrstvns.dev";

/// REST client for the routes API. Requests go out with a bearer token when
/// the credential provider yields one, unauthenticated otherwise; the server
/// decides whether that is acceptable per endpoint.
pub struct RoutesApi {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl fmt::Debug for RoutesApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutesApi")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RoutesApi {
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            credentials,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let mut request = self.client.get(self.url(path)).query(query);
        if let Some(token) = self.credentials.token() {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RfError::Api(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RfError::Api(format!("routes API {}: {}", status, text)));
        }

        response.json().await.map_err(|e| RfError::Api(e.to_string()))
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<()> {
        let mut request = self.client.post(self.url(path)).json(&body);
        if let Some(token) = self.credentials.token() {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RfError::Api(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RfError::Api(format!("routes API {}: {}", status, text)));
        }

        Ok(())
    }

    pub async fn list_aircraft(&self, page: u32, limit: u32) -> Result<Page<Aircraft>> {
        self.get_json("/v1/aircraft", &page_params(page, limit, None))
            .await
    }

    pub async fn list_airlines(
        &self,
        page: u32,
        limit: u32,
        query: Option<&str>,
    ) -> Result<Page<Airline>> {
        self.get_json("/v1/airlines", &page_params(page, limit, query))
            .await
    }

    pub async fn airline_fleet(&self, airline_id: i64) -> Result<AirlineFleet> {
        self.get_json(&format!("/v1/airlines/{}/aircraft", airline_id), &[])
            .await
    }

    pub async fn list_airports(
        &self,
        page: u32,
        limit: u32,
        query: Option<&str>,
    ) -> Result<Page<Airport>> {
        self.get_json("/v1/airports", &page_params(page, limit, query))
            .await
    }

    pub async fn retrieve_airport(&self, id: i64) -> Result<Airport> {
        self.get_json(&format!("/v1/airports/{}", id), &[]).await
    }

    pub async fn list_saved_routes(
        &self,
        page: u32,
        limit: u32,
        query: Option<&str>,
    ) -> Result<Page<SavedRoute>> {
        self.get_json("/v1/user_routes", &page_params(page, limit, query))
            .await
    }

    pub async fn retrieve_saved_route(&self, id: i64) -> Result<SavedRouteDetails> {
        self.get_json(&format!("/v1/user_routes/{}", id), &[]).await
    }

    /// Save or unsave a route. Idempotent by route id on the server.
    pub async fn toggle_saved_route(&self, route_id: i64) -> Result<()> {
        self.post("/v1/user_routes/toggle", json!({ "routeId": route_id }))
            .await
    }

    pub async fn search_routes(
        &self,
        criteria: &SearchCriteria,
        page: u32,
        limit: u32,
    ) -> Result<Page<SearchRoute>> {
        self.get_json("/v1/routes/search", &search_params(criteria, page, limit))
            .await
    }

    pub async fn retrieve_route(&self, route_id: i64) -> Result<RouteDetails> {
        self.get_json(&format!("/v1/routes/{}", route_id), &[])
            .await
    }

    pub async fn session(&self) -> Result<AuthSession> {
        self.get_json("/auth/session", &[]).await
    }
}

fn page_params(page: u32, limit: u32, query: Option<&str>) -> Vec<(&'static str, String)> {
    let mut params = vec![("page", page.to_string()), ("limit", limit.to_string())];
    if let Some(q) = query {
        params.push(("q", q.to_string()));
    }
    params
}

fn search_params(criteria: &SearchCriteria, page: u32, limit: u32) -> Vec<(&'static str, String)> {
    vec![
        ("aircraft", criteria.aircraft.join(",")),
        ("airline", criteria.airline.clone()),
        ("minDuration", criteria.min_duration.to_string()),
        ("maxDuration", criteria.max_duration.to_string()),
        ("page", page.to_string()),
        ("limit", limit.to_string()),
    ]
}

// Adapters binding one endpoint each to the pagination controller.

pub struct AircraftPages(pub Arc<RoutesApi>);

#[async_trait]
impl PageFetcher<Aircraft> for AircraftPages {
    // The aircraft listing is not searchable; the query is ignored.
    async fn fetch(&self, page: u32, limit: u32, _query: Option<&str>) -> Result<Page<Aircraft>> {
        self.0.list_aircraft(page, limit).await
    }
}

pub struct AirlinePages(pub Arc<RoutesApi>);

#[async_trait]
impl PageFetcher<Airline> for AirlinePages {
    async fn fetch(&self, page: u32, limit: u32, query: Option<&str>) -> Result<Page<Airline>> {
        self.0.list_airlines(page, limit, query).await
    }
}

pub struct AirportPages(pub Arc<RoutesApi>);

#[async_trait]
impl PageFetcher<Airport> for AirportPages {
    async fn fetch(&self, page: u32, limit: u32, query: Option<&str>) -> Result<Page<Airport>> {
        self.0.list_airports(page, limit, query).await
    }
}

pub struct SavedRoutePages(pub Arc<RoutesApi>);

#[async_trait]
impl PageFetcher<SavedRoute> for SavedRoutePages {
    async fn fetch(&self, page: u32, limit: u32, query: Option<&str>) -> Result<Page<SavedRoute>> {
        self.0.list_saved_routes(page, limit, query).await
    }
}

/// Search results carry their criteria; a new search constructs a fresh
/// paginator around a fresh instance of this fetcher.
pub struct RouteSearchPages {
    pub api: Arc<RoutesApi>,
    pub criteria: SearchCriteria,
}

#[async_trait]
impl PageFetcher<SearchRoute> for RouteSearchPages {
    async fn fetch(&self, page: u32, limit: u32, _query: Option<&str>) -> Result<Page<SearchRoute>> {
        self.api.search_routes(&self.criteria, page, limit).await
    }
}

pub struct SavedRouteToggle(pub Arc<RoutesApi>);

#[async_trait]
impl RouteToggler for SavedRouteToggle {
    async fn toggle(&self, route_id: i64) -> Result<()> {
        self.0.toggle_saved_route(route_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_doubled_slashes() {
        struct NoToken;
        impl CredentialProvider for NoToken {
            fn token(&self) -> Option<String> {
                None
            }
        }

        let api = RoutesApi::new("https://example.com/", Arc::new(NoToken));
        assert_eq!(api.url("/v1/aircraft"), "https://example.com/v1/aircraft");
    }

    #[test]
    fn page_params_omit_absent_query() {
        let params = page_params(2, 10, None);
        assert_eq!(
            params,
            vec![("page", "2".to_string()), ("limit", "10".to_string())]
        );

        let params = page_params(1, 5, Some("lhr"));
        assert!(params.contains(&("q", "lhr".to_string())));
    }

    #[test]
    fn search_params_flatten_criteria() {
        let criteria = SearchCriteria {
            aircraft: vec!["77W".into(), "388".into()],
            airline: "BA".into(),
            min_duration: 30,
            max_duration: 1200,
        };
        let params = search_params(&criteria, 1, 10);
        assert!(params.contains(&("aircraft", "77W,388".to_string())));
        assert!(params.contains(&("airline", "BA".to_string())));
        assert!(params.contains(&("minDuration", "30".to_string())));
        assert!(params.contains(&("maxDuration", "1200".to_string())));
    }
}

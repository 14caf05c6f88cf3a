//! HTTP client for the Cosmos DB control plane
//!
//! A thin `reqwest` wrapper around the three REST operations the service
//! uses. A client is built per request and dropped when the request ends;
//! releasing the underlying connections is the drop.

use reqwest::header::{CONTENT_TYPE, IF_MATCH};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use super::auth::{rfc1123_now, MasterKey};
use super::models::{Collection, CollectionFeed, Offer, OfferFeed, OfferQuery};
use crate::config::CosmosSettings;

/// REST API version all requests are pinned to
pub const API_VERSION: &str = "2018-12-31";

/// Errors that can occur when calling the Cosmos DB control plane
#[derive(Error, Debug)]
pub enum CosmosError {
    #[error("Account key is not valid base64")]
    InvalidKey,

    #[error("Invalid account endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Request was rejected by the account (unauthorized)")]
    Unauthorized,

    #[error("Request was throttled by the account")]
    Throttled,

    #[error("Offer was modified by a concurrent request")]
    PreconditionFailed,

    #[error("More than one offer matched collection '{0}'")]
    AmbiguousOffer(String),

    #[error("Cosmos DB error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Error body shape, e.g. `{"code":"NotFound","message":"..."}`
#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// Client scoped to one account (endpoint + master key)
pub struct CosmosClient {
    http: Client,
    endpoint: Url,
    key: MasterKey,
}

impl CosmosClient {
    /// Build a client from the configured endpoint, key, and timeout
    pub fn new(settings: &CosmosSettings) -> Result<Self, CosmosError> {
        let endpoint = Url::parse(&settings.uri)
            .map_err(|_| CosmosError::InvalidEndpoint(settings.uri.clone()))?;
        let key = MasterKey::from_base64(&settings.app_key)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_seconds))
            .build()?;

        Ok(Self { http, endpoint, key })
    }

    /// List the collections of a database
    pub async fn list_collections(
        &self,
        database_id: &str,
    ) -> Result<Vec<Collection>, CosmosError> {
        let link = format!("dbs/{}", database_id);
        let url = self.url(&format!("{}/colls", link))?;

        tracing::debug!(database_id = %database_id, "Listing collections");

        let response = self
            .signed(self.http.get(url), "GET", "colls", &link)
            .send()
            .await?;
        let feed: CollectionFeed = Self::check(response).await?.json().await?;

        Ok(feed.collections)
    }

    /// Resolve a collection by id, `None` when the database has no match
    pub async fn find_collection(
        &self,
        database_id: &str,
        container_id: &str,
    ) -> Result<Option<Collection>, CosmosError> {
        let collections = self.list_collections(database_id).await?;
        Ok(collections.into_iter().find(|c| c.id == container_id))
    }

    /// Query the offer provisioned for a collection locator.
    ///
    /// Zero matches is `None`; more than one match is an error, the
    /// control plane associates exactly one offer with a collection.
    pub async fn offer_for(
        &self,
        collection_self_link: &str,
    ) -> Result<Option<Offer>, CosmosError> {
        let url = self.url("offers")?;
        let body = serde_json::to_string(&OfferQuery::by_resource_link(collection_self_link))?;

        tracing::debug!(resource_link = %collection_self_link, "Querying offer");

        // Cross-partition offer queries sign with an empty resource link
        let response = self
            .signed(self.http.post(url), "POST", "offers", "")
            .header(CONTENT_TYPE, "application/query+json")
            .header("x-ms-documentdb-isquery", "True")
            .body(body)
            .send()
            .await?;
        let feed: OfferFeed = Self::check(response).await?.json().await?;
        single_offer(feed, collection_self_link)
    }

    /// Replace an offer, carrying the full resource body.
    ///
    /// Sends `If-Match` with the offer's etag so a concurrent update
    /// surfaces as `PreconditionFailed` instead of silently losing an
    /// increment.
    pub async fn replace_offer(&self, offer: &Offer) -> Result<Offer, CosmosError> {
        let url = self.url(&format!("offers/{}", offer.rid))?;

        tracing::debug!(
            offer_rid = %offer.rid,
            throughput_ru = offer.throughput(),
            "Replacing offer"
        );

        // Offer resource ids are signed lowercased
        let link = offer.rid.to_lowercase();
        let mut request = self
            .signed(self.http.put(url), "PUT", "offers", &link)
            .json(offer);
        if let Some(etag) = &offer.etag {
            request = request.header(IF_MATCH, etag);
        }

        let response = request.send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    fn url(&self, path: &str) -> Result<Url, CosmosError> {
        self.endpoint
            .join(path)
            .map_err(|_| CosmosError::InvalidEndpoint(path.to_string()))
    }

    /// Attach the date, version, and authorization headers
    fn signed(
        &self,
        builder: RequestBuilder,
        verb: &str,
        resource_type: &str,
        resource_link: &str,
    ) -> RequestBuilder {
        let date = rfc1123_now();
        let token = self.key.authorization(verb, resource_type, resource_link, &date);

        builder
            .header("authorization", token)
            .header("x-ms-date", date)
            .header("x-ms-version", API_VERSION)
    }

    /// Map non-success statuses onto the error taxonomy
    async fn check(response: Response) -> Result<Response, CosmosError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let raw = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&raw)
            .ok()
            .and_then(|body| body.message)
            .unwrap_or(raw);

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CosmosError::Unauthorized,
            StatusCode::TOO_MANY_REQUESTS => CosmosError::Throttled,
            StatusCode::PRECONDITION_FAILED => CosmosError::PreconditionFailed,
            _ => CosmosError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }
}

/// Triage an offer query feed: zero matches is `None`, one match is the
/// offer, anything more is an ambiguity error
fn single_offer(
    feed: OfferFeed,
    collection_self_link: &str,
) -> Result<Option<Offer>, CosmosError> {
    let mut offers = feed.offers;
    match offers.len() {
        0 => Ok(None),
        1 => Ok(Some(offers.remove(0))),
        _ => Err(CosmosError::AmbiguousOffer(
            collection_self_link.to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CosmosSettings;

    const TEST_KEY: &str =
        "C2y6yDjf5/R+ob0N8A7Cgv30VRDJIWEHLM+4QDU5DE2nQ9nDuVTqobD4b8mGGyPMbIZnqyMsEcaGQy67XIw/Jw==";

    fn settings() -> CosmosSettings {
        CosmosSettings {
            uri: "https://localhost:8081/".to_string(),
            app_key: TEST_KEY.to_string(),
            database_id: "ToDoList".to_string(),
            container_id: "Items".to_string(),
            ru_increment: "400".to_string(),
            request_timeout_seconds: 30,
        }
    }

    #[test]
    fn test_client_construction() {
        assert!(CosmosClient::new(&settings()).is_ok());
    }

    #[test]
    fn test_bad_key_fails_construction() {
        let mut s = settings();
        s.app_key = "###".to_string();
        assert!(matches!(
            CosmosClient::new(&s),
            Err(CosmosError::InvalidKey)
        ));
    }

    #[test]
    fn test_bad_endpoint_fails_construction() {
        let mut s = settings();
        s.uri = "not a url".to_string();
        assert!(matches!(
            CosmosClient::new(&s),
            Err(CosmosError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_url_join() {
        let client = CosmosClient::new(&settings()).unwrap();
        let url = client.url("dbs/ToDoList/colls").unwrap();
        assert_eq!(url.as_str(), "https://localhost:8081/dbs/ToDoList/colls");
    }

    fn offer_feed(count: usize) -> OfferFeed {
        let offers = (0..count)
            .map(|n| {
                serde_json::from_value(serde_json::json!({
                    "id": format!("HcUc{}", n),
                    "_rid": format!("HcUc{}", n),
                    "_self": format!("offers/HcUc{}/", n),
                    "offerVersion": "V2",
                    "offerResourceId": "d9RzAJRFKgw=",
                    "resource": "dbs/d9RzAA==/colls/d9RzAJRFKgw=/",
                    "content": { "offerThroughput": 1000 }
                }))
                .unwrap()
            })
            .collect();
        OfferFeed { offers }
    }

    #[test]
    fn test_offer_triage_empty_feed() {
        let result = single_offer(offer_feed(0), "dbs/x/colls/y/").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_offer_triage_single_match() {
        let offer = single_offer(offer_feed(1), "dbs/x/colls/y/")
            .unwrap()
            .unwrap();
        assert_eq!(offer.throughput(), 1000);
    }

    #[test]
    fn test_offer_triage_rejects_multiple_matches() {
        let err = single_offer(offer_feed(2), "dbs/x/colls/y/").unwrap_err();
        assert!(matches!(err, CosmosError::AmbiguousOffer(link) if link == "dbs/x/colls/y/"));
    }

    fn response(status: u16, body: &'static str) -> Response {
        http::Response::builder()
            .status(status)
            .body(body)
            .unwrap()
            .into()
    }

    #[tokio::test]
    async fn test_check_passes_success_through() {
        assert!(CosmosClient::check(response(200, "{}")).await.is_ok());
    }

    #[tokio::test]
    async fn test_check_maps_auth_statuses() {
        for status in [401, 403] {
            let err = CosmosClient::check(response(status, "{}")).await.unwrap_err();
            assert!(matches!(err, CosmosError::Unauthorized));
        }
    }

    #[tokio::test]
    async fn test_check_maps_throttling() {
        let err = CosmosClient::check(response(429, "{}")).await.unwrap_err();
        assert!(matches!(err, CosmosError::Throttled));
    }

    #[tokio::test]
    async fn test_check_maps_etag_race() {
        // A concurrent offer update fails the If-Match precondition
        let err = CosmosClient::check(response(412, "{}")).await.unwrap_err();
        assert!(matches!(err, CosmosError::PreconditionFailed));
    }

    #[tokio::test]
    async fn test_check_extracts_error_body_message() {
        let err = CosmosClient::check(response(
            400,
            r#"{"code":"BadRequest","message":"x-ms-version is invalid"}"#,
        ))
        .await
        .unwrap_err();

        match err {
            CosmosError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "x-ms-version is invalid");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_check_falls_back_to_raw_body() {
        let err = CosmosClient::check(response(500, "upstream blew up"))
            .await
            .unwrap_err();

        match err {
            CosmosError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream blew up");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}

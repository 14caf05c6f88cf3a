//! Wire types for the control-plane feeds
//!
//! Only the fields the service reads are modeled; everything else on an
//! offer is carried through a flattened map so a replace round-trips the
//! full resource unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A document collection as returned by the collections feed
#[derive(Debug, Clone, Deserialize)]
pub struct Collection {
    pub id: String,

    #[serde(rename = "_rid")]
    pub rid: String,

    /// Locator the offer's `resource` field points at
    #[serde(rename = "_self")]
    pub self_link: String,
}

/// Feed wrapper for `GET /dbs/{db}/colls`
#[derive(Debug, Default, Deserialize)]
pub struct CollectionFeed {
    #[serde(rename = "DocumentCollections", default)]
    pub collections: Vec<Collection>,
}

/// The throughput payload of an offer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferContent {
    #[serde(rename = "offerThroughput")]
    pub offer_throughput: i64,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A throughput offer resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,

    #[serde(rename = "_rid")]
    pub rid: String,

    #[serde(rename = "_self")]
    pub self_link: String,

    #[serde(rename = "_etag", skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(rename = "offerVersion")]
    pub offer_version: String,

    #[serde(rename = "offerResourceId")]
    pub offer_resource_id: String,

    /// Self-link of the collection this offer provisions
    pub resource: String,

    pub content: OfferContent,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Offer {
    /// Currently provisioned throughput in RU
    pub fn throughput(&self) -> i64 {
        self.content.offer_throughput
    }

    /// Copy of this offer carrying a new throughput value
    pub fn with_throughput(mut self, throughput: i64) -> Self {
        self.content.offer_throughput = throughput;
        self
    }
}

/// Feed wrapper for offer queries
#[derive(Debug, Default, Deserialize)]
pub struct OfferFeed {
    #[serde(rename = "Offers", default)]
    pub offers: Vec<Offer>,
}

/// Parameterized query body (`application/query+json`)
#[derive(Debug, Serialize)]
pub struct OfferQuery {
    pub query: String,
    pub parameters: Vec<QueryParameter>,
}

#[derive(Debug, Serialize)]
pub struct QueryParameter {
    pub name: String,
    pub value: Value,
}

impl OfferQuery {
    /// Select the single offer whose `resource` is the collection locator
    pub fn by_resource_link(collection_self_link: &str) -> Self {
        Self {
            query: "SELECT * FROM root r WHERE r.resource = @resourceLink".to_string(),
            parameters: vec![QueryParameter {
                name: "@resourceLink".to_string(),
                value: Value::String(collection_self_link.to_string()),
            }],
        }
    }
}

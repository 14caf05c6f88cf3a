//! Throughput scaling endpoint
//!
//! The single operation of the service: read the collection's offer, add
//! the configured RU increment, write it back.

use axum::extract::State;

use crate::error::ApiError;
use crate::server::state::AppState;
use crate::services::cosmos::CosmosClient;
use crate::services::scaler;

/// Scale the configured collection's throughput.
///
/// GET|POST /api/scale, anonymous, request body unused.
///
/// The Cosmos client lives for exactly this request; dropping it on any
/// exit path releases the session.
pub async fn scale(State(state): State<AppState>) -> Result<String, ApiError> {
    let cosmos = &state.settings.cosmos;
    let client = CosmosClient::new(cosmos)?;

    let outcome = scaler::adjust_throughput(
        &client,
        &cosmos.database_id,
        &cosmos.container_id,
        &cosmos.ru_increment,
    )
    .await?;

    Ok(format!(
        "The collection's throughput was changed to {} RU",
        outcome.current
    ))
}

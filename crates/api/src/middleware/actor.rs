//! Caller identity extractor.
//!
//! Authentication happens upstream; the authenticating proxy forwards the
//! caller's identity in the `X-Actor-Id` header and this service trusts it.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use bolsa_shared::ActorId;
use serde_json::json;

/// Header carrying the authenticated caller's identity.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Extractor for the authenticated caller.
///
/// ```ignore
/// async fn handler(Actor(actor): Actor) -> impl IntoResponse {
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Actor(pub ActorId);

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(ActorId::new)
            .map(Actor)
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "error": "missing_actor",
                        "message": "X-Actor-Id header is required"
                    })),
                )
            })
    }
}

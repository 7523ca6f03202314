//! OpenAPI specification for the gateway API, generated with utoipa

use axum::Json;
use utoipa::OpenApi;

use crate::types::*;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Overwatch Risk Gateway",
        description = "
Classifies a free-text description of an automated action into a risk tier
(SAFE, WARN, BLOCK) with a 0-100 score and a short rationale.

Degraded verdicts are returned with HTTP 200 when the model cannot be
consulted or its output cannot be read:

| Failure | Verdict |
|---|---|
| authentication | 100 / BLOCK / System Authentication Failed |
| inference | 50 / WARN / AI Service Unavailable |
| output parsing | 75 / WARN / AI Output Parse Error |
",
        version = "0.1.0"
    ),
    paths(
        crate::routes::assess::assess_risk,
        crate::server::health_check
    ),
    components(schemas(
        AssessmentRequest,
        Verdict,
        Tier,
        HealthResponse,
        ErrorResponse
    )),
    tags(
        (name = "risk", description = "Action risk assessment"),
        (name = "health", description = "Gateway health")
    )
)]
pub struct ApiDoc;

/// Serve the OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderName, HeaderValue, StatusCode},
    Json,
};
use overwatch_common::AssessmentRequest;
use tracing::{error, info, instrument};

use crate::{
    server::AppState,
    types::{ErrorResponse, Verdict, VERDICT_SOURCE_HEADER},
};

/// Assess the risk of a described action
///
/// The action text is classified by the hosted model. Internal failures are
/// never surfaced as error statuses: they produce one of the degraded
/// verdicts with HTTP 200, flagged in the `x-verdict-source` header
/// (`model`, `degraded-auth`, `degraded-inference`, `degraded-parse`).
///
/// Invalid JSON is rejected with 400 and JSON that is not an object with
/// 422, both before any outbound call is made. A missing or null `action` is assessed as the
/// empty string.
#[utoipa::path(
    post,
    path = "/assess_risk",
    request_body = AssessmentRequest,
    responses(
        (status = 200, description = "Risk verdict (model-derived or degraded)", body = Verdict,
            headers(("x-verdict-source" = String, description = "model | degraded-auth | degraded-inference | degraded-parse"))),
        (status = 400, description = "Body is not valid JSON", body = ErrorResponse),
        (status = 422, description = "Body is JSON but not an assessment request", body = ErrorResponse),
    ),
    tag = "risk"
)]
#[instrument(skip(state, body), fields(body_size = body.len()))]
pub async fn assess_risk(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<([(HeaderName, HeaderValue); 1], Json<Verdict>), (StatusCode, Json<ErrorResponse>)> {
    let request = parse_request(&body)?;

    info!(action = %request.action, "Assessing action");
    let assessment = state.assessor.assess_detailed(&request.action).await;
    info!(
        tier = %assessment.verdict.tier,
        source = assessment.source.header_value(),
        "Assessment complete"
    );

    let header = (
        HeaderName::from_static(VERDICT_SOURCE_HEADER),
        HeaderValue::from_static(assessment.source.header_value()),
    );
    Ok(([header], Json(assessment.verdict)))
}

fn parse_request(body: &[u8]) -> Result<AssessmentRequest, (StatusCode, Json<ErrorResponse>)> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(AssessmentRequest::default());
    }

    let value = serde_json::from_slice::<serde_json::Value>(body).map_err(|e| {
        error!(error = %e, line = e.line(), column = e.column(), "JSON parsing failed");
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                format!("Invalid JSON at line {}, column {}: {}", e.line(), e.column(), e),
                "JSON_PARSE_ERROR",
            )),
        )
    })?;

    match value {
        serde_json::Value::Null => Ok(AssessmentRequest::default()),
        // serde also reads a struct from a sequence, so shape is checked first.
        serde_json::Value::Object(_) => serde_json::from_value::<AssessmentRequest>(value)
            .map_err(|e| invalid_request(e.to_string())),
        other => Err(invalid_request(format!("found {}", json_kind(&other)))),
    }
}

fn invalid_request(detail: String) -> (StatusCode, Json<ErrorResponse>) {
    error!(detail = %detail, "Request body is not an assessment request");
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse::new(
            format!("Expected an object with an optional string 'action': {}", detail),
            "INVALID_REQUEST",
        )),
    )
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

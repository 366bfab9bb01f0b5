use {
    crate::{
        AppState,
        domain::{error::EngineError, ids::PaymentId},
        services::worker::ReconcileJob,
    },
    axum::{
        Form, Json,
        extract::State,
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    serde::Deserialize,
    uuid::Uuid,
};

/// Adapter-layer wrapper so the domain error can speak HTTP.
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self.0 {
            EngineError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                msg.clone(),
            ),
            EngineError::Gateway(err) => {
                tracing::error!("gateway error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
            EngineError::Store(err) => {
                tracing::error!("store error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
            EngineError::Serialization(err) => {
                tracing::error!("serialization error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error_code": error_code,
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct WebhookParams {
    pub id: String,
}

/// The gateway's webhook call: acknowledge fast, process out of band.
/// Unknown or malformed ids still get a 200 — the endpoint never tells a
/// third party whether an id exists, and a non-2xx would keep the
/// gateway retrying. The one deliberate 5xx is a failed enqueue, which
/// leans on exactly that retry loop.
pub async fn webhook_handler(
    State(state): State<AppState>,
    Form(params): Form<WebhookParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let ack = serde_json::json!({ "success": true, "id": params.id });

    let payment_id = match PaymentId::new(&params.id) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(id = %params.id, error = %e, "webhook with malformed payment id");
            return Ok(Json(ack));
        }
    };

    state.jobs.send(ReconcileJob::new(payment_id)).map_err(|_| {
        ApiError(EngineError::Store(
            crate::domain::store::StoreError::Unavailable("job queue closed".to_string()),
        ))
    })?;

    tracing::debug!(id = %params.id, "webhook accepted, reconciliation enqueued");
    Ok(Json(ack))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundParams {
    pub transaction_id: Uuid,
}

/// Admin-initiated full refund; boolean result, details in the logs.
pub async fn refund_handler(
    State(state): State<AppState>,
    Json(params): Json<RefundParams>,
) -> Json<serde_json::Value> {
    let success = state.refunds.refund(params.transaction_id).await;
    Json(serde_json::json!({ "success": success }))
}

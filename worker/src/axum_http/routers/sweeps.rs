use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{error, warn};

use crate::usecases::{
    expire_unpaid_deposits::ExpireUnpaidDepositsUseCase,
    settle_pending_transfers::SettlePendingTransfersUseCase,
};

// Run example
//   curl -X POST "http://localhost:$SERVER_PORT_WORKER/internal/v1/sweeps/settlement" \
//     -H "Authorization: Bearer $INTERNAL_SWEEP_TOKEN" \
//     -H "Content-Type: application/json" \
//     -d '{"limit":20}'

#[derive(Clone)]
pub struct SweepRouteState {
    pub internal_token: Option<String>,
    pub settlement_batch_limit: i64,
    pub expire_deposits: Arc<ExpireUnpaidDepositsUseCase>,
    pub settle_transfers: Arc<SettlePendingTransfersUseCase>,
}

pub fn routes(state: SweepRouteState) -> Router {
    Router::new()
        .route("/deposit-expiry", post(expire_deposits))
        .route("/settlement", post(settle_transfers))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct SweepRequest {
    pub limit: Option<i64>,
}

pub async fn expire_deposits(
    State(state): State<SweepRouteState>,
    headers: HeaderMap,
    payload: Option<Json<SweepRequest>>,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    let request = payload.map(|Json(request)| request).unwrap_or_default();

    match state.expire_deposits.run(Utc::now(), request.limit).await {
        Ok(result) => Json(result).into_response(),
        Err(err) => {
            error!(error = ?err, "sweeps: deposit expiry failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "deposit expiry failed").into_response()
        }
    }
}

pub async fn settle_transfers(
    State(state): State<SweepRouteState>,
    headers: HeaderMap,
    payload: Option<Json<SweepRequest>>,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let limit = request
        .limit
        .filter(|limit| *limit > 0)
        .unwrap_or(state.settlement_batch_limit);

    match state.settle_transfers.run(Some(limit)).await {
        Ok(result) => Json(result).into_response(),
        Err(err) => {
            error!(error = ?err, "sweeps: settlement failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "settlement failed").into_response()
        }
    }
}

fn authorize(state: &SweepRouteState, headers: &HeaderMap) -> Result<(), Response> {
    let Some(expected_token) = state.internal_token.as_deref() else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "sweep token is not configured",
        )
            .into_response());
    };

    authorize_bearer(headers, expected_token).map_err(|status| {
        warn!("sweeps: rejected request with invalid bearer token");
        (status, "unauthorized").into_response()
    })
}

fn authorize_bearer(headers: &HeaderMap, expected_token: &str) -> Result<(), StatusCode> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if token == expected_token {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use crates::domain::repositories::{
        bookings::MockBookingRepository, payouts::MockPayoutGateway,
        transfers::MockTransferRepository,
    };
    use mockall::predicate::eq;

    fn state(
        internal_token: Option<&str>,
        transfers: MockTransferRepository,
    ) -> SweepRouteState {
        SweepRouteState {
            internal_token: internal_token.map(str::to_string),
            settlement_batch_limit: 50,
            expire_deposits: Arc::new(ExpireUnpaidDepositsUseCase::new(Arc::new(
                MockBookingRepository::new(),
            ))),
            settle_transfers: Arc::new(SettlePendingTransfersUseCase::new(
                Arc::new(transfers),
                Arc::new(MockPayoutGateway::new()),
            )),
        }
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn bearer_token_must_match() {
        assert!(authorize_bearer(&bearer("s3cret"), "s3cret").is_ok());
        assert_eq!(
            authorize_bearer(&bearer("nope"), "s3cret"),
            Err(StatusCode::UNAUTHORIZED)
        );
        assert_eq!(
            authorize_bearer(&HeaderMap::new(), "s3cret"),
            Err(StatusCode::UNAUTHORIZED)
        );
    }

    #[tokio::test]
    async fn missing_token_disables_endpoints() {
        let response = expire_deposits(
            State(state(None, MockTransferRepository::new())),
            bearer("anything"),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn settlement_uses_configured_batch_limit() {
        let mut transfers = MockTransferRepository::new();
        transfers
            .expect_list_pending()
            .with(eq(Some(50)))
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let response = settle_transfers(
            State(state(Some("s3cret"), transfers)),
            bearer("s3cret"),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn non_positive_settlement_limit_uses_batch_limit() {
        for requested in [0, -5] {
            let mut transfers = MockTransferRepository::new();
            transfers
                .expect_list_pending()
                .with(eq(Some(50)))
                .times(1)
                .returning(|_| Ok(Vec::new()));

            let response = settle_transfers(
                State(state(Some("s3cret"), transfers)),
                bearer("s3cret"),
                Some(Json(SweepRequest {
                    limit: Some(requested),
                })),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}

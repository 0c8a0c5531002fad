// 🌐 REST API - axum router over the orchestrator and read helpers
//
// Store calls are synchronous (rusqlite), so every handler hops onto the
// blocking pool. Bodies always use the `OperationResult` shape.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::entities::{EntryType, TransactionStatus, TransactionType};
use crate::error::{ErrorKind, Result};
use crate::orchestrator::{SimpleTransactionRequest, TransactionService, TransferRequest};
use crate::queries::LedgerQueries;
use crate::result::OperationResult;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    service: TransactionService,
    queries: LedgerQueries,
}

impl AppState {
    pub fn new(service: TransactionService) -> Self {
        let queries = LedgerQueries::new(service.factory());
        Self { service, queries }
    }
}

/// POST /api/transfers body
#[derive(Debug, Deserialize)]
pub struct TransferBody {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
    pub created_by_user_id: i64,
    pub transaction_type_id: Option<i64>,
    pub status_id: Option<i64>,
}

/// POST /api/transactions body
#[derive(Debug, Deserialize)]
pub struct SimpleTransactionBody {
    pub account_id: i64,
    pub amount: Decimal,
    /// Exactly `debit` or `credit`.
    pub entry_type: String,
    #[serde(default)]
    pub description: String,
    pub created_by_user_id: i64,
    pub transaction_type_id: Option<i64>,
    pub status_id: Option<i64>,
}

impl TransferBody {
    fn into_request(self) -> Result<TransferRequest> {
        let mut request = TransferRequest::new(
            self.from_account_id,
            self.to_account_id,
            self.amount,
            self.description,
            self.created_by_user_id,
        );
        if let Some(id) = self.transaction_type_id {
            request = request.with_type(TransactionType::from_id(id)?);
        }
        if let Some(id) = self.status_id {
            request = request.with_status(TransactionStatus::from_id(id)?);
        }
        Ok(request)
    }
}

impl SimpleTransactionBody {
    fn into_request(self) -> Result<SimpleTransactionRequest> {
        let entry_type: EntryType = self.entry_type.parse()?;
        let mut request = SimpleTransactionRequest::new(
            self.account_id,
            self.amount,
            entry_type,
            self.description,
            self.created_by_user_id,
        );
        if let Some(id) = self.transaction_type_id {
            request = request.with_type(TransactionType::from_id(id)?);
        }
        if let Some(id) = self.status_id {
            request = request.with_status(TransactionStatus::from_id(id)?);
        }
        Ok(request)
    }
}

fn status_for(kind: Option<ErrorKind>) -> StatusCode {
    match kind {
        None => StatusCode::OK,
        Some(ErrorKind::Validation) | Some(ErrorKind::Input) => StatusCode::UNPROCESSABLE_ENTITY,
        Some(ErrorKind::StoreConnection) => StatusCode::SERVICE_UNAVAILABLE,
        Some(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond<T: Serialize>(result: OperationResult<T>, created: bool) -> Response {
    let status = match status_for(result.kind) {
        StatusCode::OK if created => StatusCode::CREATED,
        other => other,
    };
    (status, Json(result)).into_response()
}

fn error_response(status: StatusCode, code: &'static str, message: String) -> Response {
    (
        status,
        Json(serde_json::json!({
            "success": false,
            "error": message,
            "code": code,
        })),
    )
        .into_response()
}

fn not_found(what: &str, id: i64) -> Response {
    error_response(StatusCode::NOT_FOUND, "NOT_FOUND", format!("{what} {id} not found"))
}

/// Bodies or path segments axum could not decode, reported in the result shape.
fn invalid_request(status: StatusCode, message: String) -> Response {
    let status = if status.is_client_error() {
        status
    } else {
        StatusCode::BAD_REQUEST
    };
    error_response(status, "INVALID_REQUEST", message)
}

fn json_body<T>(
    body: std::result::Result<Json<T>, JsonRejection>,
) -> std::result::Result<T, Response> {
    body.map(|Json(value)| value)
        .map_err(|rejection| invalid_request(rejection.status(), rejection.body_text()))
}

fn path_id(
    id: std::result::Result<Path<i64>, PathRejection>,
) -> std::result::Result<i64, Response> {
    id.map(|Path(id)| id)
        .map_err(|rejection| invalid_request(rejection.status(), rejection.body_text()))
}

/// Runs blocking store work; a panicked task becomes a 500.
async fn blocking<T, F>(work: F) -> std::result::Result<T, Response>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        error!(error = %e, "blocking ledger task failed");
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "internal error".to_string(),
        )
    })
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "success": true,
        "status": "OK",
        "version": crate::VERSION,
    }))
}

/// POST /api/transfers
async fn create_transfer(
    State(state): State<AppState>,
    body: std::result::Result<Json<TransferBody>, JsonRejection>,
) -> Response {
    let body = match json_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let request = match body.into_request() {
        Ok(request) => request,
        Err(e) => return respond(OperationResult::<()>::failure(&e), false),
    };
    match blocking(move || state.service.transfer(request)).await {
        Ok(result) => respond(result, true),
        Err(response) => response,
    }
}

/// POST /api/transactions
async fn create_simple_transaction(
    State(state): State<AppState>,
    body: std::result::Result<Json<SimpleTransactionBody>, JsonRejection>,
) -> Response {
    let body = match json_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let request = match body.into_request() {
        Ok(request) => request,
        Err(e) => return respond(OperationResult::<()>::failure(&e), false),
    };
    match blocking(move || state.service.simple_transaction(request)).await {
        Ok(result) => respond(result, true),
        Err(response) => response,
    }
}

/// GET /api/transactions/:id
async fn get_transaction(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Response {
    let id = match path_id(id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match blocking(move || state.queries.transaction_detail(id)).await {
        Ok(Some(detail)) => respond(OperationResult::ok(detail), false),
        Ok(None) => not_found("transaction", id),
        Err(response) => response,
    }
}

#[derive(Serialize)]
struct EntryList {
    transaction_id: i64,
    entries: Vec<crate::entities::LedgerEntry>,
}

/// GET /api/transactions/:id/entries - empty list when the transaction is unknown
async fn list_entries(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Response {
    let id = match path_id(id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match blocking(move || state.queries.list_by_transaction(id)).await {
        Ok(entries) => respond(
            OperationResult::ok(EntryList {
                transaction_id: id,
                entries,
            }),
            false,
        ),
        Err(response) => response,
    }
}

#[derive(Serialize)]
struct EntryBody {
    entry: crate::entities::LedgerEntry,
}

/// GET /api/entries/:id
async fn get_entry(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Response {
    let id = match path_id(id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match blocking(move || state.queries.get_by_id(id)).await {
        Ok(Some(entry)) => respond(OperationResult::ok(EntryBody { entry }), false),
        Ok(None) => not_found("ledger entry", id),
        Err(response) => response,
    }
}

/// Builds the `/api` router with CORS and request tracing.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/transfers", post(create_transfer))
        .route("/transactions", post(create_simple_transaction))
        .route("/transactions/:id", get(get_transaction))
        .route("/transactions/:id/entries", get(list_entries))
        .route("/entries/:id", get(get_entry))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

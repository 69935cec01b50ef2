//! # REST Handlers
//!
//! Request handlers for the routing surface.
//!
//! # Endpoints
//!
//! - `POST /routing/quote/v2` - price a conversion request
//! - `POST /routing/execute/v2` - reserve a quote and issue deposit
//!   instructions
//! - `POST /routing/webhooks/deposit` - deposit notifier callback
//! - `GET /routing/status?executionId=` - execution state
//! - `GET /routing/quotes?fromToken=&toToken=` - cached-edge inspection
//! - `GET /routing/health` - liveness probe
//!
//! The wire format is camelCase JSON; amounts cross the boundary as
//! numbers.

use crate::application::error::ApplicationError;
use crate::application::pipeline::RoutingPipeline;
use crate::domain::entities::{
    DepositInstructions, EdgeQuote, ExecutionRecord, ProvisionalQuote, QuoteKind, Route,
};
use crate::domain::value_objects::{Amount, ClientId, ExecutionId, QuoteId, Token};
use crate::infrastructure::cache::EdgeCache;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

// ============================================================================
// Application State
// ============================================================================

/// Shared state for the routing handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The quote lifecycle pipeline.
    pub pipeline: Arc<RoutingPipeline>,
    /// The edge cache, exposed for inspection.
    pub cache: Arc<EdgeCache>,
}

// ============================================================================
// Error Response
// ============================================================================

/// Standard error response format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    /// Creates a new error response.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<ApplicationError> for (StatusCode, Json<ErrorResponse>) {
    fn from(err: ApplicationError) -> Self {
        let (status, code) = if err.is_not_found() {
            (StatusCode::NOT_FOUND, "NOT_FOUND")
        } else {
            match &err {
                ApplicationError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            }
        };
        (status, Json(ErrorResponse::new(code, err.to_string())))
    }
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: impl Into<String>) -> HandlerError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new("VALIDATION_ERROR", message)),
    )
}

fn not_found(message: impl Into<String>) -> HandlerError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("NOT_FOUND", message)),
    )
}

// ============================================================================
// Quote DTOs
// ============================================================================

/// Client priority hint. Accepted for forward compatibility; ranking is
/// by net output today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotePriority {
    /// Maximize net output.
    #[default]
    Cost,
    /// Minimize settlement time.
    Speed,
    /// Balance the two.
    Balanced,
}

/// Request body of `POST /routing/quote/v2`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    /// Amount of the source token to convert.
    pub amount_in: f64,
    /// Source token symbol.
    pub from_token: String,
    /// Destination token symbol.
    pub to_token: String,
    /// Intermediate tokens to route through; empty means the defaults.
    #[serde(default)]
    pub intermediates: Vec<String>,
    /// Minimum remaining quote validity in milliseconds.
    #[serde(default)]
    pub min_expiry_ms: Option<i64>,
    /// Requesting client, echoed into telemetry.
    #[serde(default)]
    pub client_id: Option<String>,
    /// Priority hint.
    #[serde(default)]
    pub priority: Option<QuotePriority>,
}

/// One step of a route on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStepView {
    /// Source token of the hop.
    pub from_token: String,
    /// Destination token of the hop.
    pub to_token: String,
    /// Executing venue.
    pub venue_id: String,
    /// Settlement chain; 0 off-chain.
    pub chain_id: u64,
    /// Amount entering the hop.
    pub amount_in: f64,
    /// Amount leaving the hop.
    pub amount_out: f64,
    /// Venue fee in basis points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_bps: Option<u32>,
    /// Estimated hop duration.
    pub estimated_duration_ms: u64,
}

/// A route on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteView {
    /// The hops in order.
    pub steps: Vec<RouteStepView>,
    /// Amount entering the route.
    pub total_in: f64,
    /// Net amount leaving the route.
    pub total_out: f64,
    /// `totalOut / totalIn`.
    pub effective_rate: f64,
    /// Sum of step fees.
    pub total_fees_bps: u32,
    /// Construction instant, epoch milliseconds.
    pub timestamp: i64,
}

impl From<&Route> for RouteView {
    fn from(route: &Route) -> Self {
        Self {
            steps: route
                .steps
                .iter()
                .map(|s| RouteStepView {
                    from_token: s.from_token.to_string(),
                    to_token: s.to_token.to_string(),
                    venue_id: s.venue_id.to_string(),
                    chain_id: s.chain_id,
                    amount_in: s.amount_in.to_f64(),
                    amount_out: s.amount_out.to_f64(),
                    fee_bps: s.fee_bps.map(|f| f.get()),
                    estimated_duration_ms: s.estimated_duration_ms,
                })
                .collect(),
            total_in: route.total_in.to_f64(),
            total_out: route.total_out.to_f64(),
            effective_rate: route.effective_rate.to_f64().unwrap_or(0.0),
            total_fees_bps: route.total_fees_bps.get(),
            timestamp: route.timestamp.millis(),
        }
    }
}

/// Scoring metadata on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringMetaView {
    /// Worst settlement delay across the route, in days.
    pub settlement_days: f64,
    /// Mean counterparty risk across the route.
    pub counterparty_risk: f64,
    /// Absolute output discount for settlement exposure.
    pub time_penalty: f64,
}

/// One priced quote on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteView {
    /// Addressable quote id.
    pub quote_id: String,
    /// The priced route, or null when no route was reachable.
    pub route: Option<RouteView>,
    /// Gross output.
    pub amount_out: f64,
    /// Output net of scoring discounts.
    pub net_amount_out: f64,
    /// Quote expiry, epoch milliseconds.
    pub expiry_ts: i64,
    /// Venue composition of the route.
    #[serde(rename = "type")]
    pub kind: QuoteKind,
    /// Scorer confidence in `[0.5, 1.0]`.
    pub confidence: f64,
    /// Scoring inputs and penalty.
    pub scoring_meta: ScoringMetaView,
}

impl From<&ProvisionalQuote> for QuoteView {
    fn from(quote: &ProvisionalQuote) -> Self {
        Self {
            quote_id: quote.quote_id.to_string(),
            route: quote.route.as_ref().map(RouteView::from),
            amount_out: quote.amount_out.to_f64(),
            net_amount_out: quote.net_amount_out.to_f64(),
            expiry_ts: quote.expiry_ts.millis(),
            kind: quote.kind,
            confidence: quote.scoring.confidence.to_f64().unwrap_or(0.5),
            scoring_meta: ScoringMetaView {
                settlement_days: quote.scoring.settlement_days.to_f64().unwrap_or(0.0),
                counterparty_risk: quote.scoring.counterparty_risk.to_f64().unwrap_or(0.0),
                time_penalty: quote.scoring.time_penalty.to_f64(),
            },
        }
    }
}

/// Response body of `POST /routing/quote/v2`.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteResponse {
    /// Priced quotes, best net output first. Empty when the pair is
    /// unreachable.
    pub quotes: Vec<QuoteView>,
}

// ============================================================================
// Execute DTOs
// ============================================================================

/// Request body of `POST /routing/execute/v2`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    /// The provisional quote to reserve.
    pub quote_id: String,
    /// The reserving client.
    pub client_id: String,
}

/// Response body of `POST /routing/execute/v2`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    /// Reservation id.
    pub reservation_id: String,
    /// The reserved quote id.
    pub quote_id: String,
    /// Execution status after reservation.
    pub status: String,
    /// Where and how to pay.
    pub deposit_instructions: DepositInstructionsView,
    /// Reservation expiry, epoch milliseconds.
    pub reserved_until: i64,
    /// Desk-side reservation id for OTC legs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otc_reservation_id: Option<String>,
}

/// Deposit instructions on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositInstructionsView {
    /// Payment rail.
    pub method: String,
    /// Receiving account details.
    pub account_details: AccountDetailsView,
    /// Amount due in the source token.
    pub amount: f64,
    /// Reference the payer must attach.
    pub payment_reference: String,
    /// PIX BR Code payload, when the rail is PIX.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code_data: Option<String>,
    /// Deposit window expiry, epoch milliseconds.
    pub deposit_expiry_ts: i64,
}

/// Account details on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetailsView {
    /// Receiving institution.
    pub bank_name: String,
    /// Account holder.
    pub account_holder: String,
    /// Account number, IBAN or CLABE.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    /// PIX key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pix_key: Option<String>,
    /// SWIFT/BIC code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swift_code: Option<String>,
}

impl From<&DepositInstructions> for DepositInstructionsView {
    fn from(instructions: &DepositInstructions) -> Self {
        Self {
            method: instructions.method.to_string(),
            account_details: AccountDetailsView {
                bank_name: instructions.account_details.bank_name.clone(),
                account_holder: instructions.account_details.account_holder.clone(),
                account_number: instructions.account_details.account_number.clone(),
                pix_key: instructions.account_details.pix_key.clone(),
                swift_code: instructions.account_details.swift_code.clone(),
            },
            amount: instructions.amount.to_f64(),
            payment_reference: instructions.payment_reference.clone(),
            qr_code_data: instructions.qr_code_data.clone(),
            deposit_expiry_ts: instructions.deposit_expiry_ts.millis(),
        }
    }
}

// ============================================================================
// Webhook DTOs
// ============================================================================

/// Request body of `POST /routing/webhooks/deposit`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositWebhookRequest {
    /// The reference the payer attached.
    pub payment_reference: String,
    /// Amount that arrived.
    pub amount_received: f64,
    /// Bank-side transaction id.
    #[serde(default)]
    pub bank_tx_id: Option<String>,
    /// Originating notifier, for telemetry.
    #[serde(default)]
    pub source: Option<String>,
}

/// Response body of `POST /routing/webhooks/deposit`.
///
/// Webhook contract: delivery problems are reported in-band with
/// `success: false`, never as 4xx.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositWebhookResponse {
    /// Whether the notification was matched and applied.
    pub success: bool,
    /// The confirmed deposit id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit_id: Option<String>,
    /// The execution the deposit advanced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
}

// ============================================================================
// Status DTOs
// ============================================================================

/// Query parameters of `GET /routing/status`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    /// The execution to inspect.
    pub execution_id: String,
}

/// Response body of `GET /routing/status`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Execution id.
    pub execution_id: String,
    /// Lifecycle status.
    pub status: String,
    /// The active route.
    pub route: RouteView,
    /// One hash per completed step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hashes: Option<Vec<String>>,
    /// Index of the next step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<usize>,
    /// Completion instant, epoch milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    /// Terminal error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&ExecutionRecord> for StatusResponse {
    fn from(record: &ExecutionRecord) -> Self {
        Self {
            execution_id: record.execution_id.to_string(),
            status: record.status.to_string(),
            route: RouteView::from(&record.route),
            transaction_hashes: (!record.transaction_hashes.is_empty())
                .then(|| record.transaction_hashes.clone()),
            current_step: Some(record.current_step),
            completed_at: record.completed_at.map(|ts| ts.millis()),
            error: record.error.clone(),
        }
    }
}

// ============================================================================
// Cached-quote inspection DTOs
// ============================================================================

/// Query parameters of `GET /routing/quotes`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedQuotesQuery {
    /// Source token symbol.
    pub from_token: String,
    /// Destination token symbol.
    pub to_token: String,
}

/// One cached edge on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedQuoteView {
    /// Quoting venue.
    pub venue_id: String,
    /// Venue kind.
    pub venue_kind: String,
    /// Source token.
    pub from_token: String,
    /// Destination token.
    pub to_token: String,
    /// Reference input size.
    pub amount_in: f64,
    /// Output at the reference size.
    pub amount_out: f64,
    /// Venue fee.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_bps: Option<u32>,
    /// Quote expiry, epoch milliseconds.
    pub expiry_ts: i64,
    /// Last refresh, epoch milliseconds.
    pub last_updated_ts: i64,
}

impl From<&EdgeQuote> for CachedQuoteView {
    fn from(quote: &EdgeQuote) -> Self {
        Self {
            venue_id: quote.venue_id.to_string(),
            venue_kind: format!("{:?}", quote.venue_kind).to_uppercase(),
            from_token: quote.from_token.to_string(),
            to_token: quote.to_token.to_string(),
            amount_in: quote.amount_in.to_f64(),
            amount_out: quote.amount_out.to_f64(),
            fee_bps: quote.fee_bps.map(|f| f.get()),
            expiry_ts: quote.expiry_ts.millis(),
            last_updated_ts: quote.last_updated_ts.millis(),
        }
    }
}

/// Response body of `GET /routing/quotes`.
#[derive(Debug, Clone, Serialize)]
pub struct CachedQuotesResponse {
    /// The live cached edges for the pair.
    pub quotes: Vec<CachedQuoteView>,
}

// ============================================================================
// Handlers
// ============================================================================

fn parse_token(symbol: &str, field: &str) -> Result<Token, HandlerError> {
    Token::new(symbol).map_err(|e| bad_request(format!("{field}: {e}")))
}

fn parse_quote_id(value: &str) -> Result<QuoteId, HandlerError> {
    Uuid::parse_str(value)
        .map(QuoteId::new)
        .map_err(|_| bad_request(format!("quoteId is not a valid id: {value:?}")))
}

/// `POST /routing/quote/v2`.
#[instrument(skip(state, request), fields(from = %request.from_token, to = %request.to_token))]
pub async fn quote_v2(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, HandlerError> {
    if request.amount_in <= 0.0 || !request.amount_in.is_finite() {
        return Err(bad_request("amountIn must be a positive number"));
    }
    let amount_in =
        Amount::new(request.amount_in).map_err(|e| bad_request(format!("amountIn: {e}")))?;
    let from = parse_token(&request.from_token, "fromToken")?;
    let to = parse_token(&request.to_token, "toToken")?;
    if from == to {
        return Err(bad_request("fromToken and toToken must differ"));
    }
    let mut intermediates = Vec::with_capacity(request.intermediates.len());
    for symbol in &request.intermediates {
        intermediates.push(parse_token(symbol, "intermediates")?);
    }
    let min_expiry_ms = request.min_expiry_ms.unwrap_or(0).max(0);

    let quotes = state
        .pipeline
        .price(amount_in, from, to, &intermediates, min_expiry_ms)
        .await
        .map_err(<(StatusCode, Json<ErrorResponse>)>::from)?;

    let mut views: Vec<QuoteView> = quotes.iter().map(QuoteView::from).collect();
    views.sort_by(|a, b| {
        b.net_amount_out
            .partial_cmp(&a.net_amount_out)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(Json(QuoteResponse { quotes: views }))
}

/// `POST /routing/execute/v2`.
#[instrument(skip(state, request), fields(quote_id = %request.quote_id))]
pub async fn execute_v2(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, HandlerError> {
    if request.quote_id.trim().is_empty() {
        return Err(bad_request("quoteId is required"));
    }
    if request.client_id.trim().is_empty() {
        return Err(bad_request("clientId is required"));
    }
    let quote_id = parse_quote_id(&request.quote_id)?;
    let client = ClientId::new(request.client_id);

    let bundle = state
        .pipeline
        .reserve(&quote_id, client)
        .await
        .map_err(<(StatusCode, Json<ErrorResponse>)>::from)?;

    let otc_reservation_id = bundle
        .reserved
        .otc
        .as_ref()
        .and_then(|otc| otc.otc_reservation_id.clone());

    Ok(Json(ExecuteResponse {
        reservation_id: bundle.reserved.reservation_id.to_string(),
        quote_id: bundle.reserved.quote.quote_id.to_string(),
        status: bundle.execution.status.to_string(),
        deposit_instructions: DepositInstructionsView::from(&bundle.deposit.instructions),
        reserved_until: bundle.reserved.reserved_until_ts.millis(),
        otc_reservation_id,
    }))
}

/// `POST /routing/webhooks/deposit`.
///
/// Never answers 4xx: the notifier retries on non-2xx, so delivery
/// problems are reported in-band.
#[instrument(skip(state, request), fields(reference = %request.payment_reference))]
pub async fn deposit_webhook(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DepositWebhookRequest>,
) -> Json<DepositWebhookResponse> {
    let amount = match Amount::new(request.amount_received) {
        Ok(amount) => amount,
        Err(e) => {
            warn!(error = %e, "webhook carried an invalid amount");
            return Json(DepositWebhookResponse {
                success: false,
                deposit_id: None,
                execution_id: None,
            });
        }
    };

    match state
        .pipeline
        .handle_deposit_notification(&request.payment_reference, amount, request.bank_tx_id)
        .await
    {
        Ok(outcome) => {
            info!(
                deposit_id = %outcome.deposit_id,
                source = request.source.as_deref().unwrap_or("unknown"),
                "deposit notification applied"
            );
            Json(DepositWebhookResponse {
                success: true,
                deposit_id: Some(outcome.deposit_id.to_string()),
                execution_id: outcome.execution_id.map(|id| id.to_string()),
            })
        }
        Err(e) => {
            warn!(error = %e, "deposit notification not applied");
            Json(DepositWebhookResponse {
                success: false,
                deposit_id: None,
                execution_id: None,
            })
        }
    }
}

/// `GET /routing/status`.
pub async fn execution_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusResponse>, HandlerError> {
    let execution_id = Uuid::parse_str(&query.execution_id)
        .map(ExecutionId::new)
        .map_err(|_| bad_request("executionId is not a valid id"))?;

    let record = state
        .pipeline
        .execution_status(&execution_id)
        .await
        .map_err(<(StatusCode, Json<ErrorResponse>)>::from)?
        .ok_or_else(|| not_found(format!("execution {}", execution_id)))?;

    Ok(Json(StatusResponse::from(&record)))
}

/// `GET /routing/quotes`.
pub async fn cached_quotes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CachedQuotesQuery>,
) -> Result<Json<CachedQuotesResponse>, HandlerError> {
    let from = parse_token(&query.from_token, "fromToken")?;
    let to = parse_token(&query.to_token, "toToken")?;

    let quotes = state
        .cache
        .get_cached_by_pair(&from, &to)
        .await
        .map_err(|e| <(StatusCode, Json<ErrorResponse>)>::from(ApplicationError::from(e)))?;

    Ok(Json(CachedQuotesResponse {
        quotes: quotes.iter().map(CachedQuoteView::from).collect(),
    }))
}

/// `GET /routing/health`.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

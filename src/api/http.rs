use axum::{
    async_trait,
    extract::{FromRequest, Path, Query, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Form, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::error::ExplorerError;
use crate::index::{ChainHeight, IndexService, SummaryOptions};
use crate::logging::{ErrorLogger, LogContext};
use crate::models::{
    Address, AddressSummary, AddressValidator, HistoryPage, HistoryRequest, NetworkParams, PaginationWindow, RenderOptions,
    SummaryField, UnspentOutput,
};
use crate::services::{
    AddressSummaryService, HistoryPaginator, InsightTransactionRenderer, MessageVerifier, UtxoService, VerifyParams,
};

/// Error returned by every handler; rendered as `{ "message", "code" }`
#[derive(Debug)]
pub struct ApiError(pub ExplorerError);

impl<E> From<E> for ApiError
where
    E: Into<ExplorerError>,
{
    fn from(error: E) -> Self {
        ApiError(error.into())
    }
}

/// Error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub code: Option<i64>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        let status = if code.is_some() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };

        ErrorLogger::log_error(&self.0, Some(LogContext::new("api", "request")));

        let body = ErrorResponse {
            message: self.0.to_string(),
            code,
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub validator: AddressValidator,
    pub summaries: AddressSummaryService,
    pub utxos: UtxoService,
    pub history: HistoryPaginator,
    pub messages: MessageVerifier,
    pub page_size: u64,
}

impl AppState {
    pub fn new(
        index: Arc<dyn IndexService>,
        height: ChainHeight,
        network: &'static NetworkParams,
        page_size: u64,
        max_concurrency: usize,
    ) -> Self {
        let renderer = Arc::new(InsightTransactionRenderer::new(height.clone()));
        Self {
            validator: AddressValidator::new(network),
            summaries: AddressSummaryService::new(index.clone()),
            utxos: UtxoService::new(index.clone(), height),
            history: HistoryPaginator::new(index, renderer, max_concurrency),
            messages: MessageVerifier::new(network),
            page_size,
        }
    }

    pub fn from_config(config: &AppConfig, index: Arc<dyn IndexService>, height: ChainHeight) -> Result<Self, ExplorerError> {
        Ok(Self::new(
            index,
            height,
            config.network_params()?,
            config.history.default_page_size,
            config.history.max_concurrent_transforms,
        ))
    }
}

/// Query parameters for the address summary
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuery {
    pub no_tx_list: Option<String>,
    pub show_immature_balance: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UtxoQuery {
    #[serde(rename = "showImmatureBTs")]
    pub show_immature_bts: Option<String>,
}

/// Query parameters for multi-address history
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxsQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(rename = "showImmatureBTs")]
    pub show_immature_bts: Option<String>,
    pub no_asm: Option<String>,
    pub no_script_sig: Option<String>,
    pub no_spent: Option<String>,
}

/// `addrs` as a comma-joined string or a list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AddrsField {
    Joined(String),
    List(Vec<String>),
}

/// Body of the multi-address POST routes
#[derive(Debug, Default, Deserialize)]
pub struct AddrsBody {
    pub addrs: Option<AddrsField>,
    pub from: Option<Value>,
    pub to: Option<Value>,
    #[serde(rename = "showImmatureBTs")]
    pub show_immature_bts: Option<Value>,
}

/// Urlencoded form variant of `AddrsBody`; every value arrives as text
#[derive(Debug, Default, Deserialize)]
struct AddrsForm {
    addrs: Option<String>,
    from: Option<String>,
    to: Option<String>,
    #[serde(rename = "showImmatureBTs")]
    show_immature_bts: Option<String>,
}

impl From<AddrsForm> for AddrsBody {
    fn from(form: AddrsForm) -> Self {
        Self {
            addrs: form.addrs.map(AddrsField::Joined),
            from: form.from.map(Value::String),
            to: form.to.map(Value::String),
            show_immature_bts: form.show_immature_bts.map(Value::String),
        }
    }
}

/// POST body read as JSON or as an urlencoded form, per content-type.
/// An unreadable body counts as empty.
#[derive(Debug, Default)]
pub struct AddrsPayload(pub AddrsBody);

#[async_trait]
impl<S> FromRequest<S> for AddrsPayload
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);

        let body = if is_form {
            Form::<AddrsForm>::from_request(req, state)
                .await
                .ok()
                .map(|Form(form)| form.into())
        } else {
            Json::<AddrsBody>::from_request(req, state)
                .await
                .ok()
                .map(|Json(body)| body)
        };
        Ok(AddrsPayload(body.unwrap_or_default()))
    }
}

/// "1"/"true" are set, "0"/"false"/empty are unset, anything else is rejected
pub fn parse_flag(name: &str, value: Option<&str>) -> Result<bool, ExplorerError> {
    match value.map(str::trim) {
        None | Some("") | Some("0") | Some("false") => Ok(false),
        Some("1") | Some("true") => Ok(true),
        Some(other) => Err(ExplorerError::invalid_parameter(name, other)),
    }
}

pub fn parse_number(name: &str, value: Option<&str>) -> Result<Option<u64>, ExplorerError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ExplorerError::invalid_parameter(name, raw)),
    }
}

fn scalar(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

impl AppState {
    fn body_addresses(&self, body: &AddrsBody) -> Result<Vec<Address>, ExplorerError> {
        match &body.addrs {
            None => Err(ExplorerError::MissingAddress),
            Some(AddrsField::Joined(raw)) => self.validator.validate_list(raw),
            Some(AddrsField::List(list)) => self.validator.validate(list),
        }
    }

    fn history_request(
        &self,
        from: Option<String>,
        to: Option<String>,
        show_immature_bts: Option<String>,
        render: RenderOptions,
    ) -> Result<HistoryRequest, ExplorerError> {
        let from = parse_number("from", from.as_deref())?;
        let to = parse_number("to", to.as_deref())?;
        Ok(HistoryRequest {
            window: PaginationWindow::new(from, to, self.page_size)?,
            include_immature_bts: parse_flag("showImmatureBTs", show_immature_bts.as_deref())?,
            render,
        })
    }
}

/// GET /addr/:addr - Address summary
pub async fn get_address_summary(
    Path(addr): Path<String>,
    Query(params): Query<SummaryQuery>,
    State(state): State<AppState>,
) -> ApiResult<AddressSummary> {
    let address = state.validator.validate_one(&addr)?;
    let options = SummaryOptions {
        no_tx_list: parse_flag("noTxList", params.no_tx_list.as_deref())?,
        show_immature_balance: parse_flag("showImmatureBalance", params.show_immature_balance.as_deref())?,
        ..Default::default()
    }
    .with_range(
        parse_number("from", params.from.as_deref())?,
        parse_number("to", params.to.as_deref())?,
    );

    Ok(Json(state.summaries.get_summary(&address, &options).await?))
}

async fn summary_field(
    state: &AppState,
    addr: &str,
    field: SummaryField,
    show_immature_balance: Option<&str>,
) -> ApiResult<i64> {
    let address = state.validator.validate_one(addr)?;
    let show = parse_flag("showImmatureBalance", show_immature_balance)?;
    Ok(Json(state.summaries.get_field(&address, field, show).await?))
}

/// GET /addr/:addr/balance
pub async fn get_balance(
    Path(addr): Path<String>,
    Query(params): Query<SummaryQuery>,
    State(state): State<AppState>,
) -> ApiResult<i64> {
    summary_field(&state, &addr, SummaryField::Balance, params.show_immature_balance.as_deref()).await
}

/// GET /addr/:addr/totalReceived
pub async fn get_total_received(Path(addr): Path<String>, State(state): State<AppState>) -> ApiResult<i64> {
    summary_field(&state, &addr, SummaryField::TotalReceived, None).await
}

/// GET /addr/:addr/totalSent
pub async fn get_total_sent(Path(addr): Path<String>, State(state): State<AppState>) -> ApiResult<i64> {
    summary_field(&state, &addr, SummaryField::TotalSent, None).await
}

/// GET /addr/:addr/unconfirmedBalance
pub async fn get_unconfirmed_balance(
    Path(addr): Path<String>,
    Query(params): Query<SummaryQuery>,
    State(state): State<AppState>,
) -> ApiResult<i64> {
    summary_field(
        &state,
        &addr,
        SummaryField::UnconfirmedBalance,
        params.show_immature_balance.as_deref(),
    )
    .await
}

/// GET /addr/:addr/immatureBalance
pub async fn get_immature_balance(Path(addr): Path<String>, State(state): State<AppState>) -> ApiResult<i64> {
    summary_field(&state, &addr, SummaryField::ImmatureBalance, None).await
}

/// GET /addr/:addr/utxo
pub async fn get_address_utxo(
    Path(addr): Path<String>,
    Query(params): Query<UtxoQuery>,
    State(state): State<AppState>,
) -> ApiResult<Vec<UnspentOutput>> {
    let address = state.validator.validate_one(&addr)?;
    let show = parse_flag("showImmatureBTs", params.show_immature_bts.as_deref())?;
    Ok(Json(state.utxos.list(&address, show).await?))
}

/// GET /addrs/:addrs/utxo
pub async fn get_multi_utxo(
    Path(addrs): Path<String>,
    Query(params): Query<UtxoQuery>,
    State(state): State<AppState>,
) -> ApiResult<Vec<UnspentOutput>> {
    let addresses = state.validator.validate_list(&addrs)?;
    let show = parse_flag("showImmatureBTs", params.show_immature_bts.as_deref())?;
    Ok(Json(state.utxos.list_many(&addresses, show).await?))
}

/// POST /addrs/utxo
pub async fn post_multi_utxo(
    Query(params): Query<UtxoQuery>,
    State(state): State<AppState>,
    AddrsPayload(body): AddrsPayload,
) -> ApiResult<Vec<UnspentOutput>> {
    let addresses = state.body_addresses(&body)?;
    let show = params.show_immature_bts.or_else(|| scalar(body.show_immature_bts));
    let show = parse_flag("showImmatureBTs", show.as_deref())?;
    Ok(Json(state.utxos.list_many(&addresses, show).await?))
}

/// GET /addrs/:addrs/txs
pub async fn get_multi_txs(
    Path(addrs): Path<String>,
    Query(params): Query<TxsQuery>,
    State(state): State<AppState>,
) -> ApiResult<HistoryPage> {
    let addresses = state.validator.validate_list(&addrs)?;
    let render = RenderOptions {
        no_asm: parse_flag("noAsm", params.no_asm.as_deref())?,
        no_script_sig: parse_flag("noScriptSig", params.no_script_sig.as_deref())?,
        no_spent: parse_flag("noSpent", params.no_spent.as_deref())?,
    };
    let request = state.history_request(params.from, params.to, params.show_immature_bts, render)?;
    Ok(Json(state.history.get_history(&addresses, &request).await?))
}

/// POST /addrs/txs
pub async fn post_multi_txs(
    Query(params): Query<TxsQuery>,
    State(state): State<AppState>,
    AddrsPayload(body): AddrsPayload,
) -> ApiResult<HistoryPage> {
    let addresses = state.body_addresses(&body)?;
    let render = RenderOptions {
        no_asm: parse_flag("noAsm", params.no_asm.as_deref())?,
        no_script_sig: parse_flag("noScriptSig", params.no_script_sig.as_deref())?,
        no_spent: parse_flag("noSpent", params.no_spent.as_deref())?,
    };
    let request = state.history_request(
        params.from.or_else(|| scalar(body.from)),
        params.to.or_else(|| scalar(body.to)),
        params.show_immature_bts.or_else(|| scalar(body.show_immature_bts)),
        render,
    )?;
    Ok(Json(state.history.get_history(&addresses, &request).await?))
}

/// GET|POST /messages/verify
pub async fn verify_message(
    Query(query): Query<VerifyParams>,
    State(state): State<AppState>,
    body: Option<Json<VerifyParams>>,
) -> ApiResult<Value> {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let params = VerifyParams::merge(body, query);
    let result = state.messages.verify(&params)?;
    Ok(Json(json!({ "result": result })))
}

/// Every route, mounted under `prefix` (empty mounts at the root)
pub fn build_router(state: AppState, prefix: &str) -> Router {
    let routes = Router::new()
        .route("/addr/:addr", get(get_address_summary))
        .route("/addr/:addr/balance", get(get_balance))
        .route("/addr/:addr/totalReceived", get(get_total_received))
        .route("/addr/:addr/totalSent", get(get_total_sent))
        .route("/addr/:addr/unconfirmedBalance", get(get_unconfirmed_balance))
        .route("/addr/:addr/immatureBalance", get(get_immature_balance))
        .route("/addr/:addr/utxo", get(get_address_utxo))
        .route("/addrs/utxo", post(post_multi_utxo))
        .route("/addrs/:addrs/utxo", get(get_multi_utxo))
        .route("/addrs/txs", post(post_multi_txs))
        .route("/addrs/:addrs/txs", get(get_multi_txs))
        .route("/messages/verify", get(verify_message).post(verify_message));

    let app = if prefix.is_empty() || prefix == "/" {
        routes
    } else {
        Router::new().nest(prefix, routes)
    };

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
    .with_state(state)
}

/// HTTP API server
pub struct ApiServer {
    state: AppState,
    pub host: String,
    pub port: u16,
    pub prefix: String,
}

impl ApiServer {
    pub fn new(state: AppState, host: String, port: u16, prefix: String) -> Self {
        Self {
            state,
            host,
            port,
            prefix,
        }
    }

    /// Bind and serve until the process stops
    pub async fn start(&self) -> std::io::Result<()> {
        let app = build_router(self.state.clone(), &self.prefix);

        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr).await?;

        LogContext::new("api", "start")
            .with_metadata("addr", json!(addr))
            .with_metadata("prefix", json!(self.prefix))
            .info(&format!("HTTP API server listening on {}{}", addr, self.prefix));

        axum::serve(listener, app).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(!parse_flag("f", None).unwrap());
        assert!(!parse_flag("f", Some("")).unwrap());
        assert!(!parse_flag("f", Some("0")).unwrap());
        assert!(!parse_flag("f", Some("false")).unwrap());
        assert!(parse_flag("f", Some("1")).unwrap());
        assert!(parse_flag("f", Some("true")).unwrap());
        assert!(matches!(
            parse_flag("noAsm", Some("yes")),
            Err(ExplorerError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("from", None).unwrap(), None);
        assert_eq!(parse_number("from", Some("")).unwrap(), None);
        assert_eq!(parse_number("from", Some("25")).unwrap(), Some(25));
        assert!(parse_number("from", Some("-1")).is_err());
        assert!(parse_number("to", Some("ten")).is_err());
    }

    #[test]
    fn test_scalar_body_values() {
        assert_eq!(scalar(Some(json!(5))), Some("5".to_string()));
        assert_eq!(scalar(Some(json!("7"))), Some("7".to_string()));
        assert_eq!(scalar(Some(json!(true))), Some("true".to_string()));
        assert_eq!(scalar(Some(Value::Null)), None);
        assert_eq!(scalar(None), None);
    }

    #[test]
    fn test_addrs_body_accepts_string_or_list() {
        let joined: AddrsBody = serde_json::from_value(json!({"addrs": "a,b"})).unwrap();
        assert!(matches!(joined.addrs, Some(AddrsField::Joined(ref s)) if s == "a,b"));

        let list: AddrsBody = serde_json::from_value(json!({"addrs": ["a", "b"], "from": 0})).unwrap();
        assert!(matches!(list.addrs, Some(AddrsField::List(ref v)) if v.len() == 2));
    }

    #[tokio::test]
    async fn test_addrs_payload_reads_form_and_json() {
        let form = axum::http::Request::builder()
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(axum::body::Body::from("addrs=a,b&from=5&showImmatureBTs=1"))
            .unwrap();
        let AddrsPayload(body) = AddrsPayload::from_request(form, &()).await.unwrap();
        assert!(matches!(body.addrs, Some(AddrsField::Joined(ref s)) if s == "a,b"));
        assert_eq!(scalar(body.from), Some("5".to_string()));
        assert_eq!(scalar(body.show_immature_bts), Some("1".to_string()));

        let json_body = axum::http::Request::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(r#"{"addrs":["a"]}"#))
            .unwrap();
        let AddrsPayload(body) = AddrsPayload::from_request(json_body, &()).await.unwrap();
        assert!(matches!(body.addrs, Some(AddrsField::List(ref v)) if v.len() == 1));

        let empty = axum::http::Request::builder().body(axum::body::Body::empty()).unwrap();
        let AddrsPayload(body) = AddrsPayload::from_request(empty, &()).await.unwrap();
        assert!(body.addrs.is_none());
    }

    #[test]
    fn test_error_status_mapping() {
        let response = ApiError(ExplorerError::MissingAddress).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError(ExplorerError::IndexQueryFailed(crate::error::IndexError::Method {
            code: -5,
            message: "No information available for address".to_string(),
        }))
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError(ExplorerError::IndexQueryFailed(crate::error::IndexError::Connection(
            "refused".to_string(),
        )))
        .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

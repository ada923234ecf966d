use axum::{
    Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{
        Json,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_stream::{Stream, StreamExt, wrappers::BroadcastStream};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use medaudit_chat::{BroadcastBus, ChatError, ChatMessage, ChatService};
use medaudit_core::{
    MedicalAuditor, NewRequest, Procedure, QueueTab, Request, Tenant, TransitionCommand,
    TransitionError, User,
};
use medaudit_oracle::{
    DecisionOracle, DecisionSupport, GeminiClient, OracleConfig, OracleError, TextGenerator,
};
use medaudit_store::{
    seed, AuditService, ItemAmendment, MemoryBlobStorage, RecordStore, SlaOverview, StoreError,
    Upload,
};

/// Application state shared across REST API handlers
///
/// Holds the orchestration service, the advisory oracle, the chat service and
/// the resolvable actor directory.
#[derive(Clone)]
struct AppState {
    audit: Arc<AuditService>,
    oracle: Arc<DecisionOracle>,
    chat: Arc<ChatService>,
    users: Arc<Vec<User>>,
}

#[derive(Serialize, ToSchema)]
struct HealthRes {
    status: String,
}

#[derive(Deserialize, ToSchema)]
struct SendMessageBody {
    content: String,
}

#[derive(Deserialize)]
#[serde(default)]
struct QueueParams {
    tab: QueueTab,
    search: String,
}

impl Default for QueueParams {
    fn default() -> Self {
        Self {
            tab: QueueTab::InProgress,
            search: String::new(),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CatalogParams {
    search: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct AuditorParams {
    /// Restrict to auditors linked to this operator tenant.
    operator: Option<String>,
}

#[derive(Deserialize, ToSchema)]
struct AttachFileBody {
    doc_id: String,
    name: String,
    content_type: String,
    /// Raw file content, base64 is not applied; demo transport only.
    content: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_requests,
        create_request,
        transition_request,
        save_items,
        attach_files,
        sla_metrics,
        analyze_request,
        list_messages,
        send_message,
        stream_messages,
        list_procedures,
        list_tenants,
        list_auditors
    ),
    components(schemas(HealthRes, SendMessageBody, AttachFileBody))
)]
struct ApiDoc;

/// Main entry point for the MedAudit application
///
/// Starts the REST server with the in-memory backing store, seeded with the
/// demonstration tenants, auditors and catalog.
///
/// # Environment Variables
/// - `MEDAUDIT_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `GEMINI_API_KEY`: advisory oracle API key; without it the oracle serves
///   the contingency opinion only
/// - `MEDAUDIT_ORACLE_MODEL`: oracle model override
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medaudit=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("MEDAUDIT_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    tracing::info!("++ Starting MedAudit REST on {}", addr);

    let store = Arc::new(seed::demo_store().await);
    store
        .insert_request(seed::demo_request("REQ-0001", seed::OPERADORA_ID))
        .await?;
    let audit = Arc::new(AuditService::new(
        store,
        Arc::new(MemoryBlobStorage::default()),
    ));

    let generator: Arc<dyn TextGenerator> = match OracleConfig::from_env() {
        Ok(config) => Arc::new(GeminiClient::new(config)),
        Err(err) => {
            tracing::warn!(%err, "oracle not configured, serving contingency opinions");
            Arc::new(OfflineGenerator)
        }
    };

    let state = AppState {
        audit,
        oracle: Arc::new(DecisionOracle::new(generator)),
        chat: Arc::new(ChatService::new(Arc::new(BroadcastBus::default()))),
        users: Arc::new(seed::demo_users()),
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/requests", get(list_requests).post(create_request))
        .route("/requests/:id/transition", post(transition_request))
        .route("/requests/:id/items", put(save_items))
        .route("/requests/:id/files", post(attach_files))
        .route("/requests/:id/analyze", post(analyze_request))
        .route("/requests/:id/messages", get(list_messages).post(send_message))
        .route("/requests/:id/messages/stream", get(stream_messages))
        .route("/procedures", get(list_procedures))
        .route("/tenants", get(list_tenants))
        .route("/auditors", get(list_auditors))
        .route("/metrics/sla", get(sla_metrics))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

struct OfflineGenerator;

#[async_trait::async_trait]
impl TextGenerator for OfflineGenerator {
    async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, OracleError> {
        Err(OracleError::Config("GEMINI_API_KEY is not set".into()))
    }
}

type ApiError = (StatusCode, String);

/// Resolves the acting user from the `x-actor-id` header.
fn actor(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let id = headers
        .get("x-actor-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                "x-actor-id header is required".to_owned(),
            )
        })?;
    state
        .users
        .iter()
        .find(|u| u.id == id)
        .cloned()
        .ok_or_else(|| (StatusCode::UNAUTHORIZED, format!("unknown actor {id}")))
}

fn store_error(err: StoreError) -> ApiError {
    let status = match &err {
        StoreError::NotFound { .. }
        | StoreError::UnknownItem { .. }
        | StoreError::UnknownDocument { .. } => StatusCode::NOT_FOUND,
        StoreError::Conflict { .. } => StatusCode::CONFLICT,
        StoreError::Validation(_) | StoreError::UnknownProcedure { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        StoreError::Transition(TransitionError::Terminal { .. }) => StatusCode::CONFLICT,
        StoreError::Transition(TransitionError::Forbidden { .. }) | StoreError::Forbidden(_) => {
            StatusCode::FORBIDDEN
        }
        StoreError::Upload(_) => StatusCode::BAD_GATEWAY,
        StoreError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

fn chat_error(err: ChatError) -> ApiError {
    let status = match &err {
        ChatError::EmptyContent => StatusCode::UNPROCESSABLE_ENTITY,
        ChatError::Delivery(_) => StatusCode::BAD_GATEWAY,
    };
    (status, err.to_string())
}

/// The single dossier slot an upload batch targets.
fn batch_doc_id(files: &[AttachFileBody]) -> Result<String, ApiError> {
    let Some(first) = files.first() else {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "empty upload batch".into()));
    };
    if files.iter().any(|f| f.doc_id != first.doc_id) {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "all files of one batch must target the same document slot".into(),
        ));
    }
    Ok(first.doc_id.clone())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        status: "ok".to_owned(),
    })
}

#[utoipa::path(
    get,
    path = "/requests",
    params(
        ("tab" = Option<String>, Query, description = "IN_PROGRESS (default) or COMPLETED"),
        ("search" = Option<String>, Query, description = "Beneficiary name or request id substring")
    ),
    responses(
        (status = 200, description = "The actor's visible work queue"),
        (status = 401, description = "Unknown actor")
    )
)]
/// The actor's work queue
///
/// Tenant scoping, role routing (specialist/generalist two-tier dispatch),
/// tab filtering and search are all applied server-side.
async fn list_requests(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<QueueParams>,
) -> Result<Json<Vec<Request>>, ApiError> {
    let actor = actor(&state, &headers)?;
    let queue = state
        .audit
        .queue(&actor, params.tab, &params.search)
        .await
        .map_err(store_error)?;
    Ok(Json(queue))
}

#[utoipa::path(
    post,
    path = "/requests",
    responses(
        (status = 201, description = "Request registered"),
        (status = 422, description = "Validation failed or unknown procedure code, nothing persisted"),
        (status = 401, description = "Unknown actor")
    )
)]
/// Registers a new authorization request owned by the actor's tenant
async fn create_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<NewRequest>,
) -> Result<(StatusCode, Json<Request>), ApiError> {
    let actor = actor(&state, &headers)?;
    let request = state
        .audit
        .create_request(draft, &actor)
        .await
        .map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[utoipa::path(
    post,
    path = "/requests/{id}/transition",
    params(("id" = String, Path, description = "Request id")),
    responses(
        (status = 200, description = "Transition applied, updated request returned"),
        (status = 403, description = "Actor may not perform this transition"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request is finished, or was modified concurrently")
    )
)]
/// Applies one workflow transition
///
/// Legality is checked server-side against the role/step table. Reaching
/// FINISHED assigns the authorization code.
async fn transition_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(command): Json<TransitionCommand>,
) -> Result<Json<Request>, ApiError> {
    let actor = actor(&state, &headers)?;
    let request = state
        .audit
        .transition(&id, &actor, command)
        .await
        .map_err(store_error)?;
    Ok(Json(request))
}

#[utoipa::path(
    put,
    path = "/requests/{id}/items",
    params(("id" = String, Path, description = "Request id")),
    responses(
        (status = 200, description = "Item decisions saved"),
        (status = 403, description = "Only a medical auditor may amend items, in AUDIT only"),
        (status = 404, description = "Request or item not found")
    )
)]
/// Persists the auditor's per-item decisions
async fn save_items(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(amendments): Json<Vec<ItemAmendment>>,
) -> Result<Json<Request>, ApiError> {
    let actor = actor(&state, &headers)?;
    let request = state
        .audit
        .save_items(&id, &actor, amendments)
        .await
        .map_err(store_error)?;
    Ok(Json(request))
}

#[utoipa::path(
    post,
    path = "/requests/{id}/files",
    params(("id" = String, Path, description = "Request id")),
    request_body = Vec<AttachFileBody>,
    responses(
        (status = 200, description = "Files stored into the dossier slot"),
        (status = 404, description = "Request or document slot not found"),
        (status = 422, description = "Empty batch, or files targeting different slots"),
        (status = 502, description = "Every file of the batch failed")
    )
)]
/// Uploads a batch of files into one dossier slot
///
/// Partial success is accepted; the slot accumulates whatever uploaded.
async fn attach_files(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(files): Json<Vec<AttachFileBody>>,
) -> Result<Json<Request>, ApiError> {
    actor(&state, &headers)?;
    let doc_id = batch_doc_id(&files)?;
    let uploads = files
        .into_iter()
        .map(|f| Upload {
            name: f.name,
            content_type: f.content_type,
            bytes: f.content.into_bytes(),
        })
        .collect();
    let request = state
        .audit
        .attach_files(&id, &doc_id, uploads)
        .await
        .map_err(store_error)?;
    Ok(Json(request))
}

#[utoipa::path(
    get,
    path = "/metrics/sla",
    responses(
        (status = 200, description = "Average audit duration and per-step counts"),
        (status = 401, description = "Unknown actor")
    )
)]
/// SLA aggregates over the requests the actor may see
async fn sla_metrics(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SlaOverview>, ApiError> {
    let actor = actor(&state, &headers)?;
    let overview = state
        .audit
        .sla_overview(&actor)
        .await
        .map_err(store_error)?;
    Ok(Json(overview))
}

#[utoipa::path(
    post,
    path = "/requests/{id}/analyze",
    params(("id" = String, Path, description = "Request id")),
    responses(
        (status = 200, description = "Advisory opinion; contingency on any oracle failure"),
        (status = 404, description = "Request not found")
    )
)]
/// Requests an advisory AI opinion for one request
///
/// Strictly advisory: the opinion is returned to the caller and influences
/// nothing server-side. The oracle never fails; degraded paths serve the
/// contingency opinion.
async fn analyze_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<DecisionSupport>, ApiError> {
    actor(&state, &headers)?;
    let request = state.audit.store().request(&id).await.map_err(store_error)?;
    let rules = state
        .audit
        .store()
        .active_rules()
        .await
        .map_err(store_error)?;
    Ok(Json(state.oracle.analyze(&request, &rules).await))
}

#[utoipa::path(
    get,
    path = "/requests/{id}/messages",
    params(("id" = String, Path, description = "Request id")),
    responses(
        (status = 200, description = "Discussion history, oldest first")
    )
)]
/// The technical discussion of one request
async fn list_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    actor(&state, &headers)?;
    Ok(Json(state.chat.history(&id).await))
}

#[utoipa::path(
    post,
    path = "/requests/{id}/messages",
    params(("id" = String, Path, description = "Request id")),
    request_body = SendMessageBody,
    responses(
        (status = 201, description = "Message delivered and broadcast"),
        (status = 422, description = "Blank content"),
        (status = 502, description = "Transport failed to deliver the message"),
        (status = 401, description = "Unknown actor")
    )
)]
/// Sends a message into the request's discussion
async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<SendMessageBody>,
) -> Result<(StatusCode, Json<ChatMessage>), ApiError> {
    let actor = actor(&state, &headers)?;
    let message = state
        .chat
        .send(&id, &actor, &body.content)
        .await
        .map_err(chat_error)?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[utoipa::path(
    get,
    path = "/requests/{id}/messages/stream",
    params(("id" = String, Path, description = "Request id")),
    responses(
        (status = 200, description = "Server-sent event stream of confirmed messages"),
        (status = 401, description = "Unknown actor")
    )
)]
/// Live feed of one request's discussion
///
/// Each confirmed message is delivered as one JSON event. The feed starts at
/// subscription time; history is served by the plain GET.
async fn stream_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    actor(&state, &headers)?;
    let feed = state.chat.subscribe(&id).await;
    let stream = BroadcastStream::new(feed).filter_map(|message| match message {
        Ok(message) => Some(Event::default().json_data(message)),
        // A lagged receiver skips what it missed and keeps following.
        Err(_) => None,
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[utoipa::path(
    get,
    path = "/procedures",
    params(("search" = Option<String>, Query, description = "Procedure code or description substring")),
    responses(
        (status = 200, description = "Matching active catalog entries"),
        (status = 401, description = "Unknown actor")
    )
)]
/// Active procedure catalog search, as used by the registration form
async fn list_procedures(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CatalogParams>,
) -> Result<Json<Vec<Procedure>>, ApiError> {
    actor(&state, &headers)?;
    let hits = state
        .audit
        .store()
        .search_procedures(&params.search)
        .await
        .map_err(store_error)?;
    Ok(Json(hits))
}

#[utoipa::path(
    get,
    path = "/tenants",
    responses(
        (status = 200, description = "Registered gestoras and operators"),
        (status = 401, description = "Unknown actor")
    )
)]
/// The tenant directory
async fn list_tenants(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Tenant>>, ApiError> {
    actor(&state, &headers)?;
    let tenants = state.audit.store().tenants().await.map_err(store_error)?;
    Ok(Json(tenants))
}

#[utoipa::path(
    get,
    path = "/auditors",
    params(("operator" = Option<String>, Query, description = "Restrict to auditors linked to this operator tenant")),
    responses(
        (status = 200, description = "Registered medical auditors"),
        (status = 401, description = "Unknown actor")
    )
)]
/// The medical auditor directory
async fn list_auditors(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<AuditorParams>,
) -> Result<Json<Vec<MedicalAuditor>>, ApiError> {
    actor(&state, &headers)?;
    let mut auditors = state.audit.store().auditors().await.map_err(store_error)?;
    if let Some(operator) = &params.operator {
        auditors.retain(|a| a.works_for(operator));
    }
    Ok(Json(auditors))
}

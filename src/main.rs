use axum::{
    Router,
    extract::{Form, Query, State},
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use mosaic_core::{HttpServiceClient, Microservice, MixService, Registry, ResponseCache};
use mosaic_tiles::{GridView, MasonryLayout, Record};
use mosaic_types::{Coordinates, ServiceAddr};

/// Application state shared across HTTP handlers
///
/// Holds the registry of connected services, the location-keyed response
/// cache and the shared outbound client. The registry and cache sit behind
/// async locks because a mix call both reads registrations and writes back
/// freshness windows learned from responses.
#[derive(Clone)]
struct AppState {
    registry: Arc<RwLock<Registry>>,
    cache: Arc<Mutex<ResponseCache>>,
    client: Arc<HttpServiceClient>,
    mix: MixService,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, register_service, deregister_service, mix),
    components(schemas(HealthRes, RegisterReq, DependencyNode, DeregisterReq, MixForm))
)]
struct ApiDoc;

/// Main entry point for the mosaic middleware
///
/// Starts the HTTP server that connected information services register with
/// and that browsers query for aggregated tile dashboards.
///
/// # Environment Variables
/// - `MOSAIC_ADDR`: server address (default: "0.0.0.0:3000")
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mosaic=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("MOSAIC_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    tracing::info!("++ Starting mosaic on {}", addr);

    let state = AppState {
        registry: Arc::new(RwLock::new(Registry::new())),
        cache: Arc::new(Mutex::new(ResponseCache::new())),
        client: Arc::new(HttpServiceClient::new()),
        mix: MixService::new(),
    };

    let app = Router::new()
        .route("/", get(index))
        .route("/dashboard", get(dashboard))
        .route("/health", get(health))
        .route("/microservice", put(register_service).delete(deregister_service))
        .route("/mix", post(mix))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize, ToSchema)]
struct HealthRes {
    ok: bool,
    message: String,
}

/// Registration payload for an information service.
///
/// All presentation fields are required on the wire; they are optional here
/// so their absence can be reported with the exact key name.
#[derive(Debug, Deserialize, ToSchema)]
struct RegisterReq {
    ip: Option<String>,
    #[schema(value_type = Option<String>)]
    port: Option<PortField>,
    name: Option<String>,
    creator: Option<String>,
    tile: Option<String>,
    #[serde(default)]
    dependencies: Vec<DependencyNode>,
}

/// One node of a registration's dependency tree.
#[derive(Debug, Deserialize, ToSchema)]
struct DependencyNode {
    ip: String,
    #[schema(value_type = String)]
    port: PortField,
    #[serde(default)]
    dependencies: Vec<DependencyNode>,
}

#[derive(Debug, Deserialize, ToSchema)]
struct DeregisterReq {
    ip: String,
    #[schema(value_type = String)]
    port: PortField,
}

#[derive(Debug, Deserialize, ToSchema)]
struct MixForm {
    location: String,
}

/// A port on the wire: services send it as either a JSON string or a number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortField {
    Number(u16),
    Text(String),
}

impl PortField {
    fn as_port(&self) -> Option<u16> {
        match self {
            PortField::Number(port) => Some(*port),
            PortField::Text(text) => text.trim().parse().ok(),
        }
    }
}

fn required_key_message(key: &str) -> String {
    format!("Required key {key} not present in payload JSON.")
}

fn invalid_input() -> String {
    "Invalid input".to_string()
}

/// Validates a registration payload and builds the service it describes.
///
/// Required keys are checked in wire order (port, ip, name, creator, tile)
/// so the first missing one names the rejection.
fn service_from_request(req: RegisterReq) -> Result<Microservice, String> {
    let port = req.port.ok_or_else(|| required_key_message("port"))?;
    let ip = req.ip.ok_or_else(|| required_key_message("ip"))?;
    let name = req.name.ok_or_else(|| required_key_message("name"))?;
    let creator = req.creator.ok_or_else(|| required_key_message("creator"))?;
    let tile = req.tile.ok_or_else(|| required_key_message("tile"))?;

    let port = port.as_port().ok_or_else(invalid_input)?;
    let addr = ServiceAddr::new(&ip, port).map_err(|_| invalid_input())?;
    let dependencies = convert_dependencies(&req.dependencies)?;

    Ok(Microservice::new(addr)
        .with_presentation(name, creator, tile)
        .with_dependencies(dependencies))
}

/// Converts a registration's dependency tree, recursively.
fn convert_dependencies(nodes: &[DependencyNode]) -> Result<Vec<Microservice>, String> {
    let mut services = Vec::with_capacity(nodes.len());
    for node in nodes {
        let port = node.port.as_port().ok_or_else(invalid_input)?;
        let addr = ServiceAddr::new(&node.ip, port).map_err(|_| invalid_input())?;
        services.push(
            Microservice::new(addr).with_dependencies(convert_dependencies(&node.dependencies)?),
        );
    }
    Ok(services)
}

/// Runs one aggregation pass under the shared locks.
async fn run_mix(state: &AppState, coords: Coordinates) -> Vec<Record> {
    let mut registry = state.registry.write().await;
    let mut cache = state.cache.lock().await;
    state
        .mix
        .mix(&mut registry, &mut cache, state.client.as_ref(), coords)
        .await
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "mosaic is alive".into(),
    })
}

#[utoipa::path(
    put,
    path = "/microservice",
    request_body = RegisterReq,
    responses(
        (status = 200, description = "Service registered"),
        (status = 400, description = "Missing required key or invalid address")
    )
)]
/// Register an information service
///
/// Adds (or replaces) the service at the payload's address, together with its
/// dependency tree and the presentation fields shown on its tile.
async fn register_service(
    State(state): State<AppState>,
    Json(req): Json<RegisterReq>,
) -> Result<&'static str, (StatusCode, String)> {
    match service_from_request(req) {
        Ok(service) => {
            state.registry.write().await.register(service);
            Ok("Success")
        }
        Err(message) => Err((StatusCode::BAD_REQUEST, message)),
    }
}

#[utoipa::path(
    delete,
    path = "/microservice",
    request_body = DeregisterReq,
    responses(
        (status = 200, description = "Service removed (or was never registered)"),
        (status = 400, description = "Invalid address")
    )
)]
/// Deregister an information service by address
async fn deregister_service(
    State(state): State<AppState>,
    Json(req): Json<DeregisterReq>,
) -> Result<&'static str, (StatusCode, String)> {
    let port = req.port.as_port().ok_or((StatusCode::BAD_REQUEST, invalid_input()))?;
    let addr = ServiceAddr::new(&req.ip, port)
        .map_err(|_| (StatusCode::BAD_REQUEST, invalid_input()))?;
    tracing::info!("disconnect requested by: {}", addr);
    state.registry.write().await.deregister(&addr);
    Ok("Success")
}

#[utoipa::path(
    post,
    path = "/mix",
    request_body(content = MixForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Merged records for every registered service"),
        (status = 400, description = "Malformed or out-of-range location")
    )
)]
/// Aggregate every registered service for a query location
async fn mix(
    State(state): State<AppState>,
    Form(form): Form<MixForm>,
) -> Result<Json<Vec<Record>>, (StatusCode, &'static str)> {
    let coords = Coordinates::parse(&form.location)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid input"))?;
    Ok(Json(run_mix(&state, coords).await))
}

/// Dashboard page shell with an empty grid
async fn index() -> Html<String> {
    let view: GridView<MasonryLayout> = GridView::new();
    Html(render_page(&view.to_html()))
}

#[derive(Debug, Deserialize)]
struct DashboardParams {
    location: String,
}

/// Server-rendered dashboard: one tile per registered service
///
/// Runs a mix for the query location, renders every record as a card on the
/// grid and mounts the masonry layout over the result.
async fn dashboard(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<Html<String>, (StatusCode, &'static str)> {
    let coords = Coordinates::parse(&params.location)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid input"))?;
    let records = run_mix(&state, coords).await;

    let mut view: GridView<MasonryLayout> = GridView::new();
    for record in &records {
        view.push_record(record);
    }
    view.relayout();

    Ok(Html(render_page(&view.to_html())))
}

const PAGE_STYLES: &str = "body{font-family:sans-serif;margin:2rem;}\
.grid{display:flex;flex-wrap:wrap;gap:1rem;align-items:flex-start;}\
.grid-item{width:18rem;}\
.card{border:1px solid #ddd;border-radius:6px;box-shadow:0 1px 3px rgba(0,0,0,0.1);}\
.card-body{padding:1rem;}\
.card-title{margin:0 0 0.5rem 0;}\
.card-text{margin:0.25rem 0;}\
.text-muted{color:#6c757d;}\
.tab{margin:0 0 0 1.5em;}";

fn render_page(grid: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>mosaic</title>\
         <style>{PAGE_STYLES}</style></head><body><h1>mosaic</h1>\
         <form action=\"/dashboard\" method=\"get\">\
         <input name=\"location\" placeholder=\"latitude,longitude\">\
         <button type=\"submit\">Mix</button></form>\
         {grid}</body></html>"
    )
}

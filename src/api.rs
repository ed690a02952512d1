//! REST API for the load planner.
//!
//! Thin transport over the entry points in `service`. Uses Axum as the web
//! framework and supports CORS. The engine runs on the blocking pool since a
//! call may read the fleet from disk.

use std::sync::{Arc, OnceLock};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use utoipa::{OpenApi, ToSchema};

use crate::config::{ApiConfig, EngineConfig};
use crate::diagnosis::UnplacedReason;
use crate::model::{Container, ContainerCategory, Item, UnitItem};
use crate::optimizer::{EvaluationResult, PackStats, Placement, UnplacedItem};
use crate::pool::{ContainerPool, PoolError, PoolFilter};
use crate::service::{
    self, ContainerLoad, EngineError, PlacementOptions, SimulationReport,
};
use crate::types::Dimensions;

#[derive(Clone)]
struct ApiState {
    engine_config: EngineConfig,
    pool: Arc<dyn ContainerPool>,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>load-planner API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"
            integrity="sha384-2YH8WDRaj7V2OqU/trsmzSagmk/E2SutiCsGkdgoQwC9pNUJV1u/141DHB6jgs8t"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                const ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
                window.ui = ui;
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Request body carrying only the item list.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "items": [
            {
                "reference": "PAL-001",
                "dimensions": { "length": 50.0, "width": 40.0, "height": 30.0 },
                "weight": 10.0,
                "quantity": 2
            }
        ]
    })
)]
pub struct ItemsRequest {
    #[serde(default)]
    pub items: Vec<Item>,
}

/// Request body for a placement simulation.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "items": [
            {
                "dimensions": { "length": 120.0, "width": 80.0, "height": 150.0 },
                "weight": 400.0,
                "quantity": 4,
                "stackable": false
            },
            {
                "dimensions": { "length": 60.0, "width": 40.0, "height": 40.0 },
                "weight": 15.0,
                "fragile": true
            }
        ],
        "options": { "category": "truck" }
    })
)]
pub struct SimulateRequest {
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub options: PlacementOptions,
}

/// Best single container, `null` when no container is available.
#[derive(Serialize, ToSchema)]
pub struct OptimalResponse {
    pub container: Option<EvaluationResult>,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn pool_error(err: &PoolError) -> Response {
    error!("Container pool read failed: {}", err);
    error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        "Container pool unavailable",
        err.to_string(),
    )
}

fn engine_error(err: EngineError) -> Response {
    match &err {
        EngineError::NoItems
        | EngineError::InvalidItem { .. }
        | EngineError::TooManyUnits { .. } => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid input data",
            err.to_string(),
        ),
        EngineError::Pool(pool_err) => pool_error(pool_err),
    }
}

/// Runs an engine call on the blocking pool.
async fn run_engine<T, F>(job: F) -> Result<T, Response>
where
    F: FnOnce() -> Result<T, EngineError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(job).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(engine_error(err)),
        Err(err) => {
            error!("Engine task failed: {}", err);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Computation failed",
                err.to_string(),
            ))
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handle_suggest,
        handle_optimal,
        handle_simulate,
        handle_simulate_stream,
        handle_containers
    ),
    components(
        schemas(
            ItemsRequest,
            SimulateRequest,
            OptimalResponse,
            ErrorResponse,
            Item,
            UnitItem,
            Dimensions,
            Container,
            ContainerCategory,
            PlacementOptions,
            EvaluationResult,
            SimulationReport,
            ContainerLoad,
            Placement,
            UnplacedItem,
            UnplacedReason,
            PackStats
        )
    ),
    tags((name = "planning", description = "Endpoints for container allocation"))
)]
struct ApiDoc;

fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/suggest", post(handle_suggest))
        .route("/optimal", post(handle_optimal))
        .route("/simulate", post(handle_simulate))
        .route("/simulate_stream", post(handle_simulate_stream))
        .route("/containers", get(handle_containers))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state)
}

/// Starts the API server.
///
/// Blocks until the server is terminated.
pub async fn start_api_server(
    config: ApiConfig,
    engine_config: EngineConfig,
    pool: Arc<dyn ContainerPool>,
) {
    let app = router(ApiState {
        engine_config,
        pool,
    });

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Could not bind API server to {}: {}", addr, err);
            return;
        }
    };

    info!(
        "Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() {
        info!("Local access: http://localhost:{}", config.port());
    }
    info!("Endpoints: POST /suggest, POST /optimal, POST /simulate, POST /simulate_stream, GET /containers");
    info!("Documentation: GET /docs, GET /docs/openapi.json");

    if let Err(err) = axum::serve(listener, app).await {
        error!("API server terminated with an error: {err}");
    }
}

/// Handler for POST /suggest.
///
/// Lists containers whose raw capacity covers the requested volume and weight.
#[utoipa::path(
    post,
    path = "/suggest",
    request_body = ItemsRequest,
    responses(
        (status = 200, description = "Containers large enough, smallest first", body = [Container]),
        (status = UNPROCESSABLE_ENTITY, description = "Missing or invalid items", body = ErrorResponse),
        (status = SERVICE_UNAVAILABLE, description = "Container pool unavailable", body = ErrorResponse)
    ),
    tag = "planning"
)]
async fn handle_suggest(
    State(state): State<ApiState>,
    payload: Result<Json<ItemsRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    let pool = state.pool.clone();
    match run_engine(move || service::suggest_containers(pool.as_ref(), &request.items)).await {
        Ok(containers) => (StatusCode::OK, Json(containers)).into_response(),
        Err(response) => response,
    }
}

/// Handler for POST /optimal.
///
/// Evaluates every available container and returns the best single one.
#[utoipa::path(
    post,
    path = "/optimal",
    request_body = ItemsRequest,
    responses(
        (status = 200, description = "Best single container", body = OptimalResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Missing or invalid items", body = ErrorResponse),
        (status = SERVICE_UNAVAILABLE, description = "Container pool unavailable", body = ErrorResponse)
    ),
    tag = "planning"
)]
async fn handle_optimal(
    State(state): State<ApiState>,
    payload: Result<Json<ItemsRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    let pool = state.pool.clone();
    let config = state.engine_config.packing_config();
    match run_engine(move || {
        service::find_optimal_container(pool.as_ref(), &request.items, &config)
    })
    .await
    {
        Ok(container) => (StatusCode::OK, Json(OptimalResponse { container })).into_response(),
        Err(response) => response,
    }
}

/// Handler for POST /simulate.
///
/// Distributes the items over the selected containers. Items that fit
/// nowhere are listed with a reason; the call still answers 200.
#[utoipa::path(
    post,
    path = "/simulate",
    request_body = SimulateRequest,
    responses(
        (status = 200, description = "Simulation report", body = SimulationReport),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid items", body = ErrorResponse),
        (status = SERVICE_UNAVAILABLE, description = "Container pool unavailable", body = ErrorResponse)
    ),
    tag = "planning"
)]
async fn handle_simulate(
    State(state): State<ApiState>,
    payload: Result<Json<SimulateRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    info!("New simulation request: {} item rows", request.items.len());
    let pool = state.pool.clone();
    let config = state.engine_config.packing_config();
    match run_engine(move || {
        service::simulate_placement(pool.as_ref(), &request.items, &request.options, &config)
    })
    .await
    {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(response) => response,
    }
}

/// Handler for POST /simulate_stream (SSE).
///
/// Streams packing events as Server-Sent Events, followed by a final
/// `Report` (or `Error`) message.
#[utoipa::path(
    post,
    path = "/simulate_stream",
    request_body = SimulateRequest,
    responses(
        (
            status = 200,
            description = "Streams packing events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid JSON", body = ErrorResponse)
    ),
    tag = "planning"
)]
async fn handle_simulate_stream(
    State(state): State<ApiState>,
    payload: Result<Json<SimulateRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    let (tx, rx) = mpsc::channel::<String>(32);
    let pool = state.pool.clone();
    let config = state.engine_config.packing_config();

    tokio::task::spawn_blocking(move || {
        let result = service::simulate_placement_with_progress(
            pool.as_ref(),
            &request.items,
            &request.options,
            &config,
            |evt| {
                if let Ok(json) = serde_json::to_string(evt) {
                    // Receiver may be gone; remaining events are discarded.
                    let _ = tx.blocking_send(json);
                }
            },
        );

        let closing = match result {
            Ok(report) => json!({ "type": "Report", "report": report }),
            Err(err) => {
                warn!("Streamed simulation failed: {}", err);
                json!({ "type": "Error", "error": err.to_string() })
            }
        };
        let _ = tx.blocking_send(closing.to_string());
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Handler for GET /containers.
///
/// Lists the currently available containers.
#[utoipa::path(
    get,
    path = "/containers",
    responses(
        (status = 200, description = "Available containers", body = [Container]),
        (status = SERVICE_UNAVAILABLE, description = "Container pool unavailable", body = ErrorResponse)
    ),
    tag = "planning"
)]
async fn handle_containers(State(state): State<ApiState>) -> Response {
    let pool = state.pool.clone();
    match run_engine(move || Ok(pool.list_available(&PoolFilter::All)?)).await {
        Ok(containers) => (StatusCode::OK, Json(containers)).into_response(),
        Err(response) => response,
    }
}

async fn serve_openapi_json(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui(State(_state): State<ApiState>) -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_doc_lists_expected_paths() {
        let doc = openapi_doc();
        let paths = &doc.paths.paths;
        for path in [
            "/suggest",
            "/optimal",
            "/simulate",
            "/simulate_stream",
            "/containers",
        ] {
            assert!(
                paths.contains_key(path),
                "OpenAPI documentation is missing the {} path",
                path
            );
        }
    }

    #[test]
    fn openapi_doc_contains_key_schemas() {
        let doc = openapi_doc();
        let components = doc
            .components
            .as_ref()
            .expect("OpenAPI documentation contains no components");
        let schemas = &components.schemas;
        for name in [
            "SimulateRequest",
            "SimulationReport",
            "EvaluationResult",
            "UnplacedReason",
            "ErrorResponse",
        ] {
            assert!(
                schemas.contains_key(name),
                "Expected schema '{}' is missing from the OpenAPI document",
                name
            );
        }
    }

    #[test]
    fn simulate_request_without_options_uses_defaults() {
        let json = r#"{
            "items": [{"dimensions": {"length": 10.0, "width": 10.0, "height": 10.0}, "weight": 1.0}]
        }"#;
        let request: SimulateRequest = serde_json::from_str(json).expect("Should parse valid JSON");
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.options, PlacementOptions::default());
    }

    #[test]
    fn simulate_request_parses_options() {
        let json = r#"{
            "items": [{"dimensions": {"length": 10.0, "width": 10.0, "height": 10.0}, "weight": 1.0}],
            "options": {"container_ids": ["CTR-20DV"], "category": "shippingContainer"}
        }"#;
        let request: SimulateRequest = serde_json::from_str(json).expect("Should parse valid JSON");
        assert_eq!(
            request.options.container_ids,
            Some(vec!["CTR-20DV".to_string()])
        );
        assert_eq!(
            request.options.category,
            Some(ContainerCategory::ShippingContainer)
        );
    }

    #[test]
    fn missing_items_field_parses_as_empty() {
        let request: ItemsRequest = serde_json::from_str("{}").expect("Should parse valid JSON");
        assert!(request.items.is_empty());
    }

    #[test]
    fn engine_errors_map_to_status_codes() {
        assert_eq!(
            engine_error(EngineError::NoItems).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            engine_error(EngineError::TooManyUnits {
                requested: 10,
                limit: 5
            })
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            engine_error(EngineError::Pool(PoolError::MissingAsset("x".into()))).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn report_serializes_reason_codes() {
        let pool = crate::pool::StaticPool::embedded().unwrap();
        let items = vec![Item::new(Dimensions::new(5000.0, 5000.0, 5000.0), 1.0)];
        let report = service::simulate_placement(
            &pool,
            &items,
            &PlacementOptions::default(),
            &crate::optimizer::PackingConfig::default(),
        )
        .unwrap();
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(
            value["unplaced_items"][0]["reason"],
            json!("DIMENSIONS_TOO_LARGE")
        );
    }
}

use axum::{
    Json,
    Router,
    extract::{ FromRequestParts, State },
    http::{ request::Parts, HeaderValue },
    response::Html,
    routing::{ get, post },
};
use serde_json::{ json, Value };
use std::sync::Arc;
use tower_http::cors::{ AllowHeaders, AllowMethods, AllowOrigin, CorsLayer };
use utoipa::OpenApi;

use crate::config::AllowedOrigins;
use crate::errors::GatewayError;
use crate::llm::ChatClient;
use crate::logging::Logger;
use crate::models::chat::{ ChatRequest, ChatResponse };
use crate::models::role::{ Role, RoleDocument };
use crate::store::{ RoleStore, RoleStoreProvider };
use super::openapi::{ ApiDoc, REDOC_PAGE, SWAGGER_UI_PAGE };

#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<dyn ChatClient>,
    pub roles: Arc<dyn RoleStoreProvider>,
    pub logger: Arc<Logger>,
}

/// Role store handle opened for the duration of one request. It is dropped,
/// and its connection released, when the handler returns or fails.
pub struct RoleSession(pub Box<dyn RoleStore>);

impl FromRequestParts<AppState> for RoleSession {
    type Rejection = GatewayError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState
    ) -> Result<Self, Self::Rejection> {
        state.roles.open().await.map(RoleSession)
    }
}

pub fn cors_layer(origins: &AllowedOrigins, logger: &Logger) -> CorsLayer {
    // Credentialed requests cannot be answered with a literal `*`, so the
    // wildcard is served by echoing the caller's origin.
    let allow_origin = match origins {
        AllowedOrigins::Any => AllowOrigin::mirror_request(),
        AllowedOrigins::List(hosts) => {
            let values: Vec<HeaderValue> = hosts
                .iter()
                .filter_map(|h| match HeaderValue::from_str(h) {
                    Ok(v) => Some(v),
                    Err(e) => {
                        logger.warn(format_args!("Ignoring invalid CORS origin '{}': {}", h, e));
                        None
                    }
                })
                .collect();
            AllowOrigin::list(values)
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn build_router(state: AppState, origins: &AllowedOrigins) -> Router {
    let cors = cors_layer(origins, &state.logger);

    let chat_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler));

    let role_routes = Router::new()
        .route("/add-role", post(add_role_handler))
        .route("/get-roles", get(get_roles_handler));

    let doc_routes = Router::new()
        .route("/openapi.json", get(openapi_handler))
        .route("/docs", get(|| async { Html(SWAGGER_UI_PAGE) }))
        .route("/redoc", get(|| async { Html(REDOC_PAGE) }));

    Router::new()
        .route("/", get(root_handler))
        .merge(doc_routes)
        .nest("/api", chat_routes)
        .nest("/roles", role_routes)
        .layer(cors)
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "meta",
    responses((status = 200, description = "Summary of the available endpoints"))
)]
async fn root_handler() -> Json<Value> {
    Json(api_descriptor())
}

async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn api_descriptor() -> Value {
    let role_format =
        json!({
        "id": "role_id",
        "category": "role_categories",
        "name": "role_name",
        "emoji": "emoji",
        "description": "role_description",
        "color": "background color and border color for tailwind with dark mode and light mode, example: bg-purple-50 border-purple-200 dark:bg-purple-900/20 dark:border-purple-800",
        "prompt": "prompt"
    });
    let mut stored_format = role_format.clone();
    stored_format["_id"] = json!("store_assigned_id");

    json!({
        "message": "Custom ChatGPT API is running successfully.",
        "endpoints": {
            "chat_api": [
                {
                    "method": "POST",
                    "url": "/api/chat",
                    "description": "Send a list of messages to the AI model and receive a generated response.",
                    "request_format": {
                        "messages": [
                            { "role": "system | user | assistant", "content": "string" }
                        ]
                    },
                    "response_format": { "response": "AI generated string response" }
                },
                {
                    "method": "GET",
                    "url": "/api/health",
                    "description": "Check if the API server is running properly.",
                    "response_format": { "status": "ok" }
                }
            ],
            "role_api": [
                {
                    "method": "POST",
                    "url": "/roles/add-role",
                    "description": "Adds new role to the database.",
                    "request_format": role_format,
                    "response_format": stored_format.clone()
                },
                {
                    "method": "GET",
                    "url": "/roles/get-roles",
                    "description": "Lists every role stored in the database.",
                    "response_format": [stored_format]
                }
            ]
        },
        "docs": {
            "swagger_ui": "/docs",
            "redoc": "/redoc",
            "openapi": "/openapi.json"
        }
    })
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "chat",
    responses((status = 200, description = "The server is running"))
)]
async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[utoipa::path(
    post,
    path = "/api/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Text of the first completion", body = ChatResponse),
        (status = 500, description = "The completion request failed")
    )
)]
async fn chat_handler(
    State(state): State<AppState>,
    Json(body): Json<Value>
) -> Result<Json<ChatResponse>, GatewayError> {
    let request = ChatRequest::from_body(&body).unwrap_or_else(|e| {
        state.logger.warn(format_args!("Chat request messages could not be read: {}", e));
        ChatRequest::default()
    });
    if request.messages.is_empty() {
        state.logger.warn("Chat request carried no readable messages; forwarding an empty conversation");
    }
    let response = state.chat.generate_response(&request.messages).await?;
    Ok(Json(ChatResponse { response }))
}

#[utoipa::path(
    post,
    path = "/roles/add-role",
    tag = "roles",
    request_body = Role,
    responses(
        (status = 200, description = "The stored role with its `_id`, or null for an empty payload", body = Role),
        (status = 500, description = "The role store failed")
    )
)]
async fn add_role_handler(
    RoleSession(store): RoleSession,
    Json(role): Json<Option<RoleDocument>>
) -> Result<Json<Option<RoleDocument>>, GatewayError> {
    let saved = store.add_role(role.unwrap_or_default()).await?;
    Ok(Json(saved))
}

#[utoipa::path(
    get,
    path = "/roles/get-roles",
    tag = "roles",
    responses(
        (status = 200, description = "Every stored role with its `_id`", body = [Role]),
        (status = 500, description = "The role store failed")
    )
)]
async fn get_roles_handler(RoleSession(store): RoleSession) -> Result<Json<Vec<RoleDocument>>, GatewayError> {
    let roles = store.get_roles().await?;
    Ok(Json(roles))
}

use utoipa::OpenApi;

use crate::models::chat::{ ChatRequest, ChatResponse, Message, MessageRole };
use crate::models::role::Role;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Custom ChatGPT",
        description = "Role-based Chat assistant (GroqCloud integration)",
        version = "1.0.0"
    ),
    paths(
        super::api::root_handler,
        super::api::health_handler,
        super::api::chat_handler,
        super::api::add_role_handler,
        super::api::get_roles_handler,
    ),
    components(schemas(ChatRequest, ChatResponse, Message, MessageRole, Role)),
    tags(
        (name = "chat", description = "Completion forwarding"),
        (name = "roles", description = "Persona presets")
    )
)]
pub struct ApiDoc;

// Both pages load their viewer from a CDN and render /openapi.json.
pub const SWAGGER_UI_PAGE: &str =
    r##"<!DOCTYPE html>
<html>
<head>
<title>Custom ChatGPT - Swagger UI</title>
<meta charset="utf-8">
<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
<div id="swagger-ui"></div>
<script src="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
<script>
SwaggerUIBundle({ url: "/openapi.json", dom_id: "#swagger-ui" });
</script>
</body>
</html>
"##;

pub const REDOC_PAGE: &str =
    r#"<!DOCTYPE html>
<html>
<head>
<title>Custom ChatGPT - ReDoc</title>
<meta charset="utf-8">
</head>
<body>
<redoc spec-url="/openapi.json"></redoc>
<script src="https://cdn.jsdelivr.net/npm/redoc@2/bundles/redoc.standalone.js"></script>
</body>
</html>
"#;

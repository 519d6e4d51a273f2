use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Lofi Lounge Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::ws::ClientMessage,
            crate::dto::ws::ServerEvent,
            crate::dto::ws::PlaybackState,
            crate::dto::ws::SeekTo,
            crate::dto::ws::TrackEnded,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "rooms", description = "WebSocket operations for room members"),
    )
)]
pub struct ApiDoc;

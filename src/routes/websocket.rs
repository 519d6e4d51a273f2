use axum::{
    Router,
    extract::{Query, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use validator::Validate;

use crate::{
    dto::ws::ConnectParams, error::AppError, services::websocket_service, state::SharedState,
};

#[utoipa::path(
    get,
    path = "/ws",
    params(
        ("username" = String, Query, description = "Participant id joining the room"),
        ("roomId" = String, Query, description = "Room the connection belongs to"),
    ),
    responses(
        (status = 101, description = "Switching protocols to WebSocket"),
        (status = 400, description = "Missing or malformed identity"),
    )
)]
/// Upgrade the HTTP connection into a room WebSocket session.
///
/// Identity is validated before the upgrade so a refused connection fails
/// with a regular HTTP error instead of an immediate socket close.
pub async fn ws_handler(
    State(state): State<SharedState>,
    Query(params): Query<ConnectParams>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    params.validate()?;

    let ConnectParams { username, room_id } = params;
    let shared_state = state.clone();
    Ok(ws.on_upgrade(move |socket| {
        websocket_service::handle_socket(shared_state, socket, room_id, username)
    }))
}

/// Configure the WebSocket endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/ws", get(ws_handler))
}

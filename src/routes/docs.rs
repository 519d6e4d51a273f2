use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

/// Path under which the interactive API browser is mounted.
const DOCS_PATH: &str = "/docs";
/// Path serving the raw OpenAPI JSON document.
const OPENAPI_PATH: &str = "/api-doc/openapi.json";

/// Mount the interactive API browser and the OpenAPI document it renders.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::from(SwaggerUi::new(DOCS_PATH).url(OPENAPI_PATH, ApiDoc::openapi())).with_state(state)
}

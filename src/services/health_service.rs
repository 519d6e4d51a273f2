use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with a static health payload while logging directory issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    if state.is_degraded().await {
        warn!("room directory unavailable (degraded mode)");
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{config::AppConfig, directory::MemoryDirectory, state::AppState};

    #[tokio::test]
    async fn reports_degraded_until_a_directory_is_installed() {
        let state = AppState::new(AppConfig::default());
        assert_eq!(health_status(&state).await, HealthResponse::degraded());

        state
            .install_directory(Arc::new(MemoryDirectory::new()))
            .await;
        assert_eq!(health_status(&state).await, HealthResponse::ok());
    }
}

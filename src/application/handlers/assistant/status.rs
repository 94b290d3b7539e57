//! StatusHandler - generation backend health passthrough.

use std::sync::Arc;
use tracing::warn;

use crate::ports::{BackendHealth, TextGenerator};

pub struct StatusHandler {
    generator: Arc<dyn TextGenerator>,
}

impl StatusHandler {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn handle(&self) -> BackendHealth {
        let health = self.generator.health_check().await;
        if !health.ok {
            warn!(base_url = %health.base_url, model = %health.model, "Generation backend unreachable");
        }
        health
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::generation::MockTextGenerator;

    #[tokio::test]
    async fn reports_backend_health() {
        let healthy = StatusHandler::new(Arc::new(MockTextGenerator::new()));
        assert!(healthy.handle().await.ok);

        let down = StatusHandler::new(Arc::new(MockTextGenerator::new().unhealthy()));
        let health = down.handle().await;
        assert!(!health.ok);
        assert_eq!(health.model, "mock-model");
    }

    #[tokio::test]
    async fn health_check_never_generates() {
        let generator = MockTextGenerator::new();
        StatusHandler::new(Arc::new(generator.clone())).handle().await;
        assert_eq!(generator.call_count(), 0);
    }
}

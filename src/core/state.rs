use std::sync::Arc;

use sqlx::PgPool;

use crate::core::{config::Settings, redis::RedisHandle};
use crate::services::gemini::TaskGenerator;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    redis: RedisHandle,
    generator: Arc<dyn TaskGenerator>,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        db: PgPool,
        redis: RedisHandle,
        generator: Arc<dyn TaskGenerator>,
    ) -> Self {
        Self { inner: Arc::new(InnerState { settings, db, redis, generator }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn redis(&self) -> &RedisHandle {
        &self.inner.redis
    }

    /// LLM backend used by the task generation pipeline.
    pub(crate) fn generator(&self) -> &dyn TaskGenerator {
        self.inner.generator.as_ref()
    }
}

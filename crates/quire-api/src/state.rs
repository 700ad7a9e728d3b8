//! Application context passed to every handler.

use std::sync::Arc;

use quire_db::Database;
use quire_render::MarkdownRenderer;

use crate::config::AppConfig;

/// Constructed once at startup; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub renderer: Arc<MarkdownRenderer>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig) -> Self {
        let renderer = MarkdownRenderer::new(config.render.clone());
        Self {
            db,
            renderer: Arc::new(renderer),
            config: Arc::new(config),
        }
    }
}

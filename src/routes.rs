use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::ApiError;
use crate::forms;
use crate::guard::FormGuard;
use crate::mailer::{HttpMailer, Mailer};
use crate::parts;
use crate::shapes::ShapeRegistry;

/// Shared, read-only application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<Catalog>,
    pub shapes: Arc<ShapeRegistry>,
    pub guard: Arc<FormGuard>,
    mailer: Option<Arc<dyn Mailer>>,
}

impl AppState {
    /// Builds the HTTP mailer only when an API key is configured.
    pub fn new(config: Config, catalog: Catalog) -> Result<Self, ApiError> {
        let guard = FormGuard::new().map_err(ApiError::Internal)?;
        let shapes = ShapeRegistry::standard();
        for template in catalog.templates.iter().filter(|t| !shapes.contains(&t.id)) {
            tracing::warn!(template = %template.id, "no geometry recipe; falls back to rectangle");
        }
        let mailer = config
            .email_api_key
            .as_ref()
            .map(|key| Arc::new(HttpMailer::new(&config.email_api_url, key)) as Arc<dyn Mailer>);
        Ok(Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            shapes: Arc::new(shapes),
            guard: Arc::new(guard),
            mailer,
        })
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn without_mailer(mut self) -> Self {
        self.mailer = None;
        self
    }

    pub fn mailer(&self) -> Result<Arc<dyn Mailer>, ApiError> {
        self.mailer.clone().ok_or(ApiError::NotConfigured)
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let static_files = ServeDir::new(&state.config.static_dir);
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(|| async { "OK" }))
        // Configurator
        .route("/api/catalog", get(parts::get_catalog))
        .route("/api/parts/price", post(parts::price))
        .route("/api/parts/dxf", post(parts::dxf))
        .route("/api/parts/spec-sheet", post(parts::spec_sheet))
        // Forms
        .route("/api/quote", post(forms::submit_quote))
        .route("/api/careers/apply", post(forms::submit_application))
        .route("/api/capability-sheet", post(forms::request_capability_sheet))
        // Marketing pages
        .fallback_service(static_files)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

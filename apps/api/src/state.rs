use std::sync::Arc;

use crate::config::Config;
use crate::render::logo::LogoAsset;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// `config.layout` is validated at startup and read-only afterwards.
    pub config: Config,
    /// Decoded `LOGO_PATH`, if it loaded. Requests may upload their own instead.
    pub default_logo: Option<Arc<LogoAsset>>,
}

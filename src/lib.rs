pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;

use std::sync::Arc;

use crate::app::geo::GeoLocator;
use crate::app::tokens::TokenSource;
use crate::infra::store::PostStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PostStore>,
    pub tokens: Arc<dyn TokenSource>,
    pub geo: Arc<dyn GeoLocator>,
}

use std::sync::Arc;

use stages::Resolver;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
}

impl AppState {
    pub fn new(resolver: Arc<Resolver>) -> Self {
        Self { resolver }
    }
}

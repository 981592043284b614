pub mod accounts;
pub mod portfolio;
pub mod trading;

use crate::db::DatabasePool;
use crate::quotes::QuoteSource;
use std::sync::Arc;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: DatabasePool,
    pub quotes: Arc<dyn QuoteSource>,
}

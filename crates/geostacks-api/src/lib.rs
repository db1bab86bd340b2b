//! geostacks-api — REST API for GeoStacks.
//!
//! Provides axum route handlers mapping HTTP verbs to stack lifecycle
//! calls against the automation engine.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/site` | Provision a site for a username |
//! | GET | `/site` | List all sites |
//! | GET | `/site/{username}` | Get a site's URL |
//! | DELETE | `/site/{username}` | Tear down a site |
//! | GET | `/healthz` | Liveness check |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use geostacks_core::Settings;
use geostacks_engine::StackEngine;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<dyn StackEngine>,
    pub settings: Arc<Settings>,
}

/// Build the complete API router.
pub fn build_router(engine: Arc<dyn StackEngine>, settings: Settings) -> Router {
    let state = ApiState {
        engine,
        settings: Arc::new(settings),
    };

    Router::new()
        .route("/site", get(handlers::list_sites).post(handlers::create_site))
        .route(
            "/site/{username}",
            get(handlers::get_site).delete(handlers::delete_site),
        )
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
}

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    create_link_handler, delete_link_handler, get_link_handler, health_handler, redirect_handler,
};
use crate::middleware::{admit, require_api_key};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        let api = Router::new()
            .route("/shorten", post(create_link_handler))
            .route(
                "/links/{short_code}",
                get(get_link_handler).delete(delete_link_handler),
            )
            .route_layer(from_fn_with_state(state.clone(), require_api_key));

        let redirect = Router::new()
            .route("/{short_code}", get(redirect_handler))
            .route_layer(from_fn_with_state(state.clone(), admit));

        Router::new()
            .route("/health", get(health_handler))
            .nest("/api/v1", api)
            .merge(redirect)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

use axum::routing::{get, post, MethodRouter};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::database::StatisticStore;

mod error;
mod state;

pub mod pagination;
pub mod posts_statistics;

pub use error::*;
pub use state::*;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

const COLLECTION: &str = "/posts_statistics";

/// Routes of the `posts_statistics` collection, each reachable with or without a trailing slash.
pub fn create_router<S: StatisticStore>(app: App<S>) -> Router {
    let routes: [(&str, MethodRouter<App<S>>); 4] = [
        ("", post(posts_statistics::create::<S>)),
        (
            "/posts/:post_id/latest",
            get(posts_statistics::latest_by_post::<S>),
        ),
        (
            "/users/:user_id/latest",
            get(posts_statistics::latest_by_user::<S>),
        ),
        (
            "/users/:user_id/average",
            get(posts_statistics::average::<S>),
        ),
    ];

    routes
        .into_iter()
        .fold(Router::new(), |router, (path, handler)| {
            route_with_slash(router, &format!("{COLLECTION}{path}"), handler)
        })
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

fn route_with_slash<S: Clone + Send + Sync + 'static>(
    router: Router<S>, path: &str, handler: MethodRouter<S>,
) -> Router<S> {
    router
        .route(path, handler.clone())
        .route(&format!("{path}/"), handler)
}

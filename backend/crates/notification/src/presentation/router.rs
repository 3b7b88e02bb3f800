//! `/api/notifications`

use auth::domain::repository::UserRepository;
use auth::{AuthGuard, authenticate};
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, patch},
};

use crate::domain::repository::NotificationRepository;
use crate::presentation::handlers::{self, NotificationAppState};

pub fn notifications_router<N, U>(state: NotificationAppState<N>, guard: AuthGuard<U>) -> Router
where
    N: NotificationRepository + Clone + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(handlers::list::<N>))
        .route("/read-all", patch(handlers::mark_all_read::<N>))
        .route("/{id}", axum::routing::delete(handlers::delete::<N>))
        .route("/{id}/read", patch(handlers::mark_read::<N>))
        .route_layer(from_fn_with_state(guard, authenticate::<U>))
        .with_state(state)
}

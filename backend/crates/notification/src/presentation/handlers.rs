//! HTTP Handlers

use std::sync::Arc;

use auth::CurrentUser;
use axum::extract::State;
use kernel::AppResult;
use kernel::extract::{AppPath, AppQuery};
use kernel::id::NotificationId;
use kernel::response::ApiResponse;

use crate::application::{DeleteNotificationUseCase, ListNotificationsUseCase, MarkReadUseCase};
use crate::domain::repository::NotificationRepository;
use crate::presentation::dto::{InboxResponse, MarkAllReadResponse, NotificationListQuery};

#[derive(Clone)]
pub struct NotificationAppState<N>
where
    N: NotificationRepository + Clone + Send + Sync + 'static,
{
    pub store: Arc<N>,
}

impl<N> NotificationAppState<N>
where
    N: NotificationRepository + Clone + Send + Sync + 'static,
{
    pub fn new(store: N) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

/// GET /api/notifications
pub async fn list<N>(
    State(state): State<NotificationAppState<N>>,
    user: CurrentUser,
    AppQuery(query): AppQuery<NotificationListQuery>,
) -> AppResult<ApiResponse<InboxResponse>>
where
    N: NotificationRepository + Clone + Send + Sync + 'static,
{
    let page = query.page();
    let inbox = ListNotificationsUseCase::new(state.store.clone())
        .execute(&user.id, query.unread_only, page)
        .await?;
    Ok(ApiResponse::ok(InboxResponse::new(inbox, &page)))
}

/// PATCH /api/notifications/{id}/read
pub async fn mark_read<N>(
    State(state): State<NotificationAppState<N>>,
    user: CurrentUser,
    AppPath(id): AppPath<NotificationId>,
) -> AppResult<ApiResponse<()>>
where
    N: NotificationRepository + Clone + Send + Sync + 'static,
{
    MarkReadUseCase::new(state.store.clone())
        .execute(&user.id, &id)
        .await?;
    Ok(ApiResponse::message("Notification marked as read"))
}

/// PATCH /api/notifications/read-all
pub async fn mark_all_read<N>(
    State(state): State<NotificationAppState<N>>,
    user: CurrentUser,
) -> AppResult<ApiResponse<MarkAllReadResponse>>
where
    N: NotificationRepository + Clone + Send + Sync + 'static,
{
    let updated = MarkReadUseCase::new(state.store.clone())
        .execute_all(&user.id)
        .await?;
    Ok(ApiResponse::ok(MarkAllReadResponse { updated }))
}

/// DELETE /api/notifications/{id}
pub async fn delete<N>(
    State(state): State<NotificationAppState<N>>,
    user: CurrentUser,
    AppPath(id): AppPath<NotificationId>,
) -> AppResult<ApiResponse<()>>
where
    N: NotificationRepository + Clone + Send + Sync + 'static,
{
    DeleteNotificationUseCase::new(state.store.clone())
        .execute(&user.id, &id)
        .await?;
    Ok(ApiResponse::message("Notification deleted"))
}

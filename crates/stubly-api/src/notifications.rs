use axum::{
    Json,
    extract::{Query, State},
};
use serde_json::{Value, json};
use tracing::{debug, warn};
use uuid::Uuid;

use stubly_db::models::NotificationRow;
use stubly_db::queries::NotificationKind;
use stubly_types::api::{MarkReadRequest, NotificationQuery, NotificationsResponse};
use stubly_types::models::Notification;

use crate::auth::AppState;
use crate::error::{ApiError, blocking};

/// POST /notifications?email= — unread notifications, newest first.
pub async fn unread_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<NotificationsResponse>, ApiError> {
    list(state, NotificationKind::User, query.email, true).await
}

/// POST /notifications2?email= — the full history, read or not.
pub async fn all_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<NotificationsResponse>, ApiError> {
    list(state, NotificationKind::User, query.email, false).await
}

pub async fn unread_manager_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<NotificationsResponse>, ApiError> {
    list(state, NotificationKind::Manager, query.email, true).await
}

pub async fn all_manager_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<NotificationsResponse>, ApiError> {
    list(state, NotificationKind::Manager, query.email, false).await
}

/// PUT /notifications/read — bulk mark-read. Ids that do not exist are
/// silently skipped; the response does not say how many rows changed.
pub async fn mark_read(
    State(state): State<AppState>,
    Json(req): Json<MarkReadRequest>,
) -> Result<Json<Value>, ApiError> {
    mark(state, NotificationKind::User, req.ids).await
}

pub async fn mark_manager_read(
    State(state): State<AppState>,
    Json(req): Json<MarkReadRequest>,
) -> Result<Json<Value>, ApiError> {
    mark(state, NotificationKind::Manager, req.ids).await
}

async fn list(
    state: AppState,
    kind: NotificationKind,
    email: String,
    unread_only: bool,
) -> Result<Json<NotificationsResponse>, ApiError> {
    let rows = blocking(move || {
        if unread_only {
            state.db.unread_notifications(kind, &email)
        } else {
            state.db.all_notifications(kind, &email)
        }
    })
    .await?;

    Ok(Json(NotificationsResponse {
        notifications: rows.iter().map(notification_model).collect(),
    }))
}

async fn mark(
    state: AppState,
    kind: NotificationKind,
    ids: Vec<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();

    let updated = blocking(move || state.db.mark_notifications_read(kind, &ids)).await?;
    debug!("Marked {} notifications read", updated);

    Ok(Json(json!({ "message": "Notifications marked as read" })))
}

fn notification_model(row: &NotificationRow) -> Notification {
    Notification {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt notification id '{}': {}", row.id, e);
            Uuid::default()
        }),
        user_email: row.user_email.clone(),
        title: row.title.clone(),
        message: row.message.clone(),
        read: row.read,
        created_at: row.created_at.clone(),
        updated_at: row.updated_at.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_support;

    fn seeded_state() -> AppState {
        let state = test_support::test_state();
        for (kind, title) in [
            (NotificationKind::User, "Account Sign In"),
            (NotificationKind::Manager, "Manager Account Sign In"),
        ] {
            state
                .db
                .insert_notification(
                    kind,
                    &Uuid::new_v4().to_string(),
                    "ada@example.com",
                    title,
                    "Welcome back Ada",
                )
                .unwrap();
        }
        state
    }

    #[tokio::test]
    async fn the_two_tables_never_bleed_into_each_other() {
        let state = seeded_state();

        let user = unread_notifications(
            State(state.clone()),
            Query(NotificationQuery { email: "ada@example.com".to_string() }),
        )
        .await
        .unwrap();
        assert_eq!(user.0.notifications.len(), 1);
        assert_eq!(user.0.notifications[0].title, "Account Sign In");

        let manager = unread_manager_notifications(
            State(state),
            Query(NotificationQuery { email: "ada@example.com".to_string() }),
        )
        .await
        .unwrap();
        assert_eq!(manager.0.notifications.len(), 1);
        assert_eq!(manager.0.notifications[0].title, "Manager Account Sign In");
    }

    #[tokio::test]
    async fn marking_read_empties_the_unread_view_but_not_the_history() {
        let state = seeded_state();
        let email = || Query(NotificationQuery { email: "ada@example.com".to_string() });

        let unread = unread_notifications(State(state.clone()), email()).await.unwrap();
        let ids: Vec<Uuid> = unread.0.notifications.iter().map(|n| n.id).collect();

        mark_read(State(state.clone()), Json(MarkReadRequest { ids })).await.unwrap();

        let after = unread_notifications(State(state.clone()), email()).await.unwrap();
        assert!(after.0.notifications.is_empty());

        let history = all_notifications(State(state), email()).await.unwrap();
        assert_eq!(history.0.notifications.len(), 1);
        assert!(history.0.notifications[0].read);
    }

    #[tokio::test]
    async fn an_unknown_email_gets_an_empty_list_not_an_error() {
        let state = seeded_state();

        let res = all_notifications(
            State(state),
            Query(NotificationQuery { email: "nobody@example.com".to_string() }),
        )
        .await
        .unwrap();

        assert!(res.0.notifications.is_empty());
    }
}

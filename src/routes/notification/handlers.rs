use actix_web::web;
use sqlx::PgPool;
use utoipa::TupleUnit;
use uuid::Uuid;

use super::schemas::{NotificationListQuery, ReadAllResult, UnreadCount, UserNotification};
use super::utils::{count_unread, list_notifications, mark_all_read, mark_read};
use crate::errors::GenericError;
use crate::routes::user::schemas::UserAccount;
use crate::schemas::{GenericResponse, PaginatedList};

#[utoipa::path(
    get,
    path = "/notification",
    tag = "Notification",
    params(NotificationListQuery),
    responses(
        (status=200, description= "Notifications of the current user", body= GenericResponse<PaginatedList<UserNotification>>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "List Notification API", skip(pool, user), fields(user_id = %user.id))]
pub async fn list_notification_req(
    query: web::Query<NotificationListQuery>,
    pool: web::Data<PgPool>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<PaginatedList<UserNotification>>>, GenericError> {
    let notifications = list_notifications(&pool, user.id, &query).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched notifications",
        Some(notifications),
    )))
}

#[utoipa::path(
    get,
    path = "/notification/unread-count",
    tag = "Notification",
    responses(
        (status=200, description= "Unread notification count", body= GenericResponse<UnreadCount>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "Unread Notification Count API", skip(pool, user), fields(user_id = %user.id))]
pub async fn unread_count_req(
    pool: web::Data<PgPool>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<UnreadCount>>, GenericError> {
    let unread = count_unread(&pool, user.id).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched unread count",
        Some(UnreadCount { unread }),
    )))
}

#[utoipa::path(
    patch,
    path = "/notification/{id}/read",
    tag = "Notification",
    params(("id" = Uuid, Path, description = "User notification id")),
    responses(
        (status=200, description= "Notification marked as read", body= GenericResponse<TupleUnit>),
        (status=404, description= "Notification not found", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Read Notification API", skip(pool, user), fields(user_id = %user.id))]
pub async fn mark_read_req(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<()>>, GenericError> {
    mark_read(&pool, user.id, path.into_inner()).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully marked notification as read",
        None,
    )))
}

#[utoipa::path(
    patch,
    path = "/notification/read-all",
    tag = "Notification",
    responses(
        (status=200, description= "All notifications marked as read", body= GenericResponse<ReadAllResult>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "Read All Notification API", skip(pool, user), fields(user_id = %user.id))]
pub async fn mark_all_read_req(
    pool: web::Data<PgPool>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<ReadAllResult>>, GenericError> {
    let updated = mark_all_read(&pool, user.id).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully marked all notifications as read",
        Some(ReadAllResult { updated }),
    )))
}

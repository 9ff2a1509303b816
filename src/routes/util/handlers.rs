use actix_web::{web, HttpResponse, Responder};
use sqlx::PgPool;
use utoipa::TupleUnit;

use crate::errors::GenericError;
use crate::schemas::GenericResponse;

#[utoipa::path(
    get,
    path = "/util/health_check",
    tag = "Util",
    responses(
        (status=200, description= "Server is running", body= String),
    )
)]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("Running Server")
}

#[utoipa::path(
    get,
    path = "/util/readiness",
    tag = "Util",
    responses(
        (status=200, description= "Database is reachable", body= GenericResponse<TupleUnit>),
        (status=500, description= "Database is unreachable", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(err, name = "Readiness API", skip(pool))]
pub async fn readiness(pool: web::Data<PgPool>) -> Result<web::Json<GenericResponse<()>>, GenericError> {
    sqlx::query("SELECT 1")
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            GenericError::DatabaseError("Database is unreachable".to_string(), e.into())
        })?;
    Ok(web::Json(GenericResponse::success("Ready", None)))
}

use actix_web::web;
use utoipa::TupleUnit;

use crate::administrative::{AdministrativeDirectory, AdministrativeUnit};
use crate::errors::GenericError;
use crate::schemas::GenericResponse;

#[utoipa::path(
    get,
    path = "/administrative/provinces",
    tag = "Administrative",
    responses(
        (status=200, description= "All provinces", body= GenericResponse<Vec<AdministrativeUnit>>),
    )
)]
#[tracing::instrument(name = "List Provinces API", skip(directory))]
pub async fn list_provinces(
    directory: web::Data<AdministrativeDirectory>,
) -> Result<web::Json<GenericResponse<Vec<AdministrativeUnit>>>, GenericError> {
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched provinces",
        Some(directory.provinces()),
    )))
}

#[utoipa::path(
    get,
    path = "/administrative/provinces/{code}/districts",
    tag = "Administrative",
    params(("code" = String, Path, description = "Province code")),
    responses(
        (status=200, description= "Districts of the province", body= GenericResponse<Vec<AdministrativeUnit>>),
        (status=404, description= "Unknown province", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(name = "List Districts API", skip(directory))]
pub async fn list_districts(
    path: web::Path<String>,
    directory: web::Data<AdministrativeDirectory>,
) -> Result<web::Json<GenericResponse<Vec<AdministrativeUnit>>>, GenericError> {
    let districts = directory
        .districts(&path)
        .ok_or_else(|| GenericError::DataNotFound("Province not found".to_string()))?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched districts",
        Some(districts),
    )))
}

#[utoipa::path(
    get,
    path = "/administrative/provinces/{pcode}/districts/{dcode}/wards",
    tag = "Administrative",
    params(
        ("pcode" = String, Path, description = "Province code"),
        ("dcode" = String, Path, description = "District code"),
    ),
    responses(
        (status=200, description= "Wards of the district", body= GenericResponse<Vec<AdministrativeUnit>>),
        (status=404, description= "Unknown province or district", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(name = "List Wards API", skip(directory))]
pub async fn list_wards(
    path: web::Path<(String, String)>,
    directory: web::Data<AdministrativeDirectory>,
) -> Result<web::Json<GenericResponse<Vec<AdministrativeUnit>>>, GenericError> {
    let (province_code, district_code) = path.into_inner();
    let wards = directory
        .wards(&province_code, &district_code)
        .ok_or_else(|| GenericError::DataNotFound("District not found".to_string()))?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched wards",
        Some(wards),
    )))
}

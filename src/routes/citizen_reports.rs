use actix_web::{web, HttpResponse, Result as ActixResult};
use validator::Validate;

use crate::errors::AppError;
use crate::models::{CSiteProbeResponse, NearbyCitizenReportsRequest, NearbyCitizenReportsResponse, TopicFilter};
use crate::proximity::Coordinate;
use crate::response::ApiResponse;
use crate::services::CSiteClient;
use crate::validation::validation_failed;

/// Default reference point for the unfiltered listing (Bangkok).
const BANGKOK: (f64, f64) = (13.7563, 100.5018);

fn bangkok() -> Result<Coordinate, AppError> {
    Coordinate::new(BANGKOK.0, BANGKOK.1)
        .ok_or_else(|| AppError::Validation("invalid default reference".to_string()))
}

#[utoipa::path(
    get,
    path = "/citizen-reports",
    tag = "Citizen Reports",
    responses(
        (status = 200, description = "C-Site reports near Bangkok"),
        (status = 502, description = "C-Site unavailable")
    )
)]
pub(crate) async fn list_citizen_reports(
    csite: web::Data<CSiteClient>,
) -> ActixResult<HttpResponse> {
    let reports = csite.nearby(bangkok()?, &TopicFilter::default()).await?;
    Ok(ApiResponse::list(reports))
}

#[utoipa::path(
    get,
    path = "/citizen-reports/all",
    tag = "Citizen Reports",
    params(TopicFilter),
    responses(
        (status = 200, description = "Every keyword-matching C-Site report, unfiltered by location"),
        (status = 400, description = "Invalid filter"),
        (status = 502, description = "C-Site unavailable")
    )
)]
pub(crate) async fn all_citizen_reports(
    csite: web::Data<CSiteClient>,
    query: web::Query<TopicFilter>,
) -> ActixResult<HttpResponse> {
    query.validate().map_err(validation_failed)?;
    let reports = csite.all(&query).await?;
    Ok(ApiResponse::list(reports))
}

#[utoipa::path(
    get,
    path = "/citizen-reports/test",
    tag = "Citizen Reports",
    responses(
        (status = 200, description = "C-Site reachable", body = CSiteProbeResponse),
        (status = 502, description = "C-Site unavailable")
    )
)]
pub(crate) async fn probe_csite(csite: web::Data<CSiteClient>) -> ActixResult<HttpResponse> {
    let mut reports = csite.nearby(bangkok()?, &TopicFilter::default()).await?;
    let reports_count = reports.len();
    reports.truncate(2);
    log::info!("C-Site probe succeeded with {reports_count} reports");

    Ok(HttpResponse::Ok().json(CSiteProbeResponse {
        success: true,
        message: "C-Site API connection test successful",
        reports_count,
        sample_reports: reports,
    }))
}

#[utoipa::path(
    post,
    path = "/citizen-reports/nearby",
    tag = "Citizen Reports",
    request_body = NearbyCitizenReportsRequest,
    responses(
        (status = 200, description = "C-Site reports near the point or mine", body = NearbyCitizenReportsResponse),
        (status = 400, description = "No usable coordinate or invalid filter"),
        (status = 502, description = "C-Site unavailable")
    )
)]
pub(crate) async fn nearby_citizen_reports(
    csite: web::Data<CSiteClient>,
    body: web::Json<NearbyCitizenReportsRequest>,
) -> ActixResult<HttpResponse> {
    body.validate().map_err(validation_failed)?;
    let center = body.reference().ok_or_else(|| {
        AppError::Validation("Valid coordinates (lat, lng) or mine feature is required".to_string())
    })?;

    let reports = csite.nearby(center, &body.filter()).await?;
    log::info!("Found {} citizen reports near {center}", reports.len());

    Ok(HttpResponse::Ok().json(NearbyCitizenReportsResponse {
        success: true,
        count: reports.len(),
        data: reports,
        mine_location: center,
    }))
}

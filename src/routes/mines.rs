use actix_web::{web, HttpResponse, Result as ActixResult};
use validator::Validate;

use crate::models::{MinesNearbyQuery, NearbyMinesPayload};
use crate::response::ApiResponse;
use crate::services::MineCatalog;
use crate::validation::{coordinate, validation_failed};

#[utoipa::path(
    get,
    path = "/mines/nearby",
    tag = "Mines",
    params(MinesNearbyQuery),
    responses(
        (status = 200, description = "Mines within the radius, nearest first", body = NearbyMinesPayload),
        (status = 400, description = "Invalid coordinate or radius")
    )
)]
pub(crate) async fn nearby_mines(
    catalog: web::Data<MineCatalog>,
    query: web::Query<MinesNearbyQuery>,
) -> ActixResult<HttpResponse> {
    query.validate().map_err(validation_failed)?;

    let center = coordinate(query.lat, query.lng)?;
    let mines = catalog.nearby(center, query.radius);

    Ok(ApiResponse::ok(NearbyMinesPayload {
        mines,
        search_center: center,
        radius: query.radius,
    }))
}

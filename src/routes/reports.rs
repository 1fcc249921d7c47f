use actix_web::{web, HttpResponse, Result as ActixResult};
use chrono::Utc;
use deadpool_postgres::Pool;
use validator::Validate;

use crate::errors::AppError;
use crate::models::{
    case_title, default_title, Action, ActionStatus, AddActionRequest, AssignResponseRequest,
    CaseReportListPayload, CaseReportRequest, CreateReportRequest, CreatedReport, CreatedReportPayload,
    ImpactType, NearbyReportsPayload, NearbyReportsQuery, PageQuery, Pagination, ReportDetailPayload,
    ReportListPayload, ReportListQuery, UpdateActionRequest, UpdateStatusRequest,
};
use crate::repositories::{NewReport, ReportFilter, ReportRepository, ResponseActionRepository};
use crate::response::ApiResponse;
use crate::validation::{case_id, coordinate, parse_degrees, validation_failed};

const SYSTEM_ACTOR: &str = "ระบบ";
const ANONYMOUS: &str = "ไม่ระบุชื่อ";

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn system_action(text: String) -> Action {
    Action {
        id: 0,
        date: Utc::now(),
        actor: SYSTEM_ACTOR.to_string(),
        action: text,
        status: ActionStatus::Completed,
        notes: None,
        attachments: Vec::new(),
    }
}

#[utoipa::path(
    get,
    path = "/reports",
    tag = "Reports",
    params(ReportListQuery),
    responses(
        (status = 200, description = "Paginated reports, newest first", body = ReportListPayload),
        (status = 400, description = "Invalid filters")
    )
)]
pub(crate) async fn list_reports(
    pool: web::Data<Pool>,
    query: web::Query<ReportListQuery>,
) -> ActixResult<HttpResponse> {
    query.validate().map_err(validation_failed)?;

    let filter = ReportFilter {
        status: query.status,
        impact_type: query.impact_type,
        response_status: query.response_status,
    };
    let client = pool.get().await.map_err(AppError::from)?;
    let (reports, total) =
        ReportRepository::list(&client, &filter, query.page, query.limit).await?;

    Ok(ApiResponse::ok(ReportListPayload {
        reports,
        pagination: Pagination::new(query.page, query.limit, total),
    }))
}

#[utoipa::path(
    get,
    path = "/reports/{id}",
    tag = "Reports",
    params(("id" = i64, Path, description = "Report id")),
    responses(
        (status = 200, description = "Report with its response actions", body = ReportDetailPayload),
        (status = 404, description = "Report not found")
    )
)]
pub(crate) async fn get_report(
    pool: web::Data<Pool>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    let client = pool.get().await.map_err(AppError::from)?;
    let report = ReportRepository::view(&client, id).await?;
    let response_actions = ResponseActionRepository::find_by_report(&client, id).await?;

    Ok(ApiResponse::ok(ReportDetailPayload {
        report,
        response_actions,
    }))
}

#[utoipa::path(
    post,
    path = "/reports",
    tag = "Reports",
    request_body = CreateReportRequest,
    responses(
        (status = 201, description = "Report stored", body = CreatedReportPayload),
        (status = 400, description = "Invalid report")
    )
)]
pub(crate) async fn create_report(
    pool: web::Data<Pool>,
    body: web::Json<CreateReportRequest>,
) -> ActixResult<HttpResponse> {
    body.validate().map_err(validation_failed)?;
    let req = body.into_inner();

    let position = coordinate(req.position.lat, req.position.lng)?;
    let title = non_empty(req.title).unwrap_or_else(|| default_title(position));
    let mut impact_types: Vec<ImpactType> = Vec::with_capacity(req.impact_types.len());
    for t in req.impact_types {
        if !impact_types.contains(&t) {
            impact_types.push(t);
        }
    }

    let report = NewReport {
        case_id: None,
        title,
        location: Some(position),
        impact_types,
        description: req.details.trim().to_string(),
        reporter_name: non_empty(req.name),
        reporter_contact: non_empty(req.contact).unwrap_or_default(),
        evidence: req.evidence,
    };

    let mut client = pool.get().await.map_err(AppError::from)?;
    let created = ReportRepository::create(
        &mut client,
        report,
        system_action("รับรายงานและเริ่มตรวจสอบข้อมูล".to_string()),
    )
    .await?;

    Ok(ApiResponse::created(
        "รายงานถูกส่งเรียบร้อยแล้ว",
        CreatedReportPayload {
            report: CreatedReport::from(&created),
        },
    ))
}

#[utoipa::path(
    get,
    path = "/reports/nearby/{lat}/{lng}",
    tag = "Reports",
    params(
        ("lat" = f64, Path, description = "Latitude of the search center"),
        ("lng" = f64, Path, description = "Longitude of the search center"),
        NearbyReportsQuery
    ),
    responses(
        (status = 200, description = "Reports within the radius, nearest first", body = NearbyReportsPayload),
        (status = 400, description = "Invalid coordinate or radius")
    )
)]
pub(crate) async fn nearby_reports(
    pool: web::Data<Pool>,
    path: web::Path<(String, String)>,
    query: web::Query<NearbyReportsQuery>,
) -> ActixResult<HttpResponse> {
    query.validate().map_err(validation_failed)?;
    let (lat, lng) = path.into_inner();
    let center = coordinate(parse_degrees(&lat, "lat")?, parse_degrees(&lng, "lng")?)?;

    let client = pool.get().await.map_err(AppError::from)?;
    let reports = ReportRepository::find_within(&client, center, query.radius).await?;

    Ok(ApiResponse::ok(NearbyReportsPayload {
        reports,
        search_center: center,
        radius: query.radius,
    }))
}

#[utoipa::path(
    get,
    path = "/reports/{id}/actions",
    tag = "Reports",
    params(("id" = i64, Path, description = "Report id")),
    responses(
        (status = 200, description = "Response action log"),
        (status = 404, description = "No response actions for this report")
    )
)]
pub(crate) async fn get_actions(
    pool: web::Data<Pool>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    let client = pool.get().await.map_err(AppError::from)?;
    let record = ResponseActionRepository::find_by_report(&client, path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("ไม่พบการดำเนินการตอบสนอง".to_string()))?;

    Ok(ApiResponse::ok(record))
}

#[utoipa::path(
    post,
    path = "/reports/{id}/actions",
    tag = "Reports",
    params(("id" = i64, Path, description = "Report id")),
    request_body = AddActionRequest,
    responses(
        (status = 201, description = "Action appended"),
        (status = 400, description = "Invalid action"),
        (status = 404, description = "Report not found")
    )
)]
pub(crate) async fn add_action(
    pool: web::Data<Pool>,
    path: web::Path<i64>,
    body: web::Json<AddActionRequest>,
) -> ActixResult<HttpResponse> {
    body.validate().map_err(validation_failed)?;
    let req = body.into_inner();
    let action = Action {
        id: 0,
        date: req.date.unwrap_or_else(Utc::now),
        actor: req.actor.trim().to_string(),
        action: req.action.trim().to_string(),
        status: req.status,
        notes: non_empty(req.notes),
        attachments: req.attachments,
    };

    let client = pool.get().await.map_err(AppError::from)?;
    let report_id = path.into_inner();
    if !ReportRepository::exists(&client, report_id).await? {
        return Err(AppError::NotFound("ไม่พบรายงาน".to_string()).into());
    }
    let record = ResponseActionRepository::append(&client, report_id, &action).await?;

    Ok(ApiResponse::created("บันทึกการดำเนินการเรียบร้อยแล้ว", record))
}

#[utoipa::path(
    patch,
    path = "/reports/{id}/status",
    tag = "Reports",
    params(("id" = i64, Path, description = "Report id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated report"),
        (status = 400, description = "Nothing to update"),
        (status = 404, description = "Report not found")
    )
)]
pub(crate) async fn update_status(
    pool: web::Data<Pool>,
    path: web::Path<i64>,
    body: web::Json<UpdateStatusRequest>,
) -> ActixResult<HttpResponse> {
    body.validate().map_err(validation_failed)?;

    let client = pool.get().await.map_err(AppError::from)?;
    let report = ReportRepository::update_status(&client, path.into_inner(), &body).await?;

    Ok(ApiResponse::ok_with_message("อัปเดตสถานะเรียบร้อยแล้ว", report))
}

#[utoipa::path(
    patch,
    path = "/reports/{id}/actions/{action_id}",
    tag = "Reports",
    params(
        ("id" = i64, Path, description = "Report id"),
        ("action_id" = usize, Path, description = "1-based action id from the log")
    ),
    request_body = UpdateActionRequest,
    responses(
        (status = 200, description = "Updated action log"),
        (status = 400, description = "Invalid status or notes"),
        (status = 404, description = "Report or action not found")
    )
)]
pub(crate) async fn update_action(
    pool: web::Data<Pool>,
    path: web::Path<(i64, usize)>,
    body: web::Json<UpdateActionRequest>,
) -> ActixResult<HttpResponse> {
    body.validate().map_err(validation_failed)?;
    let (report_id, action_id) = path.into_inner();
    let req = body.into_inner();

    let mut client = pool.get().await.map_err(AppError::from)?;
    let record = ResponseActionRepository::update_action(
        &mut client,
        report_id,
        action_id,
        req.status,
        non_empty(req.notes),
    )
    .await?;

    Ok(ApiResponse::ok_with_message("อัปเดตการดำเนินการเรียบร้อยแล้ว", record))
}

#[utoipa::path(
    patch,
    path = "/reports/{id}/response",
    tag = "Reports",
    params(("id" = i64, Path, description = "Report id")),
    request_body = AssignResponseRequest,
    responses(
        (status = 200, description = "Updated assignment"),
        (status = 400, description = "Nothing to update or invalid budget"),
        (status = 404, description = "No response actions for this report")
    )
)]
pub(crate) async fn assign_response(
    pool: web::Data<Pool>,
    path: web::Path<i64>,
    body: web::Json<AssignResponseRequest>,
) -> ActixResult<HttpResponse> {
    body.validate().map_err(validation_failed)?;
    let mut req = body.into_inner();
    req.assigned_to = req.assigned_to.map(|a| a.trim().to_string());

    let client = pool.get().await.map_err(AppError::from)?;
    let record = ResponseActionRepository::assign(&client, path.into_inner(), &req).await?;

    Ok(ApiResponse::ok_with_message("อัปเดตผู้รับผิดชอบเรียบร้อยแล้ว", record))
}

#[utoipa::path(
    post,
    path = "/reports/case/{case_id}",
    tag = "Reports",
    params(("case_id" = String, Path, description = "Case identifier")),
    request_body = CaseReportRequest,
    responses(
        (status = 201, description = "Follow-up stored", body = CreatedReportPayload),
        (status = 400, description = "Invalid follow-up")
    )
)]
pub(crate) async fn create_case_report(
    pool: web::Data<Pool>,
    path: web::Path<String>,
    body: web::Json<CaseReportRequest>,
) -> ActixResult<HttpResponse> {
    body.validate().map_err(validation_failed)?;
    let case_id = case_id(path.into_inner())?;
    let req = body.into_inner();

    let report = NewReport {
        title: case_title(&case_id),
        location: None,
        impact_types: vec![ImpactType::AdditionalInfo],
        description: req.details.trim().to_string(),
        reporter_name: Some(non_empty(req.name).unwrap_or_else(|| ANONYMOUS.to_string())),
        reporter_contact: non_empty(req.contact).unwrap_or_default(),
        evidence: Vec::new(),
        case_id: Some(case_id.clone()),
    };

    let mut client = pool.get().await.map_err(AppError::from)?;
    let created = ReportRepository::create(
        &mut client,
        report,
        system_action(format!("รับข้อมูลเพิ่มเติมสำหรับกรณีศึกษา {case_id}")),
    )
    .await?;

    Ok(ApiResponse::created(
        "ส่งข้อมูลเพิ่มเติมเรียบร้อยแล้ว ทีมงานจะติดต่อกลับภายใน 2-3 วันทำการ",
        CreatedReportPayload {
            report: CreatedReport::from(&created),
        },
    ))
}

#[utoipa::path(
    get,
    path = "/reports/case/{case_id}",
    tag = "Reports",
    params(("case_id" = String, Path, description = "Case identifier"), PageQuery),
    responses((status = 200, description = "Follow-ups for the case", body = CaseReportListPayload))
)]
pub(crate) async fn list_case_reports(
    pool: web::Data<Pool>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> ActixResult<HttpResponse> {
    query.validate().map_err(validation_failed)?;
    let case_id = case_id(path.into_inner())?;

    let client = pool.get().await.map_err(AppError::from)?;
    let (reports, total) =
        ReportRepository::list_by_case(&client, &case_id, query.page, query.limit).await?;

    Ok(ApiResponse::ok(CaseReportListPayload {
        reports,
        case_id,
        pagination: Pagination::new(query.page, query.limit, total),
    }))
}

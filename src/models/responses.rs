use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::comment::Comment;
use super::report::{ImpactReport, ReportStatus, ResponseActionRecord};
use crate::proximity::{Coordinate, Nearby};
use crate::services::csite::CitizenReport;
use crate::services::mines::Mine;

#[derive(Serialize, ToSchema)]
pub struct HealthPayload {
    #[schema(value_type = String)]
    pub status: &'static str,
    #[schema(value_type = String)]
    pub service: &'static str,
    #[schema(value_type = String)]
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        Self {
            page,
            limit,
            total,
            pages: page_count(total, limit),
        }
    }
}

pub fn page_count(total: i64, limit: u32) -> i64 {
    let limit = i64::from(limit.max(1));
    (total + limit - 1) / limit
}

#[derive(Serialize, ToSchema)]
pub struct ReportListPayload {
    pub reports: Vec<ImpactReport>,
    pub pagination: Pagination,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaseReportListPayload {
    pub reports: Vec<ImpactReport>,
    pub case_id: String,
    pub pagination: Pagination,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportDetailPayload {
    pub report: ImpactReport,
    pub response_actions: Option<ResponseActionRecord>,
}

/// Summary returned right after a report is stored.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedReport {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinate>,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&ImpactReport> for CreatedReport {
    fn from(report: &ImpactReport) -> Self {
        Self {
            id: report.id,
            case_id: report.case_id.clone(),
            title: report.title.clone(),
            location: report.location,
            status: report.status,
            created_at: report.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CreatedReportPayload {
    pub report: CreatedReport,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NearbyReportsPayload {
    #[schema(value_type = Vec<Object>)]
    pub reports: Vec<Nearby<ImpactReport>>,
    pub search_center: Coordinate,
    pub radius: f64,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentPagination {
    pub current: u32,
    pub total: i64,
    pub count: usize,
    pub total_comments: i64,
}

#[derive(Serialize, ToSchema)]
pub struct CommentListPayload {
    pub comments: Vec<Comment>,
    pub pagination: CommentPagination,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentStats {
    pub total_comments: i64,
    pub total_likes: i64,
    pub avg_likes: f64,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikePayload {
    pub likes: i32,
    pub has_liked: bool,
}

/// `POST /citizen-reports/nearby` keeps the resolved reference beside the
/// usual envelope fields.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NearbyCitizenReportsResponse {
    pub success: bool,
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Nearby<CitizenReport>>,
    pub count: usize,
    pub mine_location: Coordinate,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CSiteProbeResponse {
    pub success: bool,
    #[schema(value_type = String)]
    pub message: &'static str,
    pub reports_count: usize,
    #[schema(value_type = Vec<Object>)]
    pub sample_reports: Vec<Nearby<CitizenReport>>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NearbyMinesPayload {
    #[schema(value_type = Vec<Object>)]
    pub mines: Vec<Nearby<Mine>>,
    pub search_center: Coordinate,
    pub radius: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(Pagination::new(2, 20, 41).pages, 3);
    }
}

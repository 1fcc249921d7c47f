use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use super::report::{
    ActionStatus, Attachment, Budget, Evidence, ImpactType, Priority, ReportStatus, ResponseStatus,
};
use crate::proximity::extract::coerce_number;
use crate::proximity::{locate_geojson, Coordinate};

fn default_page() -> u32 {
    1
}

fn default_report_limit() -> u32 {
    10
}

fn default_comment_limit() -> u32 {
    20
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReportListQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be a positive integer"))]
    pub page: u32,
    #[serde(default = "default_report_limit")]
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: u32,
    pub status: Option<ReportStatus>,
    pub impact_type: Option<ImpactType>,
    pub response_status: Option<ResponseStatus>,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be a positive integer"))]
    pub page: u32,
    #[serde(default = "default_report_limit")]
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: u32,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommentPageQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be a positive integer"))]
    pub page: u32,
    #[serde(default = "default_comment_limit")]
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: u32,
}

fn default_report_radius() -> f64 {
    10.0
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NearbyReportsQuery {
    /// Search radius in km (1 to 100).
    #[serde(default = "default_report_radius")]
    #[validate(custom(function = "crate::validation::validate_report_radius"))]
    pub radius: f64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct Position {
    #[validate(custom(function = "crate::validation::validate_lat"))]
    pub lat: f64,
    #[validate(custom(function = "crate::validation::validate_lng"))]
    pub lng: f64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    #[validate(nested)]
    pub position: Position,
    #[validate(
        length(min = 1, message = "At least one impact type is required"),
        custom(function = "validate_citizen_impact_types")
    )]
    pub impact_types: Vec<ImpactType>,
    #[validate(length(min = 10, max = 2000, message = "Details must be between 10 and 2000 characters"))]
    pub details: String,
    #[validate(length(max = 255, message = "Contact must be less than 255 characters"))]
    pub contact: Option<String>,
    #[validate(length(max = 100, message = "Name must be less than 100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 200))]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(length(max = 10, message = "At most 10 evidence files"), nested)]
    pub evidence: Vec<Evidence>,
}

fn validate_citizen_impact_types(types: &[ImpactType]) -> Result<(), ValidationError> {
    if types.contains(&ImpactType::AdditionalInfo) {
        return Err(ValidationError::new("impact_types")
            .with_message("additional_info is reserved for case follow-ups".into()));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CaseReportRequest {
    #[validate(length(min = 10, max = 2000, message = "Details must be between 10 and 2000 characters"))]
    pub details: String,
    #[validate(length(max = 100, message = "Name must be less than 100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 255, message = "Contact must be less than 255 characters"))]
    pub contact: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddActionRequest {
    #[validate(length(min = 1, max = 255))]
    pub actor: String,
    #[validate(length(min = 1, max = 1000))]
    pub action: String,
    #[serde(default)]
    pub status: ActionStatus,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    #[validate(nested)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_status_update"))]
pub struct UpdateStatusRequest {
    pub status: Option<ReportStatus>,
    pub response_status: Option<ResponseStatus>,
    pub priority: Option<Priority>,
    #[validate(length(max = 2000))]
    pub admin_notes: Option<String>,
}

fn validate_status_update(req: &UpdateStatusRequest) -> Result<(), ValidationError> {
    if req.status.is_none()
        && req.response_status.is_none()
        && req.priority.is_none()
        && req.admin_notes.is_none()
    {
        return Err(ValidationError::new("empty_update")
            .with_message("Nothing to update".into()));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateActionRequest {
    pub status: ActionStatus,
    /// Replaces the action's notes when present.
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_assignment"))]
pub struct AssignResponseRequest {
    #[validate(length(min = 1, max = 255, message = "Assignee must be between 1 and 255 characters"))]
    pub assigned_to: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    #[validate(nested)]
    pub budget: Option<Budget>,
    pub priority: Option<Priority>,
}

fn validate_assignment(req: &AssignResponseRequest) -> Result<(), ValidationError> {
    if req.assigned_to.is_none()
        && req.deadline.is_none()
        && req.budget.is_none()
        && req.priority.is_none()
    {
        return Err(ValidationError::new("empty_update")
            .with_message("Nothing to update".into()));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCommentRequest {
    #[validate(custom(function = "crate::validation::validate_comment_text"))]
    pub text: String,
    #[validate(length(max = 100, message = "ชื่อผู้แสดงความคิดเห็นต้องไม่เกิน 100 ตัวอักษร"))]
    pub author: Option<String>,
    #[validate(url(message = "URL รูปภาพไม่ถูกต้อง"))]
    pub avatar: Option<String>,
}

/// Optional upstream filters forwarded to the C-Site topic list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct TopicFilter {
    #[validate(length(max = 32))]
    pub datefrom: Option<String>,
    #[validate(length(max = 32))]
    pub dateto: Option<String>,
    /// Topics to request; 0 or absent means the configured default.
    #[validate(range(max = 1000, message = "Limit must be at most 1000"))]
    pub limit: Option<u32>,
}

/// Either a direct coordinate (numbers or numeric strings) or a GeoJSON mine
/// feature whose anchor is used.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NearbyCitizenReportsRequest {
    #[schema(value_type = Option<f64>)]
    pub lat: Option<Value>,
    #[schema(value_type = Option<f64>)]
    pub lng: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub mine_feature: Option<Value>,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub datefrom: Option<String>,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub dateto: Option<String>,
    #[serde(default)]
    #[validate(range(max = 1000, message = "Limit must be at most 1000"))]
    pub limit: Option<u32>,
}

impl NearbyCitizenReportsRequest {
    /// Explicit `lat`/`lng` take precedence; the feature is only consulted when
    /// either is absent.
    pub fn reference(&self) -> Option<Coordinate> {
        match (&self.lat, &self.lng) {
            (Some(lat), Some(lng)) if !lat.is_null() && !lng.is_null() => {
                Coordinate::new(coerce_number(lat)?, coerce_number(lng)?)
            }
            _ => self.mine_feature.as_ref().and_then(locate_geojson),
        }
    }

    pub fn filter(&self) -> TopicFilter {
        TopicFilter {
            datefrom: self.datefrom.clone(),
            dateto: self.dateto.clone(),
            limit: self.limit.filter(|&l| l > 0),
        }
    }
}

fn default_mine_radius() -> f64 {
    30.0
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MinesNearbyQuery {
    #[validate(custom(function = "crate::validation::validate_lat"))]
    pub lat: f64,
    #[validate(custom(function = "crate::validation::validate_lng"))]
    pub lng: f64,
    /// Search radius in km (greater than 0, at most 500).
    #[serde(default = "default_mine_radius")]
    #[validate(custom(function = "crate::validation::validate_mine_radius"))]
    pub radius: f64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct KokWatchQuery {
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nearby(body: Value) -> NearbyCitizenReportsRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn numeric_string_coordinates_resolve() {
        let req = nearby(json!({ "lat": "13.75", "lng": " 100.5 " }));
        let c = req.reference().unwrap();
        assert_eq!((c.lat(), c.lng()), (13.75, 100.5));
    }

    #[test]
    fn mine_feature_used_when_coordinates_absent() {
        let req = nearby(json!({
            "mineFeature": {
                "type": "Feature",
                "geometry": { "type": "Polygon", "coordinates": [[[99.1, 18.2], [99.2, 18.3], [99.1, 18.2]]] },
                "properties": {}
            }
        }));
        let c = req.reference().unwrap();
        assert_eq!((c.lat(), c.lng()), (18.2, 99.1));
    }

    #[test]
    fn garbage_coordinates_do_not_fall_back_to_feature() {
        let req = nearby(json!({
            "lat": "abc",
            "lng": "def",
            "mineFeature": { "type": "Point", "coordinates": [100.0, 14.0] }
        }));
        assert!(req.reference().is_none());
    }

    #[test]
    fn nothing_usable_resolves_to_none() {
        assert!(nearby(json!({})).reference().is_none());
        assert!(nearby(json!({ "lat": 13.7 })).reference().is_none());
        assert!(nearby(json!({ "lat": 95.0, "lng": 100.0 })).reference().is_none());
    }

    #[test]
    fn report_list_defaults() {
        let q: ReportListQuery = serde_json::from_value(json!({})).unwrap();
        assert_eq!((q.page, q.limit), (1, 10));
        assert!(q.validate().is_ok());

        let q: ReportListQuery = serde_json::from_value(json!({ "limit": 101 })).unwrap();
        assert!(q.validate().is_err());
    }

    #[test]
    fn create_report_rejects_short_details_and_case_type() {
        let base = json!({
            "position": { "lat": 13.75, "lng": 100.5 },
            "impactTypes": ["environment"],
            "details": "short"
        });
        let req: CreateReportRequest = serde_json::from_value(base).unwrap();
        assert!(req.validate().is_err());

        let req: CreateReportRequest = serde_json::from_value(json!({
            "position": { "lat": 13.75, "lng": 100.5 },
            "impactTypes": ["additional_info"],
            "details": "น้ำในลำห้วยเปลี่ยนสีหลังฝนตก"
        }))
        .unwrap();
        assert!(req.validate().is_err());

        let req: CreateReportRequest = serde_json::from_value(json!({
            "position": { "lat": 13.75, "lng": 100.5 },
            "impactTypes": ["environment", "health"],
            "details": "น้ำในลำห้วยเปลี่ยนสีหลังฝนตก"
        }))
        .unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn create_report_rejects_out_of_range_position() {
        let req: CreateReportRequest = serde_json::from_value(json!({
            "position": { "lat": 91.0, "lng": 100.5 },
            "impactTypes": ["health"],
            "details": "รายละเอียดที่ยาวพอสมควร"
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn status_update_needs_a_field() {
        let empty: UpdateStatusRequest = serde_json::from_value(json!({})).unwrap();
        assert!(empty.validate().is_err());
        let some: UpdateStatusRequest =
            serde_json::from_value(json!({ "responseStatus": "addressed" })).unwrap();
        assert!(some.validate().is_ok());
    }

    #[test]
    fn assignment_needs_a_valid_field() {
        let empty: AssignResponseRequest = serde_json::from_value(json!({})).unwrap();
        assert!(empty.validate().is_err());

        let negative: AssignResponseRequest =
            serde_json::from_value(json!({ "budget": { "allocated": -5.0 } })).unwrap();
        assert!(negative.validate().is_err());

        let ok: AssignResponseRequest = serde_json::from_value(json!({
            "assignedTo": "กรมควบคุมมลพิษ",
            "deadline": "2025-03-01T00:00:00Z",
            "budget": { "allocated": 250000.0 }
        }))
        .unwrap();
        assert!(ok.validate().is_ok());
        assert_eq!(ok.budget.map(|b| b.currency).as_deref(), Some("THB"));
    }

    #[test]
    fn action_update_requires_a_known_status() {
        assert!(serde_json::from_value::<UpdateActionRequest>(json!({ "status": "done" })).is_err());
        let ok: UpdateActionRequest =
            serde_json::from_value(json!({ "status": "completed", "notes": "ปิดงาน" })).unwrap();
        assert_eq!(ok.status, ActionStatus::Completed);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn comment_avatar_must_be_url() {
        let bad: CreateCommentRequest =
            serde_json::from_value(json!({ "text": "ดี", "avatar": "not a url" })).unwrap();
        assert!(bad.validate().is_err());
        let ok: CreateCommentRequest = serde_json::from_value(
            json!({ "text": "ดี", "avatar": "https://example.org/a.png" }),
        )
        .unwrap();
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn topic_limit_is_bounded() {
        let ok: TopicFilter = serde_json::from_value(json!({ "limit": 1000 })).unwrap();
        assert!(ok.validate().is_ok());
        let big: TopicFilter = serde_json::from_value(json!({ "limit": 1001 })).unwrap();
        assert!(big.validate().is_err());

        let req = nearby(json!({ "lat": 13.7, "lng": 100.5, "limit": 5000 }));
        assert!(req.validate().is_err());
    }

    #[test]
    fn zero_limit_shares_the_default_filter() {
        let req = nearby(json!({ "lat": 13.7, "lng": 100.5, "limit": 0 }));
        assert_eq!(req.filter(), TopicFilter::default());
    }
}

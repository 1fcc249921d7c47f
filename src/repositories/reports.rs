use deadpool_postgres::Object;
use tokio_postgres::types::Json;
use tokio_postgres::Row;

use crate::errors::AppError;
use crate::models::{
    formatted_date, Action, Evidence, ImpactReport, ImpactType, Priority, ReportStatus, Reporter,
    ResponseStatus, UpdateStatusRequest,
};
use crate::proximity::{within_radius, BoundingBox, Coordinate, Nearby};
use crate::repositories::ResponseActionRepository;

const REPORT_COLUMNS: &str = "id, case_id, title, lat, lng, impact_types, description, \
    reporter_name, reporter_contact, reporter_verified, evidence, status, response_status, \
    priority, views, tags, created_at, updated_at";

/// Optional equality filters for the report listing.
#[derive(Debug, Default)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    pub impact_type: Option<ImpactType>,
    pub response_status: Option<ResponseStatus>,
}

pub struct NewReport {
    pub case_id: Option<String>,
    pub title: String,
    pub location: Option<Coordinate>,
    pub impact_types: Vec<ImpactType>,
    pub description: String,
    pub reporter_name: Option<String>,
    pub reporter_contact: String,
    pub evidence: Vec<Evidence>,
}

pub struct ReportRepository;

impl ReportRepository {
    pub async fn list(
        client: &Object,
        filter: &ReportFilter,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<ImpactReport>, i64), AppError> {
        let status = filter.status.map(ReportStatus::as_str);
        let impact_type = filter.impact_type.map(ImpactType::as_str);
        let response_status = filter.response_status.map(ResponseStatus::as_str);

        let predicate = r#"
            ($1::text IS NULL OR status = $1)
            AND ($2::text IS NULL OR $2 = ANY(impact_types))
            AND ($3::text IS NULL OR response_status = $3)
        "#;
        let sql = format!(
            "SELECT {REPORT_COLUMNS} FROM impact_reports WHERE {predicate} \
             ORDER BY created_at DESC, id DESC LIMIT $4 OFFSET $5"
        );
        let (limit, offset) = window(page, limit);
        let rows = client
            .query(
                &sql,
                &[&status, &impact_type, &response_status, &limit, &offset],
            )
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM impact_reports WHERE {predicate}");
        let total: i64 = client
            .query_one(&count_sql, &[&status, &impact_type, &response_status])
            .await?
            .get(0);

        Ok((rows.iter().map(Self::build_report).collect(), total))
    }

    pub async fn list_by_case(
        client: &Object,
        case_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<ImpactReport>, i64), AppError> {
        let sql = format!(
            "SELECT {REPORT_COLUMNS} FROM impact_reports WHERE case_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let (limit, offset) = window(page, limit);
        let rows = client.query(&sql, &[&case_id, &limit, &offset]).await?;
        let total: i64 = client
            .query_one("SELECT COUNT(*) FROM impact_reports WHERE case_id = $1", &[&case_id])
            .await?
            .get(0);

        Ok((rows.iter().map(Self::build_report).collect(), total))
    }

    /// Fetches a report and counts the read.
    pub async fn view(client: &Object, id: i64) -> Result<ImpactReport, AppError> {
        let sql = format!(
            "UPDATE impact_reports SET views = views + 1 WHERE id = $1 RETURNING {REPORT_COLUMNS}"
        );
        let row = client
            .query_opt(&sql, &[&id])
            .await?
            .ok_or_else(|| AppError::NotFound("ไม่พบรายงาน".to_string()))?;
        Ok(Self::build_report(&row))
    }

    pub async fn exists(client: &Object, id: i64) -> Result<bool, AppError> {
        let row = client
            .query_opt("SELECT 1 FROM impact_reports WHERE id = $1", &[&id])
            .await?;
        Ok(row.is_some())
    }

    /// Stores the report and its response-action log with `first_action` in a
    /// single transaction.
    pub async fn create(
        client: &mut Object,
        report: NewReport,
        first_action: Action,
    ) -> Result<ImpactReport, AppError> {
        let tx = client.transaction().await?;

        let impact_types: Vec<&str> = report.impact_types.iter().map(|t| t.as_str()).collect();
        let lat = report.location.map(|c| c.lat());
        let lng = report.location.map(|c| c.lng());
        let sql = format!(
            r#"INSERT INTO impact_reports
                (case_id, title, lat, lng, impact_types, description,
                 reporter_name, reporter_contact, evidence)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING {REPORT_COLUMNS}"#
        );
        let row = tx
            .query_one(
                &sql,
                &[
                    &report.case_id,
                    &report.title,
                    &lat,
                    &lng,
                    &impact_types,
                    &report.description,
                    &report.reporter_name,
                    &report.reporter_contact,
                    &Json(&report.evidence),
                ],
            )
            .await?;
        let created = Self::build_report(&row);

        ResponseActionRepository::insert_initial(&tx, created.id, &first_action).await?;
        tx.commit().await?;

        log::info!("Stored impact report {} ({})", created.id, created.title);
        Ok(created)
    }

    /// Reports within `radius_km` of `center`, nearest first.
    ///
    /// The bounding box narrows the scan on the `(lat, lng)` index; the exact
    /// great-circle filter runs on whatever it returns.
    pub async fn find_within(
        client: &Object,
        center: Coordinate,
        radius_km: f64,
    ) -> Result<Vec<Nearby<ImpactReport>>, AppError> {
        let bbox = BoundingBox::around(center, radius_km);
        let sql = format!(
            "SELECT {REPORT_COLUMNS} FROM impact_reports \
             WHERE lat BETWEEN $1 AND $2 AND lng BETWEEN $3 AND $4"
        );
        let rows = client
            .query(&sql, &[&bbox.min_lat, &bbox.max_lat, &bbox.min_lng, &bbox.max_lng])
            .await?;
        let candidates = rows.iter().map(Self::build_report);

        Ok(within_radius(center, candidates, radius_km, |r| r.location))
    }

    pub async fn update_status(
        client: &Object,
        id: i64,
        update: &UpdateStatusRequest,
    ) -> Result<ImpactReport, AppError> {
        let status = update.status.map(ReportStatus::as_str);
        let response_status = update.response_status.map(ResponseStatus::as_str);
        let priority = update.priority.map(Priority::as_str);
        let sql = format!(
            r#"UPDATE impact_reports SET
                 status = COALESCE($2, status),
                 response_status = COALESCE($3, response_status),
                 priority = COALESCE($4, priority),
                 admin_notes = COALESCE($5, admin_notes),
                 updated_at = now()
               WHERE id = $1
               RETURNING {REPORT_COLUMNS}"#
        );
        let row = client
            .query_opt(
                &sql,
                &[&id, &status, &response_status, &priority, &update.admin_notes],
            )
            .await?
            .ok_or_else(|| AppError::NotFound("ไม่พบรายงาน".to_string()))?;
        Ok(Self::build_report(&row))
    }

    fn build_report(row: &Row) -> ImpactReport {
        let lat: Option<f64> = row.get("lat");
        let lng: Option<f64> = row.get("lng");
        let impact_types: Vec<String> = row.get("impact_types");
        let Json(evidence): Json<Vec<Evidence>> = row.get("evidence");
        let created_at = row.get("created_at");

        ImpactReport {
            id: row.get("id"),
            case_id: row.get("case_id"),
            title: row.get("title"),
            location: lat.zip(lng).and_then(|(lat, lng)| Coordinate::new(lat, lng)),
            impact_types: impact_types
                .iter()
                .filter_map(|t| ImpactType::parse(t))
                .collect(),
            description: row.get("description"),
            reporter: Reporter {
                name: row.get("reporter_name"),
                contact: row.get("reporter_contact"),
                verified: row.get("reporter_verified"),
            },
            evidence_count: evidence.len(),
            evidence,
            status: ReportStatus::parse(row.get("status")).unwrap_or_default(),
            response_status: ResponseStatus::parse(row.get("response_status")).unwrap_or_default(),
            priority: Priority::parse(row.get("priority")).unwrap_or_default(),
            views: row.get("views"),
            tags: row.get("tags"),
            formatted_date: formatted_date(created_at),
            created_at,
            updated_at: row.get("updated_at"),
        }
    }
}

/// `(LIMIT, OFFSET)` for a 1-based page.
fn window(page: u32, limit: u32) -> (i64, i64) {
    let limit = i64::from(limit);
    (limit, (i64::from(page.max(1)) - 1) * limit)
}

use deadpool_postgres::{Object, Transaction};
use tokio_postgres::types::Json;
use tokio_postgres::Row;

use crate::errors::AppError;
use crate::models::{
    completion_percentage, latest_action, number_actions, update_action, Action, ActionStatus,
    AssignResponseRequest, Budget, Priority, ResponseActionRecord,
};

const NO_RECORD: &str = "ไม่พบการดำเนินการตอบสนอง";

const ACTION_COLUMNS: &str = "id, report_id, actions, assigned_to, priority, deadline, budget, \
    last_updated, created_at, updated_at";

pub struct ResponseActionRepository;

impl ResponseActionRepository {
    pub async fn find_by_report(
        client: &Object,
        report_id: i64,
    ) -> Result<Option<ResponseActionRecord>, AppError> {
        let sql = format!("SELECT {ACTION_COLUMNS} FROM response_actions WHERE report_id = $1");
        let row = client.query_opt(&sql, &[&report_id]).await?;
        Ok(row.as_ref().map(Self::build_record))
    }

    pub(crate) async fn insert_initial(
        tx: &Transaction<'_>,
        report_id: i64,
        action: &Action,
    ) -> Result<(), AppError> {
        tx.execute(
            "INSERT INTO response_actions (report_id, actions) VALUES ($1, $2)",
            &[&report_id, &Json(std::slice::from_ref(action))],
        )
        .await?;
        Ok(())
    }

    /// Appends to the report's action log and bumps `last_updated`.
    pub async fn append(
        client: &Object,
        report_id: i64,
        action: &Action,
    ) -> Result<ResponseActionRecord, AppError> {
        let sql = format!(
            r#"UPDATE response_actions SET
                 actions = actions || $2::jsonb,
                 last_updated = now(),
                 updated_at = now()
               WHERE report_id = $1
               RETURNING {ACTION_COLUMNS}"#
        );
        let row = client
            .query_opt(&sql, &[&report_id, &Json(std::slice::from_ref(action))])
            .await?
            .ok_or_else(|| AppError::NotFound(NO_RECORD.to_string()))?;
        Ok(Self::build_record(&row))
    }

    /// Rewrites one entry of the log under a row lock so concurrent appends
    /// are not lost.
    pub async fn update_action(
        client: &mut Object,
        report_id: i64,
        action_id: usize,
        status: ActionStatus,
        notes: Option<String>,
    ) -> Result<ResponseActionRecord, AppError> {
        let tx = client.transaction().await?;
        let row = tx
            .query_opt(
                "SELECT actions FROM response_actions WHERE report_id = $1 FOR UPDATE",
                &[&report_id],
            )
            .await?
            .ok_or_else(|| AppError::NotFound(NO_RECORD.to_string()))?;
        let Json(mut actions): Json<Vec<Action>> = row.get("actions");
        if !update_action(&mut actions, action_id, status, notes) {
            return Err(AppError::NotFound("ไม่พบการดำเนินการ".to_string()));
        }

        let sql = format!(
            r#"UPDATE response_actions SET
                 actions = $2,
                 last_updated = now(),
                 updated_at = now()
               WHERE report_id = $1
               RETURNING {ACTION_COLUMNS}"#
        );
        let row = tx.query_one(&sql, &[&report_id, &Json(&actions)]).await?;
        tx.commit().await?;
        Ok(Self::build_record(&row))
    }

    /// Sets whichever of assignee, deadline, budget and priority are given.
    pub async fn assign(
        client: &Object,
        report_id: i64,
        update: &AssignResponseRequest,
    ) -> Result<ResponseActionRecord, AppError> {
        let budget = update.budget.as_ref().map(Json);
        let priority = update.priority.map(Priority::as_str);
        let sql = format!(
            r#"UPDATE response_actions SET
                 assigned_to = COALESCE($2, assigned_to),
                 deadline = COALESCE($3, deadline),
                 budget = COALESCE($4, budget),
                 priority = COALESCE($5, priority),
                 last_updated = now(),
                 updated_at = now()
               WHERE report_id = $1
               RETURNING {ACTION_COLUMNS}"#
        );
        let row = client
            .query_opt(
                &sql,
                &[&report_id, &update.assigned_to, &update.deadline, &budget, &priority],
            )
            .await?
            .ok_or_else(|| AppError::NotFound(NO_RECORD.to_string()))?;
        Ok(Self::build_record(&row))
    }

    fn build_record(row: &Row) -> ResponseActionRecord {
        let Json(mut actions): Json<Vec<Action>> = row.get("actions");
        number_actions(&mut actions);
        let budget: Option<Json<Budget>> = row.get("budget");

        ResponseActionRecord {
            id: row.get("id"),
            report_id: row.get("report_id"),
            completion_percentage: completion_percentage(&actions),
            latest_action: latest_action(&actions).cloned(),
            actions,
            assigned_to: row.get("assigned_to"),
            priority: Priority::parse(row.get("priority")).unwrap_or_default(),
            deadline: row.get("deadline"),
            budget: budget.map(|Json(b)| b),
            last_updated: row.get("last_updated"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

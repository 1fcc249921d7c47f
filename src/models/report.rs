use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::proximity::Coordinate;

/// Closed set of string values stored as `TEXT` columns.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? } default $default:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $(
                #[doc = $text]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }

            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }
    };
}

text_enum!(ReportStatus {
    Pending => "pending",
    Verified => "verified",
    Rejected => "rejected",
} default Pending);

text_enum!(ResponseStatus {
    Investigating => "investigating",
    Addressed => "addressed",
    NoAction => "no_action",
} default Investigating);

text_enum!(Priority {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
} default Medium);

text_enum!(
    /// `AdditionalInfo` is reserved for follow-up reports attached to a case.
    ImpactType {
        Environment => "environment",
        Health => "health",
        Economic => "economic",
        Other => "other",
        AdditionalInfo => "additional_info",
    } default Other
);

text_enum!(ActionStatus {
    Completed => "completed",
    InProgress => "in_progress",
    Planned => "planned",
    Cancelled => "cancelled",
} default Planned);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceKind {
    Image,
    Video,
}

/// Reference to a file the client already uploaded to the media CDN.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    #[validate(url(message = "Evidence url must be a valid URL"))]
    pub url: String,
    #[validate(length(max = 255))]
    pub public_id: String,
    #[serde(rename = "type")]
    pub kind: EvidenceKind,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub original_name: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Reporter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub contact: String,
    pub verified: bool,
}

/// A stored impact report as returned by the public endpoints.
///
/// Admin notes are write-only and never part of this view.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImpactReport {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    pub title: String,
    pub location: Option<Coordinate>,
    pub impact_types: Vec<ImpactType>,
    pub description: String,
    pub reporter: Reporter,
    pub evidence: Vec<Evidence>,
    pub status: ReportStatus,
    pub response_status: ResponseStatus,
    pub priority: Priority,
    pub views: i64,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub formatted_date: String,
    pub evidence_count: usize,
}

pub fn default_title(position: Coordinate) -> String {
    format!("ผลกระทบใน {:.4}, {:.4}", position.lat(), position.lng())
}

pub fn case_title(case_id: &str) -> String {
    format!("ข้อมูลเพิ่มเติมสำหรับ {case_id}")
}

pub fn formatted_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct Attachment {
    #[validate(url)]
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Action {
    /// 1-based position in the log. The log is append-only, so this is stable;
    /// it is reassigned every time the log is read.
    #[serde(default)]
    pub id: usize,
    pub date: DateTime<Utc>,
    pub actor: String,
    pub action: String,
    pub status: ActionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct Budget {
    #[validate(range(min = 0.0, message = "Budget amounts cannot be negative"))]
    pub allocated: Option<f64>,
    #[validate(range(min = 0.0, message = "Budget amounts cannot be negative"))]
    pub spent: Option<f64>,
    #[serde(default = "default_currency")]
    #[validate(length(equal = 3, message = "Currency must be an ISO 4217 code"))]
    pub currency: String,
}

fn default_currency() -> String {
    "THB".to_string()
}

/// The response-action log attached to a single report.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseActionRecord {
    pub id: i64,
    pub report_id: i64,
    pub actions: Vec<Action>,
    pub assigned_to: Option<String>,
    pub priority: Priority,
    pub deadline: Option<DateTime<Utc>>,
    pub budget: Option<Budget>,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completion_percentage: u8,
    pub latest_action: Option<Action>,
}

/// Share of completed actions as a rounded percentage; 0 when empty.
pub fn completion_percentage(actions: &[Action]) -> u8 {
    if actions.is_empty() {
        return 0;
    }
    let completed = actions
        .iter()
        .filter(|a| a.status == ActionStatus::Completed)
        .count();
    ((completed as f64 / actions.len() as f64) * 100.0).round() as u8
}

pub fn number_actions(actions: &mut [Action]) {
    for (i, action) in actions.iter_mut().enumerate() {
        action.id = i + 1;
    }
}

/// Sets the status of action `id` and replaces its notes when new ones are
/// given. Returns `false` when the log has no such action.
pub fn update_action(
    actions: &mut [Action],
    id: usize,
    status: ActionStatus,
    notes: Option<String>,
) -> bool {
    let Some(action) = id.checked_sub(1).and_then(|i| actions.get_mut(i)) else {
        return false;
    };
    action.status = status;
    if notes.is_some() {
        action.notes = notes;
    }
    true
}

/// Most recent action by date. Ties resolve to the earliest entry in the log.
pub fn latest_action(actions: &[Action]) -> Option<&Action> {
    actions
        .iter()
        .rev()
        .max_by_key(|a| a.date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn action(day: u32, status: ActionStatus, text: &str) -> Action {
        Action {
            id: 0,
            date: Utc.with_ymd_and_hms(2025, 1, day, 9, 0, 0).unwrap(),
            actor: "ระบบ".into(),
            action: text.into(),
            status,
            notes: None,
            attachments: Vec::new(),
        }
    }

    #[test]
    fn enums_round_trip_through_text() {
        for status in [ReportStatus::Pending, ReportStatus::Verified, ReportStatus::Rejected] {
            assert_eq!(ReportStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ResponseStatus::parse("no_action"), Some(ResponseStatus::NoAction));
        assert_eq!(ImpactType::parse("additional_info"), Some(ImpactType::AdditionalInfo));
        assert_eq!(Priority::parse("urgent"), None);
        assert_eq!(ActionStatus::default(), ActionStatus::Planned);
    }

    #[test]
    fn enums_serialize_snake_case() {
        assert_eq!(serde_json::to_value(ActionStatus::InProgress).unwrap(), "in_progress");
        let parsed: ImpactType = serde_json::from_str("\"health\"").unwrap();
        assert_eq!(parsed, ImpactType::Health);
    }

    #[test]
    fn titles() {
        let c = Coordinate::new(13.756_33, 100.501_77).unwrap();
        assert_eq!(default_title(c), "ผลกระทบใน 13.7563, 100.5018");
        assert_eq!(case_title("CASE-7"), "ข้อมูลเพิ่มเติมสำหรับ CASE-7");

        let longest = "ก".repeat(crate::validation::MAX_CASE_ID_CHARS);
        assert!(case_title(&longest).chars().count() <= 200);
    }

    #[test]
    fn formats_date_only() {
        let at = Utc.with_ymd_and_hms(2025, 3, 9, 23, 59, 0).unwrap();
        assert_eq!(formatted_date(at), "2025-03-09");
    }

    #[test]
    fn completion_is_rounded_share_of_completed() {
        assert_eq!(completion_percentage(&[]), 0);
        let actions = [
            action(1, ActionStatus::Completed, "a"),
            action(2, ActionStatus::Planned, "b"),
            action(3, ActionStatus::InProgress, "c"),
        ];
        assert_eq!(completion_percentage(&actions), 33);
        assert_eq!(completion_percentage(&actions[..1]), 100);
    }

    #[test]
    fn latest_action_is_by_date_not_position() {
        let actions = [
            action(5, ActionStatus::Completed, "newest"),
            action(1, ActionStatus::Completed, "oldest"),
            action(3, ActionStatus::Planned, "middle"),
        ];
        assert_eq!(latest_action(&actions).unwrap().action, "newest");
        assert!(latest_action(&[]).is_none());
    }

    #[test]
    fn actions_are_numbered_from_one() {
        let mut actions = [
            action(1, ActionStatus::Completed, "a"),
            action(2, ActionStatus::Planned, "b"),
        ];
        number_actions(&mut actions);
        assert_eq!(actions.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn update_action_addresses_by_id() {
        let mut actions = [
            action(1, ActionStatus::Completed, "a"),
            action(2, ActionStatus::Planned, "b"),
        ];
        actions[1].notes = Some("รอผล".into());

        assert!(update_action(&mut actions, 2, ActionStatus::InProgress, None));
        assert_eq!(actions[1].status, ActionStatus::InProgress);
        assert_eq!(actions[1].notes.as_deref(), Some("รอผล"));

        assert!(update_action(&mut actions, 2, ActionStatus::Completed, Some("เสร็จ".into())));
        assert_eq!(actions[1].notes.as_deref(), Some("เสร็จ"));
        assert_eq!(completion_percentage(&actions), 100);

        assert!(!update_action(&mut actions, 0, ActionStatus::Cancelled, None));
        assert!(!update_action(&mut actions, 3, ActionStatus::Cancelled, None));
        assert_eq!(actions[0].status, ActionStatus::Completed);
    }

    #[test]
    fn budget_must_be_non_negative() {
        let budget: Budget = serde_json::from_str(r#"{"allocated": -1.0, "spent": 0.0}"#).unwrap();
        assert!(budget.validate().is_err());
        let budget: Budget = serde_json::from_str(r#"{"allocated": 500.0, "spent": 20.0}"#).unwrap();
        assert!(budget.validate().is_ok());
    }

    #[test]
    fn budget_currency_defaults_to_baht() {
        let budget: Budget = serde_json::from_str(r#"{"allocated": 1000.0, "spent": null}"#).unwrap();
        assert_eq!(budget.currency, "THB");
    }
}

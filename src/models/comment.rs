use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_AUTHOR: &str = "ผู้ใช้งาน";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Reply {
    pub author: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub case_id: String,
    pub author: String,
    pub avatar: Option<String>,
    pub text: String,
    pub likes: i32,
    pub is_approved: bool,
    pub replies: Vec<Reply>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Relative age in Thai, computed at read time.
    pub age: String,
}

/// Thai relative-time label for a comment created at `created_at`.
///
/// Future timestamps (clock skew) are treated as just now.
pub fn age_label(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - created_at).num_minutes().max(0);
    match minutes {
        0 => "เมื่อสักครู่".to_string(),
        1..=59 => format!("{minutes} นาทีที่แล้ว"),
        60..=1439 => format!("{} ชั่วโมงที่แล้ว", minutes / 60),
        _ => format!("{} วันที่แล้ว", minutes / 1440),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn label(elapsed: Duration) -> String {
        let now = Utc::now();
        age_label(now - elapsed, now)
    }

    #[test]
    fn under_a_minute_is_just_now() {
        assert_eq!(label(Duration::seconds(0)), "เมื่อสักครู่");
        assert_eq!(label(Duration::seconds(59)), "เมื่อสักครู่");
    }

    #[test]
    fn minutes_hours_days() {
        assert_eq!(label(Duration::minutes(1)), "1 นาทีที่แล้ว");
        assert_eq!(label(Duration::minutes(59)), "59 นาทีที่แล้ว");
        assert_eq!(label(Duration::minutes(60)), "1 ชั่วโมงที่แล้ว");
        assert_eq!(label(Duration::minutes(1439)), "23 ชั่วโมงที่แล้ว");
        assert_eq!(label(Duration::minutes(1440)), "1 วันที่แล้ว");
        assert_eq!(label(Duration::days(45)), "45 วันที่แล้ว");
    }

    #[test]
    fn future_timestamp_is_just_now() {
        assert_eq!(label(Duration::minutes(-10)), "เมื่อสักครู่");
    }
}

use reqwest::StatusCode;
use serde_json::Value;

use crate::errors::AppError;

const KOKWATCH_PATH: &str = "/publicdata/get_kokwatch";

/// What the upstream said: either its JSON body, or the failing status.
#[derive(Debug)]
pub enum KokWatchReply {
    Data(Value),
    Failed(StatusCode),
}

pub struct KokWatchClient {
    http: reqwest::Client,
    base_url: String,
}

impl KokWatchClient {
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }

    pub async fn fetch(&self, token: &str) -> Result<KokWatchReply, AppError> {
        let url = format!("{}{KOKWATCH_PATH}", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .get(&url)
            .query(&[("token", token)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("KokWatch upstream responded with status {status}");
            return Ok(KokWatchReply::Failed(status));
        }

        let body: Value = response.json().await?;
        log::info!(
            "KokWatch: {} PCD points, {} MaeFahLuang points",
            point_count(&body, "pcd_data"),
            point_count(&body, "maefahluang_data")
        );
        Ok(KokWatchReply::Data(body))
    }
}

fn point_count(body: &Value, key: &str) -> usize {
    body.get("data")
        .and_then(|d| d.get(key))
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_monitoring_points() {
        let body = json!({ "data": { "pcd_data": [1, 2, 3], "maefahluang_data": [] } });
        assert_eq!(point_count(&body, "pcd_data"), 3);
        assert_eq!(point_count(&body, "maefahluang_data"), 0);
        assert_eq!(point_count(&json!({}), "pcd_data"), 0);
    }
}

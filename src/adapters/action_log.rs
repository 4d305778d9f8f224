use crate::domain::ports::Storage;
use chrono::Local;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ActionEntry<'a> {
    timestamp: String,
    action: &'a str,
    status: &'a str,
    data: serde_json::Value,
}

/// Marketplace 呼叫的稽核紀錄，每日一個 JSON-lines 檔：`<logs_dir>/whop_api_YYYYMMDD.log`
#[derive(Debug, Clone)]
pub struct ActionLog<S: Storage> {
    storage: S,
    logs_dir: String,
}

impl<S: Storage> ActionLog<S> {
    pub fn new(storage: S, logs_dir: impl Into<String>) -> Self {
        Self {
            storage,
            logs_dir: logs_dir.into(),
        }
    }

    pub fn file_for_today(&self) -> String {
        format!(
            "{}/whop_api_{}.log",
            self.logs_dir,
            Local::now().format("%Y%m%d")
        )
    }

    pub async fn record(&self, action: &str, status: &str, data: serde_json::Value) {
        let entry = ActionEntry {
            timestamp: Local::now().to_rfc3339(),
            action,
            status,
            data,
        };

        let mut line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("⚠️ Could not serialize action log entry: {}", e);
                return;
            }
        };
        line.push('\n');

        // 紀錄失敗不影響呼叫本身
        if let Err(e) = self
            .storage
            .append_file(&self.file_for_today(), line.as_bytes())
            .await
        {
            tracing::warn!("⚠️ Could not write action log: {}", e);
        }
    }
}

use crate::{Db, StoreError};
use chrono::NaiveDateTime;
use sqlx::Row;

const LAST_IMPORT_KEY: &str = "last_import_completed_at";
const RESPONDER_API_KEY: &str = "responder_api_key";
const PROMPT_TEMPLATE_KEY: &str = "responder_prompt_template";
const COLUMN_ORDER_KEY: &str = "column_order";

impl Db {
    pub async fn get_meta(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT value FROM meta WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get(0)))
    }

    pub async fn set_meta(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO meta (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Written once by the importer when the final page comes back short.
    pub async fn mark_import_completed(&self, at: NaiveDateTime) -> Result<(), StoreError> {
        self.set_meta(LAST_IMPORT_KEY, &at.format("%Y-%m-%d %H:%M:%S").to_string())
            .await
    }

    pub async fn last_import_completed_at(&self) -> Result<Option<NaiveDateTime>, StoreError> {
        let raw = self.get_meta(LAST_IMPORT_KEY).await?;
        Ok(raw.and_then(|s| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").ok()))
    }

    // 以下设置项由核心之外的协作方消费，这里只负责存取

    pub async fn responder_api_key(&self) -> Result<Option<String>, StoreError> {
        self.get_meta(RESPONDER_API_KEY).await
    }

    pub async fn set_responder_api_key(&self, key: &str) -> Result<(), StoreError> {
        self.set_meta(RESPONDER_API_KEY, key).await
    }

    pub async fn prompt_template(&self) -> Result<Option<String>, StoreError> {
        self.get_meta(PROMPT_TEMPLATE_KEY).await
    }

    pub async fn set_prompt_template(&self, template: &str) -> Result<(), StoreError> {
        self.set_meta(PROMPT_TEMPLATE_KEY, template).await
    }

    pub async fn column_order(&self) -> Result<Vec<String>, StoreError> {
        let raw = self.get_meta(COLUMN_ORDER_KEY).await?;
        match raw {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| StoreError::Corrupt(format!("column_order: {}", e))),
            None => Ok(Vec::new()),
        }
    }

    pub async fn set_column_order(&self, order: &[String]) -> Result<(), StoreError> {
        let json = serde_json::to_string(order)
            .map_err(|e| StoreError::Validation(format!("column_order: {}", e)))?;
        self.set_meta(COLUMN_ORDER_KEY, &json).await
    }
}

//! Remote backend client
//!
//! The synchronizer only needs four verbs per table (select-all, insert,
//! update-by-id, delete-by-id) plus simple equality filters. `RestBackend`
//! speaks them against a PostgREST-style hosted service
//! (`{base}/rest/v1/{table}`, `?column=eq.value` filters).

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use std::time::Duration;

use crate::errors::AppError;

/// Verbs yang dibutuhkan synchronizer dari tabular data service.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    async fn select_all(&self, table: &str) -> Result<Vec<Value>, AppError>;

    /// Select dengan filter equality (AND antar pasangan kolom/nilai).
    async fn select_where(
        &self,
        table: &str,
        filters: &[(&str, &str)],
    ) -> Result<Vec<Value>, AppError>;

    /// Insert satu row; mengembalikan row yang dibuat (id ditentukan backend).
    async fn insert(&self, table: &str, row: Value) -> Result<Value, AppError>;

    /// Update by id; `None` bila tidak ada row dengan id itu (bukan error).
    async fn update_by_id(
        &self,
        table: &str,
        id: &str,
        patch: Value,
    ) -> Result<Option<Value>, AppError>;

    /// Update semua row yang cocok dengan satu filter equality.
    async fn update_where(
        &self,
        table: &str,
        column: &str,
        value: &str,
        patch: Value,
    ) -> Result<(), AppError>;

    async fn delete_by_id(&self, table: &str, id: &str) -> Result<(), AppError>;
}

/// HTTP client untuk hosted relational data service.
pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
}

impl RestBackend {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        let key_value = HeaderValue::from_str(api_key)
            .map_err(|e| AppError::Internal(format!("API key tidak valid: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| AppError::Internal(format!("API key tidak valid: {}", e)))?;
        headers.insert("apikey", key_value);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Non-2xx menjadi `AppError::Backend` dengan body sebagai deskripsi.
    async fn checked(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Backend(format!("{}: {}", status, body)))
    }
}

#[async_trait]
impl RemoteBackend for RestBackend {
    async fn select_all(&self, table: &str) -> Result<Vec<Value>, AppError> {
        let response = self
            .client
            .get(self.table_url(table))
            .query(&[("select", "*")])
            .send()
            .await?;
        let rows = Self::checked(response).await?.json::<Vec<Value>>().await?;
        Ok(rows)
    }

    async fn select_where(
        &self,
        table: &str,
        filters: &[(&str, &str)],
    ) -> Result<Vec<Value>, AppError> {
        let mut query: Vec<(String, String)> = vec![("select".to_string(), "*".to_string())];
        for (column, value) in filters {
            query.push((column.to_string(), format!("eq.{}", value)));
        }

        let response = self
            .client
            .get(self.table_url(table))
            .query(&query)
            .send()
            .await?;
        let rows = Self::checked(response).await?.json::<Vec<Value>>().await?;
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, AppError> {
        let response = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;
        let mut rows = Self::checked(response).await?.json::<Vec<Value>>().await?;
        if rows.is_empty() {
            return Err(AppError::Backend("insert tidak mengembalikan row".into()));
        }
        Ok(rows.remove(0))
    }

    async fn update_by_id(
        &self,
        table: &str,
        id: &str,
        patch: Value,
    ) -> Result<Option<Value>, AppError> {
        let response = self
            .client
            .patch(self.table_url(table))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        let mut rows = Self::checked(response).await?.json::<Vec<Value>>().await?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.remove(0)))
        }
    }

    async fn update_where(
        &self,
        table: &str,
        column: &str,
        value: &str,
        patch: Value,
    ) -> Result<(), AppError> {
        let response = self
            .client
            .patch(self.table_url(table))
            .query(&[(column, format!("eq.{}", value))])
            .json(&patch)
            .send()
            .await?;
        Self::checked(response).await?;
        Ok(())
    }

    async fn delete_by_id(&self, table: &str, id: &str) -> Result<(), AppError> {
        let response = self
            .client
            .delete(self.table_url(table))
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await?;
        Self::checked(response).await?;
        Ok(())
    }
}

//! HTTP client for the external document store.

use crate::config::StoreConfig;
use crate::store::{DocumentStore, Page, Properties, Query, QueryPage, StoreError};
use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

const API_VERSION: &str = "2022-06-28";

pub struct NotionStore {
    client: reqwest::Client,
    base_url: Url,
    token: String,
}

impl NotionStore {
    pub fn new(config: &StoreConfig) -> Self {
        NotionStore {
            client: reqwest::Client::new(),
            base_url: config.api_url.clone(),
            token: config.token.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.base_url
            .join(path)
            .map_err(|e| StoreError::InvalidUrl(e.to_string()))
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header("Notion-Version", API_VERSION)
    }

    async fn check(
        &self,
        response: reqwest::Response,
        page_id: Option<&str>,
    ) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND
            && let Some(id) = page_id
        {
            return Err(StoreError::PageNotFound(id.to_string()));
        }
        let message = response.text().await.unwrap_or_default();
        Err(StoreError::UnexpectedStatus {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl DocumentStore for NotionStore {
    async fn query(&self, database_id: &str, query: Query) -> Result<QueryPage, StoreError> {
        let url = self.endpoint(&format!("/v1/databases/{database_id}/query"))?;
        let response = self.authed(self.client.post(url)).json(&query).send().await?;
        let response = self.check(response, None).await?;
        Ok(response.json::<QueryPage>().await?)
    }

    async fn get_page(&self, page_id: &str) -> Result<Page, StoreError> {
        let url = self.endpoint(&format!("/v1/pages/{page_id}"))?;
        let response = self.authed(self.client.get(url)).send().await?;
        let response = self.check(response, Some(page_id)).await?;
        Ok(response.json::<Page>().await?)
    }

    async fn create_page(
        &self,
        database_id: &str,
        properties: Properties,
    ) -> Result<Page, StoreError> {
        let url = self.endpoint("/v1/pages")?;
        let body = serde_json::json!({
            "parent": { "database_id": database_id },
            "properties": properties,
        });
        let response = self.authed(self.client.post(url)).json(&body).send().await?;
        let response = self.check(response, None).await?;
        Ok(response.json::<Page>().await?)
    }

    async fn patch_properties(
        &self,
        page_id: &str,
        properties: Properties,
    ) -> Result<(), StoreError> {
        let url = self.endpoint(&format!("/v1/pages/{page_id}"))?;
        let body = serde_json::json!({ "properties": properties });
        let response = self.authed(self.client.patch(url)).json(&body).send().await?;
        self.check(response, Some(page_id)).await?;
        Ok(())
    }
}

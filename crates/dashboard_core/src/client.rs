use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{BrandId, EntityKind},
    error::ApiError,
    pagination::Page,
    protocol::{BrandProducts, CreatedResponse, MutationResponse},
    query::{ListQuery, Location},
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a catalog error body.
    #[error("{0}")]
    Api(ApiError),
    #[error("unexpected server response ({status})")]
    Status { status: reqwest::StatusCode },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// JSON API client for a running catalog server.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: Client,
    server_url: String,
}

impl CatalogClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            server_url: server_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// List URL for `kind` carrying only the non-default parts of `query`.
    pub fn list_url(&self, kind: EntityKind, query: &ListQuery) -> String {
        let location = Location::new(format!("{}/api/{}", self.server_url, kind.collection()));
        query.encode(&location)
    }

    pub async fn list<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        query: &ListQuery,
    ) -> Result<Page<T>, ClientError> {
        let url = self.list_url(kind, query);
        debug!(%url, "fetching list page");
        decode(self.http.get(url).send().await?).await
    }

    pub async fn brand_products(
        &self,
        brand_id: BrandId,
        query: &ListQuery,
    ) -> Result<BrandProducts, ClientError> {
        let location = Location::new(format!(
            "{}/api/brands/{brand_id}/products",
            self.server_url
        ));
        decode(self.http.get(query.encode(&location)).send().await?).await
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        id: i64,
    ) -> Result<T, ClientError> {
        let response = self.http.get(self.item_url(kind, id)).send().await?;
        decode(response).await
    }

    pub async fn create<B: Serialize + ?Sized>(
        &self,
        kind: EntityKind,
        body: &B,
    ) -> Result<CreatedResponse, ClientError> {
        let response = self
            .http
            .post(format!("{}/api/{}", self.server_url, kind.collection()))
            .json(body)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn update<B: Serialize + ?Sized>(
        &self,
        kind: EntityKind,
        id: i64,
        body: &B,
    ) -> Result<MutationResponse, ClientError> {
        let response = self
            .http
            .put(self.item_url(kind, id))
            .json(body)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn delete(&self, kind: EntityKind, id: i64) -> Result<MutationResponse, ClientError> {
        let response = self.http.delete(self.item_url(kind, id)).send().await?;
        decode(response).await
    }

    fn item_url(&self, kind: EntityKind, id: i64) -> String {
        format!("{}/api/{}/{id}", self.server_url, kind.collection())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    // Bodies that are not an ApiError fall back to the bare status.
    match response.json::<ApiError>().await {
        Ok(err) => Err(ClientError::Api(err)),
        Err(_) => Err(ClientError::Status { status }),
    }
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;

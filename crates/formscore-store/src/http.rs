//! HTTP row-store client.
//!
//! Speaks a small REST surface against the hosted datastore: one "forms"
//! collection and one "responses" collection, each exposing insert,
//! update-by-id, delete-by-id, select-by-filter, and select-single-row.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use formscore_core::error::StoreError;
use formscore_core::model::{FormDefinition, SubmittedResponse};
use formscore_core::traits::FormStore;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const FORMS_COLLECTION: &str = "forms";
const RESPONSES_COLLECTION: &str = "responses";

/// HTTP-backed implementation of the remote store.
pub struct HttpStore {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl HttpStore {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        Self {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn rows_url(&self, collection: &str) -> String {
        format!("{}/v1/{}/rows", self.base_url, collection)
    }

    fn row_url(&self, collection: &str, id: &str) -> String {
        format!("{}/v1/{}/rows/{}", self.base_url, collection, id)
    }

    fn map_send_error(e: reqwest::Error) -> StoreError {
        if e.is_timeout() {
            StoreError::Timeout(DEFAULT_TIMEOUT_SECS)
        } else {
            StoreError::Unavailable(e.to_string())
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status().as_u16();
        if (200..300).contains(&status) {
            return Ok(response);
        }

        let message = response
            .text()
            .await
            .ok()
            .and_then(|body| {
                serde_json::from_str::<ErrorBody>(&body)
                    .map(|e| e.error.message)
                    .ok()
                    .or(Some(body))
            })
            .unwrap_or_default();

        Err(match status {
            401 | 403 => StoreError::AuthenticationFailed(message),
            404 => StoreError::NotFound(message),
            _ => StoreError::Api { status, message },
        })
    }

    async fn insert_row<T: serde::Serialize>(
        &self,
        collection: &str,
        row: &T,
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.rows_url(collection))
            .bearer_auth(&self.api_key)
            .json(row)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        Self::check_status(response).await.map(|_| ())
    }

    async fn update_row<T: serde::Serialize>(
        &self,
        collection: &str,
        id: &str,
        row: &T,
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .put(self.row_url(collection, id))
            .bearer_auth(&self.api_key)
            .json(row)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        Self::check_status(response).await.map(|_| ())
    }

    async fn delete_row(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.row_url(collection, id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        Self::check_status(response).await.map(|_| ())
    }

    async fn select_single<T: serde::de::DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<T, StoreError> {
        let response = self
            .client
            .get(self.row_url(collection, id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    async fn select_rows<T: serde::de::DeserializeOwned>(
        &self,
        collection: &str,
        filter: Option<(&str, &str)>,
    ) -> Result<Vec<T>, StoreError> {
        let mut request = self
            .client
            .get(self.rows_url(collection))
            .bearer_auth(&self.api_key);
        if let Some((key, value)) = filter {
            request = request.query(&[(key, value)]);
        }
        let response = request.send().await.map_err(Self::map_send_error)?;
        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[async_trait]
impl FormStore for HttpStore {
    #[instrument(skip(self, form), fields(form_id = %form.id))]
    async fn insert_form(&self, form: &FormDefinition) -> Result<(), StoreError> {
        self.insert_row(FORMS_COLLECTION, form).await
    }

    #[instrument(skip(self, form), fields(form_id = %form.id))]
    async fn update_form(&self, form: &FormDefinition) -> Result<(), StoreError> {
        self.update_row(FORMS_COLLECTION, &form.id, form).await
    }

    async fn delete_form(&self, form_id: &str) -> Result<(), StoreError> {
        self.delete_row(FORMS_COLLECTION, form_id).await
    }

    async fn fetch_form(&self, form_id: &str) -> Result<FormDefinition, StoreError> {
        self.select_single(FORMS_COLLECTION, form_id).await
    }

    async fn fetch_all_forms(&self) -> Result<Vec<FormDefinition>, StoreError> {
        self.select_rows(FORMS_COLLECTION, None).await
    }

    async fn insert_response(&self, response: &SubmittedResponse) -> Result<(), StoreError> {
        self.insert_row(RESPONSES_COLLECTION, response).await
    }

    async fn fetch_responses(&self, form_id: &str) -> Result<Vec<SubmittedResponse>, StoreError> {
        self.select_rows(RESPONSES_COLLECTION, Some(("form_id", form_id)))
            .await
    }

    async fn delete_responses(&self, form_id: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.rows_url(RESPONSES_COLLECTION))
            .bearer_auth(&self.api_key)
            .query(&[("form_id", form_id)])
            .send()
            .await
            .map_err(Self::map_send_error)?;
        Self::check_status(response).await.map(|_| ())
    }
}

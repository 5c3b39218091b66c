//! HTTP implementation of [`ServerApi`] over the resource-manager REST API.

mod operation;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::debug;
use uuid::Uuid;

use crate::api::wire::{Server, ServerForCreate, ServerUpdateParameters};
use crate::api::{ApiError, ApiFuture, OperationHandle, OperationStatus, ServerApi};
use crate::config::{ArmConfig, ConfigError};
use crate::secret::Secret;

use operation::{AsyncOperationBody, handle_from_headers, interpret_location, interpret_status};

const CLIENT_REQUEST_ID_HEADER: &str = "x-ms-client-request-id";

/// Servers client for one subscription and provider namespace.
#[derive(Clone, Debug)]
pub struct ArmServersClient {
    http: Client,
    endpoint: String,
    subscription_id: String,
    provider_namespace: String,
    api_version: String,
    token: Secret,
}

impl ArmServersClient {
    /// Builds a client from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails, the token cannot be
    /// resolved, or the HTTP client cannot be constructed.
    pub fn new(config: &ArmConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let token = config.access_token()?;
        let http = Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|err| ConfigError::Client(err.to_string()))?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_owned(),
            subscription_id: config.subscription_id.clone(),
            provider_namespace: config.provider_namespace.clone(),
            api_version: config.api_version.clone(),
            token,
        })
    }

    fn server_url(&self, resource_group: &str, name: &str) -> String {
        format!(
            "{}/subscriptions/{}/resourceGroups/{}/providers/{}/servers/{}?api-version={}",
            self.endpoint,
            self.subscription_id,
            resource_group,
            self.provider_namespace,
            name,
            self.api_version
        )
    }

    fn authorised(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(self.token.expose())
            .header(CLIENT_REQUEST_ID_HEADER, Uuid::new_v4().to_string())
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        self.authorised(builder)
            .send()
            .await
            .map_err(|err| ApiError::Transport {
                message: err.to_string(),
            })
    }

    async fn submit(&self, builder: RequestBuilder) -> Result<OperationHandle, ApiError> {
        let response = checked(self.send(builder).await?).await?;
        let handle = handle_from_headers(response.headers());
        debug!(status = response.status().as_u16(), handle = ?handle, "mutation accepted");
        Ok(handle)
    }

    async fn fetch(&self, resource_group: &str, name: &str) -> Result<Server, ApiError> {
        let response = self.send(self.http.get(self.server_url(resource_group, name))).await?;
        decode(checked(response).await?).await
    }

    async fn poll(&self, handle: &OperationHandle) -> Result<OperationStatus, ApiError> {
        match handle {
            OperationHandle::Completed => Ok(OperationStatus::Succeeded),
            OperationHandle::AsyncOperation(url) => {
                let response = checked(self.send(self.http.get(url)).await?).await?;
                let body: AsyncOperationBody = decode(response).await?;
                Ok(interpret_status(&body))
            }
            OperationHandle::Location(url) => {
                let response = self.send(self.http.get(url)).await?;
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                Ok(interpret_location(status, &body))
            }
        }
    }
}

async fn checked(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound);
    }
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T>(response: Response) -> Result<T, ApiError>
where
    T: serde::de::DeserializeOwned,
{
    let text = response.text().await.map_err(|err| ApiError::Transport {
        message: err.to_string(),
    })?;
    serde_json::from_str(&text).map_err(|err| ApiError::Decode {
        message: err.to_string(),
    })
}

impl ServerApi for ArmServersClient {
    fn create<'a>(
        &'a self,
        resource_group: &'a str,
        name: &'a str,
        parameters: &'a ServerForCreate,
    ) -> ApiFuture<'a, OperationHandle> {
        Box::pin(async move {
            let url = self.server_url(resource_group, name);
            self.submit(self.http.put(url).json(parameters)).await
        })
    }

    fn update<'a>(
        &'a self,
        resource_group: &'a str,
        name: &'a str,
        parameters: &'a ServerUpdateParameters,
    ) -> ApiFuture<'a, OperationHandle> {
        Box::pin(async move {
            let url = self.server_url(resource_group, name);
            self.submit(self.http.patch(url).json(parameters)).await
        })
    }

    fn delete<'a>(
        &'a self,
        resource_group: &'a str,
        name: &'a str,
    ) -> ApiFuture<'a, OperationHandle> {
        Box::pin(async move {
            let url = self.server_url(resource_group, name);
            self.submit(self.http.delete(url)).await
        })
    }

    fn get<'a>(&'a self, resource_group: &'a str, name: &'a str) -> ApiFuture<'a, Server> {
        Box::pin(self.fetch(resource_group, name))
    }

    fn poll_operation<'a>(&'a self, handle: &'a OperationHandle) -> ApiFuture<'a, OperationStatus> {
        Box::pin(self.poll(handle))
    }
}

use crate::error::ClientError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tutor_core::lesson::StructuredResponse;

/// Where the tutor API listens. The client does not make this configurable.
pub const API_URL: &str = "http://127.0.0.1:8000/chat";

/// Upper bound on a single request, connection included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// The one call the terminal client makes.
#[async_trait]
pub trait TutorApi: Send + Sync {
    async fn ask(&self, message: &str) -> Result<StructuredResponse, ClientError>;

    /// The address requests go to, shown in connectivity errors.
    fn url(&self) -> &str;
}

#[derive(Serialize)]
struct ChatPayload<'a> {
    message: &'a str,
    session_id: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

/// `TutorApi` over HTTP with `reqwest`.
pub struct HttpTutorApi {
    http: reqwest::Client,
    url: String,
    session_id: String,
}

impl HttpTutorApi {
    pub fn new(url: impl Into<String>, session_id: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Request(e.to_string()))?;
        Ok(Self {
            http,
            url: url.into(),
            session_id: session_id.into(),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

#[async_trait]
impl TutorApi for HttpTutorApi {
    async fn ask(&self, message: &str) -> Result<StructuredResponse, ClientError> {
        let payload = ChatPayload {
            message,
            session_id: &self.session_id,
        };

        let response = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, &self.url))?;

        let status = response.status();
        if !status.is_success() {
            let detail = match response.json::<ErrorBody>().await {
                Ok(body) => body.detail,
                Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
            };
            return Err(ClientError::Service { status, detail });
        }

        response
            .json::<StructuredResponse>()
            .await
            .map_err(|e| ClientError::from_reqwest(e, &self.url))
    }

    fn url(&self) -> &str {
        &self.url
    }
}

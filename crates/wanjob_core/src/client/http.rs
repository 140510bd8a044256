//! `reqwest` implementation of the job API.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::{Client, Response};
use tracing::{debug, info};

use super::submit::{parse_correlation_id, CorrelationId};
use super::{ChunkStream, JobApi};
use crate::config::EndpointSettings;
use crate::job::JobRequest;
use crate::orchestrator::{AttemptError, AttemptResult};

const USER_AGENT: &str = concat!("wanjob/", env!("CARGO_PKG_VERSION"));

/// Talks to the remote API over HTTP.
///
/// The submission is a plain POST; the event stream is a GET on
/// `<submit_url>/<event_id>` whose body is consumed chunk by chunk.
pub struct HttpJobApi {
    client: Client,
    submit_url: String,
    submit_timeout: Duration,
}

impl HttpJobApi {
    pub fn new(endpoint: &EndpointSettings) -> AttemptResult<Self> {
        // No total timeout on the client: the stream is long-lived and
        // bounded by the deadline guard instead.
        let client = Client::builder()
            .connect_timeout(endpoint.connect_timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AttemptError::transport("client setup", e))?;

        Ok(Self {
            client,
            submit_url: endpoint.submit_url.trim_end_matches('/').to_string(),
            submit_timeout: endpoint.submit_timeout(),
        })
    }

    pub fn submit_url(&self) -> &str {
        &self.submit_url
    }

    /// Event stream location for a correlation id.
    pub fn stream_url(&self, id: &CorrelationId) -> String {
        format!("{}/{}", self.submit_url, id)
    }
}

#[async_trait]
impl JobApi for HttpJobApi {
    async fn submit(&self, request: &JobRequest) -> AttemptResult<CorrelationId> {
        debug!("POST {}", self.submit_url);
        let response = self
            .client
            .post(&self.submit_url)
            .timeout(self.submit_timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| AttemptError::transport("submit", e))?;

        let response = check_status("submit", response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| AttemptError::transport("submit", e))?;

        parse_correlation_id(&body)
    }

    async fn open_stream(&self, id: &CorrelationId) -> AttemptResult<ChunkStream> {
        let url = self.stream_url(id);
        info!("Opening event stream {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| AttemptError::transport("stream", e))?;

        let response = check_status("stream", response).await?;
        let chunks = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| AttemptError::transport("stream", e))
        });

        Ok(chunks.boxed())
    }
}

/// Turn a non-2xx response into a transport error carrying the status and
/// the start of the body.
async fn check_status(phase: &'static str, response: Response) -> AttemptResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let snippet: String = body.trim().chars().take(200).collect();
    Err(AttemptError::transport(
        phase,
        format!("HTTP {}: {}", status, snippet),
    ))
}

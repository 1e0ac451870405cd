//! HTTP implementation of the remote habit service.
//!
//! Authentication rides on a session cookie. When a request comes back
//! `401`, the session is refreshed once via the refresh endpoint and the
//! original request is retried; a second `401` is reported as
//! [`RemoteError::Unauthorized`].

use super::{CompletionBody, CompletionDelta, RemoteError, RemoteHabits};
use crate::config::SyncConfig;
use async_trait::async_trait;
use habit_sync_types::{Habit, HabitId};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};

/// Remote habit service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    base_url: Url,
    refresh_path: String,
}

impl HttpRemote {
    /// Build a client for the configured service.
    pub fn new(config: &SyncConfig) -> Result<Self, RemoteError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| RemoteError::Transport(format!("invalid base url: {}", e)))?;
        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            refresh_path: config.refresh_path.clone(),
        })
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::Transport("base url cannot hold a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn refresh_session(&self) -> Result<(), RemoteError> {
        let segments: Vec<&str> = self
            .refresh_path
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let url = self.endpoint(&segments)?;

        tracing::debug!("Session rejected, refreshing via {}", url.path());
        let response = self.client.post(url).send().await.map_err(map_error)?;
        if response.status().is_success() {
            Ok(())
        } else {
            tracing::warn!("Session refresh failed with status {}", response.status());
            Err(RemoteError::Unauthorized)
        }
    }

    /// Send a request, refreshing the session and retrying once on 401.
    async fn execute(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let retry = request.try_clone();
        let response = request.send().await.map_err(map_error)?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(response);
        }

        let Some(retry) = retry else {
            return Err(RemoteError::Unauthorized);
        };
        self.refresh_session().await?;
        let response = retry.send().await.map_err(map_error)?;
        check_status(response)
    }
}

fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        Err(RemoteError::Unauthorized)
    } else if !status.is_success() {
        Err(RemoteError::Status(status.as_u16()))
    } else {
        Ok(response)
    }
}

fn map_error(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::Timeout
    } else if e.is_decode() {
        RemoteError::Decode(e.to_string())
    } else {
        RemoteError::Transport(e.to_string())
    }
}

/// The habit in a response body, if the body is one.
async fn habit_body(response: Response) -> Result<Option<Habit>, RemoteError> {
    let text = response.text().await.map_err(map_error)?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    match serde_json::from_str(&text) {
        Ok(habit) => Ok(Some(habit)),
        Err(e) => {
            tracing::debug!("Response body is not a habit: {}", e);
            Ok(None)
        }
    }
}

#[async_trait]
impl RemoteHabits for HttpRemote {
    async fn list_habits(&self) -> Result<Vec<Habit>, RemoteError> {
        let url = self.endpoint(&["api", "Habit"])?;
        let response = self.execute(self.client.get(url)).await?;
        let text = response.text().await.map_err(map_error)?;
        serde_json::from_str(&text).map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn create_habit(&self, habit: &Habit) -> Result<Option<Habit>, RemoteError> {
        let url = self.endpoint(&["api", "Habit"])?;
        let response = self.execute(self.client.post(url).json(habit)).await?;
        habit_body(response).await
    }

    async fn delete_habit(&self, id: &HabitId) -> Result<(), RemoteError> {
        let url = self.endpoint(&["api", "Habit", id.as_str()])?;
        self.execute(self.client.delete(url)).await?;
        Ok(())
    }

    async fn increment_completion(
        &self,
        id: &HabitId,
        delta: CompletionDelta,
    ) -> Result<Option<Habit>, RemoteError> {
        let url = self.endpoint(&["api", "habits", id.as_str(), "completions"])?;
        let body = CompletionBody::from(delta);
        let response = self.execute(self.client.post(url).json(&body)).await?;
        habit_body(response).await
    }

    async fn replace_habit(
        &self,
        id: &HabitId,
        habit: &Habit,
    ) -> Result<Option<Habit>, RemoteError> {
        let url = self.endpoint(&["api", "Habit", id.as_str()])?;
        let response = self.execute(self.client.put(url).json(habit)).await?;
        habit_body(response).await
    }
}

//! Typed client for the clinic chat REST endpoints.
//!
//! [`ChatApi`] layers bearer authentication, JSON encoding and status
//! mapping over a raw [`HttpClient`]. Every method is a single round trip.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{AuthError, ChatError, ChatResult, NetworkError};
use crate::models::{
    CreateSessionRequest, FeedbackRequest, Message, MessageId, MessageList, SendMessageRequest,
    SendMessageResponse, Session, SessionId, SessionList,
};
use crate::traits::{CredentialsProvider, Headers, HttpClient, Response};

/// HTTP method of an API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// Request/response client for chat sessions and messages.
#[derive(Clone)]
pub struct ChatApi {
    http: Arc<dyn HttpClient>,
    credentials: Arc<dyn CredentialsProvider>,
    base_url: String,
}

impl std::fmt::Debug for ChatApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatApi")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ChatApi {
    pub fn new(
        http: Arc<dyn HttpClient>,
        credentials: Arc<dyn CredentialsProvider>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            credentials,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Accept".to_string(), "application/json".to_string());
        if let Some(token) = self.credentials.access_token().await {
            headers.insert("Authorization".to_string(), format!("Bearer {}", token));
        }
        headers
    }

    /// Send one authenticated request and return the successful response.
    ///
    /// A 401 becomes [`AuthError::Unauthorized`]; any other non-2xx status
    /// becomes [`NetworkError::HttpStatus`] carrying the server's message.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> ChatResult<Response> {
        let url = self.url(path);
        let headers = self.headers().await;
        let body = body.unwrap_or_default();

        debug!("{} {}", method.as_str(), url);
        let response = match method {
            Method::Get => self.http.get(&url, &headers).await?,
            Method::Post => self.http.post(&url, &body, &headers).await?,
            Method::Put => self.http.put(&url, &body, &headers).await?,
            Method::Delete => self.http.delete(&url, &headers).await?,
        };

        if response.is_success() {
            return Ok(response);
        }

        let message = response.error_message();
        debug!("{} {} failed with {}: {}", method.as_str(), url, response.status, message);
        Err(match response.status {
            401 => AuthError::Unauthorized { message }.into(),
            status => NetworkError::HttpStatus { status, message }.into(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ChatResult<T> {
        let response = self.request(Method::Get, path, None).await?;
        Ok(response.json()?)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ChatResult<T> {
        let body = serde_json::to_string(body).map_err(ChatError::from)?;
        let response = self.request(Method::Post, path, Some(body)).await?;
        Ok(response.json()?)
    }

    // ============= Sessions =============

    /// Most recent sessions first.
    pub async fn list_sessions(&self, limit: usize) -> ChatResult<Vec<Session>> {
        let list: SessionList = self
            .get_json(&format!("/ai/chat/sessions?limit={}", limit))
            .await?;
        Ok(list.into_vec())
    }

    pub async fn create_session(&self, request: &CreateSessionRequest) -> ChatResult<Session> {
        self.post_json("/ai/chat/sessions", request).await
    }

    pub async fn get_session(&self, id: SessionId) -> ChatResult<Session> {
        self.get_json(&format!("/ai/chat/sessions/{}", id)).await
    }

    pub async fn get_messages(&self, id: SessionId) -> ChatResult<Vec<Message>> {
        let list: MessageList = self
            .get_json(&format!("/ai/chat/sessions/{}/messages", id))
            .await?;
        Ok(list.into_vec())
    }

    pub async fn delete_session(&self, id: SessionId) -> ChatResult<()> {
        self.request(Method::Delete, &format!("/ai/chat/sessions/{}", id), None)
            .await?;
        Ok(())
    }

    // ============= Messages =============

    pub async fn send_message(
        &self,
        session_id: SessionId,
        request: &SendMessageRequest,
    ) -> ChatResult<SendMessageResponse> {
        self.post_json(&format!("/ai/chat/sessions/{}/messages", session_id), request)
            .await
    }

    pub async fn send_feedback(
        &self,
        message_id: MessageId,
        request: &FeedbackRequest,
    ) -> ChatResult<()> {
        let body = serde_json::to_string(request).map_err(ChatError::from)?;
        self.request(
            Method::Post,
            &format!("/ai/chat/messages/{}/feedback", message_id),
            Some(body),
        )
        .await?;
        Ok(())
    }
}

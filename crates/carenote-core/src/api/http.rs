//! REST client for the practice backend.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{DraftApi, FormSubmission, FormsApi, NotificationsApi, SessionsApi};
use crate::config::ClientConfig;
use crate::models::{FormSnapshot, NotificationId, NotificationPage, SessionRecord};
use crate::util::{compact_text, is_http_url, normalize_text_option};
use crate::{Error, Result};

#[derive(Clone)]
pub struct HttpClinicApi {
    base_url: String,
    access_token: Option<String>,
    client: Client,
}

impl std::fmt::Debug for HttpClinicApi {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpClinicApi")
            .field("base_url", &self.base_url)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl HttpClinicApi {
    pub fn new(base_url: impl Into<String>, access_token: Option<String>) -> Result<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        Ok(Self {
            base_url,
            access_token: normalize_text_option(access_token),
            client: Client::builder().build()?,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(
            config.require_api_base_url()?,
            config.access_token.clone(),
        )
    }

    fn url(&self, segments: &[&str]) -> String {
        let path = segments
            .iter()
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{path}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(reqwest::header::ACCEPT, "application/json");
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.authorized(request).send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(parse_api_error(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl DraftApi for HttpClinicApi {
    async fn submit_draft(
        &self,
        form_type: &str,
        subject_id: &str,
        payload: &Value,
    ) -> Result<()> {
        let url = self.url(&["forms", form_type, subject_id, "draft"]);
        self.send(self.client.put(url).json(payload)).await?;
        Ok(())
    }
}

#[async_trait]
impl FormsApi for HttpClinicApi {
    async fn fetch_form(&self, form_type: &str, subject_id: &str) -> Result<FormSnapshot> {
        let url = self.url(&["forms", form_type, subject_id]);
        self.send_json(self.client.get(url)).await
    }

    async fn submit_form(
        &self,
        form_type: &str,
        subject_id: &str,
        submission: &FormSubmission,
    ) -> Result<()> {
        let url = self.url(&["forms", form_type, subject_id]);
        self.send(self.client.post(url).json(submission)).await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationsApi for HttpClinicApi {
    async fn fetch_notifications(&self, page: u32, limit: u32) -> Result<NotificationPage> {
        let url = self.url(&["notifications"]);
        let request = self
            .client
            .get(url)
            .query(&[("page", page), ("limit", limit)]);
        self.send_json(request).await
    }

    async fn mark_notifications_read(&self, ids: &[NotificationId]) -> Result<()> {
        let url = self.url(&["notifications", "read"]);
        self.send(self.client.patch(url).json(&json!({ "ids": ids })))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionsApi for HttpClinicApi {
    async fn fetch_session_note(&self, session_id: &str) -> Result<String> {
        let url = self.url(&["sessions", session_id]);
        let session: SessionRecord = self.send_json(self.client.get(url)).await?;
        Ok(session.notes.unwrap_or_default())
    }

    async fn save_session_note(&self, session_id: &str, notes: &str) -> Result<()> {
        let url = self.url(&["sessions", session_id]);
        self.send(self.client.patch(url).json(&json!({ "notes": notes })))
            .await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<Value>,
    error: Option<Value>,
}

/// Build an `Error::Api`, extracting the message from a structured body.
///
/// `message` may be a string or a list of validation strings.
fn parse_api_error(status: StatusCode, body: &str) -> Error {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|payload| payload.message.or(payload.error))
        .and_then(|value| match value {
            Value::String(text) => normalize_text_option(Some(text)),
            Value::Array(items) => {
                let joined = items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .collect::<Vec<_>>()
                    .join("; ");
                normalize_text_option(Some(joined))
            }
            _ => None,
        });

    if message.is_none() && !body.trim().is_empty() {
        tracing::debug!(
            "Unstructured API error body (HTTP {}): {}",
            status.as_u16(),
            compact_text(body)
        );
    }

    Error::Api {
        status: status.as_u16(),
        message,
    }
}

fn normalize_base_url(raw: String) -> Result<String> {
    let base_url = normalize_text_option(Some(raw))
        .ok_or_else(|| Error::Config("api base URL must not be empty".to_string()))?;
    if is_http_url(&base_url) {
        Ok(base_url.trim_end_matches('/').to_string())
    } else {
        Err(Error::Config(
            "api base URL must include http:// or https://".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    /// Serve one canned response and hand back the raw request text.
    async fn spawn_one_shot_server(
        status_line: &str,
        body: &str,
    ) -> (String, tokio::sync::oneshot::Receiver<String>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test server");
        let address = listener.local_addr().expect("local address");
        let body = body.to_string();
        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let (request_tx, request_rx) = tokio::sync::oneshot::channel();

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut request_buffer = [0_u8; 4096];
                let read = socket.read(&mut request_buffer).await.unwrap_or(0);
                let _ = request_tx.send(String::from_utf8_lossy(&request_buffer[..read]).to_string());
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });

        (format!("http://{address}/api"), request_rx)
    }

    #[test]
    fn normalize_base_url_rejects_invalid_values() {
        assert!(normalize_base_url(String::new()).is_err());
        assert!(normalize_base_url("api.example.com".to_string()).is_err());
        assert_eq!(
            normalize_base_url("https://api.example.com/".to_string()).unwrap(),
            "https://api.example.com"
        );
    }

    #[test]
    fn parse_api_error_extracts_structured_message() {
        let error = parse_api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message": "Versão do formulário desatualizada"}"#,
        );
        assert_eq!(error.user_message(), "Versão do formulário desatualizada");

        let error = parse_api_error(
            StatusCode::BAD_REQUEST,
            r#"{"message": ["nome é obrigatório", "cpf inválido"], "error": "Bad Request"}"#,
        );
        assert_eq!(error.user_message(), "nome é obrigatório; cpf inválido");
    }

    #[test]
    fn parse_api_error_without_structure_has_no_message() {
        let error = parse_api_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(matches!(
            error,
            Error::Api {
                status: 502,
                message: None
            }
        ));
    }

    #[test]
    fn url_encodes_path_segments() {
        let api = HttpClinicApi::new("https://api.example.com/", None).unwrap();
        assert_eq!(
            api.url(&["forms", "ANAMNESE", "p 1/2"]),
            "https://api.example.com/forms/ANAMNESE/p%201%2F2"
        );
    }

    #[test]
    fn debug_redacts_token() {
        let api = HttpClinicApi::new("https://api.example.com", Some("secret".to_string())).unwrap();
        let debug = format!("{api:?}");
        assert!(!debug.contains("secret"));
    }

    #[tokio::test]
    async fn fetch_form_parses_snapshot_and_sends_bearer_token() {
        let body = r#"{"id": "f-1", "status": "draft", "versionId": "v-2", "percentComplete": 10, "sections": []}"#;
        let (url, request) = spawn_one_shot_server("200 OK", body).await;
        let api = HttpClinicApi::new(url, Some("tok".to_string())).unwrap();

        let form = api.fetch_form("ANAMNESE", "p-1").await.unwrap();
        assert_eq!(form.version_id.as_deref(), Some("v-2"));

        let request = request.await.unwrap();
        assert!(request.starts_with("GET /api/forms/ANAMNESE/p-1 "));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer tok"));
    }

    #[tokio::test]
    async fn submit_draft_surfaces_http_failure() {
        let (url, _request) =
            spawn_one_shot_server("503 Service Unavailable", r#"{"error": "maintenance"}"#).await;
        let api = HttpClinicApi::new(url, None).unwrap();

        let error = api
            .submit_draft("ANAMNESE", "p-1", &json!({"text": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Api { status: 503, .. }));
        assert_eq!(error.user_message(), "maintenance");
    }

    #[tokio::test]
    async fn fetch_session_note_reads_notes_field() {
        let body = r#"{"id": "s-1", "patientId": "p-1", "ownerId": "u-1", "notes": "evolução estável"}"#;
        let (url, _request) = spawn_one_shot_server("200 OK", body).await;
        let api = HttpClinicApi::new(url, None).unwrap();

        let notes = api.fetch_session_note("s-1").await.unwrap();
        assert_eq!(notes, "evolução estável");
    }
}

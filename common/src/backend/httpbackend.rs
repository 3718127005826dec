// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use scada_dashboard_model::{BackendError, Command, Snapshot, StatusBackend, STATUS_PATH};

/// A backend base URL together with the agent used to talk to it.
#[derive(Clone)]
pub(crate) struct HttpEndpoint {
    agent: ureq::Agent,
    base_url: String,
}

fn map_error(err: ureq::Error) -> BackendError {
    match err {
        ureq::Error::StatusCode(code) => BackendError::Status(code),
        other => BackendError::Transport(other.to_string()),
    }
}

impl HttpEndpoint {
    pub(crate) fn new(base_url: &str, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();

        Self {
            agent: config.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn get(&self, path: &str) -> Result<String, BackendError> {
        let url = self.url(path);
        log::debug!("-> GET {url}");
        let mut response = self.agent.get(url.as_str()).call().map_err(map_error)?;
        log::debug!("<- {}", response.status());
        response.body_mut().read_to_string().map_err(map_error)
    }

    pub(crate) fn post_json(&self, path: &str, body: &str) -> Result<String, BackendError> {
        let url = self.url(path);
        log::debug!("-> POST {url} {body}");
        let mut response = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(body)
            .map_err(map_error)?;
        log::debug!("<- {}", response.status());
        response.body_mut().read_to_string().map_err(map_error)
    }

    pub(crate) fn post_empty(&self, path: &str) -> Result<String, BackendError> {
        let url = self.url(path);
        log::debug!("-> POST {url}");
        let mut response = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send_empty()
            .map_err(map_error)?;
        log::debug!("<- {}", response.status());
        response.body_mut().read_to_string().map_err(map_error)
    }
}

/// The error document some endpoints send instead of a status document.
#[derive(Deserialize)]
struct ErrorReply {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Decodes a status document, turning error documents into
/// [`BackendError::Rejected`].
pub(crate) fn decode_snapshot(body: &str) -> Result<Snapshot, BackendError> {
    let value: Value = serde_json::from_str(body)?;
    if let Ok(reply) = ErrorReply::deserialize(&value) {
        if let Some(error) = reply.error {
            return Err(BackendError::Rejected(error));
        }
        if reply.status.as_deref() == Some("error") {
            return Err(BackendError::Rejected(reply.message.unwrap_or_default()));
        }
    }
    Ok(serde_json::from_value(value)?)
}

/// The REST backend serving `/api/data` and the per-device command endpoints.
pub struct HttpBackend {
    endpoint: HttpEndpoint,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            endpoint: HttpEndpoint::new(base_url, timeout),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.endpoint.base_url
    }
}

impl StatusBackend for HttpBackend {
    fn fetch_status(&self) -> Result<Snapshot, BackendError> {
        let body = self.endpoint.get(STATUS_PATH)?;
        decode_snapshot(&body)
    }

    fn send_command(&self, command: &Command) -> Result<Snapshot, BackendError> {
        let payload = serde_json::to_string(&command.payload())?;
        let body = self
            .endpoint
            .post_json(&command.device.command_path(), &payload)?;
        decode_snapshot(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_status_document() {
        let snapshot = decode_snapshot(r#"{"plc2": {"progress": 35}, "log": ["x"]}"#).unwrap();
        assert_eq!(snapshot.plc2.percent(), 35);
        assert_eq!(snapshot.log, vec!["x".to_string()]);
    }

    #[test]
    fn test_decode_error_documents() {
        let result = decode_snapshot(r#"{"status": "error", "message": "Acción desconocida"}"#);
        assert!(matches!(result, Err(BackendError::Rejected(m)) if m == "Acción desconocida"));

        let result = decode_snapshot(r#"{"error": "db locked"}"#);
        assert!(matches!(result, Err(BackendError::Rejected(m)) if m == "db locked"));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            decode_snapshot("<html>502</html>"),
            Err(BackendError::Decode(_))
        ));
    }

    #[test]
    fn test_trailing_slash_is_stripped() {
        let backend = HttpBackend::new("http://127.0.0.1:5000/", Duration::from_secs(1));
        assert_eq!(backend.base_url(), "http://127.0.0.1:5000");
        assert_eq!(
            backend.endpoint.url(STATUS_PATH),
            "http://127.0.0.1:5000/api/data"
        );
    }
}

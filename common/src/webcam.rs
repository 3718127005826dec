use std::path::{Path, PathBuf};

use scada_dashboard_model::BackendError;

/// Errors of the webcam panel.
#[derive(Debug, thiserror::Error)]
pub enum WebcamError {
    #[error(transparent)]
    Request(#[from] BackendError),
    #[error("webcam request rejected: {0}")]
    Rejected(String),
    #[error("invalid capture payload: {0}")]
    Payload(String),
    #[error("cannot store capture: {0}")]
    Io(#[from] std::io::Error),
}

/// The camera attached to the production line.
pub trait Webcam {
    /// Whether the camera is currently streaming.
    fn status(&self) -> Result<bool, WebcamError>;
    fn start(&self) -> Result<(), WebcamError>;
    fn stop(&self) -> Result<(), WebcamError>;
    /// Grabs the current frame as JPEG bytes.
    fn capture(&self) -> Result<Vec<u8>, WebcamError>;
}

pub type WebcamPointer = Box<dyn Webcam + Send>;

/// Creates the webcam client for the configured backend. The simulated plant has no camera.
pub fn build_webcam(config: &crate::DashboardConfig) -> Option<WebcamPointer> {
    #[cfg(feature = "http")]
    if let Some(url) = &config.backend_url {
        return Some(Box::new(WebcamClient::new(url, config.http_timeout)));
    }

    #[cfg(not(feature = "http"))]
    let _ = config;

    None
}

/// Writes a captured frame to `dir` under a unique name and returns its path.
pub fn save_capture(dir: &Path, jpeg: &[u8]) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();

    let mut path = dir.join(format!("capture-{stamp}.jpg"));
    let mut suffix = 1;
    while path.exists() {
        path = dir.join(format!("capture-{stamp}-{suffix}.jpg"));
        suffix += 1;
    }

    std::fs::write(&path, jpeg)?;
    Ok(path)
}

#[cfg(feature = "http")]
mod client {
    use std::time::Duration;

    use base64::Engine as _;
    use serde::Deserialize;

    use scada_dashboard_model::BackendError;

    use super::{Webcam, WebcamError};
    use crate::backend::HttpEndpoint;

    const STATUS_PATH: &str = "/api/webcam/status";
    const START_PATH: &str = "/api/webcam/start";
    const STOP_PATH: &str = "/api/webcam/stop";
    const CAPTURE_PATH: &str = "/api/webcam/capture";

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub(super) struct WebcamReply {
        status: String,
        message: Option<String>,
        active: bool,
        image: Option<String>,
    }

    pub(super) fn parse_reply(body: &str) -> Result<WebcamReply, WebcamError> {
        let reply: WebcamReply = serde_json::from_str(body).map_err(BackendError::from)?;
        if reply.status != "success" {
            return Err(WebcamError::Rejected(
                reply.message.unwrap_or_else(|| reply.status.clone()),
            ));
        }
        Ok(reply)
    }

    /// Decodes a `data:image/jpeg;base64,...` URL or a bare base64 string.
    pub(super) fn decode_image(image: &str) -> Result<Vec<u8>, WebcamError> {
        let encoded = match image.split_once(',') {
            Some((header, data)) if header.starts_with("data:") => data,
            Some(_) => return Err(WebcamError::Payload("not a data url".into())),
            None => image,
        };

        base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| WebcamError::Payload(e.to_string()))
    }

    /// The webcam endpoints of the REST backend.
    pub struct WebcamClient {
        endpoint: HttpEndpoint,
    }

    impl WebcamClient {
        pub fn new(base_url: &str, timeout: Duration) -> Self {
            Self {
                endpoint: HttpEndpoint::new(base_url, timeout),
            }
        }
    }

    impl Webcam for WebcamClient {
        fn status(&self) -> Result<bool, WebcamError> {
            let body = self.endpoint.get(STATUS_PATH)?;
            Ok(parse_reply(&body)?.active)
        }

        fn start(&self) -> Result<(), WebcamError> {
            parse_reply(&self.endpoint.post_empty(START_PATH)?).map(|_| ())
        }

        fn stop(&self) -> Result<(), WebcamError> {
            parse_reply(&self.endpoint.post_empty(STOP_PATH)?).map(|_| ())
        }

        fn capture(&self) -> Result<Vec<u8>, WebcamError> {
            let body = self.endpoint.get(CAPTURE_PATH)?;
            match parse_reply(&body)?.image {
                Some(image) => decode_image(&image),
                None => Err(WebcamError::Payload("reply carries no image".into())),
            }
        }
    }
}

#[cfg(feature = "http")]
pub use client::WebcamClient;

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("scada-webcam-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_save_capture_creates_unique_files() {
        let dir = scratch_dir("save");

        let first = save_capture(&dir, b"\xff\xd8first").unwrap();
        let second = save_capture(&dir, b"\xff\xd8second").unwrap();

        assert_ne!(first, second);
        assert_eq!(std::fs::read(&first).unwrap(), b"\xff\xd8first");
        assert_eq!(std::fs::read(&second).unwrap(), b"\xff\xd8second");
        assert_eq!(first.extension().unwrap(), "jpg");

        // capture-YYYYMMDD-HHMMSS.jpg
        let name = first.file_stem().unwrap().to_str().unwrap();
        let stamp = name.strip_prefix("capture-").unwrap();
        assert_eq!(stamp.len(), 15);
        assert_eq!(stamp.as_bytes()[8], b'-');
        assert!(stamp.bytes().filter(|b| *b != b'-').all(|b| b.is_ascii_digit()));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_decode_data_url() {
        let bytes = client::decode_image("data:image/jpeg;base64,/9j/AA==").unwrap();
        assert_eq!(bytes, vec![0xff, 0xd8, 0xff, 0x00]);

        let bytes = client::decode_image("/9j/AA==").unwrap();
        assert_eq!(bytes, vec![0xff, 0xd8, 0xff, 0x00]);

        assert!(matches!(
            client::decode_image("data:image/jpeg;base64,***"),
            Err(WebcamError::Payload(_))
        ));
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_parse_replies() {
        assert!(client::parse_reply(r#"{"status": "success", "active": true}"#).is_ok());

        let result = client::parse_reply(r#"{"status": "error", "message": "No autorizado"}"#);
        assert!(matches!(result, Err(WebcamError::Rejected(m)) if m == "No autorizado"));

        assert!(matches!(
            client::parse_reply("not json"),
            Err(WebcamError::Request(BackendError::Decode(_)))
        ));
    }
}

#![cfg(feature = "http")]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::JoinHandle;
use std::time::Duration;

use scada_dashboard_common::backend::HttpBackend;
use scada_dashboard_common::{Webcam, WebcamClient, WebcamError};
use scada_dashboard_model::{Action, BackendError, Command, Device, RobotState, StatusBackend};

/// Answers exactly one HTTP request with `status` and `body` and hands back the raw request.
fn respond_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    let handle = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buffer = [0u8; 1024];

        loop {
            let read = stream.read(&mut buffer).unwrap();
            request.extend_from_slice(&buffer[..read]);
            let text = String::from_utf8_lossy(&request).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                if request.len() >= header_end + 4 + content_length {
                    break;
                }
            }
            if read == 0 {
                break;
            }
        }

        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        String::from_utf8_lossy(&request).to_string()
    });

    (url, handle)
}

fn backend(url: &str) -> HttpBackend {
    HttpBackend::new(url, Duration::from_secs(5))
}

#[test]
fn test_fetch_status() {
    let (url, server) = respond_once(
        "200 OK",
        r#"{
            "plc1": {"state": "Adelante", "focos": {"encendido": true, "adelante": true, "reversa": false}},
            "plc2": {"progress": 42.6},
            "robot": {"foco": "trabajando", "gcode_line": 30, "total_lines": 120},
            "log": ["PLC1: mode set to Adelante"]
        }"#,
    );

    let snapshot = backend(&url).fetch_status().unwrap();
    let request = server.join().unwrap();

    assert!(request.starts_with("GET /api/data HTTP/1.1"));
    assert_eq!(snapshot.plc1.state, "Adelante");
    assert!(snapshot.plc1.lamps.forward);
    assert_eq!(snapshot.plc2.percent(), 43);
    assert_eq!(snapshot.robot.state, RobotState::Working);
    assert_eq!(snapshot.robot.percent(), 25);
    assert_eq!(snapshot.log.len(), 1);
}

#[test]
fn test_server_error_status() {
    let (url, server) = respond_once("500 Internal Server Error", r#"{"error": "boom"}"#);

    let result = backend(&url).fetch_status();
    server.join().unwrap();

    assert!(matches!(result, Err(BackendError::Status(500))));
}

#[test]
fn test_unreachable_backend() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    assert!(matches!(
        backend(&url).fetch_status(),
        Err(BackendError::Transport(_))
    ));
}

#[test]
fn test_toggle_command_payload() {
    let (url, server) = respond_once("200 OK", r#"{"plc3": {"focos": {"trabajando": true}}}"#);

    let snapshot = backend(&url)
        .send_command(&Command::toggle(Device::Packer, true))
        .unwrap();
    let request = server.join().unwrap();

    assert!(request.starts_with("POST /api/plc3/button HTTP/1.1"));
    let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
    let payload: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(
        payload,
        serde_json::json!({"action": "toggle", "newState": true})
    );
    assert!(snapshot.plc3.lamps.working);
}

#[test]
fn test_rejected_command() {
    let (url, server) = respond_once(
        "200 OK",
        r#"{"status": "error", "message": "Acción desconocida"}"#,
    );

    let result = backend(&url).send_command(&Command::new(Device::Robot, Action::Skip));
    let request = server.join().unwrap();

    assert!(request.starts_with("POST /api/robot/button HTTP/1.1"));
    assert!(request.contains(r#""action":"skip""#));
    assert!(!request.contains("newState"));
    assert!(matches!(result, Err(BackendError::Rejected(_))));
}

#[test]
fn test_webcam_capture() {
    let (url, server) = respond_once(
        "200 OK",
        r#"{"status": "success", "image": "data:image/jpeg;base64,/9j/2Q=="}"#,
    );

    let jpeg = WebcamClient::new(&url, Duration::from_secs(5))
        .capture()
        .unwrap();
    let request = server.join().unwrap();

    assert!(request.starts_with("GET /api/webcam/capture HTTP/1.1"));
    assert_eq!(jpeg, vec![0xff, 0xd8, 0xff, 0xd9]);
}

#[test]
fn test_webcam_rejected() {
    let (url, server) = respond_once(
        "200 OK",
        r#"{"status": "error", "message": "No hay imagen disponible para capturar"}"#,
    );

    let result = WebcamClient::new(&url, Duration::from_secs(5)).start();
    let request = server.join().unwrap();

    assert!(request.starts_with("POST /api/webcam/start HTTP/1.1"));
    assert!(matches!(result, Err(WebcamError::Rejected(_))));
}

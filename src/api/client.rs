use std::time::Duration;

use chrono::Utc;
use reqwest::blocking::{Client, Response};
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::api::types::{Class, NewStudent, Student};
use crate::error::RollcallError;

/// The registration service as seen by the rest of the crate.
///
/// Every call either completes with an answer from the service, fails with
/// [`RollcallError::Network`] when the service could not be reached, or
/// fails with [`RollcallError::Rejected`] when it answered with an error
/// status.
#[cfg_attr(test, mockall::automock)]
pub trait Backend {
    /// Probe the health endpoint.
    fn health(&self) -> Result<(), RollcallError>;

    fn list_students(&self) -> Result<Vec<Student>, RollcallError>;

    fn list_classes(&self) -> Result<Vec<Class>, RollcallError>;

    /// Ask the service to create its default classes.
    fn seed_classes(&self) -> Result<(), RollcallError>;

    fn create_student(&self, student: &NewStudent) -> Result<Student, RollcallError>;

    /// Delete a student. A record that is already gone counts as deleted.
    fn delete_student(&self, id: i64) -> Result<(), RollcallError>;
}

/// HTTP implementation of [`Backend`].
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RollcallError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| RollcallError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RollcallError> {
        debug!(path, "GET");
        let response = self.client.get(self.url(path)).send()?;
        decode(ensure_success(response)?)
    }
}

impl Backend for HttpBackend {
    fn health(&self) -> Result<(), RollcallError> {
        // Timestamp query defeats intermediary caches along with the headers
        let url = format!("{}?_={}", self.url("/health"), Utc::now().timestamp_millis());
        debug!(%url, "health check");

        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()?;

        let _: Value = decode(ensure_success(response)?)?;
        Ok(())
    }

    fn list_students(&self) -> Result<Vec<Student>, RollcallError> {
        self.get_json("/students")
    }

    fn list_classes(&self) -> Result<Vec<Class>, RollcallError> {
        self.get_json("/classes")
    }

    fn seed_classes(&self) -> Result<(), RollcallError> {
        debug!("POST /classes/seed");
        let response = self.client.post(self.url("/classes/seed")).send()?;
        ensure_success(response)?;
        Ok(())
    }

    fn create_student(&self, student: &NewStudent) -> Result<Student, RollcallError> {
        debug!(name = student.name(), "POST /students");
        let response = self.client.post(self.url("/students")).json(student).send()?;
        decode(ensure_success(response)?)
    }

    fn delete_student(&self, id: i64) -> Result<(), RollcallError> {
        debug!(id, "DELETE /students");
        let response = self
            .client
            .delete(self.url(&format!("/students/{id}")))
            .send()?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(id, "student already gone");
            return Ok(());
        }

        ensure_success(response)?;
        Ok(())
    }
}

/// Turn a non-2xx response into an error.
///
/// Gateway failures (502, 503, 504) mean the service itself could not be
/// reached and are reported as [`RollcallError::Network`]; every other status
/// is the service's answer and becomes [`RollcallError::Rejected`].
fn ensure_success(response: Response) -> Result<Response, RollcallError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if is_gateway_failure(status) {
        return Err(RollcallError::Network(format!(
            "service unavailable behind gateway ({status})"
        )));
    }

    let body = response.text().unwrap_or_default();
    Err(RollcallError::Rejected {
        status: status.as_u16(),
        message: error_message(&body, status),
    })
}

const fn is_gateway_failure(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RollcallError> {
    let text = response.text()?;
    serde_json::from_str(&text)
        .map_err(|e| RollcallError::UnexpectedResponse(format!("{e} in body {text:?}")))
}

/// Pull a readable message out of an error body.
///
/// Understands `{"detail": "..."}`, `{"detail": [{"loc": [..], "msg": ".."}]}`
/// and `{"message": "..."}`; anything else is returned as plain text.
fn error_message(body: &str, status: StatusCode) -> String {
    let fallback = || {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("no details")
                .to_string()
        } else {
            trimmed.to_string()
        }
    };

    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return fallback();
    };

    match value.get("detail").or_else(|| value.get("message")) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| {
                    let msg = item.get("msg")?.as_str()?;
                    let field = item
                        .get("loc")
                        .and_then(Value::as_array)
                        .and_then(|loc| loc.last())
                        .and_then(Value::as_str);
                    Some(field.map_or_else(|| msg.to_string(), |f| format!("{f}: {msg}")))
                })
                .collect();
            if messages.is_empty() {
                fallback()
            } else {
                messages.join("; ")
            }
        }
        _ => fallback(),
    }
}


#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use chrono::NaiveDate;

    use super::testing::serve_once;
    use super::*;
    use crate::api::types::{StudentDraft, StudentStatus};

    fn backend(base_url: &str) -> HttpBackend {
        HttpBackend::new(base_url, Duration::from_secs(5)).unwrap()
    }

    fn new_student() -> NewStudent {
        StudentDraft {
            name: "Ana Silva".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2012, 3, 14).unwrap(),
            email: None,
            class_id: Some(1),
            status: StudentStatus::Active,
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let backend = backend("http://localhost:8000/");
        assert_eq!(backend.base_url(), "http://localhost:8000");
        assert_eq!(backend.url("/health"), "http://localhost:8000/health");
    }

    #[test]
    fn test_health_ok() {
        let (url, handle) = serve_once("200 OK", r#"{"status":"healthy"}"#);
        assert!(backend(&url).health().is_ok());

        let request = handle.join().unwrap();
        assert!(request.starts_with("GET /health?_="));
    }

    #[test]
    fn test_health_unparseable_body() {
        let (url, handle) = serve_once("200 OK", "<html>captive portal</html>");
        let err = backend(&url).health().unwrap_err();
        assert!(matches!(err, RollcallError::UnexpectedResponse(_)));
        handle.join().unwrap();
    }

    #[test]
    fn test_health_error_status() {
        let (url, handle) = serve_once("500 Internal Server Error", "");
        let err = backend(&url).health().unwrap_err();
        assert_eq!(err.status(), Some(500));
        handle.join().unwrap();
    }

    #[test]
    fn test_gateway_failures_are_network_errors() {
        for status in ["502 Bad Gateway", "503 Service Unavailable", "504 Gateway Timeout"] {
            let (url, handle) = serve_once(status, "<html>upstream down</html>");
            let err = backend(&url).create_student(&new_student()).unwrap_err();
            assert!(err.is_network(), "{status} gave {err:?}");
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_create_student_unreadable_success_body() {
        let (url, handle) = serve_once("201 Created", r#"{"id":7,"nome":"Ana Silva"}"#);
        let err = backend(&url).create_student(&new_student()).unwrap_err();
        assert!(matches!(err, RollcallError::UnexpectedResponse(_)));
        handle.join().unwrap();
    }

    #[test]
    fn test_connection_refused_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = backend(&url).health().unwrap_err();
        assert!(err.is_network(), "expected network error, got {err:?}");
    }

    #[test]
    fn test_create_student() {
        let (url, handle) = serve_once(
            "201 Created",
            r#"{"id":21,"name":"Ana Silva","birthDate":"2012-03-14","email":null,"classId":1,"status":"active"}"#,
        );

        let created = backend(&url).create_student(&new_student()).unwrap();
        assert_eq!(created.id, 21);
        assert_eq!(created.class_id, Some(1));
        assert_eq!(handle.join().unwrap(), "POST /students HTTP/1.1");
    }

    #[test]
    fn test_create_student_validation_error() {
        let (url, handle) = serve_once(
            "422 Unprocessable Entity",
            r#"{"detail":[{"loc":["body","email"],"msg":"value is not a valid email address"}]}"#,
        );

        let err = backend(&url).create_student(&new_student()).unwrap_err();
        match err {
            RollcallError::Rejected { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "email: value is not a valid email address");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        handle.join().unwrap();
    }

    #[test]
    fn test_delete_already_gone() {
        let (url, handle) = serve_once("404 Not Found", r#"{"detail":"Student not found"}"#);
        assert!(backend(&url).delete_student(5).is_ok());
        assert_eq!(handle.join().unwrap(), "DELETE /students/5 HTTP/1.1");
    }

    #[test]
    fn test_delete_no_content() {
        let (url, handle) = serve_once("204 No Content", "");
        assert!(backend(&url).delete_student(5).is_ok());
        handle.join().unwrap();
    }

    #[test]
    fn test_list_classes() {
        let (url, handle) = serve_once(
            "200 OK",
            r#"[{"id":1,"name":"1º Ano A","capacity":30},{"id":2,"name":"1º Ano B","capacity":30}]"#,
        );

        let classes = backend(&url).list_classes().unwrap();
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0].capacity, Some(30));
        handle.join().unwrap();
    }

    #[test]
    fn test_error_message_shapes() {
        let status = StatusCode::BAD_REQUEST;
        assert_eq!(error_message(r#"{"detail":"Email already registered"}"#, status), "Email already registered");
        assert_eq!(error_message(r#"{"message":"nope"}"#, status), "nope");
        assert_eq!(error_message("plain failure", status), "plain failure");
        assert_eq!(error_message("", status), "Bad Request");
        assert_eq!(error_message(r#"{"detail":[]}"#, status), r#"{"detail":[]}"#);
    }
}

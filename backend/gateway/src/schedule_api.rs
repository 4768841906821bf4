//! `/api/schedule` and `/api/vocabulary` handlers.
//!
//! The schedule endpoint takes either `multipart/form-data` (fields `text`,
//! `image`, `user_timezone`) or a JSON body `{ "text", "user_timezone" }`.
//! An image beats text when both arrive.

use axum::{
    Json,
    extract::{FromRequest, Multipart, Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use medibook_core::{AppointmentInput, ScheduleError, ScheduleResponse};
use medibook_understanding::VocabularyEntry;

use crate::server::GatewayState;
use crate::uploads::TempUpload;

/// Fields pulled out of a schedule request, whatever its encoding.
#[derive(Debug, Default)]
struct ScheduleFields {
    text: Option<String>,
    image: Option<TempUpload>,
    user_timezone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct JsonScheduleBody {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    user_timezone: Option<String>,
}

/// POST /api/schedule
pub async fn schedule(State(state): State<GatewayState>, request: Request) -> Response {
    let fields = match read_fields(&state, request).await {
        Ok(fields) => fields,
        Err(e) => return error_response(&e),
    };

    let timezone = fields
        .user_timezone
        .filter(|tz| !tz.trim().is_empty())
        .unwrap_or_else(|| state.default_timezone.clone());

    let (input, upload) = match (fields.image, fields.text) {
        (Some(upload), _) => {
            info!(path = %upload.path().display(), "Processing image upload");
            (AppointmentInput::Image(upload.path().to_path_buf()), Some(upload))
        }
        (None, Some(text)) => {
            info!(chars = text.chars().count(), "Processing text request");
            (AppointmentInput::Text(text), None)
        }
        (None, None) => return error_response(&ScheduleError::missing_input()),
    };

    let result = state.orchestrator.handle(input, &timezone).await;
    if let Some(upload) = upload {
        upload.cleanup().await;
    }

    match result {
        Ok(outcome) => (StatusCode::OK, Json(ScheduleResponse::from(outcome))).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn read_fields(
    state: &GatewayState,
    request: Request,
) -> Result<ScheduleFields, ScheduleError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| ScheduleError::BadRequest(e.body_text()))?;
        read_multipart(state, multipart).await
    } else if content_type.contains("json") {
        let Json(body) = Json::<JsonScheduleBody>::from_request(request, state)
            .await
            .map_err(|e| ScheduleError::BadRequest(e.body_text()))?;
        Ok(ScheduleFields {
            text: non_empty(body.text),
            image: None,
            user_timezone: body.user_timezone,
        })
    } else {
        // Unparsed bodies carry no fields.
        Ok(ScheduleFields::default())
    }
}

async fn read_multipart(
    state: &GatewayState,
    mut multipart: Multipart,
) -> Result<ScheduleFields, ScheduleError> {
    let mut fields = ScheduleFields::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ScheduleError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "text" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ScheduleError::BadRequest(e.body_text()))?;
                fields.text = non_empty(Some(text));
            }
            "user_timezone" => {
                let tz = field
                    .text()
                    .await
                    .map_err(|e| ScheduleError::BadRequest(e.body_text()))?;
                fields.user_timezone = Some(tz);
            }
            "image" => {
                if fields.image.is_some() {
                    return Err(ScheduleError::BadRequest(
                        "Only one image file may be uploaded.".into(),
                    ));
                }
                let file_name = field.file_name().map(str::to_owned);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ScheduleError::BadRequest(e.body_text()))?;
                let upload =
                    TempUpload::persist(&state.uploads_dir, file_name.as_deref(), &bytes).await?;
                fields.image = Some(upload);
            }
            _ => {}
        }
    }
    Ok(fields)
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.is_empty())
}

fn error_response(err: &ScheduleError) -> Response {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        error!(error = %err, "Schedule request failed");
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(ScheduleResponse::from(err))).into_response()
}

#[derive(Debug, Serialize)]
pub struct VocabularyResponse {
    pub entries: Vec<VocabularyEntry>,
}

/// GET /api/vocabulary
pub async fn vocabulary(State(state): State<GatewayState>) -> Json<VocabularyResponse> {
    let entries = state.orchestrator.resolver().vocabulary().snapshot().await;
    Json(VocabularyResponse { entries })
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use anyhow::Result;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request as HttpRequest, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use medibook_core::OcrEngine;
    use medibook_intake::{ReferenceClock, RequestOrchestrator};

    use crate::server::{GatewayState, build_router};

    const BOUNDARY: &str = "medibook-test-boundary";

    /// Returns fixed text and records whether the staged file existed.
    struct StubOcr {
        text: String,
        seen: Mutex<Vec<(PathBuf, bool)>>,
    }

    impl StubOcr {
        fn new(text: &str) -> Arc<Self> {
            Arc::new(Self {
                text: text.to_string(),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl OcrEngine for StubOcr {
        fn name(&self) -> &str {
            "stub"
        }

        async fn recognize(&self, image_path: &Path) -> Result<String> {
            self.seen
                .lock()
                .unwrap()
                .push((image_path.to_path_buf(), image_path.exists()));
            Ok(self.text.clone())
        }
    }

    fn state(ocr: Arc<StubOcr>, uploads: &Path) -> GatewayState {
        let orchestrator = RequestOrchestrator::new(ocr).with_clock(ReferenceClock::Pinned(
            "2025-10-07T12:00:00Z".parse().unwrap(),
        ));
        GatewayState::new(orchestrator, "Asia/Kolkata", uploads, 1024 * 1024)
    }

    fn json_request(body: Value) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method("POST")
            .uri("/api/schedule")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    /// (name, file name, contents)
    fn multipart_request(parts: &[(&str, Option<&str>, &[u8])]) -> HttpRequest<Body> {
        let mut body = Vec::new();
        for (name, file_name, data) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            let disposition = match file_name {
                Some(f) => format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\nContent-Type: image/png\r\n\r\n"
                ),
                None => format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"),
            };
            body.extend_from_slice(disposition.as_bytes());
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        HttpRequest::builder()
            .method("POST")
            .uri("/api/schedule")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(state: GatewayState, request: HttpRequest<Body>) -> (StatusCode, Value) {
        let response = build_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn dir_is_empty(path: &Path) -> bool {
        std::fs::read_dir(path)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(true)
    }

    #[tokio::test]
    async fn json_text_is_scheduled() {
        let uploads = tempfile::tempdir().unwrap();
        let (status, body) = send(
            state(StubOcr::new(""), uploads.path()),
            json_request(json!({ "text": "I need a dentist appointment tomorrow at 3pm" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "status": "ok",
                "appointment": {
                    "department": "Dentistry",
                    "date": "2025-10-08",
                    "time": "15:00",
                    "tz": "Asia/Kolkata"
                }
            })
        );
    }

    #[tokio::test]
    async fn missing_date_needs_clarification() {
        let uploads = tempfile::tempdir().unwrap();
        let (status, body) = send(
            state(StubOcr::new(""), uploads.path()),
            json_request(json!({ "text": "book a dentist appointment" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "needs_clarification");
        assert_eq!(body["message"], "Could not determine a valid date or time.");
    }

    #[tokio::test]
    async fn missing_department_needs_clarification() {
        let uploads = tempfile::tempdir().unwrap();
        let (status, body) = send(
            state(StubOcr::new(""), uploads.path()),
            json_request(json!({ "text": "see someone tomorrow at 3pm" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Could not determine the department.");
    }

    #[tokio::test]
    async fn empty_body_is_bad_request() {
        let uploads = tempfile::tempdir().unwrap();
        let (status, body) = send(
            state(StubOcr::new(""), uploads.path()),
            json_request(json!({ "text": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({
                "status": "error",
                "message": "Request must contain either text or an image file."
            })
        );
    }

    #[tokio::test]
    async fn request_without_content_type_is_bad_request() {
        let uploads = tempfile::tempdir().unwrap();
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/api/schedule")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(state(StubOcr::new(""), uploads.path()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let uploads = tempfile::tempdir().unwrap();
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/api/schedule")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(state(StubOcr::new(""), uploads.path()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn multipart_text_with_timezone() {
        let uploads = tempfile::tempdir().unwrap();
        let (status, body) = send(
            state(StubOcr::new(""), uploads.path()),
            multipart_request(&[
                ("text", None, b"cardiologist appointment tomorrow at 9am"),
                ("user_timezone", None, b"Europe/London"),
            ]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["appointment"]["department"], "Cardiology");
        assert_eq!(body["appointment"]["date"], "2025-10-08");
        assert_eq!(body["appointment"]["time"], "09:00");
        assert_eq!(body["appointment"]["tz"], "Europe/London");
    }

    #[tokio::test]
    async fn image_wins_and_upload_is_removed() {
        let uploads = tempfile::tempdir().unwrap();
        let ocr = StubOcr::new("Heart appointment on 2025-10-20 at 10:30");
        let (status, body) = send(
            state(ocr.clone(), uploads.path()),
            multipart_request(&[
                ("text", None, b"dentist appointment tomorrow at 3pm"),
                ("image", Some("slip.png"), b"\x89PNG fake"),
            ]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["appointment"]["department"], "Cardiology");
        assert_eq!(body["appointment"]["date"], "2025-10-20");
        assert_eq!(body["appointment"]["time"], "10:30");

        let seen = ocr.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].1, "upload should exist while OCR runs");
        assert!(!seen[0].0.exists());
        assert!(dir_is_empty(uploads.path()));
    }

    #[tokio::test]
    async fn blank_ocr_text_is_internal_error_and_cleans_up() {
        let uploads = tempfile::tempdir().unwrap();
        let (status, body) = send(
            state(StubOcr::new("  \n"), uploads.path()),
            multipart_request(&[("image", Some("blank.jpg"), b"jpeg")]),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({ "status": "error", "message": "An internal server error occurred." })
        );
        assert!(dir_is_empty(uploads.path()));
    }

    #[tokio::test]
    async fn unknown_timezone_is_internal_error() {
        let uploads = tempfile::tempdir().unwrap();
        let (status, body) = send(
            state(StubOcr::new(""), uploads.path()),
            json_request(json!({
                "text": "dentist appointment tomorrow at 3pm",
                "user_timezone": "Mars/Olympus"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "An internal server error occurred.");
    }

    #[tokio::test]
    async fn unknown_timezone_without_date_needs_clarification() {
        let uploads = tempfile::tempdir().unwrap();
        let (status, body) = send(
            state(StubOcr::new(""), uploads.path()),
            json_request(json!({
                "text": "book a dentist appointment",
                "user_timezone": "Bogus/Zone"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "status": "needs_clarification",
                "message": "Could not determine a valid date or time."
            })
        );
    }

    #[tokio::test]
    async fn vocabulary_lists_learned_keywords() {
        let uploads = tempfile::tempdir().unwrap();
        let state = state(StubOcr::new(""), uploads.path());
        let (status, _) = send(
            state.clone(),
            json_request(json!({ "text": "dermatology appointment tomorrow at 11am" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let request = HttpRequest::builder()
            .uri("/api/vocabulary")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(state, request).await;
        assert_eq!(status, StatusCode::OK);
        let entries = body["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 6);
        assert_eq!(
            entries[5],
            json!({ "keyword": "dermatology", "canonical_name": "Dermatology" })
        );
    }
}

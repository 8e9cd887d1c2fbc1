//! Syllabus upload endpoint.
//!
//! Accepts a multipart form with a single `file` field, stages the bytes,
//! and answers with the extraction process's live output as a chunked
//! plain-text stream. Failures before the stream opens use the regular JSON
//! error responses; everything after is reported in-stream.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{StatusCode, header},
    response::Response,
};
use bytes::Bytes;
use futures::StreamExt;
use tracing::info;

use crate::error::ServiceError;
use crate::extraction;

use super::AppState;

pub async fn upload_syllabus_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ServiceError> {
    let mut file: Option<(Bytes, String)> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("syllabus.pdf").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ServiceError::InvalidRequest {
                    message: e.to_string(),
                })?;
            file = Some((data, filename));
        }
    }

    let (data, filename) = file.ok_or_else(|| ServiceError::InvalidRequest {
        message: "No file uploaded".to_string(),
    })?;

    let staging_dir = state.service.config.storage.staging_dir();
    let staged = extraction::stage_upload(&staging_dir, &filename, &data).await?;

    info!(
        file = %staged.display(),
        size = data.len(),
        "Upload staged, starting extraction"
    );

    let stream =
        extraction::extraction_stream(state.service.clone(), staged).map(Ok::<_, Infallible>);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from_stream(stream))
        .map_err(|e| ServiceError::Internal {
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use crate::api;
    use crate::service::test_support::service_with_script;
    use crate::views::VIEW_DASHBOARD;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    const BOUNDARY: &str = "XUPLOADBOUNDARYX";

    fn multipart_request(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn file_part(filename: &str, content: &str) -> String {
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
             Content-Type: application/pdf\r\n\r\n{c}\r\n--{b}--\r\n",
            b = BOUNDARY,
            f = filename,
            c = content
        )
    }

    #[tokio::test]
    async fn missing_file_field_is_rejected_before_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with_script(dir.path(), "exit 0", None);
        let app = api::router(service.clone());

        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{b}--\r\n",
            b = BOUNDARY
        );
        let response = app.oneshot(multipart_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        // Nothing was staged, so nothing ran
        assert!(!service.config.storage.staging_dir().exists());
    }

    #[tokio::test]
    async fn upload_streams_extraction_output_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with_script(
            dir.path(),
            "echo \"Found 12 texts\"\necho \"model warning\" 1>&2\nexit 0\n",
            None,
        );
        let app = api::router(service.clone());

        let response = app
            .oneshot(multipart_request(file_part(
                "eng honours syllabus.pdf",
                "%PDF-1.4 fake",
            )))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "text/plain; charset=utf-8"
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let output = String::from_utf8_lossy(&bytes);

        assert!(output.contains("Found 12 texts"));
        assert!(output.contains("[log] model warning"));
        assert!(output.ends_with("\n✅ Process completed successfully!"));

        // Staging dir is empty again and the dashboard view was invalidated
        let leftovers: Vec<_> = std::fs::read_dir(service.config.storage.staging_dir())
            .unwrap()
            .collect();
        assert!(leftovers.is_empty());
        assert_eq!(service.views.generation(VIEW_DASHBOARD), 1);
    }

    #[tokio::test]
    async fn upload_failure_is_reported_in_stream() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with_script(dir.path(), "echo \"bad pdf\" 1>&2\nexit 2\n", None);
        let app = api::router(service.clone());

        let response = app
            .oneshot(multipart_request(file_part("garbled.pdf", "not a pdf")))
            .await
            .unwrap();

        // The stream had already opened, so the status stays 200
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let output = String::from_utf8_lossy(&bytes);

        assert!(output.contains("[log] bad pdf"));
        assert!(output.ends_with("\n❌ Process failed with code 2"));
        assert_eq!(service.views.generation(VIEW_DASHBOARD), 0);
    }
}

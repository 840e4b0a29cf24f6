//! Browser front end.
//!
//! A single upload form posts PDFs to `/convert`; the response page shows the
//! text of every converted document with a `.txt` download, a copy button and
//! its warnings, followed by the batch zip when more than one document
//! succeeded. Downloads are embedded as `data:` URIs so nothing is kept on the
//! server between requests. `/api/convert` accepts the same form and answers
//! with the JSON [`BatchReport`].

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::archive::{ARCHIVE_MIME_TYPE, ARCHIVE_NAME};
use crate::batch::{BatchReport, Converter, DocumentOutcome, RunOptions, Upload};
use crate::output::TEXT_MIME_TYPE;
use crate::ConvertError;

/// Shown when the form is submitted without a file.
pub const NO_UPLOAD_WARNING: &str = "Upload at least one PDF file.";

// ── AppState ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct AppState {
    converter: Converter,
}

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug)]
struct AppError(StatusCode, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({ "error": self.1 }))).into_response()
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError(err.status(), err.body_text())
    }
}

impl From<ConvertError> for AppError {
    fn from(err: ConvertError) -> Self {
        match err {
            ConvertError::NoDocuments => bad_request(NO_UPLOAD_WARNING),
            other => AppError(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        }
    }
}

fn bad_request(msg: impl Into<String>) -> AppError {
    AppError(StatusCode::BAD_REQUEST, msg.into())
}

// ── Router ───────────────────────────────────────────────────────────────────

/// Build the application.
///
/// `max_upload_bytes` caps the size of one request body, all files included.
pub fn router(converter: Converter, max_upload_bytes: usize) -> Router {
    let state = AppState { converter };

    Router::new()
        .route("/", get(index_handler))
        .route("/convert", post(convert_handler))
        .route("/api/convert", post(api_convert_handler))
        .route("/logs", get(logs_handler))
        .route("/logs/clear", post(clear_logs_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

// GET /
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(render_page(&state.converter, ""))
}

// POST /convert
async fn convert_handler(State(state): State<AppState>, multipart: Multipart) -> Result<Html<String>, AppError> {
    let form = read_form(multipart, state.converter.config().run_options()).await?;
    if form.uploads.is_empty() {
        state.converter.sink().warning(NO_UPLOAD_WARNING);
        let notice = format!("<p class=\"warning\">{}</p>", encode_text(NO_UPLOAD_WARNING));
        return Ok(Html(render_page(&state.converter, &notice)));
    }

    let (report, progress) = run_in_worker(&state.converter, form).await?;
    let archive = report.archive()?;
    log::info!(
        "[POST /convert] {} of {} document(s) converted",
        report.converted_count(),
        report.documents.len()
    );

    let results = render_results(&report, &progress, archive.as_deref());
    Ok(Html(render_page(&state.converter, &results)))
}

// POST /api/convert
async fn api_convert_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<BatchReport>, AppError> {
    let form = read_form(multipart, state.converter.config().run_options()).await?;
    let (report, _) = run_in_worker(&state.converter, form).await?;
    log::info!(
        "[POST /api/convert] {} of {} document(s) converted",
        report.converted_count(),
        report.documents.len()
    );
    Ok(Json(report))
}

// GET /logs
async fn logs_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.converter.sink().contents(),
    )
}

// POST /logs/clear
async fn clear_logs_handler(State(state): State<AppState>) -> Redirect {
    state.converter.sink().clear();
    Redirect::to("/")
}

// ── Form handling ────────────────────────────────────────────────────────────

struct ConvertForm {
    uploads: Vec<Upload>,
    password: Option<String>,
    options: RunOptions,
}

/// Collect the multipart fields.
///
/// A toggle missing from the form keeps its configured default; when a
/// toggle appears more than once the last value wins, which lets the HTML
/// form send a hidden `off` ahead of its checkbox.
async fn read_form(mut multipart: Multipart, defaults: RunOptions) -> Result<ConvertForm, AppError> {
    let mut form = ConvertForm {
        uploads: Vec::new(),
        password: None,
        options: defaults,
    };

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "files" => {
                let filename = field.file_name().unwrap_or_default().to_owned();
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file was picked.
                if filename.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.uploads.push(Upload::new(filename, bytes.to_vec()));
            }
            "password" => form.password = Some(field.text().await?),
            "batch_mode" => form.options.batch_mode = parse_toggle(&field.text().await?)?,
            "page_separators" => form.options.page_separators = parse_toggle(&field.text().await?)?,
            _ => {}
        }
    }

    Ok(form)
}

fn parse_toggle(value: &str) -> Result<bool, AppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" => Ok(false),
        other => Err(bad_request(format!("invalid toggle value '{other}'"))),
    }
}

/// Run the batch on the blocking pool; extraction is CPU-bound.
async fn run_in_worker(converter: &Converter, form: ConvertForm) -> Result<(BatchReport, Vec<String>), AppError> {
    let converter = converter.clone();
    let joined = tokio::task::spawn_blocking(move || {
        let mut progress = Vec::new();
        let report = converter.run(form.uploads, form.password.as_deref(), form.options, |done, total| {
            progress.push(format!("Processed {done}/{total}"))
        })?;
        Ok::<_, ConvertError>((report, progress))
    })
    .await
    .map_err(|e| AppError(StatusCode::INTERNAL_SERVER_ERROR, format!("conversion worker failed: {e}")))?;

    Ok(joined?)
}

// ── Rendering ────────────────────────────────────────────────────────────────

const STYLE: &str = "body{font-family:sans-serif;max-width:60rem;margin:2rem auto;padding:0 1rem}\
textarea{width:100%;height:16rem;font-family:monospace}\
.warning{color:#8a6d00}.error{color:#b00020}.progress{color:#555;margin:0}\
pre.logs{background:#f4f4f4;padding:.5rem;max-height:20rem;overflow:auto}";

const SCRIPT: &str = "function copyText(id){navigator.clipboard.writeText(document.getElementById(id).value);}";

fn render_page(converter: &Converter, results: &str) -> String {
    let config = converter.config();
    let checked = |on: bool| if on { " checked" } else { "" };
    let logs = converter.sink().contents();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>PDF to TXT</title>
<style>{STYLE}</style>
<script>{SCRIPT}</script>
</head>
<body>
<h1>PDF to TXT</h1>
<form action="/convert" method="post" enctype="multipart/form-data">
<p><input type="file" name="files" accept="application/pdf,.pdf" multiple></p>
<p><label>Password (optional) <input type="password" name="password"></label></p>
<p><input type="hidden" name="batch_mode" value="off">
<label><input type="checkbox" name="batch_mode" value="on"{batch}> Batch mode</label></p>
<p><input type="hidden" name="page_separators" value="off">
<label><input type="checkbox" name="page_separators" value="on"{separators}> Page separators</label></p>
<p><button type="submit">Convert</button></p>
</form>
{results}
<h2>Debug log</h2>
<pre class="logs">{logs}</pre>
<form action="/logs/clear" method="post"><button type="submit">Clear logs</button></form>
</body>
</html>
"#,
        batch = checked(config.batch_mode),
        separators = checked(config.page_separators),
        logs = encode_text(&logs),
    )
}

fn render_results(report: &BatchReport, progress: &[String], archive: Option<&[u8]>) -> String {
    let mut html = String::new();

    for (index, doc) in report.documents.iter().enumerate() {
        html.push_str(&format!("<section>\n<h2>{}</h2>\n", encode_text(&doc.source)));
        match &doc.outcome {
            DocumentOutcome::Converted(file) => {
                for warning in &file.warnings {
                    html.push_str(&format!("<p class=\"warning\">{}</p>\n", encode_text(warning)));
                }
                let id = format!("text-{index}");
                html.push_str(&format!(
                    "<textarea id=\"{id}\" readonly>{}</textarea>\n",
                    encode_text(&file.text)
                ));
                html.push_str(&format!(
                    "<p><a href=\"{}\" download=\"{}\">Download {}</a> \
                     <button type=\"button\" onclick=\"copyText('{id}')\">Copy text</button></p>\n",
                    data_uri(&format!("{TEXT_MIME_TYPE};charset=utf-8"), file.as_bytes()),
                    encode_double_quoted_attribute(&file.filename),
                    encode_text(&file.filename),
                ));
            }
            DocumentOutcome::Failed { message, .. } => {
                html.push_str(&format!(
                    "<p class=\"error\">{}: {}</p>\n",
                    encode_text(&doc.source),
                    encode_text(message)
                ));
            }
        }
        html.push_str("</section>\n");
    }

    for line in progress {
        html.push_str(&format!("<p class=\"progress\">{}</p>\n", encode_text(line)));
    }

    if let Some(bytes) = archive {
        html.push_str(&format!(
            "<p><a href=\"{}\" download=\"{ARCHIVE_NAME}\">Download all ({ARCHIVE_NAME})</a></p>\n",
            data_uri(ARCHIVE_MIME_TYPE, bytes)
        ));
    }

    html
}

fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::DocumentReport;
    use crate::output::TextFile;
    use crate::{ConverterConfig, LogSink};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    const BOUNDARY: &str = "pdf2txt-test-boundary";

    fn app() -> (Router, LogSink) {
        let sink = LogSink::new();
        let converter = Converter::new(ConverterConfig::default(), sink.clone());
        (router(converter, 1024 * 1024), sink)
    }

    fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, filename, content) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match filename {
                Some(file) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file}\"\r\n\
                         Content-Type: application/pdf\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn post(uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn toggles_accept_form_and_json_spellings() {
        assert!(parse_toggle("on").unwrap());
        assert!(parse_toggle(" TRUE ").unwrap());
        assert!(!parse_toggle("off").unwrap());
        assert!(!parse_toggle("0").unwrap());
        assert!(parse_toggle("maybe").is_err());
    }

    #[test]
    fn results_escape_user_content() {
        let report = BatchReport {
            options: ConverterConfig::default().run_options(),
            documents: vec![
                DocumentReport {
                    source: "<b>.pdf".into(),
                    outcome: DocumentOutcome::Converted(TextFile::for_source(
                        "<b>.pdf",
                        "a < b & c".into(),
                        vec![],
                    )),
                },
                DocumentReport {
                    source: "locked.pdf".into(),
                    outcome: DocumentOutcome::Failed {
                        access_denied: true,
                        message: "incorrect password for the protected PDF".into(),
                    },
                },
            ],
            uploaded: 2,
        };

        let html = render_results(&report, &["Processed 1/2".into(), "Processed 2/2".into()], None);
        assert!(html.contains("a &lt; b &amp; c"));
        assert!(html.contains("&lt;b&gt;.txt"));
        assert!(!html.contains("<b>"));
        assert!(html.contains("locked.pdf: incorrect password for the protected PDF"));
        assert!(html.contains("Processed 2/2"));
        assert!(!html.contains(ARCHIVE_NAME));
    }

    #[test]
    fn downloads_are_base64_data_uris() {
        assert_eq!(data_uri("text/plain", b"hi"), "data:text/plain;base64,aGk=");
    }

    #[tokio::test]
    async fn index_renders_form_and_defaults() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains("name=\"files\""));
        assert!(html.contains("value=\"on\" checked> Batch mode"));
        assert!(html.contains("value=\"on\" checked> Page separators"));
    }

    #[tokio::test]
    async fn convert_without_files_warns() {
        let (app, sink) = app();
        let body = multipart_body(&[("files", Some(""), b"".as_slice()), ("password", None, b"".as_slice())]);
        let response = app.oneshot(post("/convert", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains(NO_UPLOAD_WARNING));
        assert!(sink.contents().contains(NO_UPLOAD_WARNING));
    }

    #[tokio::test]
    async fn api_without_files_is_a_bad_request() {
        let (app, _) = app();
        let response = app.oneshot(post("/api/convert", multipart_body(&[("password", None, b"".as_slice())]))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn api_reports_corrupt_uploads_per_document() {
        let (app, _) = app();
        let body = multipart_body(&[
            ("files", Some("broken.pdf"), b"not a pdf".as_slice()),
            ("page_separators", None, b"off".as_slice()),
        ]);
        let response = app.oneshot(post("/api/convert", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["options"]["page_separators"], false);
        assert_eq!(json["documents"][0]["source"], "broken.pdf");
        assert_eq!(json["documents"][0]["outcome"]["status"], "failed");
        assert_eq!(
            json["documents"][0]["outcome"]["message"],
            "Processing error, check the logs."
        );
    }

    #[tokio::test]
    async fn logs_can_be_read_and_cleared() {
        let (app, sink) = app();
        sink.info("hello from the test");

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/logs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(body_text(response).await.contains("| INFO | hello from the test"));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/logs/clear")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(sink.is_empty());
    }
}

//! Local stand-in for the protocol processing service.
//!
//! Accepts a PDF under the `file` multipart key and answers with a Word
//! attachment named after it. The document body is the uploaded content;
//! no conversion happens here.

use std::net::SocketAddr;
use std::path::Path;

use axum::body::Bytes;
use axum::extract::Multipart;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::post;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use unicode_normalization::UnicodeNormalization;

use crate::exchange::FILE_FIELD;

pub const ROUTE: &str = "/icf";
pub const DOCX_MEDIA_TYPE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const ALLOWED_EXTENSIONS: &[&str] = &["pdf"];

pub fn router() -> Router {
    Router::new().route(ROUTE, post(process_upload).options(preflight))
}

/// Serves [`router`] on `listener` until the task is dropped or fails.
pub async fn serve(listener: TcpListener) -> std::io::Result<()> {
    info!("mock processing service listening on {}", listener.local_addr()?);
    axum::serve(listener, router().into_make_service()).await
}

/// Binds `addr` and serves in the background, returning the bound address.
pub async fn spawn(addr: SocketAddr) -> std::io::Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    let listener = TcpListener::bind(addr).await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        if let Err(e) = serve(listener).await {
            warn!("Server error: {}", e);
        }
    });
    Ok((addr, handle))
}

/// Answers a CORS preflight for the upload route.
async fn preflight() -> impl IntoResponse {
    [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, "*"),
        (header::ACCESS_CONTROL_ALLOW_METHODS, "*"),
    ]
}

async fn process_upload(mut multipart: Multipart) -> Response {
    let mut upload: Option<(String, Bytes)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("failed to parse multipart data: {}", e);
                return StatusCode::BAD_REQUEST.into_response();
            }
        };

        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = secure_filename(field.file_name().unwrap_or_default());
        match field.bytes().await {
            Ok(content) => upload = Some((filename, content)),
            Err(e) => {
                warn!("failed to read uploaded file: {}", e);
                return StatusCode::BAD_REQUEST.into_response();
            }
        }
    }

    let Some((filename, content)) = upload else {
        debug!("no file part");
        return Redirect::to(ROUTE).into_response();
    };
    if filename.is_empty() {
        debug!("no selected file");
        return Redirect::to(ROUTE).into_response();
    }
    if !allowed_file(&filename) {
        debug!(%filename, "unexpected file type");
        return Redirect::to(ROUTE).into_response();
    }

    let download_name = format!("{}_icf.docx", file_stem(&filename));
    info!(upload = %filename, download = %download_name, size = content.len(), "processed upload");

    let disposition = match HeaderValue::from_str(&format!("attachment; filename={download_name}")) {
        Ok(value) => value,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(DOCX_MEDIA_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
            (header::ACCESS_CONTROL_EXPOSE_HEADERS, HeaderValue::from_static("Content-Disposition")),
        ],
        content,
    )
        .into_response()
}

fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn file_stem(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
}

/// Reduces a client-supplied filename to a flat ASCII name.
///
/// The name is NFKD-decomposed and folded to ASCII. Path separators become
/// spaces, whitespace runs become `_`, anything outside `[A-Za-z0-9._-]` is
/// dropped, and leading or trailing `.` and `_` are trimmed.
pub fn secure_filename(filename: &str) -> String {
    let folded: String = filename.nfkd().filter(char::is_ascii).collect();
    let flattened = folded.replace(['/', '\\'], " ");
    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secure_filename_flattens_paths() {
        assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("My Protocol v2.pdf"), "My_Protocol_v2.pdf");
        assert_eq!(secure_filename("C:\\docs\\trial.pdf"), "C_docs_trial.pdf");
    }

    #[test]
    fn secure_filename_folds_to_ascii() {
        assert_eq!(secure_filename("caf\u{e9}.pdf"), "cafe.pdf");
        assert_eq!(secure_filename("\u{fb01}le \u{2460}.pdf"), "file_1.pdf");
        assert_eq!(secure_filename("\u{65e5}\u{672c}.pdf"), "pdf");
        assert_eq!(secure_filename("..."), "");
    }

    #[test]
    fn only_pdf_is_allowed() {
        assert!(allowed_file("protocol.pdf"));
        assert!(allowed_file("PROTOCOL.PDF"));
        assert!(!allowed_file("protocol.docx"));
        assert!(!allowed_file("pdf"));
    }

    #[test]
    fn stem_drops_last_extension() {
        assert_eq!(file_stem("report.final.pdf"), "report.final");
        assert_eq!(file_stem("report.pdf"), "report");
    }
}

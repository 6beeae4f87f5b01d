//! `multipart/form-data` case submissions.
//!
//! Text fields `url`, `reporterName` and `description` are read into a
//! [`SubmitCaseRequest`]. Every file field named `evidence_*` contributes
//! its file name only; the file contents are drained and dropped.

use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::guard::GuardContext;
use actix_web::http::header;
use fakesense_server_models::SubmitCaseRequest;
use futures::StreamExt as _;

/// Prefix of form fields that carry evidence files.
const EVIDENCE_FIELD_PREFIX: &str = "evidence_";

/// Largest text field accepted, in bytes.
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

/// Errors reading a submission form.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// The multipart body itself is malformed.
    #[error("Invalid form data: {0}")]
    Multipart(#[from] MultipartError),

    /// A text field exceeded [`MAX_TEXT_FIELD_BYTES`].
    #[error("Form field {name} is too large")]
    FieldTooLarge {
        /// Name of the offending field.
        name: String,
    },

    /// A text field was not valid UTF-8.
    #[error("Form field {name} is not valid UTF-8")]
    NotUtf8 {
        /// Name of the offending field.
        name: String,
    },
}

/// Route guard matching `multipart/form-data` request bodies.
#[must_use]
pub fn is_multipart(ctx: &GuardContext<'_>) -> bool {
    ctx.head()
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("multipart/form-data")
        })
}

/// Reads a case submission from a multipart body.
///
/// # Errors
///
/// Returns [`FormError`] if the body is malformed or a text field is too
/// large or not UTF-8.
#[allow(clippy::future_not_send)]
pub async fn read_submission(mut payload: Multipart) -> Result<SubmitCaseRequest, FormError> {
    let mut request = SubmitCaseRequest::default();
    let mut evidence_files = Vec::new();

    while let Some(field) = payload.next().await {
        let mut field = field?;
        let name = field.name().unwrap_or_default().to_string();

        if name.starts_with(EVIDENCE_FIELD_PREFIX) {
            let file_name = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(ToString::to_string);
            drain(&mut field).await?;
            if let Some(file_name) = file_name.filter(|f| !f.is_empty()) {
                evidence_files.push(file_name);
            }
            continue;
        }

        let value = read_text(&mut field, &name).await?;
        match name.as_str() {
            "url" => request.url = Some(value),
            "reporterName" => request.reporter_name = Some(value),
            "description" => request.description = Some(value),
            _ => log::debug!("Ignoring form field {name:?}"),
        }
    }

    request.evidence_files = Some(evidence_files);
    Ok(request)
}

async fn read_text(field: &mut Field, name: &str) -> Result<String, FormError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk?;
        if bytes.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
            return Err(FormError::FieldTooLarge {
                name: name.to_string(),
            });
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes).map_err(|_| FormError::NotUtf8 {
        name: name.to_string(),
    })
}

async fn drain(field: &mut Field) -> Result<(), MultipartError> {
    while let Some(chunk) = field.next().await {
        chunk?;
    }
    Ok(())
}

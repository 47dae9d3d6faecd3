//! Serving the rendered greeting, inline for the preview and as a download.

use std::io::ErrorKind;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::HeaderMap;
use axum::http::header::{
    CACHE_CONTROL, CONTENT_DISPOSITION, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED,
};
use axum::http::response::Builder;
use httpdate::{fmt_http_date, parse_http_date};

use super::prelude::*;
use crate::constants::{DOWNLOAD_FILE_NAME, OUTPUT_CACHE_CONTROL, OUTPUT_MIME_TYPE};

/// Validators for the output file, derived from its metadata.
#[derive(Clone, Debug)]
struct OutputValidators {
    etag: Option<HeaderValue>,
    last_modified: Option<HeaderValue>,
    modified_at: Option<SystemTime>,
}

impl OutputValidators {
    fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        let modified_at = metadata.modified().ok();
        let last_modified =
            modified_at.and_then(|modified| HeaderValue::from_str(&fmt_http_date(modified)).ok());
        Self {
            etag: build_etag(metadata.len(), modified_at),
            last_modified,
            modified_at,
        }
    }

    fn apply(&self, mut builder: Builder) -> Builder {
        builder = builder.header(CACHE_CONTROL, OUTPUT_CACHE_CONTROL);
        if let Some(etag) = &self.etag {
            builder = builder.header(ETAG, etag.clone());
        }
        if let Some(last_modified) = &self.last_modified {
            builder = builder.header(LAST_MODIFIED, last_modified.clone());
        }
        builder
    }

    /// True when the client's copy is still current.
    fn matches(&self, headers: &HeaderMap) -> bool {
        if let Some(if_none_match) = headers.get(IF_NONE_MATCH) {
            let Ok(value) = if_none_match.to_str() else {
                return false;
            };
            let value = value.trim();
            if value == "*" {
                return true;
            }
            return self
                .etag
                .as_ref()
                .and_then(|etag| etag.to_str().ok())
                .is_some_and(|etag| value.split(',').any(|candidate| candidate.trim() == etag));
        }

        if let (Some(if_modified_since), Some(modified_at)) =
            (headers.get(IF_MODIFIED_SINCE), self.modified_at)
            && let Ok(value) = if_modified_since.to_str()
            && let Ok(since) = parse_http_date(value)
        {
            // http dates drop sub-second precision
            let modified_secs = modified_at
                .duration_since(UNIX_EPOCH)
                .map(|duration| duration.as_secs())
                .unwrap_or_default();
            let since_secs = since
                .duration_since(UNIX_EPOCH)
                .map(|duration| duration.as_secs())
                .unwrap_or_default();
            return modified_secs <= since_secs;
        }

        false
    }
}

fn build_etag(size: u64, modified_at: Option<SystemTime>) -> Option<HeaderValue> {
    let suffix = match modified_at {
        Some(modified) => modified
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_nanos().to_string())
            .unwrap_or_else(|_| "0".to_string()),
        None => "0".to_string(),
    };
    HeaderValue::from_str(&format!("W/\"{size}-{suffix}\"")).ok()
}

async fn serve_output(
    state: &AppState,
    headers: &HeaderMap,
    disposition: Option<&str>,
) -> Result<Response, GreetingError> {
    let path = state.output_path.as_path();
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => metadata,
        Ok(_) => return Err(GreetingError::NotFound(path.display().to_string())),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(GreetingError::NotFound(path.display().to_string()));
        }
        Err(err) => return Err(err.into()),
    };

    let validators = OutputValidators::from_metadata(&metadata);
    if validators.matches(headers) {
        return validators
            .apply(Response::builder().status(StatusCode::NOT_MODIFIED))
            .body(Body::empty())
            .map_err(GreetingError::from);
    }

    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(GreetingError::NotFound(path.display().to_string()));
        }
        Err(err) => return Err(err.into()),
    };
    let mut builder = validators
        .apply(Response::builder())
        .header(CONTENT_TYPE, OUTPUT_MIME_TYPE);
    if let Some(disposition) = disposition {
        builder = builder.header(CONTENT_DISPOSITION, disposition);
    }
    builder.body(Body::from(bytes)).map_err(GreetingError::from)
}

/// The latest render, for the preview on the form.
pub(crate) async fn output_image_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, GreetingError> {
    serve_output(&state, &headers, None).await
}

/// The latest render as `greeting_image.png`.
pub(crate) async fn download_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, GreetingError> {
    let disposition = attachment_disposition();
    serve_output(&state, &headers, Some(&disposition)).await
}

fn attachment_disposition() -> String {
    format!("attachment; filename=\"{DOWNLOAD_FILE_NAME}\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn validators(modified_secs: u64) -> OutputValidators {
        let modified_at = UNIX_EPOCH + Duration::from_secs(modified_secs);
        OutputValidators {
            etag: build_etag(10, Some(modified_at)),
            last_modified: HeaderValue::from_str(&fmt_http_date(modified_at)).ok(),
            modified_at: Some(modified_at),
        }
    }

    #[test]
    fn disposition_names_download_file() {
        assert_eq!(
            attachment_disposition(),
            "attachment; filename=\"greeting_image.png\""
        );
    }

    #[test]
    fn etag_match_is_not_modified() {
        let validators = validators(1_700_000_000);
        let etag = validators.etag.clone().expect("etag");
        let mut headers = HeaderMap::new();
        headers.insert(IF_NONE_MATCH, etag);
        assert!(validators.matches(&headers));

        let mut headers = HeaderMap::new();
        headers.insert(IF_NONE_MATCH, HeaderValue::from_static("W/\"other\""));
        assert!(!validators.matches(&headers));
    }

    #[test]
    fn newer_file_is_modified() {
        let validators = validators(1_700_000_000);
        let mut headers = HeaderMap::new();
        let earlier = fmt_http_date(UNIX_EPOCH + Duration::from_secs(1_600_000_000));
        headers.insert(
            IF_MODIFIED_SINCE,
            HeaderValue::from_str(&earlier).expect("header"),
        );
        assert!(!validators.matches(&headers));

        let same = fmt_http_date(UNIX_EPOCH + Duration::from_secs(1_700_000_000));
        headers.insert(IF_MODIFIED_SINCE, HeaderValue::from_str(&same).expect("header"));
        assert!(validators.matches(&headers));
    }
}

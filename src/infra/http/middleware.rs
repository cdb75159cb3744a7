use std::{path::PathBuf, time::Instant};

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Wire form a page was served in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    Document,
    Data,
}

impl Representation {
    pub fn as_str(self) -> &'static str {
        match self {
            Representation::Document => "document",
            Representation::Data => "data",
        }
    }
}

/// Attached by the page handler so the response log can name what was served.
#[derive(Debug, Clone)]
pub struct ServedPage {
    pub representation: Representation,
    /// `None` when the built-in error page was used.
    pub resource: Option<PathBuf>,
}

impl ServedPage {
    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// Tag the response with a request id and log it.
///
/// Successful pages are logged at debug level. 4xx/5xx responses are logged
/// with the `ErrorReport` the handler attached.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started_at = Instant::now();

    let mut response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started_at.elapsed().as_millis();

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let served = response.extensions_mut().remove::<ServedPage>();
    let representation = served
        .as_ref()
        .map_or("none", |served| served.representation.as_str());
    let resource = served
        .and_then(|served| served.resource)
        .map(|dir| dir.display().to_string())
        .unwrap_or_default();

    if !(status.is_client_error() || status.is_server_error()) {
        debug!(
            target = "quire::http::response",
            status = status.as_u16(),
            path = %uri.path(),
            representation,
            resource = %resource,
            elapsed_ms,
            request_id = %request_id,
            "page served"
        );
        return response;
    }

    let (source, chain) = match response.extensions_mut().remove::<ErrorReport>() {
        Some(report) => (report.source, report.messages),
        None => ("unknown", Vec::new()),
    };
    let detail = chain
        .first()
        .cloned()
        .unwrap_or_else(|| "no diagnostic available".to_string());

    if status.is_server_error() {
        error!(
            target = "quire::http::response",
            status = status.as_u16(),
            method = %method,
            path = %uri.path(),
            query = uri.query().unwrap_or(""),
            representation,
            resource = %resource,
            elapsed_ms,
            source,
            detail = %detail,
            chain = ?chain,
            request_id = %request_id,
            "page request failed"
        );
    } else {
        warn!(
            target = "quire::http::response",
            status = status.as_u16(),
            method = %method,
            path = %uri.path(),
            query = uri.query().unwrap_or(""),
            representation,
            resource = %resource,
            elapsed_ms,
            source,
            detail = %detail,
            request_id = %request_id,
            "page request rejected"
        );
    }

    response
}

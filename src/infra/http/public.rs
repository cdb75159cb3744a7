use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::Request,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use quire_api_types::{CSR_MARKER, CSR_MARKER_VALUE};
use url::form_urlencoded;

use crate::application::page::{PageService, ResolvedPage};
use crate::presentation::views::render_document_response;

use super::middleware::{Representation, ServedPage, log_responses};

#[derive(Clone)]
pub struct HttpState {
    pub pages: Arc<PageService>,
}

impl HttpState {
    pub fn new(pages: Arc<PageService>) -> Self {
        Self { pages }
    }
}

/// Every GET path is a content path; there are no other routes.
pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .fallback(get(serve_page))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
}

async fn serve_page(State(state): State<HttpState>, request: Request<Body>) -> Response {
    let path = request.uri().path();
    let (wants_json, query) = split_marker(request.uri().query().unwrap_or(""));

    let ResolvedPage {
        status,
        page,
        resource,
        report,
    } = state.pages.resolve(path, &query).await;

    let representation = if wants_json {
        Representation::Data
    } else {
        Representation::Document
    };

    let mut response = match representation {
        Representation::Data => {
            let mut response = (status, Json(page.into_data())).into_response();
            if let Some(report) = report {
                report.attach(&mut response);
            }
            response
        }
        Representation::Document => render_document_response(&page, status, report),
    };

    ServedPage {
        representation,
        resource,
    }
    .attach(&mut response);
    response
}

/// Remove every `csr` pair from `query`.
///
/// Pairs are matched on their decoded name. The JSON form is requested when the
/// last marker decodes to `true`. The remaining pairs are kept exactly as sent,
/// since producers and cache keys see the raw query, so both representations
/// share one artifact.
pub fn split_marker(query: &str) -> (bool, String) {
    let mut wants_json = false;
    let mut kept = Vec::new();

    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        match form_urlencoded::parse(pair.as_bytes()).next() {
            Some((name, value)) if name == CSR_MARKER => {
                wants_json = value == CSR_MARKER_VALUE;
            }
            _ => kept.push(pair),
        }
    }

    (wants_json, kept.join("&"))
}

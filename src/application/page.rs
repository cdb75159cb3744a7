use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use axum::http::StatusCode;
use thiserror::Error;
use tracing::warn;

use crate::application::{
    assemble::PageAssembler,
    error::ErrorReport,
    locate::ResourceLocator,
    produce::ProduceError,
};
use crate::cache::TemplateCache;
use crate::domain::{
    page::Page,
    resource::{Resource, ResourceSource},
};

const SOURCE: &str = "application::page::PageService";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no content resource for `{path}`")]
    NotFound { path: String },
    #[error("failed to produce page content")]
    Production(#[from] ProduceError),
}

impl ResolveError {
    pub fn status(&self) -> StatusCode {
        match self {
            ResolveError::NotFound { .. } => StatusCode::NOT_FOUND,
            ResolveError::Production(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A page ready to be serialized, with the status it must be served under.
#[derive(Debug, Clone)]
pub struct ResolvedPage {
    pub status: StatusCode,
    pub page: Page,
    /// Directory of the resource that produced `page`; `None` for the
    /// built-in error page.
    pub resource: Option<PathBuf>,
    /// Why the request failed, when it did.
    pub report: Option<ErrorReport>,
}

/// Resolves request paths to pages, routing failures to error pages.
pub struct PageService {
    locator: ResourceLocator,
    assembler: PageAssembler,
    cache: Arc<TemplateCache>,
}

impl PageService {
    pub fn new(locator: ResourceLocator, assembler: PageAssembler, cache: Arc<TemplateCache>) -> Self {
        Self {
            locator,
            assembler,
            cache,
        }
    }

    /// Resolve `request_path`; never fails.
    ///
    /// A missing resource yields the 404 page and a failing producer the 500
    /// page, both resolved through the same pipeline.
    pub async fn resolve(&self, request_path: &str, query: &str) -> ResolvedPage {
        match self.page(request_path, query).await {
            Ok((page, dir)) => ResolvedPage {
                status: StatusCode::OK,
                page,
                resource: Some(dir),
                report: None,
            },
            Err(err) => {
                let status = err.status();
                let report = ErrorReport::from_error(SOURCE, &err);
                let (page, resource) = self.error_page(status, query).await;
                ResolvedPage {
                    status,
                    page,
                    resource,
                    report: Some(report),
                }
            }
        }
    }

    async fn page(&self, request_path: &str, query: &str) -> Result<(Page, PathBuf), ResolveError> {
        let resource = self
            .locator
            .locate_page(request_path)
            .await
            .ok_or_else(|| ResolveError::NotFound {
                path: request_path.to_string(),
            })?;

        let page = self.render(&resource, query).await?;
        Ok((page, resource.dir().to_path_buf()))
    }

    /// The site's page for `status`, or a minimal built-in page when the
    /// site has none or it cannot be rendered.
    async fn error_page(&self, status: StatusCode, query: &str) -> (Page, Option<PathBuf>) {
        let Some(resource) = self.locator.locate_error(status).await else {
            return (fallback_error_page(status), None);
        };

        match self.render(&resource, query).await {
            Ok(page) => (page, Some(resource.dir().to_path_buf())),
            Err(err) => {
                warn!(
                    target = "application::page",
                    op = "page::error_page",
                    result = "fallback",
                    status = status.as_u16(),
                    resource = %resource.dir().display(),
                    error = %err,
                    "Error page could not be rendered; using built-in page"
                );
                (fallback_error_page(status), None)
            }
        }
    }

    async fn render(&self, resource: &Resource, query: &str) -> Result<Page, ProduceError> {
        match resource.source() {
            ResourceSource::Static(path) => {
                let raw = read_static(path).await?;
                Ok(self.assembler.assemble(resource.dir(), &raw).await)
            }
            ResourceSource::Template(script) => {
                self.cache
                    .get_or_compute(resource.dir(), script, query)
                    .await
            }
        }
    }
}

/// Static pages are served byte for byte; invalid UTF-8 is replaced, not rejected.
async fn read_static(path: &Path) -> Result<String, ProduceError> {
    let bytes = tokio::fs::read(path).await.map_err(ProduceError::Read)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    })
}

pub fn fallback_error_page(status: StatusCode) -> Page {
    Page::new(
        format!(
            "<p style='text-align:center;'>Error {}</p>",
            status.as_u16()
        ),
        None,
    )
}

#[cfg(all(test, unix))]
mod tests {
    use std::{fs, path::Path, time::Duration};

    use tempfile::TempDir;

    use super::*;
    use crate::application::produce::ScriptProducer;
    use crate::cache::{CacheConfig, ManualClock};

    fn service(root: &Path) -> PageService {
        let assembler = PageAssembler::new();
        let cache = TemplateCache::new(
            CacheConfig::default(),
            Arc::new(ManualClock::new(1_000)),
            assembler,
            Arc::new(ScriptProducer::new("sh", Duration::from_secs(5))),
        );
        PageService::new(
            ResourceLocator::new(root.join("webpages"), root.join("errors"), "template.sh"),
            assembler,
            Arc::new(cache),
        )
    }

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, contents).expect("write");
    }

    #[tokio::test]
    async fn static_page_resolves_with_settings() {
        let root = TempDir::new().expect("temp dir");
        write(root.path(), "webpages/page.html", "title: Home\n=====\n<h1>Hi</h1>");

        let resolved = service(root.path()).resolve("/", "").await;
        assert_eq!(resolved.status, StatusCode::OK);
        assert_eq!(resolved.page.content(), "<h1>Hi</h1>");
        assert!(resolved.report.is_none());
        assert_eq!(resolved.resource, Some(root.path().join("webpages")));
    }

    #[tokio::test]
    async fn invalid_utf8_static_page_is_served_lossily() {
        let root = TempDir::new().expect("temp dir");
        let dir = root.path().join("webpages/latin1");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("page.html"), b"title: Caf\xe9\n=====\n<p>na\xefve</p>").expect("write");

        let resolved = service(root.path()).resolve("/latin1", "").await;
        assert_eq!(resolved.status, StatusCode::OK);
        assert_eq!(resolved.page.content(), "<p>na\u{fffd}ve</p>");
        assert_eq!(
            resolved.page.settings().and_then(|s| s.text("title")),
            Some("Caf\u{fffd}")
        );
    }

    #[tokio::test]
    async fn missing_page_uses_site_not_found_page() {
        let root = TempDir::new().expect("temp dir");
        write(root.path(), "errors/404/page.html", "title: Lost\n=====\n<p>gone</p>");

        let resolved = service(root.path()).resolve("/nowhere", "").await;
        assert_eq!(resolved.status, StatusCode::NOT_FOUND);
        assert_eq!(resolved.page.content(), "<p>gone</p>");
        assert_eq!(resolved.resource, Some(root.path().join("errors/404")));
        let report = resolved.report.expect("report");
        assert_eq!(report.messages, vec!["no content resource for `/nowhere`"]);
    }

    #[tokio::test]
    async fn missing_error_page_falls_back_to_builtin() {
        let root = TempDir::new().expect("temp dir");
        let resolved = service(root.path()).resolve("/nowhere", "").await;
        assert_eq!(resolved.status, StatusCode::NOT_FOUND);
        assert_eq!(
            resolved.page.content(),
            "<p style='text-align:center;'>Error 404</p>"
        );
        assert!(resolved.page.settings().is_none());
        assert_eq!(resolved.resource, None);
    }

    #[tokio::test]
    async fn failing_template_maps_to_500_page() {
        let root = TempDir::new().expect("temp dir");
        write(root.path(), "webpages/broken/template.sh", "exit 1\n");
        write(root.path(), "errors/500/page.html", "<p>oops</p>");

        let resolved = service(root.path()).resolve("/broken", "").await;
        assert_eq!(resolved.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resolved.page.content(), "<p>oops</p>");
    }

    #[tokio::test]
    async fn failing_error_template_falls_back_to_builtin() {
        let root = TempDir::new().expect("temp dir");
        write(root.path(), "webpages/broken/template.sh", "exit 1\n");
        write(root.path(), "errors/500/template.sh", "exit 1\n");

        let resolved = service(root.path()).resolve("/broken", "").await;
        assert_eq!(resolved.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            resolved.page.content(),
            "<p style='text-align:center;'>Error 500</p>"
        );
    }

    #[tokio::test]
    async fn template_receives_the_query() {
        let root = TempDir::new().expect("temp dir");
        write(
            root.path(),
            "webpages/search/template.sh",
            "echo 'title: Search'\necho '====='\nprintf '%s' \"$QUERY_STRING\"\n",
        );

        let resolved = service(root.path()).resolve("/search", "q=rust").await;
        assert_eq!(resolved.status, StatusCode::OK);
        assert_eq!(resolved.page.content(), "q=rust");
    }
}

use std::path::{Path, PathBuf};

use axum::http::StatusCode;

use crate::domain::resource::{Resource, ResourceSource, STATIC_PAGE_FILE, content_dir};

/// Finds the content resource behind a request path or an error status.
#[derive(Debug, Clone)]
pub struct ResourceLocator {
    webpages_dir: PathBuf,
    errors_dir: PathBuf,
    script_name: String,
}

impl ResourceLocator {
    pub fn new(
        webpages_dir: impl Into<PathBuf>,
        errors_dir: impl Into<PathBuf>,
        script_name: impl Into<String>,
    ) -> Self {
        Self {
            webpages_dir: webpages_dir.into(),
            errors_dir: errors_dir.into(),
            script_name: script_name.into(),
        }
    }

    pub async fn locate_page(&self, request_path: &str) -> Option<Resource> {
        let dir = content_dir(&self.webpages_dir, request_path)?;
        self.resource_in(dir).await
    }

    /// Error pages live under `<errors_dir>/<status code>/`.
    pub async fn locate_error(&self, status: StatusCode) -> Option<Resource> {
        let dir = self.errors_dir.join(status.as_u16().to_string());
        self.resource_in(dir).await
    }

    // A template takes precedence over a static page in the same directory.
    async fn resource_in(&self, dir: PathBuf) -> Option<Resource> {
        let script = dir.join(&self.script_name);
        if is_file(&script).await {
            return Some(Resource::new(dir, ResourceSource::Template(script)));
        }

        let page = dir.join(STATIC_PAGE_FILE);
        if is_file(&page).await {
            return Some(Resource::new(dir, ResourceSource::Static(page)));
        }

        None
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|metadata| metadata.is_file())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn site() -> (TempDir, ResourceLocator) {
        let root = TempDir::new().expect("temp dir");
        let locator = ResourceLocator::new(
            root.path().join("webpages"),
            root.path().join("errors"),
            "template.sh",
        );
        (root, locator)
    }

    #[tokio::test]
    async fn finds_static_pages() {
        let (root, locator) = site();
        let dir = root.path().join("webpages/about");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("page.html"), "<p>about</p>").expect("write page");

        let resource = locator.locate_page("/about").await.expect("resource");
        assert_eq!(resource.dir(), dir.as_path());
        assert_eq!(
            resource.source(),
            &ResourceSource::Static(dir.join("page.html"))
        );
    }

    #[tokio::test]
    async fn template_wins_over_static_page() {
        let (root, locator) = site();
        let dir = root.path().join("webpages/events");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("page.html"), "static").expect("write page");
        fs::write(dir.join("template.sh"), "echo dynamic").expect("write template");

        let resource = locator.locate_page("/events/").await.expect("resource");
        assert!(resource.is_template());
    }

    #[tokio::test]
    async fn missing_or_escaping_paths_resolve_to_nothing() {
        let (root, locator) = site();
        fs::create_dir_all(root.path().join("webpages/empty")).expect("mkdir");
        fs::write(root.path().join("page.html"), "outside").expect("write outside");

        assert!(locator.locate_page("/empty").await.is_none());
        assert!(locator.locate_page("/nope").await.is_none());
        assert!(locator.locate_page("/..").await.is_none());
    }

    #[tokio::test]
    async fn error_pages_are_keyed_by_status() {
        let (root, locator) = site();
        let dir = root.path().join("errors/404");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("page.html"), "missing").expect("write page");

        assert!(locator.locate_error(StatusCode::NOT_FOUND).await.is_some());
        assert!(
            locator
                .locate_error(StatusCode::INTERNAL_SERVER_ERROR)
                .await
                .is_none()
        );
    }
}

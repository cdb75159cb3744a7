use std::{io::ErrorKind, path::Path};

use tracing::warn;

use crate::domain::{
    page::Page,
    resource::STYLES_FILE,
    settings::parse_content,
};

/// Builds [`Page`] values from raw content and the resource directory's
/// optional `styles.css`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageAssembler;

impl PageAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Parse `raw_content` and prepend the directory's styles, if any.
    ///
    /// A stylesheet that exists but cannot be read is skipped with a warning;
    /// assembly itself never fails.
    pub async fn assemble(&self, resource_dir: &Path, raw_content: &str) -> Page {
        let parsed = parse_content(raw_content);
        let styles = read_styles(resource_dir).await;

        let content = match styles {
            Some(css) => wrap_styles(&css, parsed.body),
            None => parsed.body.to_string(),
        };

        Page::new(content, parsed.settings)
    }
}

pub fn wrap_styles(css: &str, body: &str) -> String {
    format!("<style>\n\n{css}\n</style>\n\n{body}")
}

async fn read_styles(resource_dir: &Path) -> Option<String> {
    let path = resource_dir.join(STYLES_FILE);
    match tokio::fs::read_to_string(&path).await {
        Ok(css) => Some(css),
        Err(err) if err.kind() == ErrorKind::NotFound => None,
        Err(err) => {
            warn!(
                target = "application::assemble",
                op = "assemble::read_styles",
                result = "skipped",
                path = %path.display(),
                error = %err,
                "Failed to read page stylesheet; rendering without it"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn body_passes_through_without_styles() {
        let dir = TempDir::new().expect("temp dir");
        let page = PageAssembler::new()
            .assemble(dir.path(), "<p>plain</p>")
            .await;
        assert_eq!(page.content(), "<p>plain</p>");
        assert!(page.settings().is_none());
    }

    #[tokio::test]
    async fn sibling_styles_are_prepended() {
        let dir = TempDir::new().expect("temp dir");
        fs::write(dir.path().join(STYLES_FILE), "p { color: red; }").expect("write styles");

        let page = PageAssembler::new()
            .assemble(dir.path(), "title: Styled\n====\n<p>x</p>")
            .await;

        assert_eq!(
            page.content(),
            "<style>\n\np { color: red; }\n</style>\n\n<p>x</p>"
        );
        assert_eq!(
            page.settings().and_then(|s| s.text("title")),
            Some("Styled")
        );
    }

    #[tokio::test]
    async fn settings_only_page_still_gets_styles() {
        let dir = TempDir::new().expect("temp dir");
        fs::write(dir.path().join(STYLES_FILE), "").expect("write styles");

        let page = PageAssembler::new()
            .assemble(dir.path(), "title: Empty\n=====")
            .await;

        assert_eq!(page.content(), "<style>\n\n\n</style>\n\n");
    }
}

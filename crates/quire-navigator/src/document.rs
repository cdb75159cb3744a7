//! The page surface the navigator drives.

use lol_html::{
    RewriteStrSettings, element, errors::RewritingError, html_content::ContentType, rewrite_str,
    text,
};
use quire_api_types::{PageData, SettingValue, SettingsMap};
use thiserror::Error;
use tracing::warn;
use url::Url;

const MAIN_START: &str = "<!--quire:main:start-->";
const MAIN_END: &str = "<!--quire:main:end-->";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to scan document: {0}")]
    Rewrite(#[from] RewritingError),
    #[error("document has no <main> region")]
    MissingMain,
}

/// Head metadata the navigator keeps in sync with the displayed page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    pub favicon: String,
}

impl PageMetadata {
    /// Unset or flag-valued settings become empty strings.
    pub fn from_data(data: &PageData) -> Self {
        let text = |key: &str| data.setting_text(key).unwrap_or_default().to_string();
        Self {
            title: text("title"),
            description: text("description"),
            favicon: text("favicon"),
        }
    }

    pub fn to_settings(&self) -> SettingsMap {
        [
            ("title", &self.title),
            ("description", &self.description),
            ("favicon", &self.favicon),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), SettingValue::Text(value.clone())))
        .collect()
    }
}

/// An anchor as written in the markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub target: Option<String>,
}

/// Operations the navigator needs from the page it manages.
pub trait Document {
    /// Address of the page currently displayed.
    fn location(&self) -> &Url;
    fn main_html(&self) -> &str;
    fn metadata(&self) -> PageMetadata;
    /// Every anchor in the document, chrome and main region alike.
    fn links(&self) -> Vec<Link>;
    fn replace_main(&mut self, html: &str);
    fn apply_metadata(&mut self, metadata: &PageMetadata);
    fn push_history(&mut self, url: &Url, title: &str);
    /// Leave the page with an ordinary, non-intercepted navigation.
    fn navigate_fully(&mut self, url: &Url);
    /// Announce that new content is in place.
    fn dispatch_load(&mut self);
}

/// In-memory document built from server HTML.
#[derive(Debug, Clone)]
pub struct HeadlessDocument {
    location: Url,
    metadata: PageMetadata,
    main_html: String,
    chrome_links: Vec<Link>,
    main_links: Vec<Link>,
    history: Vec<Url>,
    full_navigations: Vec<Url>,
    load_events: usize,
}

impl HeadlessDocument {
    pub fn parse(location: Url, html: &str) -> Result<Self, DocumentError> {
        let mut title = String::new();
        let mut description = None;
        let mut favicon = None;

        let marked = rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: vec![
                    text!("head > title", |chunk| {
                        title.push_str(chunk.as_str());
                        Ok(())
                    }),
                    element!(r#"meta[name="description"]"#, |el| {
                        if description.is_none() {
                            description = el.get_attribute("content");
                        }
                        Ok(())
                    }),
                    element!(r#"link[rel~="icon"]"#, |el| {
                        if favicon.is_none() {
                            favicon = el.get_attribute("href");
                        }
                        Ok(())
                    }),
                    element!("main", |el| {
                        el.prepend(MAIN_START, ContentType::Html);
                        el.append(MAIN_END, ContentType::Html);
                        Ok(())
                    }),
                ],
                ..RewriteStrSettings::default()
            },
        )?;

        let (before, rest) = marked.split_once(MAIN_START).ok_or(DocumentError::MissingMain)?;
        let (main_html, after) = rest.split_once(MAIN_END).ok_or(DocumentError::MissingMain)?;

        let chrome_links = links_in(&format!("{before}{after}"))?;
        let main_links = links_in(main_html)?;

        Ok(Self {
            location,
            metadata: PageMetadata {
                title: title.trim().to_string(),
                description: description.unwrap_or_default(),
                favicon: favicon.unwrap_or_default(),
            },
            main_html: main_html.to_string(),
            chrome_links,
            main_links,
            history: Vec::new(),
            full_navigations: Vec::new(),
            load_events: 0,
        })
    }

    pub fn history(&self) -> &[Url] {
        &self.history
    }

    /// Pops the current history entry and returns the one now displayed, the
    /// way a browser moves before it reports the back navigation.
    pub fn go_back(&mut self) -> Option<Url> {
        if self.history.len() < 2 {
            return None;
        }
        self.history.pop();
        let previous = self.history.last()?.clone();
        self.location = previous.clone();
        Some(previous)
    }

    pub fn full_navigations(&self) -> &[Url] {
        &self.full_navigations
    }

    pub fn load_events(&self) -> usize {
        self.load_events
    }
}

impl Document for HeadlessDocument {
    fn location(&self) -> &Url {
        &self.location
    }

    fn main_html(&self) -> &str {
        &self.main_html
    }

    fn metadata(&self) -> PageMetadata {
        self.metadata.clone()
    }

    fn links(&self) -> Vec<Link> {
        self.chrome_links
            .iter()
            .chain(self.main_links.iter())
            .cloned()
            .collect()
    }

    fn replace_main(&mut self, html: &str) {
        self.main_html = html.to_string();
        self.main_links = links_in(html).unwrap_or_else(|err| {
            warn!(
                target = "quire_navigator::document",
                error = %err,
                "Could not scan swapped content for links"
            );
            Vec::new()
        });
    }

    fn apply_metadata(&mut self, metadata: &PageMetadata) {
        self.metadata = metadata.clone();
    }

    fn push_history(&mut self, url: &Url, _title: &str) {
        self.history.push(url.clone());
        self.location = url.clone();
    }

    fn navigate_fully(&mut self, url: &Url) {
        self.full_navigations.push(url.clone());
        self.location = url.clone();
    }

    fn dispatch_load(&mut self) {
        self.load_events += 1;
    }
}

fn links_in(html: &str) -> Result<Vec<Link>, RewritingError> {
    let mut links = Vec::new();
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("a[href]", |el| {
                if let Some(href) = el.get_attribute("href") {
                    links.push(Link {
                        href,
                        target: el.get_attribute("target"),
                    });
                }
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )?;
    Ok(links)
}

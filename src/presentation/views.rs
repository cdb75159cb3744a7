use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::application::error::ErrorReport;
use crate::domain::page::{Page, PageProperty};

/// Setting that removes the site header from the document.
pub const HIDE_HEADING_KEY: &str = "hide_heading";
/// Setting that removes the site footer from the document.
pub const HIDE_FOOTER_KEY: &str = "hide_footer";

const RENDER_SOURCE: &str = "presentation::views::render_document_response";

/// The document shell failed to render; served as a plain 500.
#[derive(Debug, Error)]
#[error("failed to render page document")]
pub struct TemplateRenderError(#[from] AskamaError);

impl IntoResponse for TemplateRenderError {
    fn into_response(self) -> Response {
        let report = ErrorReport::from_error(RENDER_SOURCE, &self);
        let mut response =
            (StatusCode::INTERNAL_SERVER_ERROR, "Template rendering failed").into_response();
        report.attach(&mut response);
        response
    }
}

/// Full HTML document around a page. Head fragments and content are
/// inserted verbatim.
#[derive(Template)]
#[template(
    ext = "html",
    source = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
{% for fragment in head %}    {{ fragment|safe }}
{% endfor %}    <link rel="stylesheet" href="/resources/stylesheets/globals.css">
</head>
<body>
{% if show_heading %}    <header>
        <a class="top-logo" href="/">Home</a>
    </header>
{% endif %}    <main>
{{ content|safe }}
    </main>
{% if show_footer %}    <footer>
        <p class="text-center"><small>Served by quire</small></p>
    </footer>
{% endif %}</body>
</html>
"#
)]
pub struct DocumentTemplate<'a> {
    pub head: Vec<String>,
    pub content: &'a str,
    pub show_heading: bool,
    pub show_footer: bool,
}

impl<'a> DocumentTemplate<'a> {
    pub fn for_page(page: &'a Page) -> Self {
        let head = PageProperty::ALL
            .into_iter()
            .map(|property| page.property(property.name()))
            .filter(|fragment| !fragment.is_empty())
            .collect();

        Self {
            head,
            content: page.content(),
            show_heading: !page.has_setting(HIDE_HEADING_KEY),
            show_footer: !page.has_setting(HIDE_FOOTER_KEY),
        }
    }
}

/// Render `page` as a document served under `status`, carrying `report` for
/// the response logger.
pub fn render_document_response(
    page: &Page,
    status: StatusCode,
    report: Option<ErrorReport>,
) -> Response {
    let html = match DocumentTemplate::for_page(page).render() {
        Ok(html) => html,
        Err(err) => return TemplateRenderError::from(err).into_response(),
    };

    let mut response = (status, Html(html)).into_response();
    if let Some(report) = report {
        report.attach(&mut response);
    }
    response
}

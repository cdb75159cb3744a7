//! Presentation layer: the HTML document served around every page.

pub mod views;

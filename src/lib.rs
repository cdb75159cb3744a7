//! Quire: a flat-file site server.
//!
//! Requests map onto directories under the webpages tree. Each directory holds
//! a static `page.html` or a template script whose output is cached on disk
//! when it asks to be.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;

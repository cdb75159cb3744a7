use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use quire_api_types::{PageData, SettingValue, SettingsMap};
use quire_navigator::{
    Document, FetchError, HeadlessDocument, NavigationError, NavigationKind, NavigationOutcome,
    NavigationState, Navigator, NavigatorConfig, PageFetcher, PageSource,
};
use url::Url;

const HOME: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Home</title>
    <meta name='description' content='Front page'>
    <link rel='shortcut icon' type='image' href='/resources/favicon.png' />
</head>
<body>
    <header>
        <a href="/committee">Committee</a>
        <a href="/events">Events</a>
        <a target="_blank" href="/stash">Stash</a>
        <a href="https://elsewhere.test/">Elsewhere</a>
    </header>
    <main><h1>Welcome</h1></main>
</body>
</html>"#;

#[derive(Clone)]
enum Reply {
    Page(PageData),
    Status(u16),
    Delay(Duration, PageData),
    Never,
}

#[derive(Clone, Default)]
struct ScriptedFetcher {
    replies: HashMap<String, Reply>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedFetcher {
    fn reply(mut self, path: &str, reply: Reply) -> Self {
        self.replies.insert(path.to_string(), reply);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &Url) -> Result<PageData, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.replies.get(url.path()).cloned() {
            Some(Reply::Page(data)) => Ok(data),
            Some(Reply::Status(code)) => Err(FetchError::Status(code)),
            Some(Reply::Delay(delay, data)) => {
                tokio::time::sleep(delay).await;
                Ok(data)
            }
            Some(Reply::Never) => std::future::pending().await,
            None => Err(FetchError::Status(404)),
        }
    }
}

fn page(content: &str, title: Option<&str>) -> PageData {
    let settings = title.map(|title| {
        let mut settings = SettingsMap::new();
        settings.insert("title".to_string(), SettingValue::from(title));
        settings
    });
    PageData {
        content: content.to_string(),
        settings,
    }
}

fn site(path: &str) -> Url {
    Url::parse("https://site.test/")
        .and_then(|base| base.join(path))
        .expect("url")
}

fn navigator(fetcher: ScriptedFetcher) -> Navigator<ScriptedFetcher, HeadlessDocument> {
    let document = HeadlessDocument::parse(site("/"), HOME).expect("document");
    Navigator::new(NavigatorConfig::default(), fetcher, document)
}

#[tokio::test]
async fn construction_seeds_cache_and_history() {
    let navigator = navigator(ScriptedFetcher::default());

    assert!(navigator.cache().contains(site("/").as_str()));
    assert_eq!(navigator.document().history(), &[site("/")]);
    assert_eq!(navigator.state(), NavigationState::Idle);
    assert_eq!(
        navigator.intercepted_links(),
        &[site("/committee"), site("/events")]
    );
}

#[tokio::test]
async fn forward_navigation_swaps_content_and_metadata() {
    let fetcher = ScriptedFetcher::default().reply(
        "/committee",
        Reply::Page(page(r#"<h1>Committee</h1><a href="/join">Join</a>"#, Some("Committee"))),
    );
    let mut navigator = navigator(fetcher.clone());

    let outcome = navigator
        .follow_link("/committee", None)
        .await
        .expect("intercepted");

    assert!(matches!(
        outcome,
        NavigationOutcome::Completed {
            source: PageSource::Network,
            ..
        }
    ));
    assert_eq!(navigator.state(), NavigationState::Completed);
    let document = navigator.document();
    assert_eq!(document.main_html(), r#"<h1>Committee</h1><a href="/join">Join</a>"#);
    assert_eq!(document.metadata().title, "Committee");
    assert_eq!(document.metadata().description, "");
    assert_eq!(document.metadata().favicon, "");
    assert_eq!(document.history(), &[site("/"), site("/committee")]);
    assert_eq!(document.location(), &site("/committee"));
    assert_eq!(document.load_events(), 1);
    assert!(navigator.intercepted_links().contains(&site("/join")));
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn cached_navigation_makes_no_request() {
    let fetcher = ScriptedFetcher::default()
        .reply("/committee", Reply::Page(page("<h1>Committee</h1>", None)));
    let mut navigator = navigator(fetcher.clone());

    navigator.follow_link("/committee", None).await;
    let outcome = navigator
        .follow_link("/committee", None)
        .await
        .expect("intercepted");
    let home = navigator.follow_link("/", None).await.expect("intercepted");

    assert!(matches!(
        outcome,
        NavigationOutcome::Completed {
            source: PageSource::Cache,
            ..
        }
    ));
    assert!(matches!(
        home,
        NavigationOutcome::Completed {
            source: PageSource::Cache,
            ..
        }
    ));
    assert_eq!(navigator.document().main_html(), "<h1>Welcome</h1>");
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn back_navigation_never_pushes_history() {
    let fetcher = ScriptedFetcher::default()
        .reply("/events", Reply::Page(page("<h1>Events</h1>", Some("Events"))));
    let mut navigator = navigator(fetcher.clone());

    navigator.follow_link("/events", None).await;
    let previous = navigator.document_mut().go_back().expect("history entry");
    let outcome = navigator.back(&previous).await;

    assert!(outcome.is_completed());
    assert_eq!(navigator.document().history(), &[site("/")]);
    assert_eq!(navigator.document().metadata().title, "Home");
    assert_eq!(navigator.document().main_html(), "<h1>Welcome</h1>");
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn blank_and_foreign_links_are_not_intercepted() {
    let mut navigator = navigator(ScriptedFetcher::default());

    assert!(navigator.follow_link("/stash", Some("_blank")).await.is_none());
    assert!(navigator.follow_link("https://elsewhere.test/", None).await.is_none());
    assert_eq!(navigator.state(), NavigationState::Idle);
}

#[tokio::test]
async fn fetch_failure_falls_back_to_full_load() {
    let fetcher = ScriptedFetcher::default().reply("/broken", Reply::Status(500));
    let mut navigator = navigator(fetcher);

    let outcome = navigator.navigate(&site("/broken"), NavigationKind::Forward).await;

    assert!(matches!(
        outcome,
        NavigationOutcome::Fallback {
            reason: NavigationError::Fetch(FetchError::Status(500)),
            ..
        }
    ));
    assert_eq!(navigator.state(), NavigationState::Fallback);
    assert_eq!(navigator.document().full_navigations(), &[site("/broken")]);
    assert!(!navigator.cache().contains(site("/broken").as_str()));
    assert_eq!(navigator.document().history(), &[site("/")]);
}

#[tokio::test(start_paused = true)]
async fn unresolved_fetch_falls_back_at_the_deadline() {
    let fetcher = ScriptedFetcher::default().reply("/slow", Reply::Never);
    let mut navigator = navigator(fetcher);
    let started = tokio::time::Instant::now();

    let outcome = navigator.navigate(&site("/slow"), NavigationKind::Forward).await;

    assert!(started.elapsed() >= Duration::from_millis(5_000));
    assert!(matches!(
        outcome,
        NavigationOutcome::Fallback {
            reason: NavigationError::Timeout(_),
            ..
        }
    ));
    assert_eq!(navigator.document().full_navigations(), &[site("/slow")]);
    assert_eq!(navigator.document().main_html(), "<h1>Welcome</h1>");
}

#[tokio::test(start_paused = true)]
async fn load_inside_the_deadline_cancels_it() {
    let fetcher = ScriptedFetcher::default().reply(
        "/events",
        Reply::Delay(Duration::from_millis(4_900), page("<h1>Events</h1>", None)),
    );
    let mut navigator = navigator(fetcher);

    let outcome = navigator.navigate(&site("/events"), NavigationKind::Forward).await;
    assert!(outcome.is_completed());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(navigator.state(), NavigationState::Completed);
    assert!(navigator.document().full_navigations().is_empty());
}

#[tokio::test]
async fn cache_keeps_the_most_recent_pages() {
    let mut fetcher = ScriptedFetcher::default();
    for path in ["/a", "/b", "/c"] {
        fetcher = fetcher.reply(path, Reply::Page(page(path, None)));
    }
    let config = NavigatorConfig {
        max_cache_size: 2,
        ..NavigatorConfig::default()
    };
    let document = HeadlessDocument::parse(site("/"), HOME).expect("document");
    let mut navigator = Navigator::new(config, fetcher.clone(), document);

    for path in ["/a", "/b", "/c"] {
        navigator.navigate(&site(path), NavigationKind::Forward).await;
    }

    assert_eq!(
        navigator.cache().urls(),
        vec![site("/c").as_str(), site("/b").as_str()]
    );
    // The seeded home page was evicted, so returning to it needs a fetch.
    navigator.navigate(&site("/"), NavigationKind::Forward).await;
    assert_eq!(fetcher.calls(), 4);
}

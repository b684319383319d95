//! Paginated scraping tests against a mock server

use super::{fast_options, test_scraper};
use sumi_scraper::config::parse_config;
use sumi_scraper::{FetchOptions, PaginationConfig, ScrapeError, Scraper, StreamItem};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts an HTML page at `route`
async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn fragments(items: &[StreamItem]) -> Vec<&str> {
    items
        .iter()
        .filter_map(|item| item.as_ref().ok())
        .map(String::as_str)
        .collect()
}

#[tokio::test]
async fn test_sequential_pagination_follows_next_link() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        r#"<html><body>
            <div class="item">Page 1 Item</div>
            <a class="next" href="/page2">Next</a>
        </body></html>"#
            .to_string(),
    )
    .await;
    mount_page(
        &mock_server,
        "/page2",
        r#"<html><body>
            <div class="item">Page 2 Item</div>
        </body></html>"#
            .to_string(),
    )
    .await;

    let scraper = test_scraper(fast_options());
    let stream = scraper
        .scrape_paginated(
            &format!("{}/", mock_server.uri()),
            "div.item",
            &PaginationConfig::next_page("a.next[href]"),
        )
        .expect("Invalid pagination config");
    let items = stream.collect_all().await;

    assert_eq!(
        fragments(&items),
        vec![
            r#"<div class="item">Page 1 Item</div>"#,
            r#"<div class="item">Page 2 Item</div>"#,
        ]
    );

    let requests = mock_server.received_requests().await.unwrap();
    let paths: Vec<&str> = requests.iter().map(|r| r.url.path()).collect();
    assert_eq!(paths, vec!["/", "/page2"]);
}

#[tokio::test]
async fn test_sequential_pagination_without_next_link() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        r#"<div class="item">Only Item</div>"#.to_string(),
    )
    .await;

    let scraper = test_scraper(fast_options());
    let stream = scraper
        .scrape_paginated(
            &format!("{}/", mock_server.uri()),
            "div.item",
            &PaginationConfig::next_page("a.next[href]"),
        )
        .expect("Invalid pagination config");
    let items = stream.collect_all().await;

    assert_eq!(items.len(), 1);
    assert_eq!(
        fragments(&items),
        vec![r#"<div class="item">Only Item</div>"#]
    );
}

#[tokio::test]
async fn test_sequential_pagination_reports_failed_page() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        r#"<div class="item">First</div><a class="next" href="/gone">Next</a>"#.to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&mock_server)
        .await;

    let scraper = test_scraper(fast_options());
    let items = scraper
        .scrape_paginated(
            &format!("{}/", mock_server.uri()),
            "div.item",
            &PaginationConfig::next_page("a.next[href]"),
        )
        .expect("Invalid pagination config")
        .collect_all()
        .await;

    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    let err = items[1].as_ref().unwrap_err();
    assert!(matches!(err, ScrapeError::Visit { .. }));
    assert!(err.to_string().contains("/gone"));
}

#[tokio::test]
async fn test_counted_pagination_fetches_all_pages() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        r#"<div class="item">Page 1 Item</div><span class="total-pages">3</span>"#.to_string(),
    )
    .await;
    for page in 2..=3 {
        mount_page(
            &mock_server,
            &format!("/page{page}"),
            format!(r#"<div class="item">Page {page} Item</div>"#),
        )
        .await;
    }

    let scraper = test_scraper(fast_options());
    let stream = scraper
        .scrape_paginated(
            &format!("{}/", mock_server.uri()),
            "div.item",
            &PaginationConfig::last_page("span.total-pages", "/page::page::"),
        )
        .expect("Invalid pagination config");
    let items = stream.collect_all().await;

    let mut found = fragments(&items);
    assert_eq!(found.len(), 3);
    assert_eq!(found[0], r#"<div class="item">Page 1 Item</div>"#);
    found.sort_unstable();
    assert_eq!(
        found,
        vec![
            r#"<div class="item">Page 1 Item</div>"#,
            r#"<div class="item">Page 2 Item</div>"#,
            r#"<div class="item">Page 3 Item</div>"#,
        ]
    );

    let requests = mock_server.received_requests().await.unwrap();
    let mut paths: Vec<String> = requests.iter().map(|r| r.url.path().to_string()).collect();
    paths.sort();
    assert_eq!(paths, vec!["/", "/page2", "/page3"]);
}

#[tokio::test]
async fn test_counted_pagination_bounded_and_inline() {
    for options in [
        FetchOptions {
            max_concurrent_pages: Some(2),
            ..fast_options()
        },
        FetchOptions {
            concurrent: false,
            ..fast_options()
        },
    ] {
        let mock_server = MockServer::start().await;

        mount_page(
            &mock_server,
            "/list",
            r#"<li>1</li><span class="last">6</span>"#.to_string(),
        )
        .await;
        for page in 2..=6 {
            mount_page(
                &mock_server,
                &format!("/list/{page}"),
                format!("<li>{page}</li>"),
            )
            .await;
        }

        let scraper = test_scraper(options.clone());
        let items = scraper
            .scrape_paginated(
                &format!("{}/list", mock_server.uri()),
                "li",
                &PaginationConfig::last_page("span.last", "/list/::page::"),
            )
            .expect("Invalid pagination config")
            .collect_all()
            .await;

        let found = fragments(&items);
        assert_eq!(found.len(), 6, "{:?}", options);
        if !options.concurrent {
            assert_eq!(
                found,
                vec!["<li>1</li>", "<li>2</li>", "<li>3</li>", "<li>4</li>", "<li>5</li>", "<li>6</li>"]
            );
        }
    }
}

#[tokio::test]
async fn test_counted_pagination_requires_url_pattern() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let scraper = test_scraper(fast_options());
    let config = PaginationConfig {
        last_page_selector: Some("span.total-pages".to_string()),
        ..PaginationConfig::default()
    };

    let err = scraper
        .scrape_paginated(&format!("{}/", mock_server.uri()), "div.item", &config)
        .unwrap_err();

    assert!(matches!(err, ScrapeError::Config(_)));
    assert!(err
        .to_string()
        .contains("next-page-url-pattern must be provided when using last-page-selector"));
}

#[tokio::test]
async fn test_pagination_from_config_file() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/quotes",
        r#"<q>one</q><a class="next" href="quotes-2">more</a>"#.to_string(),
    )
    .await;
    mount_page(&mock_server, "/quotes-2", "<q>two</q>".to_string()).await;

    let config = parse_config(
        r#"
[options]
user-agent = "TestBot/1.0"
max-retries = 2
initial-backoff-ms = 10
max-jitter-ms = 0

[pagination]
next-page-selector = "a.next[href]"
"#,
    )
    .expect("Failed to parse config");

    let scraper = Scraper::new(config.options).expect("Failed to create scraper");
    let items = scraper
        .scrape_paginated(
            &format!("{}/quotes", mock_server.uri()),
            "q",
            &config.pagination,
        )
        .expect("Invalid pagination config")
        .collect_all()
        .await;

    assert_eq!(fragments(&items), vec!["<q>one</q>", "<q>two</q>"]);
}

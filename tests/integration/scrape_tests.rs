//! Single-page fetch and retry tests

use super::{fast_options, test_scraper};
use std::time::{Duration, Instant};
use sumi_scraper::{FetchOptions, ScrapeError};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_scrape_html_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "TestBot/1.0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body>Hello</body></html>")
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let scraper = test_scraper(fast_options());
    let html = scraper
        .scrape_html(&format!("{}/", mock_server.uri()))
        .await
        .expect("Scrape failed");

    assert_eq!(html, "<html><body>Hello</body></html>");
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let scraper = test_scraper(fast_options());
    let err = scraper
        .scrape_html(&format!("{}/missing", mock_server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::Visit { .. }));
    assert!(err.to_string().contains("failed to visit"));
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn test_rate_limited_until_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&mock_server)
        .await;

    let scraper = test_scraper(FetchOptions {
        max_retries: 2,
        ..fast_options()
    });
    let url = format!("{}/busy", mock_server.uri());
    let err = scraper.scrape_html(&url).await.unwrap_err();

    assert!(matches!(err, ScrapeError::RetriesExhausted { attempts: 2, .. }));
    assert_eq!(
        err.to_string(),
        format!("failed to scrape {} after 2 attempts: rate limited", url)
    );
}

#[tokio::test]
async fn test_rate_limited_then_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>finally</p>"))
        .mount(&mock_server)
        .await;

    let scraper = test_scraper(fast_options());
    let started = Instant::now();
    let html = scraper
        .scrape_html(&format!("{}/", mock_server.uri()))
        .await
        .expect("Scrape failed");

    assert_eq!(html, "<p>finally</p>");
    // 10ms + 20ms of backoff before the third attempt
    assert!(started.elapsed() >= Duration::from_millis(30));

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_disallowed_domain_is_never_requested() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let scraper = test_scraper(FetchOptions {
        allowed_domains: vec!["example.com".to_string()],
        ..fast_options()
    });
    let err = scraper
        .scrape_html(&format!("{}/", mock_server.uri()))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("forbidden domain"));
}

#[tokio::test]
async fn test_scrape_outer_html_alternatives() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<ul>
                <li class="product">Widget</li>
                <li class="product sale">Gadget</li>
            </ul>
            <p class="note">Shipping is free</p>"#,
        ))
        .mount(&mock_server)
        .await;

    let scraper = test_scraper(fast_options());
    let elements = scraper
        .scrape_outer_html(
            &format!("{}/products", mock_server.uri()),
            "li.product || p.note",
        )
        .await
        .expect("Scrape failed");

    assert_eq!(
        elements,
        vec![
            r#"<li class="product">Widget</li>"#,
            r#"<li class="product sale">Gadget</li>"#,
            r#"<p class="note">Shipping is free</p>"#,
        ]
    );
}

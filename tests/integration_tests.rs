//! Integration tests for zbMATH Search
//!
//! These tests run the whole search pipeline against scripted transports
//! and a local HTTP server standing in for zbMATH.

use mockito::Matcher;
use std::sync::Arc;
use zbmath_search::config::Config;
use zbmath_search::models::Refinements;
use zbmath_search::parser::BiblatexParser;
use zbmath_search::search::{RecordingHost, Severity, ZentralSearch};
use zbmath_search::sources::{MockTransport, SourceError};

const SMITH_2001: &str = r#"@Article{Smith2001,
  Author = {Smith, John},
  Title = {Knot theory and its applications},
  Journal = {J. Knot Theory Ramifications},
  Year = {2001}
}"#;

fn listing(ids: &[&str]) -> String {
    let links: Vec<String> = ids
        .iter()
        .map(|id| {
            format!(
                r#"<tr><td><a href="?index_={}&amp;type_=html">Details</a> <a href="?index_={}&amp;type_=bib">BibTeX</a></td></tr>"#,
                id, id
            )
        })
        .collect();
    format!("<html><body><table>{}</table></body></html>", links.join("\n"))
}

fn article(key: &str, title: &str) -> String {
    format!("@article{{{}, author = {{Doe, Jane}}, title = {{{}}}, year = {{1999}}}}", key, title)
}

fn search_with(transport: &Arc<MockTransport>) -> ZentralSearch {
    ZentralSearch::with_transport(transport.clone(), Arc::new(BiblatexParser::new()))
}

/// S1: single record found and delivered
#[tokio::test]
async fn test_single_record_search() {
    let transport = Arc::new(
        MockTransport::new()
            .with_listing(r#"<a href="?index_=5123&amp;type_=bib">BibTeX</a>"#)
            .with_record("5123", SMITH_2001),
    );
    let host = RecordingHost::new();

    let ok = search_with(&transport)
        .search("knot theory", &Refinements::new(), &host, &host)
        .await;

    assert!(ok);
    let entries = host.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key, "Smith2001");
    assert_eq!(transport.bodies(), vec!["any=knot+theory"]);
    assert_eq!(transport.get_count(), 1);
}

/// S2: author refinement is encoded and both records are delivered
#[tokio::test]
async fn test_author_refinement_and_two_records() {
    let transport = Arc::new(
        MockTransport::new()
            .with_listing(listing(&["a", "b"]))
            .with_record("a", article("A1999", "First"))
            .with_record("b", article("B1999", "Second")),
    );
    let host = RecordingHost::new();

    let ok = search_with(&transport)
        .search("x", &Refinements::new().author("Gauß"), &host, &host)
        .await;

    assert!(ok);
    assert_eq!(host.entries().len(), 2);
    assert!(transport.bodies()[0].contains("any=x&au=Gau%C3%9F"));
    assert_eq!(host.progress(), vec![(1, 2), (2, 2)]);
}

/// S3: blank keyword never touches the network
#[tokio::test]
async fn test_blank_keyword() {
    for keyword in ["", "   ", "\t"] {
        let transport = Arc::new(MockTransport::new().with_listing(listing(&["a"])));
        let host = RecordingHost::new();

        let refinements = Refinements::new().author("Noether").title("Ideals");
        let ok = search_with(&transport)
            .search(keyword, &refinements, &host, &host)
            .await;

        assert!(!ok);
        assert_eq!(transport.request_count(), 0);
        assert_eq!(
            host.messages(),
            vec![(
                "Please select or enter keyword".to_string(),
                Severity::Info
            )]
        );
        assert!(host.entries().is_empty());
    }
}

/// S4: listing without record links issues no record requests
#[tokio::test]
async fn test_listing_without_results() {
    let transport = Arc::new(
        MockTransport::new().with_listing("<html><body>Your query produced no results.</body></html>"),
    );
    let host = RecordingHost::new();

    let ok = search_with(&transport)
        .search("foo", &Refinements::new(), &host, &host)
        .await;

    assert!(!ok);
    assert_eq!(transport.post_count(), 1);
    assert_eq!(transport.get_count(), 0);
    let messages = host.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].0.contains("No resulting docs received."));
    assert_eq!(messages[0].1, Severity::Error);
}

/// S5: one failing record does not sink the search
#[tokio::test]
async fn test_failing_record_is_skipped() {
    let transport = Arc::new(
        MockTransport::new()
            .with_listing(listing(&["good", "bad"]))
            .with_record("good", SMITH_2001)
            .with_record_error(
                "bad",
                SourceError::Http {
                    status: 500,
                    url: "http://mock.invalid/zbmath/search/?index_=bad&type_=bib".to_string(),
                },
            ),
    );
    let host = RecordingHost::new();

    let ok = search_with(&transport)
        .search("foo", &Refinements::new(), &host, &host)
        .await;

    assert!(ok);
    assert_eq!(transport.get_count(), 2);
    let entries = host.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key, "Smith2001");
    assert!(host.messages().is_empty());
}

/// S6: umlaut escapes reach the host as precomposed characters
#[tokio::test]
async fn test_umlaut_escapes_are_normalized() {
    let record = r#"@article{Mueller1950,
  author = {M\"uller, Hans},
  title = {Sch\"atzungen f\"ur \"Ortliche Invarianten},
  year = {1950}
}"#;
    let transport = Arc::new(
        MockTransport::new()
            .with_listing(listing(&["42"]))
            .with_record("42", record),
    );
    let host = RecordingHost::new();

    let ok = search_with(&transport)
        .search("foo", &Refinements::new(), &host, &host)
        .await;

    assert!(ok);
    let entries = host.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0].title(),
        Some("Schätzungen für Örtliche Invarianten")
    );
}

/// Duplicate ids on the listing are fetched once
#[tokio::test]
async fn test_duplicate_ids_fetched_once() {
    let transport = Arc::new(
        MockTransport::new()
            .with_listing(listing(&["7", "8", "7", "7"]))
            .with_record("7", article("Seven", "Seven"))
            .with_record("8", article("Eight", "Eight")),
    );
    let host = RecordingHost::new();

    assert!(search_with(&transport)
        .search("foo", &Refinements::new(), &host, &host)
        .await);

    let mut requested: Vec<String> = transport
        .requested_ids()
        .iter()
        .map(|id| id.to_string())
        .collect();
    requested.sort();
    assert_eq!(requested, vec!["7", "8"]);
}

/// When every record fails to parse nothing is delivered
#[tokio::test]
async fn test_all_parses_fail() {
    let transport = Arc::new(
        MockTransport::new()
            .with_listing(listing(&["a", "b"]))
            .with_record("a", "<html>Record not available</html>")
            .with_record("b", ""),
    );
    let host = RecordingHost::new();

    let ok = search_with(&transport)
        .search("foo", &Refinements::new(), &host, &host)
        .await;

    assert!(!ok);
    assert!(host.entries().is_empty());
    assert!(host.progress().is_empty());
    let messages = host.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].0.contains("Nothing found! Try a different search."));
}

/// When every record request fails nothing is delivered
#[tokio::test]
async fn test_all_records_fail() {
    let transport = Arc::new(
        MockTransport::new()
            .with_listing(listing(&["a"]))
            .with_record_error("a", SourceError::Network("connection reset".to_string())),
    );
    let host = RecordingHost::new();

    assert!(!search_with(&transport)
        .search("foo", &Refinements::new(), &host, &host)
        .await);
    assert!(host.entries().is_empty());
}

/// Bounded parallel fetching delivers the same set as sequential fetching
#[tokio::test]
async fn test_parallel_fetch_matches_sequential() {
    let ids: Vec<String> = (0..12).map(|i| format!("{}", 1000 + i)).collect();
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();

    let mut transport = MockTransport::new().with_listing(listing(&id_refs));
    for id in &ids {
        transport = if id.ends_with('3') {
            transport.with_record_error(id, SourceError::Network("flaky".to_string()))
        } else {
            transport.with_record(id, article(&format!("K{}", id), "Parallel"))
        };
    }
    let transport = Arc::new(transport);

    let mut keys_by_mode = Vec::new();
    for concurrency in [1, 4] {
        let host = RecordingHost::new();
        let search = search_with(&transport).max_concurrent_requests(concurrency);
        assert!(search.search("foo", &Refinements::new(), &host, &host).await);

        let mut keys: Vec<String> = host.entries().into_iter().map(|e| e.key).collect();
        keys.sort();
        keys_by_mode.push(keys);
    }

    assert_eq!(keys_by_mode[0].len(), 11);
    assert_eq!(keys_by_mode[0], keys_by_mode[1]);
}

fn http_config(server: &mockito::ServerGuard) -> Config {
    let mut config = Config::default();
    config.endpoint.base_url = format!("{}/zbmath/search/", server.url());
    config.http.max_retries = 0;
    config
}

fn record_query(id: &str) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("index_".into(), id.into()),
        Matcher::UrlEncoded("type_".into(), "bib".into()),
    ])
}

/// Full pipeline over HTTP against a local server
#[tokio::test]
async fn test_http_end_to_end() {
    let mut server = mockito::Server::new_async().await;
    let listing_mock = server
        .mock("POST", "/zbmath/search/")
        .match_header("user-agent", "Jabref")
        .match_header(
            "content-type",
            "application/x-www-form-urlencoded;charset=UTF-8",
        )
        .match_body("any=knot+theory")
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(listing(&["5123", "9999"]))
        .create_async()
        .await;
    let record_mock = server
        .mock("GET", Matcher::Regex("^/zbmath/search/".to_string()))
        .match_query(record_query("5123"))
        .match_header("user-agent", "Jabref")
        .with_body(SMITH_2001)
        .create_async()
        .await;
    let failing_mock = server
        .mock("GET", Matcher::Regex("^/zbmath/search/".to_string()))
        .match_query(record_query("9999"))
        .with_status(500)
        .create_async()
        .await;

    let search = ZentralSearch::from_config(&http_config(&server)).unwrap();
    let host = RecordingHost::new();

    let ok = search
        .search("knot theory", &Refinements::new(), &host, &host)
        .await;

    assert!(ok);
    let entries = host.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key, "Smith2001");
    listing_mock.assert_async().await;
    record_mock.assert_async().await;
    failing_mock.assert_async().await;
}

/// Listing failure over HTTP is reported with the endpoint URL
#[tokio::test]
async fn test_http_listing_failure() {
    let mut server = mockito::Server::new_async().await;
    let _listing_mock = server
        .mock("POST", "/zbmath/search/")
        .with_status(503)
        .create_async()
        .await;

    let config = http_config(&server);
    let search = ZentralSearch::from_config(&config).unwrap();
    let host = RecordingHost::new();

    assert!(!search
        .search("knot theory", &Refinements::new(), &host, &host)
        .await);

    let messages = host.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].0.contains(&config.endpoint.base_url));
    assert!(host.entries().is_empty());
}

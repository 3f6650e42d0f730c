//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use kgs_crawl::config::Config;
use kgs_crawl::crawler::{Coordinator, LanguageDetector};
use kgs_crawl::storage::UrlIndex;
use kgs_crawl::{crawl, CrawlReport, RejectReason};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CZECH: &str = "Praha je hlavní a zároveň největší město České republiky. \
    Leží v centru Čech na řece Vltavě a žije v ní přibližně jeden a třičtvrtě milionu obyvatel. \
    Historické jádro města je zapsáno na seznamu světového dědictví.";

/// Reports English for any text mentioning it, Czech otherwise
struct KeywordDetector;

impl LanguageDetector for KeywordDetector {
    fn detect(&self, text: &str) -> Option<String> {
        if text.contains("English") {
            Some("eng".to_string())
        } else {
            Some("ces".to_string())
        }
    }
}

/// Creates a test configuration with short timeouts
fn create_test_config(dir: &Path, max_depth: u32, max_hops: u32) -> Config {
    let mut config = Config::new(max_hops, max_depth, dir).unwrap();
    config.fetch.connect_timeout = 5;
    config.fetch.read_timeout = 10;
    config
}

async fn run_crawl(dir: &Path, seed: &Url, max_depth: u32, max_hops: u32) -> CrawlReport {
    let config = create_test_config(dir, max_depth, max_hops);
    Coordinator::new(config)
        .unwrap()
        .with_language_detector(KeywordDetector)
        .run(seed)
        .await
        .unwrap()
}

/// Builds an HTML page with a title, some text and the given links
fn html_page(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|link| format!(r#"<a href="{}">odkaz</a> "#, link))
        .collect();

    format!(
        "<html><head><title>{}</title></head><body><p>Obsah stránky {}</p>{}</body></html>",
        title, title, anchors
    )
}

async fn mount_html(server: &MockServer, at: &str, body: String, expected: u64) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/html"))
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_redirect(server: &MockServer, from: &str, to: &str) {
    Mock::given(method("GET"))
        .and(path(from))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", to))
        .mount(server)
        .await;
}

fn page_url(server: &MockServer, p: &str) -> String {
    format!("{}{}", server.uri(), p)
}

fn seed_url(server: &MockServer) -> Url {
    Url::parse(&page_url(server, "/")).unwrap()
}

/// Sorted file names in one of the artifact directories
fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn load_index(dir: &Path) -> UrlIndex {
    UrlIndex::load(&dir.join("ids.txt")).unwrap()
}

/// Every ID has all three artifacts, IDs are dense, nothing is left staged
fn assert_consistent(dir: &Path, index: &UrlIndex) {
    let ids: Vec<u64> = index.iter().map(|(id, _)| id).collect();
    let expected: Vec<u64> = (1..=index.len() as u64).collect();
    assert_eq!(ids, expected, "IDs must be dense");

    for id in ids {
        let originals: Vec<String> = files_in(&dir.join("original"))
            .into_iter()
            .filter(|name| name.starts_with(&format!("{}.", id)))
            .collect();
        assert_eq!(originals.len(), 1, "original for ID {}", id);
        assert!(dir.join("parsed").join(format!("{}.txt", id)).is_file());
        assert!(dir.join("links").join(format!("{}.txt", id)).is_file());
    }

    for sub in ["original", "parsed", "links"] {
        let files = files_in(&dir.join(sub));
        assert_eq!(files.len(), index.len(), "files in {}: {:?}", sub, files);
        assert!(files.iter().all(|name| !name.starts_with("pending-")));
    }
}

#[tokio::test]
async fn test_crawl_respects_depth_and_hops() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_html(
        &mock_server,
        "/",
        html_page("Home", &["/a", "http://other.invalid/b"]),
        1,
    )
    .await;
    mount_html(&mock_server, "/a", html_page("A", &["/c"]), 1).await;
    mount_html(&mock_server, "/c", html_page("C", &[]), 0).await;

    let report = run_crawl(temp_dir.path(), &seed_url(&mock_server), 1, 0).await;

    assert_eq!(report.accepted, 2);
    assert_eq!(report.rejected_total(), 0);
    assert!(!report.cancelled);

    let index = load_index(temp_dir.path());
    assert_eq!(index.len(), 2);
    assert_eq!(index.id_of(&page_url(&mock_server, "/")), Some(1));
    assert_eq!(index.id_of(&page_url(&mock_server, "/a")), Some(2));
    assert_eq!(index.id_of("http://other.invalid/b"), None);
    assert_consistent(temp_dir.path(), &index);

    assert_eq!(
        files_in(&temp_dir.path().join("original")),
        vec!["1.html", "2.html"]
    );

    let parsed = fs::read_to_string(temp_dir.path().join("parsed/1.txt")).unwrap();
    assert!(parsed.starts_with("Home\n\n"));

    let links = fs::read_to_string(temp_dir.path().join("links/1.txt")).unwrap();
    let links: Vec<&str> = links.lines().collect();
    assert_eq!(links.len(), 2);
    assert!(links.contains(&page_url(&mock_server, "/a").as_str()));
    assert!(links.contains(&"http://other.invalid/b"));
}

#[tokio::test]
async fn test_seed_redirect_is_processed_at_seed_budget() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/home"))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_html(&mock_server, "/home", html_page("Home", &["/a"]), 2).await;
    mount_html(&mock_server, "/a", html_page("A", &[]), 0).await;

    // Depth 0: /home inherits the seed's depth, so its links are out of budget
    let report = run_crawl(temp_dir.path(), &seed_url(&mock_server), 0, 0).await;

    assert_eq!(report.accepted, 1);
    assert_eq!(report.rejected_for(RejectReason::Redirected), 1);

    let index = load_index(temp_dir.path());
    assert_eq!(index.id_of(&page_url(&mock_server, "/home")), Some(1));
    assert_eq!(index.id_of(&page_url(&mock_server, "/")), None);
    assert_consistent(temp_dir.path(), &index);
    assert_eq!(files_in(&temp_dir.path().join("original")), vec!["1.html"]);
}

#[tokio::test]
async fn test_redirect_loop_terminates() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_redirect(&mock_server, "/loop1", "/loop2").await;
    mount_redirect(&mock_server, "/loop2", "/loop1").await;

    let seed = Url::parse(&page_url(&mock_server, "/loop1")).unwrap();
    let report = run_crawl(temp_dir.path(), &seed, 1, 0).await;

    assert_eq!(report.accepted, 0);
    assert_eq!(report.rejected_for(RejectReason::DownloadFailed), 1);
    assert_eq!(report.visited(), 1);

    let index = load_index(temp_dir.path());
    assert!(index.is_empty());
    assert_consistent(temp_dir.path(), &index);
}

#[tokio::test]
async fn test_long_redirect_chain_is_not_followed() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    for i in 0..7 {
        mount_redirect(&mock_server, &format!("/r{}", i), &format!("/r{}", i + 1)).await;
    }
    mount_html(&mock_server, "/r7", html_page("End", &[]), 0).await;

    let seed = Url::parse(&page_url(&mock_server, "/r0")).unwrap();
    let report = run_crawl(temp_dir.path(), &seed, 1, 0).await;

    assert_eq!(report.accepted, 0);
    assert_eq!(report.rejected_for(RejectReason::DownloadFailed), 1);
    assert!(load_index(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_no_url_is_fetched_twice() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_html(
        &mock_server,
        "/",
        html_page("Home", &["/a", "/a#top", "/a/", "/b", "/"]),
        1,
    )
    .await;
    mount_html(&mock_server, "/a", html_page("A", &["/", "/b", "/a"]), 1).await;
    mount_html(&mock_server, "/b", html_page("B", &["/a", "/#main"]), 1).await;

    let report = run_crawl(temp_dir.path(), &seed_url(&mock_server), 2, 0).await;

    assert_eq!(report.accepted, 3);
    assert_eq!(report.rejected_total(), 0);

    let index = load_index(temp_dir.path());
    assert_eq!(index.len(), 3);
    assert_eq!(index.id_of(&page_url(&mock_server, "/")), Some(1));
    assert!(index.id_of(&page_url(&mock_server, "/a/")).is_some());
    assert_consistent(temp_dir.path(), &index);
}

#[tokio::test]
async fn test_wrong_language_is_rejected() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_html(&mock_server, "/", html_page("Home", &["/cz", "/en"]), 1).await;
    mount_html(&mock_server, "/cz", html_page("Stránka", &[]), 1).await;
    mount_html(&mock_server, "/en", html_page("English page", &["/x"]), 1).await;
    mount_html(&mock_server, "/x", html_page("X", &[]), 0).await;

    let report = run_crawl(temp_dir.path(), &seed_url(&mock_server), 2, 0).await;

    assert_eq!(report.accepted, 2);
    assert_eq!(report.rejected_for(RejectReason::LanguageMismatch), 1);

    let index = load_index(temp_dir.path());
    assert_eq!(index.id_of(&page_url(&mock_server, "/cz")), Some(2));
    assert_eq!(index.id_of(&page_url(&mock_server, "/en")), None);
    assert_consistent(temp_dir.path(), &index);
}

#[tokio::test]
async fn test_unparsable_content_is_rejected() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_html(
        &mock_server,
        "/",
        html_page("Home", &["/logo.png", "/notes.txt"]),
        1,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(vec![0x89, b'P', b'N', b'G', 0, 0], "image/png"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/notes.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("Poznámky ke schůzce".as_bytes().to_vec(), "text/plain"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = run_crawl(temp_dir.path(), &seed_url(&mock_server), 1, 0).await;

    assert_eq!(report.accepted, 2);
    assert_eq!(report.rejected_for(RejectReason::NoParser), 1);

    let index = load_index(temp_dir.path());
    assert_consistent(temp_dir.path(), &index);
    assert_eq!(
        files_in(&temp_dir.path().join("original")),
        vec!["1.html", "2.txt"]
    );

    // Plain text pages have no outbound links
    let links = fs::read_to_string(temp_dir.path().join("links/2.txt")).unwrap();
    assert!(links.is_empty());
}

#[tokio::test]
async fn test_failed_download_does_not_stop_crawl() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_html(&mock_server, "/", html_page("Home", &["/missing", "/ok"]), 1).await;
    mount_html(&mock_server, "/ok", html_page("OK", &[]), 1).await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = run_crawl(temp_dir.path(), &seed_url(&mock_server), 1, 0).await;

    assert_eq!(report.accepted, 2);
    assert_eq!(report.rejected_for(RejectReason::DownloadFailed), 1);

    let index = load_index(temp_dir.path());
    assert_eq!(index.id_of(&page_url(&mock_server, "/ok")), Some(2));
    assert_consistent(temp_dir.path(), &index);
}

#[tokio::test]
async fn test_rerun_replaces_previous_artifacts() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_html(&mock_server, "/", html_page("Home", &["/a"]), 2).await;
    mount_html(&mock_server, "/a", html_page("A", &[]), 2).await;

    let stale_original = temp_dir.path().join("original/99.html");
    fs::create_dir_all(stale_original.parent().unwrap()).unwrap();
    fs::write(&stale_original, "old").unwrap();

    run_crawl(temp_dir.path(), &seed_url(&mock_server), 1, 0).await;
    assert!(!stale_original.exists());
    let first = fs::read_to_string(temp_dir.path().join("ids.txt")).unwrap();

    run_crawl(temp_dir.path(), &seed_url(&mock_server), 1, 0).await;
    let second = fs::read_to_string(temp_dir.path().join("ids.txt")).unwrap();

    assert_eq!(first, second);
    assert_consistent(temp_dir.path(), &load_index(temp_dir.path()));
}

#[tokio::test]
async fn test_cancelled_crawl_writes_index() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_html(&mock_server, "/", html_page("Home", &[]), 0).await;

    let config = create_test_config(temp_dir.path(), 1, 0);
    let coordinator = Coordinator::new(config)
        .unwrap()
        .with_language_detector(KeywordDetector);
    coordinator.cancel_handle().cancel();

    let report = coordinator.run(&seed_url(&mock_server)).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.visited(), 0);
    assert!(temp_dir.path().join("ids.txt").is_file());
}

#[tokio::test]
async fn test_single_worker_crawl() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_html(&mock_server, "/", html_page("Home", &["/a", "/b"]), 1).await;
    mount_html(&mock_server, "/a", html_page("A", &[]), 1).await;
    mount_html(&mock_server, "/b", html_page("B", &[]), 1).await;

    let mut config = create_test_config(temp_dir.path(), 1, 0);
    config.crawler.workers = 1;
    let report = Coordinator::new(config)
        .unwrap()
        .with_language_detector(KeywordDetector)
        .run(&seed_url(&mock_server))
        .await
        .unwrap();

    assert_eq!(report.accepted, 3);

    // With one worker, siblings are processed in discovery order
    let index = load_index(temp_dir.path());
    assert_eq!(index.id_of(&page_url(&mock_server, "/a")), Some(2));
    assert_eq!(index.id_of(&page_url(&mock_server, "/b")), Some(3));
    assert_consistent(temp_dir.path(), &index);
}

#[tokio::test]
async fn test_crawl_entry_point() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    let body = format!(
        "<html><head><title>Praha</title></head><body><p>{}</p><a href=\"/dalsi\">Další</a></body></html>",
        CZECH
    );
    mount_html(&mock_server, "/", body, 1).await;
    mount_html(&mock_server, "/dalsi", html_page("Další", &[]), 0).await;

    let seed = page_url(&mock_server, "/");
    let report = crawl(&seed, 0, 0, temp_dir.path()).await.unwrap();

    assert_eq!(report.accepted, 1);
    assert_eq!(report.data_dir(), temp_dir.path());

    let index = load_index(temp_dir.path());
    assert_eq!(index.id_of(&seed), Some(1));
    assert_consistent(temp_dir.path(), &index);

    let parsed = fs::read_to_string(temp_dir.path().join("parsed/1.txt")).unwrap();
    assert!(parsed.contains("Vltavě"));
}

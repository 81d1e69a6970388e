//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, through the library and the binary.

use std::collections::BTreeSet;
use std::future::pending;
use std::time::Duration;
use url::Url;
use web_parser::config::CrawlJob;
use web_parser::crawler::{crawl, Termination};
use web_parser::output::{Envelope, JsonOutput, MemoryOutput, StreamSummary, StreamingJsonOutput};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.to_string())
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

/// Creates a fast test job for the given server
fn create_test_job(server: &MockServer, max_depth: u32) -> CrawlJob {
    let mut job = CrawlJob::new(Url::parse(&format!("{}/", server.uri())).unwrap());
    job.max_depth = max_depth;
    job.delay = Duration::ZERO;
    job.request_timeout = Duration::from_secs(5);
    job.respect_robots = false;
    job
}

fn url_set(output: &MemoryOutput) -> BTreeSet<String> {
    output.pages.iter().map(|page| page.url.clone()).collect()
}

fn paths(server: &MockServer, output: &MemoryOutput) -> BTreeSet<String> {
    output
        .pages
        .iter()
        .map(|page| page.url.trim_start_matches(&server.uri()).to_string())
        .collect()
}

/// A small site: / -> a, b; a -> c, /; b -> c, external; c -> d
async fn mount_site(server: &MockServer) {
    mount_page(
        server,
        "/",
        r#"<html><head><title>Home</title></head><body>
            <nav><a href="/a">A</a></nav>
            <main><p>Welcome home</p><a href="/b">B</a></main>
        </body></html>"#,
    )
    .await;
    mount_page(
        server,
        "/a",
        r#"<html><head><title>A</title></head><body><a href="/c">C</a><a href="/">Home</a></body></html>"#,
    )
    .await;
    mount_page(
        server,
        "/b",
        r#"<html><head><title>B</title></head><body><a href="/c?utm_source=b">C</a></body></html>"#,
    )
    .await;
    mount_page(
        server,
        "/c",
        r#"<html><head><title>C</title></head><body><a href="/d">D</a></body></html>"#,
    )
    .await;
    mount_page(server, "/d", r#"<html><head><title>D</title></head><body>end</body></html>"#).await;
}

async fn run(job: CrawlJob) -> (MemoryOutput, web_parser::CrawlReport) {
    let mut output = MemoryOutput::new();
    let report = crawl(job, &mut output, pending()).await.unwrap();
    (output, report)
}

#[tokio::test]
async fn test_depth_zero_fetches_only_seed() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let (output, report) = run(create_test_job(&server, 0)).await;

    assert_eq!(output.pages.len(), 1);
    assert_eq!(report.stats.total, 1);
    assert_eq!(output.pages[0].title, "Home");
    assert!(output.pages[0].content.contains("Welcome home"));
    // Navigation is pruned from the content
    assert!(!output.pages[0].content.contains('A'));
    assert_eq!(report.termination, Termination::Exhausted);
}

#[tokio::test]
async fn test_full_crawl_collects_every_page_once() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let (output, report) = run(create_test_job(&server, 3)).await;

    let expected: BTreeSet<String> = ["/", "/a", "/b", "/c", "/d"]
        .iter()
        .map(|p| p.to_string())
        .collect();
    assert_eq!(paths(&server, &output), expected);
    assert_eq!(output.pages.len(), 5);
    assert_eq!(report.stats.successful, 5);
    assert_eq!(report.stats.failed, 0);
    assert_eq!(report.stats.total, 5);

    let c = output
        .pages
        .iter()
        .find(|page| page.title == "C")
        .unwrap();
    assert_eq!(c.metadata.depth, 2);
}

#[tokio::test]
async fn test_same_pages_for_any_worker_count() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let mut sets = Vec::new();
    for workers in [1, 2, 8] {
        let mut job = create_test_job(&server, 3);
        job.workers = workers;
        let (output, _) = run(job).await;

        // No duplicates
        assert_eq!(url_set(&output).len(), output.pages.len());
        sets.push(url_set(&output));
    }

    assert_eq!(sets[0], sets[1]);
    assert_eq!(sets[1], sets[2]);
}

#[tokio::test]
async fn test_repeated_crawls_are_identical() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let (first, _) = run(create_test_job(&server, 2)).await;
    let (second, _) = run(create_test_job(&server, 2)).await;

    assert_eq!(url_set(&first), url_set(&second));
}

#[tokio::test]
async fn test_chain_respects_max_depth() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/a">A</a>"#).await;
    mount_page(&server, "/a", r#"<a href="/b">B</a>"#).await;
    mount_page(&server, "/b", r#"<a href="/c">C</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(html("never"))
        .expect(0)
        .mount(&server)
        .await;

    let (output, _) = run(create_test_job(&server, 2)).await;

    let expected: BTreeSet<String> = ["/", "/a", "/b"].iter().map(|p| p.to_string()).collect();
    assert_eq!(paths(&server, &output), expected);
}

#[tokio::test]
async fn test_same_domain_stays_on_seed_host() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;

    // Same machine, different host name
    let other_port = Url::parse(&other.uri()).unwrap().port().unwrap();
    let external = format!("http://localhost:{}/external", other_port);

    mount_page(
        &server,
        "/",
        &format!(r#"<a href="/local">Local</a><a href="{}">External</a>"#, external),
    )
    .await;
    mount_page(&server, "/local", "<p>local</p>").await;
    mount_page(&other, "/external", "<p>external</p>").await;

    let mut job = create_test_job(&server, 1);
    job.same_domain = true;
    let (output, _) = run(job).await;

    let seed_host = Url::parse(&server.uri()).unwrap().host_str().unwrap().to_string();
    assert_eq!(output.pages.len(), 2);
    for page in &output.pages {
        let host = Url::parse(&page.url).unwrap().host_str().unwrap().to_string();
        assert_eq!(host, seed_host);
    }

    // Without the flag the external page is followed
    let (output, _) = run(create_test_job(&server, 1)).await;
    assert_eq!(output.pages.len(), 3);
    assert!(output.pages.iter().any(|page| page.url == external));
}

#[tokio::test]
async fn test_deadline_returns_partial_results() {
    let server = MockServer::start().await;
    let slow = |body: &str| html(body).set_delay(Duration::from_millis(600));
    for (route, next) in [("/", "/a"), ("/a", "/b"), ("/b", "/c"), ("/c", "/d")] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(slow(&format!(r#"<a href="{}">next</a>"#, next)))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/d"))
        .respond_with(slow("end"))
        .mount(&server)
        .await;

    let mut job = create_test_job(&server, 10);
    job.workers = 1;
    job.deadline = Some(Duration::from_secs(1));
    let (output, report) = run(job).await;

    assert_eq!(report.termination, Termination::Deadline);
    assert!(!output.pages.is_empty());
    assert!(report.stats.total < 5);
    assert!(output.stats.is_some());
}

#[tokio::test]
async fn test_page_limit() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let mut job = create_test_job(&server, 3);
    job.max_pages = Some(2);
    let (output, report) = run(job).await;

    assert_eq!(output.pages.len(), 2);
    assert_eq!(report.stats.total, 2);
    assert_eq!(report.termination, Termination::PageLimit);
}

#[tokio::test]
async fn test_malformed_html_is_crawled() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><head><title>Broken<body><p>Unclosed <b>bold <a href="/next">next<div></span></table>"#,
    )
    .await;
    mount_page(&server, "/next", "<<<>>> <p>still fine").await;

    let (output, report) = run(create_test_job(&server, 1)).await;

    assert_eq!(report.stats.successful, 2);
    assert_eq!(output.pages.len(), 2);
}

#[tokio::test]
async fn test_declared_charset_is_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            b"<html><head><title>Caf\xE9</title></head><body><p>Cr\xE8me br\xFBl\xE9e</p></body></html>"
                .to_vec(),
            "text/html; charset=iso-8859-1",
        ))
        .mount(&server)
        .await;

    let (output, _) = run(create_test_job(&server, 0)).await;

    assert_eq!(output.pages.len(), 1);
    assert_eq!(output.pages[0].title, "Café");
    assert!(output.pages[0].content.contains("Crème brûlée"));
}

#[tokio::test]
async fn test_non_html_is_skipped() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="/report.pdf">PDF</a><a href="/page">Page</a>"#,
    )
    .await;
    mount_page(&server, "/page", "<p>page</p>").await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"%PDF-1.4".to_vec())
                .insert_header("content-type", "application/pdf"),
        )
        .mount(&server)
        .await;

    let (output, report) = run(create_test_job(&server, 1)).await;

    assert_eq!(output.pages.len(), 2);
    assert_eq!(report.stats.successful, 2);
    assert_eq!(report.stats.skipped, 1);
    assert_eq!(report.stats.failed, 0);
    assert_eq!(report.stats.total, 3);
}

#[tokio::test]
async fn test_failed_pages_counted_not_emitted() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/gone">Gone</a><a href="/ok">OK</a>"#).await;
    mount_page(&server, "/ok", "<p>ok</p>").await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (output, report) = run(create_test_job(&server, 1)).await;

    assert_eq!(output.pages.len(), 2);
    assert_eq!(report.stats.failed, 1);
    assert_eq!(report.stats.total, 3);
    assert!(output.pages.iter().all(|page| !page.url.ends_with("/gone")));
}

#[tokio::test]
async fn test_refused_connection_counted_failed() {
    let server = MockServer::start().await;

    // A port with no listener
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let refused = format!("http://{}/down", listener.local_addr().unwrap());
    drop(listener);

    mount_page(
        &server,
        "/",
        &format!(r#"<a href="{}">Down</a><a href="/ok">OK</a>"#, refused),
    )
    .await;
    mount_page(&server, "/ok", "<p>ok</p>").await;

    let mut job = create_test_job(&server, 1);
    job.retries = 1;
    let (output, report) = run(job).await;

    assert_eq!(output.pages.len(), 2);
    assert_eq!(report.stats.successful, 2);
    assert_eq!(report.stats.failed, 1);
    assert_eq!(report.stats.total, 3);
    assert!(output.pages.iter().all(|page| page.url != refused));
}

#[tokio::test]
async fn test_robots_disallow_is_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/",
        r#"<a href="/private/secret">Secret</a><a href="/public">Public</a>"#,
    )
    .await;
    mount_page(&server, "/public", "<p>public</p>").await;
    Mock::given(method("GET"))
        .and(path("/private/secret"))
        .respond_with(html("secret"))
        .expect(0)
        .mount(&server)
        .await;

    let mut job = create_test_job(&server, 1);
    job.respect_robots = true;
    let (output, report) = run(job).await;

    assert_eq!(output.pages.len(), 2);
    assert_eq!(report.stats.skipped, 1);
}

#[tokio::test]
async fn test_robots_ignored_when_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .expect(0)
        .mount(&server)
        .await;
    mount_page(&server, "/", "<p>home</p>").await;

    let (output, _) = run(create_test_job(&server, 0)).await;
    assert_eq!(output.pages.len(), 1);
}

#[tokio::test]
async fn test_include_and_exclude_patterns() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="/docs/intro">Intro</a><a href="/docs/old">Old</a><a href="/blog/post">Post</a>"#,
    )
    .await;
    mount_page(&server, "/docs/intro", "<p>intro</p>").await;
    mount_page(&server, "/docs/old", "<p>old</p>").await;
    mount_page(&server, "/blog/post", "<p>post</p>").await;

    let mut job = create_test_job(&server, 1);
    job.include_patterns = vec!["/docs/".to_string()];
    job.exclude_patterns = vec!["/old$".to_string()];
    let (output, _) = run(job).await;

    let expected: BTreeSet<String> = ["/", "/docs/intro"].iter().map(|p| p.to_string()).collect();
    assert_eq!(paths(&server, &output), expected);
}

#[tokio::test]
async fn test_json_envelope_output() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let mut output = JsonOutput::new(Vec::new(), true);
    let report = crawl(create_test_job(&server, 1), &mut output, pending())
        .await
        .unwrap();

    let envelope: Envelope = serde_json::from_slice(&output.into_inner()).unwrap();
    assert_eq!(envelope.total_pages, 3);
    assert_eq!(envelope.pages.len(), 3);
    assert_eq!(envelope.stats, report.stats);
    // Stable order puts the seed first
    assert_eq!(envelope.pages[0].url, format!("{}/", server.uri()));
    assert_eq!(envelope.pages[0].metadata.depth, 0);
    assert!(envelope.pages[0].metadata.content_type.starts_with("text/html"));
}

#[tokio::test]
async fn test_streaming_output() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let mut output = StreamingJsonOutput::new(Vec::new());
    crawl(create_test_job(&server, 1), &mut output, pending())
        .await
        .unwrap();

    let text = String::from_utf8(output.into_inner()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);

    for line in &lines[..3] {
        let page: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(page["url"].is_string());
        assert!(page["metadata"]["status"].is_number());
    }
    let summary: StreamSummary = serde_json::from_str(lines[3]).unwrap();
    assert_eq!(summary.total_pages, 3);
    assert_eq!(summary.stats.successful, 3);
}

// Binary tests

async fn run_binary(args: &[&str]) -> std::process::Output {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_web-parser"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_binary_writes_envelope_to_stdout() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let seed = format!("{}/", server.uri());

    let output = run_binary(&[
        "-url",
        &seed,
        "-crawl",
        "-max-depth",
        "1",
        "-delay",
        "0",
        "-respect-robots",
        "false",
        "-no-progress",
        "-format",
        "json",
    ])
    .await;

    assert!(output.status.success());
    let envelope: Envelope = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(envelope.total_pages, 3);
}

#[tokio::test]
async fn test_binary_invalid_seed_exits_1() {
    let output = run_binary(&["-url", "ftp://example.com/", "-no-progress"]).await;
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[tokio::test]
async fn test_binary_unreachable_seed_exits_1_with_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let seed = format!("{}/", server.uri());

    let output = run_binary(&[
        "-url",
        &seed,
        "-respect-robots",
        "false",
        "-delay",
        "0",
        "-no-progress",
    ])
    .await;

    assert_eq!(output.status.code(), Some(1));
    let envelope: Envelope = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(envelope.total_pages, 0);
    assert_eq!(envelope.stats.failed, 1);
}

#[tokio::test]
async fn test_binary_usage_error_exits_2() {
    let output = run_binary(&["-url", "https://example.com/", "-workers", "many"]).await;
    assert_eq!(output.status.code(), Some(2));
}

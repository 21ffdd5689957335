//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock archive servers and test
//! month passes and whole runs end-to-end.

use archive_mirror::config::Config;
use archive_mirror::crawler::{run_archive, Orchestrator, YearSpan};
use archive_mirror::storage::{read_rows, LEDGER_FILE};
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

const INDEX_PATH: &str = "/library/judgments/index.php";

/// Matches requests that carry no `page` query parameter
struct FirstPage;

impl Match for FirstPage {
    fn matches(&self, request: &Request) -> bool {
        !request.url.query_pairs().any(|(key, _)| key == "page")
    }
}

/// Creates a test configuration pointing at the mock server
fn create_test_config(server: &MockServer, output: &Path) -> Config {
    let mut config = Config::default();
    config.source.base_url = format!("{}{}", server.uri(), INDEX_PATH);
    config.fetch.timeout_secs = 5;
    config.fetch.max_retries = 2;
    config.fetch.backoff_unit_ms = 1; // Keep backoff short for testing
    config.crawl.delay_ms = 0;
    config.crawl.workers = Some(3);
    config.output.output_dir = output.to_path_buf();
    config
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

fn index_page(year: i32, month: &str, serials: &[u32]) -> String {
    let anchors: String = serials
        .iter()
        .map(|s| {
            format!(
                r#"<tr><td><a href="javascript:void(0)" onclick="showpage('{}','{}','{}.php')">Case {}</a></td></tr>"#,
                year, month, s, s
            )
        })
        .collect();
    format!(
        "<html><head><title>Index</title></head><body><table>{}</table></body></html>",
        anchors
    )
}

fn document_page(title: &str, content: &str) -> String {
    format!(
        r#"<html><head><title>{}</title></head><body>
        <div id="nav">Home | Library</div>
        <div id="contentarea">{}</div>
        </body></html>"#,
        title, content
    )
}

const END_OF_MONTH: &str =
    "<html><body><p>Sorry, there is nothing more to show for this month</p></body></html>";

async fn mount_index(server: &MockServer, year: i32, month: &str, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .and(query_param(
            "go",
            format!("{}/{}/indexfiles/index{}.php", year, month, page).as_str(),
        ))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn mount_document(server: &MockServer, year: i32, month: &str, serial: u32, page: u32, body: String) {
    let go = format!("{}/{}/{}.php", year, month, serial);
    let mock = Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .and(query_param("go", go.as_str()));

    let mock = if page == 1 {
        mock.and(FirstPage)
    } else {
        mock.and(query_param("page", page.to_string().as_str()))
    };

    mock.respond_with(html(body)).mount(server).await;
}

#[tokio::test]
async fn test_full_month_mirror() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_index(&server, 2020, "january", 1, index_page(2020, "january", &[101, 102])).await;
    mount_index(&server, 2020, "january", 2, END_OF_MONTH.to_string()).await;

    let title = "State vs. X [12 Jan 2020] | Judgment Archive";
    mount_document(&server, 2020, "january", 101, 1, document_page(title, "<p>Page one text.</p>")).await;
    mount_document(
        &server,
        2020,
        "january",
        101,
        2,
        document_page(title, "<p>Page two text.</p><table><tr><td>A</td><td>B</td></tr></table>"),
    )
    .await;
    // Past the last real page the archive repeats the previous page
    mount_document(
        &server,
        2020,
        "january",
        101,
        3,
        document_page(title, "<p>Page two text.</p><table><tr><td>A</td><td>B</td></tr></table>"),
    )
    .await;
    mount_document(
        &server,
        2020,
        "january",
        102,
        1,
        document_page(
            "Y v. Union | Judgment Archive",
            r#"<p>Only page.</p><br clear="all"><p>Similar judgments</p>"#,
        ),
    )
    .await;

    let config = create_test_config(&server, output.path());
    let orchestrator = Orchestrator::from_config(&config).expect("Failed to build orchestrator");

    let report = orchestrator
        .run_month(2020, 1, &CancellationToken::new())
        .await
        .expect("Month pass failed");

    assert_eq!(report.discovered, 2);
    assert_eq!(report.saved, 2);
    assert!(report.is_complete());

    let year_dir = output.path().join("2020");
    let first = std::fs::read_to_string(year_dir.join("2020_01_101.txt")).unwrap();
    assert_eq!(first, "Page one text.\n\nPage two text.\n\nA | B\n");
    let second = std::fs::read_to_string(year_dir.join("2020_01_102.txt")).unwrap();
    assert_eq!(second, "Only page.");

    let mut rows = read_rows(&year_dir.join(LEDGER_FILE)).unwrap();
    rows.sort_by(|a, b| a.serial_no.cmp(&b.serial_no));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].title, "State vs. X");
    assert_eq!(rows[0].date, "12 Jan 2020");
    assert_eq!(rows[0].filename, "2020_01_101.txt");
    assert_eq!(
        rows[0].url,
        format!("{}{}?go=2020/january/101.php", server.uri(), INDEX_PATH)
    );
    assert_eq!(rows[1].title, "Y v. Union");
    assert_eq!(rows[1].date, "Unknown");
}

#[tokio::test]
async fn test_existing_files_are_not_refetched() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_index(&server, 2019, "may", 1, index_page(2019, "may", &[7, 8])).await;
    mount_index(&server, 2019, "may", 2, END_OF_MONTH.to_string()).await;

    // Document 7 is already on disk and must not be requested
    Mock::given(method("GET"))
        .and(query_param("go", "2019/may/7.php"))
        .respond_with(html(document_page("T", "<p>x</p>")))
        .expect(0)
        .mount(&server)
        .await;
    mount_document(&server, 2019, "may", 8, 1, document_page("T [1 May 2019]", r#"<p>Eight</p><br clear="all">"#)).await;

    let year_dir = output.path().join("2019");
    std::fs::create_dir_all(&year_dir).unwrap();
    std::fs::write(year_dir.join("2019_05_7.txt"), "from an earlier run").unwrap();

    let config = create_test_config(&server, output.path());
    let orchestrator = Orchestrator::from_config(&config).unwrap();
    let report = orchestrator
        .run_month(2019, 5, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.saved, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(
        std::fs::read_to_string(year_dir.join("2019_05_7.txt")).unwrap(),
        "from an earlier run"
    );

    let rows = read_rows(&year_dir.join(LEDGER_FILE)).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].serial_no, "8");
}

#[tokio::test]
async fn test_throttled_document_is_left_for_next_run() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_index(&server, 2018, "june", 1, index_page(2018, "june", &[5])).await;
    mount_index(&server, 2018, "june", 2, END_OF_MONTH.to_string()).await;
    Mock::given(method("GET"))
        .and(query_param("go", "2018/june/5.php"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let config = create_test_config(&server, output.path());
    let orchestrator = Orchestrator::from_config(&config).unwrap();
    let report = orchestrator
        .run_month(2018, 6, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.saved, 0);
    assert_eq!(report.empty, 1);
    assert_eq!(report.missing.len(), 1);
    assert!(!output.path().join("2018/2018_06_5.txt").exists());
}

#[tokio::test]
async fn test_index_without_end_marker_terminates() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_index(&server, 2017, "march", 1, index_page(2017, "march", &[1])).await;
    // The archive keeps serving the same listing for every later index page
    mount_index(&server, 2017, "march", 2, index_page(2017, "march", &[1])).await;
    mount_document(&server, 2017, "march", 1, 1, document_page("T", r#"<p>One</p><br clear="all">"#)).await;

    let config = create_test_config(&server, output.path());
    let orchestrator = Orchestrator::from_config(&config).unwrap();
    let report = orchestrator
        .run_month(2017, 3, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.discovered, 1);
    assert_eq!(report.saved, 1);
}

#[tokio::test]
async fn test_run_over_years_and_months() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    for (year, month) in [(2011, "january"), (2010, "january")] {
        mount_index(&server, year, month, 1, index_page(year, month, &[1])).await;
        mount_index(&server, year, month, 2, END_OF_MONTH.to_string()).await;
        mount_document(&server, year, month, 1, 1, document_page("T", r#"<p>Text</p><br clear="all">"#)).await;
    }

    let config = create_test_config(&server, output.path());
    let summary = run_archive(
        &config,
        YearSpan::between(2011, 2010),
        &[1, 2],
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(summary.months_completed, 4);
    assert!(summary.months_failed.is_empty());
    assert_eq!(summary.documents_saved, 2);
    assert!(output.path().join("2011/2011_01_1.txt").exists());
    assert!(output.path().join("2010/2010_01_1.txt").exists());

    // A second run finds everything on disk
    let again = run_archive(
        &config,
        YearSpan::between(2011, 2010),
        &[1],
        &CancellationToken::new(),
    )
    .await
    .unwrap();
    assert_eq!(again.documents_saved, 0);
    assert_eq!(again.documents_skipped, 2);

    let rows = read_rows(&output.path().join("2011").join(LEDGER_FILE)).unwrap();
    assert_eq!(rows.len(), 1);
}

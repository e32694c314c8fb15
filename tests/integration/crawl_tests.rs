//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for a CivicWeb site and run full
//! subdomain crawls end-to-end against temporary state and output
//! directories.

use civicweb_harvester::config::{
    Config, CrawlerConfig, OutputConfig, SubdomainEntry, UserAgentConfig,
};
use civicweb_harvester::crawler::{build_crawler, run_harvest, HarvestOptions};
use civicweb_harvester::state::CrawlPhase;
use civicweb_harvester::storage::{CrawlStateStore, FileStateStore};
use std::path::{Path, PathBuf};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SUBDOMAIN: &str = "springfield";

/// Creates a test configuration pointing every subdomain at the mock server
fn create_test_config(server: &MockServer, dir: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            folder_delay_ms: 0,
            site_url_template: server.uri(),
            ..CrawlerConfig::default()
        },
        user_agent: UserAgentConfig::default(),
        output: OutputConfig {
            documents_root: dir.join("out").display().to_string(),
            state_dir: dir.join("state").display().to_string(),
            cache_path: dir.join("cache.sqlite").display().to_string(),
        },
        subdomains: vec![SubdomainEntry {
            name: SUBDOMAIN.to_string(),
        }],
    }
}

fn folder_link(href: &str, name: &str) -> String {
    format!(r#"<a class="folder-link" href="{}">{}</a>"#, href, name)
}

fn document_link(href: &str, name: &str) -> String {
    format!(r#"<a class="document-link" href="{}">{}</a>"#, href, name)
}

async fn mount_listing(server: &MockServer, page: &str, links: &[String]) {
    let body = format!("<html><body>{}</body></html>", links.join("\n"));
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"))
        .mount(server)
        .await;
}

async fn mount_document(server: &MockServer, page: &str, body: &[u8], content_type: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_vec(), content_type))
        .mount(server)
        .await;
}

/// Root with one folder "Agendas" holding a PDF and a file of unknown type
async fn mount_agendas_site(server: &MockServer) {
    mount_listing(
        server,
        "/filepro/documents/",
        &[folder_link("/filepro/documents/12/", "Agendas")],
    )
    .await;
    mount_listing(
        server,
        "/filepro/documents/12/",
        &[
            document_link("/document/101", "Minutes"),
            document_link("/document/102", "Notes"),
        ],
    )
    .await;
    mount_document(
        server,
        "/document/101",
        b"%PDF-1.4 minutes",
        "application/pdf",
    )
    .await;
    mount_document(
        server,
        "/document/102",
        b"opaque",
        "application/x-totally-unknown-type",
    )
    .await;
}

fn state_store(dir: &Path) -> FileStateStore {
    FileStateStore::open(&dir.join("state")).expect("Failed to open state store")
}

fn files_under(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries {
            let path = entry.expect("Failed to read dir entry").path();
            if path.is_dir() {
                pending.push(path);
            } else {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}

#[tokio::test]
async fn test_agendas_scenario() {
    let server = MockServer::start().await;
    mount_agendas_site(&server).await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = create_test_config(&server, dir.path());

    let mut crawler = build_crawler(&config).expect("Failed to build crawler");
    let outcome = crawler.crawl(SUBDOMAIN).await.expect("Crawl failed");

    assert!(outcome.complete);
    assert_eq!(outcome.phase, CrawlPhase::Completed);
    assert_eq!(outcome.document_count, 2);
    assert_eq!(outcome.error_count, 1);

    let checkpoint = state_store(dir.path())
        .load(SUBDOMAIN)
        .expect("Failed to load checkpoint")
        .expect("Checkpoint missing");

    let visited: Vec<_> = checkpoint.visited.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(visited, vec!["", "Agendas"]);
    assert!(checkpoint.frontier.is_empty());
    assert_eq!(checkpoint.records.len(), 2);

    let minutes = checkpoint
        .records
        .get("/document/101", "/filepro/documents/12/")
        .expect("Minutes record missing");
    assert_eq!(minutes.error, "");
    assert_eq!(minutes.name, "Minutes.pdf");
    assert_eq!(minutes.file_type, "application/pdf");
    assert_eq!(minutes.parent_path, "Agendas");
    assert_eq!(minutes.subdomain, SUBDOMAIN);
    assert!(!minutes.scraped_at.is_empty());

    let notes = checkpoint
        .records
        .get("/document/102", "/filepro/documents/12/")
        .expect("Notes record missing");
    assert!(!notes.error.is_empty());
    assert_eq!(notes.name, "Notes");
    assert!(notes.scraped_at.is_empty());

    let out = dir.path().join("out");
    assert_eq!(
        files_under(&out),
        vec![out.join(SUBDOMAIN).join("Agendas").join("Minutes.pdf")]
    );

    let registry = state_store(dir.path()).load_registry().unwrap();
    assert_eq!(registry[SUBDOMAIN].document_count, 2);
    assert!(registry[SUBDOMAIN].complete);
}

#[tokio::test]
async fn test_failed_folder_listing_is_set_aside() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "/filepro/documents/",
        &[
            folder_link("/filepro/documents/1/", "Broken"),
            folder_link("/filepro/documents/2/", "Bylaws"),
        ],
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/filepro/documents/1/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_listing(
        &server,
        "/filepro/documents/2/",
        &[document_link("/document/7", "Bylaw 7")],
    )
    .await;
    mount_document(&server, "/document/7", b"%PDF", "application/pdf").await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());
    let mut crawler = build_crawler(&config).unwrap();
    let outcome = crawler.crawl(SUBDOMAIN).await.unwrap();

    assert!(outcome.complete);
    assert_eq!(outcome.folders_failed, 1);
    assert_eq!(outcome.document_count, 1);

    let checkpoint = state_store(dir.path()).load(SUBDOMAIN).unwrap().unwrap();
    let visited: Vec<_> = checkpoint.visited.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(visited, vec!["", "Bylaws"]);
    assert_eq!(checkpoint.failed.len(), 1);
    assert_eq!(checkpoint.failed[0].name, "Broken");
    assert!(checkpoint.frontier.is_empty());
}

#[tokio::test]
async fn test_bootstrap_failure_reports_incomplete() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/filepro/documents/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());
    let mut crawler = build_crawler(&config).unwrap();
    let outcome = crawler.crawl(SUBDOMAIN).await.unwrap();

    assert_eq!(outcome.document_count, 0);
    assert!(!outcome.complete);
    assert!(outcome.bootstrap_error.is_some());

    let store = state_store(dir.path());
    assert!(store.load(SUBDOMAIN).unwrap().is_none());
    assert!(!store.load_registry().unwrap()[SUBDOMAIN].complete);
}

#[tokio::test]
async fn test_breadth_first_order() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "/filepro/documents/",
        &[
            folder_link("/filepro/documents/a/", "A"),
            folder_link("/filepro/documents/b/", "B"),
        ],
    )
    .await;
    mount_listing(
        &server,
        "/filepro/documents/a/",
        &[folder_link("/filepro/documents/a1/", "A1")],
    )
    .await;
    mount_listing(
        &server,
        "/filepro/documents/b/",
        &[folder_link("/filepro/documents/b1/", "B1")],
    )
    .await;
    mount_listing(
        &server,
        "/filepro/documents/a1/",
        &[folder_link("/filepro/documents/a2/", "A2")],
    )
    .await;
    mount_listing(&server, "/filepro/documents/b1/", &[]).await;
    mount_listing(&server, "/filepro/documents/a2/", &[]).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());
    let mut crawler = build_crawler(&config).unwrap();
    crawler.crawl(SUBDOMAIN).await.unwrap();

    let checkpoint = state_store(dir.path()).load(SUBDOMAIN).unwrap().unwrap();
    let visited: Vec<_> = checkpoint.visited.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(visited, vec!["", "A", "B", "A1", "B1", "A2"]);

    for pair in checkpoint.visited.windows(2) {
        assert!(pair[0].depth() <= pair[1].depth());
    }

    let a2 = checkpoint.visited.last().unwrap();
    assert_eq!(a2.parent_path, vec!["A", "A1"]);
    assert_eq!(a2.parent_url, "/filepro/documents/a1/");
}

#[tokio::test]
async fn test_resume_matches_uninterrupted_run() {
    let server = MockServer::start().await;
    mount_agendas_site(&server).await;

    // Uninterrupted
    let full_dir = tempfile::tempdir().unwrap();
    let full_config = create_test_config(&server, full_dir.path());
    let mut crawler = build_crawler(&full_config).unwrap();
    crawler.crawl(SUBDOMAIN).await.unwrap();
    let full = state_store(full_dir.path()).load(SUBDOMAIN).unwrap().unwrap();

    // Stopped after the root, then resumed
    let resumed_dir = tempfile::tempdir().unwrap();
    let resumed_config = create_test_config(&server, resumed_dir.path());
    let mut crawler = build_crawler(&resumed_config)
        .unwrap()
        .with_folder_budget(Some(1));
    let first = crawler.crawl(SUBDOMAIN).await.unwrap();
    assert_eq!(first.phase, CrawlPhase::Suspended);
    assert_eq!(first.folders_pending, 1);
    assert!(!state_store(resumed_dir.path()).load_registry().unwrap()[SUBDOMAIN].complete);

    let mut crawler = build_crawler(&resumed_config).unwrap();
    let second = crawler.crawl(SUBDOMAIN).await.unwrap();
    assert!(second.complete);

    let resumed = state_store(resumed_dir.path()).load(SUBDOMAIN).unwrap().unwrap();
    let keys = |records: &civicweb_harvester::state::RecordSet| -> Vec<(String, String, String)> {
        records
            .iter()
            .map(|r| (r.url.clone(), r.parent_url.clone(), r.name.clone()))
            .collect()
    };
    assert_eq!(keys(&resumed.records), keys(&full.records));
    assert_eq!(resumed.visited, full.visited);
}

#[tokio::test]
async fn test_reprocessing_a_folder_adds_no_duplicates() {
    let server = MockServer::start().await;
    mount_agendas_site(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());
    let mut crawler = build_crawler(&config).unwrap();
    crawler.crawl(SUBDOMAIN).await.unwrap();

    // As if the process died after downloading but before the folder was logged
    let mut store = state_store(dir.path());
    let mut checkpoint = store.load(SUBDOMAIN).unwrap().unwrap();
    let agendas = checkpoint.visited.pop().unwrap();
    checkpoint.frontier.push_back(agendas);
    store.save(SUBDOMAIN, &checkpoint).unwrap();

    let mut crawler = build_crawler(&config).unwrap();
    let outcome = crawler.crawl(SUBDOMAIN).await.unwrap();

    assert!(outcome.complete);
    assert_eq!(outcome.document_count, 2);

    let csv_text = std::fs::read_to_string(store.tracking_path(SUBDOMAIN)).unwrap();
    assert_eq!(csv_text.lines().count(), 3);
}

#[tokio::test]
async fn test_fresh_run_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/filepro/documents/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(document_link("/document/1", "Agenda"), "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/document/1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF".to_vec(), "application/pdf"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());
    let options = HarvestOptions {
        fresh: true,
        ..HarvestOptions::default()
    };

    let first = run_harvest(&config, &options).await.unwrap();
    let second = run_harvest(&config, &options).await.unwrap();

    assert_eq!(first.total_documents(), 1);
    assert_eq!(second.total_documents(), 1);
    assert!(second.all_complete());

    let record = state_store(dir.path())
        .load(SUBDOMAIN)
        .unwrap()
        .unwrap()
        .records
        .get("/document/1", "/filepro/documents/")
        .cloned()
        .unwrap();
    assert!(record.is_success());
    assert!(dir.path().join("out").join(SUBDOMAIN).join("Agenda.pdf").exists());
}

#[tokio::test]
async fn test_complete_subdomains_skipped() {
    let server = MockServer::start().await;
    mount_agendas_site(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());

    let first = run_harvest(&config, &HarvestOptions::default()).await.unwrap();
    assert!(first.all_complete());
    assert!(first.skipped().is_empty());

    let second = run_harvest(&config, &HarvestOptions::default()).await.unwrap();
    assert!(second.outcomes().is_empty());
    assert_eq!(second.skipped(), [SUBDOMAIN.to_string()]);

    let forced = run_harvest(
        &config,
        &HarvestOptions {
            include_complete: true,
            ..HarvestOptions::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(forced.outcomes().len(), 1);
    assert_eq!(forced.total_documents(), 2);
}

#[tokio::test]
async fn test_relative_links_are_resolved() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "/filepro/documents/",
        &[folder_link("12/", "Agendas")],
    )
    .await;
    mount_listing(
        &server,
        "/filepro/documents/12/",
        &[document_link("../../../document/101", "Minutes")],
    )
    .await;
    mount_document(&server, "/document/101", b"%PDF-1.4", "application/pdf").await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());

    let mut crawler = build_crawler(&config).unwrap();
    let outcome = crawler.crawl(SUBDOMAIN).await.unwrap();

    assert!(outcome.complete);
    assert_eq!(outcome.folders_failed, 0);
    assert_eq!(outcome.error_count, 0);

    let checkpoint = state_store(dir.path()).load(SUBDOMAIN).unwrap().unwrap();
    let agendas = &checkpoint.visited[1];
    assert_eq!(agendas.url, "/filepro/documents/12/");

    let minutes = checkpoint
        .records
        .get("/document/101", "/filepro/documents/12/")
        .expect("Minutes record missing");
    assert_eq!(minutes.name, "Minutes.pdf");
    assert!(dir
        .path()
        .join("out")
        .join(SUBDOMAIN)
        .join("Agendas")
        .join("Minutes.pdf")
        .exists());
}

#[tokio::test]
async fn test_failing_subdomain_does_not_stop_the_run() {
    let server = MockServer::start().await;
    mount_agendas_site(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&server, dir.path());
    config.subdomains.insert(
        0,
        SubdomainEntry {
            name: "shelbyville".to_string(),
        },
    );

    let state = dir.path().join("state");
    std::fs::create_dir_all(&state).unwrap();
    std::fs::write(state.join("shelbyville_folders.json"), b"{ not json").unwrap();

    let summary = run_harvest(&config, &HarvestOptions::default()).await.unwrap();

    assert_eq!(summary.failed().len(), 1);
    assert_eq!(summary.failed()[0].0, "shelbyville");
    assert_eq!(summary.outcomes().len(), 1);
    assert_eq!(summary.outcomes()[0].subdomain, SUBDOMAIN);
    assert!(summary.outcomes()[0].complete);
    assert!(!summary.all_complete());
    assert!(summary.render().contains("shelbyville"));
}

#[tokio::test]
async fn test_invalid_requested_subdomain_rejected() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());

    let options = HarvestOptions {
        subdomains: vec!["not a label".to_string()],
        ..HarvestOptions::default()
    };

    assert!(run_harvest(&config, &options).await.is_err());
    assert!(server.received_requests().await.unwrap().is_empty());
}

//! End-to-end tests of the harvest pipeline against SQLite and a local
//! HTTP stand-in for the search API.

mod common;

use channel_harvester::fetcher::HttpPageFetcher;
use channel_harvester::harvest::KeywordEnd;
use channel_harvester::ingest::run_harvest_with_source;
use channel_harvester::models::ChannelRecord;
use channel_harvester::store::{CursorStore, RecordStore, SqliteStore};
use channel_harvester::{db, migrate};
use tempfile::TempDir;

use common::{page_json, test_config, FakeApi};

async fn open_store(cfg: &channel_harvester::config::Config) -> SqliteStore {
    let pool = db::connect(cfg).await.unwrap();
    migrate::apply_schema(&pool).await.unwrap();
    SqliteStore::new(pool)
}

fn record(name: &str, email: Option<&str>, phone: Option<&str>) -> ChannelRecord {
    ChannelRecord {
        name: name.to_string(),
        description: "desc".to_string(),
        email: email.map(str::to_string),
        phone_number: phone.map(str::to_string),
        keyword: "learn italian".to_string(),
        subscriber_count: 100,
    }
}

// ─── Stores ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cursor_upsert_keeps_one_row_per_keyword() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path(), "http://127.0.0.1:9");
    let store = open_store(&cfg).await;

    assert_eq!(store.get_cursor("learn english").await.unwrap(), None);

    store.upsert_cursor("learn english", "c1").await.unwrap();
    assert_eq!(store.get_cursor("learn english").await.unwrap().as_deref(), Some("c1"));

    store.upsert_cursor("learn english", "c2").await.unwrap();
    store.upsert_cursor("learn english", "c2").await.unwrap();
    store.upsert_cursor("learn korean", "k1").await.unwrap();

    assert_eq!(store.get_cursor("learn english").await.unwrap().as_deref(), Some("c2"));
    let rows: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM channel_cursors WHERE keyword = 'learn english'")
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!(rows, 1);
    assert_eq!(store.list_cursors().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_add_batch_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path(), "http://127.0.0.1:9");
    let store = open_store(&cfg).await;

    let batch = vec![
        record("A", Some("a@x.com"), None),
        record("B", Some("b@x.com"), Some("+1 415.555.0199")),
        record("C", None, Some("555-123-4567")),
    ];

    assert_eq!(store.add_batch(&batch).await.unwrap(), 3);
    assert_eq!(store.add_batch(&batch).await.unwrap(), 0);

    let stored = store.list().await.unwrap();
    assert_eq!(stored.len(), 3);
    let names: Vec<&str> = stored.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn test_add_batch_matches_on_name_and_email() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path(), "http://127.0.0.1:9");
    let store = open_store(&cfg).await;

    store.add_batch(&[record("A", Some("shared@x.com"), None)]).await.unwrap();

    // same email, different name: a different identity
    let inserted = store
        .add_batch(&[
            record("A", Some("shared@x.com"), None),
            record("A (backup)", Some("shared@x.com"), None),
        ])
        .await
        .unwrap();
    assert_eq!(inserted, 1);
    assert_eq!(store.count().await.unwrap(), 2);
}

/// Records inside one batch are only checked against what was already
/// stored, never against each other. A batch carrying the same
/// (name, email) twice stores it twice.
#[tokio::test]
async fn test_add_batch_does_not_dedup_within_batch() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path(), "http://127.0.0.1:9");
    let store = open_store(&cfg).await;

    let batch = vec![
        record("Twin", Some("twin@x.com"), None),
        record("Twin", Some("twin@x.com"), None),
        record("Other", Some("twin@x.com"), None),
    ];
    assert_eq!(store.add_batch(&batch).await.unwrap(), 3);

    // against stored state the pairs are recognised again
    assert_eq!(store.add_batch(&batch).await.unwrap(), 0);
    assert_eq!(store.count().await.unwrap(), 3);
}

// ─── Harvest against the HTTP API ───────────────────────────────────

#[tokio::test]
async fn test_first_run_starts_at_empty_cursor_and_stores_next() {
    let api = FakeApi::start(vec![
        (200, page_json(&[("A", "contact: a@x.com", 10)], "abc")),
        (200, page_json(&[], "")),
    ])
    .await;
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path(), &api.base_url);
    let fetcher = HttpPageFetcher::new(&cfg.api).unwrap();

    let report = run_harvest_with_source(&cfg, &fetcher, Some("learn spanish"), true)
        .await
        .unwrap();

    let requests = api.requests();
    assert_eq!(requests[0].raw_query, "q=learn%20spanish&sortTypeId=1&cursor=");
    assert_eq!(requests[0].query["q"], "learn spanish");
    assert_eq!(requests[0].body["subscribers"]["type"], "range");
    assert_eq!(requests[0].body["subscribers"]["from"], 50);
    assert_eq!(requests[0].body["subscribers"]["to"], 100_000_000);
    assert_eq!(requests[1].query["cursor"], "abc");

    let store = open_store(&cfg).await;
    let stored = store.list().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "A");
    assert_eq!(stored[0].email.as_deref(), Some("a@x.com"));
    assert_eq!(stored[0].phone_number, None);
    assert_eq!(stored[0].subscriber_count, 10);
    assert_eq!(store.get_cursor("learn spanish").await.unwrap().as_deref(), Some("abc"));
    assert_eq!(report.total_saved(), 1);
}

#[tokio::test]
async fn test_resumed_run_saves_terminal_page_without_advancing_cursor() {
    let api = FakeApi::start(vec![(
        200,
        page_json(&[("B", "mail me: b@y.org, WhatsApp: +34 612 345 678", 20)], ""),
    )])
    .await;
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path(), &api.base_url);
    open_store(&cfg).await.upsert_cursor("learn spanish", "abc").await.unwrap();
    let fetcher = HttpPageFetcher::new(&cfg.api).unwrap();

    let report = run_harvest_with_source(&cfg, &fetcher, Some("learn spanish"), true)
        .await
        .unwrap();

    assert_eq!(api.requests().len(), 1);
    assert_eq!(api.requests()[0].query["cursor"], "abc");
    assert_eq!(report.keywords[0].end, KeywordEnd::Exhausted);

    let store = open_store(&cfg).await;
    let stored = store.list().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].email.as_deref(), Some("b@y.org"));
    assert_eq!(stored[0].phone_number.as_deref(), Some("+34 612 345 678"));
    assert_eq!(store.get_cursor("learn spanish").await.unwrap().as_deref(), Some("abc"));
}

#[tokio::test]
async fn test_rate_limited_first_page_changes_nothing() {
    let api = FakeApi::start(vec![(429, "slow down".to_string())]).await;
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path(), &api.base_url);
    open_store(&cfg).await.upsert_cursor("learn spanish", "before").await.unwrap();
    let fetcher = HttpPageFetcher::new(&cfg.api).unwrap();

    let report = run_harvest_with_source(&cfg, &fetcher, Some("learn spanish"), true)
        .await
        .unwrap();

    assert!(matches!(report.keywords[0].end, KeywordEnd::Aborted { .. }));
    let store = open_store(&cfg).await;
    assert_eq!(store.count().await.unwrap(), 0);
    assert_eq!(
        store.get_cursor("learn spanish").await.unwrap().as_deref(),
        Some("before")
    );
}

#[tokio::test]
async fn test_page_keeps_only_contact_bearing_channels() {
    let api = FakeApi::start(vec![(
        200,
        page_json(
            &[
                ("Has Contact", "Business inquiries: biz@school.com", 500),
                ("No Contact", "New videos every Monday", 800),
            ],
            "",
        ),
    )])
    .await;
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path(), &api.base_url);
    let fetcher = HttpPageFetcher::new(&cfg.api).unwrap();

    let report = run_harvest_with_source(&cfg, &fetcher, Some("learn english"), true)
        .await
        .unwrap();

    assert_eq!(report.keywords[0].fetched, 2);
    let stored = open_store(&cfg).await.list().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Has Contact");
    assert_eq!(stored[0].keyword, "learn english");
}

#[tokio::test]
async fn test_failures_stop_one_keyword_and_the_run_continues() {
    let api = FakeApi::start(vec![
        // learn german: one good page, then a server error
        (200, page_json(&[("G", "g@de.de", 1)], "g-2")),
        (503, "unavailable".to_string()),
        // learn japanese: malformed body
        (200, "<html>captcha</html>".to_string()),
        // learn korean: completes
        (200, page_json(&[("K", "k@kr.kr", 1)], "")),
    ])
    .await;
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path(), &api.base_url);
    let fetcher = HttpPageFetcher::new(&cfg.api).unwrap();

    let report = run_harvest_with_source(
        &cfg,
        &fetcher,
        Some("learn german, learn japanese, learn korean"),
        true,
    )
    .await
    .unwrap();

    assert_eq!(report.keywords.len(), 3);
    assert!(matches!(report.keywords[0].end, KeywordEnd::Aborted { .. }));
    assert!(matches!(report.keywords[1].end, KeywordEnd::Aborted { .. }));
    assert_eq!(report.keywords[2].end, KeywordEnd::Exhausted);

    let store = open_store(&cfg).await;
    assert_eq!(store.count().await.unwrap(), 2);
    assert_eq!(store.get_cursor("learn german").await.unwrap().as_deref(), Some("g-2"));
    assert_eq!(store.get_cursor("learn japanese").await.unwrap(), None);
    assert_eq!(store.get_cursor("learn korean").await.unwrap(), None);
}

#[tokio::test]
async fn test_rerun_after_crash_does_not_duplicate() {
    // Same page served on two runs, as if the cursor write had been lost.
    let page = page_json(&[("A", "a@x.com", 1), ("B", "+44 20 7946 0958", 2)], "");
    let api = FakeApi::start(vec![(200, page.clone()), (200, page)]).await;
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path(), &api.base_url);
    let fetcher = HttpPageFetcher::new(&cfg.api).unwrap();

    run_harvest_with_source(&cfg, &fetcher, Some("learn spanish"), true)
        .await
        .unwrap();
    let second = run_harvest_with_source(&cfg, &fetcher, Some("learn spanish"), true)
        .await
        .unwrap();

    assert_eq!(second.total_saved(), 0);
    assert_eq!(open_store(&cfg).await.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_keywords_from_config_when_not_overridden() {
    let api = FakeApi::start(vec![]).await;
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path(), &api.base_url);
    let fetcher = HttpPageFetcher::new(&cfg.api).unwrap();

    let report = run_harvest_with_source(&cfg, &fetcher, None, true).await.unwrap();

    assert_eq!(report.keywords.len(), 1);
    assert_eq!(report.keywords[0].keyword, "learn spanish");
    assert_eq!(report.keywords[0].end, KeywordEnd::EmptyPage);
}

#[tokio::test]
async fn test_empty_keyword_list_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path(), "http://127.0.0.1:9");
    let fetcher = HttpPageFetcher::new(&cfg.api).unwrap();

    let err = run_harvest_with_source(&cfg, &fetcher, Some(" , "), true)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("No keywords"));
}

//! End-to-end Facebook harvest against a local Graph API stand-in.
//!
//! Every request goes through the real `HttpClient`; the server answers the
//! main feeds with a fallback mock and the per-kind reaction requests with
//! higher-priority mocks keyed on the `fields` parameter.

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pulse_core::{Channel, FacebookSource, RecordKind};
use pulse_scraper::{FacebookHarvester, HarvestSettings, HttpClient, RetryPolicy, ScraperError};

const KINDS: [&str; 6] = ["LIKE", "LOVE", "WOW", "HAHA", "SAD", "ANGRY"];

fn test_client() -> HttpClient {
    HttpClient::new(5, "pulse-test/0.1", RetryPolicy::bounded(2, Duration::ZERO))
        .expect("failed to build test HttpClient")
}

fn settings(dir: &std::path::Path) -> HarvestSettings {
    HarvestSettings {
        out_dir: dir.to_path_buf(),
        name: "acme".to_owned(),
        tz_offset_hours: 8,
        batch_size: 100,
        page_size: 100,
        reply_depth: 1,
        max_pages: Some(10),
    }
}

async fn mount_feed(server: &MockServer, at: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .with_priority(10)
        .mount(server)
        .await;
}

/// One mock per reaction kind for the page at `at`.
async fn mount_reactions(server: &MockServer, at: &str, counts: &[(&str, [u64; 6])]) {
    for (k, kind) in KINDS.iter().enumerate() {
        let data: Vec<Value> = counts
            .iter()
            .map(|(id, c)| json!({"id": id, "reactions": {"summary": {"total_count": c[k]}}}))
            .collect();
        Mock::given(method("GET"))
            .and(path(at))
            .and(query_param(
                "fields",
                format!("reactions.type({kind}).limit(0).summary(total_count)"),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"data": data})))
            .with_priority(1)
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn harvest_writes_profile_posts_and_nested_comments() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    let target = FacebookSource {
        page: "acme".to_owned(),
        since: None,
        insight_days: 0,
        api_base: Some(server.uri()),
    };

    mount_feed(
        &server,
        "/acme",
        json!({"name": "Acme Tea", "username": "acme", "id": "1", "fan_count": 900, "link": "https://fb.test/acme"}),
    )
    .await;
    mount_feed(
        &server,
        "/acme/posts",
        json!({"data": [{
            "id": "p1", "message": "hello", "type": "status", "created_time": "2018-01-01T00:00:00+0000",
            "reactions": {"summary": {"total_count": 5}},
            "comments": {"summary": {"total_count": 1}},
            "shares": {"count": 2}
        }]}),
    )
    .await;
    mount_reactions(&server, "/acme/posts", &[("p1", [3, 1, 0, 0, 0, 0])]).await;

    mount_feed(
        &server,
        "/p1/comments",
        json!({"data": [{
            "id": "c1", "message": "nice", "from": {"name": "Fan"}, "created_time": "2018-01-01T01:00:00+0000",
            "comment_count": 1, "reactions": {"summary": {"total_count": 2}}
        }], "paging": {"cursors": {"after": "x"}}}),
    )
    .await;
    mount_reactions(&server, "/p1/comments", &[("c1", [2, 0, 0, 0, 0, 0])]).await;

    mount_feed(
        &server,
        "/c1/comments",
        json!({"data": [{
            "id": "r1", "message": "thanks", "from": {"name": "Acme Tea"},
            "created_time": "2018-01-01T02:00:00+0000", "comment_count": 0
        }]}),
    )
    .await;
    mount_reactions(&server, "/c1/comments", &[]).await;

    let client = test_client();
    let summary = FacebookHarvester::new(&client, &settings, &target, "t")
        .run()
        .await
        .expect("harvest should succeed");

    assert_eq!(summary.profiles, 1);
    assert_eq!(summary.posts, 1);
    assert_eq!(summary.comments, 2);
    assert_eq!(summary.reaction_drift, 0);

    let posts =
        std::fs::read_to_string(settings.path(Channel::Facebook, RecordKind::Post)).unwrap();
    let lines: Vec<&str> = posts.lines().collect();
    assert_eq!(lines.len(), 2, "header plus one post: {posts}");
    assert_eq!(
        lines[1],
        "p1,hello,,status,,2018-01-01 08:00:00,5,1,2,3,1,0,0,0,0,1"
    );

    let comments =
        std::fs::read_to_string(settings.path(Channel::Facebook, RecordKind::Comment)).unwrap();
    let lines: Vec<&str> = comments.lines().collect();
    assert_eq!(lines.len(), 3, "header plus comment and reply: {comments}");
    assert_eq!(lines[1], "c1,p1,,nice,Fan,2018-01-01 09:00:00,2,2,0,0,0,0,0,0");
    assert_eq!(
        lines[2],
        "r1,p1,c1,thanks,Acme Tea,2018-01-01 10:00:00,0,0,0,0,0,0,0,0"
    );
}

/// Breakdown requests (`fields=reactions.type(..)`) received for `at`.
async fn breakdown_requests(server: &MockServer, at: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == at)
        .filter(|r| {
            r.url
                .query_pairs()
                .any(|(k, v)| k == "fields" && v.starts_with("reactions.type("))
        })
        .count()
}

#[tokio::test]
async fn each_comment_page_breakdown_is_fetched_once() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    let target = FacebookSource {
        page: "acme".to_owned(),
        since: None,
        insight_days: 0,
        api_base: Some(server.uri()),
    };

    mount_feed(&server, "/acme", json!({"name": "Acme Tea", "id": "1"})).await;
    mount_feed(
        &server,
        "/acme/posts",
        json!({"data": [{"id": "p1", "created_time": "2018-01-01T00:00:00+0000",
            "comments": {"summary": {"total_count": 2}}}]}),
    )
    .await;
    mount_reactions(&server, "/acme/posts", &[("p1", [0; 6])]).await;

    // the sibling c2 comes after the walk has descended into c1's replies
    mount_feed(
        &server,
        "/p1/comments",
        json!({"data": [
            {"id": "c1", "message": "first", "created_time": "2018-01-01T01:00:00+0000",
             "comment_count": 1, "reactions": {"summary": {"total_count": 1}}},
            {"id": "c2", "message": "second", "created_time": "2018-01-01T01:30:00+0000",
             "comment_count": 0, "reactions": {"summary": {"total_count": 4}}}
        ]}),
    )
    .await;
    mount_reactions(
        &server,
        "/p1/comments",
        &[("c1", [1, 0, 0, 0, 0, 0]), ("c2", [2, 0, 0, 1, 0, 0])],
    )
    .await;
    mount_feed(
        &server,
        "/c1/comments",
        json!({"data": [{"id": "r1", "message": "reply", "created_time": "2018-01-01T02:00:00+0000"}]}),
    )
    .await;
    mount_reactions(&server, "/c1/comments", &[]).await;

    let client = test_client();
    let summary = FacebookHarvester::new(&client, &settings, &target, "t")
        .run()
        .await
        .expect("harvest should succeed");
    assert_eq!(summary.comments, 3);

    assert_eq!(breakdown_requests(&server, "/p1/comments").await, KINDS.len());
    assert_eq!(breakdown_requests(&server, "/c1/comments").await, KINDS.len());

    let comments =
        std::fs::read_to_string(settings.path(Channel::Facebook, RecordKind::Comment)).unwrap();
    let ids: Vec<&str> = comments
        .lines()
        .skip(1)
        .filter_map(|l| l.split(',').next())
        .collect();
    assert_eq!(ids, ["c1", "r1", "c2"]);
    assert!(comments.contains("c2,p1,,second,,2018-01-01 09:30:00,4,2,0,0,1,0,0,1\n"));
}

#[tokio::test]
async fn page_insights_are_pivoted_one_row_per_day() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    let target = FacebookSource {
        page: "acme".to_owned(),
        since: None,
        insight_days: 4,
        api_base: Some(server.uri()),
    };

    mount_feed(&server, "/acme", json!({"name": "Acme Tea", "id": "1"})).await;
    mount_feed(&server, "/acme/posts", json!({"data": []})).await;

    let previous = |until: &str| {
        format!(
            "{}/acme/insights?metric=page_impressions&period=day&until={until}",
            server.uri()
        )
    };
    mount_feed(
        &server,
        "/acme/insights",
        json!({"data": [
            {"name": "page_impressions", "period": "day", "values": [
                {"value": 10, "end_time": "2018-01-01T08:00:00+0000"},
                {"value": 12, "end_time": "2018-01-02T08:00:00+0000"}
            ]},
            {"name": "page_content_activity_by_action_type_unique", "period": "day", "values": [
                {"value": {"like": 3}, "end_time": "2018-01-02T08:00:00+0000"}
            ]}
        ], "paging": {"previous": previous("1514764800")}}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/acme/insights"))
        .and(query_param("until", "1514764800"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"data": [
            {"name": "page_impressions", "period": "day", "values": [
                {"value": 7, "end_time": "2017-12-30T08:00:00+0000"},
                {"value": 8, "end_time": "2017-12-31T08:00:00+0000"}
            ]}
        ], "paging": {"previous": previous("1514592000")}})))
        .with_priority(1)
        .mount(&server)
        .await;

    let client = test_client();
    let summary = FacebookHarvester::new(&client, &settings, &target, "t")
        .run()
        .await
        .expect("harvest should succeed");
    assert_eq!(summary.reports, 4);

    // four days at two days per window
    let insight_requests = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/acme/insights")
        .count();
    assert_eq!(insight_requests, 2);

    let report = std::fs::read_to_string(settings.report_path(Channel::Facebook, "insights")).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines.len(), 5, "header plus four days: {report}");
    assert!(lines[0].starts_with("date,page_content_activity_by_action_type_unique,page_impressions,"));
    let blanks = ",".repeat(12);
    assert_eq!(lines[1], format!("2017-12-30 16:00:00,,7{blanks}"));
    assert_eq!(lines[3], format!("2018-01-01 16:00:00,,10{blanks}"));
    assert_eq!(
        lines[4],
        format!(r#"2018-01-02 16:00:00,"{{""like"":3}}",12{blanks}"#)
    );
}

#[tokio::test]
async fn second_run_appends_without_repeating_header() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    let target = FacebookSource {
        page: "acme".to_owned(),
        since: None,
        insight_days: 0,
        api_base: Some(server.uri()),
    };

    mount_feed(&server, "/acme", json!({"name": "Acme Tea", "id": "1"})).await;
    mount_feed(
        &server,
        "/acme/posts",
        json!({"data": [{"id": "p1", "message": "hi", "created_time": "2018-01-01T00:00:00+0000"}]}),
    )
    .await;
    mount_reactions(&server, "/acme/posts", &[("p1", [0; 6])]).await;
    mount_feed(&server, "/p1/comments", json!({"data": []})).await;

    let client = test_client();
    for _ in 0..2 {
        FacebookHarvester::new(&client, &settings, &target, "t")
            .run()
            .await
            .expect("harvest should succeed");
    }

    let posts =
        std::fs::read_to_string(settings.path(Channel::Facebook, RecordKind::Post)).unwrap();
    assert_eq!(posts.matches("status_id").count(), 1);
    assert_eq!(posts.lines().count(), 3);
}

#[tokio::test]
async fn server_error_surfaces_after_bounded_retries() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    let target = FacebookSource {
        page: "acme".to_owned(),
        since: None,
        insight_days: 0,
        api_base: Some(server.uri()),
    };

    Mock::given(method("GET"))
        .and(path("/acme"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client();
    let result = FacebookHarvester::new(&client, &settings, &target, "t")
        .run()
        .await;

    assert!(
        matches!(result, Err(ScraperError::UnexpectedStatus { status: 500, .. })),
        "expected UnexpectedStatus(500), got: {result:?}"
    );
}

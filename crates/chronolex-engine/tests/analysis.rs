//! End-to-end engine tests against temp files and a mock ledger API.

use std::path::PathBuf;

use chronolex_core::policy::{BillingPolicy, EngineFlags};
use chronolex_core::types::TimeWindow;
use chronolex_engine::analyze::{AnalyzeRequest, LedgerSpec, SourcesSpec};
use chronolex_engine::{EngineConfig, TimeCaptureEngine};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn window(start: &str, end: &str) -> TimeWindow {
    TimeWindow {
        start: start.parse().unwrap(),
        end: end.parse().unwrap(),
    }
}

fn write_csv(dir: &tempfile::TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("research.csv");
    std::fs::write(&path, content).unwrap();
    path
}

fn ledger_spec(server: &MockServer) -> LedgerSpec {
    LedgerSpec {
        base_url: Some(server.uri()),
        api_token: Some("token-1".into()),
        timeout_ms: Some(5_000),
    }
}

async fn mock_activities(server: &MockServer, activities: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/activities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "activities": activities
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn combines_research_and_ledger_sources() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(
        &dir,
        "timestamp,minutes,query,matter\n\
         2026-03-02 09:00,25,adverse possession elements,M-42\n\
         2026-03-02 09:20,15,adverse possession remedies,M-42\n",
    );
    let server = MockServer::start().await;
    mock_activities(
        &server,
        json!([{
            "id": "act-9",
            "occurredAt": "2026-03-02T15:00:00Z",
            "hours": 1.0,
            "note": "Client meeting re: settlement posture",
            "matterId": "M-42"
        }]),
    )
    .await;

    let engine = TimeCaptureEngine::new(EngineConfig::default());
    let request = AnalyzeRequest {
        window: window("2026-03-02T00:00:00Z", "2026-03-03T00:00:00Z"),
        sources: SourcesSpec {
            research_csv_paths: vec![csv],
            ledger: Some(ledger_spec(&server)),
            ..SourcesSpec::default()
        },
        policy: BillingPolicy::default(),
        flags: EngineFlags::default(),
    };
    let result = engine
        .analyze(&request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.tools_used, vec!["ledger", "research_log"]);
    assert_eq!(result.stats.total_events, 3);
    assert_eq!(result.stats.events_by_source["ledger"], 1);
    assert_eq!(result.stats.events_by_source["research_log"], 2);

    // One research group and one client-meeting group, both on M-42.
    assert_eq!(result.proposals.len(), 2);
    let codes: Vec<&str> = result.proposals.iter().map(|p| p.task_code.as_str()).collect();
    assert!(codes.contains(&"legal_research"));
    assert!(codes.contains(&"client_meeting"));
    let research = result
        .proposals
        .iter()
        .find(|p| p.task_code.as_str() == "legal_research")
        .unwrap();
    assert_eq!(research.actual_minutes, Some(40.0));
}

#[tokio::test]
async fn broken_ledger_does_not_sink_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(
        &dir,
        "timestamp,minutes,query,matter\n\
         2026-03-02 09:00,25,limitation periods,M-7\n",
    );
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/activities"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let engine = TimeCaptureEngine::new(EngineConfig::default());
    let request = AnalyzeRequest {
        window: window("2026-03-02T00:00:00Z", "2026-03-03T00:00:00Z"),
        sources: SourcesSpec {
            research_csv_paths: vec![csv],
            ledger: Some(ledger_spec(&server)),
            ..SourcesSpec::default()
        },
        policy: BillingPolicy::default(),
        flags: EngineFlags::default(),
    };
    let result = engine
        .analyze(&request, &CancellationToken::new())
        .await
        .unwrap();

    // The ledger contributed nothing but the run still produced output.
    assert_eq!(result.tools_used, vec!["research_log"]);
    assert_eq!(result.proposals.len(), 1);
}

#[tokio::test]
async fn finds_gaps_against_recorded_ledger_time() {
    let server = MockServer::start().await;
    mock_activities(
        &server,
        json!([
            {
                "id": "act-1",
                "occurredAt": "2026-03-02T09:00:00Z",
                "hours": 2.5,
                "note": "Drafting"
            },
            {
                "id": "act-2",
                "occurredAt": "2026-03-03T09:00:00Z",
                "hours": 1.0,
                "note": "Research"
            }
        ]),
    )
    .await;

    let engine = TimeCaptureEngine::new(EngineConfig::default());
    let w = window("2026-03-02T00:00:00Z", "2026-03-05T00:00:00Z");
    let gaps = engine.find_gaps(&w, Some(&ledger_spec(&server))).await.unwrap();

    // 150 minutes on the 2nd clears the 120-minute threshold; 60 on the
    // 3rd and nothing on the 4th do not.
    assert_eq!(gaps.len(), 2);
    assert_eq!(gaps[0].date.to_string(), "2026-03-03");
    assert!((gaps[0].deficit_minutes - 60.0).abs() < 1e-9);
    assert_eq!(gaps[1].date.to_string(), "2026-03-04");
    assert!((gaps[1].deficit_minutes - 120.0).abs() < 1e-9);
}

#[tokio::test]
async fn pushes_approved_entries_and_reports_per_entry_outcomes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/activities"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "act-100" })))
        .mount(&server)
        .await;

    let engine = TimeCaptureEngine::new(EngineConfig::default());
    let entries = vec![
        chronolex_connectors::ledger::ApprovedEntry {
            matter_id: "M-42".into(),
            date: "2026-03-02".parse().unwrap(),
            minutes: 54.0,
            description: "Legal research re: adverse possession".into(),
        },
        // Invalid entry: rejected locally, batch continues.
        chronolex_connectors::ledger::ApprovedEntry {
            matter_id: String::new(),
            date: "2026-03-02".parse().unwrap(),
            minutes: 30.0,
            description: "No matter".into(),
        },
    ];
    let outcomes = engine
        .push_entries(&ledger_spec(&server), &entries, false)
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].ok);
    assert_eq!(outcomes[0].id.as_deref(), Some("act-100"));
    assert!(!outcomes[1].ok);
    assert!(outcomes[1].error.as_deref().unwrap().contains("matterId"));
}

#[tokio::test]
async fn dry_run_push_never_calls_the_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/activities"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "act-100" })))
        .expect(0)
        .mount(&server)
        .await;

    let engine = TimeCaptureEngine::new(EngineConfig::default());
    let entries = vec![chronolex_connectors::ledger::ApprovedEntry {
        matter_id: "M-42".into(),
        date: "2026-03-02".parse().unwrap(),
        minutes: 54.0,
        description: "Legal research".into(),
    }];
    let outcomes = engine
        .push_entries(&ledger_spec(&server), &entries, true)
        .await
        .unwrap();
    assert!(outcomes[0].ok);
    assert_eq!(outcomes[0].id.as_deref(), Some("dry-run"));
}

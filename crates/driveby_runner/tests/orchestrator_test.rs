use driveby_core::{
    ContractBuilder, ContractModel, FunctionalPhase, HttpMethod, LoadProfile, OperationBuilder,
    Outcome, PerformancePhase, PerformanceThresholds, RunConfig, RunState, SkippedReason,
    TestMode,
};
use driveby_runner::{CancellationToken, Orchestrator, run_all};
use pretty_assertions::assert_eq;
use std::time::{Duration, Instant};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn model() -> ContractModel {
    ContractBuilder::new("Orders", "1.0.0")
        .bearer_security("bearerAuth")
        .operation(
            OperationBuilder::new(HttpMethod::Get, "/orders")
                .summary("List orders")
                .response("200", "OK")
                .response("401", "Unauthorized")
                .build(),
        )
        .operation(
            OperationBuilder::new(HttpMethod::Get, "/customers")
                .summary("List customers")
                .response("200", "OK")
                .response("401", "Unauthorized")
                .build(),
        )
        .build()
}

fn quick_config() -> RunConfig {
    RunConfig {
        timeout: Duration::from_millis(500),
        load: LoadProfile {
            rate: 20,
            duration: Duration::from_millis(300),
            ..LoadProfile::default()
        },
        thresholds: PerformanceThresholds {
            max_latency_p95: Duration::from_secs(2),
            min_success_rate: 0.9,
        },
        ..RunConfig::default()
    }
}

async fn server_answering(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

fn states(report: &driveby_core::ValidationReport) -> Vec<RunState> {
    report.transitions.iter().map(|t| t.to).collect()
}

#[tokio::test]
async fn test_full_run_against_healthy_server() {
    let server = server_answering(200).await;

    let report = run_all(&model(), &server.uri(), &quick_config(), &CancellationToken::new()).await;

    assert_eq!(report.final_state, RunState::Done);
    assert_eq!(
        states(&report),
        vec![
            RunState::SpecValidating,
            RunState::FunctionalTesting,
            RunState::PerformanceTesting,
            RunState::Done,
        ]
    );
    assert_eq!(report.functional.outcomes().len(), 2);
    assert!(
        report
            .functional
            .outcomes()
            .iter()
            .all(|o| o.outcome == Outcome::Success)
    );
    let PerformancePhase::Ran(result) = &report.performance else {
        panic!("performance should have run: {:?}", report.performance);
    };
    assert!(result.metrics.total_requests > 0);
    assert_eq!(report.rule_results.len(), 6);
    assert_eq!(report.summary.total_checks, 8);
    assert!(!report.is_cancelled());
}

#[tokio::test]
async fn test_systemic_auth_failure_skips_performance() {
    let server = server_answering(401).await;

    let report = run_all(&model(), &server.uri(), &quick_config(), &CancellationToken::new()).await;

    assert_eq!(report.final_state, RunState::Done);
    assert_eq!(
        states(&report),
        vec![
            RunState::SpecValidating,
            RunState::FunctionalTesting,
            RunState::PerformanceSkipped,
            RunState::Done,
        ]
    );
    assert_eq!(
        report.performance,
        PerformancePhase::Skipped {
            reason: SkippedReason::SystemicFunctionalFailure {
                tested: 2,
                auth_failed: 2,
                failed: 0,
            }
        }
    );
    assert_eq!(report.summary.outcomes.get(&Outcome::AuthFailed), Some(&2));
    // Only the functional requests reach the server.
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_pre_cancelled_run_ends_cancelled() {
    let server = server_answering(200).await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = run_all(&model(), &server.uri(), &quick_config(), &cancel).await;

    assert_eq!(report.final_state, RunState::Cancelled);
    assert!(report.is_cancelled());
    assert!(report.is_failure());
    assert_eq!(
        report.functional,
        FunctionalPhase::NotRun {
            reason: SkippedReason::Cancelled
        }
    );
    assert_eq!(report.rule_results.len(), 6);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_during_performance_ends_cancelled() {
    let server = server_answering(200).await;
    let config = RunConfig {
        load: LoadProfile {
            rate: 50,
            duration: Duration::from_secs(10),
            ..LoadProfile::default()
        },
        ..quick_config()
    };
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let report = run_all(&model(), &server.uri(), &config, &cancel).await;

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(report.final_state, RunState::Cancelled);
    assert_eq!(
        states(&report),
        vec![
            RunState::SpecValidating,
            RunState::FunctionalTesting,
            RunState::PerformanceTesting,
            RunState::Cancelled,
        ]
    );
    assert!(report.functional.outcomes().iter().all(|o| o.outcome == Outcome::Success));
    let PerformancePhase::Ran(result) = &report.performance else {
        panic!("expected a performance run, got {:?}", report.performance);
    };
    assert!(result.metrics.cancelled);
    assert!(report.is_failure());
}

#[tokio::test]
async fn test_rules_only_mode_sends_nothing() {
    let server = server_answering(200).await;
    let config = RunConfig {
        test_mode: TestMode::None,
        ..quick_config()
    };

    let report = Orchestrator::new(config)
        .run(&model(), &server.uri(), &CancellationToken::new())
        .await;

    assert_eq!(report.final_state, RunState::Done);
    assert_eq!(
        report.functional,
        FunctionalPhase::NotRun {
            reason: SkippedReason::NotRequested
        }
    );
    assert_eq!(
        report.performance,
        PerformancePhase::Skipped {
            reason: SkippedReason::NotRequested
        }
    );
    assert_eq!(report.summary.total_checks, 6);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_base_url_is_reported() {
    let report = run_all(
        &model(),
        "not a url",
        &quick_config(),
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(report.final_state, RunState::Done);
    assert!(matches!(
        report.functional,
        FunctionalPhase::NotRun {
            reason: SkippedReason::InvalidBaseUrl { .. }
        }
    ));
    assert!(matches!(
        report.performance,
        PerformancePhase::Skipped {
            reason: SkippedReason::InvalidBaseUrl { .. }
        }
    ));
}

#[tokio::test]
async fn test_auto_fix_recorded_in_report() {
    let config = RunConfig {
        auto_fix: true,
        test_mode: TestMode::None,
        ..RunConfig::default()
    };
    let model = ContractBuilder::new("Orders", "")
        .bearer_security("bearerAuth")
        .operation(
            OperationBuilder::new(HttpMethod::Get, "/orders")
                .response("200", "OK")
                .build(),
        )
        .build();

    let report = run_all(&model, "http://localhost:1", &config, &CancellationToken::new()).await;

    assert!(!report.auto_fixes.is_empty());
    assert!(report.summary.fixes_applied > 0);
    let p001 = report
        .rule_results
        .iter()
        .find(|r| r.check.id == "P001")
        .unwrap();
    assert!(p001.passed);
    assert!(p001.fixed);
    assert_eq!(report.version, "");
}

use driveby_core::{
    AuthConfig, ContractBuilder, ContractModel, HttpMethod, LoadProfile, OperationBuilder,
    Outcome, ParameterBuilder, PerformancePhase, PerformanceThresholds, RunConfig,
    SchemaBuilder,
};
use driveby_runner::{
    CancellationToken, FunctionalExecutor, PerformanceExecutor, run_functional, run_performance,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::{Duration, Instant};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn get(route: &str) -> OperationBuilder {
    OperationBuilder::new(HttpMethod::Get, route).response("200", "OK")
}

async fn respond(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

fn outcome_of(outcomes: &[driveby_core::EndpointOutcome], route: &str) -> Outcome {
    outcomes
        .iter()
        .find(|o| o.path == route)
        .map(|o| o.outcome)
        .unwrap_or_else(|| panic!("no outcome for {}", route))
}

#[tokio::test]
async fn test_functional_classification_against_live_server() {
    let server = MockServer::start().await;
    respond(&server, "/ok", 200).await;
    respond(&server, "/missing", 404).await;
    respond(&server, "/secure", 401).await;
    respond(&server, "/broken", 500).await;
    respond(&server, "/accepted", 202).await;

    let model = ContractBuilder::new("Live", "1.0.0")
        .operation(get("/ok").build())
        .operation(get("/missing").build())
        .operation(get("/secure").build())
        .operation(get("/broken").build())
        .operation(get("/accepted").build())
        .operation(get("/legacy").deprecated().build())
        .build();

    let outcomes = run_functional(&model, &server.uri(), None).await.unwrap();

    assert_eq!(outcomes.len(), 5);
    assert_eq!(outcome_of(&outcomes, "/ok"), Outcome::Success);
    assert_eq!(outcome_of(&outcomes, "/missing"), Outcome::ClientError);
    assert_eq!(outcome_of(&outcomes, "/secure"), Outcome::AuthFailed);
    assert_eq!(outcome_of(&outcomes, "/broken"), Outcome::ServerError);
    assert_eq!(outcome_of(&outcomes, "/accepted"), Outcome::Undocumented);

    let paths: Vec<&str> = outcomes.iter().map(|o| o.path.as_str()).collect();
    assert_eq!(paths, vec!["/ok", "/missing", "/secure", "/broken", "/accepted"]);

    let accepted = outcomes.iter().find(|o| o.path == "/accepted").unwrap();
    assert_eq!(accepted.status_code, Some(202));
    assert_eq!(accepted.errors, vec!["Status 202 is not documented"]);
}

#[tokio::test]
async fn test_synthesized_path_body_and_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/widgets/123e4567-e89b-12d3-a456-426614174000"))
        .and(header("Authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/widgets"))
        .and(header("Authorization", "Bearer secret"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({"name": "example string", "size": 42})))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let model = ContractBuilder::new("Widgets", "1.0.0")
        .operation(
            get("/widgets/{id}")
                .parameter(
                    ParameterBuilder::path("id")
                        .schema(SchemaBuilder::string().format("uuid").build())
                        .build(),
                )
                .build(),
        )
        .operation(
            OperationBuilder::new(HttpMethod::Post, "/widgets")
                .json_body(
                    SchemaBuilder::object()
                        .property("name", SchemaBuilder::string().build())
                        .property("size", SchemaBuilder::integer().build())
                        .build(),
                )
                .response("201", "Created")
                .build(),
        )
        .build();

    let outcomes = run_functional(&model, &server.uri(), Some(AuthConfig::bearer("secret")))
        .await
        .unwrap();

    assert_eq!(
        outcomes[0].url,
        format!("{}/widgets/123e4567-e89b-12d3-a456-426614174000", server.uri())
    );
    assert!(
        outcomes.iter().all(|o| o.outcome == Outcome::Success),
        "{:?}",
        outcomes
    );
}

#[tokio::test]
async fn test_timeout_and_unreachable_are_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let model = ContractBuilder::new("Slow", "1.0.0")
        .operation(get("/slow").build())
        .build();
    let config = RunConfig {
        timeout: Duration::from_millis(200),
        ..RunConfig::default()
    };

    let executor = FunctionalExecutor::new(&server.uri(), &config).unwrap();
    let outcomes = executor.execute(&model, &CancellationToken::new()).await;
    assert_eq!(outcomes[0].outcome, Outcome::Failed);
    assert_eq!(outcomes[0].status_code, None);
    assert!(outcomes[0].errors[0].contains("timed out"), "{:?}", outcomes[0].errors);

    let unreachable = FunctionalExecutor::new("http://127.0.0.1:1", &config).unwrap();
    let outcomes = unreachable.execute(&model, &CancellationToken::new()).await;
    assert_eq!(outcomes[0].outcome, Outcome::Failed);
}

#[tokio::test]
async fn test_cancelled_run_dispatches_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let model = ContractBuilder::new("Idle", "1.0.0")
        .operation(get("/a").build())
        .operation(get("/b").build())
        .build();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let executor = FunctionalExecutor::new(&server.uri(), &RunConfig::default()).unwrap();
    assert!(executor.execute(&model, &cancel).await.is_empty());
}

fn load_model() -> ContractModel {
    ContractBuilder::new("Load", "1.0.0")
        .operation(get("/fast").build())
        .operation(
            OperationBuilder::new(HttpMethod::Delete, "/fast")
                .response("204", "Deleted")
                .build(),
        )
        .build()
}

#[tokio::test]
async fn test_short_performance_run() {
    let server = MockServer::start().await;
    respond(&server, "/fast", 200).await;

    let phase = run_performance(
        &load_model(),
        &server.uri(),
        20,
        Duration::from_millis(500),
        PerformanceThresholds {
            max_latency_p95: Duration::from_secs(2),
            min_success_rate: 0.95,
        },
    )
    .await
    .unwrap();

    let PerformancePhase::Ran(result) = phase else {
        panic!("expected a performance run, got {:?}", phase);
    };
    assert_eq!(result.targets, 1);
    let metrics = &result.metrics;
    assert!(
        (5..=15).contains(&metrics.total_requests),
        "total {}",
        metrics.total_requests
    );
    assert_eq!(metrics.success_count, metrics.total_requests);
    assert_eq!(metrics.error_count, 0);
    assert!(metrics.throughput > 0.0);
    assert!(!metrics.cancelled);
    assert!(result.evaluation.passed, "{:?}", result.evaluation);
    assert!(server.received_requests().await.unwrap().iter().all(|r| r.method.as_str() == "GET"));
}

#[tokio::test]
async fn test_performance_errors_fail_success_rate() {
    let server = MockServer::start().await;
    respond(&server, "/fast", 503).await;

    let phase = run_performance(
        &load_model(),
        &server.uri(),
        20,
        Duration::from_millis(300),
        PerformanceThresholds {
            max_latency_p95: Duration::ZERO,
            min_success_rate: 0.5,
        },
    )
    .await
    .unwrap();

    assert!(phase.failed());
    let PerformancePhase::Ran(result) = phase else {
        panic!("expected a performance run");
    };
    assert_eq!(result.metrics.success_count, 0);
    assert_eq!(result.metrics.error_rate, 1.0);
}

#[tokio::test]
async fn test_cancel_stops_load_mid_run() {
    let server = MockServer::start().await;
    respond(&server, "/fast", 200).await;

    let config = RunConfig {
        load: LoadProfile {
            rate: 50,
            duration: Duration::from_secs(10),
            ..LoadProfile::default()
        },
        ..RunConfig::default()
    };
    let executor = PerformanceExecutor::new(&server.uri(), &config).unwrap();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let phase = executor.execute(&load_model(), &cancel).await;
    let elapsed = started.elapsed();

    let PerformancePhase::Ran(result) = phase else {
        panic!("expected a performance run, got {:?}", phase);
    };
    assert!(result.metrics.cancelled);
    assert!(elapsed < Duration::from_secs(3), "took {:?}", elapsed);
    assert!(result.metrics.total_requests > 0);
    assert!(result.metrics.total_requests < 100, "total {}", result.metrics.total_requests);
    assert_eq!(
        server.received_requests().await.unwrap().len() as u64,
        result.metrics.total_requests
    );
}

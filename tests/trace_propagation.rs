//! One trace across both services, captured with the in-memory exporter.

use std::time::Duration;

use axum::http::StatusCode;
use cep_weather::observability::span::CANCELLED;
use opentelemetry::trace::{SpanId, SpanKind, Status, TraceId};
use opentelemetry::Value;

mod common;

use common::{attribute, string_attribute};

#[tokio::test]
async fn test_success_produces_one_linked_trace() {
    let capture = common::capture_spans();
    let stack = common::start_stack(common::start_weather_provider().await).await;

    let response = common::http_client()
        .post(stack.input.url())
        .body(r#"{"cep":"01310100"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let spans = capture.spans();
    assert_eq!(spans.len(), 5, "spans: {:?}", spans.iter().map(|s| &s.name).collect::<Vec<_>>());

    let cep_handler = capture.named("cep_handler");
    let call = capture.named("call_service_b");
    let weather_handler = capture.named("weather_handler");
    let get_cep = capture.named("get_cep_info");
    let get_weather = capture.named("get_weather_info");

    let trace_id = cep_handler.span_context.trace_id();
    assert_ne!(trace_id, TraceId::INVALID);
    for span in &spans {
        assert_eq!(span.span_context.trace_id(), trace_id, "{}", span.name);
        assert_eq!(span.status, Status::Unset, "{}", span.name);
    }

    assert_eq!(cep_handler.parent_span_id, SpanId::INVALID);
    assert_eq!(call.parent_span_id, cep_handler.span_context.span_id());
    assert_eq!(weather_handler.parent_span_id, call.span_context.span_id());
    assert_eq!(get_cep.parent_span_id, weather_handler.span_context.span_id());
    assert_eq!(get_weather.parent_span_id, weather_handler.span_context.span_id());

    assert_eq!(cep_handler.span_kind, SpanKind::Server);
    assert_eq!(call.span_kind, SpanKind::Client);
    assert_eq!(weather_handler.span_kind, SpanKind::Server);

    assert_eq!(string_attribute(&cep_handler, "cep").as_deref(), Some("01310100"));
    assert_eq!(string_attribute(&cep_handler, "stage").as_deref(), Some("done"));
    assert_eq!(string_attribute(&cep_handler, "city").as_deref(), Some("São Paulo"));

    assert_eq!(string_attribute(&call, "service").as_deref(), Some("service-b"));
    assert_eq!(attribute(&call, "http.status_code"), Some(Value::I64(200)));

    assert_eq!(string_attribute(&weather_handler, "stage").as_deref(), Some("done"));
    assert_eq!(attribute(&weather_handler, "response.temp_k"), Some(Value::F64(298.5)));

    assert_eq!(string_attribute(&get_cep, "api").as_deref(), Some("viacep"));
    assert_eq!(attribute(&get_cep, "cep.found"), Some(Value::Bool(true)));
    assert_eq!(string_attribute(&get_cep, "localidade").as_deref(), Some("São Paulo"));
    assert_eq!(string_attribute(&get_cep, "uf").as_deref(), Some("SP"));

    assert_eq!(string_attribute(&get_weather, "api").as_deref(), Some("weatherapi"));
    assert_eq!(string_attribute(&get_weather, "localidade").as_deref(), Some("São Paulo"));
    assert_eq!(attribute(&get_weather, "weather.temp_c"), Some(Value::F64(25.5)));
}

#[tokio::test]
async fn test_rejected_input_produces_single_span() {
    let capture = common::capture_spans();
    let stack = common::start_stack(common::start_weather_provider().await).await;

    let response = common::http_client()
        .post(stack.input.url())
        .body(r#"{"cep":"123"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let spans = capture.spans();
    assert_eq!(spans.len(), 1);

    let span = &spans[0];
    assert_eq!(span.name, "cep_handler");
    assert_eq!(string_attribute(span, "validation").as_deref(), Some("invalid_zipcode"));
    assert_eq!(string_attribute(span, "stage").as_deref(), Some("rejected"));
    assert!(matches!(span.status, Status::Error { .. }));
}

#[tokio::test]
async fn test_malformed_body_is_annotated() {
    let capture = common::capture_spans();
    let input = common::start_input("http://127.0.0.1:9").await;

    let response = common::http_client()
        .post(input.url())
        .body("{")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let span = capture.named("cep_handler");
    assert_eq!(string_attribute(&span, "error").as_deref(), Some("invalid_json"));
    assert!(matches!(span.status, Status::Error { .. }));
}

#[tokio::test]
async fn test_weather_failure_marks_spans_as_errors() {
    let capture = common::capture_spans();
    let stack = common::start_stack(common::start_failing_weather_provider(503).await).await;

    let response = common::http_client()
        .post(stack.input.url())
        .body(r#"{"cep":"01310100"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let get_weather = capture.named("get_weather_info");
    assert_eq!(attribute(&get_weather, "http.status_code"), Some(Value::I64(503)));
    assert_eq!(
        get_weather.status,
        Status::error("weather provider returned status 503")
    );

    let weather_handler = capture.named("weather_handler");
    assert_eq!(string_attribute(&weather_handler, "stage").as_deref(), Some("failed"));
    assert!(matches!(weather_handler.status, Status::Error { .. }));

    let get_cep = capture.named("get_cep_info");
    assert_eq!(get_cep.status, Status::Unset);

    let call = capture.named("call_service_b");
    assert_eq!(attribute(&call, "http.status_code"), Some(Value::I64(500)));
    assert_eq!(
        call.status,
        Status::error("orchestrator returned unexpected status 500")
    );
}

#[tokio::test]
async fn test_orchestrator_continues_external_trace() {
    let capture = common::capture_spans();
    let postal = common::start_postal_registry().await;
    let weather = common::start_weather_provider().await;
    let orchestrator = common::start_orchestrator(&postal, &weather).await;

    let response = common::http_client()
        .get(format!("{}/99999999", orchestrator.url()))
        .header(
            "traceparent",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let handler = capture.named("weather_handler");
    assert_eq!(
        handler.span_context.trace_id(),
        TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap()
    );
    assert_eq!(
        handler.parent_span_id,
        SpanId::from_hex("00f067aa0ba902b7").unwrap()
    );

    let get_cep = capture.named("get_cep_info");
    assert_eq!(attribute(&get_cep, "cep.found"), Some(Value::Bool(false)));
    assert_eq!(get_cep.status, Status::error("zipcode not found in postal registry"));
    assert!(capture.spans().iter().all(|s| s.name != "get_weather_info"));
}

#[tokio::test]
async fn test_request_timeout_closes_spans_as_cancelled() {
    let capture = common::capture_spans();
    let orchestrator = common::start_slow_orchestrator(Duration::from_secs(3)).await;
    let input = common::start_input_with(&orchestrator.url(), common::timeouts(1, 10)).await;

    let response = common::http_client()
        .post(input.url())
        .body(r#"{"cep":"01310100"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let cep_handler = capture.named("cep_handler");
    let call = capture.named("call_service_b");

    assert_eq!(cep_handler.status, Status::error(CANCELLED));
    assert_eq!(call.status, Status::error(CANCELLED));
    assert_eq!(call.parent_span_id, cep_handler.span_context.span_id());
    assert_eq!(
        string_attribute(&cep_handler, "stage").as_deref(),
        Some("calling_orchestration")
    );
    assert_eq!(attribute(&call, "http.status_code"), None);
}

#[tokio::test]
async fn test_registry_error_status_leaves_found_unset() {
    let capture = common::capture_spans();
    let postal = common::start_programmable_backend(|_| (500, String::new())).await;
    let weather = common::start_weather_provider().await;
    let orchestrator = common::start_orchestrator(&postal, &weather).await;

    let response = common::http_client()
        .get(format!("{}/01310100", orchestrator.url()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let get_cep = capture.named("get_cep_info");
    assert_eq!(attribute(&get_cep, "http.status_code"), Some(Value::I64(500)));
    assert_eq!(attribute(&get_cep, "cep.found"), None);
    assert_eq!(get_cep.status, Status::error("postal registry returned status 500"));
}

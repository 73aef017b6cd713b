//! Tests for the playback engine: ordering, rendering, failures and cancellation.
mod common;
use common::*;
use reqgraph::playback::render_request;
use reqgraph::prelude::*;
use reqgraph::response_path;
use reqgraph::value::COMPUTED_MARKER;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// `b` reads `a.id` in its URL. Listed dependents-first on purpose.
fn chained_requests() -> Vec<DataSourceRequest> {
    vec![
        get_request(
            "b",
            ComputedValue::concat(vec![
                ComputedValue::text("https://api.test/b/"),
                ComputedValue::request("a", response_path!["id"]),
            ]),
        ),
        get_request("a", ComputedValue::text("https://api.test/a")),
    ]
}

fn chained_transport() -> Arc<ScriptedTransport> {
    Arc::new(
        ScriptedTransport::new()
            .respond("https://api.test/a", json!({"id": 5}))
            .respond("https://api.test/b/5", json!({"orders": [1, 2]}))
            .respond("https://api.test/c", json!({"ok": true})),
    )
}

#[test]
fn test_dependencies_run_first() {
    let transport = chained_transport();
    let playback = Playback::new(transport.clone());
    let outputs = vec![output("orders", "b", response_path!["orders"])];

    let values = tokio_test::block_on(playback.fetch_playback(
        &chained_requests(),
        &outputs,
        &Inputs::new(),
    ))
    .unwrap();

    assert_eq!(values.get("orders"), Some(&Some(json!([1, 2]))));
    assert_eq!(
        transport.called_urls(),
        vec!["https://api.test/a", "https://api.test/b/5"]
    );
}

#[test]
fn test_failed_dependency_stops_playback() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond_with("https://api.test/a", 500, "{}")
            .respond("https://api.test/b/5", json!({"orders": []})),
    );
    let playback = Playback::new(transport.clone());
    let outputs = vec![output("orders", "b", response_path!["orders"])];

    let result = tokio_test::block_on(playback.fetch_playback(
        &chained_requests(),
        &outputs,
        &Inputs::new(),
    ));

    assert_eq!(
        result,
        Err(PlaybackError::UnexpectedStatus {
            request_id: "a".to_string(),
            status: 500
        })
    );
    assert_eq!(transport.called_urls(), vec!["https://api.test/a"]);
}

#[test]
fn test_full_responses_execute_every_request() {
    let mut requests = chained_requests();
    requests.push(get_request("c", ComputedValue::text("https://api.test/c")));
    let transport = chained_transport();
    let playback = Playback::new(transport.clone());

    let responses =
        tokio_test::block_on(playback.fetch_get_full_responses(&requests, &Inputs::new()))
            .unwrap();

    assert_eq!(responses.len(), 3);
    assert_eq!(responses.get("a"), Some(&json!({"id": 5})));
    assert_eq!(responses.get("b"), Some(&json!({"orders": [1, 2]})));
    assert_eq!(responses.get("c"), Some(&json!({"ok": true})));
    assert_eq!(transport.calls().len(), 3);
}

#[test]
fn test_playback_only_executes_what_outputs_need() {
    let mut requests = chained_requests();
    requests.push(get_request("c", ComputedValue::text("https://api.test/c")));
    let transport = chained_transport();
    let playback = Playback::new(transport.clone());
    let outputs = vec![output("first", "a", response_path!["id"])];

    let values =
        tokio_test::block_on(playback.fetch_playback(&requests, &outputs, &Inputs::new()))
            .unwrap();

    assert_eq!(values.get("first"), Some(&Some(json!(5))));
    assert_eq!(transport.called_urls(), vec!["https://api.test/a"]);
}

#[test]
fn test_shared_dependency_runs_once() {
    let mut requests = vec![
        get_request("a", ComputedValue::text("https://api.test/a")),
        get_request(
            "b",
            ComputedValue::concat(vec![
                ComputedValue::text("https://api.test/b/"),
                ComputedValue::request("a", response_path!["id"]),
            ]),
        ),
        get_request("c", ComputedValue::text("https://api.test/c")),
    ];
    requests[2].headers.insert(
        "X-Parent".to_string(),
        ComputedValue::request("a", response_path!["id"]),
    );
    let transport = chained_transport();
    let playback = Playback::new(transport.clone());
    let outputs = vec![
        output("orders", "b", response_path!["orders"]),
        output("ok", "c", response_path!["ok"]),
    ];

    let values =
        tokio_test::block_on(playback.fetch_playback(&requests, &outputs, &Inputs::new()))
            .unwrap();

    assert_eq!(values.len(), 2);
    assert_eq!(transport.calls().len(), 3);
    assert_eq!(transport.calls()[2].headers.get("X-Parent"), Some(&"5".to_string()));
}

#[test]
fn test_unresolved_output_path_is_undefined() {
    let playback = Playback::new(chained_transport());
    let outputs = vec![output("missing", "a", response_path!["nope", 0])];

    let values = tokio_test::block_on(playback.fetch_playback(
        &chained_requests(),
        &outputs,
        &Inputs::new(),
    ))
    .unwrap();
    assert_eq!(values.get("missing"), Some(&None));
}

#[test]
fn test_cycle_is_rejected_before_any_request() {
    let requests = vec![
        get_request("a", ComputedValue::request("b", response_path!["url"])),
        get_request("b", ComputedValue::request("a", response_path!["url"])),
    ];
    let transport = chained_transport();
    let playback = Playback::new(transport.clone());

    let full = tokio_test::block_on(playback.fetch_get_full_responses(&requests, &Inputs::new()));
    assert!(matches!(full, Err(PlaybackError::Cycle { .. })));

    let outputs = vec![output("x", "a", response_path!["x"])];
    let partial =
        tokio_test::block_on(playback.fetch_playback(&requests, &outputs, &Inputs::new()));
    assert!(matches!(partial, Err(PlaybackError::Cycle { .. })));

    assert!(transport.calls().is_empty());
}

#[test]
fn test_unknown_references_are_rejected() {
    let playback = Playback::new(chained_transport());

    let requests = vec![get_request(
        "b",
        ComputedValue::request("ghost", response_path!["id"]),
    )];
    let result = tokio_test::block_on(playback.fetch_get_full_responses(&requests, &Inputs::new()));
    assert_eq!(
        result,
        Err(PlaybackError::UnknownRequest {
            referrer: "b".to_string(),
            referenced: "ghost".to_string()
        })
    );

    let outputs = vec![output("out", "nope", response_path!["id"])];
    let result = tokio_test::block_on(playback.fetch_playback(
        &chained_requests(),
        &outputs,
        &Inputs::new(),
    ));
    assert_eq!(
        result,
        Err(PlaybackError::UnknownRequest {
            referrer: "out".to_string(),
            referenced: "nope".to_string()
        })
    );

    let duplicated = vec![
        get_request("a", ComputedValue::text("https://api.test/a")),
        get_request("a", ComputedValue::text("https://api.test/c")),
    ];
    let result =
        tokio_test::block_on(playback.fetch_get_full_responses(&duplicated, &Inputs::new()));
    assert_eq!(result, Err(PlaybackError::DuplicateRequestId("a".to_string())));
}

#[test]
fn test_body_references_are_dependencies() {
    let mut submit = get_request("submit", ComputedValue::text("https://api.test/submit"));
    submit.method = "POST".to_string();
    submit.body = Some(Template::from(json!({
        "token": {COMPUTED_MARKER: {"type": "request", "requestId": "login", "path": ["token"]}},
        "email": {COMPUTED_MARKER: {"type": "input", "id": "email"}},
        "source": "playback"
    })));
    let requests = vec![
        submit,
        get_request("login", ComputedValue::text("https://api.test/login")),
    ];
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond("https://api.test/login", json!({"token": "xyz"}))
            .respond("https://api.test/submit", json!({"accepted": true})),
    );
    let playback = Playback::new(transport.clone());

    tokio_test::block_on(
        playback.fetch_get_full_responses(&requests, &email_inputs("foo@bar.com")),
    )
    .unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].url, "https://api.test/login");
    assert_eq!(calls[1].method, "POST");
    assert_eq!(
        calls[1].body,
        Some(json!({"token": "xyz", "email": "foo@bar.com", "source": "playback"}))
    );
}

#[test]
fn test_render_request() {
    let mut request = get_request(
        "profile",
        ComputedValue::concat(vec![
            ComputedValue::text("https://api.test/users/"),
            ComputedValue::input("email"),
        ]),
    );
    request.query_params = Template::from(json!({
        "page": "1",
        "email": {COMPUTED_MARKER: {"type": "input", "id": "email"}}
    }));
    request.headers.insert(
        "Authorization".to_string(),
        ComputedValue::concat(vec![
            ComputedValue::text("Bearer "),
            ComputedValue::request("login", response_path!["token"]),
        ]),
    );
    request
        .headers
        .insert("X-Optional".to_string(), ComputedValue::input("missing"));

    let mut cache = ResponseCache::new();
    cache.insert("login".to_string(), json!({"token": "abc"}));

    let rendered = render_request(&request, &email_inputs("foo@bar.com"), &cache).unwrap();
    assert_eq!(
        rendered.url,
        "https://api.test/users/foo@bar.com?page=1&email=foo%40bar.com"
    );
    assert_eq!(rendered.method, "GET");
    assert_eq!(rendered.credentials, Credentials::Include);
    assert_eq!(rendered.headers.len(), 1);
    assert_eq!(
        rendered.headers.get("Authorization"),
        Some(&"Bearer abc".to_string())
    );
    assert_eq!(rendered.body, None);

    // Referencing a request that has not run yet is an evaluation error.
    let result = render_request(&request, &email_inputs("foo@bar.com"), &ResponseCache::new());
    assert_eq!(
        result,
        Err(PlaybackError::Evaluation(EvaluationError::UnresolvedRequest {
            request_id: "login".to_string()
        }))
    );
}

#[test]
fn test_computed_path_segments_are_encoded() {
    let mut request = get_request(
        "files",
        ComputedValue::concat(vec![
            ComputedValue::text("https://api.test/files/"),
            ComputedValue::input("name"),
            ComputedValue::text("/versions/"),
            ComputedValue::request("latest", response_path!["version"]),
        ]),
    );
    request.query_params = Template::from(json!({"q": "a/b"}));

    let mut inputs = Inputs::new();
    inputs.insert("name".to_string(), "q3 report/final?.pdf".to_string());
    let mut cache = ResponseCache::new();
    cache.insert("latest".to_string(), json!({"version": "1 0"}));

    let rendered = render_request(&request, &inputs, &cache).unwrap();
    assert_eq!(
        rendered.url,
        "https://api.test/files/q3%20report%2Ffinal%3F.pdf/versions/1%200?q=a%2Fb"
    );

    // A URL that is a single computed value is taken as it is.
    let whole = get_request("whole", ComputedValue::input("base_url"));
    let mut inputs = Inputs::new();
    inputs.insert("base_url".to_string(), "https://api.test/a b".to_string());
    let rendered = render_request(&whole, &inputs, &ResponseCache::new()).unwrap();
    assert_eq!(rendered.url, "https://api.test/a b");
}

#[test]
fn test_undefined_url_fails() {
    let requests = vec![get_request("a", ComputedValue::input("base_url"))];
    let transport = chained_transport();
    let playback = Playback::new(transport.clone());

    let result = tokio_test::block_on(playback.fetch_get_full_responses(&requests, &Inputs::new()));
    assert_eq!(
        result,
        Err(PlaybackError::UndefinedUrl {
            request_id: "a".to_string()
        })
    );
    assert!(transport.calls().is_empty());
}

#[test]
fn test_malformed_response_fails() {
    let transport =
        ScriptedTransport::new().respond_with("https://api.test/a", 200, "<html>oops</html>");
    let playback = Playback::new(transport);
    let requests = vec![get_request("a", ComputedValue::text("https://api.test/a"))];

    let result = tokio_test::block_on(playback.fetch_get_full_responses(&requests, &Inputs::new()));
    assert!(matches!(
        result,
        Err(PlaybackError::MalformedResponse { request_id, .. }) if request_id == "a"
    ));
}

#[test]
fn test_transport_failure_is_reported() {
    let transport = ScriptedTransport::new().fail("https://api.test/a", "connection reset");
    let playback = Playback::new(transport);
    let requests = vec![get_request("a", ComputedValue::text("https://api.test/a"))];

    let result = tokio_test::block_on(playback.fetch_get_full_responses(&requests, &Inputs::new()));
    assert_eq!(
        result,
        Err(PlaybackError::Transport {
            request_id: "a".to_string(),
            message: "connection reset".to_string()
        })
    );
}

#[test]
fn test_request_timeout() {
    let playback = Playback::builder(StalledTransport)
        .with_request_timeout_ms(Some(20))
        .build();
    let requests = vec![get_request("a", ComputedValue::text("https://api.test/a"))];

    let result = tokio_test::block_on(playback.fetch_get_full_responses(&requests, &Inputs::new()));
    assert_eq!(
        result,
        Err(PlaybackError::Timeout {
            request_id: "a".to_string(),
            after: Duration::from_millis(20)
        })
    );
}

#[test]
fn test_cancellation_before_start() {
    let (sender, receiver) = watch::channel(false);
    sender.send(true).unwrap();
    let transport = chained_transport();
    let playback = Playback::builder(transport.clone())
        .with_cancellation(receiver)
        .build();

    let result = tokio_test::block_on(playback.fetch_get_full_responses(
        &chained_requests(),
        &Inputs::new(),
    ));
    assert_eq!(
        result,
        Err(PlaybackError::Cancelled {
            request_id: "a".to_string()
        })
    );
    assert!(transport.calls().is_empty());
}

#[test]
fn test_cancellation_interrupts_in_flight_request() {
    let (sender, receiver) = watch::channel(false);
    let playback = Playback::builder(StalledTransport)
        .with_request_timeout_ms(None)
        .with_cancellation(receiver)
        .build();
    let requests = vec![get_request("a", ComputedValue::text("https://api.test/a"))];
    let inputs = Inputs::new();

    let result = tokio_test::block_on(async {
        let cancel = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            sender.send(true).unwrap();
        };
        let (result, _) = tokio::join!(playback.fetch_get_full_responses(&requests, &inputs), cancel);
        result
    });
    assert_eq!(
        result,
        Err(PlaybackError::Cancelled {
            request_id: "a".to_string()
        })
    );
}

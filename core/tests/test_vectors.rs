//! Verify request building, response parsing and list casting against the
//! JSON vectors stored in `test-vectors/`.
//!
//! Bodies and items are compared as parsed JSON, not raw strings.

use essentials_core::{cast_many, CastMany, Config, HttpMethod, HttpResponse, SdkError, Service, UreqTransport};
use serde_json::Value;

fn service() -> Service<UreqTransport> {
    let config = Config::default()
        .with_endpoint("api.example.com")
        .with_api_key("k")
        .with_language("en")
        .with_version("1.0.0");
    Service::new(UreqTransport, config)
}

/// Parse the verb string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn optional(value: &Value) -> Option<Value> {
    if value.is_null() {
        None
    } else {
        Some(value.clone())
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let svc = service();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let verb = parse_method(case["verb"].as_str().unwrap());
        let expected = &case["expected_request"];

        let req = svc
            .build_request(verb, case["method"].as_str().unwrap(), optional(&case["request"]))
            .unwrap();

        assert_eq!(req.method, verb, "{name}: method");
        assert_eq!(req.url, expected["url"].as_str().unwrap(), "{name}: url");

        let expected_headers: Vec<(String, String)> = expected["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        let headers: Vec<(String, String)> = req.headers.into_iter().collect();
        assert_eq!(headers, expected_headers, "{name}: headers");

        match optional(&expected["body"]) {
            None => assert!(req.body.is_none(), "{name}: body should be None"),
            Some(expected_body) => {
                let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
                assert_eq!(body, expected_body, "{name}: body");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[test]
fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let svc = service();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let response = HttpResponse {
            status: case["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: case["body"].as_str().unwrap().to_string(),
        };
        let result = svc.parse_response(response);

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            let matched = match expected_error.as_str().unwrap() {
                "Unauthorized" => matches!(err, SdkError::Unauthorized { .. }),
                "Server" => matches!(err, SdkError::Server { .. }),
                "Response" => matches!(err, SdkError::Response(_)),
                "Error" => matches!(err, SdkError::Error { .. }),
                other => panic!("{name}: unknown expected_error: {other}"),
            };
            assert!(matched, "{name}: got {err:?}");
        } else {
            assert_eq!(result.unwrap(), case["expected_result"], "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// cast_many
// ---------------------------------------------------------------------------

#[test]
fn cast_many_test_vectors() {
    let raw = include_str!("../../test-vectors/cast_many.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let expected = &case["expected"];

        let result = cast_many(Ok::<Value, serde_json::Error>, case["input"].clone()).unwrap();
        let expected_items = expected["items"].as_array().unwrap();
        assert_eq!(result.items(), expected_items.as_slice(), "{name}: items");

        match (expected["kind"].as_str().unwrap(), &result) {
            ("collection", CastMany::Collection(_)) => {}
            ("page", CastMany::Page(page)) => {
                assert_eq!(page.page, expected["page"].as_u64(), "{name}: page");
                assert_eq!(page.total, expected["total"].as_u64().unwrap(), "{name}: total");
                assert_eq!(page.last_page, expected["last_page"].as_u64(), "{name}: last_page");
                assert_eq!(page.from, expected["from"].as_u64(), "{name}: from");
                assert_eq!(page.to, expected["to"].as_u64(), "{name}: to");
            }
            (kind, other) => panic!("{name}: expected {kind}, got {other:?}"),
        }
    }
}

use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_key, Paginated, User, DEFAULT_API_KEY};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn bearer() -> String {
    format!("Bearer {DEFAULT_API_KEY}")
}

fn authed(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, bearer())
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, bearer())
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- auth ---

#[tokio::test]
async fn missing_token_returns_401() {
    let resp = app()
        .oneshot(Request::builder().uri("/users").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = body_json(resp).await;
    assert_eq!(body["message"], "Unauthenticated.");
}

#[tokio::test]
async fn wrong_token_returns_401() {
    let resp = app_with_key("other")
        .oneshot(authed("GET", "/users"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- list ---

#[tokio::test]
async fn list_users_empty_is_a_single_empty_page() {
    let resp = app().oneshot(authed("GET", "/users")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let page: Paginated<User> = body_json(resp).await;
    assert!(page.data.is_empty());
    assert_eq!((page.total, page.current_page, page.last_page), (0, 1, 1));
    assert_eq!((page.from, page.to), (None, None));
}

#[tokio::test]
async fn list_tags_is_a_plain_array() {
    let resp = app().oneshot(authed("GET", "/tags")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let tags: Vec<Value> = body_json(resp).await;
    assert_eq!(tags.len(), 3);
    assert_eq!(tags[0]["name"], "alpha");
}

// --- create ---

#[tokio::test]
async fn create_user_returns_201() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/users",
            r#"{"name":"Ada","email":"ada@example.com"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let user: User = body_json(resp).await;
    assert_eq!(user.name, "Ada");
}

#[tokio::test]
async fn create_user_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/users", r#"{"name":"no email"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- get ---

#[tokio::test]
async fn get_user_not_found() {
    let resp = app()
        .oneshot(authed("GET", "/users/00000000-0000-0000-0000-000000000000"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_user_bad_uuid_returns_400() {
    let resp = app().oneshot(authed("GET", "/users/not-a-uuid")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- failure routes ---

#[tokio::test]
async fn fail_returns_500() {
    let resp = app().oneshot(authed("POST", "/fail")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn garbage_is_not_json() {
    let resp = app().oneshot(authed("GET", "/garbage")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_bytes(resp).await;
    assert!(serde_json::from_slice::<Value>(&body).is_err());
}

// --- echo ---

#[tokio::test]
async fn echo_reflects_method_query_headers_and_body() {
    let mut request = json_request("PATCH", "/echo?a=1", r#"{"x":true}"#);
    request
        .headers_mut()
        .insert("accept-language", http::HeaderValue::from_static("de"));

    let resp = app().oneshot(request).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Value = body_json(resp).await;
    assert_eq!(echo["method"], "PATCH");
    assert_eq!(echo["query"], "a=1");
    assert_eq!(echo["headers"]["accept-language"], "de");
    assert_eq!(echo["body"]["x"], true);
}

// --- full CRUD lifecycle ---

#[tokio::test]
async fn crud_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/users",
            r#"{"name":"Grace","email":"grace@example.com"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: User = body_json(resp).await;
    let id = created.id;

    // list — one user on page one
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("GET", "/users?page=1&per_page=10"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let page: Paginated<User> = body_json(resp).await;
    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].id, id);
    assert_eq!((page.from, page.to), (Some(1), Some(1)));

    // patch — only email
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PATCH",
            &format!("/users/{id}"),
            r#"{"email":"hopper@example.com"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let patched: User = body_json(resp).await;
    assert_eq!(patched.name, "Grace"); // unchanged
    assert_eq!(patched.email, "hopper@example.com");

    // put — full replacement
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PUT",
            &format!("/users/{id}"),
            r#"{"name":"G. Hopper","email":"g@example.com"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let replaced: User = body_json(resp).await;
    assert_eq!(replaced.name, "G. Hopper");

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("DELETE", &format!("/users/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let body = body_bytes(resp).await;
    assert!(body.is_empty());

    // get after delete — 404
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("GET", &format!("/users/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

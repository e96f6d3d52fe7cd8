mod common;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;
use psdash::auth::session::SESSION_COOKIE;

#[tokio::test]
async fn test_health_is_public() {
    let api = MockServer::start().await;
    let state = state(&api);
    let resp = app(&state).oneshot(get("/health", "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "ok");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let api = MockServer::start().await;
    let state = state(&api);
    let resp = app(&state).oneshot(get("/nope", "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let api = MockServer::start().await;
    let state = state(&api);
    let resp = app(&state).oneshot(get("/health", "")).await.unwrap();
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_anonymous_request_redirects_to_login_with_next() {
    let api = MockServer::start().await;
    let state = state(&api);
    let resp = app(&state).oneshot(get("/proxies?page=2", "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login?next=%2Fproxies%3Fpage%3D2");
}

#[tokio::test]
async fn test_session_for_missing_user_is_anonymous() {
    let api = MockServer::start().await;
    let state = state(&api);
    let cookies = signed_cookies(&state.cookie_key, &[(SESSION_COOKIE, "99")]);
    let resp = app(&state).oneshot(get("/dashboard", &cookies)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(location(&resp).starts_with("/login"));
}

#[tokio::test]
async fn test_tampered_session_is_anonymous() {
    let api = MockServer::start().await;
    let state = state(&api);
    let resp = app(&state)
        .oneshot(get("/dashboard", &format!("{SESSION_COOKIE}=1")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_login_page_issues_csrf_cookie() {
    let api = MockServer::start().await;
    let state = state(&api);
    let resp = app(&state).oneshot(get("/login?next=/targets", "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(set_cookie_names(&resp).contains(&"psdash_csrf".to_string()));
    let body = body_string(resp).await;
    assert!(body.contains("login-form"));
    assert!(body.contains(r#"name="csrf_token""#));
}

#[tokio::test]
async fn test_login_success_redirects_to_next() {
    let api = MockServer::start().await;
    let state = state(&api);
    let resp = app(&state)
        .oneshot(post_form(
            "/login?next=%2Ftargets%3Fpage%3D2",
            &anonymous(&state),
            &[("username", USERNAME), ("password", PASSWORD)],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/targets?page=2");
    assert!(set_cookie_names(&resp).contains(&SESSION_COOKIE.to_string()));
}

#[tokio::test]
async fn test_login_defaults_to_dashboard() {
    let api = MockServer::start().await;
    let state = state(&api);
    for uri in ["/login", "/login?next="] {
        let resp = app(&state)
            .oneshot(post_form(uri, &anonymous(&state), &[("username", USERNAME), ("password", PASSWORD)]))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&resp), "/dashboard", "{uri}");
    }
}

#[tokio::test]
async fn test_login_to_allow_listed_absolute_url() {
    let api = MockServer::start().await;
    let state = state(&api);
    let resp = app(&state)
        .oneshot(post_form(
            "/login?next=https%3A%2F%2Fdash.example.com%2Fproxies",
            &anonymous(&state),
            &[("username", USERNAME), ("password", PASSWORD)],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "https://dash.example.com/proxies");
}

#[tokio::test]
async fn test_login_rejects_unsafe_next_without_session() {
    let api = MockServer::start().await;
    let state = state(&api);
    for next in ["https%3A%2F%2Fevil.example.org%2F", "%2F%2Fevil.example.org", "javascript%3Aalert(1)"] {
        let resp = app(&state)
            .oneshot(post_form(
                &format!("/login?next={next}"),
                &anonymous(&state),
                &[("username", USERNAME), ("password", PASSWORD)],
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{next}");
        assert!(!set_cookie_names(&resp).contains(&SESSION_COOKIE.to_string()));
    }
}

#[tokio::test]
async fn test_wrong_password_and_unknown_user_look_the_same() {
    let api = MockServer::start().await;
    let state = state(&api);
    let mut bodies = Vec::new();
    for (username, password) in [(USERNAME, "wrong password"), ("nobody", PASSWORD)] {
        let resp = app(&state)
            .oneshot(post_form(
                "/login",
                &anonymous(&state),
                &[("username", username), ("password", password)],
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(!set_cookie_names(&resp).contains(&SESSION_COOKIE.to_string()));
        let body = body_string(resp).await;
        assert!(body.contains("Invalid username or password."));
        bodies.push(body.replace(username, ""));
    }
    assert_eq!(bodies[0], bodies[1]);
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let api = MockServer::start().await;
    let state = state(&api);
    let resp = app(&state)
        .oneshot(post_form("/login", &anonymous(&state), &[("username", ""), ("password", "")]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("The username is required"));
    assert!(body.contains("Your password is required"));
}

#[tokio::test]
async fn test_login_without_csrf_token_is_rejected() {
    let api = MockServer::start().await;
    let state = state(&api);
    let resp = app(&state)
        .oneshot(post_raw(
            "/login",
            &anonymous(&state),
            &[("username", USERNAME), ("password", PASSWORD)],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(!set_cookie_names(&resp).contains(&SESSION_COOKIE.to_string()));
}

#[tokio::test]
async fn test_dashboard_and_logout() {
    let api = MockServer::start().await;
    let state = state(&api);
    let cookies = logged_in(&state);

    let resp = app(&state).oneshot(get("/dashboard", &cookies)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("Ada Admin"));
    assert!(body.contains("Provider Plans"));

    let resp = app(&state).oneshot(get("/logout", &cookies)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");
    assert!(set_cookie_names(&resp).contains(&SESSION_COOKIE.to_string()));
}

#[tokio::test]
async fn test_proxy_list_resolves_foreign_keys_once_per_page() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/proxy"))
        .and(query_param("offset", "20"))
        .and(query_param("limit", "20"))
        .and(query_param("api_key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 22,
            "data": [
                {"id": 21, "url": "socks5://10.0.0.1:1080", "active": true, "proxy_type_id": 2, "proxy_location_id": null},
                {"id": 22, "url": "socks5://10.0.0.2:1080", "active": false, "proxy_type_id": 2, "provider_id": "7"}
            ]
        })))
        .expect(1)
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/proxy_type/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 2, "name": "SOCKS5"}})))
        .expect(1)
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/provider/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 7, "name": "Acme Proxies"}})))
        .expect(1)
        .mount(&api)
        .await;

    let state = state(&api);
    let resp = app(&state).oneshot(get("/proxies?page=2", &logged_in(&state))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("SOCKS5"));
    assert!(body.contains("Acme Proxies"));
    assert!(body.contains(r#"rel="prev""#));
    assert!(!body.contains(r#"rel="next""#));
}

#[tokio::test]
async fn test_api_failure_renders_502() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/provider"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database on fire"))
        .mount(&api)
        .await;
    let state = state(&api);
    let resp = app(&state).oneshot(get("/providers", &logged_in(&state))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert!(!body_string(resp).await.contains("on fire"));
}

#[tokio::test]
async fn test_delete_flag_bypasses_update() {
    let api = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/proxy_type/7"))
        .and(query_param("api_key", API_KEY))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&api)
        .await;
    Mock::given(method("PUT")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&api).await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&api).await;

    let state = state(&api);
    let resp = app(&state)
        .oneshot(post_form(
            "/proxy-type/edit?id=7&delete=1",
            &logged_in(&state),
            &[("id", "7"), ("name", "HTTP"), ("code", "H")],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/proxy-types");
}

#[tokio::test]
async fn test_delete_without_id_is_bad_request() {
    let api = MockServer::start().await;
    Mock::given(method("DELETE")).respond_with(ResponseTemplate::new(204)).expect(0).mount(&api).await;
    let state = state(&api);
    let resp = app(&state)
        .oneshot(post_form("/proxy-type/edit?delete=1", &logged_in(&state), &[("name", "HTTP")]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_submission_makes_no_api_call() {
    let api = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&api)
        .await;
    let state = state(&api);
    let resp = app(&state)
        .oneshot(post_form(
            "/proxy-type/edit",
            &logged_in(&state),
            &[("id", ""), ("name", ""), ("code", "TOOLONG")],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("A name is required"));
    assert!(body.contains("Field must be between 1 and 4 characters long."));
    assert!(body.contains(r#"value="TOOLONG""#));
}

#[tokio::test]
async fn test_missing_csrf_token_blocks_edit() {
    let api = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&api)
        .await;
    let state = state(&api);
    let resp = app(&state)
        .oneshot(post_raw(
            "/proxy-type/edit?id=7&delete=1",
            &logged_in(&state),
            &[("name", "HTTP")],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_posts_mapped_fields() {
    let api = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/proxy_type"))
        .and(body_json(json!({"name": "HTTP", "code": "H"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"id": 5, "name": "HTTP"}})))
        .expect(1)
        .mount(&api)
        .await;
    let state = state(&api);
    let resp = app(&state)
        .oneshot(post_form(
            "/proxy-type/edit",
            &logged_in(&state),
            &[("id", ""), ("name", "HTTP"), ("code", "H")],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/proxy-types");
}

#[tokio::test]
async fn test_create_without_returned_id_is_502() {
    let api = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/proxy_type"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {}})))
        .mount(&api)
        .await;
    let state = state(&api);
    let resp = app(&state)
        .oneshot(post_form("/proxy-type/edit", &logged_in(&state), &[("name", "HTTP"), ("code", "H")]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

async fn mount_target_choices(api: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/provider"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 2,
            "data": [{"id": 1, "name": "Acme"}, {"id": 2, "name": "Bolt"}]
        })))
        .mount(api)
        .await;
    Mock::given(method("GET"))
        .and(path("/provider_plan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "data": [{"id": 9, "name": "Bolt Pro", "provider_id": 2}]
        })))
        .mount(api)
        .await;
}

#[tokio::test]
async fn test_edit_page_shows_record_and_linked_children() {
    let api = MockServer::start().await;
    mount_target_choices(&api).await;
    Mock::given(method("GET"))
        .and(path("/target/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": 3, "domain": "shop.example.net", "identifier": "shop", "sleep": 45}
        })))
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/target_provider"))
        .and(query_param("target_id", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "data": [{"id": 50, "target_id": 3, "provider_id": 2}]
        })))
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/target_provider_plan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 0, "data": []})))
        .mount(&api)
        .await;

    let state = state(&api);
    let resp = app(&state).oneshot(get("/target/edit?id=3", &logged_in(&state))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(set_cookie_names(&resp).is_empty());
    let body = body_string(resp).await;
    assert!(body.contains(r#"value="shop.example.net""#));
    assert!(body.contains(r#"value="45""#));
    assert!(body.contains(r#"<option value="2" selected>Bolt</option>"#));
    assert!(body.contains(r#"<option value="1">Acme</option>"#));
    assert!(body.contains("delete-form"));
}

#[tokio::test]
async fn test_target_update_reconciles_relations() {
    let api = MockServer::start().await;
    mount_target_choices(&api).await;
    Mock::given(method("PUT"))
        .and(path("/target/3"))
        .and(body_json(json!({"domain": "shop.example.net", "identifier": "shop", "sleep": 60})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 3}})))
        .expect(1)
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/target_provider"))
        .and(query_param("target_id", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 2,
            "data": [
                {"id": 50, "target_id": 3, "provider_id": 1},
                {"id": 51, "target_id": 3, "provider_id": 4}
            ]
        })))
        .mount(&api)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/target_provider/51"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&api)
        .await;
    Mock::given(method("POST"))
        .and(path("/target_provider"))
        .and(body_json(json!({"target_id": 3, "provider_id": 2})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"id": 52}})))
        .expect(1)
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/target_provider_plan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 0, "data": []})))
        .mount(&api)
        .await;
    Mock::given(method("POST"))
        .and(path("/target_provider_plan"))
        .and(body_json(json!({"target_id": 3, "provider_plan_id": 9})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"id": 70}})))
        .expect(1)
        .mount(&api)
        .await;

    let state = state(&api);
    let resp = app(&state)
        .oneshot(post_form(
            "/target/edit?id=3",
            &logged_in(&state),
            &[
                ("id", "3"),
                ("domain", "shop.example.net"),
                ("identifier", "shop"),
                ("sleep", "60"),
                ("providers", "1"),
                ("providers", "2"),
                ("plans", "9"),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/targets");
}

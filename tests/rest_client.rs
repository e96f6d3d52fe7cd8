use std::time::Duration;

use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use psdash::net::{ApiError, HttpClient, Query, RestClient};

async fn client(server: &MockServer) -> RestClient {
    RestClient::new(&server.uri(), "k3y", HttpClient::new().unwrap()).unwrap()
}

#[tokio::test]
async fn test_get_collection_window_with_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/proxy_location"))
        .and(query_param("offset", "40"))
        .and(query_param("limit", "20"))
        .and(query_param("api_key", "k3y"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 45, "data": [{"id": 41}]})))
        .expect(1)
        .mount(&server)
        .await;

    let listing = client(&server)
        .await
        .list("proxy_location", &Query::new().window(40, 20))
        .await
        .unwrap();
    assert_eq!(listing.total, 45);
    assert_eq!(listing.data[0]["id"], 41);
}

#[tokio::test]
async fn test_get_by_id_uses_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/target/12"))
        .and(query_param("api_key", "k3y"))
        .and(query_param_is_missing("offset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 12, "domain": "a.io"}})))
        .expect(1)
        .mount(&server)
        .await;

    let record = client(&server).await.fetch("target", 12).await.unwrap();
    assert_eq!(record["domain"], "a.io");
}

#[tokio::test]
async fn test_base_path_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/provider/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 3}})))
        .expect(1)
        .mount(&server)
        .await;

    let api = RestClient::new(&format!("{}/api/v1", server.uri()), "k3y", HttpClient::new().unwrap()).unwrap();
    assert_eq!(api.fetch("provider", 3).await.unwrap()["id"], 3);
}

#[tokio::test]
async fn test_post_put_delete() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/provider"))
        .and(query_param("api_key", "k3y"))
        .and(body_json(json!({"name": "Acme"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"id": 4}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/provider/4"))
        .and(body_json(json!({"name": "Acme Inc"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 4}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/provider/4"))
        .and(query_param("api_key", "k3y"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server).await;
    let created = api.post("provider", &json!({"name": "Acme"})).await.unwrap();
    assert_eq!(created["data"]["id"], 4);
    api.put("provider", 4, &json!({"name": "Acme Inc"})).await.unwrap();
    assert_eq!(api.delete("provider", 4).await.unwrap(), Value::Null);
}

#[tokio::test]
async fn test_non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such thing"))
        .mount(&server)
        .await;

    let err = client(&server).await.fetch("proxy", 1).await.unwrap_err();
    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "no such thing");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_json_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let err = client(&server).await.get("proxy", &Query::new()).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn test_unexpected_single_item_shape() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [1, 2]})))
        .mount(&server)
        .await;

    let err = client(&server).await.fetch("proxy", 1).await.unwrap_err();
    assert!(matches!(err, ApiError::Shape(_)));
}

#[tokio::test]
async fn test_network_failure_is_a_transport_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let api = RestClient::new(&uri, "k3y", HttpClient::new().unwrap()).unwrap();
    let err = api.get("proxy", &Query::new()).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

#[tokio::test]
async fn test_slow_response_hits_the_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/proxy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let http = HttpClient::with_timeout(Duration::from_millis(200)).unwrap();
    let api = RestClient::new(&server.uri(), "k3y", http).unwrap();
    let err = api.get("proxy", &Query::new()).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

#[tokio::test]
async fn test_list_all_walks_windows_with_filters() {
    let server = MockServer::start().await;
    let first: Vec<Value> = (1..=100).map(|i| json!({"id": i, "target_id": 3})).collect();
    let second: Vec<Value> = (101..=130).map(|i| json!({"id": i, "target_id": 3})).collect();
    Mock::given(method("GET"))
        .and(path("/target_provider"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "100"))
        .and(query_param("target_id", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 130, "data": first})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/target_provider"))
        .and(query_param("offset", "100"))
        .and(query_param("target_id", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 130, "data": second})))
        .expect(1)
        .mount(&server)
        .await;

    let params = vec![("target_id".to_string(), "3".to_string())];
    let all = client(&server).await.list_all("target_provider", &params).await.unwrap();
    assert_eq!(all.len(), 130);
}

#[tokio::test]
async fn test_list_all_stops_on_short_collection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/provider"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 10, "data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let all = client(&server).await.list_all("provider", &[]).await.unwrap();
    assert!(all.is_empty());
}

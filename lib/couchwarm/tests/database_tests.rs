//! Integration tests for `Database` against a wiremock CouchDB.

use assert2::{check, let_assert};
use couchwarm::{AuthCredential, Database, Error, HyperClient, Method, ViewParams, ViewQuery};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param, query_param_is_missing},
};

async fn couch() -> (MockServer, Database) {
    let mock_server = MockServer::start().await;
    let db = Database::with_credentials(
        format!("{}/shop", mock_server.uri()),
        Some("admin"),
        Some("secret"),
    )
    .expect("database");
    (mock_server, db)
}

#[tokio::test]
async fn test_request_sends_json_headers_and_credentials() {
    let (mock_server, db) = couch().await;

    Mock::given(method("GET"))
        .and(path("/shop"))
        .and(header("Authorization", "Basic YWRtaW46c2VjcmV0"))
        .and(header("Accept", "application/json"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"db_name": "shop"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let info = db.request(Method::Get, None, None).await.expect("info");

    check!(info["db_name"] == "shop");
}

#[tokio::test]
async fn test_anonymous_request_sends_basic_none() {
    let mock_server = MockServer::start().await;
    let db = Database::connect(format!("{}/shop", mock_server.uri())).expect("database");

    Mock::given(method("GET"))
        .and(path("/shop"))
        .and(header("Authorization", "Basic none"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    db.request(Method::Get, None, None).await.expect("info");
}

#[tokio::test]
async fn test_request_with_body() {
    let (mock_server, db) = couch().await;

    Mock::given(method("PUT"))
        .and(path("/shop/order-1"))
        .and(body_json(json!({"total": 12})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"ok": true, "id": "order-1"})),
        )
        .mount(&mock_server)
        .await;

    let saved = db
        .request(Method::Put, Some("order-1"), Some(&json!({"total": 12})))
        .await
        .expect("saved");

    check!(saved["ok"] == true);
}

#[tokio::test]
async fn test_failed_status_keeps_request_and_response() {
    let (mock_server, db) = couch().await;

    Mock::given(method("PUT"))
        .and(path("/shop/order-1"))
        .respond_with(ResponseTemplate::new(409).set_body_string(
            "{\"error\":\"conflict\",\"reason\":\"Document update conflict.\"}\n",
        ))
        .mount(&mock_server)
        .await;

    let result = db
        .request(Method::Put, Some("order-1"), Some(&json!({"total": 12})))
        .await;

    let_assert!(Err(error) = result);
    check!(error.status() == Some(409));
    check!(error.is_client_error());
    let_assert!(Some(request_error) = error.as_request_error());
    check!(
        request_error.message()
            == "HTTP request failed with code 409: {\"error\":\"conflict\",\"reason\":\"Document update conflict.\"}"
    );
    check!(request_error.request().method() == Method::Put);
    check!(request_error.request().body_text() == r#"{"total":12}"#);
    check!(request_error.response().status() == 409);
}

#[tokio::test]
async fn test_server_error_is_not_retried_by_default() {
    let (mock_server, db) = couch().await;

    Mock::given(method("GET"))
        .and(path("/shop/_all_docs"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = db.all_docs(None).await;

    let_assert!(Err(error) = result);
    check!(error.is_server_error());
}

#[tokio::test]
async fn test_connection_refused() {
    let db = Database::connect("http://127.0.0.1:1/shop").expect("database");

    let result = db.request(Method::Get, None, None).await;

    let_assert!(Err(error) = result);
    check!(error.is_connection());
}

#[tokio::test]
async fn test_design_docs() {
    let (mock_server, db) = couch().await;

    Mock::given(method("GET"))
        .and(path("/shop/_all_docs"))
        .and(query_param("startkey", "\"_design/\""))
        .and(query_param("endkey", "\"_design0\""))
        .and(query_param("include_docs", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_rows": 5,
            "offset": 3,
            "rows": [
                {"id": "_design/orders", "key": "_design/orders", "value": {"rev": "1-a"},
                 "doc": {"_id": "_design/orders", "views": {"by_date": {"map": "..."}}}}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let docs = db.design_docs().await.expect("design docs");

    let_assert!([Some(doc)] = docs.as_slice());
    check!(doc["_id"] == "_design/orders");
}

#[tokio::test]
async fn test_view_with_keys_is_a_post() {
    let (mock_server, db) = couch().await;

    Mock::given(method("POST"))
        .and(path("/shop/_design/orders/_view/by_customer"))
        .and(query_param("include_docs", "true"))
        .and(query_param_is_missing("keys"))
        .and(body_json(json!({"keys": ["alice", "bob"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rows": [{"id": "o1", "key": "alice", "value": null, "doc": {"_id": "o1"}}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let params = ViewQuery::new()
        .keys(["alice", "bob"])
        .include_docs(true)
        .into_params();
    let rows = db
        .view("orders", "by_customer", Some(params))
        .await
        .expect("rows");

    let_assert!([row] = rows.as_slice());
    check!(row.id.as_deref() == Some("o1"));
    check!(row.doc == Some(json!({"_id": "o1"})));
}

#[tokio::test]
async fn test_view_with_root_key_is_a_prefix_range() {
    let (mock_server, db) = couch().await;

    Mock::given(method("GET"))
        .and(path("/shop/_design/orders/_view/by_month"))
        .and(query_param("startkey", "[\"2024\"]"))
        .and(query_param("endkey", "[\"2024\",{}]"))
        .and(query_param_is_missing("rootKey"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rows": [
                {"id": "o1", "key": ["2024", "01"], "value": 12},
                {"id": "o2", "key": ["2024", "02"], "value": 30}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let params = ViewQuery::new().root_key(["2024"]).into_params();
    let rows = db
        .view("orders", "by_month", Some(params))
        .await
        .expect("rows");

    check!(rows.len() == 2);
    check!(rows[1].value == json!(30));
}

#[tokio::test]
async fn test_view_docs() {
    let (mock_server, db) = couch().await;

    Mock::given(method("GET"))
        .and(path("/shop/_design/orders/_view/by_date"))
        .and(query_param("reduce", "false"))
        .and(query_param("include_docs", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rows": [{"id": "o1", "key": 1, "value": null, "doc": {"_id": "o1", "total": 12}}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let docs = db
        .view_docs("orders", "by_date", None)
        .await
        .expect("docs");

    check!(docs == vec![Some(json!({"_id": "o1", "total": 12}))]);
}

#[tokio::test]
async fn test_invalid_root_key_sends_nothing() {
    let (mock_server, db) = couch().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rows": []})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let params = ViewParams::new().with("rootKey", "2024");
    let result = db.view("orders", "by_month", Some(params)).await;

    let_assert!(Err(Error::InvalidRequest(_)) = result);
}

#[tokio::test]
async fn test_handle_shares_an_injected_client() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder().max_connections(2).build();
    let orders = Database::new(
        format!("{}/orders", mock_server.uri()),
        client.clone(),
        AuthCredential::None,
    )
    .expect("orders");
    let users = Database::new(
        format!("{}/users", mock_server.uri()),
        client,
        AuthCredential::basic("admin", "secret"),
    )
    .expect("users");

    orders.request(Method::Get, None, None).await.expect("orders info");
    users.request(Method::Get, None, None).await.expect("users info");

    check!(orders.client().config().max_connections == 2);
    check!(users.server_url() == orders.server_url());
}

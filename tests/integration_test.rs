use axum_test::TestServer;
use http::{Method, StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;

// 导入应用模块
use s3_cache::store::MockObjectStore;
use s3_cache::{MemoryStore, ObjectStoreCache, StoreError, app};

const BUCKET: &str = "cache-bucket";

fn server_with_store() -> (TestServer, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let cache = ObjectStoreCache::builder(store.clone(), BUCKET)
        .key_prefix("cache/")
        .build();
    let server = TestServer::new(app(Arc::new(cache))).unwrap();
    (server, store)
}

fn server_with_mock(mock: MockObjectStore) -> TestServer {
    let cache = ObjectStoreCache::builder(Arc::new(mock), BUCKET)
        .key_prefix("cache/")
        .build();
    TestServer::new(app(Arc::new(cache))).unwrap()
}

fn request_error(operation: &'static str, key: &str) -> StoreError {
    StoreError::Request {
        operation,
        bucket: BUCKET.to_string(),
        key: key.to_string(),
        source: Box::new(std::io::Error::other("service unavailable")),
    }
}

/// 集成测试：未写入的键返回404
#[tokio::test]
async fn test_unknown_key_returns_not_found() {
    let (server, _) = server_with_store();

    server
        .get("/cache/never-written")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .delete("/cache/never-written")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

/// 集成测试：写入、读取、删除的完整流程
///
/// 验证对象以 `前缀 + 键` 的形式存入存储桶
#[tokio::test]
async fn test_set_get_delete_roundtrip() {
    let (server, store) = server_with_store();

    server
        .put("/cache/abc")
        .json(&json!({"x": 1}))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert_eq!(store.keys(BUCKET).await, vec!["cache/abc".to_string()]);

    let response = server.get("/cache/abc").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"x": 1}));

    server
        .delete("/cache/abc")
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .get("/cache/abc")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

/// 集成测试：键可以包含斜杠
#[tokio::test]
async fn test_nested_keys() {
    let (server, store) = server_with_store();

    server
        .put("/cache/reports/2024/q1")
        .json(&json!([1, 2, 3]))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert_eq!(
        store.keys(BUCKET).await,
        vec!["cache/reports/2024/q1".to_string()]
    );

    let response = server.get("/cache/reports/2024/q1").await;
    assert_eq!(response.json::<Value>(), json!([1, 2, 3]));
}

/// 集成测试：add 不覆盖已存在的值
#[tokio::test]
async fn test_add_does_not_overwrite() {
    let (server, _) = server_with_store();

    server
        .post("/cache/k")
        .json(&json!("first"))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/cache/k")
        .json(&json!("second"))
        .await
        .assert_status(StatusCode::CONFLICT);

    let response = server.get("/cache/k").await;
    assert_eq!(response.json::<Value>(), json!("first"));
}

/// 集成测试：timeout 查询参数被接受但不影响结果
#[tokio::test]
async fn test_timeout_parameter_is_accepted() {
    let (server, _) = server_with_store();

    server
        .put("/cache/k")
        .add_query_param("timeout", 1)
        .json(&json!(true))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let response = server.get("/cache/k").await;
    assert_eq!(response.json::<Value>(), json!(true));
}

/// 集成测试：HEAD 请求报告键是否存在
#[tokio::test]
async fn test_head_reports_existence() {
    let (server, _) = server_with_store();

    server
        .method(Method::HEAD, "/cache/k")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    server.put("/cache/k").json(&json!(1)).await;

    server
        .method(Method::HEAD, "/cache/k")
        .await
        .assert_status_ok();
}

/// 集成测试：清空操作始终不被支持
#[tokio::test]
async fn test_clear_is_not_implemented() {
    let (server, store) = server_with_store();

    server.put("/cache/k").json(&json!(1)).await;

    server
        .delete("/cache")
        .await
        .assert_status(StatusCode::NOT_IMPLEMENTED);
    assert_eq!(store.keys(BUCKET).await, vec!["cache/k".to_string()]);
}

/// 集成测试：请求体不是 JSON 时拒绝写入
#[tokio::test]
async fn test_invalid_json_body_is_rejected() {
    let (server, store) = server_with_store();

    let response = server.put("/cache/k").text("{not json").await;
    assert!(response.status_code().is_client_error());
    assert!(store.keys(BUCKET).await.is_empty());
}

/// 集成测试：读取失败返回502，而不是404
#[tokio::test]
async fn test_failed_read_returns_bad_gateway() {
    let mut mock = MockObjectStore::new();
    mock.expect_head_object().returning(|_, _, _| Ok(()));
    mock.expect_get_object()
        .returning(|_, key, _| Err(request_error("get_object", key)));
    let server = server_with_mock(mock);

    server
        .get("/cache/abc")
        .await
        .assert_status(StatusCode::BAD_GATEWAY);
}

/// 集成测试：存储拒绝写入时返回502
#[tokio::test]
async fn test_rejected_write_returns_bad_gateway() {
    let mut mock = MockObjectStore::new();
    mock.expect_put_object()
        .times(1)
        .returning(|_, key, _, _| Err(request_error("put_object", key)));
    let server = server_with_mock(mock);

    server
        .put("/cache/abc")
        .json(&json!({"x": 1}))
        .await
        .assert_status(StatusCode::BAD_GATEWAY);
}

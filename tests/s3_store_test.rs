use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use s3_cache::store::{ExtraArgs, ObjectStore, S3Store};
use s3_cache::{CacheBackend, ObjectStoreCache, StoreError};
use serde_json::{Value, json};
use std::sync::Arc;
use wiremock::matchers::{any, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BUCKET: &str = "test-bucket";

const ACCESS_DENIED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>AccessDenied</Code><Message>Access Denied</Message><RequestId>1</RequestId></Error>"#;

const PRECONDITION_FAILED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>PreconditionFailed</Code><Message>At least one of the pre-conditions you specified did not hold</Message><RequestId>2</RequestId></Error>"#;

/// 创建指向 mock 服务器的 S3 存储（路径风格：/bucket/key）
fn store_for(server: &MockServer) -> S3Store {
    let conf = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(Credentials::new("AKID", "SECRET", None, None, "test"))
        .endpoint_url(server.uri())
        .force_path_style(true)
        .build();
    S3Store::from_conf(conf)
}

fn object_path(key: &str) -> String {
    format!("/{BUCKET}/{key}")
}

/// 测试存在性检查：200 表示存在，404 表示不存在
#[tokio::test]
async fn test_head_object_found_and_missing() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path(object_path("cache/present")))
        .respond_with(ResponseTemplate::new(200).insert_header("content-length", "7"))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path(object_path("cache/absent")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let extra = ExtraArgs::new();
    assert!(store.head_object(BUCKET, "cache/present", &extra).await.is_ok());

    let err = store
        .head_object(BUCKET, "cache/absent", &extra)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

/// 测试鉴权失败不会被当作不存在
#[tokio::test]
async fn test_head_object_access_denied_is_a_request_error() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let err = store
        .head_object(BUCKET, "cache/abc", &ExtraArgs::new())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Request { operation: "head_object", .. }));
}

/// 测试 head 附加参数被映射为请求头
#[tokio::test]
async fn test_head_object_forwards_extra_args() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path(object_path("cache/abc")))
        .and(header("x-amz-expected-bucket-owner", "123456789012"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let extra = ExtraArgs::new().with("ExpectedBucketOwner", "123456789012");
    assert!(store.head_object(BUCKET, "cache/abc", &extra).await.is_ok());
}

/// 测试下载对象内容
#[tokio::test]
async fn test_get_object_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(object_path("cache/abc")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/octet-stream")
                .set_body_bytes(br#"{"x":1}"#.to_vec()),
        )
        .mount(&server)
        .await;

    let store = store_for(&server);
    let body = store
        .get_object(BUCKET, "cache/abc", &ExtraArgs::new())
        .await
        .unwrap();
    assert_eq!(body, br#"{"x":1}"#);
}

/// 测试上传时附加参数与用户元数据被映射为请求头
#[tokio::test]
async fn test_put_object_forwards_extra_args() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(object_path("cache/abc")))
        .and(header("x-amz-server-side-encryption", "AES256"))
        .and(header("x-amz-meta-owner", "reports"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let extra = ExtraArgs::new()
        .with("ServerSideEncryption", "AES256")
        .with("Metadata.owner", "reports")
        .with("ContentType", "application/json");
    store
        .put_object(BUCKET, "cache/abc", br#"{"x":1}"#.to_vec(), &extra)
        .await
        .unwrap();
}

/// 测试不支持的附加参数不会发出请求
#[tokio::test]
async fn test_unsupported_extra_arg_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let extra = ExtraArgs::new().with("Bogus", "1");
    let err = store
        .put_object(BUCKET, "cache/abc", b"1".to_vec(), &extra)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument { .. }));

    let err = store
        .get_object(BUCKET, "cache/abc", &extra)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument { .. }));
}

/// 测试条件写入：412 表示对象已存在
#[tokio::test]
async fn test_put_object_if_absent() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(object_path("cache/taken")))
        .and(header("if-none-match", "*"))
        .respond_with(
            ResponseTemplate::new(412)
                .insert_header("content-type", "application/xml")
                .set_body_string(PRECONDITION_FAILED),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(object_path("cache/free")))
        .and(header("if-none-match", "*"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let extra = ExtraArgs::new();
    assert!(
        !store
            .put_object_if_absent(BUCKET, "cache/taken", b"1".to_vec(), &extra)
            .await
            .unwrap()
    );
    assert!(
        store
            .put_object_if_absent(BUCKET, "cache/free", b"1".to_vec(), &extra)
            .await
            .unwrap()
    );
}

/// 测试删除对象
#[tokio::test]
async fn test_delete_object() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(object_path("cache/abc")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    store.delete_object(BUCKET, "cache/abc").await.unwrap();
}

/// 测试缓存在真实 S3 协议上的行为：前缀键、解码、上传失败返回 false
#[tokio::test]
async fn test_cache_over_s3_protocol() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path(object_path("cache/abc")))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(object_path("cache/abc")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(br#"{"x":1}"#.to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path(object_path("cache/missing")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(object_path("cache/denied")))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("content-type", "application/xml")
                .set_body_string(ACCESS_DENIED),
        )
        .mount(&server)
        .await;

    let cache = ObjectStoreCache::builder(Arc::new(store_for(&server)), BUCKET)
        .key_prefix("cache/")
        .build();

    let value: Value = cache.get("abc").await.into_option().unwrap();
    assert_eq!(value, json!({"x": 1}));

    assert!(cache.get::<Value>("missing").await.is_miss());
    assert!(!cache.delete("missing").await);
    assert!(!cache.set("denied", &json!(1), None).await.unwrap());
}

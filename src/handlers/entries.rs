use crate::backend::CacheBackend;
use crate::cache::ObjectStoreCache;
use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// 处理器共享的缓存实例
pub type SharedCache = Arc<ObjectStoreCache>;

/// 写入请求的查询参数。
#[derive(Debug, Default, Deserialize)]
pub struct WriteParams {
    /// 秒。会被转交给缓存，但不会生效。
    pub timeout: Option<u64>,
}

impl WriteParams {
    fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

/// 读取缓存值。
///
/// # 返回值
///
/// 命中返回 200 与 JSON 值，未命中返回 404，读取失败返回 502。
pub async fn get_entry(
    Extension(cache): Extension<SharedCache>,
    Path(key): Path<String>,
) -> Response {
    match cache.get::<Value>(&key).await.into_result() {
        Ok(Some(value)) => Json(value).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Not Found").into_response(),
        Err(e) => (StatusCode::BAD_GATEWAY, e.to_string()).into_response(),
    }
}

/// 写入缓存值，已存在时覆盖。
pub async fn set_entry(
    Extension(cache): Extension<SharedCache>,
    Path(key): Path<String>,
    Query(params): Query<WriteParams>,
    Json(value): Json<Value>,
) -> Response {
    match cache.set(&key, &value, params.timeout()).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (StatusCode::BAD_GATEWAY, "failed to store value").into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// 仅在键不存在时写入。
///
/// 409 既可能表示键已存在，也可能表示写入失败，与 `add` 的返回值一致。
pub async fn add_entry(
    Extension(cache): Extension<SharedCache>,
    Path(key): Path<String>,
    Query(params): Query<WriteParams>,
    Json(value): Json<Value>,
) -> Response {
    match cache.add(&key, &value, params.timeout()).await {
        Ok(true) => StatusCode::CREATED.into_response(),
        Ok(false) => (StatusCode::CONFLICT, "key exists or could not be stored").into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

pub async fn delete_entry(
    Extension(cache): Extension<SharedCache>,
    Path(key): Path<String>,
) -> StatusCode {
    if cache.delete(&key).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

pub async fn has_entry(
    Extension(cache): Extension<SharedCache>,
    Path(key): Path<String>,
) -> StatusCode {
    if cache.has(&key).await {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

/// 清空缓存：始终返回 501。
pub async fn clear_entries(Extension(cache): Extension<SharedCache>) -> Response {
    if cache.clear().await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (StatusCode::NOT_IMPLEMENTED, "clear is not supported").into_response()
    }
}

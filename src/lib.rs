//! S3 缓存库
//!
//! 把 S3 兼容的对象存储桶作为通用键值缓存后端使用，主要功能包括：
//! - 标准缓存接口（get/set/add/delete/clear）
//! - 键前缀（固定字符串或每次操作求值的函数）
//! - 值序列化（默认 JSON）
//! - 转发给存储客户端的附加请求参数
//! - 基于 Axum 的 HTTP 接口
//!
//! 过期完全交给存储桶的生命周期规则，`clear` 不被支持。

pub mod backend;
pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod handlers;
pub mod prefix;
pub mod store;
pub mod utils;

pub use backend::{CacheBackend, Lookup};
pub use cache::{AddMode, ObjectStoreCache, ObjectStoreCacheBuilder, ProbePolicy};
pub use codec::{Codec, JsonCodec};
pub use config::{CacheConfig, ClientOptions};
pub use error::{CacheError, CodecError, ConfigError, StoreError};
pub use prefix::KeyPrefix;
pub use store::{ExtraArgs, MemoryStore, ObjectStore, S3Store};

use axum::routing::{delete, get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 创建并配置Axum应用程序
///
/// # 参数
///
/// * `cache` - 共享的缓存实例。
///
/// # Returns
///
/// 返回配置好的Axum Router实例
pub fn app(cache: Arc<ObjectStoreCache>) -> axum::Router {
    axum::Router::new()
        .route(
            "/cache/{*key}",
            get(handlers::get_entry)
                .put(handlers::set_entry)
                .post(handlers::add_entry)
                .delete(handlers::delete_entry)
                .head(handlers::has_entry),
        )
        .route("/cache", delete(handlers::clear_entries))
        .layer(TraceLayer::new_for_http())
        .layer(axum::extract::Extension(cache))
}

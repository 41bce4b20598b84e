//! 错误类型模块
//!
//! 存储层错误是"软"错误：缓存操作会记录日志并返回失败/未命中；
//! 编码错误是"硬"错误：会直接传播给调用方。

use thiserror::Error;

/// 对象存储客户端返回的错误。
#[derive(Debug, Error)]
pub enum StoreError {
    /// 对象不存在（HTTP 404 / NoSuchKey）。
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// 条件写入的前置条件不满足（HTTP 412）。
    #[error("precondition failed for {bucket}/{key}")]
    PreconditionFailed { bucket: String, key: String },

    /// 附加参数无法映射到存储请求上。
    #[error("invalid extra argument `{name}` for {operation}: {reason}")]
    InvalidArgument {
        operation: &'static str,
        name: String,
        reason: String,
    },

    /// 其他请求错误：网络、鉴权、服务端错误等。
    #[error("{operation} request failed for {bucket}/{key}: {source}")]
    Request {
        operation: &'static str,
        bucket: String,
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// 值编解码错误。
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode value: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode value: {0}")]
    Decode(#[source] serde_json::Error),
}

/// `Lookup::Failed` 携带的错误。
#[derive(Debug, Error)]
pub enum CacheError {
    /// 下载对象失败。
    #[error(transparent)]
    Store(#[from] StoreError),

    /// 对象内容无法解码。
    #[error(transparent)]
    Decode(#[from] CodecError),

    /// 严格模式下，存在性检查既不是"存在"也不是"不存在"。
    #[error("existence check failed: {0}")]
    Probe(#[source] StoreError),
}

/// 配置错误。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("unsupported option: {0}")]
    Unsupported(String),

    #[error("access key id and secret access key must be provided together")]
    IncompleteCredentials,

    #[error("extra argument `{name}` is not supported for {operation}")]
    UnsupportedExtraArg {
        operation: &'static str,
        name: String,
    },
}

//! 对象存储模块
//!
//! 该模块定义缓存与对象存储之间的接口，以及两种实现：
//! - `s3`: 基于 aws-sdk-s3 的实现
//! - `memory`: 进程内实现，用于测试和本地运行

pub mod memory;
pub mod s3;

use crate::error::StoreError;
use async_trait::async_trait;
use mockall::automock;
use std::collections::BTreeMap;
use std::fmt;

pub use memory::MemoryStore;
pub use s3::S3Store;

/// 附加参数所作用的请求类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Head,
    Get,
    Put,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Head => "head_object",
            Operation::Get => "get_object",
            Operation::Put => "put_object",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 原样转发给存储客户端的附加参数，例如 `ServerSideEncryption=AES256`。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraArgs(BTreeMap<String, String>);

impl ExtraArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个参数（同名参数会被覆盖）。
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ExtraArgs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// 缓存所需的对象存储能力。
///
/// 客户端句柄在所有调用之间共享，实现必须可以并发复用。
#[automock]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// 存在性检查。对象不存在时必须返回 `StoreError::NotFound`。
    async fn head_object(&self, bucket: &str, key: &str, extra: &ExtraArgs)
    -> Result<(), StoreError>;

    /// 下载整个对象。
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        extra: &ExtraArgs,
    ) -> Result<Vec<u8>, StoreError>;

    /// 上传对象，已存在时覆盖。
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        extra: &ExtraArgs,
    ) -> Result<(), StoreError>;

    /// 仅当对象不存在时上传。
    ///
    /// # 返回值
    ///
    /// 写入成功返回 `Ok(true)`，对象已存在返回 `Ok(false)`。
    async fn put_object_if_absent(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        extra: &ExtraArgs,
    ) -> Result<bool, StoreError>;

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError>;
}

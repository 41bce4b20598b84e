//! 通用缓存接口
//!
//! `get`/`set`/`add`/`delete`/`clear` 是每个后端必须实现的操作；
//! 批量操作提供逐键调用的默认实现。

use crate::error::{CacheError, CodecError};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// 一次查询的结果。
///
/// 与直接返回 `Option` 不同，这里区分了"确实不存在"与"读取失败"。
/// 需要宽松语义的调用方可以使用 [`Lookup::into_option`]。
#[derive(Debug)]
pub enum Lookup<T> {
    Hit(T),
    Miss,
    Failed(CacheError),
}

impl<T> Lookup<T> {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    pub fn is_miss(&self) -> bool {
        matches!(self, Lookup::Miss)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Lookup::Failed(_))
    }

    /// 命中时返回值，未命中和失败都返回 `None`。
    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Hit(value) => Some(value),
            Lookup::Miss | Lookup::Failed(_) => None,
        }
    }

    /// 命中返回 `Ok(Some)`，未命中返回 `Ok(None)`，失败返回 `Err`。
    pub fn into_result(self) -> Result<Option<T>, CacheError> {
        match self {
            Lookup::Hit(value) => Ok(Some(value)),
            Lookup::Miss => Ok(None),
            Lookup::Failed(err) => Err(err),
        }
    }
}

/// 缓存后端接口。
///
/// 存储层失败不会以 `Err` 返回：写操作返回 `false`，读操作返回
/// `Lookup::Miss` 或 `Lookup::Failed`。只有编码失败会以 `Err` 传播。
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get<T>(&self, key: &str) -> Lookup<T>
    where
        T: DeserializeOwned + Send;

    /// 写入值，已存在时覆盖。`timeout` 仅为接口兼容而保留。
    async fn set<T>(
        &self,
        key: &str,
        value: &T,
        timeout: Option<Duration>,
    ) -> Result<bool, CodecError>
    where
        T: Serialize + Sync;

    /// 与 `set` 相同，但不覆盖已存在的值。
    async fn add<T>(
        &self,
        key: &str,
        value: &T,
        timeout: Option<Duration>,
    ) -> Result<bool, CodecError>
    where
        T: Serialize + Sync;

    /// 键存在并被删除时返回 `true`。
    async fn delete(&self, key: &str) -> bool;

    /// 清空缓存。不支持时返回 `false`。
    async fn clear(&self) -> bool;

    async fn has(&self, key: &str) -> bool;

    /// 逐键查询，结果顺序与 `keys` 一致。
    async fn get_many<T>(&self, keys: &[&str]) -> Vec<Lookup<T>>
    where
        T: DeserializeOwned + Send,
    {
        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            results.push(self.get(key).await);
        }
        results
    }

    /// 逐键写入。
    ///
    /// # 返回值
    ///
    /// 写入失败的键列表；编码失败会立即中止并返回 `Err`。
    async fn set_many<T>(
        &self,
        entries: &[(&str, T)],
        timeout: Option<Duration>,
    ) -> Result<Vec<String>, CodecError>
    where
        T: Serialize + Sync,
    {
        let mut failed = Vec::new();
        for (key, value) in entries {
            if !self.set(key, value, timeout).await? {
                failed.push(key.to_string());
            }
        }
        Ok(failed)
    }

    /// 逐键删除，返回实际删除的键。
    async fn delete_many(&self, keys: &[&str]) -> Vec<String> {
        let mut deleted = Vec::new();
        for key in keys {
            if self.delete(key).await {
                deleted.push(key.to_string());
            }
        }
        deleted
    }
}

//! 基于对象存储的缓存
//!
//! 每个缓存操作都几乎一一对应一次对象存储调用（head/get/put/delete）。
//! 本地不保存任何缓存状态；过期由存储桶的生命周期规则负责，
//! 因此 `timeout` 参数会被忽略。

use crate::backend::{CacheBackend, Lookup};
use crate::codec::{Codec, JsonCodec};
use crate::config::CacheConfig;
use crate::error::{CacheError, CodecError, StoreError};
use crate::prefix::KeyPrefix;
use crate::store::{ExtraArgs, ObjectStore};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// 默认超时时间（仅保存，不生效）。
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// `add` 的实现方式。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddMode {
    /// 先做存在性检查再写入。
    ///
    /// 不是原子操作：两个并发的 `add` 可能都返回成功，后写入者的值生效。
    #[default]
    CheckThenPut,
    /// 使用存储的条件写入（`If-None-Match: *`），对象已存在时不写入。
    IfAbsent,
}

/// 存在性检查遇到"不存在"以外的错误时如何处理。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProbePolicy {
    /// 当作不存在。权限或网络错误会因此表现为未命中。
    #[default]
    Lenient,
    /// 作为失败上报。
    Strict,
}

enum Probe {
    Present,
    Absent,
    Unknown(StoreError),
}

/// 把对象存储桶作为键值缓存使用。
///
/// 完整的存储键为 `key_prefix + key`，前缀在每次操作时求值一次。
pub struct ObjectStoreCache<C = JsonCodec> {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    key_prefix: KeyPrefix,
    default_timeout: Duration,
    get_extra_args: ExtraArgs,
    put_extra_args: ExtraArgs,
    head_extra_args: ExtraArgs,
    add_mode: AddMode,
    probe_policy: ProbePolicy,
    codec: C,
}

impl ObjectStoreCache<JsonCodec> {
    pub fn builder(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
    ) -> ObjectStoreCacheBuilder<JsonCodec> {
        ObjectStoreCacheBuilder {
            store,
            bucket: bucket.into(),
            key_prefix: KeyPrefix::default(),
            default_timeout: DEFAULT_TIMEOUT,
            get_extra_args: ExtraArgs::new(),
            put_extra_args: ExtraArgs::new(),
            head_extra_args: ExtraArgs::new(),
            add_mode: AddMode::default(),
            probe_policy: ProbePolicy::default(),
            codec: JsonCodec,
        }
    }

    /// 根据配置创建缓存。
    ///
    /// # 参数
    ///
    /// * `store` - 共享的对象存储客户端。
    /// * `config` - 缓存配置，客户端相关字段在这里不会被使用。
    pub fn from_config(store: Arc<dyn ObjectStore>, config: &CacheConfig) -> Self {
        Self::builder(store, config.bucket.clone())
            .key_prefix(config.key_prefix.clone())
            .default_timeout(config.default_timeout)
            .get_extra_args(config.get_extra_args.clone())
            .put_extra_args(config.put_extra_args.clone())
            .head_extra_args(config.head_extra_args.clone())
            .add_mode(config.add_mode)
            .probe_policy(config.probe_policy)
            .build()
    }
}

impl<C: Codec> ObjectStoreCache<C> {
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn add_mode(&self) -> AddMode {
        self.add_mode
    }

    pub fn probe_policy(&self) -> ProbePolicy {
        self.probe_policy
    }

    /// 把逻辑键转换为完整的存储键。
    pub fn full_key(&self, key: &str) -> String {
        self.key_prefix.full_key(key)
    }

    async fn probe(&self, full_key: &str) -> Probe {
        match self
            .store
            .head_object(&self.bucket, full_key, &self.head_extra_args)
            .await
        {
            Ok(()) => Probe::Present,
            Err(err) if err.is_not_found() => Probe::Absent,
            Err(err) => Probe::Unknown(err),
        }
    }

    /// 把检查结果归结为"是否存在"。
    ///
    /// 宽松模式下未知错误视为不存在；严格模式下返回错误。
    fn settle(&self, key: &str, probe: Probe) -> Result<bool, StoreError> {
        match probe {
            Probe::Present => Ok(true),
            Probe::Absent => Ok(false),
            Probe::Unknown(err) => match self.probe_policy {
                ProbePolicy::Lenient => {
                    debug!(key, error = %err, "existence check failed, treating key as absent");
                    Ok(false)
                }
                ProbePolicy::Strict => {
                    warn!(key, error = %err, "existence check failed");
                    Err(err)
                }
            },
        }
    }

    async fn upload(&self, key: &str, full_key: &str, body: Vec<u8>) -> bool {
        match self
            .store
            .put_object(&self.bucket, full_key, body, &self.put_extra_args)
            .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!(key, full_key = %full_key, error = %err, "error while trying to set key");
                false
            }
        }
    }

    fn note_timeout(key: &str, timeout: Option<Duration>) {
        if let Some(timeout) = timeout {
            debug!(
                key,
                timeout_secs = timeout.as_secs(),
                "timeout ignored, expiration is left to bucket lifecycle rules"
            );
        }
    }
}

#[async_trait]
impl<C: Codec> CacheBackend for ObjectStoreCache<C> {
    async fn get<T>(&self, key: &str) -> Lookup<T>
    where
        T: DeserializeOwned + Send,
    {
        let full_key = self.full_key(key);
        match self.settle(key, self.probe(&full_key).await) {
            Ok(true) => {}
            Ok(false) => return Lookup::Miss,
            Err(err) => return Lookup::Failed(CacheError::Probe(err)),
        }

        let bytes = match self
            .store
            .get_object(&self.bucket, &full_key, &self.get_extra_args)
            .await
        {
            Ok(bytes) => bytes,
            // 检查与下载之间被删除
            Err(err) if err.is_not_found() => return Lookup::Miss,
            Err(err) => {
                warn!(key, full_key = %full_key, error = %err, "error while trying to get key");
                return Lookup::Failed(err.into());
            }
        };

        match self.codec.decode(&bytes) {
            Ok(value) => Lookup::Hit(value),
            Err(err) => {
                warn!(key, full_key = %full_key, error = %err, "error while trying to decode key");
                Lookup::Failed(err.into())
            }
        }
    }

    async fn set<T>(
        &self,
        key: &str,
        value: &T,
        timeout: Option<Duration>,
    ) -> Result<bool, CodecError>
    where
        T: Serialize + Sync,
    {
        Self::note_timeout(key, timeout);
        let body = self.codec.encode(value)?;
        let full_key = self.full_key(key);
        Ok(self.upload(key, &full_key, body).await)
    }

    /// 仅在键不存在时写入。
    ///
    /// 默认的 `AddMode::CheckThenPut` 不是原子的：检查与写入之间存在竞争窗口，
    /// 并发调用可能都返回 `true`，最终值为最后一次写入。
    async fn add<T>(
        &self,
        key: &str,
        value: &T,
        timeout: Option<Duration>,
    ) -> Result<bool, CodecError>
    where
        T: Serialize + Sync,
    {
        Self::note_timeout(key, timeout);
        let full_key = self.full_key(key);

        match self.add_mode {
            AddMode::CheckThenPut => {
                match self.settle(key, self.probe(&full_key).await) {
                    Ok(false) => {}
                    Ok(true) | Err(_) => return Ok(false),
                }
                let body = self.codec.encode(value)?;
                Ok(self.upload(key, &full_key, body).await)
            }
            AddMode::IfAbsent => {
                let body = self.codec.encode(value)?;
                match self
                    .store
                    .put_object_if_absent(&self.bucket, &full_key, body, &self.put_extra_args)
                    .await
                {
                    Ok(written) => Ok(written),
                    Err(err) => {
                        warn!(key, full_key = %full_key, error = %err, "error while trying to add key");
                        Ok(false)
                    }
                }
            }
        }
    }

    async fn delete(&self, key: &str) -> bool {
        let full_key = self.full_key(key);
        match self.settle(key, self.probe(&full_key).await) {
            Ok(true) => {}
            Ok(false) | Err(_) => return false,
        }

        match self.store.delete_object(&self.bucket, &full_key).await {
            Ok(()) => true,
            Err(err) => {
                warn!(key, full_key = %full_key, error = %err, "error while trying to delete key");
                false
            }
        }
    }

    /// 不支持清空：按前缀删除需要枚举再批量删除，无法原子完成。
    async fn clear(&self) -> bool {
        debug!(bucket = %self.bucket, "clear is not supported by the object store cache");
        false
    }

    async fn has(&self, key: &str) -> bool {
        let full_key = self.full_key(key);
        self.settle(key, self.probe(&full_key).await)
            .unwrap_or(false)
    }
}

/// `ObjectStoreCache` 的构建器。
pub struct ObjectStoreCacheBuilder<C = JsonCodec> {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    key_prefix: KeyPrefix,
    default_timeout: Duration,
    get_extra_args: ExtraArgs,
    put_extra_args: ExtraArgs,
    head_extra_args: ExtraArgs,
    add_mode: AddMode,
    probe_policy: ProbePolicy,
    codec: C,
}

impl<C: Codec> ObjectStoreCacheBuilder<C> {
    pub fn key_prefix(mut self, prefix: impl Into<KeyPrefix>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn get_extra_args(mut self, args: ExtraArgs) -> Self {
        self.get_extra_args = args;
        self
    }

    pub fn put_extra_args(mut self, args: ExtraArgs) -> Self {
        self.put_extra_args = args;
        self
    }

    pub fn head_extra_args(mut self, args: ExtraArgs) -> Self {
        self.head_extra_args = args;
        self
    }

    pub fn add_mode(mut self, mode: AddMode) -> Self {
        self.add_mode = mode;
        self
    }

    pub fn probe_policy(mut self, policy: ProbePolicy) -> Self {
        self.probe_policy = policy;
        self
    }

    /// 替换编解码器。
    pub fn codec<C2: Codec>(self, codec: C2) -> ObjectStoreCacheBuilder<C2> {
        ObjectStoreCacheBuilder {
            store: self.store,
            bucket: self.bucket,
            key_prefix: self.key_prefix,
            default_timeout: self.default_timeout,
            get_extra_args: self.get_extra_args,
            put_extra_args: self.put_extra_args,
            head_extra_args: self.head_extra_args,
            add_mode: self.add_mode,
            probe_policy: self.probe_policy,
            codec,
        }
    }

    pub fn build(self) -> ObjectStoreCache<C> {
        ObjectStoreCache {
            store: self.store,
            bucket: self.bucket,
            key_prefix: self.key_prefix,
            default_timeout: self.default_timeout,
            get_extra_args: self.get_extra_args,
            put_extra_args: self.put_extra_args,
            head_extra_args: self.head_extra_args,
            add_mode: self.add_mode,
            probe_policy: self.probe_policy,
            codec: self.codec,
        }
    }
}

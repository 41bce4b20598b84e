//! 进程内对象存储
//!
//! 附加参数会被忽略。条件写入在写锁内完成，因此是原子的。

use super::{ExtraArgs, ObjectStore};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回指定存储桶中所有对象键（已排序）。
    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        let objects = self.objects.read().await;
        let mut keys: Vec<String> = objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    fn not_found(bucket: &str, key: &str) -> StoreError {
        StoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn head_object(
        &self,
        bucket: &str,
        key: &str,
        _extra: &ExtraArgs,
    ) -> Result<(), StoreError> {
        let objects = self.objects.read().await;
        if objects.contains_key(&(bucket.to_string(), key.to_string())) {
            Ok(())
        } else {
            Err(Self::not_found(bucket, key))
        }
    }

    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        _extra: &ExtraArgs,
    ) -> Result<Vec<u8>, StoreError> {
        let objects = self.objects.read().await;
        objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| Self::not_found(bucket, key))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        _extra: &ExtraArgs,
    ) -> Result<(), StoreError> {
        let mut objects = self.objects.write().await;
        objects.insert((bucket.to_string(), key.to_string()), body);
        Ok(())
    }

    async fn put_object_if_absent(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        _extra: &ExtraArgs,
    ) -> Result<bool, StoreError> {
        let mut objects = self.objects.write().await;
        let entry = objects.entry((bucket.to_string(), key.to_string()));
        match entry {
            std::collections::hash_map::Entry::Occupied(_) => Ok(false),
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(body);
                Ok(true)
            }
        }
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        // 与 S3 一致：删除不存在的对象不算错误
        let mut objects = self.objects.write().await;
        objects.remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}

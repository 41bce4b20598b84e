//! 键前缀模块
//!
//! 前缀既可以是固定字符串，也可以是每次操作时求值的函数（例如按日期分区）。

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// 缓存键前缀。
///
/// 完整的存储键始终为 `resolve() + key`，不做转义，也不处理不同前缀之间的冲突。
#[derive(Clone)]
pub enum KeyPrefix {
    Static(String),
    Dynamic(Arc<dyn Fn() -> String + Send + Sync>),
}

impl KeyPrefix {
    /// 使用函数作为前缀来源，每次操作都会重新调用。
    pub fn dynamic<F>(provider: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        KeyPrefix::Dynamic(Arc::new(provider))
    }

    /// 计算当前前缀。
    pub fn resolve(&self) -> Cow<'_, str> {
        match self {
            KeyPrefix::Static(prefix) => Cow::Borrowed(prefix),
            KeyPrefix::Dynamic(provider) => Cow::Owned(provider()),
        }
    }

    /// 将逻辑键转换为完整的存储键。
    ///
    /// # 参数
    ///
    /// * `key` - 逻辑缓存键。
    ///
    /// # 返回值
    ///
    /// 前缀与键直接拼接后的字符串。
    pub fn full_key(&self, key: &str) -> String {
        let prefix = self.resolve();
        let mut full = String::with_capacity(prefix.len() + key.len());
        full.push_str(&prefix);
        full.push_str(key);
        full
    }
}

impl Default for KeyPrefix {
    fn default() -> Self {
        KeyPrefix::Static(String::new())
    }
}

impl From<&str> for KeyPrefix {
    fn from(prefix: &str) -> Self {
        KeyPrefix::Static(prefix.to_string())
    }
}

impl From<String> for KeyPrefix {
    fn from(prefix: String) -> Self {
        KeyPrefix::Static(prefix)
    }
}

impl fmt::Debug for KeyPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPrefix::Static(prefix) => f.debug_tuple("Static").field(prefix).finish(),
            KeyPrefix::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_static_prefix_concatenates_without_separator() {
        let prefix = KeyPrefix::from("cache/");
        assert_eq!(prefix.full_key("abc"), "cache/abc");

        // 不会自动补斜杠
        let prefix = KeyPrefix::from("cache");
        assert_eq!(prefix.full_key("abc"), "cacheabc");

        assert_eq!(KeyPrefix::default().full_key("abc"), "abc");
    }

    #[test]
    fn test_dynamic_prefix_is_evaluated_every_time() {
        let counter = Arc::new(AtomicUsize::new(0));
        let calls = counter.clone();
        let prefix = KeyPrefix::dynamic(move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            format!("gen-{n}/")
        });

        assert_eq!(prefix.full_key("k"), "gen-0/k");
        assert_eq!(prefix.full_key("k"), "gen-1/k");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_debug_hides_provider() {
        let prefix = KeyPrefix::dynamic(|| "x".to_string());
        assert_eq!(format!("{prefix:?}"), "Dynamic(..)");
        assert_eq!(format!("{:?}", KeyPrefix::from("p/")), "Static(\"p/\")");
    }
}

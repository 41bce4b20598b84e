//! 缓存服务的配置模块。
//!
//! 该模块负责从环境变量加载配置。解析逻辑通过 `from_lookup` 接收一个
//! 查找函数，测试时不需要修改进程环境变量。

mod client;

pub use client::{ClientOptions, S3_API_VERSION};

use crate::cache::{AddMode, DEFAULT_TIMEOUT, ProbePolicy};
use crate::error::ConfigError;
use crate::store::s3::find_unsupported_arg;
use crate::store::{ExtraArgs, Operation};
use crate::utils::env::{parse_bool, parse_extra_args};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_BUCKET: &str = "S3_BUCKET";
pub const ENV_KEY_PREFIX: &str = "S3_CACHE_KEY_PREFIX";
pub const ENV_DEFAULT_TIMEOUT: &str = "S3_CACHE_DEFAULT_TIMEOUT";
pub const ENV_GET_EXTRA_ARGS: &str = "S3_CACHE_GET_EXTRA_ARGS";
pub const ENV_PUT_EXTRA_ARGS: &str = "S3_CACHE_PUT_EXTRA_ARGS";
pub const ENV_HEAD_EXTRA_ARGS: &str = "S3_CACHE_HEAD_EXTRA_ARGS";
pub const ENV_ADD_MODE: &str = "S3_CACHE_ADD_MODE";
pub const ENV_PROBE_POLICY: &str = "S3_CACHE_PROBE_POLICY";
pub const ENV_LISTEN_ADDR: &str = "S3_CACHE_LISTEN_ADDR";
pub const ENV_REGION: &str = "S3_REGION";
pub const ENV_API_VERSION: &str = "S3_API_VERSION";
pub const ENV_USE_SSL: &str = "S3_USE_SSL";
pub const ENV_VERIFY_TLS: &str = "S3_VERIFY_TLS";
pub const ENV_ENDPOINT: &str = "S3_ENDPOINT";
pub const ENV_ACCESS_KEY_ID: &str = "S3_ACCESS_KEY_ID";
pub const ENV_SECRET_ACCESS_KEY: &str = "S3_SECRET_ACCESS_KEY";
pub const ENV_SESSION_TOKEN: &str = "S3_SESSION_TOKEN";
pub const ENV_FORCE_PATH_STYLE: &str = "S3_FORCE_PATH_STYLE";

/// 默认监听地址
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

/// 缓存配置。
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub bucket: String,
    pub key_prefix: String,
    /// 仅为接口兼容而保留，不会设置对象过期。
    pub default_timeout: Duration,
    pub get_extra_args: ExtraArgs,
    pub put_extra_args: ExtraArgs,
    pub head_extra_args: ExtraArgs,
    pub add_mode: AddMode,
    pub probe_policy: ProbePolicy,
    pub client: ClientOptions,
    pub listen_addr: String,
}

impl CacheConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key_prefix: String::new(),
            default_timeout: DEFAULT_TIMEOUT,
            get_extra_args: ExtraArgs::new(),
            put_extra_args: ExtraArgs::new(),
            head_extra_args: ExtraArgs::new(),
            add_mode: AddMode::default(),
            probe_policy: ProbePolicy::default(),
            client: ClientOptions::default(),
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
        }
    }

    /// 从进程环境变量加载配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 使用查找函数加载配置。
    ///
    /// # 参数
    ///
    /// * `lookup` - 按变量名返回变量值，未设置时返回 `None`。
    ///
    /// # 返回值
    ///
    /// 解析后的配置；缺少存储桶或任何值无法解析时返回错误。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // 空字符串视为未设置
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let bucket = var(ENV_BUCKET).ok_or(ConfigError::Missing(ENV_BUCKET))?;
        let mut config = Self::new(bucket);

        // 前缀保留原样，不做 trim
        if let Some(prefix) = lookup(ENV_KEY_PREFIX) {
            config.key_prefix = prefix;
        }

        if let Some(value) = var(ENV_DEFAULT_TIMEOUT) {
            let secs: u64 = value.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    name: ENV_DEFAULT_TIMEOUT,
                    reason: e.to_string(),
                }
            })?;
            config.default_timeout = Duration::from_secs(secs);
        }

        if let Some(value) = var(ENV_GET_EXTRA_ARGS) {
            config.get_extra_args = parse_extra_args(ENV_GET_EXTRA_ARGS, &value)?;
        }
        if let Some(value) = var(ENV_PUT_EXTRA_ARGS) {
            config.put_extra_args = parse_extra_args(ENV_PUT_EXTRA_ARGS, &value)?;
        }
        if let Some(value) = var(ENV_HEAD_EXTRA_ARGS) {
            config.head_extra_args = parse_extra_args(ENV_HEAD_EXTRA_ARGS, &value)?;
        }

        if let Some(value) = var(ENV_ADD_MODE) {
            config.add_mode = match value.trim().to_lowercase().as_str() {
                "check-then-put" => AddMode::CheckThenPut,
                "if-absent" => AddMode::IfAbsent,
                other => {
                    return Err(ConfigError::Invalid {
                        name: ENV_ADD_MODE,
                        reason: format!("expected `check-then-put` or `if-absent`, got `{other}`"),
                    });
                }
            };
        }

        if let Some(value) = var(ENV_PROBE_POLICY) {
            config.probe_policy = match value.trim().to_lowercase().as_str() {
                "lenient" => ProbePolicy::Lenient,
                "strict" => ProbePolicy::Strict,
                other => {
                    return Err(ConfigError::Invalid {
                        name: ENV_PROBE_POLICY,
                        reason: format!("expected `lenient` or `strict`, got `{other}`"),
                    });
                }
            };
        }

        if let Some(addr) = var(ENV_LISTEN_ADDR) {
            config.listen_addr = addr.trim().to_string();
        }

        let client = &mut config.client;
        client.region = var(ENV_REGION);
        client.api_version = var(ENV_API_VERSION);
        client.endpoint_url = var(ENV_ENDPOINT);
        client.access_key_id = var(ENV_ACCESS_KEY_ID);
        client.secret_access_key = var(ENV_SECRET_ACCESS_KEY);
        client.session_token = var(ENV_SESSION_TOKEN);
        if let Some(value) = var(ENV_USE_SSL) {
            client.use_ssl = parse_bool(ENV_USE_SSL, &value)?;
        }
        // 与 boto3 的 `verify` 相同：布尔值，或 CA 证书路径
        if let Some(value) = var(ENV_VERIFY_TLS) {
            match parse_bool(ENV_VERIFY_TLS, &value) {
                Ok(verify) => client.verify_tls = verify,
                Err(_) => client.ca_bundle = Some(PathBuf::from(value)),
            }
        }
        if let Some(value) = var(ENV_FORCE_PATH_STYLE) {
            client.force_path_style = parse_bool(ENV_FORCE_PATH_STYLE, &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// 检查附加参数与客户端选项。
    pub fn validate(&self) -> Result<(), ConfigError> {
        let groups = [
            (Operation::Get, &self.get_extra_args),
            (Operation::Put, &self.put_extra_args),
            (Operation::Head, &self.head_extra_args),
        ];
        for (operation, args) in groups {
            if let Some(name) = find_unsupported_arg(operation, args) {
                return Err(ConfigError::UnsupportedExtraArg {
                    operation: operation.as_str(),
                    name: name.to_string(),
                });
            }
        }
        self.client.validate()
    }
}

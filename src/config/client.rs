//! S3 客户端配置。

use crate::error::ConfigError;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Credentials;
use aws_smithy_http_client::tls::{self, TlsContext, TrustStore, rustls_provider::CryptoMode};
use std::fmt;
use std::path::{Path, PathBuf};

/// S3 唯一的 API 版本。
pub const S3_API_VERSION: &str = "2006-03-01";

/// 静态凭据的提供者名称
const CREDENTIALS_PROVIDER: &str = "s3-cache";

/// 创建 S3 客户端所需的连接参数。
///
/// 未设置的字段使用 AWS SDK 的默认链（环境变量、配置文件、实例元数据）。
#[derive(Clone)]
pub struct ClientOptions {
    pub region: Option<String>,
    /// 只接受 `2006-03-01`。
    pub api_version: Option<String>,
    /// 端点没有写明协议时使用 https 还是 http。
    pub use_ssl: bool,
    /// 不支持关闭证书校验。
    pub verify_tls: bool,
    /// 自定义 CA 证书（PEM），设置后替代系统根证书。
    pub ca_bundle: Option<PathBuf>,
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    /// S3 兼容服务（如 MinIO）通常需要路径风格访问。
    pub force_path_style: bool,
    /// 作为基础的 SDK 配置，设置后不再从环境加载。
    pub base_config: Option<SdkConfig>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            region: None,
            api_version: None,
            use_ssl: true,
            verify_tls: true,
            ca_bundle: None,
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            force_path_style: false,
            base_config: None,
        }
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("region", &self.region)
            .field("api_version", &self.api_version)
            .field("use_ssl", &self.use_ssl)
            .field("verify_tls", &self.verify_tls)
            .field("ca_bundle", &self.ca_bundle)
            .field("endpoint_url", &self.endpoint_url)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .field("force_path_style", &self.force_path_style)
            .field("base_config", &self.base_config.is_some())
            .finish()
    }
}

impl ClientOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(version) = &self.api_version {
            if version != S3_API_VERSION {
                return Err(ConfigError::Unsupported(format!(
                    "S3 API version `{version}`, only `{S3_API_VERSION}` exists"
                )));
            }
        }
        if !self.verify_tls {
            return Err(ConfigError::Unsupported(
                "disabling TLS certificate verification".to_string(),
            ));
        }
        if let Some(path) = &self.ca_bundle {
            if !path.is_file() {
                return Err(ConfigError::Invalid {
                    name: "S3_VERIFY_TLS",
                    reason: format!("CA bundle {} is not a file", path.display()),
                });
            }
        }
        self.credentials()?;
        self.resolve_endpoint()?;
        Ok(())
    }

    /// 静态凭据。两个密钥都未设置时返回 `None`，使用默认凭据链。
    pub fn credentials(&self) -> Result<Option<Credentials>, ConfigError> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => Ok(Some(Credentials::new(
                access_key_id.clone(),
                secret_access_key.clone(),
                self.session_token.clone(),
                None,
                CREDENTIALS_PROVIDER,
            ))),
            (None, None) if self.session_token.is_none() => Ok(None),
            _ => Err(ConfigError::IncompleteCredentials),
        }
    }

    /// 计算最终端点。
    ///
    /// # 返回值
    ///
    /// - 端点带协议时原样返回
    /// - 端点不带协议时按 `use_ssl` 补上 `https://` 或 `http://`
    /// - 未设置端点且 `use_ssl` 为 false 时，使用该区域的 http 端点
    /// - 其余情况返回 `None`，由 SDK 决定
    pub fn resolve_endpoint(&self) -> Result<Option<String>, ConfigError> {
        let scheme = if self.use_ssl { "https" } else { "http" };
        match &self.endpoint_url {
            Some(url) if url.contains("://") => Ok(Some(url.clone())),
            Some(host) => Ok(Some(format!("{scheme}://{host}"))),
            None if self.use_ssl => Ok(None),
            None => match &self.region {
                Some(region) => Ok(Some(format!("http://s3.{region}.amazonaws.com"))),
                None => Err(ConfigError::Invalid {
                    name: "S3_USE_SSL",
                    reason: "plain http without an endpoint requires a region".to_string(),
                }),
            },
        }
    }

    /// 创建 S3 客户端。
    ///
    /// # 返回值
    ///
    /// 配置好的 `aws_sdk_s3::Client`。
    ///
    /// # Errors
    ///
    /// 选项不合法时返回错误。
    pub async fn build_client(&self) -> Result<Client, ConfigError> {
        self.validate()?;

        let base = match &self.base_config {
            Some(config) => config.clone(),
            None => aws_config::defaults(BehaviorVersion::latest()).load().await,
        };

        let mut builder = aws_sdk_s3::config::Builder::from(&base);
        if let Some(region) = &self.region {
            builder = builder.region(Region::new(region.clone()));
        }
        if let Some(credentials) = self.credentials()? {
            builder = builder.credentials_provider(credentials);
        }
        if let Some(endpoint) = self.resolve_endpoint()? {
            builder = builder.endpoint_url(endpoint);
        }
        builder = builder.force_path_style(self.force_path_style);
        if let Some(path) = &self.ca_bundle {
            let http_client = aws_smithy_http_client::Builder::new()
                .tls_provider(tls::Provider::Rustls(CryptoMode::AwsLc))
                .tls_context(Self::tls_context(path).await?)
                .build_https();
            builder = builder.http_client(http_client);
        }

        Ok(Client::from_conf(builder.build()))
    }

    /// 只信任指定 CA 证书的 TLS 配置。
    async fn tls_context(path: &Path) -> Result<TlsContext, ConfigError> {
        let invalid = |reason: String| ConfigError::Invalid {
            name: "S3_VERIFY_TLS",
            reason,
        };
        let pem = tokio::fs::read(path)
            .await
            .map_err(|e| invalid(format!("failed to read {}: {e}", path.display())))?;

        TlsContext::builder()
            .with_trust_store(TrustStore::empty().with_pem_certificate(pem.as_slice()))
            .build()
            .map_err(|e| invalid(e.to_string()))
    }
}

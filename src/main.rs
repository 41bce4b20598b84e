use anyhow::Context;
use s3_cache::{CacheConfig, ObjectStoreCache, S3Store, app};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::LocalTime;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载 .env 文件
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_timer(LocalTime::rfc_3339())
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = CacheConfig::from_env().context("invalid configuration")?;
    let client = config
        .client
        .build_client()
        .await
        .context("failed to create S3 client")?;

    let cache = ObjectStoreCache::from_config(Arc::new(S3Store::new(client)), &config);
    info!(
        bucket = %config.bucket,
        key_prefix = %config.key_prefix,
        add_mode = ?config.add_mode,
        probe_policy = ?config.probe_policy,
        "object store cache ready"
    );

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!("服务器运行在 http://{}", config.listen_addr);

    axum::serve(listener, app(Arc::new(cache)))
        .await
        .context("server error")?;
    Ok(())
}

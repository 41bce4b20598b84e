//! S3 对象存储
//!
//! 基于 aws-sdk-s3 实现 `ObjectStore`。附加参数使用 boto3 的参数名，
//! 在发送请求前映射到对应的请求构建方法上。

use super::{ExtraArgs, ObjectStore, Operation};
use crate::error::StoreError;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    ChecksumMode, ObjectCannedAcl, RequestPayer, ServerSideEncryption, StorageClass,
};

/// 用户自定义元数据参数的前缀，例如 `Metadata.owner=reports`。
pub const METADATA_PREFIX: &str = "Metadata.";

/// head / get 请求支持的附加参数。
const READ_ARGS: &[&str] = &[
    "ChecksumMode",
    "ExpectedBucketOwner",
    "IfMatch",
    "IfNoneMatch",
    "PartNumber",
    "Range",
    "RequestPayer",
    "SSECustomerAlgorithm",
    "SSECustomerKey",
    "SSECustomerKeyMD5",
    "VersionId",
];

/// put 请求支持的附加参数（不含 `Metadata.*`）。
const PUT_ARGS: &[&str] = &[
    "ACL",
    "CacheControl",
    "ContentDisposition",
    "ContentEncoding",
    "ContentLanguage",
    "ContentType",
    "ExpectedBucketOwner",
    "RequestPayer",
    "SSECustomerAlgorithm",
    "SSECustomerKey",
    "SSECustomerKeyMD5",
    "SSEKMSKeyId",
    "ServerSideEncryption",
    "StorageClass",
    "Tagging",
    "WebsiteRedirectLocation",
];

/// 返回指定请求类型支持的附加参数名。
pub fn supported_extra_args(operation: Operation) -> &'static [&'static str] {
    match operation {
        Operation::Head | Operation::Get => READ_ARGS,
        Operation::Put => PUT_ARGS,
    }
}

/// 找出第一个不被支持的附加参数名。
///
/// # 返回值
///
/// 全部支持时返回 `None`，否则返回第一个不支持的参数名。
pub fn find_unsupported_arg<'a>(operation: Operation, args: &'a ExtraArgs) -> Option<&'a str> {
    args.iter().map(|(name, _)| name).find(|name| {
        let metadata = operation == Operation::Put
            && name.starts_with(METADATA_PREFIX)
            && name.len() > METADATA_PREFIX.len();
        !metadata && !supported_extra_args(operation).contains(name)
    })
}

fn unsupported(operation: Operation, name: &str) -> StoreError {
    StoreError::InvalidArgument {
        operation: operation.as_str(),
        name: name.to_string(),
        reason: "unsupported argument".to_string(),
    }
}

fn parse_part_number(operation: Operation, value: &str) -> Result<i32, StoreError> {
    value.parse().map_err(|e: std::num::ParseIntError| StoreError::InvalidArgument {
        operation: operation.as_str(),
        name: "PartNumber".to_string(),
        reason: e.to_string(),
    })
}

/// head_object 与 get_object 的构建器方法同名，用宏共享映射逻辑。
macro_rules! apply_read_args {
    ($builder:expr, $operation:expr, $extra:expr) => {{
        let mut builder = $builder;
        for (name, value) in $extra.iter() {
            builder = match name {
                "ChecksumMode" => builder.checksum_mode(ChecksumMode::from(value)),
                "ExpectedBucketOwner" => builder.expected_bucket_owner(value),
                "IfMatch" => builder.if_match(value),
                "IfNoneMatch" => builder.if_none_match(value),
                "PartNumber" => builder.part_number(parse_part_number($operation, value)?),
                "Range" => builder.range(value),
                "RequestPayer" => builder.request_payer(RequestPayer::from(value)),
                "SSECustomerAlgorithm" => builder.sse_customer_algorithm(value),
                "SSECustomerKey" => builder.sse_customer_key(value),
                "SSECustomerKeyMD5" => builder.sse_customer_key_md5(value),
                "VersionId" => builder.version_id(value),
                other => return Err(unsupported($operation, other)),
            };
        }
        builder
    }};
}

/// 根据 HTTP 状态码归类错误。
///
/// 只看状态码：HEAD 响应没有错误体，404 是唯一可靠的"不存在"信号。
fn store_error(
    operation: &'static str,
    bucket: &str,
    key: &str,
    status: Option<u16>,
    source: Box<dyn std::error::Error + Send + Sync>,
) -> StoreError {
    match status {
        Some(404) => StoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        Some(412) => StoreError::PreconditionFailed {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        _ => StoreError::Request {
            operation,
            bucket: bucket.to_string(),
            key: key.to_string(),
            source,
        },
    }
}

/// 把 SDK 错误转换为 `StoreError`。
macro_rules! sdk_error {
    ($operation:expr, $bucket:expr, $key:expr, $err:expr) => {{
        let err = $err;
        let status = err.raw_response().map(|resp| resp.status().as_u16());
        store_error($operation, $bucket, $key, status, Box::new(err))
    }};
}

/// aws-sdk-s3 实现的对象存储。
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    /// 使用已构建好的客户端，任何 SDK 配置都可以通过这里原样传入。
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_conf(conf: aws_sdk_s3::Config) -> Self {
        Self::new(Client::from_conf(conf))
    }

    fn build_put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        extra: &ExtraArgs,
    ) -> Result<aws_sdk_s3::operation::put_object::builders::PutObjectFluentBuilder, StoreError>
    {
        let operation = Operation::Put;
        let mut builder = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body));

        for (name, value) in extra.iter() {
            if let Some(meta_key) = name.strip_prefix(METADATA_PREFIX) {
                if meta_key.is_empty() {
                    return Err(unsupported(operation, name));
                }
                builder = builder.metadata(meta_key, value);
                continue;
            }
            builder = match name {
                "ACL" => builder.acl(ObjectCannedAcl::from(value)),
                "CacheControl" => builder.cache_control(value),
                "ContentDisposition" => builder.content_disposition(value),
                "ContentEncoding" => builder.content_encoding(value),
                "ContentLanguage" => builder.content_language(value),
                "ContentType" => builder.content_type(value),
                "ExpectedBucketOwner" => builder.expected_bucket_owner(value),
                "RequestPayer" => builder.request_payer(RequestPayer::from(value)),
                "SSECustomerAlgorithm" => builder.sse_customer_algorithm(value),
                "SSECustomerKey" => builder.sse_customer_key(value),
                "SSECustomerKeyMD5" => builder.sse_customer_key_md5(value),
                "SSEKMSKeyId" => builder.ssekms_key_id(value),
                "ServerSideEncryption" => {
                    builder.server_side_encryption(ServerSideEncryption::from(value))
                }
                "StorageClass" => builder.storage_class(StorageClass::from(value)),
                "Tagging" => builder.tagging(value),
                "WebsiteRedirectLocation" => builder.website_redirect_location(value),
                other => return Err(unsupported(operation, other)),
            };
        }
        Ok(builder)
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn head_object(
        &self,
        bucket: &str,
        key: &str,
        extra: &ExtraArgs,
    ) -> Result<(), StoreError> {
        let builder = apply_read_args!(
            self.client.head_object().bucket(bucket).key(key),
            Operation::Head,
            extra
        );

        builder
            .send()
            .await
            .map(|_| ())
            .map_err(|e| sdk_error!("head_object", bucket, key, e))
    }

    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        extra: &ExtraArgs,
    ) -> Result<Vec<u8>, StoreError> {
        let builder = apply_read_args!(
            self.client.get_object().bucket(bucket).key(key),
            Operation::Get,
            extra
        );

        let output = builder
            .send()
            .await
            .map_err(|e| sdk_error!("get_object", bucket, key, e))?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Request {
                operation: "get_object",
                bucket: bucket.to_string(),
                key: key.to_string(),
                source: Box::new(e),
            })?;

        Ok(data.into_bytes().to_vec())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        extra: &ExtraArgs,
    ) -> Result<(), StoreError> {
        self.build_put(bucket, key, body, extra)?
            .send()
            .await
            .map(|_| ())
            .map_err(|e| sdk_error!("put_object", bucket, key, e))
    }

    async fn put_object_if_absent(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        extra: &ExtraArgs,
    ) -> Result<bool, StoreError> {
        let result = self
            .build_put(bucket, key, body, extra)?
            .if_none_match("*")
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) => {
                // 409: 另一个条件写入正在进行，同样视为已存在
                if err.raw_response().map(|resp| resp.status().as_u16()) == Some(409) {
                    return Ok(false);
                }
                match sdk_error!("put_object", bucket, key, err) {
                    StoreError::PreconditionFailed { .. } => Ok(false),
                    other => Err(other),
                }
            }
        }
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| sdk_error!("delete_object", bucket, key, e))
    }
}

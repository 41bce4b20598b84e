use crate::error::ConfigError;
use crate::store::ExtraArgs;

/// 解析布尔型环境变量
///
/// 接受 `true`/`false`、`1`/`0`、`yes`/`no`、`on`/`off`（不区分大小写）。
pub fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            name,
            reason: format!("expected a boolean, got `{other}`"),
        }),
    }
}

/// 解析 `Name=Value,Name2=Value2` 形式的附加参数
///
/// 参数值中不能包含逗号；空项会被忽略。
///
/// # 示例
///
/// ```
/// use s3_cache::utils::env::parse_extra_args;
///
/// let args = parse_extra_args("S3_CACHE_PUT_EXTRA_ARGS", "ACL=private, StorageClass=STANDARD_IA").unwrap();
/// assert_eq!(args.get("ACL"), Some("private"));
/// assert_eq!(args.get("StorageClass"), Some("STANDARD_IA"));
/// ```
pub fn parse_extra_args(name: &'static str, value: &str) -> Result<ExtraArgs, ConfigError> {
    let mut args = ExtraArgs::new();
    for entry in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (arg, arg_value) = entry.split_once('=').ok_or_else(|| ConfigError::Invalid {
            name,
            reason: format!("expected `Name=Value`, got `{entry}`"),
        })?;
        let arg = arg.trim();
        if arg.is_empty() {
            return Err(ConfigError::Invalid {
                name,
                reason: format!("empty argument name in `{entry}`"),
            });
        }
        args.insert(arg, arg_value.trim());
    }
    Ok(args)
}

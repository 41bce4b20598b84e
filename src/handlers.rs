//! HTTP请求处理模块
//!
//! 此模块把缓存操作暴露为 HTTP 接口：
//! - `GET/PUT/POST/DELETE/HEAD /cache/{*key}` 对应 get/set/add/delete/has
//! - `DELETE /cache` 对应 clear

pub mod entries;

// 重新导出主要的公共接口
pub use entries::{
    SharedCache, add_entry, clear_entries, delete_entry, get_entry, has_entry, set_entry,
};

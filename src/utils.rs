//! 工具函数模块
//!
//! 此模块包含了项目中使用的各种工具函数：
//! - 环境变量解析工具（布尔值、附加参数列表）

pub mod env;

//! # Script 模块
//!
//! 场景脚本编译：文本 → 有序的 [`BridgeCall`] 列表。
//!
//! - [`call`]：调用与场景定义
//! - [`parser`]：两阶段指令解析器

pub mod call;
pub mod parser;

pub use call::{BridgeCall, Scene};
pub use parser::Parser;

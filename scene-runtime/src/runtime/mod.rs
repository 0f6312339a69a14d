//! # Runtime 模块
//!
//! 场景执行引擎，负责脚本执行和状态机推进。
//!
//! ## 模块结构
//!
//! - [`engine`]：SceneRuntime 状态机
//! - [`executor`]：BridgeCall 分派

pub mod engine;
pub mod executor;

#[cfg(test)]
mod tests;

pub use engine::SceneRuntime;
pub use executor::{ExecuteResult, Executor};

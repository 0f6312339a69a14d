//! # Scene Runtime
//!
//! 视觉小说场景引擎的核心运行时库。
//!
//! ## 架构概述
//!
//! `scene-runtime` 是纯逻辑核心，不做任何文件或设备 IO。
//! 宿主通过两个能力接口提供 IO：
//!
//! ```text
//! Host                               Runtime
//!   │                                   │
//!   │──── frame(RuntimeInput) ────────►│ tick → 恢复脚本 → 驱逐缓存
//!   │                                   │
//!   │◄─── MediaBackend 调用 ───────────│ 加载/释放纹理与音乐、播放、跳转
//!   │◄─── SceneSource 调用 ────────────│ 读取场景脚本
//!   │                                   │
//! ```
//!
//! ## 核心类型
//!
//! - [`SceneRuntime`]：场景状态机（Idle / Running / AwaitingAdvance / AwaitingChoice）
//! - [`ScriptBridge`]：脚本可调用的宿主操作
//! - [`LruCache`] / [`AssetCaches`]：按资源类别独立的 LRU 缓存
//! - [`StateStack`]：回退用的快照栈
//! - [`GameState`] / [`Snapshot`]：可见状态与其只含路径的快照
//!
//! ## 使用示例
//!
//! ```ignore
//! use scene_runtime::{RuntimeConfig, RuntimeInput, SceneRuntime};
//!
//! let mut runtime = SceneRuntime::new(RuntimeConfig::default(), backend, scenes);
//! runtime.start("intro.script")?;
//!
//! loop {
//!     let input = host.poll_input();
//!     let phase = runtime.frame(input)?;
//!     host.draw(runtime.state());
//!     if runtime.quit_requested() {
//!         break;
//!     }
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`cache`]：通用 LRU 缓存
//! - [`assets`]：三类资源缓存
//! - [`backend`]：宿主能力接口
//! - [`bridge`]：ScriptBridge
//! - [`script`]：场景脚本编译
//! - [`runtime`]：执行引擎
//! - [`stack`]：状态栈
//! - [`save`]：存档数据模型

pub mod assets;
pub mod backend;
pub mod bridge;
pub mod cache;
pub mod config;
pub mod error;
pub mod input;
pub mod path;
pub mod runtime;
pub mod save;
pub mod script;
pub mod stack;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

// 重导出核心类型
pub use assets::{AssetCacheStats, AssetCaches};
pub use backend::{MediaBackend, MusicHandle, SceneSource, TextureHandle};
pub use bridge::ScriptBridge;
pub use cache::{CacheStats, LruCache};
pub use config::{RollbackMode, RuntimeConfig, UnloadPolicy};
pub use error::{
    AssetKind, BridgeError, ParseError, RuntimeError, SaveError, ScriptLoadError,
};
pub use input::RuntimeInput;
pub use path::{normalize_logical_path, resolve_in_module};
pub use runtime::SceneRuntime;
pub use save::{SaveData, SaveMetadata, SaveVersion};
pub use script::{BridgeCall, Parser, Scene};
pub use stack::{StateStack, restore_snapshot};
pub use state::{
    Choice, Continuation, Dialogue, GameState, ImageRef, MusicRef, MusicSnapshot, Position, Rgba,
    ScenePhase, Snapshot, SpriteInstance, SpriteSnapshot,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        let _input = RuntimeInput::Advance;
        let _phase = ScenePhase::AwaitingAdvance;
        let _state = GameState::new("assets");
        let _stack = StateStack::new(None);
        let _call = BridgeCall::ShowText(Dialogue::new(Some("Bob"), "Hi"));
    }
}

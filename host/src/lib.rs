//! # Host 层
//!
//! 场景引擎的无窗口宿主实现。
//!
//! ## 架构说明
//!
//! Host 层负责：
//! - 配置加载
//! - 资源读取（文件系统 / ZIP）与解码（image / rodio）
//! - 音乐播放时钟
//! - 输入采集
//! - 存档文件
//!
//! Host 层不包含脚本逻辑，只为 `scene-runtime` 提供 `MediaBackend` 与 `SceneSource`。

pub mod app;
pub mod audio;
pub mod config;
pub mod input;
pub mod resources;
pub mod save_manager;

use thiserror::Error;

pub use app::{App, FrameReport, describe_state};
pub use audio::MusicPlayer;
pub use config::{AppConfig, AssetSourceType, AudioConfig, ConfigError};
pub use input::{InputError, InputManager, Key, RawEvent};
pub use resources::{
    FsSource, MediaStats, MediaStore, ResourceError, ResourceSource, ScriptSource, ZipSource,
};
pub use save_manager::{SaveInfo, SaveManager};

/// 宿主错误
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Runtime(#[from] scene_runtime::RuntimeError),

    #[error(transparent)]
    Save(#[from] scene_runtime::SaveError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

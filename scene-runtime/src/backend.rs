//! # Backend 模块
//!
//! Runtime 依赖但不实现的宿主能力接口。
//!
//! ## 设计说明
//!
//! - 图片、音乐资源以不透明句柄（[`TextureHandle`] / [`MusicHandle`]）表示
//! - 句柄由宿主分配，真实资源由宿主持有
//! - Runtime 只在缓存条目被移除时调用 `release_*`，保证每个句柄恰好释放一次
//! - 场景脚本文本通过 [`SceneSource`] 读取，Runtime 不接触文件系统

use crate::error::{BridgeError, ScriptLoadError};

/// 纹理句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// 音乐流句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MusicHandle(pub u64);

/// 媒体后端
///
/// 所有路径参数都是规范化后的逻辑路径（见 [`crate::path`]）。
pub trait MediaBackend {
    /// 加载图片，返回纹理句柄
    fn load_texture(&mut self, path: &str) -> Result<TextureHandle, BridgeError>;

    /// 释放纹理
    fn release_texture(&mut self, handle: TextureHandle);

    /// 加载音乐流
    fn load_music(&mut self, path: &str) -> Result<MusicHandle, BridgeError>;

    /// 释放音乐流
    fn release_music(&mut self, handle: MusicHandle);

    /// 从头开始播放
    fn play_music(&mut self, handle: MusicHandle);

    /// 停止播放（不释放）
    fn stop_music(&mut self, handle: MusicHandle);

    /// 跳转到指定秒数
    fn seek_music(&mut self, handle: MusicHandle, seconds: f32);

    /// 是否仍在播放
    fn is_music_playing(&self, handle: MusicHandle) -> bool;

    /// 每帧推进音乐流
    fn update_music(&mut self, handle: MusicHandle);

    /// 播放音效（即发即弃，不进入缓存）
    fn play_sound(&mut self, path: &str) -> Result<(), BridgeError>;
}

/// 场景脚本来源
pub trait SceneSource {
    /// 读取场景脚本文本
    fn read_scene(&self, path: &str) -> Result<String, ScriptLoadError>;
}

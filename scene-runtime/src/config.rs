//! # Config 模块
//!
//! Runtime 配置。宿主从 `config.json` 的 `runtime` 字段反序列化，
//! 缺失字段使用默认值。

use serde::{Deserialize, Serialize};

/// 回退（step back）模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RollbackMode {
    /// 恢复到快照记录的挂起点
    #[default]
    ResumeAtSnapshot,
    /// 恢复快照的可见状态后，从场景开头重新执行
    RestartScene,
}

/// 立绘卸载时的缓存策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnloadPolicy {
    /// 只移出立绘列表，缓存条目交给 LRU 处理
    #[default]
    Defer,
    /// 没有其他立绘引用同一路径时立即移出缓存
    Immediate,
}

/// Runtime 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// 背景缓存容量（条目数）
    #[serde(default = "default_background_cache_capacity")]
    pub background_cache_capacity: usize,

    /// 立绘缓存容量（条目数）
    #[serde(default = "default_sprite_cache_capacity")]
    pub sprite_cache_capacity: usize,

    /// 音乐缓存容量（条目数）
    #[serde(default = "default_music_cache_capacity")]
    pub music_cache_capacity: usize,

    /// 同屏立绘上限
    #[serde(default = "default_max_sprites")]
    pub max_sprites: usize,

    /// 状态栈最大深度（None 表示不限制）
    #[serde(default = "default_max_stack_depth")]
    pub max_stack_depth: Option<usize>,

    /// 回退模式
    #[serde(default)]
    pub rollback: RollbackMode,

    /// 立绘卸载策略
    #[serde(default)]
    pub sprite_unload: UnloadPolicy,

    /// 单次恢复执行的最大调用数
    ///
    /// 防止 `::next` 互相跳转且没有挂起点的场景卡死主循环。
    #[serde(default = "default_max_calls_per_resume")]
    pub max_calls_per_resume: usize,

    /// 初始模块（内容目录）
    #[serde(default = "default_start_module")]
    pub start_module: String,

    /// 图片子目录
    #[serde(default = "default_images_dir")]
    pub images_dir: String,

    /// 音频子目录
    #[serde(default = "default_music_dir")]
    pub music_dir: String,

    /// 场景脚本子目录
    #[serde(default = "default_scenes_dir")]
    pub scenes_dir: String,
}

fn default_background_cache_capacity() -> usize {
    8
}

fn default_sprite_cache_capacity() -> usize {
    32
}

fn default_music_cache_capacity() -> usize {
    4
}

fn default_max_sprites() -> usize {
    10
}

fn default_max_stack_depth() -> Option<usize> {
    Some(256)
}

fn default_max_calls_per_resume() -> usize {
    10_000
}

fn default_start_module() -> String {
    "assets".to_string()
}

fn default_images_dir() -> String {
    "images".to_string()
}

fn default_music_dir() -> String {
    "music".to_string()
}

fn default_scenes_dir() -> String {
    "scenes".to_string()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            background_cache_capacity: default_background_cache_capacity(),
            sprite_cache_capacity: default_sprite_cache_capacity(),
            music_cache_capacity: default_music_cache_capacity(),
            max_sprites: default_max_sprites(),
            max_stack_depth: default_max_stack_depth(),
            rollback: RollbackMode::default(),
            sprite_unload: UnloadPolicy::default(),
            max_calls_per_resume: default_max_calls_per_resume(),
            start_module: default_start_module(),
            images_dir: default_images_dir(),
            music_dir: default_music_dir(),
            scenes_dir: default_scenes_dir(),
        }
    }
}

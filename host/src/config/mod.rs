//! # Config 模块
//!
//! 宿主配置管理，集中管理所有配置项。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use scene_runtime::{RuntimeConfig, resolve_in_module};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 资源来源类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssetSourceType {
    /// 文件系统（开发模式）
    #[default]
    Fs,
    /// ZIP 文件（发布模式）
    Zip,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 资源根目录，模块目录（如 `assets/`）位于其下（仅 Fs 模式使用）
    #[serde(default = "default_assets_root")]
    pub assets_root: PathBuf,

    /// 存档目录
    #[serde(default = "default_saves_dir")]
    pub saves_dir: PathBuf,

    /// 资源来源类型（fs/zip）
    #[serde(default)]
    pub asset_source: AssetSourceType,

    /// ZIP 文件路径（仅 Zip 模式使用）
    #[serde(default)]
    pub zip_path: Option<String>,

    /// 入口场景（相对于起始模块的场景目录）
    #[serde(default = "default_start_scene")]
    pub start_scene: String,

    /// 日志级别（trace/debug/info/warn/error）
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// 音频配置
    #[serde(default)]
    pub audio: AudioConfig,

    /// Runtime 配置
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// 音频配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// 主音量 (0.0 - 1.0)
    #[serde(default = "default_master_volume")]
    pub master_volume: f32,

    /// 音乐音量 (0.0 - 1.0)
    #[serde(default = "default_music_volume")]
    pub music_volume: f32,

    /// 音效音量 (0.0 - 1.0)
    #[serde(default = "default_sound_volume")]
    pub sound_volume: f32,

    /// 是否静音
    #[serde(default)]
    pub muted: bool,

    /// 音乐播放到结尾后是否从头循环
    #[serde(default = "default_loop_music")]
    pub loop_music: bool,
}

// 默认值函数
fn default_assets_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_saves_dir() -> PathBuf {
    PathBuf::from("saves")
}

fn default_start_scene() -> String {
    "intro.script".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_master_volume() -> f32 {
    1.0
}

fn default_music_volume() -> f32 {
    0.8
}

fn default_sound_volume() -> f32 {
    1.0
}

fn default_loop_music() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            assets_root: default_assets_root(),
            saves_dir: default_saves_dir(),
            asset_source: AssetSourceType::default(),
            zip_path: None,
            start_scene: default_start_scene(),
            log_level: default_log_level(),
            audio: AudioConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            master_volume: default_master_volume(),
            music_volume: default_music_volume(),
            sound_volume: default_sound_volume(),
            muted: false,
            loop_music: default_loop_music(),
        }
    }
}

impl AppConfig {
    /// 读取配置文件，失败时返回原因
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        serde_json::from_str(&content)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))
    }

    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "配置文件加载成功");
                config
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// 入口场景的逻辑路径
    pub fn start_scene_logical_path(&self) -> String {
        resolve_in_module(
            &self.runtime.start_module,
            &self.runtime.scenes_dir,
            &self.start_scene,
        )
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_scene.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "必须配置 start_scene（入口场景）".to_string(),
            ));
        }

        match self.asset_source {
            AssetSourceType::Fs => {
                if !self.assets_root.is_dir() {
                    return Err(ConfigError::ValidationFailed(format!(
                        "资源目录不存在: {:?}",
                        self.assets_root
                    )));
                }

                let scene_full_path = self.assets_root.join(self.start_scene_logical_path());
                if !scene_full_path.is_file() {
                    return Err(ConfigError::ValidationFailed(format!(
                        "入口场景不存在: {:?}",
                        scene_full_path
                    )));
                }
            }
            AssetSourceType::Zip => {
                let zip_path = self.zip_path.as_ref().ok_or_else(|| {
                    ConfigError::ValidationFailed("Zip 模式必须配置 zip_path".to_string())
                })?;

                if !Path::new(zip_path).is_file() {
                    return Err(ConfigError::ValidationFailed(format!(
                        "ZIP 文件不存在: {}",
                        zip_path
                    )));
                }
            }
        }

        let volumes = [
            ("主音量", self.audio.master_volume),
            ("音乐音量", self.audio.music_volume),
            ("音效音量", self.audio.sound_volume),
        ];
        for (name, volume) in volumes {
            if !(0.0..=1.0).contains(&volume) {
                return Err(ConfigError::ValidationFailed(format!(
                    "{}必须在 0.0 - 1.0 之间",
                    name
                )));
            }
        }

        if self.runtime.max_calls_per_resume == 0 {
            return Err(ConfigError::ValidationFailed(
                "runtime.max_calls_per_resume 必须大于 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 配置文件不存在
    #[error("配置文件不存在: {0}")]
    NotFound(String),
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),
    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    IoError(String),
    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}

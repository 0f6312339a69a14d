//! # Save 模块
//!
//! 存档/读档的数据模型。
//!
//! ## 设计原则
//!
//! - 所有存档数据可序列化（JSON）
//! - 带版本号，读档时检查主版本兼容性
//! - 存档保存当前快照与整个状态栈，读档后仍可回退

use serde::{Deserialize, Serialize};

use crate::error::SaveError;
use crate::stack::StateStack;
use crate::state::Snapshot;

/// 存档格式版本
///
/// - MAJOR: 不兼容的格式变更
/// - MINOR: 向后兼容的新字段
pub const SAVE_VERSION_MAJOR: u32 = 1;
pub const SAVE_VERSION_MINOR: u32 = 0;

/// 存档版本信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveVersion {
    pub major: u32,
    pub minor: u32,
}

impl SaveVersion {
    pub fn current() -> Self {
        Self {
            major: SAVE_VERSION_MAJOR,
            minor: SAVE_VERSION_MINOR,
        }
    }

    /// major 相同即兼容
    pub fn is_compatible(&self) -> bool {
        self.major == SAVE_VERSION_MAJOR
    }
}

impl std::fmt::Display for SaveVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl Default for SaveVersion {
    fn default() -> Self {
        Self::current()
    }
}

/// 存档元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveMetadata {
    /// 存档槽位号
    pub slot: u32,
    /// 保存时间
    pub timestamp: String,
    /// 存档时所在场景（用于 UI 显示）
    #[serde(default)]
    pub scene: Option<String>,
    /// 游戏时长（秒）
    #[serde(default)]
    pub play_time_secs: u64,
}

impl SaveMetadata {
    /// 创建元数据，时间戳为 Unix 秒
    pub fn new(slot: u32) -> Self {
        Self {
            slot,
            timestamp: unix_timestamp(),
            scene: None,
            play_time_secs: 0,
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    pub fn with_scene(mut self, scene: impl Into<String>) -> Self {
        self.scene = Some(scene.into());
        self
    }

    pub fn with_play_time(mut self, secs: u64) -> Self {
        self.play_time_secs = secs;
        self
    }
}

/// 存档数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: SaveVersion,
    pub metadata: SaveMetadata,
    /// 当前可见状态
    pub snapshot: Snapshot,
    /// 回退用的状态栈
    #[serde(default)]
    pub stack: StateStack,
}

impl SaveData {
    pub fn new(metadata: SaveMetadata, snapshot: Snapshot, stack: StateStack) -> Self {
        Self {
            version: SaveVersion::current(),
            metadata,
            snapshot,
            stack,
        }
    }

    /// 序列化为 JSON 字符串
    pub fn to_json(&self) -> Result<String, SaveError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SaveError::SerializationFailed(e.to_string()))
    }

    /// 从 JSON 字符串反序列化
    pub fn from_json(json: &str) -> Result<Self, SaveError> {
        let data: SaveData = serde_json::from_str(json)
            .map_err(|e| SaveError::DeserializationFailed(e.to_string()))?;

        if !data.version.is_compatible() {
            return Err(SaveError::IncompatibleVersion {
                save_version: data.version.to_string(),
                current_version: SaveVersion::current().to_string(),
            });
        }

        Ok(data)
    }
}

fn unix_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    duration.as_secs().to_string()
}

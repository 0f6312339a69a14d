//! # SaveManager 模块
//!
//! 存档文件管理，负责存档的读写和 slot 管理。
//!
//! ## 文件布局
//!
//! ```text
//! saves/
//! ├── slot_001.json
//! ├── slot_002.json
//! └── ...
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use scene_runtime::{SaveData, SaveError, SaveMetadata};

/// 最大存档槽位数
pub const MAX_SAVE_SLOTS: u32 = 99;

/// 快速存档使用的槽位
pub const QUICK_SAVE_SLOT: u32 = 0;

/// 当前本地时间，用作存档时间戳
pub fn timestamp_now() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// 带本地时间戳的存档元数据
pub fn metadata_for_slot(slot: u32, play_time_secs: u64) -> SaveMetadata {
    SaveMetadata::new(slot)
        .with_timestamp(timestamp_now())
        .with_play_time(play_time_secs)
}

/// 存档管理器
#[derive(Debug, Clone)]
pub struct SaveManager {
    /// 存档目录
    saves_dir: PathBuf,
}

impl SaveManager {
    pub fn new(saves_dir: impl AsRef<Path>) -> Self {
        Self {
            saves_dir: saves_dir.as_ref().to_path_buf(),
        }
    }

    /// 确保存档目录存在
    pub fn ensure_dir(&self) -> Result<(), SaveError> {
        if !self.saves_dir.exists() {
            fs::create_dir_all(&self.saves_dir)
                .map_err(|e| SaveError::IoError(format!("无法创建存档目录: {}", e)))?;
        }
        Ok(())
    }

    /// 获取存档文件路径
    pub fn slot_path(&self, slot: u32) -> PathBuf {
        self.saves_dir.join(format!("slot_{:03}.json", slot))
    }

    /// 保存存档
    pub fn save(&self, data: &SaveData) -> Result<(), SaveError> {
        self.ensure_dir()?;

        let path = self.slot_path(data.metadata.slot);
        let json = data.to_json()?;

        fs::write(&path, json)
            .map_err(|e| SaveError::IoError(format!("无法写入存档文件: {}", e)))?;

        tracing::info!(slot = data.metadata.slot, path = %path.display(), "存档保存成功");
        Ok(())
    }

    /// 读取存档
    pub fn load(&self, slot: u32) -> Result<SaveData, SaveError> {
        let path = self.slot_path(slot);

        if !path.exists() {
            return Err(SaveError::NotFound(path.to_string_lossy().to_string()));
        }

        let json = fs::read_to_string(&path)
            .map_err(|e| SaveError::IoError(format!("无法读取存档文件: {}", e)))?;

        let data = SaveData::from_json(&json)?;

        tracing::info!(slot, path = %path.display(), "存档读取成功");
        Ok(data)
    }

    /// 删除存档
    pub fn delete(&self, slot: u32) -> Result<(), SaveError> {
        let path = self.slot_path(slot);

        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| SaveError::IoError(format!("无法删除存档文件: {}", e)))?;
            tracing::info!(slot, path = %path.display(), "存档删除成功");
        }

        Ok(())
    }

    /// 检查存档是否存在
    pub fn exists(&self, slot: u32) -> bool {
        self.slot_path(slot).exists()
    }

    /// 列出所有存档
    pub fn list_saves(&self) -> Vec<(u32, PathBuf)> {
        let mut saves = Vec::new();

        let Ok(entries) = fs::read_dir(&self.saves_dir) else {
            return saves;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if let Some(slot) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(parse_slot_file_name)
            {
                saves.push((slot, path));
            }
        }

        saves.sort_by_key(|(slot, _)| *slot);
        saves
    }

    /// 获取下一个可用的存档槽位
    pub fn next_available_slot(&self) -> Option<u32> {
        (1..=MAX_SAVE_SLOTS).find(|slot| !self.exists(*slot))
    }

    /// 获取存档信息
    pub fn get_save_info(&self, slot: u32) -> Option<SaveInfo> {
        let data = self.load(slot).ok()?;
        Some(SaveInfo {
            slot,
            timestamp: data.metadata.timestamp,
            scene: data.metadata.scene,
            play_time_secs: data.metadata.play_time_secs,
        })
    }
}

/// 解析 `slot_NNN.json`
fn parse_slot_file_name(name: &str) -> Option<u32> {
    name.strip_prefix("slot_")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

/// 存档信息（用于列表展示）
#[derive(Debug, Clone, PartialEq)]
pub struct SaveInfo {
    pub slot: u32,
    pub timestamp: String,
    pub scene: Option<String>,
    pub play_time_secs: u64,
}

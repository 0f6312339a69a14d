//! 存档系统

use scene_runtime::ScenePhase;
use tracing::info;

use super::App;
use crate::AppError;
use crate::save_manager::{QUICK_SAVE_SLOT, metadata_for_slot};

impl App {
    /// 保存到指定槽位
    pub fn save_to_slot(&mut self, slot: u32) -> Result<(), AppError> {
        let metadata = metadata_for_slot(slot, self.play_time_secs());
        let data = self.runtime.save_data(metadata);
        self.saves.save(&data)?;
        info!(slot, scene = ?data.metadata.scene, "已保存");
        Ok(())
    }

    /// 从指定槽位读档
    pub fn load_from_slot(&mut self, slot: u32) -> Result<ScenePhase, AppError> {
        let data = self.saves.load(slot)?;
        self.play_time = data.metadata.play_time_secs as f32;
        let phase = self.runtime.load_save(data)?;
        self.sync_music_pause();
        Ok(phase)
    }

    /// 快速保存
    pub fn quick_save(&mut self) -> Result<(), AppError> {
        self.save_to_slot(QUICK_SAVE_SLOT)
    }

    /// 快速读档
    pub fn quick_load(&mut self) -> Result<ScenePhase, AppError> {
        self.load_from_slot(QUICK_SAVE_SLOT)
    }

    /// 是否存在快速存档
    pub fn has_quick_save(&self) -> bool {
        self.saves.exists(QUICK_SAVE_SLOT)
    }
}

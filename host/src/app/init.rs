//! App 初始化拆分
//!
//! 把"资源来源/媒体存储/存档"的创建按职责拆开，让 `app/mod.rs` 保持可读。

use crate::resources::{FsSource, MediaStore, ResourceSource, ZipSource};
use crate::save_manager::SaveManager;
use crate::{AppConfig, AppError, AssetSourceType, ConfigError};
use std::sync::Arc;
use tracing::info;

pub fn create_resource_source(config: &AppConfig) -> Result<Arc<dyn ResourceSource>, AppError> {
    match config.asset_source {
        AssetSourceType::Fs => {
            info!(assets_root = %config.assets_root.display(), "资源来源: 文件系统");
            Ok(Arc::new(FsSource::new(&config.assets_root)))
        }
        AssetSourceType::Zip => {
            let zip_path = config.zip_path.as_ref().ok_or_else(|| {
                ConfigError::ValidationFailed("Zip 模式必须配置 zip_path".to_string())
            })?;
            info!(zip_path = %zip_path, "资源来源: ZIP 文件");
            Ok(Arc::new(ZipSource::new(zip_path)))
        }
    }
}

pub fn create_media_store(config: &AppConfig, source: Arc<dyn ResourceSource>) -> MediaStore {
    MediaStore::new(source, &config.audio)
}

pub fn create_save_manager(config: &AppConfig) -> SaveManager {
    SaveManager::new(&config.saves_dir)
}

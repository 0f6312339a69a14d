//! # Resource Source 模块
//!
//! 资源来源抽象层，支持从不同来源（文件系统、ZIP 包）读取资源。
//!
//! ## 路径约定
//!
//! 所有路径参数都是 Runtime 给出的**逻辑路径**，形如 `<module>/<子目录>/<文件>`，
//! 使用 `/` 作为分隔符。读取前统一经过 [`normalize_logical_path`]。

use super::ResourceError;
use scene_runtime::normalize_logical_path;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Mutex;

/// 资源来源 trait
///
/// - `FsSource`：从文件系统读取（开发模式）
/// - `ZipSource`：从 ZIP 包读取（发布模式）
pub trait ResourceSource: Send + Sync {
    /// 读取资源字节
    fn read(&self, path: &str) -> Result<Vec<u8>, ResourceError>;

    /// 检查资源是否存在
    fn exists(&self, path: &str) -> bool;

    /// 获取资源的完整路径（用于日志）
    fn full_path(&self, path: &str) -> String;
}

/// 文件系统资源来源
#[derive(Debug, Clone)]
pub struct FsSource {
    /// 资源根目录（模块目录所在的目录）
    base_path: PathBuf,
}

impl FsSource {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// 解析逻辑路径到文件系统路径
    fn resolve(&self, logical_path: &str) -> PathBuf {
        self.base_path.join(normalize_logical_path(logical_path))
    }
}

impl ResourceSource for FsSource {
    fn read(&self, path: &str) -> Result<Vec<u8>, ResourceError> {
        let full_path = self.resolve(path);

        if !full_path.is_file() {
            return Err(ResourceError::NotFound {
                path: full_path.to_string_lossy().to_string(),
            });
        }

        std::fs::read(&full_path).map_err(|source| ResourceError::Io {
            path: full_path.to_string_lossy().to_string(),
            source,
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn full_path(&self, path: &str) -> String {
        self.resolve(path).to_string_lossy().to_string()
    }
}

/// ZIP 文件资源来源
///
/// 第一次访问时建立条目索引，之后复用。
pub struct ZipSource {
    /// ZIP 文件路径
    zip_path: PathBuf,
    /// 文件索引缓存（逻辑路径 -> ZIP 内索引）
    index_cache: Mutex<Option<HashMap<String, usize>>>,
}

impl ZipSource {
    pub fn new(zip_path: impl Into<PathBuf>) -> Self {
        Self {
            zip_path: zip_path.into(),
            index_cache: Mutex::new(None),
        }
    }

    fn open_archive(&self) -> Result<zip::ZipArchive<File>, ResourceError> {
        let archive = self.zip_path.to_string_lossy().to_string();
        let file = File::open(&self.zip_path).map_err(|e| ResourceError::Archive {
            archive: archive.clone(),
            message: format!("无法打开: {}", e),
        })?;

        zip::ZipArchive::new(file).map_err(|e| ResourceError::Archive {
            archive,
            message: format!("无法读取: {}", e),
        })
    }

    /// 构建文件索引
    fn build_index(&self) -> Result<HashMap<String, usize>, ResourceError> {
        let mut archive = self.open_archive()?;

        let mut index = HashMap::new();
        for i in 0..archive.len() {
            if let Ok(file) = archive.by_index(i)
                && !file.is_dir()
            {
                index.insert(normalize_logical_path(file.name()), i);
            }
        }

        tracing::debug!(zip = %self.zip_path.display(), entries = index.len(), "ZIP 索引已建立");
        Ok(index)
    }

    /// 查找条目索引
    fn entry_index(&self, logical_path: &str) -> Result<Option<usize>, ResourceError> {
        let mut cache = self
            .index_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if cache.is_none() {
            *cache = Some(self.build_index()?);
        }
        Ok(cache
            .as_ref()
            .and_then(|index| index.get(logical_path).copied()))
    }
}

impl ResourceSource for ZipSource {
    fn read(&self, path: &str) -> Result<Vec<u8>, ResourceError> {
        let zip_path = normalize_logical_path(path);

        let file_index = self
            .entry_index(&zip_path)?
            .ok_or_else(|| ResourceError::NotFound {
                path: zip_path.clone(),
            })?;

        let mut archive = self.open_archive()?;
        let mut zip_file = archive
            .by_index(file_index)
            .map_err(|e| ResourceError::Entry {
                path: zip_path.clone(),
                message: e.to_string(),
            })?;

        let mut buffer = Vec::new();
        zip_file
            .read_to_end(&mut buffer)
            .map_err(|e| ResourceError::Entry {
                path: zip_path.clone(),
                message: e.to_string(),
            })?;

        Ok(buffer)
    }

    fn exists(&self, path: &str) -> bool {
        let zip_path = normalize_logical_path(path);
        matches!(self.entry_index(&zip_path), Ok(Some(_)))
    }

    fn full_path(&self, path: &str) -> String {
        format!(
            "zip://{}#{}",
            self.zip_path.display(),
            normalize_logical_path(path)
        )
    }
}

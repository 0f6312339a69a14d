//! # Resource Error 模块
//!
//! 从资源来源读取、解码资源时产生的错误。
//! 交给 Runtime 前统一转换为 `BridgeError::AssetLoad` 或 `ScriptLoadError`。

use scene_runtime::AssetKind;
use thiserror::Error;

/// 资源错误
#[derive(Error, Debug)]
pub enum ResourceError {
    /// 资源未找到（文件不存在或 ZIP 中没有该条目）
    #[error("资源未找到: {path}")]
    NotFound { path: String },

    /// 文件系统读取失败
    #[error("读取文件失败: {path} - {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// ZIP 包无法打开或不是有效的 ZIP
    #[error("ZIP 包不可用: {archive} - {message}")]
    Archive { archive: String, message: String },

    /// ZIP 条目读取失败
    #[error("读取 ZIP 条目失败: {path} - {message}")]
    Entry { path: String, message: String },

    /// 图片或音频无法解码
    #[error("无法解码 {kind}: {path} - {message}")]
    Decode {
        kind: AssetKind,
        path: String,
        message: String,
    },

    /// 场景脚本不是 UTF-8 文本
    #[error("场景脚本不是有效的 UTF-8 文本: {path}")]
    InvalidText { path: String },
}

impl ResourceError {
    /// 是否为资源不存在
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub(crate) fn decode(kind: AssetKind, path: &str, message: impl ToString) -> Self {
        Self::Decode {
            kind,
            path: path.to_string(),
            message: message.to_string(),
        }
    }
}

//! # Error 模块
//!
//! 定义 scene-runtime 中使用的错误类型。
//!
//! ## 分类
//!
//! - [`ParseError`]：场景脚本解析错误（带行号）
//! - [`ScriptLoadError`]：场景脚本读取/编译失败，场景无法启动
//! - [`BridgeError`]：脚本调用宿主操作时产生的错误（资源加载、容量、脚本运行时）
//! - [`RuntimeError`]：驱动状态机时返回给调用方的错误
//!
//! 本子系统中没有任何错误会导致进程退出。

use thiserror::Error;

/// 解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// 指令缺少参数行
    #[error("第 {line} 行：指令 '{directive}' 缺少参数 '{param}'")]
    MissingArgument {
        line: usize,
        directive: String,
        param: String,
    },

    /// 无效的参数值
    #[error("第 {line} 行：参数 '{param}' 的值无效 - {message}")]
    InvalidArgument {
        line: usize,
        param: String,
        message: String,
    },
}

/// 场景脚本加载错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptLoadError {
    /// 场景文件不存在
    #[error("场景脚本不存在: {path}")]
    NotFound { path: String },

    /// 读取失败
    #[error("读取场景脚本失败: {path} - {message}")]
    Read { path: String, message: String },

    /// 编译失败
    #[error("场景脚本 {path} 解析失败: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },
}

/// 资源类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Background,
    Sprite,
    Music,
    Sound,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AssetKind::Background => "background",
            AssetKind::Sprite => "sprite",
            AssetKind::Music => "music",
            AssetKind::Sound => "sound",
        };
        f.write_str(name)
    }
}

/// 宿主操作错误
///
/// `AssetLoad` 与 `CapacityExceeded` 是非致命的：记录日志后脚本继续执行。
/// `ScriptRuntime` 会中止当前场景，状态机回到 `Idle`。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// 资源无法打开或解码
    #[error("加载 {kind} 资源失败: {path} - {message}")]
    AssetLoad {
        kind: AssetKind,
        path: String,
        message: String,
    },

    /// 立绘列表已满
    #[error("立绘数量已达上限 {limit}")]
    CapacityExceeded { limit: usize },

    /// 脚本运行时错误
    #[error("脚本运行时错误: {message}")]
    ScriptRuntime { message: String },
}

impl BridgeError {
    /// 创建资源加载错误
    pub fn asset_load(kind: AssetKind, path: impl Into<String>, message: impl ToString) -> Self {
        Self::AssetLoad {
            kind,
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// 创建脚本运行时错误
    pub fn script(message: impl Into<String>) -> Self {
        Self::ScriptRuntime {
            message: message.into(),
        }
    }

    /// 是否会中止当前场景
    pub fn is_fatal_to_scene(&self) -> bool {
        matches!(self, Self::ScriptRuntime { .. })
    }
}

/// 运行时错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// 无效的选择索引
    #[error("无效的选择索引 {index}，有效范围是 0..{max}")]
    InvalidChoiceIndex { index: usize, max: usize },

    /// 场景无法启动
    #[error(transparent)]
    ScriptLoad(#[from] ScriptLoadError),

    /// 场景执行中止
    #[error("场景 {scene} 执行中止: {source}")]
    ScriptAborted {
        scene: String,
        #[source]
        source: BridgeError,
    },
}

/// 存档错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SaveError {
    /// 序列化失败
    #[error("序列化失败: {0}")]
    SerializationFailed(String),
    /// 反序列化失败
    #[error("反序列化失败: {0}")]
    DeserializationFailed(String),
    /// 版本不兼容
    #[error("存档版本不兼容: 存档版本 {save_version} vs 当前版本 {current_version}")]
    IncompatibleVersion {
        save_version: String,
        current_version: String,
    },
    /// 文件操作失败
    #[error("文件操作失败: {0}")]
    IoError(String),
    /// 存档不存在
    #[error("存档不存在: {0}")]
    NotFound(String),
}

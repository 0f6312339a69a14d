//! # 脚本调用定义
//!
//! 场景脚本编译后的结果：有序的宿主操作调用列表。

use serde::{Deserialize, Serialize};

use crate::state::{Choice, Dialogue};

/// 脚本对 ScriptBridge 的一次调用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BridgeCall {
    /// 切换内容模块
    ModuleInit { module: String },
    /// 设置背景
    LoadBackground { file: String },
    /// 显示立绘
    LoadSprite {
        file: String,
        x: i32,
        y: i32,
        id: Option<String>,
    },
    /// 移除立绘
    UnloadSprite { id: String },
    /// 播放音乐
    PlayMusic { file: String, start: Option<f32> },
    /// 播放音效
    PlaySound { file: String },
    /// 显示对话（挂起点）
    ShowText(Dialogue),
    /// 显示选项（挂起点）
    SetChoices(Vec<Choice>),
    /// 切换到另一个场景（不入栈）
    GotoScene { file: String },
    /// 回退到上一个快照
    PopState,
    /// 请求退出
    Quit,
}

impl BridgeCall {
    /// 调用名（用于日志）
    pub fn name(&self) -> &'static str {
        match self {
            BridgeCall::ModuleInit { .. } => "module_init",
            BridgeCall::LoadBackground { .. } => "load_background",
            BridgeCall::LoadSprite { .. } => "load_sprite",
            BridgeCall::UnloadSprite { .. } => "unload_sprite",
            BridgeCall::PlayMusic { .. } => "play_music",
            BridgeCall::PlaySound { .. } => "play_sound",
            BridgeCall::ShowText(_) => "show_text",
            BridgeCall::SetChoices(_) => "set_choices",
            BridgeCall::GotoScene { .. } => "goto_scene",
            BridgeCall::PopState => "pop_state",
            BridgeCall::Quit => "quit",
        }
    }
}

/// 编译后的场景
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// 场景脚本逻辑路径
    pub path: String,
    /// 调用列表
    pub calls: Vec<BridgeCall>,
    /// 每条调用对应的源码行号（1-based）
    source_map: Vec<usize>,
}

impl Scene {
    /// 创建场景（不带行号信息）
    pub fn new(path: impl Into<String>, calls: Vec<BridgeCall>) -> Self {
        Self {
            path: path.into(),
            calls,
            source_map: Vec::new(),
        }
    }

    /// 创建带行号映射的场景
    pub fn with_source_map(
        path: impl Into<String>,
        calls: Vec<BridgeCall>,
        source_map: Vec<usize>,
    ) -> Self {
        Self {
            path: path.into(),
            calls,
            source_map,
        }
    }

    pub fn get(&self, index: usize) -> Option<&BridgeCall> {
        self.calls.get(index)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// 调用对应的源码行号
    pub fn line_of(&self, index: usize) -> Option<usize> {
        self.source_map.get(index).copied()
    }

    /// 场景中引用的所有资源文件（用于静态检查）
    pub fn referenced_files(&self) -> impl Iterator<Item = (&BridgeCall, &str)> {
        self.calls.iter().filter_map(|call| match call {
            BridgeCall::LoadBackground { file }
            | BridgeCall::LoadSprite { file, .. }
            | BridgeCall::PlayMusic { file, .. }
            | BridgeCall::PlaySound { file }
            | BridgeCall::GotoScene { file } => Some((call, file.as_str())),
            _ => None,
        })
    }
}

//! # State 模块
//!
//! 定义可见游戏状态与状态机阶段。
//!
//! ## 设计原则
//!
//! - 所有可见状态集中在一个显式的 [`GameState`] 值中，不使用全局变量
//! - `GameState` 持有资源句柄，仅在运行期有效
//! - [`Snapshot`] 只记录路径（缓存 key），可序列化，可跨越缓存驱逐
//! - 对话与选项互斥：任一时刻最多只有一个处于激活状态

use serde::{Deserialize, Serialize};

use crate::backend::{MusicHandle, TextureHandle};

/// 场景状态机阶段
///
/// ```text
/// Idle            -> 未加载场景（或场景已结束/中止）
/// Running         -> 正在执行脚本调用
/// AwaitingAdvance -> 对话已显示，等待推进输入
/// AwaitingChoice  -> 选项已显示，等待选择输入
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ScenePhase {
    #[default]
    Idle,
    Running,
    AwaitingAdvance,
    AwaitingChoice,
}

impl ScenePhase {
    /// 是否在等待玩家输入
    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::AwaitingAdvance | Self::AwaitingChoice)
    }
}

/// 屏幕坐标（基准分辨率像素）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// RGBA 颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

/// 对话
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Dialogue {
    /// 说话者（None 表示旁白）
    pub speaker: Option<String>,
    /// 对话文本
    pub text: String,
    /// 说话者名字颜色
    #[serde(default)]
    pub speaker_color: Rgba,
    /// 文本颜色
    #[serde(default)]
    pub text_color: Rgba,
    /// 文本框位置（None 使用默认位置）
    #[serde(default)]
    pub position: Option<Position>,
}

impl Dialogue {
    /// 创建使用默认样式的对话
    pub fn new(speaker: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.map(str::to_string),
            text: text.into(),
            ..Self::default()
        }
    }
}

/// 选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// 显示文本
    pub label: String,
    /// 选中后加载的场景文件
    pub target_scene: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, target_scene: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target_scene: target_scene.into(),
        }
    }
}

/// 脚本续点
///
/// 记录"脚本下一次从哪里继续"：场景路径 + 下一条调用的下标。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Continuation {
    /// 场景脚本逻辑路径
    pub scene_path: String,
    /// 下一条待执行调用的下标
    pub cursor: usize,
}

impl Continuation {
    pub fn new(scene_path: impl Into<String>, cursor: usize) -> Self {
        Self {
            scene_path: scene_path.into(),
            cursor,
        }
    }
}

/// 已加载的图片引用
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    pub path: String,
    pub handle: TextureHandle,
}

/// 屏幕上的立绘
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteInstance {
    pub path: String,
    pub handle: TextureHandle,
    pub position: Position,
    /// 稳定标识（用于 `unload_sprite`）
    pub id: Option<String>,
}

/// 当前音乐
#[derive(Debug, Clone, PartialEq)]
pub struct MusicRef {
    pub path: String,
    pub handle: MusicHandle,
    /// 起始播放位置（秒）
    pub start: Option<f32>,
}

/// 可见游戏状态
///
/// 只由 ScriptBridge 操作修改，由 SceneRuntime 持有。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GameState {
    /// 当前模块（内容目录），用于解析相对资源路径
    pub module: String,
    pub background: Option<ImageRef>,
    pub sprites: Vec<SpriteInstance>,
    pub music: Option<MusicRef>,
    pub dialogue: Option<Dialogue>,
    pub choices: Option<Vec<Choice>>,
    pub continuation: Option<Continuation>,
}

impl GameState {
    /// 创建指定模块下的空状态
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            ..Self::default()
        }
    }

    pub fn has_background(&self) -> bool {
        self.background.is_some()
    }

    pub fn has_music(&self) -> bool {
        self.music.is_some()
    }

    pub fn dialogue_pending(&self) -> bool {
        self.dialogue.is_some()
    }

    pub fn choice_pending(&self) -> bool {
        self.choices.is_some()
    }

    /// 状态所对应的等待阶段
    pub fn waiting_phase(&self) -> Option<ScenePhase> {
        if self.dialogue.is_some() {
            Some(ScenePhase::AwaitingAdvance)
        } else if self.choices.is_some() {
            Some(ScenePhase::AwaitingChoice)
        } else {
            None
        }
    }

    /// 清空可见内容（保留模块）
    pub fn clear_visible(&mut self) {
        self.background = None;
        self.sprites.clear();
        self.music = None;
        self.dialogue = None;
        self.choices = None;
    }

    /// 当前引用的立绘路径
    pub fn sprite_paths(&self) -> impl Iterator<Item = &str> {
        self.sprites.iter().map(|s| s.path.as_str())
    }

    /// 生成只含路径的快照
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            module: self.module.clone(),
            background: self.background.as_ref().map(|b| b.path.clone()),
            sprites: self
                .sprites
                .iter()
                .map(|s| SpriteSnapshot {
                    path: s.path.clone(),
                    position: s.position,
                    id: s.id.clone(),
                })
                .collect(),
            music: self.music.as_ref().map(|m| MusicSnapshot {
                path: m.path.clone(),
                start: m.start,
            }),
            dialogue: self.dialogue.clone(),
            choices: self.choices.clone(),
            continuation: self.continuation.clone(),
        }
    }
}

/// 立绘快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteSnapshot {
    pub path: String,
    pub position: Position,
    #[serde(default)]
    pub id: Option<String>,
}

/// 音乐快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicSnapshot {
    pub path: String,
    #[serde(default)]
    pub start: Option<f32>,
}

/// 游戏状态快照
///
/// 用于状态栈与存档；只记录缓存 key，恢复时重新解析句柄。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Snapshot {
    pub module: String,
    pub background: Option<String>,
    pub sprites: Vec<SpriteSnapshot>,
    pub music: Option<MusicSnapshot>,
    pub dialogue: Option<Dialogue>,
    pub choices: Option<Vec<Choice>>,
    pub continuation: Option<Continuation>,
}

impl Snapshot {
    /// 快照所对应的等待阶段
    pub fn waiting_phase(&self) -> Option<ScenePhase> {
        if self.dialogue.is_some() {
            Some(ScenePhase::AwaitingAdvance)
        } else if self.choices.is_some() {
            Some(ScenePhase::AwaitingChoice)
        } else {
            None
        }
    }
}

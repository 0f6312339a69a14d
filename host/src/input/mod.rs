//! # Input 模块
//!
//! 输入处理系统，把原始按键/鼠标事件转换为 RuntimeInput。
//!
//! ## 设计说明
//!
//! - 事件是边沿触发的：按住不放只在按下那一刻生效，松开后才能再次触发
//! - 每帧最多产生一个 `RuntimeInput`，多余的事件丢弃
//! - 根据当前 `ScenePhase` 过滤无意义的输入（例如等待点击时的数字键）
//!
//! ## 默认键位
//!
//! | 按键 | 输入 |
//! |------|------|
//! | Space / Enter / 鼠标左键 | 推进对话；选择分支时确认当前选项 |
//! | 1-9 | 选择第 N 个选项 |
//! | Up / Down | 移动当前选项 |
//! | Backspace | 回退 |
//! | P | 暂停 / 恢复 |

use scene_runtime::{RuntimeInput, ScenePhase};
use std::collections::HashSet;
use thiserror::Error;

/// 按键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Space,
    Enter,
    Backspace,
    Up,
    Down,
    P,
    /// 数字键 1-9
    Digit(u8),
}

/// 原始输入事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEvent {
    KeyDown(Key),
    KeyUp(Key),
    MouseDown,
    MouseUp,
}

/// 输入脚本错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("无法识别的输入: '{0}'")]
    UnknownToken(String),
}

/// 输入管理器
#[derive(Debug, Default)]
pub struct InputManager {
    /// 当前按住的键
    held_keys: HashSet<Key>,
    /// 鼠标左键是否按住
    mouse_held: bool,
    /// 本帧新按下的键（按顺序）
    pressed: Vec<Key>,
    /// 本帧是否有新的鼠标点击
    clicked: bool,
    /// 当前选择索引（键盘导航）
    pub selected_index: usize,
    /// 选项数量（用于边界检查）
    choice_count: usize,
    /// 外部注入的输入
    pending_input: Option<RuntimeInput>,
}

impl InputManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个原始事件
    pub fn handle_event(&mut self, event: RawEvent) {
        match event {
            RawEvent::KeyDown(key) => {
                if self.held_keys.insert(key) {
                    self.pressed.push(key);
                }
            }
            RawEvent::KeyUp(key) => {
                self.held_keys.remove(&key);
            }
            RawEvent::MouseDown => {
                if !self.mouse_held {
                    self.mouse_held = true;
                    self.clicked = true;
                }
            }
            RawEvent::MouseUp => self.mouse_held = false,
        }
    }

    /// 重置选择状态
    pub fn reset_choice(&mut self, choice_count: usize) {
        self.selected_index = 0;
        self.choice_count = choice_count;
    }

    /// 设置待处理的输入
    pub fn inject_input(&mut self, input: RuntimeInput) {
        self.pending_input = Some(input);
    }

    /// 结束一帧，返回本帧产生的输入
    ///
    /// 选择与回退之后出现的选项都视为新的一组，高亮回到第一项，
    /// 即使选项数量与上一组相同。
    ///
    /// # 参数
    /// - `phase`: 当前场景状态
    /// - `choice_count`: 当前选项数量
    pub fn update(&mut self, phase: ScenePhase, choice_count: usize) -> Option<RuntimeInput> {
        let input = self.next_input(phase, choice_count);
        if matches!(input, Some(RuntimeInput::SelectChoice { .. } | RuntimeInput::StepBack)) {
            self.choice_count = 0;
        }
        input
    }

    fn next_input(&mut self, phase: ScenePhase, choice_count: usize) -> Option<RuntimeInput> {
        let pressed = std::mem::take(&mut self.pressed);
        let clicked = std::mem::take(&mut self.clicked);

        if let Some(input) = self.pending_input.take() {
            return Some(input);
        }

        if phase == ScenePhase::AwaitingChoice {
            if self.choice_count != choice_count {
                self.reset_choice(choice_count);
            }
        } else {
            self.choice_count = 0;
        }

        for key in pressed {
            if let Some(input) = self.map_key(key, phase) {
                return Some(input);
            }
        }

        if clicked {
            return self.confirm(phase);
        }

        None
    }

    fn map_key(&mut self, key: Key, phase: ScenePhase) -> Option<RuntimeInput> {
        match key {
            Key::Space | Key::Enter => self.confirm(phase),
            Key::Backspace => Some(RuntimeInput::StepBack),
            Key::P => Some(RuntimeInput::Pause),
            Key::Digit(n) => {
                let index = usize::from(n).checked_sub(1)?;
                (phase == ScenePhase::AwaitingChoice && index < self.choice_count)
                    .then(|| RuntimeInput::choice(index))
            }
            Key::Up => {
                self.selected_index = self.selected_index.saturating_sub(1);
                None
            }
            Key::Down => {
                if self.choice_count > 0 {
                    self.selected_index = (self.selected_index + 1).min(self.choice_count - 1);
                }
                None
            }
        }
    }

    /// 点击/确认键
    fn confirm(&self, phase: ScenePhase) -> Option<RuntimeInput> {
        match phase {
            ScenePhase::AwaitingAdvance => Some(RuntimeInput::Advance),
            ScenePhase::AwaitingChoice if self.choice_count > 0 => {
                Some(RuntimeInput::choice(self.selected_index))
            }
            _ => None,
        }
    }
}

/// 解析一个输入脚本记号，返回该帧的事件（按下并松开）
///
/// 记号：`a`/`advance`/`space`、`click`、`1`-`9`、`up`、`down`、
/// `b`/`back`、`p`/`pause`、`-`/`wait`（空帧）。
pub fn parse_input_token(token: &str) -> Result<Vec<RawEvent>, InputError> {
    let tap = |key| vec![RawEvent::KeyDown(key), RawEvent::KeyUp(key)];

    let events = match token.trim().to_ascii_lowercase().as_str() {
        "a" | "advance" | "space" => tap(Key::Space),
        "enter" => tap(Key::Enter),
        "click" => vec![RawEvent::MouseDown, RawEvent::MouseUp],
        "up" => tap(Key::Up),
        "down" => tap(Key::Down),
        "b" | "back" => tap(Key::Backspace),
        "p" | "pause" => tap(Key::P),
        "-" | "wait" => Vec::new(),
        other => match other.parse::<u8>() {
            Ok(n @ 1..=9) => tap(Key::Digit(n)),
            _ => return Err(InputError::UnknownToken(token.to_string())),
        },
    };
    Ok(events)
}

/// 解析逗号分隔的输入脚本，每个记号对应一帧
pub fn parse_input_script(script: &str) -> Result<Vec<Vec<RawEvent>>, InputError> {
    script
        .split(',')
        .filter(|token| !token.trim().is_empty())
        .map(parse_input_token)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tap(manager: &mut InputManager, key: Key) {
        manager.handle_event(RawEvent::KeyDown(key));
        manager.handle_event(RawEvent::KeyUp(key));
    }

    #[test]
    fn test_advance_keys() {
        let mut manager = InputManager::new();
        tap(&mut manager, Key::Space);
        assert_eq!(
            manager.update(ScenePhase::AwaitingAdvance, 0),
            Some(RuntimeInput::Advance)
        );

        manager.handle_event(RawEvent::MouseDown);
        assert_eq!(
            manager.update(ScenePhase::AwaitingAdvance, 0),
            Some(RuntimeInput::Advance)
        );

        // 不等待时点击无效
        tap(&mut manager, Key::Enter);
        assert_eq!(manager.update(ScenePhase::Idle, 0), None);
    }

    #[test]
    fn test_edge_triggered() {
        let mut manager = InputManager::new();
        manager.handle_event(RawEvent::KeyDown(Key::Space));
        assert_eq!(
            manager.update(ScenePhase::AwaitingAdvance, 0),
            Some(RuntimeInput::Advance)
        );

        // 按住不放（自动重复的 KeyDown）不再触发
        manager.handle_event(RawEvent::KeyDown(Key::Space));
        assert_eq!(manager.update(ScenePhase::AwaitingAdvance, 0), None);

        manager.handle_event(RawEvent::KeyUp(Key::Space));
        manager.handle_event(RawEvent::KeyDown(Key::Space));
        assert_eq!(
            manager.update(ScenePhase::AwaitingAdvance, 0),
            Some(RuntimeInput::Advance)
        );
    }

    #[test]
    fn test_one_input_per_frame() {
        let mut manager = InputManager::new();
        tap(&mut manager, Key::Backspace);
        tap(&mut manager, Key::Space);
        assert_eq!(
            manager.update(ScenePhase::AwaitingAdvance, 0),
            Some(RuntimeInput::StepBack)
        );
        // 多余的事件被丢弃
        assert_eq!(manager.update(ScenePhase::AwaitingAdvance, 0), None);
    }

    #[test]
    fn test_digit_selects_choice() {
        let mut manager = InputManager::new();
        tap(&mut manager, Key::Digit(2));
        assert_eq!(
            manager.update(ScenePhase::AwaitingChoice, 2),
            Some(RuntimeInput::SelectChoice { index: 1 })
        );

        // 超出选项数量
        tap(&mut manager, Key::Digit(3));
        assert_eq!(manager.update(ScenePhase::AwaitingChoice, 2), None);

        // 等待点击时数字键无效
        tap(&mut manager, Key::Digit(1));
        assert_eq!(manager.update(ScenePhase::AwaitingAdvance, 0), None);
    }

    #[test]
    fn test_keyboard_navigation() {
        let mut manager = InputManager::new();
        assert_eq!(manager.update(ScenePhase::AwaitingChoice, 3), None);

        tap(&mut manager, Key::Down);
        tap(&mut manager, Key::Down);
        tap(&mut manager, Key::Down);
        assert_eq!(manager.update(ScenePhase::AwaitingChoice, 3), None);
        assert_eq!(manager.selected_index, 2);

        tap(&mut manager, Key::Up);
        tap(&mut manager, Key::Enter);
        assert_eq!(
            manager.update(ScenePhase::AwaitingChoice, 3),
            Some(RuntimeInput::SelectChoice { index: 1 })
        );
    }

    #[test]
    fn test_highlight_resets_for_same_sized_choice_set() {
        let mut manager = InputManager::new();
        tap(&mut manager, Key::Down);
        assert_eq!(manager.update(ScenePhase::AwaitingChoice, 2), None);
        assert_eq!(manager.selected_index, 1);

        tap(&mut manager, Key::Enter);
        assert_eq!(
            manager.update(ScenePhase::AwaitingChoice, 2),
            Some(RuntimeInput::SelectChoice { index: 1 })
        );

        // 目标场景直接给出两项新选项，中间没有其他阶段
        tap(&mut manager, Key::Enter);
        assert_eq!(
            manager.update(ScenePhase::AwaitingChoice, 2),
            Some(RuntimeInput::SelectChoice { index: 0 })
        );

        // 回退到另一组同样大小的选项
        tap(&mut manager, Key::Down);
        assert_eq!(manager.update(ScenePhase::AwaitingChoice, 2), None);
        tap(&mut manager, Key::Backspace);
        assert_eq!(
            manager.update(ScenePhase::AwaitingChoice, 2),
            Some(RuntimeInput::StepBack)
        );
        assert_eq!(manager.update(ScenePhase::AwaitingChoice, 2), None);
        assert_eq!(manager.selected_index, 0);
    }

    #[test]
    fn test_pause_and_step_back_any_phase() {
        let mut manager = InputManager::new();
        tap(&mut manager, Key::P);
        assert_eq!(manager.update(ScenePhase::Idle, 0), Some(RuntimeInput::Pause));
        tap(&mut manager, Key::Backspace);
        assert_eq!(
            manager.update(ScenePhase::AwaitingChoice, 2),
            Some(RuntimeInput::StepBack)
        );
    }

    #[test]
    fn test_inject_input() {
        let mut manager = InputManager::new();
        manager.inject_input(RuntimeInput::Pause);
        assert_eq!(manager.update(ScenePhase::Idle, 0), Some(RuntimeInput::Pause));
        assert_eq!(manager.update(ScenePhase::Idle, 0), None);
    }

    #[test]
    fn test_parse_input_script() {
        let frames = parse_input_script("a, 2 ,-,back,p,click").unwrap();
        assert_eq!(frames.len(), 6);
        assert_eq!(
            frames[1],
            vec![RawEvent::KeyDown(Key::Digit(2)), RawEvent::KeyUp(Key::Digit(2))]
        );
        assert!(frames[2].is_empty());
        assert_eq!(frames[5], vec![RawEvent::MouseDown, RawEvent::MouseUp]);

        assert_eq!(
            parse_input_script("a,0"),
            Err(InputError::UnknownToken("0".to_string()))
        );
        assert!(parse_input_token("jump").is_err());
    }
}

//! 文本渲染
//!
//! 无窗口宿主把可见状态输出为文本行，用于日志和命令行展示。

use scene_runtime::GameState;

/// 把可见状态描述为多行文本
pub fn describe_state(state: &GameState) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(bg) = &state.background {
        lines.push(format!("[背景] {}", bg.path));
    }
    for sprite in &state.sprites {
        let id = sprite.id.as_deref().unwrap_or("-");
        lines.push(format!(
            "[立绘] {} ({}, {}) id={}",
            sprite.path, sprite.position.x, sprite.position.y, id
        ));
    }
    if let Some(music) = &state.music {
        lines.push(format!("[音乐] {}", music.path));
    }
    if let Some(dialogue) = &state.dialogue {
        match &dialogue.speaker {
            Some(speaker) => lines.push(format!("{}：{}", speaker, dialogue.text)),
            None => lines.push(dialogue.text.clone()),
        }
    }
    if let Some(choices) = &state.choices {
        for (i, choice) in choices.iter().enumerate() {
            lines.push(format!("  {}. {}", i + 1, choice.label));
        }
    }

    lines
}

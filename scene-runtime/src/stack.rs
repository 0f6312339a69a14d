//! # Stack 模块
//!
//! 状态栈：用于"回退一步"与存档。
//!
//! 栈中的快照只记录缓存 key。快照入栈后，其引用的资源可能已被 LRU 驱逐，
//! 因此恢复时需要重新解析：缓存仍驻留则复用，否则通过同一条获取路径重新加载。

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::assets::AssetCaches;
use crate::backend::MediaBackend;
use crate::error::BridgeError;
use crate::state::{GameState, ImageRef, MusicRef, Snapshot, SpriteInstance};

/// 状态栈
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateStack {
    /// 快照列表（栈顶在末尾）
    entries: Vec<Snapshot>,
    /// 最大深度（None 表示不限制）
    max_depth: Option<usize>,
}

impl StateStack {
    /// 创建状态栈
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            entries: Vec::new(),
            max_depth,
        }
    }

    /// 压入快照
    ///
    /// 超过最大深度时丢弃最早的快照。
    pub fn push(&mut self, snapshot: Snapshot) {
        self.entries.push(snapshot);

        if let Some(max) = self.max_depth {
            let excess = self.entries.len().saturating_sub(max);
            if excess > 0 {
                self.entries.drain(..excess);
                debug!(dropped = excess, max_depth = max, "状态栈超过深度上限，丢弃最早的快照");
            }
        }
    }

    /// 弹出栈顶快照
    pub fn pop(&mut self) -> Option<Snapshot> {
        self.entries.pop()
    }

    /// 查看栈顶快照
    pub fn peek(&self) -> Option<&Snapshot> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// 修改最大深度（读档后沿用当前配置）
    pub fn set_max_depth(&mut self, max_depth: Option<usize>) {
        self.max_depth = max_depth;
        if let Some(max) = max_depth {
            let excess = self.entries.len().saturating_sub(max);
            self.entries.drain(..excess);
        }
    }

    /// 所有快照（栈底在前）
    pub fn entries(&self) -> &[Snapshot] {
        &self.entries
    }
}

/// 从快照恢复 GameState
///
/// 每个被引用的资源都经由缓存重新解析。无法重新加载的资源从恢复结果中移除，
/// 对应的错误一并返回，由调用方记录。
pub fn restore_snapshot(
    snapshot: &Snapshot,
    caches: &mut AssetCaches,
    backend: &mut dyn MediaBackend,
) -> (GameState, Vec<BridgeError>) {
    let mut errors = Vec::new();
    let mut state = GameState::new(snapshot.module.clone());

    if let Some(path) = &snapshot.background {
        match caches.acquire_background(path, backend) {
            Ok(handle) => {
                state.background = Some(ImageRef {
                    path: path.clone(),
                    handle,
                })
            }
            Err(e) => {
                warn!(error = %e, "恢复背景失败");
                errors.push(e);
            }
        }
    }

    for sprite in &snapshot.sprites {
        match caches.acquire_sprite(&sprite.path, backend) {
            Ok(handle) => state.sprites.push(SpriteInstance {
                path: sprite.path.clone(),
                handle,
                position: sprite.position,
                id: sprite.id.clone(),
            }),
            Err(e) => {
                warn!(error = %e, "恢复立绘失败");
                errors.push(e);
            }
        }
    }

    if let Some(music) = &snapshot.music {
        match caches.acquire_music(&music.path, backend) {
            Ok(handle) => {
                state.music = Some(MusicRef {
                    path: music.path.clone(),
                    handle,
                    start: music.start,
                })
            }
            Err(e) => {
                warn!(error = %e, "恢复音乐失败");
                errors.push(e);
            }
        }
    }

    state.dialogue = snapshot.dialogue.clone();
    state.choices = snapshot.choices.clone();
    state.continuation = snapshot.continuation.clone();

    (state, errors)
}

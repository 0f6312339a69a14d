//! # Bridge 模块
//!
//! 脚本可调用的宿主操作集合。
//!
//! ## 设计说明
//!
//! - `ScriptBridge` 是对 GameState / AssetCaches / StateStack / 后端的一次性借用，
//!   由 SceneRuntime 在执行脚本调用时构造
//! - 所有资源路径相对于当前模块解析：`<module>/<images|music>/<file>`
//! - 资源加载失败时保留之前的可见状态，错误返回给调用方
//! - 是否挂起由 Executor 决定，Bridge 只修改状态

use tracing::{debug, info, warn};

use crate::assets::AssetCaches;
use crate::backend::MediaBackend;
use crate::config::{RollbackMode, RuntimeConfig, UnloadPolicy};
use crate::error::{AssetKind, BridgeError};
use crate::path::resolve_in_module;
use crate::stack::{StateStack, restore_snapshot};
use crate::state::{
    Choice, Continuation, Dialogue, GameState, ImageRef, MusicRef, Position, SpriteInstance,
};

/// 脚本桥
pub struct ScriptBridge<'a> {
    pub state: &'a mut GameState,
    pub caches: &'a mut AssetCaches,
    pub stack: &'a mut StateStack,
    pub backend: &'a mut dyn MediaBackend,
    pub config: &'a RuntimeConfig,
    /// 非致命错误（由 SceneRuntime 收集为本帧信号）
    pub signals: &'a mut Vec<BridgeError>,
}

impl<'a> ScriptBridge<'a> {
    /// 切换内容模块
    pub fn module_init(&mut self, module: &str) {
        info!(module = %module, "切换模块");
        self.state.module = module.to_string();
    }

    /// 设置背景
    ///
    /// 加载失败时保留原背景。
    pub fn load_background(&mut self, file: &str) -> Result<(), BridgeError> {
        let path = self.resolve_image(file);
        let handle = self.caches.acquire_background(&path, self.backend)?;
        self.state.background = Some(ImageRef { path, handle });
        Ok(())
    }

    /// 显示立绘
    ///
    /// 容量在加载前检查，列表已满时不会产生多余的加载。
    pub fn load_sprite(
        &mut self,
        file: &str,
        x: i32,
        y: i32,
        id: Option<&str>,
    ) -> Result<(), BridgeError> {
        let limit = self.config.max_sprites;
        if self.state.sprites.len() >= limit {
            return Err(BridgeError::CapacityExceeded { limit });
        }

        let path = self.resolve_image(file);
        let handle = self.caches.acquire_sprite(&path, self.backend)?;
        self.state.sprites.push(SpriteInstance {
            path,
            handle,
            position: Position::new(x, y),
            id: id.map(str::to_string),
        });
        Ok(())
    }

    /// 移除第一个匹配 id 的立绘
    ///
    /// 没有匹配时什么也不做，返回 false。
    pub fn unload_sprite(&mut self, id: &str) -> bool {
        let Some(index) = self
            .state
            .sprites
            .iter()
            .position(|s| s.id.as_deref() == Some(id))
        else {
            debug!(id = %id, "没有匹配的立绘，忽略 unload");
            return false;
        };

        let removed = self.state.sprites.remove(index);

        if self.config.sprite_unload == UnloadPolicy::Immediate
            && !self.state.sprite_paths().any(|p| p == removed.path)
        {
            self.caches.remove_sprite(&removed.path, self.backend);
        }
        true
    }

    /// 播放音乐
    ///
    /// 先加载新曲目；加载成功后停止旧曲目（只停止，不释放），再开始播放。
    pub fn play_music(&mut self, file: &str, start: Option<f32>) -> Result<(), BridgeError> {
        let path = self.resolve_audio(file);
        let handle = self.caches.acquire_music(&path, self.backend)?;

        if let Some(current) = self.state.music.take() {
            self.backend.stop_music(current.handle);
        }

        self.backend.play_music(handle);
        if let Some(seconds) = start {
            self.backend.seek_music(handle, seconds);
        }
        self.state.music = Some(MusicRef {
            path,
            handle,
            start,
        });
        Ok(())
    }

    /// 播放音效（不进入 GameState，不缓存）
    pub fn play_sound(&mut self, file: &str) -> Result<(), BridgeError> {
        let path = self.resolve_audio(file);
        self.backend
            .play_sound(&path)
            .map_err(|e| match e {
                BridgeError::AssetLoad { path, message, .. } => {
                    BridgeError::asset_load(AssetKind::Sound, path, message)
                }
                other => other,
            })
    }

    /// 显示对话（清除选项）
    pub fn show_text(&mut self, dialogue: Dialogue) {
        self.state.choices = None;
        self.state.dialogue = Some(dialogue);
    }

    /// 显示选项（清除对话）
    pub fn set_choices(&mut self, choices: Vec<Choice>) -> Result<(), BridgeError> {
        if choices.is_empty() {
            return Err(BridgeError::script("选项列表为空"));
        }
        self.state.dialogue = None;
        self.state.choices = Some(choices);
        Ok(())
    }

    /// 回退到上一个快照
    ///
    /// 栈为空时返回 false。恢复时重新解析所有资源句柄；
    /// 无法重新加载的资源从恢复结果中移除，并记录为信号。
    ///
    /// `RestartScene` 模式下只保留模块与续点所在场景，
    /// 可见状态清空后由场景从第一条调用重新建立。
    pub fn pop_state(&mut self) -> bool {
        let Some(snapshot) = self.stack.pop() else {
            debug!("状态栈为空，无法回退");
            return false;
        };

        let restored = match self.config.rollback {
            RollbackMode::ResumeAtSnapshot => {
                let (restored, errors) = restore_snapshot(&snapshot, self.caches, self.backend);
                self.signals.extend(errors);
                restored
            }
            RollbackMode::RestartScene => {
                let mut restored = GameState::new(snapshot.module.clone());
                restored.continuation = snapshot
                    .continuation
                    .as_ref()
                    .map(|c| Continuation::new(c.scene_path.clone(), 0));
                restored
            }
        };

        self.switch_music(restored.music.as_ref());
        *self.state = restored;

        info!(depth = self.stack.len(), "已回退到上一个快照");
        true
    }

    /// 请求退出
    pub fn quit(&mut self) {
        info!("脚本请求退出");
    }

    /// 让播放状态与恢复后的音乐一致
    fn switch_music(&mut self, next: Option<&MusicRef>) {
        let current = self.state.music.as_ref();
        if current.map(|m| m.handle) == next.map(|m| m.handle) {
            return;
        }

        if let Some(current) = current {
            self.backend.stop_music(current.handle);
        }
        if let Some(next) = next {
            self.backend.play_music(next.handle);
            if let Some(seconds) = next.start {
                self.backend.seek_music(next.handle, seconds);
            }
        }
    }

    fn resolve_image(&self, file: &str) -> String {
        resolve_in_module(&self.state.module, &self.config.images_dir, file)
    }

    fn resolve_audio(&self, file: &str) -> String {
        resolve_in_module(&self.state.module, &self.config.music_dir, file)
    }

    /// 记录非致命错误
    pub fn signal(&mut self, error: BridgeError) {
        warn!(error = %error, "宿主操作失败，脚本继续执行");
        self.signals.push(error);
    }
}

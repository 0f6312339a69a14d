//! # Engine 模块
//!
//! SceneRuntime 核心：场景状态机。
//!
//! ## 执行模型
//!
//! ```text
//! 宿主每帧调用 frame(input)
//!     → tick(input)：根据当前阶段处理输入，最多恢复一次脚本
//!     → 脚本从续点开始执行，直到挂起点 / 场景结束 / 退出 / 错误
//!     → 推进音乐流
//!     → 驱逐超出容量的缓存条目
//! ```
//!
//! 续点（[`Continuation`]）保存在 GameState 中，快照、回退与存档都通过它恢复执行位置。

use tracing::{debug, error, info, warn};

use crate::assets::AssetCaches;
use crate::backend::{MediaBackend, SceneSource};
use crate::bridge::ScriptBridge;
use crate::config::RuntimeConfig;
use crate::error::{BridgeError, RuntimeError, ScriptLoadError};
use crate::input::RuntimeInput;
use crate::path::resolve_in_module;
use crate::runtime::executor::{ExecuteResult, Executor};
use crate::save::{SaveData, SaveMetadata};
use crate::script::{Parser, Scene};
use crate::stack::{StateStack, restore_snapshot};
use crate::state::{Continuation, GameState, ScenePhase, Snapshot};

/// 场景运行时
pub struct SceneRuntime<B: MediaBackend> {
    config: RuntimeConfig,
    backend: B,
    scenes: Box<dyn SceneSource>,
    parser: Parser,
    executor: Executor,
    /// 可见游戏状态（含续点）
    state: GameState,
    caches: AssetCaches,
    stack: StateStack,
    /// 续点所在场景的编译结果
    scene: Option<Scene>,
    phase: ScenePhase,
    paused: bool,
    quit_requested: bool,
    /// 本帧的非致命错误
    signals: Vec<BridgeError>,
    last_error: Option<RuntimeError>,
    shut_down: bool,
}

impl<B: MediaBackend> SceneRuntime<B> {
    /// 创建运行时
    pub fn new(config: RuntimeConfig, backend: B, scenes: impl SceneSource + 'static) -> Self {
        Self {
            state: GameState::new(config.start_module.clone()),
            caches: AssetCaches::new(&config),
            stack: StateStack::new(config.max_stack_depth),
            config,
            backend,
            scenes: Box::new(scenes),
            parser: Parser::new(),
            executor: Executor::new(),
            scene: None,
            phase: ScenePhase::Idle,
            paused: false,
            quit_requested: false,
            signals: Vec::new(),
            last_error: None,
            shut_down: false,
        }
    }

    /// 运行中替换配置
    ///
    /// 缓存容量与状态栈深度立即生效，其余字段在下一次调用时生效。
    /// 超出新容量的缓存条目在下一帧的 sweep 中释放。
    pub fn reconfigure(&mut self, config: RuntimeConfig) {
        self.caches.resize(&config);
        self.stack.set_max_depth(config.max_stack_depth);
        info!(
            backgrounds = config.background_cache_capacity,
            sprites = config.sprite_cache_capacity,
            music = config.music_cache_capacity,
            "运行时配置已更新"
        );
        self.config = config;
    }

    /// 开始新游戏
    ///
    /// 清空状态栈，模块重置为初始模块，然后加载场景。
    pub fn start(&mut self, file: &str) -> Result<ScenePhase, RuntimeError> {
        self.stack.clear();
        self.paused = false;
        self.state.module = self.config.start_module.clone();
        self.load_scene(file)
    }

    /// 加载场景
    ///
    /// 重置可见状态（停止音乐），保留状态栈与当前模块，
    /// 然后从第一条调用开始执行，直到第一个挂起点或场景结束。
    pub fn load_scene(&mut self, file: &str) -> Result<ScenePhase, RuntimeError> {
        let path = self.scene_path(file);
        self.reset_visible();

        let scene = match self.compile(&path) {
            Ok(scene) => scene,
            Err(e) => return Err(self.fail(e.into())),
        };

        info!(scene = %path, calls = scene.len(), "加载场景");
        self.scene = Some(scene);
        self.state.continuation = Some(Continuation::new(path, 0));
        self.run()
    }

    /// 处理一次输入
    ///
    /// 每次调用最多恢复一次脚本。
    pub fn tick(&mut self, input: Option<RuntimeInput>) -> Result<ScenePhase, RuntimeError> {
        let Some(input) = input else {
            return Ok(self.phase);
        };

        if input == RuntimeInput::Pause {
            self.paused = !self.paused;
            info!(paused = self.paused, "切换暂停");
            return Ok(self.phase);
        }

        if self.paused {
            debug!(?input, "暂停中，忽略输入");
            return Ok(self.phase);
        }

        match (self.phase, input) {
            (ScenePhase::AwaitingAdvance, RuntimeInput::Advance) => {
                self.stack.push(self.state.snapshot());
                self.state.dialogue = None;
                self.run()
            }

            (ScenePhase::AwaitingChoice, RuntimeInput::SelectChoice { index }) => {
                let choices = self.state.choices.as_deref().unwrap_or_default();
                let Some(choice) = choices.get(index).cloned() else {
                    return Err(RuntimeError::InvalidChoiceIndex {
                        index,
                        max: choices.len(),
                    });
                };

                info!(index, label = %choice.label, target = %choice.target_scene, "玩家选择");
                self.stack.push(self.state.snapshot());
                self.load_scene(&choice.target_scene)
            }

            (ScenePhase::AwaitingAdvance | ScenePhase::AwaitingChoice, RuntimeInput::StepBack) => {
                self.step_back()
            }

            (phase, input) => {
                debug!(?phase, ?input, "当前阶段不处理该输入");
                Ok(phase)
            }
        }
    }

    /// 一帧：处理输入、推进音乐流、驱逐缓存
    pub fn frame(&mut self, input: Option<RuntimeInput>) -> Result<ScenePhase, RuntimeError> {
        let result = self.tick(input);
        self.update_music();
        self.sweep();
        result
    }

    /// 推进当前音乐流
    pub fn update_music(&mut self) {
        if let Some(music) = &self.state.music {
            self.backend.update_music(music.handle);
        }
    }

    /// 驱逐超出容量的缓存条目，返回释放数量
    pub fn sweep(&mut self) -> usize {
        let released = self.caches.sweep(&self.state, &mut self.backend);
        if released > 0 {
            debug!(released, stats = %self.caches.stats().format(), "缓存驱逐");
        }
        released
    }

    /// 取出本帧累积的非致命错误
    pub fn take_signals(&mut self) -> Vec<BridgeError> {
        std::mem::take(&mut self.signals)
    }

    /// 当前状态的快照
    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    /// 生成存档数据
    pub fn save_data(&self, metadata: SaveMetadata) -> SaveData {
        let metadata = match (&metadata.scene, self.current_scene()) {
            (None, Some(scene)) => metadata.with_scene(scene),
            _ => metadata,
        };
        SaveData::new(metadata, self.state.snapshot(), self.stack.clone())
    }

    /// 读档
    ///
    /// 恢复快照与状态栈；快照停在挂起点时直接回到该等待状态，
    /// 否则从续点继续执行。
    pub fn load_save(&mut self, data: SaveData) -> Result<ScenePhase, RuntimeError> {
        self.reset_visible();
        self.paused = false;

        let (state, errors) = restore_snapshot(&data.snapshot, &mut self.caches, &mut self.backend);
        for e in &errors {
            warn!(error = %e, "读档时资源恢复失败");
        }
        self.signals.extend(errors);

        self.state = state;
        self.stack = data.stack;
        self.stack.set_max_depth(self.config.max_stack_depth);

        if let Some(music) = &self.state.music {
            self.backend.play_music(music.handle);
            if let Some(seconds) = music.start {
                self.backend.seek_music(music.handle, seconds);
            }
        }

        info!(slot = data.metadata.slot, depth = self.stack.len(), "读档完成");

        match self.state.waiting_phase() {
            Some(phase) => {
                self.phase = phase;
                Ok(phase)
            }
            None if self.state.continuation.is_some() => self.run(),
            None => {
                self.phase = ScenePhase::Idle;
                Ok(ScenePhase::Idle)
            }
        }
    }

    /// 释放所有缓存资源
    ///
    /// 重复调用是安全的；Drop 时也会调用。
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.reset_visible();
        let released = self.caches.release_all(&mut self.backend);
        self.phase = ScenePhase::Idle;
        self.shut_down = true;
        info!(released, "SceneRuntime 已关闭");
    }

    // =========================================================================
    // 访问器
    // =========================================================================

    pub fn phase(&self) -> ScenePhase {
        self.phase
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn stack(&self) -> &StateStack {
        &self.stack
    }

    pub fn caches(&self) -> &AssetCaches {
        &self.caches
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// 最近一次中止场景的错误
    pub fn last_error(&self) -> Option<&RuntimeError> {
        self.last_error.as_ref()
    }

    /// 续点所在场景
    pub fn current_scene(&self) -> Option<&str> {
        self.state
            .continuation
            .as_ref()
            .map(|c| c.scene_path.as_str())
    }

    // =========================================================================
    // 内部
    // =========================================================================

    /// 从续点恢复执行
    fn run(&mut self) -> Result<ScenePhase, RuntimeError> {
        self.phase = ScenePhase::Running;
        let limit = self.config.max_calls_per_resume;
        let mut executed = 0usize;

        loop {
            let Some(continuation) = self.state.continuation.clone() else {
                return Ok(self.finish());
            };

            // 回退或读档后续点可能位于另一个场景
            let loaded = self.scene.as_ref().map(|s| s.path.as_str());
            if loaded != Some(continuation.scene_path.as_str()) {
                match self.compile(&continuation.scene_path) {
                    Ok(scene) => self.scene = Some(scene),
                    Err(e) => return Err(self.fail(e.into())),
                }
            }

            let Some(call) = self
                .scene
                .as_ref()
                .and_then(|s| s.get(continuation.cursor))
                .cloned()
            else {
                return Ok(self.finish());
            };

            if executed >= limit {
                let message = format!("单次恢复执行了 {} 条调用仍未到达挂起点", limit);
                return Err(self.abort(BridgeError::script(message)));
            }
            executed += 1;

            if let Some(continuation) = &mut self.state.continuation {
                continuation.cursor += 1;
            }

            let result = {
                let mut bridge = ScriptBridge {
                    state: &mut self.state,
                    caches: &mut self.caches,
                    stack: &mut self.stack,
                    backend: &mut self.backend,
                    config: &self.config,
                    signals: &mut self.signals,
                };
                self.executor.execute(&call, &mut bridge)
            };

            match result {
                ExecuteResult::Continue => {}
                ExecuteResult::Suspend(phase) => {
                    self.phase = phase;
                    return Ok(phase);
                }
                ExecuteResult::LoadScene(file) => {
                    let path = self.scene_path(&file);
                    self.reset_visible();
                    match self.compile(&path) {
                        Ok(scene) => {
                            info!(scene = %path, "切换场景");
                            self.scene = Some(scene);
                            self.state.continuation = Some(Continuation::new(path, 0));
                        }
                        Err(e) => return Err(self.fail(e.into())),
                    }
                }
                ExecuteResult::Quit => {
                    self.quit_requested = true;
                    self.state.continuation = None;
                    self.phase = ScenePhase::Idle;
                    return Ok(ScenePhase::Idle);
                }
                ExecuteResult::Abort(e) => return Err(self.abort(e)),
            }
        }
    }

    /// 回退一步
    fn step_back(&mut self) -> Result<ScenePhase, RuntimeError> {
        let popped = ScriptBridge {
            state: &mut self.state,
            caches: &mut self.caches,
            stack: &mut self.stack,
            backend: &mut self.backend,
            config: &self.config,
            signals: &mut self.signals,
        }
        .pop_state();

        if !popped {
            return Ok(self.phase);
        }

        match self.state.waiting_phase() {
            Some(phase) => {
                self.phase = phase;
                Ok(phase)
            }
            None => self.run(),
        }
    }

    /// 读取并编译场景脚本
    fn compile(&mut self, path: &str) -> Result<Scene, ScriptLoadError> {
        let text = self.scenes.read_scene(path)?;
        let scene = self
            .parser
            .parse(path, &text)
            .map_err(|source| ScriptLoadError::Parse {
                path: path.to_string(),
                source,
            })?;

        for warning in self.parser.warnings() {
            warn!(scene = %path, "{}", warning);
        }
        Ok(scene)
    }

    /// 清空可见状态并停止音乐（缓存条目交给 LRU）
    fn reset_visible(&mut self) {
        if let Some(music) = self.state.music.take() {
            self.backend.stop_music(music.handle);
        }
        self.state.clear_visible();
        self.state.continuation = None;
        self.scene = None;
    }

    fn scene_path(&self, file: &str) -> String {
        resolve_in_module(&self.state.module, &self.config.scenes_dir, file)
    }

    /// 场景执行完毕
    fn finish(&mut self) -> ScenePhase {
        if let Some(scene) = &self.scene {
            info!(scene = %scene.path, "场景执行完毕");
        }
        self.state.continuation = None;
        self.phase = ScenePhase::Idle;
        ScenePhase::Idle
    }

    /// 场景执行中止
    fn abort(&mut self, source: BridgeError) -> RuntimeError {
        let scene = self
            .current_scene()
            .map(str::to_string)
            .unwrap_or_default();
        let line = self.state.continuation.as_ref().and_then(|c| {
            self.scene
                .as_ref()
                .and_then(|s| s.line_of(c.cursor.saturating_sub(1)))
        });
        self.fail_with(RuntimeError::ScriptAborted { scene, source }, line)
    }

    /// 场景无法继续
    fn fail(&mut self, err: RuntimeError) -> RuntimeError {
        self.fail_with(err, None)
    }

    fn fail_with(&mut self, err: RuntimeError, line: Option<usize>) -> RuntimeError {
        error!(error = %err, line = ?line, "场景中止，回到 Idle");
        self.state.continuation = None;
        self.state.dialogue = None;
        self.state.choices = None;
        self.scene = None;
        self.phase = ScenePhase::Idle;
        self.last_error = Some(err.clone());
        err
    }
}

impl<B: MediaBackend> Drop for SceneRuntime<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

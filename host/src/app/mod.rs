//! # App 模块
//!
//! 应用状态与主循环逻辑。
//!
//! 每帧：采集输入 → `SceneRuntime::frame` → 同步播放时钟 → 记录信号。

mod draw;
mod init;
mod save;

pub use draw::describe_state;
pub use init::*;

use crate::input::{InputManager, RawEvent};
use crate::resources::{DEFAULT_FRAME_DT, MediaStore};
use crate::save_manager::SaveManager;
use crate::{AppConfig, AppError};
use scene_runtime::{RuntimeConfig, RuntimeError, RuntimeInput, SceneRuntime, ScenePhase};
use tracing::{debug, error, info, warn};

/// 单帧结果
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// 本帧交给 Runtime 的输入
    pub input: Option<RuntimeInput>,
    /// 帧结束时的场景状态
    pub phase: ScenePhase,
    /// 本帧的非致命错误数量
    pub signals: usize,
    /// 本帧的运行时错误（场景已回到 Idle 或输入被拒绝）
    pub error: Option<RuntimeError>,
}

/// 应用
pub struct App {
    config: AppConfig,
    runtime: SceneRuntime<MediaStore>,
    input: InputManager,
    saves: SaveManager,
    frame_count: u64,
    /// 游戏时长（秒，暂停时不计）
    play_time: f32,
    frame_dt: f32,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let source = init::create_resource_source(&config)?;
        let store = init::create_media_store(&config, source);
        let scenes = store.script_source();
        let saves = init::create_save_manager(&config);
        let runtime = SceneRuntime::new(config.runtime.clone(), store, scenes);

        Ok(Self {
            config,
            runtime,
            input: InputManager::new(),
            saves,
            frame_count: 0,
            play_time: 0.0,
            frame_dt: DEFAULT_FRAME_DT,
        })
    }

    /// 从入口场景开始新游戏
    pub fn start(&mut self) -> Result<ScenePhase, AppError> {
        let start_scene = self.config.start_scene.clone();
        self.start_scene(&start_scene)
    }

    /// 从指定场景开始新游戏
    pub fn start_scene(&mut self, file: &str) -> Result<ScenePhase, AppError> {
        info!(scene = %file, "开始游戏");
        self.play_time = 0.0;
        let phase = self.runtime.start(file)?;
        self.sync_music_pause();
        Ok(phase)
    }

    /// 回到标题：重新从入口场景开始，清空回退历史
    pub fn return_to_title(&mut self) -> Result<ScenePhase, AppError> {
        info!("返回标题");
        self.start()
    }

    /// 设置帧时间
    pub fn set_frame_dt(&mut self, dt: f32) {
        self.frame_dt = dt.max(0.0);
        self.runtime.backend_mut().set_frame_dt(self.frame_dt);
    }

    /// 运行中替换 Runtime 配置（缓存容量、回退深度等）
    pub fn apply_runtime_config(&mut self, runtime: RuntimeConfig) {
        self.runtime.reconfigure(runtime.clone());
        self.config.runtime = runtime;
    }

    /// 记录一个原始输入事件
    pub fn handle_event(&mut self, event: RawEvent) {
        self.input.handle_event(event);
    }

    /// 推进一帧
    ///
    /// 运行时错误不会中断主循环：场景回到 Idle，错误写入 [`FrameReport`]。
    pub fn frame(&mut self) -> FrameReport {
        let phase = self.runtime.phase();
        let choice_count = self.runtime.state().choices.as_ref().map_or(0, Vec::len);
        let input = self.input.update(phase, choice_count);

        let result = self.runtime.frame(input);
        self.sync_music_pause();

        if !self.runtime.is_paused() {
            self.play_time += self.frame_dt;
        }
        self.frame_count += 1;

        let signals = self.runtime.take_signals();
        for signal in &signals {
            debug!(frame = self.frame_count, error = %signal, "非致命错误");
        }

        let error = match result {
            Ok(_) => None,
            Err(e) => {
                error!(frame = self.frame_count, error = %e, "帧处理失败");
                Some(e)
            }
        };

        FrameReport {
            input,
            phase: self.runtime.phase(),
            signals: signals.len(),
            error,
        }
    }

    /// 暂停时停住音乐时钟
    fn sync_music_pause(&mut self) {
        let paused = self.runtime.is_paused();
        self.runtime.backend_mut().player_mut().set_paused(paused);
    }

    /// 是否应退出主循环
    pub fn should_quit(&self) -> bool {
        self.runtime.quit_requested()
    }

    /// 释放所有资源
    pub fn shutdown(&mut self) {
        self.runtime.shutdown();
        let stats = self.runtime.backend().stats();
        if stats.live_textures > 0 || stats.live_music > 0 {
            warn!(stats = %stats.format(), "关闭后仍有未释放的句柄");
        } else {
            info!(stats = %stats.format(), "资源已全部释放");
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn runtime(&self) -> &SceneRuntime<MediaStore> {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut SceneRuntime<MediaStore> {
        &mut self.runtime
    }

    pub fn input_mut(&mut self) -> &mut InputManager {
        &mut self.input
    }

    pub fn saves(&self) -> &SaveManager {
        &self.saves
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// 游戏时长（整秒）
    pub fn play_time_secs(&self) -> u64 {
        self.play_time as u64
    }
}

//! # Executor 模块
//!
//! 将单条 [`BridgeCall`] 分派给 [`ScriptBridge`]，并决定脚本接下来怎么走。
//!
//! ## 职责
//!
//! - 调用对应的 Bridge 操作
//! - 非致命错误记录为信号，脚本继续
//! - 决定是否挂起、切换场景或退出

use tracing::debug;

use crate::bridge::ScriptBridge;
use crate::error::BridgeError;
use crate::script::BridgeCall;
use crate::state::ScenePhase;

/// 执行结果
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteResult {
    /// 继续执行下一条调用
    Continue,
    /// 在挂起点停下，等待玩家输入
    Suspend(ScenePhase),
    /// 切换到另一个场景（`::next`）
    LoadScene(String),
    /// 请求退出
    Quit,
    /// 脚本运行时错误，场景中止
    Abort(BridgeError),
}

/// 调用执行器
#[derive(Debug, Default)]
pub struct Executor {
    /// 已执行的调用总数
    executed: u64,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 执行单条调用
    pub fn execute(&mut self, call: &BridgeCall, bridge: &mut ScriptBridge<'_>) -> ExecuteResult {
        self.executed += 1;
        debug!(call = call.name(), "执行脚本调用");

        let result = match call {
            BridgeCall::ModuleInit { module } => {
                bridge.module_init(module);
                Ok(ExecuteResult::Continue)
            }

            BridgeCall::LoadBackground { file } => bridge
                .load_background(file)
                .map(|_| ExecuteResult::Continue),

            BridgeCall::LoadSprite { file, x, y, id } => bridge
                .load_sprite(file, *x, *y, id.as_deref())
                .map(|_| ExecuteResult::Continue),

            BridgeCall::UnloadSprite { id } => {
                bridge.unload_sprite(id);
                Ok(ExecuteResult::Continue)
            }

            BridgeCall::PlayMusic { file, start } => bridge
                .play_music(file, *start)
                .map(|_| ExecuteResult::Continue),

            BridgeCall::PlaySound { file } => {
                bridge.play_sound(file).map(|_| ExecuteResult::Continue)
            }

            BridgeCall::ShowText(dialogue) => {
                bridge.show_text(dialogue.clone());
                Ok(ExecuteResult::Suspend(ScenePhase::AwaitingAdvance))
            }

            BridgeCall::SetChoices(choices) => bridge
                .set_choices(choices.clone())
                .map(|_| ExecuteResult::Suspend(ScenePhase::AwaitingChoice)),

            BridgeCall::GotoScene { file } => Ok(ExecuteResult::LoadScene(file.clone())),

            BridgeCall::PopState => {
                // 恢复到的快照若停在挂起点，直接回到该等待状态
                let popped = bridge.pop_state();
                Ok(match bridge.state.waiting_phase() {
                    Some(phase) if popped => ExecuteResult::Suspend(phase),
                    _ => ExecuteResult::Continue,
                })
            }

            BridgeCall::Quit => {
                bridge.quit();
                Ok(ExecuteResult::Quit)
            }
        };

        match result {
            Ok(result) => result,
            Err(e) if e.is_fatal_to_scene() => ExecuteResult::Abort(e),
            Err(e) => {
                bridge.signal(e);
                ExecuteResult::Continue
            }
        }
    }

    /// 已执行的调用总数
    pub fn executed(&self) -> u64 {
        self.executed
    }
}

//! # Input 模块
//!
//! 定义宿主向 Runtime 传递的语义化输入。
//!
//! Runtime 不处理鼠标/键盘事件；宿主把原始事件映射为 [`RuntimeInput`]，
//! 每帧最多传递一个。

use serde::{Deserialize, Serialize};

/// 宿主向 Runtime 传递的输入
///
/// - `Advance`：解除 `AwaitingAdvance`
/// - `SelectChoice`：解除 `AwaitingChoice`，加载所选目标场景
/// - `StepBack`：弹出状态栈并恢复上一个快照
/// - `Pause`：切换暂停标志，暂停期间忽略其他输入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuntimeInput {
    Advance,
    SelectChoice { index: usize },
    StepBack,
    Pause,
}

impl RuntimeInput {
    /// 创建选择输入
    pub fn choice(index: usize) -> Self {
        Self::SelectChoice { index }
    }
}

//! # Parser 模块
//!
//! 两阶段场景脚本解析器（手写，无 regex 依赖）。
//!
//! ## 架构
//!
//! ```text
//! 原始文本 → [阶段1: 块识别] → Vec<Block> → [阶段2: 块解析] → Vec<BridgeCall>
//! ```
//!
//! ## 脚本格式
//!
//! ```text
//! ::module intro
//! ::bg
//! bg.png
//! ::sprite
//! :id bob
//! 200x120
//! bob.png
//! ::music
//! :start 12.5
//! theme.ogg
//! ::text
//! :name Bob
//! :pos 40x300
//! :color 255,200,0
//! Hi
//!
//! ::scene
//! Yes
//! a.script
//! No
//! b.script
//! ```
//!
//! 容错解析：未知指令、未知参数与指令外的文本记录警告后跳过；
//! 缺少参数或数值格式错误是 [`ParseError`]。

mod helpers;
mod phase1;
mod phase2;


use crate::error::ParseError;
use crate::script::call::Scene;

use phase1::recognize_blocks;
use phase2::Phase2Parser;

pub use helpers::{parse_color, parse_position, parse_seconds, split_param};

/// 场景脚本解析器
pub struct Parser {
    phase2: Phase2Parser,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            phase2: Phase2Parser::new(),
        }
    }

    /// 解析场景脚本
    ///
    /// `path` 是场景的逻辑路径，只用于标识，不参与解析。
    pub fn parse(&mut self, path: &str, text: &str) -> Result<Scene, ParseError> {
        self.phase2.warnings.clear();

        let mut calls = Vec::new();
        let mut source_map = Vec::new();
        for block in recognize_blocks(text) {
            let line_number = block.start_line();
            if let Some(call) = self.phase2.parse_block(block)? {
                calls.push(call);
                source_map.push(line_number);
            }
        }

        Ok(Scene::with_source_map(path, calls, source_map))
    }

    /// 最近一次解析产生的警告
    pub fn warnings(&self) -> &[String] {
        &self.phase2.warnings
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

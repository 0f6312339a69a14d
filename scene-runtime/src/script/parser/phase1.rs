//! # 阶段 1：块识别
//!
//! 将原始文本按行分组为指令块。
//!
//! 一个块从 `::指令` 行开始，到空行、下一条指令或文件末尾结束。
//! 指令行上指令名之后的内容作为第一条参数行。

/// 参数行
#[derive(Debug, Clone, PartialEq)]
pub struct ArgLine {
    pub text: String,
    pub line_number: usize,
}

/// 块（阶段 1 输出）
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// 指令块
    Directive {
        name: String,
        args: Vec<ArgLine>,
        line_number: usize,
    },
    /// 不属于任何指令的文本
    Stray { line: String, line_number: usize },
}

impl Block {
    /// 获取块的起始行号
    pub fn start_line(&self) -> usize {
        match self {
            Block::Directive { line_number, .. } => *line_number,
            Block::Stray { line_number, .. } => *line_number,
        }
    }
}

/// 识别文本中的块
pub fn recognize_blocks(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut current: Option<(String, Vec<ArgLine>, usize)> = None;

    for (line_idx, line) in text.lines().enumerate() {
        let line_number = line_idx + 1;
        let trimmed = line.trim();

        // 空行：结束当前指令块
        if trimmed.is_empty() {
            if let Some((name, args, start)) = current.take() {
                blocks.push(Block::Directive {
                    name,
                    args,
                    line_number: start,
                });
            }
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("::") {
            if let Some((name, args, start)) = current.take() {
                blocks.push(Block::Directive {
                    name,
                    args,
                    line_number: start,
                });
            }

            let (name, inline) = match rest.split_once(char::is_whitespace) {
                Some((name, inline)) => (name, inline.trim()),
                None => (rest, ""),
            };
            let mut args = Vec::new();
            if !inline.is_empty() {
                args.push(ArgLine {
                    text: inline.to_string(),
                    line_number,
                });
            }
            current = Some((name.to_ascii_lowercase(), args, line_number));
            continue;
        }

        match &mut current {
            Some((_, args, _)) => args.push(ArgLine {
                text: trimmed.to_string(),
                line_number,
            }),
            None => blocks.push(Block::Stray {
                line: trimmed.to_string(),
                line_number,
            }),
        }
    }

    if let Some((name, args, start)) = current {
        blocks.push(Block::Directive {
            name,
            args,
            line_number: start,
        });
    }

    blocks
}

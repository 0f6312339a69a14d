//! # 阶段 2：块解析
//!
//! 将指令块解析为 [`BridgeCall`]。

use super::helpers::{parse_color, parse_position, parse_seconds, split_param};
use super::phase1::{ArgLine, Block};
use crate::error::ParseError;
use crate::script::call::BridgeCall;
use crate::state::{Choice, Dialogue, Position};

/// 参数行与位置参数
struct Args<'a> {
    params: Vec<(&'a str, &'a str, usize)>,
    positional: Vec<&'a ArgLine>,
}

impl<'a> Args<'a> {
    fn split(lines: &'a [ArgLine]) -> Self {
        let mut params = Vec::new();
        let mut positional = Vec::new();
        for line in lines {
            match split_param(&line.text) {
                Some((key, value)) => params.push((key, value, line.line_number)),
                None => positional.push(line),
            }
        }
        Self { params, positional }
    }
}

/// 阶段 2 解析器
pub struct Phase2Parser {
    /// 解析过程中收集的警告
    pub warnings: Vec<String>,
}

impl Phase2Parser {
    pub fn new() -> Self {
        Self {
            warnings: Vec::new(),
        }
    }

    /// 解析单个块
    ///
    /// 返回 `Ok(None)` 表示该块被跳过（已记录警告）。
    pub fn parse_block(&mut self, block: Block) -> Result<Option<BridgeCall>, ParseError> {
        match block {
            Block::Stray { line, line_number } => {
                self.warn(line_number, format!("指令之外的文本被忽略: '{}'", line));
                Ok(None)
            }
            Block::Directive {
                name,
                args,
                line_number,
            } => self.parse_directive(&name, &args, line_number),
        }
    }

    fn parse_directive(
        &mut self,
        name: &str,
        lines: &[ArgLine],
        line_number: usize,
    ) -> Result<Option<BridgeCall>, ParseError> {
        let args = Args::split(lines);

        let call = match name {
            "module" => {
                self.reject_params(name, &args);
                let module = self.single(name, &args, "module", line_number)?;
                BridgeCall::ModuleInit { module }
            }
            "bg" => {
                self.reject_params(name, &args);
                let file = self.single(name, &args, "file", line_number)?;
                BridgeCall::LoadBackground { file }
            }
            "sprite" => self.parse_sprite(&args, line_number)?,
            "unload" => {
                self.reject_params(name, &args);
                let id = self.single(name, &args, "id", line_number)?;
                BridgeCall::UnloadSprite { id }
            }
            "music" => self.parse_music(&args, line_number)?,
            "sound" => {
                self.reject_params(name, &args);
                let file = self.single(name, &args, "file", line_number)?;
                BridgeCall::PlaySound { file }
            }
            "text" => self.parse_text(&args, line_number)?,
            "scene" => self.parse_choices(&args, line_number)?,
            "next" => {
                self.reject_params(name, &args);
                let file = self.single(name, &args, "file", line_number)?;
                BridgeCall::GotoScene { file }
            }
            "pop" | "quit" => {
                self.reject_params(name, &args);
                if let Some(extra) = args.positional.first() {
                    self.warn(
                        extra.line_number,
                        format!("'::{}' 不接受参数，'{}' 被忽略", name, extra.text),
                    );
                }
                if name == "pop" {
                    BridgeCall::PopState
                } else {
                    BridgeCall::Quit
                }
            }
            _ => {
                self.warn(line_number, format!("未知指令 '::{}'，已跳过", name));
                return Ok(None);
            }
        };

        Ok(Some(call))
    }

    fn parse_sprite(&mut self, args: &Args, line_number: usize) -> Result<BridgeCall, ParseError> {
        let mut id = None;
        for &(key, value, param_line) in &args.params {
            match key {
                "id" if !value.is_empty() => id = Some(value.to_string()),
                _ => self.warn_param("sprite", key, param_line),
            }
        }

        let pos_line = args
            .positional
            .first()
            .ok_or_else(|| missing("sprite", "position", line_number))?;
        let (x, y) = parse_position(&pos_line.text).ok_or_else(|| ParseError::InvalidArgument {
            line: pos_line.line_number,
            param: "position".to_string(),
            message: format!("期望 'XxY' 形式的坐标，实际为 '{}'", pos_line.text),
        })?;

        let file = args
            .positional
            .get(1)
            .ok_or_else(|| missing("sprite", "file", line_number))?
            .text
            .clone();
        self.warn_extra("sprite", &args.positional[2..]);

        Ok(BridgeCall::LoadSprite { file, x, y, id })
    }

    fn parse_music(&mut self, args: &Args, line_number: usize) -> Result<BridgeCall, ParseError> {
        let mut start = None;
        for &(key, value, param_line) in &args.params {
            match key {
                "start" => {
                    start = Some(parse_seconds(value).ok_or_else(|| {
                        ParseError::InvalidArgument {
                            line: param_line,
                            param: "start".to_string(),
                            message: format!("期望非负秒数，实际为 '{}'", value),
                        }
                    })?);
                }
                _ => self.warn_param("music", key, param_line),
            }
        }

        let file = self.single("music", args, "file", line_number)?;
        Ok(BridgeCall::PlayMusic { file, start })
    }

    fn parse_text(&mut self, args: &Args, line_number: usize) -> Result<BridgeCall, ParseError> {
        let mut dialogue = Dialogue::default();

        for &(key, value, param_line) in &args.params {
            match key {
                "name" => {
                    dialogue.speaker = (!value.is_empty()).then(|| value.to_string());
                }
                "pos" => {
                    let (x, y) = parse_position(value).ok_or_else(|| ParseError::InvalidArgument {
                        line: param_line,
                        param: "pos".to_string(),
                        message: format!("期望 'XxY' 形式的坐标，实际为 '{}'", value),
                    })?;
                    dialogue.position = Some(Position::new(x, y));
                }
                "color" | "text_color" => {
                    let color = parse_color(value).ok_or_else(|| ParseError::InvalidArgument {
                        line: param_line,
                        param: key.to_string(),
                        message: format!("期望 'r,g,b' 或 'r,g,b,a'，实际为 '{}'", value),
                    })?;
                    if key == "color" {
                        dialogue.speaker_color = color;
                    } else {
                        dialogue.text_color = color;
                    }
                }
                _ => self.warn_param("text", key, param_line),
            }
        }

        if args.positional.is_empty() {
            return Err(missing("text", "text", line_number));
        }
        dialogue.text = args
            .positional
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(BridgeCall::ShowText(dialogue))
    }

    fn parse_choices(&mut self, args: &Args, line_number: usize) -> Result<BridgeCall, ParseError> {
        self.reject_params("scene", args);

        if args.positional.is_empty() {
            return Err(missing("scene", "label", line_number));
        }

        let mut choices = Vec::new();
        for pair in args.positional.chunks(2) {
            let label = pair[0];
            let Some(target) = pair.get(1) else {
                return Err(missing("scene", "target", label.line_number));
            };
            choices.push(Choice::new(&label.text, &target.text));
        }

        Ok(BridgeCall::SetChoices(choices))
    }

    /// 读取唯一的位置参数
    fn single(
        &mut self,
        directive: &str,
        args: &Args,
        param: &str,
        line_number: usize,
    ) -> Result<String, ParseError> {
        let value = args
            .positional
            .first()
            .ok_or_else(|| missing(directive, param, line_number))?
            .text
            .clone();
        self.warn_extra(directive, &args.positional[1..]);
        Ok(value)
    }

    fn reject_params(&mut self, directive: &str, args: &Args) {
        for &(key, _, param_line) in &args.params {
            self.warn_param(directive, key, param_line);
        }
    }

    fn warn_param(&mut self, directive: &str, key: &str, line_number: usize) {
        self.warn(
            line_number,
            format!("'::{}' 不支持参数 ':{}'，已忽略", directive, key),
        );
    }

    fn warn_extra(&mut self, directive: &str, extra: &[&ArgLine]) {
        for line in extra {
            self.warn(
                line.line_number,
                format!("'::{}' 的多余参数 '{}' 被忽略", directive, line.text),
            );
        }
    }

    fn warn(&mut self, line_number: usize, message: String) {
        self.warnings.push(format!("第 {} 行：{}", line_number, message));
    }
}

fn missing(directive: &str, param: &str, line: usize) -> ParseError {
    ParseError::MissingArgument {
        line,
        directive: directive.to_string(),
        param: param.to_string(),
    }
}

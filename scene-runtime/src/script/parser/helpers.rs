//! # 辅助解析函数
//!
//! 手写的字符串解析辅助函数，无正则依赖。

use crate::state::Rgba;

/// 解析 `XxY` 形式的坐标
///
/// 输入: `200x120`、`-40 x 16`
/// 输出: `Some((200, 120))`
pub fn parse_position(s: &str) -> Option<(i32, i32)> {
    let (x, y) = s.split_once(['x', 'X'])?;
    let x = x.trim().parse().ok()?;
    let y = y.trim().parse().ok()?;
    Some((x, y))
}

/// 解析 `r,g,b` 或 `r,g,b,a` 形式的颜色
pub fn parse_color(s: &str) -> Option<Rgba> {
    let parts: Vec<u8> = s
        .split(',')
        .map(|p| p.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .ok()?;

    match parts.as_slice() {
        [r, g, b] => Some(Rgba::new(*r, *g, *b, 255)),
        [r, g, b, a] => Some(Rgba::new(*r, *g, *b, *a)),
        _ => None,
    }
}

/// 拆分 `:key value` 形式的参数行
///
/// 不是参数行时返回 None。
pub fn split_param(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix(':')?;
    if rest.starts_with(':') {
        return None;
    }
    Some(match rest.split_once(char::is_whitespace) {
        Some((key, value)) => (key, value.trim()),
        None => (rest, ""),
    })
}

/// 解析非负秒数
pub fn parse_seconds(s: &str) -> Option<f32> {
    let value: f32 = s.trim().parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

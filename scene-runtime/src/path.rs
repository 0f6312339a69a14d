//! # 路径规范化模块
//!
//! 所有缓存 key 都是规范化后的**逻辑路径**：
//!
//! - 使用 `/` 作为分隔符
//! - 不含 `.`、`..` 与空组件
//! - 形如 `<module>/<子目录>/<文件>`
//!
//! 宿主的资源来源负责把逻辑路径映射到文件系统或 ZIP 包。

/// 规范化逻辑路径
///
/// ```text
/// "chapter1/./images/../images/bg.png" -> "chapter1/images/bg.png"
/// "chapter1\\images\\bg.png"           -> "chapter1/images/bg.png"
/// ```
pub fn normalize_logical_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");

    let mut components: Vec<&str> = Vec::new();
    for component in normalized.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            _ => components.push(component),
        }
    }

    components.join("/")
}

/// 解析模块内资源路径
///
/// `file` 相对于 `<module>/<subdir>/`。
pub fn resolve_in_module(module: &str, subdir: &str, file: &str) -> String {
    normalize_logical_path(&format!("{}/{}/{}", module, subdir, file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_logical_path() {
        assert_eq!(normalize_logical_path("bg.png"), "bg.png");
        assert_eq!(normalize_logical_path("./bg.png"), "bg.png");
        assert_eq!(
            normalize_logical_path("images\\chars\\bob.png"),
            "images/chars/bob.png"
        );
        assert_eq!(normalize_logical_path("a/b/../../c/d.png"), "c/d.png");
        assert_eq!(normalize_logical_path("a//b/"), "a/b");
        // 越过根目录的 .. 被忽略
        assert_eq!(normalize_logical_path("../x.png"), "x.png");
    }

    #[test]
    fn test_resolve_in_module() {
        assert_eq!(
            resolve_in_module("assets", "images", "bg.png"),
            "assets/images/bg.png"
        );
        assert_eq!(
            resolve_in_module("chapter2", "music", "../music/theme.ogg"),
            "chapter2/music/theme.ogg"
        );
        // 相同文件的不同写法得到同一个缓存 key
        assert_eq!(
            resolve_in_module("m", "images", "./bg.png"),
            resolve_in_module("m", "images", "bg.png")
        );
    }
}

//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `scene-check`: 检查场景脚本（语法、跳转目标、资源引用）

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use scene_runtime::{BridgeCall, Parser, RuntimeConfig, resolve_in_module};
use walkdir::WalkDir;
use xshell::{Shell, cmd};

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());

    match sub.as_str() {
        "check-all" => check_all()?,
        "scene-check" => {
            let path = args.next();
            scene_check(path.as_deref())?;
        }
        "help" | "-h" | "--help" => print_help(),
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn check_all() -> anyhow::Result<()> {
    let sh = Shell::new()?;

    eprintln!("\n==> cargo fmt --all -- --check");
    cmd!(sh, "cargo fmt --all -- --check").run()?;

    eprintln!("\n==> cargo clippy --workspace --all-targets");
    cmd!(sh, "cargo clippy --workspace --all-targets").run()?;

    eprintln!("\n==> cargo test --workspace");
    cmd!(sh, "cargo test --workspace").run()?;

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 门禁检查
  scene-check     检查场景脚本

SCENE-CHECK:
  cargo xtask scene-check [root]

  root 为模块目录所在的资源根目录（默认当前目录），
  检查 <module>/scenes/ 下所有 .script 文件：
    - 脚本语法错误
    - 选项与 ::next 引用的场景是否存在
    - 资源文件是否存在（背景/立绘/音乐/音效）

ALIASES (in .cargo/config.toml):
  cargo check-all     -> cargo xtask check-all
  cargo scene-check   -> cargo xtask scene-check
"#
    );
}

//=============================================================================
// scene-check 命令实现
//=============================================================================

/// 检查结果
#[derive(Default)]
struct SceneCheckResult {
    scenes_checked: usize,
    parse_errors: usize,
    warnings: usize,
    missing: Vec<MissingReference>,
}

/// 缺失的引用
struct MissingReference {
    scene: String,
    line: Option<usize>,
    kind: &'static str,
    path: String,
}

fn scene_check(root: Option<&str>) -> anyhow::Result<()> {
    let root = PathBuf::from(root.unwrap_or("."));
    if !root.is_dir() {
        anyhow::bail!("资源根目录不存在: {}", root.display());
    }

    let config = RuntimeConfig::default();
    let files = collect_scene_files(&root, &config.scenes_dir);
    if files.is_empty() {
        eprintln!("未找到场景脚本（<module>/{}/*.script）", config.scenes_dir);
        return Ok(());
    }

    eprintln!("==> 检查 {} 个场景脚本...\n", files.len());

    let mut result = SceneCheckResult::default();
    for logical_path in &files {
        check_scene_file(&root, logical_path, &config, &mut result);
    }

    print_check_result(&result);

    if result.parse_errors > 0 || !result.missing.is_empty() {
        anyhow::bail!("场景检查发现错误");
    }
    Ok(())
}

/// 收集 `<module>/<scenes_dir>/**/*.script`，返回逻辑路径
fn collect_scene_files(root: &Path, scenes_dir: &str) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "script"))
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(root).ok()?;
            let logical = relative.to_string_lossy().replace('\\', "/");
            module_of(&logical, scenes_dir).is_some().then_some(logical)
        })
        .collect();
    files.sort();
    files
}

/// 从场景逻辑路径推出所在模块：`<module>/<scenes_dir>/...`
fn module_of<'a>(logical_path: &'a str, scenes_dir: &str) -> Option<&'a str> {
    let marker = format!("/{}/", scenes_dir);
    logical_path
        .find(&marker)
        .map(|index| &logical_path[..index])
        .filter(|module| !module.is_empty())
}

fn check_scene_file(
    root: &Path,
    logical_path: &str,
    config: &RuntimeConfig,
    result: &mut SceneCheckResult,
) {
    result.scenes_checked += 1;

    let text = match std::fs::read_to_string(root.join(logical_path)) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("[ERROR] {}: 无法读取文件 - {}", logical_path, e);
            result.parse_errors += 1;
            return;
        }
    };

    let mut parser = Parser::new();
    let scene = match parser.parse(logical_path, &text) {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!("[ERROR] {}: {}", logical_path, e);
            result.parse_errors += 1;
            return;
        }
    };

    for warning in parser.warnings() {
        eprintln!("[WARN] {}: {}", logical_path, warning);
        result.warnings += 1;
    }

    let Some(mut module) = module_of(logical_path, &config.scenes_dir).map(str::to_string) else {
        return;
    };

    for (index, call) in scene.calls.iter().enumerate() {
        let references: Vec<(&'static str, &str, &str)> = match call {
            BridgeCall::LoadBackground { file } => {
                vec![("background", config.images_dir.as_str(), file.as_str())]
            }
            BridgeCall::LoadSprite { file, .. } => {
                vec![("sprite", config.images_dir.as_str(), file.as_str())]
            }
            BridgeCall::PlayMusic { file, .. } => {
                vec![("music", config.music_dir.as_str(), file.as_str())]
            }
            BridgeCall::PlaySound { file } => {
                vec![("sound", config.music_dir.as_str(), file.as_str())]
            }
            BridgeCall::GotoScene { file } => {
                vec![("scene", config.scenes_dir.as_str(), file.as_str())]
            }
            BridgeCall::SetChoices(choices) => choices
                .iter()
                .map(|choice| {
                    (
                        "scene",
                        config.scenes_dir.as_str(),
                        choice.target_scene.as_str(),
                    )
                })
                .collect(),
            BridgeCall::ModuleInit { module: next } => {
                module = next.clone();
                continue;
            }
            _ => continue,
        };

        for (kind, subdir, file) in references {
            let path = resolve_in_module(&module, subdir, file);
            if !root.join(&path).is_file() {
                result.missing.push(MissingReference {
                    scene: logical_path.to_string(),
                    line: scene.line_of(index),
                    kind,
                    path,
                });
            }
        }
    }
}

fn print_check_result(result: &SceneCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个场景", result.scenes_checked);
    eprintln!();

    for missing in &result.missing {
        let line = missing
            .line
            .map(|l| format!(":{}", l))
            .unwrap_or_default();
        eprintln!(
            "[ERROR] {}{}: 引用不存在 [{}] {}",
            missing.scene, line, missing.kind, missing.path
        );
    }

    let error_count = result.parse_errors + result.missing.len();
    eprintln!();
    if error_count > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", error_count, result.warnings);
    } else if result.warnings > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", result.warnings);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}

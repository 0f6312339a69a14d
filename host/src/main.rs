//! Scene Host - 无窗口宿主
//!
//! 读取配置，按输入脚本逐帧驱动 scene-runtime，把可见状态输出到终端。

use clap::Parser;
use scene_host::input::parse_input_script;
use scene_host::{App, AppConfig, AppError, describe_state};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "scene-host", about = "Headless scene runtime host")]
struct Cli {
    /// 配置文件路径
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// 入口场景（覆盖配置）
    #[arg(long)]
    scene: Option<String>,

    /// 输入脚本，逗号分隔，每个记号一帧（如 "a,a,2,back"）
    #[arg(long, default_value = "")]
    inputs: String,

    /// 最多执行的帧数
    #[arg(long, default_value_t = 600)]
    max_frames: u64,

    /// 结束时保存到该槽位
    #[arg(long)]
    save_slot: Option<u32>,

    /// 启动时从该槽位读档
    #[arg(long)]
    load_slot: Option<u32>,

    /// 日志级别（覆盖配置）
    #[arg(long)]
    log_level: Option<String>,
}

fn init_logging(level: &str) {
    let level = level.parse::<tracing::Level>().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn run(cli: Cli, mut config: AppConfig) -> Result<(), AppError> {
    if let Some(scene) = cli.scene {
        config.start_scene = scene;
    }
    if let Err(e) = config.validate() {
        warn!(error = %e, "配置校验未通过");
    }

    let frames = parse_input_script(&cli.inputs)?;
    let mut app = App::new(config)?;

    match cli.load_slot {
        Some(slot) => app.load_from_slot(slot)?,
        None => app.start()?,
    };

    let mut last_view = describe_state(app.runtime().state());
    print_view(&last_view);

    // 每个输入记号对应一帧，记号用完即结束
    for events in frames.into_iter().take(cli.max_frames as usize) {
        if app.should_quit() {
            break;
        }
        for event in events {
            app.handle_event(event);
        }

        let report = app.frame();
        if let Some(e) = &report.error {
            error!(error = %e, "场景出错");
        }

        let view = describe_state(app.runtime().state());
        if view != last_view {
            print_view(&view);
            last_view = view;
        }
    }

    if let Some(slot) = cli.save_slot {
        app.save_to_slot(slot)?;
    }

    info!(
        frames = app.frame_count(),
        phase = ?app.runtime().phase(),
        quit = app.should_quit(),
        "结束"
    );
    app.shutdown();
    Ok(())
}

fn print_view(lines: &[String]) {
    println!("----");
    for line in lines {
        println!("{}", line);
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // 日志级别来自配置，加载结果在日志初始化后再报告
    let loaded = AppConfig::try_load(&cli.config);
    let config = loaded.clone().unwrap_or_default();
    init_logging(cli.log_level.as_deref().unwrap_or(&config.log_level));
    match &loaded {
        Ok(_) => info!(path = %cli.config.display(), "配置文件加载成功"),
        Err(e) => {
            warn!(path = %cli.config.display(), error = %e, "配置加载失败，使用默认配置")
        }
    }

    match run(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "运行失败");
            ExitCode::FAILURE
        }
    }
}

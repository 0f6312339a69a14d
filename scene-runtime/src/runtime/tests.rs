//! # SceneRuntime 测试

use insta::assert_debug_snapshot;

use super::SceneRuntime;
use crate::config::{RollbackMode, RuntimeConfig};
use crate::error::{BridgeError, RuntimeError, ScriptLoadError};
use crate::input::RuntimeInput;
use crate::save::SaveMetadata;
use crate::state::ScenePhase;
use crate::test_support::{MemoryScenes, RecordingBackend};

const INTRO: &str = "\
::bg
bg.png
::text
:name Bob
Hi

::scene
Yes
a.script
No
b.script
";

const THREE_LINES: &str = "\
::text
One

::text
Two

::text
Three
";

fn runtime_with(config: RuntimeConfig, scenes: &[(&str, &str)]) -> SceneRuntime<RecordingBackend> {
    let mut source = MemoryScenes::new();
    for (file, text) in scenes {
        source = source.with(&format!("assets/scenes/{}", file), text);
    }
    SceneRuntime::new(config, RecordingBackend::new(), source)
}

fn runtime(scenes: &[(&str, &str)]) -> SceneRuntime<RecordingBackend> {
    runtime_with(RuntimeConfig::default(), scenes)
}

fn text(rt: &SceneRuntime<RecordingBackend>) -> Option<&str> {
    rt.state().dialogue.as_ref().map(|d| d.text.as_str())
}

// -------------------------------------------------------------------------
// 状态机
// -------------------------------------------------------------------------

#[test]
fn test_end_to_end_intro() {
    let mut rt = runtime(&[
        ("intro.script", INTRO),
        ("a.script", "::text\nWelcome to A"),
    ]);
    let mut phases = Vec::new();

    phases.push(rt.start("intro.script").unwrap());
    assert!(rt.state().has_background());
    assert!(rt.state().dialogue_pending());
    assert_eq!(rt.state().dialogue.as_ref().unwrap().speaker.as_deref(), Some("Bob"));

    phases.push(rt.frame(Some(RuntimeInput::Advance)).unwrap());
    assert!(!rt.state().dialogue_pending());
    assert_eq!(rt.state().choices.as_ref().unwrap().len(), 2);

    phases.push(rt.frame(Some(RuntimeInput::choice(0))).unwrap());
    assert_eq!(text(&rt), Some("Welcome to A"));
    assert_eq!(rt.current_scene(), Some("assets/scenes/a.script"));

    // 推进时的快照 + 选择时的 intro 快照
    assert_eq!(rt.stack().len(), 2);
    let top = rt.stack().peek().unwrap();
    assert!(top.choices.is_some());
    assert_eq!(
        top.continuation.as_ref().unwrap().scene_path,
        "assets/scenes/intro.script"
    );

    assert_debug_snapshot!(phases, @r"
    [
        AwaitingAdvance,
        AwaitingChoice,
        AwaitingAdvance,
    ]
    ");
}

#[test]
fn test_suspension_round_trip() {
    let mut rt = runtime(&[("s.script", "::text\n:name Alice\nHello\n\n::bg\nbg.png")]);

    assert_eq!(rt.start("s.script").unwrap(), ScenePhase::AwaitingAdvance);
    assert_eq!(text(&rt), Some("Hello"));

    assert_eq!(rt.frame(Some(RuntimeInput::Advance)).unwrap(), ScenePhase::Idle);
    assert!(!rt.state().dialogue_pending());
    assert!(rt.state().has_background());
}

#[test]
fn test_no_input_does_not_resume() {
    let mut rt = runtime(&[("s.script", THREE_LINES)]);
    rt.start("s.script").unwrap();

    for _ in 0..5 {
        assert_eq!(rt.frame(None).unwrap(), ScenePhase::AwaitingAdvance);
    }
    assert_eq!(text(&rt), Some("One"));
}

#[test]
fn test_one_resume_per_input() {
    let mut rt = runtime(&[("s.script", THREE_LINES)]);
    rt.start("s.script").unwrap();

    rt.frame(Some(RuntimeInput::Advance)).unwrap();
    assert_eq!(text(&rt), Some("Two"));
    rt.frame(Some(RuntimeInput::Advance)).unwrap();
    assert_eq!(text(&rt), Some("Three"));
}

#[test]
fn test_invalid_choice_index() {
    let mut rt = runtime(&[("intro.script", INTRO)]);
    rt.start("intro.script").unwrap();
    rt.frame(Some(RuntimeInput::Advance)).unwrap();
    let depth = rt.stack().len();

    let err = rt.frame(Some(RuntimeInput::choice(5))).unwrap_err();
    assert_eq!(err, RuntimeError::InvalidChoiceIndex { index: 5, max: 2 });
    assert_eq!(rt.phase(), ScenePhase::AwaitingChoice);
    assert_eq!(rt.stack().len(), depth);
}

#[test]
fn test_inputs_for_other_phase_are_ignored() {
    let mut rt = runtime(&[("intro.script", INTRO)]);
    rt.start("intro.script").unwrap();

    // 对话阶段的选择输入
    assert_eq!(
        rt.frame(Some(RuntimeInput::choice(0))).unwrap(),
        ScenePhase::AwaitingAdvance
    );
    rt.frame(Some(RuntimeInput::Advance)).unwrap();

    // 选项阶段的推进输入
    assert_eq!(
        rt.frame(Some(RuntimeInput::Advance)).unwrap(),
        ScenePhase::AwaitingChoice
    );
    assert!(rt.state().choices.is_some());
}

#[test]
fn test_completed_scene_is_noop() {
    let mut rt = runtime(&[("s.script", "::bg\nbg.png")]);
    assert_eq!(rt.start("s.script").unwrap(), ScenePhase::Idle);
    let loads = rt.backend().total_loads();

    assert_eq!(rt.frame(Some(RuntimeInput::Advance)).unwrap(), ScenePhase::Idle);
    assert_eq!(rt.frame(Some(RuntimeInput::StepBack)).unwrap(), ScenePhase::Idle);
    assert_eq!(rt.backend().total_loads(), loads);
    assert!(rt.state().continuation.is_none());
}

#[test]
fn test_pause_blocks_input() {
    let mut rt = runtime(&[("s.script", THREE_LINES)]);
    rt.start("s.script").unwrap();

    rt.frame(Some(RuntimeInput::Pause)).unwrap();
    assert!(rt.is_paused());
    rt.frame(Some(RuntimeInput::Advance)).unwrap();
    rt.frame(Some(RuntimeInput::StepBack)).unwrap();
    assert_eq!(text(&rt), Some("One"));

    rt.frame(Some(RuntimeInput::Pause)).unwrap();
    assert!(!rt.is_paused());
    rt.frame(Some(RuntimeInput::Advance)).unwrap();
    assert_eq!(text(&rt), Some("Two"));
}

#[test]
fn test_quit() {
    let mut rt = runtime(&[("s.script", "::text\nBye\n\n::quit\n::bg\nnever.png")]);
    rt.start("s.script").unwrap();
    assert!(!rt.quit_requested());

    assert_eq!(rt.frame(Some(RuntimeInput::Advance)).unwrap(), ScenePhase::Idle);
    assert!(rt.quit_requested());
    assert!(!rt.state().has_background());
}

// -------------------------------------------------------------------------
// 错误处理
// -------------------------------------------------------------------------

#[test]
fn test_missing_scene_goes_idle() {
    let mut rt = runtime(&[]);
    let err = rt.start("nowhere.script").unwrap_err();

    let expected = RuntimeError::ScriptLoad(ScriptLoadError::NotFound {
        path: "assets/scenes/nowhere.script".to_string(),
    });
    assert_eq!(err, expected);
    assert_eq!(rt.phase(), ScenePhase::Idle);
    assert!(rt.last_error().is_some());
}

#[test]
fn test_parse_error_goes_idle() {
    let mut rt = runtime(&[("bad.script", "::bg\n\n::text\nHi")]);
    let err = rt.start("bad.script").unwrap_err();
    assert!(matches!(err, RuntimeError::ScriptLoad(ScriptLoadError::Parse { .. })));
    assert_eq!(rt.phase(), ScenePhase::Idle);
}

#[test]
fn test_failed_choice_target_goes_idle() {
    let mut rt = runtime(&[("intro.script", INTRO)]);
    rt.start("intro.script").unwrap();
    rt.frame(Some(RuntimeInput::Advance)).unwrap();

    assert!(rt.frame(Some(RuntimeInput::choice(1))).is_err());
    assert_eq!(rt.phase(), ScenePhase::Idle);
    assert!(!rt.state().choice_pending());
}

#[test]
fn test_runaway_scene_is_aborted() {
    let config = RuntimeConfig {
        max_calls_per_resume: 50,
        ..RuntimeConfig::default()
    };
    let mut rt = runtime_with(config, &[("loop.script", "::next\nloop.script")]);

    let err = rt.start("loop.script").unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::ScriptAborted {
            source: BridgeError::ScriptRuntime { .. },
            ..
        }
    ));
    assert_eq!(rt.phase(), ScenePhase::Idle);
    assert_eq!(rt.last_error(), Some(&err));
}

#[test]
fn test_asset_errors_do_not_stop_the_scene() {
    let config = RuntimeConfig {
        max_sprites: 1,
        ..RuntimeConfig::default()
    };
    let mut rt = runtime_with(
        config,
        &[(
            "s.script",
            "::bg\nmissing.png\n::sprite\n0x0\na.png\n::sprite\n10x0\nb.png\n::text\nStill here",
        )],
    );
    rt.backend_mut().fail_on("assets/images/missing.png");

    assert_eq!(rt.start("s.script").unwrap(), ScenePhase::AwaitingAdvance);
    assert_eq!(text(&rt), Some("Still here"));
    assert_eq!(rt.state().sprites.len(), 1);

    let signals = rt.take_signals();
    assert_eq!(signals.len(), 2);
    assert!(matches!(signals[0], BridgeError::AssetLoad { .. }));
    assert_eq!(signals[1], BridgeError::CapacityExceeded { limit: 1 });
    assert!(rt.take_signals().is_empty());
}

// -------------------------------------------------------------------------
// 场景切换与模块
// -------------------------------------------------------------------------

#[test]
fn test_module_persists_across_scenes() {
    let mut source = MemoryScenes::new()
        .with("assets/scenes/intro.script", "::module chapter2\n::next\nnext.script")
        .with("chapter2/scenes/next.script", "::bg\nbg.png\n::text\nHi");
    source = source.with("assets/scenes/other.script", "::text\nBack home");
    let mut rt = SceneRuntime::new(RuntimeConfig::default(), RecordingBackend::new(), source);

    rt.start("intro.script").unwrap();
    assert_eq!(rt.state().module, "chapter2");
    assert_eq!(
        rt.state().background.as_ref().unwrap().path,
        "chapter2/images/bg.png"
    );

    // 新游戏重置模块
    rt.start("other.script").unwrap();
    assert_eq!(rt.state().module, "assets");
    assert_eq!(text(&rt), Some("Back home"));
}

#[test]
fn test_next_scene_resets_visible_state_without_push() {
    let mut rt = runtime(&[
        ("a.script", "::music\ntheme.ogg\n::bg\nbg.png\n::text\nA\n\n::next\nb.script"),
        ("b.script", "::text\nB"),
    ]);
    rt.start("a.script").unwrap();
    let music = rt.state().music.as_ref().unwrap().handle;

    rt.frame(Some(RuntimeInput::Advance)).unwrap();
    assert_eq!(text(&rt), Some("B"));
    assert!(!rt.state().has_background());
    assert!(!rt.state().has_music());
    assert!(rt.backend().stopped.contains(&music));
    // 只有推进时的快照
    assert_eq!(rt.stack().len(), 1);
}

#[test]
fn test_start_clears_stack() {
    let mut rt = runtime(&[("s.script", THREE_LINES)]);
    rt.start("s.script").unwrap();
    rt.frame(Some(RuntimeInput::Advance)).unwrap();
    assert_eq!(rt.stack().len(), 1);

    rt.start("s.script").unwrap();
    assert!(rt.stack().is_empty());
}

// -------------------------------------------------------------------------
// 回退
// -------------------------------------------------------------------------

#[test]
fn test_step_back_resumes_at_snapshot() {
    let mut rt = runtime(&[("s.script", THREE_LINES)]);
    rt.start("s.script").unwrap();
    rt.frame(Some(RuntimeInput::Advance)).unwrap();
    rt.frame(Some(RuntimeInput::Advance)).unwrap();
    assert_eq!(text(&rt), Some("Three"));

    assert_eq!(
        rt.frame(Some(RuntimeInput::StepBack)).unwrap(),
        ScenePhase::AwaitingAdvance
    );
    assert_eq!(text(&rt), Some("Two"));
    assert_eq!(rt.stack().len(), 1);

    rt.frame(Some(RuntimeInput::Advance)).unwrap();
    assert_eq!(text(&rt), Some("Three"));
}

#[test]
fn test_step_back_restart_scene_mode() {
    let config = RuntimeConfig {
        rollback: RollbackMode::RestartScene,
        ..RuntimeConfig::default()
    };
    let mut rt = runtime_with(config, &[("s.script", THREE_LINES)]);
    rt.start("s.script").unwrap();
    rt.frame(Some(RuntimeInput::Advance)).unwrap();
    rt.frame(Some(RuntimeInput::Advance)).unwrap();

    rt.frame(Some(RuntimeInput::StepBack)).unwrap();
    assert_eq!(text(&rt), Some("One"));
    assert_eq!(rt.phase(), ScenePhase::AwaitingAdvance);
}

#[test]
fn test_restart_scene_step_back_does_not_duplicate_sprites() {
    let config = RuntimeConfig {
        rollback: RollbackMode::RestartScene,
        ..RuntimeConfig::default()
    };
    let scene = "::sprite\n:id bob\n0x0\nbob.png\n::music\ntheme.ogg\n::text\nOne\n\n::text\nTwo";
    let mut rt = runtime_with(config, &[("s.script", scene)]);
    rt.start("s.script").unwrap();

    for _ in 0..3 {
        rt.frame(Some(RuntimeInput::Advance)).unwrap();
        assert_eq!(text(&rt), Some("Two"));

        rt.frame(Some(RuntimeInput::StepBack)).unwrap();
        assert_eq!(text(&rt), Some("One"));
        assert_eq!(rt.state().sprites.len(), 1);
        assert!(rt.state().has_music());
        assert!(rt.take_signals().is_empty());
    }
    assert_eq!(rt.phase(), ScenePhase::AwaitingAdvance);
}

#[test]
fn test_reconfigure_trims_stack_and_caches() {
    let mut rt = runtime(&[("s.script", THREE_LINES)]);
    rt.start("s.script").unwrap();
    rt.frame(Some(RuntimeInput::Advance)).unwrap();
    rt.frame(Some(RuntimeInput::Advance)).unwrap();
    assert_eq!(rt.stack().len(), 2);

    rt.reconfigure(RuntimeConfig {
        max_stack_depth: Some(1),
        sprite_cache_capacity: 2,
        ..RuntimeConfig::default()
    });
    assert_eq!(rt.stack().len(), 1);
    assert_eq!(rt.caches().sprites().capacity(), 2);
    assert_eq!(rt.config().max_stack_depth, Some(1));

    // 只剩最近的一个快照
    rt.frame(Some(RuntimeInput::StepBack)).unwrap();
    assert_eq!(text(&rt), Some("Two"));
    rt.frame(Some(RuntimeInput::StepBack)).unwrap();
    assert_eq!(text(&rt), Some("Two"));
}

#[test]
fn test_step_back_from_choice_into_previous_scene() {
    let mut rt = runtime(&[
        ("intro.script", INTRO),
        ("a.script", "::text\nWelcome to A"),
    ]);
    rt.start("intro.script").unwrap();
    rt.frame(Some(RuntimeInput::Advance)).unwrap();
    rt.frame(Some(RuntimeInput::choice(0))).unwrap();

    // 回到 intro 的选项
    assert_eq!(
        rt.frame(Some(RuntimeInput::StepBack)).unwrap(),
        ScenePhase::AwaitingChoice
    );
    assert_eq!(rt.current_scene(), Some("assets/scenes/intro.script"));
    assert!(rt.state().has_background());

    // 再回到 intro 的对话
    rt.frame(Some(RuntimeInput::StepBack)).unwrap();
    assert_eq!(text(&rt), Some("Hi"));

    // 从恢复的续点继续执行
    assert_eq!(
        rt.frame(Some(RuntimeInput::Advance)).unwrap(),
        ScenePhase::AwaitingChoice
    );
}

#[test]
fn test_step_back_on_empty_stack() {
    let mut rt = runtime(&[("s.script", THREE_LINES)]);
    rt.start("s.script").unwrap();

    assert_eq!(
        rt.frame(Some(RuntimeInput::StepBack)).unwrap(),
        ScenePhase::AwaitingAdvance
    );
    assert_eq!(text(&rt), Some("One"));
}

#[test]
fn test_pop_directive() {
    let mut rt = runtime(&[("s.script", "::text\nOne\n\n::pop")]);
    rt.start("s.script").unwrap();

    // 推进时入栈的快照立即被脚本弹出
    assert_eq!(
        rt.frame(Some(RuntimeInput::Advance)).unwrap(),
        ScenePhase::AwaitingAdvance
    );
    assert_eq!(text(&rt), Some("One"));
    assert!(rt.stack().is_empty());
}

#[test]
fn test_rollback_reloads_evicted_assets() {
    let config = RuntimeConfig {
        background_cache_capacity: 1,
        ..RuntimeConfig::default()
    };
    let mut rt = runtime_with(
        config,
        &[("s.script", "::bg\na.png\n::text\nOne\n\n::bg\nb.png\n::text\nTwo")],
    );
    rt.start("s.script").unwrap();
    let first = rt.state().background.as_ref().unwrap().handle;

    rt.frame(Some(RuntimeInput::Advance)).unwrap();
    // a.png 已被驱逐
    assert!(rt.backend().is_texture_released(first));
    assert!(!rt.caches().backgrounds().contains("assets/images/a.png"));

    rt.frame(Some(RuntimeInput::StepBack)).unwrap();
    let restored = rt.state().background.as_ref().unwrap();
    assert_eq!(restored.path, "assets/images/a.png");
    assert_ne!(restored.handle, first);
    assert!(rt.backend().is_texture_live(restored.handle));
    assert!(rt.caches().backgrounds().len() <= 1);
}

#[test]
fn test_max_stack_depth() {
    let config = RuntimeConfig {
        max_stack_depth: Some(1),
        ..RuntimeConfig::default()
    };
    let mut rt = runtime_with(config, &[("s.script", THREE_LINES)]);
    rt.start("s.script").unwrap();
    rt.frame(Some(RuntimeInput::Advance)).unwrap();
    rt.frame(Some(RuntimeInput::Advance)).unwrap();
    assert_eq!(rt.stack().len(), 1);

    rt.frame(Some(RuntimeInput::StepBack)).unwrap();
    assert_eq!(text(&rt), Some("Two"));
    rt.frame(Some(RuntimeInput::StepBack)).unwrap();
    assert_eq!(text(&rt), Some("Two"));
}

// -------------------------------------------------------------------------
// 音乐、缓存与资源生命周期
// -------------------------------------------------------------------------

#[test]
fn test_music_is_played_and_pumped() {
    let mut rt = runtime(&[("s.script", "::music\n:start 1.5\ntheme.ogg\n::text\nHi")]);
    rt.start("s.script").unwrap();

    let handle = rt.state().music.as_ref().unwrap().handle;
    assert_eq!(rt.backend().playing, Some(handle));
    assert_eq!(rt.backend().seeks, vec![(handle, 1.5)]);

    rt.frame(None).unwrap();
    rt.frame(None).unwrap();
    assert_eq!(rt.backend().music_updates, 2);
}

#[test]
fn test_cache_bound_holds_after_every_frame() {
    let config = RuntimeConfig {
        sprite_cache_capacity: 2,
        ..RuntimeConfig::default()
    };
    let mut script = String::new();
    for i in 0..6 {
        script.push_str(&format!(
            "::sprite\n:id s{i}\n0x0\ns{i}.png\n::text\nline {i}\n\n::unload\ns{i}\n"
        ));
    }
    let mut rt = runtime_with(config, &[("s.script", &script)]);
    rt.start("s.script").unwrap();
    rt.frame(None).unwrap();

    while rt.phase() == ScenePhase::AwaitingAdvance {
        rt.frame(Some(RuntimeInput::Advance)).unwrap();
        assert!(rt.caches().sprites().len() <= 2);
        for sprite in &rt.state().sprites {
            assert!(rt.backend().is_texture_live(sprite.handle));
        }
    }
}

#[test]
fn test_shutdown_releases_everything_once() {
    let mut rt = runtime(&[(
        "s.script",
        "::bg\nbg.png\n::sprite\n0x0\na.png\n::music\ntheme.ogg\n::text\nHi",
    )]);
    rt.start("s.script").unwrap();
    assert_eq!(rt.backend().live_handle_count(), 3);

    rt.shutdown();
    assert_eq!(rt.backend().live_handle_count(), 0);
    assert_eq!(rt.caches().total_entries(), 0);

    // 重复调用与 Drop 不会再次释放
    rt.shutdown();
}

// -------------------------------------------------------------------------
// 存档
// -------------------------------------------------------------------------

#[test]
fn test_save_and_load_round_trip() {
    let scenes = [(
        "s.script",
        "::bg\nbg.png\n::music\ntheme.ogg\n::text\nOne\n\n::text\nTwo\n\n::text\nThree",
    )];
    let mut rt = runtime(&scenes);
    rt.start("s.script").unwrap();
    rt.frame(Some(RuntimeInput::Advance)).unwrap();

    let data = rt.save_data(SaveMetadata::new(3));
    assert_eq!(data.metadata.scene.as_deref(), Some("assets/scenes/s.script"));
    let json = data.to_json().unwrap();

    let mut loaded = runtime(&scenes);
    let data = crate::save::SaveData::from_json(&json).unwrap();
    assert_eq!(loaded.load_save(data).unwrap(), ScenePhase::AwaitingAdvance);
    assert_eq!(text(&loaded), Some("Two"));
    assert!(loaded.state().has_background());
    assert_eq!(
        loaded.backend().playing,
        Some(loaded.state().music.as_ref().unwrap().handle)
    );
    assert_eq!(loaded.stack().len(), 1);

    loaded.frame(Some(RuntimeInput::Advance)).unwrap();
    assert_eq!(text(&loaded), Some("Three"));
    loaded.frame(Some(RuntimeInput::StepBack)).unwrap();
    loaded.frame(Some(RuntimeInput::StepBack)).unwrap();
    assert_eq!(text(&loaded), Some("One"));
}

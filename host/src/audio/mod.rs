//! # Audio 模块
//!
//! 无设备的音乐播放时钟。
//!
//! 音频流由 [`crate::resources::MediaStore`] 用 rodio 解码，这里只维护
//! 当前播放的音乐句柄、播放位置和音量，Runtime 通过 `is_music_playing`
//! 查询它。
//!
//! ## 功能特性
//!
//! - 同一时间只有一首音乐在播放
//! - 播放到结尾后按配置循环或停止
//! - 音量控制：主音量 × 分类音量，静音时为 0

use crate::config::AudioConfig;
use scene_runtime::MusicHandle;

/// 当前播放状态
#[derive(Debug, Clone, Copy, PartialEq)]
struct Playback {
    handle: MusicHandle,
    /// 播放位置（秒）
    position: f32,
    /// 音乐总时长（解码器无法给出时为 None）
    duration: Option<f32>,
}

/// 音乐播放器
#[derive(Debug, Clone)]
pub struct MusicPlayer {
    current: Option<Playback>,
    paused: bool,
    looping: bool,
    master_volume: f32,
    music_volume: f32,
    sound_volume: f32,
    muted: bool,
}

impl MusicPlayer {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            current: None,
            paused: false,
            looping: config.loop_music,
            master_volume: config.master_volume.clamp(0.0, 1.0),
            music_volume: config.music_volume.clamp(0.0, 1.0),
            sound_volume: config.sound_volume.clamp(0.0, 1.0),
            muted: config.muted,
        }
    }

    /// 从头播放，替换当前音乐
    pub fn play(&mut self, handle: MusicHandle, duration: Option<f32>) {
        if let Some(previous) = self.current
            && previous.handle != handle
        {
            tracing::debug!(previous = previous.handle.0, next = handle.0, "切换音乐");
        }
        self.current = Some(Playback {
            handle,
            position: 0.0,
            duration,
        });
        self.paused = false;
    }

    /// 停止播放；句柄不是当前音乐时返回 false
    pub fn stop(&mut self, handle: MusicHandle) -> bool {
        if self.current.map(|p| p.handle) == Some(handle) {
            self.current = None;
            true
        } else {
            false
        }
    }

    /// 跳转到指定秒数
    pub fn seek(&mut self, handle: MusicHandle, seconds: f32) {
        let looping = self.looping;
        if let Some(playback) = self.current.as_mut()
            && playback.handle == handle
        {
            playback.position = seconds.max(0.0);
            if Self::wrap(playback, looping) {
                self.current = None;
            }
        }
    }

    /// 推进播放时钟
    pub fn advance(&mut self, handle: MusicHandle, dt: f32) {
        if self.paused {
            return;
        }
        let looping = self.looping;
        if let Some(playback) = self.current.as_mut()
            && playback.handle == handle
        {
            playback.position += dt.max(0.0);
            if Self::wrap(playback, looping) {
                tracing::debug!(handle = handle.0, "音乐播放结束");
                self.current = None;
            }
        }
    }

    /// 处理越过结尾的位置，返回是否已播放结束
    fn wrap(playback: &mut Playback, looping: bool) -> bool {
        match playback.duration {
            Some(duration) if duration > 0.0 && playback.position >= duration => {
                if looping {
                    playback.position %= duration;
                    false
                } else {
                    true
                }
            }
            _ => false,
        }
    }

    pub fn is_playing(&self, handle: MusicHandle) -> bool {
        self.current.map(|p| p.handle) == Some(handle)
    }

    /// 当前播放的音乐
    pub fn current(&self) -> Option<MusicHandle> {
        self.current.map(|p| p.handle)
    }

    /// 指定音乐的播放位置
    pub fn position(&self, handle: MusicHandle) -> Option<f32> {
        self.current
            .filter(|p| p.handle == handle)
            .map(|p| p.position)
    }

    /// 暂停/恢复播放时钟
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_music_volume(&mut self, volume: f32) {
        self.music_volume = volume.clamp(0.0, 1.0);
    }

    pub fn set_sound_volume(&mut self, volume: f32) {
        self.sound_volume = volume.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn toggle_mute(&mut self) {
        self.set_muted(!self.muted);
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// 有效音乐音量（考虑主音量与静音）
    pub fn effective_music_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.music_volume
        }
    }

    /// 有效音效音量（考虑主音量与静音）
    pub fn effective_sound_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sound_volume
        }
    }
}

impl Default for MusicPlayer {
    fn default() -> Self {
        Self::new(&AudioConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: MusicHandle = MusicHandle(1);
    const B: MusicHandle = MusicHandle(2);

    fn player(looping: bool) -> MusicPlayer {
        MusicPlayer::new(&AudioConfig {
            loop_music: looping,
            ..AudioConfig::default()
        })
    }

    #[test]
    fn test_play_replaces_current() {
        let mut player = player(true);
        player.play(A, Some(10.0));
        assert!(player.is_playing(A));

        player.play(B, None);
        assert!(!player.is_playing(A));
        assert!(player.is_playing(B));
        assert_eq!(player.current(), Some(B));
    }

    #[test]
    fn test_stop_only_current() {
        let mut player = player(true);
        player.play(A, None);
        assert!(!player.stop(B));
        assert!(player.is_playing(A));
        assert!(player.stop(A));
        assert_eq!(player.current(), None);
    }

    #[test]
    fn test_advance_and_loop() {
        let mut player = player(true);
        player.play(A, Some(2.0));
        player.advance(A, 1.5);
        assert_eq!(player.position(A), Some(1.5));

        player.advance(A, 1.0);
        assert!(player.is_playing(A));
        assert_eq!(player.position(A), Some(0.5));

        // 其他句柄的推进不影响当前音乐
        player.advance(B, 1.0);
        assert_eq!(player.position(A), Some(0.5));
    }

    #[test]
    fn test_non_looping_music_ends() {
        let mut player = player(false);
        player.play(A, Some(2.0));
        player.advance(A, 2.5);
        assert!(!player.is_playing(A));
    }

    #[test]
    fn test_unknown_duration_never_ends() {
        let mut player = player(false);
        player.play(A, None);
        player.advance(A, 10_000.0);
        assert!(player.is_playing(A));
    }

    #[test]
    fn test_seek_and_pause() {
        let mut player = player(true);
        player.play(A, Some(60.0));
        player.seek(A, 12.0);
        assert_eq!(player.position(A), Some(12.0));

        player.set_paused(true);
        player.advance(A, 5.0);
        assert_eq!(player.position(A), Some(12.0));

        player.set_paused(false);
        player.advance(A, 5.0);
        assert_eq!(player.position(A), Some(17.0));

        player.seek(A, -3.0);
        assert_eq!(player.position(A), Some(0.0));
    }

    #[test]
    fn test_effective_volume() {
        let mut player = MusicPlayer::new(&AudioConfig {
            master_volume: 0.5,
            music_volume: 0.5,
            sound_volume: 1.0,
            ..AudioConfig::default()
        });
        assert_eq!(player.effective_music_volume(), 0.25);
        assert_eq!(player.effective_sound_volume(), 0.5);

        player.set_music_volume(1.5);
        assert_eq!(player.effective_music_volume(), 0.5);

        player.toggle_mute();
        assert_eq!(player.effective_music_volume(), 0.0);
        assert_eq!(player.effective_sound_volume(), 0.0);
    }
}

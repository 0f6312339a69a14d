//! 单元测试用的后端与场景来源。
//!
//! `RecordingBackend` 记录每个句柄的生命周期；重复释放或使用已释放的句柄会直接 panic。

use std::collections::{HashMap, HashSet};

use crate::backend::{MediaBackend, MusicHandle, SceneSource, TextureHandle};
use crate::error::{AssetKind, BridgeError, ScriptLoadError};

#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: u64,
    textures: HashMap<u64, String>,
    music: HashMap<u64, String>,
    released_textures: HashSet<u64>,
    released_music: HashSet<u64>,
    failing: HashSet<String>,
    loads: Vec<String>,
    pub playing: Option<MusicHandle>,
    pub seeks: Vec<(MusicHandle, f32)>,
    pub stopped: Vec<MusicHandle>,
    pub sounds: Vec<String>,
    pub music_updates: usize,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// 之后对该路径的加载都失败
    pub fn fail_on(&mut self, path: &str) {
        self.failing.insert(path.to_string());
    }

    /// 某路径被真正加载的次数
    pub fn texture_loads(&self, path: &str) -> usize {
        self.loads.iter().filter(|p| p.as_str() == path).count()
    }

    pub fn total_loads(&self) -> usize {
        self.loads.len()
    }

    pub fn is_texture_released(&self, handle: TextureHandle) -> bool {
        self.released_textures.contains(&handle.0)
    }

    pub fn is_music_released(&self, handle: MusicHandle) -> bool {
        self.released_music.contains(&handle.0)
    }

    pub fn is_texture_live(&self, handle: TextureHandle) -> bool {
        self.textures.contains_key(&handle.0)
    }

    pub fn is_music_live(&self, handle: MusicHandle) -> bool {
        self.music.contains_key(&handle.0)
    }

    /// 尚未释放的句柄数
    pub fn live_handle_count(&self) -> usize {
        self.textures.len() + self.music.len()
    }

    fn issue(&mut self, path: &str, kind: AssetKind) -> Result<u64, BridgeError> {
        if self.failing.contains(path) {
            return Err(BridgeError::asset_load(kind, path, "file not found"));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.loads.push(path.to_string());
        Ok(id)
    }

    fn assert_music_live(&self, handle: MusicHandle) {
        assert!(
            self.music.contains_key(&handle.0),
            "使用了已释放或未知的音乐句柄 {:?}",
            handle
        );
    }
}

impl MediaBackend for RecordingBackend {
    fn load_texture(&mut self, path: &str) -> Result<TextureHandle, BridgeError> {
        let id = self.issue(path, AssetKind::Background)?;
        self.textures.insert(id, path.to_string());
        Ok(TextureHandle(id))
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        assert!(
            self.textures.remove(&handle.0).is_some(),
            "重复释放纹理句柄 {:?}",
            handle
        );
        self.released_textures.insert(handle.0);
    }

    fn load_music(&mut self, path: &str) -> Result<MusicHandle, BridgeError> {
        let id = self.issue(path, AssetKind::Music)?;
        self.music.insert(id, path.to_string());
        Ok(MusicHandle(id))
    }

    fn release_music(&mut self, handle: MusicHandle) {
        assert!(
            self.music.remove(&handle.0).is_some(),
            "重复释放音乐句柄 {:?}",
            handle
        );
        assert_ne!(self.playing, Some(handle), "释放了正在播放的音乐");
        self.released_music.insert(handle.0);
    }

    fn play_music(&mut self, handle: MusicHandle) {
        self.assert_music_live(handle);
        self.playing = Some(handle);
    }

    fn stop_music(&mut self, handle: MusicHandle) {
        self.assert_music_live(handle);
        if self.playing == Some(handle) {
            self.playing = None;
        }
        self.stopped.push(handle);
    }

    fn seek_music(&mut self, handle: MusicHandle, seconds: f32) {
        self.assert_music_live(handle);
        self.seeks.push((handle, seconds));
    }

    fn is_music_playing(&self, handle: MusicHandle) -> bool {
        self.playing == Some(handle)
    }

    fn update_music(&mut self, handle: MusicHandle) {
        self.assert_music_live(handle);
        self.music_updates += 1;
    }

    fn play_sound(&mut self, path: &str) -> Result<(), BridgeError> {
        if self.failing.contains(path) {
            return Err(BridgeError::asset_load(AssetKind::Sound, path, "file not found"));
        }
        self.sounds.push(path.to_string());
        Ok(())
    }
}

/// 内存中的场景脚本
#[derive(Debug, Default)]
pub struct MemoryScenes {
    scenes: HashMap<String, String>,
}

impl MemoryScenes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, text: &str) -> Self {
        self.scenes.insert(path.to_string(), text.to_string());
        self
    }
}

impl SceneSource for MemoryScenes {
    fn read_scene(&self, path: &str) -> Result<String, ScriptLoadError> {
        self.scenes
            .get(path)
            .cloned()
            .ok_or_else(|| ScriptLoadError::NotFound {
                path: path.to_string(),
            })
    }
}

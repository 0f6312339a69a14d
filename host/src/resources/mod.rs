//! # Resources 模块
//!
//! 资源管理系统：从 [`ResourceSource`] 读取字节，解码图片与音频，
//! 以不透明句柄的形式交给 Runtime。
//!
//! Runtime 的两个能力接口：
//!
//! - [`MediaStore`] 实现 [`MediaBackend`]：纹理/音乐句柄的加载、释放、播放
//! - [`ScriptSource`] 实现 [`SceneSource`]：场景脚本文本
//!
//! 缓存与驱逐由 Runtime 的 LRU 缓存决定，这里只维护句柄表。

use crate::audio::MusicPlayer;
use crate::config::AudioConfig;
use rodio::{Decoder, Source};
use scene_runtime::{
    AssetKind, BridgeError, MediaBackend, MusicHandle, SceneSource, ScriptLoadError,
    TextureHandle,
};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

mod error;
mod source;

pub use error::ResourceError;
pub use source::{FsSource, ResourceSource, ZipSource};

/// 默认帧时间（秒）
pub const DEFAULT_FRAME_DT: f32 = 1.0 / 60.0;

/// 已解码的纹理
#[derive(Debug, Clone, PartialEq)]
pub struct TextureInfo {
    /// 逻辑路径
    pub path: String,
    pub width: u32,
    pub height: u32,
    /// RGBA8 像素数据
    pub pixels: Vec<u8>,
}

impl TextureInfo {
    /// 估算显存占用（字节）
    pub fn size_bytes(&self) -> usize {
        self.pixels.len()
    }
}

/// 已解码的音乐流
#[derive(Debug, Clone, PartialEq)]
pub struct MusicInfo {
    /// 逻辑路径
    pub path: String,
    /// 总时长（秒）
    pub duration: Option<f32>,
}

/// 句柄统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaStats {
    pub live_textures: usize,
    pub live_music: usize,
    pub texture_bytes: usize,
    pub textures_loaded: u64,
    pub textures_released: u64,
    pub music_loaded: u64,
    pub music_released: u64,
    pub sounds_played: u64,
}

impl MediaStats {
    /// 格式化统计信息
    pub fn format(&self) -> String {
        format!(
            "Textures: {} live ({:.1} KB), {} loaded / {} released\n\
             Music: {} live, {} loaded / {} released\n\
             Sounds played: {}",
            self.live_textures,
            self.texture_bytes as f64 / 1024.0,
            self.textures_loaded,
            self.textures_released,
            self.live_music,
            self.music_loaded,
            self.music_released,
            self.sounds_played,
        )
    }
}

/// 媒体存储
///
/// 句柄从 1 开始递增分配，不会复用。
pub struct MediaStore {
    source: Arc<dyn ResourceSource>,
    textures: HashMap<TextureHandle, TextureInfo>,
    music: HashMap<MusicHandle, MusicInfo>,
    player: MusicPlayer,
    next_id: u64,
    /// 每次 `update_music` 推进的时长
    frame_dt: f32,
    stats: MediaStats,
}

impl MediaStore {
    pub fn new(source: Arc<dyn ResourceSource>, audio: &AudioConfig) -> Self {
        Self {
            source,
            textures: HashMap::new(),
            music: HashMap::new(),
            player: MusicPlayer::new(audio),
            next_id: 1,
            frame_dt: DEFAULT_FRAME_DT,
            stats: MediaStats::default(),
        }
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// 读取资源字节，错误转换为 BridgeError
    fn read_asset(&self, kind: AssetKind, path: &str) -> Result<Vec<u8>, BridgeError> {
        self.source
            .read(path)
            .map_err(|e| BridgeError::asset_load(kind, path, e))
    }

    /// 设置帧时间
    pub fn set_frame_dt(&mut self, dt: f32) {
        self.frame_dt = dt.max(0.0);
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&TextureInfo> {
        self.textures.get(&handle)
    }

    pub fn music_info(&self, handle: MusicHandle) -> Option<&MusicInfo> {
        self.music.get(&handle)
    }

    pub fn player(&self) -> &MusicPlayer {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut MusicPlayer {
        &mut self.player
    }

    pub fn source(&self) -> &dyn ResourceSource {
        self.source.as_ref()
    }

    /// 共享同一资源来源的场景读取器
    pub fn script_source(&self) -> ScriptSource {
        ScriptSource::new(Arc::clone(&self.source))
    }

    /// 获取统计信息
    pub fn stats(&self) -> MediaStats {
        MediaStats {
            live_textures: self.textures.len(),
            live_music: self.music.len(),
            texture_bytes: self.textures.values().map(TextureInfo::size_bytes).sum(),
            ..self.stats
        }
    }
}

/// 解码图片为 RGBA8
pub fn decode_image(
    kind: AssetKind,
    path: &str,
    bytes: &[u8],
) -> Result<TextureInfo, ResourceError> {
    let img = image::load_from_memory(bytes).map_err(|e| ResourceError::decode(kind, path, e))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(TextureInfo {
        path: path.to_string(),
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

/// 解码音频流头部，返回总时长
pub fn probe_audio(
    kind: AssetKind,
    path: &str,
    bytes: Vec<u8>,
) -> Result<Option<f32>, ResourceError> {
    let decoder =
        Decoder::new(Cursor::new(bytes)).map_err(|e| ResourceError::decode(kind, path, e))?;
    Ok(decoder.total_duration().map(|d| d.as_secs_f32()))
}

impl MediaBackend for MediaStore {
    fn load_texture(&mut self, path: &str) -> Result<TextureHandle, BridgeError> {
        let bytes = self.read_asset(AssetKind::Background, path)?;
        let info = decode_image(AssetKind::Background, path, &bytes)
            .map_err(|e| BridgeError::asset_load(AssetKind::Background, path, e))?;

        let handle = TextureHandle(self.allocate_id());
        tracing::debug!(
            path = %path,
            handle = handle.0,
            width = info.width,
            height = info.height,
            "纹理已加载"
        );
        self.textures.insert(handle, info);
        self.stats.textures_loaded += 1;
        Ok(handle)
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        match self.textures.remove(&handle) {
            Some(info) => {
                tracing::debug!(path = %info.path, handle = handle.0, "纹理已释放");
                self.stats.textures_released += 1;
            }
            None => tracing::warn!(handle = handle.0, "释放未知纹理句柄"),
        }
    }

    fn load_music(&mut self, path: &str) -> Result<MusicHandle, BridgeError> {
        let bytes = self.read_asset(AssetKind::Music, path)?;
        let duration = probe_audio(AssetKind::Music, path, bytes)
            .map_err(|e| BridgeError::asset_load(AssetKind::Music, path, e))?;

        let handle = MusicHandle(self.allocate_id());
        tracing::debug!(path = %path, handle = handle.0, duration = ?duration, "音乐已加载");
        self.music.insert(
            handle,
            MusicInfo {
                path: path.to_string(),
                duration,
            },
        );
        self.stats.music_loaded += 1;
        Ok(handle)
    }

    fn release_music(&mut self, handle: MusicHandle) {
        match self.music.remove(&handle) {
            Some(info) => {
                if self.player.stop(handle) {
                    tracing::warn!(path = %info.path, "释放了正在播放的音乐");
                }
                tracing::debug!(path = %info.path, handle = handle.0, "音乐已释放");
                self.stats.music_released += 1;
            }
            None => tracing::warn!(handle = handle.0, "释放未知音乐句柄"),
        }
    }

    fn play_music(&mut self, handle: MusicHandle) {
        match self.music.get(&handle) {
            Some(info) => {
                tracing::info!(
                    path = %info.path,
                    volume = self.player.effective_music_volume(),
                    "播放音乐"
                );
                self.player.play(handle, info.duration);
            }
            None => tracing::warn!(handle = handle.0, "播放未知音乐句柄"),
        }
    }

    fn stop_music(&mut self, handle: MusicHandle) {
        self.player.stop(handle);
    }

    fn seek_music(&mut self, handle: MusicHandle, seconds: f32) {
        self.player.seek(handle, seconds);
    }

    fn is_music_playing(&self, handle: MusicHandle) -> bool {
        self.player.is_playing(handle)
    }

    fn update_music(&mut self, handle: MusicHandle) {
        self.player.advance(handle, self.frame_dt);
    }

    fn play_sound(&mut self, path: &str) -> Result<(), BridgeError> {
        let bytes = self.read_asset(AssetKind::Sound, path)?;
        let duration = probe_audio(AssetKind::Sound, path, bytes)
            .map_err(|e| BridgeError::asset_load(AssetKind::Sound, path, e))?;

        tracing::debug!(
            path = %path,
            duration = ?duration,
            volume = self.player.effective_sound_volume(),
            "播放音效"
        );
        self.stats.sounds_played += 1;
        Ok(())
    }
}

/// 读取场景脚本文本
pub fn read_scene_text(source: &dyn ResourceSource, path: &str) -> Result<String, ScriptLoadError> {
    let text = source.read(path).and_then(|bytes| {
        String::from_utf8(bytes).map_err(|_| ResourceError::InvalidText {
            path: path.to_string(),
        })
    });

    text.map_err(|e| match e {
        ResourceError::NotFound { .. } => ScriptLoadError::NotFound {
            path: path.to_string(),
        },
        other => ScriptLoadError::Read {
            path: path.to_string(),
            message: other.to_string(),
        },
    })
}

/// 场景脚本来源
///
/// Runtime 独占 `MediaStore` 作为后端，场景读取通过同一个
/// [`ResourceSource`] 的共享引用完成。
#[derive(Clone)]
pub struct ScriptSource {
    source: Arc<dyn ResourceSource>,
}

impl ScriptSource {
    pub fn new(source: Arc<dyn ResourceSource>) -> Self {
        Self { source }
    }
}

impl SceneSource for ScriptSource {
    fn read_scene(&self, path: &str) -> Result<String, ScriptLoadError> {
        read_scene_text(self.source.as_ref(), path)
    }
}

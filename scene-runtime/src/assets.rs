//! # Assets 模块
//!
//! 三类资源（背景、立绘、音乐）各自独立的 LRU 缓存。
//!
//! 所有获取都走同一个模式：缓存 `lookup`，未命中则通过 [`MediaBackend`]
//! 加载并 `insert`。缓存是唯一会调用 `release_*` 的地方。

use tracing::{debug, info};

use crate::backend::{MediaBackend, MusicHandle, TextureHandle};
use crate::cache::{CacheStats, LruCache};
use crate::config::RuntimeConfig;
use crate::error::{AssetKind, BridgeError};
use crate::state::GameState;

/// 资源缓存集合
#[derive(Debug)]
pub struct AssetCaches {
    backgrounds: LruCache<String, TextureHandle>,
    sprites: LruCache<String, TextureHandle>,
    music: LruCache<String, MusicHandle>,
}

/// 三类缓存的统计信息
#[derive(Debug, Clone)]
pub struct AssetCacheStats {
    pub backgrounds: CacheStats,
    pub sprites: CacheStats,
    pub music: CacheStats,
}

impl AssetCacheStats {
    /// 格式化为日志字符串
    pub fn format(&self) -> String {
        format!(
            "背景 [{}] 立绘 [{}] 音乐 [{}]",
            self.backgrounds.format(),
            self.sprites.format(),
            self.music.format()
        )
    }
}

impl AssetCaches {
    /// 按配置的容量创建缓存
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            backgrounds: LruCache::new(config.background_cache_capacity),
            sprites: LruCache::new(config.sprite_cache_capacity),
            music: LruCache::new(config.music_cache_capacity),
        }
    }

    /// 按新配置调整三个缓存的容量
    ///
    /// 不立即驱逐，超出的条目在下一次 `sweep` 时释放。
    pub fn resize(&mut self, config: &RuntimeConfig) {
        self.backgrounds.set_capacity(config.background_cache_capacity);
        self.sprites.set_capacity(config.sprite_cache_capacity);
        self.music.set_capacity(config.music_cache_capacity);
    }

    /// 获取背景纹理
    pub fn acquire_background(
        &mut self,
        path: &str,
        backend: &mut dyn MediaBackend,
    ) -> Result<TextureHandle, BridgeError> {
        acquire_texture(&mut self.backgrounds, AssetKind::Background, path, backend)
    }

    /// 获取立绘纹理
    pub fn acquire_sprite(
        &mut self,
        path: &str,
        backend: &mut dyn MediaBackend,
    ) -> Result<TextureHandle, BridgeError> {
        acquire_texture(&mut self.sprites, AssetKind::Sprite, path, backend)
    }

    /// 获取音乐流
    pub fn acquire_music(
        &mut self,
        path: &str,
        backend: &mut dyn MediaBackend,
    ) -> Result<MusicHandle, BridgeError> {
        if let Some(&handle) = self.music.lookup(path) {
            debug!(path = %path, "音乐缓存命中");
            return Ok(handle);
        }

        let handle = backend
            .load_music(path)
            .map_err(|e| retag(e, AssetKind::Music))?;
        if let Some(old) = self.music.insert(path.to_string(), handle) {
            backend.release_music(old);
        }
        debug!(path = %path, "音乐已加载");
        Ok(handle)
    }

    /// 立即移除立绘缓存条目并释放
    ///
    /// 返回条目是否存在。
    pub fn remove_sprite(&mut self, path: &str, backend: &mut dyn MediaBackend) -> bool {
        match self.sprites.remove(path) {
            Some(handle) => {
                backend.release_texture(handle);
                debug!(path = %path, "立绘缓存条目已移除");
                true
            }
            None => false,
        }
    }

    /// 驱逐超出容量的条目
    ///
    /// 当前 GameState 引用的 key 被固定，不会被驱逐。
    /// 返回被释放的条目数。
    pub fn sweep(&mut self, live: &GameState, backend: &mut dyn MediaBackend) -> usize {
        let background = live.background.as_ref().map(|b| b.path.as_str());
        let music = live.music.as_ref().map(|m| m.path.as_str());

        let mut released = 0;

        for (path, handle) in self
            .backgrounds
            .evict_excess(|key| Some(key.as_str()) == background)
        {
            debug!(path = %path, "驱逐背景");
            backend.release_texture(handle);
            released += 1;
        }

        for (path, handle) in self
            .sprites
            .evict_excess(|key| live.sprite_paths().any(|p| p == key.as_str()))
        {
            debug!(path = %path, "驱逐立绘");
            backend.release_texture(handle);
            released += 1;
        }

        for (path, handle) in self.music.evict_excess(|key| Some(key.as_str()) == music) {
            debug!(path = %path, "驱逐音乐");
            backend.release_music(handle);
            released += 1;
        }

        released
    }

    /// 释放所有缓存条目（退出时调用）
    pub fn release_all(&mut self, backend: &mut dyn MediaBackend) -> usize {
        let mut released = 0;
        for (_, handle) in self.backgrounds.drain() {
            backend.release_texture(handle);
            released += 1;
        }
        for (_, handle) in self.sprites.drain() {
            backend.release_texture(handle);
            released += 1;
        }
        for (_, handle) in self.music.drain() {
            backend.release_music(handle);
            released += 1;
        }
        if released > 0 {
            info!(released, "资源缓存已清空");
        }
        released
    }

    pub fn backgrounds(&self) -> &LruCache<String, TextureHandle> {
        &self.backgrounds
    }

    pub fn sprites(&self) -> &LruCache<String, TextureHandle> {
        &self.sprites
    }

    pub fn music(&self) -> &LruCache<String, MusicHandle> {
        &self.music
    }

    /// 缓存中的条目总数
    pub fn total_entries(&self) -> usize {
        self.backgrounds.len() + self.sprites.len() + self.music.len()
    }

    pub fn stats(&self) -> AssetCacheStats {
        AssetCacheStats {
            backgrounds: self.backgrounds.stats(),
            sprites: self.sprites.stats(),
            music: self.music.stats(),
        }
    }
}

fn acquire_texture(
    cache: &mut LruCache<String, TextureHandle>,
    kind: AssetKind,
    path: &str,
    backend: &mut dyn MediaBackend,
) -> Result<TextureHandle, BridgeError> {
    if let Some(&handle) = cache.lookup(path) {
        debug!(kind = %kind, path = %path, "纹理缓存命中");
        return Ok(handle);
    }

    let handle = backend.load_texture(path).map_err(|e| retag(e, kind))?;
    if let Some(old) = cache.insert(path.to_string(), handle) {
        backend.release_texture(old);
    }
    debug!(kind = %kind, path = %path, "纹理已加载");
    Ok(handle)
}

/// 后端不知道资源用途，这里补上资源类别
fn retag(error: BridgeError, kind: AssetKind) -> BridgeError {
    match error {
        BridgeError::AssetLoad { path, message, .. } => BridgeError::AssetLoad {
            kind,
            path,
            message,
        },
        other => other,
    }
}

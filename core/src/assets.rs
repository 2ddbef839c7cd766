//! Façade over the external asset loader.
//!
//! Archive extraction and decoding happen outside the simulation. The world
//! only asks for opaque handles by name and degrades gracefully when a fetch
//! fails.

use std::collections::HashMap;

use thiserror::Error;

/// Opaque handle to a decoded sprite sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteHandle(u32);

impl SpriteHandle {
    /// Creates a new sprite handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Opaque handle to a decoded audio buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundHandle(u32);

impl SoundHandle {
    /// Creates a new sound handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Failures reported by an [`AssetSource`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AssetError {
    /// The archive does not contain an asset with the provided name.
    #[error("asset `{0}` not found")]
    Missing(String),
    /// The asset exists but could not be decoded.
    #[error("asset `{name}` could not be decoded: {reason}")]
    Decode {
        /// Name of the asset.
        name: String,
        /// Decoder diagnostic.
        reason: String,
    },
}

/// Loader that resolves asset names into handles.
pub trait AssetSource {
    /// Resolves a sprite sheet by name.
    fn fetch_sprite(&mut self, name: &str) -> Result<SpriteHandle, AssetError>;

    /// Resolves an audio buffer by name.
    fn fetch_sound(&mut self, name: &str) -> Result<SoundHandle, AssetError>;
}

/// Source that fails every request, leaving entities invisible and silent.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAssets;

impl AssetSource for NoAssets {
    fn fetch_sprite(&mut self, name: &str) -> Result<SpriteHandle, AssetError> {
        Err(AssetError::Missing(name.to_owned()))
    }

    fn fetch_sound(&mut self, name: &str) -> Result<SoundHandle, AssetError> {
        Err(AssetError::Missing(name.to_owned()))
    }
}

/// Source that hands out sequential handles for every name it is asked for.
///
/// Headless runs and tests use it where any resolvable asset will do.
#[derive(Clone, Debug, Default)]
pub struct CatalogAssets {
    sprites: HashMap<String, SpriteHandle>,
    sounds: HashMap<String, SoundHandle>,
}

impl AssetSource for CatalogAssets {
    fn fetch_sprite(&mut self, name: &str) -> Result<SpriteHandle, AssetError> {
        let next = SpriteHandle::new(self.sprites.len() as u32);
        Ok(*self.sprites.entry(name.to_owned()).or_insert(next))
    }

    fn fetch_sound(&mut self, name: &str) -> Result<SoundHandle, AssetError> {
        let next = SoundHandle::new(self.sounds.len() as u32);
        Ok(*self.sounds.entry(name.to_owned()).or_insert(next))
    }
}

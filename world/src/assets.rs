//! Session-scoped memoisation of asset lookups.

use std::{collections::HashMap, fmt};

use skirmish_core::{AssetSource, SoundHandle, SpriteHandle};
use tracing::warn;

/// Caches sprite and sound handles by name for the lifetime of a session.
///
/// Failed lookups are cached as well so a missing asset is reported once and
/// the entity continues without it.
pub struct AssetCache {
    source: Box<dyn AssetSource>,
    sprites: HashMap<String, Option<SpriteHandle>>,
    sounds: HashMap<String, Option<SoundHandle>>,
}

impl AssetCache {
    /// Wraps the provided loader with an empty cache.
    #[must_use]
    pub fn new(source: Box<dyn AssetSource>) -> Self {
        Self {
            source,
            sprites: HashMap::new(),
            sounds: HashMap::new(),
        }
    }

    /// Resolves a sprite, degrading to `None` when the loader fails.
    pub fn sprite(&mut self, name: &str) -> Option<SpriteHandle> {
        if let Some(cached) = self.sprites.get(name) {
            return *cached;
        }

        let handle = match self.source.fetch_sprite(name) {
            Ok(handle) => Some(handle),
            Err(error) => {
                warn!(%error, "sprite unavailable, entity will be invisible");
                None
            }
        };
        let _ = self.sprites.insert(name.to_owned(), handle);
        handle
    }

    /// Resolves a sound, degrading to `None` when the loader fails.
    pub fn sound(&mut self, name: &str) -> Option<SoundHandle> {
        if let Some(cached) = self.sounds.get(name) {
            return *cached;
        }

        let handle = match self.source.fetch_sound(name) {
            Ok(handle) => Some(handle),
            Err(error) => {
                warn!(%error, "sound unavailable, cue will be silent");
                None
            }
        };
        let _ = self.sounds.insert(name.to_owned(), handle);
        handle
    }

    /// Number of cached entries, including failed lookups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sprites.len() + self.sounds.len()
    }

    /// Reports whether nothing has been looked up since the last clear.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every cached handle.
    pub fn clear(&mut self) {
        self.sprites.clear();
        self.sounds.clear();
    }
}

impl fmt::Debug for AssetCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetCache")
            .field("sprites", &self.sprites.len())
            .field("sounds", &self.sounds.len())
            .finish_non_exhaustive()
    }
}

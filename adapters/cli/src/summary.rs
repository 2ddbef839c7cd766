//! Running tally of the events a battle produced.

use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
};

use skirmish_core::Event;

/// Aggregated outcome of a headless battle.
#[derive(Clone, Debug, Default)]
pub(crate) struct BattleSummary {
    ticks: u64,
    spawned: usize,
    destroyed: usize,
    rejected: usize,
    shots: usize,
    damage: u64,
    missing_paths: usize,
    cues: usize,
    hasher: DefaultHasher,
}

impl BattleSummary {
    pub(crate) fn record(&mut self, events: &[Event]) {
        for event in events {
            format!("{event:?}").hash(&mut self.hasher);
            match event {
                Event::TimeAdvanced { tick } => self.ticks = *tick,
                Event::EntitySpawned { .. } => self.spawned += 1,
                Event::EntityDestroyed { .. } => self.destroyed += 1,
                Event::PlacementRejected { .. } => self.rejected += 1,
                Event::WeaponFired { .. } => self.shots += 1,
                Event::EntityDamaged { amount, .. } => self.damage += u64::from(*amount),
                Event::PathNotFound { .. } => self.missing_paths += 1,
                Event::SoundCue { .. } => self.cues += 1,
                _ => {}
            }
        }
    }

    pub(crate) fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Hash of every recorded event, stable for identical runs.
    ///
    /// The hash covers the `Debug` rendering of each event and uses
    /// `DefaultHasher`, so it is only comparable between runs of the same
    /// build. Neither is guaranteed across toolchain versions.
    pub(crate) fn fingerprint(&self) -> u64 {
        self.hasher.finish()
    }
}

impl fmt::Display for BattleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ticks={} spawned={} destroyed={} rejected={} shots={} damage={} no_path={} cues={} fingerprint={:#018x}",
            self.ticks,
            self.spawned,
            self.destroyed,
            self.rejected,
            self.shots,
            self.damage,
            self.missing_paths,
            self.cues,
            self.fingerprint(),
        )
    }
}

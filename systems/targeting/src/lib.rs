#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that picks reactive targets for idle armed entities.

use glam::Vec2;
use skirmish_core::{EntityId, CELL_SIZE};

/// Idle armed entity looking for something to shoot at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Seeker {
    /// Handle of the seeking entity.
    pub id: EntityId,
    /// World-space centre of the seeker.
    pub center: Vec2,
    /// Team of the seeker's owner.
    pub team: u8,
    /// Weapon reach measured in cells.
    pub range_cells: f32,
}

/// Entity that may be chosen as a target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    /// Handle of the candidate.
    pub id: EntityId,
    /// World-space centre of the candidate.
    pub center: Vec2,
    /// Team of the candidate's owner; neutral entities carry none.
    pub team: Option<u8>,
}

/// Target chosen for a seeker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Acquisition {
    /// Seeker that acquired the target.
    pub seeker: EntityId,
    /// Entity the seeker should attack.
    pub target: EntityId,
}

/// Targeting system that reuses a scratch buffer to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TargetAcquisition {
    hostile: Vec<Candidate>,
}

impl TargetAcquisition {
    /// Creates a new targeting system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the nearest hostile candidate within range to every seeker.
    ///
    /// Neutral candidates are never acquired. Ties on distance prefer the
    /// smaller entity handle. The output buffer is cleared first.
    pub fn handle(&mut self, seekers: &[Seeker], candidates: &[Candidate], out: &mut Vec<Acquisition>) {
        out.clear();

        if seekers.is_empty() || candidates.is_empty() {
            return;
        }

        for seeker in seekers {
            self.hostile.clear();
            self.hostile.extend(
                candidates
                    .iter()
                    .filter(|candidate| candidate.id != seeker.id)
                    .filter(|candidate| candidate.team.is_some_and(|team| team != seeker.team)),
            );

            let range = seeker.range_cells * CELL_SIZE;
            let max_distance_sq = range * range;

            let mut best: Option<BestCandidate> = None;
            for candidate in &self.hostile {
                let distance_sq = candidate.center.distance_squared(seeker.center);
                if distance_sq > max_distance_sq {
                    continue;
                }

                let current = BestCandidate {
                    distance_sq,
                    id: candidate.id,
                };
                match &mut best {
                    Some(existing) => {
                        if current.precedes(existing) {
                            *existing = current;
                        }
                    }
                    None => best = Some(current),
                }
            }

            if let Some(best) = best {
                out.push(Acquisition {
                    seeker: seeker.id,
                    target: best.id,
                });
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BestCandidate {
    distance_sq: f32,
    id: EntityId,
}

impl BestCandidate {
    fn precedes(&self, other: &Self) -> bool {
        if self.distance_sq != other.distance_sq {
            return self.distance_sq < other.distance_sq;
        }

        self.id < other.id
    }
}

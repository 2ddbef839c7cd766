#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Weapon cooldown gating, projectile flight and hit resolution.
//!
//! A [`Weapon`] belongs to exactly one entity and releases a [`Projectile`]
//! whenever its cooldown has run out. Projectiles chase the current position
//! of their target every tick and resolve exactly once, because
//! [`Projectile::resolve`] consumes the projectile.

use glam::Vec2;
use rand::Rng;
use skirmish_core::{
    ArmorClass, EntityId, Facing, ProjectileRules, ProjectileSpeed, RulesBook, RulesError,
    SoundHandle, SpriteHandle, WarheadRules, WeaponRules, CELL_SIZE, VEHICLE_FACINGS,
};
use tracing::trace;

/// Scales base damage by the warhead's percentage against the target armor.
#[must_use]
pub fn final_damage(base_damage: u32, versus_percent: u32) -> u32 {
    let scaled = u64::from(base_damage) * u64::from(versus_percent) / 100;
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// Weapon bound to a single owning entity.
#[derive(Clone, Debug)]
pub struct Weapon {
    name: String,
    rules: WeaponRules,
    projectile: ProjectileRules,
    warhead: WarheadRules,
    cooldown: u32,
    sprite: Option<SpriteHandle>,
    sound: Option<SoundHandle>,
}

impl Weapon {
    /// Resolves a weapon and the projectile and warhead it depends on.
    ///
    /// Any missing table entry fails the whole weapon so callers can skip it
    /// without affecting the owner's other weapons.
    pub fn from_rules(name: &str, rules: &RulesBook) -> Result<Self, RulesError> {
        let weapon = rules.weapon(name)?.clone();
        let projectile = rules.projectile(&weapon.projectile)?.clone();
        let warhead = rules.warhead(&weapon.warhead)?.clone();
        Ok(Self {
            name: name.to_owned(),
            rules: weapon,
            projectile,
            warhead,
            cooldown: 0,
            sprite: None,
            sound: None,
        })
    }

    /// Attaches the projectile sprite and firing sound resolved by the asset façade.
    #[must_use]
    pub fn with_assets(mut self, sprite: Option<SpriteHandle>, sound: Option<SoundHandle>) -> Self {
        self.sprite = sprite;
        self.sound = sound;
        self
    }

    /// Rules name of the weapon.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Static definition of the weapon.
    #[must_use]
    pub fn rules(&self) -> &WeaponRules {
        &self.rules
    }

    /// Static definition of the projectile the weapon releases.
    #[must_use]
    pub fn projectile_rules(&self) -> &ProjectileRules {
        &self.projectile
    }

    /// Reach of the weapon in cells.
    #[must_use]
    pub fn range_cells(&self) -> f32 {
        self.rules.range
    }

    /// Ticks remaining before the weapon may fire again.
    #[must_use]
    pub const fn cooldown(&self) -> u32 {
        self.cooldown
    }

    /// Sound emitted whenever the weapon fires.
    #[must_use]
    pub const fn sound(&self) -> Option<SoundHandle> {
        self.sound
    }

    /// Counts the cooldown down by one tick.
    pub fn tick(&mut self) {
        self.cooldown = self.cooldown.saturating_sub(1);
    }

    /// Releases a projectile at `target` unless the weapon is cooling down.
    ///
    /// A successful shot resets the cooldown to the weapon's rate of fire.
    pub fn fire(&mut self, origin: Vec2, target: EntityId, target_position: Vec2) -> Option<Projectile> {
        if self.cooldown > 0 {
            return None;
        }

        self.cooldown = self.rules.rate_of_fire;
        trace!(weapon = %self.name, ?target, "weapon fired");
        Some(Projectile {
            target: Some(target),
            position: origin,
            aim: target_position,
            heading: Facing::between(origin, target_position, VEHICLE_FACINGS),
            speed: self.projectile.speed,
            travelled: 0.0,
            max_travel: self.projectile.max_travel * CELL_SIZE,
            damage: self.rules.damage,
            warhead: self.warhead.clone(),
            impact_effect: self.projectile.impact_effect.clone(),
            smoke_countdown: self.projectile.smoke_trail.then_some(0),
            sprite: self.sprite,
        })
    }
}

/// Outcome of advancing a projectile by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flight {
    /// Still travelling.
    InFlight,
    /// Reached its aim point and must resolve this tick.
    Arrived,
    /// Exceeded its travel cutoff and must detonate where it is.
    Expired,
}

/// Ephemeral projectile chasing a target entity.
#[derive(Clone, Debug)]
pub struct Projectile {
    target: Option<EntityId>,
    position: Vec2,
    aim: Vec2,
    heading: Facing,
    speed: ProjectileSpeed,
    travelled: f32,
    max_travel: f32,
    damage: u32,
    warhead: WarheadRules,
    impact_effect: String,
    smoke_countdown: Option<u32>,
    sprite: Option<SpriteHandle>,
}

impl Projectile {
    /// Target the projectile still follows; cleared once the target is gone.
    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Current world position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Last known target position the projectile steers towards.
    #[must_use]
    pub const fn aim(&self) -> Vec2 {
        self.aim
    }

    /// Direction of travel.
    #[must_use]
    pub const fn heading(&self) -> Facing {
        self.heading
    }

    /// Sprite drawn for the projectile.
    #[must_use]
    pub const fn sprite(&self) -> Option<SpriteHandle> {
        self.sprite
    }

    /// Reports whether the projectile resolves on the tick it is fired.
    #[must_use]
    pub fn is_hitscan(&self) -> bool {
        matches!(self.speed, ProjectileSpeed::Hitscan)
    }

    /// Moves the projectile one tick towards its target.
    ///
    /// `target_position` carries the target's current position, or `None`
    /// once the target no longer exists; the projectile then drops its
    /// handle and heads for the last known position.
    pub fn advance(&mut self, target_position: Option<Vec2>, divisor: f32) -> Flight {
        match target_position {
            Some(position) => self.aim = position,
            None => self.target = None,
        }

        let step = match self.speed {
            ProjectileSpeed::Hitscan => {
                self.position = self.aim;
                return Flight::Arrived;
            }
            ProjectileSpeed::Ballistic(speed) => speed / divisor.max(f32::EPSILON),
        };

        let remaining = self.aim - self.position;
        if remaining.length() < step {
            self.travelled += remaining.length();
            self.position = self.aim;
            return Flight::Arrived;
        }

        self.heading = Facing::between(self.position, self.aim, VEHICLE_FACINGS);
        self.position += remaining.normalize_or_zero() * step;
        self.travelled += step;

        if self.travelled > self.max_travel {
            return Flight::Expired;
        }

        Flight::InFlight
    }

    /// Counts down to the next smoke puff and reports whether one is due.
    ///
    /// Projectiles without a smoke trail never emit puffs.
    pub fn smoke_due<R: Rng>(&mut self, rng: &mut R, min_ticks: u32, max_ticks: u32) -> bool {
        let Some(countdown) = self.smoke_countdown.as_mut() else {
            return false;
        };

        if *countdown > 0 {
            *countdown -= 1;
            return false;
        }

        let low = min_ticks.min(max_ticks);
        let high = min_ticks.max(max_ticks);
        *countdown = rng.gen_range(low..=high);
        true
    }

    /// Resolves the projectile, consuming it.
    ///
    /// `target_armor` is the armor of the target if it is still alive. An
    /// expired projectile, or one whose target is gone, deals no damage.
    #[must_use]
    pub fn resolve(self, flight: Flight, target_armor: Option<ArmorClass>) -> Impact {
        let hit = match (flight, self.target, target_armor) {
            (Flight::Arrived, Some(target), Some(armor)) => Some((target, armor)),
            _ => None,
        };

        match hit {
            Some((target, armor)) => Impact {
                target: Some(target),
                damage: final_damage(self.damage, self.warhead.versus(armor)),
                position: self.position,
                effect: self.impact_effect,
            },
            None => Impact {
                target: None,
                damage: 0,
                position: self.position,
                effect: self.impact_effect,
            },
        }
    }
}

/// Result of resolving a projectile.
#[derive(Clone, Debug, PartialEq)]
pub struct Impact {
    /// Entity that should receive the damage.
    pub target: Option<EntityId>,
    /// Damage after the warhead table was applied.
    pub damage: u32,
    /// World position where the impact effect is spawned.
    pub position: Vec2,
    /// Rules name of the impact effect.
    pub effect: String,
}

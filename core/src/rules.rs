//! Static rules tables looked up by entity, weapon, projectile and warhead name.
//!
//! The tables are immutable for a session. They are usually authored as TOML
//! and parsed with [`RulesBook::from_toml_str`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{EntityKind, Footprint};

/// Errors raised while parsing or querying the rules tables.
#[derive(Debug, Error)]
pub enum RulesError {
    /// The rules document is not valid TOML or does not match the schema.
    #[error("failed to parse rules: {0}")]
    Parse(#[from] toml::de::Error),
    /// No entity entry exists for the provided name.
    #[error("unknown entity `{0}`")]
    UnknownEntity(String),
    /// No weapon entry exists for the provided name.
    #[error("unknown weapon `{0}`")]
    UnknownWeapon(String),
    /// No projectile entry exists for the provided name.
    #[error("unknown projectile `{0}`")]
    UnknownProjectile(String),
    /// No warhead entry exists for the provided name.
    #[error("unknown warhead `{0}`")]
    UnknownWarhead(String),
    /// A projectile speed is neither `"hitscan"` nor a positive number.
    #[error("invalid projectile speed `{0}`")]
    InvalidSpeed(String),
}

/// Complete set of rules tables for a session.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RulesBook {
    #[serde(default)]
    entities: BTreeMap<String, EntityRules>,
    #[serde(default)]
    weapons: BTreeMap<String, WeaponRules>,
    #[serde(default)]
    projectiles: BTreeMap<String, ProjectileRules>,
    #[serde(default)]
    warheads: BTreeMap<String, WarheadRules>,
}

impl RulesBook {
    /// Parses a rules document.
    pub fn from_toml_str(contents: &str) -> Result<Self, RulesError> {
        Ok(toml::from_str(contents)?)
    }

    /// Looks up the rules for an entity kind name.
    pub fn entity(&self, name: &str) -> Result<&EntityRules, RulesError> {
        self.entities
            .get(name)
            .ok_or_else(|| RulesError::UnknownEntity(name.to_owned()))
    }

    /// Looks up the rules for a weapon name.
    pub fn weapon(&self, name: &str) -> Result<&WeaponRules, RulesError> {
        self.weapons
            .get(name)
            .ok_or_else(|| RulesError::UnknownWeapon(name.to_owned()))
    }

    /// Looks up the rules for a projectile name.
    pub fn projectile(&self, name: &str) -> Result<&ProjectileRules, RulesError> {
        self.projectiles
            .get(name)
            .ok_or_else(|| RulesError::UnknownProjectile(name.to_owned()))
    }

    /// Looks up the rules for a warhead name.
    pub fn warhead(&self, name: &str) -> Result<&WarheadRules, RulesError> {
        self.warheads
            .get(name)
            .ok_or_else(|| RulesError::UnknownWarhead(name.to_owned()))
    }

    /// Inserts or replaces an entity entry.
    pub fn insert_entity(&mut self, name: impl Into<String>, rules: EntityRules) {
        let _ = self.entities.insert(name.into(), rules);
    }

    /// Inserts or replaces a weapon entry.
    pub fn insert_weapon(&mut self, name: impl Into<String>, rules: WeaponRules) {
        let _ = self.weapons.insert(name.into(), rules);
    }

    /// Inserts or replaces a projectile entry.
    pub fn insert_projectile(&mut self, name: impl Into<String>, rules: ProjectileRules) {
        let _ = self.projectiles.insert(name.into(), rules);
    }

    /// Inserts or replaces a warhead entry.
    pub fn insert_warhead(&mut self, name: impl Into<String>, rules: WarheadRules) {
        let _ = self.warheads.insert(name.into(), rules);
    }
}

/// Armor category an entity presents to incoming warheads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmorClass {
    /// Unarmored targets such as infantry.
    #[default]
    None,
    /// Wooden structures and trees.
    Wood,
    /// Light vehicles.
    Light,
    /// Heavy vehicles.
    Heavy,
    /// Reinforced structures.
    Concrete,
}

impl ArmorClass {
    /// Column of the warhead `versus` table addressed by this class.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Per-kind property table.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EntityRules {
    /// Category of the entity.
    pub kind: EntityKind,
    /// Maximum health.
    pub hit_points: u32,
    /// Armor class presented to warheads.
    #[serde(default)]
    pub armor: ArmorClass,
    /// Movement speed before the per-kind divisor is applied.
    #[serde(default)]
    pub speed: f32,
    /// Facing slices turned per tick.
    #[serde(default = "default_rotation_speed")]
    pub rotation_speed: u8,
    /// Reveal radius in cells.
    #[serde(default)]
    pub sight: u32,
    /// Name of the primary weapon.
    #[serde(default)]
    pub primary: Option<String>,
    /// Name of the secondary weapon.
    #[serde(default)]
    pub secondary: Option<String>,
    /// Occupancy pattern marked unwalkable while the entity is alive.
    #[serde(default)]
    pub footprint: Option<Vec<String>>,
    /// Cells drawn onto the overlay layer above units.
    #[serde(default)]
    pub overlap: Option<Vec<String>>,
    /// Build cost in credits.
    #[serde(default)]
    pub cost: u32,
    /// Power produced (positive) or consumed (negative).
    #[serde(default)]
    pub power: i32,
    /// Whether the entity aims with a turret independent of its body.
    #[serde(default)]
    pub turret: bool,
    /// Whether the entity joins with neighbouring segments of the same kind.
    #[serde(default)]
    pub wall: bool,
    /// Ticks the terminal animation lasts before destruction.
    #[serde(default)]
    pub death_ticks: u32,
    /// Ticks a short-lived effect survives.
    #[serde(default)]
    pub lifetime: Option<u32>,
    /// Sprite sheet name.
    #[serde(default)]
    pub sprite: Option<String>,
    /// Sound played once when the entity dies.
    #[serde(default)]
    pub death_sound: Option<String>,
    /// Effect entity spawned once when the entity dies.
    #[serde(default)]
    pub death_effect: Option<String>,
    /// Named animations.
    #[serde(default)]
    pub animations: BTreeMap<String, AnimationRules>,
}

impl EntityRules {
    /// Minimal rules for a short-lived visual effect.
    #[must_use]
    pub fn effect(lifetime: u32) -> Self {
        Self {
            kind: EntityKind::Effect,
            hit_points: 1,
            armor: ArmorClass::None,
            speed: 0.0,
            rotation_speed: default_rotation_speed(),
            sight: 0,
            primary: None,
            secondary: None,
            footprint: None,
            overlap: None,
            cost: 0,
            power: 0,
            turret: false,
            wall: false,
            death_ticks: 0,
            lifetime: Some(lifetime),
            sprite: None,
            death_sound: None,
            death_effect: None,
            animations: BTreeMap::new(),
        }
    }

    /// Parsed occupancy footprint, if the entity blocks cells.
    #[must_use]
    pub fn footprint(&self) -> Option<Footprint> {
        self.footprint
            .as_deref()
            .and_then(Footprint::from_pattern)
    }

    /// Parsed overlap pattern, if the entity draws cells above units.
    #[must_use]
    pub fn overlap(&self) -> Option<Footprint> {
        self.overlap.as_deref().and_then(Footprint::from_pattern)
    }
}

fn default_rotation_speed() -> u8 {
    1
}

/// Frame range of a named animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct AnimationRules {
    /// First frame of the animation within the sprite sheet.
    pub first: u32,
    /// Number of frames in the animation.
    pub frames: u32,
}

/// Static weapon definition.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct WeaponRules {
    /// Base damage before the warhead table is applied.
    pub damage: u32,
    /// Ticks between successive shots.
    pub rate_of_fire: u32,
    /// Reach measured in cells.
    pub range: f32,
    /// Name of the projectile released by the weapon.
    pub projectile: String,
    /// Name of the warhead carried by the projectile.
    pub warhead: String,
    /// Sound played whenever the weapon fires.
    #[serde(default)]
    pub sound: Option<String>,
}

/// Travel speed of a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawSpeed")]
pub enum ProjectileSpeed {
    /// Resolves on the tick it was fired.
    Hitscan,
    /// Travels this speed, before the projectile divisor, every tick.
    Ballistic(f32),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSpeed {
    Named(String),
    Value(f32),
}

impl TryFrom<RawSpeed> for ProjectileSpeed {
    type Error = RulesError;

    fn try_from(raw: RawSpeed) -> Result<Self, Self::Error> {
        match raw {
            RawSpeed::Named(name) if name == "hitscan" => Ok(Self::Hitscan),
            RawSpeed::Named(name) => Err(RulesError::InvalidSpeed(name)),
            RawSpeed::Value(value) if value > 0.0 => Ok(Self::Ballistic(value)),
            RawSpeed::Value(value) => Err(RulesError::InvalidSpeed(value.to_string())),
        }
    }
}

/// Static projectile definition.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ProjectileRules {
    /// Travel speed of the projectile.
    pub speed: ProjectileSpeed,
    /// Whether the projectile leaves a smoke trail behind it.
    #[serde(default)]
    pub smoke_trail: bool,
    /// Sprite sheet name.
    #[serde(default)]
    pub sprite: Option<String>,
    /// Effect entity spawned where the projectile resolves.
    #[serde(default = "default_impact_effect")]
    pub impact_effect: String,
    /// Distance in cells after which the projectile detonates without hitting.
    #[serde(default = "default_max_travel")]
    pub max_travel: f32,
}

fn default_impact_effect() -> String {
    "explosion".to_owned()
}

fn default_max_travel() -> f32 {
    24.0
}

/// Warhead effectiveness table.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct WarheadRules {
    /// Damage percentage applied against each [`ArmorClass`], in declaration order.
    pub versus: [u32; 5],
}

impl WarheadRules {
    /// Percentage applied against the provided armor class.
    #[must_use]
    pub fn versus(&self, armor: ArmorClass) -> u32 {
        self.versus[armor.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"
        [entities.mtnk]
        kind = "unit"
        hit_points = 300
        armor = "heavy"
        speed = 18
        rotation_speed = 2
        sight = 3
        primary = "105mm"
        turret = true

        [entities.fact]
        kind = "structure"
        hit_points = 800
        armor = "concrete"
        footprint = ["xxx", "xxx"]
        cost = 5000
        power = 15

        [weapons.105mm]
        damage = 30
        rate_of_fire = 40
        range = 4.75
        projectile = "cannon"
        warhead = "ap"

        [projectiles.cannon]
        speed = 40

        [projectiles.bullet]
        speed = "hitscan"

        [warheads.ap]
        versus = [30, 75, 75, 100, 50]
    "#;

    #[test]
    fn parses_all_tables() {
        let rules = RulesBook::from_toml_str(RULES).expect("rules parse");
        let tank = rules.entity("mtnk").expect("tank rules");
        assert_eq!(tank.kind, EntityKind::Unit);
        assert_eq!(tank.armor, ArmorClass::Heavy);
        assert_eq!(tank.primary.as_deref(), Some("105mm"));
        assert_eq!(
            rules.projectile("cannon").expect("cannon").speed,
            ProjectileSpeed::Ballistic(40.0)
        );
        assert_eq!(
            rules.projectile("bullet").expect("bullet").speed,
            ProjectileSpeed::Hitscan
        );
        assert_eq!(rules.projectile("cannon").expect("cannon").impact_effect, "explosion");
        assert_eq!(rules.warhead("ap").expect("ap").versus(ArmorClass::Heavy), 100);
    }

    #[test]
    fn structure_footprint_is_parsed() {
        let rules = RulesBook::from_toml_str(RULES).expect("rules parse");
        let footprint = rules
            .entity("fact")
            .expect("factory rules")
            .footprint()
            .expect("factory footprint");
        assert_eq!(footprint.size().width(), 3);
        assert_eq!(footprint.size().height(), 2);
    }

    #[test]
    fn unknown_names_are_reported() {
        let rules = RulesBook::default();
        assert!(matches!(
            rules.entity("ghost"),
            Err(RulesError::UnknownEntity(name)) if name == "ghost"
        ));
        assert!(matches!(rules.weapon("none"), Err(RulesError::UnknownWeapon(_))));
    }

    #[test]
    fn tables_can_be_assembled_in_code() {
        let mut rules = RulesBook::default();
        rules.insert_entity("husk", EntityRules::effect(10));
        rules.insert_weapon(
            "flamer",
            WeaponRules {
                damage: 12,
                rate_of_fire: 4,
                range: 1.5,
                projectile: "flame".to_owned(),
                warhead: "fire".to_owned(),
                sound: None,
            },
        );
        rules.insert_projectile(
            "flame",
            ProjectileRules {
                speed: ProjectileSpeed::Hitscan,
                smoke_trail: false,
                sprite: None,
                impact_effect: "husk".to_owned(),
                max_travel: 2.0,
            },
        );
        rules.insert_warhead(
            "fire",
            WarheadRules {
                versus: [90, 100, 50, 25, 50],
            },
        );

        assert_eq!(rules.entity("husk").expect("husk").lifetime, Some(10));
        assert_eq!(rules.weapon("flamer").expect("flamer").projectile, "flame");
        assert_eq!(rules.projectile("flame").expect("flame").impact_effect, "husk");
        assert_eq!(rules.warhead("fire").expect("fire").versus(ArmorClass::Wood), 100);

        rules.insert_entity("husk", EntityRules::effect(3));
        assert_eq!(rules.entity("husk").expect("husk").lifetime, Some(3));
    }

    #[test]
    fn invalid_speed_is_rejected() {
        let broken = r#"
            [projectiles.slow]
            speed = "sometimes"
        "#;
        assert!(RulesBook::from_toml_str(broken).is_err());
    }
}

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use skirmish_core::{
    ArmorClass, EntityId, ProjectileRules, ProjectileSpeed, RulesBook, WarheadRules, WeaponRules,
};
use skirmish_system_ballistics::{Flight, Weapon};
use slotmap::SlotMap;

const RULES: &str = r#"
    [weapons.cannon]
    damage = 50
    rate_of_fire = 3
    range = 5.0
    projectile = "shell"
    warhead = "he"

    [weapons.rifle]
    damage = 10
    rate_of_fire = 1
    range = 3.0
    projectile = "bullet"
    warhead = "he"

    [weapons.rocket]
    damage = 40
    rate_of_fire = 10
    range = 6.0
    projectile = "missile"
    warhead = "he"

    [weapons.broken]
    damage = 1
    rate_of_fire = 1
    range = 1.0
    projectile = "missing"
    warhead = "he"

    [projectiles.shell]
    speed = 60
    max_travel = 2.0

    [projectiles.bullet]
    speed = "hitscan"

    [projectiles.missile]
    speed = 30
    smoke_trail = true

    [warheads.he]
    versus = [100, 90, 75, 25, 50]
"#;

fn rules() -> RulesBook {
    RulesBook::from_toml_str(RULES).expect("rules parse")
}

fn target_id() -> EntityId {
    let mut arena: SlotMap<EntityId, ()> = SlotMap::with_key();
    arena.insert(())
}

#[test]
fn cooldown_gates_successive_shots() {
    let mut weapon = Weapon::from_rules("cannon", &rules()).expect("cannon");
    let target = target_id();

    assert!(weapon.fire(Vec2::ZERO, target, Vec2::X).is_some());
    assert_eq!(weapon.cooldown(), 3);
    assert!(weapon.fire(Vec2::ZERO, target, Vec2::X).is_none());

    weapon.tick();
    weapon.tick();
    assert!(weapon.fire(Vec2::ZERO, target, Vec2::X).is_none());
    weapon.tick();
    assert!(weapon.fire(Vec2::ZERO, target, Vec2::X).is_some());
}

#[test]
fn missing_projectile_fails_only_that_weapon() {
    let rules = rules();
    assert!(Weapon::from_rules("broken", &rules).is_err());
    assert!(Weapon::from_rules("rifle", &rules).is_ok());
}

#[test]
fn hitscan_resolves_on_the_firing_tick() {
    let mut weapon = Weapon::from_rules("rifle", &rules()).expect("rifle");
    let target = target_id();
    let mut projectile = weapon
        .fire(Vec2::ZERO, target, Vec2::new(48.0, 0.0))
        .expect("shot");

    assert!(projectile.is_hitscan());
    let flight = projectile.advance(Some(Vec2::new(48.0, 0.0)), 6.0);
    assert_eq!(flight, Flight::Arrived);

    let impact = projectile.resolve(flight, Some(ArmorClass::Light));
    assert_eq!(impact.target, Some(target));
    assert_eq!(impact.damage, 7);
}

#[test]
fn ballistic_projectile_follows_a_moving_target_without_overshooting() {
    let mut weapon = Weapon::from_rules("cannon", &rules()).expect("cannon");
    let target = target_id();
    let mut target_position = Vec2::new(30.0, 0.0);
    let mut projectile = weapon
        .fire(Vec2::ZERO, target, target_position)
        .expect("shot");

    let mut flight = Flight::InFlight;
    for _ in 0..20 {
        target_position.y += 1.0;
        flight = projectile.advance(Some(target_position), 6.0);
        if flight != Flight::InFlight {
            break;
        }
    }

    assert_eq!(flight, Flight::Arrived);
    assert_eq!(projectile.position(), target_position);
    let impact = projectile.resolve(flight, Some(ArmorClass::None));
    assert_eq!(impact.damage, 50);
    assert_eq!(impact.effect, "explosion");
}

#[test]
fn vanished_target_deals_no_damage_at_last_known_position() {
    let mut weapon = Weapon::from_rules("cannon", &rules()).expect("cannon");
    let target = target_id();
    let last_known = Vec2::new(20.0, 0.0);
    let mut projectile = weapon.fire(Vec2::ZERO, target, last_known).expect("shot");

    assert_eq!(projectile.advance(Some(last_known), 6.0), Flight::InFlight);
    let mut flight = Flight::InFlight;
    while flight == Flight::InFlight {
        flight = projectile.advance(None, 6.0);
    }

    assert_eq!(flight, Flight::Arrived);
    assert_eq!(projectile.target(), None);
    assert_eq!(projectile.aim(), last_known);
    let impact = projectile.resolve(flight, Some(ArmorClass::None));
    assert_eq!(impact.target, None);
    assert_eq!(impact.damage, 0);
    assert_eq!(impact.position, last_known);
}

#[test]
fn projectile_expires_after_travel_cutoff() {
    let mut weapon = Weapon::from_rules("cannon", &rules()).expect("cannon");
    let target = target_id();
    let far = Vec2::new(1_000.0, 0.0);
    let mut projectile = weapon.fire(Vec2::ZERO, target, far).expect("shot");

    let mut flight = Flight::InFlight;
    for _ in 0..10 {
        flight = projectile.advance(Some(far), 6.0);
        if flight != Flight::InFlight {
            break;
        }
    }

    assert_eq!(flight, Flight::Expired);
    let impact = projectile.resolve(flight, Some(ArmorClass::None));
    assert_eq!(impact.damage, 0);
    assert_eq!(impact.target, None);
}

#[test]
fn smoke_trail_puffs_within_configured_interval() {
    let rules = rules();
    let target = target_id();
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    let mut missile = Weapon::from_rules("rocket", &rules)
        .expect("rocket")
        .fire(Vec2::ZERO, target, Vec2::X)
        .expect("shot");
    let puffs: Vec<bool> = (0..20).map(|_| missile.smoke_due(&mut rng, 2, 4)).collect();
    assert!(puffs[0]);
    let puff_ticks: Vec<usize> = puffs
        .iter()
        .enumerate()
        .filter_map(|(tick, due)| due.then_some(tick))
        .collect();
    for pair in puff_ticks.windows(2) {
        let gap = pair[1] - pair[0];
        assert!((3..=5).contains(&gap), "gap of {gap} ticks");
    }

    let mut shell = Weapon::from_rules("cannon", &rules)
        .expect("cannon")
        .fire(Vec2::ZERO, target, Vec2::X)
        .expect("shot");
    assert!((0..20).all(|_| !shell.smoke_due(&mut rng, 2, 4)));
}

#[test]
fn weapons_resolve_against_tables_built_in_code() {
    let mut rules = RulesBook::default();
    rules.insert_weapon(
        "grenade",
        WeaponRules {
            damage: 40,
            rate_of_fire: 6,
            range: 3.0,
            projectile: "lob".to_owned(),
            warhead: "frag".to_owned(),
            sound: None,
        },
    );
    rules.insert_projectile(
        "lob",
        ProjectileRules {
            speed: ProjectileSpeed::Hitscan,
            smoke_trail: false,
            sprite: None,
            impact_effect: "blast".to_owned(),
            max_travel: 4.0,
        },
    );
    assert!(Weapon::from_rules("grenade", &rules).is_err());

    rules.insert_warhead(
        "frag",
        WarheadRules {
            versus: [100, 50, 25, 10, 10],
        },
    );
    let target = target_id();
    let aim = Vec2::new(24.0, 24.0);
    let mut projectile = Weapon::from_rules("grenade", &rules)
        .expect("grenade")
        .fire(Vec2::ZERO, target, aim)
        .expect("shot");
    assert_eq!(projectile.aim(), aim);

    let flight = projectile.advance(Some(aim), 6.0);
    let impact = projectile.resolve(flight, Some(ArmorClass::Wood));
    assert_eq!(impact.damage, 20);
    assert_eq!(impact.effect, "blast");
}

use glam::Vec2;
use skirmish_core::{
    assets::CatalogAssets, BehaviorState, CellCoord, Command, DamageState, EntityId, EntityKind,
    Event, MapDefinition, Placement, PlacementError, PlayerId, PlayerSetup, RulesBook,
    SimulationConfig,
};
use skirmish_system_fog::FogMask;
use skirmish_world::{self as world, query, World};

const RULES: &str = r#"
    [entities.tank]
    kind = "unit"
    hit_points = 100
    armor = "heavy"
    speed = 36.0
    rotation_speed = 16
    sight = 2
    primary = "cannon"

    [entities.harvester]
    kind = "unit"
    hit_points = 200
    armor = "heavy"
    speed = 36.0
    rotation_speed = 16
    footprint = ["x"]

    [entities.gunner]
    kind = "unit"
    hit_points = 100
    armor = "heavy"
    rotation_speed = 1
    sight = 2
    primary = "cannon"
    turret = true

    [entities.truck]
    kind = "unit"
    hit_points = 100
    armor = "heavy"
    death_effect = "wreck"
    death_sound = "boom"

    [entities.pillbox]
    kind = "structure"
    hit_points = 100
    armor = "concrete"
    footprint = ["x"]
    cost = 200
    animations = { build = { first = 0, frames = 3 } }

    [entities.bunker]
    kind = "structure"
    hit_points = 400
    armor = "concrete"
    footprint = ["xx", "xx"]
    cost = 600
    power = -20

    [entities.plant]
    kind = "structure"
    hit_points = 200
    footprint = ["xx"]
    cost = 300
    power = 100

    [entities.explosion]
    kind = "effect"
    hit_points = 1
    lifetime = 5

    [entities.wreck]
    kind = "effect"
    hit_points = 1
    lifetime = 40

    [weapons.cannon]
    damage = 50
    rate_of_fire = 10
    range = 5.0
    projectile = "shell"
    warhead = "ap"
    sound = "fire"

    [projectiles.shell]
    speed = 60
    impact_effect = "explosion"

    [warheads.ap]
    versus = [100, 100, 100, 100, 50]
"#;

fn place(name: &str, column: u32, row: u32, owner: Option<u8>) -> Placement {
    Placement {
        name: name.to_owned(),
        column,
        row,
        owner,
        health: None,
        facing: None,
    }
}

fn map(columns: u32, rows: u32, placements: Vec<Placement>) -> MapDefinition {
    MapDefinition {
        columns,
        rows,
        tiles: Vec::new(),
        impassable_tiles: Vec::new(),
        players: vec![
            PlayerSetup {
                credits: 1_000,
                team: 0,
                local: true,
            },
            PlayerSetup {
                credits: 1_000,
                team: 1,
                local: false,
            },
        ],
        placements,
    }
}

fn load(definition: &MapDefinition) -> (World, Vec<Event>) {
    let rules = RulesBook::from_toml_str(RULES).expect("rules parse");
    let mut events = Vec::new();
    let world = World::from_map(
        definition,
        rules,
        SimulationConfig::default(),
        Box::new(CatalogAssets::default()),
        &mut events,
    );
    (world, events)
}

fn spawned(events: &[Event], kind: EntityKind) -> Vec<EntityId> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::EntitySpawned {
                entity,
                kind: spawned,
                ..
            } if *spawned == kind => Some(*entity),
            _ => None,
        })
        .collect()
}

fn tick(world: &mut World) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, Command::Tick, &mut events);
    events
}

fn post(world: &mut World, command: Command) {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    assert!(events.is_empty(), "orders only take effect on the next tick");
}

/// Ticks until `done` matches an event, returning every event seen on the way.
fn run_until<F>(world: &mut World, limit: u32, done: F) -> Vec<Event>
where
    F: Fn(&Event) -> bool,
{
    let mut log = Vec::new();
    for _ in 0..limit {
        let events = tick(world);
        let finished = events.iter().any(&done);
        log.extend(events);
        if finished {
            return log;
        }
    }
    panic!("condition not reached within {limit} ticks");
}

#[test]
fn invalid_placements_are_dropped_and_reported() {
    let (world, events) = load(&map(
        8,
        8,
        vec![
            place("tank", 1, 1, Some(0)),
            place("ghost", 2, 2, Some(0)),
            place("bunker", 7, 7, Some(0)),
            place("tank", 3, 3, Some(5)),
        ],
    ));

    let reasons: Vec<PlacementError> = events
        .iter()
        .filter_map(|event| match event {
            Event::PlacementRejected { reason, .. } => Some(*reason),
            _ => None,
        })
        .collect();
    assert_eq!(
        reasons,
        vec![
            PlacementError::UnknownKind,
            PlacementError::OutOfBounds,
            PlacementError::MissingOwner,
        ]
    );
    assert_eq!(query::entities(&world).len(), 1);
}

#[test]
fn impassable_tiles_block_paths() {
    let mut definition = map(6, 3, vec![place("tank", 0, 1, Some(0))]);
    definition.tiles = vec![0; 18];
    for row in 0..3 {
        definition.tiles[row * 6 + 3] = 9;
    }
    definition.impassable_tiles = vec![9];
    let (mut world, events) = load(&definition);
    let tank = spawned(&events, EntityKind::Unit)[0];

    assert!(!query::walkability(&world).is_walkable_at(CellCoord::new(3, 1)));
    assert!(query::create_path(&world, CellCoord::new(0, 1), CellCoord::new(5, 1), false).is_empty());

    post(
        &mut world,
        Command::MoveEntity {
            entity: tank,
            cell: CellCoord::new(5, 1),
        },
    );
    let events = tick(&mut world);
    assert!(events.contains(&Event::PathNotFound {
        entity: tank,
        destination: CellCoord::new(5, 1),
    }));
}

#[test]
fn footprints_block_cells_until_the_structure_is_sold() {
    let (mut world, _) = load(&map(10, 10, vec![place("plant", 0, 0, Some(0))]));
    let player = PlayerId::new(0);

    post(
        &mut world,
        Command::PlaceStructure {
            name: "bunker".to_owned(),
            cell: CellCoord::new(2, 2),
            owner: player,
        },
    );
    let events = tick(&mut world);
    assert!(events.contains(&Event::CreditsChanged {
        player,
        credits: 400,
    }));
    let bunker = spawned(&events, EntityKind::Structure)[0];
    for cell in [(2, 2), (3, 2), (2, 3), (3, 3)] {
        assert!(!query::walkability(&world).is_walkable_at(CellCoord::new(cell.0, cell.1)));
    }
    let power = query::players(&world)[0].power();
    assert_eq!(power.produced, 100);
    assert_eq!(power.consumed, 20);

    for (cell, reason) in [
        (CellCoord::new(3, 3), PlacementError::Occupied),
        (CellCoord::new(6, 6), PlacementError::InsufficientCredits),
        (CellCoord::new(9, 9), PlacementError::OutOfBounds),
    ] {
        post(
            &mut world,
            Command::PlaceStructure {
                name: "bunker".to_owned(),
                cell,
                owner: player,
            },
        );
        let events = tick(&mut world);
        assert!(
            events.iter().any(|event| matches!(
                event,
                Event::PlacementRejected { reason: rejected, .. } if *rejected == reason
            )),
            "expected {reason:?} at {cell:?}"
        );
    }
    assert_eq!(query::players(&world)[0].credits(), 400);

    post(&mut world, Command::SellStructure { entity: bunker });
    let events = tick(&mut world);
    assert!(events.contains(&Event::StructureSold {
        entity: bunker,
        refund: 300,
    }));
    assert!(events.contains(&Event::EntityDestroyed {
        entity: bunker,
        kind: EntityKind::Structure,
    }));
    assert_eq!(query::players(&world)[0].credits(), 700);
    for cell in [(2, 2), (3, 2), (2, 3), (3, 3)] {
        assert!(query::walkability(&world).is_walkable_at(CellCoord::new(cell.0, cell.1)));
    }
    assert!(query::entity(&world, bunker).is_none());
}

#[test]
fn guarding_tank_shoots_and_damages_an_enemy() {
    let (mut world, events) = load(&map(
        10,
        6,
        vec![place("tank", 1, 2, Some(0)), place("truck", 4, 2, Some(1))],
    ));
    let units = spawned(&events, EntityKind::Unit);
    let (tank, truck) = (units[0], units[1]);

    let first = tick(&mut world);
    assert_eq!(
        query::entity(&world, tank).expect("tank").state,
        BehaviorState::Rotating
    );
    assert!(!first
        .iter()
        .any(|event| matches!(event, Event::WeaponFired { .. })));

    let log = run_until(&mut world, 40, |event| {
        matches!(event, Event::ProjectileResolved { .. })
    });
    assert!(log.contains(&Event::EntityDamaged {
        entity: truck,
        amount: 50,
        health: 50,
    }));
    assert!(log.iter().any(|event| matches!(
        event,
        Event::WeaponFired { entity, target, .. } if *entity == tank && *target == truck
    )));
    assert!(log
        .iter()
        .any(|event| matches!(event, Event::SoundCue { .. })));

    let snapshot = query::entity(&world, truck).expect("truck survives");
    assert_eq!(snapshot.health, 50);
    assert_eq!(snapshot.damage_state, DamageState::Moderate);
    assert_eq!(spawned(&log, EntityKind::Effect).len(), 1);
}

#[test]
fn simultaneous_killing_blows_die_once() {
    let (mut world, events) = load(&map(
        10,
        6,
        vec![
            place("tank", 1, 1, Some(0)),
            place("tank", 1, 3, Some(0)),
            Placement {
                health: Some(50),
                ..place("truck", 4, 2, Some(1))
            },
        ],
    ));
    let truck = spawned(&events, EntityKind::Unit)[2];
    let truck_center = CellCoord::new(4, 2).center();

    let log = run_until(&mut world, 40, |event| {
        matches!(event, Event::EntityDestroyed { entity, .. } if *entity == truck)
    });
    let log: Vec<Event> = log
        .into_iter()
        .chain((0..20).flat_map(|_| tick(&mut world)))
        .collect();

    let dying = log
        .iter()
        .filter(|event| matches!(event, Event::EntityDying { entity } if *entity == truck))
        .count();
    assert_eq!(dying, 1);
    let cues = log
        .iter()
        .filter(|event| matches!(event, Event::SoundCue { position, .. } if *position == truck_center))
        .count();
    assert_eq!(cues, 1);
    let wrecks = query::entities(&world)
        .into_iter()
        .filter(|entity| entity.name == "wreck")
        .count();
    assert_eq!(wrecks, 1);
    let destroyed = log
        .iter()
        .filter(|event| matches!(event, Event::EntityDestroyed { entity, .. } if *entity == truck))
        .count();
    assert_eq!(destroyed, 1);
}

#[test]
fn projectile_reaches_last_known_position_of_a_vanished_target() {
    let (mut world, events) = load(&map(
        10,
        6,
        vec![place("tank", 1, 2, Some(0)), place("pillbox", 5, 2, Some(1))],
    ));
    let pillbox = spawned(&events, EntityKind::Structure)[0];

    let mut log = run_until(&mut world, 10, |event| {
        matches!(event, Event::WeaponFired { .. })
    });
    post(&mut world, Command::SellStructure { entity: pillbox });
    log.extend(run_until(&mut world, 40, |event| {
        matches!(event, Event::ProjectileResolved { .. })
    }));

    let resolved = log
        .iter()
        .find_map(|event| match event {
            Event::ProjectileResolved {
                target,
                damage,
                cell,
                ..
            } => Some((*target, *damage, *cell)),
            _ => None,
        })
        .expect("projectile resolved");
    assert_eq!(resolved, (None, 0, CellCoord::new(5, 2)));
    assert!(!log
        .iter()
        .any(|event| matches!(event, Event::EntityDamaged { .. })));
    assert_eq!(spawned(&log, EntityKind::Effect).len(), 1);
}

#[test]
fn local_units_reveal_their_surroundings() {
    let (mut world, _) = load(&map(
        20,
        20,
        vec![place("tank", 10, 10, Some(0)), place("tank", 2, 2, Some(1))],
    ));

    for row in 8..=12 {
        for column in 8..=12 {
            assert!(query::is_revealed_at(&world, CellCoord::new(column, row)));
        }
    }
    assert!(!query::is_revealed_at(&world, CellCoord::new(7, 10)));
    assert!(!query::is_revealed_at(&world, CellCoord::new(13, 10)));
    assert!(!query::is_revealed_at(&world, CellCoord::new(2, 2)));
    assert_eq!(query::visibility(&world).revealed_count(), 25);

    let mut mask = FogMask::new(20, 20);
    assert_eq!(world::redraw_fog(&mut world, &mut mask), 25);
    assert_eq!(world::redraw_fog(&mut world, &mut mask), 0);
    assert!(mask.alpha_at_cell(CellCoord::new(10, 10)) < u8::MAX);
    assert_eq!(mask.alpha_at_cell(CellCoord::new(0, 19)), u8::MAX);
    assert!(query::is_revealed_at(&world, CellCoord::new(10, 10)));

    post(&mut world, Command::ToggleFog);
    let events = tick(&mut world);
    assert!(events.contains(&Event::FogToggled { visible: false }));
    assert!(!query::is_fow_visible(&world));
}

#[test]
fn selected_tank_walks_to_the_clicked_cell() {
    let (mut world, events) = load(&map(
        10,
        6,
        vec![place("tank", 1, 1, Some(0)), place("truck", 9, 5, Some(1))],
    ));
    let tank = spawned(&events, EntityKind::Unit)[0];

    post(
        &mut world,
        Command::Select {
            cell: CellCoord::new(9, 5),
            additive: false,
        },
    );
    assert!(tick(&mut world).contains(&Event::SelectionChanged { count: 0 }));

    post(
        &mut world,
        Command::Select {
            cell: CellCoord::new(1, 1),
            additive: false,
        },
    );
    assert!(tick(&mut world).contains(&Event::SelectionChanged { count: 1 }));
    let selected = query::selected_entities(&world);
    assert_eq!(selected.len(), 1);
    assert!(selected[0].selected);
    assert_eq!(query::entity_at(&world, CellCoord::new(1, 1)), Some(tank));

    post(
        &mut world,
        Command::MoveSelected {
            cell: CellCoord::new(4, 1),
        },
    );
    let mut ticks = 0;
    loop {
        let _ = tick(&mut world);
        let snapshot = query::entity(&world, tank).expect("tank");
        if snapshot.cell == CellCoord::new(4, 1) && snapshot.state == BehaviorState::Idle {
            assert_eq!(snapshot.position, CellCoord::new(4, 1).center());
            break;
        }
        ticks += 1;
        assert!(ticks < 200, "tank never arrived");
    }

    let infantry_only = query::entities_at(&world, CellCoord::new(4, 1), |entity| {
        entity.kind == EntityKind::Infantry
    });
    assert!(infantry_only.is_empty());
}

#[test]
fn camera_scroll_is_clamped_to_the_map() {
    let (mut world, _) = load(&map(10, 10, Vec::new()));
    post(
        &mut world,
        Command::ResizeViewport {
            size: Vec2::new(120.0, 120.0),
        },
    );
    post(
        &mut world,
        Command::ScrollCamera {
            delta: Vec2::new(-1_000.0, 30.0),
        },
    );
    let _ = tick(&mut world);

    let viewport = query::viewport(&world);
    assert_eq!(viewport.origin, Vec2::new(-48.0, 30.0));
    assert!(query::visible_entities(&world).is_empty());
}

#[test]
fn teardown_releases_the_session() {
    let (mut world, _) = load(&map(
        6,
        6,
        vec![place("bunker", 1, 1, Some(0)), place("tank", 4, 4, Some(0))],
    ));
    assert!(query::cached_assets(&world) > 0);
    assert!(!query::walkability(&world).is_walkable_at(CellCoord::new(1, 1)));

    world.teardown();
    assert!(query::entities(&world).is_empty());
    assert_eq!(query::cached_assets(&world), 0);
    assert!(query::walkability(&world).is_walkable_at(CellCoord::new(1, 1)));
}

#[test]
fn moving_footprint_blocks_only_the_cell_it_stands_on() {
    let (mut world, events) = load(&map(10, 6, vec![place("harvester", 1, 1, Some(0))]));
    let harvester = spawned(&events, EntityKind::Unit)[0];
    let blocked = |world: &World| -> Vec<CellCoord> {
        query::walkability(world).blocked_cells().collect()
    };
    assert_eq!(blocked(&world), vec![CellCoord::new(1, 1)]);

    post(
        &mut world,
        Command::MoveEntity {
            entity: harvester,
            cell: CellCoord::new(6, 1),
        },
    );
    let mut ticks = 0;
    loop {
        let _ = tick(&mut world);
        let snapshot = query::entity(&world, harvester).expect("harvester");
        assert_eq!(blocked(&world), vec![snapshot.cell]);
        if snapshot.cell == CellCoord::new(6, 1) && snapshot.state == BehaviorState::Idle {
            break;
        }
        ticks += 1;
        assert!(ticks < 200, "harvester never arrived");
    }

    assert!(query::walkability(&world).is_walkable_at(CellCoord::new(1, 1)));
    assert!(!query::walkability(&world).is_walkable_at(CellCoord::new(6, 1)));
}

#[test]
fn turret_turns_into_line_before_firing() {
    let (mut world, events) = load(&map(
        10,
        6,
        vec![place("gunner", 1, 2, Some(0)), place("truck", 4, 2, Some(1))],
    ));
    let units = spawned(&events, EntityKind::Unit);
    let (gunner, truck) = (units[0], units[1]);

    let mut turret_steps = Vec::new();
    let fired = loop {
        let events = tick(&mut world);
        let snapshot = query::entity(&world, gunner).expect("gunner");
        let turret = snapshot.turret.expect("turret facing");
        assert_eq!(snapshot.facing.value(), 0, "body must not turn");

        let shots: Vec<&Event> = events
            .iter()
            .filter(|event| matches!(event, Event::WeaponFired { .. }))
            .collect();
        if !shots.is_empty() {
            assert_eq!(snapshot.state, BehaviorState::Attacking);
            assert_eq!(turret.value(), 8);
            break shots.into_iter().cloned().collect::<Vec<_>>();
        }

        assert_eq!(snapshot.state, BehaviorState::Rotating);
        turret_steps.push(turret.value());
        assert!(turret_steps.len() < 40, "turret never lined up");
    };

    assert!(turret_steps.windows(2).all(|pair| pair[1] == pair[0] + 1));
    assert_eq!(turret_steps.last().copied(), Some(8));
    assert_eq!(fired.len(), 1);
    assert!(matches!(
        fired[0],
        Event::WeaponFired { entity, target, .. } if entity == gunner && target == truck
    ));
}

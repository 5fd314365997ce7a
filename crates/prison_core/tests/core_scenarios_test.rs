//! # Core Scenario Tests
//!
//! End-to-end checks of the arena, the containers and the ECS through the
//! public API only.

use prison_core::{
    kilobytes, Arena, Camera, ComponentKind, CoreConfig, EcsError, HandleList, SpriteRender,
    StrTable, Transform, Vec2, World,
};

/// Test: 101 appends into a list on a 10 KB arena.
#[test]
fn test_handle_list_101_appends() {
    let arena = Arena::new(kilobytes(10));
    let mut list = HandleList::new(&arena).unwrap();

    for value in (0..=1000).step_by(10) {
        list.push(value).unwrap();
    }

    assert_eq!(list.len(), 101);
    assert!(list.capacity() > 101);
    assert_eq!(list.get(0), Some(0));
    assert_eq!(list.get(10), Some(100));
    assert_eq!(list.get(100), Some(1000));
}

/// Test: 100 cyclic keys force several rehashes and stay retrievable.
#[test]
fn test_str_table_100_cyclic_keys() {
    let words = ["prison", "guard", "zombie", "rifle", "ammo_bag"];
    let arena = Arena::new(kilobytes(32));
    let mut table = StrTable::new(&arena).unwrap();

    for i in 0..100 {
        let key = format!("{}_{i}", words[i % words.len()]);
        table.set(&key, i as i32 * 10).unwrap();
    }

    assert_eq!(table.len(), 100);
    assert!(table.capacity() > 100);
    assert_eq!(table.get("rifle_53"), Some(530));
    assert_eq!(table.get("prison_0"), Some(0));
    assert_eq!(table.get("ammo_bag_99"), Some(990));
    assert_eq!(table.get("rifle_54"), None);
}

/// Test: a removed component never resolves, even after its slot is reused.
#[test]
fn test_removed_component_reports_nothing() {
    let config = CoreConfig::default();
    let arena = Arena::new(config.arena.capacity_bytes);
    let mut world = World::with_default_pools(&arena, &config.ecs).unwrap();

    let entity = world.create_entity().unwrap();
    world.create_component::<Transform>(entity).unwrap().position = Vec2::new(10.0, 20.0);
    assert!(world.remove_component(entity, ComponentKind::TRANSFORM));
    assert!(world.get_component::<Transform>(entity).is_none());

    // Another entity takes the freed slot.
    let other = world.create_entity().unwrap();
    world.create_component::<Transform>(other).unwrap();
    assert!(world.get_component::<Transform>(entity).is_none());
    assert_eq!(
        world.get_component::<Transform>(other).map(|t| t.scale),
        Some(Vec2::ONE)
    );
}

/// Test: a scratch scope inside a frame leaves the world's arena untouched.
#[test]
fn test_frame_scratch_is_released() {
    let config = CoreConfig::default();
    let arena = Arena::new(config.arena.capacity_bytes);
    let mut world = World::with_default_pools(&arena, &config.ecs).unwrap();
    let drawable = world
        .register_view(&[ComponentKind::TRANSFORM, ComponentKind::SPRITE_RENDER])
        .unwrap();

    for i in 0..32 {
        let entity = world.create_entity().unwrap();
        world.create_component::<Transform>(entity).unwrap().position =
            Vec2::new(i as f32, 0.0);
        world.create_component::<SpriteRender>(entity).unwrap();
    }
    assert_eq!(world.view_len(drawable).unwrap(), 32);
    let used = arena.used();

    for _frame in 0..10 {
        let scratch = arena.temp();
        let mut order = HandleList::new(&scratch).unwrap();
        for entity in world.query(drawable).unwrap() {
            order.push(entity.index() as i32).unwrap();
        }
        assert_eq!(order.len(), 32);
    }

    assert_eq!(arena.used(), used);
}

/// Test: pools and the entity table report exhaustion as errors.
#[test]
fn test_capacity_errors() {
    let config = CoreConfig::from_toml_str(
        r"
        [ecs]
        max_entities = 3

        [ecs.pools]
        camera = 1
        ",
    )
    .unwrap();
    let arena = Arena::new(config.arena.capacity_bytes);
    let mut world = World::with_default_pools(&arena, &config.ecs).unwrap();

    let a = world.create_entity().unwrap();
    let b = world.create_entity().unwrap();
    world.create_entity().unwrap();
    assert_eq!(
        world.create_entity(),
        Err(EcsError::EntityTableFull { capacity: 3 })
    );

    world.create_component::<Camera>(a).unwrap();
    assert_eq!(
        world.create_component::<Camera>(b).err(),
        Some(EcsError::PoolFull {
            kind: ComponentKind::CAMERA,
            capacity: 1
        })
    );

    assert!(world.remove_entity(a));
    assert!(world.create_component::<Camera>(b).is_ok());
}

/// Test: the world's table and pools must fit in its arena.
#[test]
fn test_world_needs_room_in_its_arena() {
    let config = CoreConfig::default();
    let arena = Arena::new(kilobytes(100));
    assert!(matches!(
        World::with_default_pools(&arena, &config.ecs),
        Err(EcsError::Memory(_))
    ));
}

/// Test: views registered before a frame keep their entities across
/// scratch scopes that reuse the same arena bytes.
#[test]
fn test_views_across_frames() {
    let config = CoreConfig::default();
    let arena = Arena::new(config.arena.capacity_bytes);
    let mut world = World::with_default_pools(&arena, &config.ecs).unwrap();
    let movers = world.register_view(&[ComponentKind::TRANSFORM]).unwrap();
    let _hud = HandleList::new(&arena).unwrap();

    let spawned: Vec<_> = {
        let _frame = arena.temp();
        (0..20)
            .map(|_| {
                let entity = world.create_entity().unwrap();
                world.create_component::<Transform>(entity).unwrap();
                entity
            })
            .collect()
    };
    assert_eq!(world.query(movers).unwrap().collect::<Vec<_>>(), spawned);

    for _frame in 0..3 {
        let scratch = arena.temp();
        let mut junk = HandleList::with_capacity(&scratch, 64).unwrap();
        for _ in 0..64 {
            junk.push(500).unwrap();
        }
        assert_eq!(world.query(movers).unwrap().collect::<Vec<_>>(), spawned);
    }
}

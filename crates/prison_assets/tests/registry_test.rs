//! # Asset Registry Tests
//!
//! Loads a small prison level through the queue with an in-memory source.

use std::collections::HashMap;

use prison_assets::{
    AnimationDef, AssetConfig, AssetError, AssetKind, AssetRegistry, AssetResult, AssetSource,
    LoaderKind, MapDef, Rect, SpriteSheetDef, Texture,
};
use prison_core::{kilobytes, Arena};
use proptest::prelude::*;

#[derive(Default)]
struct MemorySource {
    sheets: HashMap<String, SpriteSheetDef>,
    animations: HashMap<String, Vec<AnimationDef>>,
    maps: HashMap<String, MapDef>,
    requests: Vec<String>,
}

impl MemorySource {
    fn missing(name: &str) -> AssetError {
        AssetError::Source {
            name: name.to_owned(),
            reason: "not found".to_owned(),
        }
    }
}

impl AssetSource for MemorySource {
    fn sprite_sheet(&mut self, name: &str) -> AssetResult<SpriteSheetDef> {
        self.requests.push(format!("sheet:{name}"));
        self.sheets.get(name).cloned().ok_or_else(|| Self::missing(name))
    }

    fn animations(&mut self, name: &str) -> AssetResult<Vec<AnimationDef>> {
        self.requests.push(format!("anim:{name}"));
        self.animations.get(name).cloned().ok_or_else(|| Self::missing(name))
    }

    fn map(&mut self, name: &str) -> AssetResult<MapDef> {
        self.requests.push(format!("map:{name}"));
        self.maps.get(name).cloned().ok_or_else(|| Self::missing(name))
    }
}

fn prison_level() -> MemorySource {
    let mut source = MemorySource::default();

    let mut sprites: Vec<(String, Rect)> = (0..4)
        .map(|i| (format!("guard_walk_{i}"), Rect::new(i as f32 * 16.0, 0.0, 16.0, 16.0)))
        .collect();
    sprites.push(("floor".into(), Rect::new(0.0, 16.0, 16.0, 16.0)));
    sprites.push(("wall".into(), Rect::new(16.0, 16.0, 16.0, 16.0)));

    source.sheets.insert(
        "characters".into(),
        SpriteSheetDef {
            texture: Texture {
                handle: 7,
                width: 64,
                height: 32,
            },
            sprites,
        },
    );
    source.animations.insert(
        "characters".into(),
        vec![AnimationDef {
            name: "guard_walk".into(),
            frame_count: 4,
            frame_duration: 0.125,
        }],
    );
    source.maps.insert(
        "cell_block".into(),
        MapDef {
            name: "cell_block".into(),
            width: 3,
            height: 2,
            tileset: vec!["floor".into(), "wall".into()],
            layers: vec![vec![1, 1, 1, 0, 0, 0]],
        },
    );
    source
}

/// Test: the queue runs in request order and every name resolves.
#[test]
fn test_load_level_through_queue() {
    let config = AssetConfig::default();
    let arena = Arena::new(config.arena_bytes);
    let mut assets = AssetRegistry::new(&arena, config).unwrap();
    let mut source = prison_level();

    assets.enqueue(LoaderKind::SpriteSheet, "characters").unwrap();
    assets.enqueue(LoaderKind::Animation, "characters").unwrap();
    assets.enqueue(LoaderKind::Map, "cell_block").unwrap();
    assert_eq!(assets.queue().len(), 3);

    assets.load_sync(&mut source).unwrap();

    assert!(assets.queue().is_empty());
    assert_eq!(
        source.requests,
        vec!["sheet:characters", "anim:characters", "map:cell_block"]
    );

    assert_eq!(assets.texture("characters").map(|t| t.handle), Some(7));
    assert_eq!(assets.count(AssetKind::Sprite), 6);

    let walk = assets.animation("guard_walk").unwrap();
    assert_eq!(walk.frames.len(), 4);
    let frame = walk.frame_at(0.3).unwrap();
    assert_eq!(
        assets.sprite_at(frame).map(|s| s.source.x),
        assets.sprite("guard_walk_2").map(|s| s.source.x)
    );

    let map = assets.map("cell_block").unwrap();
    let wall = map.tile_at(0, 0, 0).unwrap();
    let wall_sprite = assets.tile(wall).unwrap().sprite;
    assert_eq!(Some(wall_sprite), assets.index_of(AssetKind::Sprite, "wall"));
}

/// Test: a source failure stops the run and clears the queue.
#[test]
fn test_source_failure_stops_loading() {
    let arena = Arena::new(kilobytes(64));
    let mut assets = AssetRegistry::new(&arena, AssetConfig::default()).unwrap();
    let mut source = prison_level();

    assets.enqueue(LoaderKind::SpriteSheet, "items").unwrap();
    assets.enqueue(LoaderKind::SpriteSheet, "characters").unwrap();

    let err = assets.load_sync(&mut source).unwrap_err();
    assert!(matches!(err, AssetError::Source { ref name, .. } if name == "items"));
    assert_eq!(source.requests, vec!["sheet:items"]);
    assert!(assets.queue().is_empty());
    assert_eq!(assets.count(AssetKind::Texture), 0);
}

/// Test: animations loaded before their sprites fail with the frame name.
#[test]
fn test_animation_before_sheet_fails() {
    let arena = Arena::new(kilobytes(64));
    let mut assets = AssetRegistry::new(&arena, AssetConfig::default()).unwrap();
    let mut source = prison_level();

    assets.enqueue(LoaderKind::Animation, "characters").unwrap();
    let err = assets.load_sync(&mut source).unwrap_err();
    assert!(matches!(err, AssetError::UnknownSprite(ref name) if name == "guard_walk_0"));
}

/// Test: a second map overruns the single map slot.
#[test]
fn test_map_capacity() {
    let arena = Arena::new(kilobytes(64));
    let mut assets = AssetRegistry::new(&arena, AssetConfig::default()).unwrap();
    let mut source = prison_level();

    assets.enqueue(LoaderKind::SpriteSheet, "characters").unwrap();
    assets.enqueue(LoaderKind::Map, "cell_block").unwrap();
    assets.enqueue(LoaderKind::Map, "cell_block").unwrap();

    let err = assets.load_sync(&mut source).unwrap_err();
    assert!(matches!(
        err,
        AssetError::CapacityExceeded {
            kind: AssetKind::Map,
            capacity: 1
        }
    ));
    assert_eq!(assets.count(AssetKind::Tile), 2);
}

/// Test: a map whose cells point past its tileset fails the run without
/// registering tiles.
#[test]
fn test_malformed_map_is_rejected() {
    let arena = Arena::new(kilobytes(64));
    let mut assets = AssetRegistry::new(&arena, AssetConfig::default()).unwrap();
    let mut source = prison_level();
    if let Some(map) = source.maps.get_mut("cell_block") {
        map.layers.push(vec![0, 0, 7, 0, 0, 0]);
    }

    assets.enqueue(LoaderKind::SpriteSheet, "characters").unwrap();
    assets.enqueue(LoaderKind::Map, "cell_block").unwrap();
    let err = assets.load_sync(&mut source).unwrap_err();

    assert!(matches!(
        err,
        AssetError::UnknownTile { ref map, layer: 1, cell: 7, tileset_len: 2 } if map == "cell_block"
    ));
    assert_eq!(assets.count(AssetKind::Tile), 0);
    assert!(assets.map("cell_block").is_none());
}

/// Test: the asset arena is too small for the sprite name table.
#[test]
fn test_arena_too_small() {
    let arena = Arena::new(kilobytes(4));
    let err = AssetRegistry::new(&arena, AssetConfig::default()).unwrap_err();
    assert!(matches!(err, AssetError::Memory(_)));
}

proptest! {
    /// Every sprite name resolves to the last index added under it.
    #[test]
    fn prop_sprite_names_resolve_to_latest(names in prop::collection::vec("[a-z]{1,6}", 1..64)) {
        let arena = Arena::new(kilobytes(64));
        let mut assets = AssetRegistry::new(&arena, AssetConfig::default()).unwrap();
        assets.add_texture("atlas", Texture::default()).unwrap();

        let mut latest = HashMap::new();
        for name in &names {
            let index = assets
                .add_sprite(name, prison_assets::Sprite::default())
                .unwrap();
            latest.insert(name.clone(), index);
        }

        prop_assert_eq!(assets.count(AssetKind::Sprite), names.len());
        for (name, index) in &latest {
            prop_assert_eq!(assets.index_of(AssetKind::Sprite, name), Some(*index));
        }
    }
}

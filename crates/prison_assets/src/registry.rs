//! # Asset Registry
//!
//! Fixed-capacity pools of asset records plus one name table per named
//! kind. Names live in [`StrTable`]s in the asset arena; records live in
//! pre-sized `Vec`s and are addressed by index.
//!
//! Adding a name that is already registered points the name at the new
//! record. The old record stays in its pool.

use prison_core::{Arena, StrTable};

use crate::config::AssetConfig;
use crate::error::{AssetError, AssetResult};
use crate::loader::{AssetSource, LoadQueue, LoaderKind};
use crate::records::{
    AnimationDef, AssetKind, Animation, MapDef, Sprite, SpriteSheetDef, Texture, Tile, TileMap,
};

/// Name-indexed store of every loaded asset.
///
/// # Example
///
/// ```rust,ignore
/// let arena = Arena::new(config.arena_bytes);
/// let mut assets = AssetRegistry::new(&arena, config)?;
/// assets.enqueue(LoaderKind::SpriteSheet, "characters")?;
/// assets.enqueue(LoaderKind::Animation, "characters")?;
/// assets.load_sync(&mut source)?;
///
/// let idle = assets.animation("player_idle").unwrap();
/// ```
#[derive(Debug)]
pub struct AssetRegistry<'a> {
    config: AssetConfig,
    queue: LoadQueue,

    textures: Vec<Texture>,
    sprites: Vec<Sprite>,
    animations: Vec<Animation>,
    tiles: Vec<Tile>,
    maps: Vec<TileMap>,

    texture_names: StrTable<'a>,
    sprite_names: StrTable<'a>,
    animation_names: StrTable<'a>,
    map_names: StrTable<'a>,
}

impl<'a> AssetRegistry<'a> {
    /// Creates an empty registry whose name tables live in `arena`.
    ///
    /// # Errors
    ///
    /// [`AssetError::Config`] for an invalid config,
    /// [`AssetError::Memory`] if the arena cannot hold the name tables.
    pub fn new(arena: &'a Arena, config: AssetConfig) -> AssetResult<Self> {
        config.validate()?;
        Ok(Self {
            queue: LoadQueue::new(config.queue_len),
            textures: Vec::with_capacity(config.textures),
            sprites: Vec::with_capacity(config.sprites),
            animations: Vec::with_capacity(config.animations),
            tiles: Vec::with_capacity(config.tiles),
            maps: Vec::with_capacity(config.maps),
            texture_names: StrTable::new(arena)?,
            sprite_names: StrTable::with_capacity(arena, config.name_slots)?,
            animation_names: StrTable::new(arena)?,
            map_names: StrTable::new(arena)?,
            config,
        })
    }

    /// The sizing this registry was created with.
    #[must_use]
    pub const fn config(&self) -> &AssetConfig {
        &self.config
    }

    /// Number of records of `kind`.
    #[must_use]
    pub fn count(&self, kind: AssetKind) -> usize {
        match kind {
            AssetKind::Texture => self.textures.len(),
            AssetKind::Sprite => self.sprites.len(),
            AssetKind::Animation => self.animations.len(),
            AssetKind::Tile => self.tiles.len(),
            AssetKind::Map => self.maps.len(),
        }
    }

    /// Capacity of the pool for `kind`.
    #[must_use]
    pub const fn capacity(&self, kind: AssetKind) -> usize {
        match kind {
            AssetKind::Texture => self.config.textures,
            AssetKind::Sprite => self.config.sprites,
            AssetKind::Animation => self.config.animations,
            AssetKind::Tile => self.config.tiles,
            AssetKind::Map => self.config.maps,
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Adds a texture under `name` and returns its index.
    ///
    /// # Errors
    ///
    /// [`AssetError::CapacityExceeded`] or [`AssetError::Memory`].
    pub fn add_texture(&mut self, name: &str, texture: Texture) -> AssetResult<u32> {
        self.ensure_room(AssetKind::Texture)?;
        let index = self.textures.len() as u32;
        self.texture_names.set(name, index as i32)?;
        self.textures.push(texture);
        Ok(index)
    }

    /// Adds a sprite under `name` and returns its index.
    ///
    /// # Errors
    ///
    /// [`AssetError::UnknownTexture`] if `sprite.texture` was never added,
    /// [`AssetError::CapacityExceeded`] or [`AssetError::Memory`].
    pub fn add_sprite(&mut self, name: &str, sprite: Sprite) -> AssetResult<u32> {
        if sprite.texture as usize >= self.textures.len() {
            return Err(AssetError::UnknownTexture(sprite.texture));
        }
        self.ensure_room(AssetKind::Sprite)?;
        let index = self.sprites.len() as u32;
        self.sprite_names.set(name, index as i32)?;
        self.sprites.push(sprite);
        Ok(index)
    }

    /// Adds an animation under `name` and returns its index.
    ///
    /// # Errors
    ///
    /// [`AssetError::TooManyFrames`], [`AssetError::CapacityExceeded`] or
    /// [`AssetError::Memory`].
    pub fn add_animation(&mut self, name: &str, animation: Animation) -> AssetResult<u32> {
        if animation.frames.len() > self.config.max_anim_frames {
            return Err(AssetError::TooManyFrames {
                name: name.to_owned(),
                frames: animation.frames.len(),
                max: self.config.max_anim_frames,
            });
        }
        self.ensure_room(AssetKind::Animation)?;
        let index = self.animations.len() as u32;
        self.animation_names.set(name, index as i32)?;
        self.animations.push(animation);
        Ok(index)
    }

    /// Adds a tile drawing `sprite` and returns its id.
    ///
    /// # Errors
    ///
    /// [`AssetError::CapacityExceeded`].
    pub fn add_tile(&mut self, sprite: u32) -> AssetResult<u32> {
        self.ensure_room(AssetKind::Tile)?;
        let id = self.tiles.len() as u32;
        self.tiles.push(Tile { id, sprite });
        Ok(id)
    }

    /// Adds a map under `name` and returns its index.
    ///
    /// # Errors
    ///
    /// [`AssetError::CapacityExceeded`] or [`AssetError::Memory`].
    pub fn add_map(&mut self, name: &str, map: TileMap) -> AssetResult<u32> {
        self.ensure_room(AssetKind::Map)?;
        let index = self.maps.len() as u32;
        self.map_names.set(name, index as i32)?;
        self.maps.push(map);
        Ok(index)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Index registered for `name` in the `kind` table. Tiles have no names.
    #[must_use]
    pub fn index_of(&self, kind: AssetKind, name: &str) -> Option<u32> {
        let table = match kind {
            AssetKind::Texture => &self.texture_names,
            AssetKind::Sprite => &self.sprite_names,
            AssetKind::Animation => &self.animation_names,
            AssetKind::Map => &self.map_names,
            AssetKind::Tile => return None,
        };
        table.get(name).and_then(|index| u32::try_from(index).ok())
    }

    /// Texture registered as `name`.
    #[must_use]
    pub fn texture(&self, name: &str) -> Option<&Texture> {
        self.textures
            .get(self.index_of(AssetKind::Texture, name)? as usize)
    }

    /// Sprite registered as `name`.
    #[must_use]
    pub fn sprite(&self, name: &str) -> Option<&Sprite> {
        self.sprite_at(self.index_of(AssetKind::Sprite, name)?)
    }

    /// Sprite at `index`.
    #[must_use]
    pub fn sprite_at(&self, index: u32) -> Option<&Sprite> {
        self.sprites.get(index as usize)
    }

    /// Animation registered as `name`.
    #[must_use]
    pub fn animation(&self, name: &str) -> Option<&Animation> {
        self.animation_at(self.index_of(AssetKind::Animation, name)?)
    }

    /// Animation at `index`.
    #[must_use]
    pub fn animation_at(&self, index: u32) -> Option<&Animation> {
        self.animations.get(index as usize)
    }

    /// Tile with `id`.
    #[must_use]
    pub fn tile(&self, id: u32) -> Option<&Tile> {
        self.tiles.get(id as usize)
    }

    /// Map registered as `name`.
    #[must_use]
    pub fn map(&self, name: &str) -> Option<&TileMap> {
        self.map_at(self.index_of(AssetKind::Map, name)?)
    }

    /// Map at `index`.
    #[must_use]
    pub fn map_at(&self, index: u32) -> Option<&TileMap> {
        self.maps.get(index as usize)
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Queues `name` for `loader`.
    ///
    /// # Errors
    ///
    /// [`AssetError::QueueFull`].
    pub fn enqueue(&mut self, loader: LoaderKind, name: &str) -> AssetResult<()> {
        self.queue.push(loader, name)
    }

    /// Pending load requests.
    #[must_use]
    pub const fn queue(&self) -> &LoadQueue {
        &self.queue
    }

    /// Runs every queued load against `source`, in request order.
    ///
    /// Stops at the first failure; entries after it are dropped along with
    /// the failed one.
    ///
    /// # Errors
    ///
    /// The first error from the source or from registration.
    pub fn load_sync<S: AssetSource + ?Sized>(&mut self, source: &mut S) -> AssetResult<()> {
        for entry in self.queue.take() {
            let loaded = match entry.loader {
                LoaderKind::SpriteSheet => source
                    .sprite_sheet(&entry.name)
                    .and_then(|sheet| self.load_sprite_sheet(&entry.name, sheet).map(drop)),
                LoaderKind::Animation => source
                    .animations(&entry.name)
                    .and_then(|defs| self.load_animations(&defs).map(drop)),
                LoaderKind::Map => source
                    .map(&entry.name)
                    .and_then(|def| self.load_map(def).map(drop)),
            };
            if let Err(err) = loaded {
                tracing::error!(name = %entry.name, loader = ?entry.loader, %err, "error loading asset");
                return Err(err);
            }
            tracing::debug!(name = %entry.name, loader = ?entry.loader, "loaded asset");
        }
        Ok(())
    }

    /// Registers a texture under `name` and each of its sprites under their
    /// own names. Returns the texture index.
    ///
    /// # Errors
    ///
    /// As [`AssetRegistry::add_texture`] and [`AssetRegistry::add_sprite`].
    pub fn load_sprite_sheet(&mut self, name: &str, sheet: SpriteSheetDef) -> AssetResult<u32> {
        let texture = self.add_texture(name, sheet.texture)?;
        for (sprite_name, source) in &sheet.sprites {
            self.add_sprite(sprite_name, Sprite { texture, source: *source })?;
        }
        Ok(texture)
    }

    /// Registers animations, resolving frame `i` of `name` to the sprite
    /// `"{name}_{i}"`. Returns the number registered.
    ///
    /// # Errors
    ///
    /// [`AssetError::UnknownSprite`] for a missing frame sprite, otherwise as
    /// [`AssetRegistry::add_animation`].
    pub fn load_animations(&mut self, defs: &[AnimationDef]) -> AssetResult<usize> {
        for def in defs {
            if def.frame_count > self.config.max_anim_frames {
                return Err(AssetError::TooManyFrames {
                    name: def.name.clone(),
                    frames: def.frame_count,
                    max: self.config.max_anim_frames,
                });
            }
            let frames = (0..def.frame_count)
                .map(|i| {
                    let frame = format!("{}_{i}", def.name);
                    self.index_of(AssetKind::Sprite, &frame)
                        .ok_or(AssetError::UnknownSprite(frame))
                })
                .collect::<AssetResult<Vec<_>>>()?;
            self.add_animation(
                &def.name,
                Animation {
                    frames,
                    frame_duration: def.frame_duration,
                },
            )?;
        }
        Ok(defs.len())
    }

    /// Registers a map and its tileset. Tileset entries become new tiles
    /// and the map's cells are shifted to those tile ids. Returns the map
    /// index.
    ///
    /// Every layer must hold `width * height` cells and every cell must
    /// index the map's tileset; otherwise nothing is registered.
    ///
    /// # Errors
    ///
    /// [`AssetError::LayerSize`] or [`AssetError::UnknownTile`] for a
    /// malformed layer, [`AssetError::UnknownSprite`] for a tileset entry
    /// that names no sprite, otherwise as [`AssetRegistry::add_tile`] and
    /// [`AssetRegistry::add_map`].
    pub fn load_map(&mut self, def: MapDef) -> AssetResult<u32> {
        check_layers(&def)?;

        let sprites = def
            .tileset
            .iter()
            .map(|name| {
                self.index_of(AssetKind::Sprite, name)
                    .ok_or_else(|| AssetError::UnknownSprite(name.clone()))
            })
            .collect::<AssetResult<Vec<_>>>()?;

        let free_tiles = self.config.tiles - self.tiles.len();
        if sprites.len() > free_tiles || self.maps.len() >= self.config.maps {
            let (kind, capacity) = if self.maps.len() >= self.config.maps {
                (AssetKind::Map, self.config.maps)
            } else {
                (AssetKind::Tile, self.config.tiles)
            };
            tracing::warn!(%kind, capacity, map = %def.name, "asset pool full");
            return Err(AssetError::CapacityExceeded { kind, capacity });
        }

        let first_tile = self.tiles.len() as u32;
        let layers = def
            .layers
            .into_iter()
            .map(|layer| {
                layer
                    .into_iter()
                    .map(|cell| cell.checked_add(first_tile))
                    .collect::<Option<Vec<_>>>()
            })
            .collect::<Option<Vec<_>>>()
            .ok_or(AssetError::CapacityExceeded {
                kind: AssetKind::Tile,
                capacity: self.config.tiles,
            })?;
        for sprite in sprites {
            self.add_tile(sprite)?;
        }

        self.add_map(
            &def.name,
            TileMap {
                width: def.width,
                height: def.height,
                layers,
            },
        )
    }

    fn ensure_room(&self, kind: AssetKind) -> AssetResult<()> {
        let capacity = self.capacity(kind);
        if self.count(kind) >= capacity {
            tracing::warn!(%kind, capacity, "asset pool full");
            return Err(AssetError::CapacityExceeded { kind, capacity });
        }
        Ok(())
    }
}

fn check_layers(def: &MapDef) -> AssetResult<()> {
    let expected = u64::from(def.width) * u64::from(def.height);
    for (layer, cells) in def.layers.iter().enumerate() {
        if cells.len() as u64 != expected {
            tracing::warn!(map = %def.name, layer, len = cells.len(), expected, "bad map layer");
            return Err(AssetError::LayerSize {
                map: def.name.clone(),
                layer,
                len: cells.len(),
                expected,
            });
        }
        if let Some(&cell) = cells.iter().find(|&&cell| cell as usize >= def.tileset.len()) {
            tracing::warn!(map = %def.name, layer, cell, "map cell outside tileset");
            return Err(AssetError::UnknownTile {
                map: def.name.clone(),
                layer,
                cell,
                tileset_len: def.tileset.len(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Rect;
    use prison_core::kilobytes;

    fn registry(arena: &Arena) -> AssetRegistry<'_> {
        AssetRegistry::new(arena, AssetConfig::default()).unwrap()
    }

    fn sheet() -> SpriteSheetDef {
        SpriteSheetDef {
            texture: Texture {
                handle: 1,
                width: 64,
                height: 16,
            },
            sprites: (0..4)
                .map(|i| (format!("player_idle_{i}"), Rect::new(i as f32 * 16.0, 0.0, 16.0, 16.0)))
                .chain([("floor".to_string(), Rect::new(0.0, 16.0, 16.0, 16.0))])
                .collect(),
        }
    }

    #[test]
    fn sprite_sheet_registers_every_sprite() {
        let arena = Arena::new(kilobytes(64));
        let mut assets = registry(&arena);
        let texture = assets.load_sprite_sheet("characters", sheet()).unwrap();

        assert_eq!(texture, 0);
        assert_eq!(assets.count(AssetKind::Sprite), 5);
        assert_eq!(assets.texture("characters").map(|t| t.width), Some(64));
        assert_eq!(
            assets.sprite("player_idle_2").map(|s| s.source.x),
            Some(32.0)
        );
        assert_eq!(assets.sprite("missing"), None);
    }

    #[test]
    fn animations_resolve_frames_by_name() {
        let arena = Arena::new(kilobytes(64));
        let mut assets = registry(&arena);
        assets.load_sprite_sheet("characters", sheet()).unwrap();
        assets
            .load_animations(&[AnimationDef {
                name: "player_idle".into(),
                frame_count: 4,
                frame_duration: 0.2,
            }])
            .unwrap();

        let idle = assets.animation("player_idle").unwrap();
        assert_eq!(idle.frames, vec![0, 1, 2, 3]);
        assert_eq!(idle.frame_at(0.5), Some(2));

        let err = assets
            .load_animations(&[AnimationDef {
                name: "player_run".into(),
                frame_count: 2,
                frame_duration: 0.1,
            }])
            .unwrap_err();
        assert!(matches!(err, AssetError::UnknownSprite(name) if name == "player_run_0"));
    }

    #[test]
    fn frame_limit_is_enforced() {
        let arena = Arena::new(kilobytes(64));
        let mut assets = registry(&arena);
        let err = assets
            .add_animation(
                "long",
                Animation {
                    frames: vec![0; 5],
                    frame_duration: 0.1,
                },
            )
            .unwrap_err();
        assert!(matches!(err, AssetError::TooManyFrames { frames: 5, max: 4, .. }));
    }

    #[test]
    fn map_tiles_are_offset_past_existing_tiles() {
        let arena = Arena::new(kilobytes(64));
        let mut assets = registry(&arena);
        assets.load_sprite_sheet("characters", sheet()).unwrap();
        assets.add_tile(0).unwrap();

        let index = assets
            .load_map(MapDef {
                name: "prison".into(),
                width: 2,
                height: 1,
                tileset: vec!["floor".into(), "player_idle_0".into()],
                layers: vec![vec![0, 1], vec![1, 1]],
            })
            .unwrap();

        let map = assets.map("prison").unwrap();
        assert_eq!(index, 0);
        assert_eq!(map.layers, vec![vec![1, 2], vec![2, 2]]);
        assert_eq!(assets.tile(1).map(|t| t.sprite), Some(4));
        assert_eq!(assets.tile(2).map(|t| t.sprite), Some(0));
    }

    fn cell_block(layers: Vec<Vec<u32>>) -> MapDef {
        MapDef {
            name: "cell_block".into(),
            width: 2,
            height: 2,
            tileset: vec!["floor".into(), "player_idle_0".into()],
            layers,
        }
    }

    #[test]
    fn cells_outside_the_tileset_are_rejected() {
        let arena = Arena::new(kilobytes(64));
        let mut assets = registry(&arena);
        assets.load_sprite_sheet("characters", sheet()).unwrap();

        let err = assets
            .load_map(cell_block(vec![vec![0, 1, 1, 0], vec![0, 2, 0, 0]]))
            .unwrap_err();
        assert!(matches!(
            err,
            AssetError::UnknownTile { layer: 1, cell: 2, tileset_len: 2, .. }
        ));

        let err = assets
            .load_map(cell_block(vec![vec![0, u32::MAX, 0, 0]]))
            .unwrap_err();
        assert!(matches!(err, AssetError::UnknownTile { cell: u32::MAX, .. }));

        assert_eq!(assets.count(AssetKind::Tile), 0);
        assert_eq!(assets.count(AssetKind::Map), 0);
        assert!(assets.map("cell_block").is_none());
    }

    #[test]
    fn layers_must_cover_the_map() {
        let arena = Arena::new(kilobytes(64));
        let mut assets = registry(&arena);
        assets.load_sprite_sheet("characters", sheet()).unwrap();

        let err = assets
            .load_map(cell_block(vec![vec![0, 0, 0, 0], vec![1, 1, 1]]))
            .unwrap_err();
        assert!(matches!(
            err,
            AssetError::LayerSize { layer: 1, len: 3, expected: 4, .. }
        ));
        assert_eq!(assets.count(AssetKind::Tile), 0);

        let index = assets
            .load_map(cell_block(vec![vec![0, 1, 1, 0]]))
            .unwrap();
        assert_eq!(assets.map_at(index).and_then(|m| m.tile_at(0, 1, 1)), Some(0));
    }

    #[test]
    fn pools_are_bounded() {
        let arena = Arena::new(kilobytes(64));
        let config = AssetConfig {
            textures: 1,
            ..AssetConfig::default()
        };
        let mut assets = AssetRegistry::new(&arena, config).unwrap();
        assets.add_texture("a", Texture::default()).unwrap();
        assert!(matches!(
            assets.add_texture("b", Texture::default()),
            Err(AssetError::CapacityExceeded {
                kind: AssetKind::Texture,
                capacity: 1
            })
        ));
        assert!(matches!(
            assets.add_sprite("s", Sprite { texture: 3, ..Sprite::default() }),
            Err(AssetError::UnknownTexture(3))
        ));
    }

    #[test]
    fn re_adding_a_name_points_at_the_new_record() {
        let arena = Arena::new(kilobytes(64));
        let mut assets = registry(&arena);
        assets.add_texture("atlas", Texture::default()).unwrap();
        let first = assets.add_sprite("hero", Sprite::default()).unwrap();
        let second = assets.add_sprite("hero", Sprite::default()).unwrap();
        assert_ne!(first, second);
        assert_eq!(assets.index_of(AssetKind::Sprite, "hero"), Some(second));
        assert_eq!(assets.count(AssetKind::Sprite), 2);
    }

    #[test]
    fn tiles_have_no_names() {
        let arena = Arena::new(kilobytes(64));
        let assets = registry(&arena);
        assert_eq!(assets.index_of(AssetKind::Tile, "floor"), None);
    }
}

//! # Asset Records
//!
//! Registered assets are plain records that refer to each other by index:
//! a sprite names its texture, an animation its frame sprites, a tile its
//! sprite, a map layer its tiles.
//!
//! The `*Def` types are what an [`AssetSource`](crate::AssetSource) hands
//! over before names are resolved.

/// The pools an asset can live in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// GPU textures (metadata only).
    Texture,
    /// Rectangles of a texture.
    Sprite,
    /// Frame sequences.
    Animation,
    /// Map tiles.
    Tile,
    /// Tile maps.
    Map,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Texture => "texture",
            Self::Sprite => "sprite",
            Self::Animation => "animation",
            Self::Tile => "tile",
            Self::Map => "map",
        })
    }
}

/// An axis-aligned rectangle in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// Creates a rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A texture the renderer has uploaded. The registry only keeps what it
/// needs to resolve sprites.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Texture {
    /// Renderer handle for the uploaded image.
    pub handle: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// A rectangle of a texture.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sprite {
    /// Index of the texture in the registry.
    pub texture: u32,
    /// Source rectangle inside the texture.
    pub source: Rect,
}

/// A looping sequence of sprites.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Animation {
    /// Sprite index per frame.
    pub frames: Vec<u32>,
    /// Seconds each frame is shown.
    pub frame_duration: f32,
}

impl Animation {
    /// Sprite shown `time` seconds into the animation.
    ///
    /// Frames loop. A non-positive duration pins the first frame. `None` for
    /// an animation without frames.
    #[must_use]
    pub fn frame_at(&self, time: f32) -> Option<u32> {
        if self.frames.is_empty() {
            return None;
        }
        if self.frame_duration <= 0.0 || time <= 0.0 {
            return self.frames.first().copied();
        }
        let step = (time / self.frame_duration) as usize;
        self.frames.get(step % self.frames.len()).copied()
    }

    /// Seconds for one full loop.
    #[must_use]
    pub fn loop_duration(&self) -> f32 {
        self.frame_duration * self.frames.len() as f32
    }
}

/// One tile of a tileset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tile {
    /// Tile id, equal to its index in the registry.
    pub id: u32,
    /// Sprite index drawn for the tile.
    pub sprite: u32,
}

/// A layered tile map. Layer cells hold registry tile ids.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TileMap {
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    /// Row-major tile ids per layer.
    pub layers: Vec<Vec<u32>>,
}

impl TileMap {
    /// Number of layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Tile id at `(x, y)` of `layer`.
    #[must_use]
    pub fn tile_at(&self, layer: usize, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.layers.get(layer)?.get(index).copied()
    }
}

/// A texture plus the named sprites cut from it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpriteSheetDef {
    /// The uploaded texture.
    pub texture: Texture,
    /// `(sprite name, source rectangle)` per sprite.
    pub sprites: Vec<(String, Rect)>,
}

/// An animation whose frames are the sprites `"{name}_0"`, `"{name}_1"`, ...
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimationDef {
    /// Animation name.
    pub name: String,
    /// Number of frames.
    pub frame_count: usize,
    /// Seconds each frame is shown.
    pub frame_duration: f32,
}

/// A map whose layer cells index its own tileset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MapDef {
    /// Map name.
    pub name: String,
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    /// Sprite name per tileset entry.
    pub tileset: Vec<String>,
    /// Row-major tileset indices per layer.
    pub layers: Vec<Vec<u32>>,
}

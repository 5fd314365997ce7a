//! # Component System
//!
//! Components are pure data records with no behavior. Each record type
//! names its [`ComponentKind`]; the kind indexes the entity's component
//! table and selects the pool registered for it.

use bytemuck::{Pod, Zeroable};

/// Number of distinct component kinds an entity can carry.
pub const MAX_COMPONENT_KINDS: usize = 32;

/// Tag selecting a component pool. Values are `0..MAX_COMPONENT_KINDS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ComponentKind(u8);

impl ComponentKind {
    /// [`Transform`] records.
    pub const TRANSFORM: Self = Self(0);
    /// [`SpriteRender`] records.
    pub const SPRITE_RENDER: Self = Self(1);
    /// [`AnimRender`] records.
    pub const ANIM_RENDER: Self = Self(2);
    /// [`MapRender`] records.
    pub const MAP_RENDER: Self = Self(3);
    /// [`Camera`] records.
    pub const CAMERA: Self = Self(4);

    /// Kinds below this value are reserved for the built-in records.
    pub const FIRST_USER: u8 = 8;

    /// Creates a kind, or `None` if `raw` is out of range.
    #[inline]
    #[must_use]
    pub const fn new(raw: u8) -> Option<Self> {
        if (raw as usize) < MAX_COMPONENT_KINDS {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// The `offset`-th kind past the built-in range, or `None` if it would
    /// exceed [`MAX_COMPONENT_KINDS`].
    #[inline]
    #[must_use]
    pub const fn user(offset: u8) -> Option<Self> {
        match Self::FIRST_USER.checked_add(offset) {
            Some(raw) => Self::new(raw),
            None => None,
        }
    }

    /// Index into per-kind tables.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Bit of this kind in a component mask.
    #[inline]
    #[must_use]
    pub const fn bit(self) -> u32 {
        1 << self.0
    }

    /// Mask with the bit of every kind in `kinds` set.
    #[must_use]
    pub fn mask_of(kinds: &[Self]) -> u32 {
        kinds.iter().fold(0, |mask, kind| mask | kind.bit())
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::TRANSFORM => f.write_str("transform"),
            Self::SPRITE_RENDER => f.write_str("sprite-render"),
            Self::ANIM_RENDER => f.write_str("anim-render"),
            Self::MAP_RENDER => f.write_str("map-render"),
            Self::CAMERA => f.write_str("camera"),
            Self(raw) => write!(f, "#{raw}"),
        }
    }
}

/// Id of a component slot inside its pool.
///
/// Same layout as [`EntityId`](super::EntityId): slot index in the low 32
/// bits, slot generation in the high 32 bits. A removed-then-reused slot has
/// a new generation, so old ids stop resolving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ComponentId(u64);

impl ComponentId {
    /// No component.
    pub const NULL: Self = Self(u64::MAX);

    /// Creates an id from slot index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Slot generation.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Checks for [`ComponentId::NULL`].
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }
}

impl Default for ComponentId {
    fn default() -> Self {
        Self::NULL
    }
}

/// Marker trait for ECS components.
///
/// Components must be:
/// - `Copy`: No heap allocations, bitwise copyable
/// - `Pod`: Plain old data
/// - `Default`: The value a freshly created component starts with
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Copy, Default, Pod, Zeroable)]
/// #[repr(C)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {
///     const KIND: ComponentKind = match ComponentKind::user(0) {
///         Some(kind) => kind,
///         None => panic!(),
///     };
/// }
/// ```
pub trait Component: Copy + Pod + Zeroable + Default + Send + Sync + 'static {
    /// The kind this record type is stored under.
    const KIND: ComponentKind;
}

/// A 2D vector in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vec2 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
}

impl Vec2 {
    /// `(0, 0)`.
    pub const ZERO: Self = Self::new(0.0, 0.0);
    /// `(1, 1)`.
    pub const ONE: Self = Self::new(1.0, 1.0);

    /// Creates a vector.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Placement of an entity in the world.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Transform {
    /// World position.
    pub position: Vec2,
    /// Scale factor per axis.
    pub scale: Vec2,
    /// Rotation in degrees.
    pub rotation: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
        }
    }
}

impl Component for Transform {
    const KIND: ComponentKind = ComponentKind::TRANSFORM;
}

/// Draws a single sprite at the entity's transform.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct SpriteRender {
    /// Index of the sprite in the asset registry.
    pub sprite: u32,
    /// Pivot, as a fraction of the sprite size.
    pub pivot: Vec2,
    /// RGBA tint.
    pub tint: [u8; 4],
    /// Non-zero mirrors horizontally.
    pub flip_x: u8,
    /// Non-zero mirrors vertically.
    pub flip_y: u8,
    /// Padding.
    pub _padding: [u8; 2],
}

impl SpriteRender {
    /// Opaque white.
    pub const WHITE: [u8; 4] = [255, 255, 255, 255];

    /// Returns `true` if the sprite is mirrored horizontally.
    #[inline]
    #[must_use]
    pub const fn flipped_x(&self) -> bool {
        self.flip_x != 0
    }

    /// Returns `true` if the sprite is mirrored vertically.
    #[inline]
    #[must_use]
    pub const fn flipped_y(&self) -> bool {
        self.flip_y != 0
    }

    /// Sets both flip flags.
    #[inline]
    pub fn set_flip(&mut self, x: bool, y: bool) {
        self.flip_x = u8::from(x);
        self.flip_y = u8::from(y);
    }
}

impl Default for SpriteRender {
    fn default() -> Self {
        Self {
            sprite: 0,
            pivot: Vec2::ZERO,
            tint: Self::WHITE,
            flip_x: 0,
            flip_y: 0,
            _padding: [0; 2],
        }
    }
}

impl Component for SpriteRender {
    const KIND: ComponentKind = ComponentKind::SPRITE_RENDER;
}

/// Plays an animation from the asset registry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct AnimRender {
    /// Index of the animation in the asset registry.
    pub animation: u32,
    /// Seconds since the animation started.
    pub frame_time: f32,
}

impl AnimRender {
    /// Advances the animation clock.
    #[inline]
    pub fn advance(&mut self, dt: f32) {
        self.frame_time += dt;
    }
}

impl Component for AnimRender {
    const KIND: ComponentKind = ComponentKind::ANIM_RENDER;
}

/// Draws a tile map's layers.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct MapRender {
    /// Index of the map in the asset registry.
    pub map: u32,
    /// Number of layers to draw.
    pub layer_count: u32,
    /// Tile width in pixels.
    pub tile_width: u32,
    /// Tile height in pixels.
    pub tile_height: u32,
    /// Target width in pixels.
    pub screen_width: u32,
    /// Target height in pixels.
    pub screen_height: u32,
    /// Scale applied to every layer.
    pub scale: Vec2,
}

impl Default for MapRender {
    fn default() -> Self {
        Self {
            map: 0,
            layer_count: 0,
            tile_width: 0,
            tile_height: 0,
            screen_width: 0,
            screen_height: 0,
            scale: Vec2::ONE,
        }
    }
}

impl Component for MapRender {
    const KIND: ComponentKind = ComponentKind::MAP_RENDER;
}

/// A 2D camera following a target.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Camera {
    /// World point the camera looks at.
    pub target: Vec2,
    /// Screen offset of the target.
    pub offset: Vec2,
    /// Rotation in degrees.
    pub rotation: f32,
    /// Zoom factor.
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            target: Vec2::ZERO,
            offset: Vec2::ZERO,
            rotation: 0.0,
            zoom: 1.0,
        }
    }
}

impl Component for Camera {
    const KIND: ComponentKind = ComponentKind::CAMERA;
}

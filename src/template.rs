//! Entity templates.
//!
//! Scene content arrives as already-resolved attribute dictionaries: for each
//! entity, a map from component name to a map of field name to value. This
//! module turns those dictionaries into components and attaches them to a
//! [`Scene`], failing with a [`TemplateError`] that names the entity, the
//! component and the field when something is missing or malformed.
//!
//! A [`SceneFile`] is the JSON form used by the demo binary:
//!
//! ```json
//! {
//!   "entities": [
//!     { "name": "player", "kind": "player", "components": {
//!         "transform": { "x": 16, "y": 16 },
//!         "rigidbody": { "mass": 1 },
//!         "collider": { "width": 16, "height": 16, "layer": "player", "mask": "wall|item" },
//!         "input_controller": { "speed": 120 }
//!     } }
//!   ],
//!   "tile_surfaces": [ { "layer": "walls", "map": { "tile_size": 16, ... } } ]
//! }
//! ```
//!
//! Field reference (`?` marks optional fields, defaults in brackets):
//! - `transform`: `x`, `y`, `rotation?` [0], `scale_x?` [1], `scale_y?` [1]
//! - `rigidbody`: `mass?` [1], `vx?`, `vy?`, `ax?`, `ay?`, `max_speed?`, `frozen?`
//! - `collider`: `width`, `height`, `offset_x?`, `offset_y?`, `trigger?`, `tag?`,
//!   `layer?` [default], `mask?` [all], `enabled?` [true]
//! - `sprite`: `tex_key`, `width`, `height`, `x?`, `y?`, `origin_x?`, `origin_y?`,
//!   `depth?`, `flip_h?`, `flip_v?`, `visible?` [true]
//! - `animation`: `initial`, plus one entry per clip keyed by action name with
//!   value `"x y w h frames delay [once]"`
//! - `input_controller`: `speed`, `player?`, `up?`, `down?`, `left?`, `right?`,
//!   `action?`, `jump?` (key lists, `|`-separated), `use_left_stick?` [true]
//! - `button`: `name?` [entity name], `keys?`, `gamepad?`, `touch_width?`,
//!   `touch_height?`, `offset_x?`, `offset_y?`, `enabled?` [true]
//! - `life`: `max`, `current?` [max]
//! - `tile_collision`: `rects` as `"x,y,w,h; x,y,w,h; ..."`

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use glam::Vec2;
use log::{debug, info};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use smallvec::SmallVec;

use crate::aabb::Aabb2;
use crate::components::ComponentKind;
use crate::components::animation::{Animation, AnimationAction, AnimationClip};
use crate::components::boxcollider::{Collider, layers};
use crate::components::button::Button;
use crate::components::inputcontrolled::InputController;
use crate::components::life::Life;
use crate::components::rigidbody::Rigidbody;
use crate::components::sprite::{Sprite, TextureRegion};
use crate::components::tilecollision::TileCollision;
use crate::components::transform::Transform;
use crate::error::{EngineError, EngineResult, TemplateError};
use crate::game::Scene;
use crate::resources::input::{GamepadButton, Key, MAX_GAMEPADS, parse_name};
use crate::resources::tilemap::Tilemap;
use crate::world::EntityId;

/// A scalar attribute value as written in scene data.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Int(v) => write!(f, "{v}"),
            AttributeValue::Float(v) => write!(f, "{v}"),
            AttributeValue::String(v) => f.write_str(v),
            AttributeValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// Field name to raw value for one component.
pub type Attributes = FxHashMap<String, String>;

/// One entity definition.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawTemplate")]
pub struct EntityTemplate {
    /// Name used in error messages and as the default button name.
    pub name: String,
    /// Kind reported by spawn/destroy events; defaults to `name`.
    pub kind: String,
    /// Component name to attributes, in name order.
    pub components: BTreeMap<String, Attributes>,
}

#[derive(Deserialize)]
struct RawTemplate {
    name: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    components: BTreeMap<String, FxHashMap<String, AttributeValue>>,
}

impl From<RawTemplate> for EntityTemplate {
    fn from(raw: RawTemplate) -> Self {
        let components = raw
            .components
            .into_iter()
            .map(|(component, attrs)| {
                let attrs = attrs.into_iter().map(|(k, v)| (k, v.to_string())).collect();
                (component, attrs)
            })
            .collect();
        Self {
            kind: raw.kind.unwrap_or_else(|| raw.name.clone()),
            name: raw.name,
            components,
        }
    }
}

impl EntityTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: name.clone(),
            name,
            components: BTreeMap::new(),
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Adds a component section from `(field, value)` pairs.
    pub fn with_component<'a>(
        mut self,
        component: &str,
        fields: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let attrs = fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.components.insert(component.to_string(), attrs);
        self
    }

    /// Build every component without touching any world.
    pub fn build(&self) -> Result<Vec<BuiltComponent>, TemplateError> {
        self.components
            .iter()
            .map(|(component, attrs)| {
                let fields = Fields {
                    entity: &self.name,
                    component,
                    attrs,
                };
                build_component(&fields)
            })
            .collect()
    }

    /// Build and attach all components to a newly spawned entity.
    ///
    /// Nothing is spawned if any component fails to build.
    pub fn spawn(&self, scene: &mut Scene) -> EngineResult<EntityId> {
        let built = self.build()?;
        let position = built
            .iter()
            .find_map(|c| match c {
                BuiltComponent::Transform(t) => Some(t.position),
                _ => None,
            })
            .unwrap_or(Vec2::ZERO);

        let id = scene.spawn(self.kind.clone(), position);
        let world = scene.world_mut();
        for component in built {
            match component {
                BuiltComponent::Transform(c) => world.add_component(id, c)?,
                BuiltComponent::Rigidbody(c) => world.add_component(id, c)?,
                BuiltComponent::Collider(c) => world.add_component(id, c)?,
                BuiltComponent::TileCollision(c) => world.add_component(id, c)?,
                BuiltComponent::Sprite(c) => world.add_component(id, c)?,
                BuiltComponent::Animation(c) => world.add_component(id, c)?,
                BuiltComponent::InputController(c) => world.add_component(id, c)?,
                BuiltComponent::Button(c) => world.add_component(id, c)?,
                BuiltComponent::Life(c) => world.add_component(id, c)?,
            }
        }
        // Show the first animation frame from the start.
        let region = world
            .get_component::<Animation>(id)
            .ok()
            .and_then(|a| a.current_region());
        if let (Some(region), Ok(mut sprite)) = (region, world.get_component_mut::<Sprite>(id)) {
            sprite.region = region;
        }
        debug!("spawned '{}' as {} from template", self.name, id);
        Ok(id)
    }
}

/// A component built from attributes, not yet attached.
#[derive(Debug, Clone)]
pub enum BuiltComponent {
    Transform(Transform),
    Rigidbody(Rigidbody),
    Collider(Collider),
    TileCollision(TileCollision),
    Sprite(Sprite),
    Animation(Animation),
    InputController(InputController),
    Button(Button),
    Life(Life),
}

impl BuiltComponent {
    pub fn kind(&self) -> ComponentKind {
        match self {
            BuiltComponent::Transform(_) => ComponentKind::Transform,
            BuiltComponent::Rigidbody(_) => ComponentKind::Rigidbody,
            BuiltComponent::Collider(_) => ComponentKind::Collider,
            BuiltComponent::TileCollision(_) => ComponentKind::TileCollision,
            BuiltComponent::Sprite(_) => ComponentKind::Sprite,
            BuiltComponent::Animation(_) => ComponentKind::Animation,
            BuiltComponent::InputController(_) => ComponentKind::InputController,
            BuiltComponent::Button(_) => ComponentKind::Button,
            BuiltComponent::Life(_) => ComponentKind::Life,
        }
    }
}

/// Typed access to one component's attributes.
struct Fields<'a> {
    entity: &'a str,
    component: &'a str,
    attrs: &'a Attributes,
}

impl Fields<'_> {
    fn raw(&self, field: &str) -> Option<&str> {
        self.attrs.get(field).map(|v| v.trim())
    }

    fn invalid(&self, field: &str, value: &str) -> TemplateError {
        TemplateError::invalid(self.entity, self.component, field, value)
    }

    fn required<T: FromStr>(&self, field: &str) -> Result<T, TemplateError> {
        let value = self
            .raw(field)
            .ok_or_else(|| TemplateError::missing(self.entity, self.component, field))?;
        value.parse().map_err(|_| self.invalid(field, value))
    }

    fn optional<T: FromStr>(&self, field: &str, default: T) -> Result<T, TemplateError> {
        match self.raw(field) {
            Some(value) => value.parse().map_err(|_| self.invalid(field, value)),
            None => Ok(default),
        }
    }

    fn maybe<T: FromStr>(&self, field: &str) -> Result<Option<T>, TemplateError> {
        self.raw(field)
            .map(|value| value.parse().map_err(|_| self.invalid(field, value)))
            .transpose()
    }

    fn flag(&self, field: &str, default: bool) -> Result<bool, TemplateError> {
        match self.raw(field) {
            None => Ok(default),
            Some(v) => match v.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => Ok(true),
                "false" | "no" | "0" | "off" => Ok(false),
                _ => Err(self.invalid(field, v)),
            },
        }
    }

    /// `|`-separated list; `None` when the field is absent.
    fn list<T: FromStr>(&self, field: &str) -> Result<Option<SmallVec<[T; 2]>>, TemplateError> {
        let Some(value) = self.raw(field) else {
            return Ok(None);
        };
        value
            .split('|')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse().map_err(|_| self.invalid(field, s)))
            .collect::<Result<SmallVec<[T; 2]>, _>>()
            .map(Some)
    }

    /// Layer bits as a number or a `|`-separated list of layer names.
    fn layer_bits(&self, field: &str, default: u32) -> Result<u32, TemplateError> {
        let Some(value) = self.raw(field) else {
            return Ok(default);
        };
        if let Ok(bits) = value.parse::<u32>() {
            return Ok(bits);
        }
        value.split('|').map(str::trim).try_fold(0u32, |acc, name| {
            layer_by_name(name)
                .map(|bit| acc | bit)
                .ok_or_else(|| self.invalid(field, value))
        })
    }
}

fn layer_by_name(name: &str) -> Option<u32> {
    Some(match name.to_ascii_lowercase().as_str() {
        "none" => layers::NONE,
        "default" => layers::DEFAULT,
        "player" => layers::PLAYER,
        "enemy" => layers::ENEMY,
        "wall" => layers::WALL,
        "item" => layers::ITEM,
        "projectile" => layers::PROJECTILE,
        "all" => layers::ALL,
        _ => return None,
    })
}

fn build_component(f: &Fields<'_>) -> Result<BuiltComponent, TemplateError> {
    let component = match f.component {
        "transform" => BuiltComponent::Transform(build_transform(f)?),
        "rigidbody" => BuiltComponent::Rigidbody(build_rigidbody(f)?),
        "collider" => BuiltComponent::Collider(build_collider(f)?),
        "tile_collision" => BuiltComponent::TileCollision(build_tile_collision(f)?),
        "sprite" => BuiltComponent::Sprite(build_sprite(f)?),
        "animation" => BuiltComponent::Animation(build_animation(f)?),
        "input_controller" => BuiltComponent::InputController(build_input_controller(f)?),
        "button" => BuiltComponent::Button(build_button(f)?),
        "life" => BuiltComponent::Life(build_life(f)?),
        other => return Err(TemplateError::unknown_component(f.entity, other)),
    };
    Ok(component)
}

fn build_transform(f: &Fields<'_>) -> Result<Transform, TemplateError> {
    let position = Vec2::new(f.required("x")?, f.required("y")?);
    let scale = Vec2::new(f.optional("scale_x", 1.0)?, f.optional("scale_y", 1.0)?);
    Ok(Transform::at(position)
        .with_rotation(f.optional("rotation", 0.0)?)
        .with_scale(scale))
}

fn build_rigidbody(f: &Fields<'_>) -> Result<Rigidbody, TemplateError> {
    let mass: f32 = f.optional("mass", 1.0)?;
    if mass < 0.0 {
        return Err(f.invalid("mass", &mass.to_string()));
    }
    let mut body = Rigidbody::with_mass(mass)
        .with_velocity(Vec2::new(f.optional("vx", 0.0)?, f.optional("vy", 0.0)?))
        .with_acceleration(Vec2::new(f.optional("ax", 0.0)?, f.optional("ay", 0.0)?));
    body.max_speed = f.maybe("max_speed")?;
    body.frozen = f.flag("frozen", false)?;
    Ok(body)
}

fn build_collider(f: &Fields<'_>) -> Result<Collider, TemplateError> {
    let width: f32 = f.required("width")?;
    let height: f32 = f.required("height")?;
    let mut collider = Collider::new(width, height)
        .with_offset(Vec2::new(f.optional("offset_x", 0.0)?, f.optional("offset_y", 0.0)?))
        .with_layers(
            f.layer_bits("layer", layers::DEFAULT)?,
            f.layer_bits("mask", layers::ALL)?,
        );
    if let Some(tag) = f.raw("tag") {
        collider = collider.with_tag(tag);
    }
    if f.flag("trigger", false)? {
        collider = collider.trigger();
    }
    collider.enabled = f.flag("enabled", true)?;
    Ok(collider)
}

fn build_tile_collision(f: &Fields<'_>) -> Result<TileCollision, TemplateError> {
    let value = f
        .raw("rects")
        .ok_or_else(|| TemplateError::missing(f.entity, f.component, "rects"))?;
    let rects = value
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|rect| {
            let n: SmallVec<[f32; 4]> = rect
                .split(',')
                .map(|p| p.trim().parse::<f32>())
                .collect::<Result<_, _>>()
                .map_err(|_| f.invalid("rects", rect))?;
            match n.as_slice() {
                &[x, y, w, h] => Ok(Aabb2::from_origin_size(Vec2::new(x, y), Vec2::new(w, h))),
                _ => Err(f.invalid("rects", rect)),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TileCollision::new(rects))
}

fn build_sprite(f: &Fields<'_>) -> Result<Sprite, TemplateError> {
    let tex_key: String = f.required("tex_key")?;
    let region = TextureRegion::new(
        f.optional("x", 0.0)?,
        f.optional("y", 0.0)?,
        f.required("width")?,
        f.required("height")?,
    );
    let mut sprite = Sprite::new(tex_key, region)
        .with_depth(f.optional("depth", 0)?)
        .with_origin(Vec2::new(f.optional("origin_x", 0.0)?, f.optional("origin_y", 0.0)?));
    sprite.flip_h = f.flag("flip_h", false)?;
    sprite.flip_v = f.flag("flip_v", false)?;
    sprite.visible = f.flag("visible", true)?;
    Ok(sprite)
}

/// Parses `"x y w h frames delay [once|loop]"` (commas also separate).
fn parse_clip(value: &str) -> Option<AnimationClip> {
    let parts: SmallVec<[&str; 7]> = value
        .split([' ', ','])
        .filter(|s| !s.is_empty())
        .collect();
    if !(6..=7).contains(&parts.len()) {
        return None;
    }
    let num = |i: usize| parts[i].parse::<f32>().ok();
    let first = TextureRegion::new(num(0)?, num(1)?, num(2)?, num(3)?);
    let count: usize = parts[4].parse().ok()?;
    let delay = num(5)?;
    if count == 0 || delay <= 0.0 {
        return None;
    }
    let looping = match parts.get(6) {
        None | Some(&"loop") => true,
        Some(&"once") => false,
        Some(_) => return None,
    };
    Some(AnimationClip::from_strip(first, count, delay, looping))
}

fn build_animation(f: &Fields<'_>) -> Result<Animation, TemplateError> {
    let initial_name = f
        .raw("initial")
        .ok_or_else(|| TemplateError::missing(f.entity, f.component, "initial"))?;
    let initial: AnimationAction =
        parse_name(initial_name).map_err(|_| f.invalid("initial", initial_name))?;

    let mut fields: Vec<(&String, &String)> =
        f.attrs.iter().filter(|(k, _)| k.as_str() != "initial").collect();
    fields.sort();

    let mut clips: Vec<(AnimationAction, AnimationClip)> = Vec::with_capacity(fields.len());
    for (field, value) in fields {
        let action: AnimationAction = parse_name(field).map_err(|_| f.invalid(field, value))?;
        let clip = parse_clip(value).ok_or_else(|| f.invalid(field, value))?;
        clips.push((action, clip));
    }

    let Some(pos) = clips.iter().position(|(a, _)| *a == initial) else {
        // The initial state must have a clip.
        return Err(TemplateError::missing(f.entity, f.component, initial_name));
    };
    let (_, initial_clip) = clips.swap_remove(pos);
    let animation = clips
        .into_iter()
        .fold(Animation::new(initial, initial_clip), |anim, (action, clip)| {
            anim.with_clip(action, clip)
        });
    Ok(animation)
}

fn build_input_controller(f: &Fields<'_>) -> Result<InputController, TemplateError> {
    let mut controller = InputController::new(f.required("speed")?);
    controller.player = f.maybe::<usize>("player")?;
    if let Some(player) = controller.player.filter(|p| *p >= MAX_GAMEPADS) {
        return Err(f.invalid("player", &player.to_string()));
    }
    let keys = &mut controller.keys;
    for (field, slot) in [
        ("up", &mut keys.up),
        ("down", &mut keys.down),
        ("left", &mut keys.left),
        ("right", &mut keys.right),
        ("action", &mut keys.action),
        ("jump", &mut keys.jump),
    ] {
        if let Some(list) = f.list::<Key>(field)? {
            *slot = list;
        }
    }
    controller.gamepad.use_left_stick = f.flag("use_left_stick", true)?;
    Ok(controller)
}

fn build_button(f: &Fields<'_>) -> Result<Button, TemplateError> {
    let mut button = Button::new(f.optional("name", f.entity.to_string())?);
    if let Some(keys) = f.list::<Key>("keys")? {
        button.keys = keys;
    }
    if let Some(buttons) = f.list::<GamepadButton>("gamepad")? {
        button.gamepad_buttons = buttons;
    }
    let offset = Vec2::new(f.optional("offset_x", 0.0)?, f.optional("offset_y", 0.0)?);
    match (f.maybe::<f32>("touch_width")?, f.maybe::<f32>("touch_height")?) {
        (Some(w), Some(h)) => button = button.with_touch_area(Vec2::new(w, h), offset),
        (None, None) => button.offset = offset,
        (Some(_), None) => {
            return Err(TemplateError::missing(f.entity, f.component, "touch_height"));
        }
        (None, Some(_)) => {
            return Err(TemplateError::missing(f.entity, f.component, "touch_width"));
        }
    }
    button.enabled = f.flag("enabled", true)?;
    Ok(button)
}

fn build_life(f: &Fields<'_>) -> Result<Life, TemplateError> {
    let max: i32 = f.required("max")?;
    if max <= 0 {
        return Err(f.invalid("max", &max.to_string()));
    }
    let mut life = Life::new(max);
    life.current = f.optional("current", max)?.clamp(0, max);
    Ok(life)
}

/// Static collision built from one layer of a tile map.
#[derive(Debug, Clone, Deserialize)]
pub struct TileSurfaceDef {
    #[serde(default = "default_surface_kind")]
    pub kind: String,
    pub layer: String,
    pub map: Tilemap,
    #[serde(default)]
    pub position: Vec2,
    #[serde(default = "default_surface_scale")]
    pub scale: Vec2,
}

fn default_surface_kind() -> String {
    "tiles".to_string()
}

fn default_surface_scale() -> Vec2 {
    Vec2::ONE
}

/// JSON scene description: entity templates plus tile collision surfaces.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneFile {
    #[serde(default)]
    pub entities: Vec<EntityTemplate>,
    #[serde(default)]
    pub tile_surfaces: Vec<TileSurfaceDef>,
}

impl SceneFile {
    pub fn from_json(text: &str) -> EngineResult<Self> {
        serde_json::from_str(text).map_err(|e| EngineError::Config(format!("scene file: {e}")))
    }

    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("failed to read {path:?}: {e}")))?;
        Self::from_json(&text)
    }

    /// Spawn every surface and entity into `scene`, in file order.
    ///
    /// All templates are validated before anything is spawned.
    pub fn populate(&self, scene: &mut Scene) -> EngineResult<Vec<EntityId>> {
        for template in &self.entities {
            template.build()?;
        }
        let mut ids = Vec::with_capacity(self.tile_surfaces.len() + self.entities.len());
        for surface in &self.tile_surfaces {
            let id = scene.spawn(surface.kind.clone(), surface.position);
            let world = scene.world_mut();
            world.add_component(id, Transform::at(surface.position).with_scale(surface.scale))?;
            world.add_component(id, TileCollision::from_tilemap(&surface.map, &surface.layer))?;
            ids.push(id);
        }
        for template in &self.entities {
            ids.push(template.spawn(scene)?);
        }
        info!(
            "scene '{}' populated with {} entities",
            scene.name(),
            ids.len()
        );
        Ok(ids)
    }
}

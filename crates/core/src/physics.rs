//! Physics port - the boundary between merge rules and a rigid-body simulation
//!
//! The merge engine never integrates motion. It registers bodies, removes them,
//! reads their positions, asks for impulses, and polls contact pairs, all
//! through [`PhysicsPort`]. Calls are synchronous and complete within the tick
//! that makes them.
//!
//! [`ScriptedPhysics`] is an in-memory port with no dynamics: positions only
//! change when the caller moves them, and collisions are whatever the caller
//! queued. It records every request so tests can assert on them.

use std::collections::BTreeMap;

use serde::Serialize;

/// Identity of a body inside the merge engine. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BodyId(pub u32);

/// Identity of a shape inside the physics layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ShapeHandle(pub u64);

/// 2D vector in field units (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Vec2) -> Vec2 {
        Vec2::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn scale(self, k: f32) -> Vec2 {
        Vec2::new(self.x * k, self.y * k)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Minimal capability set the merge engine needs from a physics simulation
pub trait PhysicsPort {
    /// Register a dynamic circle and return its shape handle
    fn add_body(&mut self, position: Vec2, radius: f32) -> ShapeHandle;

    /// Remove a shape from the simulation; unknown handles are ignored
    fn remove_body(&mut self, shape: ShapeHandle);

    /// Current position of a shape, `None` if the shape is unknown
    fn position(&self, shape: ShapeHandle) -> Option<Vec2>;

    /// Request an impulse on a shape
    fn apply_impulse(&mut self, shape: ShapeHandle, impulse: Vec2);

    /// Drain contact pairs reported since the previous poll
    fn poll_collisions(&mut self) -> Vec<(ShapeHandle, ShapeHandle)>;
}

impl<P: PhysicsPort + ?Sized> PhysicsPort for &mut P {
    fn add_body(&mut self, position: Vec2, radius: f32) -> ShapeHandle {
        (**self).add_body(position, radius)
    }

    fn remove_body(&mut self, shape: ShapeHandle) {
        (**self).remove_body(shape)
    }

    fn position(&self, shape: ShapeHandle) -> Option<Vec2> {
        (**self).position(shape)
    }

    fn apply_impulse(&mut self, shape: ShapeHandle, impulse: Vec2) {
        (**self).apply_impulse(shape, impulse)
    }

    fn poll_collisions(&mut self) -> Vec<(ShapeHandle, ShapeHandle)> {
        (**self).poll_collisions()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptedShape {
    pub position: Vec2,
    pub radius: f32,
}

/// In-memory [`PhysicsPort`] driven entirely by the caller
#[derive(Debug, Clone, Default)]
pub struct ScriptedPhysics {
    next_handle: u64,
    shapes: BTreeMap<ShapeHandle, ScriptedShape>,
    pending: Vec<(ShapeHandle, ShapeHandle)>,
    impulses: Vec<(ShapeHandle, Vec2)>,
    removed: Vec<ShapeHandle>,
}

impl ScriptedPhysics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a contact pair for the next poll
    pub fn queue_collision(&mut self, a: ShapeHandle, b: ShapeHandle) {
        self.pending.push((a, b));
    }

    /// Move a shape; unknown handles are ignored
    pub fn set_position(&mut self, shape: ShapeHandle, position: Vec2) {
        if let Some(s) = self.shapes.get_mut(&shape) {
            s.position = position;
        }
    }

    pub fn shape(&self, shape: ShapeHandle) -> Option<&ScriptedShape> {
        self.shapes.get(&shape)
    }

    /// Live shapes in creation order
    pub fn shapes(&self) -> impl Iterator<Item = (ShapeHandle, &ScriptedShape)> {
        self.shapes.iter().map(|(h, s)| (*h, s))
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Most recently added shape
    pub fn last_added(&self) -> Option<ShapeHandle> {
        self.shapes.keys().next_back().copied()
    }

    /// Impulses requested so far
    pub fn impulses(&self) -> &[(ShapeHandle, Vec2)] {
        &self.impulses
    }

    /// Shapes removed so far
    pub fn removed(&self) -> &[ShapeHandle] {
        &self.removed
    }

    pub fn clear_log(&mut self) {
        self.impulses.clear();
        self.removed.clear();
    }
}

impl PhysicsPort for ScriptedPhysics {
    fn add_body(&mut self, position: Vec2, radius: f32) -> ShapeHandle {
        self.next_handle += 1;
        let handle = ShapeHandle(self.next_handle);
        self.shapes.insert(handle, ScriptedShape { position, radius });
        handle
    }

    fn remove_body(&mut self, shape: ShapeHandle) {
        if self.shapes.remove(&shape).is_some() {
            self.removed.push(shape);
        }
    }

    fn position(&self, shape: ShapeHandle) -> Option<Vec2> {
        self.shapes.get(&shape).map(|s| s.position)
    }

    fn apply_impulse(&mut self, shape: ShapeHandle, impulse: Vec2) {
        self.impulses.push((shape, impulse));
    }

    fn poll_collisions(&mut self) -> Vec<(ShapeHandle, ShapeHandle)> {
        std::mem::take(&mut self.pending)
    }
}

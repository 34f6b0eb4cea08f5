//! The physics engine: body ownership and the three-phase tick.
//!
//! [`PhysicsEngine::update`] runs, in order and never interleaved:
//!
//! 1. **Integration.** Every non-static body receives the engine gravity as a
//!    force, integrates its acceleration into velocity, then advances with
//!    [`RigidBody::update_with_gravity`]. Accumulated acceleration is cleared.
//! 2. **Collision.** Contact sets are rebuilt, then every unordered pair in
//!    insertion order is tested. Overlapping pairs may trigger a pickup
//!    (an [`ITEM_EQUIPPED`](EventType::ITEM_EQUIPPED) event and deferred
//!    removal of the picked body) and always run pairwise resolution.
//! 3. **Ground.** `on_ground` is recomputed from scratch against the floor
//!    plane and the tops of static bodies.
//!
//! Resolution is pairwise and order-dependent for bodies touching several
//! others at once. Well-separated pairs resolve identically in any order.

use std::collections::{HashMap, HashSet};
use std::ops::{Index, IndexMut};
use std::sync::Arc;

use burrow_events::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::body::{RigidBody, GRAVITY};
use crate::collision::{self, Axis, Bounds, ON_TOP_TOLERANCE};
use crate::handle::{BodyArena, BodyHandle};
use crate::vector::Vector2D;
use crate::PhysicsError;

/// Priority of the pickup notification.
pub const ITEM_EQUIPPED_PRIORITY: i32 = 1;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunable constants of the simulated world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Engine-level gravity. Its vertical component is applied as a force
    /// `(0, gravity.y * mass)` in the integration phase.
    pub gravity: Vector2D,
    /// Y coordinate of the ground plane. A body whose top-left corner reaches
    /// it is clamped there.
    pub floor_y: f64,
    /// Acceleration each airborne body adds to its own vertical velocity.
    /// Layered on top of `gravity`; set both to zero for a weightless world.
    pub body_gravity: f64,
    /// Vertical slack when deciding that one box rests on another.
    pub on_top_tolerance: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vector2D::new(0.0, GRAVITY),
            floor_y: 3000.0,
            body_gravity: GRAVITY,
            on_top_tolerance: ON_TOP_TOLERANCE,
        }
    }
}

impl PhysicsConfig {
    /// No gravity of either kind.
    pub fn weightless() -> Self {
        Self {
            gravity: Vector2D::ZERO,
            body_gravity: 0.0,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Step output
// ---------------------------------------------------------------------------

/// Payload of the [`ITEM_EQUIPPED`](EventType::ITEM_EQUIPPED) event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemEquipped {
    /// Identifier of the body that was picked up.
    pub item_name: String,
}

/// Two bodies whose boxes overlapped during a tick, in scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionPair {
    pub a: BodyHandle,
    pub b: BodyHandle,
}

/// What happened during one [`PhysicsEngine::update`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// Every overlapping pair found in phase 2.
    pub collisions: Vec<CollisionPair>,
    /// Identifiers of bodies removed by pickup.
    pub picked_up: Vec<String>,
}

/// Outcome of [`PhysicsEngine::resolve_collision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Both bodies are static; nothing can move.
    BothStatic,
    /// Both bodies are pushable and the heavier one cannot shove the other
    /// because some body chained to either of them is too heavy. No body was
    /// touched.
    Blocked { anchor: BodyHandle, mover: BodyHandle },
    /// The mover was pushed out of the anchor along `axis`.
    Separated {
        anchor: BodyHandle,
        mover: BodyHandle,
        axis: Axis,
    },
    /// The boxes did not overlap on the axis of least penetration.
    Apart,
}

// ---------------------------------------------------------------------------
// PhysicsEngine
// ---------------------------------------------------------------------------

/// Owns every rigid body of a world and steps them.
///
/// Bodies are addressed by [`BodyHandle`]. Iteration follows insertion
/// order. Indexing with a stale handle panics; use [`body`](Self::body)
/// for a fallible lookup.
pub struct PhysicsEngine {
    config: PhysicsConfig,
    events: Arc<EventManager>,
    bodies: BodyArena<RigidBody>,
    order: Vec<BodyHandle>,
    by_identifier: HashMap<String, BodyHandle>,
}

impl PhysicsEngine {
    /// Create an empty world that reports pickups to `events`.
    pub fn new(config: PhysicsConfig, events: Arc<EventManager>) -> Self {
        info!(
            gravity_y = config.gravity.y,
            floor_y = config.floor_y,
            body_gravity = config.body_gravity,
            "physics engine created"
        );
        Self {
            config,
            events,
            bodies: BodyArena::new(),
            order: Vec::new(),
            by_identifier: HashMap::new(),
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// The bus pickups are reported on.
    pub fn events(&self) -> &Arc<EventManager> {
        &self.events
    }

    /// Register a body. Identifiers must be unique within the engine.
    pub fn add_rigid_body(&mut self, body: RigidBody) -> Result<BodyHandle, PhysicsError> {
        if self.by_identifier.contains_key(body.identifier()) {
            return Err(PhysicsError::DuplicateIdentifier {
                identifier: body.identifier().to_owned(),
            });
        }
        let identifier = body.identifier().to_owned();
        let handle = self.bodies.insert(body);
        self.order.push(handle);
        debug!(identifier = %identifier, handle = %handle, "rigid body added");
        self.by_identifier.insert(identifier, handle);
        Ok(handle)
    }

    /// Unregister a body and hand it back. Returns `None` for a stale handle.
    ///
    /// Other handles stay valid.
    pub fn remove_rigid_body(&mut self, handle: BodyHandle) -> Option<RigidBody> {
        let body = self.bodies.remove(handle)?;
        self.order.retain(|&h| h != handle);
        self.by_identifier.remove(body.identifier());
        for &other in &self.order {
            if let Some(other) = self.bodies.get_mut(other) {
                other.colliding.retain(|&h| h != handle);
            }
        }
        debug!(identifier = %body.identifier(), handle = %handle, "rigid body removed");
        Some(body)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    /// Look a body up by identifier.
    pub fn find(&self, identifier: &str) -> Option<BodyHandle> {
        self.by_identifier.get(identifier).copied()
    }

    /// Live handles in insertion order.
    pub fn handles(&self) -> &[BodyHandle] {
        &self.order
    }

    /// Live bodies in insertion order.
    pub fn rigid_bodies(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.order
            .iter()
            .filter_map(|&h| self.bodies.get(h).map(|body| (h, body)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Strict AABB overlap between two registered bodies.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn detect_collision(&self, a: BodyHandle, b: BodyHandle) -> bool {
        collision::detect_collision(&self[a], &self[b])
    }

    /// Rebuild every body's contact set from the current boxes.
    ///
    /// Two collidable bodies are in contact when their boxes overlap or share
    /// an edge. [`update`](Self::update) calls this at the start of the
    /// collision phase.
    pub fn refresh_contacts(&mut self) {
        let snapshot: Vec<(BodyHandle, Bounds, bool)> = self
            .rigid_bodies()
            .map(|(h, body)| (h, body.bounds(), body.is_collidable))
            .collect();

        for (i, &(handle, bounds, collidable)) in snapshot.iter().enumerate() {
            let contacts: Vec<BodyHandle> = if collidable {
                snapshot
                    .iter()
                    .enumerate()
                    .filter(|&(j, &(_, other, other_collidable))| {
                        i != j && other_collidable && bounds.touches(&other)
                    })
                    .map(|(_, &(h, _, _))| h)
                    .collect()
            } else {
                Vec::new()
            };
            self[handle].colliding = contacts;
        }
    }

    /// Pick the anchor (keeps its place) and the mover (gets pushed out).
    ///
    /// A static body always anchors. A non-pushable body anchors against a
    /// pushable one, and between two pushable bodies the heavier anchors.
    /// Any remaining tie anchors on `b`.
    fn anchor_and_mover(&self, a: BodyHandle, b: BodyHandle) -> (BodyHandle, BodyHandle) {
        let (body_a, body_b) = (&self[a], &self[b]);
        if body_a.is_static() {
            return (a, b);
        }
        if body_b.is_static() {
            return (b, a);
        }
        match (body_a.is_pushable, body_b.is_pushable) {
            (true, true) if body_a.mass() > body_b.mass() => (a, b),
            (true, true) => (b, a),
            (false, true) => (a, b),
            (true, false) | (false, false) => (b, a),
        }
    }

    /// Whether `pusher` can shove `pushed` together with every pushable body
    /// chained to it through the contact sets.
    ///
    /// The pusher must strictly outweigh each body of the chain. Contact sets
    /// come from the last [`refresh_contacts`](Self::refresh_contacts).
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn can_push(&self, pusher: BodyHandle, pushed: BodyHandle) -> bool {
        let mut visited = HashSet::from([pusher]);
        self.can_push_chain(pusher, pushed, &mut visited)
    }

    fn can_push_chain(
        &self,
        pusher: BodyHandle,
        pushed: BodyHandle,
        visited: &mut HashSet<BodyHandle>,
    ) -> bool {
        visited.insert(pushed);
        let target = &self[pushed];
        if self[pusher].mass() <= target.mass() {
            trace!(
                pusher = %self[pusher].identifier(),
                pushed = %target.identifier(),
                "push blocked by mass"
            );
            return false;
        }
        self.can_push_contacts(pusher, pushed, visited)
    }

    /// Chain step over the pushable, unvisited contacts of `from`.
    fn can_push_contacts(
        &self,
        pusher: BodyHandle,
        from: BodyHandle,
        visited: &mut HashSet<BodyHandle>,
    ) -> bool {
        for &next in &self[from].colliding {
            if visited.contains(&next) {
                continue;
            }
            let Some(next_body) = self.bodies.get(next) else {
                continue;
            };
            if !next_body.is_pushable {
                continue;
            }
            if !self.can_push_chain(pusher, next, visited) {
                return false;
            }
        }
        true
    }

    /// Whether a pushable anchor keeps its place while shoving `mover`.
    ///
    /// The anchor must outweigh the mover's chain and also every pushable
    /// body leaning on the anchor itself; a lighter body wedged against a
    /// heavier stack stays where it is.
    fn anchor_holds(&self, anchor: BodyHandle, mover: BodyHandle) -> bool {
        let mut visited = HashSet::from([anchor]);
        self.can_push_chain(anchor, mover, &mut visited)
            && self.can_push_contacts(anchor, anchor, &mut visited)
    }

    /// Resolve an overlap between two bodies.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn resolve_collision(&mut self, a: BodyHandle, b: BodyHandle) -> Resolution {
        if self[a].is_static() && self[b].is_static() {
            return Resolution::BothStatic;
        }

        let (anchor, mover) = self.anchor_and_mover(a, b);
        // Only two pushable bodies are mass-gated. Against a static or
        // non-pushable anchor the mover is always separated.
        let pushable_anchor = self[anchor].is_pushable && !self[anchor].is_static();
        if pushable_anchor && !self.anchor_holds(anchor, mover) {
            debug!(
                anchor = %self[anchor].identifier(),
                mover = %self[mover].identifier(),
                "push chain blocked"
            );
            return Resolution::Blocked { anchor, mover };
        }

        let anchor_bounds = self[anchor].bounds();
        let tolerance = self.config.on_top_tolerance;
        let separated = collision::separate(&mut self[mover], anchor_bounds, tolerance);
        match separated {
            Some(axis) => {
                trace!(
                    anchor = %self[anchor].identifier(),
                    mover = %self[mover].identifier(),
                    ?axis,
                    "separated"
                );
                Resolution::Separated {
                    anchor,
                    mover,
                    axis,
                }
            }
            None => Resolution::Apart,
        }
    }

    /// The body collected by this pair, if one side picks and the other is
    /// pickable.
    fn pickup_target(&self, a: BodyHandle, b: BodyHandle) -> Option<BodyHandle> {
        let (body_a, body_b) = (&self[a], &self[b]);
        if body_a.can_pick && body_b.is_pickable {
            Some(b)
        } else if body_b.can_pick && body_a.is_pickable {
            Some(a)
        } else {
            None
        }
    }

    /// Advance the world by `dt` seconds.
    ///
    /// # Panics
    ///
    /// Panics if `dt` is not positive and finite.
    pub fn update(&mut self, dt: f64) -> StepReport {
        assert!(
            dt.is_finite() && dt > 0.0,
            "physics step requires a positive, finite dt (got {dt})"
        );

        self.integrate(dt);
        let report = self.collide();
        self.recompute_ground();

        trace!(
            dt,
            bodies = self.order.len(),
            collisions = report.collisions.len(),
            picked_up = report.picked_up.len(),
            "physics step"
        );
        report
    }

    fn integrate(&mut self, dt: f64) {
        let gravity_y = self.config.gravity.y;
        let body_gravity = self.config.body_gravity;
        for &handle in &self.order {
            let Some(body) = self.bodies.get_mut(handle) else {
                continue;
            };
            if body.is_static() {
                continue;
            }
            let force = Vector2D::new(0.0, gravity_y * body.mass());
            body.apply_force(force);
            body.velocity += body.acceleration * dt;
            body.update_with_gravity(dt, body_gravity);
            body.acceleration = Vector2D::ZERO;
        }
    }

    fn collide(&mut self) -> StepReport {
        self.refresh_contacts();

        let mut report = StepReport::default();
        let mut removed: Vec<BodyHandle> = Vec::new();
        let order = self.order.clone();

        for (i, &a) in order.iter().enumerate() {
            for &b in &order[i + 1..] {
                if removed.contains(&a) || removed.contains(&b) {
                    continue;
                }
                let (body_a, body_b) = (&self[a], &self[b]);
                if body_a.is_static() && body_b.is_static() {
                    continue;
                }
                if !body_a.is_collidable || !body_b.is_collidable {
                    continue;
                }
                if !collision::detect_collision(body_a, body_b) {
                    continue;
                }

                debug!(a = %body_a.identifier(), b = %body_b.identifier(), "collision");
                report.collisions.push(CollisionPair { a, b });

                if let Some(picked) = self.pickup_target(a, b) {
                    let item_name = self[picked].identifier().to_owned();
                    self.notify_pickup(&item_name);
                    report.picked_up.push(item_name);
                    removed.push(picked);
                }

                self.resolve_collision(a, b);
            }
        }

        for handle in removed {
            self.remove_rigid_body(handle);
        }
        report
    }

    fn notify_pickup(&self, item_name: &str) {
        info!(item = %item_name, "item picked up");
        let event = Event::new(EventType::ITEM_EQUIPPED, ITEM_EQUIPPED_PRIORITY).with_payload(
            ItemEquipped {
                item_name: item_name.to_owned(),
            },
        );
        if let Err(e) = self.events.dispatch(event) {
            warn!(item = %item_name, error = %e, "pickup notification dropped");
        }
    }

    fn recompute_ground(&mut self) {
        let floor_y = self.config.floor_y;
        let tolerance = self.config.on_top_tolerance;
        let statics: Vec<Bounds> = self
            .rigid_bodies()
            .filter(|(_, body)| body.is_static())
            .map(|(_, body)| body.bounds())
            .collect();

        for &handle in &self.order {
            let Some(body) = self.bodies.get_mut(handle) else {
                continue;
            };
            if body.is_static() {
                continue;
            }
            body.on_ground = false;
            if body.position.y >= floor_y {
                body.position.y = floor_y;
                body.velocity.y = 0.0;
                body.on_ground = true;
            } else {
                let bounds = body.bounds();
                body.on_ground = statics.iter().any(|s| bounds.is_on_top_of(s, tolerance));
            }
        }
    }
}

impl Index<BodyHandle> for PhysicsEngine {
    type Output = RigidBody;

    fn index(&self, handle: BodyHandle) -> &RigidBody {
        match self.bodies.get(handle) {
            Some(body) => body,
            None => panic!("stale or foreign body handle {handle:?}"),
        }
    }
}

impl IndexMut<BodyHandle> for PhysicsEngine {
    fn index_mut(&mut self, handle: BodyHandle) -> &mut RigidBody {
        match self.bodies.get_mut(handle) {
            Some(body) => body,
            None => panic!("stale or foreign body handle {handle:?}"),
        }
    }
}

impl std::fmt::Debug for PhysicsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsEngine")
            .field("config", &self.config)
            .field("bodies", &self.order.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::RigidBodyBuilder;
    use std::sync::Mutex;

    fn inline_events() -> Arc<EventManager> {
        Arc::new(EventManager::new(EventConfig {
            workers: 0,
            ..Default::default()
        }))
    }

    fn weightless() -> PhysicsEngine {
        PhysicsEngine::new(PhysicsConfig::weightless(), inline_events())
    }

    fn square(id: &str, x: f64, y: f64, mass: f64) -> RigidBodyBuilder {
        RigidBody::builder(id)
            .position(Vector2D::new(x, y))
            .size(Vector2D::new(10.0, 10.0))
            .mass(mass)
    }

    fn add(engine: &mut PhysicsEngine, builder: RigidBodyBuilder) -> BodyHandle {
        engine.add_rigid_body(builder.build().unwrap()).unwrap()
    }

    #[test]
    fn duplicate_identifier_is_rejected() {
        let mut engine = weightless();
        add(&mut engine, square("crate", 0.0, 0.0, 1.0));
        let dup = RigidBody::builder("crate").build().unwrap();
        let err = engine.add_rigid_body(dup).unwrap_err();
        assert_eq!(
            err,
            PhysicsError::DuplicateIdentifier {
                identifier: "crate".to_owned()
            }
        );
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn removal_invalidates_handle_and_frees_identifier() {
        let mut engine = weightless();
        let a = add(&mut engine, square("a", 0.0, 0.0, 1.0));
        let b = add(&mut engine, square("b", 50.0, 0.0, 1.0));

        let removed = engine.remove_rigid_body(a).unwrap();
        assert_eq!(removed.identifier(), "a");
        assert!(engine.body(a).is_none());
        assert!(engine.remove_rigid_body(a).is_none());
        assert_eq!(engine.find("b"), Some(b));
        assert_eq!(engine.find("a"), None);
        assert_eq!(engine.handles(), &[b]);

        add(&mut engine, square("a", 0.0, 0.0, 1.0));
        assert_eq!(engine.len(), 2);
    }

    #[test]
    #[should_panic(expected = "stale or foreign body handle")]
    fn stale_handle_panics_on_index() {
        let mut engine = weightless();
        let a = add(&mut engine, square("a", 0.0, 0.0, 1.0));
        engine.remove_rigid_body(a);
        let _ = engine.detect_collision(a, a);
    }

    #[test]
    #[should_panic(expected = "positive, finite dt")]
    fn zero_dt_panics() {
        weightless().update(0.0);
    }

    #[test]
    fn contacts_include_flush_neighbours() {
        let mut engine = weightless();
        let a = add(&mut engine, square("a", 0.0, 0.0, 1.0));
        let b = add(&mut engine, square("b", 10.0, 0.0, 1.0));
        let c = add(&mut engine, square("c", 40.0, 0.0, 1.0));
        engine.refresh_contacts();

        assert_eq!(engine[a].colliding_bodies(), &[b]);
        assert_eq!(engine[b].colliding_bodies(), &[a]);
        assert!(engine[c].colliding_bodies().is_empty());
    }

    #[test]
    fn static_anchor_pushes_dynamic_out() {
        let mut engine = weightless();
        let wall = add(&mut engine, square("wall", 0.0, 0.0, 1.0).static_body(true));
        let player = add(&mut engine, square("player", 7.0, 0.0, 1.0));
        engine.refresh_contacts();

        let outcome = engine.resolve_collision(player, wall);
        assert_eq!(
            outcome,
            Resolution::Separated {
                anchor: wall,
                mover: player,
                axis: Axis::X
            }
        );
        assert_eq!(engine[player].position.x, 10.0);
        assert_eq!(engine[wall].position, Vector2D::ZERO);
    }

    #[test]
    fn both_static_is_noop() {
        let mut engine = weightless();
        let a = add(&mut engine, square("a", 0.0, 0.0, 1.0).static_body(true));
        let b = add(&mut engine, square("b", 5.0, 0.0, 1.0).static_body(true));
        assert_eq!(engine.resolve_collision(a, b), Resolution::BothStatic);
    }

    #[test]
    fn equal_mass_pushables_anchor_on_second_operand() {
        let mut engine = weightless();
        let a = add(&mut engine, square("a", 0.0, 0.0, 3.0).pushable(true));
        let b = add(&mut engine, square("b", 8.0, 0.0, 3.0).pushable(true));
        engine.refresh_contacts();

        // b anchors, so pushing a requires b to outweigh it: blocked.
        assert_eq!(
            engine.resolve_collision(a, b),
            Resolution::Blocked {
                anchor: b,
                mover: a
            }
        );
        assert_eq!(engine[a].position.x, 0.0);
        assert_eq!(engine[b].position.x, 8.0);
    }

    #[test]
    fn non_pushable_dynamic_bodies_move_first_operand() {
        let mut engine = weightless();
        let a = add(&mut engine, square("a", 2.0, 0.0, 1.0));
        let b = add(&mut engine, square("b", 8.0, 0.0, 100.0));
        engine.refresh_contacts();

        let outcome = engine.resolve_collision(a, b);
        assert!(matches!(outcome, Resolution::Separated { mover, .. } if mover == a));
        assert_eq!(engine[a].position.x, -2.0);
        assert_eq!(engine[b].position.x, 8.0);
    }

    #[test]
    fn heavy_body_pushes_chain_of_lighter_ones() {
        let mut engine = weightless();
        let pusher = add(&mut engine, square("pusher", 0.0, 0.0, 50.0));
        let first = add(&mut engine, square("first", 8.0, 0.0, 10.0).pushable(true));
        let _second = add(&mut engine, square("second", 18.0, 0.0, 20.0).pushable(true));
        engine.refresh_contacts();

        assert!(engine.can_push(pusher, first));
        assert!(matches!(
            engine.resolve_collision(pusher, first),
            Resolution::Separated { mover, .. } if mover == first
        ));
        assert_eq!(engine[first].position.x, 10.0);
    }

    #[test]
    fn non_pushable_anchor_ignores_crate_mass() {
        let mut engine = weightless();
        let player = add(&mut engine, square("player", 0.0, 0.0, 1.0));
        let boulder = add(&mut engine, square("boulder", 6.0, 0.0, 1000.0).pushable(true));
        engine.refresh_contacts();

        assert!(!engine.can_push(player, boulder));
        assert_eq!(
            engine.resolve_collision(boulder, player),
            Resolution::Separated {
                anchor: player,
                mover: boulder,
                axis: Axis::X
            }
        );
        assert_eq!(engine[boulder].position.x, 10.0);
        assert_eq!(engine[player].position.x, 0.0);
    }

    #[test]
    fn pickup_dispatches_and_removes_item() {
        let events = inline_events();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        events.register_handler(EventType::ITEM_EQUIPPED, move |event| {
            if let Some(payload) = event.payload::<ItemEquipped>() {
                sink.lock().unwrap().push((payload.item_name.clone(), event.priority));
            }
        });

        let mut engine = PhysicsEngine::new(PhysicsConfig::weightless(), Arc::clone(&events));
        let sword = engine
            .add_rigid_body(
                RigidBody::builder("sword")
                    .position(Vector2D::new(5.0, 0.0))
                    .size(Vector2D::new(4.0, 4.0))
                    .static_body(true)
                    .pickable(true)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let player = engine
            .add_rigid_body(
                RigidBody::builder("player")
                    .position(Vector2D::new(3.0, 0.0))
                    .size(Vector2D::new(4.0, 8.0))
                    .can_pick(true)
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let report = engine.update(0.01);
        assert_eq!(report.picked_up, vec!["sword".to_owned()]);
        assert_eq!(report.collisions, vec![CollisionPair { a: sword, b: player }]);
        assert!(engine.body(sword).is_none());
        assert_eq!(engine.find("sword"), None);
        assert_eq!(engine.len(), 1);

        events.wait();
        assert_eq!(*seen.lock().unwrap(), vec![("sword".to_owned(), 1)]);
    }

    #[test]
    fn non_collidable_bodies_pass_through() {
        let mut engine = weightless();
        let ghost = engine
            .add_rigid_body(
                RigidBody::builder("ghost")
                    .size(Vector2D::new(10.0, 10.0))
                    .collidable(false)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        add(&mut engine, square("wall", 5.0, 0.0, 1.0).static_body(true));

        let report = engine.update(0.1);
        assert!(report.collisions.is_empty());
        assert_eq!(engine[ghost].position, Vector2D::ZERO);
    }

    #[test]
    fn body_resting_on_static_is_grounded() {
        let mut engine = weightless();
        let ground = add(&mut engine, square("ground", 0.0, 100.0, 1.0).static_body(true));
        let player = add(&mut engine, square("player", 0.0, 90.0, 1.0));

        engine.update(0.1);
        assert!(engine[player].on_ground);
        assert!(!engine[ground].on_ground);

        engine[player].position.y = 50.0;
        engine.update(0.1);
        assert!(!engine[player].on_ground, "on_ground is recomputed every tick");
    }

    #[test]
    fn default_config_matches_reference_constants() {
        let config = PhysicsConfig::default();
        assert_eq!(config.gravity, Vector2D::new(0.0, 9.8));
        assert_eq!(config.body_gravity, 9.8);
        assert_eq!(config.on_top_tolerance, 1.0);
        let parsed: PhysicsConfig = serde_json::from_str(r#"{"floor_y": 500.0}"#).unwrap();
        assert_eq!(parsed.floor_y, 500.0);
        assert_eq!(parsed.gravity, config.gravity);
    }
}

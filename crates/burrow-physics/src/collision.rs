//! Axis-aligned box predicates and single-pair separation.
//!
//! All overlap tests use half-open intervals: two boxes that merely share an
//! edge do not collide. [`Bounds::touches`] is the closed-interval variant
//! used to build contact chains, where resting flush against a neighbour
//! counts.

use serde::{Deserialize, Serialize};

use crate::body::RigidBody;
use crate::vector::Vector2D;

/// Default vertical slack for [`check_if_on_top`].
pub const ON_TOP_TOLERANCE: f64 = 1.0;

/// Resolution axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// A box given by its top-left corner and extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub position: Vector2D,
    pub size: Vector2D,
}

impl Bounds {
    #[inline]
    pub fn new(position: Vector2D, size: Vector2D) -> Self {
        Self { position, size }
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.position.x + self.size.x
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.position.y + self.size.y
    }

    #[inline]
    pub fn center(&self) -> Vector2D {
        self.position + self.size / 2.0
    }

    /// Strict overlap of the horizontal extents.
    #[inline]
    pub fn overlaps_x(&self, other: &Bounds) -> bool {
        self.position.x < other.right() && self.right() > other.position.x
    }

    /// Strict overlap of the vertical extents.
    #[inline]
    pub fn overlaps_y(&self, other: &Bounds) -> bool {
        self.position.y < other.bottom() && self.bottom() > other.position.y
    }

    /// Strict overlap on both axes.
    #[inline]
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.overlaps_x(other) && self.overlaps_y(other)
    }

    /// Overlap or shared edge on both axes.
    #[inline]
    pub fn touches(&self, other: &Bounds) -> bool {
        self.position.x <= other.right()
            && self.right() >= other.position.x
            && self.position.y <= other.bottom()
            && self.bottom() >= other.position.y
    }

    /// Penetration depth per axis, computed from the centres. Negative
    /// components mean the boxes are apart on that axis.
    #[inline]
    pub fn overlap_depth(&self, other: &Bounds) -> Vector2D {
        let delta = self.center() - other.center();
        Vector2D::new(
            (self.size.x / 2.0 + other.size.x / 2.0) - delta.x.abs(),
            (self.size.y / 2.0 + other.size.y / 2.0) - delta.y.abs(),
        )
    }

    /// `self` rests on top of `other`: its bottom edge is at or at most
    /// `tolerance` above the other's top edge, with horizontal overlap.
    #[inline]
    pub fn is_on_top_of(&self, other: &Bounds, tolerance: f64) -> bool {
        self.bottom() <= other.position.y
            && self.bottom() >= other.position.y - tolerance
            && self.overlaps_x(other)
    }
}

// ---------------------------------------------------------------------------
// Body predicates
// ---------------------------------------------------------------------------

/// Horizontal overlap between two bodies.
pub fn check_collision_on_x(a: &RigidBody, b: &RigidBody) -> bool {
    a.bounds().overlaps_x(&b.bounds())
}

/// Vertical overlap between two bodies.
pub fn check_collision_on_y(a: &RigidBody, b: &RigidBody) -> bool {
    a.bounds().overlaps_y(&b.bounds())
}

/// AABB collision test. Symmetric in its arguments.
pub fn detect_collision(a: &RigidBody, b: &RigidBody) -> bool {
    a.bounds().overlaps(&b.bounds())
}

/// `a` rests directly on top of `b`.
pub fn check_if_on_top(a: &RigidBody, b: &RigidBody, tolerance: f64) -> bool {
    a.bounds().is_on_top_of(&b.bounds(), tolerance)
}

// ---------------------------------------------------------------------------
// Separation
// ---------------------------------------------------------------------------

/// Push `mover` out of `anchor` along the axis of least penetration.
///
/// Ties go to the X axis. The side is inferred from the current positions,
/// not from the velocity. The mover's velocity along the resolved axis is
/// zeroed, and a mover that ends up resting on top of the anchor is marked
/// as on the ground. Returns the axis used, or `None` if the boxes do not
/// overlap on the chosen axis.
pub fn separate(mover: &mut RigidBody, anchor: Bounds, tolerance: f64) -> Option<Axis> {
    let bounds = mover.bounds();
    let depth = bounds.overlap_depth(&anchor);

    if depth.x <= depth.y {
        if !bounds.overlaps_x(&anchor) {
            return None;
        }
        mover.position.x = if bounds.position.x < anchor.position.x {
            anchor.position.x - bounds.size.x
        } else {
            anchor.right()
        };
        mover.velocity.x = 0.0;
        Some(Axis::X)
    } else {
        if !bounds.overlaps_y(&anchor) {
            return None;
        }
        if bounds.position.y < anchor.position.y {
            mover.position.y = anchor.position.y - bounds.size.y;
            if mover.bounds().is_on_top_of(&anchor, tolerance) {
                mover.on_ground = true;
            }
        } else {
            mover.position.y = anchor.bottom();
        }
        mover.velocity.y = 0.0;
        Some(Axis::Y)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

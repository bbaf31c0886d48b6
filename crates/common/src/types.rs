use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Handle to a spawned entity.
///
/// Handles are allocated sequentially by the entity factory, so the handle
/// order of a regenerated chunk is reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

bitflags::bitflags! {
    /// Collision categories used purely to filter queries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Category: u32 {
        const WALL = 1 << 0;
        const OBSTACLE = 1 << 1;
        const RAMP = 1 << 2;
        const HILL = 1 << 3;
        const PICKUP = 1 << 4;
        const VEHICLE = 1 << 5;
        /// Keep-clear zone in front of a ramp. Not solid for vehicles.
        const CORRIDOR = 1 << 6;
    }
}

impl Category {
    /// Everything new static content must stay clear of.
    pub const PLACEMENT: Self = Self::WALL
        .union(Self::OBSTACLE)
        .union(Self::RAMP)
        .union(Self::HILL)
        .union(Self::CORRIDOR);

    /// What a ramp run-up or a cone row must not cross.
    pub const TRAVERSAL: Self = Self::WALL.union(Self::OBSTACLE).union(Self::RAMP);
}

impl Default for Category {
    fn default() -> Self {
        Category::empty()
    }
}

/// Axis-aligned rectangle in world units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn half_size(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// True when the rectangle has no positive area (or is not finite).
    pub fn is_degenerate(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
            || !self.min.is_finite()
            || !self.max.is_finite()
    }

    /// Inclusive containment.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Shrink by `margin` on every side. A negative margin grows the rect.
    pub fn inset(&self, margin: f32) -> Self {
        Self {
            min: self.min + Vec2::splat(margin),
            max: self.max - Vec2::splat(margin),
        }
    }

    pub fn expand(&self, margin: f32) -> Self {
        self.inset(-margin)
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let r = Rect {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        };
        (r.width() >= 0.0 && r.height() >= 0.0).then_some(r)
    }

    /// Distance from an interior point to the nearest edge. Negative outside.
    pub fn distance_to_edge(&self, p: Vec2) -> f32 {
        let dx = (p.x - self.min.x).min(self.max.x - p.x);
        let dy = (p.y - self.min.y).min(self.max.y - p.y);
        dx.min(dy)
    }
}

/// Bounding shape of a collidable, relative to its center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    /// Oriented box; `rotation` turns the local +x axis.
    Obb { half_extents: Vec2, rotation: f32 },
    /// Segment of length `2 * half_length` along `rotation`, swept by `radius`.
    Capsule {
        half_length: f32,
        radius: f32,
        rotation: f32,
    },
}

impl Shape {
    /// Radius of the smallest center-anchored circle containing the shape.
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Shape::Circle { radius } => radius,
            Shape::Obb { half_extents, .. } => half_extents.length(),
            Shape::Capsule {
                half_length,
                radius,
                ..
            } => half_length + radius,
        }
    }
}

/// A placed shape: world-space center, shape and category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub center: Vec2,
    pub shape: Shape,
    pub category: Category,
}

impl Footprint {
    pub fn circle(center: Vec2, radius: f32, category: Category) -> Self {
        Self {
            center,
            shape: Shape::Circle { radius },
            category,
        }
    }

    pub fn obb(center: Vec2, half_extents: Vec2, rotation: f32, category: Category) -> Self {
        Self {
            center,
            shape: Shape::Obb {
                half_extents,
                rotation,
            },
            category,
        }
    }

    /// Capsule swept along the segment `from -> to`.
    pub fn capsule(from: Vec2, to: Vec2, radius: f32, category: Category) -> Self {
        let axis = to - from;
        Self {
            center: (from + to) * 0.5,
            shape: Shape::Capsule {
                half_length: axis.length() * 0.5,
                radius,
                rotation: axis.y.atan2(axis.x),
            },
            category,
        }
    }

    /// Conservative axis-aligned bounds.
    pub fn aabb(&self) -> Rect {
        let half = match self.shape {
            Shape::Circle { radius } => Vec2::splat(radius),
            Shape::Obb {
                half_extents,
                rotation,
            } => {
                let (s, c) = rotation.sin_cos();
                Vec2::new(
                    (half_extents.x * c).abs() + (half_extents.y * s).abs(),
                    (half_extents.x * s).abs() + (half_extents.y * c).abs(),
                )
            }
            Shape::Capsule {
                half_length,
                radius,
                rotation,
            } => {
                let axis = Vec2::from_angle(rotation) * half_length;
                axis.abs() + Vec2::splat(radius)
            }
        };
        Rect {
            min: self.center - half,
            max: self.center + half,
        }
    }

    /// Euclidean distance from `p` to the shape boundary; zero inside.
    pub fn distance_to(&self, p: Vec2) -> f32 {
        let rel = p - self.center;
        match self.shape {
            Shape::Circle { radius } => (rel.length() - radius).max(0.0),
            Shape::Obb {
                half_extents,
                rotation,
            } => {
                let local = Vec2::from_angle(-rotation).rotate(rel);
                (local.abs() - half_extents).max(Vec2::ZERO).length()
            }
            Shape::Capsule {
                half_length,
                radius,
                rotation,
            } => {
                let axis = Vec2::from_angle(rotation);
                let along = rel.dot(axis).clamp(-half_length, half_length);
                ((rel - axis * along).length() - radius).max(0.0)
            }
        }
    }

    /// True when a circle at `p` with `radius` overlaps this footprint.
    pub fn overlaps_circle(&self, p: Vec2, radius: f32) -> bool {
        self.distance_to(p) < radius
    }

    /// Entry and exit parameters of the ray `origin + t * dir` (unit `dir`,
    /// `t >= 0`) through this shape.
    pub fn ray_interval(&self, origin: Vec2, dir: Vec2) -> Option<(f32, f32)> {
        let (t0, t1) = match self.shape {
            Shape::Circle { radius } => circle_interval(origin - self.center, dir, radius)?,
            Shape::Obb {
                half_extents,
                rotation,
            } => {
                let unrotate = Vec2::from_angle(-rotation);
                let o = unrotate.rotate(origin - self.center);
                let d = unrotate.rotate(dir);
                box_interval(o, d, half_extents)?
            }
            Shape::Capsule {
                half_length,
                radius,
                rotation,
            } => {
                let axis = Vec2::from_angle(rotation);
                let unrotate = Vec2::from_angle(-rotation);
                let o = unrotate.rotate(origin - self.center);
                let d = unrotate.rotate(dir);
                // A capsule is convex: the union of its pieces' intervals is one interval.
                [
                    box_interval(o, d, Vec2::new(half_length, radius)),
                    circle_interval(origin - (self.center + axis * half_length), dir, radius),
                    circle_interval(origin - (self.center - axis * half_length), dir, radius),
                ]
                .into_iter()
                .flatten()
                .reduce(|a, b| (a.0.min(b.0), a.1.max(b.1)))?
            }
        };
        (t1 >= 0.0).then_some((t0.max(0.0), t1))
    }
}

fn circle_interval(rel_origin: Vec2, dir: Vec2, radius: f32) -> Option<(f32, f32)> {
    let b = rel_origin.dot(dir);
    let c = rel_origin.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    Some((-b - sq, -b + sq))
}

fn box_interval(o: Vec2, d: Vec2, half: Vec2) -> Option<(f32, f32)> {
    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;
    for (o, d, h) in [(o.x, d.x, half.x), (o.y, d.y, half.y)] {
        if d.abs() < 1e-9 {
            if o.abs() > h {
                return None;
            }
        } else {
            let a = (-h - o) / d;
            let b = (h - o) / d;
            t_min = t_min.max(a.min(b));
            t_max = t_max.min(a.max(b));
        }
    }
    (t_min <= t_max).then_some((t_min, t_max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn rect_basics() {
        let r = Rect::new(Vec2::new(-10.0, -5.0), Vec2::new(10.0, 5.0));
        assert_eq!(r.center(), Vec2::ZERO);
        assert!(r.contains(Vec2::new(10.0, 5.0)));
        assert!(!r.contains(Vec2::new(10.1, 0.0)));
        assert_eq!(r.distance_to_edge(Vec2::ZERO), 5.0);
        assert!(r.inset(6.0).is_degenerate());
        assert!(!r.is_degenerate());
    }

    #[test]
    fn rect_intersection() {
        let a = Rect::new(Vec2::ZERO, Vec2::splat(10.0));
        let b = Rect::new(Vec2::splat(5.0), Vec2::splat(20.0));
        let c = Rect::new(Vec2::splat(30.0), Vec2::splat(40.0));
        assert_eq!(
            a.intersection(&b),
            Some(Rect::new(Vec2::splat(5.0), Vec2::splat(10.0)))
        );
        assert!(a.intersection(&c).is_none());
        assert!(!a.intersects(&c));
    }

    #[test]
    fn rotated_box_rejects_aabb_corner() {
        // The AABB of a 45-degree box covers this point; the box itself does not.
        let fp = Footprint::obb(Vec2::ZERO, Vec2::new(10.0, 10.0), FRAC_PI_4, Category::OBSTACLE);
        let corner = Vec2::new(13.0, 13.0);
        assert!(fp.aabb().contains(corner));
        assert!(!fp.overlaps_circle(corner, 1.0));
        assert!(fp.overlaps_circle(Vec2::new(5.0, 5.0), 1.0));
    }

    #[test]
    fn capsule_distance() {
        let fp = Footprint::capsule(Vec2::ZERO, Vec2::new(100.0, 0.0), 10.0, Category::CORRIDOR);
        assert!(fp.distance_to(Vec2::new(50.0, 5.0)) == 0.0);
        assert!((fp.distance_to(Vec2::new(50.0, 30.0)) - 20.0).abs() < 1e-3);
        assert!((fp.distance_to(Vec2::new(-20.0, 0.0)) - 10.0).abs() < 1e-3);
    }

    #[test]
    fn ray_hits_circle_front_and_back() {
        let fp = Footprint::circle(Vec2::new(100.0, 0.0), 10.0, Category::OBSTACLE);
        let (t0, t1) = fp.ray_interval(Vec2::ZERO, Vec2::X).unwrap();
        assert!((t0 - 90.0).abs() < 1e-3);
        assert!((t1 - 110.0).abs() < 1e-3);
        assert!(fp.ray_interval(Vec2::ZERO, Vec2::Y).is_none());
        assert!(fp.ray_interval(Vec2::new(200.0, 0.0), Vec2::X).is_none());
    }

    #[test]
    fn ray_hits_rotated_box() {
        let fp = Footprint::obb(
            Vec2::new(50.0, 0.0),
            Vec2::new(10.0, 2.0),
            FRAC_PI_4,
            Category::WALL,
        );
        let (t0, t1) = fp.ray_interval(Vec2::ZERO, Vec2::X).unwrap();
        assert!(t0 < 50.0 && t1 > 50.0);
    }

    #[test]
    fn category_sets() {
        assert!(Category::PLACEMENT.contains(Category::CORRIDOR));
        assert!(!Category::TRAVERSAL.contains(Category::PICKUP));
        assert!(Category::PLACEMENT.intersects(Category::WALL | Category::PICKUP));
    }
}

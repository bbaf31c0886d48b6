//! Descriptors produced by the generators and consumed by the entity factory.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::types::{Category, Footprint};

/// Static obstacle kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    Rock,
    Barrel,
    Cone,
    Barrier,
    Steel,
    Hole,
}

impl ObstacleKind {
    pub fn is_destructible(self) -> bool {
        matches!(self, Self::Rock | Self::Barrel | Self::Cone)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Rock => "rock",
            Self::Barrel => "barrel",
            Self::Cone => "cone",
            Self::Barrier => "barrier",
            Self::Steel => "steel",
            Self::Hole => "hole",
        }
    }

    /// Bounding radius of this kind's footprint.
    pub fn footprint_radius(self) -> f32 {
        ObstacleDescriptor::new(self, Vec2::ZERO, 0.0)
            .footprint()
            .shape
            .bounding_radius()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleDescriptor {
    pub kind: ObstacleKind,
    pub position: Vec2,
    pub rotation: f32,
    pub destructible: bool,
}

impl ObstacleDescriptor {
    pub fn new(kind: ObstacleKind, position: Vec2, rotation: f32) -> Self {
        Self {
            kind,
            position,
            rotation,
            destructible: kind.is_destructible(),
        }
    }

    /// Physical bounding shape of the obstacle.
    pub fn footprint(&self) -> Footprint {
        let c = Category::OBSTACLE;
        match self.kind {
            ObstacleKind::Rock => Footprint::circle(self.position, 40.0, c),
            ObstacleKind::Barrel => Footprint::circle(self.position, 22.0, c),
            ObstacleKind::Cone => Footprint::circle(self.position, 14.0, c),
            ObstacleKind::Hole => Footprint::circle(self.position, 45.0, c),
            ObstacleKind::Barrier => {
                Footprint::obb(self.position, Vec2::new(12.0, 60.0), self.rotation, c)
            }
            ObstacleKind::Steel => {
                Footprint::obb(self.position, Vec2::new(34.0, 34.0), self.rotation, c)
            }
        }
    }
}

/// Raised hill with an elliptical footprint and a flat plateau.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HillDescriptor {
    pub center: Vec2,
    pub radius_x: f32,
    pub radius_y: f32,
    pub top_height: f32,
}

impl HillDescriptor {
    pub fn max_radius(&self) -> f32 {
        self.radius_x.max(self.radius_y)
    }

    /// Normalized elliptical radius of `p`; 1.0 on the footprint edge.
    pub fn normalized_radius(&self, p: Vec2) -> f32 {
        let d = p - self.center;
        ((d.x / self.radius_x).powi(2) + (d.y / self.radius_y).powi(2)).sqrt()
    }

    /// Distance from the center to the footprint edge along unit `dir`.
    pub fn edge_distance(&self, dir: Vec2) -> f32 {
        let k = (dir.x / self.radius_x).powi(2) + (dir.y / self.radius_y).powi(2);
        if k > 0.0 { 1.0 / k.sqrt() } else { 0.0 }
    }

    pub fn footprint(&self) -> Footprint {
        Footprint::circle(self.center, self.max_radius(), Category::HILL)
    }
}

/// Jump ramp. `heading` points in the direction of travel up the ramp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RampDescriptor {
    pub center: Vec2,
    /// Length along `heading` and width across it.
    pub size: Vec2,
    pub heading: f32,
    /// Vertical launch speed needed to clear the hill's plateau.
    pub launch_strength: f32,
}

impl RampDescriptor {
    pub fn footprint(&self) -> Footprint {
        Footprint::obb(self.center, self.size * 0.5, self.heading, Category::RAMP)
    }

    /// Both ends of the ramp along its heading.
    pub fn ends(&self) -> (Vec2, Vec2) {
        let half = Vec2::from_angle(self.heading) * (self.size.x * 0.5);
        (self.center - half, self.center + half)
    }
}

/// Keep-clear run-up zone in front of a ramp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorridorDescriptor {
    pub from: Vec2,
    pub to: Vec2,
    pub radius: f32,
}

impl CorridorDescriptor {
    pub fn footprint(&self) -> Footprint {
        Footprint::capsule(self.from, self.to, self.radius, Category::CORRIDOR)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnhancementKind {
    Repair,
    Ammo,
    Nitro,
    Shield,
}

impl EnhancementKind {
    pub const ALL: [EnhancementKind; 4] = [Self::Repair, Self::Ammo, Self::Nitro, Self::Shield];
}

/// Pickup radius used for both the entity and its placement clearance.
pub const PICKUP_RADIUS: f32 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnhancementDescriptor {
    pub position: Vec2,
    pub kind: EnhancementKind,
}

impl EnhancementDescriptor {
    pub fn footprint(&self) -> Footprint {
        Footprint::circle(self.position, PICKUP_RADIUS, Category::PICKUP)
    }
}

/// Anything a chunk can ask the entity factory to spawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpawnDescriptor {
    Obstacle(ObstacleDescriptor),
    Hill(HillDescriptor),
    Ramp(RampDescriptor),
    Corridor(CorridorDescriptor),
    Enhancement(EnhancementDescriptor),
}

impl SpawnDescriptor {
    pub fn footprint(&self) -> Footprint {
        match self {
            Self::Obstacle(d) => d.footprint(),
            Self::Hill(d) => d.footprint(),
            Self::Ramp(d) => d.footprint(),
            Self::Corridor(d) => d.footprint(),
            Self::Enhancement(d) => d.footprint(),
        }
    }

    pub fn category(&self) -> Category {
        self.footprint().category
    }

    pub fn position(&self) -> Vec2 {
        self.footprint().center
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Obstacle(d) => d.kind.name(),
            Self::Hill(_) => "hill",
            Self::Ramp(_) => "ramp",
            Self::Corridor(_) => "corridor",
            Self::Enhancement(_) => "enhancement",
        }
    }
}

/// A moving entity the streamer follows (player or enemy), with the radius
/// inside which no new content may appear.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackedEntity {
    pub position: Vec2,
    pub keep_out: f32,
}

impl TrackedEntity {
    pub fn new(position: Vec2, keep_out: f32) -> Self {
        Self { position, keep_out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destructible_kinds() {
        assert!(ObstacleKind::Barrel.is_destructible());
        assert!(ObstacleKind::Rock.is_destructible());
        assert!(!ObstacleKind::Steel.is_destructible());
        assert!(!ObstacleKind::Hole.is_destructible());
        let d = ObstacleDescriptor::new(ObstacleKind::Cone, Vec2::ZERO, 0.0);
        assert!(d.destructible);
    }

    #[test]
    fn hill_edge_distance_on_axes() {
        let hill = HillDescriptor {
            center: Vec2::ZERO,
            radius_x: 200.0,
            radius_y: 150.0,
            top_height: 150.0,
        };
        assert!((hill.edge_distance(Vec2::X) - 200.0).abs() < 1e-3);
        assert!((hill.edge_distance(-Vec2::Y) - 150.0).abs() < 1e-3);
        assert!((hill.normalized_radius(Vec2::new(200.0, 0.0)) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ramp_ends_follow_heading() {
        let ramp = RampDescriptor {
            center: Vec2::new(10.0, 0.0),
            size: Vec2::new(100.0, 40.0),
            heading: 0.0,
            launch_strength: 0.0,
        };
        let (a, b) = ramp.ends();
        assert!((a - Vec2::new(-40.0, 0.0)).length() < 1e-4);
        assert!((b - Vec2::new(60.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn descriptor_categories() {
        let ob = SpawnDescriptor::Obstacle(ObstacleDescriptor::new(
            ObstacleKind::Barrier,
            Vec2::ZERO,
            0.3,
        ));
        assert_eq!(ob.category(), Category::OBSTACLE);
        assert_eq!(ob.label(), "barrier");
        let cor = SpawnDescriptor::Corridor(CorridorDescriptor {
            from: Vec2::ZERO,
            to: Vec2::X * 10.0,
            radius: 5.0,
        });
        assert_eq!(cor.category(), Category::CORRIDOR);
    }
}

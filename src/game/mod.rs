//! Combat simulation modules

pub mod arena;
pub mod boss;
pub mod pickups;
pub mod projectiles;
pub mod vehicle;
pub mod weapons;
pub mod world;

pub use arena::{ArenaHandle, ArenaRegistry, ArenaRunner};

use glam::Vec3;
use uuid::Uuid;

use crate::protocol::ClientIntent;

/// Intent received from a connected collaborator, stamped with its sender
#[derive(Debug, Clone)]
pub struct ArenaCommand {
    pub user_id: Uuid,
    pub intent: ClientIntent,
    pub received_at: u64,
}

/// Driving/firing input applied to a vehicle for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub seq: u32,
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub fire_standard: bool,
    pub fire_special: bool,
    pub fire_pickup: bool,
    pub target: Vec3,
}

/// Unit forward vector for a yaw angle. Vehicles face -Z at yaw 0.
pub fn forward_from_yaw(yaw: f32) -> Vec3 {
    Vec3::new(-yaw.sin(), 0.0, -yaw.cos())
}

/// Yaw angle that makes `forward_from_yaw` point along `direction`
pub fn yaw_facing(direction: Vec3) -> f32 {
    f32::atan2(-direction.x, -direction.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaw_facing_round_trips_through_forward() {
        for dir in [
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(-0.6, 0.0, 0.8),
        ] {
            let yaw = yaw_facing(dir);
            let fwd = forward_from_yaw(yaw);
            assert!((fwd - dir.normalize()).length() < 1e-5);
        }
    }
}

//! World boundary contracts: collision oracle and spawn point provider.
//! The map itself (geometry, landmarks) is an external collaborator; the
//! simulation only depends on these queries.

use glam::Vec3;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Read-only collision query. Must be side-effect-free and cheap enough
/// to call many times per tick.
pub trait WorldOracle {
    fn is_collision(&self, position: Vec3, radius: f32) -> bool;
}

/// Spawn point provider for vehicles, the boss, and weapon pickups
pub trait SpawnPoints {
    fn random_spawn_point(&mut self) -> Vec3;
    fn random_weapon_spawn_point(&mut self) -> Vec3;
}

/// Combined world contract the arena is constructed with
pub trait ArenaWorld: WorldOracle + SpawnPoints + Send {
    fn as_oracle(&self) -> &dyn WorldOracle;
}

impl<T: WorldOracle + SpawnPoints + Send> ArenaWorld for T {
    fn as_oracle(&self) -> &dyn WorldOracle {
        self
    }
}

/// A flat square arena bounded by walls, with no interior obstacles.
/// Collides when a position (inflated by `radius`) leaves the floor.
pub struct BoundedWorld {
    half_extent: f32,
    rng: ChaCha8Rng,
}

impl BoundedWorld {
    pub fn new(half_extent: f32, rng: ChaCha8Rng) -> Self {
        Self { half_extent, rng }
    }
}

impl WorldOracle for BoundedWorld {
    fn is_collision(&self, position: Vec3, radius: f32) -> bool {
        let limit = self.half_extent - radius;
        position.x.abs() > limit || position.z.abs() > limit
    }
}

impl SpawnPoints for BoundedWorld {
    fn random_spawn_point(&mut self) -> Vec3 {
        let range = self.half_extent * 0.8;
        Vec3::new(
            self.rng.gen_range(-range..range),
            0.0,
            self.rng.gen_range(-range..range),
        )
    }

    fn random_weapon_spawn_point(&mut self) -> Vec3 {
        // Weapon pickups cluster closer to the center where fights happen
        let range = self.half_extent * 0.5;
        Vec3::new(
            self.rng.gen_range(-range..range),
            0.0,
            self.rng.gen_range(-range..range),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn bounded_world_collides_at_walls_only() {
        let world = BoundedWorld::new(100.0, ChaCha8Rng::seed_from_u64(1));
        assert!(!world.is_collision(Vec3::ZERO, 3.0));
        assert!(world.is_collision(Vec3::new(99.0, 0.0, 0.0), 3.0));
        assert!(world.is_collision(Vec3::new(0.0, 0.0, -120.0), 3.0));
    }

    #[test]
    fn spawn_points_stay_inside_the_arena() {
        let mut world = BoundedWorld::new(100.0, ChaCha8Rng::seed_from_u64(2));
        for _ in 0..32 {
            let p = world.random_spawn_point();
            assert!(!world.is_collision(p, 3.0));
        }
    }
}

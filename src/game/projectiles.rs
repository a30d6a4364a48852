//! Projectile and area-effect lifecycle: advancement, expiry, hit resolution

use std::collections::{HashMap, HashSet};

use glam::Vec3;
use uuid::Uuid;

use crate::protocol::EffectKind;

use super::boss::BossAi;
use super::vehicle::Vehicle;
use super::world::WorldOracle;

/// Cumulative travel distance after which a projectile expires
pub const MAX_PROJECTILE_RANGE: f32 = 1000.0;

/// Hit-test radius for vehicles
pub const VEHICLE_HIT_RADIUS: f32 = 2.0;

/// Hit-test radius used for obstacle collision of projectiles
const PROJECTILE_RADIUS: f32 = 0.5;

/// An in-flight projectile
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: Uuid,
    pub owner: Uuid,
    pub position: Vec3,
    /// Unit direction of travel
    pub direction: Vec3,
    pub speed: f32,
    pub damage: f32,
    /// Cumulative distance traveled
    pub traveled: f32,
    /// 0 = no homing; otherwise the per-tick steering fraction
    pub homing_strength: f32,
    /// Ghost projectiles pass through solid obstacles
    pub is_ghost: bool,
    /// Stun applied to a struck vehicle (0 = none)
    pub stun_ms: f64,
    /// Freeze applied to a struck vehicle (0 = none)
    pub freeze_ms: f64,
}

impl Projectile {
    /// Steer the direction a fraction of the way toward `target`,
    /// renormalized to unit length
    fn steer_toward(&mut self, target: Vec3) {
        let to_target = (target - self.position).normalize_or_zero();
        if to_target == Vec3::ZERO {
            return;
        }
        let steered = self.direction.lerp(to_target, self.homing_strength);
        self.direction = steered.normalize_or_zero();
    }

    /// Advance one tick; returns false once max range is exceeded
    fn advance(&mut self, dt: f32) -> bool {
        let step = self.speed * dt;
        self.position += self.direction * step;
        self.traveled += step;
        self.traveled <= MAX_PROJECTILE_RANGE
    }
}

/// Damage applied to a vehicle by a projectile or effect this tick
#[derive(Debug, Clone)]
pub struct VehicleHit {
    pub shooter_id: Uuid,
    pub target_id: Uuid,
    /// Post-armor damage actually dealt
    pub damage: f32,
    pub position: Vec3,
    pub target_killed: bool,
}

/// Damage applied to the boss by a projectile this tick
#[derive(Debug, Clone)]
pub struct BossHit {
    pub attacker_id: Uuid,
    pub damage: f32,
    pub boss_died: bool,
}

/// Owns all in-flight projectiles
#[derive(Default)]
pub struct ProjectileManager {
    projectiles: Vec<Projectile>,
}

impl ProjectileManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, projectile: Projectile) {
        self.projectiles.push(projectile);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.iter()
    }

    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    /// Advance every projectile and resolve collisions. Applies damage and
    /// status riders to struck vehicles, routes hits on the boss through
    /// `BossAi::take_damage`, and removes expired/spent projectiles.
    pub fn update(
        &mut self,
        dt: f32,
        now_ms: f64,
        vehicles: &mut HashMap<Uuid, Vehicle>,
        mut boss: Option<&mut BossAi>,
        world: &dyn WorldOracle,
    ) -> (Vec<VehicleHit>, Vec<BossHit>) {
        let mut vehicle_hits = Vec::new();
        let mut boss_hits = Vec::new();

        self.projectiles.retain_mut(|projectile| {
            if projectile.homing_strength > 0.0 {
                if let Some(target) = nearest_enemy_position(projectile, vehicles, boss.as_deref())
                {
                    projectile.steer_toward(target);
                }
            }

            if !projectile.advance(dt) {
                return false;
            }

            // Solid obstacles stop everything except ghost projectiles
            if !projectile.is_ghost && world.is_collision(projectile.position, PROJECTILE_RADIUS) {
                return false;
            }

            for vehicle in vehicles.values_mut() {
                if !vehicle.alive || vehicle.id == projectile.owner {
                    continue;
                }
                let hit_range = VEHICLE_HIT_RADIUS + PROJECTILE_RADIUS;
                if vehicle.position.distance_squared(projectile.position)
                    > hit_range * hit_range
                {
                    continue;
                }

                let dealt = vehicle.apply_damage(projectile.damage);
                if projectile.stun_ms > 0.0 {
                    vehicle.apply_stun(projectile.stun_ms, now_ms);
                }
                if projectile.freeze_ms > 0.0 {
                    vehicle.apply_freeze(projectile.freeze_ms, now_ms);
                }

                vehicle_hits.push(VehicleHit {
                    shooter_id: projectile.owner,
                    target_id: vehicle.id,
                    damage: dealt,
                    position: projectile.position,
                    target_killed: !vehicle.alive,
                });
                return false;
            }

            if let Some(boss) = boss.as_deref_mut() {
                if projectile.owner != boss.id
                    && boss.health > 0.0
                    && boss.position.distance_squared(projectile.position)
                        <= boss.hit_radius * boss.hit_radius
                {
                    let died = boss.take_damage(projectile.damage);
                    boss_hits.push(BossHit {
                        attacker_id: projectile.owner,
                        damage: projectile.damage,
                        boss_died: died,
                    });
                    return false;
                }
            }

            true
        });

        (vehicle_hits, boss_hits)
    }
}

/// Closest live target a homing projectile may steer toward. The boss is
/// a candidate like any vehicle, except for its own projectiles.
fn nearest_enemy_position(
    projectile: &Projectile,
    vehicles: &HashMap<Uuid, Vehicle>,
    boss: Option<&BossAi>,
) -> Option<Vec3> {
    let mut nearest: Option<(f32, Vec3)> = None;
    for vehicle in vehicles.values() {
        if !vehicle.alive || vehicle.id == projectile.owner {
            continue;
        }
        let dist = vehicle.position.distance_squared(projectile.position);
        if nearest.map_or(true, |(best, _)| dist < best) {
            nearest = Some((dist, vehicle.position));
        }
    }
    if let Some(boss) = boss {
        if boss.health > 0.0 && boss.id != projectile.owner {
            let dist = boss.position.distance_squared(projectile.position);
            if nearest.map_or(true, |(best, _)| dist < best) {
                nearest = Some((dist, boss.position));
            }
        }
    }
    nearest.map(|(_, pos)| pos)
}

/// A transient area effect anchored to a position
#[derive(Debug, Clone)]
pub struct AreaEffect {
    pub id: Uuid,
    pub kind: EffectKind,
    pub owner: Uuid,
    pub origin: Vec3,
    pub damage: f32,
    pub radius: f32,
    pub created_ms: f64,
    pub lifetime_ms: f64,
    /// Slow debuff re-applied to vehicles inside the radius (disco-style)
    pub slow_factor: Option<f32>,
    /// Vehicles already damaged by this effect (damage lands once)
    damaged: HashSet<Uuid>,
}

impl AreaEffect {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: EffectKind,
        owner: Uuid,
        origin: Vec3,
        damage: f32,
        radius: f32,
        lifetime_ms: f64,
        slow_factor: Option<f32>,
        now_ms: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            owner,
            origin,
            damage,
            radius,
            created_ms: now_ms,
            lifetime_ms,
            slow_factor,
            damaged: HashSet::new(),
        }
    }

    pub fn expired(&self, now_ms: f64) -> bool {
        now_ms - self.created_ms >= self.lifetime_ms
    }

    /// 1.0 when freshly created, 0.0 at expiry (read by the render sink)
    pub fn remaining_lifetime_fraction(&self, now_ms: f64) -> f32 {
        let remaining = 1.0 - (now_ms - self.created_ms) / self.lifetime_ms;
        remaining.clamp(0.0, 1.0) as f32
    }
}

/// Owns all live area effects
#[derive(Default)]
pub struct EffectManager {
    effects: Vec<AreaEffect>,
}

impl EffectManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, effect: AreaEffect) {
        self.effects.push(effect);
    }

    pub fn iter(&self) -> impl Iterator<Item = &AreaEffect> {
        self.effects.iter()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Apply live effects to vehicles inside their radius and drop expired
    /// ones. Damage lands once per vehicle per effect; slow debuffs are
    /// refreshed every tick for the effect's remaining lifetime.
    pub fn update(
        &mut self,
        now_ms: f64,
        vehicles: &mut HashMap<Uuid, Vehicle>,
    ) -> Vec<VehicleHit> {
        let mut hits = Vec::new();

        self.effects.retain_mut(|effect| {
            if effect.expired(now_ms) {
                return false;
            }

            for vehicle in vehicles.values_mut() {
                if !vehicle.alive || vehicle.id == effect.owner {
                    continue;
                }
                if vehicle.position.distance_squared(effect.origin)
                    > effect.radius * effect.radius
                {
                    continue;
                }

                if let Some(factor) = effect.slow_factor {
                    let remaining = effect.lifetime_ms - (now_ms - effect.created_ms);
                    vehicle.apply_slow(factor, remaining, now_ms);
                }

                if effect.damage > 0.0 && effect.damaged.insert(vehicle.id) {
                    let dealt = vehicle.apply_damage(effect.damage);
                    hits.push(VehicleHit {
                        shooter_id: effect.owner,
                        target_id: vehicle.id,
                        damage: dealt,
                        position: effect.origin,
                        target_killed: !vehicle.alive,
                    });
                }
            }

            true
        });

        hits
    }
}

//! Boss AI: difficulty scaling, chase movement, cooldown-gated attacks,
//! and identity-specific special attack behaviors

use std::collections::HashMap;

use glam::Vec3;
use rand::Rng;
use uuid::Uuid;

use crate::protocol::{
    BossIdentity, BossSpecialKind, BossState, DifficultyTier, EffectKind, GameEvent, WeaponKind,
};

use super::projectiles::{AreaEffect, Projectile};
use super::vehicle::Vehicle;
use super::weapons::{build_fire_action, FireAction};
use super::{forward_from_yaw, yaw_facing};

/// Default attack cadence, tightened once at low health
const ATTACK_COOLDOWN_MS: f64 = 2000.0;
const SPECIAL_ATTACK_COOLDOWN_MS: f64 = 10000.0;
const ENRAGED_ATTACK_COOLDOWN_MS: f64 = 1000.0;
const ENRAGED_SPECIAL_COOLDOWN_MS: f64 = 5000.0;

/// Health fraction below which the boss permanently tightens its cooldowns
const ENRAGE_THRESHOLD: f32 = 0.3;

/// Distance at which the boss switches from chasing to attacking
const ATTACK_RANGE: f32 = 10.0;

/// Forward cast distance for the regular attack
const FORWARD_CAST_DISTANCE: f32 = 50.0;

/// Static identity profile: tier, movement stat, and attack repertoire
#[derive(Debug, Clone, Copy)]
pub struct BossProfile {
    pub identity: BossIdentity,
    pub tier: DifficultyTier,
    /// Nominal speed stat; actual movement speed is half of this
    pub base_speed: f32,
    /// Ordered weapon list; the regular attack always uses the first entry
    pub repertoire: &'static [WeaponKind],
    pub special: BossSpecialKind,
}

impl BossProfile {
    pub const ALL: [BossIdentity; 5] = [
        BossIdentity::SweetTooth,
        BossIdentity::Darkside,
        BossIdentity::Minion,
        BossIdentity::Calypso,
        BossIdentity::TwistedMetal,
    ];

    pub fn for_identity(identity: BossIdentity) -> Self {
        match identity {
            BossIdentity::SweetTooth => Self {
                identity,
                tier: DifficultyTier::Easy,
                base_speed: 80.0,
                repertoire: &[WeaponKind::FireMissile, WeaponKind::PowerMissile],
                special: BossSpecialKind::FlamingClownHead,
            },
            BossIdentity::Darkside => Self {
                identity,
                tier: DifficultyTier::Medium,
                base_speed: 90.0,
                repertoire: &[WeaponKind::HomingMissile, WeaponKind::PowerMissile],
                special: BossSpecialKind::ShadowSlam,
            },
            BossIdentity::Minion => Self {
                identity,
                tier: DifficultyTier::Hard,
                base_speed: 70.0,
                repertoire: &[
                    WeaponKind::FireMissile,
                    WeaponKind::HomingMissile,
                    WeaponKind::PowerMissile,
                ],
                special: BossSpecialKind::MissileStorm,
            },
            BossIdentity::Calypso => Self {
                identity,
                tier: DifficultyTier::Insane,
                base_speed: 100.0,
                repertoire: &[
                    WeaponKind::FireMissile,
                    WeaponKind::HomingMissile,
                    WeaponKind::PowerMissile,
                ],
                special: BossSpecialKind::RealityWarp,
            },
            BossIdentity::TwistedMetal => Self {
                identity,
                tier: DifficultyTier::Twisted,
                base_speed: 120.0,
                repertoire: &[
                    WeaponKind::FireMissile,
                    WeaponKind::HomingMissile,
                    WeaponKind::PowerMissile,
                ],
                special: BossSpecialKind::Apocalypse,
            },
        }
    }
}

/// Difficulty bracket from player count
pub fn tier_for_player_count(player_count: usize) -> DifficultyTier {
    if player_count >= 21 {
        DifficultyTier::Twisted
    } else if player_count >= 16 {
        DifficultyTier::Insane
    } else if player_count >= 11 {
        DifficultyTier::Hard
    } else if player_count >= 6 {
        DifficultyTier::Medium
    } else {
        DifficultyTier::Easy
    }
}

pub fn tier_multiplier(tier: DifficultyTier) -> f32 {
    match tier {
        DifficultyTier::Easy => 1.0,
        DifficultyTier::Medium => 1.5,
        DifficultyTier::Hard => 2.0,
        DifficultyTier::Insane => 2.5,
        DifficultyTier::Twisted => 3.0,
    }
}

/// Everything the boss produced this tick, for the arena to absorb
#[derive(Default)]
pub struct BossTickOutput {
    pub projectiles: Vec<Projectile>,
    pub effects: Vec<AreaEffect>,
    pub events: Vec<GameEvent>,
}

/// The active boss entity and its controller state
pub struct BossAi {
    pub id: Uuid,
    pub identity: BossIdentity,
    pub tier: DifficultyTier,

    pub position: Vec3,
    pub yaw: f32,
    pub speed: f32,
    pub hit_radius: f32,

    pub health: f32,
    pub max_health: f32,
    pub state: BossState,

    attack_cooldown_ms: f64,
    special_attack_cooldown_ms: f64,
    last_attack_ms: f64,
    last_special_attack_ms: f64,
    /// Low-health tightening is one-way; healing never reverts it
    enraged: bool,
}

impl BossAi {
    /// Spawn a boss scaled to the current player count. The identity is
    /// chosen uniformly at random among those matching the difficulty tier.
    pub fn spawn<R: Rng>(player_count: usize, spawn_point: Vec3, rng: &mut R) -> Self {
        let tier = tier_for_player_count(player_count);
        let candidates: Vec<BossIdentity> = BossProfile::ALL
            .into_iter()
            .filter(|&id| BossProfile::for_identity(id).tier == tier)
            .collect();
        let identity = candidates[rng.gen_range(0..candidates.len())];
        let profile = BossProfile::for_identity(identity);

        let max_health =
            100.0 * tier_multiplier(tier) * (1.0 + player_count as f32 * 0.1);

        Self {
            id: Uuid::new_v4(),
            identity,
            tier,
            position: spawn_point,
            yaw: 0.0,
            // Bosses are intentionally slower than their nominal stat
            speed: profile.base_speed * 0.5,
            hit_radius: 3.0,
            health: max_health,
            max_health,
            state: BossState::Idle,
            attack_cooldown_ms: ATTACK_COOLDOWN_MS,
            special_attack_cooldown_ms: SPECIAL_ATTACK_COOLDOWN_MS,
            last_attack_ms: f64::NEG_INFINITY,
            last_special_attack_ms: f64::NEG_INFINITY,
            enraged: false,
        }
    }

    pub fn profile(&self) -> BossProfile {
        BossProfile::for_identity(self.identity)
    }

    pub fn attack_cooldown_ms(&self) -> f64 {
        self.attack_cooldown_ms
    }

    pub fn special_attack_cooldown_ms(&self) -> f64 {
        self.special_attack_cooldown_ms
    }

    /// Apply damage and report whether the boss died. Crossing the
    /// low-health threshold tightens both attack cooldowns exactly once.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        self.health = (self.health - amount).max(0.0);
        if !self.enraged && self.health < self.max_health * ENRAGE_THRESHOLD {
            self.enraged = true;
            self.attack_cooldown_ms = ENRAGED_ATTACK_COOLDOWN_MS;
            self.special_attack_cooldown_ms = ENRAGED_SPECIAL_COOLDOWN_MS;
        }
        self.health <= 0.0
    }

    /// One AI tick: acquire the nearest living vehicle, chase it, run both
    /// attack timers, then re-evaluate the behavior state. With no living
    /// target the boss does nothing this tick.
    pub fn update(
        &mut self,
        dt: f32,
        now_ms: f64,
        vehicles: &HashMap<Uuid, Vehicle>,
        world: &dyn super::world::WorldOracle,
    ) -> BossTickOutput {
        let mut out = BossTickOutput::default();

        let Some(target) = self.nearest_target(vehicles) else {
            return out;
        };

        // Movement: face and close on the target, rejecting moves into walls
        let to_target = target - self.position;
        let direction = to_target.normalize_or_zero();
        if direction != Vec3::ZERO {
            self.yaw = yaw_facing(direction);
            let next = self.position + direction * self.speed * dt;
            if !world.is_collision(next, self.hit_radius) {
                self.position = next;
            }
        }

        // Both timers run in parallel; firing both on one tick is valid
        if now_ms - self.last_attack_ms >= self.attack_cooldown_ms {
            self.last_attack_ms = now_ms;
            self.perform_attack(now_ms, &mut out);
        }
        if now_ms - self.last_special_attack_ms >= self.special_attack_cooldown_ms {
            self.last_special_attack_ms = now_ms;
            self.perform_special_attack(target, now_ms, &mut out);
        }

        // State is evaluated after movement, against the new distance
        let distance = target.distance(self.position);
        self.state = if self.health < self.max_health * ENRAGE_THRESHOLD {
            BossState::Special
        } else if distance < ATTACK_RANGE {
            BossState::Attacking
        } else {
            BossState::Chasing
        };

        out
    }

    fn nearest_target(&self, vehicles: &HashMap<Uuid, Vehicle>) -> Option<Vec3> {
        let mut nearest: Option<(f32, Vec3)> = None;
        for vehicle in vehicles.values() {
            if !vehicle.alive {
                continue;
            }
            let dist = vehicle.position.distance_squared(self.position);
            // Strict comparison: first-encountered wins ties
            if nearest.map_or(true, |(best, _)| dist < best) {
                nearest = Some((dist, vehicle.position));
            }
        }
        nearest.map(|(_, pos)| pos)
    }

    /// Regular attack: cast the first repertoire weapon straight ahead
    /// along the current facing, not tracking the target
    fn perform_attack(&self, now_ms: f64, out: &mut BossTickOutput) {
        let weapon_type = self.profile().repertoire[0];
        let spawn = self.position + Vec3::Y;
        let forward = forward_from_yaw(self.yaw);
        let cast_target = spawn + forward * FORWARD_CAST_DISTANCE;

        match build_fire_action(self.id, weapon_type, spawn, forward, now_ms) {
            FireAction::Projectile(p) => out.projectiles.push(p),
            FireAction::Effect(e) => out.effects.push(e),
        }

        out.events.push(GameEvent::BossWeaponFired {
            weapon_type,
            position: spawn,
            rotation: Vec3::new(0.0, self.yaw, 0.0),
            target: cast_target,
        });
    }

    /// Identity-specific special attack: a pure function of boss
    /// position/orientation/target producing projectile and effect records
    fn perform_special_attack(&self, target: Vec3, now_ms: f64, out: &mut BossTickOutput) {
        let special = self.profile().special;
        match special {
            BossSpecialKind::FlamingClownHead => {
                out.projectiles.push(self.flaming_clown_head(target));
                out.events.push(GameEvent::BossSpecialAttack {
                    kind: special,
                    position: self.position + Vec3::Y * 2.0,
                    rotation: Some(Vec3::new(0.0, self.yaw, 0.0)),
                    direction: None,
                });
            }
            BossSpecialKind::ShadowSlam => {
                let direction = (target - self.position).normalize_or_zero();
                out.effects.push(self.shadow_slam(direction, now_ms));
                out.events.push(GameEvent::BossSpecialAttack {
                    kind: special,
                    position: self.position,
                    rotation: None,
                    direction: Some(direction),
                });
            }
            BossSpecialKind::MissileStorm => {
                out.projectiles.extend(self.missile_storm());
                out.events.push(GameEvent::BossSpecialAttack {
                    kind: special,
                    position: self.position + Vec3::Y * 2.0,
                    rotation: Some(Vec3::new(0.0, self.yaw, 0.0)),
                    direction: None,
                });
            }
            BossSpecialKind::RealityWarp => {
                out.effects.push(self.reality_warp(now_ms));
                out.events.push(GameEvent::BossSpecialAttack {
                    kind: special,
                    position: self.position,
                    rotation: None,
                    direction: None,
                });
            }
            BossSpecialKind::Apocalypse => {
                // Everything at once, plus an environmental hazard field
                out.projectiles.push(self.flaming_clown_head(target));
                out.projectiles.extend(self.missile_storm());
                out.effects.push(AreaEffect::new(
                    EffectKind::Apocalypse,
                    self.id,
                    self.position,
                    25.0,
                    20.0,
                    1500.0,
                    None,
                    now_ms,
                ));
                out.events.push(GameEvent::BossSpecialAttack {
                    kind: special,
                    position: self.position,
                    rotation: Some(Vec3::new(0.0, self.yaw, 0.0)),
                    direction: None,
                });
            }
        }
    }

    /// A large fireball that chases the target
    fn flaming_clown_head(&self, target: Vec3) -> Projectile {
        let spawn = self.position + Vec3::Y * 2.0;
        Projectile {
            id: Uuid::new_v4(),
            owner: self.id,
            position: spawn,
            direction: (target - spawn).normalize_or_zero(),
            speed: 15.0,
            damage: 40.0,
            traveled: 0.0,
            homing_strength: 0.3,
            is_ghost: false,
            stun_ms: 0.0,
            freeze_ms: 0.0,
        }
    }

    /// Charge direction slam: a ground shockwave ahead of the boss
    fn shadow_slam(&self, direction: Vec3, now_ms: f64) -> AreaEffect {
        AreaEffect::new(
            EffectKind::ShadowSlam,
            self.id,
            self.position + direction * 10.0,
            30.0,
            15.0,
            1000.0,
            None,
            now_ms,
        )
    }

    /// A ring of homing missiles fired in all directions
    fn missile_storm(&self) -> Vec<Projectile> {
        let spawn = self.position + Vec3::Y * 2.0;
        (0..8)
            .map(|i| {
                let angle = i as f32 * std::f32::consts::TAU / 8.0;
                Projectile {
                    id: Uuid::new_v4(),
                    owner: self.id,
                    position: spawn,
                    direction: Vec3::new(angle.cos(), 0.0, angle.sin()),
                    speed: 40.0,
                    damage: 15.0,
                    traveled: 0.0,
                    homing_strength: 0.2,
                    is_ghost: false,
                    stun_ms: 0.0,
                    freeze_ms: 0.0,
                }
            })
            .collect()
    }

    /// Distortion field centered on the boss, slowing everything inside
    fn reality_warp(&self, now_ms: f64) -> AreaEffect {
        AreaEffect::new(
            EffectKind::RealityWarp,
            self.id,
            self.position,
            10.0,
            20.0,
            4000.0,
            Some(0.5),
            now_ms,
        )
    }

    /// Terminal teardown: clears controller state and zeroes health
    pub fn destroy(&mut self) {
        self.health = 0.0;
        self.state = BossState::Idle;
        self.last_attack_ms = f64::NEG_INFINITY;
        self.last_special_attack_ms = f64::NEG_INFINITY;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::VehicleIdentity;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct NoWalls;
    impl super::super::world::WorldOracle for NoWalls {
        fn is_collision(&self, _position: Vec3, _radius: f32) -> bool {
            false
        }
    }

    struct Everywhere;
    impl super::super::world::WorldOracle for Everywhere {
        fn is_collision(&self, _position: Vec3, _radius: f32) -> bool {
            true
        }
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    fn vehicles_at(positions: &[Vec3]) -> HashMap<Uuid, Vehicle> {
        positions
            .iter()
            .map(|&p| {
                let v = Vehicle::new(VehicleIdentity::Outlaw, p);
                (v.id, v)
            })
            .collect()
    }

    #[test]
    fn difficulty_tier_thresholds() {
        assert_eq!(tier_for_player_count(1), DifficultyTier::Easy);
        assert_eq!(tier_for_player_count(6), DifficultyTier::Medium);
        assert_eq!(tier_for_player_count(10), DifficultyTier::Medium);
        assert_eq!(tier_for_player_count(20), DifficultyTier::Insane);
        assert_eq!(tier_for_player_count(11), DifficultyTier::Hard);
        assert_eq!(tier_for_player_count(16), DifficultyTier::Insane);
        assert_eq!(tier_for_player_count(21), DifficultyTier::Twisted);
    }

    #[test]
    fn boss_health_scales_with_tier_and_player_count() {
        let boss = BossAi::spawn(20, Vec3::ZERO, &mut rng());
        assert_eq!(boss.tier, DifficultyTier::Insane);
        // 100 * 2.5 * (1 + 20*0.1) = 750
        assert!((boss.max_health - 750.0).abs() < 1e-3);

        let boss = BossAi::spawn(6, Vec3::ZERO, &mut rng());
        assert_eq!(boss.tier, DifficultyTier::Medium);
        assert!((boss.max_health - 240.0).abs() < 1e-3);

        let boss = BossAi::spawn(21, Vec3::ZERO, &mut rng());
        assert_eq!(boss.tier, DifficultyTier::Twisted);
        assert_eq!(boss.identity, BossIdentity::TwistedMetal);
        // 100 * 3 * (1 + 21*0.1) = 930
        assert!((boss.max_health - 930.0).abs() < 1e-2);
    }

    #[test]
    fn boss_is_half_as_fast_as_its_nominal_stat() {
        let boss = BossAi::spawn(21, Vec3::ZERO, &mut rng());
        assert_eq!(boss.speed, 60.0);
    }

    #[test]
    fn first_tick_fires_regular_and_special_together() {
        let mut boss = BossAi::spawn(3, Vec3::ZERO, &mut rng());
        let vehicles = vehicles_at(&[Vec3::new(0.0, 0.0, -100.0)]);

        let out = boss.update(0.033, 0.0, &vehicles, &NoWalls);
        let has_regular = out
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::BossWeaponFired { .. }));
        let has_special = out
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::BossSpecialAttack { .. }));
        assert!(has_regular && has_special);
    }

    #[test]
    fn attacks_respect_their_cooldowns() {
        let mut boss = BossAi::spawn(3, Vec3::ZERO, &mut rng());
        let vehicles = vehicles_at(&[Vec3::new(0.0, 0.0, -100.0)]);

        boss.update(0.033, 0.0, &vehicles, &NoWalls);

        // Inside both cooldown windows: nothing fires
        let out = boss.update(0.033, 1999.0, &vehicles, &NoWalls);
        assert!(out.events.is_empty());
        assert!(out.projectiles.is_empty());

        // Regular window reopens at 2000ms; special stays shut until 10000ms
        let out = boss.update(0.033, 2000.0, &vehicles, &NoWalls);
        assert!(out
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::BossWeaponFired { .. })));
        assert!(!out
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::BossSpecialAttack { .. })));
    }

    #[test]
    fn low_health_aggression_is_sticky_and_idempotent() {
        let mut boss = BossAi::spawn(3, Vec3::ZERO, &mut rng());
        assert_eq!(boss.attack_cooldown_ms(), 2000.0);

        // Drop below 30%
        boss.take_damage(boss.max_health * 0.75);
        assert_eq!(boss.attack_cooldown_ms(), 1000.0);
        assert_eq!(boss.special_attack_cooldown_ms(), 5000.0);

        // Further damage below the threshold must not re-shorten
        boss.take_damage(1.0);
        assert_eq!(boss.attack_cooldown_ms(), 1000.0);

        // Even if health climbs back above the threshold, the tightening holds
        boss.health = boss.max_health;
        boss.take_damage(1.0);
        assert_eq!(boss.attack_cooldown_ms(), 1000.0);
        assert_eq!(boss.special_attack_cooldown_ms(), 5000.0);
    }

    #[test]
    fn take_damage_clamps_and_reports_death() {
        let mut boss = BossAi::spawn(1, Vec3::ZERO, &mut rng());
        assert!(!boss.take_damage(boss.max_health - 1.0));
        assert!(boss.take_damage(100.0));
        assert_eq!(boss.health, 0.0);
    }

    #[test]
    fn boss_chases_nearest_living_vehicle() {
        let mut boss = BossAi::spawn(3, Vec3::ZERO, &mut rng());
        let mut vehicles = vehicles_at(&[Vec3::new(100.0, 0.0, 0.0)]);
        let far = Vehicle::new(VehicleIdentity::Spectre, Vec3::new(-500.0, 0.0, 0.0));
        vehicles.insert(far.id, far);

        boss.update(0.1, 0.0, &vehicles, &NoWalls);
        assert!(boss.position.x > 0.0);
        assert_eq!(boss.state, BossState::Chasing);
    }

    #[test]
    fn blocked_movement_leaves_position_unchanged() {
        let mut boss = BossAi::spawn(3, Vec3::new(5.0, 0.0, 5.0), &mut rng());
        let vehicles = vehicles_at(&[Vec3::new(100.0, 0.0, 0.0)]);

        let before = boss.position;
        boss.update(0.1, 0.0, &vehicles, &Everywhere);
        assert_eq!(boss.position, before);
    }

    #[test]
    fn state_machine_follows_health_and_distance() {
        let mut boss = BossAi::spawn(3, Vec3::ZERO, &mut rng());
        assert_eq!(boss.state, BossState::Idle);

        // Close target: attacking
        let vehicles = vehicles_at(&[Vec3::new(0.0, 0.0, -5.0)]);
        boss.update(0.001, 0.0, &vehicles, &NoWalls);
        assert_eq!(boss.state, BossState::Attacking);

        // Low health overrides distance
        boss.take_damage(boss.max_health * 0.8);
        boss.update(0.001, 100.0, &vehicles, &NoWalls);
        assert_eq!(boss.state, BossState::Special);
    }

    #[test]
    fn no_living_target_skips_the_tick() {
        let mut boss = BossAi::spawn(3, Vec3::ZERO, &mut rng());
        let mut vehicles = vehicles_at(&[Vec3::new(50.0, 0.0, 0.0)]);
        for v in vehicles.values_mut() {
            v.die();
        }

        let before = boss.position;
        let out = boss.update(0.1, 0.0, &vehicles, &NoWalls);
        assert_eq!(boss.position, before);
        assert!(out.events.is_empty());
        assert_eq!(boss.state, BossState::Idle);
    }

    #[test]
    fn missile_storm_fires_a_ring_of_homing_missiles() {
        let boss = BossAi::spawn(11, Vec3::ZERO, &mut rng());
        assert_eq!(boss.identity, BossIdentity::Minion);

        let storm = boss.missile_storm();
        assert_eq!(storm.len(), 8);
        for missile in &storm {
            assert!(missile.homing_strength > 0.0);
            assert!((missile.direction.length() - 1.0).abs() < 1e-5);
        }
    }
}

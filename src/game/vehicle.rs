//! Vehicle state machine: movement, health, status effects, weapon slots

use glam::Vec3;
use uuid::Uuid;

use crate::protocol::{VehicleIdentity, WeaponKind, WeaponSlot};

use super::weapons::{build_fire_action, FireAction, Weapon};
use super::{forward_from_yaw, TickInput};

/// Per-tick velocity decay
const FRICTION: f32 = 0.98;

/// Design stats on a 1-5 scale
#[derive(Debug, Clone, Copy)]
pub struct VehicleStats {
    pub speed: f32,
    pub acceleration: f32,
    pub handling: f32,
    pub armor: f32,
    pub weight: f32,
}

impl VehicleStats {
    pub fn for_identity(identity: VehicleIdentity) -> Self {
        match identity {
            VehicleIdentity::Axel => Self {
                speed: 3.0,
                acceleration: 2.0,
                handling: 2.0,
                armor: 4.0,
                weight: 4.0,
            },
            VehicleIdentity::Hammerhead => Self {
                speed: 2.0,
                acceleration: 3.0,
                handling: 2.0,
                armor: 4.0,
                weight: 5.0,
            },
            VehicleIdentity::Outlaw => Self {
                speed: 3.0,
                acceleration: 3.0,
                handling: 3.0,
                armor: 3.0,
                weight: 3.0,
            },
            VehicleIdentity::Spectre => Self {
                speed: 5.0,
                acceleration: 5.0,
                handling: 5.0,
                armor: 2.0,
                weight: 1.0,
            },
            VehicleIdentity::Auger => Self {
                speed: 2.0,
                acceleration: 2.0,
                handling: 2.0,
                armor: 4.0,
                weight: 5.0,
            },
            VehicleIdentity::ClubKid => Self {
                speed: 4.0,
                acceleration: 4.0,
                handling: 3.0,
                armor: 2.0,
                weight: 3.0,
            },
        }
    }

    /// More armor = more health
    pub fn max_health(&self) -> f32 {
        100.0 + self.armor * 20.0
    }
}

/// Permanent weapon loadout per identity (standard slot, special slot)
pub fn loadout(identity: VehicleIdentity) -> (WeaponKind, WeaponKind) {
    match identity {
        VehicleIdentity::Axel => (WeaponKind::MachineGun, WeaponKind::Shockwave),
        VehicleIdentity::Hammerhead => (WeaponKind::HeavyMachineGun, WeaponKind::CrushingStomp),
        VehicleIdentity::Outlaw => (WeaponKind::RapidFireMachineGun, WeaponKind::TaserShock),
        VehicleIdentity::Spectre => (WeaponKind::LightweightMachineGun, WeaponKind::GhostMissile),
        VehicleIdentity::Auger => (WeaponKind::HeavyCannon, WeaponKind::DrillCharge),
        VehicleIdentity::ClubKid => (WeaponKind::LightweightMachineGun, WeaponKind::DiscoInferno),
    }
}

/// A vehicle in the arena (authoritative state)
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: Uuid,
    pub identity: VehicleIdentity,
    pub stats: VehicleStats,

    // Health and combat
    pub max_health: f32,
    pub health: f32,
    pub alive: bool,

    // Position and movement
    pub position: Vec3,
    pub yaw: f32,
    pub velocity: Vec3,
    pub current_speed: f32,
    pub max_speed: f32,
    pub turn_speed: f32,

    // Status effects (absolute simulated-time expiries)
    stunned: bool,
    stun_until_ms: f64,
    frozen: bool,
    freeze_until_ms: f64,
    boost_factor: f32,
    boost_until_ms: f64,
    slow_factor: f32,
    slow_until_ms: f64,

    // Weapon slots
    pub standard_weapon: Option<Weapon>,
    pub special_weapon: Option<Weapon>,
    pub pickup_weapon: Option<Weapon>,

    // Input tracking
    pub current_input: TickInput,
    pub last_input_seq: u32,
}

impl Vehicle {
    pub fn new(identity: VehicleIdentity, spawn_position: Vec3) -> Self {
        let stats = VehicleStats::for_identity(identity);
        let (standard, special) = loadout(identity);
        Self {
            id: Uuid::new_v4(),
            identity,
            stats,
            max_health: stats.max_health(),
            health: stats.max_health(),
            alive: true,
            position: spawn_position,
            yaw: 0.0,
            velocity: Vec3::ZERO,
            current_speed: 0.0,
            max_speed: stats.speed * 2.0,
            turn_speed: stats.handling * 0.1,
            stunned: false,
            stun_until_ms: 0.0,
            frozen: false,
            freeze_until_ms: 0.0,
            boost_factor: 1.0,
            boost_until_ms: 0.0,
            slow_factor: 1.0,
            slow_until_ms: 0.0,
            standard_weapon: Some(Weapon::new(standard)),
            special_weapon: Some(Weapon::new(special)),
            pickup_weapon: None,
            current_input: TickInput::default(),
            last_input_seq: 0,
        }
    }

    pub fn is_stunned(&self) -> bool {
        self.stunned
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Combined boost/slow multiplier currently in effect
    pub fn speed_factor(&self) -> f32 {
        self.boost_factor * self.slow_factor
    }

    fn can_act(&self) -> bool {
        self.alive && !self.stunned && !self.frozen
    }

    pub fn move_forward(&mut self, dt: f32) {
        if !self.can_act() {
            return;
        }
        self.current_speed = (self.current_speed + self.stats.acceleration * dt).min(self.max_speed);
        self.velocity = forward_from_yaw(self.yaw) * self.current_speed;
    }

    /// Reverse is capped at half the forward maximum
    pub fn move_backward(&mut self, dt: f32) {
        if !self.can_act() {
            return;
        }
        self.current_speed =
            (self.current_speed - self.stats.acceleration * dt).max(-self.max_speed * 0.5);
        self.velocity = forward_from_yaw(self.yaw) * self.current_speed;
    }

    pub fn turn_left(&mut self, dt: f32) {
        if !self.can_act() {
            return;
        }
        self.yaw += self.turn_speed * dt;
    }

    pub fn turn_right(&mut self, dt: f32) {
        if !self.can_act() {
            return;
        }
        self.yaw -= self.turn_speed * dt;
    }

    /// Per-tick update: expire status effects against the simulation clock,
    /// integrate position (frozen halts integration, stun halts it too but
    /// keeps the clock running), and apply friction unconditionally.
    pub fn update(&mut self, dt: f32, now_ms: f64) {
        if self.stunned && now_ms >= self.stun_until_ms {
            self.stunned = false;
        }
        if self.frozen && now_ms >= self.freeze_until_ms {
            self.frozen = false;
        }
        if now_ms >= self.boost_until_ms {
            self.boost_factor = 1.0;
        }
        if now_ms >= self.slow_until_ms {
            self.slow_factor = 1.0;
        }

        if !self.frozen && !self.stunned {
            self.position += self.velocity * self.speed_factor() * dt;
        }

        self.velocity *= FRICTION;
    }

    /// Apply incoming damage through armor reduction. Each armor point
    /// shaves 10%, capped so the multiplier never goes negative. Returns
    /// the damage actually dealt (0 for a dead vehicle).
    pub fn apply_damage(&mut self, amount: f32) -> f32 {
        if !self.alive {
            return 0.0;
        }
        let multiplier = (1.0 - self.stats.armor * 0.1).max(0.0);
        let actual = amount * multiplier;
        self.health -= actual;
        if self.health <= 0.0 {
            self.health = 0.0;
            self.die();
        }
        actual
    }

    pub fn heal(&mut self, amount: f32) {
        if !self.alive {
            return;
        }
        self.health = (self.health + amount).min(self.max_health);
    }

    /// Re-applying while active extends/overwrites to the new expiry
    pub fn apply_stun(&mut self, duration_ms: f64, now_ms: f64) {
        self.stunned = true;
        self.stun_until_ms = now_ms + duration_ms;
    }

    pub fn apply_freeze(&mut self, duration_ms: f64, now_ms: f64) {
        self.frozen = true;
        self.freeze_until_ms = now_ms + duration_ms;
    }

    /// A newer slow supersedes any pending reset from an older one
    pub fn apply_slow(&mut self, factor: f32, duration_ms: f64, now_ms: f64) {
        self.slow_factor = factor;
        self.slow_until_ms = now_ms + duration_ms;
    }

    pub fn apply_boost(&mut self, factor: f32, duration_ms: f64, now_ms: f64) {
        self.boost_factor = factor;
        self.boost_until_ms = now_ms + duration_ms;
    }

    pub fn fire_standard_weapon(&mut self, target: Vec3, now_ms: f64) -> Option<FireAction> {
        self.fire_slot(WeaponSlot::Standard, target, now_ms)
    }

    pub fn fire_special_weapon(&mut self, target: Vec3, now_ms: f64) -> Option<FireAction> {
        self.fire_slot(WeaponSlot::Special, target, now_ms)
    }

    /// Firing the pickup weapon consumes it, but only on a successful
    /// fire, never on a failed cooldown check
    pub fn fire_pickup_weapon(&mut self, target: Vec3, now_ms: f64) -> Option<FireAction> {
        self.fire_slot(WeaponSlot::Pickup, target, now_ms)
    }

    pub fn fire_slot(
        &mut self,
        slot: WeaponSlot,
        target: Vec3,
        now_ms: f64,
    ) -> Option<FireAction> {
        if !self.can_act() {
            return None;
        }
        let aim = (target - self.position).normalize_or_zero();
        let direction = if aim == Vec3::ZERO {
            forward_from_yaw(self.yaw)
        } else {
            aim
        };

        let weapon = match slot {
            WeaponSlot::Standard => self.standard_weapon.as_mut(),
            WeaponSlot::Special => self.special_weapon.as_mut(),
            WeaponSlot::Pickup => self.pickup_weapon.as_mut(),
        }?;
        if !weapon.can_fire(now_ms) {
            return None;
        }
        let kind = weapon.kind;
        weapon.mark_fired(now_ms);

        if slot == WeaponSlot::Pickup {
            self.pickup_weapon = None;
        }

        Some(build_fire_action(self.id, kind, self.position, direction, now_ms))
    }

    /// Death flips state and halts motion; the vehicle stays in the
    /// simulation until explicitly removed or respawned
    pub fn die(&mut self) {
        self.alive = false;
        self.health = 0.0;
        self.stop();
    }

    pub fn stop(&mut self) {
        self.velocity = Vec3::ZERO;
        self.current_speed = 0.0;
    }

    /// Full state reset at a new spawn point
    pub fn respawn(&mut self, position: Vec3) {
        self.alive = true;
        self.health = self.max_health;
        self.position = position;
        self.yaw = 0.0;
        self.velocity = Vec3::ZERO;
        self.current_speed = 0.0;
        self.stunned = false;
        self.frozen = false;
        self.boost_factor = 1.0;
        self.boost_until_ms = 0.0;
        self.slow_factor = 1.0;
        self.slow_until_ms = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::weapons::FireAction;

    fn outlaw() -> Vehicle {
        Vehicle::new(VehicleIdentity::Outlaw, Vec3::ZERO)
    }

    #[test]
    fn armor_reduces_damage_by_ten_percent_per_point() {
        // Outlaw: armor 3, max health 160
        let mut v = outlaw();
        assert_eq!(v.max_health, 160.0);

        let dealt = v.apply_damage(20.0);
        assert!((dealt - 14.0).abs() < 1e-5);
        assert!((v.health - 146.0).abs() < 1e-4);
    }

    #[test]
    fn armor_multiplier_never_goes_negative() {
        let mut v = outlaw();
        v.stats.armor = 15.0;
        let dealt = v.apply_damage(50.0);
        assert_eq!(dealt, 0.0);
        assert_eq!(v.health, 160.0);
    }

    #[test]
    fn damage_on_dead_vehicle_is_a_no_op_returning_zero() {
        let mut v = outlaw();
        v.apply_damage(10_000.0);
        assert!(!v.alive);
        assert_eq!(v.health, 0.0);

        assert_eq!(v.apply_damage(50.0), 0.0);
        assert_eq!(v.health, 0.0);
    }

    #[test]
    fn lethal_damage_triggers_death_and_halts_motion() {
        let mut v = outlaw();
        v.move_forward(1.0);
        assert!(v.velocity.length() > 0.0);

        v.apply_damage(10_000.0);
        assert!(!v.alive);
        assert_eq!(v.velocity, Vec3::ZERO);
        assert_eq!(v.current_speed, 0.0);
    }

    #[test]
    fn heal_clamps_to_max_and_ignores_the_dead() {
        let mut v = outlaw();
        v.apply_damage(20.0);
        v.heal(1000.0);
        assert_eq!(v.health, v.max_health);

        v.die();
        v.heal(50.0);
        assert_eq!(v.health, 0.0);
    }

    #[test]
    fn stunned_vehicle_ignores_commands_until_expiry() {
        let mut v = outlaw();
        v.apply_stun(1000.0, 0.0);
        assert!(v.is_stunned());

        v.move_forward(0.1);
        v.turn_left(0.1);
        assert_eq!(v.velocity, Vec3::ZERO);
        assert_eq!(v.yaw, 0.0);
        assert!(v
            .fire_standard_weapon(Vec3::new(0.0, 0.0, -10.0), 500.0)
            .is_none());

        // Still stunned just before the deadline
        v.update(0.016, 999.0);
        assert!(v.is_stunned());

        // The first update at/after the deadline clears the flag
        v.update(0.016, 1000.0);
        assert!(!v.is_stunned());
        v.move_forward(0.1);
        assert!(v.velocity.length() > 0.0);
    }

    #[test]
    fn frozen_vehicle_keeps_position_but_friction_still_applies() {
        let mut v = outlaw();
        v.move_forward(1.0);
        let speed_before = v.velocity.length();

        v.apply_freeze(5000.0, 0.0);
        let pos_before = v.position;
        v.update(0.1, 100.0);

        assert_eq!(v.position, pos_before);
        assert!(v.velocity.length() < speed_before);
    }

    #[test]
    fn stun_reapplication_is_last_write_wins() {
        let mut v = outlaw();
        v.apply_stun(2000.0, 0.0);
        // Shorter re-application overwrites the expiry
        v.apply_stun(500.0, 100.0);
        v.update(0.016, 700.0);
        assert!(!v.is_stunned());
    }

    #[test]
    fn newer_boost_supersedes_older_pending_reset() {
        let mut v = outlaw();
        v.apply_boost(2.0, 1000.0, 0.0);
        // Second boost applied before the first expires
        v.apply_boost(3.0, 5000.0, 500.0);

        // The first boost's expiry must not clobber the newer factor
        v.update(0.016, 1200.0);
        assert_eq!(v.speed_factor(), 3.0);

        v.update(0.016, 5500.0);
        assert_eq!(v.speed_factor(), 1.0);
    }

    #[test]
    fn boost_scales_position_integration() {
        let mut straight = outlaw();
        let mut boosted = outlaw();
        straight.move_forward(1.0);
        boosted.move_forward(1.0);
        boosted.apply_boost(2.0, 10_000.0, 0.0);

        straight.update(0.1, 0.0);
        boosted.update(0.1, 0.0);
        assert!((boosted.position.length() - straight.position.length() * 2.0).abs() < 1e-4);
    }

    #[test]
    fn reverse_speed_is_capped_at_half_forward_max() {
        let mut v = outlaw();
        for _ in 0..1000 {
            v.move_backward(0.1);
        }
        assert!((v.current_speed - (-v.max_speed * 0.5)).abs() < 1e-4);

        for _ in 0..2000 {
            v.move_forward(0.1);
        }
        assert!((v.current_speed - v.max_speed).abs() < 1e-4);
    }

    #[test]
    fn firing_respects_weapon_cooldown() {
        let mut v = outlaw();
        let target = Vec3::new(0.0, 0.0, -20.0);

        assert!(v.fire_standard_weapon(target, 0.0).is_some());
        // Outlaw's rapid-fire machine gun cools down in 100ms
        assert!(v.fire_standard_weapon(target, 50.0).is_none());
        assert!(v.fire_standard_weapon(target, 100.0).is_some());
    }

    #[test]
    fn pickup_weapon_is_consumed_only_on_successful_fire() {
        let mut v = outlaw();
        v.pickup_weapon = Some(Weapon::new(WeaponKind::PowerMissile));
        let target = Vec3::new(0.0, 0.0, -20.0);

        let fired = v.fire_pickup_weapon(target, 0.0);
        assert!(matches!(fired, Some(FireAction::Projectile(_))));
        assert!(v.pickup_weapon.is_none());

        // Cooling-down pickup stays in the slot on a failed fire
        let mut cooling = Weapon::new(WeaponKind::PowerMissile);
        cooling.mark_fired(10.0);
        v.pickup_weapon = Some(cooling);
        assert!(v.fire_pickup_weapon(target, 20.0).is_none());
        assert!(v.pickup_weapon.is_some());
    }

    #[test]
    fn dead_vehicle_cannot_fire() {
        let mut v = outlaw();
        v.die();
        assert!(v
            .fire_standard_weapon(Vec3::new(0.0, 0.0, -20.0), 0.0)
            .is_none());
        assert!(v
            .fire_special_weapon(Vec3::new(0.0, 0.0, -20.0), 0.0)
            .is_none());
    }

    #[test]
    fn respawn_restores_a_clean_state() {
        let mut v = outlaw();
        v.move_forward(1.0);
        v.apply_stun(60_000.0, 0.0);
        v.apply_slow(0.5, 60_000.0, 0.0);
        v.apply_damage(10_000.0);

        let spawn = Vec3::new(10.0, 0.0, -30.0);
        v.respawn(spawn);

        assert!(v.alive);
        assert_eq!(v.health, v.max_health);
        assert_eq!(v.position, spawn);
        assert_eq!(v.velocity, Vec3::ZERO);
        assert!(!v.is_stunned());
        assert_eq!(v.speed_factor(), 1.0);
    }
}

//! Weapon catalog - immutable templates plus per-owner fire state

use glam::Vec3;
use uuid::Uuid;

use crate::config::ConfigError;
use crate::protocol::{EffectKind, WeaponKind};

use super::projectiles::{AreaEffect, Projectile};

/// Distance in front of the firer at which projectiles spawn
pub const PROJECTILE_SPAWN_OFFSET: f32 = 2.0;

/// What firing a weapon produces
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeaponPayload {
    /// A projectile travelling along the aim direction
    Projectile {
        homing_strength: f32,
        is_ghost: bool,
        stun_ms: f64,
        freeze_ms: f64,
    },
    /// An area effect centered on the firer
    Area {
        kind: EffectKind,
        radius: f32,
        lifetime_ms: f64,
        slow_factor: Option<f32>,
    },
}

/// Immutable weapon template. Fire state lives in [`Weapon`], one per
/// owning vehicle, so cooldowns are never shared across owners.
#[derive(Debug, Clone, Copy)]
pub struct WeaponSpec {
    pub damage: f32,
    pub cooldown_ms: f64,
    pub projectile_speed: f32,
    pub payload: WeaponPayload,
}

const BULLET: WeaponPayload = WeaponPayload::Projectile {
    homing_strength: 0.0,
    is_ghost: false,
    stun_ms: 0.0,
    freeze_ms: 0.0,
};

impl WeaponSpec {
    pub fn for_kind(kind: WeaponKind) -> Self {
        match kind {
            WeaponKind::MachineGun => Self {
                damage: 5.0,
                cooldown_ms: 200.0,
                projectile_speed: 70.0,
                payload: BULLET,
            },
            WeaponKind::HeavyMachineGun => Self {
                damage: 8.0,
                cooldown_ms: 300.0,
                projectile_speed: 60.0,
                payload: BULLET,
            },
            WeaponKind::RapidFireMachineGun => Self {
                damage: 3.0,
                cooldown_ms: 100.0,
                projectile_speed: 80.0,
                payload: BULLET,
            },
            WeaponKind::LightweightMachineGun => Self {
                damage: 4.0,
                cooldown_ms: 150.0,
                projectile_speed: 90.0,
                payload: BULLET,
            },
            WeaponKind::HeavyCannon => Self {
                damage: 15.0,
                cooldown_ms: 500.0,
                projectile_speed: 50.0,
                payload: BULLET,
            },
            WeaponKind::Shockwave => Self {
                damage: 20.0,
                cooldown_ms: 5000.0,
                projectile_speed: 0.0,
                payload: WeaponPayload::Area {
                    kind: EffectKind::Shockwave,
                    radius: 10.0,
                    lifetime_ms: 1000.0,
                    slow_factor: None,
                },
            },
            WeaponKind::CrushingStomp => Self {
                damage: 30.0,
                cooldown_ms: 8000.0,
                projectile_speed: 0.0,
                payload: WeaponPayload::Area {
                    kind: EffectKind::Stomp,
                    radius: 15.0,
                    lifetime_ms: 500.0,
                    slow_factor: None,
                },
            },
            WeaponKind::TaserShock => Self {
                damage: 15.0,
                cooldown_ms: 4000.0,
                projectile_speed: 100.0,
                payload: WeaponPayload::Projectile {
                    homing_strength: 0.0,
                    is_ghost: false,
                    stun_ms: 2000.0,
                    freeze_ms: 0.0,
                },
            },
            WeaponKind::GhostMissile => Self {
                damage: 25.0,
                cooldown_ms: 6000.0,
                projectile_speed: 40.0,
                payload: WeaponPayload::Projectile {
                    homing_strength: 0.1,
                    is_ghost: true,
                    stun_ms: 0.0,
                    freeze_ms: 0.0,
                },
            },
            WeaponKind::DrillCharge => Self {
                damage: 40.0,
                cooldown_ms: 10000.0,
                projectile_speed: 0.0,
                payload: WeaponPayload::Area {
                    kind: EffectKind::Drill,
                    radius: 3.0,
                    lifetime_ms: 3000.0,
                    slow_factor: None,
                },
            },
            WeaponKind::DiscoInferno => Self {
                damage: 10.0,
                cooldown_ms: 7000.0,
                projectile_speed: 0.0,
                payload: WeaponPayload::Area {
                    kind: EffectKind::Disco,
                    radius: 15.0,
                    lifetime_ms: 3000.0,
                    slow_factor: Some(0.5),
                },
            },
            WeaponKind::FreezeMissile => Self {
                damage: 5.0,
                cooldown_ms: 3000.0,
                projectile_speed: 50.0,
                payload: WeaponPayload::Projectile {
                    homing_strength: 0.0,
                    is_ghost: false,
                    stun_ms: 0.0,
                    freeze_ms: 3000.0,
                },
            },
            WeaponKind::FireMissile => Self {
                damage: 20.0,
                cooldown_ms: 2000.0,
                projectile_speed: 60.0,
                payload: WeaponPayload::Projectile {
                    homing_strength: 0.05,
                    is_ghost: false,
                    stun_ms: 0.0,
                    freeze_ms: 0.0,
                },
            },
            WeaponKind::HomingMissile => Self {
                damage: 15.0,
                cooldown_ms: 4000.0,
                projectile_speed: 40.0,
                payload: WeaponPayload::Projectile {
                    homing_strength: 0.2,
                    is_ghost: false,
                    stun_ms: 0.0,
                    freeze_ms: 0.0,
                },
            },
            WeaponKind::PowerMissile => Self {
                damage: 40.0,
                cooldown_ms: 5000.0,
                projectile_speed: 30.0,
                payload: BULLET,
            },
        }
    }
}

impl std::str::FromStr for WeaponKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "machineGun" => Ok(Self::MachineGun),
            "heavyMachineGun" => Ok(Self::HeavyMachineGun),
            "rapidFireMachineGun" => Ok(Self::RapidFireMachineGun),
            "lightweightMachineGun" => Ok(Self::LightweightMachineGun),
            "heavyCannon" => Ok(Self::HeavyCannon),
            "shockwave" => Ok(Self::Shockwave),
            "crushingStomp" => Ok(Self::CrushingStomp),
            "taserShock" => Ok(Self::TaserShock),
            "ghostMissile" => Ok(Self::GhostMissile),
            "drillCharge" => Ok(Self::DrillCharge),
            "discoInferno" => Ok(Self::DiscoInferno),
            "freezeMissile" => Ok(Self::FreezeMissile),
            "fireMissile" => Ok(Self::FireMissile),
            "homingMissile" => Ok(Self::HomingMissile),
            "powerMissile" => Ok(Self::PowerMissile),
            other => Err(ConfigError::UnknownWeapon(other.to_string())),
        }
    }
}

/// A weapon instance held by one vehicle: template kind plus fire timer
#[derive(Debug, Clone)]
pub struct Weapon {
    pub kind: WeaponKind,
    last_fired_ms: f64,
}

impl Weapon {
    pub fn new(kind: WeaponKind) -> Self {
        Self {
            kind,
            // Never fired: ready immediately
            last_fired_ms: f64::NEG_INFINITY,
        }
    }

    pub fn spec(&self) -> WeaponSpec {
        WeaponSpec::for_kind(self.kind)
    }

    /// True iff the cooldown has fully elapsed at `now_ms`
    pub fn can_fire(&self, now_ms: f64) -> bool {
        now_ms - self.last_fired_ms >= self.spec().cooldown_ms
    }

    /// Stamp the fire timer. Called exactly once per successful fire.
    pub fn mark_fired(&mut self, now_ms: f64) {
        self.last_fired_ms = now_ms;
    }
}

/// The result of a successful fire
#[derive(Debug, Clone)]
pub enum FireAction {
    Projectile(Projectile),
    Effect(AreaEffect),
}

/// Build the projectile or area effect a weapon produces when fired.
/// Projectiles spawn slightly ahead of the firer along the aim direction;
/// area effects are centered on the firer.
pub fn build_fire_action(
    owner: Uuid,
    kind: WeaponKind,
    origin: Vec3,
    direction: Vec3,
    now_ms: f64,
) -> FireAction {
    let spec = WeaponSpec::for_kind(kind);
    match spec.payload {
        WeaponPayload::Projectile {
            homing_strength,
            is_ghost,
            stun_ms,
            freeze_ms,
        } => FireAction::Projectile(Projectile {
            id: Uuid::new_v4(),
            owner,
            position: origin + direction * PROJECTILE_SPAWN_OFFSET,
            direction,
            speed: spec.projectile_speed,
            damage: spec.damage,
            traveled: 0.0,
            homing_strength,
            is_ghost,
            stun_ms,
            freeze_ms,
        }),
        WeaponPayload::Area {
            kind: effect_kind,
            radius,
            lifetime_ms,
            slow_factor,
        } => FireAction::Effect(AreaEffect::new(
            effect_kind,
            owner,
            origin,
            spec.damage,
            radius,
            lifetime_ms,
            slow_factor,
            now_ms,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_gates_exactly_at_boundary() {
        let mut weapon = Weapon::new(WeaponKind::MachineGun);
        assert!(weapon.can_fire(0.0));
        weapon.mark_fired(1000.0);
        assert!(!weapon.can_fire(1000.0 + 1.0));
        assert!(!weapon.can_fire(1000.0 + 199.0));
        assert!(weapon.can_fire(1000.0 + 200.0));
    }

    #[test]
    fn fire_state_is_not_shared_between_owners() {
        let mut a = Weapon::new(WeaponKind::HeavyCannon);
        let b = Weapon::new(WeaponKind::HeavyCannon);
        a.mark_fired(500.0);
        assert!(!a.can_fire(600.0));
        assert!(b.can_fire(600.0));
    }

    #[test]
    fn taser_projectile_carries_stun_rider() {
        let action = build_fire_action(
            Uuid::new_v4(),
            WeaponKind::TaserShock,
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, -1.0),
            0.0,
        );
        match action {
            FireAction::Projectile(p) => {
                assert_eq!(p.stun_ms, 2000.0);
                assert_eq!(p.position, Vec3::new(0.0, 0.0, -PROJECTILE_SPAWN_OFFSET));
            }
            FireAction::Effect(_) => panic!("taser is a projectile weapon"),
        }
    }

    #[test]
    fn disco_effect_slows_instead_of_bursting() {
        let action = build_fire_action(
            Uuid::new_v4(),
            WeaponKind::DiscoInferno,
            Vec3::new(5.0, 0.0, 5.0),
            Vec3::ZERO,
            100.0,
        );
        match action {
            FireAction::Effect(e) => {
                assert_eq!(e.kind, EffectKind::Disco);
                assert_eq!(e.slow_factor, Some(0.5));
                assert_eq!(e.radius, 15.0);
            }
            FireAction::Projectile(_) => panic!("disco is an area weapon"),
        }
    }

    #[test]
    fn unknown_weapon_name_is_a_config_error() {
        assert!("plasmaRifle".parse::<WeaponKind>().is_err());
        assert_eq!(
            "freezeMissile".parse::<WeaponKind>().unwrap(),
            WeaponKind::FreezeMissile
        );
    }
}

//! World pickups: health, weapon crates, and turbo boosts, with
//! timestamp-based respawn instead of deferred callbacks

use std::collections::HashMap;

use glam::Vec3;
use uuid::Uuid;

use crate::config::ConfigError;
use crate::protocol::{GameEvent, PickupKind, WeaponKind};

use super::vehicle::Vehicle;
use super::weapons::Weapon;

/// How close a living vehicle must drive to collect a pickup
pub const PICKUP_COLLECT_RADIUS: f32 = 3.0;

const HEALTH_HEAL: f32 = 50.0;
const FULL_HEALTH_HEAL: f32 = 999.0;
const TURBO_FACTOR: f32 = 2.0;
const TURBO_DURATION_MS: f64 = 5000.0;

/// A single pickup slot in the world. Collected pickups deactivate and
/// reactivate at an absolute timestamp; the slot itself never moves.
#[derive(Debug, Clone)]
pub struct Pickup {
    pub id: Uuid,
    pub kind: PickupKind,
    pub position: Vec3,
    pub is_active: bool,
    respawn_at_ms: Option<f64>,
}

impl Pickup {
    pub fn new(kind: PickupKind, position: Vec3) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            position,
            is_active: true,
            respawn_at_ms: None,
        }
    }

    /// Build a pickup from a config-file type name. Unknown names are
    /// rejected at load time rather than silently spawning nothing.
    pub fn from_config(type_name: &str, position: Vec3) -> Result<Self, ConfigError> {
        let kind = match type_name {
            "health" => PickupKind::Health { full: false },
            "fullHealth" => PickupKind::Health { full: true },
            "turbo" => PickupKind::Turbo,
            other => match other.parse::<WeaponKind>() {
                Ok(weapon) => PickupKind::Weapon { weapon },
                Err(_) => return Err(ConfigError::UnknownPickup(other.to_string())),
            },
        };
        Ok(Self::new(kind, position))
    }

    /// Delay before this pickup reappears after collection
    fn respawn_delay_ms(&self) -> f64 {
        match self.kind {
            PickupKind::Health { full: false } => 20000.0,
            PickupKind::Health { full: true } => 60000.0,
            PickupKind::Weapon { .. } => 45000.0,
            PickupKind::Turbo => 30000.0,
        }
    }

    /// Apply this pickup's reward to the collecting vehicle
    fn grant(&self, vehicle: &mut Vehicle, now_ms: f64) {
        match self.kind {
            PickupKind::Health { full } => {
                let amount = if full { FULL_HEALTH_HEAL } else { HEALTH_HEAL };
                vehicle.heal(amount);
            }
            PickupKind::Weapon { weapon } => {
                vehicle.pickup_weapon = Some(Weapon::new(weapon));
            }
            PickupKind::Turbo => {
                vehicle.apply_boost(TURBO_FACTOR, TURBO_DURATION_MS, now_ms);
            }
        }
    }

    fn collect(&mut self, now_ms: f64) {
        self.is_active = false;
        self.respawn_at_ms = Some(now_ms + self.respawn_delay_ms());
    }
}

/// All pickup slots in the arena
#[derive(Default)]
pub struct PickupManager {
    pickups: Vec<Pickup>,
}

impl PickupManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, pickup: Pickup) {
        self.pickups.push(pickup);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pickup> {
        self.pickups.iter()
    }

    pub fn len(&self) -> usize {
        self.pickups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pickups.is_empty()
    }

    /// One tick: reactivate pickups whose respawn time has arrived, then
    /// hand out active pickups to living vehicles driving over them.
    pub fn update(
        &mut self,
        now_ms: f64,
        vehicles: &mut HashMap<Uuid, Vehicle>,
    ) -> Vec<GameEvent> {
        let mut events = Vec::new();

        for pickup in &mut self.pickups {
            if !pickup.is_active {
                if let Some(at) = pickup.respawn_at_ms {
                    if now_ms >= at {
                        pickup.is_active = true;
                        pickup.respawn_at_ms = None;
                    }
                }
                if !pickup.is_active {
                    continue;
                }
            }

            let collector = vehicles.values_mut().find(|v| {
                v.alive
                    && v.position.distance_squared(pickup.position)
                        <= PICKUP_COLLECT_RADIUS * PICKUP_COLLECT_RADIUS
            });
            if let Some(vehicle) = collector {
                pickup.grant(vehicle, now_ms);
                events.push(GameEvent::PickupCollected {
                    vehicle_id: vehicle.id,
                    pickup_id: pickup.id,
                    kind: pickup.kind,
                });
                pickup.collect(now_ms);
            }
        }

        events
    }
}

//! Message and event definitions exchanged with collaborators
//! (renderer, input source, network messaging layer). The core defines
//! names and payload shapes here; wire transport lives elsewhere.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ConfigError;

/// Playable vehicle identities. Stats and weapon loadouts are data-driven
/// (see `game::vehicle::VehicleStats`), never subclassed per identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VehicleIdentity {
    /// Slow, heavily armored bruiser
    Axel,
    /// Very heavy ram truck
    Hammerhead,
    /// Balanced all-rounder
    Outlaw,
    /// Fast and fragile
    Spectre,
    /// Drilling siege machine
    Auger,
    /// Quick party wagon
    ClubKid,
}

impl Default for VehicleIdentity {
    fn default() -> Self {
        Self::Outlaw
    }
}

impl std::str::FromStr for VehicleIdentity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "axel" => Ok(Self::Axel),
            "hammerhead" => Ok(Self::Hammerhead),
            "outlaw" => Ok(Self::Outlaw),
            "spectre" => Ok(Self::Spectre),
            "auger" => Ok(Self::Auger),
            "clubKid" | "club-kid" => Ok(Self::ClubKid),
            other => Err(ConfigError::UnknownVehicle(other.to_string())),
        }
    }
}

/// Every weapon in the catalog. Standard weapons ride on a vehicle's
/// permanent slots; the missile family arrives through weapon pickups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeaponKind {
    MachineGun,
    HeavyMachineGun,
    RapidFireMachineGun,
    LightweightMachineGun,
    HeavyCannon,
    Shockwave,
    CrushingStomp,
    TaserShock,
    GhostMissile,
    DrillCharge,
    DiscoInferno,
    FreezeMissile,
    FireMissile,
    HomingMissile,
    PowerMissile,
}

/// Area effect kinds, including the boss-special variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectKind {
    Shockwave,
    Stomp,
    Disco,
    Drill,
    ShadowSlam,
    RealityWarp,
    Apocalypse,
}

/// Boss vehicle identities, one per difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BossIdentity {
    SweetTooth,
    Darkside,
    Minion,
    Calypso,
    TwistedMetal,
}

/// Boss-specific special attack behaviors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BossSpecialKind {
    FlamingClownHead,
    ShadowSlam,
    MissileStorm,
    RealityWarp,
    Apocalypse,
}

/// Boss difficulty brackets, selected from player count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DifficultyTier {
    Easy,
    Medium,
    Hard,
    Insane,
    Twisted,
}

/// Boss AI behavior state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BossState {
    Idle,
    Chasing,
    Attacking,
    Special,
}

/// World pickup kinds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PickupKind {
    Health { full: bool },
    Weapon { weapon: WeaponKind },
    Turbo,
}

/// Which of a vehicle's three weapon slots to fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeaponSlot {
    Standard,
    Special,
    Pickup,
}

/// Intents sent from the input source / remote client to the arena
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientIntent {
    /// Request to join an arena with a chosen vehicle
    JoinArena {
        arena_id: Option<Uuid>,
        identity: VehicleIdentity,
    },

    /// Driving and firing input for the current tick
    DriveTick {
        /// Sequence number for reconciliation
        seq: u32,
        forward: bool,
        backward: bool,
        left: bool,
        right: bool,
        fire_standard: bool,
        fire_special: bool,
        fire_pickup: bool,
        /// Aim point in world space
        target: Vec3,
    },

    /// Authoritative state for a remotely simulated vehicle
    RemoteState {
        vehicle_id: Uuid,
        position: Vec3,
        yaw: f32,
        health: f32,
    },

    /// Ping for latency measurement
    Ping { t: u64 },

    /// Leave the current arena
    LeaveArena,
}

/// Events produced by the simulation core, forwarded to the messaging
/// collaborator as explicit return values (no ambient event bus).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GameEvent {
    /// A vehicle entered the arena with its chosen identity
    VehicleSelected {
        vehicle_id: Uuid,
        identity: VehicleIdentity,
    },

    /// A vehicle fired one of its weapons
    FireWeapon {
        vehicle_id: Uuid,
        weapon_type: WeaponKind,
        target: Vec3,
    },

    /// Projectile or effect damage landed
    Hit {
        shooter_id: Uuid,
        target_id: Uuid,
        damage: f32,
        position: Vec3,
    },

    /// A vehicle was destroyed
    Kill {
        killer_id: Option<Uuid>,
        victim_id: Uuid,
    },

    /// A pickup was collected
    PickupCollected {
        vehicle_id: Uuid,
        pickup_id: Uuid,
        kind: PickupKind,
    },

    /// The boss entered the arena
    BossSpawned {
        identity: BossIdentity,
        tier: DifficultyTier,
        max_health: f32,
    },

    /// The boss fired its regular attack
    BossWeaponFired {
        weapon_type: WeaponKind,
        position: Vec3,
        rotation: Vec3,
        target: Vec3,
    },

    /// The boss performed its identity-specific special attack
    BossSpecialAttack {
        #[serde(rename = "type")]
        kind: BossSpecialKind,
        position: Vec3,
        #[serde(skip_serializing_if = "Option::is_none")]
        rotation: Option<Vec3>,
        #[serde(skip_serializing_if = "Option::is_none")]
        direction: Option<Vec3>,
    },

    /// Boss damage landed
    BossDamaged { attacker_id: Uuid, damage: f32 },

    /// The boss was destroyed
    BossDefeated,
}

/// Messages sent from the arena to connected collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome { user_id: Uuid, server_time: u64 },

    /// Confirmation of arena join
    ArenaJoined {
        arena_id: Uuid,
        seed: u64,
        vehicle_id: Uuid,
    },

    /// Read-only state snapshot, published after a tick completes
    Snapshot {
        tick: u64,
        vehicles: Vec<VehicleView>,
        projectiles: Vec<ProjectileView>,
        effects: Vec<EffectView>,
        pickups: Vec<PickupView>,
        boss: Option<BossView>,
        events: Vec<GameEvent>,
    },

    /// The arena shut down
    ArenaEnded { boss_defeated: bool },

    /// Error message
    Error { code: String, message: String },

    /// Pong response
    Pong { t: u64 },
}

/// Vehicle state as seen by the render/presentation sink
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleView {
    pub id: Uuid,
    pub identity: VehicleIdentity,
    pub position: Vec3,
    pub yaw: f32,
    pub velocity: Vec3,
    pub health: f32,
    pub alive: bool,
    pub stunned: bool,
    pub frozen: bool,
    pub last_input_seq: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectileView {
    pub id: Uuid,
    pub position: Vec3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectView {
    pub id: Uuid,
    pub kind: EffectKind,
    pub origin: Vec3,
    pub remaining_lifetime_fraction: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupView {
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: PickupKind,
    pub position: Vec3,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BossView {
    pub identity: BossIdentity,
    pub tier: DifficultyTier,
    pub position: Vec3,
    pub yaw: f32,
    pub health: f32,
    pub max_health: f32,
    pub state: BossState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boss_special_event_payload_shape() {
        let event = GameEvent::BossSpecialAttack {
            kind: BossSpecialKind::FlamingClownHead,
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Some(Vec3::new(0.0, 1.5, 0.0)),
            direction: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "bossSpecialAttack");
        assert_eq!(json["type"], "flamingClownHead");
        assert!(json.get("direction").is_none());
    }

    #[test]
    fn boss_weapon_fired_event_names_match_wire_contract() {
        let event = GameEvent::BossWeaponFired {
            weapon_type: WeaponKind::FireMissile,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            target: Vec3::new(0.0, 0.0, -50.0),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "bossWeaponFired");
        assert_eq!(json["weaponType"], "fireMissile");
    }

    #[test]
    fn unknown_vehicle_identity_fails_fast() {
        assert!("warthog".parse::<VehicleIdentity>().is_err());
        assert_eq!(
            "axel".parse::<VehicleIdentity>().unwrap(),
            VehicleIdentity::Axel
        );
    }
}

//! Arena state and authoritative tick loop

use dashmap::DashMap;
use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::interval;
use tracing::{info, warn};
use uuid::Uuid;

use crate::protocol::{
    BossView, ClientIntent, EffectView, GameEvent, PickupKind, PickupView, ProjectileView,
    ServerMsg, VehicleIdentity, VehicleView, WeaponKind,
};
use crate::util::time::{
    tick_delta, unix_millis, SimClock, SIMULATION_TPS, SNAPSHOT_TPS, TICK_DURATION_MICROS,
};

use super::boss::BossAi;
use super::pickups::{Pickup, PickupManager};
use super::projectiles::{EffectManager, ProjectileManager};
use super::vehicle::Vehicle;
use super::weapons::FireAction;
use super::world::ArenaWorld;
use super::{ArenaCommand, TickInput};

/// Collision radius used when clamping vehicles against world geometry
const VEHICLE_BODY_RADIUS: f32 = 2.0;

/// Arena state (owned by the arena task)
pub struct Arena {
    pub id: Uuid,
    pub seed: u64,
    pub tick: u64,
    pub clock: SimClock,
    pub max_players: usize,

    pub vehicles: HashMap<Uuid, Vehicle>,
    pub projectiles: ProjectileManager,
    pub effects: EffectManager,
    pub pickups: PickupManager,
    pub boss: Option<BossAi>,
    pub boss_defeated: bool,

    pub world: Box<dyn ArenaWorld>,
    pub rng: ChaCha8Rng,

    pending_events: Vec<GameEvent>,
}

impl Arena {
    pub fn new(id: Uuid, seed: u64, max_players: usize, world: Box<dyn ArenaWorld>) -> Self {
        Self {
            id,
            seed,
            tick: 0,
            clock: SimClock::new(),
            max_players,
            vehicles: HashMap::new(),
            projectiles: ProjectileManager::new(),
            effects: EffectManager::new(),
            pickups: PickupManager::new(),
            boss: None,
            boss_defeated: false,
            world,
            rng: ChaCha8Rng::seed_from_u64(seed),
            pending_events: Vec::new(),
        }
    }

    /// Scatter the standard pickup layout across the arena floor
    pub fn seed_default_pickups(&mut self) {
        for _ in 0..2 {
            let p = self.world.random_spawn_point();
            self.pickups.add(Pickup::new(PickupKind::Health { full: false }, p));
        }
        let p = self.world.random_spawn_point();
        self.pickups.add(Pickup::new(PickupKind::Health { full: true }, p));
        for _ in 0..2 {
            let p = self.world.random_spawn_point();
            self.pickups.add(Pickup::new(PickupKind::Turbo, p));
        }
        for weapon in [
            WeaponKind::HomingMissile,
            WeaponKind::FireMissile,
            WeaponKind::FreezeMissile,
            WeaponKind::PowerMissile,
        ] {
            let p = self.world.random_weapon_spawn_point();
            self.pickups.add(Pickup::new(PickupKind::Weapon { weapon }, p));
        }
    }

    /// Spawn a new vehicle at a random point. Returns `None` when full.
    pub fn add_vehicle(&mut self, identity: VehicleIdentity) -> Option<Uuid> {
        if self.vehicles.len() >= self.max_players {
            return None;
        }
        let spawn = self.world.random_spawn_point();
        let vehicle = Vehicle::new(identity, spawn);
        let vehicle_id = vehicle.id;
        self.vehicles.insert(vehicle_id, vehicle);
        self.pending_events.push(GameEvent::VehicleSelected {
            vehicle_id,
            identity,
        });
        Some(vehicle_id)
    }

    pub fn remove_vehicle(&mut self, vehicle_id: &Uuid) -> Option<Vehicle> {
        self.vehicles.remove(vehicle_id)
    }

    /// Record driving input. Stale sequence numbers are dropped so a
    /// delayed packet can never rewind newer input.
    pub fn set_input(&mut self, vehicle_id: &Uuid, input: TickInput) {
        if let Some(vehicle) = self.vehicles.get_mut(vehicle_id) {
            if vehicle.alive && input.seq > vehicle.last_input_seq {
                vehicle.last_input_seq = input.seq;
                vehicle.current_input = input;
            }
        }
    }

    /// Overwrite a vehicle's transform and health from an authoritative
    /// remote report
    pub fn apply_remote_state(&mut self, vehicle_id: &Uuid, position: Vec3, yaw: f32, health: f32) {
        if let Some(vehicle) = self.vehicles.get_mut(vehicle_id) {
            vehicle.position = position;
            vehicle.yaw = yaw;
            vehicle.health = health.min(vehicle.max_health);
            if vehicle.health <= 0.0 && vehicle.alive {
                vehicle.die();
            }
        }
    }

    /// Spawn the boss, scaled to `player_count`. A no-op while a boss is
    /// alive or after one has already been defeated here.
    pub fn spawn_boss(&mut self, player_count: usize) {
        if self.boss.is_some() || self.boss_defeated {
            return;
        }
        let spawn = self.world.random_spawn_point();
        let boss = BossAi::spawn(player_count, spawn, &mut self.rng);
        self.pending_events.push(GameEvent::BossSpawned {
            identity: boss.identity,
            tier: boss.tier,
            max_health: boss.max_health,
        });
        info!(
            arena_id = %self.id,
            identity = ?boss.identity,
            tier = ?boss.tier,
            max_health = boss.max_health,
            "Boss spawned"
        );
        self.boss = Some(boss);
    }

    /// Run one simulation tick and return everything that happened.
    /// `dt` is clamped so a stalled task can never teleport the world.
    pub fn step(&mut self, dt: f32) -> Vec<GameEvent> {
        let dt = dt.min(crate::util::time::MAX_TICK_DELTA);
        self.clock.advance(dt);
        self.tick += 1;
        let now_ms = self.clock.now_ms();

        let mut events = std::mem::take(&mut self.pending_events);

        // Apply driving/firing input, then integrate each vehicle
        let mut fire_actions: Vec<(Uuid, WeaponKind, Vec3, FireAction)> = Vec::new();
        for vehicle in self.vehicles.values_mut() {
            let input = vehicle.current_input.clone();
            if input.forward {
                vehicle.move_forward(dt);
            }
            if input.backward {
                vehicle.move_backward(dt);
            }
            if input.left {
                vehicle.turn_left(dt);
            }
            if input.right {
                vehicle.turn_right(dt);
            }

            if input.fire_standard {
                if let Some(fired) = fire_with_kind(vehicle, Slot::Standard, input.target, now_ms)
                {
                    fire_actions.push(fired);
                }
            }
            if input.fire_special {
                if let Some(fired) = fire_with_kind(vehicle, Slot::Special, input.target, now_ms) {
                    fire_actions.push(fired);
                }
            }
            if input.fire_pickup {
                if let Some(fired) = fire_with_kind(vehicle, Slot::Pickup, input.target, now_ms) {
                    fire_actions.push(fired);
                }
            }

            let before = vehicle.position;
            vehicle.update(dt, now_ms);
            if self.world.is_collision(vehicle.position, VEHICLE_BODY_RADIUS) {
                vehicle.position = before;
                vehicle.stop();
            }
        }

        for (vehicle_id, weapon_type, target, action) in fire_actions {
            events.push(GameEvent::FireWeapon {
                vehicle_id,
                weapon_type,
                target,
            });
            match action {
                FireAction::Projectile(p) => self.projectiles.spawn(p),
                FireAction::Effect(e) => self.effects.spawn(e),
            }
        }

        // Projectile flight and collisions
        let (vehicle_hits, boss_hits) = self.projectiles.update(
            dt,
            now_ms,
            &mut self.vehicles,
            self.boss.as_mut(),
            self.world.as_oracle(),
        );
        for hit in vehicle_hits {
            events.push(GameEvent::Hit {
                shooter_id: hit.shooter_id,
                target_id: hit.target_id,
                damage: hit.damage,
                position: hit.position,
            });
            if hit.target_killed {
                events.push(GameEvent::Kill {
                    killer_id: Some(hit.shooter_id),
                    victim_id: hit.target_id,
                });
            }
        }
        let mut boss_died = false;
        for hit in boss_hits {
            events.push(GameEvent::BossDamaged {
                attacker_id: hit.attacker_id,
                damage: hit.damage,
            });
            boss_died |= hit.boss_died;
        }
        if boss_died {
            if let Some(mut boss) = self.boss.take() {
                boss.destroy();
                info!(arena_id = %self.id, identity = ?boss.identity, "Boss defeated");
            }
            self.boss_defeated = true;
            events.push(GameEvent::BossDefeated);
        }

        // Area effects
        for hit in self.effects.update(now_ms, &mut self.vehicles) {
            events.push(GameEvent::Hit {
                shooter_id: hit.shooter_id,
                target_id: hit.target_id,
                damage: hit.damage,
                position: hit.position,
            });
            if hit.target_killed {
                events.push(GameEvent::Kill {
                    killer_id: Some(hit.shooter_id),
                    victim_id: hit.target_id,
                });
            }
        }

        // Pickups
        events.extend(self.pickups.update(now_ms, &mut self.vehicles));

        // Boss AI runs last so its new projectiles fly on the next tick
        if let Some(boss) = self.boss.as_mut() {
            let out = boss.update(dt, now_ms, &self.vehicles, self.world.as_oracle());
            for p in out.projectiles {
                self.projectiles.spawn(p);
            }
            for e in out.effects {
                self.effects.spawn(e);
            }
            events.extend(out.events);
        }

        events
    }

    /// Build a read-only snapshot of the current state
    pub fn snapshot(&self, events: Vec<GameEvent>) -> ServerMsg {
        let now_ms = self.clock.now_ms();
        ServerMsg::Snapshot {
            tick: self.tick,
            vehicles: self
                .vehicles
                .values()
                .map(|v| VehicleView {
                    id: v.id,
                    identity: v.identity,
                    position: v.position,
                    yaw: v.yaw,
                    velocity: v.velocity,
                    health: v.health,
                    alive: v.alive,
                    stunned: v.is_stunned(),
                    frozen: v.is_frozen(),
                    last_input_seq: v.last_input_seq,
                })
                .collect(),
            projectiles: self
                .projectiles
                .iter()
                .map(|p| ProjectileView {
                    id: p.id,
                    position: p.position,
                })
                .collect(),
            effects: self
                .effects
                .iter()
                .map(|e| EffectView {
                    id: e.id,
                    kind: e.kind,
                    origin: e.origin,
                    remaining_lifetime_fraction: e.remaining_lifetime_fraction(now_ms),
                })
                .collect(),
            pickups: self
                .pickups
                .iter()
                .map(|p| PickupView {
                    id: p.id,
                    kind: p.kind,
                    position: p.position,
                    is_active: p.is_active,
                })
                .collect(),
            boss: self.boss.as_ref().map(|b| BossView {
                identity: b.identity,
                tier: b.tier,
                position: b.position,
                yaw: b.yaw,
                health: b.health,
                max_health: b.max_health,
                state: b.state,
            }),
            events,
        }
    }
}

#[derive(Clone, Copy)]
enum Slot {
    Standard,
    Special,
    Pickup,
}

/// Fire one slot and report which weapon kind produced the action. The
/// kind is read before firing because a pickup slot empties on success.
fn fire_with_kind(
    vehicle: &mut Vehicle,
    slot: Slot,
    target: Vec3,
    now_ms: f64,
) -> Option<(Uuid, WeaponKind, Vec3, FireAction)> {
    let kind = match slot {
        Slot::Standard => vehicle.standard_weapon.as_ref(),
        Slot::Special => vehicle.special_weapon.as_ref(),
        Slot::Pickup => vehicle.pickup_weapon.as_ref(),
    }?
    .kind;
    let action = match slot {
        Slot::Standard => vehicle.fire_standard_weapon(target, now_ms),
        Slot::Special => vehicle.fire_special_weapon(target, now_ms),
        Slot::Pickup => vehicle.fire_pickup_weapon(target, now_ms),
    }?;
    Some((vehicle.id, kind, target, action))
}

/// Snapshot cadence: the simulation ticks faster than snapshots publish
struct SnapshotCadence {
    interval: u32,
    since_last: u32,
    force: bool,
}

impl SnapshotCadence {
    fn new(interval: u32) -> Self {
        Self {
            interval,
            since_last: 0,
            force: false,
        }
    }

    fn should_send(&mut self) -> bool {
        self.since_last += 1;
        if self.force || self.since_last >= self.interval {
            self.since_last = 0;
            self.force = false;
            true
        } else {
            false
        }
    }

    fn force_next(&mut self) {
        self.force = true;
    }
}

/// Handle to a running arena
#[derive(Clone)]
pub struct ArenaHandle {
    pub id: Uuid,
    pub input_tx: mpsc::Sender<ArenaCommand>,
    pub snapshot_tx: broadcast::Sender<ServerMsg>,
    pub player_count: Arc<std::sync::atomic::AtomicUsize>,
}

impl ArenaHandle {
    pub fn player_count(&self) -> usize {
        self.player_count.load(std::sync::atomic::Ordering::Relaxed)
    }
}

/// Registry of all active arenas
pub struct ArenaRegistry {
    arenas: DashMap<Uuid, ArenaHandle>,
}

impl ArenaRegistry {
    pub fn new() -> Self {
        Self {
            arenas: DashMap::new(),
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<ArenaHandle> {
        self.arenas.get(id).map(|a| a.value().clone())
    }

    pub fn insert(&self, handle: ArenaHandle) {
        self.arenas.insert(handle.id, handle);
    }

    pub fn remove(&self, id: &Uuid) -> Option<ArenaHandle> {
        self.arenas.remove(id).map(|(_, h)| h)
    }

    pub fn active_arenas(&self) -> usize {
        self.arenas.len()
    }

    pub fn total_players(&self) -> usize {
        self.arenas.iter().map(|a| a.value().player_count()).sum()
    }

    /// Find an arena with available slots
    pub fn find_available_arena(&self, max_players: usize) -> Option<ArenaHandle> {
        for entry in self.arenas.iter() {
            if entry.value().player_count() < max_players {
                return Some(entry.value().clone());
            }
        }
        None
    }
}

impl Default for ArenaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The authoritative arena task: drains commands, steps the simulation,
/// and publishes snapshots at the configured cadence
pub struct ArenaRunner {
    arena: Arena,
    input_rx: mpsc::Receiver<ArenaCommand>,
    snapshot_tx: broadcast::Sender<ServerMsg>,
    cadence: SnapshotCadence,
    player_count: Arc<std::sync::atomic::AtomicUsize>,
    boss_player_count: usize,
    /// user id -> vehicle id
    drivers: HashMap<Uuid, Uuid>,
    /// Once anyone has joined, an empty arena shuts down
    had_players: bool,
    event_buffer: Vec<GameEvent>,
}

impl ArenaRunner {
    pub fn new(
        id: Uuid,
        seed: u64,
        max_players: usize,
        boss_player_count: usize,
        world: Box<dyn ArenaWorld>,
    ) -> (Self, ArenaHandle) {
        let (input_tx, input_rx) = mpsc::channel(256);
        let (snapshot_tx, _) = broadcast::channel(64);
        let player_count = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let handle = ArenaHandle {
            id,
            input_tx,
            snapshot_tx: snapshot_tx.clone(),
            player_count: player_count.clone(),
        };

        let mut arena = Arena::new(id, seed, max_players, world);
        arena.seed_default_pickups();

        let runner = Self {
            arena,
            input_rx,
            snapshot_tx,
            cadence: SnapshotCadence::new(SIMULATION_TPS / SNAPSHOT_TPS),
            player_count,
            boss_player_count,
            drivers: HashMap::new(),
            had_players: false,
            event_buffer: Vec::new(),
        };

        (runner, handle)
    }

    /// Run the authoritative tick loop
    pub async fn run(mut self) {
        info!(arena_id = %self.arena.id, seed = self.arena.seed, "Arena started");

        let tick_duration = Duration::from_micros(TICK_DURATION_MICROS);
        let mut tick_interval = interval(tick_duration);
        tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;

            self.process_commands();

            let events = self.arena.step(tick_delta());
            self.event_buffer.extend(events);

            if self.arena.boss_defeated {
                self.cadence.force_next();
            }

            if self.cadence.should_send() {
                let events = std::mem::take(&mut self.event_buffer);
                let _ = self.snapshot_tx.send(self.arena.snapshot(events));
            }

            if self.arena.boss_defeated {
                info!(arena_id = %self.arena.id, "Boss defeated, ending arena");
                break;
            }

            if self.had_players && self.arena.vehicles.is_empty() {
                info!(arena_id = %self.arena.id, "All players left, ending arena");
                break;
            }
        }

        let _ = self.snapshot_tx.send(ServerMsg::ArenaEnded {
            boss_defeated: self.arena.boss_defeated,
        });
    }

    /// Drain all pending commands from connected collaborators
    fn process_commands(&mut self) {
        while let Ok(command) = self.input_rx.try_recv() {
            match command.intent {
                ClientIntent::JoinArena { identity, .. } => {
                    self.handle_join(command.user_id, identity);
                }
                ClientIntent::DriveTick {
                    seq,
                    forward,
                    backward,
                    left,
                    right,
                    fire_standard,
                    fire_special,
                    fire_pickup,
                    target,
                } => {
                    if let Some(vehicle_id) = self.drivers.get(&command.user_id).copied() {
                        self.arena.set_input(
                            &vehicle_id,
                            TickInput {
                                seq,
                                forward,
                                backward,
                                left,
                                right,
                                fire_standard,
                                fire_special,
                                fire_pickup,
                                target,
                            },
                        );
                    }
                }
                ClientIntent::RemoteState {
                    vehicle_id,
                    position,
                    yaw,
                    health,
                } => {
                    self.arena
                        .apply_remote_state(&vehicle_id, position, yaw, health);
                }
                ClientIntent::Ping { t } => {
                    let _ = self.snapshot_tx.send(ServerMsg::Pong { t });
                }
                ClientIntent::LeaveArena => {
                    self.handle_leave(command.user_id);
                }
            }
        }
    }

    fn handle_join(&mut self, user_id: Uuid, identity: VehicleIdentity) {
        if self.drivers.contains_key(&user_id) {
            warn!(user_id = %user_id, "Player already in arena");
            return;
        }

        let Some(vehicle_id) = self.arena.add_vehicle(identity) else {
            let _ = self.snapshot_tx.send(ServerMsg::Error {
                code: "arena_full".to_string(),
                message: "Arena is full".to_string(),
            });
            return;
        };

        self.drivers.insert(user_id, vehicle_id);
        self.had_players = true;
        self.player_count
            .store(self.drivers.len(), std::sync::atomic::Ordering::Relaxed);

        let _ = self.snapshot_tx.send(ServerMsg::Welcome {
            user_id,
            server_time: unix_millis(),
        });
        let _ = self.snapshot_tx.send(ServerMsg::ArenaJoined {
            arena_id: self.arena.id,
            seed: self.arena.seed,
            vehicle_id,
        });

        info!(
            arena_id = %self.arena.id,
            user_id = %user_id,
            vehicle_id = %vehicle_id,
            identity = ?identity,
            player_count = self.drivers.len(),
            "Player joined arena"
        );

        self.arena.spawn_boss(self.boss_player_count);
    }

    fn handle_leave(&mut self, user_id: Uuid) {
        if let Some(vehicle_id) = self.drivers.remove(&user_id) {
            self.arena.remove_vehicle(&vehicle_id);
            self.player_count
                .store(self.drivers.len(), std::sync::atomic::Ordering::Relaxed);
            info!(
                arena_id = %self.arena.id,
                user_id = %user_id,
                "Player left arena"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::projectiles::Projectile;
    use super::super::world::BoundedWorld;
    use super::*;
    use crate::protocol::BossIdentity;
    use crate::util::time::MAX_TICK_DELTA;

    fn test_arena(max_players: usize) -> Arena {
        let world = BoundedWorld::new(200.0, ChaCha8Rng::seed_from_u64(9));
        Arena::new(Uuid::new_v4(), 9, max_players, Box::new(world))
    }

    fn raw_projectile(position: Vec3, damage: f32) -> Projectile {
        Projectile {
            id: Uuid::new_v4(),
            owner: Uuid::new_v4(),
            position,
            direction: Vec3::new(0.0, 0.0, -1.0),
            speed: 10.0,
            damage,
            traveled: 0.0,
            homing_strength: 0.0,
            is_ghost: false,
            stun_ms: 0.0,
            freeze_ms: 0.0,
        }
    }

    #[test]
    fn step_clamps_oversized_deltas() {
        let mut arena = test_arena(4);
        arena.step(5.0);
        assert!((arena.clock.now_ms() - MAX_TICK_DELTA as f64 * 1000.0).abs() < 1e-6);
    }

    #[test]
    fn arena_rejects_joins_when_full() {
        let mut arena = test_arena(1);
        assert!(arena.add_vehicle(VehicleIdentity::Axel).is_some());
        assert!(arena.add_vehicle(VehicleIdentity::Outlaw).is_none());
    }

    #[test]
    fn stale_input_sequences_are_dropped() {
        let mut arena = test_arena(4);
        let id = arena.add_vehicle(VehicleIdentity::Spectre).unwrap();

        arena.set_input(
            &id,
            TickInput {
                seq: 5,
                forward: true,
                ..TickInput::default()
            },
        );
        arena.set_input(
            &id,
            TickInput {
                seq: 3,
                backward: true,
                ..TickInput::default()
            },
        );

        let vehicle = &arena.vehicles[&id];
        assert_eq!(vehicle.last_input_seq, 5);
        assert!(vehicle.current_input.forward);
        assert!(!vehicle.current_input.backward);
    }

    #[test]
    fn firing_input_spawns_a_projectile_and_event() {
        let mut arena = test_arena(4);
        let id = arena.add_vehicle(VehicleIdentity::Outlaw).unwrap();
        let target = arena.vehicles[&id].position + Vec3::new(0.0, 0.0, -50.0);
        arena.set_input(
            &id,
            TickInput {
                seq: 1,
                fire_standard: true,
                target,
                ..TickInput::default()
            },
        );

        let events = arena.step(tick_delta());
        assert_eq!(arena.projectiles.len(), 1);
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::FireWeapon {
                weapon_type: WeaponKind::RapidFireMachineGun,
                ..
            }
        )));
    }

    #[test]
    fn lethal_projectile_produces_hit_and_kill_events() {
        let mut arena = test_arena(4);
        let id = arena.add_vehicle(VehicleIdentity::Spectre).unwrap();
        arena.vehicles.get_mut(&id).unwrap().position = Vec3::ZERO;

        arena
            .projectiles
            .spawn(raw_projectile(Vec3::new(0.0, 0.0, 1.0), 999.0));

        let events = arena.step(tick_delta());
        assert!(!arena.vehicles[&id].alive);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::Hit { target_id, .. } if *target_id == id)));
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::Kill { victim_id, .. } if *victim_id == id)));
    }

    #[test]
    fn boss_spawn_is_announced_and_scaled() {
        let mut arena = test_arena(4);
        arena.spawn_boss(20);
        let events = arena.step(tick_delta());

        // 100 * 2.5 * (1 + 20*0.1) = 750
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::BossSpawned { max_health, .. } if (*max_health - 750.0).abs() < 1e-3
        )));

        // A second boss never spawns while one is alive
        arena.spawn_boss(20);
        let events = arena.step(tick_delta());
        assert!(!events
            .iter()
            .any(|e| matches!(e, GameEvent::BossSpawned { .. })));
    }

    #[test]
    fn boss_death_ends_with_defeated_event() {
        let mut arena = test_arena(4);
        arena.spawn_boss(1);
        arena.boss.as_mut().unwrap().position = Vec3::new(100.0, 0.0, 100.0);

        arena
            .projectiles
            .spawn(raw_projectile(Vec3::new(100.0, 0.0, 101.0), 9999.0));

        let events = arena.step(tick_delta());
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::BossDamaged { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::BossDefeated)));
        assert!(arena.boss.is_none());
        assert!(arena.boss_defeated);

        // Once defeated, the boss does not respawn
        arena.spawn_boss(1);
        assert!(arena.boss.is_none());
    }

    #[test]
    fn pickup_collection_is_reported_in_events() {
        let mut arena = test_arena(4);
        let id = arena.add_vehicle(VehicleIdentity::Axel).unwrap();
        let position = arena.vehicles[&id].position;
        arena.pickups.add(Pickup::new(PickupKind::Turbo, position));

        let events = arena.step(tick_delta());
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::PickupCollected { vehicle_id, .. } if *vehicle_id == id
        )));
    }

    #[test]
    fn snapshot_carries_the_full_world_view() {
        let mut arena = test_arena(4);
        arena.add_vehicle(VehicleIdentity::ClubKid);
        arena.spawn_boss(3);
        let events = arena.step(tick_delta());

        let msg = arena.snapshot(events);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "snapshot");
        assert_eq!(json["vehicles"].as_array().unwrap().len(), 1);
        assert!(json["boss"].is_object());
        assert_eq!(json["tick"], 1);
    }

    #[tokio::test]
    async fn runner_confirms_joins_and_publishes_snapshots() {
        let world = BoundedWorld::new(200.0, ChaCha8Rng::seed_from_u64(4));
        let (runner, handle) = ArenaRunner::new(Uuid::new_v4(), 4, 8, 3, Box::new(world));
        let mut rx = handle.snapshot_tx.subscribe();
        tokio::spawn(runner.run());

        handle
            .input_tx
            .send(ArenaCommand {
                user_id: Uuid::new_v4(),
                intent: ClientIntent::JoinArena {
                    arena_id: None,
                    identity: VehicleIdentity::Hammerhead,
                },
                received_at: 0,
            })
            .await
            .unwrap();

        let mut welcomed = false;
        let mut joined = false;
        let mut snapshotted = false;
        for _ in 0..16 {
            let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("arena went silent")
                .unwrap();
            match msg {
                ServerMsg::Welcome { .. } => welcomed = true,
                ServerMsg::ArenaJoined { .. } => joined = true,
                ServerMsg::Snapshot { .. } => snapshotted = true,
                _ => {}
            }
            if welcomed && joined && snapshotted {
                break;
            }
        }
        assert!(welcomed && joined && snapshotted);
    }

    #[test]
    fn registry_tracks_handles_and_capacity() {
        let world = BoundedWorld::new(200.0, ChaCha8Rng::seed_from_u64(5));
        let (_runner, handle) = ArenaRunner::new(Uuid::new_v4(), 5, 8, 3, Box::new(world));
        handle
            .player_count
            .store(8, std::sync::atomic::Ordering::Relaxed);

        let registry = ArenaRegistry::new();
        registry.insert(handle.clone());
        assert_eq!(registry.active_arenas(), 1);
        assert_eq!(registry.total_players(), 8);
        assert!(registry.get(&handle.id).is_some());

        // Full arena is not offered to new players
        assert!(registry.find_available_arena(8).is_none());
        handle
            .player_count
            .store(3, std::sync::atomic::Ordering::Relaxed);
        assert_eq!(registry.find_available_arena(8).unwrap().id, handle.id);

        registry.remove(&handle.id);
        assert_eq!(registry.active_arenas(), 0);
        assert!(registry.get(&handle.id).is_none());
    }

    #[test]
    fn boss_identities_cover_every_tier() {
        // Sanity check the spawn table used by the arena
        for (count, identity) in [
            (1, BossIdentity::SweetTooth),
            (6, BossIdentity::Darkside),
            (11, BossIdentity::Minion),
            (16, BossIdentity::Calypso),
            (21, BossIdentity::TwistedMetal),
        ] {
            let mut arena = test_arena(24);
            arena.spawn_boss(count);
            assert_eq!(arena.boss.as_ref().unwrap().identity, identity);
        }
    }
}

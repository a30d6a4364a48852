//! Car Combat Server - Authoritative vehicle combat simulation
//!
//! This is the main entry point for the server. It runs a demo arena
//! with bot-driven vehicles, a difficulty-scaled boss, and a snapshot
//! stream that a presentation layer can subscribe to.

mod config;
mod game;
mod protocol;
mod util;

use std::sync::Arc;
use std::time::Duration;

use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::config::Config;
use crate::game::world::BoundedWorld;
use crate::game::{ArenaCommand, ArenaHandle, ArenaRegistry, ArenaRunner};
use crate::protocol::{ClientIntent, GameEvent, ServerMsg, VehicleIdentity};
use crate::util::time::{init_server_time, unix_millis, uptime_secs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    // Initialize server time tracking
    init_server_time();

    info!("Starting Car Combat Server");

    let registry = Arc::new(ArenaRegistry::new());

    let seed = config.arena_seed.unwrap_or_else(rand::random);
    let world = BoundedWorld::new(config.arena_half_extent, ChaCha8Rng::seed_from_u64(seed));
    let (runner, handle) = ArenaRunner::new(
        Uuid::new_v4(),
        seed,
        config.max_players,
        config.boss_player_count,
        Box::new(world),
    );
    registry.insert(handle.clone());

    info!(
        arena_id = %handle.id,
        seed,
        half_extent = config.arena_half_extent,
        active_arenas = registry.active_arenas(),
        "Demo arena created"
    );

    tokio::spawn(runner.run());

    // Bot drivers keep the demo arena alive and feed the boss targets
    for (index, name) in config.bot_vehicles.iter().enumerate() {
        let identity: VehicleIdentity = name.parse()?;
        tokio::spawn(drive_bot(handle.clone(), identity, index));
    }

    let logger = tokio::spawn(log_arena_stream(handle.clone()));

    tokio::select! {
        _ = shutdown_signal() => {}
        _ = logger => {
            info!("Arena stream closed");
        }
    }

    registry.remove(&handle.id);
    info!(uptime_secs = uptime_secs(), "Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// A simple scripted driver: joins, then circles the arena while firing
/// toward the center
async fn drive_bot(handle: ArenaHandle, identity: VehicleIdentity, index: usize) {
    let user_id = Uuid::new_v4();
    let join = ArenaCommand {
        user_id,
        intent: ClientIntent::JoinArena {
            arena_id: Some(handle.id),
            identity,
        },
        received_at: unix_millis(),
    };
    if handle.input_tx.send(join).await.is_err() {
        return;
    }

    let mut seq: u32 = 0;
    let mut ticker = tokio::time::interval(Duration::from_millis(100));
    loop {
        ticker.tick().await;
        seq += 1;

        // Stagger the steering per bot so they do not pile up
        let turning = (seq as usize + index * 17) % 40 < 10;
        let command = ArenaCommand {
            user_id,
            intent: ClientIntent::DriveTick {
                seq,
                forward: true,
                backward: false,
                left: turning,
                right: false,
                fire_standard: seq % 5 == 0,
                fire_special: seq % 60 == 0,
                fire_pickup: seq % 30 == 0,
                target: Vec3::ZERO,
            },
            received_at: unix_millis(),
        };
        if handle.input_tx.send(command).await.is_err() {
            break;
        }
    }
}

/// Subscribe to the arena's snapshot stream and log notable events
async fn log_arena_stream(handle: ArenaHandle) {
    let mut rx = handle.snapshot_tx.subscribe();
    loop {
        match rx.recv().await {
            Ok(ServerMsg::Snapshot { events, .. }) => {
                for event in events {
                    log_event(&event);
                }
            }
            Ok(ServerMsg::ArenaEnded { boss_defeated }) => {
                info!(boss_defeated, "Arena ended");
                break;
            }
            Ok(_) => {}
            Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                warn!(missed, "Snapshot stream lagged");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::Kill {
            killer_id,
            victim_id,
        } => info!(?killer_id, %victim_id, "Vehicle destroyed"),
        GameEvent::BossSpawned {
            identity,
            tier,
            max_health,
        } => info!(?identity, ?tier, max_health, "Boss spawned"),
        GameEvent::BossSpecialAttack { kind, .. } => info!(?kind, "Boss special attack"),
        GameEvent::BossDefeated => info!("Boss defeated"),
        GameEvent::PickupCollected {
            vehicle_id, kind, ..
        } => info!(%vehicle_id, ?kind, "Pickup collected"),
        other => debug!(event = ?other, "Arena event"),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}

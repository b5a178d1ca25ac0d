//! Arena Referee Demo
//!
//! Loads a two-team map into an in-memory world, lets four players in and
//! runs the observation tick loop until a team has placed every objective.

use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use arena_referee::{
    tick, MatchStatus, Observation, PlayerId, RefereeConfig, RefereeContext, Vec3, WorldId,
    TICK_RATE, VERSION,
    config::{MatchStore, MemoryStore, WorldDocument},
    game::{objective::BlockSignature, player::PlayerSession, world::SimulatedWorld},
};

const DEMO_MAP: &str = r#"
map:
  name: Demo Monuments
match:
  teams:
    - name: Red
      color: RED
      spawn: "-20,64,0"
      win-condition: ["-10,64,0:wool,14"]
      regions: ["-40,0,-20:0,128,20"]
    - name: Blue
      color: BLUE
      spawn: "20,64,0"
      win-condition: ["10,64,0:wool,11"]
      regions: ["0,0,-20:40,128,20"]
  start-region: "-5,60,-5:5,70,5"
  start-time: "14:00"
"#;

/// Give up if nothing wins by then.
const MAX_TICKS: u64 = 600;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Arena Referee v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let config = RefereeConfig::from_env();
    let mut ctx = RefereeContext::new(config);
    let world_id = WorldId::new([1; 16]);

    let mut store = MemoryStore::new();
    store.insert(world_id, WorldDocument::parse(DEMO_MAP)?);
    ctx.load_world(world_id, &store)?
        .context("demo world has no referee document")?;

    demo_match(&mut ctx, world_id).await?;

    if ctx.save_world(world_id, &mut store) {
        info!("Saved {} world document(s)", store.save_count());
    }
    let snapshot = store.load(world_id)?;
    info!("Layout hash: {}", hex::encode(snapshot.layout_hash()));

    ctx.destroy_world(world_id);
    Ok(())
}

/// Script a short match against the simulated world.
async fn demo_match(ctx: &mut RefereeContext, world_id: WorldId) -> Result<()> {
    info!("=== Starting Demo Match ===");
    let mut world = SimulatedWorld::new(Vec3::new(0.0, 64.0, 0.0));

    let players: Vec<PlayerId> = (1..=4).map(|i| PlayerId::new([i; 16])).collect();
    for (i, id) in players.iter().enumerate() {
        let session = PlayerSession::new(*id, &format!("player{}", i + 1));
        ctx.player_entered(&session, world_id, Vec3::new(0.0, 64.0, 0.0));
    }

    let m = ctx.get_mut(world_id).context("demo world not loaded")?;
    for id in &players {
        m.auto_assign(&mut world, *id)?;
    }
    let team_ids: Vec<_> = m.teams().map(|t| t.id()).collect();
    for id in &team_ids {
        m.set_team_ready(*id, true)?;
    }
    m.start_command()?;

    // The first team's first member carries then places its objective
    let (runner, goal) = {
        let team = m.teams().next().context("demo map has no teams")?;
        let runner = *team.members().iter().next().context("first team is empty")?;
        let goal = team.win_conditions().first().cloned().context("first team has no objective")?;
        info!("{} runs {} to {}", team.display_name(), goal.signature, goal.location);
        (runner, goal)
    };

    let mut interval = tokio::time::interval(Duration::from_millis(1000 / TICK_RATE as u64));
    let mut play_ticks = 0u64;

    for _ in 0..MAX_TICKS {
        interval.tick().await;

        let mut observations = Vec::new();
        if m.status() == MatchStatus::Playing {
            play_ticks += 1;
            match play_ticks {
                20 => {
                    let carrying: BTreeSet<BlockSignature> = [goal.signature.clone()].into();
                    world.set_inventory(runner, carrying.clone());
                    observations.push(Observation::InventoryChanged { player: runner, carrying });
                }
                40 => {
                    let to = goal.location.offset(0, 1, 1).center();
                    observations.push(Observation::PlayerMoved { player: runner, to });
                }
                60 => {
                    world.set_inventory(runner, BTreeSet::new());
                    world.set_block(goal.location, Some(goal.signature.clone()));
                    observations.push(Observation::InventoryChanged { player: runner, carrying: BTreeSet::new() });
                    observations.push(Observation::BlockChanged { pos: goal.location });
                }
                _ => {}
            }
        }

        let result = tick(m, &mut world, &observations);
        if result.started {
            info!("Play started at tick {}", result.tick);
        }
        for player in &result.zone_violations {
            info!("Player {} sent back into bounds", hex::encode(&player.0[..4]));
        }

        let winner = m
            .teams()
            .find(|t| !t.objectives().is_empty() && t.tracker().placed_count() == t.objectives().len())
            .map(|t| t.id());
        if let Some(winner) = winner {
            m.finish(Some(winner))?;
            info!("Match ended at tick {}", result.tick);
            break;
        }
    }

    if m.status() != MatchStatus::Finished {
        bail!("demo match did not finish within {} ticks", MAX_TICKS);
    }

    info!("=== Match Results ===");
    for team in m.teams() {
        let summary: Vec<String> = team
            .tracker()
            .statuses()
            .iter()
            .map(|(sig, status)| format!("{}={}", sig, status))
            .collect();
        info!("{} [{}]: {}", team.display_name(), team.color(), summary.join(" "));
    }
    info!("Winner: {}", m.winner().and_then(|id| m.team(id)).map_or("none", |t| t.display_name()));
    if let Some(last) = m.last_objective_location() {
        info!("Last objective change at {}", last.block());
    }
    Ok(())
}

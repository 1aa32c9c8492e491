//! courtyard — smallest runnable world for the landblock navigation crates.
//!
//! Three guards patrol a walled courtyard, a runner crosses it to the outer
//! yard through a closed gate and a hound follows the runner.  A raider waits
//! in the outer yard; fights last `COMBAT_SECS` and the raider always loses.
//!
//! ```text
//! courtyard [SECONDS] [STORE_DIR]
//! ```
//!
//! With `STORE_DIR` the built surface is persisted there and reused by the
//! next run.  Set `RUST_LOG=debug` to watch individual decisions.

mod layout;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use tracing::info;

use nav_agent::{Decision, Finish};
use nav_cache::{FileSurfaceStore, StaticGeometry, SurfaceService, SurfaceStatus};
use nav_core::{ObjectId, SimRng, SimTime};
use nav_sim::{NavObserver, NavSimBuilder, SimWorld};
use nav_surface::TriSurfaceEngine;

use layout::{GATE, REGION, at, build_courtyard};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:          u64 = 42;
const DEFAULT_SECS:  f64 = 120.0;
const COMBAT_SECS:   f64 = 3.0;
const PATROL_RADIUS: f32 = 12.0;
const GUARD_COUNT:   usize = 3;

const GUARDS:  u16 = 1;
const RAIDERS: u16 = 2;

// ── Observer ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Tally {
    moves:    usize,
    alerts:   usize,
    doors:    usize,
    renewals: usize,
    reached:  usize,
    no_route: usize,
    /// (agent, hostile, since) for fights still running.
    fights:   Vec<(ObjectId, ObjectId, SimTime)>,
    steps:    usize,
}

impl NavObserver for Tally {
    fn on_decision(&mut self, now: SimTime, agent: ObjectId, decision: &Decision) {
        match *decision {
            Decision::Moved { .. } => self.moves += 1,
            Decision::DoorOpened(_) => self.doors += 1,
            Decision::NoRoute => self.no_route += 1,
            Decision::Engaged(hostile) => self.fights.push((agent, hostile, now)),
            Decision::Finished(Finish::PatrolRenewed) => self.renewals += 1,
            Decision::Finished(_) => self.reached += 1,
            _ => {}
        }
    }

    fn on_step_end(&mut self, _now: SimTime, _ticked: usize) {
        self.steps += 1;
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let secs = match args.get(1) {
        Some(s) => s.parse::<f64>().with_context(|| format!("invalid duration {s:?}"))?,
        None => DEFAULT_SECS,
    };
    if !(secs.is_finite() && secs > 0.0) {
        bail!("duration must be positive, got {secs}");
    }

    println!("=== courtyard — landblock navigation ===");
    println!("Region: {REGION}  |  Seconds: {secs}  |  Seed: {SEED}");
    println!();

    // 1. Surface service.
    let geometry = StaticGeometry::new().with(REGION, build_courtyard()?);
    let mut builder = SurfaceService::builder(TriSurfaceEngine, Arc::new(geometry));
    if let Some(dir) = args.get(2) {
        let store = FileSurfaceStore::open(dir).with_context(|| format!("opening store {dir}"))?;
        println!("Surface store: {}", store.path_for(REGION).display());
        builder = builder.store(Arc::new(store));
    }
    let service = builder.build()?;

    let t0 = Instant::now();
    service.prefetch(REGION);
    let status = service.wait_settled(REGION, Duration::from_secs(10));
    if status != SurfaceStatus::Ready {
        bail!("courtyard surface is {status:?}");
    }
    let stats = service.stats();
    println!(
        "Surface ready in {:.3} s ({} built, {} loaded)",
        t0.elapsed().as_secs_f64(),
        stats.builds,
        stats.loads
    );

    // 2. World.
    let mut rng = SimRng::new(SEED);
    let mut world = SimWorld::new();
    let guards = world.scatter_creatures("guard", GUARD_COUNT, at(20.0, 20.0), 12.0, GUARDS, &mut rng);
    let runner = world.spawn_creature("runner", at(5.0, 20.0), GUARDS);
    let hound = world.spawn_creature("hound", at(3.0, 17.0), GUARDS);
    world.spawn_door("gate", at(GATE.0, GATE.1), false);
    world.spawn_creature("raider", at(57.0, 27.0), RAIDERS);
    world.spawn("well", at(20.0, 20.0), nav_sim::ObjectKind::Prop);

    // 3. Sim.
    let mut sim = NavSimBuilder::new(world, service).seed(SEED).build()?;
    for guard in guards {
        let slot = sim.add_navigator(guard)?;
        sim.patrol(slot, PATROL_RADIUS)?;
    }
    let runner_slot = sim.add_navigator(runner)?;
    sim.nav_to_position(runner_slot, at(56.0, 24.0))?;
    let hound_slot = sim.add_navigator(hound)?;
    sim.nav_to_object(hound_slot, runner)?;

    // 4. Run, resolving fights as they age out.
    let mut tally = Tally::default();
    let end = sim.now() + secs;
    let t0 = Instant::now();
    while sim.now() < end {
        sim.step(&mut tally);
        tally.alerts += sim.world.take_alerts().len();

        let now = sim.now();
        let (over, ongoing): (Vec<_>, Vec<_>) = std::mem::take(&mut tally.fights)
            .into_iter()
            .partition(|&(_, _, since)| now.since(since) >= COMBAT_SECS);
        tally.fights = ongoing;
        for (agent, hostile, _) in over {
            sim.world.kill(hostile);
            if let Some(slot) = sim.slot_of(agent) {
                sim.leave_combat(slot)?;
            }
            info!(%agent, %hostile, "fight resolved");
        }
    }
    tally.on_run_end(sim.now());
    let elapsed = t0.elapsed();

    // 5. Summary.
    println!("Simulated {:.1} s in {} steps ({:.3} s wall)", sim.now().secs(), tally.steps, elapsed.as_secs_f64());
    println!(
        "  moves {}  doors {}  alerts {}  patrol renewals {}  finishes {}  no-route {}",
        tally.moves, tally.doors, tally.alerts, tally.renewals, tally.reached, tally.no_route
    );
    println!("  surface stats: {:?}", sim.queries.stats());
    println!();

    println!("{:<10} {:<14} {:<11} {:>7} {:>7}", "Agent", "Intent", "Status", "x", "y");
    println!("{}", "-".repeat(53));
    for nav in sim.navigators() {
        let Some(obj) = sim.world.object(nav.id()) else {
            continue;
        };
        println!(
            "{:<10} {:<14} {:<11} {:>7.1} {:>7.1}",
            obj.name,
            format!("{:?}", nav.intent()),
            format!("{:?}", nav.status()),
            obj.position.pos.x,
            obj.position.pos.y,
        );
    }

    Ok(())
}

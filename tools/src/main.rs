//! orbsim-runner: headless runner for the orbsim physics core.
//!
//! Usage:
//!   orbsim-runner --steps 1000 --dt 0.5
//!   orbsim-runner --load saves/OCESS.json --steps 100
//!   orbsim-runner --ipc-mode

use anyhow::Result;
use chrono::Utc;
use orbsim_core::command::Command;
use orbsim_core::engine::{Integrator, PhysicsEngine};
use orbsim_core::entity::Entity;
use orbsim_core::schema::MutableField;
use orbsim_core::snapshot::PhysicalSnapshot;
use orbsim_core::types::{Navmode, AYSE, HABITAT};
use std::env;
use std::fs;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Step { count: u64 },
    Command { command: Command },
    Quit,
}

/// Plain kinematics: position advances by velocity, heading by spin,
/// scaled by the time-acceleration factor in the buffer tail. Enough to
/// exercise the buffer contract; gravity lives in a real integrator.
struct KinematicIntegrator;

impl Integrator for KinematicIntegrator {
    fn step(&mut self, y: &mut [f64], n: usize, wall_dt: f64) {
        let len = y.len();
        let dt = wall_dt * y[len - 1];

        for i in 0..n {
            let vx = y[MutableField::Vx.block() * n + i];
            let vy = y[MutableField::Vy.block() * n + i];
            let spin = y[MutableField::Spin.block() * n + i];
            y[MutableField::X.block() * n + i] += vx * dt;
            y[MutableField::Y.block() * n + i] += vy * dt;
            y[MutableField::Heading.block() * n + i] += spin * dt;
        }

        // SRB burn countdown.
        if y[len - 2] > 0.0 {
            y[len - 2] = (y[len - 2] - dt).max(0.0);
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let steps = parse_arg(&args, "--steps", 100u64);
    let dt = parse_arg(&args, "--dt", 1.0f64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let loadfile = args
        .windows(2)
        .find(|w| w[0] == "--load")
        .map(|w| w[1].clone());

    let snapshot = match &loadfile {
        Some(path) => {
            log::info!("loading savefile {path}");
            serde_json::from_str(&fs::read_to_string(path)?)?
        }
        None => demo_snapshot(),
    };

    let mut engine = PhysicsEngine::new(snapshot, Box::new(KinematicIntegrator))?;

    if ipc_mode {
        run_ipc_loop(&mut engine, dt)?;
    } else {
        let started = Utc::now();
        println!("orbsim — headless runner");
        println!("  loadfile: {}", loadfile.as_deref().unwrap_or("(built-in demo)"));
        println!("  steps:    {steps}");
        println!("  dt:       {dt}");
        println!();

        engine.run_steps(steps, dt)?;
        print_summary(&engine, steps, &started.to_rfc3339());
    }

    Ok(())
}

fn run_ipc_loop(engine: &mut PhysicsEngine, dt: f64) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut buffer = String::new();
    let mut handle = stdin.lock();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{err_json}")?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => {
                writeln!(stdout, "{}", serde_json::to_string(&engine.publish())?)?;
            }
            IpcCommand::Step { count } => {
                engine.run_steps(count, dt)?;
                writeln!(stdout, "{}", serde_json::to_string(&engine.publish())?)?;
            }
            IpcCommand::Command { command } => {
                engine.enqueue(command);
                engine.apply_pending();
                writeln!(stdout, "{}", serde_json::to_string(&engine.publish())?)?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn print_summary(engine: &PhysicsEngine, steps: u64, started: &str) {
    let state = engine.state();

    println!("=== RUN SUMMARY ===");
    println!("  started:    {started}");
    println!("  steps run:  {steps}");
    println!("  sim time:   {:.1}s", state.timestamp());
    println!("  time acc:   {}x", state.time_acc());
    println!("  entities:   {}", state.len());
    println!("  craft:      {}", state.craft().unwrap_or("(none)"));
    println!("  navmode:    {}", state.navmode());
    println!();

    println!("=== ENTITIES ===");
    for entity in state.entities() {
        let landed = entity
            .landed_on()
            .map(|on| format!(" [landed on {on}]"))
            .unwrap_or_default();
        println!(
            "  {:10} pos=({:.3e}, {:.3e}) v=({:.1}, {:.1}) fuel={:.0}{landed}",
            entity.name(),
            entity.x(),
            entity.y(),
            entity.vx(),
            entity.vy(),
            entity.fuel(),
        );
    }
}

/// A small two-craft system used when no savefile is given.
fn demo_snapshot() -> PhysicalSnapshot {
    let earth = Entity {
        name: "Earth".into(),
        mass: 5.972e24,
        radius: 6.371e6,
        atmosphere_thickness: 100_000.0,
        atmosphere_scaling: 7.5,
        spin: 7.292e-5,
        ..Entity::default()
    };
    let habitat = Entity {
        name: HABITAT.into(),
        mass: 2.75e5,
        radius: 15.0,
        artificial: true,
        x: 6.771e6,
        vy: 7_672.0,
        fuel: 9_000.0,
        ..Entity::default()
    };
    let ayse = Entity {
        name: AYSE.into(),
        mass: 2.0e7,
        radius: 150.0,
        artificial: true,
        x: 7.371e6,
        vy: 7_350.0,
        fuel: 250_000.0,
        ..Entity::default()
    };

    PhysicalSnapshot {
        timestamp: 0.0,
        srb_time: -1.0,
        time_acc: 1.0,
        parachute_deployed: false,
        reference: "Earth".into(),
        target: AYSE.into(),
        navmode: Navmode::Manual,
        entities: vec![earth, habitat, ayse],
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

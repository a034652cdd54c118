//! The simulation loop — current state, pending commands, integrator
//! handoff.
//!
//! STEP ORDER (fixed, never reordered):
//!   1. Drain the pending command queue against the current state.
//!   2. Hand the numeric buffer to the integrator.
//!   3. Install the successor state built from the returned buffer.
//!
//! Observers only ever see the snapshot of a fully completed step; there
//! is no partially updated state outside this module.

use crate::command::{Command, QueuedCommand};
use crate::error::SimResult;
use crate::snapshot::PhysicalSnapshot;
use crate::state::PhysicsState;
use crate::types::{AYSE, HABITAT, SRB_BURN_SECONDS, SRB_UNLIT};
use crate::view::EntityViewMut;
use uuid::Uuid;

/// Brief overthrottle past 100% is allowed by the flight model.
const MAX_THROTTLE: f64 = 1.2;

/// The numerical integration step, supplied by the caller.
///
/// The contract: `y` keeps its length and field-block order for the
/// lifetime of a given entity set, and the two trailing slots are the
/// SRB burn timer and the time-acceleration factor. The integrator must
/// not assume anything about a block beyond "entity i's value for
/// field f".
pub trait Integrator {
    fn step(&mut self, y: &mut [f64], n: usize, wall_dt: f64);
}

pub struct PhysicsEngine {
    state:      PhysicsState,
    integrator: Box<dyn Integrator>,
    pending:    Vec<QueuedCommand>,
}

impl PhysicsEngine {
    pub fn new(initial: PhysicalSnapshot, integrator: Box<dyn Integrator>) -> SimResult<Self> {
        Ok(Self {
            state: PhysicsState::from_snapshot(initial)?,
            integrator,
            pending: Vec::new(),
        })
    }

    /// The state of the last fully completed step.
    pub fn state(&self) -> &PhysicsState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut PhysicsState {
        &mut self.state
    }

    /// Queue a command for the next step.
    pub fn enqueue(&mut self, command: Command) {
        let queued = QueuedCommand {
            command_id: Uuid::new_v4().to_string(),
            queued_at:  self.state.timestamp(),
            command,
        };
        log::debug!("queued command {}: {:?}", queued.command_id, queued.command);
        self.pending.push(queued);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Apply every pending command, in arrival order, to the current
    /// state. `step` calls this before integration; it is also exposed
    /// so a boundary loop can make command effects visible between
    /// steps.
    pub fn apply_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for queued in pending {
            self.apply(queued.command);
        }
    }

    /// Advance physics by one wall-clock interval: drain the command
    /// queue, hand the buffer to the integrator, and install the
    /// successor state. Any view into the previous state is already
    /// gone — the previous state is consumed here.
    pub fn step(&mut self, wall_dt: f64) -> SimResult<()> {
        self.apply_pending();

        let time_acc = self.state.time_acc();
        let timestamp = self.state.timestamp();
        let n = self.state.len();

        let state = std::mem::replace(&mut self.state, PhysicsState::placeholder());
        let (mut buf, snapshot) = state.into_parts();
        self.integrator.step(&mut buf, n, wall_dt);

        let mut next = PhysicsState::from_buffer(buf, snapshot)?;
        next.set_timestamp(timestamp + wall_dt * time_acc);
        self.state = next;
        Ok(())
    }

    pub fn run_steps(&mut self, n: u64, wall_dt: f64) -> SimResult<()> {
        for _ in 0..n {
            self.step(wall_dt)?;
        }
        Ok(())
    }

    /// Externalized snapshot of the last fully completed step.
    pub fn publish(&self) -> PhysicalSnapshot {
        self.state.to_snapshot()
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::SetThrottle { throttle } => self.with_craft(|mut craft| {
                craft.set_throttle(throttle.clamp(0.0, MAX_THROTTLE));
            }),
            Command::AdjustThrottle { delta } => self.with_craft(|mut craft| {
                let throttle = (craft.throttle() + delta).clamp(0.0, MAX_THROTTLE);
                craft.set_throttle(throttle);
            }),
            Command::AdjustSpin { delta } => self.with_craft(|mut craft| {
                let spin = craft.spin() + delta;
                craft.set_spin(spin);
            }),
            Command::IgniteSrb => {
                if self.state.srb_time() == SRB_UNLIT {
                    self.state.set_srb_time(SRB_BURN_SECONDS);
                    log::info!("SRB ignition, burning for {SRB_BURN_SECONDS}s");
                } else {
                    log::warn!("SRB ignition requested but boosters are not available");
                }
            }
            Command::DeployParachute { deployed } => {
                self.state.set_parachute_deployed(deployed);
            }
            Command::Undock => match self.state.entity_mut_by_name(HABITAT) {
                Ok(mut hab) => {
                    if hab.landed_on() == Some(AYSE) {
                        hab.set_landed_on_index(None);
                    } else {
                        log::warn!("undock requested but the Habitat is not docked");
                    }
                }
                Err(err) => log::warn!("undock ignored: {err}"),
            },
            Command::SetTimeAcc { factor } => {
                if factor > 0.0 {
                    self.state.set_time_acc(factor);
                } else {
                    log::warn!("ignoring non-positive time acceleration {factor}");
                }
            }
            Command::SetReference { name } => match self.state.index_of(&name) {
                Ok(_) => self.state.set_reference(&name),
                Err(err) => log::warn!("reference update ignored: {err}"),
            },
            Command::SetTarget { name } => match self.state.index_of(&name) {
                Ok(_) => self.state.set_target(&name),
                Err(err) => log::warn!("target update ignored: {err}"),
            },
            Command::SetNavmode { mode } => self.state.set_navmode(mode),
        }
    }

    /// Run a mutation against the active craft, dropping the command
    /// with a warning when no craft exists.
    fn with_craft(&mut self, f: impl FnOnce(EntityViewMut<'_>)) {
        let Some(name) = self.state.craft().map(str::to_string) else {
            log::warn!("flight command ignored: no active craft");
            return;
        };
        match self.state.entity_mut_by_name(&name) {
            Ok(view) => f(view),
            Err(err) => log::warn!("flight command ignored: {err}"),
        }
    }
}

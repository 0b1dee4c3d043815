use crate::error::{Error, Result};
use crate::input::InputSpec;
use crate::machine::{Liveness, Machine, StepError};

use boolector::{Btor, BV};
use radius2::state::StateStatus;
use radius2::{Radius, RadiusOption, State, Value};

use std::any::Any;
use std::borrow::Borrow;
use std::ops::RangeInclusive;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::thread;

const STDIN: usize = 0;
const STDOUT: usize = 1;

// symbols tried, in order, for the initial program counter
const ENTRY_SYMBOLS: [&str; 2] = ["main", "entry0"];

/// The seed of an exploration along with the bytes it reads from stdin
pub struct Seed {
    pub state: State,
    pub input: Vec<Value>,
}

/// A binary loaded into radius2, executed one instruction per step
pub struct Target {
    radius: Radius,
    path: String,
}

impl Target {
    /// Load the binary without its libraries, every import is simulated.
    /// With `trace` the engine prints every executed instruction to stdout.
    pub fn load(path: &str, trace: bool) -> Result<Self> {
        if !Path::new(path).is_file() {
            return Err(Error::Load {
                path: path.to_owned(),
                reason: "no such file".to_owned(),
            });
        }

        let options = [
            RadiusOption::SimAll(true),
            RadiusOption::LoadLibs(false),
            RadiusOption::Strict(true),
            RadiusOption::Debug(trace),
        ];

        let radius = quietly(|| Radius::new_with_options(Some(path), &options))
            .map_err(|payload| Error::Load {
                path: path.to_owned(),
                reason: panic_message(payload.as_ref()),
            })?;

        Ok(Target {
            radius,
            path: path.to_owned(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// address of `main`, or of the entrypoint for stripped binaries
    pub fn entry(&mut self) -> Result<u64> {
        for symbol in &ENTRY_SYMBOLS {
            match self.radius.get_address(symbol) {
                Ok(addr) if addr != 0 => return Ok(addr),
                _ => {}
            }
        }
        Err(Error::NoEntry(self.path.clone()))
    }

    /// Create the initial state with a fresh symbolic input on stdin,
    /// every byte constrained to `spec.charset`
    pub fn seed(&mut self, spec: &InputSpec) -> Result<Seed> {
        let entry = self.entry()?;
        let mut state = self.radius.call_state(entry);

        let bv = state.bv(&spec.name, spec.bits());
        let mut input = Vec::with_capacity(spec.length);
        for i in 0..spec.length as u32 {
            let byte = bv.slice(8 * i + 7, 8 * i);
            state.solver.assert_bv(&within(&byte, &spec.charset));
            input.push(Value::Symbolic(byte, 0));
        }

        state.filesystem.fill(STDIN, &input);
        Ok(Seed { state, input })
    }

    /// Concretize the input bytes under the constraints of `state`.
    /// Each byte is fixed before the next is evaluated so the result
    /// comes from a single model.
    pub fn solve(state: &mut State, input: &[Value]) -> Result<Vec<u8>> {
        input
            .iter()
            .map(|byte| {
                state
                    .solver
                    .evalcon_to_u64(byte)
                    .map(|b| b as u8)
                    .ok_or_else(|| Error::Solve("path constraints are unsatisfiable".to_owned()))
            })
            .collect()
    }

    /// states that have executed the least at their current pc go first
    pub fn coverage(state: &State) -> i64 {
        -(state.get_visit() as i64)
    }

    pub fn close(mut self) {
        self.radius.close();
    }
}

impl Machine for Target {
    type State = State;

    fn step(&mut self, mut state: State) -> std::result::Result<Vec<State>, StepError> {
        let pc = state.registers.get_pc().as_u64();
        let processor = &mut self.radius.processor;

        let forks = quietly(|| processor.step(&mut state))
            .map_err(|payload| {
                let message = panic_message(payload.as_ref());
                match pc {
                    Some(addr) if message.contains("invalid instruction") => {
                        StepError::InvalidInstruction(addr)
                    }
                    _ => StepError::Engine(message),
                }
            })?;

        let mut successors = Vec::with_capacity(forks.len() + 1);
        successors.push(state);
        successors.extend(forks);
        Ok(successors)
    }

    fn stdout(&mut self, state: &mut State) -> Vec<u8> {
        let values = state.filesystem.dump(STDOUT);
        if values.iter().all(|v| v.as_u64().is_some()) {
            return values.iter().map(|v| v.as_u64().unwrap_or(0) as u8).collect();
        }

        // symbolic output, render it from one model and forget the model
        state.solver.push();
        let bytes = values
            .iter()
            .map(|v| state.solver.evalcon_to_u64(v).unwrap_or(0) as u8)
            .collect();
        state.solver.pop();
        bytes
    }

    fn stdout_len(&mut self, state: &State) -> usize {
        state
            .filesystem
            .files
            .get(STDOUT)
            .map(|file| file.content.len())
            .unwrap_or(0)
    }

    fn liveness(&mut self, state: &mut State) -> Liveness {
        match state.status {
            StateStatus::Active | StateStatus::PostMerge => Liveness::Running,
            StateStatus::Unsat => Liveness::Unsat,
            StateStatus::Crash(..) => Liveness::Faulted,
            _ => Liveness::Halted,
        }
    }

    fn is_sat(&mut self, state: &mut State) -> bool {
        state.is_sat()
    }
}

/// `low <= byte <= high` as a boolector bitvector
fn within<R>(byte: &BV<R>, range: &RangeInclusive<u8>) -> BV<R>
where
    R: Borrow<Btor> + Clone,
{
    let btor = byte.get_btor();
    let low = BV::from_u64(btor.clone(), *range.start() as u64, 8);
    let high = BV::from_u64(btor, *range.end() as u64, 8);
    byte.ugte(&low).and(&byte.ulte(&high))
}

/// Run an engine call, turning a panic into an `Err` without printing it.
/// The previous panic hook is back in place when this returns.
fn quietly<T, F: FnOnce() -> T>(call: F) -> thread::Result<T> {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let result = panic::catch_unwind(AssertUnwindSafe(call));
    panic::set_hook(previous);
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "engine panicked".to_owned()
    }
}

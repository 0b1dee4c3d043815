// End to end exploration against a tiny engine whose states constrain each
// input byte to a set of allowed values. Branching on a byte splits the set,
// an empty set is an unsatisfiable path.

use crate::budget::{Budget, Exhausted};
use crate::explorer::{Exploration, Explorer, Outcome, StopPolicy};
use crate::input::InputSpec;
use crate::machine::{Liveness, Machine, StepError};
use crate::oracle::{contains, Oracle};
use crate::strategy::StrategyKind;

use std::collections::BTreeSet;

const KEY: &[u8; 32] = b"flag{sym_3x3c_f1nds_th3_w4y_0ut}";

#[derive(Debug, Clone)]
enum Op {
    Print(&'static str),
    Branch {
        index: usize,
        byte: u8,
        then: usize,
        otherwise: usize,
    },
    Jump(usize),
    Halt,
    Invalid,
    Crash,
}

#[derive(Debug, Clone)]
struct ToyState {
    pc: usize,
    domains: Vec<BTreeSet<u8>>,
    output: Vec<u8>,
    halted: bool,
    crashed: bool,
    steps: usize,
}

impl ToyState {
    fn printable() -> Self {
        let spec = InputSpec::default();
        ToyState {
            pc: 0,
            domains: vec![spec.charset.collect(); spec.length],
            output: vec![],
            halted: false,
            crashed: false,
            steps: 0,
        }
    }

    fn concrete(input: &[u8]) -> Self {
        ToyState {
            domains: input.iter().map(|b| Some(*b).into_iter().collect()).collect(),
            ..ToyState::printable()
        }
    }

    // smallest admissible value of every byte, one model of the path
    fn solve(&self) -> Option<Vec<u8>> {
        self.domains.iter().map(|d| d.iter().next().copied()).collect()
    }
}

struct Toy {
    program: Vec<Op>,
    renders: usize,
}

impl Toy {
    fn new(program: Vec<Op>) -> Self {
        Toy {
            program,
            renders: 0,
        }
    }
}

impl Machine for Toy {
    type State = ToyState;

    fn step(&mut self, mut state: ToyState) -> Result<Vec<ToyState>, StepError> {
        state.steps += 1;
        let op = match self.program.get(state.pc) {
            Some(op) => op.clone(),
            None => return Ok(vec![]),
        };

        match op {
            Op::Print(text) => {
                state.output.extend_from_slice(text.as_bytes());
                state.pc += 1;
            }
            Op::Branch {
                index,
                byte,
                then,
                otherwise,
            } => {
                let mut taken = state.clone();
                taken.domains[index].retain(|b| *b == byte);
                taken.pc = then;
                state.domains[index].remove(&byte);
                state.pc = otherwise;
                return Ok(vec![taken, state]);
            }
            Op::Jump(target) => state.pc = target,
            Op::Halt => state.halted = true,
            Op::Invalid => return Err(StepError::InvalidInstruction(state.pc as u64)),
            Op::Crash => state.crashed = true,
        }
        Ok(vec![state])
    }

    fn stdout(&mut self, state: &mut ToyState) -> Vec<u8> {
        self.renders += 1;
        state.output.clone()
    }

    fn stdout_len(&mut self, state: &ToyState) -> usize {
        state.output.len()
    }

    fn liveness(&mut self, state: &mut ToyState) -> Liveness {
        if !self.is_sat(state) {
            Liveness::Unsat
        } else if state.crashed {
            Liveness::Faulted
        } else if state.halted {
            Liveness::Halted
        } else {
            Liveness::Running
        }
    }

    fn is_sat(&mut self, state: &mut ToyState) -> bool {
        state.domains.iter().all(|d| !d.is_empty())
    }
}

fn toy_coverage(state: &ToyState) -> i64 {
    -(state.steps as i64)
}

/// checks every byte of `key`, prints the success message only on a match
fn crackme(key: &[u8]) -> Vec<Op> {
    let n = key.len();
    let fail = n + 2;
    let mut program: Vec<Op> = key
        .iter()
        .enumerate()
        .map(|(index, byte)| Op::Branch {
            index,
            byte: *byte,
            then: index + 1,
            otherwise: fail,
        })
        .collect();

    program.push(Op::Print("Correct!\n"));
    program.push(Op::Halt);
    program.push(Op::Print("Wrong, Try Again\n"));
    program.push(Op::Halt);
    program
}

fn explore_with(
    program: Vec<Op>,
    kind: StrategyKind,
    budget: Budget,
    stop: StopPolicy,
) -> Exploration<ToyState> {
    let mut toy = Toy::new(program);
    let exploration = Explorer::new(&mut toy, Oracle::new(b"Correct"))
        .budget(budget)
        .stop(stop)
        .explore(ToyState::printable(), kind.build(7, toy_coverage));
    exploration
}

fn explore(program: Vec<Op>) -> Exploration<ToyState> {
    explore_with(
        program,
        StrategyKind::default(),
        Budget::unbounded(),
        StopPolicy::First,
    )
}

/// run the program on a concrete input, following the only feasible path
fn replay(program: Vec<Op>, input: &[u8]) -> Vec<u8> {
    let mut toy = Toy::new(program);
    let mut state = ToyState::concrete(input);
    loop {
        let mut next = toy.step(state).unwrap();
        next.retain(|s| s.domains.iter().all(|d| !d.is_empty()));
        state = match next.pop() {
            Some(s) if !s.halted => s,
            Some(s) => return s.output,
            None => return vec![],
        };
    }
}

#[test]
fn no_input_dependent_branch() {
    let program = vec![Op::Print("Enter the flag: "), Op::Print("nope\n"), Op::Halt];
    let exploration = explore(program);
    assert_eq!(exploration.outcome(), Outcome::NotFound);
    assert_eq!(exploration.stats.deadended, 1);
    assert_eq!(exploration.exhausted, None);
}

#[test]
fn recovers_exact_key() {
    for kind in &[
        StrategyKind::DepthFirst,
        StrategyKind::BreadthFirst,
        StrategyKind::Random,
        StrategyKind::Coverage,
    ] {
        let exploration = explore_with(
            crackme(KEY),
            *kind,
            Budget::unbounded(),
            StopPolicy::First,
        );
        assert_eq!(exploration.outcome(), Outcome::Found, "strategy {}", kind);
        let solution = exploration.first().unwrap().solve().unwrap();
        assert_eq!(&solution[..], &KEY[..], "strategy {}", kind);
    }
}

#[test]
fn solution_is_printable_and_replays() {
    // only the first four bytes matter, the rest are free
    let exploration = explore(crackme(b"r2!~"));
    let solution = exploration.first().unwrap().solve().unwrap();
    assert!(InputSpec::default().admits(&solution));
    assert_eq!(&solution[..4], b"r2!~");

    let output = replay(crackme(b"r2!~"), &solution);
    assert!(contains(&output, b"Correct"));
    assert!(!contains(&output.to_ascii_lowercase(), b"try again"));
}

#[test]
fn failure_wins_over_success() {
    let program = vec![Op::Print("Correct... not, try again\n"), Op::Halt];
    let exploration = explore(program);
    assert_eq!(exploration.outcome(), Outcome::NotFound);
    assert_eq!(exploration.stats.avoided, 1);
}

#[test]
fn avoided_states_are_not_expanded() {
    let program = vec![
        Op::Print("TRY AGAIN\n"),
        Op::Print("Correct\n"),
        Op::Halt,
    ];
    let exploration = explore(program);
    assert_eq!(exploration.outcome(), Outcome::NotFound);
    assert_eq!(exploration.stats.steps, 1);
}

#[test]
fn unprintable_branch_is_unsat() {
    // the success path needs a newline in the input
    let program = vec![
        Op::Branch {
            index: 3,
            byte: b'\n',
            then: 1,
            otherwise: 3,
        },
        Op::Print("Correct\n"),
        Op::Halt,
        Op::Print("bye\n"),
        Op::Halt,
    ];
    let exploration = explore(program);
    assert_eq!(exploration.outcome(), Outcome::NotFound);
    assert_eq!(exploration.stats.unsat, 1);
    assert_eq!(exploration.stats.deadended, 1);
}

#[test]
fn undecodable_instruction_drops_one_state() {
    let program = vec![
        Op::Branch {
            index: 0,
            byte: b'A',
            then: 4,
            otherwise: 1,
        },
        Op::Print("Correct\n"),
        Op::Halt,
        Op::Halt,
        Op::Invalid,
    ];
    let exploration = explore(program);
    assert_eq!(exploration.errors, vec![StepError::InvalidInstruction(4)]);
    assert_eq!(exploration.outcome(), Outcome::Found);
    let solution = exploration.first().unwrap().solve().unwrap();
    assert_eq!(solution[0], b' ');
}

#[test]
fn crashed_states_are_errored() {
    let program = vec![
        Op::Branch {
            index: 0,
            byte: b'x',
            then: 1,
            otherwise: 2,
        },
        Op::Crash,
        Op::Print("Correct\n"),
        Op::Halt,
    ];
    let exploration = explore(program);
    assert_eq!(exploration.stats.errored, 1);
    assert!(exploration.errors.is_empty());
    assert_eq!(exploration.first().unwrap().solve().unwrap()[0], b' ');
}

#[test]
fn deterministic_strategies_repeat() {
    for kind in &[StrategyKind::Random, StrategyKind::DepthFirst] {
        let run = || {
            explore_with(
                crackme(b"abc"),
                *kind,
                Budget::unbounded(),
                StopPolicy::All,
            )
            .found
            .iter()
            .map(|s| s.solve().unwrap())
            .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}

#[test]
fn step_budget_stops_infinite_loop() {
    let program = vec![Op::Print("."), Op::Jump(0)];
    let exploration = explore_with(
        program,
        StrategyKind::BreadthFirst,
        Budget::unbounded().with_max_steps(100),
        StopPolicy::First,
    );
    assert_eq!(exploration.outcome(), Outcome::NotFound);
    assert_eq!(exploration.exhausted, Some(Exhausted::Steps));
    assert_eq!(exploration.stats.steps, 100);
}

#[test]
fn all_policy_collects_every_solution() {
    let program = vec![
        Op::Branch {
            index: 0,
            byte: b'a',
            then: 3,
            otherwise: 1,
        },
        Op::Branch {
            index: 0,
            byte: b'b',
            then: 3,
            otherwise: 5,
        },
        Op::Halt,
        Op::Print("Correct\n"),
        Op::Halt,
        Op::Print("try again\n"),
        Op::Halt,
    ];

    let first = explore_with(
        program.clone(),
        StrategyKind::BreadthFirst,
        Budget::unbounded(),
        StopPolicy::First,
    );
    assert_eq!(first.found.len(), 1);

    let all = explore_with(
        program,
        StrategyKind::BreadthFirst,
        Budget::unbounded(),
        StopPolicy::All,
    );
    let mut heads: Vec<u8> = all.found.iter().map(|s| s.solve().unwrap()[0]).collect();
    heads.sort_unstable();
    assert_eq!(heads, vec![b'a', b'b']);
    assert_eq!(all.stats.avoided, 1);
}

#[test]
fn unchanged_output_is_not_rendered() {
    let program = vec![Op::Print("Enter flag: "), Op::Jump(2), Op::Jump(1)];
    let mut toy = Toy::new(program);
    let exploration = Explorer::new(&mut toy, Oracle::new(b"Correct"))
        .budget(Budget::unbounded().with_max_steps(1000))
        .explore(ToyState::printable(), StrategyKind::BreadthFirst.build(0, toy_coverage));

    assert_eq!(exploration.stats.steps, 1000);
    assert_eq!(toy.renders, 1);
}

#[test]
fn output_written_late_is_still_classified() {
    let program = vec![
        Op::Print("Enter flag: "),
        Op::Jump(2),
        Op::Jump(3),
        Op::Print("Correct\n"),
        Op::Halt,
    ];
    let mut toy = Toy::new(program);
    let exploration = Explorer::new(&mut toy, Oracle::new(b"Correct"))
        .explore(ToyState::printable(), StrategyKind::DepthFirst.build(0, toy_coverage));

    assert_eq!(exploration.outcome(), Outcome::Found);
    assert_eq!(toy.renders, 2);
}

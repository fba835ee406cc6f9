// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::opcode::{Instruction, LabelRef, Operand};
use super::parser::Program;
use serde::Serialize;
use tilebot_core::config::InterpreterConfig;
use tilebot_core::{Direction, HaltReason};

/// Number of general purpose registers.
pub const REGISTER_COUNT: usize = 16;

/// What the machine needs to know about the world.
pub trait World {
    /// Returns `true` while the hero is mid-move. The machine does not step
    /// until the move completes.
    fn hero_moving(&self) -> bool;

    /// Returns `true` when the cell the hero faces is empty or has no cell
    /// data. Facing the map edge is not empty.
    fn facing_cell_empty(&self) -> bool;
}

/// A side effect requested by an instruction, carried out by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Move the hero.
    Move(Direction),
    /// Pick up or drop on the hero's cell.
    Interact,
}

/// Outcome of one [`Machine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// One instruction was executed.
    Continue(Option<Action>),
    /// The hero is moving; nothing was executed.
    Waiting,
    /// The program is over.
    Halted(HaltReason),
}

/// Stack bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Deeper calls are ignored.
    pub max_call_depth: usize,
    /// Deeper pushes are ignored.
    pub max_data_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_call_depth: 64,
            max_data_depth: 256,
        }
    }
}

impl From<&InterpreterConfig> for Limits {
    fn from(config: &InterpreterConfig) -> Self {
        Self {
            max_call_depth: config.max_call_stack_depth,
            max_data_depth: config.max_data_stack_depth,
        }
    }
}

/// A read-only copy of the machine registers and stacks, for debug views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineSnapshot {
    /// Program counter.
    pub pc: usize,
    /// Register file, `r0` first.
    pub registers: [i64; REGISTER_COUNT],
    /// Return addresses, innermost last.
    pub call_stack: Vec<usize>,
    /// Data stack, top last.
    pub data_stack: Vec<i64>,
    /// Instructions executed since the last reset.
    pub executed: u64,
    /// Why the program stopped, once it has.
    pub halted: Option<HaltReason>,
}

/// The register machine.
#[derive(Debug, Clone)]
pub struct Machine {
    program: Program,
    limits: Limits,
    pc: usize,
    registers: [i64; REGISTER_COUNT],
    call_stack: Vec<usize>,
    data_stack: Vec<i64>,
    executed: u64,
    halted: Option<HaltReason>,
}

impl Machine {
    /// A machine at the start of `program` with zeroed registers.
    pub fn new(program: Program, limits: Limits) -> Self {
        Self {
            program,
            limits,
            pc: 0,
            registers: [0; REGISTER_COUNT],
            call_stack: Vec::new(),
            data_stack: Vec::new(),
            executed: 0,
            halted: None,
        }
    }

    /// Rewinds to the first instruction and clears registers and stacks.
    pub fn reset(&mut self) {
        self.pc = 0;
        self.registers = [0; REGISTER_COUNT];
        self.call_stack.clear();
        self.data_stack.clear();
        self.executed = 0;
        self.halted = None;
    }

    /// The loaded program.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Program counter.
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Register file.
    pub fn registers(&self) -> &[i64; REGISTER_COUNT] {
        &self.registers
    }

    /// Current call depth.
    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    /// Why the program stopped, once it has.
    pub fn halted(&self) -> Option<HaltReason> {
        self.halted
    }

    /// Copies registers and stacks for a debug view.
    pub fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot {
            pc: self.pc,
            registers: self.registers,
            call_stack: self.call_stack.clone(),
            data_stack: self.data_stack.clone(),
            executed: self.executed,
            halted: self.halted,
        }
    }

    fn read(&self, operand: Operand) -> i64 {
        match operand {
            Operand::Register(register) => self.registers[register.index()],
            Operand::Literal(value) => value,
        }
    }

    fn write(&mut self, operand: Operand, value: i64) {
        match operand {
            Operand::Register(register) => self.registers[register.index()] = value,
            Operand::Literal(literal) => {
                log::debug!("Ignoring write of {value} to literal {literal} at pc {}.", self.pc);
            }
        }
    }

    fn halt(&mut self, reason: HaltReason) -> Step {
        log::debug!("Program halted ({reason:?}) after {} instruction(s).", self.executed);
        self.halted = Some(reason);
        Step::Halted(reason)
    }

    /// Target of a taken branch, or the next instruction when the label is
    /// undefined.
    fn branch(&self, label: &LabelRef) -> usize {
        match label.target {
            Some(target) => target,
            None => {
                log::debug!("Label '{}' is undefined, falling through.", label.name);
                self.pc + 1
            }
        }
    }

    /// Executes at most one instruction.
    ///
    /// Returns [`Step::Waiting`] without consuming anything while the hero
    /// moves, [`Step::Halted`] once the program counter has run off the end
    /// or `return` found an empty call stack, and [`Step::Continue`] after
    /// executing one instruction.
    pub fn step(&mut self, world: &dyn World) -> Step {
        if let Some(reason) = self.halted {
            return Step::Halted(reason);
        }
        if world.hero_moving() {
            return Step::Waiting;
        }
        let Some(instruction) = self.program.get(self.pc).cloned() else {
            return self.halt(HaltReason::EndOfProgram);
        };

        log::trace!("pc {:>3}: {:?}", self.pc, instruction);
        let mut next = self.pc + 1;
        let mut action = None;

        match instruction {
            Instruction::Move(direction) => action = Some(Action::Move(direction)),
            Instruction::Interact => action = Some(Action::Interact),
            Instruction::Arith { op, dst, src } => {
                let value = op.apply(self.read(dst), self.read(src));
                self.write(dst, value);
            }
            Instruction::Jump(label) => next = self.branch(&label),
            Instruction::Call(label) => {
                if label.target.is_none() {
                    log::debug!("Call to undefined label '{}' ignored.", label.name);
                } else if self.call_stack.len() >= self.limits.max_call_depth {
                    log::warn!(
                        "Call stack limit ({}) reached, ignoring 'call {}'.",
                        self.limits.max_call_depth,
                        label.name
                    );
                } else {
                    self.call_stack.push(self.pc + 1);
                    next = self.branch(&label);
                }
            }
            Instruction::Return => match self.call_stack.pop() {
                Some(address) => next = address,
                None => {
                    self.executed += 1;
                    return self.halt(HaltReason::ReturnFromTop);
                }
            },
            Instruction::IfZero { value, label } => {
                if self.read(value) == 0 {
                    next = self.branch(&label);
                }
            }
            Instruction::IfEmpty(label) => {
                if world.facing_cell_empty() {
                    next = self.branch(&label);
                }
            }
            Instruction::Push(value) => {
                if self.data_stack.len() >= self.limits.max_data_depth {
                    log::warn!(
                        "Data stack limit ({}) reached, ignoring push.",
                        self.limits.max_data_depth
                    );
                } else {
                    self.data_stack.push(self.read(value));
                }
            }
            Instruction::Pop(dst) => {
                let value = self.data_stack.pop().unwrap_or(0);
                self.write(dst, value);
            }
            Instruction::Nop { .. } => {}
        }

        self.pc = next;
        self.executed += 1;
        Step::Continue(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StillWorld {
        facing_empty: bool,
    }

    impl World for StillWorld {
        fn hero_moving(&self) -> bool {
            false
        }
        fn facing_cell_empty(&self) -> bool {
            self.facing_empty
        }
    }

    const STILL: StillWorld = StillWorld {
        facing_empty: true,
    };

    fn run(text: &str) -> (Machine, Vec<Action>, HaltReason) {
        let mut machine = Machine::new(Program::parse(text), Limits::default());
        let mut actions = Vec::new();
        for _ in 0..10_000 {
            match machine.step(&STILL) {
                Step::Continue(Some(action)) => actions.push(action),
                Step::Continue(None) | Step::Waiting => {}
                Step::Halted(reason) => return (machine, actions, reason),
            }
        }
        panic!("program did not halt");
    }

    #[test]
    fn moving_hero_blocks_stepping() {
        struct Moving;
        impl World for Moving {
            fn hero_moving(&self) -> bool {
                true
            }
            fn facing_cell_empty(&self) -> bool {
                true
            }
        }
        let mut machine = Machine::new(Program::parse("right"), Limits::default());
        assert_eq!(machine.step(&Moving), Step::Waiting);
        assert_eq!(machine.pc(), 0);
        assert_eq!(
            machine.step(&STILL),
            Step::Continue(Some(Action::Move(Direction::Right)))
        );
        assert_eq!(machine.step(&STILL), Step::Halted(HaltReason::EndOfProgram));
    }

    #[test]
    fn jump_lands_after_the_label() {
        let (machine, actions, _) = run("jump skip\nleft\nskip:\nright");
        assert_eq!(actions, vec![Action::Move(Direction::Right)]);
        assert_eq!(machine.snapshot().executed, 2);
    }

    #[test]
    fn jump_to_undefined_label_falls_through() {
        let mut machine = Machine::new(Program::parse("jump nowhere\nup"), Limits::default());
        assert_eq!(machine.step(&STILL), Step::Continue(None));
        assert_eq!(machine.pc(), 1);
        assert_eq!(
            machine.step(&STILL),
            Step::Continue(Some(Action::Move(Direction::Up)))
        );
    }

    #[test]
    fn call_returns_after_the_call_site() {
        let text = "call f\ndown\nreturn\nf:\nup\nreturn";
        let (_, actions, reason) = run(text);
        assert_eq!(
            actions,
            vec![Action::Move(Direction::Up), Action::Move(Direction::Down)]
        );
        assert_eq!(reason, HaltReason::ReturnFromTop);
    }

    #[test]
    fn calls_beyond_the_limit_are_dropped() {
        // Recurse until the limit, counting the calls that went through.
        let text = "f:\nadd r0 1\ncall f\nreturn";
        let limits = Limits {
            max_call_depth: 4,
            ..Limits::default()
        };
        let mut machine = Machine::new(Program::parse(text), limits);
        let mut deepest = 0;
        let reason = loop {
            match machine.step(&STILL) {
                Step::Halted(reason) => break reason,
                _ => deepest = deepest.max(machine.call_depth()),
            }
        };
        assert_eq!(deepest, 4);
        assert_eq!(machine.registers()[0], 5, "four nested calls plus the outer body");
        assert_eq!(reason, HaltReason::ReturnFromTop);
    }

    #[test]
    fn if_empty_reads_the_world() {
        let text = "ifEmpty open\nleft\nreturn\nopen:\nright";
        let mut machine = Machine::new(Program::parse(text), Limits::default());
        let blocked = StillWorld {
            facing_empty: false,
        };
        machine.step(&blocked);
        assert_eq!(
            machine.step(&blocked),
            Step::Continue(Some(Action::Move(Direction::Left)))
        );

        let (_, actions, _) = run(text);
        assert_eq!(actions, vec![Action::Move(Direction::Right)]);
    }

    #[test]
    fn data_stack_is_lifo_and_bounded() {
        let (machine, _, _) = run("push 1\npush 2\npush 3\npop r0\npop r1\npop r2\npop r3");
        assert_eq!(&machine.registers()[..4], &[3, 2, 1, 0]);

        let limits = Limits {
            max_data_depth: 1,
            ..Limits::default()
        };
        let mut machine = Machine::new(Program::parse("push 7\npush 8\npop r0"), limits);
        while !matches!(machine.step(&STILL), Step::Halted(_)) {}
        assert_eq!(machine.registers()[0], 7);
    }

    #[test]
    fn halted_machine_stays_halted_until_reset() {
        let mut machine = Machine::new(Program::parse("return\nup"), Limits::default());
        assert_eq!(machine.step(&STILL), Step::Halted(HaltReason::ReturnFromTop));
        assert_eq!(machine.step(&STILL), Step::Halted(HaltReason::ReturnFromTop));
        machine.reset();
        assert_eq!(machine.halted(), None);
        assert_eq!(machine.pc(), 0);
    }
}

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

use tilebot_core::{Direction, HaltReason, MapData, TileType};
use tilebot_vm::{Action, BlockProgram, Limits, Machine, Program, Step, World};

/// A hero on a map that moves instantly.
struct GridWorld {
    map: MapData,
    x: i64,
    y: i64,
    dir: Direction,
}

impl World for GridWorld {
    fn hero_moving(&self) -> bool {
        false
    }

    fn facing_cell_empty(&self) -> bool {
        self.map.is_facing_empty(self.x, self.y, self.dir)
    }
}

impl GridWorld {
    fn apply(&mut self, action: Action) {
        if let Action::Move(dir) = action {
            self.dir = dir;
            if let Some((nx, ny)) = self.map.neighbour(self.x, self.y, dir) {
                if self.map.is_walkable(nx, ny) {
                    self.x = nx;
                    self.y = ny;
                }
            }
        }
    }
}

fn world() -> GridWorld {
    GridWorld {
        map: MapData::blank(5, 1)
            .with_type("W", TileType::default())
            .with_cell(4, 0, "W"),
        x: 0,
        y: 0,
        dir: Direction::Right,
    }
}

fn execute(text: &str, world: &mut GridWorld) -> (Vec<Action>, [i64; 16], HaltReason) {
    let mut machine = Machine::new(Program::parse(text), Limits::default());
    let mut actions = Vec::new();
    for _ in 0..100_000 {
        match machine.step(&*world) {
            Step::Continue(Some(action)) => {
                world.apply(action);
                actions.push(action);
            }
            Step::Continue(None) | Step::Waiting => {}
            Step::Halted(reason) => return (actions, *machine.registers(), reason),
        }
    }
    panic!("program did not halt");
}

const WALK_TO_WALL: &str = "\
// walk right until the wall, counting steps in r1
loop:
ifEmpty step
return
step:
right
add r1 1
jump loop
";

#[test]
fn runs_are_deterministic() {
    let first = execute(WALK_TO_WALL, &mut world());
    let second = execute(WALK_TO_WALL, &mut world());

    assert_eq!(first, second);
    assert_eq!(first.0.len(), 3, "three free cells before the wall");
    assert_eq!(first.1[1], 3);
    assert_eq!(first.2, HaltReason::ReturnFromTop);
}

#[test]
fn forward_jump_skips_to_label() {
    let (actions, _, reason) = execute("jump over\nleft\nleft\nover:\nright", &mut world());
    assert_eq!(actions, vec![Action::Move(Direction::Right)]);
    assert_eq!(reason, HaltReason::EndOfProgram);
}

#[test]
fn undefined_label_is_a_fall_through() {
    let program = Program::parse("jump missing\nup");
    assert_eq!(program.diagnostics().len(), 1);
    let (actions, _, _) = execute("jump missing\nup", &mut world());
    assert_eq!(actions, vec![Action::Move(Direction::Up)]);
}

#[test]
fn nested_calls_unwind_in_order() {
    let text = "\
call outer
interact
return
outer:
call inner
down
return
inner:
up
return
";
    let (actions, _, reason) = execute(text, &mut world());
    assert_eq!(
        actions,
        vec![
            Action::Move(Direction::Up),
            Action::Move(Direction::Down),
            Action::Interact
        ]
    );
    assert_eq!(reason, HaltReason::ReturnFromTop);
}

#[test]
fn call_depth_limit_drops_one_more_call() {
    let depth = Limits::default().max_call_depth;
    // Each level bumps r0 and calls itself; the innermost level cannot call.
    let text = "f:\nadd r0 1\ncall f\nreturn";
    let (_, registers, reason) = execute(text, &mut world());
    assert_eq!(registers[0], depth as i64 + 1);
    assert_eq!(reason, HaltReason::ReturnFromTop);
}

#[test]
fn count_down_loop_runs_body_five_times() {
    let text = "\
copy r0 5
loop:
add r1 1
sub r0 1
ifZero r0 done
jump loop
done:
";
    let (_, registers, reason) = execute(text, &mut world());
    assert_eq!(registers[0], 0);
    assert_eq!(registers[1], 5);
    assert_eq!(reason, HaltReason::EndOfProgram);
}

#[test]
fn compiled_blocks_run_like_text() {
    let mut blocks = BlockProgram::new();
    let copy = blocks.add("copy", None).unwrap();
    blocks.set_input(copy, 1, "2").unwrap();
    let label = blocks.add("label", None).unwrap();
    blocks.set_input(label, 0, "again").unwrap();
    blocks.add("right", None).unwrap();
    let sub = blocks.add("sub", None).unwrap();
    blocks.set_input(sub, 1, "1").unwrap();
    let branch = blocks.add("ifZero", None).unwrap();
    blocks.set_input(branch, 0, "r0").unwrap();
    blocks.set_input(branch, 1, "end").unwrap();
    let jump = blocks.add("jump", None).unwrap();
    blocks.set_input(jump, 0, "again").unwrap();
    let end = blocks.add("label", None).unwrap();
    blocks.set_input(end, 0, "end").unwrap();

    let code = blocks.compile();
    assert!(Program::parse(&code).diagnostics().is_empty(), "{code}");

    let mut grid = world();
    let (actions, registers, _) = execute(&code, &mut grid);
    assert_eq!(actions.len(), 2);
    assert_eq!(registers[0], 0);
    assert_eq!((grid.x, grid.y), (2, 0));
}

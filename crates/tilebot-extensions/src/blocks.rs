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

//! The block editor: a reorderable sequence of palette blocks compiled into
//! `program.code` after every edit.

use serde_json::{json, Map};
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use tilebot_core::state::paths;
use tilebot_core::{EventKind, Extension, ExtensionContext, GameEvent, NodeId};
use tilebot_vm::{BlockError, BlockProgram};

/// Node role of the block list.
pub const BLOCK_LIST_ROLE: &str = "block-list";
/// Node role of one block.
pub const BLOCK_ROLE: &str = "block";

#[derive(Default)]
struct Editor {
    program: BlockProgram,
    root: Option<NodeId>,
}

impl Editor {
    fn render(&self, ctx: &ExtensionContext) {
        let Some(root) = self.root else {
            return;
        };
        let surface = ctx.surface();
        for child in surface.children(root) {
            surface.remove(child);
        }
        for (position, block) in self.program.blocks().iter().enumerate() {
            let id = surface.create(BLOCK_ROLE, Some(root));
            surface.set_attr(id, "id", block.id.to_string());
            surface.set_attr(id, "position", position.to_string());
            surface.set_attr(id, "opcode", block.opcode.as_str());
            surface.set_attr(id, "inputs", block.inputs.join(" "));
        }
    }

    /// Writes the sequence and its compiled text in one state update.
    fn publish(&self, ctx: &ExtensionContext) -> anyhow::Result<()> {
        let code = self.program.compile();
        let mut partial = Map::new();
        partial.insert("blocks".to_string(), serde_json::to_value(&self.program)?);
        partial.insert("code".to_string(), json!(code));
        ctx.state().update(paths::PROGRAM, partial)?;
        self.render(ctx);
        log::debug!(
            "Compiled {} block(s) into {} line(s).",
            self.program.len(),
            code.lines().count()
        );
        Ok(())
    }
}

/// Owns `program.blocks` and keeps `program.code` compiled from it.
#[derive(Default)]
pub struct ProgrammingBlockExtension {
    editor: Rc<RefCell<Editor>>,
}

impl ProgrammingBlockExtension {
    /// Creates the extension.
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the current sequence.
    pub fn program(&self) -> BlockProgram {
        self.editor.borrow().program.clone()
    }

    /// Registers a handler that applies `edit` and republishes on success.
    fn handle<F>(&self, ctx: &ExtensionContext, kind: EventKind, edit: F)
    where
        F: Fn(&mut BlockProgram, &GameEvent) -> Result<(), BlockError> + 'static,
    {
        let editor = self.editor.clone();
        let c = ctx.clone();
        ctx.on(kind, move |event| {
            let outcome = edit(&mut editor.borrow_mut().program, event);
            match outcome {
                Ok(()) => editor.borrow().publish(&c),
                Err(e) => {
                    log::debug!("Block edit rejected: {e}");
                    c.emit(GameEvent::Alert(e.to_string()));
                    Ok(())
                }
            }
        });
    }
}

impl Extension for ProgrammingBlockExtension {
    fn name(&self) -> &'static str {
        "blocks"
    }

    fn init(&mut self, ctx: &ExtensionContext) -> anyhow::Result<()> {
        let stored: BlockProgram = match ctx.state().get_as(paths::PROGRAM_BLOCKS) {
            Ok(program) => program,
            Err(e) => {
                log::warn!("Ignoring malformed program.blocks: {e}");
                BlockProgram::new()
            }
        };
        {
            let mut editor = self.editor.borrow_mut();
            editor.program = stored;
            editor.root = Some(ctx.create_node(BLOCK_LIST_ROLE, None));
            editor.render(ctx);
        }

        self.handle(ctx, EventKind::BlockAdd, |program, event| {
            if let GameEvent::BlockAdd { opcode, index } = event {
                program.add(opcode, *index)?;
            }
            Ok(())
        });
        self.handle(ctx, EventKind::BlockRemove, |program, event| {
            if let GameEvent::BlockRemove { id } = event {
                program.remove(*id)?;
            }
            Ok(())
        });
        self.handle(ctx, EventKind::BlockMove, |program, event| {
            if let GameEvent::BlockMove { id, index } = event {
                program.move_to(*id, *index)?;
            }
            Ok(())
        });
        self.handle(ctx, EventKind::BlockSetInput, |program, event| {
            if let GameEvent::BlockSetInput { id, input, value } = event {
                program.set_input(*id, *input, value)?;
            }
            Ok(())
        });
        self.handle(ctx, EventKind::BlockClear, |program, _| {
            program.clear();
            Ok(())
        });
        Ok(())
    }

    fn destroy(&mut self) {
        self.editor.borrow_mut().root = None;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilebot_core::{EngineConfig, GameBus, ObservableState, ProgramState, Surface};

    fn context() -> ExtensionContext {
        let state = ObservableState::from_typed(&json!({ "program": ProgramState::default() }))
            .unwrap();
        ExtensionContext::new(
            "blocks",
            state,
            GameBus::new(),
            Surface::new(),
            Rc::new(EngineConfig::default()),
        )
    }

    #[test]
    fn edits_recompile_program_code() {
        let ctx = context();
        let mut ext = ProgrammingBlockExtension::new();
        ext.init(&ctx).unwrap();

        ctx.emit(GameEvent::BlockAdd {
            opcode: "right".into(),
            index: None,
        });
        ctx.emit(GameEvent::BlockAdd {
            opcode: "copy".into(),
            index: Some(0),
        });
        let copy_id = ext.program().blocks()[0].id;
        ctx.emit(GameEvent::BlockSetInput {
            id: copy_id,
            input: 1,
            value: "3".into(),
        });

        assert_eq!(ctx.state().program_code().unwrap(), "copy r0 3\nright");
        assert_eq!(ctx.surface().nodes_with_role(BLOCK_ROLE).len(), 2);
        let stored: BlockProgram = ctx.state().get_as(paths::PROGRAM_BLOCKS).unwrap();
        assert_eq!(stored, ext.program());
    }

    #[test]
    fn rejected_edit_becomes_an_alert() {
        let ctx = context();
        let mut ext = ProgrammingBlockExtension::new();
        ext.init(&ctx).unwrap();
        let alerts = Rc::new(RefCell::new(Vec::new()));
        let sink = alerts.clone();
        ctx.on(EventKind::Alert, move |event| {
            if let GameEvent::Alert(message) = event {
                sink.borrow_mut().push(message.clone());
            }
            Ok(())
        });

        ctx.emit(GameEvent::BlockRemove { id: 42 });

        assert_eq!(alerts.borrow().len(), 1);
        assert_eq!(ctx.state().program_code().unwrap(), "");
    }

    #[test]
    fn clear_empties_code_and_nodes() {
        let ctx = context();
        let mut ext = ProgrammingBlockExtension::new();
        ext.init(&ctx).unwrap();
        ctx.emit(GameEvent::BlockAdd {
            opcode: "interact".into(),
            index: None,
        });
        ctx.emit(GameEvent::BlockClear);

        assert_eq!(ctx.state().program_code().unwrap(), "");
        assert!(ctx.surface().nodes_with_role(BLOCK_ROLE).is_empty());
    }
}

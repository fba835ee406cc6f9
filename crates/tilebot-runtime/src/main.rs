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

//! Command-line runner for Tilebot maps and programs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tilebot_sdk::prelude::*;
use tilebot_sdk::render_text;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a program on a map until it halts.
    Run {
        /// Map JSON file.
        #[arg(long)]
        map: PathBuf,
        /// Program text file.
        #[arg(long)]
        program: PathBuf,
        /// Engine configuration JSON file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Instructions per second.
        #[arg(long)]
        speed: Option<f64>,
        /// Pace frames with the wall clock instead of fixed timestamps.
        #[arg(long)]
        realtime: bool,
        /// Give up after this many frames.
        #[arg(long, default_value_t = 100_000)]
        max_frames: u64,
        /// Print every event as it is emitted.
        #[arg(long)]
        trace: bool,
    },
    /// Report parser diagnostics of a program.
    Check {
        /// Program text file.
        #[arg(long)]
        program: PathBuf,
    },
    /// Compile a JSON block sequence into program text.
    CompileBlocks {
        /// Block sequence JSON file.
        #[arg(long)]
        blocks: PathBuf,
    },
}

/// What `run` prints once the program stops.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary {
    frames: u64,
    halted: bool,
    hero: Hero,
    registers: Option<Vec<i64>>,
}

fn read(path: &Path, what: &str) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} '{}'", path.display()))
}

fn run(
    map: &Path,
    program: &Path,
    config: Option<&Path>,
    speed: Option<f64>,
    realtime: bool,
    max_frames: u64,
    trace: bool,
) -> Result<ExitCode> {
    let config = match config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    let map_data = MapData::from_json(&read(map, "map")?)
        .with_context(|| format!("invalid map '{}'", map.display()))?;
    let code = read(program, "program")?;

    let mut app = App::builder()
        .config(config)
        .map(map_data)
        .program(code)
        .with_default_extensions()
        .build()?;
    if let Some(speed) = speed {
        app.state().set("program.speed", speed)?;
    }
    let _trace = trace.then(|| {
        app.events().on_any(|event| {
            println!("event: {event:?}");
            Ok(())
        })
    });

    app.emit(GameEvent::InterpreterRun);
    let finished = |app: &App| {
        !app
            .state()
            .program()
            .map(|program| program.running)
            .unwrap_or(false)
    };
    let step_ms = 1000.0 / f64::from(app.config().game_loop.target_fps.max(1));
    let frames = if realtime {
        app.run_realtime(max_frames, finished)
    } else {
        app.run_until(step_ms, max_frames, finished)
    };
    let halted = finished(&app);

    let summary = RunSummary {
        frames,
        halted,
        hero: app.state().hero()?,
        registers: app
            .extension::<InterpreterExtension>()
            .and_then(|interpreter| interpreter.snapshot())
            .map(|snapshot| snapshot.registers.to_vec()),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    println!("{}", render_text(&app.state().map_data()?, &summary.hero));

    if halted {
        Ok(ExitCode::SUCCESS)
    } else {
        log::warn!("Program still running after {frames} frame(s).");
        Ok(ExitCode::FAILURE)
    }
}

fn check(program: &Path) -> Result<ExitCode> {
    let parsed = Program::parse(&read(program, "program")?);
    for diagnostic in parsed.diagnostics() {
        println!("{diagnostic}");
    }
    if parsed.diagnostics().is_empty() {
        println!("{} instruction(s), no diagnostics.", parsed.len());
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn compile_blocks(blocks: &Path) -> Result<ExitCode> {
    let sequence: BlockProgram = serde_json::from_str(&read(blocks, "blocks")?)
        .with_context(|| format!("invalid block sequence '{}'", blocks.display()))?;
    println!("{}", sequence.compile());
    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            map,
            program,
            config,
            speed,
            realtime,
            max_frames,
            trace,
        } => run(
            &map,
            &program,
            config.as_deref(),
            speed,
            realtime,
            max_frames,
            trace,
        ),
        Command::Check { program } => check(&program),
        Command::CompileBlocks { blocks } => compile_blocks(&blocks),
    }
}

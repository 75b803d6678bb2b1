// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::time::Duration;

use anyhow::Result;
use triggerlib::{EngineConfig, TriggerEngine, TriggerKind};

pub fn run(config: EngineConfig) -> Result<()> {
    let wait = config.computation_delay() + Duration::from_secs(5);
    let engine = TriggerEngine::start(config)?;

    for kind in [
        TriggerKind::HardwareEvent,
        TriggerKind::Command,
        TriggerKind::ConfigWrite,
    ] {
        let outcome = engine.router().trigger(kind)?;
        // A burst while the run is in flight folds into it.
        let burst = engine.router().trigger(kind)?;
        engine.executor().wait_idle(wait);

        let mut session = engine.open_session();
        let first = session.read_text()?;
        let second = session.read_text()?;
        println!("{:?}: {:?} then {:?}", kind, outcome, burst);
        print!("  read 1: {}", first.as_deref().unwrap_or("(no data)\n"));
        println!("  read 2: {}", second.as_deref().unwrap_or("(no data)"));
    }

    println!("mode: {}", engine.router().mode_show().trim_end());
    println!("stats: {:?}", engine.executor().stats());
    engine.shutdown();
    Ok(())
}

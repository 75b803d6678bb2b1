// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Interactive console.
//!
//! Each stdin line is one collaborator request:
//!
//! ```text
//! event            hardware event
//! ioctl [code]     command channel (default code 0x4b01)
//! mode             configuration read
//! mode <value>     configuration write
//! read [size]      one read session, read twice with a `size`-byte buffer
//! stats            executor counters
//! quit
//! ```

use std::io::BufRead;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use signal_hook::consts::signal::{SIGHUP, SIGUSR1, SIGUSR2};
use triggerlib::{
    EngineConfig, RESULT_CAPACITY, TRIGGER_COMMAND, TriggerEngine, TriggerError,
    install_shutdown_flag,
};

/// How often the console checks the shutdown flag while waiting for input.
const SHUTDOWN_CHECK_INTERVAL: Duration = Duration::from_millis(100);

pub fn parse_signal(name: &str) -> Result<i32> {
    match name.to_ascii_uppercase().trim_start_matches("SIG") {
        "USR1" => Ok(SIGUSR1),
        "USR2" => Ok(SIGUSR2),
        "HUP" => Ok(SIGHUP),
        other => other
            .parse()
            .with_context(|| format!("Unknown event signal: {}", name)),
    }
}

pub fn run(config: EngineConfig, event_signal: Option<i32>) -> Result<()> {
    let shutdown = install_shutdown_flag()?;
    let engine = TriggerEngine::start(config)?;

    if let Some(signal) = event_signal {
        engine.attach_event_line(signal)?;
        println!(
            "event line {} armed: kill -{} {}",
            engine.config().event_line,
            signal,
            std::process::id()
        );
    }
    println!("commands: event | ioctl [code] | mode [value] | read [size] | stats | quit");

    let lines = spawn_stdin_reader()?;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("Shutdown signal received");
            break;
        }

        crossbeam_channel::select! {
            recv(lines) -> line => {
                let Ok(line) = line else { break };
                match handle_line(&engine, line.trim()) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => println!("error: {:#}", e),
                }
            },
            default(SHUTDOWN_CHECK_INTERVAL) => {}
        }
    }

    engine.shutdown();
    Ok(())
}

fn spawn_stdin_reader() -> Result<crossbeam_channel::Receiver<String>> {
    let (tx, rx) = crossbeam_channel::unbounded();
    std::thread::Builder::new()
        .name("console-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}

/// Returns `Ok(false)` when the console should exit.
fn handle_line(engine: &TriggerEngine, line: &str) -> Result<bool> {
    let mut parts = line.split_whitespace();
    let Some(command) = parts.next() else {
        return Ok(true);
    };
    let arg = parts.next();

    match command {
        "event" => {
            println!("{:?}", engine.router().on_hardware_event());
        }
        "ioctl" => {
            let code = match arg {
                Some(raw) => parse_code(raw)?,
                None => TRIGGER_COMMAND,
            };
            let outcome = engine.router().dispatch_command(code).map_err(with_errno)?;
            println!("{:?}", outcome);
        }
        "mode" => match arg {
            Some(value) => {
                let consumed = engine.router().on_config_write(value).map_err(with_errno)?;
                println!("wrote {} bytes", consumed);
            }
            None => print!("{}", engine.router().mode_show()),
        },
        "read" => {
            let size = match arg {
                Some(raw) => raw.parse().with_context(|| format!("Invalid size: {}", raw))?,
                None => RESULT_CAPACITY,
            };
            let mut buf = vec![0u8; size];
            let mut session = engine.open_session();
            for attempt in 1..=2 {
                let n = session.read(&mut buf).map_err(with_errno)?;
                if n == 0 {
                    println!("read {}: 0 bytes (end of data)", attempt);
                } else {
                    print!("read {}: {}", attempt, String::from_utf8_lossy(&buf[..n]));
                }
            }
        }
        "stats" => {
            println!("{:?} {:?}", engine.executor().state(), engine.executor().stats());
        }
        "quit" | "exit" => return Ok(false),
        other => bail!("unknown command: {}", other),
    }
    Ok(true)
}

fn parse_code(raw: &str) -> Result<u32> {
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.with_context(|| format!("Invalid command code: {}", raw))
}

fn with_errno(e: TriggerError) -> anyhow::Error {
    let errno = e.errno();
    anyhow::Error::new(e).context(format!("errno {}", errno))
}

//! rootshell-replay - Replay a scripted shell scenario
//!
//! Feeds the steps of a scenario file through a shell, one event loop
//! iteration at a time, and prints the final state as JSON.
//!
//! # Usage
//!
//! ```sh
//! rootshell-replay scenario.toml
//! rootshell-replay scenario.toml --config config.toml
//! RUST_LOG=rootshell=debug rootshell-replay scenario.toml
//! ```
//!
//! Exit codes:
//! - 0: All steps applied
//! - 1: Bad arguments or unreadable input
//! - 2: Some steps were rejected (listed in the report's `errors`)

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use calloop::channel::{self, Event};
use calloop::EventLoop;
use rootshell::script::{apply_step, Report, Scenario, ScriptDesktop, Step, StepError};
use rootshell::{Config, Shell};

/// Exit code when the scenario ran but some steps were rejected
const EXIT_STEP_ERRORS: i32 = 2;

struct Args {
    scenario: PathBuf,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = env::args().skip(1);
    let mut scenario = None;
    let mut config = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().context("--config needs a path")?;
                config = Some(PathBuf::from(path));
            }
            "--help" | "-h" => {
                println!("usage: rootshell-replay <scenario.toml> [--config <path>]");
                std::process::exit(0);
            }
            _ if scenario.is_none() => scenario = Some(PathBuf::from(arg)),
            _ => bail!("unexpected argument: {}", arg),
        }
    }

    Ok(Args {
        scenario: scenario.context("missing scenario file")?,
        config,
    })
}

/// State owned by the event loop
struct Replay {
    shell: Shell<ScriptDesktop>,
    next_step: usize,
    errors: Vec<StepError>,
    done: bool,
}

impl Replay {
    fn handle(&mut self, step: Step) {
        let index = self.next_step;
        self.next_step += 1;

        tracing::debug!(step = index, ?step, "applying step");
        if let Err(e) = apply_step(&mut self.shell, &step) {
            tracing::warn!(step = index, error = %e, "step rejected");
            self.errors.push(StepError { step: index, error: e.to_string() });
        }
    }
}

fn main() -> Result<()> {
    setup_logging();

    let args = parse_args()?;

    let content = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("reading {}", args.scenario.display()))?;
    let scenario = Scenario::parse(&content)
        .with_context(|| format!("parsing {}", args.scenario.display()))?;

    let config = match &args.config {
        Some(path) => Config::from_file(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::load(),
    };

    tracing::info!(
        scenario = %args.scenario.display(),
        steps = scenario.steps.len(),
        seats = scenario.seats.len(),
        "starting replay"
    );

    let mut event_loop: EventLoop<Replay> = EventLoop::try_new().context("creating event loop")?;
    let (sender, steps) = channel::channel::<Step>();

    event_loop
        .handle()
        .insert_source(steps, |event, _, replay| match event {
            Event::Msg(step) => replay.handle(step),
            Event::Closed => replay.done = true,
        })
        .map_err(|e| anyhow::anyhow!("registering step channel: {}", e.error))?;

    for step in scenario.steps.iter().cloned() {
        sender.send(step).context("queueing step")?;
    }
    drop(sender);

    let mut replay = Replay {
        shell: Shell::new(config, scenario.desktop()),
        next_step: 0,
        errors: Vec::new(),
        done: false,
    };

    let signal = event_loop.get_signal();
    event_loop
        .run(None, &mut replay, |replay| {
            if replay.done {
                signal.stop();
            }
        })
        .context("running event loop")?;

    let report = Report::collect(&replay.shell, replay.errors);
    tracing::info!(
        views = report.views.len(),
        messages = report.messages.len(),
        errors = report.errors.len(),
        "replay finished"
    );

    let json = serde_json::to_string_pretty(&report).context("serializing report")?;
    println!("{}", json);

    if !report.errors.is_empty() {
        std::process::exit(EXIT_STEP_ERRORS);
    }
    Ok(())
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Respect NO_COLOR environment variable for testing
    let use_ansi = std::env::var("NO_COLOR").is_err();

    // Logs go to stderr so the report on stdout stays parseable
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true)
                .with_ansi(use_ansi),
        )
        .with(filter)
        .init();
}

use std::{
    fs::File,
    io::{BufReader, Read as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "showreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a scenario script and print the per-step trace.
    Simulate(SimulateArgs),
    /// Build a scenario's page and report what got mounted, without running the script.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Input scenario JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Print the trace as JSON instead of one line per step.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Input scenario JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Simulate(args) => cmd_simulate(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn read_scenario(path: &Path) -> anyhow::Result<showreel::Scenario> {
    let f = File::open(path).with_context(|| format!("open scenario '{}'", path.display()))?;
    let mut s = String::new();
    BufReader::new(f)
        .read_to_string(&mut s)
        .with_context(|| format!("read scenario '{}'", path.display()))?;
    let scenario =
        showreel::Scenario::from_json(&s).with_context(|| "parse scenario JSON")?;
    Ok(scenario)
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let scenario = read_scenario(&args.in_path)?;
    let trace = scenario.run()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&trace)?);
        return Ok(());
    }

    for e in &trace {
        let intro = match (e.intro_phase, e.intro_percent) {
            (Some(phase), Some(pct)) => format!("{phase:?} {pct}%"),
            _ => "-".to_owned(),
        };
        println!(
            "{:>3} {:<17} t={:<7.3} y={:<8.1} section={:<8} intro={:<16} cursor={:<7} triggers={}{}",
            e.step,
            e.op,
            e.time,
            e.scroll_y,
            e.active_section,
            intro,
            e.cursor,
            e.live_triggers,
            e.error.as_deref().map(|err| format!(" error={err}")).unwrap_or_default(),
        );
    }
    let failed = trace.iter().filter(|e| e.error.is_some()).count();
    eprintln!("{} steps, {failed} failed", trace.len());
    Ok(())
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let scenario = read_scenario(&args.in_path)?;
    let report = scenario.check()?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.mounted.is_empty() {
        anyhow::bail!("no sections mounted from '{}'", args.in_path.display());
    }
    Ok(())
}

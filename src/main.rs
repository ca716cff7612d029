use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use tracing::info;

use fixture_history::config::RunConfig;
use fixture_history::logging::init_logging;
use fixture_history::page_dump::PageDump;
use fixture_history::pipeline::{Engine, RunOptions, RunReport};
use fixture_history::sink::{FileSink, MemorySink, OutputSink, written_total};
use fixture_history::source::Deadline;

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_logging();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        eprintln!(
            "Usage: fixture_history --dump <dir> [--day N] [--config file.json] [--out dir] \
             [--resume | --offset N | --fresh] [--dry-run]"
        );
        return Ok(());
    }

    let config_path = arg_value(&args, "--config").map(PathBuf::from);
    let mut cfg = RunConfig::load(config_path.as_deref())?;
    if let Some(out) = arg_value(&args, "--out") {
        cfg.output_dir = PathBuf::from(out);
    }

    let dump_dir = arg_value(&args, "--dump")
        .or_else(|| std::env::var("APP_DUMP_DIR").ok())
        .filter(|v| !v.trim().is_empty())
        .context("missing --dump <dir> (or APP_DUMP_DIR)")?;
    let day = match arg_value(&args, "--day") {
        Some(raw) => raw
            .parse::<u32>()
            .with_context(|| format!("invalid --day {raw:?}"))?,
        None => 0,
    };

    let engine = Engine::from_config(&cfg);
    let source = Deadline::new(PageDump::new(&dump_dir), cfg.call_timeout());
    let destinations = engine.router().destinations();
    let now = Local::now().naive_local();

    let dry_run = has_flag(&args, "--dry-run");
    let mut file_sink = FileSink::new(&cfg.output_dir);
    let mut memory_sink = MemorySink::new();
    let sink: &mut dyn OutputSink = if dry_run {
        &mut memory_sink
    } else {
        &mut file_sink
    };

    let start_offset = if let Some(raw) = arg_value(&args, "--offset") {
        raw.parse::<usize>()
            .with_context(|| format!("invalid --offset {raw:?}"))?
    } else if has_flag(&args, "--resume") {
        written_total(sink, &destinations)?
    } else {
        0
    };
    if has_flag(&args, "--fresh") {
        if start_offset > 0 {
            return Err(anyhow!("--fresh cannot be combined with a start offset"));
        }
        if !dry_run {
            file_sink.clear(&destinations)?;
        }
    }

    info!(dump = %dump_dir, day, start_offset, sport = ?cfg.sport, "starting run");
    let sink: &mut dyn OutputSink = if dry_run {
        &mut memory_sink
    } else {
        &mut file_sink
    };
    let report = engine.run(
        &source,
        &source,
        sink,
        RunOptions {
            day,
            start_offset,
            now,
        },
    )?;

    if dry_run {
        for dest in memory_sink.destinations() {
            println!("== {dest}");
            print!("{}", memory_sink.text(dest));
        }
    }
    print_report(&report, &cfg.output_dir, dry_run);

    if let Some(reason) = report.aborted {
        return Err(anyhow!("run stopped early: {reason}"));
    }
    Ok(())
}

fn print_report(report: &RunReport, out_dir: &std::path::Path, dry_run: bool) {
    println!("Fixture history run complete");
    if !dry_run {
        println!("Output: {}", out_dir.display());
    }
    println!(
        "Fixtures: {} fetched, {} admitted, {} already written",
        report.fetched, report.admitted, report.resumed_past
    );
    println!("Records written: {}", report.written);
    for (dest, count) in &report.per_destination {
        println!("  {dest}: {count}");
    }
    if report.unmatched_rows > 0 {
        println!(
            "Rows matching neither participant (read as home side): {}",
            report.unmatched_rows
        );
    }
    if !report.failures.is_empty() {
        println!("Skipped fixtures: {}", report.failures.len());
        for err in report.failures.iter().take(6) {
            println!("   - {err}");
        }
    }
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn arg_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

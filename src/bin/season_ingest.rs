use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use tracing::info;

use fixture_history::config::{RunConfig, parse_list};
use fixture_history::logging::init_logging;
use fixture_history::page_dump::PageDump;
use fixture_history::pipeline::{Engine, RunOptions};
use fixture_history::sink::{FileSink, written_total};
use fixture_history::source::Deadline;
use fixture_history::workers::{WorkerJob, run_workers};

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_logging();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        eprintln!(
            "Usage: season_ingest --seasons dir1,dir2,... [--day N] [--config file.json] \
             [--out dir] [--threads N] [--resume]"
        );
        return Ok(());
    }

    let config_path = arg_value(&args, "--config").map(PathBuf::from);
    let mut cfg = RunConfig::load(config_path.as_deref())?;
    if let Some(out) = arg_value(&args, "--out") {
        cfg.output_dir = PathBuf::from(out);
    }
    if let Some(raw) = arg_value(&args, "--threads") {
        cfg.worker_threads = raw
            .parse()
            .with_context(|| format!("invalid --threads {raw:?}"))?;
    }

    let seasons = arg_value(&args, "--seasons")
        .or_else(|| std::env::var("APP_SEASON_DIRS").ok())
        .map(|raw| parse_list(&raw))
        .unwrap_or_default();
    if seasons.is_empty() {
        return Err(anyhow!("missing --seasons dir1,dir2 (or APP_SEASON_DIRS)"));
    }
    let day = match arg_value(&args, "--day") {
        Some(raw) => raw
            .parse::<u32>()
            .with_context(|| format!("invalid --day {raw:?}"))?,
        None => 0,
    };
    let resume = args.iter().any(|a| a == "--resume");

    let engine = Engine::from_config(&cfg);
    let destinations = engine.router().destinations();
    let now = Local::now().naive_local();

    let mut jobs = Vec::with_capacity(seasons.len());
    for season in &seasons {
        let label = season_label(Path::new(season));
        let sink = FileSink::new(cfg.output_dir.join(&label));
        let start_offset = if resume {
            written_total(&sink, &destinations)?
        } else {
            sink.clear(&destinations)?;
            0
        };
        info!(season = %label, start_offset, "queued season");
        jobs.push(WorkerJob {
            label,
            fixtures: Box::new(Deadline::new(PageDump::new(season), cfg.call_timeout())),
            detail: Box::new(Deadline::new(PageDump::new(season), cfg.call_timeout())),
            sink: Box::new(sink),
            options: RunOptions {
                day,
                start_offset,
                now,
            },
        });
    }

    let outcomes = run_workers(&engine, jobs, cfg.worker_threads());

    println!("Season ingest complete");
    println!("Output root: {}", cfg.output_dir.display());
    let mut failed = 0usize;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(report) => {
                println!(
                    "  {}: {} written ({} admitted, {} resumed past, {} skipped)",
                    outcome.label,
                    report.written,
                    report.admitted,
                    report.resumed_past,
                    report.failures.len()
                );
                if let Some(reason) = &report.aborted {
                    failed += 1;
                    println!("    stopped early: {reason}");
                }
            }
            Err(err) => {
                failed += 1;
                println!("  {}: failed: {err:#}", outcome.label);
            }
        }
    }

    if failed > 0 {
        return Err(anyhow!("{failed} of {} seasons did not finish", outcomes.len()));
    }
    Ok(())
}

fn season_label(dir: &Path) -> String {
    dir.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| dir.display().to_string().replace(['/', '\\'], "_"))
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

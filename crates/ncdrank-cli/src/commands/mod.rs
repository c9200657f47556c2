use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use ncdrank_core::candidates::load_candidates;
use ncdrank_core::request_log::RequestLog;
use ncdrank_core::text::preview_text;
use ncdrank_core::{RankConfig, RankError, ncd, top_k_from_signed};
use serde_json::{Value, json};

use crate::cli::{Cli, Commands, CompressorArgs, RankArgs, ScoreArgs};

mod support;


use self::support::{print_json, print_json_compact};

pub(crate) const DEMO_QUERY: &str = "XXAPI実装";
pub(crate) const DEMO_CANDIDATES: [&str; 1] = ["◯◯API"];
pub(crate) const DEMO_TOP_K: usize = 1;

/// What a command prints, plus the summary recorded in the request log.
#[derive(Debug)]
pub(crate) struct CommandOutput {
    pub(crate) payload: Value,
    pub(crate) compact: bool,
    pub(crate) details: Value,
}

pub(crate) fn run(cli: Cli) -> Result<()> {
    run_with_io(cli, &mut io::stdin().lock(), &mut io::stdout().lock())
}

/// Executes and prints, then logs the outcome of both steps.
pub(crate) fn run_with_io(
    cli: Cli,
    stdin: &mut dyn BufRead,
    stdout: &mut dyn Write,
) -> Result<()> {
    let started = Instant::now();
    let operation = cli.command.operation();
    let log = cli.request_log.as_deref().map(RequestLog::new);

    let outcome = RankConfig::load(cli.config.as_deref())
        .and_then(|config| execute(config, cli.command, stdin))
        .and_then(|output| {
            write_output(stdout, &output)?;
            Ok(output.details)
        });

    match outcome {
        Ok(details) => {
            if let Some(log) = &log {
                log.log_ok(operation, started, Some(details));
            }
            Ok(())
        }
        Err(err) => {
            if let Some(log) = &log {
                let payload = serde_json::to_value(err.to_payload(operation)).ok();
                log.log_error(operation, started, &err, payload);
            }
            Err(err).with_context(|| format!("{operation} failed"))
        }
    }
}

fn write_output(stdout: &mut dyn Write, output: &CommandOutput) -> ncdrank_core::Result<()> {
    if output.compact {
        print_json_compact(stdout, &output.payload)?;
    } else {
        print_json(stdout, &output.payload)?;
    }
    stdout.flush()?;
    Ok(())
}

pub(crate) fn execute(
    config: RankConfig,
    command: Commands,
    stdin: &mut dyn BufRead,
) -> ncdrank_core::Result<CommandOutput> {
    match command {
        Commands::Rank(args) => run_rank(config, args, stdin),
        Commands::Score(args) => run_score(config, &args),
        Commands::Demo => run_demo(config),
    }
}

fn apply_compressor_args(mut config: RankConfig, args: &CompressorArgs) -> RankConfig {
    if let Some(codec) = args.codec {
        config.compressor.codec = codec;
    }
    if let Some(level) = args.level {
        config.compressor.level = level;
    }
    config
}

fn run_rank(
    config: RankConfig,
    args: RankArgs,
    stdin: &mut dyn BufRead,
) -> ncdrank_core::Result<CommandOutput> {
    let mut config = apply_compressor_args(config, &args.compressor);
    if let Some(top_k) = args.top_k {
        config.top_k = top_k_from_signed(top_k);
    }
    if let Some(duplicates) = args.duplicates {
        config.duplicates = duplicates;
    }
    if let Some(threads) = args.threads {
        config.threads = threads;
    }

    let candidates = collect_candidates(&args, stdin)?;
    let ranker = config.ranker();
    let details = |results: usize| {
        json!({
            "codec": config.compressor.codec.as_str(),
            "level": config.compressor.level.get(),
            "duplicates": config.duplicates.as_str(),
            "top_k": config.top_k,
            "candidates": candidates.len(),
            "results": results,
        })
    };

    if args.detailed {
        let mut chunks = ranker.rank_detailed(&args.query, &candidates, config.top_k)?;
        if let Some(max_chars) = args.preview_chars {
            for chunk in &mut chunks {
                chunk.text = preview_text(&chunk.text, max_chars);
            }
        }
        return Ok(CommandOutput {
            details: details(chunks.len()),
            payload: serde_json::to_value(&chunks)?,
            compact: false,
        });
    }

    let ranked = ranker.rank(&args.query, &candidates, config.top_k)?;
    Ok(CommandOutput {
        details: details(ranked.len()),
        payload: serde_json::to_value(&ranked)?,
        compact: false,
    })
}

fn collect_candidates(
    args: &RankArgs,
    stdin: &mut dyn BufRead,
) -> ncdrank_core::Result<Vec<String>> {
    let mut candidates = args.candidates.clone();
    if let Some(path) = args.candidates_file.as_deref() {
        candidates.extend(load_candidate_file(path)?);
    }
    if args.stdin {
        for line in stdin.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                candidates.push(line);
            }
        }
    }
    Ok(candidates)
}

fn load_candidate_file(path: &Path) -> ncdrank_core::Result<Vec<String>> {
    let outcome = load_candidates(path)?;
    if outcome.skipped_lines > 0 {
        tracing::warn!(
            path = %path.display(),
            skipped = outcome.skipped_lines,
            first_error = ?outcome.first_error,
            "skipped invalid candidate lines"
        );
    }
    Ok(outcome.candidates)
}

fn run_score(config: RankConfig, args: &ScoreArgs) -> ncdrank_core::Result<CommandOutput> {
    let config = apply_compressor_args(config, &args.compressor);
    let compressor = config.compressor.build();
    let breakdown = ncd(compressor.as_ref(), &args.query, &args.candidate)?;
    Ok(CommandOutput {
        payload: serde_json::to_value(breakdown)?,
        compact: false,
        details: json!({
            "codec": config.compressor.codec.as_str(),
            "level": config.compressor.level.get(),
            "score": breakdown.score,
        }),
    })
}

fn run_demo(config: RankConfig) -> ncdrank_core::Result<CommandOutput> {
    let ranked = config
        .ranker()
        .rank(DEMO_QUERY, &DEMO_CANDIDATES, DEMO_TOP_K)?;
    if ranked.len() != DEMO_TOP_K {
        return Err(RankError::Internal(format!(
            "demo expected {DEMO_TOP_K} result, got {}",
            ranked.len()
        )));
    }
    Ok(CommandOutput {
        payload: serde_json::to_value(&ranked)?,
        compact: true,
        details: json!({
            "codec": config.compressor.codec.as_str(),
            "level": config.compressor.level.get(),
            "candidates": DEMO_CANDIDATES.len(),
            "results": ranked.len(),
        }),
    })
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! rxreorder-sim - Trace player for the receive reorder engine
//!
//! Replays a JSON-lines trace of block-ack session events, MPDU arrivals and
//! release/flush indications, and prints every in-order delivery. Hole timers
//! run with the configured `hole_timeout_ms`; a `tick` op advances them.

mod trace;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use rxreorder::{FrameChain, PeerId, ReorderConfig, ReorderEngine, Tid};
use serde::Serialize;

/// Receive reorder trace player
#[derive(Parser, Debug)]
#[command(name = "rxreorder-sim")]
#[command(version)]
#[command(about = "Replay a receive-path trace through the reorder engine")]
struct Args {
    /// JSON-lines trace file ("-" for stdin)
    #[arg(short, long, value_name = "FILE", default_value = "-")]
    trace: String,

    /// JSON reorder configuration
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Emit deliveries and final counters as JSON lines
    #[arg(long)]
    json: bool,

    /// Log filter (trace, debug, info, warn, error, or env_logger syntax)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Serialize)]
struct DeliveryRecord {
    peer: u16,
    tid: String,
    seqs: Vec<u16>,
    bytes: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .parse_filters(&args.log_level)
        .init();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ReorderConfig::default(),
    };
    log::info!("config: {:?}", config);

    let input: Box<dyn BufRead> = if args.trace == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(&args.trace)
            .with_context(|| format!("opening trace {}", args.trace))?;
        Box::new(BufReader::new(file))
    };

    let json = args.json;
    let sink = move |peer: PeerId, tid: Tid, chain: FrameChain| {
        print_delivery(json, peer, tid, &chain);
    };
    let mut engine = ReorderEngine::with_deadline_timers(config, sink);

    let mut ops = 0usize;
    for (idx, line) in input.lines().enumerate() {
        let line = line.context("reading trace")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let op: trace::TraceOp = serde_json::from_str(line)
            .with_context(|| format!("line {}: invalid operation", idx + 1))?;
        trace::apply(&mut engine, op).with_context(|| format!("line {}", idx + 1))?;
        engine.poll_timeouts(Instant::now());
        ops += 1;
    }

    let snapshot = engine.metrics().snapshot();
    if json {
        println!("{}", serde_json::to_string(&snapshot)?);
    } else {
        println!("--- {} operations ---", ops);
        println!("stored:     {}", snapshot.mpdus_stored);
        println!("delivered:  {}", snapshot.frames_delivered);
        println!("discarded:  {}", snapshot.frames_discarded);
        println!("duplicates: {}", snapshot.duplicates);
        println!("replays:    {}", snapshot.replays);
        println!("pn fails:   {}", snapshot.pn_failures);
        println!("timeouts:   {}", snapshot.hole_timeouts);
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<ReorderConfig> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn print_delivery(json: bool, peer: PeerId, tid: Tid, chain: &FrameChain) {
    let seqs: Vec<u16> = chain.seq_nums().collect();
    if !json {
        let list: Vec<String> = seqs.iter().map(u16::to_string).collect();
        println!("{} {} {}", peer, tid, list.join(" "));
        return;
    }

    let record = DeliveryRecord {
        peer: peer.0,
        tid: tid.to_string(),
        seqs,
        bytes: chain.byte_len(),
    };
    match serde_json::to_string(&record) {
        Ok(line) => println!("{}", line),
        Err(e) => log::error!("failed to encode delivery: {}", e),
    }
}

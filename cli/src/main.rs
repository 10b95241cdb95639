//! chainvote CLI — inspect a voting application from the terminal.
//!
//! Usage:
//! ```bash
//! # Decoded global state (Creator, ElectionEnd, VoteOptions, tallies…)
//! chainvote global --url https://testnet-api.algonode.cloud --app-id 123456
//!
//! # Typed election summary
//! chainvote summary --url https://testnet-api.algonode.cloud --app-id 123456
//!
//! # Local state of one or more accounts
//! chainvote local --app-id 123456 --address ADDR1 --address ADDR2
//!
//! # Node status
//! chainvote status --config algod.json
//! ```

mod logging;

use std::collections::BTreeMap;
use std::env;
use std::process;
use std::sync::Arc;

use chainvote_core::client::NodeClient;
use chainvote_core::{ElectionClient, VoterStatus};
use chainvote_http::{AlgodConfig, AlgodHttpClient};

use logging::{init_tracing, LogConfig};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let rest = &args[2..];
    init_tracing(&log_config(rest));
    tracing::debug!(command = %args[1], "starting");

    let result = match args[1].as_str() {
        "global" => cmd_global(rest).await,
        "summary" => cmd_summary(rest).await,
        "local" => cmd_local(rest).await,
        "status" => cmd_status(rest).await,
        "version" | "--version" | "-V" => {
            println!("chainvote {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("chainvote {}", env!("CARGO_PKG_VERSION"));
    println!("Inspect a voting application's on-chain state\n");
    println!("USAGE:");
    println!("    chainvote <COMMAND> [FLAGS]\n");
    println!("COMMANDS:");
    println!("    global     Print decoded global state");
    println!("    summary    Print election summary (options, tallies, leader)");
    println!("    local      Print decoded local state per account");
    println!("    status     Print node status");
    println!("    version    Print version");
    println!("    help       Print this help\n");
    println!("FLAGS:");
    println!("    --url <URL>          algod endpoint (default http://localhost:4001)");
    println!("    --config <FILE>      JSON connection config");
    println!("    --token <TOKEN>      API token (falls back to $ALGOD_TOKEN)");
    println!("    --app-id <ID>        Application ID  [global, summary, local]");
    println!("    --address <ADDR>     Account address, repeatable  [local]");
    println!("    --log-level <LEVEL>  trace | debug | info | warn | error");
    println!("    --log <CRATE=LEVEL>  Per-crate level override, repeatable");
    println!("    --json-logs          Emit logs as JSON on stderr");
}

fn log_config(args: &[String]) -> LogConfig {
    let mut config = LogConfig::default();
    if let Some(level) = parse_flag(args, "--log-level") {
        config.level = level;
    }
    for directive in parse_flags(args, "--log") {
        match directive.split_once('=') {
            Some((component, level)) => {
                config.components.insert(component.to_string(), level.to_string());
            }
            None => eprintln!("Ignoring --log {directive}: expected CRATE=LEVEL"),
        }
    }
    config.json = has_flag(args, "--json-logs");
    config
}

fn algod_config(args: &[String]) -> Result<AlgodConfig, String> {
    let mut config = match parse_flag(args, "--config") {
        Some(path) => AlgodConfig::from_file(&path).map_err(|e| e.to_string())?,
        None => AlgodConfig::default(),
    };
    if let Some(url) = parse_flag(args, "--url") {
        config.url = url;
    }
    if let Some(token) = parse_flag(args, "--token") {
        config.token = token;
    }
    Ok(config.with_env_token())
}

fn election_client(args: &[String]) -> Result<ElectionClient, String> {
    let app_id = parse_flag(args, "--app-id")
        .ok_or("--app-id is required")?
        .parse::<u64>()
        .map_err(|e| format!("invalid --app-id: {e}"))?;
    let node = AlgodHttpClient::new(algod_config(args)?).map_err(|e| e.to_string())?;
    Ok(ElectionClient::new(app_id, Arc::new(node)))
}

async fn cmd_global(args: &[String]) -> Result<(), String> {
    let client = election_client(args)?;
    let state = client.election_state().await.map_err(|e| e.to_string())?;
    // Sorted for stable output.
    let sorted: BTreeMap<_, _> = state.into_iter().collect();
    print_json(&sorted)
}

async fn cmd_summary(args: &[String]) -> Result<(), String> {
    let client = election_client(args)?;
    let summary = client.election_summary().await.map_err(|e| e.to_string())?;
    let leader = summary
        .leader()
        .and_then(|(i, votes)| summary.options.get(i).map(|name| (name.clone(), votes)));
    print_json(&serde_json::json!({
        "summary": summary,
        "leader": leader,
    }))
}

async fn cmd_local(args: &[String]) -> Result<(), String> {
    let addresses = parse_flags(args, "--address");
    if addresses.is_empty() {
        return Err("at least one --address is required".into());
    }
    let client = election_client(args)?;
    let states = client.local_states(&addresses).await;

    let mut out = BTreeMap::new();
    for (addr, state) in states {
        let status = VoterStatus::from_state(&state);
        let sorted: BTreeMap<_, _> = state.into_iter().collect();
        out.insert(addr, serde_json::json!({ "state": sorted, "status": status }));
    }
    print_json(&out)
}

async fn cmd_status(args: &[String]) -> Result<(), String> {
    let config = algod_config(args)?;
    let node = AlgodHttpClient::new(config).map_err(|e| e.to_string())?;

    let start = std::time::Instant::now();
    let status = node.status().await.map_err(|e| e.to_string())?;
    let latency = start.elapsed();

    println!("  Node:       {}", node.url());
    println!("  Last round: {}", status.last_round);
    println!("  Latency:    {}ms", latency.as_millis());
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let out = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{out}");
    Ok(())
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1).cloned()
}

fn parse_flags(args: &[String], flag: &str) -> Vec<String> {
    args.windows(2)
        .filter(|w| w[0] == flag)
        .map(|w| w[1].clone())
        .collect()
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

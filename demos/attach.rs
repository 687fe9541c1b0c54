//! Attach to a DevTools endpoint and watch the debugger.
//!
//! Demonstrates:
//! - Connecting and waiting for the handshake event
//! - Evaluating an expression through the Runtime domain
//! - Streaming `Debugger.paused` events
//! - Console messages through a plain handler
//!
//! Usage:
//!   cargo run --example attach -- ws://127.0.0.1:9229/session
//!   cargo run --example attach -- ws://127.0.0.1:9229/session --debug
//!   cargo run --example attach -- ws://127.0.0.1:9229/session --handshake Runtime.executionContextCreated

// ============================================================================
// Imports
// ============================================================================

use devtools_mux::domain::{EvaluateOptions, PauseOnExceptions};
use devtools_mux::{Controllers, ParsedEvent, Result, TransportConfig};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_URL: &str = "ws://127.0.0.1:9229/session";

// ============================================================================
// Args
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Clone)]
struct Args {
    url: String,
    debug: bool,
    handshake: Option<String>,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();

        let handshake = args
            .iter()
            .position(|a| a == "--handshake")
            .and_then(|i| args.get(i + 1))
            .cloned();

        let url = args
            .iter()
            .find(|a| a.starts_with("ws://") || a.starts_with("wss://"))
            .cloned()
            .unwrap_or_else(|| DEFAULT_URL.to_string());

        Self {
            url,
            debug: args.iter().any(|a| a == "--debug"),
            handshake,
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "devtools_mux=trace"
    } else {
        "devtools_mux=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== attach: {} ===\n", args.url);

    let mut config = TransportConfig::new();
    if let Some(event) = args.handshake {
        config = config.with_handshake_event(event);
    }

    // ========================================================================
    // Setup
    // ========================================================================

    println!("[Setup] Connecting...");
    let controllers = Controllers::connect(&args.url, config).await?;
    controllers.wait_ready().await?;
    println!("        ✓ Ready\n");

    let domains = controllers.schema().get_domains().await?;
    let names: Vec<&str> = domains.domains.iter().map(|d| d.name.as_str()).collect();
    println!("[Schema] Peer domains: {}\n", names.join(", "));

    // ========================================================================
    // Console
    // ========================================================================

    controllers.console().on_parsed("messageAdded", |event| {
        if let ParsedEvent::ConsoleMessageAdded { level, text } = event {
            println!("    [console.{level}] {text}");
        }
    });
    controllers.console().enable().await?;

    // ========================================================================
    // Runtime
    // ========================================================================

    controllers.runtime().enable().await?;
    let result = controllers
        .runtime()
        .evaluate("navigator.userAgent ?? process.version", &EvaluateOptions::new().return_by_value(true))
        .await?;
    match result.exception_details {
        Some(details) => println!("[Runtime] Evaluation threw: {}\n", details.text),
        None => println!("[Runtime] Peer says: {:?}\n", result.result.value),
    }

    // ========================================================================
    // Debugger
    // ========================================================================

    let debugger = controllers.debugger();
    let mut paused = debugger.events("paused");
    debugger.enable().await?;
    debugger
        .set_pause_on_exceptions(PauseOnExceptions::Uncaught)
        .await?;

    println!("[Debugger] Waiting for pauses (Ctrl+C to exit)...");

    loop {
        tokio::select! {
            event = paused.recv() => {
                let Some(params) = event else {
                    break;
                };
                let reason = params["reason"].as_str().unwrap_or("unknown");
                let frames = params["callFrames"].as_array().map_or(0, Vec::len);
                println!("    paused: {reason} ({frames} frames), resuming");
                debugger.resume().await?;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    controllers.transport().close().await;
    println!("\n=== Done ===");
    Ok(())
}

//! confab - streaming terminal chat client for a multi-provider gateway

mod commands;
mod config;
mod ui;

use clap::Parser;
use std::sync::Arc;

use confab_chat::{Chat, ChatEvent};
use confab_gateway::{GatewayClient, Provider};

/// Gateway used when neither the CLI flag nor the config file names one
pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:8080";

/// confab - chat with free text-generation providers through one gateway
#[derive(Parser, Debug)]
#[command(name = "confab")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Gateway base URL
    #[arg(short, long)]
    gateway: Option<String>,

    /// Provider (ava, bai, deepai, you)
    #[arg(short, long)]
    provider: Option<String>,

    /// Run in non-interactive mode with a single prompt
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("confab=debug")
            .init();
    }

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // Load config file
    let cfg = config::Config::load();

    // Merge config with CLI args (CLI takes precedence)
    let gateway_url = args
        .gateway
        .or(cfg.gateway_url.clone())
        .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string());

    let provider_id = args
        .provider
        .or(cfg.provider.clone())
        .unwrap_or_else(|| "deepai".to_string());

    let Some(provider) = Provider::from_id(&provider_id) else {
        eprintln!("Error: unknown provider '{}'", provider_id);
        eprintln!();
        eprintln!("Available providers:");
        for p in Provider::ALL {
            eprintln!("  {:<8} {}", p.id(), p.label());
        }
        std::process::exit(1);
    };

    let gateway = Arc::new(GatewayClient::new(gateway_url));
    let mut chat = Chat::new(provider, gateway);

    // Non-interactive mode
    if let Some(prompt) = args.command {
        return run_command(&mut chat, &prompt).await;
    }

    ui::run_tui(&mut chat).await
}

/// Stream a single prompt's response to stdout, without markup.
async fn run_command(chat: &mut Chat, prompt: &str) -> anyhow::Result<()> {
    use std::io::{self, Write};

    let mut receiver = chat.subscribe();

    // Print deltas as the buffer grows; the buffer itself is cumulative.
    let printer = tokio::spawn(async move {
        let mut printed = 0usize;
        while let Ok(event) = receiver.recv().await {
            match event {
                ChatEvent::Rendered { text, .. } => {
                    let chars: Vec<char> = text.chars().collect();
                    if chars.len() > printed {
                        let delta: String = chars[printed..].iter().collect();
                        print!("{}", delta);
                        io::stdout().flush().ok();
                        printed = chars.len();
                    }
                }
                ChatEvent::StreamEnd { .. } | ChatEvent::Cancelled { .. } => {
                    println!();
                    break;
                }
                ChatEvent::Error { message } => {
                    eprintln!("Error: {}", message);
                    break;
                }
                ChatEvent::StreamStart => {}
            }
        }
    });

    chat.submit(prompt).await?;
    printer.await?;

    Ok(())
}

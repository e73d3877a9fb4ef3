//! Interactive command-line front end: type a query, see which mode the
//! agent picks and what it answers.

use std::io::{self, BufRead, Write};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use modeswitch::{AgentConfig, Dispatcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("modeswitch=info")),
        )
        .init();

    let config = AgentConfig::from_env().context("loading configuration")?;
    let dispatcher = Dispatcher::from_config(&config);

    println!("modeswitch interactive agent");
    println!("Type a query, or 'quit' to exit.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if matches!(query, "quit" | "exit") {
            break;
        }

        match dispatcher.handle(query).await {
            Ok(response) => {
                println!();
                println!("mode:    {}", response.mode);
                println!("latency: {}ms", response.latency_ms);
                println!("answer:  {}", response.answer);
                if !response.metadata.is_empty() {
                    println!(
                        "metadata: {}",
                        serde_json::to_string_pretty(&response.metadata)?
                    );
                }
                println!();
            }
            Err(e) => eprintln!("error: {e}"),
        }
    }

    Ok(())
}

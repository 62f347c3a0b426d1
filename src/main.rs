use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use project_context::{mcp, store};

#[derive(Parser)]
#[command(name = "project-context")]
#[command(about = "Persistent project knowledge store for AI-assisted development")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server via stdio (for AI assistant integration)
    Mcp,
    /// Print the location of the store file
    Path,
}

/// Initialize tracing with output to stderr - stdout is the MCP protocol channel
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "project_context=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Path) => {
            let store = store::Store::open_default()?;
            println!("{}", store.path().display());
        }
        Some(Commands::Mcp) | None => {
            let store = store::Store::open_default()?;
            mcp::run_stdio_server(store).await?;
        }
    }

    Ok(())
}

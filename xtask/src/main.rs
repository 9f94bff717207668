//! See <https://github.com/matklad/cargo-xtask/>
//!
//! This binary defines auxiliary build commands, which are not expressible
//! with just `cargo`.
//!
//! The binary is integrated into the `cargo` command line by using an
//! alias in `.cargo/config`.

use clap::Parser;

mod integration;
mod prelude;

/// Development tasks for the cachebound repository
#[derive(Debug, Parser)]
#[command(name = "xtask")]
#[command(about = "Development tasks for cachebound", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: Global,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Silence the command output
    #[clap(long, global = true)]
    pub silent: bool,
}

impl Global {
    pub fn is_silent(&self) -> bool {
        self.silent
    }
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Run the test suite across backend feature combinations
    Integration(integration::IntegrationCommand),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Integration(integration_cmd) => {
            integration::run(integration_cmd, cli.global).await?;
        }
    }

    Ok(())
}

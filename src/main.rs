use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use nuget_tools::config::ToolsConfig;
use nuget_tools::tools::frameworks::StaticFrameworkList;
use nuget_tools::tools::packages::LocalPackageStore;
use nuget_tools::tools::{DirectToolsFactory, ToolsFactory};

#[derive(Parser)]
#[command(name = "nuget-tools")]
#[command(version, about = "Evaluate NuGet version and framework logic across NuGet releases")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root of the downloaded package tree
    #[arg(long, global = true)]
    packages_dir: Option<PathBuf>,

    /// Emit JSON log lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP surface (default)
    Serve {
        /// Socket address to bind
        #[arg(long)]
        listen: Option<String>,
    },
    /// Print the available releases, newest first
    Versions,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ToolsConfig::load(cli.config.as_deref())?;
    if let Some(packages_dir) = cli.packages_dir {
        config.packages_dir = Some(packages_dir);
    }
    if cli.json_logs {
        config.log.json = true;
    }
    if let Some(Command::Serve {
        listen: Some(listen),
    }) = &cli.command
    {
        config.listen = listen.clone();
    }

    let _guard = nuget_tools::logging::init(&config.log)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli.command, config))
}

async fn run(command: Option<Command>, config: ToolsConfig) -> anyhow::Result<()> {
    let packages_dir = config.packages_dir();
    info!("Using packages from {}", packages_dir.display());

    let store = Arc::new(LocalPackageStore::new(packages_dir));
    let frameworks = match config.frameworks.clone() {
        Some(frameworks) => StaticFrameworkList::new(frameworks),
        None => StaticFrameworkList::default(),
    };
    let factory: Arc<dyn ToolsFactory> = Arc::new(DirectToolsFactory::new(
        store.clone(),
        store,
        Arc::new(frameworks),
    ));

    match command {
        Some(Command::Versions) => {
            for version in factory.available_versions().await? {
                println!("{}", version);
            }
            Ok(())
        }
        Some(Command::Serve { .. }) | None => {
            nuget_tools::web::serve(&config.listen, factory).await?;
            Ok(())
        }
    }
}

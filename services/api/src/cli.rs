use crate::infra::preview;
use crate::server;
use clap::{Args, Parser, Subcommand};
use request_intake::catalog::Catalog;
use request_intake::config::AppConfig;
use request_intake::error::AppError;
use request_intake::request_types::RequestTypeId;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "Request Intake",
    about = "Serve request type definitions and resolve their inherited properties",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print one request type from a catalog file, optionally with inherited properties
    Resolve(ResolveArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Seed the in-memory store from a JSON catalog
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ResolveArgs {
    /// JSON catalog of request type definitions
    #[arg(long)]
    pub(crate) catalog: PathBuf,
    /// Id of the request type to print
    #[arg(long)]
    pub(crate) id: RequestTypeId,
    /// Merge in the properties of every ancestor
    #[arg(long)]
    pub(crate) expand: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Resolve(args) => run_resolve(args),
    }
}

pub(crate) fn read_catalog(path: &Path) -> Result<Catalog, AppError> {
    let file = File::open(path)?;
    Ok(Catalog::from_reader(BufReader::new(file))?)
}

fn run_resolve(args: ResolveArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let catalog = read_catalog(&args.catalog)?;
    let rendered = preview(catalog, &args.id, args.expand, &config.intake)?;

    let pretty = serde_json::to_string_pretty(&rendered).map_err(std::io::Error::from)?;
    println!("{pretty}");
    Ok(())
}

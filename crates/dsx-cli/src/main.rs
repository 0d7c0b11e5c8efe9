mod commands;
mod opts;
mod output;
mod util;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::databases::DatabasesArgs;
use commands::delete::{DeleteArgs, DeleteKindArgs};
use commands::entities::{EntitiesArgs, GetArgs};
use commands::export::ExportArgs;
use commands::kinds::KindsArgs;
use commands::namespaces::NamespacesArgs;
use opts::EmulatorOpts;

#[derive(Parser, Debug)]
#[command(name = "dsx", version, about = "Browse and edit an entity-store emulator")]
struct Cli {
    #[command(flatten)]
    opts: EmulatorOpts,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the emulator answers
    Ping,

    /// List namespaces
    Namespaces(NamespacesArgs),

    /// List kinds in a namespace
    Kinds(KindsArgs),

    /// List database ids seen in a namespace
    Databases(DatabasesArgs),

    /// List one page of entities of a kind
    Entities(EntitiesArgs),

    /// Fetch a single entity
    Get(GetArgs),

    /// Delete a single entity
    Delete(DeleteArgs),

    /// Delete every entity of a kind
    DeleteKind(DeleteKindArgs),

    /// Export namespaces, kinds and entities as one JSON document
    Export(ExportArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    util::load_dotenv()?;
    let cli = Cli::parse();
    util::setup_logging();
    let opts = &cli.opts;

    match &cli.command {
        Command::Ping => commands::ping::cmd_ping(opts).await,
        Command::Namespaces(args) => commands::namespaces::cmd_namespaces(opts, args).await,
        Command::Kinds(args) => commands::kinds::cmd_kinds(opts, args).await,
        Command::Databases(args) => commands::databases::cmd_databases(opts, args).await,
        Command::Entities(args) => commands::entities::cmd_entities(opts, args).await,
        Command::Get(args) => commands::entities::cmd_get(opts, args).await,
        Command::Delete(args) => commands::delete::cmd_delete(opts, args).await,
        Command::DeleteKind(args) => commands::delete::cmd_delete_kind(opts, args).await,
        Command::Export(args) => commands::export::cmd_export(opts, args).await,
    }
}

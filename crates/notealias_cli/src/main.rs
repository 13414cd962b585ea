//! CLI probe for the identity core.
//!
//! # Responsibility
//! - Verify `notealias_core` linkage with deterministic ping/version output.
//! - Mint public ids and resolve names against the configured store.

use clap::{Parser, Subcommand};
use log::info;
use notealias_core::{
    generate_public_id, init_logging_from_config, open_db, CoreConfig, DocumentService,
    SqliteDocumentRepository,
};
use std::error::Error;

#[derive(Parser, Debug)]
#[command(name = "notealias")]
#[command(about = "Note identity and alias probe")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a freshly generated public id
    NewId,
    /// Resolve a public id or alias against NOTEALIAS_DB_PATH
    Resolve {
        #[arg(value_name = "ID_OR_ALIAS")]
        id_or_alias: String,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = CoreConfig::from_env();
    init_logging_from_config(&config)?;

    match cli.command {
        None => {
            println!("notealias_core ping={}", notealias_core::ping());
            println!("notealias_core version={}", notealias_core::core_version());
        }
        Some(Command::NewId) => println!("{}", generate_public_id()),
        Some(Command::Resolve { id_or_alias }) => {
            let db_path = config
                .db_path
                .as_deref()
                .ok_or("NOTEALIAS_DB_PATH is not set")?;
            let conn = open_db(db_path)?;
            let service = DocumentService::new(
                SqliteDocumentRepository::try_new(&conn)?,
                config.reserved_names(),
            );
            let document = service.resolve(&id_or_alias)?;
            info!(
                "event=cli_resolve module=cli status=ok public_id={}",
                document.public_id
            );
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
    }

    Ok(())
}

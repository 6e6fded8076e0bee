pub mod aliases;
pub mod cli;
pub mod error;
pub mod import;
pub mod io_utils;
pub mod map_cmd;
pub mod matcher;
pub mod merge;
pub mod partition;
pub mod preview;
pub mod sheet;
pub mod sqlite;
pub mod store;
pub mod table;
pub mod transform;
pub mod validate;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("sheet_merge", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Import(args) => import::execute(&args),
        Commands::Map(args) => map_cmd::execute(&args),
        Commands::Preview(args) => preview::execute(&args),
    }
}

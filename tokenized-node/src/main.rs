//! Tokenized holdings node.
//!
//! Owns the holdings cache, its writer thread and the vote store on top of
//! one RocksDB database, and offers read-only inspection commands.

mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossbeam::channel::RecvTimeoutError;
use settings::NodeSettings;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokenized_db_exports::{KvStore, OPEN_ERROR};
use tokenized_db_worker::RocksStore;
use tokenized_hash::Hash20;
use tokenized_holdings_worker::{start_holdings_writer, CacheChannel, HoldingsCache};
use tokenized_models::address::Address;
use tokenized_models::config::build_tokenized_settings;
use tokenized_vote_worker::VoteStore;
use tracing::{error, info};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "tokenized-node")]
#[command(about = "Tokenized holdings ledger and vote store")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the node until interrupted (default)
    Run,
    /// Print one holding as JSON
    Holding {
        /// contract address, hex
        #[arg(long)]
        contract: String,
        /// asset code, hex
        #[arg(long)]
        asset: String,
        /// holder address, hex
        #[arg(long)]
        address: String,
    },
    /// Print every holding of an asset as JSON
    Holdings {
        #[arg(long)]
        contract: String,
        #[arg(long)]
        asset: String,
    },
    /// Print every vote of a contract as JSON
    Votes {
        #[arg(long)]
        contract: String,
    },
}

/// Services sharing the node database
struct Node {
    cache: Arc<HoldingsCache>,
    channel: Arc<CacheChannel>,
    votes: VoteStore,
}

impl Node {
    fn new(settings: &NodeSettings) -> Result<Self> {
        let store: Arc<dyn KvStore> =
            Arc::new(RocksStore::new(settings.db_config()).expect(OPEN_ERROR));
        let holdings_config = settings.holdings_config();
        Ok(Node {
            cache: Arc::new(HoldingsCache::new(store.clone(), &holdings_config)),
            channel: Arc::new(
                CacheChannel::new(&holdings_config).context("creating the holdings channel")?,
            ),
            votes: VoteStore::new(store, settings.vote_config()),
        })
    }
}

fn parse_address(value: &str) -> Result<Address> {
    Address::from_str(value).with_context(|| format!("invalid address {}", value))
}

fn parse_asset(value: &str) -> Result<Hash20> {
    Hash20::from_str(value).with_context(|| format!("invalid asset code {}", value))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// How often `run` checks that the writer is still alive
const WRITER_CHECK_INTERVAL: Duration = Duration::from_millis(500);

fn run(node: Node) -> Result<()> {
    let mut writer = start_holdings_writer(node.cache.clone(), node.channel.clone());

    let (stop_sender, stop_receiver) = crossbeam::channel::bounded(1);
    ctrlc::set_handler(move || {
        let _ = stop_sender.try_send(());
    })
    .context("installing the interrupt handler")?;

    info!("Node started, press ctrl-c to stop");
    loop {
        match stop_receiver.recv_timeout(WRITER_CHECK_INTERVAL) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                info!("Stop signal received");
                break;
            }
            Err(RecvTimeoutError::Timeout) if !writer.is_running() => {
                error!("Holdings writer exited, stopping the node");
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }
    }

    let writer_result = writer.stop();
    // items the writer could not handle are still marked modified
    let flush_result = node.cache.write_cache();
    writer_result.context("holdings writer failed")?;
    flush_result.context("writing the holdings cache")?;
    info!("Node stopped");
    Ok(())
}

fn main() -> Result<()> {
    let settings: NodeSettings = build_tokenized_settings("tokenized-node", "TOKENIZED")
        .context("loading the node settings")?;

    let tracing_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(settings.logging.level_filter());
    tracing_subscriber::registry().with(tracing_layer).init();

    let args = Args::parse();
    let node = Node::new(&settings)?;
    match args.command.unwrap_or(Command::Run) {
        Command::Run => run(node),
        Command::Holding {
            contract,
            asset,
            address,
        } => {
            let holding = node.cache.fetch(
                &parse_address(&contract)?,
                &parse_asset(&asset)?,
                &parse_address(&address)?,
            )?;
            print_json(&holding)
        }
        Command::Holdings { contract, asset } => {
            let holdings = node
                .cache
                .fetch_all(&parse_address(&contract)?, &parse_asset(&asset)?)?;
            print_json(&holdings)
        }
        Command::Votes { contract } => {
            let votes = node.votes.list(&parse_address(&contract)?)?;
            print_json(&votes)
        }
    }
}

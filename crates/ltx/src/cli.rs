use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ltx_core::{AccountId, BlockRef, HashBytes};

/// ltx: offline decoder and request packer for lite-server transaction history.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Decode a captured lite-server answer (constructor tag + payload) and
    /// print its transactions as JSON.
    Decode {
        /// File holding the raw answer bytes.
        file: PathBuf,

        /// The file holds hex text instead of raw bytes.
        #[arg(long)]
        hex: bool,
    },

    /// Encode a lite-server request and print it as hex.
    #[command(subcommand)]
    Request(RequestCommand),
}

#[derive(Subcommand)]
pub enum RequestCommand {
    /// `liteServer.getTransactions`: walk back from an anchor transaction.
    List {
        /// Account in raw `workchain:hex` form.
        #[arg(long, env = "LTX_ACCOUNT")]
        account: AccountId,

        /// Logical time of the anchor transaction.
        #[arg(long, value_parser = clap::value_parser!(u64).range(..=i64::MAX as u64))]
        lt: u64,

        /// Hash of the anchor transaction.
        #[arg(long)]
        hash: HashBytes,

        /// Maximum number of transactions to request.
        #[arg(long, default_value = "16", value_parser = clap::value_parser!(u32).range(0..=i64::from(i32::MAX)))]
        limit: u32,
    },

    /// `liteServer.getOneTransaction`: one transaction inside a known block.
    One {
        /// Block in `workchain:shard_hex:seqno:root_hex:file_hex` form.
        #[arg(long)]
        block: BlockRef,

        /// Account in raw `workchain:hex` form.
        #[arg(long, env = "LTX_ACCOUNT")]
        account: AccountId,

        /// Logical time of the transaction.
        #[arg(long, value_parser = clap::value_parser!(u64).range(..=i64::MAX as u64))]
        lt: u64,
    },
}

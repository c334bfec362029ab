mod cli;

use std::fs;
use std::path::Path;

use clap::Parser;
use eyre::WrapErr;

use ltx_core::decode::decode_any_response;
use ltx_core::rpc::{GetOneTransaction, GetTransactions, LiteRequest, RawResponse};
use ltx_core::tlb::TlbTransactionLoader;

use cli::{Command, RequestCommand};

fn main() -> eyre::Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();

    match args.command {
        Command::Decode { file, hex } => decode_file(&file, hex),
        Command::Request(request) => {
            let request = build_request(request);
            tracing::info!(
                method = request.name(),
                tag = %format!("0x{:08x}", request.tag()),
                "encoded request"
            );
            println!("{}", hex::encode(request.encode()));
            Ok(())
        }
    }
}

fn decode_file(path: &Path, is_hex: bool) -> eyre::Result<()> {
    let raw = fs::read(path).wrap_err_with(|| format!("read {}", path.display()))?;
    let bytes = if is_hex {
        let text = String::from_utf8(raw).wrap_err("hex input is not UTF-8")?;
        hex::decode(text.trim()).wrap_err("decode hex input")?
    } else {
        raw
    };

    let response = RawResponse::from_bytes(&bytes).wrap_err("split constructor tag")?;
    let decoded = decode_any_response(&response, &TlbTransactionLoader)
        .wrap_err_with(|| format!("decode answer from {}", path.display()))?;
    let records = decoded.into_records();
    tracing::info!(records = records.len(), "decoded answer");

    let json = serde_json::to_string_pretty(&records).wrap_err("serialize records")?;
    println!("{json}");
    Ok(())
}

fn build_request(command: RequestCommand) -> LiteRequest {
    match command {
        RequestCommand::List {
            account,
            lt,
            hash,
            limit,
        } => LiteRequest::GetTransactions(GetTransactions {
            limit,
            account,
            lt,
            hash,
        }),
        RequestCommand::One { block, account, lt } => {
            LiteRequest::GetOneTransaction(GetOneTransaction { block, account, lt })
        }
    }
}

//! # Hosting SSL 命令行
//!
//! 管理托管域名的 SSL 证书

use std::process::ExitCode;

use clap::Parser;
use hosting_ssl::cli::{Cli, run};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

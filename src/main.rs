mod print_help;
mod utils;

use crate::print_help::print_help;
use crate::utils::process_command;
use colored::Colorize;
use llm_sdk::LlmSdk;
use std::{env, process};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.iter().any(|arg| arg == "-help" || arg == "-h") {
        print_help();
        return Ok(());
    }

    let sdk = LlmSdk::from_env()?;

    if let Err(e) = process_command(&sdk, &args).await {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        process::exit(1);
    }
    Ok(())
}

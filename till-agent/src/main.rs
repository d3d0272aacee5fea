mod cli;
mod commands;
mod config;
mod logger;

use clap::Parser;
use till_printer::{PrintOutcome, PrinterService};

use crate::cli::{Cli, Command};
use crate::config::AgentConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = AgentConfig::from_env();
    logger::init_logger(&config.log_level, config.log_dir.as_deref());

    let service = PrinterService::system(&config.printer);
    let result = run(&service, cli.command).await;

    // Spooler commands may still be reading temp files
    service.disconnect().await;
    service.shutdown().await;

    match result? {
        Some(outcome) if !outcome.success => std::process::exit(1),
        _ => Ok(()),
    }
}

/// Dispatch one subcommand; `None` when there is no print outcome to judge
async fn run(service: &PrinterService, command: Command) -> anyhow::Result<Option<PrintOutcome>> {
    let outcome = match command {
        Command::Devices { json } => {
            let devices = commands::devices(service).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&devices)?);
            } else {
                print!("{}", commands::render_devices(&devices));
            }
            return Ok(None);
        }
        Command::Test { printer, shop } => {
            commands::test(service, &printer, shop.as_deref()).await?
        }
        Command::Receipt {
            order,
            shop,
            printer,
        } => commands::receipt(service, &order, shop.as_deref(), &printer).await?,
        Command::Kitchen {
            order,
            notes,
            printer,
        } => commands::kitchen(service, &order, notes.as_deref(), printer.as_deref()).await?,
    };

    println!("{}", serde_json::to_string(&outcome)?);
    Ok(Some(outcome))
}

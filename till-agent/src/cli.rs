use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Receipt printer agent for the till
#[derive(Debug, Parser)]
#[command(name = "till-agent", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List spooler queues and serial printers
    Devices {
        /// Print the device list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Connect and print the sample test page
    Test {
        /// Queue name or serial port
        #[arg(long, env = "TILL_PRINTER")]
        printer: String,

        /// Shop info JSON file
        #[arg(long)]
        shop: Option<PathBuf>,
    },

    /// Print a customer receipt
    Receipt {
        /// Order snapshot JSON file
        #[arg(long)]
        order: PathBuf,

        /// Shop info JSON file
        #[arg(long)]
        shop: Option<PathBuf>,

        /// Queue name or serial port
        #[arg(long, env = "TILL_PRINTER")]
        printer: String,
    },

    /// Print a kitchen ticket; always exits successfully
    Kitchen {
        /// Order snapshot JSON file
        #[arg(long)]
        order: PathBuf,

        /// Preparation notes
        #[arg(long)]
        notes: Option<String>,

        /// Queue name or serial port
        #[arg(long, env = "TILL_KITCHEN_PRINTER")]
        printer: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_kitchen() {
        let cli = Cli::try_parse_from([
            "till-agent",
            "kitchen",
            "--order",
            "order.json",
            "--notes",
            "no onions",
            "--printer",
            "COM3",
        ])
        .unwrap();

        match cli.command {
            Command::Kitchen {
                order,
                notes,
                printer,
            } => {
                assert_eq!(order, PathBuf::from("order.json"));
                assert_eq!(notes.as_deref(), Some("no onions"));
                assert_eq!(printer.as_deref(), Some("COM3"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_devices_json() {
        let cli = Cli::try_parse_from(["till-agent", "devices", "--json"]).unwrap();
        assert!(matches!(cli.command, Command::Devices { json: true }));
    }
}

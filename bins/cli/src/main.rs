//! Money Manager command line
//!
//! Evaluates amount expressions the way the amount entry screen does and
//! synchronizes the database file with remote storage.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use mmx_shared::AppError;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "mmx")]
#[command(about = "Money Manager amount entry and database sync")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate an amount expression and print the amount and its display.
    Eval(EvalArgs),
    /// Replay keypad presses and print the display after each one.
    Keys(KeysArgs),
    /// Synchronize the current database in whichever direction changed.
    Sync(TransferArgs),
    /// Upload the current database.
    Upload(TransferArgs),
    /// Download the remote database and make it current.
    Download(TransferArgs),
    /// Show the current database and sync preferences.
    Status,
    /// Synchronize periodically until interrupted.
    Watch(WatchArgs),
}

#[derive(Args, Debug)]
struct AmountArgs {
    /// Currency the amount is entered in.
    #[arg(long)]
    currency_id: Option<i64>,
    /// Keep the default precision instead of the currency scale.
    #[arg(long)]
    no_round: bool,
}

#[derive(Args, Debug)]
struct EvalArgs {
    /// Expression, e.g. "12.50*3+(4-1)".
    expression: String,
    #[command(flatten)]
    amount: AmountArgs,
}

#[derive(Args, Debug)]
struct KeysArgs {
    /// Key sequence: digits, decimal separator, + - * / ( ), C (clear),
    /// < (delete) and = (confirm).
    keys: String,
    /// Amount the entry screen opens with.
    #[arg(long)]
    initial: Option<String>,
    #[command(flatten)]
    amount: AmountArgs,
}

#[derive(Args, Debug)]
struct TransferArgs {
    /// Local database file, registered and made current.
    #[arg(long)]
    local: Option<PathBuf>,
    /// Remote file to link the current database to.
    #[arg(long)]
    remote: Option<String>,
    /// Treat the connection as metered.
    #[arg(long)]
    metered: bool,
}

#[derive(Args, Debug)]
struct WatchArgs {
    /// Heartbeat period in minutes, saved to the preferences.
    #[arg(long)]
    interval: Option<u32>,
    /// Treat the connection as metered.
    #[arg(long)]
    metered: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing, stdout is reserved for command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mmx=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match commands::run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Command failed");
            eprintln!("error: {err:#}");
            let code = err
                .downcast_ref::<AppError>()
                .map_or(1, AppError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_eval() {
        let cli = Cli::try_parse_from(["mmx", "eval", "12.5*3", "--currency-id", "2", "--no-round"])
            .unwrap();
        let Command::Eval(args) = cli.command else {
            panic!("expected eval");
        };
        assert_eq!(args.expression, "12.5*3");
        assert_eq!(args.amount.currency_id, Some(2));
        assert!(args.amount.no_round);
    }

    #[rstest]
    #[case("sync")]
    #[case("upload")]
    #[case("download")]
    fn test_parse_transfer(#[case] name: &str) {
        let cli = Cli::try_parse_from(["mmx", name, "--remote", "Apps/money.mmb", "--metered"])
            .unwrap();
        let args = match cli.command {
            Command::Sync(args) | Command::Upload(args) | Command::Download(args) => args,
            other => panic!("unexpected command {other:?}"),
        };
        assert_eq!(args.remote.as_deref(), Some("Apps/money.mmb"));
        assert!(args.local.is_none());
        assert!(args.metered);
    }

    #[test]
    fn test_parse_watch_rejects_negative_interval() {
        assert!(Cli::try_parse_from(["mmx", "watch", "--interval", "-5"]).is_err());
    }
}

use std::io::stderr;
use std::process::exit;
use std::str::FromStr;

use anyhow::{Result, bail};
use rust_decimal::Decimal;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, fmt};

use shm_bank_engine::client::BankClient;
use shm_bank_engine::models::{TransactionKind, TransactionStatus};
use shm_bank_engine::transport::TransportConfig;
use shm_bank_engine::wire::{TransactionMessage, TransferMessage};

fn usage() -> ! {
    eprintln!("Usage: bank-client deposit  <account> <amount>");
    eprintln!("       bank-client withdraw <account> <amount>");
    eprintln!("       bank-client balance  <account>");
    eprintln!("       bank-client transfer <from> <to> <amount>");
    exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();

    let args: Vec<String> = std::env::args().collect();
    let client = BankClient::new(TransportConfig::default());

    let status = match args.get(1).map(String::as_str) {
        Some("deposit") => {
            let (account, amount) = amount_args(&args)?;
            let response = client
                .send_transaction(TransactionMessage::new(TransactionKind::Deposit, account, amount))
                .await;
            println!("{}: {}", display(response.status), response.message);
            if let Some(balance) = response.new_balance {
                println!("New balance: {balance}");
            }
            response.status
        }
        Some("withdraw") => {
            let (account, amount) = amount_args(&args)?;
            let response = client
                .send_transaction(TransactionMessage::new(TransactionKind::Withdraw, account, amount))
                .await;
            println!("{}: {}", display(response.status), response.message);
            if let Some(balance) = response.new_balance {
                println!("New balance: {balance}");
            }
            response.status
        }
        Some("balance") => {
            let Some(account) = args.get(2) else { usage() };
            let response = client
                .send_transaction(TransactionMessage::new(
                    TransactionKind::CheckBalance,
                    account.clone(),
                    Decimal::ZERO
                ))
                .await;
            println!("{}: {}", display(response.status), response.message);
            if let Some(balance) = response.new_balance {
                println!("Balance: {balance}");
            }
            for entry in &response.history {
                println!(
                    "  {} {:?} {} -> {} ({:?})",
                    entry.timestamp, entry.kind, entry.amount, entry.balance_after, entry.status
                );
            }
            response.status
        }
        Some("transfer") => {
            let (Some(from), Some(to), Some(amount)) = (args.get(2), args.get(3), args.get(4)) else {
                usage()
            };
            let amount = parse_amount(amount)?;
            let response = client
                .send_transfer(TransferMessage::new(from.clone(), to.clone(), amount))
                .await;
            println!("{}: {}", display(response.status), response.message);
            if let (Some(from_balance), Some(to_balance)) =
                (response.from_account_new_balance, response.to_account_new_balance)
            {
                println!("From balance: {from_balance}");
                println!("To balance:   {to_balance}");
            }
            response.status
        }
        _ => usage()
    };

    if status == TransactionStatus::ServerError {
        exit(2);
    }

    Ok(())
}

fn amount_args(args: &[String]) -> Result<(String, Decimal)> {
    let (Some(account), Some(amount)) = (args.get(2), args.get(3)) else {
        usage()
    };
    Ok((account.clone(), parse_amount(amount)?))
}

fn parse_amount(value: &str) -> Result<Decimal> {
    match Decimal::from_str(value) {
        Ok(amount) => Ok(amount),
        Err(_) => bail!("'{value}' is not a valid amount")
    }
}

fn display(status: TransactionStatus) -> String {
    format!("{status:?}")
}

fn setup_logging() {
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(LevelFilter::WARN);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

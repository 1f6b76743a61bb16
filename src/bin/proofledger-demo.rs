#![forbid(unsafe_code)]
use clap::Parser;
use colored::*;
use proofledger::authority::IssuingAuthority;
use proofledger::config::load_config;
use proofledger::digest::hash_to_hex;
use proofledger::logging::init_tracing;
use proofledger::registry::{User, UserRegistry};
use proofledger::wallet::Wallet;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about = "Replay a sample session against a fresh ledger", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, default_value = "proofledger.toml")]
    config: PathBuf,
    /// Override the genesis supply
    #[arg(long)]
    supply: Option<u64>,
    /// Override the log filter (RUST_LOG still wins)
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    if let Some(supply) = cli.supply {
        config.ledger.initial_supply = supply;
    }
    if let Some(filter) = cli.log {
        config.logging.filter = filter;
    }
    init_tracing(&config.logging.filter);

    println!("{}", "ProofLedger demo".bright_cyan().bold());
    let (authority, master) = IssuingAuthority::bootstrap(&config)?;
    let users = UserRegistry::new();
    register(&users, "master", &master)?;

    let mut wallets = Vec::new();
    for (name, deposit) in [
        ("guinetik", 100),
        ("alice", 0),
        ("chad", 0),
        ("janice", 250),
        ("phillip", 500),
        ("beatrix", 10),
    ] {
        let wallet = authority.create_wallet(deposit).await?;
        register(&users, name, &wallet)?;
        println!(
            "  {} {:<10} {} (deposit {})",
            "+".green(),
            name,
            wallet.fingerprint(),
            deposit
        );
        wallets.push(wallet);
    }
    let wallets: [Wallet; 6] = wallets
        .try_into()
        .map_err(|_| "expected six demo wallets")?;
    let [gui, alice, chad, janice, _phillip, beatrix] = wallets;

    println!("\n{}", "Transfers".bright_cyan().bold());
    transfer(&authority, &users, &gui, 10, &alice).await;
    transfer(&authority, &users, &gui, 25, &chad).await;
    transfer(&authority, &users, &gui, 10, &chad).await;
    transfer(&authority, &users, &gui, 100, &beatrix).await;
    transfer(&authority, &users, &janice, 10, &alice).await;
    transfer(&authority, &users, &janice, 50, &chad).await;

    println!("\n{}", "Balances".bright_cyan().bold());
    for (fingerprint, balance) in authority.balances() {
        let name = users.label(&fingerprint.to_hex());
        println!("  {:<10} {:>6}", name, balance);
    }
    println!("  {:<10} {:>6}", "total".bold(), authority.total_supply());

    authority.validate()?;
    println!(
        "\n{} {} blocks, chain valid",
        "✓".green().bold(),
        authority.chain_len()
    );

    println!("\n{}", "All transactions".bright_cyan().bold());
    let records = users.map_transactions(authority.all_transactions()?);
    println!("{}", serde_json::to_string_pretty(&records)?);

    Ok(())
}

fn register(users: &UserRegistry, name: &str, wallet: &Wallet) -> proofledger::Result<()> {
    users.create(User::new(name, wallet.public_key())?)?;
    Ok(())
}

async fn transfer(
    authority: &Arc<IssuingAuthority>,
    users: &UserRegistry,
    from: &Wallet,
    amount: u64,
    to: &Wallet,
) {
    let from_name = users.label(&from.fingerprint().to_hex());
    let to_name = users.label(&to.fingerprint().to_hex());

    match from.send_money(amount, &to.public_key()).await {
        Ok(tx_hash) => {
            let status = authority
                .transaction_status(&tx_hash)
                .map_or_else(|| "UNKNOWN".to_string(), |s| s.to_string());
            println!(
                "  {} → {} {:>4}  {}  {}",
                from_name,
                to_name,
                amount,
                status.green(),
                &hash_to_hex(&tx_hash)[..16]
            );
        }
        Err(e) => {
            println!(
                "  {} → {} {:>4}  {}",
                from_name,
                to_name,
                amount,
                e.to_string().red()
            );
        }
    }
}

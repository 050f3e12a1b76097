use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use powledger_core::{
    constants::{DEFAULT_DIFFICULTY, DEFAULT_MINING_REWARD},
    Address, Chain, ChainConfig, KeyPair, Secp256k1Signer, Transaction,
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const DEMO_PRIVATE_KEY: &str = "5d883a182fa8b41dcb5125f2a2f4a759a8da09ceac97469fc6b40e2a6c162766";

#[derive(Parser, Debug)]
#[command(name = "powledger")]
#[command(about = "Proof-of-work ledger with signed transfers")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a secp256k1 keypair and print address and private key
    Keygen,
    /// Print the address belonging to a private key
    Address {
        /// Hex-encoded private key
        #[arg(long)]
        private_key: String,
    },
    /// Sign a transfer, mine it, and report balances and validity
    Demo(DemoArgs),
}

#[derive(Args, Debug)]
struct DemoArgs {
    /// Hex-encoded private key of the sender (also the miner)
    #[arg(long, default_value = DEMO_PRIVATE_KEY)]
    private_key: String,
    /// Recipient address
    #[arg(long, default_value = "public key goes here")]
    recipient: String,
    /// Amount to transfer
    #[arg(long, default_value_t = 10)]
    amount: u64,
    /// Leading zero hex digits required of each block hash
    #[arg(long, default_value_t = DEFAULT_DIFFICULTY)]
    difficulty: u32,
    /// Reward paid to the miner of each block
    #[arg(long, default_value_t = DEFAULT_MINING_REWARD)]
    reward: u64,
    /// Search nonces on all cores
    #[arg(long)]
    parallel: bool,
    /// Rewrite a sealed amount before the final validity check
    #[arg(long)]
    tamper: bool,
    /// Print the whole chain as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Keygen => {
            let key = KeyPair::generate();
            println!();
            println!("Public key:  {}", key.address());
            println!();
            println!("Private key: {}", key.secret_hex());
        }
        Command::Address { private_key } => {
            let key = KeyPair::from_secret_hex(&private_key).context("parsing private key")?;
            println!("{}", key.address());
        }
        Command::Demo(args) => demo(args)?,
    }
    Ok(())
}

fn demo(args: DemoArgs) -> Result<()> {
    let key = KeyPair::from_secret_hex(&args.private_key).context("parsing private key")?;
    let wallet = key.address();
    let config = ChainConfig {
        difficulty: args.difficulty,
        mining_reward: args.reward,
        parallel_mining: args.parallel,
    };
    let mut chain = Chain::new(Arc::new(Secp256k1Signer::new()), config)?;

    let mut tx = Transaction::new(Some(wallet.clone()), Address::from(args.recipient), args.amount);
    tx.sign(chain.signer().as_ref(), &key)?;
    chain.add_transaction(tx).context("submitting transaction")?;

    info!("starting the miner");
    chain.mine_pending_transactions(wallet.clone())?;
    println!("Balance of {wallet} is {}", chain.balance_of(&wallet));

    info!("starting the miner again");
    chain.mine_pending_transactions(wallet.clone())?;
    println!("Balance of {wallet} is {}", chain.balance_of(&wallet));

    if args.tamper {
        chain.blocks_mut()[1].transactions[0].amount = 1;
        println!("Rewrote the amount of the first sealed transfer to 1");
    }

    match chain.validate() {
        Ok(()) => println!("Is chain valid? true"),
        Err(violation) => println!("Is chain valid? false ({violation})"),
    }

    if args.json {
        println!("{}", chain.to_json()?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_defaults_match_core_constants() {
        let cli = Cli::try_parse_from(["powledger", "demo"]).unwrap();
        let Command::Demo(args) = cli.cmd else {
            panic!("expected demo");
        };
        assert_eq!(args.difficulty, 4);
        assert_eq!(args.reward, 100);
        assert_eq!(args.private_key, DEMO_PRIVATE_KEY);
        assert!(!args.tamper);
    }

    #[test]
    fn address_requires_private_key() {
        assert!(Cli::try_parse_from(["powledger", "address"]).is_err());
    }

    #[test]
    fn demo_runs_with_tampering() {
        let cli = Cli::try_parse_from([
            "powledger",
            "demo",
            "--difficulty",
            "1",
            "--tamper",
        ])
        .unwrap();
        let Command::Demo(args) = cli.cmd else {
            panic!("expected demo");
        };
        demo(args).unwrap();
    }
}

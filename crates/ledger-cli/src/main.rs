use anyhow::Result;
use clap::{Parser, Subcommand};
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client for the proof-of-work ledger node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:5000)
    #[arg(long, global = true, env = "LEDGER_NODE", default_value = "http://127.0.0.1:5000")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a transaction to the pending pool
    Submit {
        /// Sender
        #[arg(long)]
        sender: String,
        /// Recipient
        #[arg(long)]
        recipient: String,
        /// Amount
        #[arg(long)]
        amount: u64,
    },
    /// Mine the next block
    Mine,
    /// Print the node's full chain
    Chain,
    /// Register one or more peers
    Register {
        #[arg(required = true)]
        peers: Vec<String>,
    },
    /// Run a consensus round against the registered peers
    Resolve,
}

#[derive(Serialize)]
struct Tx {
    sender: String,
    recipient: String,
    amount: u64,
}

#[derive(Serialize)]
struct Register {
    nodes: Vec<String>,
}

async fn print_response(res: Response) -> Result<()> {
    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{body}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let node = cli.node.trim_end_matches('/');
    let client = Client::new();
    debug!(%node, command = ?cli.cmd, "sending request");

    let res = match cli.cmd {
        Command::Submit { sender, recipient, amount } => {
            let tx = Tx { sender, recipient, amount };
            client.post(format!("{node}/transactions/new")).json(&tx).send().await?
        }
        Command::Mine => client.get(format!("{node}/mine")).send().await?,
        Command::Chain => client.get(format!("{node}/chain")).send().await?,
        Command::Register { peers } => {
            let body = Register { nodes: peers };
            client.post(format!("{node}/nodes/register")).json(&body).send().await?
        }
        Command::Resolve => client.get(format!("{node}/nodes/resolve")).send().await?,
    };
    print_response(res).await
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "checkout-cli")]
#[command(about = "CLI client for the checkout-ledger node")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a book checkout
    Checkout {
        /// Node base URL (e.g. http://127.0.0.1:3000)
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        node: String,
        /// Book identifier
        #[arg(long)]
        book_id: String,
        /// Borrower
        #[arg(long)]
        user: String,
        /// Checkout date, free-form (e.g. 2024-05-01)
        #[arg(long)]
        date: String,
    },
    /// Print the full chain
    Chain {
        /// Node base URL (e.g. http://127.0.0.1:3000)
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        node: String,
    },
    /// Register a book and print its derived id
    Register {
        /// Node base URL (e.g. http://127.0.0.1:3000)
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        node: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        published_date: String,
        #[arg(long)]
        isbn: String,
    },
}

#[derive(Serialize)]
struct Checkout {
    book_id: String,
    user: String,
    checkout_date: String,
}

#[derive(Serialize)]
struct Book {
    title: String,
    author: String,
    published_date: String,
    isbn: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let client = reqwest::Client::new();
    match cli.cmd {
        Command::Checkout { node, book_id, user, date } => {
            let record = Checkout {
                book_id,
                user,
                checkout_date: date,
            };
            let res = client.post(format!("{node}/")).json(&record).send().await?;
            let status = res.status();
            let body = res.text().await?;
            println!("status: {}", status);
            println!("{body}");
        }
        Command::Chain { node } => {
            let res = client.get(format!("{node}/")).send().await?;
            let status = res.status();
            let blocks: serde_json::Value = res.json().await?;
            println!("status: {}", status);
            println!("{}", serde_json::to_string_pretty(&blocks)?);
        }
        Command::Register { node, title, author, published_date, isbn } => {
            let book = Book {
                title,
                author,
                published_date,
                isbn,
            };
            let res = client.post(format!("{node}/new")).json(&book).send().await?;
            let status = res.status();
            let body = res.text().await?;
            println!("status: {}", status);
            println!("{body}");
        }
    }
    Ok(())
}

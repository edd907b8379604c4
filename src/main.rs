use std::process;
use clap::Parser;

use news_reader::cli::{commands, Cli};

#[tokio::main]
async fn main() {
    // A missing .env file is fine; the key may come from the real environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = cli.run().await {
        eprintln!("{}", commands::error_report(&e));
        process::exit(1);
    }
}

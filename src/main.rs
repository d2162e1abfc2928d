mod args;
mod poll;

use clap::Parser;
use log::error;

use crate::args::Args;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = poll::run(&args).await {
        error!("{}", e);
        eprintln!("An error occured: {}", e);
        std::process::exit(1);
    }
}

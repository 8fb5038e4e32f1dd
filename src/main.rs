use clap::Parser;

use guildwatch::cli::{self, Cli};
use guildwatch::logging;

fn main() {
    logging::init_tracing();
    let args = Cli::parse();

    if let Err(e) = cli::run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod args;
mod turf;

use clap::Parser;
use log::{info, warn};

fn main() {
    let args = args::Args::parse();

    if args.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .parse_default_env()
            .init();
    } else {
        env_logger::init();
    }

    info!("args: {:?}", args);

    let res = turf::run_analysis(&args);

    if let Err(e) = res {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured: {}", e);
        std::process::exit(1);
    }
}

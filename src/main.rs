use clap::Parser;
use log::{error, info, LevelFilter};

mod args;
mod survey;

use crate::args::Args;

fn init_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);
    info!("main: args: {:?}", args);

    if let Err(e) = survey::run(&args) {
        error!("main: {:?}", e);
        eprintln!("An error occured: {}", e);
        let mut cause = std::error::Error::source(&e);
        while let Some(c) = cause {
            eprintln!("  caused by: {}", c);
            cause = std::error::Error::source(c);
        }
        std::process::exit(1);
    }
}

use clap::Parser;
use log::{debug, info};
use snafu::ErrorCompat;

mod args;
mod stv;

use crate::args::Args;

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    debug!("args: {:?}", args);

    match stv::run_cli(&args) {
        Ok(res) => {
            info!("Count completed in {} rounds", res.round_stats.len());
        }
        Err(e) => {
            eprintln!("An error occured: {}", e);
            if let Some(bt) = ErrorCompat::backtrace(&e) {
                eprintln!("{}", bt);
            }
            std::process::exit(1);
        }
    }
}

use clap::Parser;
use std::process;

fn main() {
    let config = vrptw::Config::parse();

    if let Err(e) = vrptw::logging::init_logger(config.log_level) {
        eprintln!("Problem setting up logging: {}", e);
        process::exit(1);
    }

    if let Err(e) = vrptw::run(config) {
        log::error!("Application error: {}", e);
        process::exit(1);
    }
}

use clap::Parser;
use std::error::Error;
use subnet_toolkit::cli::{run, Cli};
use subnet_toolkit::Config;

fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    if let Err(e) = log4rs::init_file(&config.log_config, Default::default()) {
        eprintln!("Logging disabled, could not load {}: {e}", config.log_config);
    }
    if !config.color {
        colored::control::set_override(false);
    }
    log::info!("#Start main()");

    println!("{}", run(&cli, &config)?);
    Ok(())
}

use anyhow::Result;
use clap::{CommandFactory, Parser};
use scalebar::cli::{self, Cli};
use scalebar::error::AppError;

fn main() -> Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse();

    let level = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    // Run the main application logic from the library
    if let Err(e) = scalebar::run(&cli) {
        if let Some(AppError::MissingImage) = e.downcast_ref::<AppError>() {
            Cli::command().print_help()?;
            let program = std::env::args().next().unwrap_or_else(|| "scalebar".to_string());
            println!();
            println!("{}", cli::examples(&program));
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }

    Ok(())
}

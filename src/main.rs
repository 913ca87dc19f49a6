use clap::Parser;
use rtf2md::cli;
use std::io::BufRead;
use tracing::error;

fn main() {
    let args = cli::Args::parse();
    let (guard, result) = match cli::init(&args) {
        Ok((cfg, guard)) => (guard, cli::dispatch(&args, &cfg)),
        Err(err) => (None, Err(err)),
    };

    let failed = match result {
        Ok(()) => false,
        Err(err) => {
            if tracing::dispatcher::has_been_set() {
                error!("{:?}", err);
            } else {
                eprintln!("error: {err:?}");
            }
            true
        }
    };
    drop(guard);

    if cli::pause_requested(&args) {
        println!("\nPress Enter to exit...");
        let mut line = String::new();
        let _ = std::io::stdin().lock().read_line(&mut line);
    }

    if failed {
        std::process::exit(1);
    }
}

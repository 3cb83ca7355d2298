mod auth;
mod classify;
mod cli;
mod config;
mod control;
mod directions;
mod hardware;
mod logging;
mod model;
mod store;
#[cfg(test)]
mod testing;
mod touch;

use std::process;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

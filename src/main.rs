use std::process::ExitCode;

use crate::cli::run;

pub mod cli;
mod config;
pub mod domain;
pub mod download;
pub mod export;
pub mod extract;
pub mod naming;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

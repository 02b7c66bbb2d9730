mod args;
mod engine;
mod output;

use std::io::{self, BufRead};
use std::sync::Arc;

use anyhow::{Context, Result};
use mailprobe_lib::{ValidationJob, VerifierPool};
use tracing_subscriber::EnvFilter;

use crate::args::{Cli, Commands};
use crate::output::Format;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn collect_emails(cli: &Cli) -> Result<Option<Vec<String>>> {
    if cli.stdin {
        let mut emails = Vec::new();
        for line in io::stdin().lock().lines() {
            let line = line.context("read stdin")?;
            let email = line.trim();
            if !email.is_empty() {
                emails.push(email.to_string());
            }
        }
        return Ok(Some(emails));
    }
    match &cli.cmd {
        Some(Commands::Verify { email }) => Ok(Some(vec![email.clone()])),
        None => Ok(None),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    // --format est validé avant tout accès réseau
    let format: Format = cli.format.parse()?;

    let Some(emails) = collect_emails(&cli)? else {
        Cli::clap_command().print_help()?;
        println!();
        return Ok(());
    };

    let engine = engine::build_engine(&cli)?;
    let pool = VerifierPool::new(Arc::new(engine), cli.workers).context("start worker pool")?;
    let jobs = emails.into_iter().map(ValidationJob::new).collect();
    let results = pool.verify_batch(jobs);

    output::write_reports(&results, format, cli.out.as_deref())?;

    match output::exit_code(&results) {
        0 => Ok(()),
        code => std::process::exit(code),
    }
}

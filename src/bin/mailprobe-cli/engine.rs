use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use mailprobe_lib::{
    DeliverabilityEngine, EngineOptions, ProbeOptions, ReputationCache, ResolverOptions,
};

use crate::args::Cli;

pub fn engine_options(cli: &Cli) -> EngineOptions {
    let mut probe = ProbeOptions {
        port: cli.port,
        timeout: Duration::from_secs(cli.probe_timeout_secs),
        ..ProbeOptions::default()
    };
    if let Some(helo) = &cli.helo {
        probe.helo_identity = helo.clone();
    }
    if let Some(mail_from) = &cli.mail_from {
        probe.mail_from = mail_from.clone();
    }
    EngineOptions {
        verification_timeout: Duration::from_secs(cli.timeout_secs),
        probe_smtp: !cli.no_smtp,
        probe,
        ..EngineOptions::default()
    }
}

pub fn build_engine(cli: &Cli) -> Result<DeliverabilityEngine> {
    let engine = DeliverabilityEngine::from_system(engine_options(cli), &ResolverOptions::default())
        .context("initialise DNS resolver")?;
    Ok(match reputation_cache(cli)? {
        Some(cache) => engine.with_reputation(cache),
        None => engine,
    })
}

#[cfg(feature = "with-abuseipdb")]
fn reputation_cache(cli: &Cli) -> Result<Option<Arc<ReputationCache>>> {
    use mailprobe_lib::{AbuseIpDbClient, ReputationOptions};

    if cli.no_reputation {
        return Ok(None);
    }
    let Some(key) = cli.abuseipdb_key.as_deref().filter(|key| !key.trim().is_empty()) else {
        tracing::debug!("no AbuseIPDB key, reputation check disabled");
        return Ok(None);
    };
    let client = AbuseIpDbClient::new(key).context("build AbuseIPDB client")?;
    Ok(Some(Arc::new(ReputationCache::new(
        Arc::new(client),
        ReputationOptions::default(),
    ))))
}

#[cfg(not(feature = "with-abuseipdb"))]
fn reputation_cache(cli: &Cli) -> Result<Option<Arc<ReputationCache>>> {
    if !cli.no_reputation && cli.abuseipdb_key.is_some() {
        tracing::warn!("reputation check needs the 'with-abuseipdb' feature, skipped");
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn flags_map_onto_engine_options() {
        let cli = Cli::try_parse_from([
            "mailprobe-cli",
            "--timeout",
            "30",
            "--probe-timeout",
            "5",
            "--port",
            "2525",
            "--helo",
            "probe.example.org",
            "--from",
            "bounce@example.org",
            "--no-smtp",
            "verify",
            "user@example.com",
        ])
        .expect("args");

        let options = engine_options(&cli);

        assert_eq!(options.verification_timeout, Duration::from_secs(30));
        assert!(!options.probe_smtp);
        assert_eq!(options.probe.port, 2525);
        assert_eq!(options.probe.timeout, Duration::from_secs(5));
        assert_eq!(options.probe.helo_identity, "probe.example.org");
        assert_eq!(options.probe.mail_from, "bounce@example.org");
    }

    #[test]
    fn defaults_keep_library_identity() {
        let cli = Cli::try_parse_from(["mailprobe-cli", "verify", "user@example.com"]).expect("args");
        let options = engine_options(&cli);
        assert!(options.probe_smtp);
        assert_eq!(options.probe.helo_identity, ProbeOptions::default().helo_identity);
        assert_eq!(options.verification_timeout, Duration::from_secs(60));
    }
}

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mailprobe-cli", version, about = "Vérifie la délivrabilité d'adresses e-mail")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Commands>,

    /// lit des adresses depuis stdin (une par ligne)
    #[arg(long)]
    pub stdin: bool,

    /// write report to file (JSON/NDJSON/CSV selon --format)
    #[arg(long)]
    pub out: Option<String>,

    /// format: human|json|ndjson|csv
    #[arg(long, default_value = "human")]
    pub format: String,

    /// nombre de vérifications en parallèle
    #[arg(long, default_value_t = 4)]
    pub workers: usize,

    /// budget global par adresse (secondes)
    #[arg(long = "timeout", default_value_t = 60)]
    pub timeout_secs: u64,

    /// budget d'une session SMTP (secondes)
    #[arg(long = "probe-timeout", default_value_t = 10)]
    pub probe_timeout_secs: u64,

    /// port SMTP des serveurs MX
    #[arg(long, default_value_t = 25)]
    pub port: u16,

    /// nom utilisé pour EHLO/HELO
    #[arg(long)]
    pub helo: Option<String>,

    /// enveloppe MAIL FROM
    #[arg(long = "from")]
    pub mail_from: Option<String>,

    /// désactive la vérification de réputation des IP
    #[arg(long)]
    pub no_reputation: bool,

    /// s'arrête après la résolution MX (statut UNKNOWN)
    #[arg(long)]
    pub no_smtp: bool,

    /// clé API AbuseIPDB (feature `with-abuseipdb`)
    #[arg(long, env = "ABUSEIPDB_API_KEY", hide_env_values = true)]
    pub abuseipdb_key: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// vérifie une adresse
    Verify { email: String },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn clap_command() -> clap::Command {
        <Self as clap::CommandFactory>::command()
    }
}

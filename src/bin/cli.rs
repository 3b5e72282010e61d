use std::path::PathBuf;
use std::process;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crxaudit::config::{Config, CONFIG_FILE};
use crxaudit::error::AuditError;
use crxaudit::output::{console, OutputFormat};
use crxaudit::rules::{RuleEngine, Severity};
use crxaudit::store::{ExtensionId, JsonFileStore, ResultStore};
use crxaudit::ScanOptions;

#[derive(Parser)]
#[command(
    name = "crxaudit",
    about = "Risk auditor for browser extension packages",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a .crx or .zip extension package
    Scan(ScanArgs),

    /// List all available detection rules
    ListRules {
        /// Output format (table, json)
        #[arg(long, short = 'f', default_value = "table")]
        format: String,
    },

    /// Generate a starter .crxaudit.toml config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Summarize stored results
    Stats {
        /// Config file path
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Output format (console, json)
        #[arg(long, short = 'f', default_value = "console")]
        format: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scan(args) => args.run(),
        Commands::ListRules { format } => cmd_list_rules(format),
        Commands::Init { force } => cmd_init(force),
        Commands::Stats { config, format } => cmd_stats(config, format),
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

#[derive(Args)]
struct ScanArgs {
    /// Path to the package
    path: PathBuf,

    /// Extension ID (32 alphanumerics), used as the store key
    #[arg(long)]
    id: Option<String>,

    /// Store-page details as JSON
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Pre-written advisory note to attach
    #[arg(long)]
    advisory_file: Option<PathBuf>,

    /// Config file path
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Output format (console, json, sarif)
    #[arg(long, short = 'f', default_value = "console")]
    format: String,

    /// Minimum verdict to fail (minimal, low, medium, high, critical)
    #[arg(long)]
    fail_on: Option<String>,

    /// Write output to file instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Reuse and save results in the result store (requires --id)
    #[arg(long)]
    store: bool,

    /// Re-analyze when the stored result is stale
    #[arg(long)]
    force: bool,
}

impl ScanArgs {
    fn run(self) -> Result<i32, AuditError> {
        let format = OutputFormat::from_str_lenient(&self.format).unwrap_or_else(|| {
            eprintln!("Warning: unknown format '{}', using console", self.format);
            OutputFormat::Console
        });

        let fail_on = self.fail_on.and_then(|s| {
            let sev = Severity::from_str_lenient(&s);
            if sev.is_none() {
                eprintln!("Warning: unknown severity '{}', using config default", s);
            }
            sev
        });

        let extension_id = self.id.as_deref().map(ExtensionId::parse).transpose()?;

        let options = ScanOptions {
            config_path: self.config,
            format,
            fail_on_override: fail_on,
            metadata_path: self.metadata,
            advisory_path: self.advisory_file,
            extension_id,
            use_store: self.store,
            force: self.force,
        };

        let report = crxaudit::scan(&self.path, &options)?;
        let rendered = crxaudit::render_report(&report, format)?;

        match self.output {
            Some(out) => std::fs::write(&out, &rendered)?,
            None => print!("{}", rendered),
        }

        // Exit code: 0 = pass, 1 = verdict at or above threshold
        Ok(if report.verdict.pass { 0 } else { 1 })
    }
}

fn cmd_list_rules(format_str: String) -> Result<i32, AuditError> {
    let engine = RuleEngine::new();
    let rules = engine.list_rules();

    match format_str.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&rules)?;
            println!("{}", json);
        }
        _ => {
            println!("{:<10} {:<36} {:<10} DESCRIPTION", "ID", "NAME", "SEVERITY");
            println!("{}", "-".repeat(90));
            for rule in &rules {
                println!(
                    "{:<10} {:<36} {:<10} {}",
                    rule.id,
                    rule.name,
                    rule.default_severity.to_string(),
                    rule.description,
                );
            }
        }
    }

    Ok(0)
}

fn cmd_init(force: bool) -> Result<i32, AuditError> {
    let path = PathBuf::from(CONFIG_FILE);

    if path.exists() && !force {
        eprintln!("{} already exists. Use --force to overwrite.", CONFIG_FILE);
        return Ok(1);
    }

    std::fs::write(&path, Config::starter_toml())?;
    println!("Created {}", CONFIG_FILE);

    Ok(0)
}

fn cmd_stats(config: Option<PathBuf>, format_str: String) -> Result<i32, AuditError> {
    let config_path = config.unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    let config = Config::load(&config_path)?;

    let scans = JsonFileStore::new(&config.store.dir).all()?;
    let snapshot = crxaudit::stats::compute(&scans, Utc::now(), config.store.top_n);

    match format_str.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        _ => print!("{}", console::render_stats(&snapshot)),
    }

    Ok(0)
}

//! certstatus: Command-line driver for the certificate trust-status engine.

use anyhow::{Context, Result};
use certstatus_lib::inventory::{link_issuers, load_certificates};
use certstatus_lib::{
    BatchFailure, Certificate, CertificateRepository, CertificateStatus, EngineConfig,
    HttpRevocationSource, InMemoryRepository, ValidationEngine, ValidationPool, ValidationReport,
};
use clap::{ArgAction, Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "certstatus",
    about = "Determine the trust status of certificates in an inventory",
    long_about = "certstatus treats a directory of PEM/DER certificate files as an\n\
                  inventory, reconstructs issuer chains, and checks signatures,\n\
                  validity windows, OCSP and CRLs for each certificate.\n\n\
                  Revoked certificates revoke the certificates they issued.",
    after_help = "EXAMPLES:\n\
                  \n  certstatus scan ./pki\
                  \n  certstatus scan -r --failures-only ./pki\
                  \n  certstatus validate --inventory ./pki leaf.pem\
                  \n  certstatus validate --json --attime 1800000000 chain.pem\
                  \n  certstatus chain --inventory ./pki leaf.pem\
                  \n  RUST_LOG=certstatus_lib=debug certstatus scan ./pki"
)]
struct Cli {
    /// JSON engine configuration file; flags below override it
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Evaluate validity at a specific Unix timestamp instead of now
    #[arg(long, global = true, value_name = "EPOCH")]
    attime: Option<i64>,
    /// Per-request OCSP timeout (e.g. 10s, 1m)
    #[arg(long, global = true, value_name = "DURATION")]
    ocsp_timeout: Option<String>,
    /// Per-request CRL download timeout (e.g. 30s, 2m)
    #[arg(long, global = true, value_name = "DURATION")]
    crl_timeout: Option<String>,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate every certificate in a directory (exit 0 = all usable, 2 = failures)
    #[command(after_help = "Every certificate found becomes part of the inventory. Issuer\n\
                      references are linked by matching issuer and subject names.\n\
                      \nEXAMPLES:\n\
                      \n  certstatus scan ./pki\
                      \n  certstatus scan -r ./pki\
                      \n  certstatus scan --json ./pki\
                      \n  certstatus scan --failures-only --ocsp-timeout 3s ./pki")]
    Scan {
        /// Directory containing certificate files (.pem, .der, .crt, .cer)
        dir: PathBuf,
        /// Recurse into subdirectories
        #[arg(short, long)]
        recurse: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Only print certificates that are not usable
        #[arg(long)]
        failures_only: bool,
    },
    /// Validate one certificate and print its report (exit 0 = VALID/EXPIRING, 2 = otherwise)
    #[command(after_help = "FILE may be a bundle with the leaf first; the remaining\n\
                      certificates join the inventory.\n\
                      \nEXAMPLES:\n\
                      \n  certstatus validate leaf.pem\
                      \n  certstatus validate --inventory ./pki leaf.pem\
                      \n  certstatus validate --json chain.pem\
                      \n  cat leaf.pem | certstatus validate --inventory ./pki")]
    Validate {
        /// Certificate file (PEM or DER). Reads from stdin if omitted.
        file: Option<PathBuf>,
        /// Directory of issuer certificates
        #[arg(long, value_name = "DIR")]
        inventory: Option<PathBuf>,
        /// Recurse into inventory subdirectories
        #[arg(short, long)]
        recurse: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Print the reconstructed issuer chain of a certificate
    #[command(after_help = "EXAMPLES:\n\
                      \n  certstatus chain --inventory ./pki leaf.pem\
                      \n  certstatus chain --json chain.pem")]
    Chain {
        /// Certificate file (PEM or DER). Reads from stdin if omitted.
        file: Option<PathBuf>,
        /// Directory of issuer certificates
        #[arg(long, value_name = "DIR")]
        inventory: Option<PathBuf>,
        /// Recurse into inventory subdirectories
        #[arg(short, long)]
        recurse: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

/// Maximum file size for certificate inputs (10 MiB).
const MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

fn read_input(file: Option<&PathBuf>) -> Result<Vec<u8>> {
    match file {
        Some(path) => {
            let meta = std::fs::metadata(path)
                .with_context(|| format!("Failed to stat file: {}", path.display()))?;
            if meta.len() > MAX_INPUT_BYTES {
                anyhow::bail!(
                    "File too large ({} bytes, max {} bytes): {}",
                    meta.len(),
                    MAX_INPUT_BYTES,
                    path.display()
                );
            }
            std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .take(MAX_INPUT_BYTES)
                .read_to_end(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

/// Parse a duration string using humantime format.
///
/// Plain numbers (e.g. "30") default to seconds.
fn parse_duration(s: &str) -> Result<Duration> {
    if s.chars().all(|c| c.is_ascii_digit()) {
        let secs: u64 = s.parse().context("Invalid duration value")?;
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(s).with_context(|| format!("Invalid duration: '{s}'"))
}

/// Check if a path has a certificate file extension.
fn is_cert_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("pem") || ext.eq_ignore_ascii_case("der")
            || ext.eq_ignore_ascii_case("crt") || ext.eq_ignore_ascii_case("cer")
    )
}

/// Find all certificate files (.pem, .der, .crt, .cer) in a directory.
fn find_cert_files(dir: &Path, recurse: bool) -> Vec<PathBuf> {
    let walker = if recurse {
        walkdir::WalkDir::new(dir)
    } else {
        walkdir::WalkDir::new(dir).max_depth(1)
    };
    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_cert_file(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

fn log_filter(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        })
    })
}

fn init_tracing(verbose: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load the config file (if any) and apply command-line overrides.
fn build_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(ts) = cli.attime {
        config.at_time = Some(ts);
    }
    if let Some(s) = &cli.ocsp_timeout {
        config.ocsp_timeout_secs = parse_duration(s)?.as_secs().max(1);
    }
    if let Some(s) = &cli.crl_timeout {
        config.crl_timeout_secs = parse_duration(s)?.as_secs().max(1);
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// A file that could not be loaded into the inventory.
struct LoadFailure {
    path: String,
    detail: String,
}

/// Load every certificate under `dir` in parallel.
///
/// Unreadable files are returned separately and never abort the load.
fn load_inventory(dir: &Path, recurse: bool) -> Result<(Vec<Certificate>, Vec<LoadFailure>)> {
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {}", dir.display());
    }
    let files = find_cert_files(dir, recurse);
    debug!("Found {} certificate file(s) in {}", files.len(), dir.display());

    let loaded: Vec<Result<Vec<Certificate>, LoadFailure>> = files
        .par_iter()
        .map(|f| {
            read_input(Some(f))
                .and_then(|input| Ok(load_certificates(&input)?))
                .map_err(|e| LoadFailure {
                    path: f.display().to_string(),
                    detail: format!("{:#}", e),
                })
        })
        .collect();

    let mut certs = Vec::new();
    let mut failures = Vec::new();
    for result in loaded {
        match result {
            Ok(batch) => certs.extend(batch),
            Err(failure) => failures.push(failure),
        }
    }
    Ok((certs, failures))
}

fn report_load_failures(failures: &[LoadFailure]) {
    for f in failures {
        eprintln!("{}: FAIL ({})", f.path, f.detail);
    }
}

/// Link issuers across `certs` and store them in a fresh repository.
fn build_repository(mut certs: Vec<Certificate>) -> Result<InMemoryRepository> {
    let linked = link_issuers(&mut certs);
    debug!("Linked {} issuer reference(s)", linked);
    let repo = InMemoryRepository::new();
    for cert in &certs {
        repo.save(cert)?;
    }
    Ok(repo)
}

/// Resolve the target certificate from `file` and build an inventory that
/// includes it, the rest of its bundle, and `inventory` if given.
fn prepare_target(
    file: Option<&PathBuf>,
    inventory: Option<&PathBuf>,
    recurse: bool,
) -> Result<(Certificate, InMemoryRepository)> {
    let input = read_input(file)?;
    let bundle = load_certificates(&input).context("Failed to load certificate")?;
    let target_serial = match bundle.first() {
        Some(cert) => cert.serial_number.clone(),
        None => anyhow::bail!("No certificate found in input"),
    };

    let mut certs = Vec::new();
    if let Some(dir) = inventory {
        let (loaded, failures) = load_inventory(dir, recurse)?;
        for f in &failures {
            warn!("Skipping {}: {}", f.path, f.detail);
        }
        certs.extend(loaded);
    }
    // The input file takes precedence over inventory copies of the same serial.
    certs.retain(|c| !bundle.iter().any(|b| b.serial_number == c.serial_number));
    certs.extend(bundle);

    let repo = build_repository(certs)?;
    let target = repo
        .find_by_serial_number(&target_serial)?
        .with_context(|| format!("Certificate {} missing from inventory", target_serial))?;
    Ok((target, repo))
}

/// One line of scan output.
#[derive(Serialize)]
struct ScanEntry {
    serial_number: String,
    subject_dn: String,
    status: CertificateStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation_report: Option<ValidationReport>,
}

#[derive(Serialize)]
struct ScanOutput {
    certificates: Vec<ScanEntry>,
    failed: Vec<BatchFailure>,
}

/// One chain member in JSON output.
#[derive(Serialize)]
struct ChainEntry {
    depth: usize,
    serial_number: String,
    subject_dn: String,
    issuer_dn: String,
    status: CertificateStatus,
}

/// Status that makes `scan` exit non-zero.
fn is_failure(status: CertificateStatus) -> bool {
    matches!(
        status,
        CertificateStatus::Invalid | CertificateStatus::Expired | CertificateStatus::Revoked
    )
}

fn run_scan(
    config: EngineConfig,
    dir: &Path,
    recurse: bool,
    json: bool,
    failures_only: bool,
) -> Result<bool> {
    let (certs, load_failures) = load_inventory(dir, recurse)?;
    report_load_failures(&load_failures);
    if certs.is_empty() {
        anyhow::bail!("No certificates found in {}", dir.display());
    }

    let repo = Arc::new(build_repository(certs)?);
    let source = HttpRevocationSource::new(&config)?;
    let pool = ValidationPool::from_config(&config)?;
    let engine = Arc::new(ValidationEngine::new(Arc::clone(&repo), source, config));

    let outcome = pool
        .submit_unknown(engine)
        .wait()
        .context("Validation worker terminated unexpectedly")?;

    // Statuses are re-read: propagation may have changed certificates after
    // their own validation finished.
    let certificates: Vec<ScanEntry> = repo
        .all()
        .into_iter()
        .map(|c| ScanEntry {
            serial_number: c.serial_number,
            subject_dn: c.subject_dn,
            status: c.status,
            validation_report: c.validation_report,
        })
        .collect();

    let failed_count = certificates.iter().filter(|e| is_failure(e.status)).count()
        + outcome.failed.len()
        + load_failures.len();

    if json {
        let output = ScanOutput {
            certificates,
            failed: outcome.failed,
        };
        println!("{}", certstatus_lib::to_json(&output)?);
    } else {
        for entry in &certificates {
            if failures_only && !is_failure(entry.status) {
                continue;
            }
            let name = short_name(&entry.subject_dn);
            let line = format!("{} ({}): {}", entry.serial_number, name, entry.status);
            if is_failure(entry.status) {
                eprintln!("{}", line);
            } else {
                println!("{}", line);
            }
        }
        for f in &outcome.failed {
            eprintln!("{}: FAIL ({})", f.serial_number, f.error);
        }
    }
    Ok(failed_count == 0)
}

fn run_validate(
    config: EngineConfig,
    file: Option<&PathBuf>,
    inventory: Option<&PathBuf>,
    recurse: bool,
    json: bool,
) -> Result<bool> {
    let (target, repo) = prepare_target(file, inventory, recurse)?;
    let source = HttpRevocationSource::new(&config)?;
    let engine = ValidationEngine::new(repo, source, config);
    let summary = engine
        .validate(&target)
        .with_context(|| format!("Failed to validate {}", target.serial_number))?;

    if json {
        println!("{}", certstatus_lib::to_json(&summary)?);
    } else {
        print!("{}", certstatus_lib::display_summary(&summary));
    }
    Ok(summary.status.is_usable())
}

fn run_chain(
    config: EngineConfig,
    file: Option<&PathBuf>,
    inventory: Option<&PathBuf>,
    recurse: bool,
    json: bool,
) -> Result<()> {
    let (target, repo) = prepare_target(file, inventory, recurse)?;
    let chain = certstatus_lib::verify::build_chain(&repo, &target, config.max_chain_depth)?;

    if json {
        let entries: Vec<ChainEntry> = chain
            .iter()
            .enumerate()
            .map(|(depth, c)| ChainEntry {
                depth,
                serial_number: c.serial_number.clone(),
                subject_dn: c.subject_dn.clone(),
                issuer_dn: c.issuer_dn.clone(),
                status: c.status,
            })
            .collect();
        println!("{}", certstatus_lib::to_json(&entries)?);
    } else {
        print!("{}", certstatus_lib::display_chain(&chain));
    }
    Ok(())
}

/// CN from a one-line DN, or the whole DN when there is none.
fn short_name(dn: &str) -> &str {
    dn.split(", ")
        .find_map(|part| part.strip_prefix("CN = "))
        .unwrap_or(dn)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = build_config(&cli)?;

    match &cli.command {
        Commands::Scan {
            dir,
            recurse,
            json,
            failures_only,
        } => {
            if !run_scan(config, dir, *recurse, *json, *failures_only)? {
                std::process::exit(2);
            }
        }
        Commands::Validate {
            file,
            inventory,
            recurse,
            json,
        } => {
            if !run_validate(config, file.as_ref(), inventory.as_ref(), *recurse, *json)? {
                std::process::exit(2);
            }
        }
        Commands::Chain {
            file,
            inventory,
            recurse,
            json,
        } => {
            run_chain(config, file.as_ref(), inventory.as_ref(), *recurse, *json)?;
        }
    }

    Ok(())
}

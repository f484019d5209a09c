//! session-stakes CLI: fetch, positions, report, verify.

use clap::{Parser, Subcommand};
use session_stakes::aggregate::{parse_stakes, DEFAULT_NODE_MIN_LIFESPAN_ARB_BLOCKS};
use session_stakes::amount::format_sent;
use session_stakes::backend::{BackendClient, BackendConfig, ResponseCache};
use session_stakes::node::{stake_state, total_staked_for_address};
use session_stakes::snapshot::{reproducibility_hash, verify_bundle_hash, SnapshotBundle};
use session_stakes::ReportData;
use session_stakes_report::render_report;
use std::path::PathBuf;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();
    let cli = Cli::parse();
    match cli.command {
        Command::Fetch(args) => run_fetch(args),
        Command::Positions(args) => run_positions(args),
        Command::Report(args) => run_report(args),
        Command::Verify(args) => run_verify(args),
    }
}

#[derive(Parser)]
#[command(name = "session-stakes")]
#[command(about = "Local-first staking position viewer for Session Network")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the backend stakes payload for an address and cache it.
    Fetch(FetchArgs),
    /// Aggregate positions for an address and write a snapshot bundle.
    Positions(PositionsArgs),
    /// Generate an HTML report and bundle.
    Report(ReportArgs),
    /// Verify a bundle's reproducibility hash.
    Verify(VerifyArgs),
}

#[derive(Parser)]
struct FetchArgs {
    #[arg(long)]
    address: String,
    #[arg(long, default_value = "./data/cache")]
    cache_dir: PathBuf,
    #[arg(long)]
    offline: bool,
}

#[derive(Parser)]
struct PositionsArgs {
    #[arg(long)]
    address: String,
    #[arg(long, default_value = "./data/cache")]
    cache_dir: PathBuf,
    #[arg(long, default_value = "./reports")]
    reports_dir: PathBuf,
    #[arg(long)]
    offline: bool,
    /// Finalized-event block threshold below which a finalized contract is
    /// still shown as joining.
    #[arg(long, default_value_t = DEFAULT_NODE_MIN_LIFESPAN_ARB_BLOCKS)]
    node_min_lifespan_arb_blocks: u64,
}

#[derive(Parser)]
struct ReportArgs {
    #[arg(long)]
    address: String,
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long, default_value = "./reports")]
    reports_dir: PathBuf,
    #[arg(long, default_value = "./data/cache")]
    cache_dir: PathBuf,
    #[arg(long)]
    offline: bool,
    #[arg(long, default_value_t = DEFAULT_NODE_MIN_LIFESPAN_ARB_BLOCKS)]
    node_min_lifespan_arb_blocks: u64,
    /// Generate a demo report with example positions (for screenshots).
    #[arg(long)]
    demo: bool,
}

#[derive(Parser)]
struct VerifyArgs {
    #[arg(long)]
    bundle: PathBuf,
}

fn cache_path(cache_dir: &std::path::Path) -> PathBuf {
    cache_dir.join("cache.sqlite")
}

fn addr_suffix(address: &str) -> String {
    address
        .chars()
        .take(20)
        .collect::<String>()
        .replace([' ', ':'], "_")
}

fn aggregate(
    address: &str,
    cache_dir: &std::path::Path,
    offline: bool,
    node_min_lifespan_arb_blocks: u64,
) -> Result<SnapshotBundle, Box<dyn std::error::Error>> {
    let cache = ResponseCache::open(cache_path(cache_dir))?;
    let config = BackendConfig {
        offline,
        ..Default::default()
    };
    let client = BackendClient::new(config, Some(cache))?;
    let rt = tokio::runtime::Runtime::new()?;
    let response = rt.block_on(async { client.stakes(address).await })?;
    let overview = parse_stakes(
        response.stakes,
        response.contracts,
        response.vesting,
        address,
        response.network.block_height,
        &response.added_bls_keys,
        node_min_lifespan_arb_blocks,
    );
    Ok(SnapshotBundle::new(address.to_string(), overview))
}

fn write_bundle(
    bundle: &SnapshotBundle,
    reports_dir: &std::path::Path,
) -> Result<String, Box<dyn std::error::Error>> {
    let hash = reproducibility_hash(bundle)?;
    std::fs::create_dir_all(reports_dir)?;
    let suffix = addr_suffix(&bundle.address);
    let bundle_path = reports_dir.join(format!("{suffix}.bundle.json"));
    let hash_path = reports_dir.join(format!("{suffix}.sha256"));
    std::fs::write(&bundle_path, serde_json::to_string_pretty(bundle)?)?;
    std::fs::write(&hash_path, format!("{hash}\n"))?;
    info!(?bundle_path, ?hash_path, "bundle written");
    Ok(hash)
}

fn run_fetch(args: FetchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let cache = ResponseCache::open(cache_path(&args.cache_dir))?;
    let config = BackendConfig {
        offline: args.offline,
        ..Default::default()
    };
    let client = BackendClient::new(config, Some(cache))?;
    let rt = tokio::runtime::Runtime::new()?;
    let response = rt.block_on(async { client.stakes(&args.address).await })?;
    info!(
        stakes = response.stakes.len(),
        contracts = response.contracts.len(),
        requests = client.request_count(),
        "fetch complete"
    );
    Ok(())
}

fn run_positions(args: PositionsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let bundle = aggregate(
        &args.address,
        &args.cache_dir,
        args.offline,
        args.node_min_lifespan_arb_blocks,
    )?;
    for stake in &bundle.stakes {
        println!(
            "{}\t{}\t{}",
            stake_state(stake, bundle.block_height),
            stake.service_node_pubkey,
            format_sent(
                total_staked_for_address(&stake.contributors, &bundle.address),
                2
            ),
        );
    }
    println!(
        "stakes: {}  open: {}  joining: {}  hidden: {}  vesting: {}",
        bundle.stakes.len(),
        bundle.visible_contracts.len(),
        bundle.joining_contracts.len(),
        bundle.hidden_contracts_with_stakes.len(),
        bundle.vesting.len(),
    );
    let hash = write_bundle(&bundle, &args.reports_dir)?;
    println!("{hash}");
    Ok(())
}

fn run_report(args: ReportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let bundle = if args.demo {
        SnapshotBundle::demo()
    } else {
        aggregate(
            &args.address,
            &args.cache_dir,
            args.offline,
            args.node_min_lifespan_arb_blocks,
        )?
    };
    let reproducibility_hash_sha256 = write_bundle(&bundle, &args.reports_dir)?;
    let suffix = addr_suffix(&bundle.address);
    let html_path = args
        .out
        .unwrap_or_else(|| args.reports_dir.join(format!("{suffix}.html")));
    let data = ReportData {
        bundle,
        reproducibility_hash_sha256,
    };
    render_report(&data, &html_path)?;
    info!(?html_path, "report complete");
    println!("Report written to {}", html_path.display());
    Ok(())
}

fn run_verify(args: VerifyArgs) -> Result<(), Box<dyn std::error::Error>> {
    let bundle_json = std::fs::read_to_string(&args.bundle)?;
    let bundle: SnapshotBundle = serde_json::from_str(&bundle_json)?;
    let sha256_path = args
        .bundle
        .parent()
        .unwrap_or(std::path::Path::new("."))
        .join(format!(
            "{}.sha256",
            args.bundle
                .file_stem()
                .unwrap_or_default()
                .to_string_lossy()
                .trim_end_matches(".bundle")
        ));
    let expected = std::fs::read_to_string(&sha256_path)?;
    let result = verify_bundle_hash(&bundle, &expected)?;
    if result.matches {
        println!("OK\t{}", result.bundle_hash);
    } else {
        eprintln!(
            "MISMATCH\tcomputed={}\texpected={:?}",
            result.bundle_hash, result.expected_hash
        );
        std::process::exit(1);
    }
    Ok(())
}

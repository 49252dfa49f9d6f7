use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;
use zitat::adapters::{
    screen_on, GreedyFormatter, PipeSink, SerialTransport, SystemClock, DEFAULT_PORT,
    DEFAULT_RENDERER,
};
use zitat::core::display::DEFAULT_WIDTH;
use zitat::domain::ports::Clock;
use zitat::utils::logger;
use zitat::{Config, DisplayController, QuoteCatalog, ScaleReader, SessionLoop, SharedConfig};

#[derive(Parser, Debug)]
#[command(name = "zitat", about = "Weight-triggered quotation display")]
struct Cli {
    /// Installation directory (default: $ZITATDIR, else ~/skulptura)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Serial device the scale is attached to
    #[arg(long, global = true, default_value = DEFAULT_PORT)]
    port: String,

    /// Quotation catalog, relative to the installation directory
    #[arg(long, global = true, default_value = "masse_der_klasse.txt")]
    catalog: PathBuf,

    /// Configuration file, relative to the installation directory
    #[arg(long, global = true, default_value = "zitat.toml")]
    config_file: PathBuf,

    /// Display fifo, relative to the installation directory
    #[arg(long, global = true, default_value = "sm.fifo")]
    fifo: PathBuf,

    /// Renderer command reading the fifo
    #[arg(long, global = true, default_value = DEFAULT_RENDERER)]
    renderer: String,

    /// Show the banner before the first poll
    #[arg(long, global = true)]
    banner: bool,

    #[arg(long, global = true, help = "Enable verbose output")]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate configuration and quotation catalog
    Check,
    /// Cycle the catalog on the display for visual testing
    Disp {
        #[arg(default_value_t = DEFAULT_WIDTH)]
        width: usize,
        /// Restrict to this 1-based entry
        entry: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if std::io::stderr().is_terminal() {
        logger::init_cli_logger(cli.verbose);
    } else {
        logger::init_service_logger(cli.verbose);
    }

    let dir = installation_dir(&cli);
    let config = SharedConfig::new(Config::from_path(dir.join(&cli.config_file)));
    let mut catalog = QuoteCatalog::new(dir.join(&cli.catalog), config.clone());

    if matches!(cli.command, Some(Commands::Check)) {
        return run_check(&config, &mut catalog);
    }

    config.reload();
    screen_on();

    let sink = match PipeSink::launch(&dir.join(&cli.fifo), &cli.renderer) {
        Ok(sink) => sink,
        Err(e) => {
            tracing::error!("cannot set up display: {}", e);
            eprintln!("❌ cannot set up display: {}", e);
            std::process::exit(1);
        }
    };
    let display = DisplayController::new(sink, GreedyFormatter);
    let clock = SystemClock;

    if let Some(Commands::Disp { width, entry }) = cli.command {
        return run_disp(&mut catalog, display, &clock, width, entry);
    }

    tracing::info!("zitat starting");
    let transport = match SerialTransport::open(&cli.port) {
        Ok(transport) => transport,
        Err(e) => {
            tracing::error!("cannot open scale port {}: {}", cli.port, e);
            eprintln!("❌ cannot open scale port {}: {}", cli.port, e);
            std::process::exit(1);
        }
    };
    let scale = ScaleReader::new(transport, config.clone());
    let mut session = SessionLoop::new(scale, catalog, display, clock, config);

    if cli.banner {
        session.show_banner()?;
    }
    if let Err(e) = session.run() {
        tracing::error!("session loop failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn installation_dir(cli: &Cli) -> PathBuf {
    if let Some(dir) = &cli.dir {
        return dir.clone();
    }
    if let Ok(dir) = std::env::var("ZITATDIR") {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join("skulptura")
}

/// `check`: reload everything once and report via the exit status.
fn run_check(config: &SharedConfig, catalog: &mut QuoteCatalog) -> anyhow::Result<()> {
    tracing::info!("testing configuration and text");
    let config_ok = config.reload();
    let catalog_ok = match catalog.reload() {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::error!("{}", e);
            false
        }
    };
    if config_ok && catalog_ok {
        tracing::info!("OK");
        println!("✅ OK");
        Ok(())
    } else {
        tracing::error!("FAIL");
        eprintln!("❌ FAIL");
        std::process::exit(1);
    }
}

/// `disp`: cycle the catalog on the display forever, range header then body.
fn run_disp(
    catalog: &mut QuoteCatalog,
    mut display: DisplayController<PipeSink, GreedyFormatter>,
    clock: &SystemClock,
    width: usize,
    entry: Option<usize>,
) -> anyhow::Result<()> {
    loop {
        if let Err(e) = catalog.reload() {
            tracing::error!("{}", e);
        }
        let records = catalog.records().to_vec();
        if records.is_empty() {
            tracing::info!("disp exiting");
            return Ok(());
        }
        for (i, record) in records.iter().enumerate() {
            let n = i + 1;
            if entry.is_some_and(|only| only != n) {
                continue;
            }
            display.show(&format!("{}: {}", n, record.raw_range), true, true, width)?;
            clock.sleep(Duration::from_secs(3));
            display.show(&record.body, true, true, width)?;
            clock.sleep(Duration::from_secs(9));
        }
    }
}

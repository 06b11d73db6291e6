// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// Use library instead of local modules
use sales_dashboard::logging::{self, LogTarget};
use sales_dashboard::report::render_report;
use sales_dashboard::{load_config, load_csv, Config, FilterSpec, SalesTable};

const USAGE: &str = "\
usage: sales-dashboard [tui|summary] [--data PATH] [--config FILE]
       sales-dashboard summary [--start DATE] [--end DATE] [--category NAME[,NAME]]... [--region NAME[,NAME]]...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Tui,
    Summary,
}

/// Filter flags for `summary`; anything left unset keeps its default
#[derive(Debug, Default, PartialEq)]
struct FilterArgs {
    start: Option<String>,
    end: Option<String>,
    categories: Vec<String>,
    regions: Vec<String>,
}

impl FilterArgs {
    fn is_empty(&self) -> bool {
        *self == FilterArgs::default()
    }

    /// Start from the defaults and narrow them with whatever was given
    fn to_spec(&self, table: &SalesTable) -> Result<FilterSpec> {
        let defaults = FilterSpec::defaults(table);
        if self.is_empty() {
            return Ok(defaults);
        }

        let start = self.start.clone().unwrap_or_else(|| defaults.start().to_string());
        let end = self.end.clone().unwrap_or_else(|| defaults.end().to_string());
        let categories: Vec<String> = if self.categories.is_empty() {
            defaults.categories().iter().cloned().collect()
        } else {
            self.categories.clone()
        };
        let regions: Vec<String> = if self.regions.is_empty() {
            defaults.regions().iter().cloned().collect()
        } else {
            self.regions.clone()
        };

        FilterSpec::parse(&start, &end, categories, regions).context("invalid --start/--end")
    }
}

#[derive(Debug)]
struct CliArgs {
    mode: Mode,
    data: Option<PathBuf>,
    config: Option<PathBuf>,
    filters: FilterArgs,
}

fn push_list(target: &mut Vec<String>, raw: &str) {
    target.extend(
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    );
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut cli = CliArgs {
        mode: Mode::Tui,
        data: None,
        config: None,
        filters: FilterArgs::default(),
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "tui" => cli.mode = Mode::Tui,
            "summary" => cli.mode = Mode::Summary,
            "--data" => {
                let value = iter.next().context("--data needs a path")?;
                cli.data = Some(PathBuf::from(value));
            }
            "--config" => {
                let value = iter.next().context("--config needs a path")?;
                cli.config = Some(PathBuf::from(value));
            }
            "--start" => {
                let value = iter.next().context("--start needs a date")?;
                cli.filters.start = Some(value.clone());
            }
            "--end" => {
                let value = iter.next().context("--end needs a date")?;
                cli.filters.end = Some(value.clone());
            }
            "--category" => {
                let value = iter.next().context("--category needs a name")?;
                push_list(&mut cli.filters.categories, value);
            }
            "--region" => {
                let value = iter.next().context("--region needs a name")?;
                push_list(&mut cli.filters.regions, value);
            }
            other => anyhow::bail!("unexpected argument '{}'\n{}", other, USAGE),
        }
    }

    if cli.mode == Mode::Tui && !cli.filters.is_empty() {
        anyhow::bail!("filter flags only apply to 'summary'; use the filter panel in the TUI\n{}", USAGE);
    }

    Ok(cli)
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let cli = parse_args(&args)?;

    match cli.mode {
        Mode::Tui => logging::initialize(LogTarget::File(Path::new("logs/sales-dashboard.log")))?,
        Mode::Summary => logging::initialize(LogTarget::Stderr)?,
    }

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(data) = &cli.data {
        config.data.path = data.display().to_string();
    }

    let table = load_table(&config)?;

    match cli.mode {
        Mode::Summary => run_summary(&table, &cli.filters, &config),
        Mode::Tui => run_ui_mode(table, &config),
    }
}

/// Load the dataset once; every later filter cycle borrows it
fn load_table(config: &Config) -> Result<Arc<SalesTable>> {
    let path = config.data_path();
    let table = load_csv(&path).with_context(|| format!("cannot load sales data from {}", path.display()))?;
    Ok(Arc::new(table))
}

fn run_summary(table: &SalesTable, filters: &FilterArgs, config: &Config) -> Result<()> {
    let spec = filters.to_spec(table)?;
    print!("{}", render_report(table, &spec, config.dashboard.top_n));
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(table: Arc<SalesTable>, config: &Config) -> Result<()> {
    println!("🖥️  Loading Sales Dashboard v{} UI...\n", sales_dashboard::VERSION);
    println!("✓ Loaded {} sales\n", table.len());
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(table, config.dashboard.top_n);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_table: Arc<SalesTable>, _config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or print a text report: sales-dashboard summary");
    std::process::exit(1);
}

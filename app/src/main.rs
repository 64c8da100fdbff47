use std::path::PathBuf;

use clap::{Parser, Subcommand};
use common::{
    config::{Config, PlotStyle},
    plot::{Plot, plot},
    util::read_yaml_file,
};
use eyre::Result;
use tracing::{debug, error};
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

mod args;

use args::{BarsArgs, LinesArgs};

/// Workspace crates that log, filtered at the same level as the binary
const MODULES: &[&str] = &["common", "plot_common", "line_plot", "bar_plot"];

#[derive(Parser)]
#[command(about = "Plot google benchmark results of sorting algorithms")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Style overrides, yaml
    #[arg(short, long, global = true)]
    style: Option<PathBuf>,
    /// Extra tracing filter directives, ie. `common=debug`
    #[arg(short, long, global = true)]
    log: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Plot up to four csv reports against each other
    Lines(LinesArgs),
    /// Plot json results per input distribution as grouped bars
    Bars(BarsArgs),
    /// Render every plot of a config file
    Render {
        #[arg(short, long, default_value = "plots.yaml")]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let args = Cli::parse();
    let file_appender = tracing_appender::rolling::never(".", "log.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let mut env_filter = EnvFilter::new(format!("sortbench_plot={log_level}"));

    if !args.log.is_empty() {
        for log in &args.log {
            env_filter = env_filter.add_directive(log.parse()?);
        }
    }

    for module in MODULES {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .with(layer().with_writer(non_blocking).with_ansi(false))
        .init();

    if let Err(err) = run(args) {
        error!("{err:#}");
        return Err(err);
    }
    Ok(())
}

fn run(args: Cli) -> Result<()> {
    let cli_style = args
        .style
        .as_deref()
        .map(|path| read_yaml_file::<PlotStyle>(path))
        .transpose()?;

    let (plots, style): (Vec<Box<dyn Plot>>, Option<PlotStyle>) = match args.command {
        Commands::Lines(lines) => {
            let lines: Box<dyn Plot> = Box::new(lines.into_plot()?);
            (vec![lines], cli_style)
        }
        Commands::Bars(bars) => {
            let bars: Box<dyn Plot> = Box::new(bars.into_plot());
            (vec![bars], cli_style)
        }
        Commands::Render { config } => {
            let config: Config = read_yaml_file(&config)?;
            debug!("Loaded {} plots for {}", config.plots.len(), config.name);
            (config.plots, cli_style.or(config.style))
        }
    };

    let style = style.unwrap_or_default();
    style.validate()?;
    plot(&plots, &style)
}

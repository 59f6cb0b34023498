use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context as _;
use camino::Utf8PathBuf;
use clap::Parser;
use console::style;
use gantry::{Config, Executor, UnknownTaskError, as_overhead, recipe};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
struct Args {
    /// Tasks or aliases to run, in order.
    #[arg(default_value = recipe::DEFAULT)]
    tasks: Vec<String>,

    /// Project root.
    #[arg(short, long, default_value = ".")]
    base: Utf8PathBuf,

    /// Package descriptor, `<base>/package.json` by default.
    #[arg(long)]
    package: Option<Utf8PathBuf>,

    /// List the available tasks and aliases.
    #[arg(short, long)]
    list: bool,

    /// Print the task declaration as a mermaid flowchart.
    #[arg(long)]
    graph: bool,

    /// Increase log verbosity, may be repeated.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output.
    #[arg(long)]
    no_color: bool,
}

fn init_logging(args: &Args) {
    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let indicatif = IndicatifLayer::new();

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(!args.no_color)
                .with_writer(indicatif.get_stderr_writer()),
        )
        .with(indicatif)
        .init();
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = Config::load_with(&args.base, args.package.as_deref())
        .context("Couldn't load the project configuration")?;
    let pipeline = recipe::declare(&config)?;

    if args.graph {
        print!("{pipeline}");
        return Ok(());
    }

    if args.list {
        println!("{}", style("Available aliases").bold());
        for alias in pipeline.aliases() {
            let about = alias.description().unwrap_or_default();
            println!("  {:<28} {about}", style(alias.name()).cyan());
            println!("  {:<28} [{}]", "", alias.steps().join(", "));
        }

        println!("\n{}", style("Available tasks").bold());
        for (name, task) in pipeline.registry().iter() {
            println!("  {:<28} {task}", style(name).cyan());
        }
        return Ok(());
    }

    // Every name has to be known before anything runs.
    if let Some(name) = args.tasks.iter().find(|name| !pipeline.contains(name)) {
        return Err(UnknownTaskError(name.clone()).into());
    }

    let executor = Executor::new(&pipeline, &config);

    for name in &args.tasks {
        let s = Instant::now();
        let report = executor.run(name)?;

        tracing::debug!("{name} finished:\n{report}");
        eprintln!("Finished {} {}", style(name).green(), as_overhead(s));
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    init_logging(&args);

    eprintln!(
        "Running {} for {}",
        style("gantry").red(),
        style(args.tasks.join(", ")).blue()
    );

    match run(&args) {
        Ok(()) => {
            eprintln!("\n{}", style("Done, without errors.").green());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("\n{} {e:#}", style("Aborted:").red().bold());
            ExitCode::FAILURE
        }
    }
}

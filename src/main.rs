use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use docship::config::AppConfig;
use docship::runner::{CommandRunner, DryRunRunner, ShellRunner};
use docship::workflow::PublishWorkflow;

const COMPLETION_MARKER: &str = "=== All operations completed! ===";

#[derive(Parser)]
#[command(
    name = "docship",
    about = "Branch, commit, push and open a pull request for a directory of changes"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Log the commands instead of running them
    #[arg(long)]
    dry_run: bool,

    /// Print the step report as JSON
    #[arg(long)]
    json: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    show_config: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout stays clean for the report
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_json);

    let config = AppConfig::load(cli.config.as_deref())?;

    if cli.show_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let runner: Box<dyn CommandRunner> = if cli.dry_run {
        Box::new(DryRunRunner)
    } else {
        Box::new(ShellRunner::new(config.repository.shell.clone()))
    };

    tracing::info!(
        repo = %config.repository.path.display(),
        branch = %config.branch.name,
        dry_run = cli.dry_run,
        "Loaded configuration"
    );

    let workflow = PublishWorkflow::new(runner.as_ref(), &config)?;
    let report = workflow.run().await;

    // Step failures never change the exit status
    if cli.json {
        println!("{}", report.to_json()?);
        eprintln!("{COMPLETION_MARKER}");
    } else {
        print!("{}", report.summary());
        println!("{COMPLETION_MARKER}");
    }

    Ok(())
}

use clap::{Args, Parser, Subcommand};
use connectprobe::{config, harness, report, CoreError, HarnessConfig};
use log::{error, LevelFilter};
use probe_core::ScenarioReport;
use probe_scenarios::CATALOG;

#[derive(Parser, Debug)]
#[command(name = "connectprobe", version, about = "Multi-actor scenario verification for HealthConnect")]
struct Cli {
    /// Nivel de log (error, warn, info, debug, trace). Pisa `RUST_LOG`.
    #[arg(long, global = true)]
    log: Option<LevelFilter>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lista los escenarios predefinidos.
    List,
    /// Ejecuta un escenario por nombre.
    Run {
        name: String,
        #[command(flatten)]
        target: Target,
    },
    /// Ejecuta todos los escenarios.
    RunAll {
        #[command(flatten)]
        target: Target,
    },
}

#[derive(Args, Debug)]
struct Target {
    /// Imprime el reporte como JSON.
    #[arg(long)]
    json: bool,
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    ws_url: Option<String>,
    #[arg(long)]
    frontend_url: Option<String>,
}

impl Target {
    fn config(&self) -> Result<HarnessConfig, CoreError> {
        let base = config()?;
        Ok(base.clone().with_overrides(self.api_url.clone(), self.ws_url.clone(), self.frontend_url.clone()))
    }
}

async fn execute(target: &Target, only: Option<&str>) -> Result<Vec<ScenarioReport>, CoreError> {
    let cfg = target.config()?;
    let mut runner = harness::build_runner(&cfg)?;
    match only {
        Some(name) => Ok(vec![harness::run_named(&mut runner, &cfg, name).await?]),
        None => harness::run_all(&mut runner, &cfg).await,
    }
}

fn print(target: &Target, reports: &[ScenarioReport]) -> Result<(), CoreError> {
    if target.json {
        println!("{}", report::render_json(reports)?);
    } else {
        for r in reports {
            println!("{}", report::render_text(r));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = cli.log {
        logger.filter_level(level);
    }
    logger.init();

    let (target, only) = match &cli.command {
        Command::List => {
            for entry in CATALOG {
                println!("{:<22} {}", entry.name, entry.description);
            }
            return;
        }
        Command::Run { name, target } => (target, Some(name.as_str())),
        Command::RunAll { target } => (target, None),
    };

    let outcome = match execute(target, only).await {
        Ok(reports) => print(target, &reports).map(|_| report::exit_code(&reports)),
        Err(e) => Err(e),
    };
    match outcome {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{e}");
            eprintln!("connectprobe: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

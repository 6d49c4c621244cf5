// Fleet Orchestration Engine - main entry point

use clap::Parser;
use fleet_engine::api::{Collaborators, LiveClient};
use fleet_engine::config::EngineConfig;
use fleet_engine::engine::AutomationService;
use fleet_engine::verbosity::set_verbosity_level;
use fleet_engine::{v_error, v_summary, AGENT_TOKEN_FILE};

#[derive(Parser, Debug)]
#[command(
    name = "fleet_engine",
    about = "Autonomous fleet orchestration over the SpaceTraders API"
)]
struct Args {
    /// Run exactly one tick and exit
    #[arg(long)]
    single_step: bool,

    /// Restrict orchestration to these ship symbols (comma separated)
    #[arg(long, value_delimiter = ',')]
    ships: Vec<String>,

    /// Verbosity: 0 summary only, 1 info, 2 debug
    #[arg(short, long, default_value_t = 1)]
    verbosity: u8,

    /// Path to the TOML configuration file
    #[arg(long, default_value = "fleet_engine.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    set_verbosity_level(args.verbosity);

    let token = std::fs::read_to_string(AGENT_TOKEN_FILE)
        .map_err(|e| format!("could not read {}: {}", AGENT_TOKEN_FILE, e))?
        .trim()
        .to_string();

    let config = EngineConfig::load_or_create(&args.config)?;
    config.print_summary();

    let client = LiveClient::new(token)?;
    let api = Collaborators::live(client);
    let mut service = AutomationService::new(api, config);
    service.restrict_to(args.ships);
    service.bootstrap().await?;

    if args.single_step {
        let report = service.step().await;
        v_summary!(
            "⏱️ single step done: {} actions started, {} outstanding",
            report.actions_started,
            report.outstanding
        );
        return Ok(());
    }

    tokio::select! {
        result = service.run() => {
            if let Err(error) = result {
                v_error!("🛑 engine stopped: {}", error);
                return Err(error);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            v_summary!("👋 interrupt received, shutting down");
        }
    }
    Ok(())
}

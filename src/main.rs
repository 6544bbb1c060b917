use std::{fs, path::PathBuf};

use chrono::Utc;
use clap::Parser;
use tracing::{error, Level};

use crm_analytics::{
    aggregate::{aggregate, filter_contracts, parse_period},
    cli::{Cli, Commands},
    configuration::{
        get_configuration, set_configuration, AppState, Config, State,
    },
    error::Error,
    handler::cache_refresh_task,
    model::Contract,
    provider::HttpApi,
    server,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let result = app_main().await;

    if let Err(err) = &result {
        error!("{}", err);
    }

    result
}

async fn app_main() -> Result<(), Error> {
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_level(true)
        .with_max_level(Level::INFO)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        None | Some(Commands::Serve) => serve().await,
        Some(Commands::Aggregate { input, period }) => {
            aggregate_file(input, period)
        },
    }
}

async fn serve() -> Result<(), Error> {
    let config = match init() {
        Ok(config) => config,
        Err(e) => return Err(Error::ConfigurationError(e.to_string())),
    };

    let http = HttpApi::new(config.clone())?;
    let state = State::new(config, http);
    let app_state = AppState::new(state);

    let (_, _) = tokio::try_join!(
        server::server_task(&app_state),
        cache_refresh_task(app_state.clone()),
    )?;

    Ok(())
}

fn init() -> Result<Config, Error> {
    set_configuration()?;
    let config = get_configuration()?;
    Ok(config)
}

fn aggregate_file(input: PathBuf, period: String) -> Result<(), Error> {
    let raw = fs::read_to_string(input)?;
    let contracts: Vec<Contract> = serde_json::from_str(&raw)?;

    let period = parse_period(&Some(period))?;
    let filtered = filter_contracts(contracts, period, Utc::now());
    let report = aggregate(&filtered)?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

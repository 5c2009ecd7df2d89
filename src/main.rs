#![doc = include_str!("../README.md")]

mod aggregate;
mod api;
mod catalog;
mod cli;
mod history;
mod pipeline;
mod prelude;
mod quantity;
mod sensor;
mod settings;
mod snapshot;
mod tables;

use chrono::Utc;
use clap::{Parser, crate_version};
use tokio::time::{MissedTickBehavior, interval};

use crate::{
    api::{EnergyCharts, EnergyChartsResponse},
    cli::{Args, Command, Format, InspectArgs, SavedPayload},
    history::Retention,
    pipeline::Pipeline,
    prelude::*,
    sensor::SensorOutput,
    settings::Settings,
    tables::build_outputs_table,
};

#[tokio::main]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    match Args::parse().command {
        Command::Poll(args) => {
            let handles: Vec<_> = args
                .settings
                .resolve()?
                .into_iter()
                .map(|settings| tokio::spawn(poll(settings, args.format)))
                .collect();
            for handle in handles {
                handle.await??;
            }
        }
        Command::Inspect(args) => {
            inspect(&args)?;
        }
    }

    Ok(())
}

/// Poll a single country forever, a failed fetch only skips the cycle.
#[instrument(skip_all, fields(country = %settings.country))]
async fn poll(settings: Settings, format: Format) -> Result {
    let api = EnergyCharts::new(settings.country)?;
    let mut interval = interval(settings.poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut pipeline = Pipeline::new(settings);

    if let Some(retention) = pipeline.settings().history {
        let today = Utc::now().date_naive();
        let response = match retention {
            Retention::Day | Retention::Week => api.get_week(today).await,
            Retention::Month => api.get_month(today).await,
        };
        match response {
            Ok(response) => {
                pipeline.backfill(&response.payloads());
            }
            Err(error) => {
                warn!("failed to fetch the history, starting empty: {error:#}");
            }
        }
    }

    loop {
        interval.tick().await;
        match api.get_week(Utc::now().date_naive()).await {
            Ok(response) => {
                print_outputs(pipeline.update(&response.latest_payload()), format)?;
            }
            Err(error) => {
                error!("failed to fetch the generation mix: {error:#}");
            }
        }
    }
}

/// Offline cycle over a saved payload.
fn inspect(args: &InspectArgs) -> Result {
    let saved = SavedPayload::read_from(&args.payload)?;
    for settings in args.settings.resolve()? {
        let mut pipeline = Pipeline::new(settings);
        let outputs = match &saved {
            SavedPayload::EnergyCharts(response) => inspect_response(&mut pipeline, response)?,
            SavedPayload::Raw(payload) => pipeline.try_update(payload)?,
        };
        print_outputs(outputs, args.format)?;
    }
    Ok(())
}

fn inspect_response<'a>(
    pipeline: &'a mut Pipeline,
    response: &EnergyChartsResponse,
) -> Result<&'a [SensorOutput]> {
    pipeline.backfill(&response.payloads());
    Ok(pipeline.try_update(&response.latest_payload())?)
}

fn print_outputs(outputs: &[SensorOutput], format: Format) -> Result {
    match format {
        Format::Table => {
            println!("{}", build_outputs_table(outputs));
        }
        Format::Json => {
            for output in outputs {
                println!("{}", serde_json::to_string(output)?);
            }
        }
    }
    Ok(())
}

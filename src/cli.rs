use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use crate::{
    api::EnergyChartsResponse,
    prelude::*,
    settings::{RawSettings, Settings},
    snapshot::RawPayload,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: periodically fetch the generation mix and print the sensor states.
    #[clap(name = "poll")]
    Poll(Box<PollArgs>),

    /// Run a single cycle on a previously saved payload.
    #[clap(name = "inspect")]
    Inspect(Box<InspectArgs>),
}

#[derive(Parser)]
pub struct PollArgs {
    #[clap(flatten)]
    pub settings: SettingsArgs,

    #[clap(long, env = "ENERGY_CHARTS_FORMAT", value_enum, default_value_t = Format::Table)]
    pub format: Format,
}

#[derive(Parser)]
pub struct InspectArgs {
    /// Energy-Charts response or a raw payload in JSON.
    #[clap(long)]
    pub payload: PathBuf,

    #[clap(flatten)]
    pub settings: SettingsArgs,

    #[clap(long, env = "ENERGY_CHARTS_FORMAT", value_enum, default_value_t = Format::Table)]
    pub format: Format,
}

#[derive(Parser)]
pub struct SettingsArgs {
    /// TOML configuration file, overrides the command-line settings.
    #[clap(long, env = "ENERGY_CHARTS_CONFIG")]
    pub config: Option<PathBuf>,

    #[clap(flatten)]
    pub raw: RawSettings,
}

impl SettingsArgs {
    /// Validated settings, one per country.
    pub fn resolve(&self) -> Result<Vec<Settings>> {
        let raw = match &self.config {
            Some(path) => RawSettings::read_from(path)?,
            None => self.raw.clone(),
        };
        raw.validate().map_err(|error| {
            let field = error.field();
            Error::new(error).context(format!("invalid setting `{field}`"))
        })
    }
}

#[derive(Copy, Clone, ValueEnum)]
pub enum Format {
    Table,
    Json,
}

/// Saved input of the `inspect` command.
pub enum SavedPayload {
    EnergyCharts(EnergyChartsResponse),
    Raw(RawPayload),
}

impl SavedPayload {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        Self::from_json(&contents).with_context(|| format!("failed to parse `{}`", path.display()))
    }

    /// Energy-Charts responses are lists, raw payloads are objects.
    pub fn from_json(contents: &str) -> Result<Self> {
        if contents.trim_start().starts_with('[') {
            Ok(Self::EnergyCharts(serde_json::from_str(contents)?))
        } else {
            Ok(Self::Raw(RawPayload::from_json(contents)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;
    use crate::settings::ConfigError;

    #[test]
    fn test_args() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_poll() {
        let args = Args::try_parse_from([
            "energy-charts",
            "poll",
            "--countries",
            "de,fr",
            "--top-n",
            "3",
            "--format",
            "json",
        ])
        .unwrap();
        let Command::Poll(args) = args.command else { panic!("expected `poll`") };
        assert!(matches!(args.format, Format::Json));
        let settings = args.settings.resolve().unwrap();
        assert_eq!(settings.len(), 2);
        assert_eq!(settings[1].top_n, 3);
    }

    #[test]
    fn test_resolve_names_the_invalid_field() {
        let args = Args::try_parse_from(["energy-charts", "poll", "--enable-history"]).unwrap();
        let Command::Poll(args) = args.command else { panic!("expected `poll`") };
        let error = args.settings.resolve().unwrap_err();
        assert_eq!(error.to_string(), "invalid setting `history_range`");
        assert!(error.downcast_ref::<ConfigError>().is_some());
    }

    #[test]
    fn test_saved_payload() -> Result {
        // language=JSON
        let raw = r#"{"timestamp": 1748779200, "entries": [{"identifier": "Solar", "value": 1.0}]}"#;
        assert!(matches!(SavedPayload::from_json(raw)?, SavedPayload::Raw(_)));
        // language=JSON
        let response = r#"[{"name": {"en": "Solar"}, "xAxisValues": [1748779200000], "data": [1.0]}]"#;
        assert!(matches!(SavedPayload::from_json(response)?, SavedPayload::EnergyCharts(_)));
        Ok(())
    }
}

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use jobwatch_core::relevance::{parse_keywords, KeywordProfile};
use jobwatch_sync::{report_text, Dashboard, SearchForm, SortMode, WatchConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "jobwatch")]
#[command(about = "Job-search dashboard with new-listing detection")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the web dashboard.
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Search once and print the sorted list.
    Search {
        #[command(flatten)]
        search: SearchArgs,
        /// Print the dashboard as JSON.
        #[arg(long)]
        json: bool,
    },
    #[command(subcommand)]
    Snapshot(SnapshotCommand),
}

#[derive(Debug, Subcommand)]
enum SnapshotCommand {
    Show,
    /// Search, then store the results as the new baseline.
    Save {
        #[command(flatten)]
        search: SearchArgs,
    },
    Delete,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    New,
    Distance,
}

#[derive(Debug, Args)]
struct SearchArgs {
    #[arg(long)]
    location: Option<String>,
    /// On-site radius in km (25 or 50).
    #[arg(long)]
    radius: Option<u32>,
    #[arg(long)]
    no_home_office: bool,
    #[arg(long)]
    home_office_radius: Option<u32>,
    #[arg(long)]
    query: Option<String>,
    #[arg(long)]
    max_age: Option<u32>,
    #[arg(long)]
    page_size: Option<u32>,
    #[arg(long)]
    api_key: Option<String>,
    #[arg(long)]
    hide_irrelevant: bool,
    #[arg(long)]
    min_score: Option<i32>,
    #[arg(long, value_enum, default_value_t = SortArg::New)]
    sort: SortArg,
    /// Comma- or newline-separated focus keywords replacing the rules file's list.
    #[arg(long)]
    focus_keywords: Option<String>,
    #[arg(long)]
    leadership_keywords: Option<String>,
    #[arg(long)]
    negative_keywords: Option<String>,
}

impl SearchArgs {
    fn form(&self) -> SearchForm {
        let defaults = SearchForm::default();
        SearchForm {
            location: self.location.clone().unwrap_or(defaults.location),
            onsite_radius_km: self.radius.unwrap_or(defaults.onsite_radius_km),
            include_home_office: !self.no_home_office,
            home_office_radius_km: self
                .home_office_radius
                .unwrap_or(defaults.home_office_radius_km),
            query: self.query.clone().unwrap_or(defaults.query),
            max_age_days: self.max_age.unwrap_or(defaults.max_age_days),
            page_size: self.page_size.unwrap_or(defaults.page_size),
            api_key: self.api_key.clone().unwrap_or(defaults.api_key),
            hide_irrelevant: self.hide_irrelevant,
            min_score: self.min_score,
            sort: match self.sort {
                SortArg::New => SortMode::NewFirst,
                SortArg::Distance => SortMode::Distance,
            },
            ..defaults
        }
        .normalized()
    }

    fn dashboard(&self, config: &WatchConfig) -> Result<Dashboard> {
        let dashboard = open_dashboard(config)?;
        let mut profile = dashboard.profile().clone();
        Ok(if self.override_keywords(&mut profile) {
            dashboard.with_profile(profile)
        } else {
            dashboard
        })
    }

    /// Replace the lists given on the command line; true if any was.
    fn override_keywords(&self, profile: &mut KeywordProfile) -> bool {
        let overrides = [
            (&self.focus_keywords, &mut profile.focus),
            (&self.leadership_keywords, &mut profile.leadership),
            (&self.negative_keywords, &mut profile.negative),
        ];
        let mut changed = false;
        for (text, list) in overrides {
            if let Some(text) = text {
                *list = parse_keywords(text);
                changed = true;
            }
        }
        changed
    }
}

fn open_dashboard(config: &WatchConfig) -> Result<Dashboard> {
    let dashboard = Dashboard::from_config(config)?;
    let profile = dashboard.profile();
    info!(
        api_base = %dashboard.api_base(),
        state_dir = %dashboard.store().dir().display(),
        focus = profile.focus.len(),
        leadership = profile.leadership.len(),
        negative = profile.negative.len(),
        "dashboard configured"
    );
    Ok(dashboard)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = WatchConfig::from_env();

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.web_port = port;
            }
            jobwatch_web::serve(&config).await?;
        }
        Commands::Search { search, json } => {
            let dashboard = search.dashboard(&config)?;
            let view = dashboard.build(&search.form()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                println!("{}", report_text(&view));
            }
        }
        Commands::Snapshot(SnapshotCommand::Show) => {
            let dashboard = open_dashboard(&config)?;
            let snapshot = dashboard.store().load().await?;
            match snapshot.timestamp.as_deref() {
                Some(ts) => println!("snapshot {ts}: {} listings", snapshot.items.len()),
                None => println!("no snapshot saved yet"),
            }
            for item in &snapshot.items {
                println!(
                    "  {} | {} | {}",
                    item.id().unwrap_or_else(|| "-".into()),
                    item.title(),
                    item.bucket()
                );
            }
        }
        Commands::Snapshot(SnapshotCommand::Save { search }) => {
            let dashboard = search.dashboard(&config)?;
            let view = dashboard.save_snapshot(&search.form()).await?;
            for error in &view.errors {
                eprintln!("warning: {error}");
            }
            info!(
                listings = view.items.len(),
                path = %dashboard.store().path().display(),
                "snapshot saved"
            );
            println!(
                "snapshot saved: {} listings at {}",
                view.items.len(),
                view.snapshot_timestamp.as_deref().unwrap_or("-")
            );
        }
        Commands::Snapshot(SnapshotCommand::Delete) => {
            let dashboard = open_dashboard(&config)?;
            let deleted = dashboard.delete_snapshot().await?;
            info!(deleted, path = %dashboard.store().path().display(), "snapshot delete");
            if deleted {
                println!("snapshot deleted");
            } else {
                println!("no snapshot to delete");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_args(args: &[&str]) -> SearchArgs {
        let mut argv = vec!["jobwatch", "search"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Some(Commands::Search { search, .. }) => search,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn keyword_flags_replace_only_the_given_lists() {
        let args = search_args(&[
            "--leadership-keywords",
            "Leiter, Head",
            "--negative-keywords",
            "vertrieb\naußendienst",
        ]);
        let mut profile = KeywordProfile::default();
        assert!(args.override_keywords(&mut profile));
        assert_eq!(profile.focus, KeywordProfile::default().focus);
        assert_eq!(profile.leadership, vec!["Leiter", "Head"]);
        assert_eq!(profile.negative, vec!["vertrieb", "außendienst"]);

        let mut untouched = KeywordProfile::default();
        assert!(!search_args(&[]).override_keywords(&mut untouched));
        assert_eq!(untouched, KeywordProfile::default());
    }

    #[test]
    fn search_args_normalize_into_a_form() {
        let form = search_args(&["--radius", "40", "--no-home-office", "--sort", "distance"]).form();
        assert_eq!(form.onsite_radius_km, 50);
        assert!(!form.include_home_office);
        assert_eq!(form.sort, SortMode::Distance);
    }
}

use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use royalbit_roster::cli;
use royalbit_roster::config::{RosterConfig, DEFAULT_CONFIG_FILE};
use royalbit_roster::error::RosterResult;
use royalbit_roster::header::Month;
use royalbit_roster::roster::RosterService;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "roster")]
#[command(about = "Schedule and duty-roster lookups over cached spreadsheets.")]
#[command(long_about = "Roster - schedule and duty-roster lookups
Sheets are parsed once, indexed, and reused until the file changes.

COMMANDS:
  schedule  - A person's schedule for a month (optionally analyzed)
  duties    - Who is on duty on a date (or the whole month)
  heads     - Which heads work on a date
  group     - Members of a head's group on a date
  active    - Duties and heads active at a moment (overnight aware)
  watch     - Invalidate and reload when division files change

EXAMPLES:
  roster schedule \"Петров Петр Петрович\" --month июль --division support --analyze
  roster duties --date 2024-07-01 --division support
  roster active --division support --at 2024-07-02T02:30

CONFIG:
  roster.yaml in the current directory, or --config / ROSTER_CONFIG")]
#[command(version)]
struct Cli {
    /// Path to roster.yaml
    #[arg(short, long, global = true, env = "ROSTER_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a person's schedule for a month
    Schedule {
        /// Full name as written in the schedule sheet
        name: String,

        /// Month name (июль) or number (7)
        #[arg(short, long)]
        month: Month,

        /// Division from roster.yaml
        #[arg(short, long)]
        division: String,

        /// Also split the month into categories with work hours
        #[arg(short, long)]
        analyze: bool,
    },

    /// Show duties for a date
    Duties {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Division from roster.yaml
        #[arg(short, long)]
        division: String,

        /// Show every day of the date's month
        #[arg(short, long)]
        month: bool,
    },

    /// Show heads working on a date
    Heads {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Division from roster.yaml
        #[arg(short, long)]
        division: String,
    },

    /// Show the members of a head's group
    Group {
        /// Head's full name
        head: String,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Division from roster.yaml
        #[arg(short, long)]
        division: String,
    },

    /// Show duties and heads active at a moment
    Active {
        /// Division from roster.yaml
        #[arg(short, long)]
        division: String,

        /// Moment (YYYY-MM-DDTHH:MM), defaults to now
        #[arg(long, value_parser = parse_moment)]
        at: Option<NaiveDateTime>,
    },

    /// Reload the cache whenever a division file changes
    Watch {
        /// Division from roster.yaml
        #[arg(short, long)]
        division: String,

        /// Show watched directories
        #[arg(short, long)]
        verbose: bool,
    },
}

fn parse_moment(s: &str) -> Result<NaiveDateTime, String> {
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| format!("Invalid moment '{}', expected YYYY-MM-DDTHH:MM", s))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[tokio::main]
async fn main() -> RosterResult<()> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "royalbit_roster=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = RosterConfig::load(&args.config)?;
    let service = RosterService::from_config(config);

    match args.command {
        Commands::Schedule {
            name,
            month,
            division,
            analyze,
        } => cli::schedule(&service, &name, month, &division, analyze).await,

        Commands::Duties {
            date,
            division,
            month,
        } => cli::duties(&service, date.unwrap_or_else(today), &division, month).await,

        Commands::Heads { date, division } => {
            cli::heads(&service, date.unwrap_or_else(today), &division).await
        }

        Commands::Group {
            head,
            date,
            division,
        } => cli::group(&service, &head, date.unwrap_or_else(today), &division).await,

        Commands::Active { division, at } => {
            let at = at.unwrap_or_else(|| Local::now().naive_local());
            cli::active(&service, at, &division).await
        }

        Commands::Watch { division, verbose } => cli::watch(&service, &division, verbose).await,
    }
}

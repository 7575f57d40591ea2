use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod config;
mod controller;
mod db;
mod directory;
mod error;
mod filter;
mod models;
mod report;
mod source;

use config::Settings;
use controller::{GroupFilters, StudentFilters};
use directory::GroupDirectory;
use models::{GroupTypeFilter, Roster, SortOption, SortSurface};
use source::RosterSource;

#[derive(Parser)]
#[command(name = "roster-dashboard")]
#[command(about = "Student and group roster dashboard for Group Scholar", long_about = None)]
struct Cli {
    /// Read the roster from a JSON snapshot instead of Postgres
    #[arg(long, global = true)]
    roster: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Import students from a CSV export
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Import a full JSON roster snapshot (groups, students, school groups)
    ImportRoster {
        #[arg(long)]
        json: PathBuf,
    },
    /// List students matching a search, group selection and sort order
    Students {
        #[arg(long, default_value = "")]
        search: String,
        /// Group id to filter by; repeat for any-of matching
        #[arg(long = "group")]
        groups: Vec<String>,
        /// Select every known group
        #[arg(long, conflicts_with = "groups")]
        all_groups: bool,
        #[arg(long)]
        sort: Option<String>,
        /// Offer the count-based sorts as well
        #[arg(long)]
        extended_sort: bool,
    },
    /// List school groups, optionally narrowed by type and search
    Groups {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long = "type", default_value = "all")]
        group_type: GroupTypeFilter,
        /// Only the groups you belong to
        #[arg(long, conflicts_with_all = ["search", "group_type"])]
        mine: bool,
    },
    /// Show the group picker options, narrowed by name
    GroupOptions {
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Print the sort menu
    Sorts {
        #[arg(long)]
        extended: bool,
        #[arg(long, default_value = "name-asc")]
        current: SortOption,
    },
}

async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

async fn load_roster(settings: &Settings, file: Option<PathBuf>) -> anyhow::Result<Roster> {
    match settings.roster_source(file)? {
        RosterSource::File(path) => source::load_roster_file(&path),
        RosterSource::Database(url) => {
            let pool = connect(&url).await?;
            db::fetch_roster(&pool).await
        }
    }
}

fn surface_for(settings: &Settings, extended: bool) -> SortSurface {
    if extended {
        SortSurface::Extended
    } else {
        settings.sort_surface
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&settings.log_filter)
                .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::InitDb => {
            let pool = connect(settings.require_database_url()?).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Import { csv } => {
            let pool = connect(settings.require_database_url()?).await?;
            let summary = db::import_csv(&pool, &csv).await?;
            println!(
                "Imported {} students from {} ({summary}).",
                summary.total(),
                csv.display()
            );
        }
        Commands::ImportRoster { json } => {
            let roster = source::load_roster_file(&json)?;
            let pool = connect(settings.require_database_url()?).await?;
            let summary = db::import_roster(&pool, &roster).await?;
            println!("Imported roster from {}.", json.display());
            println!("  groups: {}", summary.groups);
            println!("  students: {}", summary.students);
            println!("  school groups: {}", summary.school_groups);
        }
        Commands::Students {
            search,
            groups,
            all_groups,
            sort,
            extended_sort,
        } => {
            let roster = load_roster(&settings, cli.roster).await?;
            let surface = surface_for(&settings, extended_sort);
            let mut filters = StudentFilters::new(
                roster.students,
                GroupDirectory::new(roster.groups),
                surface,
            );

            filters.set_search(search);
            if all_groups {
                filters.select_all_groups();
            } else if !groups.is_empty() {
                filters.set_selected_groups(groups);
            }
            if let Some(sort) = sort {
                match surface.parse_option(&sort) {
                    Ok(option) => filters.set_sort(option),
                    Err(error) => warn!(%error, "ignoring sort, keeping current order"),
                }
            }

            print!("{}", report::build_student_report(&filters));
        }
        Commands::Groups {
            search,
            group_type,
            mine,
        } => {
            let roster = load_roster(&settings, cli.roster).await?;
            let mut filters = GroupFilters::new(roster.school_groups);
            filters.set_group_type(group_type);
            filters.set_search(search);

            print!("{}", report::build_group_report(&filters, mine));
        }
        Commands::GroupOptions { search } => {
            let roster = load_roster(&settings, cli.roster).await?;
            let directory = GroupDirectory::new(roster.groups);

            print!("{}", report::build_group_options(&directory, &search));
        }
        Commands::Sorts { extended, current } => {
            let surface = surface_for(&settings, extended);
            print!("{}", report::build_sort_menu(surface, current));
        }
    }

    Ok(())
}

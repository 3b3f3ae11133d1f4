use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use club_arena::chart::{
    league_series, participation_series, render_bar_chart, render_line_chart, LineChart,
};
use club_arena::config::AppConfig;
use club_arena::models::Scope;
use club_arena::storage::{LeaderboardStore, StorageConfig};
use club_arena::sync::Pipeline;

#[derive(Parser)]
#[command(name = "club-arena")]
#[command(about = "Leaderboards and charts for a Lichess club's arena tournaments")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch new results and rebuild every leaderboard
    Sync,

    /// Print a stored leaderboard
    Leaderboard {
        /// Year to show (all-time if omitted)
        #[arg(long)]
        year: Option<i32>,

        /// Number of rows to show
        #[arg(long)]
        top: Option<usize>,
    },

    /// Render a chart as SVG
    Chart {
        #[arg(value_enum)]
        kind: ChartKind,

        /// Year of the leaderboard chart (all-time if omitted)
        #[arg(long)]
        year: Option<i32>,

        /// Number of players in the leaderboard chart
        #[arg(long)]
        top: Option<usize>,

        /// Output file (defaults to the data directory's charts folder)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ChartKind {
    Participation,
    League,
    Leaderboard,
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn write_chart(path: &Path, svg: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, svg).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    let level = cli.log_level.unwrap_or_else(|| config.log_level.clone());

    init_tracing(&level, cli.json_logs);
    tracing::info!("Starting club-arena v{}", env!("CARGO_PKG_VERSION"));

    let storage = StorageConfig::new(config.data_dir.clone());

    match cli.command {
        Commands::Sync => {
            let pipeline = Pipeline::lichess(&config)?;
            let run = pipeline.run().await?;

            println!("\n=== Sync Results ===");
            println!("Tournaments:      {}", run.records.len());
            println!("Fetched:          {}", run.warm.fetched);
            println!("Already cached:   {}", run.warm.cached);
            println!("Aliased names:    {}", run.aliased);
            for (scope, board) in &run.boards {
                println!("{:<17} {} players", format!("{}:", scope), board.len());
            }
        }

        Commands::Leaderboard { year, top } => {
            let scope = Scope::from(year);
            let board = LeaderboardStore::from_storage(&storage)
                .load(scope)
                .with_context(|| format!("No {} leaderboard stored; run `sync` first", scope))?;
            let rows = board.top(top.unwrap_or(board.len()));

            println!("\n=== Leaderboard ({}) ===", scope);
            println!(
                "{:>4}  {:<24} {:>3} {:>3} {:>3} {:>7} {:>6} {:>7}",
                "#", "Player", "1st", "2nd", "3rd", "Podiums", "Played", "Score"
            );
            for (i, row) in rows.iter().enumerate() {
                println!(
                    "{:>4}  {:<24} {:>3} {:>3} {:>3} {:>7} {:>6} {:>7}",
                    i + 1,
                    row.player,
                    row.first_places,
                    row.second_places,
                    row.third_places,
                    row.podiums(),
                    row.participations,
                    row.total_score
                );
            }
        }

        Commands::Chart {
            kind,
            year,
            top,
            out,
        } => {
            let charts_dir = storage.charts_dir();
            match kind {
                ChartKind::Participation | ChartKind::League => {
                    let pipeline = Pipeline::lichess(&config)?;
                    let (records, _, _) = pipeline.collect().await?;

                    let (svg, default_name) = match kind {
                        ChartKind::League => (
                            render_line_chart(
                                &LineChart::league(),
                                &league_series(&records, config.chart.league_fallback),
                            ),
                            "league.svg",
                        ),
                        _ => (
                            render_line_chart(
                                &LineChart::participation(),
                                &participation_series(&records),
                            ),
                            "participation.svg",
                        ),
                    };
                    write_chart(&out.unwrap_or_else(|| charts_dir.join(default_name)), &svg)?;
                }
                ChartKind::Leaderboard => {
                    let scope = Scope::from(year);
                    let board = LeaderboardStore::from_storage(&storage)
                        .load(scope)
                        .with_context(|| {
                            format!("No {} leaderboard stored; run `sync` first", scope)
                        })?;
                    let rows = board.top(top.unwrap_or(config.chart.top_players));
                    let title = format!("Top {} players ({})", rows.len(), scope);

                    let path = out.unwrap_or_else(|| {
                        charts_dir.join(format!("{}.svg", scope.table_name()))
                    });
                    write_chart(&path, &render_bar_chart(&title, rows))?;
                }
            }
        }
    }

    Ok(())
}

use agrotile::aggregation::{summarize_tiles, TileReport};
use agrotile::bounds::bounds_from_geojson;
use agrotile::config::PipelineConfig;
use agrotile::enrichment::apply;
use agrotile::geometry::parse_geojson;
use agrotile::model::Tile;
use agrotile::tiling::PolygonTiler;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, trace};

/// Tile land areas and summarize per-tile recommendations
#[derive(Parser)]
#[command(name = "agrotile")]
#[command(about = "Polygon tiling and area summaries", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tile a GeoJSON polygon and print the centroid matrix and tiles
    Tile {
        /// GeoJSON file (Polygon, MultiPolygon, Feature or collection)
        polygon: PathBuf,

        /// Cell size in meters (default from configuration)
        #[arg(short = 's', long)]
        cell_size: Option<u32>,
    },
    /// Print the bounding envelope of a GeoJSON polygon
    Bounds {
        polygon: PathBuf,
    },
    /// Merge a recommendation payload into a tiles file
    Apply {
        /// JSON array of tiles
        tiles: PathBuf,
        /// Recommendation service reply
        payload: PathBuf,
        /// Write the updated tiles here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Summarize a tiles file
    Summarize {
        tiles: PathBuf,

        /// Processing time to report, in seconds
        #[arg(long)]
        processing_seconds: Option<f64>,
    },
    /// Print per-tile display rows
    Report {
        tiles: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match PipelineConfig::load(cli.config.as_deref()).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            std::process::exit(1);
        }
    };

    let log_level = match cli.verbose {
        0 => config.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(log_level))
        .with_target(cli.verbose >= 2)
        .with_writer(std::io::stderr)
        .init();

    debug!("agrotile started with verbosity level: {}", cli.verbose);
    trace!("Configuration: {:?}", config);

    let result = match cli.command {
        Commands::Tile { polygon, cell_size } => run_tile(&config, &polygon, cell_size).await,
        Commands::Bounds { polygon } => run_bounds(&polygon).await,
        Commands::Apply {
            tiles,
            payload,
            output,
        } => run_apply(&tiles, &payload, output.as_deref()).await,
        Commands::Summarize {
            tiles,
            processing_seconds,
        } => run_summarize(&tiles, processing_seconds).await,
        Commands::Report { tiles } => run_report(&tiles).await,
    };

    if let Err(e) = result {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn read_json(path: &Path) -> Result<Value> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("{} is not valid JSON", path.display()))
}

async fn read_tiles(path: &Path) -> Result<Vec<Tile>> {
    let value = read_json(path).await?;
    serde_json::from_value(value)
        .with_context(|| format!("{} is not a JSON array of tiles", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_tile(config: &PipelineConfig, path: &Path, cell_size: Option<u32>) -> Result<()> {
    let cell_size = cell_size.unwrap_or(config.default_cell_size_m);
    if !(config.min_cell_size_m..=config.max_cell_size_m).contains(&cell_size) {
        return Err(anyhow!(
            "cell size must be between {} and {} m, got {}",
            config.min_cell_size_m,
            config.max_cell_size_m,
            cell_size
        ));
    }

    let geojson = parse_geojson(&read_json(path).await?)?;
    let output = PolygonTiler::new(f64::from(cell_size))?.tile(&geojson)?;
    info!(
        "Tiled {} into {} tiles ({} x {})",
        path.display(),
        output.tiles.len(),
        output.matrix.rows(),
        output.matrix.cols()
    );

    let tiles: Vec<Value> = output
        .tiles
        .iter()
        .map(|tile| {
            json!({
                "tile_id": tile.key(),
                "row": tile.row,
                "col": tile.col,
                "centroid": tile.centroid,
                "geometry": tile.to_geojson(),
            })
        })
        .collect();
    print_json(&json!({
        "cell_size_m": cell_size,
        "matrix": output.matrix,
        "tiles": tiles,
    }))
}

async fn run_bounds(path: &Path) -> Result<()> {
    let geometry = read_json(path).await?;
    let bounds = bounds_from_geojson(&geometry)
        .ok_or_else(|| anyhow!("cannot derive bounds from {}", path.display()))?;
    print_json(&bounds)
}

async fn run_apply(tiles_path: &Path, payload_path: &Path, output: Option<&Path>) -> Result<()> {
    let mut tiles = read_tiles(tiles_path).await?;
    let payload = read_json(payload_path).await?;
    let report = apply(&mut tiles, &payload);
    info!(
        "{} tiles enriched, {} without recommendations",
        report.enriched, report.unmatched
    );

    match output {
        Some(path) => {
            let content = serde_json::to_string_pretty(&tiles)?;
            tokio::fs::write(path, content)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            Ok(())
        }
        None => print_json(&tiles),
    }
}

async fn run_summarize(path: &Path, processing_seconds: Option<f64>) -> Result<()> {
    let tiles = read_tiles(path).await?;
    print_json(&summarize_tiles(&tiles, processing_seconds))
}

async fn run_report(path: &Path) -> Result<()> {
    let tiles = read_tiles(path).await?;
    let rows: Vec<TileReport> = tiles.iter().map(TileReport::from_tile).collect();
    print_json(&rows)
}

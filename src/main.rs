use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use terrain_generator::config::{random_seed, TerrainConfig};
use terrain_generator::erosion::ErosionPreset;
use terrain_generator::export;
use terrain_generator::logging::init_logging;
use terrain_generator::{TerrainError, TerrainMap};

#[derive(Parser, Debug)]
#[command(name = "terrain_generator")]
#[command(about = "Generate chunked procedural terrain with erosion and object scattering")]
struct Args {
    /// JSON config file (defaults are used if not specified)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Random seed (overrides the config)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Draw a fresh seed in [0, 100000)
    #[arg(long, conflicts_with = "seed")]
    random_seed: bool,

    /// Chunks along x (1-10)
    #[arg(short = 'x', long)]
    map_size_x: Option<usize>,

    /// Chunks along z (1-10)
    #[arg(short = 'z', long)]
    map_size_z: Option<usize>,

    /// Chunk edge in world units
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Level of detail (0-5)
    #[arg(short, long)]
    lod: Option<usize>,

    /// Erosion preset (drops any explicit erosion params from the config)
    #[arg(short, long, value_enum)]
    erosion: Option<ErosionPreset>,

    /// Write the stitched heightmap as a grayscale PNG
    #[arg(long)]
    heightmap: Option<PathBuf>,

    /// Write the region classification as a color PNG
    #[arg(long)]
    regions: Option<PathBuf>,

    /// Write the effective config as JSON
    #[arg(long)]
    write_config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "info,terrain_generator::erosion=debug"
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), TerrainError> {
    let loaded = match &args.config {
        Some(path) => TerrainConfig::load(path),
        None => Ok(TerrainConfig::default()),
    };

    // Logging must be up before a load failure is reported.
    let level = startup_log_level(args.log_level.as_deref(), &loaded);
    init_logging(level.as_deref());

    let mut config = loaded?;
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }

    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.random_seed {
        config.seed = random_seed();
    }
    if let Some(x) = args.map_size_x {
        config.map_size_x = x;
    }
    if let Some(z) = args.map_size_z {
        config.map_size_z = z;
    }
    if let Some(size) = args.chunk_size {
        config.chunk_size = size;
    }
    if let Some(lod) = args.lod {
        config.level_of_detail = lod;
    }
    if let Some(preset) = args.erosion {
        info!(%preset, "{}", preset.description());
        config.erosion_preset = preset;
        config.erosion = None;
    }

    let mut terrain = TerrainMap::new(config);
    let config = terrain.config().clone();
    info!(
        seed = config.seed,
        map = %format!("{}x{}", config.map_size_x, config.map_size_z),
        chunk_size = config.chunk_size,
        lod = config.lod_factor(),
        "generating terrain"
    );

    terrain.regenerate()?;

    if let Some(stats) = terrain.erosion_stats() {
        info!(
            droplets = stats.iterations,
            expired = stats.expired,
            stalled = stats.stalled,
            left_field = stats.left_field,
            eroded = stats.total_eroded,
            deposited = stats.total_deposited,
            "erosion summary"
        );
    }

    let report = terrain.placement_report();
    for (index, descriptor) in config.objects.iter().enumerate() {
        info!(object = %descriptor.name, placed = report.count_for(index), "placement summary");
    }
    info!(
        candidates = report.candidates,
        rejected_height = report.rejected_height,
        rejected_slope = report.rejected_slope,
        misses = report.misses,
        "placement totals"
    );

    if let Some(shared) = terrain.shared_heightfield() {
        info!(width = shared.width, height = shared.height, "shared heightfield");

        if let Some(path) = &args.heightmap {
            export::export_heightmap(shared, path)?;
        }
        if let (Some(path), Some(humidity)) = (&args.regions, terrain.shared_humidity()) {
            export::export_region_map(
                &config.regions,
                shared,
                humidity,
                config.height_multiplier,
                config.lod_factor(),
                path,
            )?;
        }
    }

    if let Some(path) = &args.write_config {
        config.save(path)?;
        info!(path = %path.display(), "wrote config");
    }

    Ok(())
}

/// CLI level first, then the loaded config's level. `None` falls back to the
/// default filter.
fn startup_log_level(cli: Option<&str>, loaded: &Result<TerrainConfig, TerrainError>) -> Option<String> {
    cli.map(str::to_string)
        .or_else(|| loaded.as_ref().ok().map(|config| config.log_level.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_survives_config_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let failed = TerrainConfig::load(&dir.path().join("missing.json"));
        assert!(failed.is_err());

        assert_eq!(startup_log_level(Some("debug"), &failed).as_deref(), Some("debug"));
        assert_eq!(startup_log_level(None, &failed), None);
    }

    #[test]
    fn test_cli_log_level_overrides_config() {
        let loaded = Ok(TerrainConfig {
            log_level: "warn".to_string(),
            ..Default::default()
        });
        assert_eq!(startup_log_level(None, &loaded).as_deref(), Some("warn"));
        assert_eq!(startup_log_level(Some("trace"), &loaded).as_deref(), Some("trace"));
    }
}

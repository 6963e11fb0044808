//! Debug tool for comparing erosion presets visually
//! Generates one noise field and renders it shaded once per preset, side by side

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use terrain_generator::erosion::{self, ErosionParams, ErosionPreset};
use terrain_generator::export::{create_grid, render_shaded_heightmap};
use terrain_generator::logging::init_logging;
use terrain_generator::noise_field::{generate_noise_field, normalize_field, ChannelExtrema, Extrema, NoiseParams, HEIGHT_CHANNEL};

#[derive(Parser, Debug)]
#[command(name = "debug_erosion")]
#[command(about = "Render a comparison grid of erosion presets")]
struct Args {
    /// Field edge in cells
    #[arg(long, default_value = "256")]
    size: usize,

    #[arg(short, long, default_value = "42")]
    seed: u64,

    #[arg(short, long, default_value = "erosion_comparison.png")]
    output: PathBuf,
}

fn main() {
    let args = Args::parse();
    init_logging(None);

    // Generate base terrain once
    let params = NoiseParams {
        scale: args.size as f32 / 4.0,
        ..Default::default()
    };
    let mut extrema = ChannelExtrema::new();
    let mut base = generate_noise_field(args.size, args.size, 1, &params, args.seed, [0.0, 0.0], &mut extrema);
    normalize_field(&mut base, HEIGHT_CHANNEL, &extrema);

    let mut images = Vec::new();
    for &preset in ErosionPreset::all() {
        let mut field = base.clone();
        let mut preset_extrema = ChannelExtrema::new();
        preset_extrema.set(HEIGHT_CHANNEL, Extrema::UNIT);

        let stats = erosion::erode(
            args.seed,
            &mut field,
            HEIGHT_CHANNEL,
            &ErosionParams::from_preset(preset),
            &mut preset_extrema,
        );
        info!(
            cell = images.len(),
            %preset,
            droplets = stats.iterations,
            mean_path = stats.mean_path_length(),
            net_change = stats.net_change(),
            "{}",
            preset.description()
        );
        images.push(render_shaded_heightmap(&field));
    }

    let grid = create_grid(&images, 2, 4);
    match grid.save(&args.output) {
        Ok(()) => info!(path = %args.output.display(), "saved comparison grid"),
        Err(e) => {
            eprintln!("Failed to save grid: {e}");
            std::process::exit(1);
        }
    }
}

use std::env;
use std::fs::create_dir_all;
use std::io;
use std::path::{Path, PathBuf};

use log::info;
use rand::{rngs::StdRng, RngCore, SeedableRng};
use structured_logger::json::new_writer;
use structured_logger::Builder;

use tile_features::config::{load_user_config, UserConfig};
use tile_features::errors::Result;
use tile_features::etl::tile_features::TileFeaturesEtl;
use tile_features::etl::Etl;

const DEFAULT_CONFIG_PATH: &str = "config/tile.json";

fn create_output_dir(config: &UserConfig) -> Result<PathBuf> {
    let input_fname = Path::new(&config.data_path)
        .file_name()
        .ok_or("Could not get input file name")?;
    let output_dir = Path::new(&config.dest_path).join(input_fname);
    create_dir_all(&output_dir)?;
    Ok(output_dir)
}

fn setup_logging(level: &str) {
    Builder::with_level(level)
        .with_target_writer("*", new_writer(io::stdout()))
        .init();
}

fn main() -> Result<()> {
    let mut config_path = DEFAULT_CONFIG_PATH.to_string();
    let mut rebuild = false;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--rebuild" => rebuild = true,
            _ => config_path = arg,
        }
    }

    let user_config = load_user_config(Path::new(&config_path))?;
    setup_logging(&user_config.log_level);

    let seed = user_config.seed.unwrap_or_else(|| rand::thread_rng().next_u64());
    info!(config = config_path.as_str(), seed = seed; "Starting tile build");

    let output_dir = create_output_dir(&user_config)?;
    let mut etl = TileFeaturesEtl::new(&user_config, StdRng::seed_from_u64(seed))?;
    if rebuild {
        etl.clean(&output_dir)?;
    }
    let outcome = etl.process(&output_dir)?;
    info!(outcome = format!("{:?}", outcome).as_str(), dir = output_dir.to_str().unwrap_or_default(); "Done");

    Ok(())
}

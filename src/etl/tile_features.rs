use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use rand::Rng;

use crate::config::UserConfig;
use crate::data::{feature::Feature, provider::ProviderResponse, Bounds};
use crate::errors::Result;
use crate::etl::{parse_provider::read_provider_response, Etl};
use crate::pipeline::build_tile_features;

pub const ETL_NAME: &str = "tile_features";
pub const ARCHIVE_FILE_NAME: &str = "features.rkyv";
pub const JSON_FILE_NAME: &str = "features.json";

/// Turns the configured provider response into the tile's feature list.
pub struct TileFeaturesEtl<'a, R: Rng> {
    config: &'a UserConfig,
    bounds: Bounds,
    rng: R,
}

impl<'a, R: Rng> TileFeaturesEtl<'a, R> {
    pub fn new(config: &'a UserConfig, rng: R) -> Result<Self> {
        Ok(TileFeaturesEtl {
            config,
            bounds: config.bounds()?,
            rng,
        })
    }

    pub fn archive_path(dir: &Path) -> PathBuf {
        dir.join(ARCHIVE_FILE_NAME)
    }

    pub fn json_path(dir: &Path) -> PathBuf {
        dir.join(JSON_FILE_NAME)
    }
}

impl<R: Rng> Etl for TileFeaturesEtl<'_, R> {
    type Input = ProviderResponse;
    type Output = Vec<Feature>;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn is_cached(&self, dir: &Path) -> Result<bool> {
        Ok(Self::archive_path(dir).try_exists()?)
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        for path in [Self::archive_path(dir), Self::json_path(dir)] {
            if path.try_exists()? {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    fn extract(&mut self, _dir: &Path) -> Result<Self::Input> {
        read_provider_response(Path::new(&self.config.data_path))
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        Ok(build_tile_features(&input, &self.bounds, &mut self.rng))
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        // JSON first: the archive marks the cache as complete.
        let mut json_writer = BufWriter::new(File::create(Self::json_path(dir))?);
        serde_json::to_writer(&mut json_writer, &output)?;
        json_writer.flush()?;

        let bytes = rkyv::to_bytes::<_, 256>(&output)
            .map_err(|err| format!("Could not serialize features: {:?}", err))?;
        fs::write(Self::archive_path(dir), &bytes)?;

        info!(features = output.len(), dir = dir.to_str().unwrap_or_default(); "Wrote tile features");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::data::feature::FeatureType;
    use crate::etl::ProcessOutcome;

    const RESPONSE: &str = r#"{"elements": [
        {"type": "node", "id": 1, "lat": 0.5, "lon": 0.5, "tags": {"natural": "tree"}},
        {"type": "node", "id": 2, "lat": 2.0, "lon": 2.0, "tags": {"natural": "tree"}},
        {"type": "way", "id": 10, "tags": {"building": "yes"}, "geometry": [
            {"lat": 0.1, "lon": 0.1}, {"lat": 0.1, "lon": 0.2}, {"lat": 0.2, "lon": 0.2}, {"lat": 0.1, "lon": 0.1}
        ]}
    ]}"#;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tile_features_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn config_for(dir: &Path) -> UserConfig {
        let data_path = dir.join("response.json");
        fs::write(&data_path, RESPONSE).unwrap();
        UserConfig {
            data_path: data_path.to_str().unwrap().to_string(),
            dest_path: dir.to_str().unwrap().to_string(),
            north: 1.0,
            south: 0.0,
            east: 1.0,
            west: 0.0,
            seed: Some(1),
            log_level: "info".to_string(),
        }
    }

    #[test]
    fn test_process_writes_outputs_then_uses_cache() {
        let dir = scratch_dir("process");
        let config = config_for(&dir);

        let mut etl = TileFeaturesEtl::new(&config, StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(etl.process(&dir).unwrap(), ProcessOutcome::Built);

        let written: Vec<Feature> = serde_json::from_reader(File::open(TileFeaturesEtl::<StdRng>::json_path(&dir)).unwrap()).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written.iter().any(|f| f.id == "node-1" && f.feature_type == FeatureType::Vegetation));
        assert!(written.iter().any(|f| f.id == "way-10" && f.feature_type == FeatureType::Building));
        assert!(TileFeaturesEtl::<StdRng>::archive_path(&dir).exists());

        assert_eq!(etl.process(&dir).unwrap(), ProcessOutcome::Cached);

        etl.clean(&dir).unwrap();
        assert!(!TileFeaturesEtl::<StdRng>::archive_path(&dir).exists());
        assert!(!TileFeaturesEtl::<StdRng>::json_path(&dir).exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_provider_file_fails_extract() {
        let dir = scratch_dir("missing");
        let mut config = config_for(&dir);
        config.data_path = dir.join("absent.json").to_str().unwrap().to_string();

        let mut etl = TileFeaturesEtl::new(&config, StdRng::seed_from_u64(1)).unwrap();
        assert!(etl.process(&dir).is_err());
        assert!(!TileFeaturesEtl::<StdRng>::archive_path(&dir).exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_invalid_bounds_rejected_up_front() {
        let dir = scratch_dir("bounds");
        let mut config = config_for(&dir);
        config.east = -1.0;
        assert!(TileFeaturesEtl::new(&config, StdRng::seed_from_u64(1)).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }
}

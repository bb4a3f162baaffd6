use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::data::Bounds;
use crate::errors::Result;

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    /// Saved provider response, `.json` or `.osm`, optionally `.xz` compressed.
    pub data_path: String,
    pub dest_path: String,
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    /// Vegetation seed. A random one is drawn and logged when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl UserConfig {
    pub fn bounds(&self) -> Result<Bounds> {
        let bounds = Bounds::new(self.north, self.south, self.east, self.west);
        if !bounds.is_valid() {
            return Err(format!(
                "Invalid tile bounds: north={} south={} east={} west={}",
                self.north, self.south, self.east, self.west
            ).into());
        }
        Ok(bounds)
    }
}

pub fn load_user_config(path: &Path) -> Result<UserConfig> {
    let file = File::open(path)
        .map_err(|err| format!("Could not open config file {}: {}", path.display(), err))?;
    let config = serde_json::from_reader(BufReader::new(file))?;
    Ok(config)
}

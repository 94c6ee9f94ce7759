//! Server configuration from environment.

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub pbf_path: PathBuf,
    pub image_path: PathBuf,
    pub max_radius_m: f64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("SAFEROUTE_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5000),
            pbf_path: env::var("SAFEROUTE_PBF")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("assets/region.osm.pbf")),
            image_path: env::var("SAFEROUTE_IMAGE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("test_road.jpg")),
            max_radius_m: env::var("SAFEROUTE_MAX_RADIUS_M")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|r: &f64| r.is_finite() && *r > 0.0)
                .unwrap_or(2500.0),
        }
    }
}

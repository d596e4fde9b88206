use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{PovError, Result};
use crate::scene::Scene;

const BUILTIN: &str = include_str!("../assets/morning.toml");

#[derive(Deserialize)]
struct CatalogFile {
    scenes: Vec<Scene>,
}

/// Ordered, non-empty list of scenes with unique ids. Fixed once built.
#[derive(Debug, Clone)]
pub struct Catalog {
    scenes: Vec<Scene>,
}

impl Catalog {
    pub fn new(scenes: Vec<Scene>) -> Result<Self> {
        if scenes.is_empty() {
            return Err(PovError::EmptyCatalog);
        }
        let mut seen = HashSet::new();
        for scene in &scenes {
            if !seen.insert(scene.id.as_str()) {
                return Err(PovError::DuplicateSceneId(scene.id.clone()));
            }
        }
        Ok(Self { scenes })
    }

    /// The five-scene morning sequence shipped with the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN)
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(source)?;
        Self::new(file.scenes)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|source| PovError::CatalogIo {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_toml_str(&source)?;
        debug!(?path, scenes = catalog.len(), "loaded catalog");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn get(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(index)
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Gradient, Rgba};

    const TWO_SCENES: &str = r##"
        [[scenes]]
        id = "a"
        clock = "06:00"
        location = "Somewhere"
        headline = "First"
        narrative = "One"
        details = ["x"]

        [scenes.background]
        highlight = "#ffffff"
        vignette = { x = 50.0, y = 50.0, clear = 50.0, edge = "rgba(0, 0, 0, 0.8)" }

        [scenes.background.gradient]
        kind = "linear"
        angle = 90.0
        stops = [{ color = "rgb(0, 0, 0)", at = 0.0 }, { color = "rgb(255, 255, 255)", at = 100.0 }]

        [[scenes]]
        id = "b"
        clock = "06:10"
        location = "Elsewhere"
        headline = "Second"
        narrative = "Two"

        [scenes.background]
        highlight = "#000000"
        vignette = { x = 50.0, y = 50.0, clear = 50.0, edge = "rgba(0, 0, 0, 0.8)" }

        [scenes.background.gradient]
        kind = "radial"
        x = 10.0
        y = 20.0
        stops = [{ color = "rgb(0, 0, 0)", at = 0.0 }]
    "##;

    #[test]
    fn builtin_catalog_has_the_morning_sequence() {
        let catalog = Catalog::builtin().unwrap();
        let ids: Vec<&str> = catalog.scenes().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["sunrise-suite", "terrace-breath", "closet-orchestra", "garage-kickstart", "helipad-launch"]);

        let clocks: Vec<&str> = catalog.scenes().iter().map(|s| s.clock.as_str()).collect();
        assert_eq!(clocks, ["06:04", "06:12", "06:25", "06:42", "07:05"]);

        for scene in catalog.scenes() {
            assert_eq!(scene.details.len(), 3);
            assert_eq!(scene.overlays.len(), 3);
            assert_eq!(scene.background.gradient.stops().len(), 3);
        }

        let first = catalog.get(0).unwrap();
        assert!(matches!(first.background.gradient, Gradient::Radial { x, y, .. } if x == 25.0 && y == 15.0));
        assert_eq!(first.background.highlight, Rgba::new(255, 210, 120, 0.85));
        assert_eq!(first.overlays[1].hue, 210.0);
    }

    #[test]
    fn parses_a_custom_catalog() {
        let catalog = Catalog::from_toml_str(TWO_SCENES).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get(1).unwrap().details.is_empty());
        assert!(catalog.get(1).unwrap().overlays.is_empty());
        assert!(catalog.get(2).is_none());
    }

    #[test]
    fn rejects_empty_and_duplicate_catalogs() {
        assert!(matches!(Catalog::from_toml_str("scenes = []"), Err(PovError::EmptyCatalog)));

        let duplicated = TWO_SCENES.replace("id = \"b\"", "id = \"a\"");
        assert!(matches!(Catalog::from_toml_str(&duplicated), Err(PovError::DuplicateSceneId(id)) if id == "a"));
    }

    #[test]
    fn bad_colors_surface_as_parse_errors() {
        let broken = TWO_SCENES.replace("#ffffff", "not-a-color");
        assert!(matches!(Catalog::from_toml_str(&broken), Err(PovError::CatalogParse(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Catalog::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, PovError::CatalogIo { .. }));
    }
}

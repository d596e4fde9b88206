use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PovError>;

#[derive(Error, Debug)]
pub enum PovError {
    #[error("scene catalog is empty")]
    EmptyCatalog,

    #[error("dwell duration must be greater than zero")]
    ZeroDwell,

    #[error("scene index {index} is out of range for a catalog of {len} scenes")]
    SceneOutOfRange { index: usize, len: usize },

    #[error("scene controller has been stopped")]
    ControllerStopped,

    #[error("duplicate scene id: {0}")]
    DuplicateSceneId(String),

    #[error("invalid color {0:?}")]
    InvalidColor(String),

    #[error("failed to read catalog {path:?}: {source}")]
    CatalogIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog: {0}")]
    CatalogParse(#[from] toml::de::Error),

    #[error("recorder error: {0}")]
    Recorder(String),

    #[error("graphics error: {0}")]
    Graphics(String),
}

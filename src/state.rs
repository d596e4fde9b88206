/// What the renderer needs from the controller each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playback {
    pub index: usize,
    pub progress: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
    Start,       // First scene entered when the controller is created
    AutoAdvance, // Dwell timer fired
    Jump,        // User picked a scene
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneChange {
    pub from: Option<usize>,
    pub to: usize,
    pub cause: ChangeCause,
}

impl SceneChange {
    /// True when an auto-advance arrives back on `start`, i.e. every scene
    /// has been shown once since playback began there.
    pub fn completes_cycle_from(&self, start: usize) -> bool {
        self.cause == ChangeCause::AutoAdvance && self.to == start
    }
}

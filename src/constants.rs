pub const RENDER_WIDTH: i32 = 1920;           // Width of the render texture
pub const RENDER_HEIGHT: i32 = 1080;          // Height of the render texture
pub const FPS: u32 = 60;                      // Frames per second
pub const FRAME_TIME: f32 = 1.0 / FPS as f32; // Time per frame (seconds)

pub const DEFAULT_DWELL_MS: u64 = 7_500;      // Time each scene stays on screen (milliseconds)

pub const SCENE_FADE_DURATION: f32 = 1.05;    // Scene enter / exit crossfade (seconds)
pub const DETAIL_DELAY: f32 = 1.0;            // First bullet reveal (seconds after scene entry)
pub const DETAIL_STAGGER: f32 = 0.18;         // Delay between bullets (seconds)
pub const DETAIL_DURATION: f32 = 0.5;         // Duration of one bullet reveal (seconds)

pub const GRAIN_SPECKS: usize = 900;          // Film grain specks per frame

pub const WINDOW_TITLE: &str = "Millionaire Morning POV";
pub const WINDOW_DESCRIPTION: &str =
    "Step into a cinematic POV of a sunrise routine at the top of the world.";

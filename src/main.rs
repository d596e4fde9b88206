use std::process;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use raylib::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod catalog;
mod config;
mod constants;
mod controller;
mod error;
mod ffmpeg;
mod render;
mod scene;
mod state;
mod timeline;
mod timer;

use crate::config::Config;
use crate::constants::*;
use crate::controller::SceneController;
use crate::error::PovError;
use crate::ffmpeg::Ffmpeg;
use crate::render::{Renderer, Typography};
use crate::timeline::Presence;

const NUMBER_KEYS: [KeyboardKey; 9] = [
    KeyboardKey::KEY_ONE,
    KeyboardKey::KEY_TWO,
    KeyboardKey::KEY_THREE,
    KeyboardKey::KEY_FOUR,
    KeyboardKey::KEY_FIVE,
    KeyboardKey::KEY_SIX,
    KeyboardKey::KEY_SEVEN,
    KeyboardKey::KEY_EIGHT,
    KeyboardKey::KEY_NINE,
];

enum Request {
    Jump(usize),
    Step(isize),
}

fn main() {
    let config = Config::parse();

    if let Err(e) = init_tracing(&config.log) {
        eprintln!("{e:#}");
        process::exit(2);
    }

    if let Err(e) = run(config) {
        error!("{e:#}");
        process::exit(1);
    }
}

fn init_tracing(filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter).with_context(|| format!("invalid log filter {filter:?}"))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(())
}

fn run(config: Config) -> anyhow::Result<()> {
    let catalog = config.load_catalog().context("loading scene catalog")?;
    let dwell = config.dwell()?;
    info!(scenes = catalog.len(), dwell_ms = config.dwell_ms, "{WINDOW_DESCRIPTION}");

    let (mut rl, thread) = raylib::init()
        .size(config.width, config.height)
        .title(WINDOW_TITLE)
        .vsync()
        .resizable()
        .build();
    rl.set_target_fps(FPS);
    rl.set_trace_log(TraceLogLevel::LOG_ERROR);

    let typography = Typography::load(&mut rl, &thread, config.font_display.as_deref(), config.font_sans.as_deref());
    let renderer = Renderer::new(typography, catalog.len());

    let mut framebuffer = rl
        .load_render_texture(&thread, RENDER_WIDTH as u32, RENDER_HEIGHT as u32)
        .map_err(|e| PovError::Graphics(format!("failed to create render texture: {e}")))?;

    let mut recorder = match &config.record {
        Some(path) => Some(Ffmpeg::spawn(RENDER_WIDTH, RENDER_HEIGHT, FPS, path)?),
        None => None,
    };

    // --- Playback State ---
    let mut clock = Duration::ZERO;
    let mut controller = SceneController::starting_at(catalog.len(), dwell, config.start, clock)?;
    let mut presence = Presence::new(config.start, 0.0);
    let mut cycles = 0;
    let recording = config.is_recording();

    // --- Main Loop ---
    while !rl.window_should_close() {
        // Recording runs on a fixed timestep so the video is independent of render speed
        let dt = if recording { FRAME_TIME } else { rl.get_frame_time() };
        clock += Duration::from_secs_f32(dt);
        let seconds = clock.as_secs_f32();

        // 1. User input
        if !recording {
            let result = match requested(&rl, &renderer) {
                Some(Request::Jump(index)) => Some(controller.jump_to(index, clock)),
                Some(Request::Step(delta)) => Some(controller.step(delta, clock)),
                None => None,
            };
            match result {
                Some(Ok(change)) => presence.show(change.to, seconds),
                Some(Err(e)) => warn!("ignored scene request: {e}"),
                None => {}
            }
        }

        // 2. Timers and progress
        if let Some(change) = controller.update(clock) {
            presence.show(change.to, seconds);
            if recording && change.completes_cycle_from(config.start) {
                cycles += 1;
                if cycles >= config.cycles {
                    info!(cycles, "recorded every requested cycle");
                    break;
                }
            }
        }

        let visible = presence.visible(seconds, |i| catalog.get(i).map_or(0, |s| s.details.len()));
        let playback = controller.playback();

        // --- Render each frame into fixed size "framebuffer" ---
        rl.draw_texture_mode(&thread, &mut framebuffer, |mut tmd| {
            renderer.draw(&mut tmd, &catalog, visible, playback);
        });

        let mut d = rl.begin_drawing(&thread);
        let sw = d.get_screen_width() as f32;
        let sh = d.get_screen_height() as f32;
        d.clear_background(Color::BLACK);
        d.draw_texture_pro(
            &framebuffer,
            Rectangle::new(0.0, 0.0, framebuffer.width() as f32, -(framebuffer.height() as f32)),
            Rectangle::new(0.0, 0.0, sw, sh),
            Vector2::new(0.0, 0.0),
            0.0,
            Color::WHITE,
        );
        drop(d);

        if let Some(recorder) = recorder.as_mut() {
            let image = framebuffer
                .load_image()
                .map_err(|e| PovError::Graphics(format!("failed to read back frame: {e}")))?;
            recorder.write(&image)?;
        }
    }

    controller.shutdown();
    if let Some(recorder) = recorder {
        recorder.finish()?;
    }
    Ok(())
}

/// Scene request from this frame's input: a click on a timeline button,
/// a number key, or the arrow keys.
fn requested(rl: &RaylibHandle, renderer: &Renderer) -> Option<Request> {
    if rl.is_mouse_button_pressed(MouseButton::MOUSE_BUTTON_LEFT) {
        let mouse = rl.get_mouse_position();
        let point = Vector2::new(
            mouse.x * RENDER_WIDTH as f32 / rl.get_screen_width() as f32,
            mouse.y * RENDER_HEIGHT as f32 / rl.get_screen_height() as f32,
        );
        if let Some(index) = renderer.dot_at(point) {
            return Some(Request::Jump(index));
        }
    }

    if let Some(index) = NUMBER_KEYS.iter().position(|&key| rl.is_key_pressed(key)) {
        return Some(Request::Jump(index));
    }
    if rl.is_key_pressed(KeyboardKey::KEY_RIGHT) {
        return Some(Request::Step(1));
    }
    if rl.is_key_pressed(KeyboardKey::KEY_LEFT) {
        return Some(Request::Step(-1));
    }
    None
}

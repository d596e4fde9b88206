use std::io::Write;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use raylib::prelude::*;
use tracing::{debug, info};

use crate::error::{PovError, Result};

/// Pipes raw RGBA frames into an `ffmpeg` child process encoding H.264.
pub struct Ffmpeg {
    process: Child,
    stdin: Option<ChildStdin>,
    width: usize,
    height: usize,
    frames: u64,
}

impl Ffmpeg {
    pub fn spawn(width: i32, height: i32, fps: u32, output: &Path) -> Result<Ffmpeg> {
        let mut process = Command::new("ffmpeg")
            .stdin(Stdio::piped())
            .args(["-loglevel", "error"])
            .arg("-y")
            .args(["-f", "rawvideo"])
            .args(["-pixel_format", "rgba"])
            .args(["-video_size", &format!("{}x{}", width, height)])
            .args(["-framerate", &format!("{}", fps)])
            .args(["-i", "-"])
            .args(["-c:v", "libx264"])
            .args(["-pix_fmt", "yuv420p"])
            .arg(output)
            .spawn()
            .map_err(|e| PovError::Recorder(format!("failed to start ffmpeg: {e}")))?;
        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| PovError::Recorder("ffmpeg stdin is not piped".into()))?;
        info!(?output, width, height, fps, "recording started");
        Ok(Ffmpeg { process, stdin: Some(stdin), width: width as usize, height: height as usize, frames: 0 })
    }

    pub fn write(&mut self, image: &Image) -> Result<()> {
        if image.width() as usize != self.width || image.height() as usize != self.height {
            return Err(PovError::Recorder(format!(
                "frame is {}x{}, expected {}x{}",
                image.width(),
                image.height(),
                self.width,
                self.height
            )));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| PovError::Recorder("ffmpeg stdin already closed".into()))?;

        let len = self.width * self.height * 4; // 4 bytes per pixel (RGBA)
        // SAFETY: `image` holds an uncompressed RGBA8 buffer of exactly `len`
        // bytes for the checked dimensions, and it outlives this borrow.
        let pixels = unsafe { std::slice::from_raw_parts(image.data() as *const u8, len) };

        write_flipped(stdin, pixels, self.width, self.height)
            .map_err(|e| PovError::Recorder(format!("failed to write frame {}: {e}", self.frames)))?;
        self.frames += 1;
        Ok(())
    }

    /// Closes the pipe and waits for ffmpeg to finish encoding.
    pub fn finish(mut self) -> Result<()> {
        self.stdin = None;
        let status = self
            .process
            .wait()
            .map_err(|e| PovError::Recorder(format!("failed to wait for ffmpeg: {e}")))?;
        if !status.success() {
            return Err(PovError::Recorder(format!("ffmpeg exited with {status}")));
        }
        info!(frames = self.frames, "recording finished");
        Ok(())
    }
}

impl Drop for Ffmpeg {
    fn drop(&mut self) {
        // Close stdin pipe and wait for ffmpeg to finish
        self.stdin = None;
        if let Err(e) = self.process.wait() {
            debug!("ffmpeg wait on drop failed: {e}");
        }
    }
}

/// Raylib hands back render textures bottom row first, ffmpeg expects top
/// row first.
fn write_flipped(out: &mut impl Write, pixels: &[u8], width: usize, height: usize) -> std::io::Result<()> {
    let stride = width * 4;
    for row in pixels.chunks_exact(stride).take(height).rev() {
        out.write_all(row)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_written_bottom_up() {
        // 1x3 image, one RGBA pixel per row.
        let pixels = [1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3];
        let mut out = Vec::new();
        write_flipped(&mut out, &pixels, 1, 3).unwrap();
        assert_eq!(out, [3, 3, 3, 3, 2, 2, 2, 2, 1, 1, 1, 1]);
    }
}

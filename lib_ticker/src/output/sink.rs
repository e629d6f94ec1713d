//! # Output Sinks
//!
//! Where finished frames go. A sink reports failures as [`SinkError`]; the
//! frame clock logs them and retries on the next tick, so a failing sink never
//! stops the render loop.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::render::Frame;

/// Failure to hand a frame to a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Filesystem or device write failed.
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The frame does not have the dimensions the sink expects.
    #[error("frame is {got_w}x{got_h}, sink expects {want_w}x{want_h}")]
    Size {
        /// Expected width.
        want_w: u32,
        /// Expected height.
        want_h: u32,
        /// Actual width.
        got_w: u32,
        /// Actual height.
        got_h: u32,
    },
    /// The sink no longer accepts frames.
    #[error("sink closed: {0}")]
    Closed(String),
    /// Several sinks of a fanout failed.
    #[error("{failed} of {total} sinks failed, first: {first}")]
    Fanout {
        /// Number of failed sinks.
        failed: usize,
        /// Number of sinks.
        total: usize,
        /// Message of the first failure.
        first: String,
    },
}

/// A destination for frames.
pub trait FrameSink: Send {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Highest refresh rate the sink sustains, `None` for no limit.
    fn max_fps(&self) -> Option<u32> {
        None
    }

    /// Accepts one frame.
    fn write(&mut self, frame: &Frame) -> Result<(), SinkError>;
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn max_fps(&self) -> Option<u32> {
        (**self).max_fps()
    }

    fn write(&mut self, frame: &Frame) -> Result<(), SinkError> {
        (**self).write(frame)
    }
}

fn check_size(frame: &Frame, want_w: u32, want_h: u32) -> Result<(), SinkError> {
    if frame.width() != want_w || frame.height() != want_h {
        return Err(SinkError::Size { want_w, want_h, got_w: frame.width(), got_h: frame.height() });
    }
    Ok(())
}

// --- Memory sink ---

#[derive(Debug, Default)]
struct MemoryState {
    last: Option<Frame>,
    frames: u64,
    closed: bool,
}

/// Keeps the most recent frame in memory.
#[derive(Debug, Clone)]
pub struct MemorySink {
    width: u32,
    height: u32,
    max_fps: Option<u32>,
    state: Arc<Mutex<MemoryState>>,
}

/// Read side of a [`MemorySink`], shared with tests and tooling.
#[derive(Debug, Clone)]
pub struct MemorySinkHandle {
    state: Arc<Mutex<MemoryState>>,
}

impl MemorySink {
    /// Sink for `width x height` frames.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, max_fps: None, state: Arc::default() }
    }

    /// Declares a refresh ceiling, as a hardware panel would.
    pub fn with_max_fps(mut self, fps: u32) -> Self {
        self.max_fps = Some(fps);
        self
    }

    /// A handle observing this sink.
    pub fn handle(&self) -> MemorySinkHandle {
        MemorySinkHandle { state: Arc::clone(&self.state) }
    }
}

impl FrameSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn max_fps(&self) -> Option<u32> {
        self.max_fps
    }

    fn write(&mut self, frame: &Frame) -> Result<(), SinkError> {
        check_size(frame, self.width, self.height)?;
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.closed {
            return Err(SinkError::Closed("memory sink closed".to_string()));
        }
        state.last = Some(frame.clone());
        state.frames += 1;
        Ok(())
    }
}

impl MemorySinkHandle {
    /// Copy of the last accepted frame.
    pub fn last_frame(&self) -> Option<Frame> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).last.clone()
    }

    /// Frames accepted so far.
    pub fn frames(&self) -> u64 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).frames
    }

    /// Makes the sink reject (`true`) or accept (`false`) further frames.
    pub fn set_closed(&self, closed: bool) {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).closed = closed;
    }
}

// --- PPM preview sink ---

/// Binary PPM (P6) encoding of `frame`.
pub fn encode_ppm(frame: &Frame) -> Vec<u8> {
    let mut out = format!("P6\n{} {}\n255\n", frame.width(), frame.height()).into_bytes();
    out.extend_from_slice(&frame.to_rgb_bytes());
    out
}

/// Writes every Nth frame to a PPM file, replacing it atomically.
#[derive(Debug)]
pub struct PpmSink {
    path: PathBuf,
    every: u64,
    seen: u64,
    written: u64,
}

impl PpmSink {
    /// Preview at `path`, refreshed every `every` frames (minimum 1).
    pub fn new(path: impl Into<PathBuf>, every: u64) -> Self {
        Self { path: path.into(), every: every.max(1), seen: 0, written: 0 }
    }

    /// Target path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Files written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    fn persist(&self, bytes: &[u8]) -> Result<(), SinkError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| SinkError::Io(e.error))?;
        Ok(())
    }
}

impl FrameSink for PpmSink {
    fn name(&self) -> &str {
        "ppm"
    }

    fn write(&mut self, frame: &Frame) -> Result<(), SinkError> {
        self.seen += 1;
        if (self.seen - 1) % self.every != 0 {
            return Ok(());
        }
        self.persist(&encode_ppm(frame))?;
        self.written += 1;
        Ok(())
    }
}

// --- Fanout ---

/// Writes every frame to several sinks.
pub struct FanoutSink {
    sinks: Vec<Box<dyn FrameSink>>,
}

impl FanoutSink {
    /// Fanout over `sinks`.
    pub fn new(sinks: Vec<Box<dyn FrameSink>>) -> Self {
        Self { sinks }
    }

    /// Adds a sink.
    pub fn push(&mut self, sink: Box<dyn FrameSink>) {
        self.sinks.push(sink);
    }

    /// Number of sinks.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// True without sinks.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl FrameSink for FanoutSink {
    fn name(&self) -> &str {
        "fanout"
    }

    /// The slowest member's ceiling.
    fn max_fps(&self) -> Option<u32> {
        self.sinks.iter().filter_map(|s| s.max_fps()).min()
    }

    /// Tries every sink, then reports the failures together.
    fn write(&mut self, frame: &Frame) -> Result<(), SinkError> {
        let total = self.sinks.len();
        let mut errors: Vec<(String, SinkError)> = Vec::new();
        for sink in &mut self.sinks {
            if let Err(e) = sink.write(frame) {
                errors.push((sink.name().to_string(), e));
            }
        }
        match errors.len() {
            0 => Ok(()),
            1 if total == 1 => Err(errors.remove(0).1),
            failed => Err(SinkError::Fanout {
                failed,
                total,
                first: format!("{}: {}", errors[0].0, errors[0].1),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Rgb;

    #[test]
    fn memory_sink_checks_size_and_closure() {
        let mut sink = MemorySink::new(4, 2);
        let handle = sink.handle();
        assert!(matches!(sink.write(&Frame::new(3, 2)), Err(SinkError::Size { got_w: 3, .. })));
        sink.write(&Frame::new(4, 2)).unwrap();
        assert_eq!(handle.frames(), 1);
        handle.set_closed(true);
        assert!(matches!(sink.write(&Frame::new(4, 2)), Err(SinkError::Closed(_))));
        assert_eq!(handle.frames(), 1);
    }

    #[test]
    fn ppm_sink_writes_every_nth_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preview.ppm");
        let mut sink = PpmSink::new(&path, 3);
        let mut frame = Frame::new(2, 1);
        frame.set(1, 0, Rgb::new(1, 2, 3));
        for _ in 0..4 {
            sink.write(&frame).unwrap();
        }
        assert_eq!(sink.written(), 2);
        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes, b"P6\n2 1\n255\n\x00\x00\x00\x01\x02\x03".to_vec());
    }

    #[test]
    fn fanout_tries_every_sink() {
        let a = MemorySink::new(2, 2);
        let b = MemorySink::new(2, 2).with_max_fps(30);
        let (ha, hb) = (a.handle(), b.handle());
        ha.set_closed(true);
        let mut fan = FanoutSink::new(vec![Box::new(a), Box::new(b)]);
        assert_eq!(fan.max_fps(), Some(30));
        let err = fan.write(&Frame::new(2, 2)).unwrap_err();
        assert!(matches!(err, SinkError::Fanout { failed: 1, total: 2, .. }));
        assert_eq!(hb.frames(), 1);
    }
}

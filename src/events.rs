use std::fmt;
use std::path::PathBuf;

/// Identity of one on-screen slide, unique for the lifetime of the show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlideId(u64);

impl SlideId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SlideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slide#{}", self.0)
    }
}

/// A decoded, orientation-corrected RGBA8 image ready for GPU upload.
#[derive(Clone)]
pub struct PreparedImageCpu {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl fmt::Debug for PreparedImageCpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedImageCpu")
            .field("path", &self.path)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixels", &format_args!("{} bytes", self.pixels.len()))
            .finish()
    }
}

/// Scheduler -> viewer: mutations of the display surface's slide list.
#[derive(Debug)]
pub enum SurfaceCommand {
    /// Attach a new slide; it starts its entering fade immediately.
    Attach {
        slide: SlideId,
        image: PreparedImageCpu,
    },
    /// Start the hold-then-fade-out exit on an attached slide.
    BeginExit(SlideId),
    /// Remove a slide whose exit animation has completed.
    Detach(SlideId),
}

/// Events delivered to the winit loop from outside the main thread.
#[derive(Debug)]
pub enum ViewerEvent {
    Surface(SurfaceCommand),
    Shutdown,
}

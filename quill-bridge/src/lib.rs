//! Quill Bridge library target.
//!
//! The host side of the editor: the controller the application talks to,
//! its configuration, and the rendering-surface contract plus the
//! in-process surface the probe binary and the tests drive.

// ── Host API ─────────────────────────────────────────────────────
pub mod config;
pub mod controller;

// ── Surfaces ─────────────────────────────────────────────────────
pub mod surface;

// ── Binaries ─────────────────────────────────────────────────────
pub mod logging;

pub use config::{EditorConfig, EditorOptions};
pub use controller::RichEditor;
pub use surface::{LocalSurface, RenderingSurface, SurfaceError, SurfaceEvent};

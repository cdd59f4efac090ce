//! Rendering-surface contract.
//!
//! A surface hosts the embedded document. The host talks to it through two
//! one-way queues: statements go in via [`RenderingSurface::inject`], and
//! everything the document says comes back as [`SurfaceEvent`]s on the
//! receiver handed out when the surface was created.

pub mod local;

use thiserror::Error;

pub use local::LocalSurface;

/// Signals from the surface to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The document finished loading.
    LoadEnd,
    /// One raw message posted by the document.
    Message(String),
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("rendering surface is closed")]
    Closed,

    #[error("no document has been loaded")]
    NotLoaded,
}

/// What the bridge controller needs from a surface.
///
/// Both calls return as soon as the work is queued. There is no reply
/// channel; results only ever arrive as [`SurfaceEvent`]s.
pub trait RenderingSurface {
    /// Load the initial document.
    fn load(&mut self, document: String) -> Result<(), SurfaceError>;

    /// Queue one statement for execution inside the loaded document.
    fn inject(&mut self, script: String) -> Result<(), SurfaceError>;
}

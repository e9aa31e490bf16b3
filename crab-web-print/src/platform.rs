//! Platform capability behind the orchestrator
//!
//! The orchestrator never touches a display directly. It asks a
//! [`StagingPlatform`] for a hidden surface, writes the staged document into
//! it, waits for the load signal and triggers the print dialog:
//! - Browser: hidden iframe (`web` feature, wasm32 only)
//! - In-process scripted surfaces for tests and headless hosts ([`crate::MemoryPlatform`])

use std::time::Duration;

use crate::content::ContentNode;
use crate::error::PrintError;

/// Host able to create isolated rendering surfaces
#[allow(async_fn_in_trait)]
pub trait StagingPlatform {
    /// Content node type this platform can stage
    type Node: ContentNode;
    /// Surface handle type
    type Surface: StagingSurface;

    /// Attach a new zero-sized, off-screen surface to the host document
    fn create_surface(&self) -> Result<Self::Surface, PrintError>;

    /// Sleep on the host's timer
    async fn delay(&self, duration: Duration);

    /// Remove `surface` once `grace` has elapsed, without blocking the caller
    fn defer_removal(&self, surface: Self::Surface, grace: Duration);
}

/// Handle to one staging surface
///
/// Handles are cheap; clones refer to the same surface.
#[allow(async_fn_in_trait)]
pub trait StagingSurface: Clone {
    /// Open, write and close the surface's document
    ///
    /// Fails with [`PrintError::StagingUnavailable`] when the document or
    /// window handle cannot be obtained.
    fn write_document(&mut self, markup: &str) -> Result<(), PrintError>;

    /// Wait for the load signal, or a [`PrintError::LoadFailure`]
    async fn loaded(&mut self) -> Result<(), PrintError>;

    /// Focus the surface and open the print dialog
    fn print(&mut self) -> Result<(), PrintError>;

    /// Detach from the host document. Must tolerate an already removed surface.
    fn remove(&mut self);
}

/// Owns a surface for the duration of one call and removes it on drop.
///
/// [`StagedSurface::disarm`] hands the surface over for deferred removal;
/// after that the guard no longer touches it.
pub(crate) struct StagedSurface<S: StagingSurface> {
    surface: S,
    armed: bool,
}

impl<S: StagingSurface> StagedSurface<S> {
    pub(crate) fn new(surface: S) -> Self {
        Self {
            surface,
            armed: true,
        }
    }

    pub(crate) fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub(crate) fn disarm(mut self) -> S {
        self.armed = false;
        self.surface.clone()
    }
}

impl<S: StagingSurface> Drop for StagedSurface<S> {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!("Removing staging surface");
            self.surface.remove();
        }
    }
}

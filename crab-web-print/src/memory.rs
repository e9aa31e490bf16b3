//! In-process staging platform
//!
//! Surfaces live in a shared [`MemoryDocument`] instead of a real display.
//! Load and print outcomes are scripted through [`MemoryBehavior`], which
//! makes every exit path of the orchestrator reproducible on a tokio clock.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, warn};

use crate::content::HtmlElement;
use crate::error::PrintError;
use crate::platform::{StagingPlatform, StagingSurface};

/// How a surface reacts once its document has been written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadBehavior {
    /// Signal load after the given delay
    LoadAfter(Duration),
    /// Signal a load error after the given delay
    FailAfter(Duration, String),
    /// Never signal anything
    Hang,
}

/// How the print trigger behaves
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerBehavior {
    Succeed,
    Fail(String),
}

/// Script applied to every surface the platform creates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBehavior {
    pub load: LoadBehavior,
    pub trigger: TriggerBehavior,
    /// When false the surface's document/window handles are unobtainable
    pub handles_available: bool,
}

impl Default for MemoryBehavior {
    fn default() -> Self {
        Self {
            load: LoadBehavior::LoadAfter(Duration::from_millis(10)),
            trigger: TriggerBehavior::Succeed,
            handles_available: true,
        }
    }
}

/// Observable state of one surface
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameRecord {
    pub id: u64,
    pub markup: Option<String>,
    pub attached: bool,
    pub print_calls: u32,
    /// Number of times the surface was actually detached
    pub removals: u32,
}

/// Host document shared by all surfaces of a [`MemoryPlatform`]
#[derive(Debug, Default)]
pub struct MemoryDocument {
    next_id: u64,
    frames: BTreeMap<u64, FrameRecord>,
}

impl MemoryDocument {
    fn attach(&mut self) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.frames.insert(
            id,
            FrameRecord {
                id,
                attached: true,
                ..Default::default()
            },
        );
        id
    }

    fn frame_mut(&mut self, id: u64) -> Option<&mut FrameRecord> {
        self.frames.get_mut(&id)
    }
}

/// Scripted platform for tests and display-less hosts
///
/// Detached frames stay recorded for inspection until
/// [`MemoryPlatform::prune_detached`] is called; long-running hosts should
/// prune after each call.
#[derive(Debug, Clone, Default)]
pub struct MemoryPlatform {
    document: Arc<Mutex<MemoryDocument>>,
    behavior: MemoryBehavior,
}

impl MemoryPlatform {
    pub fn new(behavior: MemoryBehavior) -> Self {
        Self {
            document: Arc::default(),
            behavior,
        }
    }

    pub fn behavior(&self) -> &MemoryBehavior {
        &self.behavior
    }

    /// Every surface ever created, in creation order
    pub fn frames(&self) -> Vec<FrameRecord> {
        lock(&self.document).frames.values().cloned().collect()
    }

    pub fn frame(&self, id: u64) -> Option<FrameRecord> {
        lock(&self.document).frames.get(&id).cloned()
    }

    /// Drop records of detached surfaces, returning how many were dropped
    pub fn prune_detached(&self) -> usize {
        let mut doc = lock(&self.document);
        let before = doc.frames.len();
        doc.frames.retain(|_, frame| frame.attached);
        before - doc.frames.len()
    }

    /// Surfaces currently attached to the document
    pub fn attached_count(&self) -> usize {
        lock(&self.document)
            .frames
            .values()
            .filter(|f| f.attached)
            .count()
    }
}

impl StagingPlatform for MemoryPlatform {
    type Node = HtmlElement;
    type Surface = MemorySurface;

    fn create_surface(&self) -> Result<MemorySurface, PrintError> {
        let id = lock(&self.document).attach();
        debug!(frame_id = id, "Memory surface attached");
        Ok(MemorySurface {
            id,
            document: Arc::clone(&self.document),
            behavior: self.behavior.clone(),
        })
    }

    async fn delay(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn defer_removal(&self, mut surface: MemorySurface, grace: Duration) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(grace).await;
                    surface.remove();
                });
            }
            Err(_) => {
                warn!(frame_id = surface.id, "No runtime for deferred removal, removing now");
                surface.remove();
            }
        }
    }
}

/// Handle to a surface in a [`MemoryDocument`]
#[derive(Debug, Clone)]
pub struct MemorySurface {
    id: u64,
    document: Arc<Mutex<MemoryDocument>>,
    behavior: MemoryBehavior,
}

impl MemorySurface {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl StagingSurface for MemorySurface {
    fn write_document(&mut self, markup: &str) -> Result<(), PrintError> {
        if !self.behavior.handles_available {
            return Err(PrintError::StagingUnavailable(
                "content document unavailable".to_string(),
            ));
        }
        let mut doc = lock(&self.document);
        let frame = doc
            .frame_mut(self.id)
            .ok_or_else(|| PrintError::StagingUnavailable(format!("frame {} missing", self.id)))?;
        frame.markup = Some(markup.to_string());
        Ok(())
    }

    async fn loaded(&mut self) -> Result<(), PrintError> {
        match &self.behavior.load {
            LoadBehavior::LoadAfter(after) => {
                tokio::time::sleep(*after).await;
                Ok(())
            }
            LoadBehavior::FailAfter(after, reason) => {
                tokio::time::sleep(*after).await;
                Err(PrintError::LoadFailure(reason.clone()))
            }
            LoadBehavior::Hang => std::future::pending().await,
        }
    }

    fn print(&mut self) -> Result<(), PrintError> {
        if let Some(frame) = lock(&self.document).frame_mut(self.id) {
            frame.print_calls += 1;
        }
        match &self.behavior.trigger {
            TriggerBehavior::Succeed => Ok(()),
            TriggerBehavior::Fail(reason) => Err(PrintError::TriggerFailure(reason.clone())),
        }
    }

    fn remove(&mut self) {
        let mut doc = lock(&self.document);
        match doc.frame_mut(self.id) {
            Some(frame) if frame.attached => {
                frame.attached = false;
                frame.removals += 1;
                debug!(frame_id = self.id, "Memory surface removed");
            }
            _ => debug!(frame_id = self.id, "Memory surface already removed"),
        }
    }
}

/// A poisoned document is still readable; recover the guard.
fn lock(document: &Mutex<MemoryDocument>) -> MutexGuard<'_, MemoryDocument> {
    document.lock().unwrap_or_else(|poisoned| {
        warn!("Memory document lock poisoned, recovering");
        poisoned.into_inner()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_is_idempotent() {
        let platform = MemoryPlatform::default();
        let mut surface = platform.create_surface().unwrap();
        assert_eq!(platform.attached_count(), 1);

        surface.remove();
        surface.remove();

        let frame = platform.frame(surface.id()).unwrap();
        assert!(!frame.attached);
        assert_eq!(frame.removals, 1);
        assert_eq!(platform.attached_count(), 0);
    }

    #[test]
    fn test_prune_detached() {
        let platform = MemoryPlatform::default();
        let mut first = platform.create_surface().unwrap();
        let second = platform.create_surface().unwrap();
        first.remove();

        assert_eq!(platform.prune_detached(), 1);
        assert_eq!(platform.frames().len(), 1);
        assert_eq!(platform.frames()[0].id, second.id());
        assert_eq!(platform.prune_detached(), 0);
    }

    #[test]
    fn test_unavailable_handles() {
        let platform = MemoryPlatform::new(MemoryBehavior {
            handles_available: false,
            ..Default::default()
        });
        let mut surface = platform.create_surface().unwrap();
        let err = surface.write_document("<p>x</p>").unwrap_err();
        assert_eq!(err.kind(), "staging_unavailable");
    }

    #[test]
    fn test_print_counts_calls() {
        let platform = MemoryPlatform::new(MemoryBehavior {
            trigger: TriggerBehavior::Fail("blocked".into()),
            ..Default::default()
        });
        let mut surface = platform.create_surface().unwrap();
        assert!(surface.print().is_err());
        assert_eq!(platform.frame(surface.id()).unwrap().print_calls, 1);
    }
}

//! # crab-web-print
//!
//! Browser print orchestration for A4 documents and 80mm receipt tape.
//!
//! ## Scope
//!
//! This crate handles HOW to hand content to a print dialog:
//! - Deep-copying the caller's content (the original is never mutated)
//! - Injecting the A4 or thermal print stylesheet
//! - Staging the copy on a hidden surface and triggering the dialog
//! - Guaranteed surface teardown on every exit path, with a deadline
//!
//! WHAT to print (receipt layout, invoice markup) stays in application code.
//!
//! ## Example
//!
//! ```ignore
//! use crab_web_print::{PrintFormat, PrintOptions, PrintOrchestrator, WebPlatform};
//!
//! let orchestrator = PrintOrchestrator::new(WebPlatform::new()?);
//! let result = orchestrator
//!     .execute(
//!         &receipt_element,
//!         PrintFormat::Thermal,
//!         PrintOptions::new()
//!             .on_start(|| button.set_disabled(true))
//!             .with_timeout_ms(10_000),
//!     )
//!     .await;
//!
//! if !result.success {
//!     show_toast(&result.message);
//! }
//! ```

mod content;
mod document;
mod error;
mod format;
mod options;
mod orchestrator;
mod platform;

#[cfg(not(target_arch = "wasm32"))]
mod memory;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
mod web;

// Re-exports
pub use content::{ContentNode, ContentSource, HtmlChild, HtmlElement, NodeRef};
pub use document::compose as compose_document;
pub use error::PrintError;
pub use format::PrintFormat;
pub use options::{DEFAULT_TIMEOUT_MS, PrintConfig, PrintOptions, PrintResult};
pub use orchestrator::{PrintOrchestrator, TEARDOWN_GRACE};
pub use platform::{StagingPlatform, StagingSurface};

#[cfg(not(target_arch = "wasm32"))]
pub use memory::{
    FrameRecord, LoadBehavior, MemoryBehavior, MemoryDocument, MemoryPlatform, MemorySurface,
    TriggerBehavior,
};

#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub use web::{FrameSurface, WebPlatform, print_element};

//! Print orchestration
//!
//! One call stages a detached copy of the caller's content on a hidden
//! surface, triggers the print dialog and always settles with a
//! [`PrintResult`]:
//!
//! 1. resolve content (missing content fails before anything is staged)
//! 2. `on_start`
//! 3. create surface, deep-copy content, write stylesheet + markup
//! 4. race the load signal against the deadline
//! 5. print, then remove the surface after [`TEARDOWN_GRACE`]
//!
//! Every failure removes the surface immediately and reports through
//! `on_error`.

use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::content::{ContentNode, ContentSource};
use crate::document;
use crate::error::PrintError;
use crate::format::PrintFormat;
use crate::options::{PrintConfig, PrintOptions, PrintResult};
use crate::platform::{StagedSurface, StagingPlatform, StagingSurface};

/// Time the print dialog gets to capture the surface before it is removed
pub const TEARDOWN_GRACE: Duration = Duration::from_millis(1000);

/// Drives print calls against a [`StagingPlatform`]
///
/// Calls share nothing but the platform; concurrent calls each own their
/// surface and deadline.
#[derive(Debug)]
pub struct PrintOrchestrator<P> {
    platform: P,
    config: PrintConfig,
}

impl<P: StagingPlatform> PrintOrchestrator<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            config: PrintConfig::default(),
        }
    }

    /// Create with custom defaults
    ///
    /// Rejects the same configs as [`PrintConfig::from_json`].
    pub fn with_config(platform: P, config: PrintConfig) -> Result<Self, PrintError> {
        config.validate()?;
        Ok(Self { platform, config })
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn config(&self) -> &PrintConfig {
        &self.config
    }

    /// Print `content` in `format`.
    ///
    /// Never fails: every error is delivered as an unsuccessful
    /// [`PrintResult`].
    #[instrument(
        skip_all,
        fields(format = %format, timeout_ms = tracing::field::Empty)
    )]
    pub async fn execute<S>(
        &self,
        content: S,
        format: PrintFormat,
        options: PrintOptions<'_>,
    ) -> PrintResult
    where
        S: ContentSource<P::Node>,
    {
        let mut options = options;
        let timeout = options.timeout().unwrap_or_else(|| self.config.timeout());
        tracing::Span::current().record("timeout_ms", duration_ms(timeout));

        let Some(node) = content.resolve() else {
            warn!("Print content not found");
            return options.fail(PrintError::ContentNotFound);
        };

        options.start();

        match self.stage_and_print(node, format, timeout).await {
            Ok(()) => {
                info!("Print dialog opened");
                options.succeed(format!("Print dialog opened for {} format", format.label()))
            }
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "Print failed");
                options.fail(e)
            }
        }
    }

    /// [`Self::execute`] with the configured default format
    pub async fn print<S>(&self, content: S, options: PrintOptions<'_>) -> PrintResult
    where
        S: ContentSource<P::Node>,
    {
        self.execute(content, self.config.default_format, options)
            .await
    }

    pub async fn print_a4<S>(&self, content: S, options: PrintOptions<'_>) -> PrintResult
    where
        S: ContentSource<P::Node>,
    {
        self.execute(content, PrintFormat::A4, options).await
    }

    pub async fn print_thermal<S>(&self, content: S, options: PrintOptions<'_>) -> PrintResult
    where
        S: ContentSource<P::Node>,
    {
        self.execute(content, PrintFormat::Thermal, options).await
    }

    async fn stage_and_print(
        &self,
        node: &P::Node,
        format: PrintFormat,
        timeout: Duration,
    ) -> Result<(), PrintError> {
        // Dropping the guard on any early return removes the surface.
        let mut staged = StagedSurface::new(self.platform.create_surface()?);
        debug!("Staging surface created");

        let copy = node.deep_clone()?;
        let markup = document::compose(format, &copy.inner_html());
        staged.surface_mut().write_document(&markup)?;
        debug!(bytes = markup.len(), "Staged document written");

        tokio::select! {
            biased;
            loaded = staged.surface_mut().loaded() => loaded?,
            _ = self.platform.delay(timeout) => {
                return Err(PrintError::Timeout(duration_ms(timeout)));
            }
        }
        debug!("Staging surface loaded");

        staged.surface_mut().print()?;
        self.platform.defer_removal(staged.disarm(), TEARDOWN_GRACE);
        Ok(())
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

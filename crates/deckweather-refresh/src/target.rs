use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by the device host when updating a target.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("Target {0} is no longer available")]
    Gone(String),

    #[error("Device error: {0}")]
    Device(String),
}

/// One key or dial that can show a title and an image.
///
/// Implemented by the device host; the scheduler only holds it while a timer
/// for it is alive.
#[async_trait]
pub trait RefreshTarget: Send + Sync {
    /// Stable identifier of this target (the host's context id).
    fn id(&self) -> &str;

    async fn set_title(&self, title: &str) -> Result<(), TargetError>;

    /// `image` is a path relative to the plugin's asset directory.
    async fn set_image(&self, image: &str) -> Result<(), TargetError>;
}

use crate::error::Result;
use async_trait::async_trait;
use daystone_core::types::MediaRef;
use futures::future::BoxFuture;

/// Resolves when the physical recording ends: explicit stop or the device's
/// own duration limit. `None` means the device finalized without producing
/// media. This is the async completion whose late arrival the session manager
/// has to survive.
pub type MediaFuture = BoxFuture<'static, Result<Option<MediaRef>>>;

/// The camera/microphone boundary. The device records at most one clip at a
/// time and does not support hard preemption: stopping is a request, and the
/// in-flight future still resolves on its own schedule.
#[async_trait]
pub trait MediaDevice {
    /// Permission gate, checked before every session start. A denial is a
    /// terminal, user-visible condition.
    async fn request_permission(&self) -> Result<()>;

    /// Begin recording, capped at `max_duration_secs`.
    async fn start_recording(&self, max_duration_secs: u32) -> Result<MediaFuture>;

    /// Ask the device to finalize the current recording. The media, if any,
    /// arrives through the future returned by `start_recording`.
    async fn stop_recording(&self) -> Result<()>;
}

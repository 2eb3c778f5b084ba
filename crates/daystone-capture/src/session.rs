use crate::device::{MediaDevice, MediaFuture};
use crate::error::{CaptureError, Result};
use crate::route::ProgressSink;
use chrono::{DateTime, Utc};
use daystone_core::clock::Clock;
use daystone_core::types::{MediaKind, MediaRef, ProgressKey, SaveStatus};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Monotonic token identifying one recording attempt. Comparisons are only
/// ever for identity; the ordering exists so logs read chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Live session bookkeeping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LivePhase {
    Recording,
    /// An explicit stop was requested; the media future is still pending.
    Stopping,
}

#[derive(Debug, Clone)]
struct LiveSession {
    id: SessionId,
    started_at: DateTime<Utc>,
    limit_seconds: u32,
    mode: MediaKind,
    key: ProgressKey,
    phase: LivePhase,
}

// ---------------------------------------------------------------------------
// ActiveRecording / Delivery
// ---------------------------------------------------------------------------

/// A freshly started recording: the session token plus the completion future.
/// The caller awaits the future and feeds its outcome back through
/// [`CaptureManager::deliver`] tagged with this token.
pub struct ActiveRecording {
    pub session: SessionId,
    pub media: MediaFuture,
}

/// What [`CaptureManager::deliver`] did with a resolved recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Media appended to the progress chain (and the plan cache in plan mode).
    Routed {
        media: MediaRef,
        persisted: SaveStatus,
    },
    /// The device finalized without media; the session simply retired.
    Empty,
    /// The session was superseded by a flip; the result is discarded by
    /// design, valid media included.
    Superseded,
    /// Unknown or already-retired session id; nothing to do. This is what
    /// makes a double delivery idempotent.
    Stale,
    /// The device failed mid-session; nothing was appended.
    Failed(String),
}

// ---------------------------------------------------------------------------
// CaptureManager
// ---------------------------------------------------------------------------

/// Drives one bounded recording at a time: `Idle → Recording → retired`, with
/// a mid-recording flip superseding the live session by a new one that
/// inherits the remaining time budget.
///
/// All state changes happen synchronously between awaits of the device, so a
/// single owner driving this from one logical thread never observes a torn
/// transition. Cancellation is cooperative: a superseded session keeps
/// recording until the device lets go, and its late result is dropped at the
/// [`CaptureManager::deliver`] check.
pub struct CaptureManager<D, C> {
    device: D,
    clock: C,
    next_id: u64,
    live: Option<LiveSession>,
    /// Superseded ids whose eventual completion must be discarded. An id
    /// leaves the set the moment its completion is observed, so the set only
    /// holds sessions with a discard still owed.
    aborted: HashSet<SessionId>,
}

impl<D: MediaDevice, C: Clock> CaptureManager<D, C> {
    pub fn new(device: D, clock: C) -> Self {
        Self {
            device,
            clock,
            next_id: 0,
            live: None,
            aborted: HashSet::new(),
        }
    }

    pub fn recording(&self) -> bool {
        matches!(
            self.live,
            Some(LiveSession {
                phase: LivePhase::Recording,
                ..
            })
        )
    }

    pub fn live_session(&self) -> Option<SessionId> {
        self.live.as_ref().map(|l| l.id)
    }

    /// Whether `session` is still owed a discard. Once its completion has
    /// been observed this returns `false` again.
    pub fn is_superseded(&self, session: SessionId) -> bool {
        self.aborted.contains(&session)
    }

    /// Start a bounded recording. Fails when a session is already live or the
    /// device refuses (permission denied is terminal and user-visible).
    pub async fn start(
        &mut self,
        limit_seconds: u32,
        mode: MediaKind,
        key: ProgressKey,
    ) -> Result<ActiveRecording> {
        if self.live.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }
        self.device.request_permission().await?;
        self.begin(limit_seconds, mode, key).await
    }

    async fn begin(
        &mut self,
        limit_seconds: u32,
        mode: MediaKind,
        key: ProgressKey,
    ) -> Result<ActiveRecording> {
        let media = self.device.start_recording(limit_seconds).await?;
        self.next_id += 1;
        let id = SessionId(self.next_id);
        self.live = Some(LiveSession {
            id,
            started_at: self.clock.now(),
            limit_seconds,
            mode,
            key,
            phase: LivePhase::Recording,
        });
        info!(session = %id, limit_seconds, mode = %mode, "recording started");
        Ok(ActiveRecording { session: id, media })
    }

    /// Flip the camera mid-recording. The live session is superseded (its
    /// completion will be discarded whenever it arrives) and a new session
    /// continues with `max(1, limit − elapsed)` seconds of budget, same mode
    /// and target.
    pub async fn flip(&mut self) -> Result<ActiveRecording> {
        let live = match &self.live {
            Some(live) if live.phase == LivePhase::Recording => live.clone(),
            _ => return Err(CaptureError::NotRecording),
        };
        let elapsed = (self.clock.now() - live.started_at).num_seconds().max(0) as u32;
        let remaining = live.limit_seconds.saturating_sub(elapsed).max(1);

        self.aborted.insert(live.id);
        self.live = None;
        info!(session = %live.id, remaining, "superseding session for camera flip");

        if let Err(error) = self.device.stop_recording().await {
            // The old clip may already be finalizing on its own; the flip
            // proceeds either way.
            debug!(session = %live.id, %error, "stop during flip failed");
        }
        self.begin(remaining, live.mode, live.key).await
    }

    /// Explicit user stop. The media arrives through the pending future and
    /// is routed by `deliver`; stopping with nothing live is a no-op, so a
    /// double stop cannot double-route.
    pub async fn stop(&mut self) -> Result<()> {
        let id = match self.live.as_mut() {
            None => return Ok(()),
            Some(live) if live.phase == LivePhase::Stopping => return Ok(()),
            Some(live) => {
                live.phase = LivePhase::Stopping;
                live.id
            }
        };
        info!(session = %id, "recording stop requested");
        if let Err(error) = self.device.stop_recording().await {
            // No clean finalize: the session aborts and any late result is
            // discarded rather than committed as a partial clip.
            self.aborted.insert(id);
            self.live = None;
            warn!(session = %id, %error, "device failed to finalize recording");
            return Err(error);
        }
        Ok(())
    }

    /// Feed back a resolved recording. The single continuation for every
    /// completion path: natural expiry, explicit stop, flip leftovers and
    /// device failures all land here, in whatever order they resolve.
    pub fn deliver<S: ProgressSink>(
        &mut self,
        session: SessionId,
        outcome: Result<Option<MediaRef>>,
        sink: &mut S,
    ) -> Delivery {
        if self.aborted.remove(&session) {
            // Superseded: discard unconditionally, valid media included.
            // Deliberately not a warning; this is the designed discard path.
            debug!(%session, "discarding result of a superseded session");
            return Delivery::Superseded;
        }

        let live_id = self.live.as_ref().map(|l| l.id);
        if live_id != Some(session) {
            debug!(%session, "ignoring result for a retired session");
            return Delivery::Stale;
        }
        // Route and retire. Taking the session out first keeps a re-entrant
        // delivery of the same id on the Stale path.
        let Some(live) = self.live.take() else {
            return Delivery::Stale;
        };

        match outcome {
            Err(error) => {
                warn!(%session, %error, "recording failed; nothing captured");
                Delivery::Failed(error.to_string())
            }
            Ok(None) => {
                info!(%session, "recording finalized without media");
                Delivery::Empty
            }
            Ok(Some(media)) => {
                let persisted = match live.mode {
                    MediaKind::Update => sink.record_update(&live.key, media.clone()),
                    MediaKind::Plan => sink.record_plan(&live.key, media.clone()),
                };
                info!(%session, mode = %live.mode, "recording routed");
                Delivery::Routed { media, persisted }
            }
        }
    }
}

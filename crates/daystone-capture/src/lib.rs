pub mod device;
pub mod error;
pub mod route;
pub mod session;

pub use device::{MediaDevice, MediaFuture};
pub use error::{CaptureError, Result};
pub use route::{MilestoneSink, ProgressSink};
pub use session::{ActiveRecording, CaptureManager, Delivery, SessionId};

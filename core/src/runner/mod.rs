pub mod exit;
mod relay;
mod run;
mod session;
pub mod signal;
mod sink;
mod spawn;
mod traits;
pub mod types;

pub use relay::{relay, spawn_relay, ChunkTap, RelayOptions};
pub use run::{run_session, RunSessionArgs};
pub use session::{ControllerIo, ProxySession, SessionConfig, SessionPhase};
pub use sink::{log_file_name, LogSink};
pub use spawn::{spawn, ChildHandle, ProcessLauncher};
pub use traits::{ChildSession, Launcher};
pub use types::{ExitStatus, LaunchSpec, RelayReport, SessionReport, Signal, StreamRole};

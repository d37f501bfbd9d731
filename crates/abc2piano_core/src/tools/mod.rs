//! Resolution of external tool binaries.
//!
//! A tool is looked up in two steps: first the bundled directory for the
//! current platform, then the executable search path.
//!
//! ```text
//! <bundled_tools>/
//!     linux-x86_64/abc2midi
//!     linux-x86_64/fluidsynth
//!     windows-x86_64/ffmpeg.exe
//!     ...
//! ```

mod platform;
mod resolver;

pub use platform::Platform;
pub use resolver::{BinaryResolver, ResolveError, ResolvedTools, ToolBinary};

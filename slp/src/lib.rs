//! Reading Slippi replay (`.slp`) containers.
//!
//! The flow is: open an input as a [`SourceRef`], [`Container::locate`] the
//! raw event stream and metadata within it, then [`Container::iterate`] the
//! command records and fold them into a [`FrameStore`].
//!
//! ```no_run
//! use std::ops::ControlFlow;
//! use std::path::PathBuf;
//!
//! use slippi_slp::{Container, FrameStore, SlpInput};
//!
//! fn load(path: PathBuf) -> slippi_slp::Result<FrameStore> {
//!     let container = Container::open(&SlpInput::File(path))?;
//!     let mut store = FrameStore::new();
//!
//!     container.iterate(None, |_, event| {
//!         store.apply(event);
//!         ControlFlow::Continue(())
//!     })?;
//!
//!     Ok(store)
//! }
//! ```

mod bytes;

mod errors;
pub use errors::SlpError;

pub mod container;
pub use container::{Container, ContainerFormat, MessageSizes};

pub mod events;
pub use events::{Command, Event};

pub mod frames;
pub use frames::{FIRST_FRAME, Frame, FrameStore, GameSettings};

mod metadata;
pub use metadata::Metadata;

mod reader;
pub use reader::{HaltReason, IterationOutcome};

pub mod source;
pub use source::{SlpInput, SourceRef};

pub mod ubjson;

pub type Result<T> = std::result::Result<T, SlpError>;

/// Log targets for the replay crates. Pass these as the `target` of any
/// `tracing` call so output can be filtered per subsystem.
#[derive(Debug)]
pub struct Log;

#[allow(non_upper_case_globals)]
impl Log {
    pub const SlpReader: &'static str = "SlpReader";
    pub const SlpStats: &'static str = "SlpStats";
    pub const SlpGame: &'static str = "SlpGame";
}

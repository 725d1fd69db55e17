pub mod emitter;
pub mod host;
pub mod mock;
pub mod observability;

pub use emitter::ChannelEmitter;
pub use host::HostStatSource;
pub use mock::{RecordingEmitter, StaticStatSource};

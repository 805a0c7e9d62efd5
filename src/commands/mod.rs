pub mod config;
pub mod exemplar;
pub mod status;
pub mod watch;

pub use config::*;
pub use exemplar::*;
pub use status::*;
pub use watch::*;

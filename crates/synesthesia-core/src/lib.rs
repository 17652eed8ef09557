pub mod channel;
pub mod config;
pub mod constants;
pub mod error;
pub mod frame;
pub mod instance;
pub mod level;
pub mod mapper;
pub mod mix;
pub mod session;
pub mod smoothing;
pub mod stems;

pub use channel::*;
pub use config::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use instance::*;
pub use level::*;
pub use mapper::*;
pub use mix::*;
pub use session::*;
pub use smoothing::*;
pub use stems::*;

#![no_std]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

mod aci;
mod command;
mod dispatch;
mod error;
mod event;
mod handler;
mod interface;
mod opcode;
mod session;
mod setup;
mod status;
mod temp;
mod transport;

pub use aci::*;
pub use command::*;
pub use dispatch::*;
pub use error::*;
pub use event::*;
pub use handler::*;
pub use interface::*;
pub use opcode::*;
pub use session::*;
pub use setup::*;
pub use status::*;
pub use temp::*;

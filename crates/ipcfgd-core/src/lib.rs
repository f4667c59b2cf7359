//! Domain types shared between the ipcfgd request server and the
//! configuration subsystem.
//!
//! This crate defines the vocabulary the two sides agree on: interface names,
//! configuration methods, subsystem status codes, and the [`ConfigDelegate`]
//! trait through which the request server invokes the subsystem. It carries
//! no transport or wire-format knowledge; that lives in `ipcfgd-daemon`.

mod delegate;
mod interface;
mod method;
mod status;

pub use delegate::ConfigDelegate;
pub use interface::{InterfaceName, InterfaceNameError, MAX_INTERFACE_NAME_LEN};
pub use method::ConfigMethod;
pub use status::Status;

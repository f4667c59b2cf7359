//! Fuzz target for request frame dispatch.
//!
//! Arbitrary bytes must never panic the dispatcher: every input produces a
//! well-formed reply frame that fits the fixed reply buffer, and privileged
//! operations never reach the delegate for an unprivileged identity.

#![no_main]

use std::net::Ipv4Addr;
use std::sync::Arc;

use bytes::Bytes;
use ipcfgd_core::{ConfigDelegate, ConfigMethod, InterfaceName, Status};
use ipcfgd_daemon::credentials::SenderIdentity;
use ipcfgd_daemon::{Dispatcher, REPLY_BUFFER_CAPACITY};
use libfuzzer_sys::fuzz_target;

struct InertDelegate;

impl ConfigDelegate for InertDelegate {
    fn config_interface(&self, _name: &InterfaceName) {}

    fn config_all(&self) {}

    fn wait_interface(&self, _name: &InterfaceName) -> bool {
        panic!("privileged operation reached the delegate for an unprivileged caller");
    }

    fn wait_all(&self) {
        panic!("privileged operation reached the delegate for an unprivileged caller");
    }

    fn interface_name(&self, _index: u32) -> Result<InterfaceName, Status> {
        Err(Status::InterfaceDoesNotExist)
    }

    fn interface_addr(&self, _name: &InterfaceName) -> Result<Ipv4Addr, Status> {
        Err(Status::InterfaceDoesNotExist)
    }

    fn interface_count(&self) -> u32 {
        0
    }

    fn interface_option(&self, _name: &InterfaceName, _option_code: u32) -> Result<Vec<u8>, Status> {
        Err(Status::NoSuchData)
    }

    fn interface_packet(&self, _name: &InterfaceName) -> Result<Vec<u8>, Status> {
        Err(Status::NoSuchData)
    }

    fn set_config(
        &self,
        _name: &InterfaceName,
        _method: ConfigMethod,
        _method_data: &[u8],
    ) -> Status {
        panic!("privileged operation reached the delegate for an unprivileged caller");
    }

    fn set_verbose(&self, _verbose: bool) -> Status {
        panic!("privileged operation reached the delegate for an unprivileged caller");
    }
}

fuzz_target!(|data: &[u8]| {
    let dispatcher = Dispatcher::new(Arc::new(InertDelegate));
    let frame = Bytes::copy_from_slice(data);

    // An unprivileged caller: set/set_verbose reaching the delegate panics.
    let result = dispatcher.dispatch(&frame, &SenderIdentity::authenticated(501, 20));
    assert!(!result.frame.is_empty());
    assert!(result.frame.len() <= REPLY_BUFFER_CAPACITY);

    // An unresolved identity must behave identically for privileged calls.
    let result = dispatcher.dispatch(&frame, &SenderIdentity::unresolved());
    assert!(result.frame.len() <= REPLY_BUFFER_CAPACITY);
});

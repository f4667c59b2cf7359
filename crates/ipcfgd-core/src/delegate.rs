//! Contract between the request server and the configuration subsystem.

use std::net::Ipv4Addr;

use crate::{ConfigMethod, InterfaceName, Status};

/// The configuration subsystem, as seen from the request server.
///
/// Implemented by the daemon component that actually applies configuration
/// methods, tracks per-interface state, and answers address/option/packet
/// queries. The request server never interprets the data it moves between a
/// client and the delegate; it only authorizes and routes.
///
/// # Blocking
///
/// [`wait_interface`](Self::wait_interface) and
/// [`wait_all`](Self::wait_all) may legitimately block until configuration
/// completes. The server processes requests strictly sequentially, so a
/// blocked wait delays every queued request behind it; that is the documented
/// behavior of this design, not an accident.
pub trait ConfigDelegate: Send + Sync {
    /// Kicks a configuration pass for one interface.
    ///
    /// Acceptance is unconditional at this layer; the pass itself runs (and
    /// may fail) asynchronously inside the subsystem.
    fn config_interface(&self, name: &InterfaceName);

    /// Kicks a configuration pass for every known interface.
    fn config_all(&self);

    /// Blocks until the named interface's configuration completes.
    ///
    /// Returns `true` if the interface became ready, `false` otherwise
    /// (unknown interface, configuration failed).
    fn wait_interface(&self, name: &InterfaceName) -> bool;

    /// Blocks until every interface's configuration completes.
    fn wait_all(&self);

    /// Resolves an interface index to its name.
    ///
    /// # Errors
    ///
    /// Returns a subsystem status (typically
    /// [`Status::InterfaceDoesNotExist`]) if the index is not valid.
    fn interface_name(&self, index: u32) -> Result<InterfaceName, Status>;

    /// Returns the interface's current IPv4 address.
    ///
    /// # Errors
    ///
    /// Returns a subsystem status if the interface is unknown or has no
    /// address.
    fn interface_addr(&self, name: &InterfaceName) -> Result<Ipv4Addr, Status>;

    /// Number of interfaces the subsystem currently tracks.
    fn interface_count(&self) -> u32;

    /// Returns the raw bytes of a configuration option the interface last
    /// received (DHCP option data, for example).
    ///
    /// # Errors
    ///
    /// Returns a subsystem status if the interface is unknown or holds no
    /// such option.
    fn interface_option(&self, name: &InterfaceName, option_code: u32) -> Result<Vec<u8>, Status>;

    /// Returns the raw bytes of the last configuration packet the interface
    /// received.
    ///
    /// # Errors
    ///
    /// Returns a subsystem status if the interface is unknown or holds no
    /// packet.
    fn interface_packet(&self, name: &InterfaceName) -> Result<Vec<u8>, Status>;

    /// Applies a configuration method to an interface.
    ///
    /// `method_data` is the method-specific payload, opaque to the server.
    fn set_config(&self, name: &InterfaceName, method: ConfigMethod, method_data: &[u8]) -> Status;

    /// Adjusts subsystem log verbosity.
    fn set_verbose(&self, verbose: bool) -> Status;
}

//! Shared test harness: a recording configuration subsystem and a scriptable
//! name service.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use ipcfgd_core::{ConfigDelegate, ConfigMethod, InterfaceName, Status};
use ipcfgd_daemon::registrar::{LookupOutcome, NameService};
use ipcfgd_daemon::transport::ChannelEndpoint;

/// Recording configuration subsystem.
///
/// Query answers come from the `interfaces` table; mutating and waiting
/// operations record their arguments and return scripted results.
pub struct MockDelegate {
    pub interfaces: Mutex<Vec<(String, Ipv4Addr)>>,
    pub options: Mutex<HashMap<u32, Vec<u8>>>,
    pub packet: Mutex<Option<Vec<u8>>>,
    pub config_if_calls: Mutex<Vec<String>>,
    pub config_all_calls: AtomicU32,
    pub wait_if_calls: Mutex<Vec<String>>,
    pub wait_all_calls: AtomicU32,
    pub set_calls: Mutex<Vec<(String, ConfigMethod, Vec<u8>)>>,
    pub set_verbose_calls: Mutex<Vec<bool>>,
    pub set_status: Mutex<Status>,
}

impl Default for MockDelegate {
    fn default() -> Self {
        Self {
            interfaces: Mutex::new(Vec::new()),
            options: Mutex::new(HashMap::new()),
            packet: Mutex::new(None),
            config_if_calls: Mutex::new(Vec::new()),
            config_all_calls: AtomicU32::new(0),
            wait_if_calls: Mutex::new(Vec::new()),
            wait_all_calls: AtomicU32::new(0),
            set_calls: Mutex::new(Vec::new()),
            set_verbose_calls: Mutex::new(Vec::new()),
            set_status: Mutex::new(Status::Success),
        }
    }
}

impl MockDelegate {
    pub fn with_interfaces(interfaces: &[(&str, Ipv4Addr)]) -> Self {
        let delegate = Self::default();
        *delegate.interfaces.lock().unwrap() = interfaces
            .iter()
            .map(|(name, addr)| ((*name).to_string(), *addr))
            .collect();
        delegate
    }

    /// Total calls into privileged entry points.
    pub fn privileged_calls(&self) -> usize {
        self.wait_if_calls.lock().unwrap().len()
            + self.wait_all_calls.load(Ordering::SeqCst) as usize
            + self.set_calls.lock().unwrap().len()
            + self.set_verbose_calls.lock().unwrap().len()
    }
}

impl ConfigDelegate for MockDelegate {
    fn config_interface(&self, name: &InterfaceName) {
        self.config_if_calls.lock().unwrap().push(name.to_string());
    }

    fn config_all(&self) {
        self.config_all_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn wait_interface(&self, name: &InterfaceName) -> bool {
        self.wait_if_calls.lock().unwrap().push(name.to_string());
        self.interfaces
            .lock()
            .unwrap()
            .iter()
            .any(|(n, _)| n == name.as_str())
    }

    fn wait_all(&self) {
        self.wait_all_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn interface_name(&self, index: u32) -> Result<InterfaceName, Status> {
        let interfaces = self.interfaces.lock().unwrap();
        let (name, _) = interfaces
            .get(index as usize)
            .ok_or(Status::InterfaceDoesNotExist)?;
        InterfaceName::new(name.clone()).map_err(|_| Status::InternalError)
    }

    fn interface_addr(&self, name: &InterfaceName) -> Result<Ipv4Addr, Status> {
        self.interfaces
            .lock()
            .unwrap()
            .iter()
            .find(|(n, _)| n == name.as_str())
            .map(|(_, addr)| *addr)
            .ok_or(Status::InterfaceDoesNotExist)
    }

    fn interface_count(&self) -> u32 {
        u32::try_from(self.interfaces.lock().unwrap().len()).unwrap_or(u32::MAX)
    }

    fn interface_option(&self, _name: &InterfaceName, option_code: u32) -> Result<Vec<u8>, Status> {
        self.options
            .lock()
            .unwrap()
            .get(&option_code)
            .cloned()
            .ok_or(Status::NoSuchData)
    }

    fn interface_packet(&self, _name: &InterfaceName) -> Result<Vec<u8>, Status> {
        self.packet.lock().unwrap().clone().ok_or(Status::NoSuchData)
    }

    fn set_config(&self, name: &InterfaceName, method: ConfigMethod, method_data: &[u8]) -> Status {
        self.set_calls
            .lock()
            .unwrap()
            .push((name.to_string(), method, method_data.to_vec()));
        *self.set_status.lock().unwrap()
    }

    fn set_verbose(&self, verbose: bool) -> Status {
        self.set_verbose_calls.lock().unwrap().push(verbose);
        Status::Success
    }
}

/// Scriptable name service; advertisement marks the name active.
pub struct FakeNameService {
    state: Mutex<LookupOutcome>,
    pub advertise_ok: Mutex<bool>,
    pub advertised: Mutex<Vec<String>>,
}

impl FakeNameService {
    pub fn new(state: LookupOutcome) -> Self {
        Self {
            state: Mutex::new(state),
            advertise_ok: Mutex::new(true),
            advertised: Mutex::new(Vec::new()),
        }
    }
}

impl NameService for FakeNameService {
    fn lookup(&self, _name: &str) -> LookupOutcome {
        *self.state.lock().unwrap()
    }

    fn advertise(&self, name: &str, _endpoint: ChannelEndpoint) -> bool {
        if !*self.advertise_ok.lock().unwrap() {
            return false;
        }
        self.advertised.lock().unwrap().push(name.to_string());
        *self.state.lock().unwrap() = LookupOutcome::Active;
        true
    }
}

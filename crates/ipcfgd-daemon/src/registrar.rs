//! Singleton service registration against the host name service.
//!
//! At startup the server asks the name service whether the well-known name is
//! already claimed. If it is, startup must abort: there is at most one live
//! registration per host, and refusing to double-register keeps the check
//! idempotent. Only on a clean lookup is the receive channel created, bound
//! into the event loop, and advertised.
//!
//! The lookup-then-advertise sequence is not atomic; two processes racing
//! through it at the same instant can both pass the check. That race is a
//! startup-time edge case of the host environment and is accepted here, not
//! fixed.

use tracing::{error, warn};

use crate::transport::{ChannelEndpoint, ReceiveChannel};

/// Well-known name the server advertises under.
pub const SERVICE_NAME: &str = "com.ipcfgd.server";

/// Result of a name-service lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The name maps to a live registration.
    Active,
    /// The name is unclaimed.
    Unknown,
    /// The name service itself failed to answer.
    Failed,
}

/// Host facility mapping well-known names to live service channels.
pub trait NameService: Send + Sync {
    /// Looks up the current registration state of `name`.
    fn lookup(&self, name: &str) -> LookupOutcome;

    /// Advertises `endpoint` under `name`; `false` on failure.
    fn advertise(&self, name: &str, endpoint: ChannelEndpoint) -> bool;
}

/// Outcome of a registration attempt.
#[derive(Debug)]
pub enum RegisterOutcome {
    /// Another instance already holds the name. No channel was created; the
    /// caller must abort startup with a diagnostic.
    AlreadyActive,
    /// Registered; the receive channel is live. If advertisement failed the
    /// channel is unadvertised but still functional for callers that already
    /// hold an endpoint.
    Registered(ReceiveChannel, ChannelEndpoint),
    /// The name service could not be queried; startup cannot proceed safely.
    RegistrationFailed,
}

/// Probes whether a live registration for `name` exists.
#[must_use]
pub fn service_active(name_service: &dyn NameService, name: &str) -> bool {
    matches!(name_service.lookup(name), LookupOutcome::Active)
}

/// Checks for an existing registration, then creates and advertises the
/// receive channel.
pub fn register(
    name_service: &dyn NameService,
    name: &str,
    queue_depth: usize,
) -> RegisterOutcome {
    match name_service.lookup(name) {
        LookupOutcome::Active => RegisterOutcome::AlreadyActive,
        LookupOutcome::Failed => {
            error!(name, "name service lookup failed");
            RegisterOutcome::RegistrationFailed
        }
        LookupOutcome::Unknown => {
            let (channel, endpoint) = ReceiveChannel::new(queue_depth);
            if !name_service.advertise(name, endpoint.clone()) {
                // Degraded but alive: keep serving for holders of the
                // endpoint even though nobody can look us up.
                warn!(name, "name service advertisement failed; serving unadvertised");
            }
            RegisterOutcome::Registered(channel, endpoint)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Name service double with a scripted lookup answer; advertisement
    /// flips later lookups to `Active`, like the real facility.
    struct FakeNameService {
        state: Mutex<LookupOutcome>,
        advertise_ok: AtomicBool,
        advertised: Mutex<Vec<String>>,
    }

    impl FakeNameService {
        fn new(state: LookupOutcome) -> Self {
            Self {
                state: Mutex::new(state),
                advertise_ok: AtomicBool::new(true),
                advertised: Mutex::new(Vec::new()),
            }
        }
    }

    impl NameService for FakeNameService {
        fn lookup(&self, _name: &str) -> LookupOutcome {
            *self.state.lock().unwrap()
        }

        fn advertise(&self, name: &str, _endpoint: ChannelEndpoint) -> bool {
            if !self.advertise_ok.load(Ordering::SeqCst) {
                return false;
            }
            self.advertised.lock().unwrap().push(name.to_string());
            *self.state.lock().unwrap() = LookupOutcome::Active;
            true
        }
    }

    #[test]
    fn active_name_refuses_to_register() {
        let ns = FakeNameService::new(LookupOutcome::Active);

        let outcome = register(&ns, SERVICE_NAME, 8);

        assert!(matches!(outcome, RegisterOutcome::AlreadyActive));
        assert!(ns.advertised.lock().unwrap().is_empty());
    }

    #[test]
    fn clean_lookup_registers_and_advertises() {
        let ns = FakeNameService::new(LookupOutcome::Unknown);

        let outcome = register(&ns, SERVICE_NAME, 8);

        assert!(matches!(outcome, RegisterOutcome::Registered(_, _)));
        assert_eq!(
            ns.advertised.lock().unwrap().as_slice(),
            [SERVICE_NAME.to_string()]
        );
        assert!(service_active(&ns, SERVICE_NAME));
    }

    #[test]
    fn second_registration_sees_the_first() {
        let ns = FakeNameService::new(LookupOutcome::Unknown);

        let first = register(&ns, SERVICE_NAME, 8);
        let second = register(&ns, SERVICE_NAME, 8);

        assert!(matches!(first, RegisterOutcome::Registered(_, _)));
        assert!(matches!(second, RegisterOutcome::AlreadyActive));
        assert_eq!(ns.advertised.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn advertisement_failure_still_yields_a_usable_channel() {
        let ns = FakeNameService::new(LookupOutcome::Unknown);
        ns.advertise_ok.store(false, Ordering::SeqCst);

        let RegisterOutcome::Registered(mut channel, endpoint) = register(&ns, SERVICE_NAME, 8)
        else {
            panic!("expected Registered");
        };

        assert!(!service_active(&ns, SERVICE_NAME));

        // Unadvertised, but an endpoint holder can still deliver.
        let delivered = endpoint
            .deliver(crate::transport::RawMessage::new(
                bytes::Bytes::from_static(&[7]),
                bytes::Bytes::new(),
                crate::transport::ReplyDest::Null,
            ))
            .await;
        assert!(delivered);
        assert!(channel.recv().await.is_some());
    }

    #[test]
    fn name_service_failure_fails_registration() {
        let ns = FakeNameService::new(LookupOutcome::Failed);
        assert!(matches!(
            register(&ns, SERVICE_NAME, 8),
            RegisterOutcome::RegistrationFailed
        ));
    }

    #[test]
    fn service_active_probe() {
        assert!(service_active(
            &FakeNameService::new(LookupOutcome::Active),
            SERVICE_NAME
        ));
        assert!(!service_active(
            &FakeNameService::new(LookupOutcome::Unknown),
            SERVICE_NAME
        ));
        assert!(!service_active(
            &FakeNameService::new(LookupOutcome::Failed),
            SERVICE_NAME
        ));
    }
}

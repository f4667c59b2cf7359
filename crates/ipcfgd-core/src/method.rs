//! Configuration method identifiers.

/// How an interface's address should be configured.
///
/// The method travels in `set` requests together with a method-specific
/// payload (for example, the static address and mask for `Manual`). The
/// payload's layout is a contract between the client and the configuration
/// subsystem; the request server treats it as opaque bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ConfigMethod {
    /// Remove any configuration from the interface.
    None = 0,
    /// Static address supplied in the method payload.
    Manual = 1,
    /// BOOTP.
    Bootp = 2,
    /// DHCP.
    Dhcp = 3,
    /// Use DHCP INFORM with a statically assigned address.
    Inform = 4,
    /// Self-assigned link-local address.
    LinkLocal = 5,
}

impl ConfigMethod {
    /// Wire representation.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Decodes a wire method identifier.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Manual),
            2 => Some(Self::Bootp),
            3 => Some(Self::Dhcp),
            4 => Some(Self::Inform),
            5 => Some(Self::LinkLocal),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConfigMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Manual => "manual",
            Self::Bootp => "bootp",
            Self::Dhcp => "dhcp",
            Self::Inform => "inform",
            Self::LinkLocal => "linklocal",
        };
        f.write_str(s)
    }
}

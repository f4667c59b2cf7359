//! Bounded network-interface names.

use thiserror::Error;

/// Maximum interface name length in bytes, excluding any terminator.
///
/// Matches the kernel's interface-name limit so a name accepted here can be
/// handed to the configuration subsystem unmodified.
pub const MAX_INTERFACE_NAME_LEN: usize = 15;

/// Validation failures for [`InterfaceName`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterfaceNameError {
    /// The name was empty.
    #[error("interface name is empty")]
    Empty,

    /// The name exceeded [`MAX_INTERFACE_NAME_LEN`] bytes.
    #[error("interface name `{name}` exceeds {MAX_INTERFACE_NAME_LEN} bytes")]
    TooLong {
        /// The offending name.
        name: String,
    },

    /// The name contained a NUL or other non-printable byte.
    #[error("interface name contains a non-printable byte at offset {offset}")]
    InvalidByte {
        /// Byte offset of the first invalid byte.
        offset: usize,
    },
}

/// A validated network-interface name (`en0`, `lo0`, ...).
///
/// Names are bounded, non-empty and printable ASCII; the bound is enforced at
/// construction so every other layer can treat the name as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceName(String);

impl InterfaceName {
    /// Validates and wraps an interface name.
    ///
    /// # Errors
    ///
    /// Returns [`InterfaceNameError`] if the name is empty, too long, or
    /// contains non-printable bytes.
    pub fn new(name: impl Into<String>) -> Result<Self, InterfaceNameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(InterfaceNameError::Empty);
        }
        if name.len() > MAX_INTERFACE_NAME_LEN {
            return Err(InterfaceNameError::TooLong { name });
        }
        if let Some(offset) = name
            .bytes()
            .position(|b| !b.is_ascii_graphic())
        {
            return Err(InterfaceNameError::InvalidByte { offset });
        }
        Ok(Self(name))
    }

    /// The name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InterfaceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for InterfaceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for InterfaceName {
    type Error = InterfaceNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

//! Status codes returned by the configuration subsystem.
//!
//! Every request to the server produces a reply carrying one of these codes.
//! The request server itself only ever originates `Success`,
//! `PermissionDenied`, `InvalidParameter` and `BufferTooSmall`; everything
//! else is produced inside the configuration subsystem and propagated to the
//! caller verbatim.

/// Outcome of a configuration-subsystem operation.
///
/// Encoded as an `i32` on the wire. Codes this crate does not know about are
/// carried through untouched by [`Status::from_code`] callers that keep the
/// raw value; the enum exists for decisions this server makes itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Status {
    /// The operation completed.
    Success = 0,
    /// The caller lacks the privilege the operation requires.
    PermissionDenied = 1,
    /// The named interface is not known to the subsystem.
    InterfaceDoesNotExist = 2,
    /// A request field failed validation.
    InvalidParameter = 3,
    /// The operation is not valid for the interface's current state.
    InvalidOperation = 4,
    /// The requested configuration method is not supported.
    MethodNotSupported = 5,
    /// The subsystem could not allocate resources for the operation.
    AllocationFailed = 6,
    /// The interface has no data of the requested kind (option, packet).
    NoSuchData = 7,
    /// The result does not fit the caller's buffer or the reply buffer.
    BufferTooSmall = 8,
    /// Unclassified subsystem failure.
    InternalError = 9,
}

impl Status {
    /// Returns `true` for `Success`.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Wire representation.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Decodes a wire status code.
    ///
    /// Returns `None` for codes minted by a subsystem this build does not
    /// know; callers that only forward the code keep the raw `i32` instead.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            1 => Some(Self::PermissionDenied),
            2 => Some(Self::InterfaceDoesNotExist),
            3 => Some(Self::InvalidParameter),
            4 => Some(Self::InvalidOperation),
            5 => Some(Self::MethodNotSupported),
            6 => Some(Self::AllocationFailed),
            7 => Some(Self::NoSuchData),
            8 => Some(Self::BufferTooSmall),
            9 => Some(Self::InternalError),
            _ => None,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::PermissionDenied => "permission denied",
            Self::InterfaceDoesNotExist => "interface does not exist",
            Self::InvalidParameter => "invalid parameter",
            Self::InvalidOperation => "invalid operation",
            Self::MethodNotSupported => "method not supported",
            Self::AllocationFailed => "allocation failed",
            Self::NoSuchData => "no such data",
            Self::BufferTooSmall => "buffer too small",
            Self::InternalError => "internal error",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_roundtrip() {
        for status in [
            Status::Success,
            Status::PermissionDenied,
            Status::InterfaceDoesNotExist,
            Status::InvalidParameter,
            Status::InvalidOperation,
            Status::MethodNotSupported,
            Status::AllocationFailed,
            Status::NoSuchData,
            Status::BufferTooSmall,
            Status::InternalError,
        ] {
            assert_eq!(Status::from_code(status.code()), Some(status));
        }
    }

    #[test]
    fn unknown_code_is_none() {
        assert_eq!(Status::from_code(-1), None);
        assert_eq!(Status::from_code(10_000), None);
    }

    #[test]
    fn only_success_is_success() {
        assert!(Status::Success.is_success());
        assert!(!Status::PermissionDenied.is_success());
        assert!(!Status::InternalError.is_success());
    }
}

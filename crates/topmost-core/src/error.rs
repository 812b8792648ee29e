//! Error types for window access, pin operations and the fallback.

use thiserror::Error;

use crate::window::Attribute;

/// Errors raised by the window layer (lookup, attribute access, raise).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// Accessibility permission is required but not granted.
    #[error("Accessibility permission missing")]
    PermissionDenied,

    /// None of the lookup strategies produced an inspectable window.
    #[error("no accessible window")]
    NoAccessibleWindow,

    /// The window element became invalid (closed or recreated) mid-operation.
    #[error("AX element invalid (window gone)")]
    WindowGone,

    /// Reading an attribute failed with a platform error code.
    #[error("reading {attribute} failed: code {code}")]
    AttributeReadFailed {
        /// Attribute being read.
        attribute: Attribute,
        /// Platform error code.
        code: i32,
    },

    /// The platform refused an attribute write.
    #[error("writing {attribute} failed: code {code}")]
    AttributeWriteFailed {
        /// Attribute being written.
        attribute: Attribute,
        /// Platform error code.
        code: i32,
    },

    /// The raise action was rejected.
    #[error("raise action failed: code {code}")]
    RaiseFailed {
        /// Platform error code.
        code: i32,
    },

    /// Activating the owning application failed.
    #[error("activation failed")]
    ActivationFailed,

    /// The attribute exists but carries a value of an unexpected type.
    #[error("unsupported attribute value")]
    Unsupported,
}

/// Convenience alias for window-layer results.
pub type AccessResult<T> = Result<T, AccessError>;

/// Errors returned by pin-controller operations.
///
/// Every variant has a fixed user-facing status line; see
/// [`PinError::status_text`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PinError {
    /// A toggle was requested while no target is selected.
    #[error("no target selected")]
    NoTargetSelected,

    /// Accessibility permission has not been granted.
    #[error("accessibility permission denied")]
    PermissionDenied,

    /// The target's window could not be located right now.
    #[error("target window unavailable: {0}")]
    WindowUnavailable(#[source] AccessError),

    /// The requested application is not in the running set.
    #[error("target is not running")]
    TargetNotRunning,
}

impl PinError {
    /// Status line shown to the user for this failure.
    pub fn status_text(&self) -> &'static str {
        match self {
            Self::NoTargetSelected => "Error: No app selected",
            Self::PermissionDenied => "Error: Accessibility permissions required",
            Self::WindowUnavailable(_) => "Error: Cannot access window",
            Self::TargetNotRunning => "Error: App is not running",
        }
    }
}

impl From<AccessError> for PinError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::PermissionDenied => Self::PermissionDenied,
            other => Self::WindowUnavailable(other),
        }
    }
}

/// Failures of the out-of-band activation fallback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FallbackError {
    /// The automation host rejected the request (script error, app not found).
    #[error("automation call rejected: {0}")]
    InvocationFailed(String),

    /// The automation host could not be started at all.
    #[error("failed to start automation host: {0}")]
    Spawn(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_access_error_maps_to_pin_permission_error() {
        assert_eq!(
            PinError::from(AccessError::PermissionDenied),
            PinError::PermissionDenied
        );
        assert_eq!(
            PinError::from(AccessError::NoAccessibleWindow),
            PinError::WindowUnavailable(AccessError::NoAccessibleWindow)
        );
    }

    #[test]
    fn attribute_errors_name_the_attribute() {
        let err = AccessError::AttributeWriteFailed {
            attribute: Attribute::Position,
            code: -25200,
        };
        assert_eq!(err.to_string(), "writing position failed: code -25200");
    }
}

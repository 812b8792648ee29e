//! Accessibility permission checks for topmost.
//!
//! - `accessibility_ok()` reports whether the process is trusted to inspect and
//!   mutate other applications' windows.
//! - `prompt_accessibility()` asks the system to show its trust prompt (once per
//!   launch is plenty; the system dialog links to System Settings).
//!
//! Off macOS both report "not trusted".

#[cfg(target_os = "macos")]
mod macos {
    use core_foundation::{
        base::TCFType,
        boolean::CFBoolean,
        dictionary::{CFDictionary, CFDictionaryRef},
        string::CFString,
    };

    #[link(name = "ApplicationServices", kind = "framework")]
    unsafe extern "C" {
        fn AXIsProcessTrusted() -> bool;
        fn AXIsProcessTrustedWithOptions(options: CFDictionaryRef) -> bool;
    }

    /// See [`crate::accessibility_ok`].
    pub fn accessibility_ok() -> bool {
        unsafe { AXIsProcessTrusted() }
    }

    /// See [`crate::prompt_accessibility`].
    pub fn prompt_accessibility() -> bool {
        let key = CFString::new("AXTrustedCheckOptionPrompt");
        let options = CFDictionary::from_CFType_pairs(&[(key, CFBoolean::true_value())]);
        unsafe { AXIsProcessTrustedWithOptions(options.as_concrete_TypeRef()) }
    }
}

/// Whether the Accessibility permission is granted. Fast and side-effect free.
pub fn accessibility_ok() -> bool {
    #[cfg(target_os = "macos")]
    {
        macos::accessibility_ok()
    }
    #[cfg(not(target_os = "macos"))]
    {
        false
    }
}

/// Show the system trust prompt if the permission is missing.
///
/// Returns the trust state at the time of the call; granting happens
/// asynchronously in System Settings.
pub fn prompt_accessibility() -> bool {
    #[cfg(target_os = "macos")]
    {
        macos::prompt_accessibility()
    }
    #[cfg(not(target_os = "macos"))]
    {
        false
    }
}

/// Current permission status for the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionsStatus {
    /// Accessibility (AX) permission; `true` if granted.
    pub accessibility_ok: bool,
}

/// Query the permissions topmost depends on.
pub fn check_permissions() -> PermissionsStatus {
    PermissionsStatus {
        accessibility_ok: accessibility_ok(),
    }
}

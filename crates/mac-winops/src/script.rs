//! AppleScript activation fallback run through `osascript`.

use std::process::Command;

use topmost_core::{AppHandle, Fallback, FallbackError};
use tracing::debug;

/// Quote `s` as an AppleScript string literal.
pub fn applescript_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Script that activates `app` and moves its first window to the front.
///
/// Addresses the app by bundle identifier when known so that display-name
/// collisions cannot pick the wrong process.
pub fn activation_script(app: &AppHandle) -> String {
    let target = match &app.bundle_id {
        Some(id) => format!("application id {}", applescript_quote(id)),
        None => format!("application {}", applescript_quote(&app.name)),
    };
    format!(
        "tell {target}\n    activate\n    try\n        set index of window 1 to 1\n    end try\nend tell"
    )
}

/// [`Fallback`] that shells out to `osascript`.
#[derive(Debug, Clone)]
pub struct OsaScriptFallback {
    /// Interpreter to run.
    program: String,
}

impl Default for OsaScriptFallback {
    fn default() -> Self {
        Self {
            program: "osascript".to_string(),
        }
    }
}

impl OsaScriptFallback {
    /// Fallback using a specific interpreter binary.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Fallback for OsaScriptFallback {
    fn force_activate(&self, app: &AppHandle) -> Result<(), FallbackError> {
        let script = activation_script(app);
        debug!(app = %app.name, "running activation script");
        let output = Command::new(&self.program)
            .arg("-e")
            .arg(&script)
            .output()
            .map_err(|e| FallbackError::Spawn(e.to_string()))?;
        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(FallbackError::InvocationFailed(stderr))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(name: &str, bundle: Option<&str>) -> AppHandle {
        AppHandle {
            pid: 42,
            name: name.into(),
            bundle_id: bundle.map(Into::into),
        }
    }

    #[test]
    fn quotes_and_backslashes_are_escaped() {
        assert_eq!(applescript_quote(r#"My "App""#), r#""My \"App\"""#);
        assert_eq!(applescript_quote(r"a\b"), r#""a\\b""#);
    }

    #[test]
    fn script_prefers_bundle_id() {
        let s = activation_script(&app("Safari", Some("com.apple.Safari")));
        assert!(s.starts_with("tell application id \"com.apple.Safari\"\n"));
        assert!(s.contains("set index of window 1 to 1"));
        assert!(s.ends_with("end tell"));
    }

    #[test]
    fn script_falls_back_to_name() {
        let s = activation_script(&app("Weird \"Name\"", None));
        assert!(s.starts_with("tell application \"Weird \\\"Name\\\"\"\n"));
    }

    #[test]
    fn missing_interpreter_is_a_spawn_error() {
        let fb = OsaScriptFallback::with_program("/nonexistent/osascript-for-tests");
        assert!(matches!(
            fb.force_activate(&app("Safari", None)),
            Err(FallbackError::Spawn(_))
        ));
    }

    #[test]
    fn failing_interpreter_is_an_invocation_error() {
        let fb = OsaScriptFallback::with_program("false");
        assert!(matches!(
            fb.force_activate(&app("Safari", None)),
            Err(FallbackError::InvocationFailed(_))
        ));
    }
}

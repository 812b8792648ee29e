//! Binary entrypoint for topmost: keep one application's window in front of
//! all others from the macOS status bar.
#![cfg_attr(not(target_os = "macos"), allow(dead_code))]

use std::{path::PathBuf, process};

use clap::Parser;
use topmost_core::config::load_config;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*};

/// Application state and event wiring.
#[cfg(target_os = "macos")]
mod app;
/// Global shortcut registration.
#[cfg(target_os = "macos")]
mod hotkey;
/// Procedural status-bar glyph.
mod icon;
/// Backend-free menu model.
mod menu;
/// Permissions help window.
#[cfg(target_os = "macos")]
mod permissions;
/// App picker state and window.
mod picker;
/// Settings window.
mod settings;
/// Accent palette and theme mode.
mod theme;
/// Pin/unpin toast.
mod toast;
/// Status-bar icon and menu.
#[cfg(target_os = "macos")]
mod tray;

#[derive(Parser, Debug)]
#[command(name = "topmost", about = "Keep one application's window on top", version)]
/// Command-line interface for the `topmost` binary.
struct Cli {
    /// Logging controls
    #[command(flatten)]
    log: logging::LogArgs,

    /// Optional path to the RON config file (defaults to ~/.topmost/config.ron)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Optional path to the preferences file (defaults to ~/.topmost/prefs.json)
    #[arg(long, value_name = "PATH")]
    prefs: Option<PathBuf>,

    /// Do not show the Accessibility trust prompt at launch
    #[arg(long)]
    no_prompt: bool,
}

fn main() {
    let cli = Cli::parse();

    let env_filter = logging::env_filter_from_spec(&cli.log.spec());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().without_time())
        .try_init()
        .ok();

    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(&cli, config) {
        error!("{}", e);
        process::exit(1);
    }
}

#[cfg(not(target_os = "macos"))]
/// topmost drives the macOS Accessibility API; there is nothing to run elsewhere.
fn run(_cli: &Cli, _config: topmost_core::Config) -> Result<(), String> {
    Err("topmost requires macOS".to_string())
}

#[cfg(target_os = "macos")]
/// Build the capabilities and controller, then hand the main thread to eframe.
fn run(cli: &Cli, config: topmost_core::Config) -> Result<(), String> {
    use std::sync::Arc;

    use eframe::NativeOptions;
    use mac_winops::{AxWindows, OsaScriptFallback, WorkspaceApps, observe_terminations};
    use objc2_app_kit::{NSApplication, NSApplicationActivationPolicy};
    use objc2_foundation::MainThreadMarker;
    use tokio::sync::mpsc as tokio_mpsc;
    use topmost_core::{
        Capabilities, JsonFileStore, PinController, PinEvent, SystemClock, prefs::default_prefs_path,
    };
    use tracing::{info, warn};

    use crate::{
        app::{AppEvent, TopmostApp},
        menu::MenuModel,
        permissions::PermissionsHelp,
        picker::Picker,
        settings::SettingsWindow,
        toast::Toasts,
        tray::Tray,
    };

    let trusted = ::permissions::accessibility_ok();
    if !trusted && !cli.no_prompt {
        info!("accessibility not granted; showing trust prompt");
        ::permissions::prompt_accessibility();
    }

    let prefs_path = cli.prefs.clone().unwrap_or_else(default_prefs_path);
    let caps = Capabilities {
        windows: Arc::new(AxWindows),
        apps: Arc::new(WorkspaceApps),
        fallback: Arc::new(OsaScriptFallback::default()),
        prefs: Arc::new(JsonFileStore::new(prefs_path)),
        clock: Arc::new(SystemClock),
    };
    let (pin_tx, pin_rx) = tokio_mpsc::unbounded_channel::<PinEvent>();
    let mut controller = PinController::new(caps, &config, process::id() as i32, pin_tx);
    match controller.restore_on_startup() {
        Ok(true) => info!("restored pinned target"),
        Ok(false) => {}
        Err(e) => warn!("could not restore pinned target: {}", e),
    }

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_visible(false)
            .with_transparent(true),
        ..Default::default()
    };
    let (tx, rx) = tokio_mpsc::unbounded_channel::<AppEvent>();

    eframe::run_native(
        "topmost",
        options,
        Box::new(move |cc| {
            cc.egui_ctx
                .send_viewport_cmd(egui::ViewportCommand::Visible(false));
            if let Some(mtm) = MainThreadMarker::new() {
                let app = NSApplication::sharedApplication(mtm);
                app.setActivationPolicy(NSApplicationActivationPolicy::Accessory);
            }

            let tray = Tray::new(
                &MenuModel::from_controller(&controller),
                tx.clone(),
                cc.egui_ctx.clone(),
            );
            let shortcut = match hotkey::register(&config.shortcut, tx.clone(), cc.egui_ctx.clone())
            {
                Ok(s) => Some(s),
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            };
            let observer = {
                let tx = tx.clone();
                let ctx = cc.egui_ctx.clone();
                observe_terminations(move |pid| {
                    if tx.send(AppEvent::Terminated(pid)).is_ok() {
                        ctx.request_repaint();
                    }
                })
            };

            let mut permissions = PermissionsHelp::new();
            if !trusted {
                permissions.show();
            }

            Ok(Box::new(TopmostApp {
                controller,
                rx,
                pin_rx,
                tray,
                picker: Picker::default(),
                settings: SettingsWindow::new(&config.shortcut),
                permissions,
                toasts: Toasts::new(config.notification()),
                _shortcut: shortcut,
                _observer: observer,
                applied_theme: None,
                menu_dirty: true,
                quitting: false,
            }))
        }),
    )
    .map_err(|e| format!("event loop failed: {e}"))
}

use std::time::Duration;

use topmost_core::{
    AccessError, ActivationPolicy, Attribute, PinError, PinEvent, PinState, Preferences,
    ShortcutAction, Value, status,
    test_support::{Harness, running},
};

const TICK: Duration = Duration::from_millis(500);

fn apps() -> Vec<topmost_core::RunningApp> {
    vec![
        running(1, "topmost", ActivationPolicy::Regular),
        running(2, "Safari", ActivationPolicy::Regular),
        running(3, "Notes", ActivationPolicy::Regular),
        running(4, "Spotlight", ActivationPolicy::Accessory),
    ]
}

fn persisting() -> Preferences {
    Preferences {
        persistence_enabled: true,
        ..Preferences::default()
    }
}

fn pinned_on_safari(prefs: Preferences) -> Harness {
    let mut h = Harness::new(apps(), prefs);
    h.controller.select_by_name(Some("Safari")).unwrap();
    assert_eq!(h.controller.toggle_pin(), Ok(PinState::Pinned));
    h.drain_events();
    h
}

fn assert_invariants(h: &Harness) {
    let c = &h.controller;
    assert!(!c.is_pinned() || c.target().is_some());
    assert_eq!(c.enforcement_active(), c.is_pinned());
}

#[test]
fn starts_idle() {
    let h = Harness::new(apps(), Preferences::default());
    assert_eq!(h.controller.state(), PinState::Idle);
    assert_eq!(h.controller.status_text(), status::IDLE);
    assert_eq!(h.controller.title(), "");
    let names: Vec<String> = h
        .controller
        .available_targets()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["Safari", "Notes"]);
}

#[test]
fn select_then_toggle_pins_and_persists_when_enabled() {
    let mut h = Harness::new(apps(), persisting());
    h.controller.select_by_name(Some("Safari")).unwrap();
    assert_eq!(h.controller.status_text(), "Selected: Safari");

    assert_eq!(h.controller.toggle_pin(), Ok(PinState::Pinned));
    assert_eq!(h.controller.target_name(), Some("Safari"));
    assert_eq!(h.controller.status_text(), status::PINNED);
    assert_eq!(h.controller.title(), "Safari (Pinned)");
    assert_eq!(h.stored_id().as_deref(), Some("com.example.safari"));
    assert_eq!(h.windows.activations(), vec![2]);
    assert!(h.drain_events().contains(&PinEvent::Pinned {
        name: "Safari".into()
    }));
    assert_invariants(&h);
}

#[test]
fn pin_does_not_persist_when_disabled() {
    let h = pinned_on_safari(Preferences::default());
    assert_eq!(h.controller.state(), PinState::Pinned);
    assert_eq!(h.stored_id(), None);
    assert_eq!(h.controller.persisted_id(), None);
}

#[test]
fn toggle_while_idle_fails_without_touching_windows() {
    let mut h = Harness::new(apps(), Preferences::default());
    assert_eq!(h.controller.toggle_pin(), Err(PinError::NoTargetSelected));
    assert_eq!(h.controller.state(), PinState::Idle);
    assert_eq!(h.controller.status_text(), "Error: No app selected");
    assert!(h.windows.lookups().is_empty());
}

#[test]
fn toggle_without_permission_stays_selected() {
    let mut h = Harness::new(apps(), Preferences::default());
    h.controller.select_by_name(Some("Notes")).unwrap();
    h.windows.set_trusted(false);
    assert_eq!(h.controller.toggle_pin(), Err(PinError::PermissionDenied));
    assert_eq!(h.controller.state(), PinState::Selected);
    assert_eq!(
        h.controller.status_text(),
        "Error: Accessibility permissions required"
    );
    assert_invariants(&h);
}

#[test]
fn toggle_without_window_reports_unavailable() {
    let mut h = Harness::new(apps(), Preferences::default());
    h.controller.select_by_name(Some("Notes")).unwrap();
    h.windows.set_sources(&[]);
    assert_eq!(
        h.controller.toggle_pin(),
        Err(PinError::WindowUnavailable(AccessError::NoAccessibleWindow))
    );
    assert_eq!(h.controller.state(), PinState::Selected);
    assert_eq!(h.controller.status_text(), "Error: Cannot access window");
    assert!(!h.controller.enforcement_active());
}

#[test]
fn double_toggle_returns_to_selected_without_timer() {
    let mut h = pinned_on_safari(persisting());
    assert_eq!(h.controller.toggle_pin(), Ok(PinState::Selected));
    assert_eq!(h.controller.target_name(), Some("Safari"));
    assert!(!h.controller.enforcement_active());
    assert_eq!(h.controller.status_text(), status::UNPINNED);
    assert_eq!(h.controller.title(), "Safari (Unpinned)");
    assert_eq!(h.stored_id(), None);
    assert!(h.drain_events().contains(&PinEvent::Unpinned {
        name: "Safari".into()
    }));
    assert_eq!(h.windows.frontmost(), Some(false));
}

#[test]
fn termination_of_pinned_target_goes_idle() {
    let mut h = pinned_on_safari(persisting());
    assert!(h.controller.target_terminated(2));
    assert_eq!(h.controller.state(), PinState::Idle);
    assert!(!h.controller.enforcement_active());
    assert_eq!(h.stored_id(), None);
    assert_eq!(h.controller.status_text(), "Selected app terminated.");

    // A second report of the same exit is a no-op.
    h.drain_events();
    assert!(!h.controller.target_terminated(2));
    assert_eq!(h.controller.status_text(), "Selected app terminated.");
    assert!(h.drain_events().is_empty());
}

#[test]
fn termination_of_other_app_is_ignored() {
    let mut h = pinned_on_safari(Preferences::default());
    assert!(!h.controller.target_terminated(3));
    assert_eq!(h.controller.state(), PinState::Pinned);
    assert_eq!(h.controller.available_targets().len(), 1);
}

#[test]
fn refresh_and_termination_event_converge() {
    let mut h = pinned_on_safari(persisting());
    h.apps.kill(2);
    h.controller.refresh_targets();
    assert_eq!(h.controller.state(), PinState::Idle);
    assert_eq!(h.controller.status_text(), status::TERMINATED);
    assert_eq!(h.stored_id(), None);

    // The observer's notification arriving afterwards changes nothing.
    assert!(!h.controller.target_terminated(2));
    assert_eq!(h.controller.state(), PinState::Idle);
}

#[test]
fn periodic_refresh_notices_exit() {
    let mut h = pinned_on_safari(Preferences::default());
    h.apps.kill(2);
    for _ in 0..6 {
        h.advance(TICK);
    }
    assert_eq!(h.controller.state(), PinState::Idle);
    assert_invariants(&h);
}

#[test]
fn selecting_another_target_stops_enforcement_first() {
    let mut h = pinned_on_safari(persisting());
    h.controller.select_by_name(Some("Notes")).unwrap();
    assert_eq!(h.controller.state(), PinState::Selected);
    assert_eq!(h.controller.target_name(), Some("Notes"));
    assert!(!h.controller.enforcement_active());
    // Safari is still running, so its stored identifier survives.
    assert_eq!(h.stored_id().as_deref(), Some("com.example.safari"));

    h.windows.clear_log();
    h.advance(TICK);
    assert!(h.windows.lookups().is_empty());
}

#[test]
fn selecting_after_previous_target_exit_clears_stored_id() {
    let mut h = pinned_on_safari(persisting());
    h.apps.kill(2);
    h.controller.refresh_targets();
    h.controller.select_by_name(Some("Notes")).unwrap();
    assert_eq!(h.stored_id(), None);
}

#[test]
fn unknown_name_leaves_session_unchanged() {
    let mut h = pinned_on_safari(Preferences::default());
    assert_eq!(
        h.controller.select_by_name(Some("Xcode")),
        Err(PinError::TargetNotRunning)
    );
    assert_eq!(h.controller.state(), PinState::Pinned);
}

#[test]
fn deselect_returns_to_idle_and_forgets() {
    let mut h = pinned_on_safari(persisting());
    h.controller.select_by_name(None).unwrap();
    assert_eq!(h.controller.state(), PinState::Idle);
    assert_eq!(h.controller.status_text(), status::IDLE);
    assert_eq!(h.stored_id(), None);
    assert_invariants(&h);
}

#[test]
fn tick_reasserts_frontmost_after_focus_theft() {
    let mut h = pinned_on_safari(Preferences::default());
    h.windows.set_frontmost(Some(false));
    h.windows.clear_log();
    h.advance(TICK);
    assert_eq!(
        h.windows.writes().first(),
        Some(&(Attribute::Main, Value::Bool(true)))
    );
    assert_eq!(h.windows.raises(), 1);
    assert_eq!(h.controller.status_text(), status::PINNED);
}

#[test]
fn tick_skips_redundant_writes() {
    let mut h = pinned_on_safari(Preferences::default());
    h.windows.clear_log();
    h.advance(TICK);
    assert!(h.windows.writes().is_empty());
    // The window is looked up afresh each cycle.
    assert!(!h.windows.lookups().is_empty());
}

#[test]
fn transient_window_loss_keeps_timer_running() {
    let mut h = pinned_on_safari(Preferences::default());
    h.windows.set_sources(&[]);
    h.advance(TICK);
    assert_eq!(h.controller.status_text(), "Error: Cannot access window");
    assert_eq!(h.controller.state(), PinState::Pinned);
    assert!(h.controller.enforcement_active());

    h.windows.set_sources(&[topmost_core::WindowSource::First]);
    h.advance(TICK);
    assert_eq!(h.controller.status_text(), status::PINNED);
}

#[test]
fn fallback_runs_every_tick_but_is_throttled() {
    let mut h = pinned_on_safari(Preferences::default());
    for _ in 0..4 {
        h.advance(TICK);
    }
    // Ticks at 0.5s, 1.0s, 1.5s, 2.0s; the throttle admits 0.5s and 1.5s.
    assert_eq!(h.fallback.calls().len(), 2);
}

#[test]
fn fallback_failure_only_degrades_status() {
    let mut h = pinned_on_safari(Preferences::default());
    h.fallback.set_fail(true);
    h.advance(TICK);
    assert_eq!(h.controller.status_text(), status::FALLBACK_FAILED);
    assert_eq!(h.controller.state(), PinState::Pinned);
}

#[test]
fn raise_failure_on_pin_engages_fallback() {
    let mut h = Harness::new(apps(), Preferences::default());
    h.windows.set_fail_raise(true);
    h.controller.select_by_name(Some("Safari")).unwrap();
    assert_eq!(h.controller.toggle_pin(), Ok(PinState::Pinned));
    assert_eq!(h.fallback.calls(), vec!["Safari".to_string()]);
    assert_eq!(h.controller.status_text(), status::PINNED);
}

#[test]
fn geometry_warning_surfaces_on_tick() {
    let mut h = pinned_on_safari(Preferences::default());
    h.windows.set_frontmost(Some(false));
    h.windows.set_fail_write(Attribute::Position, true);
    h.advance(TICK);
    assert_eq!(
        h.controller.status_text(),
        "Warning: Pinning may not persist for this app"
    );
}

#[test]
fn activation_failure_does_not_block_pin() {
    let mut h = Harness::new(apps(), Preferences::default());
    h.windows.set_fail_activate(true);
    h.controller.select_by_name(Some("Notes")).unwrap();
    assert_eq!(h.controller.toggle_pin(), Ok(PinState::Pinned));
}

#[test]
fn restore_pins_persisted_app() {
    let mut h = Harness::new(
        apps(),
        Preferences {
            last_pinned_bundle_id: Some("com.example.notes".into()),
            ..persisting()
        },
    );
    assert_eq!(h.controller.restore_on_startup(), Ok(true));
    assert_eq!(h.controller.state(), PinState::Pinned);
    assert_eq!(h.controller.target_name(), Some("Notes"));
}

#[test]
fn restore_is_noop_when_disabled() {
    let mut h = Harness::new(
        apps(),
        Preferences {
            last_pinned_bundle_id: Some("com.example.notes".into()),
            ..Preferences::default()
        },
    );
    assert_eq!(h.controller.restore_on_startup(), Ok(false));
    assert_eq!(h.controller.state(), PinState::Idle);
}

#[test]
fn restore_with_inaccessible_window_keeps_stored_id() {
    let mut h = Harness::new(
        apps(),
        Preferences {
            last_pinned_bundle_id: Some("com.example.notes".into()),
            ..persisting()
        },
    );
    h.windows.set_sources(&[]);
    assert!(matches!(
        h.controller.restore_on_startup(),
        Err(PinError::WindowUnavailable(_))
    ));
    assert_ne!(h.controller.state(), PinState::Pinned);
    assert_eq!(h.controller.status_text(), status::PERSISTED_WINDOW);
    assert_eq!(h.stored_id().as_deref(), Some("com.example.notes"));
    assert_invariants(&h);
}

#[test]
fn restore_without_permission_keeps_stored_id() {
    let mut h = Harness::new(
        apps(),
        Preferences {
            last_pinned_bundle_id: Some("com.example.notes".into()),
            ..persisting()
        },
    );
    h.windows.set_trusted(false);
    assert_eq!(
        h.controller.restore_on_startup(),
        Err(PinError::PermissionDenied)
    );
    assert_eq!(h.controller.status_text(), status::PERSISTED_PERMISSION);
    assert_eq!(h.stored_id().as_deref(), Some("com.example.notes"));
}

#[test]
fn restore_of_exited_app_clears_stored_id() {
    let mut h = Harness::new(
        apps(),
        Preferences {
            last_pinned_bundle_id: Some("com.example.xcode".into()),
            ..persisting()
        },
    );
    assert_eq!(
        h.controller.restore_on_startup(),
        Err(PinError::TargetNotRunning)
    );
    assert_eq!(h.controller.state(), PinState::Idle);
    assert_eq!(h.stored_id(), None);
}

#[test]
fn shortcut_unpins_when_pinned() {
    let mut h = pinned_on_safari(Preferences::default());
    assert_eq!(h.controller.handle_shortcut(true), ShortcutAction::Unpin);
    assert_eq!(h.controller.state(), PinState::Selected);
    assert_eq!(h.controller.handle_shortcut(true), ShortcutAction::ClosePicker);
    assert_eq!(h.controller.handle_shortcut(false), ShortcutAction::OpenPicker);
    assert_eq!(h.controller.state(), PinState::Selected);
}

#[test]
fn picker_selection_pins_immediately() {
    let mut h = Harness::new(apps(), Preferences::default());
    assert_eq!(h.controller.pin_from_picker("Notes"), Ok(PinState::Pinned));
    assert_eq!(h.controller.target_name(), Some("Notes"));
    let hits: Vec<&str> = h
        .controller
        .search("NOT")
        .into_iter()
        .map(|a| a.name.as_str())
        .collect();
    assert_eq!(hits, vec!["Notes"]);
}

#[test]
fn enabling_persistence_while_pinned_stores_target() {
    let mut h = pinned_on_safari(Preferences::default());
    h.controller.set_persistence_enabled(true);
    assert_eq!(h.stored_id().as_deref(), Some("com.example.safari"));
    h.controller.set_persistence_enabled(false);
    assert_eq!(h.stored_id(), None);
    assert!(!h.prefs.snapshot().persistence_enabled);
}

#[test]
fn available_targets_mark_current() {
    let mut h = Harness::new(apps(), Preferences::default());
    h.controller.select_by_name(Some("Notes")).unwrap();
    let current: Vec<String> = h
        .controller
        .available_targets()
        .into_iter()
        .filter(|e| e.is_current)
        .map(|e| e.name)
        .collect();
    assert_eq!(current, vec!["Notes"]);
}

#[test]
fn next_deadline_tracks_enforcement() {
    let h = pinned_on_safari(Preferences::default());
    let now = topmost_core::Clock::now(h.clock.as_ref());
    assert_eq!(h.controller.next_deadline(), Some(now + TICK));
}

#[test]
fn menu_choice_switches_between_same_named_apps() {
    let mut h = Harness::new(
        vec![
            running(2, "Terminal", ActivationPolicy::Regular),
            running(3, "Terminal", ActivationPolicy::Regular),
        ],
        Preferences::default(),
    );
    h.controller.choose_entry(2).unwrap();
    assert_eq!(h.controller.target().map(|t| t.pid), Some(2));

    // The unchecked twin switches the target rather than clearing it.
    h.controller.choose_entry(3).unwrap();
    assert_eq!(h.controller.state(), PinState::Selected);
    assert_eq!(h.controller.target().map(|t| t.pid), Some(3));

    // The checked entry deselects.
    h.controller.choose_entry(3).unwrap();
    assert_eq!(h.controller.state(), PinState::Idle);
    assert_eq!(h.controller.status_text(), status::IDLE);
}

#[test]
fn menu_choice_of_exited_pid_is_rejected() {
    let mut h = Harness::new(apps(), Preferences::default());
    h.controller.choose_entry(2).unwrap();
    assert_eq!(h.controller.choose_entry(42), Err(PinError::TargetNotRunning));
    assert_eq!(h.controller.target().map(|t| t.pid), Some(2));
}

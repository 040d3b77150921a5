//! End-to-end runs of a user program against the headless backend.

use spl_gui::widget::headless::ScriptedColorDialog;
use spl_gui::widget::EventKind;
use spl_gui::{Application, GuiConfig, HasText, Interactor, ThreadRole};
use std::sync::{Arc, Mutex};

fn config() -> GuiConfig {
    GuiConfig {
        loop_timeout_ms: 10,
        ..GuiConfig::default()
    }
}

#[test]
fn worker_program_edits_text_and_picks_colors() {
    let app = Application::new(config()).unwrap();
    let report = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = Arc::clone(&report);

    let code = app
        .run(move |gui| {
            let log = |line: String| sink.lock().unwrap().push(line);
            assert_eq!(gui.dispatcher().current_role(), ThreadRole::Worker);

            let area = gui.text_area().unwrap();
            log(format!("rows={} columns={}", area.rows().unwrap(), area.columns().unwrap()));

            let changes = Arc::new(Mutex::new(0));
            let counter = Arc::clone(&changes);
            area.set_text_change_listener(move |_, _| *counter.lock().unwrap() += 1)
                .unwrap();

            area.set_text("line one\n").unwrap();
            area.append_text("line two").unwrap();
            area.simulate_typing("!").unwrap();
            area.deliver(EventKind::KeyPressed { key: '\u{8}' }).unwrap();
            log(format!("text={:?}", area.text().unwrap()));
            log(format!("changes={}", changes.lock().unwrap()));
            log(format!("type={}", area.type_name()));

            let chooser = gui
                .color_chooser(|| ScriptedColorDialog::new([Some(0x00AA00), None]))
                .unwrap();
            log(format!("pick={:?}", chooser.show_dialog("Pick", "").unwrap()));
            log(format!("cancel={:?}", chooser.show_dialog("Pick", "green").unwrap()));
            0
        })
        .unwrap();

    assert_eq!(code, 0);
    assert_eq!(
        *report.lock().unwrap(),
        vec![
            "rows=10 columns=40".to_string(),
            "text=\"line one\\nline two\"".to_string(),
            "changes=4".to_string(),
            "type=TextArea".to_string(),
            "pick=\"#00aa00\"".to_string(),
            "cancel=\"\"".to_string(),
        ]
    );
}

#[test]
fn widgets_can_be_built_on_ui_thread_and_shared_with_worker() {
    let app = Application::new(config()).unwrap();
    let gui = app.gui();
    let area = gui.text_area().unwrap();
    area.set_text("prepared on the UI thread").unwrap();

    let shared = area.clone();
    let code = app
        .run(move |_| {
            shared.append_text(", finished by the worker").unwrap();
            0
        })
        .unwrap();

    assert_eq!(code, 0);
    assert_eq!(
        area.text().unwrap(),
        "prepared on the UI thread, finished by the worker"
    );
}

#[test]
fn calls_after_shutdown_fail_instead_of_hanging() {
    let app = Application::new(config()).unwrap();
    let gui = app.gui();
    let (area_tx, area_rx) = crossbeam_channel::bounded(1);
    let (resume_tx, resume_rx) = crossbeam_channel::bounded::<()>(1);
    let (outcome_tx, outcome_rx) = crossbeam_channel::bounded(1);

    let code = app
        .run(move |gui| {
            let area = gui.text_area().unwrap();
            area_tx.send(area.clone()).unwrap();
            gui.exit_graphics(5);
            resume_rx.recv().unwrap();
            outcome_tx.send(area.set_text("too late")).unwrap();
            0
        })
        .unwrap();
    assert_eq!(code, 5);

    let _area = area_rx.recv().unwrap();
    resume_tx.send(()).unwrap();
    assert!(matches!(
        outcome_rx.recv().unwrap(),
        Err(spl_gui::GuiError::Disconnected)
    ));
    assert!(gui.dispatcher().is_closed());
}

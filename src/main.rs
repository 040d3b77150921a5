use log::{info, warn};
use spl_gui::widget::headless::ScriptedColorDialog;
use spl_gui::{init_logging, Application, Gui, GuiConfig, HasText};

/// A small program in the style users write: plain sequential calls.
fn student_main(gui: Gui) -> i32 {
    let run = || -> spl_gui::Result<()> {
        let notes = gui.text_area()?;
        notes.set_placeholder("Type something...")?;
        notes.set_text_change_listener(|_, event| {
            info!("Text changed ({})", event.action_command);
        })?;

        notes.set_text("Hello from the worker thread.\n")?;
        notes.append_formatted_text("Warnings look like this.\n", "red", "Monospaced-Bold-12")?;
        notes.simulate_typing("typed!")?;
        info!(
            "Text area is {} rows x {} columns and reads: {:?}",
            notes.rows()?,
            notes.columns()?,
            notes.text()?
        );

        let chooser = gui.color_chooser(|| ScriptedColorDialog::new([Some(0x3366CC), None]))?;
        let picked = chooser.show_dialog("Pick a color", "white")?;
        info!("First pick: {:?}", picked);
        let cancelled = chooser.show_dialog("Pick another", &picked)?;
        info!("Second pick (cancelled): {:?}", cancelled);
        Ok(())
    };

    match run() {
        Ok(()) => 0,
        Err(e) => {
            warn!("Program failed: {}", e);
            1
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = GuiConfig::load_from_file().unwrap_or_default();
    init_logging(&config);
    info!("Starting spl-gui demo");

    let app = Application::new(config)?;
    let code = app.run(student_main)?;
    info!("Exiting with code {}", code);
    std::process::exit(code);
}

//! Application entry point for the geology viewer.
//!
//! This binary sets up logging and eframe/egui and delegates all
//! interactive logic and rendering to [`Viewer`] from the `viewer` module.

mod viewer;

use geosim_core::scenario::ScenarioKind;
use log::info;
use viewer::Viewer;

/// Starts the native eframe application.
///
/// The first command-line argument, if any, picks the scenario shown at
/// startup by its tag (`solar`, `landslide`, `flood`, `mountain`, `lake`).
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if the scenario tag is unknown, or eframe fails to create the
///   native window or event loop.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let kind = match std::env::args().nth(1) {
        Some(tag) => tag.parse::<ScenarioKind>()?,
        None => ScenarioKind::default(),
    };
    info!("starting viewer on {kind}");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 760.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Geology Hub",
        options,
        Box::new(move |_cc| Ok(Box::new(Viewer::new(kind)))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run application: {e}"))
}

//! Headless entry point: restores the saved draft, runs a small demo
//! edit, and exports the cover to `exports/`.

use covercraft_app::{CoverSink, EditorSession, FileSink, ShortcutRegistry};
use covercraft_core::FileStorage;
use covercraft_render::{render_cover, FontStore, RasterRenderer};
use std::path::PathBuf;
use std::sync::Arc;

fn main() {
    env_logger::init();
    log::info!("Starting Covercraft");

    ShortcutRegistry::print_all();

    let storage = match FileStorage::default_location() {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            log::error!("could not open draft storage: {}", e);
            std::process::exit(1);
        }
    };

    let mut session = EditorSession::new(storage);
    pollster::block_on(session.restore());

    if session.document().text_layers.is_empty() {
        session.add_text_layer();
        let mut rng = rand::thread_rng();
        session.randomize_design(&mut rng);
    }

    let mut renderer = RasterRenderer::new(FontStore::system());
    if let Some(snapshot) = session.request_export() {
        let outcome = render_cover(&mut renderer, &snapshot);
        match &outcome {
            Ok(cover) => match FileSink::new(PathBuf::from("exports")) {
                Ok(sink) => match pollster::block_on(sink.deliver(cover)) {
                    Ok(location) => println!("Exported cover to {}", location),
                    Err(e) => log::error!("delivery failed: {}", e),
                },
                Err(e) => log::error!("could not open export directory: {}", e),
            },
            Err(e) => log::error!("export failed: {}", e),
        }
        let _ = session.complete_export(outcome.map(|_| ()));
    }

    if let Err(e) = pollster::block_on(session.flush()) {
        log::error!("could not save draft: {}", e);
    }
    for notice in session.take_notices() {
        log::info!("notice: {:?}", notice);
    }
}

mod commands;
mod config;
mod error;
mod models;
mod services;

use config::AppConfig;
use services::classifier::client::ClassifierClient;
use services::session::SignatureSession;
use tauri::{Manager, WindowEvent};

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_window_state::Builder::default().build())
        .setup(|app| {
            let config_dir = match app.path().app_config_dir() {
                Ok(dir) => Some(dir),
                Err(e) => {
                    log::warn!("No app config directory, using defaults: {}", e);
                    None
                }
            };

            let config = AppConfig::load(config_dir.as_deref());
            let client = ClassifierClient::new(&config)?;
            log::info!("Classifying signatures against {}", client.endpoint());

            app.manage(config);
            app.manage(client);
            app.manage(SignatureSession::new());

            Ok(())
        })
        .on_window_event(|window, event| {
            if let WindowEvent::Destroyed = event {
                // Don't leave a pending request mutating state nobody renders
                if let Some(session) = window.try_state::<SignatureSession>() {
                    session.abort_in_flight();
                }
            }
        })
        .invoke_handler(tauri::generate_handler![
            commands::signature::get_state,
            commands::signature::get_config,
            commands::signature::pick_from_gallery,
            commands::signature::capture_from_camera,
            commands::signature::clear_signature,
            commands::signature::classify_signature,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

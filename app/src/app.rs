use glib::ControlFlow;
use gtk4::prelude::*;

use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::Context;

use ipc::{ActivationService, InstanceLock, Role};
use utils::{ActivationRequest, Settings};

use crate::clipboard;
use crate::tray;
use crate::window::MainWindow;

pub const APP_ID: &str = "io.github.linguatray.LinguaTray";

/// Everything that reaches the main loop from elsewhere: the activation
/// service, the tray thread, the model-list loader. One channel, one drain.
pub enum AppEvent {
    Activation(ActivationRequest),
    ShowWindow,
    ShowAbout,
    ModelsLoaded(Vec<String>),
    ModelListFailed(String),
    TrayFailed(String),
    Quit,
}

pub fn run() -> anyhow::Result<()> {
    let app = gtk4::Application::builder()
        .application_id(APP_ID)
        // Single-instance handling belongs to the ipc crate; GTK's own
        // D-Bus uniqueness would fight it for the name.
        .flags(gtk4::gio::ApplicationFlags::NON_UNIQUE)
        .build();

    app.connect_activate(|app| {
        // Repeated activations must not rebuild the app.
        if let Some(win) = app.active_window() {
            win.present();
            return;
        }
        if let Err(e) = build(app) {
            // Startup failures are fatal: a degraded instance without the
            // tray or the single-instance guarantee is worse than none.
            eprintln!("linguatray: {e:#}");
            std::process::exit(1);
        }
    });

    // clap already consumed argv; GTK gets none of it.
    app.run_with_args::<String>(&[]);
    Ok(())
}

fn build(app: &gtk4::Application) -> anyhow::Result<()> {
    let settings_path = utils::settings_path();
    let settings = Settings::load_or_default(&settings_path);
    let endpoint = settings.translate.endpoint.clone();

    let (tx, rx) = mpsc::channel::<AppEvent>();

    // The transport comes first: when another primary already owns the bus
    // name or the lock, this instance must die before it grows any UI.
    // The callback crosses into gio's dispatch machinery, hence the Mutex
    // around the Send-only channel sender.
    let activation_tx = Mutex::new(tx.clone());
    let on_activation: ipc::ActivationCallback = Arc::new(move |req| {
        let _ = activation_tx
            .lock()
            .unwrap()
            .send(AppEvent::Activation(req));
    });
    let service =
        ActivationService::new(Role::Server, on_activation).context("start activation service")?;
    let instance_lock = if service.provides_instance_guard() {
        None
    } else {
        Some(InstanceLock::acquire(ipc::PROCESS_NAME).context("acquire instance lock")?)
    };

    let window = MainWindow::build(app, settings, settings_path);
    tray::spawn(tx.clone());
    spawn_model_loader(endpoint, tx);

    let state = AppState {
        app: app.clone(),
        window,
        _service: service,
        _instance_lock: instance_lock,
    };

    glib::timeout_add_local(Duration::from_millis(50), move || {
        while let Ok(event) = rx.try_recv() {
            state.dispatch(event);
        }
        ControlFlow::Continue
    });

    Ok(())
}

/// Composition root state: owns the window, the live transport and the
/// instance lock for the lifetime of the event drain.
struct AppState {
    app: gtk4::Application,
    window: MainWindow,
    _service: ActivationService,
    _instance_lock: Option<InstanceLock>,
}

impl AppState {
    fn dispatch(&self, event: AppEvent) {
        match event {
            AppEvent::Activation(ActivationRequest::WakeAndTranslate) => {
                self.process_translation_request()
            }
            AppEvent::ShowWindow => self.window.present(),
            AppEvent::ShowAbout => self.window.show_about(),
            AppEvent::ModelsLoaded(models) => self.window.set_model_choices(models),
            AppEvent::ModelListFailed(e) => {
                log::info!("model list unavailable: {e}");
                self.window
                    .show_status("Model list unavailable (is the model server running?)");
            }
            AppEvent::TrayFailed(e) => {
                // The tray is the app's home; without it the background
                // contract is broken.
                eprintln!("linguatray: tray icon unavailable: {e}");
                std::process::exit(1);
            }
            AppEvent::Quit => {
                self.window.persist();
                self.app.quit();
            }
        }
    }

    /// The one observable effect of an activation: show the window, load
    /// the clipboard text, start a translation.
    fn process_translation_request(&self) {
        log::info!("activation: wake and translate");
        self.window.present();
        let window = self.window.clone();
        clipboard::read_text(move |text| match text {
            Some(t) if !t.trim().is_empty() => {
                window.set_source_text(&t);
                window.translate();
            }
            _ => window.show_status("Clipboard has no text to translate"),
        });
    }
}

fn spawn_model_loader(endpoint: String, tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || match translator::list_models(&endpoint) {
        Ok(models) if !models.is_empty() => {
            let _ = tx.send(AppEvent::ModelsLoaded(models));
        }
        Ok(_) => {
            let _ = tx.send(AppEvent::ModelListFailed("server reports no models".into()));
        }
        Err(e) => {
            let _ = tx.send(AppEvent::ModelListFailed(format!("{e:#}")));
        }
    });
}

use std::sync::mpsc;
use std::thread;

use ksni::menu::StandardItem;
use ksni::{Status, ToolTip, Tray, TrayService};

use utils::ActivationRequest;

use crate::app::AppEvent;

/// StatusNotifierItem tray icon. ksni runs its own service thread and
/// speaks D-Bus by itself, so every menu action is relayed to the GTK main
/// loop through the AppEvent channel instead of touching widgets here.
pub struct LinguaTrayIcon {
    events: mpsc::Sender<AppEvent>,
}

impl LinguaTrayIcon {
    fn post(&self, event: AppEvent) {
        let _ = self.events.send(event);
    }
}

impl Tray for LinguaTrayIcon {
    fn icon_name(&self) -> String {
        "accessories-dictionary".to_string()
    }

    fn title(&self) -> String {
        "LinguaTray".to_string()
    }

    fn id(&self) -> String {
        "linguatray".to_string()
    }

    fn status(&self) -> Status {
        // Many SNI hosts hide `Passive` items; the icon should stay visible
        // while the app idles in the background.
        Status::Active
    }

    fn tool_tip(&self) -> ToolTip {
        ToolTip {
            icon_name: self.icon_name(),
            title: "LinguaTray".to_string(),
            description: "Translate the clipboard with a local model".to_string(),
            ..Default::default()
        }
    }

    fn menu(&self) -> Vec<ksni::menu::MenuItem<Self>> {
        use ksni::menu::MenuItem;

        vec![
            MenuItem::Standard(StandardItem {
                label: "Translate clipboard".into(),
                activate: Box::new(|this: &mut Self| {
                    this.post(AppEvent::Activation(ActivationRequest::WakeAndTranslate))
                }),
                ..Default::default()
            }),
            MenuItem::Standard(StandardItem {
                label: "Show window".into(),
                activate: Box::new(|this: &mut Self| this.post(AppEvent::ShowWindow)),
                ..Default::default()
            }),
            MenuItem::Separator,
            MenuItem::Standard(StandardItem {
                label: "About".into(),
                activate: Box::new(|this: &mut Self| this.post(AppEvent::ShowAbout)),
                ..Default::default()
            }),
            MenuItem::Separator,
            MenuItem::Standard(StandardItem {
                label: "Quit".into(),
                activate: Box::new(|this: &mut Self| this.post(AppEvent::Quit)),
                ..Default::default()
            }),
        ]
    }

    fn activate(&mut self, _x: i32, _y: i32) {
        self.post(AppEvent::ShowWindow);
    }
}

/// Run the tray on its own thread. The tray icon is part of the UX
/// contract: if the host can't show it, the failure is posted back so the
/// main loop can treat it as fatal.
pub fn spawn(events: mpsc::Sender<AppEvent>) {
    let fail_tx = events.clone();
    let service = TrayService::new(LinguaTrayIcon { events });
    thread::spawn(move || {
        if let Err(e) = service.run() {
            let _ = fail_tx.send(AppEvent::TrayFailed(format!("{e:?}")));
        }
    });
}

use glib::ControlFlow;
use gtk4::prelude::*;

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc;
use std::time::Duration;

use translator::{Timing, TranslationRequest};
use utils::Settings;

use crate::task::{TaskGate, TaskOutcome, TranslationTask};

const TARGET_LANGS: &[(&str, &str)] = &[
    ("en", "English"),
    ("ru", "Russian"),
    ("de", "German"),
    ("fr", "French"),
    ("es", "Spanish"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("zh", "Chinese"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
];

/// The translation window. Cheap to clone (widgets are refcounted); all
/// methods run on the main loop. Closing hides the window instead of
/// quitting: the app lives in the tray.
#[derive(Clone)]
pub struct MainWindow {
    window: gtk4::ApplicationWindow,
    source_view: gtk4::TextView,
    result_view: gtk4::TextView,
    translate_btn: gtk4::Button,
    model_combo: gtk4::ComboBoxText,
    lang_combo: gtk4::ComboBoxText,
    spinner: gtk4::Spinner,
    status: gtk4::Label,
    gate: Rc<TaskGate>,
    settings: Rc<RefCell<Settings>>,
    settings_path: Rc<PathBuf>,
}

impl MainWindow {
    pub fn build(app: &gtk4::Application, settings: Settings, settings_path: PathBuf) -> Self {
        let window = gtk4::ApplicationWindow::builder()
            .application(app)
            .title("LinguaTray")
            .default_width(settings.window.width)
            .default_height(settings.window.height)
            .build();

        let source_view = gtk4::TextView::new();
        source_view.set_wrap_mode(gtk4::WrapMode::WordChar);

        let result_view = gtk4::TextView::new();
        result_view.set_wrap_mode(gtk4::WrapMode::WordChar);
        result_view.set_editable(false);
        result_view.set_cursor_visible(false);

        let model_combo = gtk4::ComboBoxText::with_entry();
        if let Some(entry) = model_combo.child().and_downcast::<gtk4::Entry>() {
            entry.set_text(&settings.translate.model);
        }

        let lang_combo = gtk4::ComboBoxText::new();
        for (code, label) in TARGET_LANGS {
            lang_combo.append(Some(code), label);
        }
        if !lang_combo.set_active_id(Some(&settings.translate.target_lang)) {
            lang_combo.set_active_id(Some("en"));
        }

        let translate_btn = gtk4::Button::with_label("Translate");

        let spinner = gtk4::Spinner::new();
        let status = gtk4::Label::new(None);
        status.set_xalign(0.0);
        status.set_hexpand(true);

        let controls = gtk4::Box::new(gtk4::Orientation::Horizontal, 8);
        controls.append(&model_combo);
        controls.append(&lang_combo);
        controls.append(&translate_btn);

        let status_row = gtk4::Box::new(gtk4::Orientation::Horizontal, 8);
        status_row.append(&spinner);
        status_row.append(&status);

        let source_scroll = gtk4::ScrolledWindow::builder()
            .child(&source_view)
            .vexpand(true)
            .build();
        let result_scroll = gtk4::ScrolledWindow::builder()
            .child(&result_view)
            .vexpand(true)
            .build();

        let root = gtk4::Box::new(gtk4::Orientation::Vertical, 8);
        root.set_margin_top(12);
        root.set_margin_bottom(12);
        root.set_margin_start(12);
        root.set_margin_end(12);
        root.append(&source_scroll);
        root.append(&controls);
        root.append(&result_scroll);
        root.append(&status_row);
        window.set_child(Some(&root));

        let this = Self {
            window,
            source_view,
            result_view,
            translate_btn,
            model_combo,
            lang_combo,
            spinner,
            status,
            gate: Rc::new(TaskGate::default()),
            settings: Rc::new(RefCell::new(settings)),
            settings_path: Rc::new(settings_path),
        };

        let win = this.clone();
        this.translate_btn.connect_clicked(move |_| win.translate());

        let win = this.clone();
        this.window.connect_close_request(move |w| {
            win.persist();
            w.set_visible(false);
            glib::Propagation::Stop
        });

        this
    }

    pub fn present(&self) {
        self.window.present();
    }

    pub fn set_source_text(&self, text: &str) {
        self.source_view.buffer().set_text(text);
    }

    fn source_text(&self) -> String {
        let buffer = self.source_view.buffer();
        let (start, end) = buffer.bounds();
        buffer.text(&start, &end, false).to_string()
    }

    pub fn show_status(&self, message: &str) {
        self.status.set_text(message);
    }

    /// Replace the model dropdown's choices, keeping whatever the user has
    /// typed into the entry.
    pub fn set_model_choices(&self, models: Vec<String>) {
        let current = self.current_model();
        self.model_combo.remove_all();
        for model in &models {
            self.model_combo.append_text(model);
        }
        if let Some(entry) = self.model_combo.child().and_downcast::<gtk4::Entry>() {
            entry.set_text(&current);
        }
        log::debug!("model picker: {} models", models.len());
    }

    fn current_model(&self) -> String {
        let typed = self
            .model_combo
            .child()
            .and_downcast::<gtk4::Entry>()
            .map(|e| e.text().to_string())
            .filter(|s| !s.trim().is_empty());
        typed
            .or_else(|| self.model_combo.active_text().map(|s| s.to_string()))
            .unwrap_or_else(|| self.settings.borrow().translate.model.clone())
    }

    fn current_lang(&self) -> String {
        self.lang_combo
            .active_id()
            .map(|s| s.to_string())
            .unwrap_or_else(|| self.settings.borrow().translate.target_lang.clone())
    }

    /// Start a background translation of the source buffer. A no-op while
    /// a task is already in flight: the gate (and the disabled button) is
    /// the only guard against overlapping tasks, and it is enough because
    /// everything here runs on the main loop.
    pub fn translate(&self) {
        if !self.gate.begin() {
            log::debug!("translate ignored: task already running");
            return;
        }
        let text = self.source_text();
        if text.trim().is_empty() {
            self.gate.finish();
            self.show_status("Nothing to translate");
            return;
        }

        let model = self.current_model();
        let target_lang = self.current_lang();
        {
            let mut s = self.settings.borrow_mut();
            s.translate.model = model.clone();
            s.translate.target_lang = target_lang.clone();
        }
        self.persist();

        self.result_view.buffer().set_text("");
        self.set_busy(true);

        let endpoint = self.settings.borrow().translate.endpoint.clone();
        let rx = TranslationTask::new(TranslationRequest {
            text,
            target_lang,
            model,
        })
        .spawn(move |req| translator::translate(&endpoint, req));

        let win = self.clone();
        glib::timeout_add_local(Duration::from_millis(50), move || match rx.try_recv() {
            Ok(outcome) => {
                win.apply_outcome(outcome);
                ControlFlow::Break
            }
            Err(mpsc::TryRecvError::Empty) => ControlFlow::Continue,
            Err(mpsc::TryRecvError::Disconnected) => {
                // The worker died without reporting; surface it like any
                // other failure instead of leaving the UI stuck busy.
                win.apply_outcome(TaskOutcome::Failed("translation worker vanished".into()));
                ControlFlow::Break
            }
        });
    }

    fn apply_outcome(&self, outcome: TaskOutcome) {
        self.set_busy(false);
        self.gate.finish();
        match outcome {
            TaskOutcome::Finished(t) => {
                self.result_view.buffer().set_text(&t.text);
                self.show_status(&describe_timing(&t.timing));
            }
            TaskOutcome::Failed(e) => {
                log::warn!("translation failed: {e}");
                self.show_status(&format!("Translation failed: {e}"));
            }
        }
    }

    fn set_busy(&self, busy: bool) {
        self.translate_btn.set_sensitive(!busy);
        if busy {
            self.spinner.start();
            self.show_status("Translating…");
        } else {
            self.spinner.stop();
        }
    }

    /// Write window geometry and last choices back to disk.
    pub fn persist(&self) {
        {
            let mut s = self.settings.borrow_mut();
            let (w, h) = (self.window.width(), self.window.height());
            // Unrealized windows report 0x0; keep the stored size then.
            if w > 0 && h > 0 {
                s.window.width = w;
                s.window.height = h;
            }
        }
        if let Err(e) = self.settings.borrow().save(&self.settings_path) {
            log::warn!("failed to save settings: {e:#}");
        }
    }

    pub fn show_about(&self) {
        let dialog = gtk4::AboutDialog::builder()
            .transient_for(&self.window)
            .modal(true)
            .program_name("LinguaTray")
            .version(env!("CARGO_PKG_VERSION"))
            .comments("Clipboard translation with a local language model")
            .build();
        dialog.present();
    }
}

fn describe_timing(t: &Timing) -> String {
    match (t.total, t.eval_tokens) {
        (Some(total), Some(tokens)) => {
            format!("Done in {:.1}s ({tokens} tokens)", total.as_secs_f64())
        }
        (Some(total), None) => format!("Done in {:.1}s", total.as_secs_f64()),
        _ => "Done".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_summary_degrades_gracefully() {
        let full = Timing {
            total: Some(Duration::from_millis(2340)),
            eval: Some(Duration::from_secs(2)),
            eval_tokens: Some(84),
        };
        assert_eq!(describe_timing(&full), "Done in 2.3s (84 tokens)");

        let partial = Timing {
            total: Some(Duration::from_secs(1)),
            ..Timing::default()
        };
        assert_eq!(describe_timing(&partial), "Done in 1.0s");

        assert_eq!(describe_timing(&Timing::default()), "Done");
    }
}

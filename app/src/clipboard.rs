use gtk4::prelude::*;

/// Read the clipboard's text and hand it to `done` on the main loop.
/// `None` when the clipboard is empty or holds non-text content.
pub fn read_text<F: FnOnce(Option<String>) + 'static>(done: F) {
    let Some(display) = gtk4::gdk::Display::default() else {
        log::warn!("clipboard read: no display");
        done(None);
        return;
    };
    display
        .clipboard()
        .read_text_async(None::<&gtk4::gio::Cancellable>, move |res| match res {
            Ok(Some(text)) => done(Some(text.to_string())),
            Ok(None) => done(None),
            Err(e) => {
                log::debug!("clipboard read failed: {e}");
                done(None);
            }
        });
}

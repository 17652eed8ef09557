use crate::constants::{NOTICE_ID, STATUS_ID};
use crate::dom;
use synesthesia_core::SessionStatus;
use web_sys as web;

fn status_label(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Idle => "Load a track to begin.",
        SessionStatus::Processing => "Separating stems...",
        SessionStatus::ProcessingLink => "Downloading and separating stems...",
        SessionStatus::LoadingAudio => "Loading audio...",
        SessionStatus::Playing => "Playing",
    }
}

#[inline]
pub fn show_status(document: &web::Document, status: SessionStatus) {
    dom::set_text(document, STATUS_ID, status_label(status));
}

/// Show `text`, or hide the notice strip when there is nothing to say.
pub fn show_notice(document: &web::Document, text: Option<&str>) {
    if let Some(el) = document.get_element_by_id(NOTICE_ID) {
        el.set_text_content(text);
        dom::set_visible(&el, text.is_some());
    }
}

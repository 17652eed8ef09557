use crate::overlay;
use crate::render::Renderer;
use crate::App;
use instant::Instant;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use synesthesia_core::{RenderCommit, SessionStatus};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

// Longer gaps (tab in background) are treated as one slow frame.
const MAX_FRAME_DT: Duration = Duration::from_millis(250);

pub struct FrameContext {
    pub app: Rc<App>,
    pub renderer: Renderer,
    pub commits: Vec<RenderCommit>,
    pub last_instant: Instant,
    pub last_status: Option<SessionStatus>,
    pub last_notice: Option<String>,
}

impl FrameContext {
    pub fn frame(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_instant).min(MAX_FRAME_DT);
        self.last_instant = now;

        let (status, notice) = {
            let mut session = self.app.session.borrow_mut();
            session.tick(dt, &mut self.commits);
            (session.status(), session.notice().map(str::to_owned))
        };
        self.renderer.draw(&self.commits);

        if self.last_status != Some(status) {
            overlay::show_status(&self.app.document, status);
            for b in self.app.load_buttons.borrow().iter() {
                b.set_disabled(status.is_busy());
            }
            self.last_status = Some(status);
        }
        if self.last_notice != notice {
            overlay::show_notice(&self.app.document, notice.as_deref());
            self.last_notice = notice;
        }
    }
}

pub fn start_loop(frame_ctx: Rc<RefCell<FrameContext>>) {
    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let tick_clone = tick.clone();
    let frame_ctx_tick = frame_ctx.clone();
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        frame_ctx_tick.borrow_mut().frame();
        request_frame(&tick_clone);
    }) as Box<dyn FnMut()>));
    request_frame(&tick);
}

fn request_frame(tick: &Rc<RefCell<Option<Closure<dyn FnMut()>>>>) {
    if let (Some(w), Some(cb)) = (web::window(), tick.borrow().as_ref()) {
        let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}

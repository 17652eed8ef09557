#![cfg(target_arch = "wasm32")]
use crate::audio::WebAudioGraph;
use crate::constants::{CANVAS_ID, CONTROLS_ID, NOTICE_ID, STATUS_ID};
use instant::Instant;
use std::cell::RefCell;
use std::rc::Rc;
use synesthesia_core::{EngineConfig, Session};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

mod audio;
mod backend;
mod camera;
mod constants;
mod dom;
mod events;
mod frame;
mod overlay;
mod render;

pub type SharedSession = Rc<RefCell<Session<WebAudioGraph>>>;

/// Page-lifetime state shared by every event handler and the frame loop.
pub struct App {
    pub session: SharedSession,
    pub document: web::Document,
    pub audio_ctx: web::AudioContext,
    pub controls: web::Element,
    /// Buttons that start a load; disabled while one is in flight.
    pub load_buttons: RefCell<Vec<web::HtmlButtonElement>>,
    /// Listeners on the spawn dock and instance cards; replaced on every
    /// panel rebuild.
    pub panel_listeners: RefCell<Vec<Closure<dyn FnMut()>>>,
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("synesthesia-web starting");

    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("init error: {:?}", e);
        }
    });
    Ok(())
}

/// `?backend=` on the page url overrides the default service address.
fn config_from_location(window: &web::Window) -> EngineConfig {
    let config = EngineConfig::default();
    let search = window.location().search().unwrap_or_default();
    let backend = web::UrlSearchParams::new_with_str(&search)
        .ok()
        .and_then(|p| p.get("backend"))
        .filter(|s| !s.trim().is_empty());
    match backend {
        Some(url) => {
            log::info!("using backend {url}");
            config.with_backend_url(url)
        }
        None => config,
    }
}

async fn init() -> anyhow::Result<()> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| anyhow::anyhow!("no document"))?;

    let canvas: web::HtmlCanvasElement = document
        .get_element_by_id(CANVAS_ID)
        .ok_or_else(|| anyhow::anyhow!("missing #{CANVAS_ID}"))?
        .dyn_into::<web::HtmlCanvasElement>()
        .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;

    // Keep the backing store at CSS size * devicePixelRatio.
    dom::sync_canvas_backing_size(&canvas);
    {
        let canvas_resize = canvas.clone();
        dom::listen(&window, "resize", move || {
            dom::sync_canvas_backing_size(&canvas_resize);
        });
    }

    let body = document
        .body()
        .ok_or_else(|| anyhow::anyhow!("no body"))?;
    let controls = dom::ensure_div(&document, &body, CONTROLS_ID)?;
    dom::ensure_div(&document, &controls, STATUS_ID)?;
    let notice = dom::ensure_div(&document, &controls, NOTICE_ID)?;
    dom::set_visible(&notice, false);

    // The context stays suspended until the first load gesture resumes it.
    let graph = WebAudioGraph::new()?;
    let audio_ctx = graph.context();
    let session = Rc::new(RefCell::new(Session::new(graph, config_from_location(&window))));

    let app = Rc::new(App {
        session,
        document: document.clone(),
        audio_ctx,
        controls,
        load_buttons: RefCell::new(Vec::new()),
        panel_listeners: RefCell::new(Vec::new()),
    });
    events::wire_controls(&app)?;
    events::refresh_panels(&app);

    let frame_ctx = frame::FrameContext {
        app: app.clone(),
        renderer: render::Renderer::new(&canvas)?,
        commits: Vec::new(),
        last_instant: Instant::now(),
        last_status: None,
        last_notice: None,
    };
    frame::start_loop(Rc::new(RefCell::new(frame_ctx)));
    Ok(())
}

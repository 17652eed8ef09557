//! DOM controls and the handlers that drive the session.
//!
//! Handlers never hold a session borrow across an await: each step borrows,
//! acts, and releases before the next network or decode future runs.

use crate::audio;
use crate::backend::{self, LoadRequest};
use crate::dom;
use crate::App;
use anyhow::anyhow;
use glam::Vec3;
use std::rc::Rc;
use synesthesia_core::{
    Archetype, InstanceId, LoadSource, LoadToken, SeparationResponse, SessionError, StemKind,
    ALL_ARCHETYPES, ALL_STEMS,
};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

const SPAWN_DOCK_ID: &str = "spawn-dock";
const INSTANCE_PANEL_ID: &str = "instance-panel";
const TEMPO_VALUE_ID: &str = "tempo-value";

/// Build the static controls: loaders, tempo and per-stem mapping.
pub fn wire_controls(app: &Rc<App>) -> anyhow::Result<()> {
    wire_loaders(app)?;
    wire_tempo(app)?;
    wire_mapping(app)?;
    dom::ensure_div(&app.document, &app.controls, SPAWN_DOCK_ID)?;
    dom::ensure_div(&app.document, &app.controls, INSTANCE_PANEL_ID)?;
    Ok(())
}

fn wire_loaders(app: &Rc<App>) -> anyhow::Result<()> {
    let doc = &app.document;
    let row = dom::element(doc, "div", Some("loaders"), None)?;

    let file_input = dom::element(doc, "input", None, None)?
        .dyn_into::<web::HtmlInputElement>()
        .map_err(|_| anyhow!("not an input"))?;
    file_input.set_type("file");
    file_input.set_accept("audio/*");
    dom::set_visible(&file_input, false);
    let file_button = dom::button(doc, "Upload track")?;

    let link_input = dom::element(doc, "input", None, None)?
        .dyn_into::<web::HtmlInputElement>()
        .map_err(|_| anyhow!("not an input"))?;
    link_input.set_type("url");
    link_input.set_placeholder("Paste a video link");
    let link_button = dom::button(doc, "Separate link")?;

    {
        let app = app.clone();
        let file_input = file_input.clone();
        dom::add_click_listener(&file_button, move || {
            // Resume inside the gesture; the picker itself does not count.
            let ctx = app.audio_ctx.clone();
            spawn_local(async move {
                if let Err(e) = audio::resume(&ctx).await {
                    log::warn!("{e}");
                }
            });
            file_input.click();
        });
    }
    {
        let app = app.clone();
        let input = file_input.clone();
        dom::listen(&file_input, "change", move || {
            let file = input.files().and_then(|list| list.get(0));
            // Allow picking the same file again.
            input.set_value("");
            if let Some(file) = file {
                log::info!("uploading {}", file.name());
                spawn_local(run_load(app.clone(), LoadRequest::File(file)));
            }
        });
    }
    {
        let app = app.clone();
        let link_input = link_input.clone();
        dom::add_click_listener(&link_button, move || {
            let link = link_input.value().trim().to_string();
            if link.is_empty() {
                crate::overlay::show_notice(&app.document, Some("Paste a link first."));
                return;
            }
            spawn_local(run_load(app.clone(), LoadRequest::Link(link)));
        });
    }

    dom::append(&row, &file_input);
    dom::append(&row, &file_button);
    dom::append(&row, &link_input);
    dom::append(&row, &link_button);
    dom::append(&app.controls, &row);
    app.load_buttons
        .borrow_mut()
        .extend([file_button, link_button]);
    Ok(())
}

fn wire_tempo(app: &Rc<App>) -> anyhow::Result<()> {
    let doc = &app.document;
    let (range, bpm) = {
        let s = app.session.borrow();
        (s.config().tempo_range, s.mix().global_bpm())
    };
    let row = dom::element(doc, "div", Some("tempo"), None)?;
    let value = dom::element(doc, "span", None, Some(&format!("{bpm:.0} BPM")))?;
    value.set_id(TEMPO_VALUE_ID);
    let slider = dom::slider(doc, range.min, range.max, 1.0, bpm)?;
    {
        let app = app.clone();
        let slider_read = slider.clone();
        dom::listen(&slider, "input", move || {
            let Some(v) = dom::input_value_f32(&slider_read) else {
                return;
            };
            let bpm = app.session.borrow_mut().set_global_tempo(v);
            dom::set_text(&app.document, TEMPO_VALUE_ID, &format!("{bpm:.0} BPM"));
        });
    }
    dom::append(&row, &dom::element(doc, "label", None, Some("Tempo"))?);
    dom::append(&row, &slider);
    dom::append(&row, &value);
    dom::append(&app.controls, &row);
    Ok(())
}

fn wire_mapping(app: &Rc<App>) -> anyhow::Result<()> {
    let doc = &app.document;
    let row = dom::element(doc, "div", Some("mapping"), None)?;
    for stem in ALL_STEMS {
        let current = app.session.borrow().mapping().get(stem);
        let select = dom::element(doc, "select", None, None)?
            .dyn_into::<web::HtmlSelectElement>()
            .map_err(|_| anyhow!("not a select"))?;
        for archetype in ALL_ARCHETYPES {
            let option = dom::element(doc, "option", None, Some(archetype.name()))?;
            let _ = option.set_attribute("value", archetype.name());
            dom::append(&select, &option);
        }
        select.set_value(current.name());
        {
            let app = app.clone();
            let select_read = select.clone();
            dom::listen(&select, "change", move || {
                match select_read.value().parse::<Archetype>() {
                    Ok(archetype) => app.session.borrow_mut().set_mapping(stem, archetype),
                    Err(e) => log::warn!("{e}"),
                }
            });
        }
        dom::append(&row, &dom::element(doc, "label", None, Some(stem.display_name()))?);
        dom::append(&row, &select);
    }
    dom::append(&app.controls, &row);
    Ok(())
}

/// Rebuild the spawn dock and the per-instance controls from the session.
pub fn refresh_panels(app: &Rc<App>) {
    let mut listeners = Vec::new();
    if let Err(e) = rebuild_panels(app, &mut listeners) {
        log::error!("panel rebuild failed: {e:?}");
    }
    let old = app.panel_listeners.replace(listeners);
    // The rebuild may have been triggered from one of the old listeners, which
    // is still on the stack; release them once it has returned.
    spawn_local(async move { drop(old) });
}

fn rebuild_panels(app: &Rc<App>, listeners: &mut Vec<Closure<dyn FnMut()>>) -> anyhow::Result<()> {
    let doc = &app.document;
    let dock = dom::ensure_div(doc, &app.controls, SPAWN_DOCK_ID)?;
    let panel = dom::ensure_div(doc, &app.controls, INSTANCE_PANEL_ID)?;
    dom::clear_children(&dock);
    dom::clear_children(&panel);

    let (stems, instances, config) = {
        let s = app.session.borrow();
        let stems: Vec<StemKind> = s.available_stems().kinds().collect();
        let instances: Vec<(InstanceId, StemKind, f32, Vec3)> = s
            .instances()
            .iter()
            .map(|i| (i.id.clone(), i.stem, i.base_scale, i.position))
            .collect();
        (stems, instances, s.config().clone())
    };

    for stem in stems {
        let b = dom::button(doc, &format!("+ {}", stem.short_label()))?;
        b.set_title(&format!("Add another {}", stem.display_name()));
        let app_spawn = app.clone();
        listeners.push(dom::attach(&b, "click", move || spawn(&app_spawn, stem)));
        dom::append(&dock, &b);
    }

    for (id, stem, scale, position) in instances {
        let card = dom::element(doc, "div", Some("instance"), None)?;
        dom::append(&card, &dom::element(doc, "strong", None, Some(&id.to_string()))?);
        let _ = card.set_attribute("data-stem", stem.key());

        let scale_slider = dom::slider(
            doc,
            config.scale_range.min,
            config.scale_range.max,
            0.05,
            scale,
        )?;
        {
            let app = app.clone();
            let id = id.clone();
            let read = scale_slider.clone();
            listeners.push(dom::attach(&scale_slider, "input", move || {
                if let Some(v) = dom::input_value_f32(&read) {
                    if let Err(e) = app.session.borrow_mut().set_instance_scale(&id, v) {
                        log::warn!("{e}");
                    }
                }
            }));
        }

        let x_slider = dom::slider(doc, config.x_range.min, config.x_range.max, 0.1, position.x)?;
        let depth_slider = dom::slider(
            doc,
            config.depth_range.min,
            config.depth_range.max,
            0.1,
            position.z,
        )?;
        for slider in [&x_slider, &depth_slider] {
            let app = app.clone();
            let id = id.clone();
            let x_read = x_slider.clone();
            let depth_read = depth_slider.clone();
            listeners.push(dom::attach(slider, "input", move || {
                move_instance(&app, &id, &x_read, &depth_read);
            }));
        }

        let remove = dom::button(doc, "Remove")?;
        {
            let app = app.clone();
            let id = id.clone();
            listeners.push(dom::attach(&remove, "click", move || {
                let removed = app.session.borrow_mut().remove_instance(&id);
                match removed {
                    Ok(()) => refresh_panels(&app),
                    Err(e) => log::warn!("{e}"),
                }
            }));
        }

        for (label, input) in [("Scale", &scale_slider), ("X", &x_slider), ("Depth", &depth_slider)] {
            dom::append(&card, &dom::element(doc, "label", None, Some(label))?);
            dom::append(&card, input);
        }
        dom::append(&card, &remove);
        dom::append(&panel, &card);
    }
    Ok(())
}

fn move_instance(
    app: &Rc<App>,
    id: &InstanceId,
    x: &web::HtmlInputElement,
    depth: &web::HtmlInputElement,
) {
    let mut s = app.session.borrow_mut();
    let Some(current) = s.instance(id).map(|i| i.position) else {
        return;
    };
    let target = Vec3::new(
        dom::input_value_f32(x).unwrap_or(current.x),
        current.y,
        dom::input_value_f32(depth).unwrap_or(current.z),
    );
    if let Err(e) = s.set_instance_position(id, target) {
        log::warn!("{e}");
    }
}

fn spawn(app: &Rc<App>, stem: StemKind) {
    let spawned = {
        let mut s = app.session.borrow_mut();
        s.spawn_instance(stem, js_sys::Date::now() as u64).map(|id| {
            let base = s.config().backend_url.clone();
            let pending = s.registry_mut().graph_mut().take_pending();
            let cache = s.registry().graph().cache();
            (id, base, pending, cache)
        })
    };
    match spawned {
        Ok((id, base, pending, cache)) => {
            let task_app = app.clone();
            spawn_local(async move {
                let ctx = task_app.audio_ctx.clone();
                if let Err(e) = audio::decode_all(ctx, cache, base, pending).await {
                    let abandoned = task_app
                        .session
                        .borrow_mut()
                        .abandon_instance(&id, &format!("{e:#}"));
                    match abandoned {
                        Ok(()) => refresh_panels(&task_app),
                        Err(gone) => log::debug!("{gone}"),
                    }
                }
            });
            refresh_panels(app);
        }
        Err(e) => log::warn!("{e}"),
    }
}

/// Full load: request → accept → decode → start. Every step re-checks the
/// token so a superseded load drops out quietly.
async fn run_load(app: Rc<App>, request: LoadRequest) {
    if let Err(e) = audio::resume(&app.audio_ctx).await {
        log::warn!("{e}");
    }
    let (token, endpoint) = {
        let mut s = app.session.borrow_mut();
        let (source, endpoint) = match &request {
            LoadRequest::File(_) => (LoadSource::File, s.config().separate_endpoint()),
            LoadRequest::Link(_) => (LoadSource::Link, s.config().link_endpoint()),
        };
        (s.begin_load(source), endpoint)
    };

    let reply = backend::send(&endpoint, request).await;
    let accepted = {
        let mut s = app.session.borrow_mut();
        let accepted = match reply {
            _ if !s.is_current(token) => Err(SessionError::StaleLoad(token.generation())),
            Err(e) => Err(s.fail(SessionError::Backend(format!("{e:#}")))),
            Ok(r) if !r.ok() && SeparationResponse::from_json(&r.body).is_err() => {
                Err(s.fail(SessionError::Backend(format!("HTTP {}", r.status))))
            }
            Ok(r) => s.accept_response_json(token, &r.body),
        };
        // Buffers from the previous track (or all of them, after a failure).
        if s.is_current(token) {
            s.registry().graph().retain_urls(s.available_stems());
        }
        accepted
    };
    refresh_panels(&app);
    if let Err(e) = accepted {
        report(&e);
        return;
    }

    let decoded = decode_track(&app, token).await;
    let finished = {
        let mut s = app.session.borrow_mut();
        let finished = s.finish_loading(token, decoded);
        if finished.is_err() && s.is_current(token) {
            s.registry().graph().retain_urls(s.available_stems());
        }
        finished
    };
    if let Err(e) = finished {
        report(&e);
        refresh_panels(&app);
    }
}

async fn decode_track(app: &Rc<App>, token: LoadToken) -> Result<(), String> {
    let (base, pending, cache) = {
        let mut s = app.session.borrow_mut();
        if !s.is_current(token) {
            return Ok(());
        }
        let base = s.config().backend_url.clone();
        let pending = s.registry_mut().graph_mut().take_pending();
        (base, pending, s.registry().graph().cache())
    };
    audio::decode_all(app.audio_ctx.clone(), cache, base, pending)
        .await
        .map_err(|e| format!("{e:#}"))
}

fn report(err: &SessionError) {
    if err.is_stale() {
        log::debug!("{err}");
    } else {
        log::warn!("load failed: {err}");
    }
}

use anyhow::anyhow;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Attach `handler` to `event` on `el`. The listener lives as long as the
/// returned closure; dropping it while the element is still live leaves a
/// dead callback behind.
pub fn attach(
    el: &web::EventTarget,
    event: &str,
    mut handler: impl FnMut() + 'static,
) -> Closure<dyn FnMut()> {
    let closure = Closure::wrap(Box::new(move || handler()) as Box<dyn FnMut()>);
    let _ = el.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
    closure
}

/// Attach `handler` to `event` on `el` for the page's lifetime.
pub fn listen(el: &web::EventTarget, event: &str, handler: impl FnMut() + 'static) {
    attach(el, event, handler).forget();
}

#[inline]
pub fn add_click_listener(el: &web::Element, handler: impl FnMut() + 'static) {
    listen(el, "click", handler);
}

pub fn sync_canvas_backing_size(canvas: &web::HtmlCanvasElement) {
    if let Some(w) = web::window() {
        let dpr = w.device_pixel_ratio();
        let rect = canvas.get_bounding_client_rect();
        let w_px = (rect.width() * dpr) as u32;
        let h_px = (rect.height() * dpr) as u32;
        canvas.set_width(w_px.max(1));
        canvas.set_height(h_px.max(1));
    }
}

/// Create `<tag>` with an optional class and text.
pub fn element(
    document: &web::Document,
    tag: &str,
    class: Option<&str>,
    text: Option<&str>,
) -> anyhow::Result<web::Element> {
    let el = document
        .create_element(tag)
        .map_err(|e| anyhow!("create <{tag}>: {:?}", e))?;
    if let Some(class) = class {
        el.set_class_name(class);
    }
    if let Some(text) = text {
        el.set_text_content(Some(text));
    }
    Ok(el)
}

pub fn button(document: &web::Document, label: &str) -> anyhow::Result<web::HtmlButtonElement> {
    element(document, "button", None, Some(label))?
        .dyn_into::<web::HtmlButtonElement>()
        .map_err(|_| anyhow!("not a button"))
}

/// `<input type=range>` with the given bounds and starting value.
pub fn slider(
    document: &web::Document,
    min: f32,
    max: f32,
    step: f32,
    value: f32,
) -> anyhow::Result<web::HtmlInputElement> {
    let input = element(document, "input", None, None)?
        .dyn_into::<web::HtmlInputElement>()
        .map_err(|_| anyhow!("not an input"))?;
    input.set_type("range");
    input.set_min(&min.to_string());
    input.set_max(&max.to_string());
    input.set_step(&step.to_string());
    input.set_value(&value.to_string());
    Ok(input)
}

#[inline]
pub fn input_value_f32(input: &web::HtmlInputElement) -> Option<f32> {
    input.value().parse::<f32>().ok()
}

pub fn append(parent: &web::Element, child: &web::Element) {
    let _ = parent.append_child(child);
}

pub fn clear_children(el: &web::Element) {
    el.set_inner_html("");
}

pub fn set_text(document: &web::Document, id: &str, text: &str) {
    if let Some(el) = document.get_element_by_id(id) {
        el.set_text_content(Some(text));
    }
}

/// Find `#id`, or create it as a `<div>` under `parent`.
pub fn ensure_div(
    document: &web::Document,
    parent: &web::Element,
    id: &str,
) -> anyhow::Result<web::Element> {
    if let Some(el) = document.get_element_by_id(id) {
        return Ok(el);
    }
    let el = element(document, "div", None, None)?;
    el.set_id(id);
    append(parent, &el);
    Ok(el)
}

pub fn set_visible(el: &web::Element, visible: bool) {
    let _ = el.set_attribute("style", if visible { "" } else { "display:none" });
}

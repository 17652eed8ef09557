//! Canvas2D drawing of render commits.
//!
//! Each archetype is drawn from its committed values only; nothing here reads
//! audio or session state.

use crate::camera::{Camera, Projected};
use crate::constants::*;
use anyhow::anyhow;
use glam::{EulerRot, Quat, Vec2, Vec3};
use std::f32::consts::TAU;
use synesthesia_core::{Archetype, RenderCommit};
use wasm_bindgen::JsCast;
use web_sys as web;

pub struct Renderer {
    canvas: web::HtmlCanvasElement,
    ctx: web::CanvasRenderingContext2d,
    scratch: Vec<Vec2>,
    order: Vec<usize>,
}

impl Renderer {
    pub fn new(canvas: &web::HtmlCanvasElement) -> anyhow::Result<Self> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| anyhow!("get_context: {:?}", e))?
            .ok_or_else(|| anyhow!("2d context unavailable"))?
            .dyn_into::<web::CanvasRenderingContext2d>()
            .map_err(|_| anyhow!("not a 2d context"))?;
        Ok(Self {
            canvas: canvas.clone(),
            ctx,
            scratch: Vec::with_capacity(KNOT_SAMPLES + 1),
            order: Vec::new(),
        })
    }

    pub fn draw(&mut self, commits: &[RenderCommit]) {
        let w = self.canvas.width() as f32;
        let h = self.canvas.height() as f32;
        let camera = Camera::new(w, h);

        self.ctx.set_shadow_blur(0.0);
        self.ctx.set_global_alpha(1.0);
        self.ctx.set_fill_style_str(BACKGROUND);
        self.ctx.fill_rect(0.0, 0.0, w as f64, h as f64);

        // Far to near.
        self.order.clear();
        self.order.extend(0..commits.len());
        self.order.sort_by(|&a, &b| {
            commits[a]
                .position
                .z
                .total_cmp(&commits[b].position.z)
        });

        let order = std::mem::take(&mut self.order);
        for &i in &order {
            let c = &commits[i];
            let Some(center) = camera.project(c.position) else {
                continue;
            };
            let color = css_rgb(blend(c.stem.color_rgb(), HOT_RGB, c.color_blend));
            self.ctx.save();
            self.ctx.set_shadow_color(&color);
            self.ctx
                .set_shadow_blur((c.emissive as f64 * GLOW_PER_EMISSIVE).min(GLOW_MAX));
            self.ctx.set_fill_style_str(&color);
            self.ctx.set_stroke_style_str(&color);
            match c.archetype {
                Archetype::Orb => self.orb(c, center),
                Archetype::Ring => self.ring(c, &camera, center),
                Archetype::Knot => self.knot(c, &camera, center),
                Archetype::ShardCluster => self.shards(c, &camera),
                Archetype::StackedBar => self.bars(c, &camera),
            }
            self.ctx.restore();
        }
        self.order = order;
    }

    fn orb(&mut self, c: &RenderCommit, center: Projected) {
        let r = ORB_RADIUS * c.scale * center.px_per_unit;
        let wobble = 0.06 * c.distortion;
        self.scratch.clear();
        for k in 0..RING_SEGMENTS {
            let a = k as f32 / RING_SEGMENTS as f32 * TAU;
            let rr = r * (1.0 + wobble * (5.0 * a + c.rotation.y * 3.0).sin());
            self.scratch
                .push(center.screen + Vec2::new(a.cos(), a.sin()) * rr);
        }
        self.path(true);
        self.ctx.fill();
    }

    fn ring(&mut self, c: &RenderCommit, camera: &Camera, center: Projected) {
        let rot = euler(c.rotation);
        let amp = 0.08 * c.displacement;
        self.scratch.clear();
        for k in 0..RING_SEGMENTS {
            let a = k as f32 / RING_SEGMENTS as f32 * TAU;
            let r = RING_RADIUS + amp * (RING_WAVES * a + c.wave_phase).sin();
            let local = Vec3::new(a.cos() * r, a.sin() * r, 0.0) * c.scale;
            if let Some(p) = camera.project(c.position + rot * local) {
                self.scratch.push(p.screen);
            }
        }
        self.ctx
            .set_line_width((0.18 * c.scale * center.px_per_unit).max(1.0) as f64);
        self.path(true);
        self.ctx.stroke();
    }

    fn knot(&mut self, c: &RenderCommit, camera: &Camera, center: Projected) {
        let rot = euler(c.rotation);
        let s = KNOT_RADIUS * c.scale / 3.0;
        self.scratch.clear();
        for k in 0..=KNOT_SAMPLES {
            let u = k as f32 / KNOT_SAMPLES as f32 * TAU;
            let r = (3.0 * u).cos() + 2.0;
            let local = Vec3::new(r * (2.0 * u).cos(), r * (2.0 * u).sin(), -(3.0 * u).sin()) * s;
            if let Some(p) = camera.project(c.position + rot * local) {
                self.scratch.push(p.screen);
            }
        }
        self.ctx
            .set_line_width((0.22 * c.scale * center.px_per_unit).max(1.0) as f64);
        self.ctx.set_line_join("round");
        self.path(false);
        self.ctx.stroke();
    }

    fn shards(&mut self, c: &RenderCommit, camera: &Camera) {
        let spin = Quat::from_rotation_y(c.rotation.y);
        for (i, &offset) in c.children.iter().enumerate() {
            let world = c.position + spin * Vec3::new(offset * c.scale, 0.0, 0.0);
            let Some(p) = camera.project(world) else {
                continue;
            };
            let size = SHARD_SIZE * c.scale * p.px_per_unit;
            let tilt = c.rotation.x + i as f32 * TAU / 3.0;
            self.scratch.clear();
            for k in 0..3 {
                let a = tilt + k as f32 * TAU / 3.0;
                self.scratch
                    .push(p.screen + Vec2::new(a.cos(), a.sin()) * size);
            }
            self.path(true);
            self.ctx.fill();
        }
    }

    fn bars(&mut self, c: &RenderCommit, camera: &Camera) {
        let facing = c.rotation.y.cos().abs().max(0.15);
        let mid = c.children.iter().copied().sum::<f32>() / c.children.len().max(1) as f32;
        for &lift in &c.children {
            let world = c.position + Vec3::new(0.0, (lift - mid) * c.scale, 0.0);
            let Some(p) = camera.project(world) else {
                continue;
            };
            let bw = BAR_WIDTH * c.scale * facing * p.px_per_unit;
            let bh = BAR_HEIGHT * c.scale * p.px_per_unit;
            self.ctx.fill_rect(
                (p.screen.x - bw * 0.5) as f64,
                (p.screen.y - bh * 0.5) as f64,
                bw as f64,
                bh as f64,
            );
        }
    }

    fn path(&self, closed: bool) {
        let Some(first) = self.scratch.first() else {
            return;
        };
        self.ctx.begin_path();
        self.ctx.move_to(first.x as f64, first.y as f64);
        for p in &self.scratch[1..] {
            self.ctx.line_to(p.x as f64, p.y as f64);
        }
        if closed {
            self.ctx.close_path();
        }
    }
}

#[inline]
fn euler(r: Vec3) -> Quat {
    Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z)
}

#[inline]
fn blend(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    let t = t.clamp(0.0, 1.0);
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

fn css_rgb(c: [f32; 3]) -> String {
    let to8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("rgb({},{},{})", to8(c[0]), to8(c[1]), to8(c[2]))
}

use anyhow::anyhow;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use synesthesia_core::{
    db_to_gain, AudioError, AudioGraph, ChannelId, MeterHandle, PlaybackHandle, StemSet,
    METER_SMOOTHING,
};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

const ANALYSER_FFT_SIZE: u32 = 1024;

type BufferCache = Rc<RefCell<HashMap<String, web::AudioBuffer>>>;

/// Player state shared with the decoder so a late buffer can start a
/// channel that was asked to play before its asset arrived.
struct PlayerInner {
    ctx: web::AudioContext,
    buffer: Option<web::AudioBuffer>,
    source: Option<web::AudioBufferSourceNode>,
    /// Start time requested before the buffer was ready.
    pending_start: Option<f64>,
    rate: f32,
    disposed: bool,
}

impl PlayerInner {
    fn launch(&mut self, when: f64, fader: &web::GainNode) {
        let Some(buffer) = self.buffer.clone() else {
            self.pending_start = Some(when);
            return;
        };
        self.halt();
        let src = match web::AudioBufferSourceNode::new(&self.ctx) {
            Ok(s) => s,
            Err(e) => {
                log::error!("AudioBufferSourceNode error: {:?}", e);
                return;
            }
        };
        src.set_buffer(Some(&buffer));
        src.set_loop(true);
        src.playback_rate().set_value(self.rate);
        let _ = src.connect_with_audio_node(fader);
        // Never schedule in the past; a late start just begins now.
        let when = when.max(self.ctx.current_time());
        if let Err(e) = src.start_with_when(when) {
            log::error!("start error: {:?}", e);
        }
        self.source = Some(src);
        self.pending_start = None;
    }

    fn halt(&mut self) {
        if let Some(src) = self.source.take() {
            let _ = src.stop();
            let _ = src.disconnect();
        }
    }
}

/// One stem: buffer source → fader → panner → destination.
pub struct StemPlayer {
    inner: Rc<RefCell<PlayerInner>>,
    fader: web::GainNode,
    panner: web::StereoPannerNode,
}

impl PlaybackHandle for StemPlayer {
    fn start_at(&mut self, when: f64) {
        self.inner.borrow_mut().launch(when, &self.fader);
    }

    fn stop(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.pending_start = None;
        inner.halt();
    }

    fn set_pan(&mut self, pan: f32) {
        self.panner.pan().set_value(pan);
    }

    fn set_gain_db(&mut self, gain_db: f32) {
        self.fader.gain().set_value(db_to_gain(gain_db as f64) as f32);
    }

    fn set_playback_rate(&mut self, rate: f32) {
        let mut inner = self.inner.borrow_mut();
        inner.rate = rate;
        if let Some(src) = &inner.source {
            src.playback_rate().set_value(rate);
        }
    }

    fn dispose(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.halt();
        inner.disposed = true;
        inner.buffer = None;
        let _ = self.fader.disconnect();
        let _ = self.panner.disconnect();
    }
}

/// RMS meter over the analyser's time-domain window, tapped post-fader and
/// pre-pan so remixing never moves it.
pub struct AnalyserMeter {
    analyser: web::AnalyserNode,
    buf: RefCell<Vec<f32>>,
    smoothed: Cell<f32>,
}

impl MeterHandle for AnalyserMeter {
    fn read_db(&self) -> Option<f64> {
        let mut buf = self.buf.borrow_mut();
        let len = self.analyser.fft_size() as usize;
        if len == 0 {
            return None;
        }
        if buf.len() != len {
            buf.resize(len, 0.0);
        }
        self.analyser.get_float_time_domain_data(&mut buf);
        let sum_sq: f32 = buf.iter().map(|s| s * s).sum();
        let rms = (sum_sq / len as f32).sqrt();
        let prev = self.smoothed.get();
        let level = prev * METER_SMOOTHING + rms * (1.0 - METER_SMOOTHING);
        self.smoothed.set(if level.is_finite() { level } else { 0.0 });
        Some(20.0 * (self.smoothed.get() as f64).log10())
    }

    fn dispose(&mut self) {
        let _ = self.analyser.disconnect();
    }
}

/// Asset that still has to be fetched and decoded for a player.
pub struct PendingDecode {
    url: String,
    inner: Rc<RefCell<PlayerInner>>,
    fader: web::GainNode,
}

pub struct WebAudioGraph {
    ctx: web::AudioContext,
    cache: BufferCache,
    pending: Vec<PendingDecode>,
}

impl WebAudioGraph {
    pub fn new() -> anyhow::Result<Self> {
        let ctx = web::AudioContext::new().map_err(|e| anyhow!("AudioContext error: {:?}", e))?;
        Ok(Self {
            ctx,
            cache: Rc::new(RefCell::new(HashMap::new())),
            pending: Vec::new(),
        })
    }

    pub fn context(&self) -> web::AudioContext {
        self.ctx.clone()
    }

    /// Assets queued by `create_pair` since the last call.
    pub fn take_pending(&mut self) -> Vec<PendingDecode> {
        std::mem::take(&mut self.pending)
    }

    pub fn cache(&self) -> BufferCache {
        self.cache.clone()
    }

    /// Evict decoded buffers the current track no longer references.
    pub fn retain_urls(&self, stems: &StemSet) {
        let evicted = stems.prune_cache(&mut self.cache.borrow_mut());
        if evicted > 0 {
            log::info!("evicted {evicted} cached buffers");
        }
    }
}

fn create_gain(ctx: &web::AudioContext, value: f32, label: &str) -> Result<web::GainNode, AudioError> {
    let g = web::GainNode::new(ctx).map_err(|e| AudioError::PlayerCreation {
        channel: label.to_string(),
        reason: format!("GainNode: {:?}", e),
    })?;
    g.gain().set_value(value);
    Ok(g)
}

impl AudioGraph for WebAudioGraph {
    type Player = StemPlayer;
    type Meter = AnalyserMeter;

    fn create_pair(
        &mut self,
        id: &ChannelId,
        source_url: &str,
    ) -> Result<(StemPlayer, AnalyserMeter), AudioError> {
        let fader = create_gain(&self.ctx, 1.0, id.as_str())?;
        let panner = web::StereoPannerNode::new(&self.ctx).map_err(|e| AudioError::PlayerCreation {
            channel: id.to_string(),
            reason: format!("StereoPannerNode: {:?}", e),
        })?;
        let analyser = web::AnalyserNode::new(&self.ctx).map_err(|e| AudioError::MeterCreation {
            channel: id.to_string(),
            reason: format!("{:?}", e),
        })?;
        analyser.set_fft_size(ANALYSER_FFT_SIZE);

        let _ = fader.connect_with_audio_node(&panner);
        let _ = panner.connect_with_audio_node(&self.ctx.destination());
        let _ = fader.connect_with_audio_node(&analyser);

        let inner = Rc::new(RefCell::new(PlayerInner {
            ctx: self.ctx.clone(),
            buffer: self.cache.borrow().get(source_url).cloned(),
            source: None,
            pending_start: None,
            rate: 1.0,
            disposed: false,
        }));
        if inner.borrow().buffer.is_none() {
            self.pending.push(PendingDecode {
                url: source_url.to_string(),
                inner: inner.clone(),
                fader: fader.clone(),
            });
        }

        Ok((
            StemPlayer {
                inner,
                fader,
                panner,
            },
            AnalyserMeter {
                analyser,
                buf: RefCell::new(vec![0.0; ANALYSER_FFT_SIZE as usize]),
                smoothed: Cell::new(0.0),
            },
        ))
    }

    fn current_time(&self) -> f64 {
        self.ctx.current_time()
    }
}

/// Resume the context; browsers keep it suspended until a user gesture.
pub async fn resume(ctx: &web::AudioContext) -> anyhow::Result<()> {
    if ctx.state() == web::AudioContextState::Running {
        return Ok(());
    }
    let promise = ctx.resume().map_err(|e| anyhow!("resume error: {:?}", e))?;
    JsFuture::from(promise)
        .await
        .map_err(|e| anyhow!("resume rejected: {:?}", e))?;
    Ok(())
}

async fn fetch_and_decode(ctx: &web::AudioContext, url: &str) -> anyhow::Result<web::AudioBuffer> {
    let window = web::window().ok_or_else(|| anyhow!("no window"))?;
    let resp: web::Response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| anyhow!("fetch {url}: {:?}", e))?
        .dyn_into()
        .map_err(|_| anyhow!("fetch {url}: not a Response"))?;
    if !resp.ok() {
        return Err(anyhow!("fetch {url}: HTTP {}", resp.status()));
    }
    let bytes = JsFuture::from(resp.array_buffer().map_err(|e| anyhow!("{:?}", e))?)
        .await
        .map_err(|e| anyhow!("read {url}: {:?}", e))?;
    let bytes: js_sys::ArrayBuffer = bytes
        .dyn_into()
        .map_err(|_| anyhow!("read {url}: not an ArrayBuffer"))?;
    let decoded = JsFuture::from(
        ctx.decode_audio_data(&bytes)
            .map_err(|e| anyhow!("decode {url}: {:?}", e))?,
    )
    .await
    .map_err(|e| anyhow!("decode {url}: {:?}", e))?;
    decoded
        .dyn_into::<web::AudioBuffer>()
        .map_err(|_| anyhow!("decode {url}: not an AudioBuffer"))
}

/// Fetch and decode every pending asset, attaching buffers to their players.
/// Each url is decoded once. Must be called without holding any session borrow.
pub async fn decode_all(
    ctx: web::AudioContext,
    cache: BufferCache,
    asset_base: String,
    pending: Vec<PendingDecode>,
) -> anyhow::Result<()> {
    for job in pending {
        let cached = cache.borrow().get(&job.url).cloned();
        let buffer = match cached {
            Some(b) => b,
            None => {
                let url = crate::backend::resolve_asset_url(&asset_base, &job.url);
                let b = fetch_and_decode(&ctx, &url).await?;
                cache.borrow_mut().insert(job.url.clone(), b.clone());
                b
            }
        };
        let mut inner = job.inner.borrow_mut();
        if inner.disposed {
            continue;
        }
        inner.buffer = Some(buffer);
        if let Some(when) = inner.pending_start {
            inner.launch(when, &job.fader);
        }
    }
    Ok(())
}

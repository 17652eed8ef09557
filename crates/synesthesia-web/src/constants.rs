// Page layout and drawing constants for the web front-end

// Camera
pub const CAMERA_Z: f32 = 14.0; // eye distance along +Z, looking at the origin
pub const CAMERA_FOV_Y: f32 = std::f32::consts::FRAC_PI_4;

// Element ids the page is expected to provide or that we create
pub const CANVAS_ID: &str = "app-canvas";
pub const CONTROLS_ID: &str = "controls";
pub const STATUS_ID: &str = "status-line";
pub const NOTICE_ID: &str = "notice";

// Colour the orb blends toward once it runs hot
pub const HOT_RGB: [f32; 3] = [1.0, 0.1, 0.1];
pub const BACKGROUND: &str = "#05060a";

// Shape proportions in world units before instance scale
pub const ORB_RADIUS: f32 = 0.5;
pub const RING_RADIUS: f32 = 1.6;
pub const RING_SEGMENTS: usize = 96;
pub const RING_WAVES: f32 = 6.0; // ripples around the circumference
pub const KNOT_RADIUS: f32 = 0.9;
pub const KNOT_SAMPLES: usize = 160;
pub const SHARD_SIZE: f32 = 0.45;
pub const BAR_WIDTH: f32 = 1.4;
pub const BAR_HEIGHT: f32 = 0.25;

// Glow
pub const GLOW_PER_EMISSIVE: f64 = 6.0; // shadow blur px per unit emissive
pub const GLOW_MAX: f64 = 40.0;

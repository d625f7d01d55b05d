// panorama.rs — 视角状态：经纬度、视场角与拖拽手势

/// Latitude is kept away from the poles so the look-at basis never flips.
pub const MAX_LATITUDE: f32 = 85.0;
pub const MIN_FOV: f32 = 10.0;
pub const MAX_FOV: f32 = 75.0;
pub const INITIAL_FOV: f32 = 75.0;

/// Degrees of rotation per pixel of drag.
pub const DRAG_SENSITIVITY: f32 = 0.1;
/// Degrees of field-of-view per pixel of wheel delta.
pub const ZOOM_SENSITIVITY: f32 = 0.05;

/// Radius of the sphere the camera travels on. Only the direction matters.
pub const CAMERA_ORBIT_RADIUS: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    /// Yaw in degrees, unbounded.
    pub longitude: f32,
    /// Pitch in degrees, within ±MAX_LATITUDE.
    pub latitude: f32,
}

impl Orientation {
    /// Starting direction for a panorama. Latitude is clamped like any
    /// other; a non-finite longitude falls back to 0.
    pub fn facing(longitude: f32, latitude: f32) -> Self {
        Self {
            longitude: if longitude.is_finite() { longitude } else { 0.0 },
            latitude: clamp_latitude(latitude),
        }
    }

    /// Polar angle measured from +Y, radians.
    pub fn phi(&self) -> f32 {
        (90.0 - self.latitude).to_radians()
    }

    /// Azimuth, radians.
    pub fn theta(&self) -> f32 {
        self.longitude.to_radians()
    }

    /// Point on the orbit sphere for the current angles.
    pub fn camera_position(&self, radius: f32) -> glam::Vec3 {
        let (phi, theta) = (self.phi(), self.theta());
        glam::Vec3::new(
            radius * phi.sin() * theta.cos(),
            radius * phi.cos(),
            radius * phi.sin() * theta.sin(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    pub is_dragging: bool,
    pub last_x: f32,
    pub last_y: f32,
}

/// Mutable state of one viewer, touched by input handlers and read once per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerState {
    pub orientation: Orientation,
    pub fov: f32,
    pub pointer: PointerState,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewerState {
    pub fn new() -> Self {
        Self {
            orientation: Orientation::default(),
            fov: INITIAL_FOV,
            pointer: PointerState::default(),
        }
    }

    pub fn facing(orientation: Orientation) -> Self {
        Self {
            orientation: Orientation::facing(orientation.longitude, orientation.latitude),
            ..Self::new()
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.pointer.is_dragging
    }

    pub fn press(&mut self, x: f32, y: f32) {
        self.pointer = PointerState {
            is_dragging: true,
            last_x: x,
            last_y: y,
        };
    }

    /// Applies the drag delta since the last recorded position.
    /// Returns false when no gesture is active.
    pub fn drag_to(&mut self, x: f32, y: f32) -> bool {
        if !self.pointer.is_dragging {
            return false;
        }

        let dx = x - self.pointer.last_x;
        let dy = y - self.pointer.last_y;

        self.orientation.longitude += dx * DRAG_SENSITIVITY;
        // 每次修改都立即夹取，结果与帧的时机无关
        self.orientation.latitude =
            clamp_latitude(self.orientation.latitude - dy * DRAG_SENSITIVITY);

        self.pointer.last_x = x;
        self.pointer.last_y = y;
        true
    }

    pub fn release(&mut self) {
        self.pointer = PointerState::default();
    }

    /// `delta_y` follows DOM wheel conventions: positive scrolls down and widens the view.
    pub fn zoom(&mut self, delta_y: f32) {
        self.fov = clamp_fov(self.fov + delta_y * ZOOM_SENSITIVITY);
    }

    /// Per-frame step: clamp, then place the camera on its orbit.
    pub fn frame_camera_position(&mut self) -> glam::Vec3 {
        self.orientation.latitude = clamp_latitude(self.orientation.latitude);
        self.orientation.camera_position(CAMERA_ORBIT_RADIUS)
    }
}

pub fn clamp_latitude(latitude: f32) -> f32 {
    if latitude.is_nan() {
        return 0.0;
    }
    latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE)
}

pub fn clamp_fov(fov: f32) -> f32 {
    if fov.is_nan() {
        return MAX_FOV;
    }
    fov.clamp(MIN_FOV, MAX_FOV)
}

// viewer.rs — 查看器组件：挂载、输入分发、每帧更新、纹理加载完成、卸载
//
// 不持有任何 GPU 资源；宿主（app.rs）负责渲染器的创建与释放。

use crate::camera::PerspectiveCamera;
use crate::error::ViewerError;
use crate::input::ViewerInput;
use crate::loader::{self, LoadCompleter, PanoramaSource, PendingLoad};
use crate::mesh::SphereMesh;
use crate::panorama::{Orientation, ViewerState};
use glam::{Mat4, Vec3};
use image::RgbaImage;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for SurfaceSize {
    fn from(s: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(s.width, s.height)
    }
}

/// What gets drawn. Empty until the panorama arrives.
#[derive(Debug, Default)]
pub struct Scene {
    sphere: Option<(SphereMesh, Arc<RgbaImage>)>,
    revision: u64,
}

impl Scene {
    pub fn has_mesh(&self) -> bool {
        self.sphere.is_some()
    }

    pub fn mesh(&self) -> Option<&SphereMesh> {
        self.sphere.as_ref().map(|(m, _)| m)
    }

    pub fn texture(&self) -> Option<&Arc<RgbaImage>> {
        self.sphere.as_ref().map(|(_, t)| t)
    }

    /// Bumped whenever the contents change, so a renderer knows to re-upload.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn attach(&mut self, mesh: SphereMesh, texture: Arc<RgbaImage>) {
        self.sphere = Some((mesh, texture));
        self.revision += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadStatus {
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Mounted on a zero-sized surface; waiting for a usable size.
    Deferred,
    Running,
    Unmounted,
}

pub type Spawner = Box<dyn FnMut(PanoramaSource, LoadCompleter)>;

pub struct Viewer {
    state: ViewerState,
    camera: PerspectiveCamera,
    scene: Scene,
    status: LoadStatus,
    source: PanoramaSource,
    pending: Option<PendingLoad>,
    spawner: Spawner,
    phase: Phase,
    size: SurfaceSize,
}

impl Viewer {
    pub fn mount(source: PanoramaSource, size: SurfaceSize) -> Self {
        Self::mount_facing(source, size, Orientation::default())
    }

    /// Mounts with the camera turned towards `initial` instead of straight ahead.
    pub fn mount_facing(source: PanoramaSource, size: SurfaceSize, initial: Orientation) -> Self {
        Self::mount_with(source, size, initial, Box::new(loader::spawn_load))
    }

    /// Like `mount`, but the caller decides how the texture load runs.
    pub fn with_spawner(source: PanoramaSource, size: SurfaceSize, spawner: Spawner) -> Self {
        Self::mount_with(source, size, Orientation::default(), spawner)
    }

    pub fn mount_with(
        source: PanoramaSource,
        size: SurfaceSize,
        initial: Orientation,
        spawner: Spawner,
    ) -> Self {
        let state = ViewerState::facing(initial);
        let camera = PerspectiveCamera::new(state.fov, 1.0);

        let mut viewer = Self {
            state,
            camera,
            scene: Scene::default(),
            status: LoadStatus {
                loading: true,
                error: None,
            },
            source,
            pending: None,
            spawner,
            phase: Phase::Deferred,
            size,
        };

        if size.is_valid() {
            viewer.initialize();
        } else {
            log::debug!("surface is {}x{}, deferring viewer init", size.width, size.height);
        }
        viewer
    }

    fn initialize(&mut self) {
        self.phase = Phase::Running;
        self.camera.set_viewport(self.size.width, self.size.height);

        let (completer, pending) = PendingLoad::new();
        self.pending = Some(pending);
        (self.spawner)(self.source.clone(), completer);
    }

    pub fn is_initialized(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn is_mounted(&self) -> bool {
        self.phase != Phase::Unmounted
    }

    pub fn is_loading(&self) -> bool {
        self.status.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.status.error.as_deref()
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn has_mesh(&self) -> bool {
        self.scene.has_mesh()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    /// Returns true when the input changed orientation, zoom or gesture state.
    pub fn handle_input(&mut self, input: ViewerInput) -> bool {
        if self.phase != Phase::Running {
            return false;
        }

        match input {
            ViewerInput::Press { x, y } => {
                self.state.press(x, y);
                true
            }
            ViewerInput::Move { x, y } => self.state.drag_to(x, y),
            ViewerInput::Release => {
                let was_dragging = self.state.is_dragging();
                self.state.release();
                was_dragging
            }
            ViewerInput::Wheel { delta_y } => {
                self.state.zoom(delta_y);
                self.camera.set_fov(self.state.fov);
                true
            }
        }
    }

    /// Zero-sized updates are ignored. The first valid size of a deferred
    /// viewer completes its initialization.
    pub fn resize(&mut self, size: SurfaceSize) {
        if !size.is_valid() || self.phase == Phase::Unmounted {
            return;
        }
        self.size = size;
        self.camera.set_viewport(size.width, size.height);

        if self.phase == Phase::Deferred {
            log::debug!("surface now {}x{}, initializing viewer", size.width, size.height);
            self.initialize();
        }
    }

    /// Applies a finished texture load, if any.
    pub fn poll_load(&mut self) {
        if self.phase != Phase::Running {
            return;
        }
        let Some(outcome) = self.pending.as_ref().and_then(PendingLoad::poll) else {
            return;
        };
        self.pending = None;

        match outcome {
            Ok(texture) => {
                self.scene.attach(SphereMesh::panorama(), texture);
                self.status.loading = false;
                self.status.error = None;
            }
            Err(e) => self.fail(&e),
        }
    }

    /// Moves the viewer into its error state. The render loop keeps going.
    pub fn fail(&mut self, err: &ViewerError) {
        log::error!("panorama viewer: {err}");
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
        self.status.loading = false;
        self.status.error = Some(err.user_message());
    }

    /// One animation frame: pending load, orientation, camera. Returns the
    /// view-projection matrix to draw with, or None when nothing should be drawn.
    pub fn update_frame(&mut self) -> Option<Mat4> {
        self.poll_load();
        if self.phase != Phase::Running {
            return None;
        }

        self.camera.set_fov(self.state.fov);
        self.camera.position = self.state.frame_camera_position();
        self.camera.look_at(Vec3::ZERO);
        Some(self.camera.view_projection())
    }

    /// Stops input handling and frame updates. A load still in flight is
    /// discarded when it finishes.
    pub fn unmount(&mut self) {
        if self.phase == Phase::Unmounted {
            return;
        }
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
        self.state.release();
        self.phase = Phase::Unmounted;
        log::debug!("panorama viewer unmounted");
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn manual_viewer(size: SurfaceSize) -> (Viewer, Rc<RefCell<Vec<LoadCompleter>>>) {
        let completers = Rc::new(RefCell::new(Vec::new()));
        let sink = completers.clone();
        let viewer = Viewer::with_spawner(
            PanoramaSource::default(),
            size,
            Box::new(move |_, c| sink.borrow_mut().push(c)),
        );
        (viewer, completers)
    }

    #[test]
    fn wheel_marks_projection_dirty() {
        let (mut v, _c) = manual_viewer(SurfaceSize::new(800, 600));
        let _ = v.update_frame();
        assert!(!v.camera().is_projection_dirty());

        v.handle_input(ViewerInput::Wheel { delta_y: -100.0 });
        assert!(v.camera().is_projection_dirty());
        assert!((v.camera().fov - 70.0).abs() < 1e-4);
    }

    #[test]
    fn resize_updates_aspect() {
        let (mut v, _c) = manual_viewer(SurfaceSize::new(800, 600));
        v.resize(SurfaceSize::new(1600, 400));
        assert!((v.camera().aspect - 4.0).abs() < 1e-6);

        v.resize(SurfaceSize::new(0, 400));
        assert!((v.camera().aspect - 4.0).abs() < 1e-6);
        assert_eq!(v.size(), SurfaceSize::new(1600, 400));
    }

    #[test]
    fn frame_camera_looks_at_center() {
        let (mut v, _c) = manual_viewer(SurfaceSize::new(800, 600));
        v.handle_input(ViewerInput::Press { x: 0.0, y: 0.0 });
        v.handle_input(ViewerInput::Move { x: 450.0, y: -120.0 });
        assert!(v.update_frame().is_some());

        let cam = v.camera();
        assert!((cam.position.length() - 100.0).abs() < 1e-3);
        assert!((cam.forward() + cam.position.normalize()).length() < 1e-4);
    }

    #[test]
    fn second_mount_gets_independent_state() {
        let (mut a, _ca) = manual_viewer(SurfaceSize::new(10, 10));
        let (b, _cb) = manual_viewer(SurfaceSize::new(10, 10));
        a.handle_input(ViewerInput::Press { x: 0.0, y: 0.0 });
        a.handle_input(ViewerInput::Move { x: 100.0, y: 0.0 });
        assert_eq!(b.state().orientation.longitude, 0.0);
    }
}

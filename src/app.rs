// app.rs — 宿主：窗口、事件路由、渲染循环与卸载

use crate::config::ViewerConfig;
use crate::input::InputRouter;
use crate::overlay::Overlay;
use crate::renderer::Renderer;
use crate::viewer::{SurfaceSize, Viewer};
use std::sync::Arc;
use winit::{
    event::{Event, WindowEvent},
    event_loop::ControlFlow,
    window::Window,
};

/// A viewer plus the GPU resources drawn for it. Dropping this releases both.
struct Mounted {
    viewer: Viewer,
    renderer: Option<Renderer>,
    /// Set once GPU setup has failed; it is not retried for this mount.
    environment_failed: bool,
}

pub struct App {
    window: Arc<Window>,
    config: ViewerConfig,
    router: InputRouter,
    mounted: Option<Mounted>,
}

impl App {
    pub fn new(window: Arc<Window>, config: ViewerConfig) -> Self {
        Self {
            window,
            config,
            router: InputRouter::new(),
            mounted: None,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn mount(&mut self) {
        if self.mounted.is_some() {
            return;
        }
        let size = SurfaceSize::from(self.window.inner_size());
        log::info!("mounting viewer for {} at {}x{}", self.config.panorama_url, size.width, size.height);

        self.mounted = Some(Mounted {
            viewer: Viewer::mount_facing(
                self.config.source(),
                size,
                self.config.initial_orientation(),
            ),
            renderer: None,
            environment_failed: false,
        });
        self.ensure_renderer();
    }

    /// Creates the renderer once the viewer has a usable surface.
    fn ensure_renderer(&mut self) {
        let Some(m) = self.mounted.as_mut() else {
            return;
        };
        if m.renderer.is_some() || m.environment_failed || !m.viewer.is_initialized() {
            return;
        }

        match pollster::block_on(Renderer::new(self.window.clone(), &self.config.lang)) {
            Ok(renderer) => m.renderer = Some(renderer),
            Err(e) => {
                m.environment_failed = true;
                m.viewer.fail(&e);
                // 无法绘制覆盖层，只能把信息放到标题栏
                self.window.set_title(&format!(
                    "{} - {}",
                    self.config.window_title(),
                    m.viewer.error().unwrap_or_default()
                ));
            }
        }
    }

    pub fn unmount(&mut self) {
        if let Some(mut m) = self.mounted.take() {
            m.viewer.unmount();
            drop(m);
            log::info!("viewer unmounted");
        }
        self.router.reset();
    }

    fn resize(&mut self, size: winit::dpi::PhysicalSize<u32>) {
        if let Some(m) = self.mounted.as_mut() {
            m.viewer.resize(size.into());
            if let Some(r) = m.renderer.as_mut() {
                r.resize(size);
            }
        }
        self.ensure_renderer();
    }

    /// One tick of the render loop. Returns false when the loop must stop.
    fn frame(&mut self) -> bool {
        let Some(m) = self.mounted.as_mut() else {
            return true;
        };
        let Some(view_proj) = m.viewer.update_frame() else {
            return true;
        };
        let Some(renderer) = m.renderer.as_mut() else {
            return true;
        };

        renderer.sync_scene(m.viewer.scene());
        renderer.update_camera(view_proj);

        let overlay = Overlay::from_status(m.viewer.status());
        match renderer.render(&self.window, &overlay) {
            Ok(()) => true,
            Err(wgpu::SurfaceError::Lost) => {
                let size = renderer.size;
                renderer.resize(size);
                true
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory, stopping viewer");
                false
            }
            Err(e) => {
                log::warn!("render error: {e:?}");
                true
            }
        }
    }

    pub fn handle_event(&mut self, event: Event<'_, ()>, control_flow: &mut ControlFlow) {
        *control_flow = ControlFlow::Poll;

        match event {
            Event::WindowEvent { event, window_id } if window_id == self.window.id() => {
                if let Some(r) = self.mounted.as_mut().and_then(|m| m.renderer.as_mut()) {
                    if r.on_window_event(&event) {
                        return;
                    }
                }

                match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                        self.unmount();
                        *control_flow = ControlFlow::Exit;
                    }
                    WindowEvent::Resized(new_size) => self.resize(new_size),
                    WindowEvent::ScaleFactorChanged {
                        scale_factor,
                        new_inner_size,
                    } => {
                        if let Some(r) = self.mounted.as_mut().and_then(|m| m.renderer.as_mut()) {
                            r.set_scale_factor(scale_factor);
                        }
                        self.resize(*new_inner_size);
                    }
                    other => {
                        if let (Some(input), Some(m)) = (self.router.window_event(&other), self.mounted.as_mut()) {
                            m.viewer.handle_input(input);
                        }
                    }
                }
            }

            Event::DeviceEvent { event, .. } => {
                if let (Some(input), Some(m)) = (self.router.device_event(&event), self.mounted.as_mut()) {
                    m.viewer.handle_input(input);
                }
            }

            Event::RedrawRequested(_) => {
                if !self.frame() {
                    self.unmount();
                    *control_flow = ControlFlow::Exit;
                }
            }

            Event::MainEventsCleared => {
                // 卸载后不再调度新的帧
                if self.is_mounted() {
                    self.window.request_redraw();
                }
            }

            Event::LoopDestroyed => self.unmount(),

            _ => {}
        }
    }
}

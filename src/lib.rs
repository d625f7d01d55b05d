//! Virtual Tour: an interactive 360° panorama viewer.
//!
//! An equirectangular image is mapped onto the inside of a sphere; dragging
//! rotates the camera and the wheel narrows or widens the field of view.
//!
//! The [`Viewer`] component holds no GPU state and can be driven directly by
//! any host; [`App`] is the winit/wgpu host used by the `virtual-tour` binary.
//!
//! ```rust,no_run
//! use virtual_tour::{PanoramaSource, SurfaceSize, Viewer, ViewerInput};
//!
//! let mut viewer = Viewer::mount(PanoramaSource::parse("salon.jpg"), SurfaceSize::new(1280, 720));
//! viewer.handle_input(ViewerInput::Press { x: 10.0, y: 10.0 });
//! viewer.handle_input(ViewerInput::Move { x: 110.0, y: 10.0 });
//! let _view_proj = viewer.update_frame();
//! ```

pub mod app;
pub mod camera;
pub mod config;
pub mod error;
pub mod fonts;
pub mod i18n;
pub mod input;
pub mod loader;
pub mod mesh;
pub mod overlay;
pub mod panorama;
pub mod renderer;
pub mod viewer;

pub use app::App;
pub use config::ViewerConfig;
pub use error::{ErrorKind, ViewerError};
pub use input::ViewerInput;
pub use loader::{PanoramaSource, DEFAULT_PANORAMA_URL};
pub use viewer::{LoadStatus, SurfaceSize, Viewer};

// main.rs — 入口：日志、配置、窗口与事件循环

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // 在 Release 模式下隐藏控制台窗口

use anyhow::Context;
use std::sync::Arc;
use virtual_tour::{i18n, App, ViewerConfig};
use winit::{dpi::LogicalSize, event_loop::EventLoop, window::WindowBuilder};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ViewerConfig::resolve();
    i18n::init(config.lang.clone());
    log::info!("virtual-tour v{} ({})", env!("CARGO_PKG_VERSION"), config.lang);

    let event_loop = EventLoop::new();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title())
            .with_inner_size(LogicalSize::new(config.width.max(1), config.height.max(1)))
            .build(&event_loop)
            .context("failed to create window")?,
    );

    let mut app = App::new(window, config);
    app.mount();

    event_loop.run(move |event, _, control_flow| {
        app.handle_event(event, control_flow);
    });
}

use anyhow::Result;
use tao::{
    dpi::LogicalSize,
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};
use tracing::info;
use wry::WebViewBuilder;

/// Opens a desktop window framing the local dashboard view. Blocks until
/// the window is closed, then exits the process.
pub fn launch_window(port: u16) -> Result<()> {
    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title("Print Shop Analytics")
        .with_inner_size(LogicalSize::new(1200, 860))
        .with_resizable(true)
        .build(&event_loop)?;

    let url = format!("http://127.0.0.1:{}", port);

    let _webview = WebViewBuilder::new(&window)
        .with_url(&url)
        .build()?;

    info!("Dashboard window open, loading {}", url);

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        if let Event::WindowEvent {
            event: WindowEvent::CloseRequested,
            ..
        } = event
        {
            info!("Dashboard window closed, shutting down");
            *control_flow = ControlFlow::Exit;

            // Force process exit to stop the background server threads
            std::process::exit(0);
        }
    });
}

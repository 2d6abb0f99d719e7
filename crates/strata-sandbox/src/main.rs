mod sandbox_2d;

use anyhow::Result;
use strata_engine::core::{AppConfig, Application};
use strata_engine::event::{EventCategory, WindowResizeEvent};
use strata_engine::logging::{init_logging, LoggingConfig};

use sandbox_2d::Sandbox2D;

fn main() -> Result<()> {
    init_logging(LoggingConfig::with_filter("info,strata_engine=debug"));

    let config = AppConfig::default()
        .with_title("strata sandbox")
        .with_size(1280, 720);
    let mut app = Application::new(config)?;

    app.events().subscribe::<WindowResizeEvent, _>(|e| {
        log::debug!("{e}");
        false
    });
    app.events().subscribe_category(EventCategory::MOUSE_BUTTON, |e| {
        log::trace!("{e}");
        false
    });

    app.push_layer(Box::new(Sandbox2D::new()));
    app.run();
    Ok(())
}

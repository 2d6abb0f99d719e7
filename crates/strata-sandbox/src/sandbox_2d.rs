use strata_engine::core::LayerCtx;
use strata_engine::event::Event;
use strata_engine::glam::{Vec2, Vec3, Vec4};
use strata_engine::input::KeyCode;
use strata_engine::layer::Layer;
use strata_engine::renderer::{OrthographicCameraController, Quad, Texture2D};

const CHECKER_SIZE: u32 = 8;
const STATS_INTERVAL: f32 = 2.0;

/// Camera-controlled scene of flat, rotating and textured quads.
pub struct Sandbox2D {
    controller: OrthographicCameraController,
    checkerboard: Option<Box<dyn Texture2D>>,
    square_color: Vec4,
    spin: f32,
    since_stats: f32,
}

impl Sandbox2D {
    pub fn new() -> Self {
        Self {
            controller: OrthographicCameraController::new(16.0 / 9.0, true),
            checkerboard: None,
            square_color: Vec4::new(0.2, 0.3, 0.8, 1.0),
            spin: 0.0,
            since_stats: 0.0,
        }
    }
}

/// RGBA8 checkerboard, alternating light and dark texels.
fn checkerboard_pixels(size: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let shade = if (x + y) % 2 == 0 { 0xe0 } else { 0x40 };
            pixels.extend_from_slice(&[shade, shade, shade, 0xff]);
        }
    }
    pixels
}

impl Layer for Sandbox2D {
    fn name(&self) -> &str {
        "Sandbox2D"
    }

    fn on_attach(&mut self, ctx: &mut LayerCtx<'_>) {
        self.controller = OrthographicCameraController::new(ctx.aspect_ratio(), true);

        let mut texture = ctx
            .graphics
            .context()
            .create_texture(CHECKER_SIZE, CHECKER_SIZE);
        texture.set_data(&checkerboard_pixels(CHECKER_SIZE));
        self.checkerboard = Some(texture);
    }

    fn on_detach(&mut self) {
        self.checkerboard = None;
    }

    fn on_update(&mut self, ctx: &mut LayerCtx<'_>) {
        let dt = ctx.time.dt;
        if ctx.input.is_key_pressed(KeyCode::Escape) {
            ctx.request_exit();
        }

        self.controller.on_update(ctx.input, dt);
        self.spin = (self.spin + 50.0 * dt) % 360.0;

        let r2d = &mut *ctx.renderer_2d;
        let cmd = &mut *ctx.graphics;

        r2d.begin_scene(cmd, self.controller.camera());

        r2d.draw_colored_quad(cmd, Vec3::new(-1.0, 0.0, 0.0), Vec2::new(0.8, 0.8), Vec4::new(0.8, 0.2, 0.3, 1.0));
        r2d.draw_colored_quad(cmd, Vec3::new(0.5, -0.5, 0.0), Vec2::new(0.5, 0.75), self.square_color);
        r2d.draw_rotated_quad(
            cmd,
            Vec3::new(1.2, 0.6, 0.0),
            Vec2::splat(0.6),
            self.spin.to_radians(),
            Vec4::new(0.3, 0.8, 0.2, 1.0),
        );

        if let Some(texture) = self.checkerboard.as_deref() {
            r2d.draw_textured_quad(cmd, Vec3::new(0.0, 0.0, -0.1), Vec2::splat(10.0), texture, 10.0);
            r2d.draw_quad(
                cmd,
                &Quad::new(Vec2::new(-1.5, 1.0), Vec2::splat(0.5))
                    .with_texture(texture)
                    .with_rotation((-self.spin).to_radians())
                    .with_color(Vec4::new(1.0, 0.9, 0.9, 1.0)),
            );
        }

        r2d.end_scene();

        self.since_stats += dt;
        if self.since_stats >= STATS_INTERVAL {
            self.since_stats = 0.0;
            let stats = r2d.stats();
            log::info!(
                "frame {}: {:.2} ms, {} draw calls, {} quads",
                ctx.time.frame_index,
                ctx.time.dt_millis(),
                stats.draw_calls,
                stats.quads
            );
        }
    }

    fn on_event(&mut self, event: &mut Event) {
        self.controller.on_event(event);
    }
}

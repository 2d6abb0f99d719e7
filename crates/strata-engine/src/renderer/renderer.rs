use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::engine_assert;

use super::buffer::{IndexBuffer, VertexBuffer};
use super::camera::OrthographicCamera;
use super::command::RenderCommand;
use super::constant_buffer::ConstantBuffer;
use super::context::GraphicsContext;
use super::shader::Shader;
use super::texture::Texture2D;

/// Constant-buffer slot holding the scene's view-projection matrix.
pub const SCENE_SLOT: u32 = 0;
/// Texture slot sampled by submitted shaders.
pub const TEXTURE_SLOT: u32 = 0;

/// GPU layout of the per-scene constants.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct SceneUniform {
    /// Stored transposed; shaders multiply `vec4(position, 1.0) * view_projection`.
    view_projection: [[f32; 4]; 4],
}

impl SceneUniform {
    fn new(view_projection: Mat4) -> Self {
        Self {
            view_projection: view_projection.transpose().to_cols_array_2d(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct SceneData {
    view_projection: Mat4,
}

/// 1x1 opaque white texture bound when a draw has no texture of its own.
pub(crate) fn create_white_texture(ctx: &dyn GraphicsContext) -> Box<dyn Texture2D> {
    let mut texture = ctx.create_texture(1, 1);
    texture.set_data(&[0xff; 4]);
    texture
}

/// Scene-based submission of arbitrary meshes.
///
/// `begin_scene` → any number of `submit` → `end_scene`. Submitting outside
/// a scene, nesting `begin_scene` and ending a scene that was never begun
/// are precondition violations.
pub struct Renderer {
    scene: Option<SceneData>,
    scene_buffer: Box<dyn ConstantBuffer>,
    white_texture: Box<dyn Texture2D>,
}

impl Renderer {
    pub fn new(command: &mut RenderCommand) -> Self {
        let ctx = command.context();
        Self {
            scene: None,
            scene_buffer: ctx.create_constant_buffer(std::mem::size_of::<SceneUniform>() as u64),
            white_texture: create_white_texture(ctx),
        }
    }

    pub fn is_in_scene(&self) -> bool {
        self.scene.is_some()
    }

    /// View-projection of the active scene.
    pub fn scene_view_projection(&self) -> Option<Mat4> {
        self.scene.map(|s| s.view_projection)
    }

    pub fn on_window_resize(&mut self, command: &mut RenderCommand, width: u32, height: u32) {
        command.set_viewport(0, 0, width, height);
    }

    /// Snapshots the camera and uploads it to the scene constant buffer.
    pub fn begin_scene(&mut self, command: &mut RenderCommand, camera: &OrthographicCamera) {
        engine_assert!(self.scene.is_none(), "begin_scene called while a scene is active");

        let view_projection = camera.view_projection_matrix();
        let uniform = SceneUniform::new(view_projection);
        self.scene_buffer.set_data(bytemuck::bytes_of(&uniform));
        self.scene_buffer.bind(command.context_mut(), SCENE_SLOT);
        self.scene = Some(SceneData { view_projection });
    }

    pub fn end_scene(&mut self) {
        if !engine_assert!(self.scene.is_some(), "end_scene called without begin_scene") {
            return;
        }
        self.scene = None;
    }

    /// Binds everything for one mesh and draws all of its indices.
    ///
    /// `texture` falls back to the 1x1 white texture.
    pub fn submit(
        &mut self,
        command: &mut RenderCommand,
        shader: &dyn Shader,
        vertex_buffer: &dyn VertexBuffer,
        index_buffer: &dyn IndexBuffer,
        texture: Option<&dyn Texture2D>,
    ) {
        if !engine_assert!(self.scene.is_some(), "submit called outside begin_scene/end_scene") {
            return;
        }

        let ctx = command.context_mut();
        shader.bind(ctx);
        self.scene_buffer.bind(ctx, SCENE_SLOT);
        texture
            .unwrap_or(self.white_texture.as_ref())
            .bind(ctx, TEXTURE_SLOT);
        vertex_buffer.bind(ctx);
        index_buffer.bind(ctx);

        command.draw_indexed(index_buffer, 0);
    }

    pub fn white_texture(&self) -> &dyn Texture2D {
        self.white_texture.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::headless::{HeadlessContext, RecordedCommand, SharedCommandLog};
    use crate::renderer::resource::BindSlot;

    struct Fixture {
        command: RenderCommand,
        renderer: Renderer,
        log: SharedCommandLog,
        camera: OrthographicCamera,
    }

    fn fixture() -> Fixture {
        let ctx = HeadlessContext::new(640, 480);
        let log = ctx.log();
        let mut command = RenderCommand::new(Box::new(ctx));
        command.init().unwrap();
        let renderer = Renderer::new(&mut command);
        Fixture {
            command,
            renderer,
            log,
            camera: OrthographicCamera::new(-1.0, 1.0, -1.0, 1.0),
        }
    }

    fn mesh(command: &RenderCommand) -> (Box<dyn Shader>, Box<dyn VertexBuffer>, Box<dyn IndexBuffer>) {
        let ctx = command.context();
        (
            ctx.create_shader("flat", "fn vs_main() {} fn fs_main() {}"),
            ctx.create_vertex_buffer(&[0; 36]),
            ctx.create_index_buffer(&[0, 1, 2]),
        )
    }

    // ── scene protocol ───────────────────────────────────────────────────

    #[test]
    fn begin_scene_uploads_the_transposed_matrix() {
        let mut f = fixture();
        f.camera.set_position(glam::Vec3::new(0.5, 0.0, 0.0));
        f.renderer.begin_scene(&mut f.command, &f.camera);

        let expected = SceneUniform::new(f.camera.view_projection_matrix());
        let uploaded = f.log.borrow().commands().iter().find_map(|c| match c {
            RecordedCommand::SetConstantData { bytes, .. } => Some(bytes.clone()),
            _ => None,
        });
        assert_eq!(uploaded.as_deref(), Some(bytemuck::bytes_of(&expected)));
        assert_eq!(
            f.renderer.scene_view_projection(),
            Some(f.camera.view_projection_matrix())
        );
    }

    #[test]
    fn submit_binds_everything_and_draws_all_indices() {
        let mut f = fixture();
        let (shader, vb, ib) = mesh(&f.command);
        f.renderer.begin_scene(&mut f.command, &f.camera);
        f.renderer.submit(&mut f.command, shader.as_ref(), vb.as_ref(), ib.as_ref(), None);
        f.renderer.end_scene();

        let log = f.log.borrow();
        let draw = log.draws().next().unwrap();
        assert_eq!(draw.count, 3);
        assert_eq!(draw.bindings.shader, Some(shader.id()));
        assert_eq!(draw.bindings.vertex_buffer, Some(vb.id()));
        assert_eq!(draw.bindings.index_buffer, Some(ib.id()));
        assert_eq!(
            draw.bindings.textures.get(&TEXTURE_SLOT),
            Some(&f.renderer.white_texture().id())
        );
        assert!(draw.bindings.constant_buffers.contains_key(&SCENE_SLOT));
    }

    #[test]
    fn explicit_texture_replaces_the_fallback() {
        let mut f = fixture();
        let (shader, vb, ib) = mesh(&f.command);
        let texture = f.command.context().create_texture(2, 2);
        f.renderer.begin_scene(&mut f.command, &f.camera);
        f.renderer.submit(
            &mut f.command,
            shader.as_ref(),
            vb.as_ref(),
            ib.as_ref(),
            Some(texture.as_ref()),
        );

        let log = f.log.borrow();
        let draw = log.draws().next().unwrap();
        assert_eq!(draw.bindings.textures.get(&TEXTURE_SLOT), Some(&texture.id()));
    }

    #[test]
    fn failed_resources_do_not_inherit_previous_bindings() {
        let mut f = fixture();
        let (good, vb, ib) = mesh(&f.command);
        let broken = f.command.context().create_shader("broken", "fn main() {}");
        let missing = f.command.context().create_texture_from_file(std::path::Path::new("missing.png"));
        assert!(!broken.is_valid());

        f.renderer.begin_scene(&mut f.command, &f.camera);
        f.renderer.submit(&mut f.command, good.as_ref(), vb.as_ref(), ib.as_ref(), None);
        f.renderer.submit(
            &mut f.command,
            broken.as_ref(),
            vb.as_ref(),
            ib.as_ref(),
            Some(missing.as_ref()),
        );
        f.renderer.end_scene();

        let log = f.log.borrow();
        let draws: Vec<_> = log.draws().collect();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].bindings.shader, Some(good.id()));
        assert_eq!(draws[1].bindings.shader, None);
        assert_eq!(draws[1].bindings.textures.get(&TEXTURE_SLOT), None);
        assert!(log.contains(&RecordedCommand::Unbind(BindSlot::Shader)));
    }

    #[test]
    #[should_panic(expected = "submit called outside")]
    fn submit_outside_a_scene_is_rejected() {
        let mut f = fixture();
        let (shader, vb, ib) = mesh(&f.command);
        f.renderer.submit(&mut f.command, shader.as_ref(), vb.as_ref(), ib.as_ref(), None);
    }

    #[test]
    #[should_panic(expected = "while a scene is active")]
    fn nested_begin_scene_is_rejected() {
        let mut f = fixture();
        f.renderer.begin_scene(&mut f.command, &f.camera);
        f.renderer.begin_scene(&mut f.command, &f.camera);
    }

    #[test]
    #[should_panic(expected = "without begin_scene")]
    fn end_scene_without_begin_is_rejected() {
        let mut f = fixture();
        f.renderer.end_scene();
    }

    #[test]
    fn resize_sets_the_viewport() {
        let mut f = fixture();
        f.renderer.on_window_resize(&mut f.command, 800, 600);
        assert!(f.log.borrow().contains(&RecordedCommand::SetViewport {
            x: 0,
            y: 0,
            width: 800,
            height: 600
        }));
    }
}

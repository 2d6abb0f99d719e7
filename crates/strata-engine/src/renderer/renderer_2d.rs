use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use crate::engine_assert;

use super::buffer::{BufferElement, BufferLayout, IndexBuffer, ShaderDataType, VertexBuffer};
use super::camera::OrthographicCamera;
use super::command::RenderCommand;
use super::renderer::Renderer;
use super::shader::Shader;
use super::texture::Texture2D;

const SHADER_SOURCE: &str = include_str!("shaders/renderer_2d.wgsl");

/// Unit quad centred on the origin, counter-clockwise from bottom-left.
const QUAD_CORNERS: [Vec2; 4] = [
    Vec2::new(-0.5, -0.5),
    Vec2::new(0.5, -0.5),
    Vec2::new(0.5, 0.5),
    Vec2::new(-0.5, 0.5),
];

/// Texture rows are stored top row first, so V runs downwards.
const QUAD_UVS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

const QUAD_INDICES: [u32; 6] = [0, 2, 1, 0, 3, 2];

/// One corner of a quad as uploaded to the GPU.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub tex_coord: [f32; 2],
    /// 0 for the white fallback, 1 for a caller texture.
    pub tex_index: f32,
    pub tiling_factor: f32,
}

impl QuadVertex {
    pub fn layout() -> BufferLayout {
        BufferLayout::new([
            BufferElement::new(ShaderDataType::Float3, "a_Position"),
            BufferElement::new(ShaderDataType::Float4, "a_Color"),
            BufferElement::new(ShaderDataType::Float2, "a_TexCoord"),
            BufferElement::new(ShaderDataType::Float, "a_TexIndex"),
            BufferElement::new(ShaderDataType::Float, "a_TilingFactor"),
        ])
    }
}

/// Description of one quad draw.
///
/// ```ignore
/// renderer_2d.draw_quad(
///     command,
///     &Quad::new(Vec2::ZERO, Vec2::splat(0.5))
///         .with_rotation(45f32.to_radians())
///         .with_color(Vec4::new(0.8, 0.2, 0.3, 1.0)),
/// );
/// ```
#[derive(Clone, Copy)]
pub struct Quad<'t> {
    pub position: Vec3,
    pub size: Vec2,
    /// Radians, counter-clockwise around Z.
    pub rotation: f32,
    pub color: Vec4,
    pub texture: Option<&'t dyn Texture2D>,
    pub tiling_factor: f32,
}

impl<'t> Quad<'t> {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self::at(position.extend(0.0), size)
    }

    pub fn at(position: Vec3, size: Vec2) -> Self {
        Self {
            position,
            size,
            rotation: 0.0,
            color: Vec4::ONE,
            texture: None,
            tiling_factor: 1.0,
        }
    }

    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    pub fn with_texture(mut self, texture: &'t dyn Texture2D) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_tiling_factor(mut self, tiling_factor: f32) -> Self {
        self.tiling_factor = tiling_factor;
        self
    }

    pub fn with_rotation(mut self, radians: f32) -> Self {
        self.rotation = radians;
        self
    }

    /// translate ∘ rotate ∘ scale; the rotation is skipped when zero.
    pub fn transform(&self) -> Mat4 {
        let scale = self.size.extend(1.0);
        if self.rotation == 0.0 {
            Mat4::from_scale_rotation_translation(scale, Quat::IDENTITY, self.position)
        } else {
            Mat4::from_translation(self.position)
                * Mat4::from_rotation_z(self.rotation)
                * Mat4::from_scale(scale)
        }
    }
}

impl std::fmt::Debug for Quad<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Quad")
            .field("position", &self.position)
            .field("size", &self.size)
            .field("rotation", &self.rotation)
            .field("color", &self.color)
            .field("texture", &self.texture.map(|t| t.id()))
            .field("tiling_factor", &self.tiling_factor)
            .finish()
    }
}

/// The four world-space corners of `quad`.
pub fn quad_vertices(quad: &Quad<'_>) -> [QuadVertex; 4] {
    let transform = quad.transform();
    let tex_index = if quad.texture.is_some() { 1.0 } else { 0.0 };
    std::array::from_fn(|i| QuadVertex {
        position: transform.transform_point3(QUAD_CORNERS[i].extend(0.0)).to_array(),
        color: quad.color.to_array(),
        tex_coord: QUAD_UVS[i],
        tex_index,
        tiling_factor: quad.tiling_factor,
    })
}

/// Counters for the current scene. Reset by `begin_scene`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Statistics {
    pub draw_calls: u32,
    pub quads: u32,
}

impl Statistics {
    pub fn vertex_count(&self) -> u32 {
        self.quads * 4
    }

    pub fn index_count(&self) -> u32 {
        self.quads * 6
    }
}

/// Immediate-mode quad renderer.
///
/// Every quad is transformed on the CPU, uploaded into a four-vertex dynamic
/// buffer and drawn with its own call through [`Renderer::submit`].
pub struct Renderer2D {
    renderer: Renderer,
    shader: Box<dyn Shader>,
    vertex_buffer: Box<dyn VertexBuffer>,
    index_buffer: Box<dyn IndexBuffer>,
    stats: Statistics,
}

impl Renderer2D {
    pub fn new(command: &mut RenderCommand) -> Self {
        let renderer = Renderer::new(command);
        let ctx = command.context();

        let shader = ctx.create_shader("renderer_2d", SHADER_SOURCE);
        let mut vertex_buffer = ctx
            .create_dynamic_vertex_buffer((std::mem::size_of::<QuadVertex>() * 4) as u64);
        vertex_buffer.set_layout(QuadVertex::layout());
        let index_buffer = ctx.create_index_buffer(&QUAD_INDICES);

        log::debug!("renderer 2d ready (shader valid: {})", shader.is_valid());

        Self {
            renderer,
            shader,
            vertex_buffer,
            index_buffer,
            stats: Statistics::default(),
        }
    }

    pub fn begin_scene(&mut self, command: &mut RenderCommand, camera: &OrthographicCamera) {
        self.stats = Statistics::default();
        self.renderer.begin_scene(command, camera);
    }

    pub fn end_scene(&mut self) {
        self.renderer.end_scene();
    }

    pub fn is_in_scene(&self) -> bool {
        self.renderer.is_in_scene()
    }

    pub fn draw_quad(&mut self, command: &mut RenderCommand, quad: &Quad<'_>) {
        if !engine_assert!(
            self.renderer.is_in_scene(),
            "draw_quad called outside begin_scene/end_scene"
        ) {
            return;
        }

        let vertices = quad_vertices(quad);
        self.vertex_buffer.set_data(bytemuck::cast_slice(&vertices));
        self.renderer.submit(
            command,
            self.shader.as_ref(),
            self.vertex_buffer.as_ref(),
            self.index_buffer.as_ref(),
            quad.texture,
        );

        self.stats.draw_calls += 1;
        self.stats.quads += 1;
    }

    pub fn draw_colored_quad(&mut self, command: &mut RenderCommand, position: Vec3, size: Vec2, color: Vec4) {
        self.draw_quad(command, &Quad::at(position, size).with_color(color));
    }

    pub fn draw_textured_quad(
        &mut self,
        command: &mut RenderCommand,
        position: Vec3,
        size: Vec2,
        texture: &dyn Texture2D,
        tiling_factor: f32,
    ) {
        let quad = Quad::at(position, size)
            .with_texture(texture)
            .with_tiling_factor(tiling_factor);
        self.draw_quad(command, &quad);
    }

    pub fn draw_tinted_quad(
        &mut self,
        command: &mut RenderCommand,
        position: Vec3,
        size: Vec2,
        texture: &dyn Texture2D,
        tint: Vec4,
        tiling_factor: f32,
    ) {
        let quad = Quad::at(position, size)
            .with_texture(texture)
            .with_color(tint)
            .with_tiling_factor(tiling_factor);
        self.draw_quad(command, &quad);
    }

    pub fn draw_rotated_quad(
        &mut self,
        command: &mut RenderCommand,
        position: Vec3,
        size: Vec2,
        rotation: f32,
        color: Vec4,
    ) {
        let quad = Quad::at(position, size).with_rotation(rotation).with_color(color);
        self.draw_quad(command, &quad);
    }

    pub fn draw_rotated_textured_quad(
        &mut self,
        command: &mut RenderCommand,
        position: Vec3,
        size: Vec2,
        rotation: f32,
        texture: &dyn Texture2D,
    ) {
        let quad = Quad::at(position, size)
            .with_rotation(rotation)
            .with_texture(texture);
        self.draw_quad(command, &quad);
    }

    pub fn stats(&self) -> Statistics {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = Statistics::default();
    }

    pub fn white_texture(&self) -> &dyn Texture2D {
        self.renderer.white_texture()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::headless::{HeadlessContext, RecordedCommand, SharedCommandLog};
    use crate::renderer::renderer::TEXTURE_SLOT;

    fn setup() -> (RenderCommand, Renderer2D, SharedCommandLog) {
        let ctx = HeadlessContext::new(640, 480);
        let log = ctx.log();
        let mut command = RenderCommand::new(Box::new(ctx));
        command.init().unwrap();
        let renderer = Renderer2D::new(&mut command);
        (command, renderer, log)
    }

    fn approx(a: [f32; 3], b: [f32; 3]) -> bool {
        Vec3::from(a).abs_diff_eq(Vec3::from(b), 1e-5)
    }

    // ── vertices ─────────────────────────────────────────────────────────

    #[test]
    fn quad_vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<QuadVertex>(), 44);
        assert_eq!(QuadVertex::layout().stride(), 44);
    }

    #[test]
    fn translated_quad_corners() {
        let quad = Quad::new(Vec2::new(1.0, 2.0), Vec2::new(2.0, 4.0));
        let v = quad_vertices(&quad);
        assert!(approx(v[0].position, [0.0, 0.0, 0.0]));
        assert!(approx(v[2].position, [2.0, 4.0, 0.0]));
        assert_eq!(v[0].tex_coord, [0.0, 1.0]);
        assert_eq!(v[3].tex_coord, [0.0, 0.0]);
        assert_eq!(v[0].tex_index, 0.0);
    }

    #[test]
    fn rotation_is_applied_before_translation() {
        let quad = Quad::new(Vec2::new(10.0, 0.0), Vec2::ONE)
            .with_rotation(std::f32::consts::FRAC_PI_2);
        let v = quad_vertices(&quad);
        // Bottom-left (-0.5,-0.5) rotated 90° lands at (0.5,-0.5).
        assert!(approx(v[0].position, [10.5, -0.5, 0.0]));
    }

    // ── drawing ──────────────────────────────────────────────────────────

    #[test]
    fn every_quad_is_its_own_draw() {
        let (mut command, mut r2d, log) = setup();
        let camera = OrthographicCamera::new(-1.0, 1.0, -1.0, 1.0);

        r2d.begin_scene(&mut command, &camera);
        for i in 0..3 {
            r2d.draw_colored_quad(&mut command, Vec3::new(i as f32, 0.0, 0.0), Vec2::ONE, Vec4::ONE);
        }
        r2d.end_scene();

        let log = log.borrow();
        assert_eq!(log.draw_count(), 3);
        assert!(log.draws().all(|d| d.count == 6));
        assert_eq!(
            log.count(|c| matches!(c, RecordedCommand::SetVertexData { .. })),
            3
        );
        assert_eq!(r2d.stats(), Statistics { draw_calls: 3, quads: 3 });
    }

    #[test]
    fn untextured_quads_sample_the_white_texture() {
        let (mut command, mut r2d, log) = setup();
        let camera = OrthographicCamera::new(-1.0, 1.0, -1.0, 1.0);
        let texture = command.context().create_texture(4, 4);

        r2d.begin_scene(&mut command, &camera);
        r2d.draw_colored_quad(&mut command, Vec3::ZERO, Vec2::ONE, Vec4::ONE);
        r2d.draw_textured_quad(&mut command, Vec3::ZERO, Vec2::ONE, texture.as_ref(), 2.0);
        r2d.end_scene();

        let log = log.borrow();
        let bound: Vec<_> = log
            .draws()
            .map(|d| d.bindings.textures.get(&TEXTURE_SLOT).copied())
            .collect();
        assert_eq!(bound, vec![Some(r2d.white_texture().id()), Some(texture.id())]);
    }

    #[test]
    fn white_texture_is_one_opaque_texel() {
        let (_command, r2d, log) = setup();
        let id = r2d.white_texture().id();
        assert!(log.borrow().contains(&RecordedCommand::SetTextureData {
            id,
            bytes: vec![0xff; 4]
        }));
    }

    #[test]
    fn begin_scene_resets_statistics() {
        let (mut command, mut r2d, _log) = setup();
        let camera = OrthographicCamera::new(-1.0, 1.0, -1.0, 1.0);
        r2d.begin_scene(&mut command, &camera);
        r2d.draw_colored_quad(&mut command, Vec3::ZERO, Vec2::ONE, Vec4::ONE);
        r2d.end_scene();
        r2d.begin_scene(&mut command, &camera);
        assert_eq!(r2d.stats(), Statistics::default());
    }

    #[test]
    #[should_panic(expected = "draw_quad called outside")]
    fn drawing_outside_a_scene_is_rejected() {
        let (mut command, mut r2d, _log) = setup();
        r2d.draw_colored_quad(&mut command, Vec3::ZERO, Vec2::ONE, Vec4::ONE);
    }
}

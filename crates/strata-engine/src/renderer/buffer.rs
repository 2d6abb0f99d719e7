use super::context::GraphicsContext;
use super::resource::ResourceId;

/// Element type of a vertex attribute.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum ShaderDataType {
    #[default]
    None,
    Float,
    Float2,
    Float3,
    Float4,
    Mat3,
    Mat4,
    Int,
    Int2,
    Int3,
    Int4,
    Bool,
}

impl ShaderDataType {
    /// Size in bytes.
    pub const fn size(self) -> u32 {
        match self {
            ShaderDataType::None => 0,
            ShaderDataType::Float => 4,
            ShaderDataType::Float2 => 4 * 2,
            ShaderDataType::Float3 => 4 * 3,
            ShaderDataType::Float4 => 4 * 4,
            ShaderDataType::Mat3 => 4 * 3 * 3,
            ShaderDataType::Mat4 => 4 * 4 * 4,
            ShaderDataType::Int => 4,
            ShaderDataType::Int2 => 4 * 2,
            ShaderDataType::Int3 => 4 * 3,
            ShaderDataType::Int4 => 4 * 4,
            ShaderDataType::Bool => 1,
        }
    }

    pub const fn component_count(self) -> u32 {
        match self {
            ShaderDataType::None => 0,
            ShaderDataType::Float | ShaderDataType::Int | ShaderDataType::Bool => 1,
            ShaderDataType::Float2 | ShaderDataType::Int2 => 2,
            ShaderDataType::Float3 | ShaderDataType::Int3 => 3,
            ShaderDataType::Float4 | ShaderDataType::Int4 => 4,
            ShaderDataType::Mat3 => 3 * 3,
            ShaderDataType::Mat4 => 4 * 4,
        }
    }
}

/// One named attribute inside a [`BufferLayout`].
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct BufferElement {
    pub name: String,
    pub ty: ShaderDataType,
    pub size: u32,
    pub offset: u32,
    pub normalized: bool,
}

impl BufferElement {
    pub fn new(ty: ShaderDataType, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty,
            size: ty.size(),
            offset: 0,
            normalized: false,
        }
    }

    pub fn normalized(mut self) -> Self {
        self.normalized = true;
        self
    }

    pub fn component_count(&self) -> u32 {
        self.ty.component_count()
    }
}

/// Interleaved vertex layout.
///
/// Offsets and the stride are computed once, in declaration order, when the
/// layout is built. Elements cannot be edited afterwards.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash)]
pub struct BufferLayout {
    elements: Vec<BufferElement>,
    stride: u32,
}

impl BufferLayout {
    pub fn new(elements: impl IntoIterator<Item = BufferElement>) -> Self {
        let mut elements: Vec<BufferElement> = elements.into_iter().collect();
        let mut offset = 0;
        for element in &mut elements {
            element.offset = offset;
            offset += element.size;
        }
        Self { elements, stride: offset }
    }

    pub fn elements(&self) -> &[BufferElement] {
        &self.elements
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BufferElement> {
        self.elements.iter()
    }
}

impl<'a> IntoIterator for &'a BufferLayout {
    type Item = &'a BufferElement;
    type IntoIter = std::slice::Iter<'a, BufferElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

/// GPU vertex buffer.
///
/// Static buffers are filled at creation. Dynamic buffers are created with a
/// byte capacity and refilled with [`VertexBuffer::set_data`].
pub trait VertexBuffer {
    fn id(&self) -> ResourceId;

    fn bind(&self, ctx: &mut dyn GraphicsContext);

    /// Replaces the buffer contents from offset 0. Only valid on dynamic buffers.
    fn set_data(&mut self, data: &[u8]);

    /// Capacity in bytes.
    fn size(&self) -> u64;

    fn is_dynamic(&self) -> bool;

    fn layout(&self) -> &BufferLayout;

    fn set_layout(&mut self, layout: BufferLayout);
}

/// GPU index buffer of `u32` indices.
pub trait IndexBuffer {
    fn id(&self) -> ResourceId;

    fn bind(&self, ctx: &mut dyn GraphicsContext);

    fn count(&self) -> u32;
}

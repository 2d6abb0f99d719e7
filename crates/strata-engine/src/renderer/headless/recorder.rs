use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use glam::Vec4;

use crate::renderer::api::PrimitiveTopology;
use crate::renderer::resource::{BindSlot, ResourceId};

/// A command observed by the headless backend.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    Init,
    Shutdown,
    Clear(Vec4),
    SwapBuffers,
    Resize { width: u32, height: u32 },
    SetViewport { x: u32, y: u32, width: u32, height: u32 },
    SetVsync(bool),
    BindRenderTarget,

    CreateVertexBuffer { id: ResourceId, size: u64, dynamic: bool },
    CreateIndexBuffer { id: ResourceId, count: u32 },
    CreateConstantBuffer { id: ResourceId, size: u64 },
    CreateShader { id: ResourceId, name: String },
    CreateTexture { id: ResourceId, width: u32, height: u32 },

    SetVertexData { id: ResourceId, bytes: Vec<u8> },
    SetConstantData { id: ResourceId, bytes: Vec<u8> },
    SetTextureData { id: ResourceId, bytes: Vec<u8> },

    BindShader(ResourceId),
    BindVertexBuffer(ResourceId),
    BindIndexBuffer(ResourceId),
    BindConstantBuffer { slot: u32, id: ResourceId },
    BindTexture { slot: u32, id: ResourceId },
    Unbind(BindSlot),

    DrawIndexed(DrawCall),
}

/// Pipeline bindings captured at draw time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    pub shader: Option<ResourceId>,
    pub vertex_buffer: Option<ResourceId>,
    pub index_buffer: Option<ResourceId>,
    pub constant_buffers: BTreeMap<u32, ResourceId>,
    pub textures: BTreeMap<u32, ResourceId>,
}

impl Bindings {
    pub(super) fn clear_slot(&mut self, slot: BindSlot) {
        match slot {
            BindSlot::Shader => self.shader = None,
            BindSlot::VertexBuffer => self.vertex_buffer = None,
            BindSlot::IndexBuffer => self.index_buffer = None,
            BindSlot::ConstantBuffer(slot) => {
                self.constant_buffers.remove(&slot);
            }
            BindSlot::Texture(slot) => {
                self.textures.remove(&slot);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub count: u32,
    pub topology: PrimitiveTopology,
    pub bindings: Bindings,
}

/// Ordered record of everything the headless backend was asked to do.
///
/// A bounded log keeps at most `limit` commands. When full, the oldest half
/// is discarded.
#[derive(Debug, Default)]
pub struct CommandLog {
    commands: Vec<RecordedCommand>,
    limit: Option<usize>,
    discarded: u64,
}

pub type SharedCommandLog = Rc<RefCell<CommandLog>>;

impl CommandLog {
    /// History kept by a context that was not handed a log to record into.
    pub const DEFAULT_LIMIT: usize = 4096;

    /// Unbounded log, for callers that inspect the full history.
    pub fn shared() -> SharedCommandLog {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn bounded(limit: usize) -> SharedCommandLog {
        Rc::new(RefCell::new(Self {
            limit: Some(limit.max(2)),
            ..Self::default()
        }))
    }

    pub fn push(&mut self, command: RecordedCommand) {
        log::trace!("headless: {command:?}");
        let full = self.limit.filter(|&limit| self.commands.len() >= limit);
        if let Some(limit) = full {
            let oldest = self.commands.len() - limit / 2;
            self.commands.drain(..oldest);
            self.discarded += oldest as u64;
        }
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Commands dropped to stay within the limit.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    pub fn draws(&self) -> impl Iterator<Item = &DrawCall> {
        self.commands.iter().filter_map(|c| match c {
            RecordedCommand::DrawIndexed(draw) => Some(draw),
            _ => None,
        })
    }

    pub fn draw_count(&self) -> usize {
        self.draws().count()
    }

    pub fn contains(&self, command: &RecordedCommand) -> bool {
        self.commands.contains(command)
    }

    pub fn count(&self, pred: impl Fn(&RecordedCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

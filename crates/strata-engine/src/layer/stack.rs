use crate::core::LayerCtx;
use crate::event::Event;

use super::Layer;

/// Handle returned when a layer is pushed, used to pop it again.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct LayerId(u64);

struct Entry {
    id: LayerId,
    layer: Box<dyn Layer>,
}

/// Ordered layers followed by overlays.
///
/// Regular layers live in `[0, insert_index)` and overlays in
/// `[insert_index, len)`, so overlays always sit above every layer no matter
/// the push order.
#[derive(Default)]
pub struct LayerStack {
    entries: Vec<Entry>,
    insert_index: usize,
    next_id: u64,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of regular (non-overlay) layers.
    pub fn layer_count(&self) -> usize {
        self.insert_index
    }

    /// Inserts above the existing layers but below every overlay.
    pub fn push_layer(&mut self, layer: Box<dyn Layer>, ctx: &mut LayerCtx<'_>) -> LayerId {
        let id = self.allocate_id();
        self.entries.insert(self.insert_index, Entry { id, layer });
        self.insert_index += 1;
        self.entries[self.insert_index - 1].layer.on_attach(ctx);
        id
    }

    pub fn push_overlay(&mut self, overlay: Box<dyn Layer>, ctx: &mut LayerCtx<'_>) -> LayerId {
        let id = self.allocate_id();
        self.entries.push(Entry { id, layer: overlay });
        if let Some(entry) = self.entries.last_mut() {
            entry.layer.on_attach(ctx);
        }
        id
    }

    /// Detaches and returns the layer. Unknown ids and overlay ids are a no-op.
    pub fn pop_layer(&mut self, id: LayerId) -> Option<Box<dyn Layer>> {
        let index = self.entries[..self.insert_index]
            .iter()
            .position(|e| e.id == id)?;
        let layer = self.detach(index);
        self.insert_index -= 1;
        Some(layer)
    }

    /// Detaches and returns the overlay. Unknown ids and layer ids are a no-op.
    pub fn pop_overlay(&mut self, id: LayerId) -> Option<Box<dyn Layer>> {
        let index = self.entries[self.insert_index..]
            .iter()
            .position(|e| e.id == id)?
            + self.insert_index;
        Some(self.detach(index))
    }

    /// Updates every layer bottom-to-top.
    pub fn update(&mut self, ctx: &mut LayerCtx<'_>) {
        for entry in &mut self.entries {
            entry.layer.on_update(ctx);
        }
    }

    pub fn ui_render(&mut self, ctx: &mut LayerCtx<'_>) {
        for entry in &mut self.entries {
            entry.layer.on_ui_render(ctx);
        }
    }

    /// Offers the event top-to-bottom until a layer handles it.
    pub fn propagate_event(&mut self, event: &mut Event) {
        for entry in self.entries.iter_mut().rev() {
            if event.is_handled() {
                break;
            }
            entry.layer.on_event(event);
        }
    }

    /// Layer names bottom-to-top.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.layer.name()).collect()
    }

    /// Detaches every layer, overlays first.
    pub fn clear(&mut self) {
        while !self.entries.is_empty() {
            let top = self.entries.len() - 1;
            self.detach(top);
            self.insert_index = self.insert_index.min(self.entries.len());
        }
    }

    fn allocate_id(&mut self) -> LayerId {
        self.next_id += 1;
        LayerId(self.next_id)
    }

    /// Runs `on_detach` while the layer is still in the stack, then removes it.
    fn detach(&mut self, index: usize) -> Box<dyn Layer> {
        self.entries[index].layer.on_detach();
        let entry = self.entries.remove(index);
        log::debug!("popped layer '{}'", entry.layer.name());
        entry.layer
    }
}

impl Drop for LayerStack {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::core::Services;
    use crate::event::{EventType, KeyPressedEvent};
    use crate::input::KeyCode;
    use crate::time::FrameTime;

    type Journal = Rc<RefCell<Vec<String>>>;

    struct Tracer {
        name: &'static str,
        journal: Journal,
        handles: bool,
    }

    impl Tracer {
        fn boxed(name: &'static str, journal: &Journal) -> Box<dyn Layer> {
            Box::new(Self { name, journal: journal.clone(), handles: false })
        }

        fn note(&self, what: &str) {
            self.journal.borrow_mut().push(format!("{}:{what}", self.name));
        }
    }

    impl Layer for Tracer {
        fn name(&self) -> &str {
            self.name
        }

        fn on_attach(&mut self, _ctx: &mut LayerCtx<'_>) {
            self.note("attach");
        }

        fn on_detach(&mut self) {
            self.note("detach");
        }

        fn on_update(&mut self, _ctx: &mut LayerCtx<'_>) {
            self.note("update");
        }

        fn on_event(&mut self, event: &mut Event) {
            self.note("event");
            if self.handles && event.event_type() == EventType::KeyPressed {
                event.mark_handled();
            }
        }
    }

    fn key_event() -> Event {
        KeyPressedEvent { key: KeyCode::Space, repeat: false }.into()
    }

    fn filtered(journal: &Journal, suffix: &str) -> Vec<String> {
        journal
            .borrow()
            .iter()
            .filter(|s| s.ends_with(suffix))
            .cloned()
            .collect()
    }

    // ── ordering ─────────────────────────────────────────────────────────

    #[test]
    fn overlays_stay_above_layers_regardless_of_push_order() {
        let mut services = Services::headless();
        let journal = Journal::default();
        let mut stack = LayerStack::new();
        {
            let mut ctx = services.ctx(FrameTime::initial());
            stack.push_overlay(Tracer::boxed("O1", &journal), &mut ctx);
            stack.push_layer(Tracer::boxed("L1", &journal), &mut ctx);
            stack.push_overlay(Tracer::boxed("O2", &journal), &mut ctx);
            stack.push_layer(Tracer::boxed("L2", &journal), &mut ctx);
        }
        assert_eq!(stack.names(), vec!["L1", "L2", "O1", "O2"]);
        assert_eq!(stack.layer_count(), 2);

        {
            let mut ctx = services.ctx(FrameTime::initial());
            stack.update(&mut ctx);
        }
        assert_eq!(
            filtered(&journal, ":update"),
            vec!["L1:update", "L2:update", "O1:update", "O2:update"]
        );

        stack.propagate_event(&mut key_event());
        assert_eq!(
            filtered(&journal, ":event"),
            vec!["O2:event", "O1:event", "L2:event", "L1:event"]
        );
    }

    #[test]
    fn handled_event_stops_propagation() {
        let mut services = Services::headless();
        let journal = Journal::default();
        let mut stack = LayerStack::new();
        {
            let mut ctx = services.ctx(FrameTime::initial());
            stack.push_layer(Tracer::boxed("L1", &journal), &mut ctx);
            let blocker = Box::new(Tracer { name: "O1", journal: journal.clone(), handles: true });
            stack.push_overlay(blocker, &mut ctx);
        }

        let mut event = key_event();
        stack.propagate_event(&mut event);
        assert!(event.is_handled());
        assert_eq!(filtered(&journal, ":event"), vec!["O1:event"]);
    }

    // ── popping ──────────────────────────────────────────────────────────

    #[test]
    fn pop_returns_ownership_after_detach() {
        let mut services = Services::headless();
        let journal = Journal::default();
        let mut stack = LayerStack::new();
        let (l1, o1) = {
            let mut ctx = services.ctx(FrameTime::initial());
            (
                stack.push_layer(Tracer::boxed("L1", &journal), &mut ctx),
                stack.push_overlay(Tracer::boxed("O1", &journal), &mut ctx),
            )
        };

        // Wrong partition: no-op.
        assert!(stack.pop_overlay(l1).is_none());
        assert!(stack.pop_layer(o1).is_none());
        assert_eq!(stack.len(), 2);

        let popped = stack.pop_layer(l1).map(|l| l.name().to_string());
        assert_eq!(popped.as_deref(), Some("L1"));
        assert_eq!(stack.layer_count(), 0);
        assert_eq!(filtered(&journal, ":detach"), vec!["L1:detach"]);

        // Already gone: no-op.
        assert!(stack.pop_layer(l1).is_none());
    }

    struct FailsFirstDetach {
        failed: bool,
    }

    impl Layer for FailsFirstDetach {
        fn name(&self) -> &str {
            "fragile"
        }

        fn on_detach(&mut self) {
            if !self.failed {
                self.failed = true;
                panic!("detach failed");
            }
        }
    }

    #[test]
    fn layer_stays_in_the_stack_until_detach_returns() {
        let mut services = Services::headless();
        let journal = Journal::default();
        let mut stack = LayerStack::new();
        let fragile = {
            let mut ctx = services.ctx(FrameTime::initial());
            stack.push_layer(Tracer::boxed("L1", &journal), &mut ctx);
            stack.push_layer(Box::new(FailsFirstDetach { failed: false }), &mut ctx)
        };

        let attempt = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            stack.pop_layer(fragile).is_some()
        }));
        assert!(attempt.is_err());
        assert_eq!(stack.names(), vec!["L1", "fragile"]);
        assert_eq!(stack.layer_count(), 2);

        assert!(stack.pop_layer(fragile).is_some());
        assert_eq!(stack.names(), vec!["L1"]);
        assert_eq!(stack.layer_count(), 1);
    }

    #[test]
    fn dropping_the_stack_detaches_the_rest() {
        let mut services = Services::headless();
        let journal = Journal::default();
        let mut stack = LayerStack::new();
        {
            let mut ctx = services.ctx(FrameTime::initial());
            stack.push_layer(Tracer::boxed("L1", &journal), &mut ctx);
            stack.push_overlay(Tracer::boxed("O1", &journal), &mut ctx);
        }
        drop(stack);
        assert_eq!(filtered(&journal, ":detach"), vec!["O1:detach", "L1:detach"]);
    }
}

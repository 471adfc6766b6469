use bytemuck::{Pod, Zeroable};

/// Unique identifier for an entity in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u32);

/// A game event communicated from Rust to TypeScript as a flat f32 buffer.
/// Generic container: `kind` identifies the event, `a/b/c` carry payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GameEvent {
    pub kind: f32,
    pub a: f32,
    pub b: f32,
    pub c: f32,
}

impl GameEvent {
    pub const FLOATS: usize = 4;

    pub fn new(kind: f32, a: f32, b: f32, c: f32) -> Self {
        Self { kind, a, b, c }
    }

    /// An event with no payload.
    pub fn signal(kind: f32) -> Self {
        Self { kind, ..Self::default() }
    }
}

/// Text-to-speech collaborator.
///
/// Fire-and-forget: callers never learn whether the utterance was played,
/// and a failing synthesizer must not affect game state.
pub trait Speaker {
    fn speak(&mut self, text: &str);
}

impl Speaker for Vec<String> {
    fn speak(&mut self, text: &str) {
        self.push(text.to_owned());
    }
}

/// Bounded queue of utterances waiting to be handed to the browser.
/// When full, the oldest utterance is dropped.
#[derive(Debug, Clone)]
pub struct SpeechQueue {
    pending: Vec<String>,
    capacity: usize,
}

impl SpeechQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: Vec::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Take all queued utterances, oldest first.
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Speaker for SpeechQueue {
    fn speak(&mut self, text: &str) {
        if self.pending.len() >= self.capacity {
            let dropped = self.pending.remove(0);
            log::warn!("speech queue full, dropping {:?}", dropped);
        }
        self.pending.push(text.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speech_queue_drains_in_order() {
        let mut q = SpeechQueue::new(4);
        q.speak("一");
        q.speak("二");
        assert_eq!(q.len(), 2);
        assert_eq!(q.drain(), vec!["一".to_string(), "二".to_string()]);
        assert!(q.is_empty());
    }

    #[test]
    fn speech_queue_drops_oldest_when_full() {
        let mut q = SpeechQueue::new(2);
        q.speak("a");
        q.speak("b");
        q.speak("c");
        let spoken: Vec<&str> = q.iter().collect();
        assert_eq!(spoken, vec!["b", "c"]);
    }

    #[test]
    fn game_event_is_four_floats() {
        assert_eq!(std::mem::size_of::<GameEvent>(), GameEvent::FLOATS * 4);
        let ev = GameEvent::signal(3.0);
        assert_eq!(bytemuck::cast::<GameEvent, [f32; 4]>(ev), [3.0, 0.0, 0.0, 0.0]);
    }
}

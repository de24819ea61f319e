//! Outbound notifications for the hosting application.

use crossbeam_channel::{Receiver, Sender};
use glam::Vec3;

/// Transient hover state reported at the pointer position.
#[derive(Clone, Debug, PartialEq)]
pub struct HoverEvent {
    pub label: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RendererEvent {
    CameraChanged { eye: Vec3, center: Vec3, up: Vec3 },
    Hover(Option<HoverEvent>),
    LoadingFinished,
}

/// Multi-consumer event stream; every subscriber sees every event.
pub struct EventBus {
    subscribers: Vec<Sender<RendererEvent>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self) -> Receiver<RendererEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Delivers to all live subscribers and forgets disconnected ones.
    pub fn emit(&mut self, event: RendererEvent) {
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subscriber_receives_events() {
        let mut bus = EventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();
        bus.emit(RendererEvent::LoadingFinished);
        assert_eq!(a.try_recv(), Ok(RendererEvent::LoadingFinished));
        assert_eq!(b.try_recv(), Ok(RendererEvent::LoadingFinished));
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut bus = EventBus::new();
        let a = bus.subscribe();
        drop(bus.subscribe());
        bus.emit(RendererEvent::Hover(None));
        assert_eq!(bus.subscribers.len(), 1);
        assert_eq!(a.try_recv(), Ok(RendererEvent::Hover(None)));
    }
}

//! Background loads on the rayon pool, delivered back to the render thread.

use crossbeam_channel::{unbounded, Receiver, Sender};

struct Delivery<T> {
    generation: u64,
    result: anyhow::Result<T>,
}

/// One class of asynchronous resource. Each `request` supersedes the
/// previous ones; results of superseded requests are dropped on `poll`.
pub struct Loader<T> {
    name: &'static str,
    generation: u64,
    in_flight: usize,
    tx: Sender<Delivery<T>>,
    rx: Receiver<Delivery<T>>,
}

impl<T: Send + 'static> Loader<T> {
    pub fn new(name: &'static str) -> Self {
        let (tx, rx) = unbounded();
        Self {
            name,
            generation: 0,
            in_flight: 0,
            tx,
            rx,
        }
    }

    /// Runs `load` on the rayon pool and returns its generation.
    pub fn request<F>(&mut self, load: F) -> u64
    where
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    {
        self.generation += 1;
        self.in_flight += 1;
        let generation = self.generation;
        let tx = self.tx.clone();
        log::debug!("{} load #{} requested", self.name, generation);
        rayon::spawn(move || {
            let result = load();
            // The receiver only goes away with the renderer.
            let _ = tx.send(Delivery { generation, result });
        });
        generation
    }

    /// Latest finished result, if any. Failures are logged and yield `None`.
    pub fn poll(&mut self) -> Option<T> {
        let mut latest = None;
        while let Ok(delivery) = self.rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            if delivery.generation != self.generation {
                log::debug!(
                    "{} load #{} superseded by #{}",
                    self.name,
                    delivery.generation,
                    self.generation
                );
                continue;
            }
            match delivery.result {
                Ok(value) => latest = Some(value),
                Err(e) => log::error!("{} load failed: {:#}", self.name, e),
            }
        }
        latest
    }

    /// Whether any request has not been delivered yet.
    pub fn is_pending(&self) -> bool {
        self.in_flight > 0
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_idle<T: Send + 'static>(loader: &mut Loader<T>) -> Option<T> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut last = None;
        while Instant::now() < deadline {
            if let Some(v) = loader.poll() {
                last = Some(v);
            }
            if !loader.is_pending() {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        last
    }

    #[test]
    fn delivers_result() {
        let mut loader = Loader::new("test");
        loader.request(|| Ok(7u32));
        assert_eq!(wait_idle(&mut loader), Some(7));
    }

    #[test]
    fn stale_results_are_dropped() {
        let mut loader = Loader::new("test");
        let (gate_tx, gate_rx) = unbounded::<()>();
        loader.request(move || {
            let _ = gate_rx.recv_timeout(Duration::from_secs(5));
            Ok(1u32)
        });
        loader.request(|| Ok(2u32));
        drop(gate_tx);
        assert_eq!(wait_idle(&mut loader), Some(2));
        assert_eq!(loader.generation(), 2);
    }

    #[test]
    fn failures_yield_nothing() {
        let mut loader: Loader<u32> = Loader::new("test");
        loader.request(|| Err(anyhow::anyhow!("boom")));
        assert_eq!(wait_idle(&mut loader), None);
        assert!(!loader.is_pending());
    }
}

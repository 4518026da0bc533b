use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Keeps the most recent `cap` bytes pushed into it. Shared between the stderr relay
/// and the session through the `Arc` returned by [`RingBytes::new`].
pub struct RingBytes {
    inner: Mutex<VecDeque<u8>>,
    cap: usize,
}

impl RingBytes {
    pub fn new(cap: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(VecDeque::with_capacity(cap)),
            cap,
        })
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<u8>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push(&self, data: &[u8]) {
        if self.cap == 0 {
            return;
        }
        let mut g = self.lock();
        let data = if data.len() > self.cap {
            &data[data.len() - self.cap..]
        } else {
            data
        };
        let overflow = g.len().saturating_add(data.len()).saturating_sub(self.cap);
        if overflow > 0 {
            g.drain(..overflow);
        }
        g.extend(data);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let g = self.lock();
        let mut vec = Vec::with_capacity(g.len());
        vec.extend(g.iter().copied());
        vec
    }

    pub fn tail_lossy(&self) -> String {
        String::from_utf8_lossy(&self.to_bytes()).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_newest_bytes() {
        let ring = RingBytes::new(5);
        ring.push(b"abc");
        ring.push(b"defg");
        assert_eq!(ring.to_bytes(), b"cdefg");

        ring.push(b"0123456789");
        assert_eq!(ring.tail_lossy(), "56789");
    }

    #[test]
    fn clones_of_the_handle_share_one_buffer() {
        let ring = RingBytes::new(8);
        let writer = Arc::clone(&ring);
        writer.push(b"tail");
        assert_eq!(ring.tail_lossy(), "tail");
        assert_eq!(Arc::strong_count(&ring), 2);
    }

    #[test]
    fn zero_capacity_stays_empty() {
        let ring = RingBytes::new(0);
        ring.push(b"ignored");
        assert!(ring.to_bytes().is_empty());
    }
}

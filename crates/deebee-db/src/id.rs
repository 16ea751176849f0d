use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use bson::oid::ObjectId;

/// Hands out strictly increasing `ObjectId`s.
///
/// Layout: 4-byte big-endian seconds, then an 8-byte big-endian counter
/// seeded randomly. Seconds never go backwards even if the clock does, and
/// a counter wrap carries into the seconds, so ids sort in the order they
/// were generated.
pub(crate) struct IdGenerator {
    state: Mutex<IdState>,
}

struct IdState {
    secs: u32,
    counter: u64,
}

impl IdGenerator {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(IdState {
                secs: 0,
                counter: u64::from(rand::random::<u32>()),
            }),
        }
    }

    pub(crate) fn next_id(&self) -> ObjectId {
        // The state stays valid even if a holder panicked.
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        state.secs = state.secs.max(now_secs());
        state.counter = state.counter.wrapping_add(1);
        if state.counter == 0 {
            state.secs = state.secs.wrapping_add(1);
        }

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&state.secs.to_be_bytes());
        bytes[4..].copy_from_slice(&state.counter.to_be_bytes());
        ObjectId::from_bytes(bytes)
    }
}

fn now_secs() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_strictly_increase() {
        let ids = IdGenerator::new();
        let mut prev = ids.next_id();
        for _ in 0..1000 {
            let next = ids.next_id();
            assert!(next.bytes() > prev.bytes());
            prev = next;
        }
    }

    #[test]
    fn counter_wrap_carries_into_seconds() {
        let ids = IdGenerator::new();
        let start = now_secs();
        {
            let mut state = ids.state.lock().unwrap();
            state.secs = start;
            state.counter = u64::MAX - 1;
        }
        let last = ids.next_id();
        let wrapped = ids.next_id();
        assert_eq!(&wrapped.bytes()[4..], &[0u8; 8]);
        assert!(wrapped.bytes() > last.bytes());
        let secs = u32::from_be_bytes(wrapped.bytes()[..4].try_into().unwrap());
        assert!(secs > start);
    }
}

use crate::error::{ConfigError, StoreResult};
use crate::history::HistoryStore;
use crate::sample::Sample;

/// Fixed-capacity ring buffer.
///
/// `slots` never grows. `head` indexes the oldest sample; the newest lives
/// at `(head + len - 1) % capacity`.
pub struct MemoryHistory {
    slots: Vec<Option<Sample>>,
    head: usize,
    len: usize,
}

impl MemoryHistory {
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(Self {
            slots: vec![None; capacity],
            head: 0,
            len: 0,
        })
    }

    fn slot(&self, offset: usize) -> usize {
        (self.head + offset) % self.slots.len()
    }
}

impl HistoryStore for MemoryHistory {
    fn append(&mut self, sample: Sample) -> StoreResult<()> {
        let capacity = self.slots.len();
        if self.len < capacity {
            let idx = self.slot(self.len);
            self.slots[idx] = Some(sample);
            self.len += 1;
        } else {
            // Full: overwrite the oldest and advance head.
            self.slots[self.head] = Some(sample);
            self.head = (self.head + 1) % capacity;
        }
        Ok(())
    }

    fn read_recent(&self, n: usize) -> StoreResult<Vec<Sample>> {
        let take = n.min(self.len);
        Ok((self.len - take..self.len)
            .filter_map(|offset| self.slots[self.slot(offset)].clone())
            .collect())
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.len)
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

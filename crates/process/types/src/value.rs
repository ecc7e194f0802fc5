//! Double-buffered value cells
//!
//! A cell has a public slot and a pending slot. While the cell is locked
//! (the owning graph is running) writes are staged and only surface on
//! [`ValueCell::commit`], which the scheduler runs at the start of a tick.
//! Every task therefore reads the state committed at the end of the
//! previous tick, whatever order the tasks execute in.

use serde::{Deserialize, Serialize};

/// Arbitrary data carried by a value cell
pub type Payload = serde_json::Value;

/// A buffered value with generation tracking
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValueCell {
    current: Payload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pending: Option<Payload>,
    generation: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    changed_at: Option<u64>,
    #[serde(default)]
    locked: bool,
}

impl ValueCell {
    pub fn new(initial: impl Into<Payload>) -> Self {
        Self {
            current: initial.into(),
            pending: None,
            generation: 0,
            changed_at: None,
            locked: false,
        }
    }

    /// The publicly visible payload
    pub fn get(&self) -> &Payload {
        &self.current
    }

    /// The staged payload, if a write is waiting for commit
    pub fn pending(&self) -> Option<&Payload> {
        self.pending.as_ref()
    }

    /// Write a payload.
    ///
    /// Locked cells stage the write; unlocked cells apply it directly.
    pub fn set(&mut self, value: impl Into<Payload>) {
        let value = value.into();
        if self.locked {
            self.pending = Some(value);
        } else {
            if value != self.current {
                self.generation += 1;
            }
            self.current = value;
        }
    }

    /// Promote the staged write.
    ///
    /// The generation only advances when the staged payload differs from
    /// the current one. Returns `true` when the visible value changed.
    pub fn commit(&mut self, epoch: u64) -> bool {
        match self.pending.take() {
            Some(value) if value != self.current => {
                self.current = value;
                self.generation += 1;
                self.changed_at = Some(epoch);
                true
            }
            _ => false,
        }
    }

    /// A write happened since the last commit while the cell was locked
    pub fn is_modified(&self) -> bool {
        self.pending.is_some()
    }

    /// The visible value changed during the commit pass of `epoch`
    pub fn changed_in(&self, epoch: u64) -> bool {
        self.changed_at == Some(epoch)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }
}

impl Default for ValueCell {
    fn default() -> Self {
        Self::new(Payload::Null)
    }
}

/// Cells compare by content, not identity
impl PartialEq for ValueCell {
    fn eq(&self, other: &Self) -> bool {
        self.current == other.current
    }
}

/// Coerce a payload to an integer index.
///
/// `null` is 0, integers pass through (large unsigned values saturate),
/// floats truncate toward zero, booleans are 0/1 and numeric strings are
/// parsed the same way. Anything else is 0.
pub fn coerce_index(payload: &Payload) -> i64 {
    match payload {
        Payload::Null => 0,
        Payload::Bool(b) => i64::from(*b),
        Payload::Number(n) => number_to_index(n),
        Payload::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(truncate))
                .unwrap_or(0)
        }
        Payload::Array(_) | Payload::Object(_) => 0,
    }
}

fn number_to_index(n: &serde_json::Number) -> i64 {
    if let Some(i) = n.as_i64() {
        i
    } else if let Some(u) = n.as_u64() {
        i64::try_from(u).unwrap_or(i64::MAX)
    } else {
        n.as_f64().map(truncate).unwrap_or(0)
    }
}

fn truncate(f: f64) -> i64 {
    if f.is_nan() {
        0
    } else {
        // `as` saturates at the i64 bounds
        f.trunc() as i64
    }
}

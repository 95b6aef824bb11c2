use std::collections::HashMap;

/// Marker for "no child with that byte".
pub const UNKNOWN: u32 = u32::MAX;

/// Dictionaries at or below this capacity use the dense array layout.
const DENSE_LIMIT: u32 = 8192;

/// Encoder-side LZW dictionary: for each code, the successor code reached
/// by appending one byte.
///
/// Lookups must be O(1) because the match searcher walks one child link per
/// input byte. For GIF-sized dictionaries (4096 codes) a flat
/// `code * 256 + byte` array is used; resetting it is a generation-counter
/// bump rather than a 1 MiB clear, since the optimizer re-initializes the
/// dictionary once per evaluated block start. Above 8192 codes (.Z, 65536)
/// the array would cost ~100 MiB, so a hash map takes over.
///
/// Links are never overwritten: non-greedy parsing can re-walk a prefix
/// whose longer extension was already added, so the earliest-added child
/// must survive.
pub struct ChildTable {
    repr: Repr,
}

enum Repr {
    Dense { children: Vec<u32>, stamps: Vec<u32>, generation: u32 },
    Sparse { children: HashMap<u32, u32> },
}

impl ChildTable {
    /// `capacity` is the maximum number of codes (4096 for GIF, 65536 for .Z).
    pub fn new(capacity: u32) -> Self {
        let repr = if capacity <= DENSE_LIMIT {
            let slots = capacity as usize * 256;
            Repr::Dense { children: vec![0; slots], stamps: vec![0; slots], generation: 1 }
        } else {
            Repr::Sparse { children: HashMap::new() }
        };
        Self { repr }
    }

    /// Forget every link (a dictionary restart).
    pub fn reset(&mut self) {
        match &mut self.repr {
            Repr::Dense { stamps, generation, .. } => {
                *generation += 1;
                if *generation == 0 {
                    stamps.fill(0);
                    *generation = 1;
                }
            }
            Repr::Sparse { children } => children.clear(),
        }
    }

    /// The code for `code` extended by `byte`, or `UNKNOWN`.
    #[inline]
    pub fn child(&self, code: u32, byte: u8) -> u32 {
        match &self.repr {
            Repr::Dense { children, stamps, generation } => {
                let slot = (code as usize) * 256 + byte as usize;
                if stamps[slot] == *generation {
                    children[slot]
                } else {
                    UNKNOWN
                }
            }
            Repr::Sparse { children } => {
                *children.get(&((code << 8) | byte as u32)).unwrap_or(&UNKNOWN)
            }
        }
    }

    /// Link `code` + `byte` to `child` unless a link already exists.
    #[inline]
    pub fn link(&mut self, code: u32, byte: u8, child: u32) {
        match &mut self.repr {
            Repr::Dense { children, stamps, generation } => {
                let slot = (code as usize) * 256 + byte as usize;
                if stamps[slot] != *generation {
                    stamps[slot] = *generation;
                    children[slot] = child;
                }
            }
            Repr::Sparse { children } => {
                children.entry((code << 8) | byte as u32).or_insert(child);
            }
        }
    }
}

use std::cell::Cell;

/// Monotonic source of list-item identities. One per form; never reset, or
/// items created before and after the reset could share a key.
#[derive(Debug)]
pub struct UidGenerator {
    seed: String,
    counter: Cell<u64>,
}

impl UidGenerator {
    pub fn new(seed: impl Into<String>) -> Self {
        Self { seed: seed.into(), counter: Cell::new(0) }
    }

    pub fn next(&self) -> String {
        let n = self.counter.get();
        self.counter.set(n + 1);
        format!("{}.{n}", self.seed)
    }

    pub fn seed(&self) -> &str { &self.seed }
}

impl Default for UidGenerator {
    fn default() -> Self { Self::new("root") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_seeded() {
        let g = UidGenerator::new("f");
        let a = g.next();
        let b = g.next();
        assert_eq!(a, "f.0");
        assert_eq!(b, "f.1");
    }
}

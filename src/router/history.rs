// Navigation history
//
// Numan Thabit 2025 Nov

/// Stack of visited locations with a cursor, like a browser session history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    entries: Vec<String>,
    index: usize,
}

impl History {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: vec![initial.into()],
            index: 0,
        }
    }

    pub fn current(&self) -> &str {
        &self.entries[self.index]
    }

    /// Entries after the cursor are discarded.
    pub fn push(&mut self, location: impl Into<String>) {
        self.entries.truncate(self.index + 1);
        self.entries.push(location.into());
        self.index = self.entries.len() - 1;
    }

    pub fn replace(&mut self, location: impl Into<String>) {
        self.entries[self.index] = location.into();
    }

    /// Move the cursor by `delta`; out of range moves are ignored.
    pub fn go(&mut self, delta: isize) -> bool {
        let target = self.index as isize + delta;
        if target < 0 || target >= self.entries.len() as isize {
            return false;
        }
        self.index = target as usize;
        true
    }

    pub fn back(&mut self) -> bool {
        self.go(-1)
    }

    pub fn forward(&mut self) -> bool {
        self.go(1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_truncates_forward_entries() {
        let mut history = History::new("/");
        history.push("/transfers");
        assert!(history.back());
        assert_eq!(history.current(), "/");

        history.push("/?draft=1");
        assert!(!history.forward());
        assert_eq!(history.len(), 2);
        assert_eq!(history.current(), "/?draft=1");
    }

    #[test]
    fn go_ignores_out_of_range() {
        let mut history = History::new("/");
        assert!(!history.back());
        assert!(!history.go(3));
        history.replace("/transfers");
        assert_eq!(history.current(), "/transfers");
        assert_eq!(history.len(), 1);
    }
}

/// Text messages that have been started in the outward stream but not yet ended
#[derive(Debug, Default, Clone)]
pub struct TextSegments {
    open: Vec<String>,
}

impl TextSegments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open<S: Into<String>>(&mut self, id: S) {
        let id = id.into();
        if !self.open.contains(&id) {
            self.open.push(id);
        }
    }

    pub fn close(&mut self, id: &str) {
        self.open.retain(|open| open != id);
    }

    /// Close every open segment, returning their ids in the order they were opened
    pub fn close_all(&mut self) -> Vec<String> {
        std::mem::take(&mut self.open)
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}

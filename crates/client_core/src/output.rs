//! Append-only status panel.

/// Receives human-readable status lines. Front ends render each line as it
/// arrives and keep the newest one in view.
pub trait OutputLog {
    fn append(&mut self, line: &str);
    fn clear(&mut self);
}

#[derive(Debug, Default, Clone)]
pub struct MemoryLog {
    lines: Vec<String>,
}

impl MemoryLog {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    pub fn contains(&self, line: &str) -> bool {
        self.lines.iter().any(|l| l == line)
    }
}

impl OutputLog for MemoryLog {
    fn append(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn clear(&mut self) {
        self.lines.clear();
    }
}

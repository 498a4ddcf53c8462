use log::info;

// Longest line held before it is forced out
const LINE_LIMIT: usize = 256;

/// Line buffer behind the EE `kputchar` register
#[derive(Debug, Default)]
pub struct Console {
    line: String,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one character; returns the finished line on newline
    pub fn put(&mut self, byte: u8) -> Option<String> {
        match byte {
            b'\n' => Some(self.flush_line()),
            b'\r' | 0 => None,
            _ => {
                self.line.push(byte as char);
                if self.line.len() >= LINE_LIMIT {
                    Some(self.flush_line())
                } else {
                    None
                }
            }
        }
    }

    pub fn pending(&self) -> &str {
        &self.line
    }

    /// Emits whatever is buffered, used on reset and shutdown
    pub fn flush(&mut self) {
        if !self.line.is_empty() {
            self.flush_line();
        }
    }

    fn flush_line(&mut self) -> String {
        let line = std::mem::take(&mut self.line);
        info!(target: "kputchar", "{}", line);
        line
    }
}

#[cfg(test)]
mod console_tests {
    use super::*;

    #[test]
    fn test_line_buffering() {
        let mut console = Console::new();
        let out: Vec<String> = b"ok\r\nboot\n".iter().filter_map(|&b| console.put(b)).collect();
        assert_eq!(out, vec!["ok".to_string(), "boot".to_string()]);
        assert_eq!(console.pending(), "");
    }

    #[test]
    fn test_long_line_is_split() {
        let mut console = Console::new();
        let lines = (0..LINE_LIMIT + 3).filter_map(|_| console.put(b'x')).count();
        assert_eq!(lines, 1);
        assert_eq!(console.pending(), "xxx");
        console.flush();
        assert_eq!(console.pending(), "");
    }
}

/// Pulls complete top-level items out of a JSON array that arrives in pieces
///
/// Only objects nested directly in the outer array are reported; the text of each
/// is returned verbatim once its closing brace arrives.
#[derive(Debug, Default)]
pub struct ArrayItemScanner {
    item: String,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl ArrayItemScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: &str) -> Vec<String> {
        let mut items = Vec::new();

        for ch in text.chars() {
            // Inside an item (outer array is depth 1)
            if self.depth >= 2 {
                self.item.push(ch);
            }

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if ch == '\\' {
                    self.escaped = true;
                } else if ch == '"' {
                    self.in_string = false;
                }
                continue;
            }

            match ch {
                '"' => self.in_string = true,
                '[' | '{' => {
                    self.depth += 1;
                    if self.depth == 2 {
                        self.item.clear();
                        self.item.push(ch);
                    }
                }
                ']' | '}' => {
                    if self.depth == 2 {
                        let item = std::mem::take(&mut self.item);
                        if item.starts_with('{') {
                            items.push(item);
                        }
                    }
                    self.depth = self.depth.saturating_sub(1);
                }
                _ => {}
            }
        }

        items
    }
}

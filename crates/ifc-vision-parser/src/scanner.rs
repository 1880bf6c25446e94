// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fast entity scanner using SIMD-accelerated byte searching
//!
//! Walks the DATA section to find entity instances without decoding them.
//! The scanner exposes its byte position so callers can report progress.

use memchr::memchr;

/// One entity instance located by the scanner
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntitySpan<'a> {
    pub id: u32,
    pub type_name: &'a str,
    /// Byte offset of the leading `#`
    pub start: usize,
    /// Byte offset just past the terminating `;`
    pub end: usize,
}

/// Fast entity scanner for IFC files
pub struct EntityScanner<'a> {
    content: &'a str,
    pos: usize,
}

impl<'a> EntityScanner<'a> {
    /// Create a scanner positioned at the start of the DATA section
    pub fn new(content: &'a str) -> Self {
        let pos = content.find("DATA;").map(|p| p + 5).unwrap_or(0);
        Self { content, pos }
    }

    /// Current byte offset into the content
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total byte length of the content
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Scan to the next entity instance
    pub fn next_entity(&mut self) -> Option<EntitySpan<'a>> {
        let bytes = self.content.as_bytes();

        while self.pos < bytes.len() {
            let hash_pos = memchr(b'#', &bytes[self.pos..])?;
            self.pos += hash_pos;

            // Instance definitions start a line or follow a terminator;
            // anything else is a reference inside an attribute list
            let at_boundary = self.pos == 0
                || matches!(bytes[self.pos - 1], b'\n' | b'\r' | b';' | b' ' | b'\t');
            if !at_boundary {
                self.pos += 1;
                continue;
            }

            let start = self.pos;
            self.pos += 1;

            let id_start = self.pos;
            while self.pos < bytes.len() && bytes[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
            if self.pos == id_start {
                continue;
            }
            let Ok(id) = self.content[id_start..self.pos].parse::<u32>() else {
                continue;
            };

            self.skip_blanks();
            if self.pos >= bytes.len() || bytes[self.pos] != b'=' {
                continue;
            }
            self.pos += 1;
            self.skip_blanks();

            let type_start = self.pos;
            while self.pos < bytes.len()
                && (bytes[self.pos].is_ascii_alphanumeric() || bytes[self.pos] == b'_')
            {
                self.pos += 1;
            }
            if self.pos == type_start {
                continue;
            }
            let type_name = &self.content[type_start..self.pos];

            let end = self.find_entity_end()?;
            return Some(EntitySpan {
                id,
                type_name,
                start,
                end,
            });
        }

        None
    }

    fn skip_blanks(&mut self) {
        let bytes = self.content.as_bytes();
        while self.pos < bytes.len() && (bytes[self.pos] == b' ' || bytes[self.pos] == b'\t') {
            self.pos += 1;
        }
    }

    /// Find the terminating semicolon, skipping quoted strings
    fn find_entity_end(&mut self) -> Option<usize> {
        let bytes = self.content.as_bytes();
        let mut in_string = false;

        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b'\'' => {
                    // '' is an escaped quote inside a string
                    if in_string && self.pos + 1 < bytes.len() && bytes[self.pos + 1] == b'\'' {
                        self.pos += 2;
                        continue;
                    }
                    in_string = !in_string;
                }
                b';' if !in_string => {
                    self.pos += 1;
                    return Some(self.pos);
                }
                _ => {}
            }
            self.pos += 1;
        }

        None
    }

    /// Count entity instances in the content
    pub fn entity_count(content: &'a str) -> usize {
        let mut scanner = Self::new(content);
        let mut count = 0;
        while scanner.next_entity().is_some() {
            count += 1;
        }
        count
    }
}

impl<'a> Iterator for EntityScanner<'a> {
    type Item = EntitySpan<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entity()
    }
}

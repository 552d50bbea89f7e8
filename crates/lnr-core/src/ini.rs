//! Minimal INI codec for the secrets and settings files.
//!
//! Format:
//!   # comment            (also `;`)
//!   [section name]
//!   key = value
//!
//! Section and key order is preserved on round-trip; comments are not.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("line {line}: {reason}")]
pub struct IniError {
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    entries: Vec<(String, String)>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Section {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Insert or replace `key`. Existing key order is preserved.
    pub fn set(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| k != key);
        self.entries.len() != before
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Control characters (newlines included) would split or reshape a line.
fn check_single_line(line: usize, what: &str, text: &str) -> Result<(), IniError> {
    if text.chars().any(char::is_control) {
        return Err(IniError {
            line,
            reason: format!("{what} contains a control character: '{}'", text.escape_debug()),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    sections: Vec<Section>,
}

impl IniDocument {
    pub fn parse(content: &str) -> Result<Self, IniError> {
        let mut doc = IniDocument::default();
        let mut current: Option<String> = None;
        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(rest) = line.strip_prefix('[') {
                let Some(name) = rest.strip_suffix(']') else {
                    return Err(IniError {
                        line: line_no,
                        reason: "unterminated section header".to_string(),
                    });
                };
                let name = name.trim();
                if name.is_empty() {
                    return Err(IniError {
                        line: line_no,
                        reason: "empty section name".to_string(),
                    });
                }
                // Repeated headers merge into the first occurrence.
                if doc.section(name).is_none() {
                    doc.sections.push(Section::new(name));
                }
                current = Some(name.to_string());
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(IniError {
                    line: line_no,
                    reason: format!("expected 'key = value', got '{line}'"),
                });
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(IniError {
                    line: line_no,
                    reason: "empty key".to_string(),
                });
            }
            let Some(section) = current.as_deref() else {
                return Err(IniError {
                    line: line_no,
                    reason: format!("key '{key}' outside of any section"),
                });
            };
            doc.section_mut(section).set(key, value.trim());
        }
        Ok(doc)
    }

    /// Render the whole document. Fails instead of writing a name or value
    /// that would not parse back as a single line.
    pub fn render(&self) -> Result<String, IniError> {
        let mut out = String::new();
        let mut line = 0;
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                out.push('\n');
                line += 1;
            }
            line += 1;
            if section.name.contains(']') {
                return Err(IniError {
                    line,
                    reason: format!("section name '{}' contains ']'", section.name.escape_debug()),
                });
            }
            check_single_line(line, "section name", &section.name)?;
            out.push('[');
            out.push_str(&section.name);
            out.push_str("]\n");
            for (k, v) in section.entries() {
                line += 1;
                check_single_line(line, "key", k)?;
                if k.contains('=') {
                    return Err(IniError {
                        line,
                        reason: format!("key '{}' contains '='", k.escape_debug()),
                    });
                }
                check_single_line(line, &format!("value for '{k}'"), v)?;
                out.push_str(k);
                out.push_str(" = ");
                out.push_str(v);
                out.push('\n');
            }
        }
        Ok(out)
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Return the named section, appending an empty one if missing.
    pub fn section_mut(&mut self, name: &str) -> &mut Section {
        let idx = match self.sections.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                self.sections.push(Section::new(name));
                self.sections.len() - 1
            }
        };
        &mut self.sections[idx]
    }

    /// Replace the named section's entries wholesale.
    pub fn replace_section(&mut self, section: Section) {
        match self.sections.iter_mut().find(|s| s.name == section.name) {
            Some(existing) => *existing = section,
            None => self.sections.push(section),
        }
    }

    pub fn remove_section(&mut self, name: &str) -> bool {
        let before = self.sections.len();
        self.sections.retain(|s| s.name != name);
        self.sections.len() != before
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }
}

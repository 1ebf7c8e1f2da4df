//! # Output
//!
//! Plain-text tables for people, pretty JSON for scripts (`--json`).
//!
//! ```text
//! NUMBER             DATE        CUSTOMER             KG        TOTAL
//! SHP-20260710-001   2026-07-10  Anka Konfeksiyon     130.00 kg $585.00
//! ```

use serde::Serialize;
use std::fmt;

use crate::error::AppResult;

/// Where command results go.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Output { json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Prints `value` as JSON, or the text produced by `render`.
    pub fn emit<T, F>(&self, value: &T, render: F) -> AppResult<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce(&T) -> String,
    {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            let text = render(value);
            if text.ends_with('\n') {
                print!("{}", text);
            } else {
                println!("{}", text);
            }
        }
        Ok(())
    }

    /// Prints a one-line confirmation, or `value` as JSON.
    pub fn done<T: Serialize + ?Sized>(&self, value: &T, message: impl fmt::Display) -> AppResult<()> {
        self.emit(value, |_| message.to_string())
    }
}

// =============================================================================
// Table
// =============================================================================

/// Column-aligned text table.
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    right: Vec<bool>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Table {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            right: vec![false; headers.len()],
            rows: Vec::new(),
        }
    }

    /// Right-aligns the given columns (amounts, weights).
    pub fn align_right(mut self, columns: &[usize]) -> Self {
        for &c in columns {
            if let Some(flag) = self.right.get_mut(c) {
                *flag = true;
            }
        }
        self
    }

    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }
        widths
    }

    fn write_row(&self, f: &mut fmt::Formatter<'_>, cells: &[String], widths: &[usize]) -> fmt::Result {
        let mut line = String::new();
        for (i, width) in widths.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            if i > 0 {
                line.push_str("  ");
            }
            if self.right[i] {
                line.push_str(&format!("{:>width$}", cell, width = width));
            } else {
                line.push_str(&format!("{:<width$}", cell, width = width));
            }
        }
        writeln!(f, "{}", line.trim_end())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return writeln!(f, "(none)");
        }
        let widths = self.widths();
        self.write_row(f, &self.headers, &widths)?;
        for row in &self.rows {
            self.write_row(f, row, &widths)?;
        }
        Ok(())
    }
}

/// `-` for a missing optional value.
pub fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_alignment() {
        let mut table = Table::new(&["NAME", "KG"]).align_right(&[1]);
        table.row(vec!["Rib".to_string(), "5.00 kg".to_string()]);
        table.row(vec!["Interlock".to_string(), "120.00 kg".to_string()]);

        let text = table.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "NAME              KG");
        assert_eq!(lines[1], "Rib          5.00 kg");
        assert_eq!(lines[2], "Interlock  120.00 kg");
    }

    #[test]
    fn test_empty_table() {
        let table = Table::new(&["ID"]);
        assert!(table.is_empty());
        assert_eq!(table.to_string(), "(none)\n");
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(None), "-");
        assert_eq!(or_dash(Some("Navy")), "Navy");
    }
}

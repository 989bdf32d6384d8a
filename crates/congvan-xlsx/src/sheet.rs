//! In-memory worksheet model.

/// Maximum characters a single cell may hold in the xlsx format.
pub const MAX_CELL_CHARS: usize = 32_767;

pub const MIN_COLUMN_WIDTH: usize = 8;
pub const MAX_COLUMN_WIDTH: usize = 60;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
  Empty,
  Text(String),
  Int(i64),
}

impl Cell {
  /// Text cell, truncated to [`MAX_CELL_CHARS`]. Blank text becomes `Empty`.
  pub fn text(s: impl AsRef<str>) -> Self {
    let s = s.as_ref();
    if s.is_empty() {
      return Cell::Empty;
    }
    if s.chars().count() > MAX_CELL_CHARS {
      Cell::Text(s.chars().take(MAX_CELL_CHARS).collect())
    } else {
      Cell::Text(s.to_owned())
    }
  }

  pub fn opt_text(s: Option<&str>) -> Self { s.map_or(Cell::Empty, Cell::text) }

  /// Displayed length in characters.
  pub fn display_len(&self) -> usize {
    match self {
      Cell::Empty => 0,
      Cell::Text(s) => s.chars().count(),
      Cell::Int(n) => n.to_string().len(),
    }
  }
}

/// A single worksheet: one bold header row followed by data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
  pub name:    String,
  pub headers: Vec<String>,
  pub rows:    Vec<Vec<Cell>>,
}

impl Sheet {
  pub fn new(name: impl Into<String>, headers: &[&str]) -> Self {
    Self {
      name:    name.into(),
      headers: headers.iter().map(|h| (*h).to_owned()).collect(),
      rows:    Vec::new(),
    }
  }

  pub fn push_row(&mut self, row: Vec<Cell>) { self.rows.push(row); }

  /// Per-column width: longest header or cell plus padding, clamped to
  /// `[MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH]`.
  pub fn column_widths(&self) -> Vec<usize> {
    (0..self.headers.len())
      .map(|i| {
        let longest = self
          .rows
          .iter()
          .filter_map(|row| row.get(i))
          .map(Cell::display_len)
          .chain(std::iter::once(self.headers[i].chars().count()))
          .max()
          .unwrap_or(0);
        (longest + 2).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
      })
      .collect()
  }
}

/// Spreadsheet column letters: 0 → `A`, 25 → `Z`, 26 → `AA`.
pub fn column_name(mut index: usize) -> String {
  let mut name = Vec::new();
  loop {
    name.push(b'A' + (index % 26) as u8);
    if index < 26 {
      break;
    }
    index = index / 26 - 1;
  }
  name.reverse();
  String::from_utf8_lossy(&name).into_owned()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn long_text_is_truncated() {
    let long = "ồ".repeat(MAX_CELL_CHARS + 10);
    assert_eq!(Cell::text(&long).display_len(), MAX_CELL_CHARS);
  }

  #[test]
  fn widths_are_clamped() {
    let mut s = Sheet::new("S", &["A", "Nội dung"]);
    s.push_row(vec![Cell::Int(1), Cell::text("x".repeat(500))]);
    assert_eq!(s.column_widths(), vec![MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH]);
  }

  #[test]
  fn widths_follow_longest_value() {
    let mut s = Sheet::new("S", &["Tên"]);
    s.push_row(vec![Cell::text("Nguyễn Văn An")]);
    assert_eq!(s.column_widths(), vec![15]);
  }

  #[test]
  fn column_names() {
    assert_eq!(column_name(0), "A");
    assert_eq!(column_name(13), "N");
    assert_eq!(column_name(26), "AA");
    assert_eq!(column_name(27), "AB");
  }
}

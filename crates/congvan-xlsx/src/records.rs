//! Mapping from records to export rows.

use congvan_core::record::Record;

use crate::sheet::{Cell, Sheet};

pub const SHEET_NAME: &str = "Công văn";

pub const HEADERS: [&str; 14] = [
  "STT",
  "Mã CV",
  "Loại đơn thư",
  "Tháng",
  "Năm",
  "Mã KH",
  "Tên KH",
  "Địa chỉ",
  "Nhân viên",
  "Nội dung",
  "Ghi chú",
  "Kết quả",
  "Ngày nhận",
  "Tình trạng",
];

/// One row per record, in the order given. `STT` is the 1-based position.
pub fn records_sheet(records: &[Record]) -> Sheet {
  let mut sheet = Sheet::new(SHEET_NAME, &HEADERS);
  for (i, r) in records.iter().enumerate() {
    sheet.push_row(vec![
      Cell::Int(i as i64 + 1),
      Cell::opt_text(r.code.as_deref()),
      Cell::opt_text(r.category.as_deref()),
      r.month.map_or(Cell::Empty, |m| Cell::Int(i64::from(m))),
      r.year.map_or(Cell::Empty, |y| Cell::Int(i64::from(y))),
      Cell::opt_text(r.customer_code.as_deref()),
      Cell::opt_text(r.name.as_deref()),
      Cell::opt_text(r.address.as_deref()),
      Cell::opt_text(r.staff.as_deref()),
      Cell::opt_text(r.content.as_deref()),
      Cell::opt_text(r.notes.as_deref()),
      Cell::opt_text(r.result.as_deref()),
      r.received_date
        .map_or(Cell::Empty, |d| Cell::text(d.format("%d/%m/%Y").to_string())),
      Cell::text(&r.status),
    ]);
  }
  sheet
}

#[cfg(test)]
mod tests {
  use std::io::{Cursor, Read as _};

  use chrono::{NaiveDate, Utc};

  use super::*;
  use crate::export_records;

  fn record(id: i64) -> Record {
    Record {
      id,
      code: Some(format!("CV-{id}")),
      category: Some("Khiếu nại".into()),
      month: Some(1),
      year: Some(2025),
      customer_code: None,
      name: Some("Lê Thị Hoa".into()),
      address: None,
      staff: None,
      content: Some("x".repeat(40_000)),
      notes: None,
      result: None,
      received_date: NaiveDate::from_ymd_opt(2025, 1, 9),
      status: "Hoàn thành".into(),
      owner_id: None,
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  #[test]
  fn rows_follow_input_order() {
    let sheet = records_sheet(&[record(9), record(4)]);
    assert_eq!(sheet.rows.len(), 2);
    assert_eq!(sheet.rows[0][0], Cell::Int(1));
    assert_eq!(sheet.rows[0][1], Cell::Text("CV-9".into()));
    assert_eq!(sheet.rows[1][1], Cell::Text("CV-4".into()));
  }

  #[test]
  fn nulls_are_empty_and_dates_are_dmy() {
    let sheet = records_sheet(&[record(1)]);
    let row = &sheet.rows[0];
    assert_eq!(row[5], Cell::Empty);
    assert_eq!(row[12], Cell::Text("09/01/2025".into()));
    assert_eq!(row[13], Cell::Text("Hoàn thành".into()));
  }

  #[test]
  fn long_content_is_truncated_in_output() {
    let bytes = export_records(&[record(1)]).unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut xml = String::new();
    archive
      .by_name("xl/worksheets/sheet1.xml")
      .unwrap()
      .read_to_string(&mut xml)
      .unwrap();
    assert!(xml.contains(&"x".repeat(32_767)));
    assert!(!xml.contains(&"x".repeat(32_768)));
    assert!(xml.contains("Lê Thị Hoa"));
  }
}

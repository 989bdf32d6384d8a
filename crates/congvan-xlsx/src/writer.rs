//! SpreadsheetML generation and zip packaging.

use std::io::{Cursor, Write as _};

use quick_xml::{
  Writer,
  events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};
use zip::{ZipWriter, write::SimpleFileOptions};

use crate::{
  Error, Result,
  sheet::{Cell, Sheet, column_name},
};

// ─── Namespaces ──────────────────────────────────────────────────────────────

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

// ─── Static parts ────────────────────────────────────────────────────────────

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

/// Style 0 is the default; style 1 is bold (header row).
const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs></styleSheet>"#;

const HEADER_STYLE: &str = "1";

// ─── Entry point ─────────────────────────────────────────────────────────────

/// Serialise `sheet` into the bytes of an `.xlsx` file.
pub fn write_xlsx(sheet: &Sheet) -> Result<Vec<u8>> {
  let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
  let options =
    SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

  let parts: [(&str, Vec<u8>); 6] = [
    ("[Content_Types].xml", CONTENT_TYPES.as_bytes().to_vec()),
    ("_rels/.rels", ROOT_RELS.as_bytes().to_vec()),
    ("xl/workbook.xml", workbook_xml(&sheet.name)?),
    ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.as_bytes().to_vec()),
    ("xl/styles.xml", STYLES.as_bytes().to_vec()),
    ("xl/worksheets/sheet1.xml", worksheet_xml(sheet)?),
  ];

  for (name, body) in parts {
    zip.start_file(name, options)?;
    zip.write_all(&body)?;
  }

  Ok(zip.finish()?.into_inner())
}

// ─── Dynamic parts ───────────────────────────────────────────────────────────

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn new_writer() -> Result<XmlWriter> {
  let mut w = Writer::new(Cursor::new(Vec::new()));
  emit(&mut w, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
  Ok(w)
}

fn emit(w: &mut XmlWriter, event: Event<'_>) -> Result<()> {
  w.write_event(event).map_err(|e| Error::Xml(e.to_string()))
}

fn start(w: &mut XmlWriter, tag: &str, attrs: &[(&str, &str)]) -> Result<()> {
  let mut el = BytesStart::new(tag);
  for (k, v) in attrs {
    el.push_attribute((*k, *v));
  }
  emit(w, Event::Start(el))
}

fn end(w: &mut XmlWriter, tag: &str) -> Result<()> {
  emit(w, Event::End(BytesEnd::new(tag)))
}

fn empty(w: &mut XmlWriter, tag: &str, attrs: &[(&str, &str)]) -> Result<()> {
  let mut el = BytesStart::new(tag);
  for (k, v) in attrs {
    el.push_attribute((*k, *v));
  }
  emit(w, Event::Empty(el))
}

fn text(w: &mut XmlWriter, s: &str) -> Result<()> {
  emit(w, Event::Text(BytesText::new(&strip_control(s))))
}

/// XML 1.0 forbids most C0 control characters even when escaped.
fn strip_control(s: &str) -> String {
  s.chars()
    .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
    .collect()
}

/// Sheet names may not contain `[]:*?/\` and are limited to 31 characters.
fn sanitize_sheet_name(name: &str) -> String {
  let cleaned: String = name
    .chars()
    .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
    .take(31)
    .collect();
  if cleaned.trim().is_empty() { "Sheet1".to_owned() } else { cleaned }
}

fn workbook_xml(sheet_name: &str) -> Result<Vec<u8>> {
  let mut w = new_writer()?;
  start(&mut w, "workbook", &[("xmlns", NS_MAIN), ("xmlns:r", NS_REL)])?;
  start(&mut w, "sheets", &[])?;
  empty(&mut w, "sheet", &[
    ("name", sanitize_sheet_name(sheet_name).as_str()),
    ("sheetId", "1"),
    ("r:id", "rId1"),
  ])?;
  end(&mut w, "sheets")?;
  end(&mut w, "workbook")?;
  Ok(w.into_inner().into_inner())
}

fn worksheet_xml(sheet: &Sheet) -> Result<Vec<u8>> {
  let mut w = new_writer()?;
  start(&mut w, "worksheet", &[("xmlns", NS_MAIN), ("xmlns:r", NS_REL)])?;

  // Freeze the header row.
  start(&mut w, "sheetViews", &[])?;
  start(&mut w, "sheetView", &[("workbookViewId", "0")])?;
  empty(&mut w, "pane", &[
    ("ySplit", "1"),
    ("topLeftCell", "A2"),
    ("activePane", "bottomLeft"),
    ("state", "frozen"),
  ])?;
  end(&mut w, "sheetView")?;
  end(&mut w, "sheetViews")?;

  start(&mut w, "cols", &[])?;
  for (i, width) in sheet.column_widths().into_iter().enumerate() {
    let n = (i + 1).to_string();
    let width = width.to_string();
    empty(&mut w, "col", &[
      ("min", n.as_str()),
      ("max", n.as_str()),
      ("width", width.as_str()),
      ("customWidth", "1"),
    ])?;
  }
  end(&mut w, "cols")?;

  start(&mut w, "sheetData", &[])?;
  let header: Vec<Cell> = sheet.headers.iter().map(Cell::text).collect();
  write_row(&mut w, 1, &header, Some(HEADER_STYLE))?;
  for (i, row) in sheet.rows.iter().enumerate() {
    write_row(&mut w, i + 2, row, None)?;
  }
  end(&mut w, "sheetData")?;

  end(&mut w, "worksheet")?;
  Ok(w.into_inner().into_inner())
}

fn write_row(w: &mut XmlWriter, row_num: usize, cells: &[Cell], style: Option<&str>) -> Result<()> {
  let r = row_num.to_string();
  start(w, "row", &[("r", r.as_str())])?;
  for (col, cell) in cells.iter().enumerate() {
    let reference = format!("{}{r}", column_name(col));
    let mut attrs: Vec<(&str, &str)> = vec![("r", reference.as_str())];
    if let Some(s) = style {
      attrs.push(("s", s));
    }
    match cell {
      Cell::Empty => {}
      Cell::Int(n) => {
        start(w, "c", &attrs)?;
        start(w, "v", &[])?;
        text(w, &n.to_string())?;
        end(w, "v")?;
        end(w, "c")?;
      }
      Cell::Text(s) => {
        attrs.push(("t", "inlineStr"));
        start(w, "c", &attrs)?;
        start(w, "is", &[])?;
        start(w, "t", &[("xml:space", "preserve")])?;
        text(w, s)?;
        end(w, "t")?;
        end(w, "is")?;
        end(w, "c")?;
      }
    }
  }
  end(w, "row")
}

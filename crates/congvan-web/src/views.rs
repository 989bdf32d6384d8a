//! Server-rendered HTML.
//!
//! Pages are plain strings; every interpolated value goes through
//! [`escape`].

use axum::{
  http::StatusCode,
  response::{Html, IntoResponse, Response},
};
use congvan_core::{
  filter::{EMPTY_CATEGORY, FilterParams},
  page::Page,
  record::{Record, RecordInput},
  report::Report,
  status::Status,
  user::{Role, User},
};

use crate::flash::Flash;

const STYLE: &str = "body{font-family:sans-serif;margin:1.5rem;}\
table{border-collapse:collapse;margin:.5rem 0;}\
td,th{border:1px solid #ccc;padding:.25rem .5rem;text-align:left;vertical-align:top;}\
.flash{padding:.5rem;margin:.25rem 0;}\
.success{background:#e6f4ea;}.error{background:#fce8e6;}\
nav a{margin-right:1rem;}form.inline{display:inline;}\
.buckets{display:flex;gap:2rem;}";

/// Escape text for element content and quoted attributes.
pub fn escape(s: &str) -> String { quick_xml::escape::escape(s).into_owned() }

fn opt(v: &Option<String>) -> String { v.as_deref().map(escape).unwrap_or_default() }

/// `key=value&…` for the given pairs, percent-encoded.
pub fn query_string<'k, 'v>(pairs: impl IntoIterator<Item = (&'k str, &'v str)>) -> String {
  pairs
    .into_iter()
    .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
    .collect::<Vec<_>>()
    .join("&")
}

// ─── Layout ──────────────────────────────────────────────────────────────────

fn layout(title: &str, user: Option<&User>, flashes: &[Flash], body: &str) -> Html<String> {
  let nav = match user {
    Some(u) => {
      let admin = if u.is_admin() { r#"<a href="/users">Tài khoản</a>"# } else { "" };
      format!(
        r#"<nav><a href="/">Trang chủ</a>{admin}<span>{} ({})</span> <a href="/logout">Đăng xuất</a></nav>"#,
        escape(&u.username),
        u.role.as_str(),
      )
    }
    None => String::new(),
  };
  let flashes: String = flashes
    .iter()
    .map(|f| format!(r#"<div class="flash {}">{}</div>"#, f.level.as_str(), escape(&f.message)))
    .collect();

  Html(format!(
    "<!doctype html><html lang=\"vi\"><head><meta charset=\"utf-8\"><title>{}</title>\
     <style>{STYLE}</style></head><body>{nav}{flashes}<h1>{}</h1>{body}</body></html>",
    escape(title),
    escape(title),
  ))
}

pub fn error_page(status: StatusCode, message: &str) -> Response {
  let body = format!(r#"<p>{}</p><p><a href="/">Về trang chủ</a></p>"#, escape(message));
  let title = status.canonical_reason().unwrap_or("Lỗi");
  (status, layout(title, None, &[], &body)).into_response()
}

// ─── Login ───────────────────────────────────────────────────────────────────

pub fn login(flashes: &[Flash]) -> Html<String> {
  let body = r#"<form method="post" action="/login">
<p><label>Tên đăng nhập <input name="username" required autofocus></label></p>
<p><label>Mật khẩu <input name="password" type="password" required></label></p>
<p><button type="submit">Đăng nhập</button> <a href="/quick_login">Vào nhanh (nhân viên)</a></p>
</form>"#;
  layout("Đăng nhập", None, flashes, body)
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

pub struct Dashboard<'a> {
  pub user:       &'a User,
  pub flashes:    &'a [Flash],
  pub params:     &'a FilterParams,
  pub page:       &'a Page<Record>,
  pub report:     &'a Report,
  pub categories: &'a [String],
  /// Shown when a query failed and the page degraded to empty results.
  pub banner:     Option<&'a str>,
}

pub fn dashboard(d: &Dashboard<'_>) -> Html<String> {
  let mut body = String::new();

  if let Some(banner) = d.banner {
    body.push_str(&format!(r#"<div class="flash error">{}</div>"#, escape(banner)));
  }

  body.push_str(&filter_form(d.params, d.categories));

  let filters = query_string(d.params.pairs());
  body.push_str(&format!(
    r#"<p><a href="/export?{}">Xuất Excel</a>{}</p>"#,
    escape(&filters),
    if d.user.is_admin() { r#" | <a href="/congvan/new">Thêm công văn</a>"# } else { "" },
  ));

  body.push_str(&records_table(d.user, &d.page.items));
  body.push_str(&pagination(d.page, &filters));
  body.push_str(&buckets(d.report));
  body.push_str(&breakdown(d.report));

  layout("Quản lý công văn", Some(d.user), d.flashes, &body)
}

fn text_input(label: &str, name: &str, value: Option<&str>) -> String {
  format!(
    r#"<label>{label} <input name="{name}" value="{}"></label> "#,
    escape(value.unwrap_or_default()),
  )
}

fn filter_form(params: &FilterParams, categories: &[String]) -> String {
  let selected = |on: bool| if on { " selected" } else { "" };

  let current_category = params.category.as_deref().unwrap_or_default();
  let mut category_options = String::from(r#"<option value="">Tất cả</option>"#);
  for c in categories {
    category_options.push_str(&format!(
      r#"<option value="{0}"{1}>{0}</option>"#,
      escape(c),
      selected(current_category == c.as_str()),
    ));
  }
  category_options.push_str(&format!(
    r#"<option value="{EMPTY_CATEGORY}"{}>(Trống)</option>"#,
    selected(current_category == EMPTY_CATEGORY),
  ));

  let current_status = params.status.as_deref().and_then(Status::classify);
  let mut status_options = String::from(r#"<option value="">Tất cả</option>"#);
  for s in Status::ALL {
    status_options.push_str(&format!(
      r#"<option value="{}"{}>{}</option>"#,
      s.code(),
      selected(current_status == Some(s)),
      s.label(),
    ));
  }

  format!(
    r#"<form method="get" action="/"><p>{}{}{}<label>Loại đơn thư <select name="loai">{category_options}</select></label> </p><p>{}{}<label>Tình trạng <select name="tinh_trang">{status_options}</select></label> {}<button type="submit">Lọc</button> <a href="/">Xóa lọc</a></p></form>"#,
    text_input("Mã KH", "ma_kh", params.customer_code.as_deref()),
    text_input("Tên KH", "ten", params.name.as_deref()),
    text_input("Địa chỉ", "dia_chi", params.address.as_deref()),
    text_input("Tháng", "thang", params.month.as_deref()),
    text_input("Năm", "nam", params.year.as_deref()),
    text_input("Nội dung", "q", params.q.as_deref()),
  )
}

fn period(r: &Record) -> String {
  match (r.month, r.year) {
    (Some(m), Some(y)) => format!("{m:02}/{y}"),
    (Some(m), None) => format!("{m:02}"),
    (None, Some(y)) => y.to_string(),
    (None, None) => String::new(),
  }
}

fn date(r: &Record) -> String {
  r.received_date
    .map(|d| d.format("%d/%m/%Y").to_string())
    .unwrap_or_default()
}

fn delete_button(id: i64) -> String {
  format!(
    r#"<form class="inline" method="post" action="/congvan/{id}/delete" onsubmit="return confirm('Xóa công văn này?')"><button type="submit">Xóa</button></form>"#
  )
}

fn records_table(user: &User, records: &[Record]) -> String {
  if records.is_empty() {
    return "<p>Không có công văn nào.</p>".to_owned();
  }
  let mut rows = String::new();
  for r in records {
    let actions = if user.is_admin() {
      format!(r#" <a href="/congvan/{0}/edit">Sửa</a> {1}"#, r.id, delete_button(r.id))
    } else {
      String::new()
    };
    rows.push_str(&format!(
      r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><a href="/congvan/{}">Xem</a>{actions}</td></tr>"#,
      opt(&r.code),
      opt(&r.category),
      period(r),
      opt(&r.customer_code),
      opt(&r.name),
      opt(&r.address),
      opt(&r.staff),
      date(r),
      escape(&r.status),
      r.id,
    ));
  }
  format!(
    "<table><thead><tr><th>Mã CV</th><th>Loại đơn thư</th><th>Tháng/Năm</th><th>Mã KH</th>\
     <th>Tên KH</th><th>Địa chỉ</th><th>Nhân viên</th><th>Ngày nhận</th><th>Tình trạng</th>\
     <th></th></tr></thead><tbody>{rows}</tbody></table>"
  )
}

fn pagination(page: &Page<Record>, filters: &str) -> String {
  let link = |n: u32| {
    let sep = if filters.is_empty() { "" } else { "&" };
    format!("/?{}{sep}page={n}", filters)
  };
  let mut out = format!(
    "<p>Trang {}/{} ({} công văn)",
    page.page,
    page.pages(),
    page.total,
  );
  if page.has_prev() {
    out.push_str(&format!(r#" <a href="{}">« Trước</a>"#, escape(&link(page.page - 1))));
  }
  if page.has_next() {
    out.push_str(&format!(r#" <a href="{}">Sau »</a>"#, escape(&link(page.page + 1))));
  }
  out.push_str("</p>");
  out
}

fn bucket_list(title: &str, records: &[Record]) -> String {
  let items: String = records
    .iter()
    .map(|r| {
      format!(
        r#"<li><a href="/congvan/{}">{}</a> {}</li>"#,
        r.id,
        r.code.as_deref().map(escape).unwrap_or_else(|| format!("#{}", r.id)),
        opt(&r.name),
      )
    })
    .collect();
  format!("<section><h2>{title} ({})</h2><ul>{items}</ul></section>", records.len())
}

fn buckets(report: &Report) -> String {
  format!(
    r#"<div class="buckets">{}{}</div>"#,
    bucket_list(Status::ChuaThu.label(), &report.not_collected),
    bucket_list(Status::DangXuLy.label(), &report.in_progress),
  )
}

fn breakdown(report: &Report) -> String {
  let b = &report.breakdown;
  let Some((year, month)) = b.period else {
    return "<section><h2>Hoàn thành theo tháng</h2><p>Chưa có công văn hoàn thành.</p></section>"
      .to_owned();
  };
  let rows: String = b
    .by_category
    .iter()
    .map(|(category, n)| format!("<tr><td>{}</td><td>{n}</td></tr>", escape(category)))
    .collect();
  format!(
    "<section><h2>Hoàn thành tháng {month:02}/{year}</h2>\
     <table><thead><tr><th>Loại đơn thư</th><th>Hoàn thành</th></tr></thead><tbody>{rows}</tbody></table>\
     <p>Đã hoàn thành {} / {} công văn trong tháng.</p></section>",
    b.month_completed, b.month_total,
  )
}

// ─── Records ─────────────────────────────────────────────────────────────────

pub fn record_form(
  user: &User,
  flashes: &[Flash],
  title: &str,
  action: &str,
  input: &RecordInput,
  categories: &[String],
) -> Html<String> {
  let field = |label: &str, name: &str, value: &str, kind: &str| {
    format!(
      r#"<p><label>{label} <input type="{kind}" name="{name}" value="{}"></label></p>"#,
      escape(value),
    )
  };
  let area = |label: &str, name: &str, value: &str| {
    format!(
      r#"<p><label>{label}<br><textarea name="{name}" rows="3" cols="60">{}</textarea></label></p>"#,
      escape(value),
    )
  };

  let current = Status::classify(&input.status);
  let status_options: String = Status::ALL
    .iter()
    .map(|s| {
      format!(
        r#"<option value="{}"{}>{}</option>"#,
        s.code(),
        if current == Some(*s) { " selected" } else { "" },
        s.label(),
      )
    })
    .collect();
  let category_list: String = categories
    .iter()
    .map(|c| format!(r#"<option value="{}">"#, escape(c)))
    .collect();

  let body = format!(
    r#"<form method="post" action="{}">{}<p><label>Loại đơn thư <input name="category" list="categories" value="{}"></label><datalist id="categories">{category_list}</datalist></p>{}{}{}{}{}{}{}{}{}{}<p><label>Tình trạng <select name="status" required><option value="">--</option>{status_options}</select></label></p><p><button type="submit">Lưu</button> <a href="/">Hủy</a></p></form>"#,
    escape(action),
    field("Mã CV", "code", &input.code, "text"),
    escape(&input.category),
    field("Tháng", "month", &input.month, "text"),
    field("Năm", "year", &input.year, "text"),
    field("Ngày nhận", "received_date", &input.received_date, "text"),
    field("Mã KH", "customer_code", &input.customer_code, "text"),
    field("Tên KH", "name", &input.name, "text"),
    field("Địa chỉ", "address", &input.address, "text"),
    field("Nhân viên", "staff", &input.staff, "text"),
    area("Nội dung", "content", &input.content),
    area("Ghi chú", "notes", &input.notes),
    area("Kết quả", "result", &input.result),
  );
  layout(title, Some(user), flashes, &body)
}

pub fn record_detail(user: &User, flashes: &[Flash], r: &Record) -> Html<String> {
  let rows = [
    ("Mã CV", opt(&r.code)),
    ("Loại đơn thư", opt(&r.category)),
    ("Tháng/Năm", period(r)),
    ("Mã KH", opt(&r.customer_code)),
    ("Tên KH", opt(&r.name)),
    ("Địa chỉ", opt(&r.address)),
    ("Nhân viên", opt(&r.staff)),
    ("Nội dung", opt(&r.content)),
    ("Ghi chú", opt(&r.notes)),
    ("Kết quả", opt(&r.result)),
    ("Ngày nhận", date(r)),
    ("Tình trạng", escape(&r.status)),
    ("Tạo lúc", r.created_at.format("%d/%m/%Y %H:%M").to_string()),
    ("Cập nhật", r.updated_at.format("%d/%m/%Y %H:%M").to_string()),
  ]
  .into_iter()
  .map(|(k, v)| format!("<tr><th>{k}</th><td>{v}</td></tr>"))
  .collect::<String>();

  let actions = if user.is_admin() {
    format!(r#"<p><a href="/congvan/{0}/edit">Sửa</a> {1}</p>"#, r.id, delete_button(r.id))
  } else {
    String::new()
  };
  let body = format!(r#"<table>{rows}</table>{actions}<p><a href="/">« Danh sách</a></p>"#);
  layout(&format!("Công văn #{}", r.id), Some(user), flashes, &body)
}

// ─── Users ───────────────────────────────────────────────────────────────────

fn role_select(current: Role) -> String {
  let options: String = [(Role::Staff, "Nhân viên"), (Role::Admin, "Quản trị")]
    .into_iter()
    .map(|(role, label)| {
      format!(
        r#"<option value="{}"{}>{label}</option>"#,
        role.as_str(),
        if role == current { " selected" } else { "" },
      )
    })
    .collect();
  format!(r#"<select name="role">{options}</select>"#)
}

pub fn users(current: &User, flashes: &[Flash], users: &[User]) -> Html<String> {
  let rows: String = users
    .iter()
    .map(|u| {
      let delete = if u.id == current.id {
        String::new()
      } else {
        format!(
          r#"<form class="inline" method="post" action="/users/{}/delete" onsubmit="return confirm('Xóa tài khoản này?')"><button type="submit">Xóa</button></form>"#,
          u.id,
        )
      };
      format!(
        r#"<tr><td>{}</td><td><form class="inline" method="post" action="/users/{id}/update">{} <button type="submit">Đổi vai trò</button></form></td><td>{}</td><td><form class="inline" method="post" action="/users/{id}/reset"><input name="password" type="password" required> <button type="submit">Đặt lại mật khẩu</button></form> {delete}</td></tr>"#,
        escape(&u.username),
        role_select(u.role),
        u.created_at.format("%d/%m/%Y"),
        id = u.id,
      )
    })
    .collect();

  let body = format!(
    r#"<h2>Tạo tài khoản</h2><form method="post" action="/users"><label>Tên đăng nhập <input name="username" required></label> <label>Mật khẩu <input name="password" type="password" required></label> <label>Vai trò {}</label> <button type="submit">Tạo</button></form><h2>Danh sách</h2><table><thead><tr><th>Tên đăng nhập</th><th>Vai trò</th><th>Ngày tạo</th><th></th></tr></thead><tbody>{rows}</tbody></table>"#,
    role_select(Role::Staff),
  );
  layout("Tài khoản", Some(current), flashes, &body)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn escapes_markup() {
    assert_eq!(escape(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&apos;");
  }

  #[test]
  fn query_string_percent_encodes() {
    assert_eq!(
      query_string([("loai", "Khiếu nại"), ("page", "2")]),
      "loai=Khi%E1%BA%BFu%20n%E1%BA%A1i&page=2",
    );
  }
}

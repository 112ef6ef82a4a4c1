//! HTML views
//!
//! Bare-bones pages for the catalog and the login form. All dynamic text
//! goes through `escape_html`.

use chrono::{DateTime, Local};
use std::fmt::Write;

use crate::catalog::{Catalog, FileEntry, FolderEntry};
use crate::protocol::flash::Flash;
use crate::protocol::urls::{action_url, folder_url, parent_folder_url};

const STYLE: &str = "body{font-family:sans-serif;margin:2em}\
.flash{padding:.5em;margin:.25em 0}.info{background:#eef}.success{background:#efe}\
.error{background:#fee}table{border-collapse:collapse}td,th{padding:.25em .75em;text-align:left}\
img.thumb{max-height:48px}form.inline{display:inline}";

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Local time as `YYYY-MM-DD HH:MM:SS`
pub fn format_timestamp(epoch_secs: u64) -> String {
    DateTime::from_timestamp(epoch_secs as i64, 0)
        .map(|utc| {
            utc.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_default()
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title>\
         <style>{}</style></head><body>{}</body></html>\n",
        escape_html(title),
        STYLE,
        body
    )
}

fn render_flashes(out: &mut String, flashes: &[Flash]) {
    for flash in flashes {
        let _ = write!(
            out,
            "<div class=\"flash {}\">{}</div>",
            flash.level.as_str(),
            escape_html(&flash.message)
        );
    }
}

pub fn render_login(flashes: &[Flash]) -> String {
    let mut body = String::from("<h1>Log in</h1>");
    render_flashes(&mut body, flashes);
    body.push_str(
        "<form method=\"post\" action=\"/login\">\
         <p><label>Username <input name=\"username\" autocomplete=\"username\"></label></p>\
         <p><label>Password <input type=\"password\" name=\"password\" \
         autocomplete=\"current-password\"></label></p>\
         <p><button type=\"submit\">Log in</button></p></form>\
         <p><a href=\"/\">Back to files</a></p>",
    );
    page("Log in", &body)
}

fn render_breadcrumbs(out: &mut String, current_path: &str) {
    out.push_str("<nav><a href=\"/\">Home</a>");
    let mut walked = String::new();
    for segment in current_path.split('/').filter(|s| !s.is_empty()) {
        if !walked.is_empty() {
            walked.push('/');
        }
        walked.push_str(segment);
        let _ = write!(
            out,
            " / <a href=\"{}\">{}</a>",
            escape_html(&folder_url(&walked)),
            escape_html(segment)
        );
    }
    out.push_str("</nav>");

    if !current_path.is_empty() {
        let _ = write!(
            out,
            "<p><a href=\"{}\">Up one level</a></p>",
            escape_html(&parent_folder_url(current_path))
        );
    }
}

fn render_admin_forms(out: &mut String, current_path: &str) {
    let current = escape_html(current_path);
    let _ = write!(
        out,
        "<form method=\"post\" action=\"/create_folder\">\
         <input type=\"hidden\" name=\"current_path\" value=\"{current}\">\
         <input name=\"folder_name\" placeholder=\"New folder\">\
         <button type=\"submit\">Create folder</button></form>\
         <form method=\"post\" action=\"/upload\" enctype=\"multipart/form-data\">\
         <input type=\"hidden\" name=\"current_path\" value=\"{current}\">\
         <input type=\"file\" name=\"file\">\
         <button type=\"submit\">Upload</button></form>"
    );
}

fn render_item_actions(out: &mut String, path: &str, name: &str) {
    let _ = write!(
        out,
        "<form class=\"inline\" method=\"post\" action=\"{}\">\
         <input name=\"new_name\" value=\"{}\"><button type=\"submit\">Rename</button></form> \
         <form class=\"inline\" method=\"post\" action=\"{}\">\
         <button type=\"submit\">Delete</button></form>",
        escape_html(&action_url("rename", path)),
        escape_html(name),
        escape_html(&action_url("delete", path))
    );
}

fn render_folder_row(out: &mut String, folder: &FolderEntry, logged_in: bool) {
    let _ = write!(
        out,
        "<tr><td><a href=\"{}\">{}/</a></td><td></td><td>{}</td><td>",
        escape_html(&folder_url(&folder.path)),
        escape_html(&folder.name),
        format_timestamp(folder.modified)
    );
    if logged_in {
        render_item_actions(out, &folder.path, &folder.name);
    }
    out.push_str("</td></tr>");
}

fn render_file_row(out: &mut String, file: &FileEntry, logged_in: bool) {
    let view = escape_html(&action_url("view", &file.path));
    out.push_str("<tr><td>");
    if file.is_image {
        let _ = write!(out, "<img class=\"thumb\" src=\"{}\" alt=\"\"> ", view);
    }
    let _ = write!(
        out,
        "{}</td><td>{}</td><td>{}</td><td><a href=\"{}\">View</a> <a href=\"{}\">Download</a> ",
        escape_html(&file.name),
        format_size(file.size),
        format_timestamp(file.modified),
        view,
        escape_html(&action_url("download", &file.path))
    );
    if logged_in {
        render_item_actions(out, &file.path, &file.name);
    }
    out.push_str("</td></tr>");
}

pub fn render_index(catalog: &Catalog, flashes: &[Flash], logged_in: bool) -> String {
    let mut body = String::from("<h1>Files</h1>");

    if logged_in {
        body.push_str("<p><a href=\"/logout\">Log out</a></p>");
    } else {
        body.push_str("<p><a href=\"/login\">Log in</a> to upload or manage files</p>");
    }

    render_flashes(&mut body, flashes);
    render_breadcrumbs(&mut body, &catalog.current_path);

    if logged_in {
        render_admin_forms(&mut body, &catalog.current_path);
    }

    if catalog.is_empty() {
        body.push_str("<p>This folder is empty.</p>");
    } else {
        body.push_str("<table><tr><th>Name</th><th>Size</th><th>Modified</th><th></th></tr>");
        for folder in &catalog.folders {
            render_folder_row(&mut body, folder, logged_in);
        }
        for file in &catalog.files {
            render_file_row(&mut body, file, logged_in);
        }
        body.push_str("</table>");
    }

    let title = if catalog.current_path.is_empty() {
        "Files".to_string()
    } else {
        format!("Files - /{}", catalog.current_path)
    };
    page(&title, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalog() -> Catalog {
        Catalog {
            current_path: "docs".into(),
            folders: vec![FolderEntry {
                name: "inner".into(),
                path: "docs/inner".into(),
                modified: 0,
            }],
            files: vec![FileEntry {
                name: "<script>.png".into(),
                path: "docs/<script>.png".into(),
                size: 2048,
                modified: 0,
                extension: "png".into(),
                is_image: true,
            }],
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html("<a href=\"x\">'&'</a>"),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn sizes() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn timestamps_have_fixed_shape() {
        let formatted = format_timestamp(1_700_000_000);
        assert_eq!(formatted.len(), "2023-11-14 22:13:20".len());
        assert!(formatted.starts_with("2023-11-1"));
    }

    #[test]
    fn index_hides_admin_controls_when_logged_out() {
        let html = render_index(&sample_catalog(), &[], false);
        assert!(html.contains("/download/docs/%3Cscript%3E.png"));
        assert!(html.contains("&lt;script&gt;.png"));
        assert!(!html.contains("<script>"));
        assert!(!html.contains("/upload"));
        assert!(!html.contains("/delete/"));
        assert!(html.contains("href=\"/docs/inner\""));
        assert!(html.contains("<a href=\"/\">Up one level</a>"));
    }

    #[test]
    fn index_shows_admin_controls_and_flashes() {
        let flashes = vec![Flash::success("Done")];
        let html = render_index(&sample_catalog(), &flashes, true);
        assert!(html.contains("action=\"/upload\""));
        assert!(html.contains("action=\"/delete/docs/inner\""));
        assert!(html.contains("value=\"docs\""));
        assert!(html.contains("<div class=\"flash success\">Done</div>"));
    }

    #[test]
    fn empty_folder_message() {
        let html = render_index(&Catalog::default(), &[], false);
        assert!(html.contains("This folder is empty."));
        assert!(!html.contains("Up one level"));
    }
}

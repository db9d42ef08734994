//! Server-rendered HTML for the case report form.
//!
//! The page is a pure function of a [`SessionView`] and the text to pre-fill, so rendering can
//! be tested without a server.

use ddx_core::SessionView;
use std::fmt::Write as _;

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:48rem;margin:2rem auto;\
padding:0 1rem;line-height:1.5}textarea{width:100%;min-height:12rem;font:inherit}\
button{margin-top:.5rem;padding:.4rem 1.2rem}#error{color:#b00020}\
#result,#result-copy{white-space:pre-wrap}#result-copy{background:#f4f4f4;padding:.5rem}";

/// Escape text for inclusion in HTML element content or a double-quoted attribute.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the full page.
///
/// `case_report` is echoed back into the text area so the user can edit and resubmit.
pub fn render_page(view: &SessionView, case_report: &str) -> String {
    let mut page = String::with_capacity(2048);

    page.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    page.push_str("<title>Differential diagnosis</title>\n");
    let _ = writeln!(page, "<style>{STYLE}</style>");
    page.push_str("</head>\n<body>\n<h1>Case report to differential diagnosis</h1>\n");

    page.push_str("<form method=\"post\" action=\"/\">\n");
    page.push_str("<label for=\"case_report\">Case report</label>\n");
    let _ = writeln!(
        page,
        "<textarea id=\"case_report\" name=\"case_report\" required>{}</textarea>",
        escape_html(case_report)
    );
    page.push_str("<button type=\"submit\">Submit</button>\n</form>\n");

    if view.pending {
        page.push_str("<p id=\"pending\">Working on it. Refresh to see the result.</p>\n");
    }

    let hidden = if view.header_visible { "" } else { " hidden" };
    let _ = writeln!(page, "<h2 id=\"response-header\"{hidden}>Response</h2>");
    let _ = writeln!(page, "<div id=\"result\">{}</div>", escape_html(&view.result));
    let _ = writeln!(
        page,
        "<pre id=\"result-copy\">{}</pre>",
        escape_html(&view.duplicate_result)
    );
    let _ = writeln!(page, "<div id=\"error\">{}</div>", escape_html(&view.error));

    page.push_str("</body>\n</html>\n");
    page
}

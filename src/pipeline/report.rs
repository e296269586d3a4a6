//! Standalone HTML info sheet for a card.
//!
//! The page embeds its own stylesheet and references nothing but the card's
//! avatar URL, so it can sit next to the downloaded image (or inside the zip)
//! and still render.

use pulldown_cmark::{html, Options, Parser};
use serde_json::{Map, Number, Value};

use crate::models::{CardRecord, TOKEN_COUNTS_LABEL};

/// Accent color used for headings
pub const HIGHLIGHT_COLOR: &str = "#859412";

/// Footer line of every report
pub const FOOTER: &str = "Generated by Chub.ai Card Downloader";

/// File name of the report inside the card folder
pub fn report_file_name(slug: &str) -> String {
    format!("{}_info.html", slug)
}

/// One entry of the token-count breakdown
#[derive(Debug, Clone, PartialEq)]
pub struct TokenCount {
    /// Humanized key, e.g. `Example Dialogs`
    pub label: String,
    pub value: Number,
}

/// Render the full HTML document for a card.
pub fn render_report(card: &CardRecord) -> String {
    let name = escape_html(&card.name);
    let avatar = escape_html(card.avatar_url.as_deref().unwrap_or_default());

    let mut page = String::with_capacity(8 * 1024);
    page.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    page.push_str("    <meta charset=\"utf-8\">\n");
    page.push_str(
        "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
    );
    page.push_str(&format!("    <title>{} - Card Information</title>\n", name));
    page.push_str("    <style>\n");
    page.push_str(&stylesheet());
    page.push_str("    </style>\n</head>\n<body>\n    <div class=\"container\">\n");
    page.push_str(&format!("        <h1>{}</h1>\n", name));
    page.push_str(&format!(
        "        <img src=\"{}\" alt=\"Avatar\" class=\"avatar\">\n",
        avatar
    ));

    page.push_str("        <div class=\"description\">\n            <h2>Description</h2>\n");
    page.push_str(&markdown_to_html(&card.description));
    page.push_str("        </div>\n");

    page.push_str("        <div class=\"info\">\n            <h2>Card Information</h2>\n");
    page.push_str("            <ul>\n");
    for (label, value) in metadata_fields(card) {
        push_item(&mut page, label, &value);
    }
    page.push_str("            </ul>\n        </div>\n");

    let counts = token_counts(card);
    if !counts.is_empty() {
        page.push_str("        <div class=\"token-counts\">\n            <h2>Token Counts</h2>\n");
        page.push_str("            <ul>\n");
        for count in &counts {
            push_item(&mut page, &count.label, &count.value.to_string());
        }
        page.push_str("            </ul>\n        </div>\n");
    }

    page.push_str("    </div>\n");
    page.push_str(&format!("    <footer>\n        {}\n    </footer>\n", FOOTER));
    page.push_str("</body>\n</html>\n");
    page
}

/// Convert the markdown description to HTML.
///
/// Raw HTML inside the markdown is passed through unchanged.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Non-zero numeric entries of the first parseable `TOKEN_COUNTS` label,
/// excluding `total`, in the order the API listed them.
///
/// Malformed labels are skipped; when none parses the result is empty.
pub fn token_counts(card: &CardRecord) -> Vec<TokenCount> {
    let parsed = card
        .labels
        .iter()
        .filter(|label| label.title == TOKEN_COUNTS_LABEL)
        .find_map(|label| {
            match serde_json::from_str::<Map<String, Value>>(&label.description) {
                Ok(data) => Some(data),
                Err(e) => {
                    tracing::debug!(card = card.id, error = %e, "ignoring malformed token counts");
                    None
                }
            }
        });
    let Some(data) = parsed else {
        return Vec::new();
    };

    data.into_iter()
        .filter(|(key, _)| key != "total")
        .filter_map(|(key, value)| match value {
            Value::Number(n) if n.as_f64() != Some(0.0) => Some(TokenCount {
                label: humanize_key(&key),
                value: n,
            }),
            _ => None,
        })
        .collect()
}

/// `example_dialogs` → `Example Dialogs`
pub fn humanize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut after_letter = false;

    for ch in key.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        if ch.is_alphabetic() {
            if after_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            after_letter = true;
        } else {
            out.push(ch);
            after_letter = false;
        }
    }

    out
}

/// Label/value pairs of the "Card Information" list. Name, description and
/// avatar are rendered separately and are not part of it.
pub fn metadata_fields(card: &CardRecord) -> Vec<(&'static str, String)> {
    vec![
        ("ID", card.id.to_string()),
        ("Full Path", card.full_path.clone()),
        ("Downloads", display_opt(card.star_count)),
        ("Last Activity", display_opt(card.last_activity_at.as_ref())),
        ("Created At", display_opt(card.created_at.as_ref())),
        ("Tags", card.tag_list()),
        ("Forks", display_opt(card.forks_count)),
        ("Rating", display_opt(card.rating)),
        ("Rating Count", display_opt(card.rating_count)),
        ("Tagline", display_opt(card.tagline.as_ref())),
        ("Chats", display_opt(card.n_chats)),
        ("Messages", display_opt(card.n_messages)),
        ("Public Chats", display_opt(card.n_public_chats)),
        ("Favorites", display_opt(card.n_favorites)),
    ]
}

fn display_opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn push_item(page: &mut String, label: &str, value: &str) {
    page.push_str(&format!(
        "                <li>\n                    <strong>{}:</strong>\n                    <span>{}</span>\n                </li>\n",
        escape_html(label),
        escape_html(value)
    ));
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn stylesheet() -> String {
    let list = |class: &str, background: &str| {
        format!(
            r#"        .{class} {{
            margin-top: 30px;
        }}
        .{class} h2 {{
            border-bottom: 2px solid #e7e7e7;
            padding-bottom: 10px;
            color: {HIGHLIGHT_COLOR};
        }}
        .{class} ul {{
            list-style-type: none;
            padding: 0;
            display: grid;
            grid-template-columns: 1fr;
            gap: 10px;
        }}
        .{class} ul li {{
            background: {background};
            padding: 12px 15px;
            border-radius: 5px;
            display: flex;
            flex-direction: column;
            word-wrap: break-word;
        }}
        .{class} ul li strong {{
            color: #333;
            margin-bottom: 5px;
        }}
"#
        )
    };

    let mut css = format!(
        r#"        body {{
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            margin: 0;
            padding: 0;
            background-color: #f4f4f4;
        }}
        .container {{
            max-width: 1200px;
            margin: 40px auto;
            background-color: #fff;
            padding: 30px;
            box-shadow: 0 2px 8px rgba(0,0,0,0.1);
            border-radius: 8px;
        }}
        h1 {{
            text-align: center;
            margin-bottom: 20px;
            color: {HIGHLIGHT_COLOR};
        }}
        .avatar {{
            display: block;
            margin-left: auto;
            margin-right: auto;
            width: 200px;
            height: 200px;
            border-radius: 50%;
            object-fit: cover;
            box-shadow: 0 2px 5px rgba(0,0,0,0.2);
        }}
        .description {{
            margin-top: 30px;
        }}
        .description h2 {{
            border-bottom: 2px solid #e7e7e7;
            padding-bottom: 10px;
            color: {HIGHLIGHT_COLOR};
        }}
        .description p {{
            line-height: 1.8;
            color: #555;
        }}
"#
    );
    css.push_str(&list("info", "#fafafa"));
    css.push_str(&list("token-counts", "#eaf8fc"));
    css.push_str(
        r#"        footer {
            text-align: center;
            margin-top: 40px;
            color: #aaa;
        }
        @media (min-width: 500px) {
            .info ul, .token-counts ul {
                grid-template-columns: 1fr 1fr;
            }
        }
        @media (min-width: 800px) {
            .info ul, .token-counts ul {
                grid-template-columns: 1fr 1fr 1fr;
            }
        }
"#,
    );
    css
}

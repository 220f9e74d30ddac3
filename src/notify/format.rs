// src/notify/format.rs
use crate::ingest::types::Article;
use crate::pipeline::RunSummary;

const DESCRIPTION_MAX_CHARS: usize = 200;

/// Escape text for Telegram MarkdownV2.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        if matches!(
            ch,
            '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '='
                | '|' | '{' | '}' | '.' | '!' | '\\'
        ) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Inside `(...)` of an inline link only `)` and `\` need escaping.
fn escape_link_target(url: &str) -> String {
    url.replace('\\', "\\\\").replace(')', "\\)")
}

fn truncate_chars(s: &str, max: usize) -> (String, bool) {
    if s.chars().count() > max {
        (s.chars().take(max).collect(), true)
    } else {
        (s.to_string(), false)
    }
}

pub fn format_article(article: &Article) -> String {
    let title = if article.title.is_empty() {
        "(untitled)"
    } else {
        article.title.as_str()
    };
    let (description, cut) = truncate_chars(&article.description, DESCRIPTION_MAX_CHARS);
    let ellipsis = if cut { "\\.\\.\\." } else { "" };
    let published = article
        .published_at
        .map(|ts| ts.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut msg = format!("🔔 *New article*\n\n*{}*\n\n", escape_markdown_v2(title));
    if !description.is_empty() {
        msg.push_str(&escape_markdown_v2(&description));
        msg.push_str(ellipsis);
        msg.push_str("\n\n");
    }
    msg.push_str(&format!(
        "📰 Source: {}\n⏰ {}\n\n🔗 [Read article]({})",
        escape_markdown_v2(&article.source),
        escape_markdown_v2(&published),
        escape_link_target(&article.identity)
    ));
    msg
}

pub fn format_summary(summary: &RunSummary) -> String {
    format!(
        "📊 *News run finished*\n\n• Found: {}\n• Recent: {}\n• Sent: {}\n• Skipped: {} \\(already sent\\)\n• Failed: {}",
        summary.total_found,
        summary.total_recent,
        summary.sent,
        summary.skipped_duplicate,
        summary.failed
    )
}

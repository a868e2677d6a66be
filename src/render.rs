//! Digest renderers: a self-contained HTML email and a plain-text message
//! used by the chat channels.

use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::Article;

const PLAIN_SUMMARY_CHARS: usize = 200;
const SEPARATOR: &str = "━━━━━━━━━━━━━━━━━━━━";

const EMAIL_STYLE: &str = r#"
        body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 800px; margin: 0 auto; padding: 20px; }
        h1 { color: #2c3e50; border-bottom: 3px solid #3498db; padding-bottom: 10px; }
        .article { margin-bottom: 30px; padding: 15px; background: #f8f9fa; border-left: 4px solid #3498db; }
        .article h3 { margin-top: 0; color: #2980b9; }
        .article a { color: #3498db; text-decoration: none; }
        .article a:hover { text-decoration: underline; }
        .meta { color: #7f8c8d; font-size: 0.9em; margin-top: 5px; }
        .summary { margin-top: 10px; }
        .footer { margin-top: 40px; padding-top: 20px; border-top: 1px solid #ddd; text-align: center; color: #7f8c8d; font-size: 0.9em; }
"#;

pub fn email_subject(date: NaiveDate) -> String {
    format!("🚀 Your Daily AI & Tech Digest - {}", date.format("%b %d, %Y"))
}

pub fn render_email(articles: &[Article], date: NaiveDate) -> String {
    let mut html = String::with_capacity(2048 + articles.len() * 512);

    let _ = write!(
        html,
        r#"<html>
<head>
    <meta charset="utf-8">
    <style>{style}    </style>
</head>
<body>
    <h1>🚀 Your Daily AI &amp; Tech News Digest</h1>
    <p><strong>Date:</strong> {date}</p>
    <p>Here are today's top {count} AI and technology stories:</p>
"#,
        style = EMAIL_STYLE,
        date = date.format("%B %d, %Y"),
        count = articles.len(),
    );

    for (i, article) in articles.iter().enumerate() {
        let _ = write!(
            html,
            r#"
    <div class="article">
        <h3>{n}. {title}</h3>
        <div class="meta">
            <strong>Source:</strong> {source} |
            <strong>Published:</strong> {published}
        </div>
        <div class="summary">{summary}</div>
        <p><a href="{link}" target="_blank">Read full article →</a></p>
    </div>
"#,
            n = i + 1,
            title = html_escape(&article.title),
            source = html_escape(&source_label(&article.source)),
            published = html_escape(&article.published),
            summary = html_escape(&article.summary),
            link = html_escape(&article.link),
        );
    }

    html.push_str(
        r#"
    <div class="footer">
        <p>You're receiving this because you subscribed to daily AI &amp; Tech news updates.</p>
        <p>Stay curious! 🧠</p>
    </div>
</body>
</html>
"#,
    );

    html
}

/// Plain-text digest with `*bold*` markup. Every summary is cut to 200
/// characters and always followed by `...`.
pub fn render_plain_digest(articles: &[Article], date: NaiveDate) -> String {
    let mut text = String::new();

    let _ = writeln!(text, "🚀 *Daily AI & Tech News* - {}\n", date.format("%b %d, %Y"));
    let _ = writeln!(text, "Top {} stories today:", articles.len());
    let _ = writeln!(text, "{}\n", SEPARATOR);

    for (i, article) in articles.iter().enumerate() {
        let summary: String = article.summary.chars().take(PLAIN_SUMMARY_CHARS).collect();

        let _ = writeln!(text, "*{}. {}*", i + 1, article.title);
        let _ = writeln!(text, "📰 {}", source_label(&article.source));
        let _ = writeln!(text, "📅 {}\n", article.published);
        let _ = writeln!(text, "{}...\n", summary);
        let _ = writeln!(text, "🔗 {}", article.link);
        let _ = writeln!(text, "{}\n", SEPARATOR);
    }

    text.push_str("Stay curious! 🧠");
    text
}

/// `techcrunch_ai` -> `Techcrunch Ai`
pub fn source_label(source: &str) -> String {
    let mut label = String::with_capacity(source.len());
    let mut prev_alpha = false;

    for c in source.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphabetic() {
            if prev_alpha {
                label.extend(c.to_lowercase());
            } else {
                label.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            label.push(c);
            prev_alpha = false;
        }
    }

    label
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

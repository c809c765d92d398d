use crate::stats::{format_number, DigestStats, DigestSummary, Neighbours, SiteStats};

const SITE_TITLE: &str = "Reddit AI Digest";

/// Render the front page.
pub fn render_index(recent: &[DigestSummary], total_count: usize, stats: &SiteStats) -> String {
    let mut cards = String::new();

    if recent.is_empty() {
        cards.push_str(r#"<p class="empty">No digests have been published yet.</p>"#);
    }
    for digest in recent {
        cards.push_str(&digest_card(digest));
    }

    let more = if total_count > recent.len() {
        format!(
            r#"<p class="more"><a href="/archive">All {} digests in the archive</a></p>"#,
            format_number(total_count as u64)
        )
    } else {
        String::new()
    };

    let content = format!(
        r#"<div class="container">
<h2>Latest digests</h2>
{stats}
<div class="cards">{cards}</div>
{more}
</div>"#,
        stats = stats_bar(stats),
    );

    build_page("Latest digests", &content)
}

/// Render one digest with its counts and navigation.
pub fn render_digest(
    summary: &DigestSummary,
    content_html: &str,
    neighbours: &Neighbours,
    stats: Option<&DigestStats>,
) -> String {
    let stats_block = match stats {
        Some(stats) => {
            let per_community: String = stats
                .subreddit_counts
                .iter()
                .map(|(name, count)| {
                    format!(
                        "<li>r/{} <span>{}</span></li>",
                        html_escape(name),
                        format_number(*count as u64)
                    )
                })
                .collect();
            format!(
                r#"<aside class="digest-stats">
<div>Collected <strong>{}</strong></div>
<div>Selected <strong>{}</strong></div>
<ul>{per_community}</ul>
</aside>"#,
                format_number(stats.total_posts),
                format_number(stats.filtered_posts),
            )
        }
        None => String::new(),
    };

    let previous = neighbours
        .previous
        .as_ref()
        .map(|d| {
            format!(
                r#"<a class="prev" href="/digest/{}">&larr; {}</a>"#,
                html_escape(&d.date),
                html_escape(&d.formatted_date)
            )
        })
        .unwrap_or_default();
    let next = neighbours
        .next
        .as_ref()
        .map(|d| {
            format!(
                r#"<a class="next" href="/digest/{}">{} &rarr;</a>"#,
                html_escape(&d.date),
                html_escape(&d.formatted_date)
            )
        })
        .unwrap_or_default();

    let content = format!(
        r#"<div class="container">
<p class="meta">{formatted}</p>
{stats_block}
<article class="digest">{content_html}</article>
<nav class="digest-nav">{previous}{next}</nav>
</div>"#,
        formatted = html_escape(&summary.formatted_date),
    );

    build_page(&summary.title, &content)
}

/// Render the archive of every digest.
pub fn render_archive(digests: &[DigestSummary]) -> String {
    let range = match (digests.last(), digests.first()) {
        (Some(oldest), Some(newest)) => format!(
            "<p class=\"meta\">{} digests from {} to {}</p>",
            format_number(digests.len() as u64),
            html_escape(&oldest.formatted_date),
            html_escape(&newest.formatted_date)
        ),
        _ => r#"<p class="empty">The archive is empty.</p>"#.to_string(),
    };

    let rows: String = digests.iter().map(digest_card).collect();
    let content = format!(
        r#"<div class="container"><h2>Archive</h2>{range}<div class="cards">{rows}</div></div>"#
    );

    build_page("Archive", &content)
}

/// Render the about page.
pub fn render_about(stats: &SiteStats, subreddits: &[String]) -> String {
    let communities: String = subreddits
        .iter()
        .map(|name| format!("<li>r/{}</li>", html_escape(name)))
        .collect();

    let content = format!(
        r#"<div class="container">
<h2>About</h2>
<p>Every day the previous day's posts from the communities below are collected,
memes and low-engagement posts are dropped, and a language model writes a short
digest of the most discussed topics and the general trends.</p>
<ul class="communities">{communities}</ul>
{stats}
</div>"#,
        stats = stats_bar(stats),
    );

    build_page("About", &content)
}

pub fn render_message(title: &str, message: &str) -> String {
    let content = format!(
        r#"<div class="container"><h2>{}</h2><p>{}</p><p><a href="/">Back to the latest digests</a></p></div>"#,
        html_escape(title),
        html_escape(message)
    );
    build_page(title, &content)
}

fn digest_card(digest: &DigestSummary) -> String {
    format!(
        r#"<div class="digest-card">
    <h3><a href="/digest/{date}">{title}</a></h3>
    <p class="meta">{formatted}</p>
</div>"#,
        date = html_escape(&digest.date),
        title = html_escape(&digest.title),
        formatted = html_escape(&digest.formatted_date),
    )
}

fn stats_bar(stats: &SiteStats) -> String {
    format!(
        r#"<div class="stats">
<span><strong>{}</strong> digests</span>
<span><strong>{}</strong> subreddits</span>
<span><strong>{}</strong> posts analyzed</span>
</div>"#,
        format_number(stats.total_digests as u64),
        format_number(stats.total_subreddits as u64),
        format_number(stats.total_posts),
    )
}

fn build_page(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | {SITE_TITLE}</title>
<style>
*{{margin:0;padding:0;box-sizing:border-box;}}
body{{font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;color:#1a1a1a;background:#fafafa;line-height:1.5;}}
.header{{background:#1a1a1a;color:#fff;padding:12px 24px;display:flex;align-items:center;justify-content:space-between;}}
.header h1{{font-size:18px;font-weight:600;}}
.header h1 a{{color:#fff;text-decoration:none;}}
.header nav a{{color:#ccc;text-decoration:none;margin-left:20px;font-size:14px;}}
.header nav a:hover{{color:#fff;}}
.container{{max-width:860px;margin:0 auto;padding:24px;}}
.container h2{{margin-bottom:16px;}}
.stats{{display:flex;gap:24px;margin-bottom:20px;color:#555;font-size:14px;}}
.digest-card{{background:#fff;border:1px solid #e0e0e0;border-radius:8px;padding:16px;margin-bottom:12px;}}
.digest-card h3{{font-size:16px;}}
.digest-card h3 a{{color:#1a1a1a;text-decoration:none;}}
.digest-card h3 a:hover{{color:#0066cc;}}
.meta{{color:#888;font-size:13px;margin-bottom:8px;}}
.empty{{color:#888;text-align:center;padding:40px;}}
.digest h1,.digest h2,.digest h3,.digest h4{{margin:20px 0 8px;}}
.digest p,.digest ul,.digest ol{{margin-bottom:12px;}}
.digest li{{margin-left:24px;}}
.digest hr{{border:none;border-top:1px solid #ddd;margin:24px 0;}}
.digest-stats{{background:#fff;border:1px solid #e0e0e0;border-radius:8px;padding:12px 16px;margin-bottom:20px;font-size:14px;}}
.digest-stats ul{{list-style:none;display:flex;flex-wrap:wrap;gap:12px;margin-top:8px;}}
.digest-nav{{display:flex;justify-content:space-between;margin-top:32px;}}
</style>
</head>
<body>
<div class="header">
<h1><a href="/">{SITE_TITLE}</a></h1>
<nav><a href="/">Latest</a><a href="/archive">Archive</a><a href="/about">About</a></nav>
</div>
{content}
</body>
</html>"#,
        title = html_escape(title),
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

//! Benchmarks for the inlining pipeline.
//!
//! Run with: cargo bench

use criterion::{Criterion, criterion_group, criterion_main};

use inkpot::{Inliner, Stylesheet, StylesheetSource};

const CSS: &str = r#"
body { margin: 0; padding: 0; font-family: Helvetica, Arial, sans-serif; }
table { border-collapse: collapse; }
td { padding: 8px 12px; vertical-align: top; }
.header td { background: #1d2b3a url(img/header.png) no-repeat; color: #fff; }
.content p { font-size: 14px; line-height: 1.5; color: #333; }
.content p.lead { font-size: 18px !important; }
.footer { font-size: 11px; color: #999; -webkit-text-size-adjust: none; }
a { color: #0a6ebd; text-decoration: none; }
a:hover { text-decoration: underline; }
ul > li + li { margin-top: 4px; }
@media screen and (max-width: 600px) {
  .content p { font-size: 16px; }
  td { display: block; width: 100%; }
}
"#;

/// Build a newsletter-sized document with `rows` content rows.
fn sample_html(rows: usize) -> String {
    let mut body = String::from(r#"<table class="header"><tr><td>Newsletter</td></tr></table><div class="content">"#);
    for i in 0..rows {
        body.push_str(&format!(
            r#"<p class="lead">Story {i}</p><p>Body text with <a href="http://example.com/{i}">a link</a>.</p><ul><li>one</li><li>two</li></ul>"#
        ));
    }
    body.push_str(r#"</div><div class="footer">Unsubscribe</div>"#);
    format!("<html><head><style>{CSS}</style></head><body>{body}</body></html>")
}

// ============================================================================
// Parsing Benchmarks
// ============================================================================

fn bench_parse_stylesheet(c: &mut Criterion) {
    c.bench_function("parse_stylesheet", |b| {
        b.iter(|| Stylesheet::parse(CSS));
    });
}

// ============================================================================
// Inlining Benchmarks
// ============================================================================

fn bench_inline_small(c: &mut Criterion) {
    let html = sample_html(5);
    let inliner = Inliner::default();
    c.bench_function("inline_small", |b| {
        b.iter(|| inliner.inline(&html));
    });
}

fn bench_inline_large(c: &mut Criterion) {
    let html = sample_html(200);
    let inliner = Inliner::default();
    c.bench_function("inline_large", |b| {
        b.iter(|| inliner.inline(&html));
    });
}

fn bench_inline_sources(c: &mut Criterion) {
    let html = sample_html(50);
    let sources = [StylesheetSource::embedded(CSS)];
    let inliner = Inliner::default();
    c.bench_function("inline_sources", |b| {
        b.iter(|| inliner.inline_sources(&html, &sources));
    });
}

criterion_group!(
    benches,
    bench_parse_stylesheet,
    bench_inline_small,
    bench_inline_large,
    bench_inline_sources
);
criterion_main!(benches);

//! Property tests for URL rewriting, classification and the cascade.

use inkpot::css::url::rewrite_value;
use inkpot::css::{compile_selector, is_unsupported_selector};
use inkpot::{Placement, Stylesheet, Url, classify, inline_css};
use proptest::prelude::*;

fn relative_path() -> impl Strategy<Value = String> {
    ("(\\.\\./)?[a-z]{1,8}(/[a-z0-9_-]{1,8}){0,3}", "(png|gif|jpg)")
        .prop_map(|(path, ext)| format!("{path}.{ext}"))
}

fn url_value() -> impl Strategy<Value = String> {
    (relative_path(), prop_oneof!["", "'", "\""], "[a-z -]{0,12}").prop_map(
        |(path, quote, tail)| format!("url({quote}{path}{quote}) {tail}"),
    )
}

fn selector() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,6}",
        "\\.[a-z]{1,6}",
        "#[a-z]{1,6}",
        "[a-z]{1,4} > [a-z]{1,4}",
        "[a-z]{1,4}:(hover|focus|first-child|last-child|visited|nth-child\\(2\\))",
        "[a-z]{1,4}::?(before|after|first-line)",
        "[a-z]{1,4}:-(webkit|moz)-[a-z]{1,6}",
    ]
}

proptest! {
    #[test]
    fn rewriting_is_idempotent(value in url_value()) {
        let base = Url::parse("http://example.com/a/b/").unwrap();
        let once = rewrite_value(&value, &base).into_owned();
        let twice = rewrite_value(&once, &base).into_owned();
        prop_assert_eq!(&once, &twice);
        prop_assert!(once.contains("http://example.com/"));
    }

    #[test]
    fn absolute_urls_unchanged(path in relative_path()) {
        let base = Url::parse("http://example.com/").unwrap();
        for value in [
            format!("url(https://cdn.example.org/{path})"),
            format!("url('/{path}')"),
            format!("url(data:image/png;base64,{path})"),
        ] {
            prop_assert_eq!(rewrite_value(&value, &base), value.as_str());
        }
    }

    #[test]
    fn classification_is_pure(sel in selector(), media in prop_oneof!["all", "print", "screen and (max-width: 600px)"]) {
        let css = format!("@media {media} {{ {sel} {{ color: red }} }}");
        let sheet = Stylesheet::parse(&css);
        prop_assert_eq!(sheet.len(), 1);

        let rule = &sheet.rules()[0];
        let placement = classify(rule);
        prop_assert_eq!(placement, classify(&rule.clone()));

        match placement {
            Placement::HeadMedia => prop_assert!(media != "all"),
            Placement::HeadVerbatim => prop_assert!(
                is_unsupported_selector(&sel) || compile_selector(&sel).is_err()
            ),
            Placement::Inline => prop_assert!(compile_selector(&sel).is_ok()),
        }
    }

    #[test]
    fn last_equal_specificity_rule_wins(colors in prop::collection::vec("(red|blue|green|#[0-9a-f]{6})", 1..8)) {
        let css: String = colors.iter().map(|c| format!(".a {{ color: {c} }}\n")).collect();
        let out = inline_css(&format!("<style>{css}</style><p class=\"a\">x</p>"));
        let expected = format!("<p class=\"a\" style=\"color: {}\">x</p>", colors[colors.len() - 1]);
        prop_assert!(out.contains(&expected), "{}", out);
    }
}

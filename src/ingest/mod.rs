// src/ingest/mod.rs
pub mod atom;
pub mod fetch;
pub mod types;

use once_cell::sync::Lazy;
use regex::Regex;

/// Max chars kept in a stored description.
pub const DESCRIPTION_MAX_CHARS: usize = 1500;

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws regex"));

/// Turn an HTML-ish entry body into one line of plain text.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let out = html_escape::decode_html_entities(s);

    // 2) Strip HTML tags
    let out = RE_TAGS.replace_all(&out, " ");

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    let out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    let out = RE_WS.replace_all(&out, " ");
    let out = out.trim();

    // 5) Length cap
    if out.chars().count() > DESCRIPTION_MAX_CHARS {
        out.chars().take(DESCRIPTION_MAX_CHARS).collect()
    } else {
        out.to_string()
    }
}

static RE_NAMED_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&([A-Za-z][A-Za-z0-9]*);").expect("entity regex"));

const XML_ENTITIES: [&str; 5] = ["amp", "lt", "gt", "quot", "apos"];

/// Replace HTML named entities that XML parsers reject.
///
/// Common punctuation folds to ASCII; any other known HTML entity becomes its
/// character. Unknown names are escaped so they survive as literal text.
pub fn scrub_html_entities_for_xml(s: &str) -> String {
    let folded = s
        .replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...");

    RE_NAMED_ENTITY
        .replace_all(&folded, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            if XML_ENTITIES.contains(&name) {
                return caps[0].to_string();
            }
            let decoded = html_escape::decode_html_entities(&caps[0]);
            if decoded == caps[0] {
                format!("&amp;{name};")
            } else {
                decoded.into_owned()
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_strips_tags_and_collapses_ws() {
        let s = "  <p>Hello,&nbsp;&nbsp; <b>world</b>!</p>  ";
        assert_eq!(normalize_text(s), "Hello, world !");
    }

    #[test]
    fn normalize_text_caps_length() {
        let long = "a".repeat(DESCRIPTION_MAX_CHARS + 10);
        assert_eq!(normalize_text(&long).chars().count(), DESCRIPTION_MAX_CHARS);
    }

    #[test]
    fn scrub_keeps_xml_entities() {
        assert_eq!(
            scrub_html_entities_for_xml("a&nbsp;&amp;&mdash;b"),
            "a &amp;-b"
        );
    }

    #[test]
    fn scrub_decodes_other_html_entities() {
        assert_eq!(
            scrub_html_entities_for_xml("caf&eacute; &copy; 2009&trade; &lt;b&gt;"),
            "café © 2009™ &lt;b&gt;"
        );
        assert_eq!(scrub_html_entities_for_xml("&bogus; &amp;"), "&amp;bogus; &amp;");
    }
}

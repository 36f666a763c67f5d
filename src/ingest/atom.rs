// src/ingest/atom.rs
//! Atom `<entry>` parser.
//!
//! The document is deserialized in one pass into loosely typed raw entries
//! (every field optional), then each raw entry is validated on its own. A
//! malformed entry therefore only costs that entry; a malformed document costs
//! the whole feed.

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use quick_xml::events::{BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::error::ParseError;
use crate::ingest::scrub_html_entities_for_xml;
use crate::ingest::types::Entry;

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    title: Option<TextNode>,
    content: Option<TextNode>,
    published: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<RawLink>,
    /// Atom allows several authors; the first one is kept.
    #[serde(rename = "author", default)]
    authors: Vec<RawAuthor>,
}

/// Element whose attributes (`type="html"` and friends) we don't care about.
#[derive(Debug, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct RawLink {
    #[serde(rename = "@rel")]
    rel: Option<String>,
    #[serde(rename = "@href")]
    href: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAuthor {
    name: Option<String>,
    uri: Option<String>,
}

/// Parse a raw feed document.
///
/// Outer error: the document itself is unreadable. Inner results: one per
/// `<entry>`, in document order.
pub fn parse_feed(raw: &[u8]) -> Result<Vec<Result<Entry, ParseError>>, ParseError> {
    let t0 = std::time::Instant::now();
    let text = String::from_utf8_lossy(raw);
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let xml_clean = flatten_text_elements(&scrub_html_entities_for_xml(&text))?;
    let feed: Feed = from_str(&xml_clean).map_err(doc_err)?;

    let out: Vec<_> = feed
        .entries
        .into_iter()
        .enumerate()
        .map(|(index, raw)| raw.into_entry(index))
        .collect();

    histogram!("crawl_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    counter!("crawl_entries_total").increment(out.len() as u64);
    Ok(out)
}

impl RawEntry {
    fn into_entry(self, index: usize) -> Result<Entry, ParseError> {
        let missing = |field| ParseError::MissingField { index, field };

        let title = self.title.ok_or_else(|| missing("title"))?.value;
        let content = self.content.ok_or_else(|| missing("content"))?.value;
        let published = self.published.ok_or_else(|| missing("published"))?;
        let published_at =
            parse_timestamp(&published).ok_or_else(|| ParseError::InvalidTimestamp {
                index,
                value: published.clone(),
            })?;

        let link = find_link(&self.links, "alternate").ok_or_else(|| missing("link"))?;
        // An absent image link is fine; the entry is kept with no image.
        let author_image = find_link(&self.links, "image");

        let author = self
            .authors
            .into_iter()
            .next()
            .ok_or_else(|| missing("author"))?;
        let author_name = author.name.ok_or_else(|| missing("author/name"))?;
        let author_url = author.uri.unwrap_or_default();

        Ok(Entry {
            title: title.trim().to_string(),
            content,
            published_at,
            link,
            author_image,
            author_name: author_name.trim().to_string(),
            author_url: author_url.trim().to_string(),
        })
    }
}

/// Rewrite every `<title>` and `<content>` so it holds only the text of all its
/// descendants. `type="xhtml"` bodies wrap their text in child elements, which
/// the serde structs would otherwise drop.
fn flatten_text_elements(xml: &str) -> Result<String, ParseError> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    // 0 = outside a text element
    let mut depth = 0usize;
    let mut text = String::new();

    loop {
        let event = reader.read_event().map_err(doc_err)?;
        if depth == 0 {
            match &event {
                Event::Eof => break,
                Event::Start(e) if matches!(e.local_name().as_ref(), b"title" | b"content") => {
                    depth = 1;
                    text.clear();
                }
                _ => {}
            }
            writer.write_event(event).map_err(doc_err)?;
            continue;
        }

        match event {
            Event::Start(_) => {
                depth += 1;
                text.push(' ');
            }
            Event::Empty(_) => text.push(' '),
            Event::End(e) => {
                depth -= 1;
                if depth == 0 {
                    writer
                        .write_event(Event::Text(BytesText::new(&text)))
                        .map_err(doc_err)?;
                    writer.write_event(Event::End(e)).map_err(doc_err)?;
                } else {
                    text.push(' ');
                }
            }
            Event::Text(t) => text.push_str(&t.unescape().map_err(doc_err)?),
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
            Event::Eof => break,
            _ => {}
        }
    }

    String::from_utf8(writer.into_inner()).map_err(doc_err)
}

fn doc_err(e: impl std::fmt::Display) -> ParseError {
    ParseError::Document(e.to_string())
}

/// First link with the given `rel`. A link without `rel` is an alternate link.
fn find_link(links: &[RawLink], rel: &str) -> Option<String> {
    links
        .iter()
        .find(|l| l.rel.as_deref().unwrap_or("alternate") == rel)
        .and_then(|l| l.href.as_deref())
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
}

/// RFC 3339 first (Atom), RFC 2822 as a fallback for RSS-flavoured dates.
pub fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }
    let odt = OffsetDateTime::parse(ts, &Rfc2822).ok()?;
    DateTime::<Utc>::from_timestamp(odt.unix_timestamp(), odt.nanosecond())
}

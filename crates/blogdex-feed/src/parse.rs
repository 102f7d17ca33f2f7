//! RSS and Atom feed parsing.
//!
//! Parsing is tolerant by design: a feed that fails to parse, or parses to
//! zero usable entries, yields an empty list rather than an error. Discovery
//! treats an empty result as "try the next strategy".

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

use blogdex_core::DiscoveredPost;

/// Parses a feed document into discovered posts, newest entries first as they
/// appear in the document, capped at `limit`.
///
/// RSS `<item>` elements are tried first; if the document yields none, Atom
/// `<entry>` elements are tried as a fallback. Entries missing either a title
/// or a link are skipped.
#[must_use]
pub fn parse_feed(xml: &str, limit: usize) -> Vec<DiscoveredPost> {
    let rss = parse_rss_items(xml, limit);
    if !rss.is_empty() {
        return rss;
    }
    parse_atom_entries(xml, limit)
}

#[derive(Default)]
struct PendingEntry {
    title: Option<String>,
    link: Option<String>,
    date: Option<String>,
}

impl PendingEntry {
    fn finish(self) -> Option<DiscoveredPost> {
        let title = self.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
        let url = self.link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty())?;
        Some(DiscoveredPost {
            title,
            url,
            published_at: parse_date(self.date.as_deref()),
            score: 0,
            comments: 0,
        })
    }
}

fn parse_rss_items(xml: &str, limit: usize) -> Vec<DiscoveredPost> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut posts = Vec::new();
    let mut entry: Option<PendingEntry> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"item" => entry = Some(PendingEntry::default()),
                b"title" if entry.is_some() => field = Some(Field::Title),
                b"link" if entry.is_some() => field = Some(Field::Link),
                b"pubDate" if entry.is_some() => field = Some(Field::Date),
                _ => field = None,
            },
            Ok(Event::Text(t)) => {
                if let (Some(entry), Some(field)) = (entry.as_mut(), field) {
                    if let Ok(text) = t.unescape() {
                        field.assign(entry, &text);
                    }
                }
            }
            Ok(Event::CData(t)) => {
                if let (Some(entry), Some(field)) = (entry.as_mut(), field) {
                    let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                    field.assign(entry, &text);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"item" => {
                    if let Some(post) = entry.take().and_then(PendingEntry::finish) {
                        posts.push(post);
                        if posts.len() >= limit {
                            return posts;
                        }
                    }
                }
                _ => field = None,
            },
            Ok(Event::Eof) | Err(_) => break,
            Ok(_) => {}
        }
    }

    posts
}

fn parse_atom_entries(xml: &str, limit: usize) -> Vec<DiscoveredPost> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut posts = Vec::new();
    let mut entry: Option<PendingEntry> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"entry" => entry = Some(PendingEntry::default()),
                b"title" if entry.is_some() => field = Some(Field::Title),
                b"published" | b"updated" if entry.is_some() => field = Some(Field::Date),
                b"link" if entry.is_some() => {
                    assign_atom_link(entry.as_mut(), &e);
                    field = None;
                }
                _ => field = None,
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"link" && entry.is_some() {
                    assign_atom_link(entry.as_mut(), &e);
                }
            }
            Ok(Event::Text(t)) => {
                if let (Some(entry), Some(field)) = (entry.as_mut(), field) {
                    if let Ok(text) = t.unescape() {
                        field.assign(entry, &text);
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"entry" => {
                    if let Some(post) = entry.take().and_then(PendingEntry::finish) {
                        posts.push(post);
                        if posts.len() >= limit {
                            return posts;
                        }
                    }
                }
                _ => field = None,
            },
            Ok(Event::Eof) | Err(_) => break,
            Ok(_) => {}
        }
    }

    posts
}

fn assign_atom_link(entry: Option<&mut PendingEntry>, e: &quick_xml::events::BytesStart<'_>) {
    let Some(entry) = entry else { return };

    let rel = attr_value(e, b"rel");
    // Prefer rel="alternate" (or no rel); never let rel="self" etc. clobber it.
    let is_alternate = rel.as_deref().is_none_or(|r| r == "alternate");
    if !is_alternate && entry.link.is_some() {
        return;
    }

    if let Some(href) = attr_value(e, b"href") {
        if is_alternate || entry.link.is_none() {
            entry.link = Some(href);
        }
    }
}

fn attr_value(e: &quick_xml::events::BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

#[derive(Clone, Copy)]
enum Field {
    Title,
    Link,
    Date,
}

impl Field {
    fn assign(self, entry: &mut PendingEntry, text: &str) {
        let slot = match self {
            Field::Title => &mut entry.title,
            Field::Link => &mut entry.link,
            Field::Date => &mut entry.date,
        };
        if slot.is_none() {
            *slot = Some(text.to_string());
        }
    }
}

/// Parses an RFC 2822 (RSS) or RFC 3339 (Atom) timestamp; unparseable or
/// missing dates fall back to now so the post still sorts into the backlog.
fn parse_date(raw: Option<&str>) -> DateTime<Utc> {
    let Some(raw) = raw else { return Utc::now() };
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc);
    }
    Utc::now()
}

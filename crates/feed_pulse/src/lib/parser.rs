//! # Feed Parser
//!
//! This module parses the Atom document YouTube serves for a channel's
//! uploads (`/feeds/videos.xml?channel_id=...`) into [`ChannelFeed`].
//!
//! The document shape is small and stable, so it is matched with a handful of
//! regular expressions rather than a full XML parser.

use std::{ops::Deref, sync::LazyLock};

use chrono::DateTime;
use regex::{Captures, Regex};

use crate::{
    error::Error,
    types::{watch_url, ChannelFeed, FeedEntry},
};

static FEED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<feed\b[^>]*>(.*)</feed>").unwrap());
static ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<entry\b[^>]*>(.*?)</entry>").unwrap());
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<title\b[^>]*>(.*?)</title>").unwrap());
static VIDEO_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<yt:videoId>\s*([^<\s]+)\s*</yt:videoId>").unwrap());
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<link\b[^>]*>").unwrap());
static HREF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bhref="([^"]*)""#).unwrap());
static REL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\brel="([^"]*)""#).unwrap());
static PUBLISHED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<published>\s*([^<]+?)\s*</published>").unwrap());
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").unwrap());

/// Raw feed document as served by YouTube
#[derive(Debug, Clone)]
pub struct YtFeedDocument(String);

impl YtFeedDocument {
    pub fn new(xml: impl Into<String>) -> Self {
        YtFeedDocument(xml.into())
    }

    pub fn parse(&self) -> Result<ChannelFeed, Error> {
        parse_feed(self)
    }
}

impl From<String> for YtFeedDocument {
    fn from(value: String) -> Self {
        YtFeedDocument(value)
    }
}

impl Deref for YtFeedDocument {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Parses a channel feed.
///
/// # Returns
/// * `Ok(ChannelFeed)` with the feed title and every entry carrying a video id,
///   in document order (newest first).
/// * `Err(Error::ParseError)` if the document has no `<feed>` element.
#[tracing::instrument(skip_all)]
pub fn parse_feed(xml: &str) -> Result<ChannelFeed, Error> {
    let body = FEED_RE
        .captures(xml)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or(Error::ParseError(
            "Failed to find <feed> element, structure might have changed",
        ))?;

    // the feed-level <title> precedes the first <entry>
    let head = body.split("<entry").next().unwrap_or_default();
    let channel_title = capture(&TITLE_RE, head)
        .map(|t| unescape_xml(&t))
        .filter(|t| !t.is_empty());

    let entries = ENTRY_RE
        .captures_iter(body)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .filter_map(parse_entry)
        .collect();

    Ok(ChannelFeed {
        channel_title,
        entries,
    })
}

fn parse_entry(entry: &str) -> Option<FeedEntry> {
    let Some(video_id) = capture(&VIDEO_ID_RE, entry) else {
        tracing::debug!("Skipping feed entry without a video id");
        return None;
    };

    let title = capture(&TITLE_RE, entry)
        .map(|t| unescape_xml(&t))
        .unwrap_or_default();

    let link = alternate_link(entry)
        .map(|l| unescape_xml(&l))
        .unwrap_or_else(|| watch_url(&video_id));

    let published = capture(&PUBLISHED_RE, entry).and_then(|p| {
        DateTime::parse_from_rfc3339(&p)
            .inspect_err(|e| tracing::debug!(error = %e, published = %p, "Unparseable date"))
            .ok()
    });

    Some(FeedEntry {
        video_id,
        title,
        link,
        published,
    })
}

fn capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn alternate_link(entry: &str) -> Option<String> {
    LINK_RE
        .find_iter(entry)
        .map(|m| m.as_str())
        .find(|tag| capture(&REL_RE, tag).map_or(true, |rel| rel == "alternate"))
        .and_then(|tag| capture(&HREF_RE, tag))
}

fn unescape_xml(s: &str) -> String {
    ENTITY_RE
        .replace_all(s, |c: &Captures| {
            let entity = &c[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| entity.strip_prefix('#').map(|dec| dec.parse::<u32>()))
                    .and_then(Result::ok)
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| c[0].to_string(), String::from)
        })
        .into_owned()
}

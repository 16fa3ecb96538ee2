//! Snapshot deserialization.
//!
//! The collaborator hands over one JSON object per document: a nested,
//! kind-tagged block graph mirroring the editor's internal model. All
//! field probing happens here, once; the rest of the crate works on the
//! typed [`Block`]/[`BlockKind`] arena.
//!
//! Decoding is lenient per block: a child that fails to decode is dropped
//! and the rest of the tree survives. Only a `null` snapshot (the
//! collaborator obtained nothing) or a root that is not an object at all
//! fails the parse.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use super::block::ImageRef;
use super::{Block, BlockId, BlockKind, DocumentTree};
use crate::error::{Error, Result};
use crate::inline::{InlineRun, Mention, RunStyle};

impl DocumentTree {
    /// Parse a tree from a JSON snapshot string.
    pub fn from_snapshot_str(snapshot: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(snapshot)?;
        Self::from_json(value)
    }

    /// Parse a tree from a decoded JSON snapshot.
    ///
    /// A `null` value means the collaborator could not obtain the tree and
    /// maps to [`Error::SourceUnavailable`].
    pub fn from_json(value: Value) -> Result<Self> {
        if value.is_null() {
            return Err(Error::SourceUnavailable);
        }
        let raw: RawBlock = serde_json::from_value(value)?;
        let (root, children) = raw.into_parts();
        let mut tree = DocumentTree::with_root(root);
        add_children(&mut tree, BlockId::ROOT, children);
        Ok(tree)
    }
}

fn add_children(tree: &mut DocumentTree, parent: BlockId, children: Vec<Value>) {
    for value in children {
        let raw: RawBlock = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(err) => {
                debug!(error = %err, "dropping undecodable block");
                continue;
            }
        };
        let (block, grandchildren) = raw.into_parts();
        let id = tree.alloc(block);
        tree.append_child(parent, id);
        add_children(tree, id, grandchildren);
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawBlock {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    snapshot: RawSnapshot,
    record: Option<RawRecord>,
    #[serde(rename = "zoneState")]
    zone: Option<RawZone>,
    children: Vec<Value>,
}

impl RawBlock {
    fn into_parts(self) -> (Block, Vec<Value>) {
        let kind = kind_from_tag(&self.kind, &self.snapshot, self.record.as_ref());
        let (runs, all_text) = match self.zone {
            Some(zone) => (
                zone.ops
                    .map(|ops| ops.into_iter().map(run_from_op).collect()),
                zone.all_text,
            ),
            None => (None, None),
        };
        (
            Block {
                id: self.id,
                kind,
                runs,
                all_text,
            },
            self.children,
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSnapshot {
    seq: Option<Value>,
    done: Option<bool>,
    columns_id: Option<Vec<String>>,
    token: Option<String>,
    language: Option<String>,
    image: Option<RawImage>,
    iframe: Option<RawIframe>,
    data: Option<RawIsv>,
    rows: Option<Vec<Vec<String>>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRecord {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawImage {
    token: String,
    name: Option<String>,
    fetchable: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawIframe {
    component: Option<RawIframeComponent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawIframeComponent {
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawIsv {
    data: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawZone {
    ops: Option<Vec<RawOp>>,
    #[serde(rename = "allText")]
    all_text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawOp {
    insert: Option<Value>,
    attributes: Option<RawAttrs>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAttrs {
    #[serde(deserialize_with = "truthy")]
    bold: bool,
    #[serde(deserialize_with = "truthy")]
    italic: bool,
    #[serde(deserialize_with = "truthy")]
    strikethrough: bool,
    #[serde(rename = "inlineCode", deserialize_with = "truthy")]
    inline_code: bool,
    equation: Option<String>,
    #[serde(rename = "textHighlight")]
    text_highlight: Option<String>,
    #[serde(rename = "textHighlightBackground")]
    text_highlight_background: Option<String>,
    link: Option<String>,
    #[serde(rename = "inline-component")]
    inline_component: Option<String>,
    #[serde(rename = "fixEnter", deserialize_with = "truthy")]
    fix_enter: bool,
}

impl RawAttrs {
    fn into_style(self) -> RunStyle {
        let mention = self.inline_component.as_deref().and_then(parse_mention);
        RunStyle {
            bold: self.bold,
            italic: self.italic,
            strikethrough: self.strikethrough,
            inline_code: self.inline_code,
            equation: self.equation.filter(|e| !e.is_empty()),
            fore_color: self.text_highlight,
            back_color: self.text_highlight_background,
            link: self.link,
            mention,
            pad_marker: self.fix_enter,
        }
    }
}

/// The editor serializes style flags inconsistently (booleans, strings,
/// numbers); map anything truthy-looking to `true`.
fn truthy<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty() && s != "false",
        Some(_) => true,
    })
}

fn run_from_op(op: RawOp) -> InlineRun {
    let text = match op.insert {
        Some(Value::String(s)) => s,
        _ => String::new(),
    };
    let style = op.attributes.map(RawAttrs::into_style).unwrap_or_default();
    InlineRun { text, style }
}

/// The embedded-reference payload arrives as a JSON string inside the run
/// attributes; anything that fails to parse is ignored.
fn parse_mention(raw: &str) -> Option<Mention> {
    #[derive(Deserialize)]
    struct RawComponent {
        #[serde(rename = "type")]
        kind: String,
        data: Option<RawMentionData>,
    }
    #[derive(Deserialize)]
    struct RawMentionData {
        #[serde(default)]
        title: String,
        #[serde(default)]
        raw_url: String,
    }

    let component: RawComponent = serde_json::from_str(raw).ok()?;
    if component.kind != "mention_doc" {
        return None;
    }
    let data = component.data?;
    Some(Mention {
        title: data.title,
        url: data.raw_url,
    })
}

/// Explicit sequence numbers are honored only when numeric and positive;
/// the editor's `"auto"`/`"undefined"` sentinels fall through to the
/// sibling scan.
fn parse_seq(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64().filter(|n| *n > 0),
        Value::String(s) => s.parse::<u64>().ok().filter(|n| *n > 0),
        _ => None,
    }
}

fn kind_from_tag(tag: &str, snapshot: &RawSnapshot, record: Option<&RawRecord>) -> BlockKind {
    if let Some(level) = tag.strip_prefix("heading").and_then(|s| s.parse::<u8>().ok())
        && (1..=9).contains(&level)
    {
        return BlockKind::Heading(level);
    }
    match tag {
        "page" => BlockKind::Page,
        "text" => BlockKind::Text,
        "divider" => BlockKind::Divider,
        "code" => BlockKind::Code {
            language: snapshot.language.clone().unwrap_or_default().to_lowercase(),
        },
        "quote_container" => BlockKind::Quote,
        "callout" => BlockKind::Callout,
        "bullet" => BlockKind::Bullet,
        "ordered" => BlockKind::Ordered {
            seq: parse_seq(snapshot.seq.as_ref()),
        },
        "todo" => BlockKind::Todo {
            done: snapshot.done.unwrap_or(false),
        },
        "table" => BlockKind::Table {
            columns: snapshot.columns_id.as_ref().map_or(0, Vec::len),
        },
        "sheet" => BlockKind::Sheet {
            token: snapshot.token.clone().unwrap_or_default(),
            record_id: record.map(|r| r.id.clone()).filter(|id| !id.is_empty()),
            cached_rows: snapshot.rows.clone(),
        },
        "image" => BlockKind::Image(snapshot.image.as_ref().map(|img| ImageRef {
            token: img.token.clone(),
            name: img
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "image".to_string()),
            fetchable: img.fetchable.unwrap_or(true),
        })),
        "grid" => BlockKind::Grid,
        "iframe" => BlockKind::Iframe {
            url: snapshot
                .iframe
                .as_ref()
                .and_then(|f| f.component.as_ref())
                .and_then(|c| c.url.clone()),
        },
        "isv" => BlockKind::Diagram {
            source: snapshot.data.as_ref().and_then(|d| d.data.clone()),
        },
        "synced_source" => BlockKind::SyncedSource,
        "toggle_heading" => BlockKind::ToggleHeading,
        other => BlockKind::Unknown(other.to_string()),
    }
}

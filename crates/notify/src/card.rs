//! Google Chat card rendering.
//!
//! Turns a [`Payload`] into a `cardsV2` document with one card, one header and
//! exactly one section. The layout is chosen by the payload's shape; nested
//! structures are not expanded and render through their JSON text.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Title used when the caller gives no header.
pub const DEFAULT_HEADER: &str = "Message from Blankly";

const CARD_ID: &str = "resultCard";

// ── Payload ─────────────────────────────────────────────────────────

/// Rows of cells under named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    /// Rendered as a text paragraph above the grid.
    pub caption: Option<String>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            caption: None,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Append a row. Short rows are padded with `null`, extra cells are dropped.
    pub fn push_row<I, V>(&mut self, row: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut cells: Vec<Value> = row.into_iter().map(Into::into).collect();
        cells.resize(self.columns.len(), Value::Null);
        self.rows.push(cells);
    }

    /// Builder form of [`Table::push_row`].
    pub fn row<I, V>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_row(row);
        self
    }

    /// Build a table from JSON objects that all share the same key set.
    ///
    /// Column order follows the first object. Returns `None` when the slice is
    /// empty, holds a non-object, or the key sets differ.
    pub fn from_records(records: &[Value]) -> Option<Self> {
        let first = records.first()?.as_object()?;
        if first.is_empty() {
            return None;
        }
        let columns: Vec<String> = first.keys().cloned().collect();

        let mut table = Table::new(columns.iter().cloned());
        for record in records {
            let obj = record.as_object()?;
            if obj.len() != columns.len() {
                return None;
            }
            let row = columns
                .iter()
                .map(|c| obj.get(c).cloned())
                .collect::<Option<Vec<_>>>()?;
            table.rows.push(row);
        }
        Some(table)
    }

    /// Number of cells after flattening (headers excluded).
    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
}

/// A chat message, tagged by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Plain text, sent as `{"text": ...}` rather than a card.
    Text(String),
    Table(Table),
    /// Key/value pairs in insertion order.
    Mapping(IndexMap<String, Value>),
    /// Ordered list of items, one paragraph each.
    Sequence(Vec<Value>),
    /// Fixed-arity positional record, rendered as a single grid row.
    Record(Vec<Value>),
    Scalar(Value),
}

impl Payload {
    pub fn text(text: impl Into<String>) -> Self {
        Payload::Text(text.into())
    }

    pub fn mapping<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Payload::Mapping(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn sequence<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Payload::Sequence(items.into_iter().map(Into::into).collect())
    }

    pub fn record<I, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Payload::Record(fields.into_iter().map(Into::into).collect())
    }

    /// Classify an untyped JSON value.
    ///
    /// Precedence: table (non-empty array of objects sharing one key set),
    /// mapping (object), sequence (any other array), text (string), scalar.
    /// JSON has no tuple type, so records are never inferred.
    pub fn infer(value: Value) -> Self {
        match value {
            Value::Array(items) => match Table::from_records(&items) {
                Some(table) => Payload::Table(table),
                None => Payload::Sequence(items),
            },
            Value::Object(map) => Payload::Mapping(map.into_iter().collect()),
            Value::String(s) => Payload::Text(s),
            other => Payload::Scalar(other),
        }
    }

    /// Short shape name, used in log fields.
    pub fn shape(&self) -> &'static str {
        match self {
            Payload::Text(_) => "text",
            Payload::Table(_) => "table",
            Payload::Mapping(_) => "mapping",
            Payload::Sequence(_) => "sequence",
            Payload::Record(_) => "record",
            Payload::Scalar(_) => "scalar",
        }
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<Table> for Payload {
    fn from(table: Table) -> Self {
        Payload::Table(table)
    }
}

impl From<IndexMap<String, Value>> for Payload {
    fn from(map: IndexMap<String, Value>) -> Self {
        Payload::Mapping(map)
    }
}

/// Classified like a JSON array, so uniform objects become a [`Table`].
/// Use [`Payload::sequence`] to force one paragraph per item.
impl<T: Into<Value>> From<Vec<T>> for Payload {
    fn from(items: Vec<T>) -> Self {
        Payload::infer(Value::Array(items.into_iter().map(Into::into).collect()))
    }
}

/// See [`Payload::infer`].
impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::infer(value)
    }
}

macro_rules! scalar_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Payload {
                fn from(v: $t) -> Self {
                    Payload::Scalar(Value::from(v))
                }
            }
        )*
    };
}

scalar_from!(bool, i32, i64, u32, u64, f32, f64);

macro_rules! record_from_tuple {
    ($($ty:ident $field:ident),+) => {
        impl<$($ty: Into<Value>),+> From<($($ty,)+)> for Payload {
            fn from(($($field,)+): ($($ty,)+)) -> Self {
                Payload::Record(vec![$($field.into()),+])
            }
        }
    };
}

record_from_tuple!(A a);
record_from_tuple!(A a, B b);
record_from_tuple!(A a, B b, C c);
record_from_tuple!(A a, B b, C c, D d);
record_from_tuple!(A a, B b, C c, D d, E e);
record_from_tuple!(A a, B b, C c, D d, E e, F f);
record_from_tuple!(A a, B b, C c, D d, E e, F f, G g);
record_from_tuple!(A a, B b, C c, D d, E e, F f, G g, H h);

/// Display form of a cell: strings without quotes, anything else as compact JSON.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── Card document ───────────────────────────────────────────────────

/// Root of a `cardsV2` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDocument {
    #[serde(rename = "cardsV2")]
    pub cards_v2: Vec<CardEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardEntry {
    pub card_id: String,
    pub card: Card,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub header: CardHeader,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardHeader {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub collapsible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncollapsible_widgets_count: Option<u32>,
    pub widgets: Vec<Widget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Widget {
    TextParagraph(TextParagraph),
    Grid(Grid),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextParagraph {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    pub column_count: usize,
    pub items: Vec<GridItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridItem {
    pub title: String,
    pub text_alignment: TextAlignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextAlignment {
    Center,
    Start,
}

impl Widget {
    fn paragraph(text: impl Into<String>) -> Self {
        Widget::TextParagraph(TextParagraph { text: text.into() })
    }

    fn grid(column_count: usize, items: Vec<GridItem>) -> Self {
        Widget::Grid(Grid {
            column_count,
            items,
        })
    }
}

impl GridItem {
    fn new(title: impl Into<String>, text_alignment: TextAlignment) -> Self {
        Self {
            title: title.into(),
            text_alignment,
        }
    }

    fn start(value: &Value) -> Self {
        Self::new(display_string(value), TextAlignment::Start)
    }
}

impl Section {
    fn collapsible(widgets: Vec<Widget>) -> Self {
        Self {
            collapsible: true,
            uncollapsible_widgets_count: Some(1),
            widgets,
        }
    }

    fn fixed(widgets: Vec<Widget>) -> Self {
        Self {
            collapsible: false,
            uncollapsible_widgets_count: None,
            widgets,
        }
    }
}

impl CardDocument {
    /// Header title of the (single) card.
    pub fn title(&self) -> Option<&str> {
        self.cards_v2.first().map(|c| c.card.header.title.as_str())
    }

    /// Sections of the (single) card.
    pub fn sections(&self) -> &[Section] {
        self.cards_v2
            .first()
            .map(|c| c.card.sections.as_slice())
            .unwrap_or_default()
    }

    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

// ── Rendering ───────────────────────────────────────────────────────

/// Render `payload` as a single-section card titled `header`.
pub fn render(header: &str, payload: &Payload) -> CardDocument {
    let section = match payload {
        Payload::Table(table) => table_section(table),
        Payload::Mapping(map) => {
            let items = map
                .iter()
                .flat_map(|(k, v)| {
                    [
                        GridItem::new(k.as_str(), TextAlignment::Start),
                        GridItem::start(v),
                    ]
                })
                .collect();
            Section::collapsible(vec![Widget::grid(2, items)])
        }
        Payload::Sequence(items) => Section::collapsible(
            items
                .iter()
                .map(|item| Widget::paragraph(display_string(item)))
                .collect(),
        ),
        Payload::Record(fields) => Section::fixed(vec![Widget::grid(
            fields.len(),
            fields.iter().map(GridItem::start).collect(),
        )]),
        Payload::Text(text) => Section::fixed(vec![Widget::paragraph(text.as_str())]),
        Payload::Scalar(value) => Section::fixed(vec![Widget::paragraph(display_string(value))]),
    };

    CardDocument {
        cards_v2: vec![CardEntry {
            card_id: CARD_ID.to_string(),
            card: Card {
                header: CardHeader {
                    title: header.to_string(),
                },
                sections: vec![section],
            },
        }],
    }
}

/// Header row (centered) followed by every cell in row-major order.
fn table_section(table: &Table) -> Section {
    let mut items = Vec::with_capacity(table.columns.len() + table.cell_count());
    items.extend(
        table
            .columns
            .iter()
            .map(|c| GridItem::new(c.as_str(), TextAlignment::Center)),
    );
    items.extend(table.rows.iter().flatten().map(GridItem::start));

    let mut widgets = Vec::with_capacity(2);
    if let Some(caption) = table.caption.as_deref().filter(|c| !c.is_empty()) {
        widgets.push(Widget::paragraph(caption));
    }
    widgets.push(Widget::grid(table.columns.len(), items));
    Section::collapsible(widgets)
}

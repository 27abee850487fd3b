use crate::aggregate::{Aggregator, AggregatorSelector};
use crate::convert::Converter;
use crate::error::Error;
use crate::format::Formatter;
use crate::projector::Projector;
use std::fmt;
use std::str::FromStr;

/// Horizontal alignment of a field's cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Right,
    Center,
}

impl FromStr for Align {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Align::Left),
            "right" => Ok(Align::Right),
            "center" => Ok(Align::Center),
            _ => Err(Error::UnknownAlignment(s.to_string())),
        }
    }
}

impl fmt::Display for Align {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Align::Left => write!(f, "left"),
            Align::Right => write!(f, "right"),
            Align::Center => write!(f, "center"),
        }
    }
}

impl Align {
    /// Pad `text` to `width` display columns.
    pub fn pad(&self, text: &str, width: usize) -> String {
        let len = crate::render::text_width(text);
        if len >= width {
            return text.to_string();
        }
        let fill = width - len;
        match self {
            Align::Left => format!("{}{}", text, " ".repeat(fill)),
            Align::Right => format!("{}{}", " ".repeat(fill), text),
            Align::Center => {
                let left = fill / 2;
                format!("{}{}{}", " ".repeat(left), text, " ".repeat(fill - left))
            }
        }
    }
}

/// A named column declaration. Pure data: owns no state and is shared by every render.
#[derive(Debug, Clone)]
pub struct Field {
    pub title: String,
    pub key: String,
    pub projector: Projector,
    pub converter: Option<Converter>,
    pub aggregator: Option<Aggregator>,
    pub formatters: Vec<Formatter>,
    pub align: Align,
    pub hidden: bool,
    /// Rendered as the row label and repeated on every page in row style
    pub is_title: bool,
    /// Synthesized from data by a `DynamicFields` placeholder
    pub is_dynamic: bool,
    /// Never pruned even when a group has no value for it
    pub required: bool,
}

impl Field {
    pub fn new(title: &str, projector: Projector) -> Self {
        Self {
            title: title.to_string(),
            key: title.to_string(),
            projector,
            converter: None,
            aggregator: None,
            formatters: Vec::new(),
            align: Align::Left,
            hidden: false,
            is_title: false,
            is_dynamic: false,
            required: false,
        }
    }

    pub fn title_field(title: &str, projector: Projector) -> Self {
        Self {
            is_title: true,
            ..Self::new(title, projector)
        }
    }

    pub fn key(mut self, key: &str) -> Self {
        self.key = key.to_string();
        self
    }

    pub fn converter(mut self, converter: Converter) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn aggregator(mut self, aggregator: Aggregator) -> Self {
        self.aggregator = Some(aggregator);
        self
    }

    pub fn formatter(mut self, formatter: Formatter) -> Self {
        self.formatters.push(formatter);
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn right(self) -> Self {
        self.align(Align::Right)
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// Fields rendered together under one sub-header. Affects layout only.
#[derive(Debug, Clone)]
pub struct Subgroup {
    pub title: String,
    pub fields: Vec<Field>,
}

impl Subgroup {
    pub fn new(title: &str, fields: Vec<Field>) -> Self {
        Self {
            title: title.to_string(),
            fields,
        }
    }
}

/// Order of synthesized dynamic fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DynamicFieldOrder {
    /// Order in which the keys first appear in the data
    #[default]
    Source,
    Ascending,
    Descending,
}

/// Projector kind chosen for a synthesized field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectorKind {
    String,
    Number,
    Float,
    Boolean,
}

impl ProjectorKind {
    pub fn build(&self, source: &str, key: &str) -> Projector {
        match self {
            ProjectorKind::String => Projector::string(source, &[key]),
            ProjectorKind::Number => Projector::number(source, &[key]),
            ProjectorKind::Float => Projector::float(source, &[key]),
            ProjectorKind::Boolean => Projector::boolean(source, &[key]),
        }
    }
}

pub type ProjectorSelector = fn(&str) -> ProjectorKind;

/// Placeholder expanded at evaluation time into one field per key found in `source`.
#[derive(Debug, Clone)]
pub struct DynamicFields {
    pub source: String,
    pub required: bool,
    pub order: DynamicFieldOrder,
    pub projector_selector: Option<ProjectorSelector>,
    pub aggregator_selector: Option<AggregatorSelector>,
}

impl DynamicFields {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            required: false,
            order: DynamicFieldOrder::Source,
            projector_selector: None,
            aggregator_selector: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn order(mut self, order: DynamicFieldOrder) -> Self {
        self.order = order;
        self
    }

    pub fn projector_selector(mut self, selector: ProjectorSelector) -> Self {
        self.projector_selector = Some(selector);
        self
    }

    pub fn aggregator_selector(mut self, selector: AggregatorSelector) -> Self {
        self.aggregator_selector = Some(selector);
        self
    }
}

/// One entry of a schema.
#[derive(Debug, Clone)]
pub enum Decl {
    Field(Field),
    Subgroup(Subgroup),
    Dynamic(DynamicFields),
}

impl From<Field> for Decl {
    fn from(field: Field) -> Self {
        Decl::Field(field)
    }
}

impl From<Subgroup> for Decl {
    fn from(subgroup: Subgroup) -> Self {
        Decl::Subgroup(subgroup)
    }
}

impl From<DynamicFields> for Decl {
    fn from(dynamic: DynamicFields) -> Self {
        Decl::Dynamic(dynamic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_counts_terminal_columns() {
        assert_eq!(Align::Left.pad("東京", 6), "東京  ");
        assert_eq!(Align::Right.pad("ab", 4), "  ab");
        assert_eq!(Align::Center.pad("東", 5), " 東  ");
    }

    #[test]
    fn test_align_pad() {
        assert_eq!(Align::Left.pad("ab", 5), "ab   ");
        assert_eq!(Align::Right.pad("ab", 5), "   ab");
        assert_eq!(Align::Center.pad("ab", 5), " ab  ");
        assert_eq!(Align::Right.pad("abcdef", 3), "abcdef");
    }

    #[test]
    fn test_align_from_str() {
        assert_eq!("RIGHT".parse::<Align>().unwrap(), Align::Right);
        assert!(matches!("justify".parse::<Align>(), Err(Error::UnknownAlignment(_))));
    }

    #[test]
    fn test_key_defaults_to_title() {
        let field = Field::new("Client Conns", Projector::number("stats", &["client_connections"]));
        assert_eq!(field.key, "Client Conns");
        assert_eq!(field.key("conns").key, "conns");
    }
}

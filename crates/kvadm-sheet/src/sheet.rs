use crate::error::{Error, Result};
use crate::field::{Decl, Field};
use crate::record::Record;
use indexmap::IndexSet;
use std::fmt;
use std::str::FromStr;

/// Rendering layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetStyle {
    /// Fields across, records down
    #[default]
    Columns,
    /// One line per field, one column per record
    Rows,
}

impl SheetStyle {
    pub fn flipped(&self) -> Self {
        match self {
            SheetStyle::Columns => SheetStyle::Rows,
            SheetStyle::Rows => SheetStyle::Columns,
        }
    }
}

impl FromStr for SheetStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "columns" | "column" => Ok(SheetStyle::Columns),
            "rows" | "row" => Ok(SheetStyle::Rows),
            _ => Err(format!("unknown sheet style '{}'", s)),
        }
    }
}

impl fmt::Display for SheetStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetStyle::Columns => write!(f, "columns"),
            SheetStyle::Rows => write!(f, "rows"),
        }
    }
}

/// Dynamic-row expansion over the keys of one source's per-node mapping. `depth`
/// is the number of nesting levels making up one iteration key (2 for
/// namespace -> set).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForEach {
    pub source: String,
    pub depth: usize,
}

/// Filter applied to fully projected records before grouping.
pub type RecordFilter = fn(&Record) -> bool;

/// Immutable report schema.
#[derive(Debug, Clone)]
pub struct Sheet {
    decls: Vec<Decl>,
    from_source: Vec<String>,
    for_each: Option<ForEach>,
    group_by: Vec<String>,
    order_by: Vec<String>,
    where_: Option<RecordFilter>,
    default_style: SheetStyle,
}

impl Sheet {
    pub fn builder(decls: Vec<Decl>) -> SheetBuilder {
        SheetBuilder {
            sheet: Sheet {
                decls,
                from_source: Vec::new(),
                for_each: None,
                group_by: Vec::new(),
                order_by: Vec::new(),
                where_: None,
                default_style: SheetStyle::Columns,
            },
        }
    }

    pub fn decls(&self) -> &[Decl] {
        &self.decls
    }

    pub fn from_source(&self) -> &[String] {
        &self.from_source
    }

    pub fn for_each(&self) -> Option<&ForEach> {
        self.for_each.as_ref()
    }

    pub fn group_by(&self) -> &[String] {
        &self.group_by
    }

    pub fn order_by(&self) -> &[String] {
        &self.order_by
    }

    pub fn where_filter(&self) -> Option<RecordFilter> {
        self.where_
    }

    pub fn default_style(&self) -> SheetStyle {
        self.default_style
    }

    pub fn has_dynamic_fields(&self) -> bool {
        self.decls.iter().any(|d| matches!(d, Decl::Dynamic(_)))
    }

    /// Declared fields, flattened out of their subgroups.
    pub fn static_fields(&self) -> impl Iterator<Item = &Field> {
        self.decls.iter().flat_map(|decl| match decl {
            Decl::Field(field) => std::slice::from_ref(field).iter(),
            Decl::Subgroup(subgroup) => subgroup.fields.iter(),
            Decl::Dynamic(_) => <&[Field]>::default().iter(),
        })
    }

    fn validate(&self) -> Result<()> {
        let mut keys = IndexSet::new();
        for field in self.static_fields() {
            if !keys.insert(field.key.as_str()) {
                return Err(Error::DuplicateFieldKey(field.key.clone()));
            }
        }

        let declared = |name: &str| self.from_source.iter().any(|s| s == name);
        let mut used: Vec<&str> = self
            .static_fields()
            .flat_map(|f| f.projector.sources())
            .collect();
        used.extend(self.decls.iter().filter_map(|d| match d {
            Decl::Dynamic(dynamic) => Some(dynamic.source.as_str()),
            _ => None,
        }));
        used.extend(self.for_each.iter().map(|fe| fe.source.as_str()));
        if let Some(name) = used.into_iter().find(|name| !declared(name)) {
            return Err(Error::UndeclaredSource(name.to_string()));
        }

        // Keys of dynamic fields are only known once data arrives; those sheets are
        // checked again after expansion.
        if !self.has_dynamic_fields() {
            check_keys_exist(&self.group_by, &self.order_by, |key| keys.contains(key))?;
        }
        Ok(())
    }
}

pub(crate) fn check_keys_exist(
    group_by: &[String],
    order_by: &[String],
    exists: impl Fn(&str) -> bool,
) -> Result<()> {
    if let Some(key) = group_by.iter().find(|k| !exists(k)) {
        return Err(Error::UnknownGroupBy(key.clone()));
    }
    if let Some(key) = order_by.iter().find(|k| !exists(k)) {
        return Err(Error::UnknownOrderBy(key.clone()));
    }
    Ok(())
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

pub struct SheetBuilder {
    sheet: Sheet,
}

impl SheetBuilder {
    pub fn from_source(mut self, names: &[&str]) -> Self {
        self.sheet.from_source = owned(names);
        self
    }

    /// One record per (node, key) for every key found in `source`.
    pub fn for_each(self, source: &str) -> Self {
        self.for_each_nested(source, 1)
    }

    pub fn for_each_nested(mut self, source: &str, depth: usize) -> Self {
        self.sheet.for_each = Some(ForEach {
            source: source.to_string(),
            depth: depth.max(1),
        });
        self
    }

    pub fn group_by(mut self, keys: &[&str]) -> Self {
        self.sheet.group_by = owned(keys);
        self
    }

    pub fn order_by(mut self, keys: &[&str]) -> Self {
        self.sheet.order_by = owned(keys);
        self
    }

    pub fn where_(mut self, filter: RecordFilter) -> Self {
        self.sheet.where_ = Some(filter);
        self
    }

    pub fn default_style(mut self, style: SheetStyle) -> Self {
        self.sheet.default_style = style;
        self
    }

    pub fn build(self) -> Result<Sheet> {
        self.sheet.validate()?;
        Ok(self.sheet)
    }
}

/// Build a `Vec<Decl>` from fields, subgroups and dynamic placeholders.
#[macro_export]
macro_rules! decls {
    ($($decl:expr),* $(,)?) => {
        vec![$($crate::Decl::from($decl)),*]
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{DynamicFields, Subgroup};
    use crate::projector::Projector;

    #[test]
    fn test_duplicate_key_inside_subgroups_rejected() {
        let result = Sheet::builder(decls![
            Subgroup::new("Disk", vec![Field::new("Used", Projector::number("ns", &["d"]))]),
            Subgroup::new("Memory", vec![Field::new("Used", Projector::number("ns", &["m"]))]),
        ])
        .from_source(&["ns"])
        .build();

        assert!(matches!(result, Err(Error::DuplicateFieldKey(key)) if key == "Used"));
    }

    #[test]
    fn test_unknown_group_by_rejected() {
        let result = Sheet::builder(decls![Field::new("Node", Projector::string("prefixes", &[]))])
            .from_source(&["prefixes"])
            .group_by(&["Cluster"])
            .build();
        assert!(matches!(result, Err(Error::UnknownGroupBy(_))));
    }

    #[test]
    fn test_unknown_order_by_rejected() {
        let result = Sheet::builder(decls![Field::new("Node", Projector::string("prefixes", &[]))])
            .from_source(&["prefixes"])
            .order_by(&["Uptime"])
            .build();
        assert!(matches!(result, Err(Error::UnknownOrderBy(_))));
    }

    #[test]
    fn test_undeclared_source_rejected() {
        let result = Sheet::builder(decls![Field::new("X", Projector::number("stats", &["x"]))])
            .from_source(&["prefixes"])
            .build();
        assert!(matches!(result, Err(Error::UndeclaredSource(name)) if name == "stats"));
    }

    #[test]
    fn test_dynamic_sheet_defers_key_check() {
        let sheet = Sheet::builder(decls![
            Field::new("Node", Projector::string("prefixes", &[])),
            DynamicFields::new("data"),
        ])
        .from_source(&["prefixes", "data"])
        .order_by(&["service-threads"])
        .build();
        assert!(sheet.is_ok());
    }

    #[test]
    fn test_style_flip_and_parse() {
        assert_eq!(SheetStyle::Rows.flipped(), SheetStyle::Columns);
        assert_eq!("rows".parse::<SheetStyle>().unwrap(), SheetStyle::Rows);
        assert!("grid".parse::<SheetStyle>().is_err());
    }
}

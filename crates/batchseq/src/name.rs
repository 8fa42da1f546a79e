use core::fmt;

use crate::{
    dialect::Dialect,
    error::{Error, Result},
};

/// One part of a qualified name.
///
/// Text wrapped in double quotes or backticks in the configuration is a
/// quoted identifier and is rendered with the dialect's quote characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identifier {
    text: String,
    quoted: bool,
}

impl Identifier {
    /// Creates an identifier from unquoted `text`.
    pub fn new(text: impl Into<String>, quoted: bool) -> Self {
        Self {
            text: text.into(),
            quoted,
        }
    }

    /// Parses raw configuration text. Blank text is no identifier.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let unquoted = [('"', '"'), ('`', '`')]
            .iter()
            .find_map(|&(open, close)| {
                raw.strip_prefix(open)
                    .and_then(|rest| rest.strip_suffix(close))
            });
        match unquoted {
            Some(text) if !text.is_empty() => Some(Self::new(text, true)),
            Some(_) => None,
            None => Some(Self::new(raw, false)),
        }
    }

    /// The identifier without quotes.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the identifier was quoted in the configuration.
    pub fn is_quoted(&self) -> bool {
        self.quoted
    }

    /// The identifier as it goes into SQL, quoted for `dialect` if needed.
    pub fn render(&self, dialect: Dialect) -> String {
        if self.quoted {
            dialect.quote(&self.text)
        } else {
            self.text.clone()
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quoted {
            write!(f, "\"{}\"", self.text)
        } else {
            f.write_str(&self.text)
        }
    }
}

/// Fully qualifies one server-side sequence.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SequenceIdentity {
    catalog: Option<Identifier>,
    schema: Option<Identifier>,
    name: Identifier,
}

impl SequenceIdentity {
    /// Creates an identity from already parsed parts.
    pub fn new(catalog: Option<Identifier>, schema: Option<Identifier>, name: Identifier) -> Self {
        Self {
            catalog,
            schema,
            name,
        }
    }

    /// Builds the identity from raw configuration strings.
    ///
    /// A `name` containing `.` outside of quotes is taken as already
    /// qualified (`schema.name` or `catalog.schema.name`) and the separate
    /// `catalog`/`schema` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the name is missing, blank, or has
    /// more than three parts.
    pub fn resolve(name: Option<&str>, catalog: Option<&str>, schema: Option<&str>) -> Result<Self> {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::configuration("no sequence name specified"))?;

        let parts = split_qualified(name);
        if parts.len() > 1 {
            return Self::parse_qualified(name, parts);
        }

        let name = Identifier::parse(name)
            .ok_or_else(|| Error::configuration("no sequence name specified"))?;
        Ok(Self {
            catalog: catalog.and_then(Identifier::parse),
            schema: schema.and_then(Identifier::parse),
            name,
        })
    }

    fn parse_qualified(text: &str, parts: Vec<&str>) -> Result<Self> {
        let invalid = || Error::configuration(format!("invalid qualified sequence name: {text}"));
        let parts = parts
            .into_iter()
            .map(|part| Identifier::parse(part).ok_or_else(invalid))
            .collect::<Result<Vec<_>>>()?;

        let mut parts = parts.into_iter();
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(name), None, None, None) => Ok(Self::new(None, None, name)),
            (Some(schema), Some(name), None, None) => Ok(Self::new(None, Some(schema), name)),
            (Some(catalog), Some(schema), Some(name), None) => {
                Ok(Self::new(Some(catalog), Some(schema), name))
            }
            _ => Err(invalid()),
        }
    }

    /// The catalog, if any.
    pub fn catalog(&self) -> Option<&Identifier> {
        self.catalog.as_ref()
    }

    /// The schema, if any.
    pub fn schema(&self) -> Option<&Identifier> {
        self.schema.as_ref()
    }

    /// The unqualified sequence name.
    pub fn name(&self) -> &Identifier {
        &self.name
    }

    /// The qualified name as it goes into SQL for `dialect`.
    pub fn render(&self, dialect: Dialect) -> String {
        [self.catalog.as_ref(), self.schema.as_ref(), Some(&self.name)]
            .into_iter()
            .flatten()
            .map(|part| part.render(dialect))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for SequenceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(catalog) = &self.catalog {
            write!(f, "{catalog}.")?;
        }
        if let Some(schema) = &self.schema {
            write!(f, "{schema}.")?;
        }
        write!(f, "{}", self.name)
    }
}

/// Splits on the dots that are not inside double quotes or backticks.
fn split_qualified(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote = None;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (None, '"' | '`') => quote = Some(c),
            (Some(open), _) if c == open => quote = None,
            (None, '.') => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_blank_name_fails() {
        assert!(SequenceIdentity::resolve(None, None, None).is_err());
        let err = SequenceIdentity::resolve(Some("  "), Some("cat"), None).unwrap_err();
        assert!(err.to_string().contains("no sequence name specified"));
    }

    #[test]
    fn qualifies_with_catalog_and_schema() {
        let id = SequenceIdentity::resolve(Some("seq_parent_id"), Some("app"), Some("public"))
            .unwrap();
        assert_eq!(id.catalog().map(Identifier::text), Some("app"));
        assert_eq!(id.schema().map(Identifier::text), Some("public"));
        assert_eq!(id.render(Dialect::Postgres), "app.public.seq_parent_id");
        assert_eq!(id.to_string(), "app.public.seq_parent_id");
    }

    #[test]
    fn blank_qualifiers_are_absent() {
        let id = SequenceIdentity::resolve(Some("seq"), Some(""), Some(" ")).unwrap();
        assert_eq!(id, SequenceIdentity::new(None, None, Identifier::new("seq", false)));
    }

    #[test]
    fn dotted_name_wins_over_separate_qualifiers() {
        let id = SequenceIdentity::resolve(Some("sales.seq_order"), Some("ignored"), Some("ignored"))
            .unwrap();
        assert_eq!(id.catalog(), None);
        assert_eq!(id.schema().map(Identifier::text), Some("sales"));
        assert_eq!(id.name().text(), "seq_order");

        let id = SequenceIdentity::resolve(Some("db.sales.seq_order"), None, None).unwrap();
        assert_eq!(id.catalog().map(Identifier::text), Some("db"));

        assert!(SequenceIdentity::resolve(Some("a.b.c.d"), None, None).is_err());
        assert!(SequenceIdentity::resolve(Some("a..b"), None, None).is_err());
    }

    #[test]
    fn quoted_parts_render_per_dialect() {
        let id = SequenceIdentity::resolve(Some("\"Order Seq\""), None, Some("`Sales`")).unwrap();
        assert!(id.name().is_quoted());
        assert_eq!(id.render(Dialect::SqlServer), "[Sales].[Order Seq]");
        assert_eq!(id.render(Dialect::MariaDb), "`Sales`.`Order Seq`");
        assert_eq!(id.render(Dialect::Oracle), "\"Sales\".\"Order Seq\"");
        assert_eq!(id.to_string(), "\"Sales\".\"Order Seq\"");
    }

    #[test]
    fn dots_inside_quotes_do_not_qualify() {
        let id = SequenceIdentity::resolve(Some("\"my.seq\""), None, Some("app")).unwrap();
        assert_eq!(id.name(), &Identifier::new("my.seq", true));
        assert_eq!(id.schema().map(Identifier::text), Some("app"));
        assert_eq!(id.render(Dialect::Postgres), "app.\"my.seq\"");

        let id = SequenceIdentity::resolve(Some("`a.b`.\"c.d\""), None, None).unwrap();
        assert_eq!(id.schema(), Some(&Identifier::new("a.b", true)));
        assert_eq!(id.name(), &Identifier::new("c.d", true));
        assert_eq!(id.render(Dialect::SqlServer), "[a.b].[c.d]");
    }
}

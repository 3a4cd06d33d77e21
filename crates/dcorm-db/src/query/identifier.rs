//! Dotted SQL names.

use std::fmt;

use dcorm_core::DcormResult;

use super::engine::{Compile, Engine};

/// An ordered sequence of name segments such as `schema.table.column`.
///
/// A path is plain data. The engine quotes each segment with the dialect's
/// identifier quotes and joins them with `.`; segments are never bound as
/// parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<String>);

impl Path {
    /// Creates a path from its segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Appends a segment.
    pub fn push(&mut self, segment: impl Into<String>) {
        self.0.push(segment.into());
    }

    /// Returns a copy of this path extended by `segment`.
    #[must_use]
    pub fn join(&self, segment: impl Into<String>) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    /// Returns the unquoted segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns `true` if the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl Compile for Path {
    fn compile(&self, engine: &mut Engine<'_>) -> DcormResult<()> {
        engine.identifier(self);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;

    #[test]
    fn test_display_joins_segments() {
        assert_eq!(Path::new(["main", "person", "id"]).to_string(), "main.person.id");
    }

    #[test]
    fn test_join_does_not_mutate() {
        let table = Path::new(["person"]);
        let column = table.join("name");
        assert_eq!(table.segments(), ["person"]);
        assert_eq!(column.segments(), ["person", "name"]);
    }

    #[test]
    fn test_compiles_quoted_without_values() {
        let dialect = Dialect::generic();
        let mut engine = Engine::new(&dialect);
        engine.sql(&Path::new(["person", "id"])).unwrap();
        let (sql, values) = engine.query();
        assert_eq!(sql, "\"person\".\"id\"");
        assert!(values.is_empty());
    }

    #[test]
    fn test_mysql_quoting() {
        let dialect = Dialect::mysql();
        let mut engine = Engine::new(&dialect);
        engine.sql(&Path::new(["person", "id"])).unwrap();
        assert_eq!(engine.query().0, "`person`.`id`");
    }
}

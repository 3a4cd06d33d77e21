//! ORDER BY terms.

use dcorm_core::DcormResult;

use super::engine::{Compile, Engine};
use super::expressions::Expression;
use super::literal::{keywords, Literal};
use crate::fields::Field;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    /// Returns the direction keyword.
    pub const fn literal(self) -> Literal {
        match self {
            Self::Asc => keywords::ASC,
            Self::Desc => keywords::DESC,
        }
    }
}

/// Placement of NULLs in a sorted column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
}

impl NullsOrder {
    /// Returns the NULLS placement keyword.
    pub const fn literal(self) -> Literal {
        match self {
            Self::First => keywords::NULLS_FIRST,
            Self::Last => keywords::NULLS_LAST,
        }
    }
}

/// An expression with a sort direction, used in ORDER BY.
///
/// NULL placement compiles only on dialects with
/// [`nulls_ordering`](crate::dialect::Dialect::nulls_ordering).
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedField {
    expression: Expression,
    direction: Direction,
    nulls: Option<NullsOrder>,
}

impl OrderedField {
    /// Orders by `expression` in `direction`.
    pub fn new(expression: impl Into<Expression>, direction: Direction) -> Self {
        Self {
            expression: expression.into(),
            direction,
            nulls: None,
        }
    }

    /// Sorts NULLs before all other values.
    #[must_use]
    pub const fn nulls_first(mut self) -> Self {
        self.nulls = Some(NullsOrder::First);
        self
    }

    /// Sorts NULLs after all other values.
    #[must_use]
    pub const fn nulls_last(mut self) -> Self {
        self.nulls = Some(NullsOrder::Last);
        self
    }

    /// Returns the sorted expression.
    pub const fn expression(&self) -> &Expression {
        &self.expression
    }

    /// Returns the sort direction.
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the NULLS placement, if one was requested.
    pub const fn nulls(&self) -> Option<NullsOrder> {
        self.nulls
    }
}

impl From<Field> for OrderedField {
    fn from(field: Field) -> Self {
        field.asc()
    }
}

impl From<Expression> for OrderedField {
    fn from(expression: Expression) -> Self {
        Self::new(expression, Direction::Asc)
    }
}

impl Compile for OrderedField {
    fn compile(&self, engine: &mut Engine<'_>) -> DcormResult<()> {
        if let Some(nulls) = self.nulls {
            if !engine.dialect().nulls_ordering {
                return Err(engine.dialect().not_supported(nulls.literal().keyword()));
            }
        }
        engine.sql(&self.expression)?.literal(self.direction.literal());
        if let Some(nulls) = self.nulls {
            engine.literal(nulls.literal());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use super::*;
    use crate::dialect::Dialect;
    use crate::fields::{ColumnType, FieldDef};
    use crate::model::ModelMeta;
    use dcorm_core::DcormError;

    static EVENT: LazyLock<ModelMeta> = LazyLock::new(|| {
        ModelMeta::new(
            "event",
            vec![
                FieldDef::new("id", ColumnType::Auto).primary_key(),
                FieldDef::new("starts", ColumnType::DateTime).nullable(),
            ],
        )
    });

    #[test]
    fn test_asc_desc() {
        let dialect = Dialect::generic();
        let asc = EVENT.field("id").unwrap().asc();
        let desc = EVENT.field("starts").unwrap().desc();
        assert_eq!(Engine::render(&dialect, &asc).unwrap().0, "\"event\".\"id\" ASC");
        assert_eq!(
            Engine::render(&dialect, &desc).unwrap().0,
            "\"event\".\"starts\" DESC"
        );
    }

    #[test]
    fn test_field_converts_to_ascending() {
        let ordered: OrderedField = EVENT.field("id").unwrap().into();
        assert_eq!(ordered.direction(), Direction::Asc);
        assert_eq!(ordered.nulls(), None);
    }

    #[test]
    fn test_nulls_last_supported() {
        let dialect = Dialect::postgres();
        let ordered = EVENT.field("starts").unwrap().desc().nulls_last();
        assert_eq!(
            Engine::render(&dialect, &ordered).unwrap().0,
            "\"event\".\"starts\" DESC NULLS LAST"
        );
    }

    #[test]
    fn test_nulls_first_not_supported() {
        let dialect = Dialect::mysql();
        let ordered = EVENT.field("starts").unwrap().asc().nulls_first();
        let err = Engine::render(&dialect, &ordered).unwrap_err();
        assert!(matches!(
            err,
            DcormError::NotSupported { ref feature, .. } if feature == "NULLS FIRST"
        ));
    }
}

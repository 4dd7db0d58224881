//! SQLite dialect.
//!
//! Several features only exist in newer SQLite releases, so the dialect
//! carries the version of the library it targets.

use super::rules::{Forbid, RequiresVersion, RuleSet};
use super::{Dialect, Node, Version};
use crate::ast::{DataType, JoinKind, UnionKind};

const OUTER_JOINS: Version = Version::new(3, 39, 0);
const RETURNING_AND_UPSERT: Version = Version::new(3, 35, 0);
const COMMON_TABLE_EXPRESSIONS: Version = Version::new(3, 8, 3);

/// SQLite 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sqlite {
    version: Version,
}

impl Sqlite {
    #[must_use]
    pub const fn new(version: Version) -> Self {
        Self { version }
    }

    /// The oldest version supporting every feature this crate renders.
    #[must_use]
    pub const fn latest() -> Self {
        Self::new(OUTER_JOINS)
    }

    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }
}

impl Default for Sqlite {
    fn default() -> Self {
        Self::latest()
    }
}

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite3"
    }

    /// SQLite stores dates as text.
    fn format_date(&self, date: chrono::NaiveDate) -> String {
        format!("'{}'", date.format("%Y-%m-%d"))
    }

    fn format_time(&self, time: chrono::NaiveTime) -> String {
        format!("'{}'", time.format("%H:%M:%S%.6f"))
    }

    fn format_timestamp(&self, timestamp: chrono::NaiveDateTime) -> String {
        format!("'{}'", timestamp.format("%Y-%m-%d %H:%M:%S%.6f"))
    }

    fn limit_for_offset_only(&self) -> Option<&'static str> {
        Some("-1")
    }

    /// SQLite only knows plain `UNION` for the distinct form.
    fn union_keyword(&self, kind: UnionKind) -> &'static str {
        match kind {
            UnionKind::All => " UNION ALL ",
            UnionKind::Distinct => " UNION ",
        }
    }

    fn rules(&self) -> RuleSet {
        RuleSet::new()
            .with(Forbid::new(
                "sqlite3.any",
                "SQLite does not support ANY(sub-select)",
                |node| matches!(node, Node::Any),
            ))
            .with(Forbid::new(
                "sqlite3.delete_using",
                "SQLite does not support DELETE ... USING",
                |node| matches!(node, Node::DeleteUsing),
            ))
            .with(Forbid::new(
                "sqlite3.temporal_cast",
                "SQLite does not support CAST to date, time or timestamp",
                |node| {
                    matches!(
                        node,
                        Node::Cast {
                            to: DataType::Date | DataType::Time | DataType::Timestamp,
                            ..
                        }
                    )
                },
            ))
            .with(Forbid::new(
                "sqlite3.truncate",
                "SQLite does not support TRUNCATE, use DELETE without WHERE",
                |node| matches!(node, Node::Truncate),
            ))
            .with(RequiresVersion::new(
                "sqlite3.outer_join_version",
                "RIGHT and FULL OUTER JOIN",
                OUTER_JOINS,
                self.version,
                |node| {
                    matches!(
                        node,
                        Node::Join(JoinKind::RightOuter | JoinKind::FullOuter)
                    )
                },
            ))
            .with(RequiresVersion::new(
                "sqlite3.returning_version",
                "RETURNING",
                RETURNING_AND_UPSERT,
                self.version,
                |node| matches!(node, Node::Returning),
            ))
            .with(RequiresVersion::new(
                "sqlite3.on_conflict_version",
                "ON CONFLICT",
                RETURNING_AND_UPSERT,
                self.version,
                |node| matches!(node, Node::OnConflict),
            ))
            .with(RequiresVersion::new(
                "sqlite3.with_version",
                "WITH",
                COMMON_TABLE_EXPRESSIONS,
                self.version,
                |node| matches!(node, Node::With),
            ))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::value::SqlValue;

    #[test]
    fn test_sqlite_dates_are_plain_text() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            Sqlite::default().format_literal(&SqlValue::Date(date)),
            "'2024-01-31'"
        );
    }

    #[test]
    fn test_version_gates() {
        let old = Sqlite::new(Version::new(3, 34, 1)).rules();
        assert_eq!(
            old.violation(&Node::Returning).map(|(rule, _)| rule),
            Some("sqlite3.returning_version")
        );
        assert!(old.violation(&Node::With).is_none());
        assert!(old.violation(&Node::Join(JoinKind::LeftOuter)).is_none());

        let ancient = Sqlite::new(Version::new(3, 7, 17)).rules();
        let (rule, message) = ancient.violation(&Node::With).unwrap();
        assert_eq!(rule, "sqlite3.with_version");
        assert_eq!(
            message,
            "WITH requires version 3.8.3 or later, configured version is 3.7.17"
        );

        let latest = Sqlite::latest().rules();
        assert!(latest.violation(&Node::Returning).is_none());
        assert!(latest.violation(&Node::Join(JoinKind::FullOuter)).is_none());
        assert!(latest.violation(&Node::Truncate).is_some());
    }
}

//! Section kinds and the tag matcher table.
//!
//! A datasource root holds its sections as direct children. The platform
//! writes some of them under feature-flagged names such as
//! `_.fcp.SchemaViewerObjectModel.true...folders-common`, so every section is
//! recognized through an explicit list of matcher rules instead of a plain
//! tag comparison.

use std::fmt;

use serde::Serialize;

/// How a root child's element name is matched against a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    /// The element name equals the tag.
    Exact(&'static str),
    /// The element name ends with `true...<tag>`.
    FlaggedSuffix(&'static str),
    /// The element name starts with the prefix.
    Prefix(&'static str),
}

impl MatchRule {
    #[must_use]
    pub fn matches(self, name: &str) -> bool {
        match self {
            Self::Exact(tag) => name == tag,
            Self::FlaggedSuffix(tag) => name
                .strip_suffix(tag)
                .is_some_and(|head| head.ends_with("true...")),
            Self::Prefix(prefix) => name.starts_with(prefix),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionKind {
    Connection,
    Aliases,
    Columns,
    ColumnInstances,
    DrillPaths,
    FoldersCommon,
    DateOptions,
    Extract,
    Layout,
}

// ---------------------------------------------------------------------------
// Matcher table
// ---------------------------------------------------------------------------

static RULES: [(SectionKind, &[MatchRule]); 9] = [
    (
        SectionKind::Connection,
        &[MatchRule::Exact("connection"), MatchRule::FlaggedSuffix("connection")],
    ),
    (
        SectionKind::Aliases,
        &[MatchRule::Exact("aliases"), MatchRule::FlaggedSuffix("aliases")],
    ),
    (
        SectionKind::Columns,
        &[MatchRule::Exact("column"), MatchRule::FlaggedSuffix("column")],
    ),
    (
        SectionKind::ColumnInstances,
        &[
            MatchRule::Exact("column-instance"),
            MatchRule::FlaggedSuffix("column-instance"),
        ],
    ),
    (
        SectionKind::DrillPaths,
        &[MatchRule::Exact("drill-paths"), MatchRule::FlaggedSuffix("drill-paths")],
    ),
    (
        SectionKind::FoldersCommon,
        &[
            MatchRule::Exact("folders-common"),
            MatchRule::FlaggedSuffix("folders-common"),
        ],
    ),
    (
        SectionKind::DateOptions,
        &[MatchRule::Exact("date-options"), MatchRule::FlaggedSuffix("date-options")],
    ),
    (
        SectionKind::Extract,
        &[MatchRule::Exact("extract"), MatchRule::FlaggedSuffix("extract")],
    ),
    (
        SectionKind::Layout,
        &[
            MatchRule::Exact("layout"),
            MatchRule::FlaggedSuffix("layout"),
            MatchRule::Prefix("layout _.fcp.SchemaViewerObjectModel.false..."),
        ],
    ),
];

impl SectionKind {
    /// Fixed processing order on save. The insertion cursor is shared across
    /// sections in this order.
    pub const SAVE_ORDER: [Self; 9] = [
        Self::Connection,
        Self::Aliases,
        Self::Columns,
        Self::ColumnInstances,
        Self::DrillPaths,
        Self::FoldersCommon,
        Self::DateOptions,
        Self::Extract,
        Self::Layout,
    ];

    /// Base tag of the section.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Aliases => "aliases",
            Self::Columns => "column",
            Self::ColumnInstances => "column-instance",
            Self::DrillPaths => "drill-paths",
            Self::FoldersCommon => "folders-common",
            Self::DateOptions => "date-options",
            Self::Extract => "extract",
            Self::Layout => "layout",
        }
    }

    /// Element name used when a section is created that the document did not
    /// have before.
    #[must_use]
    pub const fn default_element_name(self) -> &'static str {
        match self {
            Self::FoldersCommon => "_.fcp.SchemaViewerObjectModel.true...folders-common",
            other => other.tag(),
        }
    }

    #[must_use]
    pub fn rules(self) -> &'static [MatchRule] {
        RULES
            .iter()
            .find(|(kind, _)| *kind == self)
            .map_or(&[] as &[MatchRule], |(_, rules)| *rules)
    }

    #[must_use]
    pub fn matches(self, element_name: &str) -> bool {
        self.rules().iter().any(|rule| rule.matches(element_name))
    }

    /// The section a root child belongs to, if any.
    #[must_use]
    pub fn classify(element_name: &str) -> Option<Self> {
        RULES
            .iter()
            .find(|(_, rules)| rules.iter().any(|rule| rule.matches(element_name)))
            .map(|(kind, _)| *kind)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

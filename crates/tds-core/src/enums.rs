//! Column attribute enums, connection fields and task kinds.
//!
//! All enums serialize as the lowercase / `snake_case` strings the datasource
//! XML and the desired-state files use, and parse back through `FromStr`
//! (unknown values are a `CoreError::Validation`).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

macro_rules! string_enum {
    ($ty:ident, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(CoreError::Validation(format!(
                        "unknown {}: '{other}'",
                        $label
                    ))),
                }
            }
        }
    };
}

// ---------------------------------------------------------------------------
// DataType
// ---------------------------------------------------------------------------

/// Column datatype as written in the `datatype` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Integer,
    Real,
    Boolean,
    Date,
    Datetime,
    Spatial,
    Table,
}

string_enum!(DataType, "datatype", {
    String => "string",
    Integer => "integer",
    Real => "real",
    Boolean => "boolean",
    Date => "date",
    Datetime => "datetime",
    Spatial => "spatial",
    Table => "table",
});

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Dimension,
    Measure,
}

string_enum!(Role, "role", {
    Dimension => "dimension",
    Measure => "measure",
});

// ---------------------------------------------------------------------------
// RoleType
// ---------------------------------------------------------------------------

/// The column's `type` attribute: discrete (nominal/ordinal) or continuous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RoleType {
    Nominal,
    Ordinal,
    Quantitative,
}

string_enum!(RoleType, "role type", {
    Nominal => "nominal",
    Ordinal => "ordinal",
    Quantitative => "quantitative",
});

// ---------------------------------------------------------------------------
// Persona
// ---------------------------------------------------------------------------

/// Shorthand for a (role, role type, datatype) combination used in
/// desired-state files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    StringDimension,
    DateDimension,
    DatetimeDimension,
    DateMeasure,
    DatetimeMeasure,
    DiscreteNumberDimension,
    ContinuousNumberDimension,
    DiscreteNumberMeasure,
    ContinuousNumberMeasure,
    DiscreteDecimalDimension,
    ContinuousDecimalDimension,
    DiscreteDecimalMeasure,
    ContinuousDecimalMeasure,
    BooleanDimension,
}

string_enum!(Persona, "persona", {
    StringDimension => "string_dimension",
    DateDimension => "date_dimension",
    DatetimeDimension => "datetime_dimension",
    DateMeasure => "date_measure",
    DatetimeMeasure => "datetime_measure",
    DiscreteNumberDimension => "discrete_number_dimension",
    ContinuousNumberDimension => "continuous_number_dimension",
    DiscreteNumberMeasure => "discrete_number_measure",
    ContinuousNumberMeasure => "continuous_number_measure",
    DiscreteDecimalDimension => "discrete_decimal_dimension",
    ContinuousDecimalDimension => "continuous_decimal_dimension",
    DiscreteDecimalMeasure => "discrete_decimal_measure",
    ContinuousDecimalMeasure => "continuous_decimal_measure",
    BooleanDimension => "boolean_dimension",
});

impl Persona {
    /// The (role, role type, datatype) triple this persona stands for.
    #[must_use]
    #[allow(clippy::match_same_arms)]
    pub const fn attributes(self) -> (Role, RoleType, DataType) {
        match self {
            Self::StringDimension => (Role::Dimension, RoleType::Nominal, DataType::String),
            Self::DateDimension => (Role::Dimension, RoleType::Ordinal, DataType::Date),
            Self::DatetimeDimension => (Role::Dimension, RoleType::Ordinal, DataType::Datetime),
            Self::DateMeasure => (Role::Measure, RoleType::Ordinal, DataType::Date),
            Self::DatetimeMeasure => (Role::Measure, RoleType::Ordinal, DataType::Datetime),
            Self::DiscreteNumberDimension => {
                (Role::Dimension, RoleType::Ordinal, DataType::Integer)
            }
            Self::ContinuousNumberDimension => {
                (Role::Dimension, RoleType::Quantitative, DataType::Integer)
            }
            Self::DiscreteNumberMeasure => (Role::Measure, RoleType::Ordinal, DataType::Integer),
            Self::ContinuousNumberMeasure => {
                (Role::Measure, RoleType::Quantitative, DataType::Integer)
            }
            Self::DiscreteDecimalDimension => (Role::Dimension, RoleType::Ordinal, DataType::Real),
            Self::ContinuousDecimalDimension => {
                (Role::Dimension, RoleType::Quantitative, DataType::Real)
            }
            Self::DiscreteDecimalMeasure => (Role::Measure, RoleType::Ordinal, DataType::Real),
            Self::ContinuousDecimalMeasure => {
                (Role::Measure, RoleType::Quantitative, DataType::Real)
            }
            Self::BooleanDimension => (Role::Dimension, RoleType::Nominal, DataType::Boolean),
        }
    }

    /// Reverse lookup; `None` when no persona covers the combination.
    #[must_use]
    pub fn from_attributes(role: Role, role_type: RoleType, datatype: DataType) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|persona| persona.attributes() == (role, role_type, datatype))
    }
}

// ---------------------------------------------------------------------------
// ConnectionField
// ---------------------------------------------------------------------------

/// Attributes of a named sub-connection that convergence manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionField {
    ClassName,
    Dbname,
    Schema,
    Server,
    Service,
    Username,
    Warehouse,
}

string_enum!(ConnectionField, "connection field", {
    ClassName => "class",
    Dbname => "dbname",
    Schema => "schema",
    Server => "server",
    Service => "service",
    Username => "username",
    Warehouse => "warehouse",
});

// ---------------------------------------------------------------------------
// TaskKind
// ---------------------------------------------------------------------------

/// Kind of corrective action emitted by planning.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    AddMetadata,
    AddColumn,
    ModifyColumn,
    AddFolder,
    DeleteFolder,
    UpdateConnection,
}

string_enum!(TaskKind, "task kind", {
    AddMetadata => "add_metadata",
    AddColumn => "add_column",
    ModifyColumn => "modify_column",
    AddFolder => "add_folder",
    DeleteFolder => "delete_folder",
    UpdateConnection => "update_connection",
});

impl TaskKind {
    /// The order tasks are applied in. Metadata must exist before a column can
    /// claim it, and folders are created before columns are placed into them.
    pub const APPLY_ORDER: [Self; 6] = [
        Self::AddMetadata,
        Self::UpdateConnection,
        Self::AddFolder,
        Self::AddColumn,
        Self::ModifyColumn,
        Self::DeleteFolder,
    ];
}

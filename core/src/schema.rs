//! The entity field layout table.
//!
//! Every entity field is either unchanging (stored only in the structured
//! snapshot) or mutable (stored in the flat numeric buffer). Mutable fields
//! get a fixed block index in declaration order, and block b of the buffer
//! holds that field's value for every entity:
//!
//!   [x..] [y..] [vx..] ... [broken..] srb_time time_acc
//!
//! The table is static process-wide configuration: built once, validated
//! once, read-only afterwards.

use crate::error::{SimError, SimResult};
use std::sync::OnceLock;

/// Number of single-element values at the end of the buffer
/// (SRB burn timer, then time-acceleration factor).
pub const TRAILING_SCALARS: usize = 2;

/// Float-encoded landed-on value meaning "landed on nothing".
pub const NO_INDEX: f64 = -1.0;

/// The landed-on relation is the one string field that lives in the
/// numeric buffer, as a float-encoded entity index.
const LANDED_ON: &str = "landed_on";

/// How a mutable field's value is encoded in the f64 buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain numeric value, stored as-is.
    Scalar,
    /// Boolean, stored as 0.0 / 1.0.
    Flag,
    /// Name of another entity, stored as its float-encoded index
    /// (or the `NO_INDEX` sentinel).
    EntityRef,
}

/// Declared type of a field in the entity schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Scalar,
    Flag,
}

/// One entry in the declarative entity schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name:    &'static str,
    pub ty:      FieldType,
    pub mutable: bool,
}

/// The full entity schema. Mutable fields appear in buffer block order.
pub const ENTITY_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "name",                 ty: FieldType::Text,   mutable: false },
    FieldSpec { name: "mass",                 ty: FieldType::Scalar, mutable: false },
    FieldSpec { name: "radius",               ty: FieldType::Scalar, mutable: false },
    FieldSpec { name: "artificial",           ty: FieldType::Flag,   mutable: false },
    FieldSpec { name: "atmosphere_thickness", ty: FieldType::Scalar, mutable: false },
    FieldSpec { name: "atmosphere_scaling",   ty: FieldType::Scalar, mutable: false },
    FieldSpec { name: "x",                    ty: FieldType::Scalar, mutable: true },
    FieldSpec { name: "y",                    ty: FieldType::Scalar, mutable: true },
    FieldSpec { name: "vx",                   ty: FieldType::Scalar, mutable: true },
    FieldSpec { name: "vy",                   ty: FieldType::Scalar, mutable: true },
    FieldSpec { name: "heading",              ty: FieldType::Scalar, mutable: true },
    FieldSpec { name: "spin",                 ty: FieldType::Scalar, mutable: true },
    FieldSpec { name: "fuel",                 ty: FieldType::Scalar, mutable: true },
    FieldSpec { name: "throttle",             ty: FieldType::Scalar, mutable: true },
    FieldSpec { name: "landed_on",            ty: FieldType::Text,   mutable: true },
    FieldSpec { name: "broken",               ty: FieldType::Flag,   mutable: true },
];

/// Mutable entity fields, in buffer block order.
/// The discriminant is the block index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutableField {
    X,
    Y,
    Vx,
    Vy,
    Heading,
    Spin,
    Fuel,
    Throttle,
    LandedOn,
    Broken,
}

/// k in the buffer length n·k + 2.
pub const MUTABLE_FIELD_COUNT: usize = MutableField::ALL.len();

impl MutableField {
    pub const ALL: [MutableField; 10] = [
        MutableField::X,
        MutableField::Y,
        MutableField::Vx,
        MutableField::Vy,
        MutableField::Heading,
        MutableField::Spin,
        MutableField::Fuel,
        MutableField::Throttle,
        MutableField::LandedOn,
        MutableField::Broken,
    ];

    /// Block index of this field inside the numeric buffer.
    #[inline]
    pub fn block(self) -> usize {
        self as usize
    }

    pub fn from_block(block: usize) -> Option<MutableField> {
        Self::ALL.get(block).copied()
    }

    pub fn from_name(name: &str) -> Option<MutableField> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            MutableField::X        => "x",
            MutableField::Y        => "y",
            MutableField::Vx       => "vx",
            MutableField::Vy       => "vy",
            MutableField::Heading  => "heading",
            MutableField::Spin     => "spin",
            MutableField::Fuel     => "fuel",
            MutableField::Throttle => "throttle",
            MutableField::LandedOn => "landed_on",
            MutableField::Broken   => "broken",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            MutableField::LandedOn => FieldKind::EntityRef,
            MutableField::Broken   => FieldKind::Flag,
            _                      => FieldKind::Scalar,
        }
    }
}

/// A mutable field together with its assigned block index.
#[derive(Debug, Clone, Copy)]
pub struct MutableFieldSpec {
    pub field: MutableField,
    pub kind:  FieldKind,
    pub block: usize,
}

/// The field layout table, built from a schema listing at startup.
#[derive(Debug)]
pub struct FieldLayout {
    mutable:    Vec<MutableFieldSpec>,
    unchanging: Vec<&'static str>,
}

impl FieldLayout {
    /// Classify a schema listing. Fails if a mutable field is neither
    /// numeric, boolean, nor the landed-on entity reference, or if the
    /// listing disagrees with the block enum.
    pub fn from_specs(specs: &[FieldSpec]) -> SimResult<FieldLayout> {
        let mut mutable = Vec::new();
        let mut unchanging = Vec::new();

        for spec in specs {
            if !spec.mutable {
                unchanging.push(spec.name);
                continue;
            }
            let kind = match spec.ty {
                FieldType::Scalar => FieldKind::Scalar,
                FieldType::Flag => FieldKind::Flag,
                FieldType::Text if spec.name == LANDED_ON => FieldKind::EntityRef,
                FieldType::Text => {
                    return Err(SimError::MalformedSchema { field: spec.name.to_string() })
                }
            };
            let block = mutable.len();
            let field = MutableField::from_name(spec.name)
                .ok_or_else(|| SimError::MalformedSchema { field: spec.name.to_string() })?;
            if field.block() != block || field.kind() != kind {
                return Err(SimError::MalformedSchema { field: spec.name.to_string() });
            }
            mutable.push(MutableFieldSpec { field, kind, block });
        }

        Ok(FieldLayout { mutable, unchanging })
    }

    /// The process-wide layout for the built-in entity schema.
    /// A schema that fails to classify means the build itself is broken,
    /// so the process must refuse to start.
    pub fn standard() -> &'static FieldLayout {
        static LAYOUT: OnceLock<FieldLayout> = OnceLock::new();
        LAYOUT.get_or_init(|| {
            FieldLayout::from_specs(ENTITY_FIELDS)
                .expect("built-in entity schema must classify cleanly")
        })
    }

    /// Number of mutable fields (k in the buffer length n·k + 2).
    pub fn mutable_count(&self) -> usize {
        self.mutable.len()
    }

    pub fn mutable_fields(&self) -> &[MutableFieldSpec] {
        &self.mutable
    }

    pub fn unchanging_fields(&self) -> &[&'static str] {
        &self.unchanging
    }

    /// Block index for a field name, if the field is mutable.
    pub fn block_of(&self, name: &str) -> Option<usize> {
        self.mutable
            .iter()
            .find(|s| s.field.name() == name)
            .map(|s| s.block)
    }

    /// Field stored at a block index.
    pub fn field_at(&self, block: usize) -> Option<MutableField> {
        self.mutable.get(block).map(|s| s.field)
    }
}

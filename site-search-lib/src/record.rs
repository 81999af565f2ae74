//! Record shapes: the closed, ordered field schema a decoded row must satisfy.
//!
//! A shape is a static list of [`FieldSpec`]s plus a positional setter. The
//! [`record_shape!`](crate::record_shape) macro derives both from a plain
//! struct definition so field order, declared types and setters can never
//! drift apart.

use crate::error::DecodeError;
use std::fmt;

/// Semantic type of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Raw column text, assigned verbatim
    Text,
    /// Base-10 signed 64-bit integer
    Integer,
    /// Declarable, but not decodable
    Boolean,
    /// Declarable, but not decodable
    Float,
}

impl FieldKind {
    /// Name reported in `UnsupportedType` errors.
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
            FieldKind::Boolean => "boolean",
            FieldKind::Float => "float",
        }
    }

    /// Whether the decoder can populate a field of this kind.
    pub fn is_decodable(self) -> bool {
        matches!(self, FieldKind::Text | FieldKind::Integer)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One named, typed slot of a record shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// A decoded column value, ready to hand to a setter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
}

/// Maps a Rust field type onto its declared [`FieldKind`].
pub trait FieldType: Sized {
    const KIND: FieldKind;

    /// Converts a decoded value, or `None` if the value has the wrong kind.
    fn from_value(value: FieldValue) -> Option<Self>;
}

impl FieldType for String {
    const KIND: FieldKind = FieldKind::Text;

    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Text(text) => Some(text),
            FieldValue::Integer(_) => None,
        }
    }
}

impl FieldType for i64 {
    const KIND: FieldKind = FieldKind::Integer;

    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Integer(number) => Some(number),
            FieldValue::Text(_) => None,
        }
    }
}

impl FieldType for bool {
    const KIND: FieldKind = FieldKind::Boolean;

    fn from_value(_value: FieldValue) -> Option<Self> {
        None
    }
}

impl FieldType for f64 {
    const KIND: FieldKind = FieldKind::Float;

    fn from_value(_value: FieldValue) -> Option<Self> {
        None
    }
}

/// A statically shaped record that can be populated column by column.
pub trait Record: Default + Send + 'static {
    /// Fields in column order.
    const FIELDS: &'static [FieldSpec];

    /// Assigns the field at `index`. Returns `false` if the index is out of
    /// range or the value does not fit the field's type.
    fn set_field(&mut self, index: usize, value: FieldValue) -> bool;

    fn field_count() -> usize {
        Self::FIELDS.len()
    }
}

/// A record that names a host to probe.
pub trait HostRecord: Record {
    fn host(&self) -> &str;
}

/// Rejects shapes that declare a field the decoder cannot populate.
pub fn validate_shape<T: Record>() -> Result<(), DecodeError> {
    match T::FIELDS.iter().find(|field| !field.kind.is_decodable()) {
        Some(field) => Err(DecodeError::unsupported_type(field.kind.name())),
        None => Ok(()),
    }
}

/// Declares a struct together with its [`Record`] implementation.
///
/// Fields are listed in column order; each field type must implement
/// [`FieldType`].
///
/// ```rust
/// site_search_lib::record_shape! {
///     #[derive(Debug, Default)]
///     pub struct Pair {
///         pub name: String,
///         pub count: i64,
///     }
/// }
///
/// use site_search_lib::Record;
/// assert_eq!(Pair::field_count(), 2);
/// ```
#[macro_export]
macro_rules! record_shape {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$fmeta:meta])* $fvis:vis $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $field: $ty, )*
        }

        impl $crate::Record for $name {
            const FIELDS: &'static [$crate::FieldSpec] = &[
                $( $crate::FieldSpec::new(
                    stringify!($field),
                    <$ty as $crate::FieldType>::KIND,
                ), )*
            ];

            #[allow(unused_assignments)]
            fn set_field(&mut self, index: usize, value: $crate::FieldValue) -> bool {
                let mut slot = 0usize;
                $(
                    if index == slot {
                        return match <$ty as $crate::FieldType>::from_value(value) {
                            Some(parsed) => {
                                self.$field = parsed;
                                true
                            }
                            None => false,
                        };
                    }
                    slot += 1;
                )*
                false
            }
        }
    };
}

record_shape! {
    /// One row of the host list: rank, host and four descriptive columns
    /// that are carried through but never consumed by the probe stage.
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct SiteRow {
        pub rank: i64,
        pub url: String,
        pub root_domains: String,
        pub external_links: String,
        pub moz_rank: String,
        pub moz_trust: String,
    }
}

impl HostRecord for SiteRow {
    fn host(&self) -> &str {
        &self.url
    }
}

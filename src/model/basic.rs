//! The fixed table of basic (non-composite) type kinds.
use std::fmt;

/// One of the scalar/string kinds the format defines directly.
///
/// Each kind carries a fixed `(typestring char, is_fixed, fixed_size,
/// c_type, annotation_prefix, printf_format)` row, queried through the
/// methods below rather than duplicated at every call site.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum BasicKind {
    /// `boolean`
    Boolean,
    /// `byte`
    Byte,
    /// `int16`
    Int16,
    /// `uint16`
    Uint16,
    /// `int32`
    Int32,
    /// `uint32`
    Uint32,
    /// `int64`
    Int64,
    /// `uint64`
    Uint64,
    /// `handle`
    Handle,
    /// `double`
    Double,
    /// `string`
    String,
    /// `objectpath`
    ObjectPath,
    /// `signature`
    Signature,
}

/// Descriptive row for a single [`BasicKind`].
pub struct BasicRow {
    /// The schema keyword naming this kind.
    pub keyword: &'static str,
    /// The single-character typestring code (GVariant signature letter).
    pub typestring: char,
    /// Whether instances of this kind have a size fixed by the kind alone.
    pub is_fixed: bool,
    /// The fixed size in bytes, meaningful only when `is_fixed`.
    pub fixed_size: usize,
    /// The C type used for the accessor's return value.
    pub c_type: &'static str,
    /// The human-readable annotation prefix emitted by formatters in
    /// annotated mode (empty string means "no prefix").
    pub annotation_prefix: &'static str,
    /// A printf conversion specifier, or `None` when the kind needs a
    /// bespoke renderer (`boolean`, `double`, and the string-like kinds).
    pub printf_format: Option<&'static str>,
}

const ALL_KINDS: &[BasicKind] = &[
    BasicKind::Boolean,
    BasicKind::Byte,
    BasicKind::Int16,
    BasicKind::Uint16,
    BasicKind::Int32,
    BasicKind::Uint32,
    BasicKind::Int64,
    BasicKind::Uint64,
    BasicKind::Handle,
    BasicKind::Double,
    BasicKind::String,
    BasicKind::ObjectPath,
    BasicKind::Signature,
];

impl BasicKind {
    /// Every basic kind, in the order the schema's keyword list is given.
    pub fn all() -> &'static [BasicKind] {
        ALL_KINDS
    }

    /// Resolve a schema identifier to a basic kind, if it names one.
    pub fn from_name(name: &str) -> Option<BasicKind> {
        ALL_KINDS.iter().copied().find(|k| k.row().keyword == name)
    }

    /// The descriptive row for this kind.
    pub fn row(self) -> BasicRow {
        match self {
            BasicKind::Boolean => BasicRow {
                keyword: "boolean",
                typestring: 'b',
                is_fixed: true,
                fixed_size: 1,
                c_type: "gboolean",
                annotation_prefix: "boolean ",
                printf_format: None,
            },
            BasicKind::Byte => BasicRow {
                keyword: "byte",
                typestring: 'y',
                is_fixed: true,
                fixed_size: 1,
                c_type: "guint8",
                annotation_prefix: "byte ",
                printf_format: Some("%u"),
            },
            BasicKind::Int16 => BasicRow {
                keyword: "int16",
                typestring: 'n',
                is_fixed: true,
                fixed_size: 2,
                c_type: "gint16",
                annotation_prefix: "int16 ",
                printf_format: Some("%\" G_GINT16_FORMAT \""),
            },
            BasicKind::Uint16 => BasicRow {
                keyword: "uint16",
                typestring: 'q',
                is_fixed: true,
                fixed_size: 2,
                c_type: "guint16",
                annotation_prefix: "uint16 ",
                printf_format: Some("%\" G_GUINT16_FORMAT \""),
            },
            BasicKind::Int32 => BasicRow {
                keyword: "int32",
                typestring: 'i',
                is_fixed: true,
                fixed_size: 4,
                c_type: "gint32",
                annotation_prefix: "",
                printf_format: Some("%\" G_GINT32_FORMAT \""),
            },
            BasicKind::Uint32 => BasicRow {
                keyword: "uint32",
                typestring: 'u',
                is_fixed: true,
                fixed_size: 4,
                c_type: "guint32",
                annotation_prefix: "uint32 ",
                printf_format: Some("%\" G_GUINT32_FORMAT \""),
            },
            BasicKind::Int64 => BasicRow {
                keyword: "int64",
                typestring: 'x',
                is_fixed: true,
                fixed_size: 8,
                c_type: "gint64",
                annotation_prefix: "int64 ",
                printf_format: Some("%\" G_GINT64_FORMAT \""),
            },
            BasicKind::Uint64 => BasicRow {
                keyword: "uint64",
                typestring: 't',
                is_fixed: true,
                fixed_size: 8,
                c_type: "guint64",
                annotation_prefix: "uint64 ",
                printf_format: Some("%\" G_GUINT64_FORMAT \""),
            },
            BasicKind::Handle => BasicRow {
                keyword: "handle",
                typestring: 'h',
                is_fixed: true,
                fixed_size: 4,
                c_type: "gint32",
                annotation_prefix: "handle ",
                printf_format: Some("%\" G_GINT32_FORMAT \""),
            },
            BasicKind::Double => BasicRow {
                keyword: "double",
                typestring: 'd',
                is_fixed: true,
                fixed_size: 8,
                c_type: "gdouble",
                annotation_prefix: "",
                printf_format: None,
            },
            BasicKind::String => BasicRow {
                keyword: "string",
                typestring: 's',
                is_fixed: false,
                fixed_size: 1,
                c_type: "const gchar *",
                annotation_prefix: "",
                printf_format: None,
            },
            BasicKind::ObjectPath => BasicRow {
                keyword: "objectpath",
                typestring: 'o',
                is_fixed: false,
                fixed_size: 1,
                c_type: "const gchar *",
                annotation_prefix: "objectpath ",
                printf_format: None,
            },
            BasicKind::Signature => BasicRow {
                keyword: "signature",
                typestring: 'g',
                is_fixed: false,
                fixed_size: 1,
                c_type: "const gchar *",
                annotation_prefix: "signature ",
                printf_format: None,
            },
        }
    }

    /// The typestring character, e.g. `'i'` for `int32`.
    #[inline]
    pub fn typestring(self) -> char {
        self.row().typestring
    }

    /// Whether this kind's serialized size is fixed.
    #[inline]
    pub fn is_fixed(self) -> bool {
        self.row().is_fixed
    }

    /// The fixed serialized size in bytes; meaningful only when
    /// [`Self::is_fixed`].
    #[inline]
    pub fn fixed_size(self) -> usize {
        self.row().fixed_size
    }

    /// The alignment of this kind, which equals its fixed size for
    /// fixed kinds and `1` for the variable-length string-like kinds.
    #[inline]
    pub fn alignment(self) -> usize {
        self.row().fixed_size
    }

    /// Whether this kind renders with C string escaping rules
    /// (`string`/`objectpath`/`signature`).
    #[inline]
    pub fn is_string_like(self) -> bool {
        matches!(
            self,
            BasicKind::String | BasicKind::ObjectPath | BasicKind::Signature
        )
    }
}
impl fmt::Display for BasicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.row().keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typestrings_match_the_canonical_signature_letters() {
        let expected = "bynqiuxthdsog";
        for (kind, ch) in BasicKind::all().iter().zip(expected.chars()) {
            assert_eq!(kind.typestring(), ch, "{:?}", kind);
        }
    }

    #[test]
    fn alignment_equals_fixed_size_for_fixed_kinds() {
        for kind in BasicKind::all() {
            if kind.is_fixed() {
                assert_eq!(kind.alignment(), kind.fixed_size());
            } else {
                assert_eq!(kind.alignment(), 1);
            }
        }
    }

    #[test]
    fn from_name_round_trips_through_keyword() {
        for kind in BasicKind::all() {
            assert_eq!(BasicKind::from_name(kind.row().keyword), Some(*kind));
        }
        assert_eq!(BasicKind::from_name("not-a-basic-type"), None);
    }
}

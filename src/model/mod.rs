//! The resolved type model: a tree of [`TypeNode`]s with every derived
//! property (alignment, fixedness, typestring, struct layout) computed,
//! built by [`registry::build_schema`] from a parsed [`crate::schema::Schema`].
mod basic;
mod layout;
mod registry;

pub use self::basic::{BasicKind, BasicRow};
pub use self::layout::{
    align_up, compute_field_locations, compute_fixed_size, offset_slot_width, FieldLocation,
    FieldShape,
};
pub use self::registry::{build_schema, TypeRegistry};

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::schema::EndianAttr;

/// Shared handle to a node in the type tree. Types are structurally
/// shared: a named type referenced from two struct fields is the same
/// `TypeRef`, not a clone of it.
pub type TypeRef = Rc<TypeNode>;

/// One node of the resolved type tree.
///
/// `typename` starts empty for every node except a `variant`, and is
/// filled in by [`propagate_typename`] as names flow down from each
/// top-level declaration; `kind` is fixed at construction.
pub struct TypeNode {
    typename: RefCell<Option<String>>,
    pub kind: TypeKind,
}

/// The shape of a type, independent of what it may eventually be named.
pub enum TypeKind {
    Basic(BasicKind),
    /// The `variant` type: always named `"variant"`, fixed at construction.
    Variant,
    Array(TypeRef),
    Dict(BasicKind, TypeRef),
    Maybe(TypeRef),
    Struct(StructType),
}

/// One field of a resolved struct type.
pub struct Field {
    pub name: String,
    pub attrs: Vec<EndianAttr>,
    pub ty: TypeRef,
    /// The field's `(i, a, b, c)` offset descriptor.
    pub location: FieldLocation,
    pub is_last: bool,
}

/// A resolved struct type: its fields plus the layout computed over them.
pub struct StructType {
    pub fields: Vec<Field>,
    alignment: usize,
    is_fixed: bool,
    fixed_size: Option<usize>,
    framing_offset_count: usize,
}

impl StructType {
    /// The number of trailing framing-offset slots this struct's
    /// serialized form carries.
    pub fn framing_offset_count(&self) -> usize {
        self.framing_offset_count
    }

    /// Build a struct type from its already-resolved fields, running the
    /// offset-table algorithm once over their shapes.
    ///
    /// `framing_offset_count` only counts fields that are themselves
    /// variable-sized and not the struct's last field: the last field's
    /// end is implied by the container's own size, so it never needs a
    /// framing offset of its own. A scheme that instead counted every
    /// non-last field (fixed or not) would allocate framing-offset slots
    /// for fields whose end is already known from their fixed size, which
    /// is simply wrong, not just wasteful, since the accessors that read
    /// back offset `i` would desynchronize from the offsets actually
    /// written by a serializer that follows this same field list.
    fn new(fields: Vec<(String, Vec<EndianAttr>, TypeRef)>) -> StructType {
        let shapes: Vec<FieldShape> = fields
            .iter()
            .map(|(_, _, ty)| FieldShape {
                alignment: ty.alignment(),
                is_fixed: ty.is_fixed(),
                fixed_size: if ty.is_fixed() { ty.fixed_size().unwrap() } else { 0 },
            })
            .collect();
        let layout = compute_field_locations(&shapes);
        let alignment = shapes.iter().map(|s| s.alignment).max().unwrap_or(1);
        let fixed_size = if layout.is_fixed {
            Some(compute_fixed_size(&shapes, alignment))
        } else {
            None
        };
        let last_index = fields.len().checked_sub(1);
        let built_fields = fields
            .into_iter()
            .zip(layout.locations)
            .enumerate()
            .map(|(i, ((name, attrs, ty), location))| Field {
                name,
                attrs,
                ty,
                location,
                is_last: Some(i) == last_index,
            })
            .collect();
        StructType {
            fields: built_fields,
            alignment,
            is_fixed: layout.is_fixed,
            fixed_size,
            framing_offset_count: layout.framing_offset_count,
        }
    }
}

impl TypeNode {
    fn new(kind: TypeKind) -> TypeRef {
        let typename = match &kind {
            TypeKind::Variant => RefCell::new(Some("variant".to_string())),
            _ => RefCell::new(None),
        };
        Rc::new(TypeNode { typename, kind })
    }

    pub fn basic(kind: BasicKind) -> TypeRef {
        TypeNode::new(TypeKind::Basic(kind))
    }

    pub fn variant() -> TypeRef {
        TypeNode::new(TypeKind::Variant)
    }

    pub fn array(element: TypeRef) -> TypeRef {
        TypeNode::new(TypeKind::Array(element))
    }

    pub fn dict(key: BasicKind, value: TypeRef) -> TypeRef {
        TypeNode::new(TypeKind::Dict(key, value))
    }

    pub fn maybe(inner: TypeRef) -> TypeRef {
        TypeNode::new(TypeKind::Maybe(inner))
    }

    pub fn struct_of(fields: Vec<(String, Vec<EndianAttr>, TypeRef)>) -> TypeRef {
        TypeNode::new(TypeKind::Struct(StructType::new(fields)))
    }

    /// The name currently assigned to this node, if any.
    pub fn typename(&self) -> Option<String> {
        self.typename.borrow().clone()
    }

    /// `alignment(T)`.
    pub fn alignment(&self) -> usize {
        match &self.kind {
            TypeKind::Basic(kind) => kind.alignment(),
            TypeKind::Variant => 8,
            TypeKind::Array(element) | TypeKind::Maybe(element) => element.alignment(),
            TypeKind::Dict(key, value) => key.alignment().max(value.alignment()),
            TypeKind::Struct(s) => s.alignment,
        }
    }

    /// `is_fixed(T)`.
    pub fn is_fixed(&self) -> bool {
        match &self.kind {
            TypeKind::Basic(kind) => kind.is_fixed(),
            TypeKind::Variant => false,
            TypeKind::Array(_) | TypeKind::Dict(..) | TypeKind::Maybe(_) => false,
            TypeKind::Struct(s) => s.is_fixed,
        }
    }

    /// `fixed_size(T)`, or `None` if `T` is variable-sized.
    pub fn fixed_size(&self) -> Option<usize> {
        match &self.kind {
            TypeKind::Basic(kind) if kind.is_fixed() => Some(kind.fixed_size()),
            TypeKind::Basic(_) => None,
            TypeKind::Variant => None,
            TypeKind::Array(_) | TypeKind::Dict(..) | TypeKind::Maybe(_) => None,
            TypeKind::Struct(s) => s.fixed_size,
        }
    }

    /// `typestring(T)`, the GVariant signature string.
    pub fn typestring(&self) -> String {
        match &self.kind {
            TypeKind::Basic(kind) => kind.typestring().to_string(),
            TypeKind::Variant => "v".to_string(),
            TypeKind::Array(element) => format!("a{}", element.typestring()),
            TypeKind::Dict(key, value) => {
                format!("a{{{}{}}}", key.typestring(), value.typestring())
            }
            TypeKind::Maybe(inner) => format!("m{}", inner.typestring()),
            TypeKind::Struct(s) => {
                let mut out = String::from("(");
                for field in &s.fields {
                    out.push_str(&field.ty.typestring());
                }
                out.push(')');
                out
            }
        }
    }

    /// The struct's framing-offset count, if this node is a struct.
    pub fn framing_offset_count(&self) -> Option<usize> {
        match &self.kind {
            TypeKind::Struct(s) => Some(s.framing_offset_count),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructType> {
        match &self.kind {
            TypeKind::Struct(s) => Some(s),
            _ => None,
        }
    }
}
impl fmt::Debug for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeNode")
            .field("typename", &self.typename())
            .field("typestring", &self.typestring())
            .finish()
    }
}

/// Assign `name` to `node` if it doesn't already have one, or
/// unconditionally when `overwrite` is set (used for top-level
/// declarations, which always win over a name propagated down from an
/// earlier reference), then propagate derived names into children that
/// are still unnamed.
///
/// `Basic` and `Variant` are no-ops: a basic kind's name is always its
/// keyword and `variant` is always `"variant"`, so there's nothing to
/// assign and nothing to propagate further.
pub fn set_typename(node: &TypeRef, name: &str, overwrite: bool) {
    match &node.kind {
        TypeKind::Basic(_) | TypeKind::Variant => return,
        _ => {}
    }
    let already_named = node.typename.borrow().is_some();
    if overwrite || !already_named {
        *node.typename.borrow_mut() = Some(name.to_string());
    }
    propagate_typename(node);
}

/// Push derived names from an already-named node into its unnamed
/// children, recursively. Each container kind has its own naming
/// convention:
///
/// - struct field `f` of struct `S` becomes `S__f`
/// - an array's element type becomes `<name>__element`
/// - a dict's value type becomes `<name>__value` (the key is always
///   basic and never needs a name)
/// - a maybe's inner type becomes `<name>__element`, same as an array
fn propagate_typename(node: &TypeRef) {
    let Some(name) = node.typename() else { return };
    match &node.kind {
        TypeKind::Basic(_) | TypeKind::Variant => {}
        TypeKind::Array(element) => {
            set_typename(element, &format!("{}__element", name), false);
        }
        TypeKind::Dict(_, value) => {
            set_typename(value, &format!("{}__value", name), false);
        }
        TypeKind::Maybe(inner) => {
            set_typename(inner, &format!("{}__element", name), false);
        }
        TypeKind::Struct(s) => {
            for field in &s.fields {
                set_typename(&field.ty, &format!("{}__{}", name, field.name), false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_struct_is_fixed_with_expected_size() {
        let a = TypeNode::basic(BasicKind::Int32);
        let b = TypeNode::basic(BasicKind::Byte);
        let pair = TypeNode::struct_of(vec![
            ("a".to_string(), vec![], a),
            ("b".to_string(), vec![], b),
        ]);
        assert!(pair.is_fixed());
        assert_eq!(pair.fixed_size(), Some(8));
        assert_eq!(pair.typestring(), "(iy)");
    }

    #[test]
    fn unit_struct_is_fixed_size_one() {
        let unit = TypeNode::struct_of(vec![]);
        assert!(unit.is_fixed());
        assert_eq!(unit.fixed_size(), Some(1));
        assert_eq!(unit.typestring(), "()");
    }

    #[test]
    fn array_of_string_is_variable() {
        let names = TypeNode::array(TypeNode::basic(BasicKind::String));
        assert!(!names.is_fixed());
        assert_eq!(names.fixed_size(), None);
        assert_eq!(names.typestring(), "as");
    }

    #[test]
    fn dict_typestring_uses_entry_braces() {
        let dict = TypeNode::dict(BasicKind::String, TypeNode::basic(BasicKind::Int32));
        assert_eq!(dict.typestring(), "a{si}");
    }

    #[test]
    fn set_typename_propagates_into_struct_fields() {
        let field_ty = TypeNode::basic(BasicKind::Int32);
        let s = TypeNode::struct_of(vec![("a".to_string(), vec![], field_ty)]);
        set_typename(&s, "Pair", true);
        assert_eq!(s.typename(), Some("Pair".to_string()));
        // Basic fields never receive a propagated name; the struct's own
        // field name is enough context at emission time.
        if let TypeKind::Struct(inner) = &s.kind {
            assert_eq!(inner.fields[0].ty.typename(), None);
        }
    }

    #[test]
    fn set_typename_propagates_into_array_element() {
        let element = TypeNode::struct_of(vec![(
            "x".to_string(),
            vec![],
            TypeNode::basic(BasicKind::Int32),
        )]);
        let array = TypeNode::array(element.clone());
        set_typename(&array, "Points", true);
        assert_eq!(element.typename(), Some("Points__element".to_string()));
    }

    #[test]
    fn set_typename_does_not_overwrite_without_force() {
        let field_ty = TypeNode::basic(BasicKind::Int32);
        let s = TypeNode::struct_of(vec![("a".to_string(), vec![], field_ty)]);
        set_typename(&s, "First", true);
        set_typename(&s, "Second", false);
        assert_eq!(s.typename(), Some("First".to_string()));
    }

    #[test]
    fn variant_and_basic_set_typename_are_no_ops() {
        let v = TypeNode::variant();
        set_typename(&v, "ignored", true);
        assert_eq!(v.typename(), Some("variant".to_string()));

        let b = TypeNode::basic(BasicKind::Int32);
        set_typename(&b, "ignored", true);
        assert_eq!(b.typename(), None);
    }
}

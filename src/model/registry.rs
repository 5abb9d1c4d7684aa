//! Name resolution: turns a parsed [`crate::schema::Schema`] into a
//! [`TypeRegistry`] of fully resolved [`TypeRef`]s.
use indexmap::IndexMap;

use crate::error::{SchemaError, SchemaResult};
use crate::model::{set_typename, TypeNode, TypeRef};
use crate::schema::{Schema, TypeDef, TypeSpec};

/// The set of named types declared by a schema, in declaration order.
pub struct TypeRegistry {
    order: Vec<String>,
    by_name: IndexMap<String, TypeRef>,
}

impl TypeRegistry {
    fn new() -> TypeRegistry {
        TypeRegistry {
            order: Vec::new(),
            by_name: IndexMap::new(),
        }
    }

    /// Look up a previously declared named type.
    pub fn get(&self, name: &str) -> Option<&TypeRef> {
        self.by_name.get(name)
    }

    /// The top-level declared types, in the order they were declared.
    pub fn declarations(&self) -> impl Iterator<Item = (&str, &TypeRef)> {
        self.order.iter().map(move |name| {
            (name.as_str(), self.by_name.get(name).expect("order/by_name desynced"))
        })
    }
}

/// An anonymous composite directly over basic kinds (e.g. `[]int32`
/// appearing more than once with no enclosing struct field to name it
/// from) is canonicalized to a single shared node per distinct shape,
/// rather than emitting one duplicate view/accessor set per occurrence.
/// The canonical name follows the same `Arrayof<Kind>` / `DictOf<Kind>`
/// / `Maybe<Kind>` convention used for a field's own anonymous type, just
/// applied eagerly since there's no field name to propagate from.
struct Canonicalizer {
    cache: IndexMap<String, TypeRef>,
}

impl Canonicalizer {
    fn new() -> Canonicalizer {
        Canonicalizer {
            cache: IndexMap::new(),
        }
    }

    fn intern(&mut self, canonical_name: String, build: impl FnOnce() -> TypeRef) -> TypeRef {
        if let Some(existing) = self.cache.get(&canonical_name) {
            return existing.clone();
        }
        let ty = build();
        set_typename(&ty, &canonical_name, true);
        self.cache.insert(canonical_name, ty.clone());
        ty
    }
}

/// Resolve a whole schema: walk its declarations in order, building each
/// one's type tree and registering it under its declared name.
///
/// A `Named` reference is resolved against the registry built so far, so
/// forward references are rejected the same way the original
/// `variant-parse.py` prototype rejects them (by `get_named_type` simply
/// not finding the name yet) — just reported here as a proper
/// [`SchemaError::UnknownNamedType`] instead of a Python `KeyError`.
pub fn build_schema(schema: &Schema) -> SchemaResult<TypeRegistry> {
    let mut registry = TypeRegistry::new();
    let mut canon = Canonicalizer::new();
    for def in &schema.defs {
        resolve_typedef(def, &mut registry, &mut canon)?;
    }
    Ok(registry)
}

fn resolve_typedef(
    def: &TypeDef,
    registry: &mut TypeRegistry,
    canon: &mut Canonicalizer,
) -> SchemaResult<()> {
    if registry.by_name.contains_key(&def.name) {
        return Err(SchemaError::DuplicateType {
            location: def.location,
            name: def.name.clone(),
        });
    }
    let ty = resolve_typespec(&def.spec, registry, canon)?;
    set_typename(&ty, &def.name, true);
    registry.order.push(def.name.clone());
    registry.by_name.insert(def.name.clone(), ty);
    Ok(())
}

fn resolve_typespec(
    spec: &TypeSpec,
    registry: &TypeRegistry,
    canon: &mut Canonicalizer,
) -> SchemaResult<TypeRef> {
    Ok(match spec {
        TypeSpec::Basic(kind) => TypeNode::basic(*kind),
        // Every `variant` occurrence shares one node: its typename is
        // always the fixed string `"variant"`, so two distinct instances
        // would emit the same view struct and accessors twice.
        TypeSpec::Variant => canon.intern("variant".to_string(), TypeNode::variant),
        TypeSpec::Array(element) => match element.as_ref() {
            TypeSpec::Basic(kind) => {
                let name = format!("Arrayof{}", kind.row().keyword);
                canon.intern(name, || TypeNode::array(TypeNode::basic(*kind)))
            }
            other => TypeNode::array(resolve_typespec(other, registry, canon)?),
        },
        TypeSpec::Dict(key, value) => match value.as_ref() {
            TypeSpec::Basic(vkind) => {
                let name = format!("DictOf{}", vkind.row().keyword);
                let key = *key;
                let vkind = *vkind;
                canon.intern(name, || TypeNode::dict(key, TypeNode::basic(vkind)))
            }
            other => TypeNode::dict(*key, resolve_typespec(other, registry, canon)?),
        },
        TypeSpec::Maybe(inner) => match inner.as_ref() {
            TypeSpec::Basic(kind) => {
                let name = format!("Maybe{}", kind.row().keyword);
                canon.intern(name, || TypeNode::maybe(TypeNode::basic(*kind)))
            }
            other => TypeNode::maybe(resolve_typespec(other, registry, canon)?),
        },
        TypeSpec::Struct(field_specs) => {
            let mut fields = Vec::with_capacity(field_specs.len());
            for field in field_specs {
                let ty = resolve_typespec(&field.spec, registry, canon)?;
                fields.push((field.name.clone(), field.attrs.clone(), ty));
            }
            TypeNode::struct_of(fields)
        }
        TypeSpec::Named(name, location) => {
            registry
                .get(name)
                .cloned()
                .ok_or_else(|| SchemaError::UnknownNamedType {
                    location: *location,
                    name: name.clone(),
                })?
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Parser;

    fn build(src: &str) -> TypeRegistry {
        let schema = Parser::parse_source(src).unwrap();
        build_schema(&schema).unwrap()
    }

    #[test]
    fn pair_struct_scenario() {
        let registry = build("type Pair { a: int32; b: byte; };");
        let pair = registry.get("Pair").unwrap();
        assert!(pair.is_fixed());
        assert_eq!(pair.fixed_size(), Some(8));
        assert_eq!(pair.typename(), Some("Pair".to_string()));
    }

    #[test]
    fn names_array_scenario() {
        let registry = build("type Names []string;");
        let names = registry.get("Names").unwrap();
        assert_eq!(names.typestring(), "as");
        assert_eq!(names.typename(), Some("Names".to_string()));
    }

    #[test]
    fn maybe_string_scenario() {
        let registry = build("type M ?string;");
        let m = registry.get("M").unwrap();
        assert_eq!(m.typestring(), "ms");
    }

    #[test]
    fn dict_scenario() {
        let registry = build("type D [string]int32;");
        let d = registry.get("D").unwrap();
        assert_eq!(d.typestring(), "a{si}");
    }

    #[test]
    fn mixed_struct_scenario() {
        let registry = build("type Mixed { tag: byte; name: string; vals: []int32; };");
        let mixed = registry.get("Mixed").unwrap();
        assert!(!mixed.is_fixed());
        assert_eq!(mixed.framing_offset_count(), Some(1));
        assert_eq!(mixed.typestring(), "(ysai)");
    }

    #[test]
    fn named_type_reference_resolves_to_the_same_node() {
        let registry = build("type A int32; type B { x: A; y: A; };");
        let b = registry.get("B").unwrap();
        if let Some(s) = b.as_struct() {
            assert!(std::ptr::eq(
                std::rc::Rc::as_ptr(&s.fields[0].ty),
                std::rc::Rc::as_ptr(&s.fields[1].ty),
            ));
        } else {
            panic!("B should be a struct");
        }
    }

    #[test]
    fn forward_reference_is_an_unknown_named_type_error() {
        let schema = Parser::parse_source("type B A; type A int32;").unwrap();
        let err = build_schema(&schema).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownNamedType { .. }));
    }

    #[test]
    fn duplicate_declaration_is_an_error() {
        let schema = Parser::parse_source("type A int32; type A byte;").unwrap();
        let err = build_schema(&schema).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateType { .. }));
    }

    #[test]
    fn repeated_anonymous_array_shape_is_canonicalized() {
        let registry = build("type S { a: []int32; b: []int32; };");
        let s = registry.get("S").unwrap();
        let fields = &s.as_struct().unwrap().fields;
        assert!(std::ptr::eq(
            std::rc::Rc::as_ptr(&fields[0].ty),
            std::rc::Rc::as_ptr(&fields[1].ty),
        ));
        assert_eq!(fields[0].ty.typename(), Some("Arrayofint32".to_string()));
    }
}

//! Structural type values.
//!
//! Types are immutable and shared by reference (`Arc`) across symbols and
//! the expression type map; re-analysis produces new values, it never
//! mutates old ones. The shape mirrors what the query surface needs:
//! primitives, generic instantiations, unions, callables, and
//! declaration-ordered overload sets.

use std::fmt;
use std::sync::Arc;

use crate::base::Name;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Explicitly dynamic (`Any`, `object` in this subset).
    Any,
    /// Analysis could not determine a type. Distinct from `Any` so the
    /// degraded paths are visible in hover output.
    Unknown,
    None,
    Int,
    Float,
    Str,
    Bool,
    /// An imported module object.
    Module(Name),
    /// The class object itself (the value bound by a `class` statement).
    Class(Name),
    /// An instance of a class, with generic arguments when instantiated
    /// (e.g. `list[int]`).
    Instance { class: Name, args: Vec<Arc<Type>> },
    Tuple(Vec<Arc<Type>>),
    Union(Vec<Arc<Type>>),
    Callable(Arc<Signature>),
    /// Declaration-ordered overload set; order is significant for
    /// resolution tie-breaks.
    Overload(Arc<OverloadSet>),
}

/// A callable signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub name: Name,
    pub params: Vec<ParamType>,
    pub ret: Arc<Type>,
    /// Accepts arbitrary extra positional arguments (`*args` style
    /// builtins); disables too-many-arguments checking.
    pub is_variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamType {
    pub name: Name,
    pub ty: Arc<Type>,
    pub has_default: bool,
}

/// Ordered candidate signatures for a callable symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OverloadSet {
    pub signatures: Vec<Arc<Signature>>,
}

impl Type {
    pub fn any() -> Arc<Type> {
        Arc::new(Type::Any)
    }

    pub fn unknown() -> Arc<Type> {
        Arc::new(Type::Unknown)
    }

    pub fn none() -> Arc<Type> {
        Arc::new(Type::None)
    }

    pub fn int() -> Arc<Type> {
        Arc::new(Type::Int)
    }

    pub fn float() -> Arc<Type> {
        Arc::new(Type::Float)
    }

    pub fn str_() -> Arc<Type> {
        Arc::new(Type::Str)
    }

    pub fn bool_() -> Arc<Type> {
        Arc::new(Type::Bool)
    }

    /// Build a union, flattening nested unions and deduplicating while
    /// preserving first-seen order. Empty input yields `Unknown`; a single
    /// distinct member collapses to that member.
    pub fn union(parts: impl IntoIterator<Item = Arc<Type>>) -> Arc<Type> {
        let mut members: Vec<Arc<Type>> = Vec::new();
        let mut push = |ty: Arc<Type>, members: &mut Vec<Arc<Type>>| {
            if !members.iter().any(|m| **m == *ty) {
                members.push(ty);
            }
        };
        for part in parts {
            match &*part {
                Type::Union(inner) => {
                    for ty in inner {
                        push(ty.clone(), &mut members);
                    }
                }
                _ => push(part, &mut members),
            }
        }
        match members.len() {
            0 => Type::unknown(),
            1 => members.pop().expect("len checked"),
            _ => Arc::new(Type::Union(members)),
        }
    }

    /// Whether a value of this type is acceptable where `target` is
    /// expected. `Any`/`Unknown` are compatible in both directions; `int`
    /// promotes to `float`; unions distribute member-wise.
    pub fn is_assignable_to(&self, target: &Type) -> bool {
        match (self, target) {
            (Type::Any | Type::Unknown, _) | (_, Type::Any | Type::Unknown) => true,
            (Type::Int, Type::Float) => true,
            (Type::Bool, Type::Int | Type::Float) => true,
            (Type::Union(members), _) => members.iter().all(|m| m.is_assignable_to(target)),
            (_, Type::Union(members)) => members.iter().any(|m| self.is_assignable_to(m)),
            (
                Type::Instance { class: a, args: xs },
                Type::Instance { class: b, args: ys },
            ) => a == b && (xs.is_empty() || ys.is_empty() || xs == ys),
            _ => self == target,
        }
    }

    /// Candidate signatures when this type is called: one for a plain
    /// callable, the full declared set for an overload, empty otherwise.
    pub fn callable_signatures(&self) -> Vec<Arc<Signature>> {
        match self {
            Type::Callable(sig) => vec![sig.clone()],
            Type::Overload(set) => set.signatures.clone(),
            _ => Vec::new(),
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Type::Callable(_) | Type::Overload(_) | Type::Class(_) | Type::Any | Type::Unknown
        )
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any => write!(f, "Any"),
            Type::Unknown => write!(f, "Unknown"),
            Type::None => write!(f, "None"),
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Str => write!(f, "str"),
            Type::Bool => write!(f, "bool"),
            Type::Module(name) => write!(f, "Module[{name}]"),
            Type::Class(name) => write!(f, "type[{name}]"),
            Type::Instance { class, args } => {
                write!(f, "{class}")?;
                if !args.is_empty() {
                    write!(f, "[{}]", join_types(args, ", "))?;
                }
                Ok(())
            }
            Type::Tuple(items) => {
                if items.is_empty() {
                    write!(f, "tuple[()]")
                } else {
                    write!(f, "tuple[{}]", join_types(items, ", "))
                }
            }
            Type::Union(members) => write!(f, "{}", join_types(members, " | ")),
            Type::Callable(sig) => write!(f, "{sig}"),
            Type::Overload(set) => {
                write!(f, "Overload[")?;
                for (i, sig) in set.signatures.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{sig}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl Signature {
    /// Render as a `def` line, e.g. `def f(x: int) -> int`.
    pub fn display_def(&self) -> String {
        format!("def {}{}", self.name, self)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", param.name, param.ty)?;
            if param.has_default {
                write!(f, " = ...")?;
            }
        }
        if self.is_variadic {
            if !self.params.is_empty() {
                write!(f, ", ")?;
            }
            write!(f, "*args")?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

fn join_types(types: &[Arc<Type>], sep: &str) -> String {
    types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

// ============================================================================
// BUILTINS
// ============================================================================

/// The type a builtin name denotes in annotation position.
pub fn builtin_annotation(name: &str) -> Option<Arc<Type>> {
    match name {
        "int" => Some(Type::int()),
        "float" => Some(Type::float()),
        "str" => Some(Type::str_()),
        "bool" => Some(Type::bool_()),
        "None" => Some(Type::none()),
        "Any" | "object" => Some(Type::any()),
        "list" | "dict" | "set" | "tuple" => Some(Arc::new(Type::Instance {
            class: Arc::from(name),
            args: Vec::new(),
        })),
        _ => None,
    }
}

/// The type a builtin name has in value position.
pub fn builtin_value(name: &str) -> Option<Arc<Type>> {
    let class = |n: &str| Some(Arc::new(Type::Class(Arc::from(n))));
    match name {
        "int" | "float" | "str" | "bool" | "list" | "dict" | "set" | "tuple" | "object"
        | "range" => class(name),
        // Decorators from the supported subset; their transforming effect
        // is not modelled.
        "overload" | "staticmethod" | "classmethod" | "property" => {
            Some(Arc::new(Type::Callable(Arc::new(Signature {
                name: Arc::from(name),
                params: Vec::new(),
                ret: Type::any(),
                is_variadic: true,
            }))))
        }
        "print" => Some(Arc::new(Type::Callable(Arc::new(Signature {
            name: Arc::from("print"),
            params: Vec::new(),
            ret: Type::none(),
            is_variadic: true,
        })))),
        "len" => Some(Arc::new(Type::Callable(Arc::new(Signature {
            name: Arc::from("len"),
            params: vec![ParamType {
                name: Arc::from("obj"),
                ty: Type::any(),
                has_default: false,
            }],
            ret: Type::int(),
            is_variadic: false,
        })))),
        "isinstance" => Some(Arc::new(Type::Callable(Arc::new(Signature {
            name: Arc::from("isinstance"),
            params: vec![
                ParamType {
                    name: Arc::from("obj"),
                    ty: Type::any(),
                    has_default: false,
                },
                ParamType {
                    name: Arc::from("class_or_tuple"),
                    ty: Type::any(),
                    has_default: false,
                },
            ],
            ret: Type::bool_(),
            is_variadic: false,
        })))),
        _ => None,
    }
}

/// Instance type produced by calling a class object.
pub fn instance_of(class: &Name, args: Vec<Arc<Type>>) -> Arc<Type> {
    match class.as_ref() {
        "int" => Type::int(),
        "float" => Type::float(),
        "str" => Type::str_(),
        "bool" => Type::bool_(),
        "object" => Type::any(),
        _ => Arc::new(Type::Instance {
            class: class.clone(),
            args,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_flattens_and_dedups() {
        let u = Type::union([Type::int(), Type::union([Type::int(), Type::none()])]);
        assert_eq!(u.to_string(), "int | None");
    }

    #[test]
    fn test_union_collapses_single() {
        let u = Type::union([Type::int(), Type::int()]);
        assert_eq!(*u, Type::Int);
    }

    #[test]
    fn test_display_generic_instance() {
        let ty = Type::Instance {
            class: Arc::from("list"),
            args: vec![Type::int()],
        };
        assert_eq!(ty.to_string(), "list[int]");
    }

    #[test]
    fn test_signature_display() {
        let sig = Signature {
            name: Arc::from("f"),
            params: vec![ParamType {
                name: Arc::from("x"),
                ty: Type::int(),
                has_default: false,
            }],
            ret: Type::int(),
            is_variadic: false,
        };
        assert_eq!(sig.display_def(), "def f(x: int) -> int");
    }

    #[test]
    fn test_assignability() {
        assert!(Type::Int.is_assignable_to(&Type::Float));
        assert!(!Type::Float.is_assignable_to(&Type::Int));
        assert!(Type::Int.is_assignable_to(&Type::Union(vec![Type::int(), Type::none()])));
        assert!(Type::Unknown.is_assignable_to(&Type::Str));
        assert!(Type::Str.is_assignable_to(&Type::Unknown));
    }

    #[test]
    fn test_callable_signatures_of_overload() {
        let sig = Arc::new(Signature {
            name: Arc::from("h"),
            params: Vec::new(),
            ret: Type::int(),
            is_variadic: false,
        });
        let set = Type::Overload(Arc::new(OverloadSet {
            signatures: vec![sig.clone(), sig.clone()],
        }));
        assert_eq!(set.callable_signatures().len(), 2);
        assert_eq!(Type::Callable(sig).callable_signatures().len(), 1);
        assert!(Type::Int.callable_signatures().is_empty());
    }
}

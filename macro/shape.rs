use crate::model::{CaseDeclaration, PayloadParameter};
use proc_macro2::Span;
use syn::*;

/// How a single payload type is exposed by a getter.
///
/// Classification looks at the outermost type only: `Option<Option<T>>` is `Optional` with inner
/// `Option<T>`, never unwrapped twice.
#[derive(Debug, PartialEq)]
pub(crate) enum TypeShape<'a> {
    /// `Option<T>`, carrying `T`.
    Optional(&'a Type),
    /// A pointer to a trait object (`&dyn P`, `Box<dyn P>`, ..), carrying the `dyn P` type.
    Existential(&'a Type),
    Plain,
}

fn is_trait_object(ty: &Type) -> bool {
    match ty {
        Type::TraitObject(_) => true,
        Type::Paren(TypeParen { elem, .. }) | Type::Group(TypeGroup { elem, .. }) => {
            is_trait_object(elem)
        }
        _ => false,
    }
}

// `Foo<T>` -> (`Foo`, `T`), only when there is exactly one generic argument and it is a type.
fn single_type_argument(path: &Path) -> Option<(&Ident, &Type)> {
    let segment = path.segments.last()?;
    if let PathArguments::AngleBracketed(args) = &segment.arguments {
        if args.args.len() == 1 {
            if let Some(GenericArgument::Type(inner)) = args.args.first() {
                return Some((&segment.ident, inner));
            }
        }
    }
    None
}

pub(crate) fn classify(ty: &Type) -> TypeShape<'_> {
    match ty {
        Type::Paren(TypeParen { elem, .. }) | Type::Group(TypeGroup { elem, .. }) => classify(elem),
        Type::Reference(TypeReference { elem, .. }) if is_trait_object(elem) => {
            TypeShape::Existential(elem)
        }
        Type::Path(TypePath { qself: None, path }) => match single_type_argument(path) {
            Some((ident, inner)) if ident == "Option" => TypeShape::Optional(inner),
            Some((ident, inner))
                if (ident == "Box" || ident == "Rc" || ident == "Arc") && is_trait_object(inner) =>
            {
                TypeShape::Existential(inner)
            }
            _ => TypeShape::Plain,
        },
        _ => TypeShape::Plain,
    }
}

pub(crate) struct CompositeField<'a> {
    pub label: Option<&'a Ident>,
    /// Name the field is bound to in generated patterns: the label, or `__p{index}`.
    pub binding: Ident,
    pub ty: &'a Type,
}

pub(crate) enum CaseShape<'a> {
    NoPayload,
    SinglePositional(&'a PayloadParameter),
    Composite(Vec<CompositeField<'a>>),
}

impl CompositeField<'_> {
    pub fn is_labeled(&self) -> bool {
        self.label.is_some()
    }
}

/// A single *labeled* field takes the composite path so that its label survives.
pub(crate) fn resolve(case: &CaseDeclaration) -> CaseShape<'_> {
    match case.parameters() {
        [] => CaseShape::NoPayload,
        [param] if param.label().is_none() => CaseShape::SinglePositional(param),
        params => CaseShape::Composite(
            params
                .iter()
                .enumerate()
                .map(|(index, param)| CompositeField {
                    label: param.label(),
                    binding: param.label().cloned().unwrap_or_else(|| {
                        Ident::new(&format!("__p{}", index), Span::call_site())
                    }),
                    ty: &param.ty,
                })
                .collect(),
        ),
    }
}

use darling::ast::{Data, Fields, Style};
use darling::util::Ignored;
use darling::{FromDeriveInput, FromField, FromVariant};
use syn::{Generics, Ident, Type, Visibility};

/// The enum `#[case_accessors]` is attached to.
#[derive(FromDeriveInput)]
#[darling(supports(enum_any))]
pub(crate) struct SumTypeDeclaration {
    pub ident: Ident,
    pub vis: Visibility,
    pub generics: Generics,
    pub data: Data<CaseDeclaration, Ignored>,
}

impl SumTypeDeclaration {
    pub fn cases(&self) -> &[CaseDeclaration] {
        match &self.data {
            Data::Enum(cases) => cases.as_slice(),
            // Rejected by `supports(enum_any)`.
            Data::Struct(_) => &[],
        }
    }
}

/// One variant, in declaration order.
#[derive(FromVariant)]
pub(crate) struct CaseDeclaration {
    pub ident: Ident,
    pub fields: Fields<PayloadParameter>,
}

impl CaseDeclaration {
    pub fn parameters(&self) -> &[PayloadParameter] {
        self.fields.fields.as_slice()
    }

    pub fn style(&self) -> Style {
        self.fields.style
    }
}

#[derive(FromField)]
pub(crate) struct PayloadParameter {
    pub ident: Option<Ident>,
    pub ty: Type,
}

impl PayloadParameter {
    /// The name of a field of a struct-like variant.
    pub fn label(&self) -> Option<&Ident> {
        self.ident.as_ref()
    }
}

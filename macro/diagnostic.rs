use proc_macro2::{Span, TokenStream};
use proc_macro_error::emit_error;
use syn::Ident;
use template_quote::quote;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Severity {
    Error,
    Warning,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DiagnosticKind {
    /// The attribute is attached to something other than an `enum`.
    NotAnEnum,
    /// The enum declares no variants, nothing is generated.
    NoCases,
    /// An attribute argument other than `setters = <bool literal>`.
    InvalidArguments,
    /// Two variants map to the same generated method name.
    NameClash,
}

impl DiagnosticKind {
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::NotAnEnum
            | DiagnosticKind::InvalidArguments
            | DiagnosticKind::NameClash => Severity::Error,
            DiagnosticKind::NoCases => Severity::Warning,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            DiagnosticKind::NotAnEnum => "case_accessors::not_an_enum",
            DiagnosticKind::NoCases => "case_accessors::no_cases",
            DiagnosticKind::InvalidArguments => "case_accessors::invalid_arguments",
            DiagnosticKind::NameClash => "case_accessors::name_clash",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            DiagnosticKind::NotAnEnum => "`#[case_accessors]` can only be applied to an `enum`",
            DiagnosticKind::NoCases => {
                "`#[case_accessors]` was applied to an enum without any variants. This has no effect."
            }
            DiagnosticKind::InvalidArguments => {
                "`#[case_accessors]` only accepts a `setters = true` or `setters = false` argument"
            }
            DiagnosticKind::NameClash => {
                "`#[case_accessors]` would generate two methods with the same name"
            }
        }
    }
}

pub(crate) struct Diagnostic {
    pub kind: DiagnosticKind,
    pub span: Span,
    pub detail: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, span: Span) -> Self {
        Self {
            kind,
            span,
            detail: None,
        }
    }

    pub fn with_detail(self, detail: String) -> Self {
        Self {
            detail: Some(detail),
            ..self
        }
    }

    /// Reports an error. Must be called inside a `#[proc_macro_error]` entry point.
    ///
    /// Warnings are not reported here, see [`Diagnostic::lint`].
    pub fn emit(&self) {
        if self.kind.severity() != Severity::Error {
            return;
        }
        match &self.detail {
            Some(detail) => emit_error!(
                self.span, "{}", self.kind.message();
                note = "{}", self.kind.id();
                help = "{}", detail
            ),
            None => emit_error!(self.span, "{}", self.kind.message(); note = "{}", self.kind.id()),
        }
    }

    /// Item raising a `deprecated` lint at `span`, the only warning a stable compiler shows for a
    /// proc-macro.
    pub fn lint(&self) -> Option<TokenStream> {
        if self.kind.severity() != Severity::Warning {
            return None;
        }
        let marker = Ident::new("CaseAccessorsWarning", self.span);
        let note = format!("{} ({})", self.kind.message(), self.kind.id());
        Some(quote! {
            const _: () = {
                #[deprecated(note = #note)]
                struct CaseAccessorsWarning;
                let _ = #marker;
            };
        })
    }
}

//! Field Classifier: reduces each resolved field's type to a semantic
//! category that decides which query operations get generated.
//!
//! Classification is pure and total over the supported type universe. Types
//! with no query semantics (bool and other odd scalars, containers, trait
//! objects, unknown named types) are skipped silently rather than failing
//! the struct.

use proc_macro2::TokenStream;
use quote::ToTokens;
use syn::Type;

use crate::parse::{StructField, TypeIndex, bare_type_name};
use crate::tag::TagSettings;

/// Semantic category of a classified field. Exactly one variant applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Orderable numbers: full comparison set.
    Numeric,
    /// Strings: comparison set plus LIKE matching.
    Text,
    /// Time values: compare like numbers, never IN-match.
    Time,
    /// Struct association: preload only.
    Assoc,
    /// Opaque byte blob: equality family only.
    Blob,
    /// Nullable wrapper; carries the pointee's full classification so the
    /// catalog can generate both null checks and the inner operations.
    Option(Box<FieldInfo>),
}

/// One classified field, consumed by the method catalog builder and listed
/// in the generated DB schema. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// Declared field name.
    pub name: String,
    /// DB column name: naming-convention transform of `name` unless a
    /// `column:` tag directive overrides it.
    pub db_name: String,
    /// Declared type for display, alias names preserved.
    pub type_name: String,
    pub kind: FieldKind,
}

impl FieldInfo {
    pub fn is_option(&self) -> bool {
        matches!(self.kind, FieldKind::Option(_))
    }

    pub fn is_time(&self) -> bool {
        self.kind == FieldKind::Time
    }

    /// Snapshot of the pointee classification for `Option` fields.
    pub fn pointed(&self) -> Option<&FieldInfo> {
        match &self.kind {
            FieldKind::Option(inner) => Some(inner),
            _ => None,
        }
    }
}

/// Classifies resolved fields against the source unit's type index.
pub struct FieldClassifier<'a> {
    index: &'a TypeIndex,
}

impl<'a> FieldClassifier<'a> {
    pub fn new(index: &'a TypeIndex) -> Self {
        FieldClassifier { index }
    }

    /// Classifies one field. `None` means the field is excluded from
    /// generation: tag-ignored or an unsupported type shape.
    pub fn classify(&self, field: &StructField) -> Option<FieldInfo> {
        let tags = TagSettings::parse(field.tag());
        if tags.is_ignored() {
            return None;
        }

        let mut db_name = to_db_name(field.name());
        if let Some(column) = tags.column() {
            db_name = column.to_string();
        }

        self.gen_info(field.name(), &db_name, field.ty())
    }

    /// Recursive type reduction. Each step strictly unwraps one layer, so
    /// the recursion terminates.
    fn gen_info(&self, name: &str, db_name: &str, ty: &Type) -> Option<FieldInfo> {
        let type_name = type_display(ty);
        let info = |kind| FieldInfo {
            name: name.to_string(),
            db_name: db_name.to_string(),
            type_name: type_name.clone(),
            kind,
        };

        // time is special-cased above everything, including aliases
        if is_time_type(ty) {
            return Some(info(FieldKind::Time));
        }

        if let Some(inner) = option_inner(ty) {
            let pointed = self.gen_info(name, db_name, inner)?;
            return Some(info(FieldKind::Option(Box::new(pointed))));
        }

        if is_byte_vec(ty) {
            return Some(info(FieldKind::Blob));
        }

        let ident = bare_type_name(ty)?;

        if is_numeric_scalar(&ident) {
            return Some(info(FieldKind::Numeric));
        }
        if ident == "String" || ident == "str" {
            return Some(info(FieldKind::Text));
        }
        if is_scalar(&ident) {
            // bool and friends: no category matches, dropped
            return None;
        }

        if let Some(underlying) = self.index.lookup_alias(&ident) {
            // recurse into the aliased type but keep the alias for display
            let mut resolved = self.gen_info(name, db_name, underlying)?;
            resolved.type_name = type_name.clone();
            return Some(resolved);
        }

        if self.index.lookup_struct(&ident).is_some() {
            return Some(info(FieldKind::Assoc));
        }

        // unknown named type, container, or anything else: unsupported
        None
    }
}

/// Naming-convention transform for DB column names (PascalCase and
/// camelCase become snake_case; snake_case passes through unchanged).
/// An uppercase run is one word, so initialisms like `ID` and `HTMLBody`
/// become `id` and `html_body` rather than splitting per letter.
pub fn to_db_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut result = String::new();
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            let after_word = i > 0 && chars[i - 1].is_lowercase();
            let before_word = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            if i > 0 && chars[i - 1] != '_' && (after_word || before_word) {
                result.push('_');
            }
            result.push(ch.to_ascii_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}

/// Renders a type the way it was declared, without token-stream spacing.
pub fn type_display(ty: &Type) -> String {
    let tokens: TokenStream = ty.to_token_stream();
    normalize_tokens(&tokens.to_string())
}

/// Collapses the spaces `TokenStream::to_string` inserts around punctuation,
/// e.g. `Option < String >` becomes `Option<String>`.
fn normalize_tokens(s: &str) -> String {
    const GLUE: &[char] = &['<', '>', ',', ':', '&', '[', ']', ';', '(', ')', '\''];
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    for (i, &ch) in chars.iter().enumerate() {
        if ch == ' ' {
            let prev = i.checked_sub(1).and_then(|p| chars.get(p));
            let next = chars.get(i + 1);
            let glued = prev.is_some_and(|c| GLUE.contains(c)) || next.is_some_and(|c| GLUE.contains(c));
            if glued {
                continue;
            }
        }
        out.push(ch);
    }
    out
}

fn is_time_type(ty: &Type) -> bool {
    bare_type_name(ty).is_some_and(|id| matches!(id.as_str(), "DateTime" | "NaiveDateTime"))
}

fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let last = type_path.path.segments.last()?;
    if last.ident != "Option" {
        return None;
    }
    match &last.arguments {
        syn::PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            syn::GenericArgument::Type(inner) => Some(inner),
            _ => None,
        }),
        _ => None,
    }
}

fn is_byte_vec(ty: &Type) -> bool {
    let Type::Path(type_path) = ty else {
        return false;
    };
    let Some(last) = type_path.path.segments.last() else {
        return false;
    };
    if last.ident != "Vec" {
        return false;
    }
    match &last.arguments {
        syn::PathArguments::AngleBracketed(args) => args.args.iter().any(|arg| {
            matches!(arg, syn::GenericArgument::Type(inner) if bare_type_name(inner).as_deref() == Some("u8"))
        }),
        _ => false,
    }
}

fn is_numeric_scalar(ident: &str) -> bool {
    matches!(
        ident,
        "i8" | "i16"
            | "i32"
            | "i64"
            | "i128"
            | "u8"
            | "u16"
            | "u32"
            | "u64"
            | "u128"
            | "isize"
            | "usize"
            | "f32"
            | "f64"
    )
}

/// Scalars with no query category; recognized so they are dropped instead of
/// falling through to the named-type lookups.
fn is_scalar(ident: &str) -> bool {
    matches!(ident, "bool" | "char")
}

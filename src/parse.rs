//! Type Resolver: struct discovery over one source unit.
//!
//! Parses a single Rust file with `syn` (the type oracle), records every
//! struct and type-alias declaration into a [`TypeIndex`], and resolves each
//! struct's field list. Embedded fields (tagged `embedded`) are flattened in
//! place, recursively, preserving declaration order; non-`pub` fields and
//! trait-object members are excluded.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use syn::{Expr, ExprLit, Fields, Item, ItemStruct, Lit, Meta, Type, Visibility};

use crate::errors::Error;
use crate::tag::{TagSettings, qs_tag_text};

/// One resolved struct member.
#[derive(Debug, Clone)]
pub struct StructField {
    name: String,
    ty: Type,
    tag: String,
}

impl StructField {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Raw `#[qs("...")]` tag text; empty when absent.
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

/// A struct declaration with its resolved (flattened) field list.
#[derive(Debug, Clone)]
pub struct ParsedStruct {
    pub type_name: String,
    pub fields: Vec<StructField>,
    /// Whether the declaration carries the `gen:qs` marker.
    pub has_annotation: bool,
}

/// Read-only view of every type declaration in the source unit.
///
/// The classifier consults it for association detection, alias unwrapping and
/// embedded flattening. Structs are indexed even when they themselves resolve
/// to zero qualifying fields.
#[derive(Debug, Default)]
pub struct TypeIndex {
    structs: HashMap<String, ItemStruct>,
    aliases: HashMap<String, Type>,
}

impl TypeIndex {
    pub fn lookup_struct(&self, name: &str) -> Option<&ItemStruct> {
        self.structs.get(name)
    }

    pub fn lookup_alias(&self, name: &str) -> Option<&Type> {
        self.aliases.get(name)
    }
}

/// Result of resolving one source unit.
#[derive(Debug)]
pub struct ParsedFile {
    pub path: PathBuf,
    /// Resolved structs in declaration order. Structs with zero qualifying
    /// fields are omitted entirely.
    pub structs: Vec<ParsedStruct>,
    pub index: TypeIndex,
}

impl ParsedFile {
    /// Finds a resolved struct by name.
    pub fn resolve(&self, struct_name: &str) -> Result<&ParsedStruct, Error> {
        self.structs
            .iter()
            .find(|s| s.type_name == struct_name)
            .ok_or_else(|| Error::StructNotFound {
                name: struct_name.to_string(),
                path: self.path.clone(),
            })
    }
}

/// Reads and resolves one source file.
pub fn parse_file(path: &Path) -> Result<ParsedFile, Error> {
    let content = fs::read_to_string(path).map_err(|source| Error::Load {
        path: path.to_path_buf(),
        source,
    })?;
    parse_source(path, &content)
}

/// Resolves source text already in memory. `path` is used for diagnostics.
pub fn parse_source(path: &Path, content: &str) -> Result<ParsedFile, Error> {
    let file = syn::parse_file(content).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let mut index = TypeIndex::default();
    for item in &file.items {
        match item {
            Item::Struct(item_struct) => {
                index
                    .structs
                    .insert(item_struct.ident.to_string(), item_struct.clone());
            }
            Item::Type(item_type) => {
                index
                    .aliases
                    .insert(item_type.ident.to_string(), (*item_type.ty).clone());
            }
            _ => {}
        }
    }

    let mut structs = Vec::new();
    for item in &file.items {
        let Item::Struct(item_struct) = item else {
            continue;
        };
        let fields = resolve_struct_fields(item_struct, &index);
        if fields.is_empty() {
            // e.g. no exported fields in struct
            continue;
        }
        structs.push(ParsedStruct {
            type_name: item_struct.ident.to_string(),
            fields,
            has_annotation: has_queryset_marker(&item_struct.attrs),
        });
    }

    Ok(ParsedFile {
        path: path.to_path_buf(),
        structs,
        index,
    })
}

/// Checks the struct's doc comment for the `gen:qs` marker: a line that
/// splits on `:` into exactly two parts reading `gen` and `qs` after
/// trimming. Exact token match, case-sensitive.
fn has_queryset_marker(attrs: &[syn::Attribute]) -> bool {
    for line in doc_lines(attrs) {
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() == 2 && parts[0].trim() == "gen" && parts[1].trim() == "qs" {
            return true;
        }
    }
    false
}

fn doc_lines(attrs: &[syn::Attribute]) -> Vec<String> {
    let mut lines = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("doc") {
            continue;
        }
        if let Meta::NameValue(nv) = &attr.meta {
            if let Expr::Lit(ExprLit {
                lit: Lit::Str(text), ..
            }) = &nv.value
            {
                for line in text.value().lines() {
                    lines.push(line.to_string());
                }
            }
        }
    }
    lines
}

/// Walks a struct's member list and produces its resolved field sequence.
///
/// Embedded members are flattened before the visibility check: flattening is
/// about locating members, not visibility, so a private embedded field still
/// contributes its struct's public fields. An embedded member whose type is
/// not a known struct is skipped.
fn resolve_struct_fields(item_struct: &ItemStruct, index: &TypeIndex) -> Vec<StructField> {
    let mut active = vec![item_struct.ident.to_string()];
    resolve_fields(&item_struct.fields, index, &mut active)
}

/// `active` holds the chain of struct names currently being flattened. The
/// oracle never type-checks, so nothing upstream rejects a struct that
/// embeds itself (directly or mutually); re-entrant embeds are skipped like
/// any other unresolvable embedded member.
fn resolve_fields(fields: &Fields, index: &TypeIndex, active: &mut Vec<String>) -> Vec<StructField> {
    let mut resolved = Vec::new();
    let Fields::Named(named) = fields else {
        return resolved;
    };

    for field in &named.named {
        let tag = qs_tag_text(&field.attrs);

        if TagSettings::parse(&tag).is_embedded() {
            if let Some(type_name) = bare_type_name(&field.ty) {
                if active.iter().any(|n| n == &type_name) {
                    continue;
                }
                if let Some(embedded) = index.lookup_struct(&type_name) {
                    // splice in place; zero qualifying fields contribute nothing
                    active.push(type_name);
                    resolved.extend(resolve_fields(&embedded.fields, index, active));
                    active.pop();
                }
            }
            continue;
        }

        // trait objects have no query semantics
        if matches!(field.ty, Type::TraitObject(_) | Type::ImplTrait(_)) {
            continue;
        }

        if !matches!(field.vis, Visibility::Public(_)) {
            continue;
        }

        let Some(ident) = &field.ident else {
            continue;
        };
        // raw identifiers (`r#type`) resolve to their bare name; escaping is
        // re-applied where the name is emitted as an identifier
        let name = ident.to_string().trim_start_matches("r#").to_string();
        resolved.push(StructField {
            name,
            ty: field.ty.clone(),
            tag,
        });
    }

    resolved
}

/// Extracts the trailing identifier of a plain path type, e.g. `Blog` from
/// `models::Blog`. Non-path types have no bare name.
pub(crate) fn bare_type_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(type_path) => type_path.path.segments.last().map(|seg| seg.ident.to_string()),
        _ => None,
    }
}

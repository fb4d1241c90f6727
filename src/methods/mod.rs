//! Method Model: the codegen IR.
//!
//! Every generated method is one flat [`Method`] record; constructor
//! functions in [`queryset`] and [`updater`] fill the fields from their
//! semantic inputs and format the body as backend-call text. There is no
//! behavior here beyond rendering the record into source text.

pub mod queryset;
pub mod updater;

use crate::field::FieldInfo;

/// One formal argument of a generated method.
#[derive(Debug, Clone)]
pub struct Arg {
    pub name: String,
    pub type_name: String,
}

impl Arg {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Arg {
        Arg {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Language-agnostic description of one generated method.
///
/// Invariant: `name` is unique within the owner's generated method set.
/// Created by the catalog builder, immutable, consumed only by the
/// assembler.
#[derive(Debug, Clone)]
pub struct Method {
    /// Type owning the `impl` block this method lands in.
    pub owner_type: String,
    /// Receiver token, e.g. `self` or `&mut self`; `None` for associated
    /// functions such as constructors.
    pub receiver: Option<String>,
    pub name: String,
    pub args: Vec<Arg>,
    pub ret: String,
    /// Body text, expressed in the backend's query-builder vocabulary.
    pub body: String,
    /// Verbatim doc comment; a default one-liner is rendered when absent.
    pub doc: Option<String>,
    pub public: bool,
}

impl Method {
    /// Sort key for deterministic output: group by owner, then by name.
    pub fn sort_key(&self) -> (&str, &str) {
        (&self.owner_type, &self.name)
    }

    /// Renders the method into source text. Indentation is left to the
    /// formatting pass.
    pub fn render(&self) -> String {
        let mut out = String::new();
        match &self.doc {
            Some(doc) => {
                for line in doc.lines() {
                    out.push_str("/// ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
            None => {
                out.push_str(&format!("/// {} is an autogenerated method\n", self.name));
            }
        }
        if self.public {
            out.push_str("pub ");
        }
        out.push_str("fn ");
        out.push_str(&self.name);
        out.push('(');
        let mut params: Vec<String> = Vec::new();
        if let Some(receiver) = &self.receiver {
            params.push(receiver.clone());
        }
        for arg in &self.args {
            params.push(format!("{}: {}", arg.name, arg.type_name));
        }
        out.push_str(&params.join(", "));
        out.push_str(") -> ");
        out.push_str(&self.ret);
        out.push_str(" {\n");
        out.push_str(&self.body);
        out.push_str("\n}\n");
        out
    }
}

/// Binary filter operations and their SQL spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    NotLike,
}

impl FilterOp {
    /// Operation word used in generated method names.
    pub fn name(self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Ne => "ne",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Like => "like",
            FilterOp::NotLike => "not_like",
        }
    }

    /// SQL comparison fragment emitted into the generated WHERE condition.
    pub fn sql(self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Ne => "!=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Like => "LIKE",
            FilterOp::NotLike => "NOT LIKE",
        }
    }
}

/// Composes a field method name. Field-name-first by default; unary field
/// operations (preload, order_asc_by, order_desc_by, set) put the operation
/// word first for readability. The placement is a per-operation constant.
pub(crate) fn field_method_name(op: &str, field: &str, field_first: bool) -> String {
    if field_first {
        format!("{field}_{op}")
    } else {
        format!("{op}_{field}")
    }
}

/// Argument name derived from a field name, escaped when it collides with a
/// Rust keyword.
pub(crate) fn field_arg_name(field: &str) -> String {
    escape_ident(field)
}

/// Prefixes reserved words with `r#` so they stay valid identifiers in the
/// generated source. Covers strict keywords and the reserved-for-future
/// words; `self`/`Self`/`super`/`crate` never reach this point as field
/// names because the source parse rejects them.
pub(crate) fn escape_ident(name: &str) -> String {
    const KEYWORDS: &[&str] = &[
        // strict
        "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
        "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
        "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use",
        "where", "while",
        // reserved
        "abstract", "become", "box", "do", "final", "gen", "macro", "override", "priv", "try",
        "typeof", "unsized", "virtual", "yield",
    ];
    if KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}

/// Shared naming context for one generated struct.
#[derive(Debug, Clone, Copy)]
pub struct QsContext<'a> {
    pub struct_name: &'a str,
}

impl<'a> QsContext<'a> {
    pub fn new(struct_name: &'a str) -> Self {
        QsContext { struct_name }
    }

    pub fn qs_type_name(&self) -> String {
        format!("{}QuerySet", self.struct_name)
    }

    pub fn updater_type_name(&self) -> String {
        format!("{}Updater", self.struct_name)
    }

    pub fn schema_field_type_name(&self) -> String {
        format!("{}DbSchemaField", self.struct_name)
    }

    pub fn schema_type_name(&self) -> String {
        format!("{}DbSchema", self.struct_name)
    }

    /// Name of the generated schema constant, e.g. `USER_DB_SCHEMA`.
    pub fn schema_const_name(&self) -> String {
        let mut snake = String::new();
        for (i, ch) in self.struct_name.chars().enumerate() {
            if ch.is_uppercase() {
                if i > 0 {
                    snake.push('_');
                }
                snake.push(ch);
            } else {
                snake.push(ch.to_ascii_uppercase());
            }
        }
        format!("{snake}_DB_SCHEMA")
    }

    pub fn field(&self, f: &'a FieldInfo) -> FieldContext<'a> {
        FieldContext { qs: *self, f }
    }
}

/// Per-field naming context handed to the operation constructors.
#[derive(Debug, Clone, Copy)]
pub struct FieldContext<'a> {
    pub qs: QsContext<'a>,
    pub f: &'a FieldInfo,
}

impl FieldContext<'_> {
    pub fn field_name(&self) -> &str {
        &self.f.name
    }

    pub fn db_name(&self) -> &str {
        &self.f.db_name
    }

    pub fn type_name(&self) -> &str {
        &self.f.type_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_method_name_placement() {
        assert_eq!(field_method_name("eq", "name", true), "name_eq");
        assert_eq!(field_method_name("preload", "blog", false), "preload_blog");
        assert_eq!(field_method_name("order_asc_by", "age", false), "order_asc_by_age");
    }

    #[test]
    fn test_escape_ident() {
        assert_eq!(escape_ident("name"), "name");
        assert_eq!(escape_ident("type"), "r#type");
        assert_eq!(escape_ident("struct"), "r#struct");
    }

    #[test]
    fn test_escape_ident_covers_reserved_words() {
        for kw in ["try", "yield", "macro", "abstract", "final", "become"] {
            assert_eq!(escape_ident(kw), format!("r#{kw}"), "unescaped keyword {kw}");
        }
    }

    #[test]
    fn test_schema_const_name() {
        assert_eq!(QsContext::new("User").schema_const_name(), "USER_DB_SCHEMA");
        assert_eq!(
            QsContext::new("GuildMember").schema_const_name(),
            "GUILD_MEMBER_DB_SCHEMA"
        );
    }

    #[test]
    fn test_render_associated_fn() {
        let m = Method {
            owner_type: "UserQuerySet".to_string(),
            receiver: None,
            name: "new".to_string(),
            args: vec![Arg::new("db", "orm::Db")],
            ret: "UserQuerySet".to_string(),
            body: "UserQuerySet { db }".to_string(),
            doc: None,
            public: true,
        };
        let text = m.render();
        assert!(text.contains("pub fn new(db: orm::Db) -> UserQuerySet {"));
        assert!(text.contains("/// new is an autogenerated method"));
    }

    #[test]
    fn test_render_method_with_receiver_and_doc() {
        let m = Method {
            owner_type: "UserQuerySet".to_string(),
            receiver: Some("self".to_string()),
            name: "count".to_string(),
            args: vec![],
            ret: "Result<i64, orm::Error>".to_string(),
            body: "self.db.count()".to_string(),
            doc: Some("count returns the number of rows".to_string()),
            public: true,
        };
        let text = m.render();
        assert!(text.contains("/// count returns the number of rows"));
        assert!(text.contains("pub fn count(self) -> Result<i64, orm::Error> {"));
    }
}

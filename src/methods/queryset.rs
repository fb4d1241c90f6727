//! Constructors for query-set methods: filters, ordering, select operations
//! and struct-level CRUD. Each constructor fills a flat [`Method`] record;
//! the body is literal text in the backend's query-builder vocabulary and is
//! never executed by the generator.

use super::{Arg, FieldContext, FilterOp, Method, QsContext, escape_ident, field_arg_name, field_method_name};

const RESULT_UNIT: &str = "Result<(), orm::Error>";
const RESULT_NUM: &str = "Result<i64, orm::Error>";

/// Chained method skeleton: consumes the query set and returns a re-wrapped
/// one.
fn chained(ctx: QsContext<'_>, name: String, args: Vec<Arg>, body: String) -> Method {
    Method {
        owner_type: ctx.qs_type_name(),
        receiver: Some("self".to_string()),
        name,
        args,
        ret: ctx.qs_type_name(),
        body,
        doc: None,
        public: true,
    }
}

/// Query-set constructor: scopes the backend handle to the model.
pub fn new_queryset_ctor(ctx: QsContext<'_>) -> Method {
    let qs = ctx.qs_type_name();
    Method {
        owner_type: qs.clone(),
        receiver: None,
        name: "new".to_string(),
        args: vec![Arg::new("db", "orm::Db")],
        ret: qs.clone(),
        body: format!("{qs} {{ db: db.model::<{}>() }}", ctx.struct_name),
        doc: Some(format!("new constructs a new {qs}")),
        public: true,
    }
}

/// Private re-wrap helper every chained method funnels through.
pub fn new_queryset_wrap(ctx: QsContext<'_>) -> Method {
    let qs = ctx.qs_type_name();
    Method {
        owner_type: qs.clone(),
        receiver: None,
        name: "w".to_string(),
        args: vec![Arg::new("db", "orm::Db")],
        ret: qs.clone(),
        body: format!("{qs}::new(db)"),
        doc: Some("w re-wraps a backend handle into the query set".to_string()),
        public: false,
    }
}

/// Column projection over the generated DB schema fields.
pub fn new_select(ctx: QsContext<'_>) -> Method {
    let body = [
        "let names: Vec<&str> = fields.iter().map(|f| f.as_str()).collect();".to_string(),
        "Self::w(self.db.select(&names.join(\",\")))".to_string(),
    ]
    .join("\n");
    chained(
        ctx,
        "select".to_string(),
        vec![Arg::new("fields", format!("&[{}]", ctx.schema_field_type_name()))],
        body,
    )
}

/// Binary comparison filter, e.g. `name_eq`.
pub fn new_binary_filter(fctx: FieldContext<'_>, op: FilterOp) -> Method {
    let arg = field_arg_name(fctx.field_name());
    let body = format!(
        "Self::w(self.db.filter(\"{} {} ?\", {arg}))",
        fctx.db_name(),
        op.sql(),
    );
    chained(
        fctx.qs,
        field_method_name(op.name(), fctx.field_name(), true),
        vec![Arg::new(arg, fctx.type_name())],
        body,
    )
}

fn new_in_filter_impl(fctx: FieldContext<'_>, op_name: &str, sql: &str) -> Method {
    let name = field_method_name(op_name, fctx.field_name(), true);
    let arg = field_arg_name(fctx.field_name());
    let body = format!(
        "if {arg}.is_empty() {{\n\
         return Self::w(self.db.add_error(\"must at least pass one {arg} in {name}\"));\n\
         }}\n\
         Self::w(self.db.filter(\"{} {sql} (?)\", {arg}))",
        fctx.db_name(),
    );
    chained(
        fctx.qs,
        name,
        vec![Arg::new(arg, format!("Vec<{}>", fctx.type_name()))],
        body,
    )
}

/// Set-membership filter with a generated empty-list runtime guard.
pub fn new_in_filter(fctx: FieldContext<'_>) -> Method {
    new_in_filter_impl(fctx, "in", "IN")
}

/// Negated set-membership filter.
pub fn new_not_in_filter(fctx: FieldContext<'_>) -> Method {
    new_in_filter_impl(fctx, "not_in", "NOT IN")
}

fn new_order_by(fctx: FieldContext<'_>, op_name: &str, direction: &str) -> Method {
    let body = format!("Self::w(self.db.order(\"{} {direction}\"))", fctx.db_name());
    chained(
        fctx.qs,
        field_method_name(op_name, fctx.field_name(), false),
        vec![],
        body,
    )
}

pub fn new_order_asc_by(fctx: FieldContext<'_>) -> Method {
    new_order_by(fctx, "order_asc_by", "ASC")
}

pub fn new_order_desc_by(fctx: FieldContext<'_>) -> Method {
    new_order_by(fctx, "order_desc_by", "DESC")
}

/// Association preload; the backend receives the field name as declared,
/// not the DB column name.
pub fn new_preload(fctx: FieldContext<'_>) -> Method {
    let body = format!("Self::w(self.db.preload(\"{}\"))", fctx.field_name());
    chained(
        fctx.qs,
        field_method_name("preload", fctx.field_name(), false),
        vec![],
        body,
    )
}

fn new_unary_filter(fctx: FieldContext<'_>, op_name: &str, sql: &str) -> Method {
    let body = format!("Self::w(self.db.filter_cond(\"{} {sql}\"))", fctx.db_name());
    chained(
        fctx.qs,
        field_method_name(op_name, fctx.field_name(), true),
        vec![],
        body,
    )
}

pub fn new_is_null(fctx: FieldContext<'_>) -> Method {
    new_unary_filter(fctx, "is_null", "IS NULL")
}

pub fn new_is_not_null(fctx: FieldContext<'_>) -> Method {
    new_unary_filter(fctx, "is_not_null", "IS NOT NULL")
}

fn new_struct_operation_one_arg(ctx: QsContext<'_>, name: &str) -> Method {
    let body = format!("Self::w(self.db.{name}({name}))");
    chained(
        ctx,
        name.to_string(),
        vec![Arg::new(name, "i64")],
        body,
    )
}

pub fn new_limit(ctx: QsContext<'_>) -> Method {
    new_struct_operation_one_arg(ctx, "limit")
}

pub fn new_offset(ctx: QsContext<'_>) -> Method {
    new_struct_operation_one_arg(ctx, "offset")
}

/// Fetches every matching row.
pub fn new_all(ctx: QsContext<'_>) -> Method {
    Method {
        owner_type: ctx.qs_type_name(),
        receiver: Some("self".to_string()),
        name: "all".to_string(),
        args: vec![],
        ret: format!("Result<Vec<{}>, orm::Error>", ctx.struct_name),
        body: format!("self.db.find::<{}>()", ctx.struct_name),
        doc: None,
        public: true,
    }
}

/// Fetches the first matching row; "not found" is a distinct error.
pub fn new_one(ctx: QsContext<'_>) -> Method {
    Method {
        owner_type: ctx.qs_type_name(),
        receiver: Some("self".to_string()),
        name: "one".to_string(),
        args: vec![],
        ret: format!("Result<{}, orm::Error>", ctx.struct_name),
        body: format!("self.db.first::<{}>()", ctx.struct_name),
        doc: Some(
            "one is used to retrieve one result. It returns orm::Error::NotFound\n\
             if nothing was fetched"
                .to_string(),
        ),
        public: true,
    }
}

pub fn new_count(ctx: QsContext<'_>) -> Method {
    Method {
        owner_type: ctx.qs_type_name(),
        receiver: Some("self".to_string()),
        name: "count".to_string(),
        args: vec![],
        ret: RESULT_NUM.to_string(),
        body: "self.db.count()".to_string(),
        doc: None,
        public: true,
    }
}

/// Hands the accumulated filters to a companion updater.
pub fn new_get_updater(ctx: QsContext<'_>) -> Method {
    let updater = ctx.updater_type_name();
    Method {
        owner_type: ctx.qs_type_name(),
        receiver: Some("self".to_string()),
        name: "get_updater".to_string(),
        args: vec![],
        ret: updater.clone(),
        body: format!("{updater}::new(self.db)"),
        doc: None,
        public: true,
    }
}

/// Deletes every row matching the accumulated filters.
pub fn new_delete(ctx: QsContext<'_>) -> Method {
    Method {
        owner_type: ctx.qs_type_name(),
        receiver: Some("self".to_string()),
        name: "delete".to_string(),
        args: vec![],
        ret: RESULT_UNIT.to_string(),
        body: format!("self.db.delete_all::<{}>()", ctx.struct_name),
        doc: None,
        public: true,
    }
}

/// Count-returning delete, honoring soft deletes.
pub fn new_delete_num(ctx: QsContext<'_>) -> Method {
    Method {
        owner_type: ctx.qs_type_name(),
        receiver: Some("self".to_string()),
        name: "delete_num".to_string(),
        args: vec![],
        ret: RESULT_NUM.to_string(),
        body: format!("self.db.delete_all_num::<{}>()", ctx.struct_name),
        doc: None,
        public: true,
    }
}

/// Count-returning hard delete, bypassing soft-delete scoping.
pub fn new_delete_num_unscoped(ctx: QsContext<'_>) -> Method {
    Method {
        owner_type: ctx.qs_type_name(),
        receiver: Some("self".to_string()),
        name: "delete_num_unscoped".to_string(),
        args: vec![],
        ret: RESULT_NUM.to_string(),
        body: format!("self.db.unscoped().delete_all_num::<{}>()", ctx.struct_name),
        doc: None,
        public: true,
    }
}

/// Accessor for the underlying backend handle.
pub fn new_get_db(ctx: QsContext<'_>) -> Method {
    Method {
        owner_type: ctx.qs_type_name(),
        receiver: Some("self".to_string()),
        name: "get_db".to_string(),
        args: vec![],
        ret: "orm::Db".to_string(),
        body: "self.db".to_string(),
        doc: None,
        public: true,
    }
}

/// Row-level modifier on the model struct itself (`create`, `delete`).
pub fn new_struct_modifier(ctx: QsContext<'_>, name: &str) -> Method {
    Method {
        owner_type: ctx.struct_name.to_string(),
        receiver: Some("&mut self".to_string()),
        name: name.to_string(),
        args: vec![Arg::new("db", "&orm::Db")],
        ret: RESULT_UNIT.to_string(),
        body: format!("db.{name}(self)"),
        doc: None,
        public: true,
    }
}

/// Model-level `update`: writes the named schema fields of this row by
/// primary key. "Not found" passes through distinctly, everything else is
/// wrapped with the struct name for context.
pub fn new_struct_update(ctx: QsContext<'_>, fields: &[crate::field::FieldInfo]) -> Method {
    let mut arms = String::new();
    for f in fields {
        arms.push_str(&format!(
            "\"{db}\" => updates.set(\"{db}\", self.{field}.clone()),\n",
            db = f.db_name,
            field = escape_ident(&f.name),
        ));
    }
    let body = format!(
        "let mut updates = orm::Values::new();\n\
         for f in fields {{\n\
         match f.as_str() {{\n\
         {arms}\
         _ => {{}}\n\
         }}\n\
         }}\n\
         match db.model_row(self).updates(updates) {{\n\
         Err(orm::Error::NotFound) => Err(orm::Error::NotFound),\n\
         Err(err) => Err(orm::Error::wrap(\"can't update {struct_name} fields\", err)),\n\
         Ok(()) => Ok(()),\n\
         }}",
        struct_name = ctx.struct_name,
    );
    Method {
        owner_type: ctx.struct_name.to_string(),
        receiver: Some("&self".to_string()),
        name: "update".to_string(),
        args: vec![
            Arg::new("db", "&orm::Db"),
            Arg::new("fields", format!("&[{}]", ctx.schema_field_type_name())),
        ],
        ret: RESULT_UNIT.to_string(),
        body,
        doc: Some(format!("update updates {} fields by primary key", ctx.struct_name)),
        public: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldInfo, FieldKind};

    fn text_field() -> FieldInfo {
        FieldInfo {
            name: "name".to_string(),
            db_name: "name".to_string(),
            type_name: "String".to_string(),
            kind: FieldKind::Text,
        }
    }

    #[test]
    fn test_binary_filter_shape() {
        let f = text_field();
        let ctx = QsContext::new("User");
        let m = new_binary_filter(ctx.field(&f), FilterOp::Eq);
        assert_eq!(m.name, "name_eq");
        assert_eq!(m.owner_type, "UserQuerySet");
        assert_eq!(m.ret, "UserQuerySet");
        assert_eq!(m.body, "Self::w(self.db.filter(\"name = ?\", name))");
    }

    #[test]
    fn test_like_filter_uses_sql_spelling() {
        let f = text_field();
        let m = new_binary_filter(QsContext::new("User").field(&f), FilterOp::NotLike);
        assert_eq!(m.name, "name_not_like");
        assert!(m.body.contains("name NOT LIKE ?"));
    }

    #[test]
    fn test_in_filter_guards_empty_input() {
        let f = text_field();
        let m = new_in_filter(QsContext::new("User").field(&f));
        assert_eq!(m.name, "name_in");
        assert_eq!(m.args[0].type_name, "Vec<String>");
        assert!(m.body.contains("if name.is_empty()"));
        assert!(m.body.contains("must at least pass one name in name_in"));
        assert!(m.body.contains("name IN (?)"));
    }

    #[test]
    fn test_order_methods_are_operation_first() {
        let f = text_field();
        let m = new_order_asc_by(QsContext::new("User").field(&f));
        assert_eq!(m.name, "order_asc_by_name");
        assert!(m.body.contains("name ASC"));
    }

    #[test]
    fn test_preload_uses_declared_field_name() {
        let f = FieldInfo {
            name: "blog".to_string(),
            db_name: "my_column".to_string(),
            type_name: "Blog".to_string(),
            kind: FieldKind::Assoc,
        };
        let m = new_preload(QsContext::new("Post").field(&f));
        assert_eq!(m.name, "preload_blog");
        assert!(m.body.contains("preload(\"blog\")"));
    }

    #[test]
    fn test_null_checks_are_field_first() {
        let f = text_field();
        let m = new_is_null(QsContext::new("User").field(&f));
        assert_eq!(m.name, "name_is_null");
        assert!(m.body.contains("name IS NULL"));
    }

    #[test]
    fn test_one_has_not_found_doc() {
        let m = new_one(QsContext::new("User"));
        assert!(m.doc.as_deref().unwrap_or("").contains("orm::Error::NotFound"));
        assert_eq!(m.ret, "Result<User, orm::Error>");
    }

    #[test]
    fn test_struct_update_lists_all_columns() {
        let fields = vec![
            text_field(),
            FieldInfo {
                name: "age".to_string(),
                db_name: "age".to_string(),
                type_name: "i32".to_string(),
                kind: FieldKind::Numeric,
            },
        ];
        let m = new_struct_update(QsContext::new("User"), &fields);
        assert_eq!(m.owner_type, "User");
        assert!(m.body.contains("\"name\" => updates.set(\"name\", self.name.clone()),"));
        assert!(m.body.contains("\"age\" => updates.set(\"age\", self.age.clone()),"));
        assert!(m.body.contains("Err(orm::Error::NotFound) => Err(orm::Error::NotFound)"));
    }
}

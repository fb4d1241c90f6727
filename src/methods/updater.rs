//! Constructors for the companion updater type: pending-change setters and
//! the apply operations.

use super::{Arg, FieldContext, Method, QsContext, escape_ident, field_arg_name, field_method_name};

/// Updater constructor: scopes the backend handle to the model and starts
/// with an empty pending-changes map.
pub fn new_updater_ctor(ctx: QsContext<'_>) -> Method {
    let updater = ctx.updater_type_name();
    Method {
        owner_type: updater.clone(),
        receiver: None,
        name: "new".to_string(),
        args: vec![Arg::new("db", "orm::Db")],
        ret: updater.clone(),
        body: format!(
            "{updater} {{ fields: orm::Values::new(), db: db.model::<{}>() }}",
            ctx.struct_name
        ),
        doc: Some(format!("new creates a new {} updater", ctx.struct_name)),
        public: true,
    }
}

/// `set_<field>`: accumulates one field→value pair into the pending-changes
/// map, keyed by the generated schema column.
pub fn new_updater_set(fctx: FieldContext<'_>) -> Method {
    let arg = field_arg_name(fctx.field_name());
    let updater = fctx.qs.updater_type_name();
    let body = format!(
        "self.fields.set({}.{}.as_str(), {arg});\nself",
        fctx.qs.schema_const_name(),
        escape_ident(fctx.field_name()),
    );
    Method {
        owner_type: updater.clone(),
        receiver: Some("mut self".to_string()),
        name: field_method_name("set", fctx.field_name(), false),
        args: vec![Arg::new(arg, fctx.type_name())],
        ret: updater,
        body,
        doc: None,
        public: true,
    }
}

/// Applies the pending changes; fails distinctly when no row matched.
pub fn new_updater_update(ctx: QsContext<'_>) -> Method {
    Method {
        owner_type: ctx.updater_type_name(),
        receiver: Some("self".to_string()),
        name: "update".to_string(),
        args: vec![],
        ret: "Result<(), orm::Error>".to_string(),
        body: "self.db.updates(self.fields)".to_string(),
        doc: None,
        public: true,
    }
}

/// Applies the pending changes and reports the affected-row count.
pub fn new_updater_update_num(ctx: QsContext<'_>) -> Method {
    Method {
        owner_type: ctx.updater_type_name(),
        receiver: Some("self".to_string()),
        name: "update_num".to_string(),
        args: vec![],
        ret: "Result<i64, orm::Error>".to_string(),
        body: "self.db.updates_num(self.fields)".to_string(),
        doc: None,
        public: true,
    }
}

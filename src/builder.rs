//! Method Catalog Builder: decides, per field category, which operations
//! apply, and enumerates the struct-level operations that apply regardless
//! of fields. Pure; every "error" it encodes is deferred into generated
//! method bodies as runtime behavior of the backend.

use crate::field::{FieldInfo, FieldKind};
use crate::methods::{FilterOp, Method, QsContext, queryset, updater};

/// Collects the full generated method set for one annotated struct.
pub struct MethodsBuilder<'a> {
    ctx: QsContext<'a>,
    fields: &'a [FieldInfo],
    methods: Vec<Method>,
}

impl<'a> MethodsBuilder<'a> {
    pub fn new(struct_name: &'a str, fields: &'a [FieldInfo]) -> Self {
        MethodsBuilder {
            ctx: QsContext::new(struct_name),
            fields,
            methods: Vec::new(),
        }
    }

    /// Builds the complete catalog. Methods for one field never depend on
    /// another field; ordering here is irrelevant because the assembler
    /// sorts the result.
    pub fn build(mut self) -> Vec<Method> {
        self.build_constructors();
        self.build_select_methods();
        self.build_aggr_methods();
        self.build_crud_methods();
        self.build_updater_struct_methods();

        for f in self.fields {
            self.build_queryset_field_methods(f);
            self.build_updater_field_methods(f);
        }

        self.methods
    }

    fn build_constructors(&mut self) {
        self.methods.push(queryset::new_queryset_ctor(self.ctx));
        self.methods.push(queryset::new_queryset_wrap(self.ctx));
        self.methods.push(queryset::new_select(self.ctx));
    }

    fn build_select_methods(&mut self) {
        self.methods.push(queryset::new_all(self.ctx));
        self.methods.push(queryset::new_one(self.ctx));
        self.methods.push(queryset::new_limit(self.ctx));
        self.methods.push(queryset::new_offset(self.ctx));
    }

    fn build_aggr_methods(&mut self) {
        self.methods.push(queryset::new_count(self.ctx));
    }

    fn build_crud_methods(&mut self) {
        self.methods.push(queryset::new_get_updater(self.ctx));
        self.methods.push(queryset::new_delete(self.ctx));
        self.methods.push(queryset::new_struct_modifier(self.ctx, "create"));
        self.methods.push(queryset::new_struct_modifier(self.ctx, "delete"));
        self.methods.push(queryset::new_delete_num(self.ctx));
        self.methods.push(queryset::new_delete_num_unscoped(self.ctx));
        self.methods.push(queryset::new_get_db(self.ctx));
    }

    fn build_updater_struct_methods(&mut self) {
        self.methods.push(updater::new_updater_ctor(self.ctx));
        self.methods.push(updater::new_updater_update(self.ctx));
        self.methods.push(updater::new_updater_update_num(self.ctx));
        self.methods.push(queryset::new_struct_update(self.ctx, self.fields));
    }

    fn build_queryset_field_methods(&mut self, f: &FieldInfo) {
        let methods = self.queryset_methods_for_field(f);
        self.methods.extend(methods);
    }

    /// Category → operation set. Recursive for `Option` fields: the pointee
    /// contributes exactly its own applicable set, and the wrapper adds the
    /// null checks.
    fn queryset_methods_for_field(&self, f: &FieldInfo) -> Vec<Method> {
        let fctx = self.ctx.field(f);

        let mut basic = vec![
            queryset::new_binary_filter(fctx, FilterOp::Eq),
            queryset::new_binary_filter(fctx, FilterOp::Ne),
            queryset::new_order_asc_by(fctx),
            queryset::new_order_desc_by(fctx),
        ];
        if !f.is_time() {
            basic.push(queryset::new_in_filter(fctx));
            basic.push(queryset::new_not_in_filter(fctx));
        }

        let numeric = |fctx| {
            vec![
                queryset::new_binary_filter(fctx, FilterOp::Lt),
                queryset::new_binary_filter(fctx, FilterOp::Gt),
                queryset::new_binary_filter(fctx, FilterOp::Lte),
                queryset::new_binary_filter(fctx, FilterOp::Gte),
            ]
        };

        match &f.kind {
            FieldKind::Text => {
                basic.push(queryset::new_binary_filter(fctx, FilterOp::Like));
                basic.push(queryset::new_binary_filter(fctx, FilterOp::NotLike));
                basic.extend(numeric(fctx));
                basic
            }
            FieldKind::Numeric | FieldKind::Time => {
                basic.extend(numeric(fctx));
                basic
            }
            // association: base ops are suppressed entirely
            FieldKind::Assoc => vec![queryset::new_preload(fctx)],
            FieldKind::Option(inner) => {
                let mut methods = self.queryset_methods_for_field(inner);
                methods.push(queryset::new_is_null(fctx));
                methods.push(queryset::new_is_not_null(fctx));
                methods
            }
            // opaque blob: equality family only
            FieldKind::Blob => basic,
        }
    }

    fn build_updater_field_methods(&mut self, f: &FieldInfo) {
        match &f.kind {
            // association setters are a documented gap
            FieldKind::Assoc => return,
            FieldKind::Option(inner) if inner.kind == FieldKind::Assoc => return,
            _ => {}
        }
        self.methods.push(updater::new_updater_set(self.ctx.field(f)));
    }
}

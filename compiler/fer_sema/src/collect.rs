//! Declaration collection.
//!
//! One walk over the parsed items, no re-entrancy. Every struct-like
//! declaration, alias, and function prototype lands in the analysis state;
//! nothing is resolved here beyond builtin names. Named references to other
//! types are interned as `Incomplete` and handed to the resolver.

use fer_diagnostic::{duplicate_type, Diagnostic, DiagnosticQueue, ErrorCode};
use fer_ir::{
    FunctionDecl, Ident, Item, ItemKind, Span, StringInterner, StructDecl, TypeAliasDecl,
    TypeExpr, TypeExprKind,
};
use fer_types::{
    AliasData, Builtin, Field, FuncDecl, ScopeKind, ScopeStack, TypeId, TypePool, UdtData,
};
use tracing::debug;

use crate::AnalysisState;

/// Walk a compilation unit's items, registering every declaration.
pub fn collect(
    items: &[Item],
    interner: &StringInterner,
    state: &mut AnalysisState,
    queue: &mut DiagnosticQueue,
) {
    let mut collector = Collector {
        interner,
        state,
        queue,
        stack: ScopeStack::new(),
    };
    collector.walk_items(items);
}

struct Collector<'a> {
    interner: &'a StringInterner,
    state: &'a mut AnalysisState,
    queue: &'a mut DiagnosticQueue,
    stack: ScopeStack,
}

impl Collector<'_> {
    fn walk_items(&mut self, items: &[Item]) {
        for item in items {
            match &item.kind {
                ItemKind::Udt(decl) => self.collect_udt(decl, item.span),
                ItemKind::TypeAlias(decl) => self.collect_alias(decl, item.span),
                ItemKind::Function(decl) => self.collect_function(decl, item.span),
            }
        }
    }

    fn collect_udt(&mut self, decl: &StructDecl, span: Span) {
        let simple = Ident::simple(decl.name);
        // The duplicate check runs before registration, so a type may
        // reference itself in its own body but not shadow a sibling.
        if let Some(previous) = self.find_type_in_scope(&simple) {
            let prev_span = self.declaration_span(previous);
            self.queue
                .report(duplicate_type(span, prev_span, self.interner.lookup(decl.name)));
            return;
        }

        let scope = self.stack.enter(&mut self.state.scopes, ScopeKind::Udt, decl.name);
        let qualified = self.state.scopes.qualify(scope, Ident::EMPTY);

        let fields = self.layout_fields(decl);

        let (_, type_id) = self.state.pool.register_structure(UdtData {
            name: qualified.clone(),
            kind: decl.kind,
            fields,
            scope,
            complete: false,
            span,
        });
        // The scope-chain search above already rejected duplicates.
        let _ = self.state.registry.insert(qualified.clone(), type_id);
        debug!(
            name = %qualified.display(self.interner),
            kind = decl.kind.keyword(),
            "registered type"
        );

        self.walk_items(&decl.items);
        self.stack.exit();
    }

    /// Lower the declared field types in place. Nothing resolves here; the
    /// scope recorded on the registered type drives later lookup, so the
    /// enclosing walk's movement cannot affect field resolution.
    fn layout_fields(&mut self, decl: &StructDecl) -> Vec<Field> {
        decl.fields
            .iter()
            .map(|f| Field {
                name: f.name,
                ty: lower_type_expr(&mut self.state.pool, self.interner, &f.ty),
                is_public: f.is_public,
                is_mutable: f.is_mutable,
                storage: f.storage,
                span: f.span,
            })
            .collect()
    }

    fn collect_alias(&mut self, decl: &TypeAliasDecl, span: Span) {
        let simple = Ident::simple(decl.name);
        if let Some(previous) = self.find_type_in_scope(&simple) {
            let prev_span = self.declaration_span(previous);
            self.queue
                .report(duplicate_type(span, prev_span, self.interner.lookup(decl.name)));
            return;
        }

        let qualified = self.state.scopes.qualify(self.stack.current(), simple);
        // Backing resolution is eager; an unknown name stays incomplete for
        // the resolver to substitute.
        let backing = lower_type_expr(&mut self.state.pool, self.interner, &decl.backing);
        let (_, type_id) = self.state.pool.register_alias(AliasData {
            name: qualified.clone(),
            backing,
            scope: self.stack.current(),
            span,
        });
        let _ = self.state.registry.insert(qualified.clone(), type_id);
        debug!(name = %qualified.display(self.interner), "registered alias");
    }

    fn collect_function(&mut self, decl: &FunctionDecl, span: Span) {
        let scope_name = self.state.scopes.qualify(self.stack.current(), Ident::EMPTY);
        let qualified = decl.qualified_name(&scope_name);

        let params: Vec<(fer_ir::Name, TypeId)> = decl
            .params
            .iter()
            .map(|p| (p.name, lower_type_expr(&mut self.state.pool, self.interner, &p.ty)))
            .collect();
        let ret = lower_type_expr(&mut self.state.pool, self.interner, &decl.ret);
        let param_tys: Vec<TypeId> = params.iter().map(|(_, t)| *t).collect();
        let signature = self.state.pool.function(param_tys, ret, decl.varargs);

        let result = self.state.functions.insert(FuncDecl {
            name: qualified.clone(),
            call_conv: decl.call_conv,
            signature,
            params,
            varargs: decl.varargs,
            is_extern: decl.is_extern,
            generic_params: decl.generic_params.clone(),
            body: decl.body.clone(),
            scope: self.stack.current(),
            span,
        });
        match result {
            Ok(_) => {
                debug!(name = %qualified.display(self.interner), "registered function");
            }
            Err(existing) => {
                let previous = self.state.functions.get(existing).span;
                self.queue.report(
                    Diagnostic::error(ErrorCode::E3003)
                        .with_message(format!(
                            "function `{}` with this signature is already defined",
                            qualified.display(self.interner)
                        ))
                        .with_label(span, "redefined here")
                        .with_secondary_label(previous, "first defined here"),
                );
            }
        }
    }

    /// Search the lexical scope chain outward for a type with this name.
    fn find_type_in_scope(&self, name: &Ident) -> Option<TypeId> {
        self.state
            .scopes
            .chain(self.stack.current())
            .find_map(|scope| {
                let candidate = self.state.scopes.qualify(scope, name.clone());
                self.state.registry.get(&candidate)
            })
    }

    fn declaration_span(&self, ty: TypeId) -> Span {
        if let Some(udt) = self.state.pool.as_structure(ty) {
            self.state.pool.udt(udt).span
        } else if let Some(alias) = self.state.pool.as_alias(ty) {
            self.state.pool.alias(alias).span
        } else {
            Span::DUMMY
        }
    }
}

/// Convert a source type expression into a pool entry.
///
/// Builtin names intern to their fixed ids; every other named reference
/// becomes `Incomplete` for the resolver. Derivations, tuples, vectors, and
/// function types are interned structurally over their lowered children.
pub fn lower_type_expr(
    pool: &mut TypePool,
    interner: &StringInterner,
    expr: &TypeExpr,
) -> TypeId {
    match &expr.kind {
        TypeExprKind::Named(ident) => {
            if !ident.is_qualified() {
                if let Some(name) = ident.last() {
                    if let Some(builtin) = Builtin::from_name(interner.lookup(name)) {
                        return TypePool::builtin(builtin);
                    }
                }
            }
            pool.incomplete(ident.clone())
        }
        TypeExprKind::Pointer(inner) => {
            let base = lower_type_expr(pool, interner, inner);
            pool.pointer(base).unwrap_or(base)
        }
        TypeExprKind::Reference(inner) => {
            let base = lower_type_expr(pool, interner, inner);
            pool.reference(base).unwrap_or(base)
        }
        TypeExprKind::Slice(inner) => {
            let base = lower_type_expr(pool, interner, inner);
            pool.slice(base).unwrap_or(base)
        }
        TypeExprKind::Tuple(elems) => {
            let lowered = elems.iter().map(|e| lower_type_expr(pool, interner, e)).collect();
            pool.tuple(lowered)
        }
        TypeExprKind::Vector { elem, len } => {
            let lowered = lower_type_expr(pool, interner, elem);
            pool.vector(lowered, *len)
        }
        TypeExprKind::Function { params, ret, varargs } => {
            let lowered: Vec<TypeId> =
                params.iter().map(|p| lower_type_expr(pool, interner, p)).collect();
            let ret = lower_type_expr(pool, interner, ret);
            pool.function(lowered, ret, *varargs)
        }
    }
}

#[cfg(test)]
mod tests {
    use fer_diagnostic::QueueConfig;
    use fer_ir::{CallConv, FieldDecl, Param, StorageFlags, UdtKind};
    use fer_types::TypeKind;
    use pretty_assertions::assert_eq;

    use super::*;

    fn named(interner: &StringInterner, name: &str) -> TypeExpr {
        TypeExpr::new(TypeExprKind::Named(Ident::parse(name, interner)), Span::DUMMY)
    }

    fn field(interner: &StringInterner, name: &str, ty: TypeExpr) -> FieldDecl {
        FieldDecl {
            name: interner.intern(name),
            ty,
            is_public: true,
            is_mutable: false,
            storage: StorageFlags::empty(),
            span: Span::DUMMY,
        }
    }

    fn udt(interner: &StringInterner, name: &str, fields: Vec<FieldDecl>, span: Span) -> Item {
        Item::new(
            ItemKind::Udt(StructDecl {
                name: interner.intern(name),
                kind: UdtKind::Struct,
                fields,
                items: Vec::new(),
            }),
            span,
        )
    }

    fn run(items: &[Item], interner: &StringInterner) -> (AnalysisState, DiagnosticQueue) {
        let mut state = AnalysisState::new();
        let mut queue = DiagnosticQueue::with_config(QueueConfig::unlimited());
        collect(items, interner, &mut state, &mut queue);
        (state, queue)
    }

    #[test]
    fn test_registers_in_declaration_order() {
        let interner = StringInterner::new();
        let items = vec![
            udt(&interner, "Zeta", Vec::new(), Span::new(0, 4)),
            udt(&interner, "Alpha", Vec::new(), Span::new(10, 15)),
        ];
        let (state, queue) = run(&items, &interner);
        assert!(!queue.has_errors());
        let order: Vec<String> =
            state.registry.iter().map(|(name, _)| name.display(&interner)).collect();
        assert_eq!(order, vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn test_duplicate_type_first_wins() {
        let interner = StringInterner::new();
        let items = vec![
            udt(&interner, "Vec2", vec![field(&interner, "x", named(&interner, "f32"))], Span::new(0, 4)),
            udt(&interner, "Vec2", Vec::new(), Span::new(20, 24)),
        ];
        let (state, queue) = run(&items, &interner);

        assert_eq!(queue.error_count(), 1);
        assert_eq!(state.registry.len(), 1);
        // The surviving entry is the first declaration, fields intact.
        let ty = state.registry.get(&Ident::parse("Vec2", &interner)).expect("registered");
        let udt_id = state.pool.as_structure(ty).expect("structure");
        assert_eq!(state.pool.udt(udt_id).fields.len(), 1);
    }

    #[test]
    fn test_nested_udt_gets_qualified_name() {
        let interner = StringInterner::new();
        let inner = udt(&interner, "Inner", Vec::new(), Span::DUMMY);
        let outer = Item::new(
            ItemKind::Udt(StructDecl {
                name: interner.intern("Outer"),
                kind: UdtKind::Class,
                fields: Vec::new(),
                items: vec![inner],
            }),
            Span::DUMMY,
        );
        let (state, queue) = run(std::slice::from_ref(&outer), &interner);
        assert!(!queue.has_errors());
        assert!(state.registry.contains(&Ident::parse("Outer", &interner)));
        assert!(state.registry.contains(&Ident::parse("Outer.Inner", &interner)));
    }

    #[test]
    fn test_builtin_fields_resolve_immediately() {
        let interner = StringInterner::new();
        let items = vec![udt(
            &interner,
            "Pair",
            vec![
                field(&interner, "a", named(&interner, "i32")),
                field(&interner, "b", named(&interner, "Other")),
            ],
            Span::DUMMY,
        )];
        let (state, _) = run(&items, &interner);

        let ty = state.registry.get(&Ident::parse("Pair", &interner)).expect("registered");
        let udt_id = state.pool.as_structure(ty).expect("structure");
        let fields = &state.pool.udt(udt_id).fields;
        assert_eq!(fields[0].ty, TypeId::I32);
        assert!(matches!(state.pool.kind(fields[1].ty), TypeKind::Incomplete(_)));
    }

    #[test]
    fn test_alias_registers_with_incomplete_backing() {
        let interner = StringInterner::new();
        let items = vec![Item::new(
            ItemKind::TypeAlias(TypeAliasDecl {
                name: interner.intern("Handle"),
                backing: TypeExpr::new(
                    TypeExprKind::Pointer(Box::new(named(&interner, "Resource"))),
                    Span::DUMMY,
                ),
            }),
            Span::DUMMY,
        )];
        let (state, queue) = run(&items, &interner);
        assert!(!queue.has_errors());
        let ty = state.registry.get(&Ident::parse("Handle", &interner)).expect("registered");
        assert!(state.pool.as_alias(ty).is_some());
    }

    #[test]
    fn test_function_overloads_and_exact_duplicate() {
        let interner = StringInterner::new();
        let f = |param_ty: &str, span: Span| {
            Item::new(
                ItemKind::Function(FunctionDecl {
                    name: interner.intern("print"),
                    call_conv: CallConv::Cdecl,
                    params: vec![Param {
                        name: interner.intern("x"),
                        ty: named(&interner, param_ty),
                        span: Span::DUMMY,
                    }],
                    ret: named(&interner, "void"),
                    varargs: false,
                    is_extern: false,
                    generic_params: Vec::new(),
                    body: None,
                }),
                span,
            )
        };
        let items = vec![
            f("i32", Span::new(0, 5)),
            f("f64", Span::new(10, 15)),
            f("i32", Span::new(20, 25)),
        ];
        let (state, mut queue) = run(&items, &interner);

        // Two distinct overloads registered, one exact duplicate diagnosed.
        assert_eq!(state.functions.len(), 2);
        assert_eq!(queue.error_count(), 1);
        let flushed = queue.flush();
        assert_eq!(flushed[0].code, ErrorCode::E3003);
    }

    #[test]
    fn test_lower_type_expr_interns_structurally() {
        let interner = StringInterner::new();
        let mut pool = TypePool::new();
        let expr = TypeExpr::new(
            TypeExprKind::Pointer(Box::new(named(&interner, "i8"))),
            Span::DUMMY,
        );
        let a = lower_type_expr(&mut pool, &interner, &expr);
        let b = lower_type_expr(&mut pool, &interner, &expr);
        assert_eq!(a, b);
    }
}

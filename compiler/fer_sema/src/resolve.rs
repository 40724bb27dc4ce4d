//! Type resolution and dependency ordering.
//!
//! Structure fields and alias backings may name types that were declared
//! later in the unit, or that recurse through pointer indirection. The
//! resolver decides a safe materialization order in four steps:
//!
//! 1. build a dependency graph over the registered types (explicit node
//!    arena, adjacency lists, a synthetic root with no type payload);
//! 2. topologically sort it child-before-parent, diagnosing by-value cycles;
//! 3. substitute resolved definitions into fields, alias backings, and
//!    function signatures, preserving derived wrappers around the
//!    substituted base;
//! 4. materialize every complete, non-aliased type through the target
//!    machine, in the sorted order.
//!
//! Unresolvable names are diagnosed once and skipped; the owning type stays
//! incomplete and is never handed to the target machine.

use fer_diagnostic::{unresolved_type, Diagnostic, DiagnosticQueue, ErrorCode};
use fer_ir::{Ident, Span, StringInterner};
use fer_types::{BackendType, FuncId, ScopeId, TargetMachine, TypeId, TypeKind};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::AnalysisState;

/// Index of a node in the resolver's dependency graph.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
struct NodeId(u32);

impl NodeId {
    const ROOT: NodeId = NodeId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

struct Node {
    /// Qualified name; empty for the root.
    name: Ident,
    /// `None` only for the synthetic root.
    ty: Option<TypeId>,
}

/// Dependency graph over one unit's registered types.
struct DepGraph {
    nodes: Vec<Node>,
    /// `deps[n]` lists the nodes `n` references by value, in discovery order.
    deps: Vec<Vec<NodeId>>,
    by_type: FxHashMap<TypeId, NodeId>,
}

impl DepGraph {
    fn new() -> Self {
        DepGraph {
            nodes: vec![Node { name: Ident::EMPTY, ty: None }],
            deps: vec![Vec::new()],
            by_type: FxHashMap::default(),
        }
    }

    fn add(&mut self, name: Ident, ty: TypeId) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or_else(|_| unreachable!()));
        self.nodes.push(Node { name, ty: Some(ty) });
        self.deps.push(Vec::new());
        self.by_type.insert(ty, id);
        id
    }
}

/// A named reference found inside a type, tagged with how it is held.
struct TypeRef {
    target: RefTarget,
    by_value: bool,
    span: Span,
}

enum RefTarget {
    /// Not yet resolved to a declaration.
    Named(Ident),
    /// Already points at a registered nominal type.
    Direct(TypeId),
}

/// Runs dependency ordering, substitution, and materialization.
pub struct Resolver<'a> {
    interner: &'a StringInterner,
    state: &'a mut AnalysisState,
    queue: &'a mut DiagnosticQueue,
    /// One E3001 per (owner, referenced name), across all phases.
    reported: FxHashSet<(Ident, Ident)>,
    /// Types participating in a by-value cycle; never marked complete.
    cyclic: FxHashSet<TypeId>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        interner: &'a StringInterner,
        state: &'a mut AnalysisState,
        queue: &'a mut DiagnosticQueue,
    ) -> Self {
        Resolver {
            interner,
            state,
            queue,
            reported: FxHashSet::default(),
            cyclic: FxHashSet::default(),
        }
    }

    /// Run every phase in order. Returns the number of materialized types.
    pub fn run(&mut self, target: &mut dyn TargetMachine) -> usize {
        self.sort_types();
        self.resolve_types();
        self.resolve_functions();
        self.materialize_types(target).len()
    }

    /// Build the dependency graph and reorder the registry so every type
    /// follows the types it references by value.
    pub fn sort_types(&mut self) {
        let mut graph = DepGraph::new();
        for (name, ty) in self.state.registry.iter() {
            graph.add(name.clone(), ty);
        }

        // Edge discovery with an explicit work stack; each node is scanned
        // at most once, so total work is O(nodes + edges).
        let mut scanned: FxHashSet<NodeId> = FxHashSet::default();
        let top_level: Vec<NodeId> = (1..graph.nodes.len())
            .map(|i| NodeId(i as u32))
            .collect();
        for &top in &top_level {
            let mut work: Vec<(NodeId, NodeId)> = vec![(NodeId::ROOT, top)];
            while let Some((_parent, child)) = work.pop() {
                if !scanned.insert(child) {
                    continue;
                }
                let Some(child_ty) = graph.nodes[child.index()].ty else {
                    continue;
                };
                for type_ref in self.references_of(child_ty) {
                    let resolved = match type_ref.target {
                        RefTarget::Direct(ty) => Some(ty),
                        RefTarget::Named(ref name) => {
                            let scope = self.scope_of(child_ty);
                            let found = self.resolve_name(scope, name);
                            if found.is_none() && type_ref.by_value {
                                let owner = self.owner_name(child_ty);
                                self.report_unresolved(&owner, scope, name, type_ref.span);
                            }
                            found
                        }
                    };
                    let Some(target_ty) = resolved else { continue };
                    if !type_ref.by_value {
                        continue;
                    }
                    let Some(&target) = graph.by_type.get(&target_ty) else {
                        // Builtin or structural target; always ready.
                        continue;
                    };
                    debug!(
                        from = %graph.nodes[child.index()].name.display(self.interner),
                        to = %graph.nodes[target.index()].name.display(self.interner),
                        "by-value dependency"
                    );
                    graph.deps[child.index()].push(target);
                    if !scanned.contains(&target) {
                        work.push((child, target));
                    }
                }
            }
            graph.deps[NodeId::ROOT.index()].push(top);
        }

        let order = self.toposort(&graph);
        debug!(entries = order.len(), "reordering type registry");
        self.state.registry.reorder(&order);
    }

    /// Post-order DFS from the root: children before parents. By-value
    /// cycles are diagnosed and their participants remembered as cyclic.
    fn toposort(&mut self, graph: &DepGraph) -> Vec<Ident> {
        const WHITE: u8 = 0;
        const GRAY: u8 = 1;
        const BLACK: u8 = 2;

        let mut color = vec![WHITE; graph.nodes.len()];
        let mut order: Vec<Ident> = Vec::with_capacity(graph.nodes.len() - 1);
        // (node, next dependency index) pairs; no recursion.
        let mut stack: Vec<(NodeId, usize)> = vec![(NodeId::ROOT, 0)];
        color[NodeId::ROOT.index()] = GRAY;

        loop {
            let Some(&(node, next)) = stack.last() else { break };
            let deps = &graph.deps[node.index()];
            if next < deps.len() {
                if let Some(frame) = stack.last_mut() {
                    frame.1 += 1;
                }
                let child = deps[next];
                match color[child.index()] {
                    WHITE => {
                        color[child.index()] = GRAY;
                        stack.push((child, 0));
                    }
                    GRAY => self.report_cycle(graph, &stack, child),
                    _ => {}
                }
            } else {
                color[node.index()] = BLACK;
                stack.pop();
                if node != NodeId::ROOT {
                    order.push(graph.nodes[node.index()].name.clone());
                }
            }
        }
        order
    }

    /// Diagnose one by-value cycle: the gray node plus everything above it
    /// on the DFS stack forms the loop.
    fn report_cycle(&mut self, graph: &DepGraph, stack: &[(NodeId, usize)], reentered: NodeId) {
        let start = stack
            .iter()
            .position(|&(n, _)| n == reentered)
            .unwrap_or(stack.len() - 1);
        let participants: Vec<NodeId> = stack[start..].iter().map(|&(n, _)| n).collect();

        let mut path = String::new();
        for &node in &participants {
            path.push_str(&graph.nodes[node.index()].name.display(self.interner));
            path.push_str(" -> ");
        }
        path.push_str(&graph.nodes[reentered.index()].name.display(self.interner));

        let span = graph.nodes[reentered.index()]
            .ty
            .and_then(|ty| self.state.pool.as_structure(ty))
            .map_or(Span::DUMMY, |udt| self.state.pool.udt(udt).span);

        self.queue.report(
            Diagnostic::error(ErrorCode::E3002)
                .with_message(format!("cyclic by-value type definition: {path}"))
                .with_label(span, "this type contains itself by value")
                .with_suggestion("break the cycle with a pointer or reference field"),
        );
        for node in participants {
            if let Some(ty) = graph.nodes[node.index()].ty {
                self.cyclic.insert(ty);
            }
        }
    }

    /// Substitute resolved definitions into fields and alias backings, in
    /// the sorted registry order, then settle completeness flags.
    pub fn resolve_types(&mut self) {
        let entries: Vec<(Ident, TypeId)> = self
            .state
            .registry
            .iter()
            .map(|(name, ty)| (name.clone(), ty))
            .collect();

        for (_, ty) in &entries {
            let ty = *ty;
            if let Some(udt_id) = self.state.pool.as_structure(ty) {
                let owner = self.state.pool.udt(udt_id).name.clone();
                let scope = self.state.pool.udt(udt_id).scope;
                let field_count = self.state.pool.udt(udt_id).fields.len();
                for i in 0..field_count {
                    let field = self.state.pool.udt(udt_id).fields[i].clone();
                    let substituted = self.substitute(field.ty, scope, &owner, field.span);
                    if substituted != field.ty {
                        self.state.pool.set_field_type(udt_id, i, substituted);
                    }
                }
                let all_complete = self.state.pool.udt(udt_id).fields.iter()
                    .all(|f| self.state.pool.is_complete(f.ty));
                if all_complete && !self.cyclic.contains(&ty) {
                    self.state.pool.mark_complete(udt_id);
                }
            } else if let Some(alias_id) = self.state.pool.as_alias(ty) {
                let data = self.state.pool.alias(alias_id).clone();
                let substituted = self.substitute(data.backing, data.scope, &data.name, data.span);
                if substituted != data.backing {
                    self.state.pool.alias_mut(alias_id).backing = substituted;
                }
            }
        }
    }

    /// Substitute resolved definitions into every collected function's
    /// parameter and return types against its declaration scope, then
    /// re-intern the signature. Runs after [`resolve_types`] so named
    /// parameter types pick up the settled definitions; without this a
    /// parameter naming a user type would stay `Incomplete` through
    /// mangling and body lowering. Generic templates are skipped; their
    /// unbound parameters resolve at monomorphization.
    ///
    /// [`resolve_types`]: Resolver::resolve_types
    pub fn resolve_functions(&mut self) {
        for i in 0..self.state.functions.len() {
            let id = FuncId::from_raw(
                u32::try_from(i).unwrap_or_else(|_| unreachable!()),
            );
            let decl = self.state.functions.get(id);
            if !decl.is_monomorphic() {
                continue;
            }
            let name = decl.name.clone();
            let scope = decl.scope;
            let span = decl.span;
            let params = decl.params.clone();
            let signature = decl.signature;

            let resolved_params: Vec<_> = params
                .iter()
                .map(|&(param, ty)| (param, self.substitute(ty, scope, &name, span)))
                .collect();
            let resolved_signature = self.substitute(signature, scope, &name, span);
            if resolved_signature != signature {
                debug!(
                    name = %name.display(self.interner),
                    "resolved function signature"
                );
            }

            let decl = self.state.functions.get_mut(id);
            decl.params = resolved_params;
            decl.signature = resolved_signature;
        }
    }

    /// Materialize every complete, non-aliased type in registry order.
    ///
    /// Returns the backend handles in materialization order. Incomplete
    /// types are skipped; this is the gate that keeps the
    /// fatal-materialization invariant. A target error on a complete type
    /// means that gate was bypassed and is an internal compiler error.
    pub fn materialize_types(&mut self, target: &mut dyn TargetMachine) -> Vec<BackendType> {
        let entries: Vec<(Ident, TypeId)> = self
            .state
            .registry
            .iter()
            .map(|(name, ty)| (name.clone(), ty))
            .collect();

        let mut materialized = Vec::new();
        for (name, ty) in entries {
            if self.state.pool.as_alias(ty).is_some() {
                continue;
            }
            if !self.state.pool.is_complete(ty) {
                debug!(name = %name.display(self.interner), "skipping incomplete type");
                continue;
            }
            debug!(name = %name.display(self.interner), "materializing type");
            match target.materialize_type(&self.state.pool, ty) {
                Ok(handle) => materialized.push(handle),
                Err(err) => panic!(
                    "internal compiler error: materializing complete type `{}` failed: {err}",
                    name.display(self.interner)
                ),
            }
        }
        materialized
    }

    /// Every named or nominal reference held by a type's fields or backing.
    fn references_of(&self, ty: TypeId) -> Vec<TypeRef> {
        let mut refs = Vec::new();
        if let Some(udt_id) = self.state.pool.as_structure(ty) {
            let data = self.state.pool.udt(udt_id);
            if data.complete {
                return refs;
            }
            for field in &data.fields {
                self.collect_refs(field.ty, true, field.span, &mut refs);
            }
        } else if let Some(alias_id) = self.state.pool.as_alias(ty) {
            let data = self.state.pool.alias(alias_id);
            self.collect_refs(data.backing, true, data.span, &mut refs);
        }
        refs
    }

    fn collect_refs(&self, ty: TypeId, by_value: bool, span: Span, out: &mut Vec<TypeRef>) {
        match self.state.pool.kind(ty) {
            TypeKind::Incomplete(name) => out.push(TypeRef {
                target: RefTarget::Named(name.clone()),
                by_value,
                span,
            }),
            TypeKind::Structure(_) | TypeKind::Aliased(_) => out.push(TypeRef {
                target: RefTarget::Direct(ty),
                by_value,
                span,
            }),
            // Pointer/reference/slice indirection never forces ordering.
            TypeKind::Derived { base, .. } => self.collect_refs(*base, false, span, out),
            TypeKind::Tuple(elems) => {
                for &elem in elems {
                    self.collect_refs(elem, by_value, span, out);
                }
            }
            TypeKind::Vector { elem, .. } => self.collect_refs(*elem, by_value, span, out),
            TypeKind::Function { params, ret, .. } => {
                for &param in params {
                    self.collect_refs(param, false, span, out);
                }
                self.collect_refs(*ret, false, span, out);
            }
            TypeKind::Builtin(_) => {}
        }
    }

    /// Replace `Incomplete` references with their declared definitions,
    /// preserving derived wrappers around the substituted base.
    fn substitute(&mut self, ty: TypeId, scope: ScopeId, owner: &Ident, span: Span) -> TypeId {
        match self.state.pool.kind(ty).clone() {
            TypeKind::Incomplete(name) => match self.resolve_name(scope, &name) {
                Some(target) => target,
                None => {
                    self.report_unresolved(owner, scope, &name, span);
                    ty
                }
            },
            TypeKind::Derived { base, attrs } => {
                let new_base = self.substitute(base, scope, owner, span);
                if new_base == base {
                    return ty;
                }
                self.state.pool.derive(new_base, &attrs).unwrap_or(ty)
            }
            TypeKind::Tuple(elems) => {
                let substituted: Vec<TypeId> = elems
                    .iter()
                    .map(|&e| self.substitute(e, scope, owner, span))
                    .collect();
                if substituted == elems {
                    return ty;
                }
                self.state.pool.tuple(substituted)
            }
            TypeKind::Vector { elem, len } => {
                let substituted = self.substitute(elem, scope, owner, span);
                if substituted == elem {
                    return ty;
                }
                self.state.pool.vector(substituted, len)
            }
            TypeKind::Function { params, ret, varargs } => {
                let new_params: Vec<TypeId> = params
                    .iter()
                    .map(|&p| self.substitute(p, scope, owner, span))
                    .collect();
                let new_ret = self.substitute(ret, scope, owner, span);
                if new_params == params && new_ret == ret {
                    return ty;
                }
                self.state.pool.function(new_params, new_ret, varargs)
            }
            _ => ty,
        }
    }

    /// Resolve a name against the lexical scope chain, innermost first.
    fn resolve_name(&self, scope: ScopeId, name: &Ident) -> Option<TypeId> {
        self.state.scopes.chain(scope).find_map(|s| {
            let candidate = self.state.scopes.qualify(s, name.clone());
            self.state.registry.get(&candidate)
        })
    }

    fn scope_of(&self, ty: TypeId) -> ScopeId {
        if let Some(udt) = self.state.pool.as_structure(ty) {
            self.state.pool.udt(udt).scope
        } else if let Some(alias) = self.state.pool.as_alias(ty) {
            self.state.pool.alias(alias).scope
        } else {
            ScopeId::GLOBAL
        }
    }

    fn report_unresolved(&mut self, owner: &Ident, scope: ScopeId, name: &Ident, span: Span) {
        if !self.reported.insert((owner.clone(), name.clone())) {
            return;
        }
        debug!(
            owner = %owner.display(self.interner),
            name = %name.display(self.interner),
            "unresolved type reference"
        );
        self.queue.report(unresolved_type(
            span,
            &name.display(self.interner),
            &self.state.scopes.display(scope, self.interner),
        ));
    }

    fn owner_name(&self, ty: TypeId) -> Ident {
        if let Some(udt) = self.state.pool.as_structure(ty) {
            self.state.pool.udt(udt).name.clone()
        } else if let Some(alias) = self.state.pool.as_alias(ty) {
            self.state.pool.alias(alias).name.clone()
        } else {
            Ident::EMPTY
        }
    }

    /// Remembered by-value cycle participants, for tests and the pipeline.
    pub fn cyclic_types(&self) -> &FxHashSet<TypeId> {
        &self.cyclic
    }
}

#[cfg(test)]
mod tests {
    use fer_diagnostic::QueueConfig;
    use fer_ir::{
        CallConv, FieldDecl, FunctionDecl, Item, ItemKind, Param, StorageFlags, StructDecl,
        TypeAliasDecl, TypeExpr, TypeExprKind, UdtKind,
    };
    use fer_types::{BackendType, DerivedAttr, TypeError, TypePool};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::collect;

    /// Target that records which types it was asked to materialize.
    struct RecordingTarget {
        materialized: Vec<TypeId>,
    }

    impl RecordingTarget {
        fn new() -> Self {
            RecordingTarget { materialized: Vec::new() }
        }
    }

    impl TargetMachine for RecordingTarget {
        fn materialize_type(
            &mut self,
            pool: &TypePool,
            id: TypeId,
        ) -> Result<BackendType, TypeError> {
            if !pool.is_complete(id) {
                return Err(TypeError::Incomplete(format!("{id:?}")));
            }
            self.materialized.push(id);
            Ok(BackendType(self.materialized.len() as u32 - 1))
        }

        fn pointer_size(&self) -> u32 {
            8
        }

        fn type_alignment(&self, _pool: &TypePool, _id: TypeId) -> u32 {
            8
        }
    }

    fn named(interner: &StringInterner, name: &str) -> TypeExpr {
        TypeExpr::new(TypeExprKind::Named(Ident::parse(name, interner)), Span::DUMMY)
    }

    fn pointer_to(interner: &StringInterner, name: &str) -> TypeExpr {
        TypeExpr::new(
            TypeExprKind::Pointer(Box::new(named(interner, name))),
            Span::DUMMY,
        )
    }

    fn struct_item(
        interner: &StringInterner,
        name: &str,
        fields: Vec<(&str, TypeExpr)>,
        span: Span,
    ) -> Item {
        Item::new(
            ItemKind::Udt(StructDecl {
                name: interner.intern(name),
                kind: UdtKind::Struct,
                fields: fields
                    .into_iter()
                    .map(|(fname, ty)| FieldDecl {
                        name: interner.intern(fname),
                        ty,
                        is_public: true,
                        is_mutable: false,
                        storage: StorageFlags::empty(),
                        span,
                    })
                    .collect(),
                items: Vec::new(),
            }),
            span,
        )
    }

    fn alias_item(interner: &StringInterner, name: &str, backing: TypeExpr) -> Item {
        Item::new(
            ItemKind::TypeAlias(TypeAliasDecl { name: interner.intern(name), backing }),
            Span::DUMMY,
        )
    }

    fn func_item(interner: &StringInterner, name: &str, param_ty: TypeExpr, span: Span) -> Item {
        Item::new(
            ItemKind::Function(FunctionDecl {
                name: interner.intern(name),
                call_conv: CallConv::Cdecl,
                params: vec![Param {
                    name: interner.intern("x"),
                    ty: param_ty,
                    span: Span::DUMMY,
                }],
                ret: named(interner, "void"),
                varargs: false,
                is_extern: false,
                generic_params: Vec::new(),
                body: None,
            }),
            span,
        )
    }

    fn analyze(
        interner: &StringInterner,
        items: &[Item],
    ) -> (AnalysisState, DiagnosticQueue, RecordingTarget) {
        let mut state = AnalysisState::new();
        let mut queue = DiagnosticQueue::with_config(QueueConfig::unlimited());
        collect(items, interner, &mut state, &mut queue);
        let mut target = RecordingTarget::new();
        Resolver::new(interner, &mut state, &mut queue).run(&mut target);
        (state, queue, target)
    }

    #[test]
    fn test_by_value_dependency_orders_child_first() {
        let interner = StringInterner::new();
        // Outer declared first but contains Inner by value.
        let items = vec![
            struct_item(&interner, "Outer", vec![("inner", named(&interner, "Inner"))], Span::new(0, 5)),
            struct_item(&interner, "Inner", vec![("x", named(&interner, "i32"))], Span::new(10, 15)),
        ];
        let (state, queue, target) = analyze(&interner, &items);
        assert!(!queue.has_errors());

        let order: Vec<String> =
            state.registry.iter().map(|(name, _)| name.display(&interner)).collect();
        assert_eq!(order, vec!["Inner", "Outer"]);
        assert_eq!(target.materialized.len(), 2);
    }

    #[test]
    fn test_unresolved_field_single_diagnostic_no_materialization() {
        let interner = StringInterner::new();
        let items = vec![struct_item(
            &interner,
            "Broken",
            vec![("x", named(&interner, "Ghost"))],
            Span::new(0, 6),
        )];
        let (state, mut queue, target) = analyze(&interner, &items);

        assert_eq!(queue.error_count(), 1);
        let flushed = queue.flush();
        assert_eq!(flushed[0].code, ErrorCode::E3001);

        let ty = state.registry.get(&Ident::parse("Broken", &interner)).expect("registered");
        assert!(!state.pool.is_complete(ty));
        assert!(target.materialized.is_empty());
    }

    #[test]
    fn test_by_value_cycle_diagnosed() {
        let interner = StringInterner::new();
        let items = vec![
            struct_item(&interner, "A", vec![("b", named(&interner, "B"))], Span::new(0, 1)),
            struct_item(&interner, "B", vec![("a", named(&interner, "A"))], Span::new(10, 11)),
        ];
        let (state, mut queue, target) = analyze(&interner, &items);

        let flushed = queue.flush();
        assert!(flushed.iter().any(|d| d.code == ErrorCode::E3002));
        let a = state.registry.get(&Ident::parse("A", &interner)).expect("registered");
        let b = state.registry.get(&Ident::parse("B", &interner)).expect("registered");
        assert!(!state.pool.is_complete(a));
        assert!(!state.pool.is_complete(b));
        assert!(target.materialized.is_empty());
    }

    #[test]
    fn test_self_reference_by_value_is_a_cycle() {
        let interner = StringInterner::new();
        let items = vec![struct_item(
            &interner,
            "List",
            vec![("next", named(&interner, "List"))],
            Span::new(0, 4),
        )];
        let (_, mut queue, _) = analyze(&interner, &items);
        let flushed = queue.flush();
        assert!(flushed.iter().any(|d| d.code == ErrorCode::E3002));
    }

    #[test]
    fn test_self_reference_through_pointer_is_fine() {
        let interner = StringInterner::new();
        let items = vec![struct_item(
            &interner,
            "List",
            vec![
                ("value", named(&interner, "i64")),
                ("next", pointer_to(&interner, "List")),
            ],
            Span::new(0, 4),
        )];
        let (state, queue, target) = analyze(&interner, &items);
        assert!(!queue.has_errors());
        let ty = state.registry.get(&Ident::parse("List", &interner)).expect("registered");
        assert!(state.pool.is_complete(ty));
        assert_eq!(target.materialized, vec![ty]);
    }

    #[test]
    fn test_substitution_preserves_derived_wrappers() {
        let interner = StringInterner::new();
        let items = vec![
            struct_item(&interner, "Holder", vec![("p", pointer_to(&interner, "Inner"))], Span::DUMMY),
            struct_item(&interner, "Inner", vec![("x", named(&interner, "i32"))], Span::DUMMY),
        ];
        let (state, queue, _) = analyze(&interner, &items);
        assert!(!queue.has_errors());

        let holder = state.registry.get(&Ident::parse("Holder", &interner)).expect("registered");
        let udt = state.pool.as_structure(holder).expect("structure");
        let field_ty = state.pool.udt(udt).fields[0].ty;
        match state.pool.kind(field_ty) {
            TypeKind::Derived { base, attrs } => {
                assert_eq!(attrs.as_slice(), &[DerivedAttr::Pointer]);
                assert!(state.pool.as_structure(*base).is_some());
            }
            other => panic!("expected derived field type, got {other:?}"),
        }
    }

    #[test]
    fn test_function_params_resolve_against_later_declarations() {
        let interner = StringInterner::new();
        // The function is collected before Packet is declared; its parameter
        // and signature must still settle on the structure.
        let items = vec![
            func_item(&interner, "consume", named(&interner, "Packet"), Span::new(0, 7)),
            struct_item(
                &interner,
                "Packet",
                vec![("len", named(&interner, "u32"))],
                Span::new(10, 16),
            ),
        ];
        let (state, queue, _) = analyze(&interner, &items);
        assert!(!queue.has_errors());

        let (_, decl) = state.functions.iter().next().expect("collected function");
        assert!(state.pool.as_structure(decl.params[0].1).is_some());
        assert!(state.pool.is_complete(decl.signature));
        assert!(decl.mangled_name(&state.pool, &interner).is_ok());
    }

    #[test]
    fn test_alias_typed_param_resolves_to_backing() {
        let interner = StringInterner::new();
        let items = vec![
            alias_item(&interner, "MyInt", named(&interner, "i32")),
            func_item(&interner, "bump", named(&interner, "MyInt"), Span::new(0, 4)),
        ];
        let (state, queue, _) = analyze(&interner, &items);
        assert!(!queue.has_errors());

        let (_, decl) = state.functions.iter().next().expect("collected function");
        assert_eq!(state.pool.resolve_alias(decl.params[0].1), TypeId::I32);
    }

    #[test]
    fn test_generic_function_signature_stays_unresolved() {
        let interner = StringInterner::new();
        let mut item = func_item(&interner, "identity", named(&interner, "T"), Span::new(0, 8));
        if let ItemKind::Function(decl) = &mut item.kind {
            decl.generic_params = vec![interner.intern("T")];
        }
        let (state, queue, _) = analyze(&interner, &[item]);

        // The unbound parameter is not an error and is left alone.
        assert!(!queue.has_errors());
        let (_, decl) = state.functions.iter().next().expect("collected function");
        assert!(matches!(
            state.pool.kind(decl.params[0].1),
            TypeKind::Incomplete(_)
        ));
    }

    #[test]
    fn test_field_resolves_in_owning_scope_after_walk_moves_on() {
        let interner = StringInterner::new();
        // Outer holds its nested Inner by value; a trailing sibling keeps
        // the collection walk moving after Outer's sub-walk finishes.
        let inner = struct_item(
            &interner,
            "Inner",
            vec![("x", named(&interner, "i32"))],
            Span::DUMMY,
        );
        let mut outer = struct_item(
            &interner,
            "Outer",
            vec![("inner", named(&interner, "Inner"))],
            Span::DUMMY,
        );
        if let ItemKind::Udt(decl) = &mut outer.kind {
            decl.items = vec![inner];
        }
        let items = vec![outer, struct_item(&interner, "After", Vec::new(), Span::DUMMY)];
        let (state, queue, _) = analyze(&interner, &items);
        assert!(!queue.has_errors());

        let outer_ty =
            state.registry.get(&Ident::parse("Outer", &interner)).expect("registered");
        assert!(state.pool.is_complete(outer_ty));
        let udt = state.pool.as_structure(outer_ty).expect("structure");
        assert!(state.pool.as_structure(state.pool.udt(udt).fields[0].ty).is_some());
    }

    #[test]
    fn test_alias_backing_substituted() {
        let interner = StringInterner::new();
        let items = vec![
            alias_item(&interner, "Id", named(&interner, "Raw")),
            alias_item(&interner, "Raw", named(&interner, "u64")),
        ];
        let (state, queue, _) = analyze(&interner, &items);
        assert!(!queue.has_errors());
        let id = state.registry.get(&Ident::parse("Id", &interner)).expect("registered");
        assert_eq!(state.pool.resolve_alias(id), TypeId::U64);
    }
}

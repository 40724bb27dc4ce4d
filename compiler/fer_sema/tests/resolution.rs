//! End-to-end collection + resolution over hand-built parse trees.

use fer_diagnostic::{DiagnosticQueue, QueueConfig};
use fer_ir::{
    FieldDecl, Ident, Item, ItemKind, Span, StorageFlags, StringInterner, StructDecl,
    TypeAliasDecl, TypeExpr, TypeExprKind, UdtKind,
};
use fer_sema::{collect, AnalysisState, Resolver};
use fer_types::{BackendType, TargetMachine, TypeError, TypeId, TypePool};
use pretty_assertions::assert_eq;

struct CountingTarget {
    calls: usize,
}

impl TargetMachine for CountingTarget {
    fn materialize_type(&mut self, pool: &TypePool, id: TypeId) -> Result<BackendType, TypeError> {
        assert!(pool.is_complete(id), "materialized an incomplete type");
        self.calls += 1;
        Ok(BackendType(self.calls as u32))
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

fn struct_item(interner: &StringInterner, name: &str, fields: Vec<(&str, TypeExpr)>) -> Item {
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
                    span: Span::DUMMY,
                })
                .collect(),
            items: Vec::new(),
        }),
        Span::DUMMY,
    )
}

fn alias_item(interner: &StringInterner, name: &str, backing: &str) -> Item {
    Item::new(
        ItemKind::TypeAlias(TypeAliasDecl {
            name: interner.intern(name),
            backing: named(interner, backing),
        }),
        Span::DUMMY,
    )
}

fn analyze(interner: &StringInterner, items: &[Item]) -> (AnalysisState, DiagnosticQueue, usize) {
    let mut state = AnalysisState::new();
    let mut queue = DiagnosticQueue::with_config(QueueConfig::unlimited());
    collect(items, interner, &mut state, &mut queue);
    let mut target = CountingTarget { calls: 0 };
    let materialized = Resolver::new(interner, &mut state, &mut queue).run(&mut target);
    (state, queue, materialized)
}

#[test]
fn mutually_referencing_pointer_structs_complete_in_either_order() {
    for flipped in [false, true] {
        let interner = StringInterner::new();
        let mut items = vec![
            struct_item(&interner, "A", vec![("b", pointer_to(&interner, "B"))]),
            struct_item(&interner, "B", vec![("a", pointer_to(&interner, "A"))]),
        ];
        if flipped {
            items.reverse();
        }
        let (state, queue, materialized) = analyze(&interner, &items);
        assert!(!queue.has_errors(), "flipped={flipped}");

        let a = state.registry.get(&Ident::parse("A", &interner)).expect("A registered");
        let b = state.registry.get(&Ident::parse("B", &interner)).expect("B registered");
        assert!(state.pool.is_complete(a));
        assert!(state.pool.is_complete(b));
        assert_eq!(materialized, 2);
    }
}

#[test]
fn alias_chain_resolves_to_builtin_in_any_declaration_order() {
    let orders: [[&str; 3]; 3] = [
        ["C", "B", "A"],
        ["A", "B", "C"],
        ["B", "C", "A"],
    ];
    for order in orders {
        let interner = StringInterner::new();
        let items: Vec<Item> = order
            .iter()
            .map(|name| match *name {
                "A" => alias_item(&interner, "A", "i32"),
                "B" => alias_item(&interner, "B", "A"),
                _ => alias_item(&interner, "C", "B"),
            })
            .collect();
        let (state, queue, _) = analyze(&interner, &items);
        assert!(!queue.has_errors(), "order={order:?}");

        let c = state.registry.get(&Ident::parse("C", &interner)).expect("C registered");
        assert_eq!(state.pool.resolve_alias(c), TypeId::I32, "order={order:?}");
    }
}

#[test]
fn nested_scope_resolution_walks_outward() {
    let interner = StringInterner::new();
    // Holder lives inside Outer and refers to a nested sibling by its
    // simple name, plus a global type only reachable via the outer chain.
    let global = struct_item(&interner, "Clock", vec![("ticks", named(&interner, "u64"))]);
    let inner_item = struct_item(&interner, "Entry", vec![("n", named(&interner, "i64"))]);
    let holder = struct_item(
        &interner,
        "Holder",
        vec![
            ("entry", named(&interner, "Entry")),
            ("clock", named(&interner, "Clock")),
        ],
    );
    let outer = Item::new(
        ItemKind::Udt(StructDecl {
            name: interner.intern("Outer"),
            kind: UdtKind::Class,
            fields: Vec::new(),
            items: vec![inner_item, holder],
        }),
        Span::DUMMY,
    );
    let (state, queue, _) = analyze(&interner, &[global, outer]);
    assert!(!queue.has_errors());

    let holder_ty = state
        .registry
        .get(&Ident::parse("Outer.Holder", &interner))
        .expect("Holder registered");
    let udt = state.pool.as_structure(holder_ty).expect("structure");
    let entry_ty = state
        .registry
        .get(&Ident::parse("Outer.Entry", &interner))
        .expect("Outer.Entry registered");
    let clock_ty = state.registry.get(&Ident::parse("Clock", &interner)).expect("Clock registered");
    assert_eq!(state.pool.udt(udt).fields[0].ty, entry_ty);
    assert_eq!(state.pool.udt(udt).fields[1].ty, clock_ty);
}

#[test]
fn deep_by_value_chain_orders_leaves_first() {
    let interner = StringInterner::new();
    // D -> C -> B -> A declared parent-first.
    let items = vec![
        struct_item(&interner, "D", vec![("c", named(&interner, "C"))]),
        struct_item(&interner, "C", vec![("b", named(&interner, "B"))]),
        struct_item(&interner, "B", vec![("a", named(&interner, "A"))]),
        struct_item(&interner, "A", vec![("x", named(&interner, "u8"))]),
    ];
    let (state, queue, materialized) = analyze(&interner, &items);
    assert!(!queue.has_errors());
    assert_eq!(materialized, 4);

    let order: Vec<String> = state
        .registry
        .iter()
        .map(|(name, _)| name.display(&interner))
        .collect();
    let pos = |n: &str| order.iter().position(|o| o == n).expect("present");
    assert!(pos("A") < pos("B"));
    assert!(pos("B") < pos("C"));
    assert!(pos("C") < pos("D"));
}

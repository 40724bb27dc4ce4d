//! Statement and expression lowering.
//!
//! Each function body is lowered independently into a fresh
//! [`FunctionIrContext`]. Bindings follow two storage classes: a mutable
//! `let` always gets a stack slot, an immutable one rides as a direct SSA
//! value until something takes its address, at which point it is spilled
//! into a lazily created slot. Loops lower to the trampoline/body/end block
//! shape; the trampoline re-evaluates the condition on every iteration.

use fer_diagnostic::{missing_return, Diagnostic, DiagnosticQueue, ErrorCode};
use fer_ir::{
    BinaryOp, Expr, ExprKind, Literal, Name, Span, Stmt, StmtKind, StringInterner, UnaryOp,
};
use fer_sema::{lower_type_expr, AnalysisState};
use fer_types::{FuncDecl, ScopeId, TypeId, TypeKind};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::context::{FunctionIr, FunctionIrContext};
use crate::inst::{Inst, IntPredicate, RealPredicate, ValueId};

/// A lowered expression: the value and its front-end type.
#[derive(Copy, Clone, Debug)]
struct TypedValue {
    value: ValueId,
    ty: TypeId,
}

/// Copy of a binding's state at lookup time.
#[derive(Copy, Clone)]
struct BindingInfo {
    depth: usize,
    mutable: bool,
    ty: TypeId,
    slot: Option<ValueId>,
    value: Option<ValueId>,
}

/// One `let` binding or parameter visible in the current scope.
struct Binding {
    mutable: bool,
    ty: TypeId,
    /// Stack slot address; always present for mutables, lazily created for
    /// immutables when their address is taken.
    slot: Option<ValueId>,
    /// Current SSA value; updated on every assignment.
    value: Option<ValueId>,
}

/// Lower one function body into block-structured IR.
///
/// Recoverable problems are reported and lowering continues with the
/// remaining statements where feasible.
pub fn lower_function(
    decl: &FuncDecl,
    symbol: &str,
    interner: &StringInterner,
    state: &mut AnalysisState,
    queue: &mut DiagnosticQueue,
) -> FunctionIr {
    let ret = match state.pool.kind(decl.signature) {
        TypeKind::Function { ret, .. } => *ret,
        _ => TypeId::VOID,
    };
    let mut lowering = FunctionLowering {
        interner,
        state,
        queue,
        ctx: FunctionIrContext::new(symbol),
        scopes: vec![FxHashMap::default()],
        pending_label: None,
        func_scope: decl.scope,
        ret,
    };
    debug!(symbol, "lowering function body");

    for (index, &(name, ty)) in decl.params.iter().enumerate() {
        let value = lowering.ctx.append(Inst::Param {
            index: u32::try_from(index).unwrap_or_else(|_| unreachable!()),
            ty,
        });
        lowering.bind(name, Binding {
            mutable: false,
            ty,
            slot: None,
            value: Some(value),
        });
    }

    let body: &[Stmt] = decl.body.as_deref().unwrap_or(&[]);
    for stmt in body {
        lowering.lower_stmt(stmt);
        // Anything after an explicit return is unreachable.
        if stmt.terminates_scope() {
            break;
        }
    }
    lowering.finish_body(decl, body);

    lowering.ctx.finish()
}

struct FunctionLowering<'a> {
    interner: &'a StringInterner,
    state: &'a mut AnalysisState,
    queue: &'a mut DiagnosticQueue,
    ctx: FunctionIrContext,
    scopes: Vec<FxHashMap<Name, Binding>>,
    /// A `Label` statement naming the next loop.
    pending_label: Option<Name>,
    /// The scope the declaration appeared in; type names in the body
    /// resolve outward from here.
    func_scope: ScopeId,
    ret: TypeId,
}

impl FunctionLowering<'_> {
    /// After the body walk: synthesize the implicit void return, or report
    /// a missing one.
    fn finish_body(&mut self, decl: &FuncDecl, body: &[Stmt]) {
        if self.ctx.is_terminated(self.ctx.current()) {
            return;
        }
        if self.is_void(self.ret) {
            self.ctx.append(Inst::RetVoid);
            return;
        }
        let anchor = body.last().map_or(decl.span, |stmt| stmt.span);
        let func = decl.name.display(self.interner);
        let ret = self.state.pool.display(self.ret, self.interner);
        self.queue.report(missing_return(anchor, &func, &ret));
    }

    fn lower_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Let { name, ty, init, mutable } => {
                self.lower_let(*name, ty.as_ref(), init.as_ref(), *mutable, stmt.span);
            }
            StmtKind::Return(expr) => self.lower_return(expr.as_ref()),
            StmtKind::Expr(expr) => {
                // A discarded assignment yields nothing; no reload emitted.
                if let ExprKind::Binary { op: BinaryOp::Assign, lhs, rhs } = &expr.kind {
                    let _ = self.lower_assign(lhs, rhs, expr.span, true);
                } else {
                    let _ = self.lower_expr(expr);
                }
            }
            StmtKind::Label(name) => {
                self.pending_label = Some(*name);
            }
        }
    }

    fn lower_let(
        &mut self,
        name: Name,
        ty: Option<&fer_ir::TypeExpr>,
        init: Option<&Expr>,
        mutable: bool,
        span: Span,
    ) {
        let init_value = init.and_then(|e| self.lower_expr(e));
        let declared = ty.map(|t| {
            let lowered = lower_type_expr(&mut self.state.pool, self.interner, t);
            self.resolve_ty(lowered)
        });
        let Some(binding_ty) = declared.or(init_value.map(|tv| tv.ty)) else {
            // Parser contract: a let carries a type, an initializer, or both.
            self.queue.report(
                Diagnostic::error(ErrorCode::E9000)
                    .with_message(format!(
                        "binding `{}` has neither a type nor an initializer",
                        self.interner.lookup(name)
                    ))
                    .with_label(span, "cannot infer a type here"),
            );
            return;
        };

        let binding = if mutable {
            // Mutables always live in a stack slot.
            let slot = self.ctx.append(Inst::Alloca { ty: binding_ty });
            if let Some(tv) = init_value {
                self.ctx.append(Inst::Store { ptr: slot, value: tv.value });
            }
            Binding {
                mutable: true,
                ty: binding_ty,
                slot: Some(slot),
                value: init_value.map(|tv| tv.value),
            }
        } else {
            Binding {
                mutable: false,
                ty: binding_ty,
                slot: None,
                value: init_value.map(|tv| tv.value),
            }
        };
        self.bind(name, binding);
    }

    fn lower_return(&mut self, expr: Option<&Expr>) {
        match expr {
            None => {
                self.ctx.append(Inst::RetVoid);
            }
            Some(e) => match self.lower_expr(e) {
                Some(tv) if !self.is_void(tv.ty) => {
                    self.ctx.append(Inst::Ret { value: tv.value });
                }
                // Void-typed and non-materializable expressions return bare.
                _ => {
                    self.ctx.append(Inst::RetVoid);
                }
            },
        }
    }

    fn lower_expr(&mut self, expr: &Expr) -> Option<TypedValue> {
        match &expr.kind {
            ExprKind::Literal(lit) => Some(self.lower_literal(lit)),
            ExprKind::Name(ident) => self.lower_name(ident, expr.span),
            ExprKind::Binary { op: BinaryOp::Assign, lhs, rhs } => {
                self.lower_assign(lhs, rhs, expr.span, false)
            }
            ExprKind::Binary { op, lhs, rhs } => self.lower_binary(*op, lhs, rhs, expr.span),
            ExprKind::Unary { op, operand } => self.lower_unary(*op, operand, expr.span),
            ExprKind::Cast { value, ty } => {
                let tv = self.lower_expr(value)?;
                let lowered = lower_type_expr(&mut self.state.pool, self.interner, ty);
                let to = self.resolve_ty(lowered);
                let value = self.ctx.append(Inst::Cast { value: tv.value, to });
                Some(TypedValue { value, ty: to })
            }
            ExprKind::Alloc { ty } => {
                let lowered = lower_type_expr(&mut self.state.pool, self.interner, ty);
                let elem = self.resolve_ty(lowered);
                let value = self.ctx.append(Inst::Alloca { ty: elem });
                let ty = self.state.pool.pointer(elem).unwrap_or(elem);
                Some(TypedValue { value, ty })
            }
            ExprKind::AddrOf(inner) => self.lower_addr_of(inner, expr.span),
            ExprKind::While { label, cond, body, do_while } => {
                self.lower_while(*label, cond, body, *do_while);
                None
            }
        }
    }

    fn lower_literal(&mut self, lit: &Literal) -> TypedValue {
        match lit {
            Literal::Bool(b) => TypedValue {
                value: self.ctx.append(Inst::ConstBool { value: *b }),
                ty: TypeId::BOOL,
            },
            Literal::Int(v) => TypedValue {
                value: self.ctx.append(Inst::ConstInt {
                    ty: TypeId::I32,
                    value: i128::from(*v),
                }),
                ty: TypeId::I32,
            },
            Literal::BigInt(v) => TypedValue {
                value: self.ctx.append(Inst::ConstInt { ty: TypeId::I64, value: *v }),
                ty: TypeId::I64,
            },
            Literal::Real(v) => TypedValue {
                value: self.ctx.append(Inst::ConstReal { ty: TypeId::F64, value: *v }),
                ty: TypeId::F64,
            },
            Literal::Null => {
                let ty = self.state.pool.pointer(TypeId::VOID).unwrap_or(TypeId::VOID);
                TypedValue {
                    value: self.ctx.append(Inst::ConstNull { ty }),
                    ty,
                }
            }
        }
    }

    fn lower_name(&mut self, ident: &fer_ir::Ident, span: Span) -> Option<TypedValue> {
        let Some(name) = (!ident.is_qualified()).then(|| ident.last()).flatten() else {
            self.unknown_binding(&ident.display(self.interner), span);
            return None;
        };
        let Some(info) = self.find_binding(name) else {
            self.unknown_binding(self.interner.lookup(name), span);
            return None;
        };
        if let Some(slot) = info.slot {
            // Slot-backed bindings reload on every read.
            let value = self.ctx.append(Inst::Load { ptr: slot });
            return Some(TypedValue { value, ty: info.ty });
        }
        if let Some(value) = info.value {
            return Some(TypedValue { value, ty: info.ty });
        }
        self.queue.report(
            Diagnostic::error(ErrorCode::E4004)
                .with_message(format!(
                    "binding `{}` is used before it has a value",
                    self.interner.lookup(name)
                ))
                .with_label(span, "no value assigned yet"),
        );
        None
    }

    fn lower_assign(
        &mut self,
        lhs: &Expr,
        rhs: &Expr,
        span: Span,
        discarded: bool,
    ) -> Option<TypedValue> {
        let name = match &lhs.kind {
            ExprKind::Name(ident) if !ident.is_qualified() => ident.last(),
            _ => None,
        };
        let Some(name) = name else {
            self.queue.report(
                Diagnostic::error(ErrorCode::E4001)
                    .with_message("invalid assignment target")
                    .with_label(lhs.span, "only a mutable binding's name can be assigned"),
            );
            return None;
        };

        let rhs_tv = self.lower_expr(rhs)?;
        let Some(info) = self.find_binding(name) else {
            self.unknown_binding(self.interner.lookup(name), span);
            return None;
        };
        if !info.mutable {
            self.queue.report(
                Diagnostic::error(ErrorCode::E4002)
                    .with_message(format!(
                        "cannot assign to immutable binding `{}`",
                        self.interner.lookup(name)
                    ))
                    .with_label(span, "this binding is not mutable")
                    .with_suggestion("declare it with `let mut` to allow reassignment"),
            );
            return None;
        }
        let Some(slot) = info.slot else {
            // Mutable bindings always carry a slot; see lower_let.
            return None;
        };

        self.ctx.append(Inst::Store { ptr: slot, value: rhs_tv.value });
        if let Some(b) = self.scopes[info.depth].get_mut(&name) {
            b.value = Some(rhs_tv.value);
        }
        if discarded {
            return None;
        }
        let reload = self.ctx.append(Inst::Load { ptr: slot });
        Some(TypedValue { value: reload, ty: info.ty })
    }

    fn lower_binary(
        &mut self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        span: Span,
    ) -> Option<TypedValue> {
        let lhs_tv = self.lower_expr(lhs)?;
        let rhs_tv = self.lower_expr(rhs)?;

        // Dispatch on the left operand's builtin kind.
        let resolved = self.state.pool.resolve_alias(lhs_tv.ty);
        let TypeKind::Builtin(builtin) = *self.state.pool.kind(resolved) else {
            self.unsupported_operator(op, lhs_tv.ty, span);
            return None;
        };

        let l = lhs_tv.value;
        let r = rhs_tv.value;
        if op.is_comparison() {
            let inst = if builtin.is_float() {
                Inst::FCmp { pred: real_predicate(op), lhs: l, rhs: r }
            } else {
                Inst::ICmp {
                    pred: int_predicate(op, builtin.is_signed_int()),
                    lhs: l,
                    rhs: r,
                }
            };
            let value = self.ctx.append(inst);
            return Some(TypedValue { value, ty: TypeId::BOOL });
        }

        let inst = if builtin.is_float() {
            match op {
                BinaryOp::Add => Inst::FAdd { lhs: l, rhs: r },
                BinaryOp::Sub => Inst::FSub { lhs: l, rhs: r },
                BinaryOp::Mul => Inst::FMul { lhs: l, rhs: r },
                BinaryOp::Div => Inst::FDiv { lhs: l, rhs: r },
                BinaryOp::Rem => Inst::FRem { lhs: l, rhs: r },
                _ => {
                    self.unsupported_operator(op, lhs_tv.ty, span);
                    return None;
                }
            }
        } else {
            let unsigned = builtin.is_unsigned_int();
            match op {
                BinaryOp::Add => Inst::Add { lhs: l, rhs: r },
                BinaryOp::Sub => Inst::Sub { lhs: l, rhs: r },
                BinaryOp::Mul => Inst::Mul { lhs: l, rhs: r },
                BinaryOp::Div if unsigned => Inst::UDiv { lhs: l, rhs: r },
                BinaryOp::Div => Inst::SDiv { lhs: l, rhs: r },
                BinaryOp::Rem if unsigned => Inst::URem { lhs: l, rhs: r },
                BinaryOp::Rem => Inst::SRem { lhs: l, rhs: r },
                // Bitwise operations ignore signedness.
                BinaryOp::BitAnd => Inst::And { lhs: l, rhs: r },
                BinaryOp::BitOr => Inst::Or { lhs: l, rhs: r },
                BinaryOp::BitXor => Inst::Xor { lhs: l, rhs: r },
                BinaryOp::Shl => Inst::Shl { lhs: l, rhs: r },
                BinaryOp::Shr if unsigned => Inst::LShr { lhs: l, rhs: r },
                BinaryOp::Shr => Inst::AShr { lhs: l, rhs: r },
                BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge
                | BinaryOp::Assign => unreachable!("handled above"),
            }
        };
        let value = self.ctx.append(inst);
        Some(TypedValue { value, ty: lhs_tv.ty })
    }

    fn lower_unary(&mut self, op: UnaryOp, operand: &Expr, span: Span) -> Option<TypedValue> {
        let tv = self.lower_expr(operand)?;
        let resolved = self.state.pool.resolve_alias(tv.ty);
        let TypeKind::Builtin(builtin) = *self.state.pool.kind(resolved) else {
            self.queue.report(
                Diagnostic::error(ErrorCode::E4003)
                    .with_message(format!(
                        "unary operator not supported for `{}`",
                        self.state.pool.display(tv.ty, self.interner)
                    ))
                    .with_label(span, "operand has a non-scalar type"),
            );
            return None;
        };
        let inst = match op {
            UnaryOp::Neg if builtin.is_float() => Inst::FNeg { value: tv.value },
            UnaryOp::Neg => Inst::Neg { value: tv.value },
            UnaryOp::Not => Inst::Not { value: tv.value },
        };
        let value = self.ctx.append(inst);
        Some(TypedValue { value, ty: tv.ty })
    }

    /// Address-of: hand out a binding's slot, creating it on first request.
    fn lower_addr_of(&mut self, inner: &Expr, span: Span) -> Option<TypedValue> {
        if let ExprKind::Name(ident) = &inner.kind {
            if !ident.is_qualified() {
                if let Some(name) = ident.last() {
                    return self.addr_of_binding(name, span);
                }
            }
        }
        // Taking the address of a temporary spills it into a fresh slot.
        let tv = self.lower_expr(inner)?;
        let slot = self.ctx.append(Inst::Alloca { ty: tv.ty });
        self.ctx.append(Inst::Store { ptr: slot, value: tv.value });
        let ty = self.state.pool.pointer(tv.ty).unwrap_or(tv.ty);
        Some(TypedValue { value: slot, ty })
    }

    fn addr_of_binding(&mut self, name: Name, span: Span) -> Option<TypedValue> {
        let Some(info) = self.find_binding(name) else {
            self.unknown_binding(self.interner.lookup(name), span);
            return None;
        };
        let slot = match info.slot {
            Some(slot) => slot,
            None => {
                // First address-of on an immutable binding: promote it to
                // slot-backed storage and spill the current value.
                let slot = self.ctx.append(Inst::Alloca { ty: info.ty });
                if let Some(value) = info.value {
                    self.ctx.append(Inst::Store { ptr: slot, value });
                }
                if let Some(b) = self.scopes[info.depth].get_mut(&name) {
                    b.slot = Some(slot);
                }
                slot
            }
        };
        let ptr_ty = self.state.pool.pointer(info.ty).unwrap_or(info.ty);
        Some(TypedValue { value: slot, ty: ptr_ty })
    }

    /// Trampoline/body/end loop shape. `do_while` enters the body directly
    /// on first iteration; otherwise control goes through the trampoline.
    fn lower_while(&mut self, label: Option<Name>, cond: &Expr, body: &[Stmt], do_while: bool) {
        let base = label
            .or(self.pending_label.take())
            .map(|n| self.interner.lookup(n).to_owned())
            .unwrap_or_else(|| self.ctx.next_label("loop"));
        let trampoline = self.ctx.block(&base);
        let body_block = self.ctx.block(&format!("{base}.body"));
        let end = self.ctx.block(&format!("{base}.end"));

        let first = if do_while { body_block } else { trampoline };
        self.ctx.append(Inst::Br { dest: first });

        // Condition is evaluated in the trampoline on every pass.
        self.ctx.push_block(trampoline);
        match self.lower_expr(cond) {
            Some(tv) => {
                self.ctx.append(Inst::CondBr {
                    cond: tv.value,
                    then_dest: body_block,
                    else_dest: end,
                });
            }
            None => {
                // Condition failed to lower; fall out of the loop so the
                // rest of the function can still be checked.
                self.ctx.append(Inst::Br { dest: end });
            }
        }
        self.ctx.pop_block();

        self.ctx.push_block(body_block);
        self.scopes.push(FxHashMap::default());
        for stmt in body {
            self.lower_stmt(stmt);
            if stmt.terminates_scope() {
                break;
            }
        }
        self.scopes.pop();
        // The body may have moved the insertion point (nested loops); the
        // back edge leaves from wherever it ended.
        if !self.ctx.is_terminated(self.ctx.current()) {
            self.ctx.append(Inst::Br { dest: trampoline });
        }
        self.ctx.pop_block();

        self.ctx.set_current(end);
    }

    // === Helpers ===

    fn bind(&mut self, name: Name, binding: Binding) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, binding);
        }
    }

    /// Innermost-first binding lookup, copied out so the caller can keep
    /// emitting while it holds the result.
    fn find_binding(&self, name: Name) -> Option<BindingInfo> {
        for (depth, scope) in self.scopes.iter().enumerate().rev() {
            if let Some(binding) = scope.get(&name) {
                return Some(BindingInfo {
                    depth,
                    mutable: binding.mutable,
                    ty: binding.ty,
                    slot: binding.slot,
                    value: binding.value,
                });
            }
        }
        None
    }

    /// Resolve an `Incomplete` type named in a body against the function's
    /// enclosing scope chain.
    fn resolve_ty(&mut self, ty: TypeId) -> TypeId {
        let TypeKind::Incomplete(name) = self.state.pool.kind(ty).clone() else {
            return ty;
        };
        self.state
            .scopes
            .chain(self.func_scope)
            .find_map(|s| {
                let candidate = self.state.scopes.qualify(s, name.clone());
                self.state.registry.get(&candidate)
            })
            .unwrap_or(ty)
    }

    fn is_void(&self, ty: TypeId) -> bool {
        self.state.pool.resolve_alias(ty) == TypeId::VOID
    }

    fn unknown_binding(&mut self, name: &str, span: Span) {
        self.queue.report(
            Diagnostic::error(ErrorCode::E4004)
                .with_message(format!("unknown binding `{name}`"))
                .with_label(span, "not declared in this function"),
        );
    }

    fn unsupported_operator(&mut self, op: BinaryOp, ty: TypeId, span: Span) {
        self.queue.report(
            Diagnostic::error(ErrorCode::E4003)
                .with_message(format!(
                    "operator `{}` is not supported for `{}`",
                    op.symbol(),
                    self.state.pool.display(ty, self.interner)
                ))
                .with_label(span, "unsupported operand type"),
        );
    }
}

fn int_predicate(op: BinaryOp, signed: bool) -> IntPredicate {
    match op {
        BinaryOp::Eq => IntPredicate::Eq,
        BinaryOp::Ne => IntPredicate::Ne,
        BinaryOp::Lt if signed => IntPredicate::Slt,
        BinaryOp::Lt => IntPredicate::Ult,
        BinaryOp::Le if signed => IntPredicate::Sle,
        BinaryOp::Le => IntPredicate::Ule,
        BinaryOp::Gt if signed => IntPredicate::Sgt,
        BinaryOp::Gt => IntPredicate::Ugt,
        BinaryOp::Ge if signed => IntPredicate::Sge,
        BinaryOp::Ge => IntPredicate::Uge,
        _ => unreachable!("not a comparison operator"),
    }
}

fn real_predicate(op: BinaryOp) -> RealPredicate {
    match op {
        BinaryOp::Eq => RealPredicate::Oeq,
        BinaryOp::Ne => RealPredicate::One,
        BinaryOp::Lt => RealPredicate::Olt,
        BinaryOp::Le => RealPredicate::Ole,
        BinaryOp::Gt => RealPredicate::Ogt,
        BinaryOp::Ge => RealPredicate::Oge,
        _ => unreachable!("not a comparison operator"),
    }
}

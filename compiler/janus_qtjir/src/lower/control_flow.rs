//! Structured control flow: if/else, loops, postfix guards, short-circuit
//! logic and match.
//!
//! Every construct ends by starting a fresh merge or exit label, so the
//! caller always continues in an open block.

use janus_diagnostic::ErrorCode;
use janus_ir::{NodeId, NodeKind};

use super::expr::Lowered;
use super::func::FnLowerer;
use super::scope::LoopTargets;
use super::types::ValueType;
use crate::ir::{IrData, LabelId, OpCode};
use crate::LowerError;

/// Integer-literal arms that lower to one `Switch`.
struct SwitchPlan {
    cases: Vec<(i64, NodeId)>,
    default: Option<NodeId>,
}

impl FnLowerer<'_, '_> {
    /// `if`/`else`. In value position the arm values meet in a phi.
    pub(super) fn lower_if(
        &mut self,
        stmt: NodeId,
        want_value: bool,
    ) -> Result<Option<Lowered>, LowerError> {
        let syntax = self.syntax;
        let cond = self.lower_expr(syntax.child(stmt, 0)?)?;
        let then_block = syntax.child(stmt, 1)?;
        let else_branch = syntax.optional_child(stmt, 2)?;
        let want_value = want_value && else_branch.is_some();

        let then_label = self.builder.new_label();
        let merge = self.builder.new_label();
        let else_label = match else_branch {
            Some(_) => self.builder.new_label(),
            None => merge,
        };
        self.builder.branch(cond.value, then_label, else_label);

        let mut incoming = Vec::new();
        self.builder.start_label(then_label);
        self.lower_arm(then_block, want_value, merge, &mut incoming)?;
        if let Some(else_branch) = else_branch {
            self.builder.start_label(else_label);
            self.lower_arm(else_branch, want_value, merge, &mut incoming)?;
        }
        self.builder.start_label(merge);
        Ok(self.merge_values(incoming))
    }

    /// Lower one arm and jump to `merge`, recording its value when wanted.
    fn lower_arm(
        &mut self,
        body: NodeId,
        want_value: bool,
        merge: LabelId,
        incoming: &mut Vec<(Lowered, LabelId)>,
    ) -> Result<(), LowerError> {
        if want_value {
            let value = self.lower_value_of(body)?;
            if !self.builder.is_terminated() {
                let Some(value) = value else {
                    return Err(self.syntax.semantic(
                        ErrorCode::E4007,
                        body,
                        "branch used as a value does not produce one",
                    ));
                };
                incoming.push((value, self.builder.current_label()));
            }
        } else {
            self.lower_stmt(body)?;
        }
        self.builder.jump(merge);
        Ok(())
    }

    /// Merge arm values at the current label.
    fn merge_values(&mut self, incoming: Vec<(Lowered, LabelId)>) -> Option<Lowered> {
        match incoming.len() {
            0 => None,
            1 => incoming.into_iter().next().map(|(value, _)| value),
            _ => {
                let ty = incoming
                    .iter()
                    .map(|(value, _)| &value.ty)
                    .find(|ty| !ty.is_unknown())
                    .cloned()
                    .unwrap_or(ValueType::Unknown);
                let pairs: Vec<_> = incoming
                    .iter()
                    .map(|(value, label)| (value.value, *label))
                    .collect();
                Some(Lowered::new(self.builder.phi(&pairs), ty))
            }
        }
    }

    pub(super) fn lower_while(&mut self, stmt: NodeId) -> Result<(), LowerError> {
        let header = self.builder.new_label();
        let body = self.builder.new_label();
        let exit = self.builder.new_label();

        self.builder.start_label(header);
        let cond = self.lower_expr(self.syntax.child(stmt, 0)?)?;
        self.builder.branch(cond.value, body, exit);

        self.builder.start_label(body);
        self.loops.push(LoopTargets {
            continue_to: header,
            break_to: exit,
        });
        let result = self.lower_block(self.syntax.child(stmt, 1)?);
        self.loops.pop();
        result?;
        self.builder.jump(header);

        self.builder.start_label(exit);
        Ok(())
    }

    /// Counted loop over an inclusive or exclusive integer range.
    ///
    /// The induction variable is a header phi; its back-edge input is added
    /// once the latch increment exists.
    pub(super) fn lower_for(&mut self, stmt: NodeId) -> Result<(), LowerError> {
        let syntax = self.syntax;
        let var = syntax.name(syntax.child(stmt, 0)?)?;
        let range = syntax.child(stmt, 1)?;
        let compare = match syntax.kind(range)? {
            NodeKind::RangeExpr => OpCode::LessEqual,
            NodeKind::RangeExclusiveExpr => OpCode::Less,
            kind => {
                return Err(syntax.semantic(
                    ErrorCode::E4007,
                    range,
                    format!("`for` loops iterate over ranges, not {kind:?}"),
                ))
            }
        };
        let start = self.lower_expr(syntax.child(range, 0)?)?;
        let end = self.lower_expr(syntax.child(range, 1)?)?;

        let header = self.builder.new_label();
        let body = self.builder.new_label();
        let latch = self.builder.new_label();
        let exit = self.builder.new_label();

        let entry = self.builder.current_label();
        self.builder.start_label(header);
        let induction = self.builder.phi(&[(start.value, entry)]);
        let in_range = self
            .builder
            .emit(compare, &[induction, end.value], IrData::None);
        self.builder.branch(in_range, body, exit);

        self.builder.start_label(body);
        let saved = self.scope.clone();
        self.scope.bind(var, induction, ValueType::Int);
        self.loops.push(LoopTargets {
            continue_to: latch,
            break_to: exit,
        });
        let result = self.lower_block(syntax.child(stmt, 2)?);
        self.loops.pop();
        self.scope = saved;
        result?;

        self.builder.start_label(latch);
        let one = self.builder.const_int(1);
        let next = self.builder.emit(OpCode::Add, &[induction, one], IrData::None);
        self.builder.add_phi_incoming(induction, next, latch);
        self.builder.jump(header);

        self.builder.start_label(exit);
        Ok(())
    }

    pub(super) fn lower_break(&mut self, stmt: NodeId) -> Result<(), LowerError> {
        let Some(targets) = self.loops.last() else {
            return Err(self
                .syntax
                .semantic(ErrorCode::E4008, stmt, "`break` outside of a loop"));
        };
        let target = targets.break_to;
        self.builder.jump(target);
        Ok(())
    }

    pub(super) fn lower_continue(&mut self, stmt: NodeId) -> Result<(), LowerError> {
        let Some(targets) = self.loops.last() else {
            return Err(self
                .syntax
                .semantic(ErrorCode::E4008, stmt, "`continue` outside of a loop"));
        };
        let target = targets.continue_to;
        self.builder.jump(target);
        Ok(())
    }

    /// `stmt when cond` runs `stmt` if `cond` holds; `unless` negates.
    pub(super) fn lower_postfix(&mut self, stmt: NodeId, when: bool) -> Result<(), LowerError> {
        let cond = self.lower_expr(self.syntax.child(stmt, 1)?)?;
        let guarded = self.builder.new_label();
        let skip = self.builder.new_label();
        if when {
            self.builder.branch(cond.value, guarded, skip);
        } else {
            self.builder.branch(cond.value, skip, guarded);
        }
        self.builder.start_label(guarded);
        self.lower_stmt(self.syntax.child(stmt, 0)?)?;
        self.builder.jump(skip);
        self.builder.start_label(skip);
        Ok(())
    }

    /// `and`/`or`. The short-circuit result is materialized before the
    /// branch, so the right operand only runs on its own path.
    pub(super) fn lower_short_circuit(
        &mut self,
        lhs: NodeId,
        rhs: NodeId,
        is_and: bool,
    ) -> Result<Lowered, LowerError> {
        let lhs = self.lower_expr(lhs)?;
        let short = self.builder.const_bool(!is_and);
        let from = self.builder.current_label();

        let rhs_label = self.builder.new_label();
        let merge = self.builder.new_label();
        if is_and {
            self.builder.branch(lhs.value, rhs_label, merge);
        } else {
            self.builder.branch(lhs.value, merge, rhs_label);
        }

        self.builder.start_label(rhs_label);
        let rhs = self.lower_expr(rhs)?;
        let rhs_end = self.builder.current_label();
        self.builder.jump(merge);

        self.builder.start_label(merge);
        let value = self.builder.phi(&[(short, from), (rhs.value, rhs_end)]);
        Ok(Lowered::new(value, ValueType::Bool))
    }

    pub(super) fn lower_match(
        &mut self,
        stmt: NodeId,
        want_value: bool,
    ) -> Result<Option<Lowered>, LowerError> {
        let syntax = self.syntax;
        let scrutinee = self.lower_expr(syntax.child(stmt, 0)?)?;
        let arms = syntax.children_from(stmt, 1)?;
        if arms.is_empty() {
            if want_value {
                return Err(syntax.semantic(
                    ErrorCode::E4007,
                    stmt,
                    "`match` used as a value has no arms",
                ));
            }
            return Ok(None);
        }

        if self.session.options.switch_lowering {
            if let Some(plan) = self.switch_plan(arms)? {
                return self.lower_switch(&scrutinee, plan, want_value);
            }
        }
        self.lower_match_chain(&scrutinee, arms, want_value)
    }

    /// Arms qualify for a switch when every pattern is an integer literal
    /// without a guard, optionally followed by a final wildcard.
    fn switch_plan(&self, arms: &[NodeId]) -> Result<Option<SwitchPlan>, LowerError> {
        let syntax = self.syntax;
        let mut plan = SwitchPlan {
            cases: Vec::new(),
            default: None,
        };
        for (index, &arm) in arms.iter().enumerate() {
            syntax.expect(arm, NodeKind::MatchArm)?;
            if syntax.optional_child(arm, 1)?.is_some() {
                return Ok(None);
            }
            let pattern = syntax.child(arm, 0)?;
            match syntax.kind(pattern)? {
                NodeKind::IntegerLiteral => {
                    let Ok(value) = syntax.text(pattern)?.replace('_', "").parse::<i64>() else {
                        return Ok(None);
                    };
                    plan.cases.push((value, arm));
                }
                NodeKind::WildcardPattern if index + 1 == arms.len() => {
                    plan.default = Some(arm);
                }
                _ => return Ok(None),
            }
        }
        Ok((!plan.cases.is_empty()).then_some(plan))
    }

    fn lower_switch(
        &mut self,
        scrutinee: &Lowered,
        plan: SwitchPlan,
        want_value: bool,
    ) -> Result<Option<Lowered>, LowerError> {
        let merge = self.builder.new_label();
        let mut cases: Vec<(i64, LabelId)> = Vec::new();
        let mut targets: Vec<(LabelId, NodeId)> = Vec::new();
        for (value, arm) in plan.cases {
            if cases.iter().any(|&(existing, _)| existing == value) {
                tracing::debug!(graph = self.builder.name(), value, "duplicate match arm ignored");
                continue;
            }
            let label = self.builder.new_label();
            cases.push((value, label));
            targets.push((label, arm));
        }

        let mut trap = None;
        let default = match plan.default {
            Some(arm) => {
                let label = self.builder.new_label();
                targets.push((label, arm));
                label
            }
            None if want_value => {
                let label = self.builder.new_label();
                trap = Some(label);
                label
            }
            None => merge,
        };
        self.builder.switch(scrutinee.value, cases, default);

        let mut incoming = Vec::new();
        for (label, arm) in targets {
            self.builder.start_label(label);
            let body = self.syntax.child(arm, 2)?;
            self.lower_arm(body, want_value, merge, &mut incoming)?;
        }
        if let Some(trap) = trap {
            self.builder.start_label(trap);
            self.builder.unreachable();
        }
        self.builder.start_label(merge);
        Ok(self.merge_values(incoming))
    }

    /// Sequential tests, one per arm, falling through to the next arm.
    fn lower_match_chain(
        &mut self,
        scrutinee: &Lowered,
        arms: &[NodeId],
        want_value: bool,
    ) -> Result<Option<Lowered>, LowerError> {
        let syntax = self.syntax;
        let merge = self.builder.new_label();
        let mut incoming = Vec::new();
        let mut falls_through = true;

        for &arm in arms {
            syntax.expect(arm, NodeKind::MatchArm)?;
            let pattern = syntax.child(arm, 0)?;
            let guard = syntax.optional_child(arm, 1)?;
            let body = syntax.child(arm, 2)?;
            let saved = self.scope.clone();
            let mut next = None;

            let test = match syntax.kind(pattern)? {
                NodeKind::WildcardPattern => None,
                NodeKind::Identifier => {
                    self.scope
                        .bind(syntax.name(pattern)?, scrutinee.value, scrutinee.ty.clone());
                    None
                }
                NodeKind::NegatePattern => {
                    let value = self.lower_expr(syntax.child(pattern, 0)?)?;
                    Some(self.builder.emit(
                        OpCode::NotEqual,
                        &[scrutinee.value, value.value],
                        IrData::None,
                    ))
                }
                _ => {
                    let value = self.lower_expr(pattern)?;
                    Some(self.builder.emit(
                        OpCode::Equal,
                        &[scrutinee.value, value.value],
                        IrData::None,
                    ))
                }
            };
            if let Some(test) = test {
                let matched = self.builder.new_label();
                let next_label = self.builder.new_label();
                next = Some(next_label);
                self.builder.branch(test, matched, next_label);
                self.builder.start_label(matched);
            }
            if let Some(guard) = guard {
                let guard = self.lower_expr(guard)?;
                let passed = self.builder.new_label();
                let next_label = match next {
                    Some(label) => label,
                    None => {
                        let label = self.builder.new_label();
                        next = Some(label);
                        label
                    }
                };
                self.builder.branch(guard.value, passed, next_label);
                self.builder.start_label(passed);
            }

            self.lower_arm(body, want_value, merge, &mut incoming)?;
            self.scope = saved;

            let Some(next) = next else {
                falls_through = false;
                break;
            };
            self.builder.start_label(next);
        }

        if falls_through {
            if want_value {
                self.builder.unreachable();
            } else {
                self.builder.jump(merge);
            }
        }
        self.builder.start_label(merge);
        Ok(self.merge_values(incoming))
    }
}

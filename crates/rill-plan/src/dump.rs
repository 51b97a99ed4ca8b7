//! Human-readable plan dump for debugging and for `rill dump`.

use std::fmt::Write as _;

use rill_core::Colors;
use rill_core::utils::width_for_count;

use crate::{FnPlan, ParserPlan, SlotId, Step, TokenSet};

/// Render the whole plan: tables first, then one block per function.
pub fn dump(plan: &ParserPlan, colors: Colors) -> String {
    let mut out = String::new();
    let ctx = DumpContext { plan, colors };

    dump_tokens(&mut out, &ctx);
    dump_types(&mut out, &ctx);
    dump_roots(&mut out, &ctx);
    for (i, func) in plan.functions.iter().enumerate() {
        dump_function(&mut out, &ctx, i, func);
    }

    out.truncate(out.trim_end().len());
    out.push('\n');
    out
}

struct DumpContext<'a> {
    plan: &'a ParserPlan,
    colors: Colors,
}

impl DumpContext<'_> {
    fn set(&self, set: &TokenSet) -> String {
        format!("{{{}}}", self.plan.token_names(set).join(" "))
    }

    fn type_name(&self, ty: Option<crate::TypeId>) -> Option<&str> {
        ty.and_then(|t| self.plan.types.get(t.index()))
            .map(|t| t.name.as_str())
    }
}

fn dump_tokens(out: &mut String, ctx: &DumpContext<'_>) {
    let c = &ctx.colors;
    let w = width_for_count(ctx.plan.tokens.len());

    writeln!(out, "{}[tokens]{}", c.blue, c.reset).unwrap();
    for (i, token) in ctx.plan.tokens.iter().enumerate() {
        write!(out, "T{i:0w$} {}{}{}", c.green, token.name, c.reset).unwrap();
        if let Some(ty) = ctx.type_name(token.ty) {
            write!(out, "  {}; {ty}{}", c.dim, c.reset).unwrap();
        }
        out.push('\n');
    }
    out.push('\n');
}

fn dump_types(out: &mut String, ctx: &DumpContext<'_>) {
    if ctx.plan.types.is_empty() {
        return;
    }
    let c = &ctx.colors;
    let w = width_for_count(ctx.plan.types.len());

    writeln!(out, "{}[types]{}", c.blue, c.reset).unwrap();
    for (i, ty) in ctx.plan.types.iter().enumerate() {
        write!(out, "Y{i:0w$} {} = {{{}}}", ty.name, ty.spec.trim()).unwrap();
        if let Some(dtor) = &ty.destructor {
            write!(out, "  {}; drop {{{}}}{}", c.dim, dtor.trim(), c.reset).unwrap();
        }
        out.push('\n');
    }
    out.push('\n');
}

fn dump_roots(out: &mut String, ctx: &DumpContext<'_>) {
    let c = &ctx.colors;
    writeln!(out, "{}[roots]{}", c.blue, c.reset).unwrap();
    for root in &ctx.plan.roots {
        writeln!(out, "{} → {}", root.name, root.function).unwrap();
    }
    out.push('\n');
}

fn dump_function(out: &mut String, ctx: &DumpContext<'_>, index: usize, func: &FnPlan) {
    let c = &ctx.colors;
    let w = width_for_count(func.states.len());

    write!(out, "{}[F{index} {}]{}", c.blue, func.name, c.reset).unwrap();
    if let Some(ty) = ctx.type_name(func.ty) {
        write!(out, "  {}; {ty}{}", c.dim, c.reset).unwrap();
    }
    out.push('\n');

    let slots: Vec<&str> = func.slots.iter().map(|s| s.name.as_str()).collect();
    writeln!(out, "  {}slots: {}{}", c.dim, slots.join(" "), c.reset).unwrap();

    for (i, step) in func.states.iter().enumerate() {
        let kind = step.kind().as_str();
        let operands = format_operands(ctx, func, step, w);
        let line = format!("  {}{i:0w$}{}  {kind:<15} {operands}", c.dim, c.reset);
        writeln!(out, "{}", line.trim_end()).unwrap();
    }
    out.push('\n');
}

fn format_operands(ctx: &DumpContext<'_>, func: &FnPlan, step: &Step, w: usize) -> String {
    let slot = |s: SlotId| {
        let name = &func.slot(s).name;
        if name == "$$" {
            name.clone()
        } else {
            format!("${name}")
        }
    };
    let loc = |s: SlotId| {
        let name = &func.slot(s).name;
        if name == "$$" {
            "@$".to_string()
        } else {
            format!("@{name}")
        }
    };

    match step {
        Step::Match { accept, bind, next } => match bind {
            Some(b) => format!("{} {} → {:0w$}", ctx.set(accept), slot(*b), next.0),
            None => format!("{} → {:0w$}", ctx.set(accept), next.0),
        },
        Step::Call { callee, ret } => format!(
            "{callee} {} → {:0w$}",
            ctx.plan.function(*callee).name,
            ret.0
        ),
        Step::Resume { bind, next } => match bind {
            Some(b) => format!("{} → {:0w$}", slot(*b), next.0),
            None => format!("→ {:0w$}", next.0),
        },
        Step::Action {
            snippet,
            values,
            locations,
            output,
            next,
        } => {
            let mut parts = vec![snippet.to_string()];
            if !values.is_empty() {
                let v: Vec<_> = values.iter().map(|s| slot(*s)).collect();
                parts.push(format!("in({})", v.join(" ")));
            }
            if !locations.is_empty() {
                let l: Vec<_> = locations.iter().map(|s| loc(*s)).collect();
                parts.push(format!("loc({})", l.join(" ")));
            }
            if let Some(o) = output {
                parts.push(format!("out({})", slot(*o)));
            }
            parts.push(format!("→ {:0w$}", next.0));
            parts.join(" ")
        }
        Step::Dispatch { arms, default } => {
            let mut parts: Vec<String> = arms
                .iter()
                .map(|a| format!("{} {:0w$}", ctx.set(&a.accept), a.target.0))
                .collect();
            if let Some(d) = default {
                parts.push(format!("_ {:0w$}", d.0));
            }
            parts.join(" | ")
        }
        Step::LoopHead { counter, next } => format!("{counter} → {:0w$}", next.0),
        Step::LoopTest {
            counter,
            min,
            max,
            iterate,
            body,
            exit,
        } => {
            let bounds = match max {
                Some(max) => format!("{min}..{max}"),
                None => format!("{min}.."),
            };
            let counter = counter.map(|c| format!("{c} ")).unwrap_or_default();
            format!(
                "{counter}{bounds} {} body {:0w$} exit {:0w$}",
                ctx.set(iterate),
                body.0,
                exit.0
            )
        }
        Step::RecoveryEnter { recovery, next } | Step::RecoveryExit { recovery, next } => {
            format!("{recovery} → {:0w$}", next.0)
        }
        Step::Sync {
            recovery,
            sentinel,
            next,
        } => format!("{recovery} {} → {:0w$}", ctx.set(sentinel), next.0),
        Step::Return => String::new(),
    }
}

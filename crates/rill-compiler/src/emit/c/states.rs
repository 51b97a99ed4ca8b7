//! Step functions: one C function per expression, a `switch` over its
//! state numbers inside a loop. States that need a token return `OK` when
//! none is buffered; calls and returns go back to the dispatch loop.

use std::fmt::Write;

use rill_plan::{FnPlan, SlotId, SnippetId, StateId, Step, TokenSet};

use super::CWriter;
use crate::emit::EmitError;
use crate::ir::{RefKind, scan_refs, substitute_refs};

impl CWriter<'_, '_> {
    pub(super) fn function(&mut self, index: usize) -> Result<(), EmitError> {
        let plan = self.input.plan;
        let function = &plan.functions[index];
        let p = self.p.clone();
        let pp = self.pp.clone();

        writeln!(
            self.output,
            "static int {p}fn_{}({p}parser *{p}p, {p}frame *{p}f)\n{{",
            function.name
        )
        .unwrap();
        writeln!(
            self.output,
            "    {p}slot *{p}s = &{p}p->slots[{p}f->prev_index];\n\n    (void){p}s;\n    for (;;) {{\n        switch ({p}f->state) {{"
        )
        .unwrap();

        for (state, step) in function.states.iter().enumerate() {
            writeln!(
                self.output,
                "        case {state}: /* {} */",
                step.kind().as_str()
            )
            .unwrap();
            self.step(function, step)?;
        }

        writeln!(
            self.output,
            "        default:\n            return {p}halt({p}p, {pp}SYNTAX_ERROR);\n        }}\n    }}\n}}"
        )
        .unwrap();
        Ok(())
    }

    fn step(&mut self, function: &FnPlan, step: &Step) -> Result<(), EmitError> {
        let plan = self.input.plan;
        let p = self.p.clone();
        let pp = self.pp.clone();

        match step {
            Step::Match { accept, bind, next } => {
                let mask = self.mask_ref(accept);
                self.line(&format!("if (!{p}p->has_la)\n    return {pp}OK;"));
                self.line(&format!(
                    "if (!{p}mask_has({mask}, {p}p->la_kind))\n    return {p}syntax_error({p}p, {mask});"
                ));
                self.line(&format!("{p}consume({p}p, {p}f, {});", slot_arg(*bind)));
                self.goto(*next);
            }
            Step::Call { callee, ret } => {
                self.line(&format!("{p}f->state = {};", ret.0));
                self.line(&format!(
                    "return {p}call({p}p, {}); /* {} */",
                    callee.0,
                    plan.function(*callee).name
                ));
            }
            Step::Resume { bind, next } => {
                self.line(&format!("{p}resume({p}p, {p}f, {});", slot_arg(*bind)));
                self.goto(*next);
            }
            Step::Action {
                snippet,
                values,
                output,
                next,
                ..
            } => {
                self.action(function, *snippet, values, *output)?;
                self.goto(*next);
            }
            Step::Dispatch { arms, default } => {
                self.line(&format!("if (!{p}p->has_la)\n    return {pp}OK;"));
                let mut all = TokenSet::new();
                for arm in arms {
                    all.union_with(&arm.accept);
                    let mask = self.mask_ref(&arm.accept);
                    self.line(&format!(
                        "if ({p}mask_has({mask}, {p}p->la_kind)) {{\n    {p}f->state = {};\n    continue;\n}}",
                        arm.target.0
                    ));
                }
                let all = self.mask_ref(&all);
                match default {
                    Some(target) => {
                        self.line(&format!("{p}mask_or(&{p}f->follow, {all});"));
                        self.goto(*target);
                    }
                    None => self.line(&format!("return {p}syntax_error({p}p, {all});")),
                }
            }
            Step::LoopHead { counter, next } => {
                self.line(&format!("{p}f->counters[{}] = 0;", counter.0));
                self.goto(*next);
            }
            Step::LoopTest {
                counter,
                min,
                max,
                iterate,
                body,
                exit,
            } => {
                let (count, bump) = match counter {
                    Some(c) => (
                        format!("{p}f->counters[{}]", c.0),
                        format!("{p}f->counters[{}]++;\n    ", c.0),
                    ),
                    None => (String::new(), String::new()),
                };
                if let Some(max) = max {
                    self.line(&format!(
                        "if ({count} >= {max}) {{\n    {p}f->state = {};\n    continue;\n}}",
                        exit.0
                    ));
                }
                if *min > 0 {
                    self.line(&format!(
                        "if ({count} < {min}) {{\n    {bump}{p}f->state = {};\n    continue;\n}}",
                        body.0
                    ));
                }
                if step.needs_lookahead() {
                    let mask = self.mask_ref(iterate);
                    self.line(&format!("if (!{p}p->has_la)\n    return {pp}OK;"));
                    self.line(&format!(
                        "if ({p}mask_has({mask}, {p}p->la_kind)) {{\n    {bump}{p}f->state = {};\n    continue;\n}}",
                        body.0
                    ));
                    self.line(&format!("{p}mask_or(&{p}f->follow, {mask});"));
                }
                self.goto(*exit);
            }
            Step::RecoveryEnter { recovery, next } => {
                self.line(&format!(
                    "if ({p}enter_recovery({p}p, {}) != {pp}CONTINUE)\n    return {pp}STACK_OVERFLOW;",
                    recovery.0
                ));
                self.goto(*next);
            }
            Step::RecoveryExit { next, .. } => {
                self.line(&format!("{p}p->marker_len--;"));
                self.goto(*next);
            }
            Step::Sync {
                recovery,
                sentinel,
                next,
            } => {
                let mask = self.mask_ref(sentinel);
                self.line(&format!("if (!{p}p->has_la)\n    return {pp}OK;"));
                self.line(&format!(
                    "if ({p}mask_has({mask}, {p}p->la_kind)) {{\n    {p}f->state = {};\n    continue;\n}}",
                    next.0
                ));
                if let Some(end) = plan.end_token {
                    self.line(&format!(
                        "if ({p}p->la_kind == {pp}TOKEN_{}) {{\n    {p}report({p}p, {mask});\n    return {p}halt({p}p, {pp}SYNTAX_ERROR);\n}}",
                        plan.token_name(end)
                    ));
                }
                self.line(&format!("/* {recovery}: discard until a sentinel */"));
                self.line(&format!("{p}release_lookahead({p}p);\nreturn {pp}OK;"));
            }
            Step::Return => {
                self.line(&format!("return {p}return({p}p);"));
            }
        }
        Ok(())
    }

    /// Writes a snippet case: inputs move out of their slots, the code runs
    /// with `$`/`@` references rewritten, the output lands in its slot.
    ///
    /// Code that never writes `$$` leaves its bound slot empty.
    fn action(
        &mut self,
        function: &FnPlan,
        snippet: SnippetId,
        values: &[SlotId],
        output: Option<SlotId>,
    ) -> Result<(), EmitError> {
        let p = self.p.clone();
        let plan = self.input.plan;
        let info = plan.snippet(snippet);
        let refs = scan_refs(&info.code);
        let stored = output.filter(|_| {
            refs.iter()
                .any(|r| r.kind == RefKind::Value && r.name.is_none())
        });
        let locations = self.input.config.has_locations();

        let mut unknown = None;
        let code = substitute_refs(&info.code, &refs, |r| {
            let text = &info.code[r.span.clone()];
            match (r.kind, r.name.as_deref()) {
                (RefKind::Value, None) => match output {
                    Some(slot) => format!("{p}out{}", self.member(function, slot)),
                    None => text.to_string(),
                },
                (RefKind::Location, None) => format!("{p}here"),
                (RefKind::Value, Some("error")) if info.recovery => format!("{p}p->la_kind"),
                (RefKind::Location, Some("error")) if info.recovery => format!("{p}p->la_loc"),
                (kind, Some(name)) => match slot_named(function, name) {
                    Some(slot) if kind == RefKind::Value => {
                        format!("{p}s[{}].val{}", slot.0, self.member(function, slot))
                    }
                    Some(slot) => format!("{p}s[{}].loc", slot.0),
                    None => {
                        unknown.get_or_insert_with(|| name.to_string());
                        text.to_string()
                    }
                },
            }
        });
        if let Some(name) = unknown {
            return Err(EmitError::UnknownSlot {
                function: function.name.clone(),
                name,
            });
        }

        let uses_here = refs
            .iter()
            .any(|r| r.kind == RefKind::Location && r.name.is_none());

        writeln!(self.output, "        {{").unwrap();
        if stored.is_some() {
            writeln!(self.output, "            {p}semval {p}out;").unwrap();
        }
        if uses_here && locations {
            writeln!(
                self.output,
                "            {p}loc {p}here = {p}frame_loc({p}p, {p}f);"
            )
            .unwrap();
        }
        for slot in values {
            writeln!(self.output, "            {p}s[{}].live = 0;", slot.0).unwrap();
        }
        writeln!(self.output, "            {{").unwrap();
        self.user_code(&code, info.line);
        writeln!(self.output, "            }}").unwrap();
        if let Some(slot) = stored {
            writeln!(
                self.output,
                "            {p}store(&{p}s[{}], {}, {p}out);",
                slot.0,
                super::type_code(function.slot(slot).ty)
            )
            .unwrap();
        }
        if let Some(slot) = output
            && locations
            && slot != SlotId::OUTPUT
        {
            writeln!(
                self.output,
                "            {p}s[{}].loc = {p}zero_loc({p}p);",
                slot.0
            )
            .unwrap();
        }
        writeln!(self.output, "        }}").unwrap();
        Ok(())
    }

    /// Union member selecting the slot's type, e.g. `.num`.
    fn member(&self, function: &FnPlan, slot: SlotId) -> String {
        function
            .slot(slot)
            .ty
            .map(|ty| format!(".{}", self.input.plan.types[ty.index()].name))
            .unwrap_or_default()
    }

    /// Writes `text` at case-body indentation, one line at a time.
    fn line(&mut self, text: &str) {
        for line in text.lines() {
            writeln!(self.output, "            {line}").unwrap();
        }
    }

    fn goto(&mut self, state: StateId) {
        let p = self.p.clone();
        self.line(&format!("{p}f->state = {};\ncontinue;", state.0));
    }
}

fn slot_arg(bind: Option<SlotId>) -> String {
    bind.map_or("-1".to_string(), |s| s.0.to_string())
}

fn slot_named(function: &FnPlan, name: &str) -> Option<SlotId> {
    function
        .slots
        .iter()
        .position(|s| s.name == name)
        .map(SlotId::new)
}

//! C backend: one self-contained translation unit per grammar.
//!
//! Layout of the generated file:
//! - prologue code, includes, configuration and status macros
//! - token enum, semval union, slot/frame/parser structs, `PARSER_DECLARE`
//! - token, type and slot tables, the expected-mask table, destructor dispatch
//! - the runtime helpers
//! - one step function per expression (a switch over its states)
//! - the dispatch loop, the public API and a `parse_<root>` per root
//! - epilogue code

mod runtime;
mod states;

use std::fmt::Write;

use indexmap::IndexSet;
use rill_plan::{Step, TokenSet, TypeId};

use super::{EmitError, EmitInput, Emitter};
use crate::ir::{Code, RefKind, scan_refs, substitute_refs};

pub struct CEmitter;

impl Emitter for CEmitter {
    fn lang(&self) -> &'static str {
        "c"
    }

    fn extension(&self) -> &'static str {
        "c"
    }

    #[tracing::instrument(level = "debug", skip_all)]
    fn emit(&self, input: &EmitInput<'_>) -> Result<String, EmitError> {
        let output = CWriter::new(input).write()?;
        tracing::debug!(bytes = output.len(), "c source emitted");
        Ok(output)
    }
}

pub(super) struct CWriter<'i, 'a> {
    input: &'i EmitInput<'a>,
    /// Lower-case identifier prefix.
    p: String,
    /// Upper-case macro prefix.
    pp: String,
    masks: IndexSet<TokenSet>,
    output: String,
}

impl<'i, 'a> CWriter<'i, 'a> {
    fn new(input: &'i EmitInput<'a>) -> Self {
        Self {
            input,
            p: input.config.prefix.clone(),
            pp: input.config.upper_prefix(),
            masks: IndexSet::new(),
            output: String::new(),
        }
    }

    fn write(mut self) -> Result<String, EmitError> {
        self.collect_masks();

        let grammar = self.input.grammar;
        writeln!(self.output, "/* Generated by rill. Do not edit. */").unwrap();
        self.code_blocks(&grammar.prologue);
        self.output
            .push_str("\n#include <stddef.h>\n#include <stdio.h>\n#include <string.h>\n\n");
        self.config_macros();
        self.token_enum();
        self.semval_union();
        self.template(runtime::STRUCTS);
        self.newline();
        self.error_fn_prototype();
        self.tables();
        self.mask_table();
        self.destroy_fn();
        if self.input.config.error_fn.is_none() {
            self.template(runtime::DEFAULT_ERROR);
            self.newline();
        }
        self.template(runtime::HELPERS);

        for index in 0..self.input.plan.functions.len() {
            self.newline();
            self.function(index)?;
        }

        self.newline();
        self.run_loop();
        self.newline();
        self.template(runtime::API);
        self.root_wrappers()?;
        self.code_blocks(&grammar.epilogue);

        self.output.truncate(self.output.trim_end().len());
        self.output.push('\n');
        Ok(self.output)
    }

    fn template(&mut self, text: &str) {
        self.output.push_str(&runtime::expand(text, self.input.config));
    }

    fn newline(&mut self) {
        self.output.push('\n');
    }

    /// 1-based line the next written line will have.
    fn current_line(&self) -> usize {
        self.output.matches('\n').count() + 1
    }

    /// Writes user code, pointing the compiler back at the grammar when
    /// file names are known.
    fn user_code(&mut self, code: &str, line: u32) {
        let code = code.trim_matches('\n');
        match self.input.line_files {
            Some(files) if line > 0 => {
                writeln!(self.output, "#line {} \"{}\"", line, escape(files.grammar)).unwrap();
                writeln!(self.output, "{code}").unwrap();
                let next = self.current_line() + 1;
                writeln!(self.output, "#line {} \"{}\"", next, escape(files.output)).unwrap();
            }
            _ => {
                if line > 0 {
                    writeln!(self.output, "/* grammar line {line} */").unwrap();
                }
                writeln!(self.output, "{code}").unwrap();
            }
        }
    }

    fn code_blocks(&mut self, blocks: &[Code]) {
        for block in blocks {
            self.newline();
            self.user_code(&block.text, block.line);
        }
    }

    fn config_macros(&mut self) {
        let plan = self.input.plan;
        let config = self.input.config;
        let pp = self.pp.clone();
        let tokens = plan.tokens.len();

        writeln!(self.output, "#define {pp}TOKEN_COUNT {tokens}").unwrap();
        writeln!(self.output, "#define {pp}MASK_BYTES {}", mask_bytes(tokens)).unwrap();
        writeln!(
            self.output,
            "#define {pp}MAX_COUNTERS {}",
            plan.max_counters().max(1)
        )
        .unwrap();
        writeln!(
            self.output,
            "#define {pp}RECOVERIES {}",
            plan.recoveries.len()
        )
        .unwrap();
        writeln!(
            self.output,
            "#define {pp}LOCATIONS {}",
            u8::from(config.has_locations())
        )
        .unwrap();

        let error_fn = match &config.error_fn {
            Some(name) => name.clone(),
            None => format!("{}default_error", self.p),
        };
        writeln!(self.output, "#define {pp}ERROR_FN {error_fn}").unwrap();
        if let Some(locations) = &config.locations {
            writeln!(self.output, "#define {pp}SPAN_FN {}", locations.span_fn).unwrap();
            writeln!(self.output, "#define {pp}ZERO_LOC_FN {}", locations.zero_loc_fn).unwrap();
        }
        writeln!(
            self.output,
            "/* ends the running parse with {pp}SEMANTIC_ERROR; only valid inside actions */"
        )
        .unwrap();
        writeln!(
            self.output,
            "#define {pp}ABORT() return {}halt({}p, {pp}SEMANTIC_ERROR)",
            self.p, self.p
        )
        .unwrap();
        self.newline();
        self.template(runtime::STATUS);
        self.newline();
    }

    fn token_enum(&mut self) {
        let plan = self.input.plan;
        writeln!(self.output, "typedef enum {{").unwrap();
        for (i, token) in plan.tokens.iter().enumerate() {
            writeln!(self.output, "    {}TOKEN_{} = {i},", self.pp, token.name).unwrap();
        }
        if plan.tokens.is_empty() {
            writeln!(self.output, "    {}TOKEN_NONE_ = 0", self.pp).unwrap();
        }
        writeln!(self.output, "}} {}token_kind;", self.p).unwrap();
        self.newline();
    }

    fn semval_union(&mut self) {
        let plan = self.input.plan;
        writeln!(self.output, "typedef union {{").unwrap();
        for ty in &plan.types {
            writeln!(self.output, "    {} {};", ty.spec.trim(), ty.name).unwrap();
        }
        if plan.types.is_empty() {
            writeln!(self.output, "    char unused_;").unwrap();
        }
        writeln!(self.output, "}} {}semval;", self.p).unwrap();

        if let Some(locations) = &self.input.config.locations {
            writeln!(self.output, "typedef {} {}loc;", locations.semloc_type, self.p).unwrap();
        }
        self.newline();
    }

    fn error_fn_prototype(&mut self) {
        let Some(name) = &self.input.config.error_fn else {
            return;
        };
        let p = &self.p;
        let loc = if self.input.config.has_locations() {
            format!(", {p}loc loc")
        } else {
            String::new()
        };
        writeln!(
            self.output,
            "void {name}({p}parser *p, {p}token_kind kind, {p}semval sem, const {p}mask *expected{loc});"
        )
        .unwrap();
        self.newline();
    }

    fn tables(&mut self) {
        let plan = self.input.plan;
        let p = self.p.clone();

        let names: Vec<String> = plan
            .tokens
            .iter()
            .map(|t| format!("\"{}\"", escape(&t.name)))
            .collect();
        self.table("static const char *const", "token_names", &names);

        let token_types: Vec<String> = plan.tokens.iter().map(|t| type_code(t.ty)).collect();
        self.table("static const short", "token_types", &token_types);

        let fn_types: Vec<String> = plan.functions.iter().map(|f| type_code(f.ty)).collect();
        self.table("static const short", "fn_types", &fn_types);

        let slot_counts: Vec<String> = plan
            .functions
            .iter()
            .map(|f| f.slots.len().to_string())
            .collect();
        self.table("static const unsigned char", "slot_counts", &slot_counts);

        for function in &plan.functions {
            let types: Vec<String> = function.slots.iter().map(|s| type_code(s.ty)).collect();
            let name = format!("slot_types_{}", function.name);
            self.table("static const short", &name, &types);
        }
        let slot_tables: Vec<String> = plan
            .functions
            .iter()
            .map(|f| format!("{p}slot_types_{}", f.name))
            .collect();
        self.table("static const short *const", "slot_types", &slot_tables);

        if plan.recoveries.is_empty() {
            return;
        }
        writeln!(
            self.output,
            "typedef struct {{\n    unsigned short handler;\n    unsigned scoped_len;\n    const unsigned char *scoped;\n}} {p}recovery;\n"
        )
        .unwrap();
        for (i, recovery) in plan.recoveries.iter().enumerate() {
            if recovery.scoped_slots.is_empty() {
                continue;
            }
            let slots: Vec<String> = recovery
                .scoped_slots
                .iter()
                .map(|s| s.0.to_string())
                .collect();
            self.table("static const unsigned char", &format!("scoped_{i}"), &slots);
        }
        let entries: Vec<String> = plan
            .recoveries
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let scoped = if r.scoped_slots.is_empty() {
                    "NULL".to_string()
                } else {
                    format!("{p}scoped_{i}")
                };
                format!(
                    "{{ {}, {}, {scoped} }} /* {} */",
                    r.handler.0,
                    r.scoped_slots.len(),
                    plan.function(r.function).name
                )
            })
            .collect();
        self.table(&format!("static const {p}recovery"), "recoveries", &entries);
    }

    fn table(&mut self, decl: &str, name: &str, entries: &[String]) {
        writeln!(self.output, "{decl} {}{name}[] = {{", self.p).unwrap();
        for entry in entries {
            writeln!(self.output, "    {entry},").unwrap();
        }
        if entries.is_empty() {
            writeln!(self.output, "    0").unwrap();
        }
        writeln!(self.output, "}};").unwrap();
        self.newline();
    }

    fn collect_masks(&mut self) {
        let plan = self.input.plan;
        for function in &plan.functions {
            for step in &function.states {
                match step {
                    Step::Match { accept, .. } => {
                        self.masks.insert(accept.clone());
                    }
                    Step::Dispatch { arms, .. } => {
                        let mut all = TokenSet::new();
                        for arm in arms {
                            self.masks.insert(arm.accept.clone());
                            all.union_with(&arm.accept);
                        }
                        self.masks.insert(all);
                    }
                    Step::LoopTest { iterate, .. } => {
                        self.masks.insert(iterate.clone());
                    }
                    Step::Sync { sentinel, .. } => {
                        self.masks.insert(sentinel.clone());
                    }
                    _ => {}
                }
            }
        }
        if self.masks.is_empty() {
            self.masks.insert(TokenSet::new());
        }
    }

    /// Reference to the table entry holding `set`.
    fn mask_ref(&self, set: &TokenSet) -> String {
        let index = self.masks.get_index_of(set).unwrap_or(0);
        format!("&{}masks[{index}]", self.p)
    }

    fn mask_table(&mut self) {
        let plan = self.input.plan;
        let width = mask_bytes(plan.tokens.len());
        writeln!(self.output, "static const {}mask {}masks[] = {{", self.p, self.p).unwrap();
        for (i, set) in self.masks.iter().enumerate() {
            let mut bytes = set.to_bytes(plan.tokens.len());
            bytes.resize(width, 0);
            let bytes: Vec<String> = bytes.iter().map(|b| format!("0x{b:02x}")).collect();
            let names = plan.token_names(set).join(" ");
            writeln!(
                self.output,
                "    {{ {{ {} }} }}, /* {i}: {names} */",
                bytes.join(", ")
            )
            .unwrap();
        }
        writeln!(self.output, "}};").unwrap();
        self.newline();
    }

    fn destroy_fn(&mut self) {
        let plan = self.input.plan;
        let p = self.p.clone();
        writeln!(self.output, "static void {p}destroy(short type, {p}semval *v)\n{{").unwrap();
        writeln!(self.output, "    switch (type) {{").unwrap();
        for (i, ty) in plan.types.iter().enumerate() {
            let Some(destructor) = &ty.destructor else {
                continue;
            };
            let refs = scan_refs(destructor);
            let code = substitute_refs(destructor, &refs, |r| match (r.kind, &r.name) {
                (RefKind::Value, None) => format!("(v->{})", ty.name),
                _ => destructor[r.span.clone()].to_string(),
            });
            writeln!(self.output, "    case {i}: /* {} */ {{", ty.name).unwrap();
            self.user_code(&code, 0);
            writeln!(self.output, "    }} break;").unwrap();
        }
        writeln!(self.output, "    default:\n        break;\n    }}").unwrap();
        writeln!(self.output, "    (void)v;\n}}").unwrap();
        self.newline();
    }

    fn run_loop(&mut self) {
        let plan = self.input.plan;
        let p = self.p.clone();
        let pp = self.pp.clone();
        writeln!(self.output, "static int {p}run({p}parser *p)\n{{\n    for (;;) {{").unwrap();
        writeln!(
            self.output,
            "        {p}frame *f = &p->frames[p->depth - 1];\n        int status;\n"
        )
        .unwrap();
        writeln!(self.output, "        switch (f->fn) {{").unwrap();
        for (i, function) in plan.functions.iter().enumerate() {
            writeln!(
                self.output,
                "        case {i}:\n            status = {p}fn_{}(p, f);\n            break;",
                function.name
            )
            .unwrap();
        }
        writeln!(
            self.output,
            "        default:\n            return {p}halt(p, {pp}SYNTAX_ERROR);\n        }}"
        )
        .unwrap();
        writeln!(
            self.output,
            "        if (status != {pp}CONTINUE)\n            return status;\n    }}\n}}"
        )
        .unwrap();
    }

    fn root_wrappers(&mut self) -> Result<(), EmitError> {
        let plan = self.input.plan;
        let p = self.p.clone();
        let locations = self.input.config.has_locations();
        for root in &plan.roots {
            if root.function.index() >= plan.functions.len() {
                return Err(EmitError::MissingRoot(root.name.clone()));
            }
            let (param, arg) = if locations {
                (format!(", {p}loc loc"), ", loc")
            } else {
                (String::new(), "")
            };
            self.newline();
            writeln!(
                self.output,
                "int {p}parse_{}({p}parser *p, int kind, {p}semval sem{param})\n{{",
                root.name
            )
            .unwrap();
            writeln!(
                self.output,
                "    return {p}feed(p, {}, kind, sem{arg});\n}}",
                root.function.0
            )
            .unwrap();
        }
        Ok(())
    }
}

/// Bytes per expected mask; never zero so the struct stays valid C.
fn mask_bytes(tokens: usize) -> usize {
    tokens.div_ceil(8).max(1)
}

fn type_code(ty: Option<TypeId>) -> String {
    ty.map_or("-1".to_string(), |t| t.0.to_string())
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

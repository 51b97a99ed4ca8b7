//! Generator configuration resolved from `%kwarg` directives.
//!
//! Kwargs tagged for another generator were already dropped by the builder,
//! so everything here applies to the active generator.

use rill_core::utils::{is_identifier, to_upper_snake_case};
use rill_plan::TokenId;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::ir::Grammar;

pub const DEFAULT_PREFIX: &str = "rill_";

const KNOWN_KWARGS: &[&str] = &[
    "prefix",
    "semloc_type",
    "span_fn",
    "zero_loc_fn",
    "error_fn",
    "eof_token",
];

const LOCATION_KWARGS: [&str; 3] = ["semloc_type", "span_fn", "zero_loc_fn"];

/// Kwargs pasted into emitted code as identifiers.
const IDENTIFIER_KWARGS: &[&str] = &["prefix", "span_fn", "zero_loc_fn", "error_fn"];

/// Location support; all three names are required together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    pub semloc_type: String,
    pub span_fn: String,
    pub zero_loc_fn: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Prefix of every emitted identifier; upper-cased for macros.
    pub prefix: String,
    pub locations: Option<Locations>,
    pub error_fn: Option<String>,
    /// Token that ends the input, from `eof_token` or a token named `EOF`.
    pub eof_token: Option<TokenId>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            locations: None,
            error_fn: None,
            eof_token: None,
        }
    }
}

impl Config {
    pub fn upper_prefix(&self) -> String {
        to_upper_snake_case(&self.prefix)
    }

    pub fn has_locations(&self) -> bool {
        self.locations.is_some()
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn resolve(grammar: &Grammar) -> (Config, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let mut config = Config::default();

        for kwarg in &grammar.kwargs {
            if !KNOWN_KWARGS.contains(&kwarg.key.as_str()) {
                diagnostics
                    .report(DiagnosticKind::UnknownKwarg, kwarg.range)
                    .message(&kwarg.key)
                    .emit();
            }
        }

        for key in IDENTIFIER_KWARGS {
            let Some(kwarg) = grammar.kwarg(key) else {
                continue;
            };
            if !is_identifier(kwarg.value.trim()) {
                diagnostics
                    .report(DiagnosticKind::InvalidKwargValue, kwarg.range)
                    .message(*key)
                    .emit();
            }
        }

        let value = |key: &str| {
            grammar
                .kwarg(key)
                .map(|k| k.value.trim())
                .filter(|v| !IDENTIFIER_KWARGS.contains(&key) || is_identifier(v))
                .map(str::to_string)
        };

        if let Some(prefix) = value("prefix") {
            config.prefix = prefix;
        }
        config.error_fn = value("error_fn");

        let [semloc_type, span_fn, zero_loc_fn] = LOCATION_KWARGS.map(value);
        match (semloc_type, span_fn, zero_loc_fn) {
            (Some(semloc_type), Some(span_fn), Some(zero_loc_fn)) => {
                config.locations = Some(Locations {
                    semloc_type,
                    span_fn,
                    zero_loc_fn,
                });
            }
            (None, None, None) => {}
            _ => {
                let missing: Vec<String> = LOCATION_KWARGS
                    .iter()
                    .filter(|k| grammar.kwarg(k).is_none())
                    .map(|k| format!("`{k}`"))
                    .collect();
                let range = LOCATION_KWARGS
                    .iter()
                    .find_map(|k| grammar.kwarg(k))
                    .map(|k| k.range)
                    .unwrap_or_default();
                diagnostics
                    .report(DiagnosticKind::IncompleteLocations, range)
                    .message(format!("missing {}", missing.join(", ")))
                    .emit();
            }
        }

        config.eof_token = match grammar.kwarg("eof_token") {
            Some(kwarg) => {
                let name = kwarg.value.trim();
                let token = grammar.interner.get(name).and_then(|s| grammar.token_id(s));
                if token.is_none() {
                    diagnostics
                        .report(DiagnosticKind::UndefinedReference, kwarg.range)
                        .message(name)
                        .emit();
                }
                token
            }
            None => grammar.interner.get("EOF").and_then(|s| grammar.token_id(s)),
        };

        (config, diagnostics)
    }
}

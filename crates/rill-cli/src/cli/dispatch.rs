//! Dispatch logic: extract params from ArgMatches and convert to command args.

use std::path::PathBuf;

use clap::ArgMatches;

use super::ColorChoice;
use crate::commands::check::CheckArgs;
use crate::commands::dump::DumpArgs;
use crate::commands::generate::GenArgs;

pub struct GenParams {
    pub grammar_path: PathBuf,
    pub output_path: PathBuf,
    pub lang: Option<String>,
    pub color: ColorChoice,
}

impl GenParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            grammar_path: required_path(m, "grammar_path"),
            output_path: required_path(m, "output_path"),
            lang: m.get_one::<String>("lang").cloned(),
            color: parse_color(m),
        }
    }
}

impl From<GenParams> for GenArgs {
    fn from(p: GenParams) -> Self {
        Self {
            grammar_path: p.grammar_path,
            output_path: p.output_path,
            lang: p.lang,
            color: p.color.should_colorize(),
        }
    }
}

pub struct CheckParams {
    pub grammar_path: PathBuf,
    pub strict: bool,
    pub color: ColorChoice,
}

impl CheckParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            grammar_path: required_path(m, "grammar_path"),
            strict: m.get_flag("strict"),
            color: parse_color(m),
        }
    }
}

impl From<CheckParams> for CheckArgs {
    fn from(p: CheckParams) -> Self {
        Self {
            grammar_path: p.grammar_path,
            strict: p.strict,
            color: p.color.should_colorize(),
        }
    }
}

pub struct DumpParams {
    pub grammar_path: PathBuf,
    pub json: bool,
    pub color: ColorChoice,
}

impl DumpParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            grammar_path: required_path(m, "grammar_path"),
            json: m.get_flag("json"),
            color: parse_color(m),
        }
    }
}

impl From<DumpParams> for DumpArgs {
    fn from(p: DumpParams) -> Self {
        Self {
            grammar_path: p.grammar_path,
            json: p.json,
            color: p.color.should_colorize(),
        }
    }
}

/// Required positionals are enforced by clap before dispatch.
fn required_path(m: &ArgMatches, id: &str) -> PathBuf {
    m.get_one::<PathBuf>(id).cloned().unwrap_or_default()
}

fn parse_color(m: &ArgMatches) -> ColorChoice {
    m.get_one::<ColorChoice>("color").copied().unwrap_or_default()
}

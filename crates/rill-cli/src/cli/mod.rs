mod args;
mod commands;
mod dispatch;

#[cfg(test)]
mod dispatch_tests;

pub use commands::build_cli;
pub use dispatch::{CheckParams, DumpParams, GenParams};

/// When to emit ANSI colors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    /// `auto` colors only when stdout and stderr are both terminals and
    /// `NO_COLOR` is unset.
    pub fn should_colorize(self) -> bool {
        use std::io::IsTerminal;

        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                std::env::var_os("NO_COLOR").is_none()
                    && std::io::stdout().is_terminal()
                    && std::io::stderr().is_terminal()
            }
        }
    }
}

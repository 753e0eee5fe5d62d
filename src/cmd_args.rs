use crate::pager::context::Context;
use std::ffi::OsString;
use std::path::PathBuf;

pub use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about = "Page the streaming output of a shell command", long_about = None)]
struct ClapArgs {
    /// Comma-separated mode names, e.g. `git-log,grep`
    #[clap(short = 'm', long, default_value = "", help = "modes to apply")]
    modes: String,

    /// Context variables available to `${name}` placeholders
    #[clap(short = 's', long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    set: Vec<(String, String)>,

    /// Mode file to load instead of the configured one
    #[clap(long, value_name = "PATH")]
    modes_file: Option<PathBuf>,

    /// Command to run; joined with spaces and passed to the shell
    #[clap(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn parse_key_value(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{arg}'")),
    }
}

#[derive(Debug, Clone)]
pub struct CommandLineArgs {
    modes: String,
    context: Context,
    modes_file: Option<PathBuf>,
    command: String,
}

impl From<ClapArgs> for CommandLineArgs {
    fn from(args: ClapArgs) -> Self {
        Self {
            modes: args.modes,
            context: args.set.into_iter().collect(),
            modes_file: args.modes_file,
            command: args.command.join(" "),
        }
    }
}

impl CommandLineArgs {
    pub fn parse() -> Self {
        ClapArgs::parse().into()
    }

    pub fn parse_from<I, T>(itr: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        ClapArgs::parse_from(itr).into()
    }

    /// Like [`CommandLineArgs::parse_from`] but returns clap's error instead of exiting
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        ClapArgs::try_parse_from(itr).map(Self::from)
    }

    pub fn modes(&self) -> &str {
        &self.modes
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn modes_file(&self) -> Option<&PathBuf> {
        self.modes_file.as_ref()
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

//! Argument parsing and help output.

use std::path::PathBuf;

use vault_host::{FieldFilter, SortOrder};

use crate::error::{CliError, CliResult};

/// Flags accepted before the command name; later arguments belong to the command.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GlobalOptions {
    /// Explicit config file; overrides the environment and the working-directory default.
    pub config_path: Option<PathBuf>,
    /// Forces debug logging.
    pub verbose: bool,
}

/// Arguments of `grvault list`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ListArgs {
    /// Case-insensitive substring over name and serial.
    pub search: String,
    /// Optional `FIELD=VALUE` filter.
    pub filter: Option<FieldFilter>,
    /// Sort order; `None` falls back to `[view] default_sort`.
    pub sort: Option<SortOrder>,
}

/// Parsed command selection.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    /// Upload local files.
    Add(Vec<PathBuf>),
    /// Print the filtered listing.
    List(ListArgs),
    /// Print one record.
    Show(String),
    /// Copy a record's bytes to a local path.
    Export {
        /// Record id.
        id: String,
        /// Destination file, or directory to place the file in.
        dest: PathBuf,
    },
    /// Remove a record and its bytes.
    Delete(String),
    /// Report storage health as JSON.
    Health,
    /// Print usage.
    Help,
}

/// Global options plus the command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Invocation {
    /// Flags that apply to every command.
    pub options: GlobalOptions,
    /// What to run.
    pub command: Command,
}

/// Parses raw arguments (without the program name).
pub fn parse(args: Vec<String>) -> CliResult<Invocation> {
    let (options, rest) = split_global_options(args)?;
    let Some(cmd) = rest.first().cloned() else {
        return Ok(Invocation {
            options,
            command: Command::Help,
        });
    };

    let rest = &rest[1..];
    let command = match cmd.as_str() {
        "add" => {
            let rest = match rest {
                [separator, paths @ ..] if separator == "--" => paths,
                _ => rest,
            };
            if rest.is_empty() {
                return Err(CliError::validation("`add` needs at least one file path"));
            }
            Command::Add(rest.iter().map(PathBuf::from).collect())
        }
        "list" | "ls" => Command::List(parse_list_args(rest)?),
        "show" => Command::Show(single_id("show", rest)?),
        "export" => match rest {
            [id, dest] => Command::Export {
                id: id.clone(),
                dest: PathBuf::from(dest),
            },
            _ => {
                return Err(CliError::validation(
                    "usage: grvault export <id> <destination>",
                ))
            }
        },
        "delete" | "rm" => Command::Delete(single_id("delete", rest)?),
        "health" => {
            reject_extra("health", rest)?;
            Command::Health
        }
        "help" | "--help" | "-h" => Command::Help,
        other => {
            return Err(CliError::validation(format!("unknown grvault command: {other}"))
                .with_hint("run `grvault help`"))
        }
    };

    Ok(Invocation { options, command })
}

fn split_global_options(args: Vec<String>) -> CliResult<(GlobalOptions, Vec<String>)> {
    let mut options = GlobalOptions::default();
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--verbose" | "-v" => options.verbose = true,
            "--config" => {
                let Some(value) = iter.next() else {
                    return Err(CliError::validation("missing value for `--config`"));
                };
                options.config_path = Some(PathBuf::from(value));
            }
            _ => {
                if let Some(value) = arg.strip_prefix("--config=") {
                    options.config_path = Some(PathBuf::from(value));
                } else {
                    // First command word; everything after it is passed through untouched.
                    let rest = std::iter::once(arg).chain(iter).collect();
                    return Ok((options, rest));
                }
            }
        }
    }

    Ok((options, Vec::new()))
}

fn parse_list_args(args: &[String]) -> CliResult<ListArgs> {
    let mut parsed = ListArgs::default();
    let mut i = 0usize;

    while i < args.len() {
        let arg = args[i].as_str();
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag, Some(value.to_string())),
            _ => (arg, None),
        };
        let value = match (flag, inline) {
            ("--search" | "--filter" | "--sort", Some(value)) => value,
            ("--search" | "--filter" | "--sort", None) => {
                i += 1;
                args.get(i)
                    .cloned()
                    .ok_or_else(|| CliError::validation(format!("missing value for `{flag}`")))?
            }
            _ => {
                return Err(CliError::validation(format!(
                    "unknown `list` argument: {arg}"
                )))
            }
        };

        match flag {
            "--search" => parsed.search = value,
            "--filter" => parsed.filter = Some(FieldFilter::parse_assignment(&value)?),
            _ => parsed.sort = Some(value.parse::<SortOrder>()?),
        }
        i += 1;
    }

    Ok(parsed)
}

fn single_id(command: &str, args: &[String]) -> CliResult<String> {
    match args {
        [id] => Ok(id.clone()),
        _ => Err(CliError::validation(format!(
            "usage: grvault {command} <id>"
        ))),
    }
}

fn reject_extra(command: &str, args: &[String]) -> CliResult<()> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(CliError::validation(format!(
            "`{command}` takes no arguments (got `{}`)",
            args.join(" ")
        )))
    }
}

/// Prints the top-level usage text.
pub fn print_usage() {
    eprintln!(
        "Usage: grvault [--config PATH] [--verbose] <command> [args]\n\
         \n\
         Global flags must come before the command.\n\
         \n\
         Commands:\n\
           add <path>...                 Upload files and assign GR serial numbers\n\
           list [options]                List records\n\
           show <id>                     Print one record\n\
           export <id> <destination>     Copy a record's bytes to a local file or directory\n\
           delete <id>                   Remove a record and its stored bytes\n\
           health                        Report storage health as JSON\n\
           help                          Show this help\n\
         \n\
         List options:\n\
           --search Q                    Match Q against names and GR numbers\n\
           --filter FIELD=VALUE          FIELD is name, date (YYYY-MM-DD), gr or size (max KB)\n\
           --sort ORDER                  newest, oldest, name or size\n\
         \n\
         Configuration is read from --config, ${}, or ./{} when present.\n",
        vault_host::CONFIG_ENV_VAR,
        vault_host::DEFAULT_CONFIG_FILE
    );
}

//! Command line tokenizing and flag helpers.

use crate::path;
use std::collections::HashSet;

/// A submitted line split into verb and raw arguments.
///
/// Arguments keep their quotes; handlers strip them per argument so error
/// messages can echo exactly what was typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub verb: String,
    pub args: Vec<String>,
}

/// Split on whitespace; `None` for a blank line.
pub fn parse(line: &str) -> Option<CommandLine> {
    let mut tokens = line.split_whitespace().map(str::to_string);
    let verb = tokens.next()?;
    Some(CommandLine {
        verb,
        args: tokens.collect(),
    })
}

pub fn is_flag(arg: &str) -> bool {
    arg.len() > 1 && arg.starts_with('-')
}

/// Every character of every flag argument, so `-rf`, `-fr` and `-r -f` agree.
pub fn flag_chars(args: &[String]) -> HashSet<char> {
    args.iter()
        .filter(|a| is_flag(a))
        .flat_map(|a| a.chars().skip(1))
        .collect()
}

/// Arguments that are not flags, in order.
pub fn positionals(args: &[String]) -> Vec<&str> {
    args.iter()
        .map(String::as_str)
        .filter(|a| !is_flag(a))
        .collect()
}

/// Quote-stripped operand; `None` when absent or empty after stripping.
pub fn operand(raw: Option<&str>) -> Option<&str> {
    raw.map(path::strip_quotes).filter(|s| !s.is_empty())
}

/// Split `args` into the value following `option` and the remaining arguments.
///
/// `option` and its value are removed from the remainder; a trailing
/// `option` with no value yields `None`.
pub fn take_option<'a>(args: &'a [String], option: &str) -> (Option<&'a str>, Vec<&'a str>) {
    let mut value = None;
    let mut rest = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == option {
            value = iter.next().map(String::as_str);
        } else {
            rest.push(arg.as_str());
        }
    }
    (value, rest)
}

/// Positive count from an option value, else `default`.
pub fn count_or(value: Option<&str>, default: usize) -> usize {
    value
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

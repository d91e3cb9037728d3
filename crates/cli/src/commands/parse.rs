use std::process;

use bnfkit_grammars::calc::calculator;
use bnfkit_grammars::CalcError;

use crate::{report_error, OutputFormat, Settings};

/// Dump the calculator parse tree. In JSON mode a failed tree is still
/// printed, with its error, before exiting 1.
pub(crate) fn cmd_parse(expr: &str, settings: &Settings) {
    let term = calculator().parse_with(expr, &settings.parse);

    if settings.output == OutputFormat::Json {
        let pretty = serde_json::to_string_pretty(&term.to_json_value())
            .unwrap_or_else(|e| format!("serialization error: {}", e));
        println!("{}", pretty);
        if !term.is_ok() {
            process::exit(1);
        }
        return;
    }

    match term.error() {
        None => print!("{}", term),
        Some(err) => {
            let msg = CalcError::from_parse(err.clone()).to_string();
            report_error(&msg, settings.output, settings.quiet);
            process::exit(1);
        }
    }
}

use std::process;

use bnfkit_grammars::calc;
use tracing::info;

use crate::{report_error, OutputFormat, Settings};

pub(crate) fn cmd_eval(expr: &str, settings: &Settings) {
    info!(expr, "evaluating");
    match calc::evaluate_with(expr, &settings.parse) {
        Ok(value) => match settings.output {
            OutputFormat::Text => println!("{}", value),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({ "value": value.to_string() }));
            }
        },
        Err(e) => {
            report_error(&e.to_string(), settings.output, settings.quiet);
            process::exit(1);
        }
    }
}

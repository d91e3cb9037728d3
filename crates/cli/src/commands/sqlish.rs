use std::process;

use bnfkit_grammars::sqlish::translator;

use crate::{report_error, Settings};

/// Query parameters are JSON in either output mode.
pub(crate) fn cmd_sqlish(query: &str, settings: &Settings) {
    match translator().translate_with(query, &settings.parse) {
        Ok(params) => {
            let pretty = serde_json::to_string_pretty(&params)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        Err(e) => {
            report_error(&e.to_string(), settings.output, settings.quiet);
            process::exit(1);
        }
    }
}

use std::process;

use bnfkit_core::token::default_whitespace_kinds;
use bnfkit_core::{tokenize, Token};
use bnfkit_grammars::sqlish::translator;

use crate::{report_error, OutputFormat, Settings};

pub(crate) fn cmd_tokens(source: &str, raw: bool, words: bool, settings: &Settings) {
    let tokens = if words {
        let built = if raw {
            translator().words_raw_with(source, &settings.parse)
        } else {
            translator().words_with(source, &settings.parse)
        };
        match built {
            Ok(tokens) => tokens,
            Err(e) => {
                report_error(&e.to_string(), settings.output, settings.quiet);
                process::exit(1);
            }
        }
    } else {
        let whitespace = default_whitespace_kinds();
        tokenize(source)
            .into_iter()
            .filter(|tok| raw || !tok.is_whitespace_in(&whitespace))
            .collect()
    };
    print_tokens(&tokens, settings.output);
}

fn print_tokens(tokens: &[Token], output: OutputFormat) {
    match output {
        OutputFormat::Text => {
            for tok in tokens {
                println!("{}", tok);
            }
        }
        OutputFormat::Json => {
            let pretty = serde_json::to_string_pretty(tokens)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
    }
}

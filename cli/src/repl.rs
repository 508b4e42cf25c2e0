//! Interactive loop: read a line, run the command or analysis, print, repeat until EOF or quit.

use std::io::Write;

use tally::Analyzer;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::Output;

const HELP: &str = "\
Ask a question about orders, order items, products or users, e.g.
  Which product categories brought the most revenue last quarter?
Commands:
  schema [table]   show table schemas
  help             show this help
  quit | exit      leave";

/// One parsed REPL line.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Input<'a> {
    Blank,
    Quit,
    Help,
    Schema(Option<&'a str>),
    Question(&'a str),
}

pub(crate) fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Input::Blank;
    }
    let mut words = line.split_whitespace();
    let first = words.next().unwrap_or_default().to_ascii_lowercase();
    match first.as_str() {
        "quit" | "exit" | "/quit" if words.next().is_none() => Input::Quit,
        "help" if words.next().is_none() => Input::Help,
        "schema" => {
            let table = words.next();
            if words.next().is_none() {
                Input::Schema(table)
            } else {
                Input::Question(line)
            }
        }
        _ => Input::Question(line),
    }
}

/// Runs the REPL against `analyzer`. Analysis failures are printed and the loop continues.
pub async fn run_repl_loop(
    analyzer: &Analyzer,
    output: Output,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = BufReader::new(tokio::io::stdin()).lines();
    let mut turn = 0u64;
    println!("tally: type a question, `help` or `quit`.");

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = reader.next_line().await? else {
            break;
        };
        match parse_input(&line) {
            Input::Blank => continue,
            Input::Quit => break,
            Input::Help => println!("{}", HELP),
            Input::Schema(table) => crate::print_schema(analyzer, table, output).await?,
            Input::Question(question) => {
                turn += 1;
                if let Err(e) = crate::run_query(analyzer, question, output, turn).await {
                    eprintln!("error: {}", e);
                }
            }
        }
    }

    println!("Bye.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_case_insensitively() {
        assert_eq!(parse_input("   "), Input::Blank);
        assert_eq!(parse_input("quit"), Input::Quit);
        assert_eq!(parse_input(" EXIT "), Input::Quit);
        assert_eq!(parse_input("help"), Input::Help);
        assert_eq!(parse_input("schema"), Input::Schema(None));
        assert_eq!(parse_input("Schema orders"), Input::Schema(Some("orders")));
    }

    /// **Scenario**: Lines that merely start with a command word are questions.
    #[test]
    fn sentences_starting_with_command_words_are_questions() {
        assert_eq!(
            parse_input("help me find top customers"),
            Input::Question("help me find top customers")
        );
        assert_eq!(
            parse_input("schema changes by month in orders"),
            Input::Question("schema changes by month in orders")
        );
        assert_eq!(parse_input("exit rate by country"), Input::Question("exit rate by country"));
    }
}

mod cli;

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use clap::Parser as _;
use dewy_cc_compiler::compile_grammar;

use cli::Cli;

fn main() {
    std::process::exit(run(Cli::parse()));
}

/// The CLI's logic with no process-exit side effects, so it can be driven
/// from a test with a real grammar file on disk instead of a subprocess.
fn run(cli: Cli) -> i32 {
    let grammar_source = match fs::read_to_string(&cli.grammar) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: failed to read '{}': {}", cli.grammar.display(), e);
            return 1;
        }
    };

    let compiled = match compile_grammar(&grammar_source, &cli.start) {
        Ok(compiled) => compiled,
        Err(e) => {
            eprintln!("error: {e}");
            return 1;
        }
    };

    if compiled.diagnostics.has_errors() {
        eprint!("{}", compiled.diagnostics.printer(&grammar_source).render());
        return 1;
    }

    let input = match load_input(cli.input.as_deref()) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("error: failed to read input: {e}");
            return 1;
        }
    };

    let outcome = compiled.parse(&input);
    if !outcome.accepted {
        eprintln!(
            "parse failed: input rejected (furthest position reached: {})",
            outcome.furthest_position
        );
        return 2;
    }

    println!("accepted");
    0
}

fn load_input(path: Option<&Path>) -> io::Result<String> {
    match path {
        None => read_stdin(),
        Some(path) if path.as_os_str() == "-" => read_stdin(),
        Some(path) => fs::read_to_string(path),
    }
}

fn read_stdin() -> io::Result<String> {
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn grammar_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file created");
        write!(file, "{contents}").expect("written");
        file
    }

    #[test]
    fn accepts_matching_input_from_file() {
        let grammar = grammar_file("#r = 'a' 'b';");
        let input = grammar_file("ab");
        let cli = Cli { grammar: grammar.path().to_path_buf(), start: "r".into(), input: Some(input.path().to_path_buf()) };
        assert_eq!(run(cli), 0);
    }

    #[test]
    fn rejects_mismatched_input_from_file() {
        let grammar = grammar_file("#r = 'a' 'b';");
        let input = grammar_file("ac");
        let cli = Cli { grammar: grammar.path().to_path_buf(), start: "r".into(), input: Some(input.path().to_path_buf()) };
        assert_eq!(run(cli), 2);
    }

    #[test]
    fn missing_grammar_file_is_a_read_error() {
        let cli = Cli { grammar: "/nonexistent/path/to/grammar.dewy".into(), start: "r".into(), input: None };
        assert_eq!(run(cli), 1);
    }

    #[test]
    fn undefined_start_rule_is_a_compile_error() {
        let grammar = grammar_file("#r = 'a';");
        let cli = Cli { grammar: grammar.path().to_path_buf(), start: "missing".into(), input: Some(grammar.path().to_path_buf()) };
        assert_eq!(run(cli), 1);
    }
}

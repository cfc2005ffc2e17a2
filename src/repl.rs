use std::io::{self, BufRead, Write};

use log::{debug, info};

use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Runs one REPL submission against the persistent `interpreter`.
///
/// Returns the text to echo, if any: the value of a trailing bare
/// expression, unless that value is `none`.
pub fn eval_line(interpreter: &mut Interpreter, source: &str) -> Result<Option<String>> {
    match interpreter.run_source(source)? {
        Some(Value::None) | None => Ok(None),
        Some(value) => Ok(Some(value.to_string())),
    }
}

/// Net `{`/`}` balance of `source`, ignoring braces inside string literals
/// and comments. Positive means a block is still open.
pub fn open_braces(source: &str) -> i64 {
    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut in_comment = false;

    for c in source.chars() {
        if in_comment {
            in_comment = c != '\n';
            continue;
        }

        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '#' => in_comment = true,
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
    }

    depth
}

/// Interactive loop over `input`. Errors are reported on `output` and the
/// session continues; bindings persist between submissions. A submission
/// with unbalanced braces keeps reading continuation lines.
pub fn run<R: BufRead, W: Write>(
    interpreter: &mut Interpreter,
    mut input: R,
    mut output: W,
) -> io::Result<()> {
    info!("Starting REPL");

    writeln!(output, "Welcome to MathScript REPL")?;
    writeln!(output, "Type 'exit' or press Ctrl+D to quit")?;

    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() { ">>> " } else { "... " };
        write!(output, "{}", prompt)?;
        output.flush()?;

        let mut line = String::new();

        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            break;
        }

        if buffer.is_empty() {
            let trimmed = line.trim();

            if trimmed.is_empty() {
                continue;
            }

            if trimmed == "exit" || trimmed == "quit" {
                break;
            }
        }

        buffer.push_str(&line);

        if open_braces(&buffer) > 0 {
            continue;
        }

        debug!("REPL submission: {:?}", buffer);

        match eval_line(interpreter, &buffer) {
            Ok(Some(text)) => writeln!(output, "{}", text)?,
            Ok(None) => {}
            Err(e) => writeln!(output, "Error: {}", e)?,
        }

        buffer.clear();
    }

    info!("REPL finished");

    Ok(())
}

/// Runs the REPL on stdin / stdout.
pub fn start(interpreter: &mut Interpreter) -> io::Result<()> {
    let stdin = io::stdin();

    run(interpreter, stdin.lock(), io::stdout())
}

#[cfg(test)]
mod repl_tests {
    use std::io::{self, Cursor};

    use mathscript::repl::{eval_line, open_braces, run};
    use mathscript::{Builtins, Interpreter};

    fn interpreter() -> Interpreter {
        Interpreter::with_builtins(Builtins::standard(), Box::new(io::sink()))
    }

    fn transcript(input: &str) -> String {
        let mut interpreter = interpreter();
        let mut output: Vec<u8> = Vec::new();

        run(&mut interpreter, Cursor::new(input), &mut output).expect("REPL should not fail");

        String::from_utf8(output).expect("output should be UTF-8")
    }

    const BANNER: &str = "Welcome to MathScript REPL\nType 'exit' or press Ctrl+D to quit\n";

    #[test]
    fn echoes_expression_values_only() {
        let mut interpreter = interpreter();

        assert_eq!(eval_line(&mut interpreter, "x = 2").expect("assign"), None);
        assert_eq!(
            eval_line(&mut interpreter, "x * 3").expect("expression"),
            Some("6".to_string())
        );
        assert_eq!(eval_line(&mut interpreter, "print(x)").expect("print"), None);
        assert_eq!(
            eval_line(&mut interpreter, "\"a\" + \"b\"").expect("string"),
            Some("ab".to_string())
        );
    }

    #[test]
    fn brace_balance_ignores_strings_and_comments() {
        assert_eq!(open_braces("function f() {"), 1);
        assert_eq!(open_braces("if x { y = 1 }"), 0);
        assert_eq!(open_braces("s = \"{\" # {"), 0);
        assert_eq!(open_braces("s = \"\\\"{\""), 0);
        assert_eq!(open_braces("}"), -1);
    }

    #[test]
    fn session_keeps_bindings_and_survives_errors() {
        let input = "x = 2\nx * 3\nfunction f(a) {\n  return a + 1\n}\nf(x)\n1 / 0\nf(10)\nexit\n";

        assert_eq!(
            transcript(input),
            format!(
                "{}>>> >>> 6\n>>> ... ... >>> 3\n>>> Error: [line 1, column 3] Division by zero\n>>> 11\n>>> ",
                BANNER
            )
        );
    }

    #[test]
    fn blank_lines_are_skipped_and_eof_ends_the_session() {
        assert_eq!(
            transcript("\n1 + 1"),
            format!("{}>>> >>> 2\n>>> \n", BANNER)
        );
    }

    #[test]
    fn quit_also_ends_the_session() {
        assert_eq!(transcript("quit\n1\n"), format!("{}>>> ", BANNER));
    }
}

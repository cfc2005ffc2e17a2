#[cfg(test)]
mod parser_tests {
    use mathscript::ast_printer::AstPrinter;
    use mathscript::error::{ErrorKind, MathScriptError};
    use mathscript::expr::{BinaryOp, Expr};
    use mathscript::parser::{parse_source, Parser};
    use mathscript::scanner::tokenize;
    use mathscript::stmt::Stmt;
    use mathscript::token::{Position, Token};

    fn printed(source: &str) -> Vec<String> {
        parse_source(source)
            .unwrap_or_else(|e| panic!("{:?} failed to parse: {}", source, e))
            .iter()
            .map(AstPrinter::print_stmt)
            .collect()
    }

    fn printed_one(source: &str) -> String {
        let mut statements = printed(source);

        assert_eq!(statements.len(), 1, "expected one statement: {:?}", statements);

        statements.remove(0)
    }

    fn parse_error(source: &str) -> (String, String, Position) {
        match parse_source(source) {
            Err(MathScriptError::Parse {
                expected,
                found,
                pos,
            }) => (expected, found, pos),
            other => panic!("expected a parse error for {:?}, got {:?}", source, other),
        }
    }

    fn parse_error_from_tokens(tokens: &[Token<'_>]) -> (String, String, Position) {
        match Parser::new(tokens).parse() {
            Err(MathScriptError::Parse {
                expected,
                found,
                pos,
            }) => (expected, found, pos),
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        assert_eq!(printed_one("1 + 2 * 3"), "(+ 1 (* 2 3))");
        assert_eq!(printed_one("(1 + 2) * 3"), "(* (+ 1 2) 3)");
    }

    #[test]
    fn binary_operators_fold_left() {
        assert_eq!(printed_one("8 - 3 - 2"), "(- (- 8 3) 2)");
        assert_eq!(printed_one("16 / 4 / 2"), "(/ (/ 16 4) 2)");
        assert_eq!(printed_one("2 ^ 3 ^ 2"), "(^ (^ 2 3) 2)");
        assert_eq!(printed_one("a < b == true"), "(== (< a b) true)");
    }

    #[test]
    fn unary_binds_tighter_than_power_and_nests() {
        assert_eq!(printed_one("-2 ^ 2"), "(^ (- 2) 2)");
        assert_eq!(printed_one("- - 3"), "(- (- 3))");
        assert_eq!(printed_one("+x"), "(+ x)");
    }

    #[test]
    fn logical_precedence() {
        assert_eq!(printed_one("not a and b or c"), "(or (and (not a) b) c)");
        assert_eq!(printed_one("a or b and c"), "(or a (and b c))");
        assert_eq!(printed_one("1 + 1 == 2 and x ≤ 3"), "(and (== (+ 1 1) 2) (<= x 3))");
    }

    #[test]
    fn parenthesized_expression_resets_precedence() {
        let statements = parse_source("(1 + 2) * 3").expect("should parse");

        match &statements[0] {
            Stmt::Expression(Expr::Binary {
                op: BinaryOp::Multiply,
                left,
                ..
            }) => assert!(matches!(**left, Expr::Binary { op: BinaryOp::Add, .. })),
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn assignment_needs_identifier_then_equals() {
        assert_eq!(printed_one("x = 1 + 2"), "(= x (+ 1 2))");
        assert_eq!(printed_one("x == 1"), "(== x 1)");
        assert_eq!(printed_one("x"), "x");
    }

    #[test]
    fn call_versus_variable_read() {
        assert_eq!(printed_one("f(1, x, 2 + 3)"), "(call f 1 x (+ 2 3))");
        assert_eq!(printed_one("f()"), "(call f)");
        assert_eq!(printed_one("f"), "f");
    }

    #[test]
    fn literals() {
        assert_eq!(printed("1.5 \"hi\" true false"), vec!["1.5", "\"hi\"", "true", "false"]);
    }

    #[test]
    fn function_definitions() {
        assert_eq!(
            printed_one("function add(a, b) { return a + b }"),
            "(function add (a b) {(return (+ a b))})"
        );
        assert_eq!(printed_one("function f() { return }"), "(function f () {(return)})");
        assert_eq!(printed_one("function f() {}"), "(function f () {})");
    }

    #[test]
    fn if_else_chains() {
        assert_eq!(
            printed_one("if x { y = 1 } else if z { y = 2 } else { y = 3 }"),
            "(if x {(= y 1)} {(if z {(= y 2)} {(= y 3)})})"
        );
        assert_eq!(printed_one("if x { }"), "(if x {})");
    }

    #[test]
    fn loops() {
        assert_eq!(
            printed_one("while x < 3 { x = x + 1 }"),
            "(while (< x 3) {(= x (+ x 1))})"
        );
        assert_eq!(
            printed_one("for i in range(3) { print(i) }"),
            "(for i (call range 3) {(call print i)})"
        );
    }

    #[test]
    fn aggregates() {
        assert_eq!(printed_one("∑(i = 1 to 10) (i ^ 2)"), "(∑ i 1 10 (^ i 2))");
        assert_eq!(printed_one("∏(k = 1 to n) k"), "(∏ k 1 n k)");
        assert_eq!(printed_one("∫(x = 0 to π) sin(x) dx"), "(∫ x 0 π (call sin x))");
        assert_eq!(
            printed("area = ∫(t = 0 to 1) t dt\ny = 2"),
            vec!["(= area (∫ t 0 1 t))", "(= y 2)"]
        );
    }

    #[test]
    fn statements_need_no_separator_but_accept_semicolons() {
        assert_eq!(printed("x = 1 y = 2"), vec!["(= x 1)", "(= y 2)"]);
        assert_eq!(printed("x = 1;; y = 2;"), vec!["(= x 1)", "(= y 2)"]);
        assert_eq!(
            printed("function f(x) { y = x + 1; return y }"),
            vec!["(function f (x) {(= y (+ x 1)) (return y)})"]
        );
    }

    #[test]
    fn empty_program_parses_to_nothing() {
        assert!(parse_source("").expect("should parse").is_empty());
        assert!(parse_source("# only a comment\n").expect("should parse").is_empty());
    }

    #[test]
    fn parser_accepts_token_slices() {
        let tokens = tokenize("a = 1").expect("should tokenize");
        let statements = Parser::new(&tokens).parse().expect("should parse");

        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn missing_operand_reports_end_of_input() {
        let (expected, found, _) = parse_error("1 +");

        assert_eq!(expected, "expression");
        assert_eq!(found, "end of input");
    }

    #[test]
    fn unterminated_block_is_fatal() {
        let (expected, found, _) = parse_error("if x { y = 1");

        assert_eq!(expected, "'}' to close block");
        assert_eq!(found, "end of input");
    }

    #[test]
    fn unclosed_parameter_list() {
        let (expected, found, pos) = parse_error("function f(x { }");

        assert_eq!(expected, "')' after parameters");
        assert_eq!(found, "'{'");
        assert_eq!(pos, Position::new(1, 14));
    }

    #[test]
    fn other_grammar_violations() {
        assert_eq!(parse_error("(1 + 2").0, "')' after expression");
        assert_eq!(parse_error("for 1 in x {}").0, "loop variable after 'for'");
        assert_eq!(parse_error("for i x {}").0, "'in' after loop variable");
        assert_eq!(parse_error("while x y = 1").0, "'{' to open block");
        assert_eq!(parse_error("∑(i = 1, 3) i").0, "'to' between bounds");
        assert_eq!(parse_error("f(1, 2").0, "')' after arguments");
    }

    #[test]
    fn parse_errors_carry_position() {
        let (_, found, pos) = parse_error("x = 1\ny = )");

        assert_eq!(found, "')'");
        assert_eq!(pos, Position::new(2, 5));
    }

    #[test]
    fn moderate_nesting_parses() {
        let source = format!("x = {}1{}", "(".repeat(100), ")".repeat(100));

        assert_eq!(printed_one(&source), "(= x 1)");
        assert_eq!(printed_one(&format!("{}1", "- ".repeat(100))).len(), 100 * 3 + 1 + 100);
    }

    #[test]
    fn deeply_nested_parentheses_are_a_parse_error() {
        let source = format!("x = {}1{}", "(".repeat(20_000), ")".repeat(20_000));
        let (expected, found, _) = parse_error(&source);

        assert_eq!(expected, "at most 256 nested expressions");
        assert_eq!(found, "'('");
    }

    #[test]
    fn long_unary_chains_are_a_parse_error() {
        let (expected, _, _) = parse_error(&format!("{}1", "-".repeat(20_000)));

        assert_eq!(expected, "at most 256 nested unary operators");
    }

    #[test]
    fn deeply_nested_blocks_are_a_parse_error() {
        let source = format!("{}{}", "if true { ".repeat(5_000), "}".repeat(5_000));

        assert!(parse_error(&source).0.starts_with("at most 256 nested"));
    }

    #[test]
    fn overlong_operator_chains_are_a_parse_error() {
        let source = format!("1{}", " + 1".repeat(20_000));

        assert_eq!(parse_error(&source).0, "at most 256 nested operators");
        assert!(parse_source(&format!("1{}", " + 1".repeat(100))).is_ok());
    }

    #[test]
    fn token_slice_without_end_of_input_is_rejected() {
        assert_eq!(parse_error_from_tokens(&[]).0, "token sequence ending in end of input");

        let tokens = tokenize("a = 1").expect("should tokenize");
        let without_end = &tokens[..tokens.len() - 1];

        assert_eq!(
            parse_error_from_tokens(without_end).0,
            "token sequence ending in end of input"
        );
    }

    #[test]
    fn lex_errors_surface_through_parse_source() {
        let err = parse_source("x = 1 @").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Lex);
    }
}

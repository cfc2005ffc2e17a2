#[cfg(test)]
mod builtins_tests {
    use std::io;

    use mathscript::builtins::MAX_RANGE_LEN;
    use mathscript::error::{ErrorKind, MathScriptError, NativeError};
    use mathscript::value::Arity;
    use mathscript::{Builtins, Interpreter, Value};

    fn interpreter() -> Interpreter {
        Interpreter::with_builtins(Builtins::standard(), Box::new(io::sink()))
    }

    fn eval(source: &str) -> Value {
        interpreter()
            .run_source(source)
            .unwrap_or_else(|e| panic!("{:?} failed: {}", source, e))
            .expect("source should end with an expression")
    }

    fn eval_number(source: &str) -> f64 {
        match eval(source) {
            Value::Number(n) => n,
            other => panic!("{:?} evaluated to {:?}", source, other),
        }
    }

    fn eval_err(source: &str) -> MathScriptError {
        interpreter()
            .run_source(source)
            .expect_err("source should fail")
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    fn numbers(items: &[f64]) -> Value {
        Value::List(items.iter().map(|n| Value::Number(*n)).collect())
    }

    #[test]
    fn constants() {
        assert_close(eval_number("pi"), std::f64::consts::PI);
        assert_close(eval_number("π"), std::f64::consts::PI);
        assert_close(eval_number("e"), std::f64::consts::E);
    }

    #[test]
    fn trigonometry_and_friends() {
        assert_close(eval_number("sin(0)"), 0.0);
        assert_close(eval_number("cos(0)"), 1.0);
        assert_close(eval_number("sin(pi / 2)"), 1.0);
        assert_close(eval_number("atan(1) * 4"), std::f64::consts::PI);
        assert_close(eval_number("asin(1)"), std::f64::consts::FRAC_PI_2);
        assert_close(eval_number("tanh(0)"), 0.0);
        assert_close(eval_number("exp(1)"), std::f64::consts::E);
    }

    #[test]
    fn rounding_and_absolute_value() {
        assert_eq!(eval_number("abs(-3)"), 3.0);
        assert_eq!(eval_number("floor(2.7)"), 2.0);
        assert_eq!(eval_number("ceil(2.1)"), 3.0);
        assert_eq!(eval_number("round(2.5)"), 3.0);
        assert_eq!(eval_number("floor(-2.5)"), -3.0);
    }

    #[test]
    fn square_root_and_its_domain() {
        assert_eq!(eval_number("sqrt(16)"), 4.0);

        match eval_err("sqrt(-1)") {
            MathScriptError::Domain { name, message, .. } => {
                assert_eq!(name, "sqrt");
                assert_eq!(message, "math domain error");
            }
            other => panic!("unexpected error {:?}", other),
        }

        assert_eq!(eval_err("asin(2)").kind(), ErrorKind::Domain);
        assert_eq!(eval_err("acos(-1.5)").kind(), ErrorKind::Domain);
    }

    #[test]
    fn logarithms() {
        assert_close(eval_number("log(e)"), 1.0);
        assert_close(eval_number("log(8, 2)"), 3.0);
        assert_close(eval_number("log(1000, 10)"), 3.0);

        assert_eq!(eval_err("log(0)").kind(), ErrorKind::Domain);
        assert_eq!(eval_err("log(-2, 10)").kind(), ErrorKind::Domain);

        match eval_err("log(8, 1)") {
            MathScriptError::Domain { message, .. } => {
                assert_eq!(message, "invalid logarithm base")
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn pow_min_max() {
        assert_eq!(eval_number("pow(2, 10)"), 1024.0);
        assert_eq!(eval_number("min(3, 1, 2)"), 1.0);
        assert_eq!(eval_number("max(3, 1, 2)"), 3.0);
        assert_eq!(eval_number("max(-4)"), -4.0);
        assert_eq!(eval_err("min()").kind(), ErrorKind::Arity);
    }

    #[test]
    fn range_forms() {
        assert_eq!(eval("range(3)"), numbers(&[0.0, 1.0, 2.0]));
        assert_eq!(eval("range(1, 4)"), numbers(&[1.0, 2.0, 3.0]));
        assert_eq!(eval("range(5, 0, -2)"), numbers(&[5.0, 3.0, 1.0]));
        assert_eq!(eval("range(0, 1, 0.5)"), numbers(&[0.0, 0.5]));
        assert_eq!(eval("range(3, 1)"), numbers(&[]));
        assert_eq!(eval_err("range(1, 2, 0)").kind(), ErrorKind::Domain);
    }

    #[test]
    fn range_near_the_limits_of_f64_terminates() {
        match eval("range(9007199254740992, 9007199254740994)") {
            Value::List(items) => assert_eq!(items.len(), 2),
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn oversized_ranges_are_rejected() {
        for source in [
            "range(1000000000000)",
            "range(0, 10 ^ 300)",
            "range(0, 1, 0.000000001)",
            "range(10 ^ 308, -(10 ^ 308), -1)",
        ] {
            let err = eval_err(source);

            assert_eq!(err.kind(), ErrorKind::Domain, "{}", source);
            assert!(err.to_string().contains("exceeds the limit"), "{}", err);
        }

        assert_eq!(
            eval_number(&format!("len(range({}))", MAX_RANGE_LEN)),
            MAX_RANGE_LEN as f64
        );
    }

    #[test]
    fn len_str_num() {
        assert_eq!(eval_number("len(\"héllo\")"), 5.0);
        assert_eq!(eval_number("len(range(4))"), 4.0);
        assert_eq!(eval("str(3)"), Value::String("3".to_string()));
        assert_eq!(eval("str(2.5) + \"!\""), Value::String("2.5!".to_string()));
        assert_eq!(eval("str(range(2))"), Value::String("[0, 1]".to_string()));
        assert_eq!(eval_number("num(\" 2.5 \")"), 2.5);
        assert_eq!(eval_number("num(7)"), 7.0);

        assert_eq!(eval_err("len(3)").kind(), ErrorKind::Type);
        assert_eq!(eval_err("num(\"abc\")").kind(), ErrorKind::Domain);
        assert_eq!(eval_err("num(true)").kind(), ErrorKind::Type);
    }

    #[test]
    fn print_returns_none() {
        assert_eq!(eval("print(\"quiet\")"), Value::None);
    }

    #[test]
    fn builtin_arity_is_checked() {
        match eval_err("sin(1, 2)") {
            MathScriptError::Arity {
                name,
                expected,
                found,
                ..
            } => {
                assert_eq!(name, "sin");
                assert_eq!(expected, "1");
                assert_eq!(found, 2);
            }
            other => panic!("unexpected error {:?}", other),
        }

        assert_eq!(eval_err("log()").kind(), ErrorKind::Arity);
        assert_eq!(eval_err("range(1, 2, 3, 4)").kind(), ErrorKind::Arity);
    }

    #[test]
    fn argument_types_are_checked() {
        let err = eval_err("sin(\"a\")");

        assert_eq!(err.kind(), ErrorKind::Type);
        assert!(err.to_string().contains("sin: argument 1 must be a number"), "{}", err);
    }

    #[test]
    fn registry_lookup_and_names() {
        let builtins = Builtins::standard();

        assert!(builtins.contains("sqrt"));
        assert!(builtins.contains("π"));
        assert!(!builtins.contains("nope"));
        assert!(matches!(builtins.get("print"), Some(Value::Native(_))));

        let names = builtins.names();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn hosts_can_supply_their_own_registry() {
        let mut builtins = Builtins::empty();
        builtins.register("twice", Arity::Exact(1), |args, _| match args.first() {
            Some(Value::Number(n)) => Ok(Value::Number(n * 2.0)),
            _ => Err(NativeError::Type("expected a number".to_string())),
        });
        builtins.register_constant("answer", Value::Number(42.0));

        let mut interpreter = Interpreter::with_builtins(builtins, Box::new(io::sink()));

        assert_eq!(
            interpreter.run_source("twice(answer)").expect("should run"),
            Some(Value::Number(84.0))
        );
        assert_eq!(
            interpreter.run_source("print(1)").unwrap_err().kind(),
            ErrorKind::UndefinedName
        );
    }
}

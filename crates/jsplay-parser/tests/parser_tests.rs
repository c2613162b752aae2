//! Parser tests.
//!
//! Covers: declarations and destructuring, functions and arrows, control
//! flow statements, object/array/template literals, calls and members,
//! error messages, and determinism.

use jsplay_lexer::Lexer;
use jsplay_parser::{parse_source, ParseResult, Parser};
use jsplay_types::ast::*;
use jsplay_types::{ErrorCode, SourceFile};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

/// Parse source and return the result (program + errors).
fn parse(source: &str) -> ParseResult {
    let sf = SourceFile::new("test.js", source);
    let lex = Lexer::new(&sf).lex();
    Parser::new(lex.tokens, &sf).parse()
}

/// Parse source and return the program, panicking if there are errors.
fn parse_ok(source: &str) -> Program {
    let result = parse(source);
    if result.errors.has_errors() {
        for e in &result.errors.errors {
            eprintln!("  ERROR: {} ({})", e.message, e.code);
        }
        panic!("unexpected parse errors (see above)");
    }
    result.program.expect("no program returned")
}

/// Parse source and return the first error message.
fn first_error(source: &str) -> String {
    parse(source)
        .errors
        .first()
        .map(|e| e.message.clone())
        .unwrap_or_default()
}

/// The expression of a single expression statement.
fn expr_of(source: &str) -> Expr {
    let prog = parse_ok(source);
    match prog.body.into_iter().next() {
        Some(Stmt::Expr(stmt)) => stmt.expr,
        other => panic!("expected expression statement, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Declarations
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_empty_program() {
    assert!(parse_ok("").body.is_empty());
    assert!(parse_ok("// only a comment").body.is_empty());
}

#[test]
fn test_var_let_const() {
    let prog = parse_ok("var a = 1; let b; const c = 'x';");
    assert_eq!(prog.body.len(), 3);
    let kinds: Vec<VarKind> = prog
        .body
        .iter()
        .map(|s| match s {
            Stmt::Var(decl) => decl.kind,
            other => panic!("expected declaration, got {other:?}"),
        })
        .collect();
    assert_eq!(kinds, vec![VarKind::Var, VarKind::Let, VarKind::Const]);
}

#[test]
fn test_multiple_declarators() {
    let prog = parse_ok("let a = 1, b, c = a + 1;");
    let Stmt::Var(decl) = &prog.body[0] else {
        panic!("expected declaration");
    };
    assert_eq!(decl.declarations.len(), 3);
    assert!(decl.declarations[1].init.is_none());
}

#[test]
fn test_array_destructuring_declaration() {
    let prog = parse_ok("const [count, setCount] = useState(0);");
    let Stmt::Var(decl) = &prog.body[0] else {
        panic!("expected declaration");
    };
    let target = &decl.declarations[0].target;
    assert_eq!(target.bound_names(), vec!["count", "setCount"]);
    assert!(matches!(target, Pattern::Array(_)));
}

#[test]
fn test_object_destructuring_with_defaults_and_rest() {
    let prog = parse_ok("const { a, b: renamed, c = 3, ...others } = obj;");
    let Stmt::Var(decl) = &prog.body[0] else {
        panic!("expected declaration");
    };
    let Pattern::Object(pattern) = &decl.declarations[0].target else {
        panic!("expected object pattern");
    };
    assert_eq!(pattern.props.len(), 3);
    assert!(pattern.props[2].value.default.is_some());
    assert_eq!(pattern.rest.as_ref().map(|r| r.name.as_str()), Some("others"));
    assert_eq!(
        decl.declarations[0].target.bound_names(),
        vec!["a", "renamed", "c", "others"]
    );
}

#[test]
fn test_array_pattern_holes_and_rest() {
    let prog = parse_ok("let [, second, ...tail] = list;");
    let Stmt::Var(decl) = &prog.body[0] else {
        panic!("expected declaration");
    };
    let Pattern::Array(pattern) = &decl.declarations[0].target else {
        panic!("expected array pattern");
    };
    assert_eq!(pattern.elements.len(), 2);
    assert!(pattern.elements[0].is_none());
    assert!(pattern.rest.is_some());
}

#[test]
fn test_const_without_initializer() {
    assert_eq!(first_error("const x;"), "Missing initializer in const declaration");
}

#[test]
fn test_destructuring_without_initializer() {
    assert_eq!(
        first_error("let [a, b];"),
        "Missing initializer in destructuring declaration"
    );
}

// ─────────────────────────────────────────────────────────────────────
// Functions
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_function_declaration_keeps_source() {
    let source = "function greet(name) {\n  return 'hi ' + name;\n}";
    let prog = parse_ok(source);
    let Stmt::Function(def) = &prog.body[0] else {
        panic!("expected function");
    };
    assert_eq!(def.name.as_ref().map(|n| n.name.as_str()), Some("greet"));
    assert_eq!(def.params.len(), 1);
    assert!(!def.is_arrow);
    assert_eq!(def.source, source);
}

#[test]
fn test_function_params_default_and_rest() {
    let prog = parse_ok("function f(a, b = 2, ...rest) {}");
    let Stmt::Function(def) = &prog.body[0] else {
        panic!("expected function");
    };
    assert_eq!(def.params.len(), 2);
    assert!(def.params[1].default.is_some());
    assert!(def.rest.is_some());
}

#[test]
fn test_arrow_single_param() {
    let expr = expr_of("x => x * 2");
    let ExprKind::Function(def) = &expr.kind else {
        panic!("expected arrow");
    };
    assert!(def.is_arrow);
    assert_eq!(def.params.len(), 1);
    assert!(matches!(def.body, FunctionBody::Expr(_)));
    assert_eq!(def.source, "x => x * 2");
}

#[test]
fn test_arrow_with_block_body() {
    let expr = expr_of("(a, b) => { return a + b; }");
    let ExprKind::Function(def) = &expr.kind else {
        panic!("expected arrow");
    };
    assert_eq!(def.params.len(), 2);
    assert!(matches!(def.body, FunctionBody::Block(_)));
}

#[test]
fn test_arrow_no_params_and_destructured_params() {
    let expr = expr_of("() => ({ ok: true })");
    assert!(matches!(expr.kind, ExprKind::Function(_)));
    let expr = expr_of("({ id }, [first]) => id + first");
    let ExprKind::Function(def) = &expr.kind else {
        panic!("expected arrow");
    };
    assert!(matches!(def.params[0].target, Pattern::Object(_)));
    assert!(matches!(def.params[1].target, Pattern::Array(_)));
}

#[test]
fn test_arrow_as_argument() {
    let expr = expr_of("useEffect(() => {\n  console.log('mounted');\n}, []);");
    let ExprKind::Call { args, .. } = &expr.kind else {
        panic!("expected call");
    };
    assert_eq!(args.len(), 2);
    assert!(matches!(&args[0], Argument::Expr(e) if matches!(e.kind, ExprKind::Function(_))));
    assert!(matches!(&args[1], Argument::Expr(e) if matches!(e.kind, ExprKind::Array(_))));
}

#[test]
fn test_function_expression() {
    let expr = expr_of("(function named() { return 1; })");
    let ExprKind::Function(def) = &expr.kind else {
        panic!("expected function expression");
    };
    assert_eq!(def.name.as_ref().map(|n| n.name.as_str()), Some("named"));
}

#[test]
fn test_return_at_top_level() {
    let prog = parse_ok("return 42;");
    assert!(matches!(&prog.body[0], Stmt::Return(r) if r.value.is_some()));
}

// ─────────────────────────────────────────────────────────────────────
// Control flow
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_if_else_chain() {
    let prog = parse_ok("if (a) b(); else if (c) d(); else { e(); }");
    let Stmt::If(stmt) = &prog.body[0] else {
        panic!("expected if");
    };
    assert!(matches!(stmt.alternate.as_deref(), Some(Stmt::If(_))));
}

#[test]
fn test_classic_for() {
    let prog = parse_ok("for (let i = 0; i < 3; i++) { console.log(i); }");
    let Stmt::For(stmt) = &prog.body[0] else {
        panic!("expected for");
    };
    assert!(matches!(stmt.init, Some(ForInit::Var(_))));
    assert!(stmt.test.is_some());
    assert!(stmt.update.is_some());
}

#[test]
fn test_for_with_empty_clauses() {
    let prog = parse_ok("for (;;) { break; }");
    let Stmt::For(stmt) = &prog.body[0] else {
        panic!("expected for");
    };
    assert!(stmt.init.is_none() && stmt.test.is_none() && stmt.update.is_none());
}

#[test]
fn test_for_of_and_for_in() {
    let prog = parse_ok("for (const item of items) {}\nfor (let key in obj) {}");
    let Stmt::ForOf(of) = &prog.body[0] else {
        panic!("expected for-of");
    };
    assert_eq!(of.kind, IterKind::Of);
    assert!(matches!(of.binding, ForBinding::Decl(VarKind::Const, _)));
    let Stmt::ForOf(inn) = &prog.body[1] else {
        panic!("expected for-in");
    };
    assert_eq!(inn.kind, IterKind::In);
}

#[test]
fn test_for_of_destructuring_and_existing_target() {
    let prog = parse_ok("for (const [k, v] of Object.entries(o)) {}\nfor (x of xs) {}");
    let Stmt::ForOf(first) = &prog.body[0] else {
        panic!("expected for-of");
    };
    assert!(matches!(first.binding, ForBinding::Decl(_, Pattern::Array(_))));
    let Stmt::ForOf(second) = &prog.body[1] else {
        panic!("expected for-of");
    };
    assert!(matches!(second.binding, ForBinding::Target(_)));
}

#[test]
fn test_in_operator_inside_for_init_parens() {
    let prog = parse_ok("for (let ok = ('a' in o); ok; ok = false) {}");
    assert!(matches!(&prog.body[0], Stmt::For(_)));
}

#[test]
fn test_while_and_do_while() {
    let prog = parse_ok("while (n > 0) n--;\ndo { n++; } while (n < 3)\nx");
    assert!(matches!(&prog.body[0], Stmt::While(_)));
    assert!(matches!(&prog.body[1], Stmt::DoWhile(_)));
    assert_eq!(prog.body.len(), 3);
}

#[test]
fn test_try_catch_finally() {
    let prog = parse_ok("try { risky(); } catch (err) { log(err.message); } finally { done(); }");
    let Stmt::Try(stmt) = &prog.body[0] else {
        panic!("expected try");
    };
    assert!(stmt.handler.as_ref().is_some_and(|h| h.param.is_some()));
    assert!(stmt.finalizer.is_some());
}

#[test]
fn test_catch_without_binding() {
    let prog = parse_ok("try { a(); } catch { b(); }");
    let Stmt::Try(stmt) = &prog.body[0] else {
        panic!("expected try");
    };
    assert!(stmt.handler.as_ref().is_some_and(|h| h.param.is_none()));
}

#[test]
fn test_try_without_handler_is_error() {
    assert_eq!(first_error("try { a(); }"), "Missing catch or finally after try");
}

#[test]
fn test_break_outside_loop() {
    let result = parse("break;");
    let err = result.errors.first().expect("error expected");
    assert_eq!(err.message, "Illegal break statement");
    assert_eq!(err.code, ErrorCode::ILLEGAL_STATEMENT);
}

#[test]
fn test_continue_inside_function_inside_loop_is_illegal() {
    assert_eq!(
        first_error("while (true) { items.forEach(() => { continue; }); }"),
        "Illegal continue statement: no surrounding iteration statement"
    );
}

#[test]
fn test_throw_statement() {
    let prog = parse_ok("throw new Error('x');");
    let Stmt::Throw(stmt) = &prog.body[0] else {
        panic!("expected throw");
    };
    assert!(matches!(stmt.value.kind, ExprKind::New { .. }));
}

// ─────────────────────────────────────────────────────────────────────
// Literals
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_object_literal_forms() {
    let expr = expr_of("({ a: 1, b, [k]: 2, 'quoted': 3, 4: 'four', method() { return 1; }, ...rest })");
    let ExprKind::Object(props) = &expr.kind else {
        panic!("expected object");
    };
    assert_eq!(props.len(), 7);
    assert!(matches!(&props[1], PropDef::Shorthand(id) if id.name == "b"));
    assert!(matches!(&props[2], PropDef::KeyValue(PropKey::Computed(_), _)));
    assert!(matches!(&props[4], PropDef::KeyValue(PropKey::Static(k), _) if k == "4"));
    assert!(matches!(
        &props[5],
        PropDef::KeyValue(PropKey::Static(k), Expr { kind: ExprKind::Function(_), .. }) if k == "method"
    ));
    assert!(matches!(&props[6], PropDef::Spread(_)));
}

#[test]
fn test_keyword_property_names() {
    let expr = expr_of("({ default: 1, new: 2 }).new");
    assert!(matches!(expr.kind, ExprKind::Member { .. }));
}

#[test]
fn test_array_literal_with_spread_and_holes() {
    let expr = expr_of("[1, , ...rest, 2]");
    let ExprKind::Array(elems) = &expr.kind else {
        panic!("expected array");
    };
    assert_eq!(elems.len(), 4);
    assert!(matches!(elems[1], ArrayElem::Hole));
    assert!(matches!(elems[2], ArrayElem::Spread(_)));
}

#[test]
fn test_trailing_commas() {
    parse_ok("const a = [1, 2,]; const o = { x: 1, }; f(a, b,);");
}

#[test]
fn test_template_literal_parts() {
    let expr = expr_of("`Count: ${count} of ${total}`");
    let ExprKind::Template(parts) = &expr.kind else {
        panic!("expected template");
    };
    assert_eq!(parts.len(), 4);
    assert!(matches!(&parts[0], TemplatePart::Literal(s) if s == "Count: "));
    assert!(matches!(&parts[1], TemplatePart::Expr(_)));
    assert!(matches!(&parts[2], TemplatePart::Literal(s) if s == " of "));
}

// ─────────────────────────────────────────────────────────────────────
// Calls & members
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_method_call_chain() {
    let expr = expr_of("items.filter(x => x > 1).map(x => x * 2)");
    let ExprKind::Call { callee, args, .. } = &expr.kind else {
        panic!("expected call");
    };
    assert_eq!(args.len(), 1);
    assert!(matches!(&callee.kind, ExprKind::Member { property: MemberKey::Name(n), .. } if n == "map"));
}

#[test]
fn test_new_with_member_callee() {
    let expr = expr_of("new Date().getTime()");
    let ExprKind::Call { callee, .. } = &expr.kind else {
        panic!("expected call");
    };
    let ExprKind::Member { object, .. } = &callee.kind else {
        panic!("expected member");
    };
    assert!(matches!(object.kind, ExprKind::New { .. }));
}

#[test]
fn test_new_without_arguments() {
    let expr = expr_of("new Date");
    assert!(matches!(&expr.kind, ExprKind::New { args, .. } if args.is_empty()));
}

#[test]
fn test_spread_arguments() {
    let expr = expr_of("Math.max(...values, 0)");
    let ExprKind::Call { args, .. } = &expr.kind else {
        panic!("expected call");
    };
    assert!(matches!(args[0], Argument::Spread(_)));
}

#[test]
fn test_optional_chain_is_wrapped() {
    let expr = expr_of("user?.profile.name");
    let ExprKind::OptionalChain(inner) = &expr.kind else {
        panic!("expected optional chain");
    };
    let ExprKind::Member { object, optional, .. } = &inner.kind else {
        panic!("expected member");
    };
    assert!(!optional);
    assert!(matches!(object.kind, ExprKind::Member { optional: true, .. }));
}

#[test]
fn test_optional_call_and_index() {
    let expr = expr_of("callback?.(1)");
    let ExprKind::OptionalChain(inner) = &expr.kind else {
        panic!("expected optional chain");
    };
    assert!(matches!(inner.kind, ExprKind::Call { optional: true, .. }));
    let expr = expr_of("list?.[0]");
    assert!(matches!(expr.kind, ExprKind::OptionalChain(_)));
}

// ─────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_unexpected_closing_brace() {
    assert_eq!(first_error("let x = 1;\n}"), "Unexpected token '}'");
}

#[test]
fn test_unexpected_end_of_input() {
    let result = parse("function f() {");
    let err = result.errors.first().expect("error expected");
    assert_eq!(err.message, "Unexpected end of input");
    assert_eq!(err.code, ErrorCode::UNEXPECTED_END);
}

#[test]
fn test_missing_semicolon_on_same_line() {
    assert_eq!(first_error("let a = 1 let b = 2"), "Unexpected token 'let'");
}

#[test]
fn test_unexpected_identifier() {
    assert_eq!(first_error("let x = 1 y"), "Unexpected identifier 'y'");
}

#[test]
fn test_invalid_assignment_target() {
    let result = parse("1 = x;");
    let err = result.errors.first().expect("error expected");
    assert_eq!(err.message, "Invalid left-hand side in assignment");
    assert_eq!(err.code, ErrorCode::INVALID_ASSIGNMENT_TARGET);
}

#[test]
fn test_error_position() {
    let result = parse("let a = 1;\nlet b = );");
    let err = result.errors.first().expect("error expected");
    assert_eq!(err.span.start_line, 2);
    assert_eq!(err.span.start_col, 9);
    assert_eq!(err.source_line, "let b = );");
}

#[test]
fn test_errors_drop_program() {
    let result = parse("let = ;");
    assert!(result.program.is_none());
    assert!(result.errors.has_errors());
}

#[test]
fn test_parse_source_reports_lexer_errors_first() {
    let sf = SourceFile::new("test.js", "let s = 'unterminated\n}");
    let result = parse_source(&sf);
    assert!(result.program.is_none());
    assert_eq!(
        result.errors.first().map(|e| e.message.as_str()),
        Some("Invalid or unexpected token")
    );
}

// ─────────────────────────────────────────────────────────────────────
// Realistic program
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_effect_with_cleanup_program() {
    let prog = parse_ok(
        r#"
const [seconds, setSeconds] = useState(0);

useEffect(() => {
  console.log('타이머 시작');
  const intervalId = setInterval(() => {
    setSeconds(prev => prev + 1);
  }, 1000);

  return () => {
    clearInterval(intervalId);
    console.log('타이머 정리');
  };
}, []);

console.log(`Seconds: ${seconds}`)
"#,
    );
    assert_eq!(prog.body.len(), 3);
}

// ─────────────────────────────────────────────────────────────────────
// Determinism
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_determinism_100_iterations() {
    let source = "const { a = 1, ...rest } = obj;\nfor (const [k, v] of Object.entries(rest)) console.log(`${k}=${v}`)";
    let first = parse_ok(source);
    for _ in 0..100 {
        assert_eq!(parse_ok(source), first);
    }
}

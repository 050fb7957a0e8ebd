/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 */

use super::*;

fn parse(text: &str) -> SourceFile {
    parse_source(text, "test.ts").unwrap()
}

fn only_function(text: &str) -> FunctionDecl {
    parse(text).functions().next().cloned().unwrap()
}

#[test]
fn test_parse_exported_function_with_destructured_param() {
    let function = only_function(
        r#"export function getDiscount({country}: {country: string}): number {
  if (country === "US") {
    return 0.1;
  }
  return 0;
}"#,
    );
    assert_eq!(function.name.name, "getDiscount");
    assert!(function.exported);
    assert!(!function.is_async);
    assert_eq!(function.params.len(), 1);
    match &function.params[0].pattern {
        ParamPattern::Object(names) => assert_eq!(names[0].name, "country"),
        other => panic!("Expected object pattern, got {other:?}"),
    }
    assert_eq!(
        function.return_type.as_ref().map(|t| &t.kind),
        Some(&TypeKind::Number)
    );
    assert_eq!(function.body.stmts.len(), 2);
    assert!(matches!(function.body.stmts[0].kind, StmtKind::If { .. }));
    assert!(matches!(
        function.body.stmts[1].kind,
        StmtKind::Return(Some(Expr {
            kind: ExprKind::Number(n),
            ..
        })) if n == 0.0
    ));
}

#[test]
fn test_params_span_covers_parameter_text() {
    let text = "function getA({ env }: { env: string }): boolean { return true; }";
    let file = parse(text);
    let function = file.functions().next().unwrap();
    assert_eq!(file.slice(function.params_span), "{ env }: { env: string }");
}

#[test]
fn test_jsdoc_attached_to_function() {
    let function = only_function(
        "/** Enables the new checkout. */\nexport function getCheckout(): boolean { return false; }",
    );
    assert_eq!(function.doc.as_deref(), Some("Enables the new checkout."));
}

#[test]
fn test_imports_are_skipped() {
    let file = parse(
        "import { bucket } from \"@lekko/js-sdk\";\nimport type { X } from './x'\nexport function getA(): boolean { return true; }",
    );
    assert_eq!(file.items.len(), 3);
    assert!(matches!(file.items[0], Item::Import(_)));
    assert!(matches!(file.items[1], Item::Import(_)));
    assert_eq!(file.functions().count(), 1);
}

#[test]
fn test_interface_members() {
    let file = parse(
        "export interface Theme {\n  primary: string;\n  sizes?: number[],\n  flags: true | false | undefined\n  nested: { a: boolean }\n}",
    );
    let interface = file.interfaces().next().unwrap();
    assert_eq!(interface.name.name, "Theme");
    assert_eq!(interface.members.len(), 4);
    match &interface.members[1].kind {
        MemberKind::Property { name, optional, ty } => {
            assert_eq!(name, "sizes");
            assert!(optional);
            assert!(matches!(ty.kind, TypeKind::Array(_)));
        }
        other => panic!("Expected property, got {other:?}"),
    }
    match &interface.members[2].kind {
        MemberKind::Property { ty, .. } => match &ty.kind {
            TypeKind::Union(members) => assert_eq!(members.len(), 3),
            other => panic!("Expected union, got {other:?}"),
        },
        other => panic!("Expected property, got {other:?}"),
    }
}

#[test]
fn test_interface_methods_and_index_signatures_are_recorded() {
    let file = parse("interface Bad { run(): void; [key: string]: number }");
    let interface = file.interfaces().next().unwrap();
    assert_eq!(interface.members[0].kind.describe(), "MethodSignature");
    assert_eq!(interface.members[1].kind.describe(), "IndexSignature");
}

#[test]
fn test_type_alias_of_object_is_an_interface() {
    let file = parse("type Limits = { max: number; min: number };");
    let interface = file.interfaces().next().unwrap();
    assert_eq!(interface.name.name, "Limits");
    assert_eq!(interface.members.len(), 2);
}

#[test]
fn test_type_alias_of_union_is_rejected() {
    let err = parse_source("type Mode = 'a' | 'b';", "m.ts").unwrap_err();
    assert!(matches!(err, ParseError::Unsupported { .. }));
}

#[test]
fn test_generic_return_type() {
    let function =
        only_function("export async function getA(): Promise<Array<string>> { return []; }");
    assert!(function.is_async);
    match function.return_type.map(|t| t.kind) {
        Some(TypeKind::Reference { name, args }) => {
            assert_eq!(name, "Promise");
            assert!(matches!(&args[0].kind, TypeKind::Reference { name, .. } if name == "Array"));
        }
        other => panic!("Expected Promise reference, got {other:?}"),
    }
}

#[test]
fn test_disallowed_statements_are_classified() {
    let function = only_function(
        r#"function getA(): boolean {
  let x = 1;
  x = 2;
  x++;
  for (const y of [1]) { console.log(y); }
  while (true) {}
  throw new Error("no");
  switch (x) { case 1: break; }
  try { f(); } catch (e) { g(); } finally { h(); }
  console.log(x);
  return true;
}"#,
    );
    let kinds: Vec<_> = function
        .body
        .stmts
        .iter()
        .map(|s| s.kind.describe())
        .collect();
    assert_eq!(
        kinds,
        vec![
            "VariableStatement",
            "AssignmentExpression",
            "UpdateExpression",
            "IterationStatement",
            "IterationStatement",
            "ThrowStatement",
            "SwitchStatement",
            "TryStatement",
            "ExpressionStatement",
            "ReturnStatement",
        ]
    );
}

#[test]
fn test_statement_without_semicolon_stops_at_next_line_keyword() {
    let function = only_function("function getA(): boolean {\n  const x = 1\n  return true\n}");
    assert_eq!(function.body.stmts.len(), 2);
    assert_eq!(function.body.stmts[1].kind.describe(), "ReturnStatement");
}

#[test]
fn test_else_if_chain() {
    let function = only_function(
        "function getA({a}: {a: number}): string { if (a > 1) { return \"x\"; } else if (a < 0) { return \"y\"; } return \"z\"; }",
    );
    match &function.body.stmts[0].kind {
        StmtKind::If { else_branch, .. } => {
            let else_branch = else_branch.as_ref().unwrap();
            assert!(matches!(else_branch.kind, StmtKind::If { .. }));
        }
        other => panic!("Expected if, got {other:?}"),
    }
}

#[test]
fn test_expression_precedence() {
    let expr = parse_expression("a || b && c === 1", "e.ts").unwrap();
    match expr.kind {
        ExprKind::Binary { op, right, .. } => {
            assert_eq!(op, BinaryOp::Or);
            match right.kind {
                ExprKind::Binary { op, right, .. } => {
                    assert_eq!(op, BinaryOp::And);
                    assert!(matches!(
                        right.kind,
                        ExprKind::Binary {
                            op: BinaryOp::StrictEq,
                            ..
                        }
                    ));
                }
                other => panic!("Expected &&, got {other:?}"),
            }
        }
        other => panic!("Expected ||, got {other:?}"),
    }
}

#[test]
fn test_member_calls_and_literals() {
    let expr = parse_expression("[\"x\", 'y'].includes(user.tag)", "e.ts").unwrap();
    match expr.kind {
        ExprKind::Call { callee, args } => {
            assert_eq!(args.len(), 1);
            match callee.kind {
                ExprKind::Member { object, property } => {
                    assert_eq!(property.name, "includes");
                    assert!(matches!(object.kind, ExprKind::Array(ref items) if items.len() == 2));
                }
                other => panic!("Expected member, got {other:?}"),
            }
        }
        other => panic!("Expected call, got {other:?}"),
    }
}

#[test]
fn test_object_literal_keys_and_shorthand() {
    let expr = parse_expression("{ a: 1, \"b-c\": true, 3: 'x', d }", "e.ts").unwrap();
    match expr.kind {
        ExprKind::Object(props) => {
            let keys: Vec<_> = props.iter().map(|p| p.key.as_str()).collect();
            assert_eq!(keys, vec!["a", "b-c", "3", "d"]);
            assert!(matches!(props[3].value.kind, ExprKind::Identifier(ref n) if n == "d"));
        }
        other => panic!("Expected object, got {other:?}"),
    }
}

#[test]
fn test_standalone_expression_rejects_trailing_tokens() {
    let err = parse_expression("a b", "e.ts").unwrap_err();
    assert!(matches!(err, ParseError::UnexpectedToken { .. }));
}

#[test]
fn test_parse_error_location() {
    let err = parse_source("export function getA(): boolean {\n  return @;\n}", "loc.ts").unwrap_err();
    assert_eq!(err.location().file, "loc.ts");
    assert_eq!(err.location().line, 2);
    assert_eq!(err.location().column, 10);
}

#[test]
fn test_unsupported_top_level_statement() {
    let err = parse_source("const x = 1;", "top.ts").unwrap_err();
    assert!(err.to_string().contains("top-level 'const'"));
}

#[test]
fn test_renamed_binding_rejected() {
    let err = parse_source("function getA({ a: b }): boolean { return b; }", "r.ts").unwrap_err();
    assert!(matches!(err, ParseError::Unsupported { .. }));
}

#[test]
fn test_empty_file() {
    assert!(parse("").items.is_empty());
}

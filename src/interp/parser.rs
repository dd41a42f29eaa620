//! Parser for the minnow language. Builds a span-annotated tree with chumsky
//! combinators, then lowers it into the flat [`Ast`] arena with 1-based line
//! numbers resolved against the source text.

use crate::interp::ast::{Ast, NodeId, NodeTag};
use ariadne::{Color, Label, Report, ReportKind, Source};
use chumsky::prelude::*;
use std::path::PathBuf;

type Err<'a> = extra::Err<Rich<'a, char>>;

const KEYWORDS: &[&str] = &[
    "fn", "if", "else", "while", "return", "debugger", "true", "false", "nil",
];

/// Intermediate parse tree; one sprout per future arena node.
#[derive(Debug)]
struct Sprout {
    tag: NodeTag,
    token: Option<String>,
    offset: usize,
    children: Vec<Sprout>,
}

impl Sprout {
    fn leaf(tag: NodeTag, token: Option<String>, offset: usize) -> Self {
        Self {
            tag,
            token,
            offset,
            children: Vec::new(),
        }
    }

    fn branch(tag: NodeTag, offset: usize, children: Vec<Sprout>) -> Self {
        Self {
            tag,
            token: None,
            offset,
            children,
        }
    }
}

enum Postfix {
    Call(Vec<Sprout>),
    Index(Sprout),
}

/// Whitespace and `#` line comments.
fn ws<'a>() -> impl Parser<'a, &'a str, (), Err<'a>> + Clone {
    let comment = just('#')
        .then(any().and_is(just('\n').not()).repeated())
        .ignored();
    choice((text::whitespace().at_least(1).ignored(), comment))
        .repeated()
        .ignored()
}

/// A keyword, yielding its byte offset. Matches a whole identifier so that
/// e.g. `iffy` never parses as `if`.
fn kw<'a>(word: &'static str) -> impl Parser<'a, &'a str, usize, Err<'a>> + Clone {
    text::ascii::ident()
        .try_map(move |s: &str, span: SimpleSpan| {
            if s == word {
                Ok(span.start)
            } else {
                Err(Rich::custom(span, format!("expected `{word}`")))
            }
        })
        .padded_by(ws())
}

/// A punctuation token, yielding its byte offset.
fn sym<'a>(token: &'static str) -> impl Parser<'a, &'a str, usize, Err<'a>> + Clone {
    just(token)
        .map_with(|_, e| {
            let span: SimpleSpan = e.span();
            span.start
        })
        .padded_by(ws())
}

/// A non-keyword identifier as an `Identifier` sprout.
fn identifier<'a>() -> impl Parser<'a, &'a str, Sprout, Err<'a>> + Clone {
    text::ascii::ident()
        .try_map(|s: &str, span: SimpleSpan| {
            if KEYWORDS.contains(&s) {
                Err(Rich::custom(span, format!("`{s}` is a keyword")))
            } else {
                Ok(Sprout::leaf(
                    NodeTag::Identifier,
                    Some(s.to_string()),
                    span.start,
                ))
            }
        })
        .padded_by(ws())
        .labelled("identifier")
}

fn binary(lhs: Sprout, op: &str, rhs: Sprout) -> Sprout {
    let offset = lhs.offset;
    Sprout {
        tag: NodeTag::Binary,
        token: Some(op.to_string()),
        offset,
        children: vec![lhs, rhs],
    }
}

fn statement<'a>() -> impl Parser<'a, &'a str, Sprout, Err<'a>> {
    recursive(|stmt| {
        let block = stmt
            .clone()
            .repeated()
            .collect::<Vec<_>>()
            .delimited_by(sym("{"), sym("}"))
            .map_with(|stmts: Vec<Sprout>, e| {
                let span: SimpleSpan = e.span();
                let offset = stmts.first().map(|s| s.offset).unwrap_or(span.start);
                Sprout::branch(NodeTag::Block, offset, stmts)
            });

        let expr = recursive(|expr| {
            let int = text::int(10)
                .map_with(|s: &str, e| {
                    let span: SimpleSpan = e.span();
                    Sprout::leaf(NodeTag::Int, Some(s.to_string()), span.start)
                })
                .padded_by(ws());

            let escape = just('\\').ignore_then(choice((
                just('n').to('\n'),
                just('t').to('\t'),
                just('"').to('"'),
                just('\\').to('\\'),
            )));
            let string = none_of("\\\"")
                .or(escape)
                .repeated()
                .collect::<String>()
                .delimited_by(just('"'), just('"'))
                .map_with(|s, e| {
                    let span: SimpleSpan = e.span();
                    Sprout::leaf(NodeTag::Str, Some(s), span.start)
                })
                .padded_by(ws());

            let word = |w: &'static str, tag: NodeTag| {
                text::ascii::ident()
                    .try_map(move |s: &str, span: SimpleSpan| {
                        if s == w {
                            let token = (tag != NodeTag::Nil).then(|| s.to_string());
                            Ok(Sprout::leaf(tag, token, span.start))
                        } else {
                            Err(Rich::custom(span, format!("expected `{w}`")))
                        }
                    })
                    .padded_by(ws())
            };
            let boolean = word("true", NodeTag::Bool).or(word("false", NodeTag::Bool));
            let nil = word("nil", NodeTag::Nil);

            let array = expr
                .clone()
                .separated_by(sym(","))
                .allow_trailing()
                .collect::<Vec<_>>()
                .delimited_by(sym("["), sym("]"))
                .map_with(|elems, e| {
                    let span: SimpleSpan = e.span();
                    Sprout::branch(NodeTag::Array, span.start, elems)
                });

            let params = identifier()
                .separated_by(sym(","))
                .allow_trailing()
                .collect::<Vec<_>>()
                .delimited_by(sym("("), sym(")"));
            let function = kw("fn").then(params).then(block.clone()).map(
                |((offset, mut params), body): ((usize, Vec<Sprout>), Sprout)| {
                    params.push(body);
                    Sprout::branch(NodeTag::Function, offset, params)
                },
            );

            let primary = choice((
                function,
                array,
                boolean,
                nil,
                int,
                string,
                identifier(),
                expr.clone().delimited_by(sym("("), sym(")")),
            ));

            let call_args = expr
                .clone()
                .separated_by(sym(","))
                .allow_trailing()
                .collect::<Vec<_>>()
                .delimited_by(sym("("), sym(")"))
                .map(Postfix::Call);
            let index_arg = expr
                .clone()
                .delimited_by(sym("["), sym("]"))
                .map(Postfix::Index);
            let postfix = primary.foldl(
                call_args.or(index_arg).repeated(),
                |target, op| match op {
                    Postfix::Call(args) => {
                        let offset = target.offset;
                        let mut children = vec![target];
                        children.extend(args);
                        Sprout::branch(NodeTag::Call, offset, children)
                    }
                    Postfix::Index(index) => {
                        let offset = target.offset;
                        Sprout::branch(NodeTag::Index, offset, vec![target, index])
                    }
                },
            );

            let op = |s: &'static str| sym(s).to(s);

            let unary = recursive(|unary| {
                op("-")
                    .or(op("!"))
                    .map_with(|o, e| {
                        let span: SimpleSpan = e.span();
                        (o, span.start)
                    })
                    .then(unary)
                    .map(|((o, offset), operand): ((&str, usize), Sprout)| Sprout {
                        tag: NodeTag::Unary,
                        token: Some(o.to_string()),
                        offset,
                        children: vec![operand],
                    })
                    .or(postfix)
            });

            let product = unary.clone().foldl(
                choice((op("*"), op("/"), op("%"))).then(unary).repeated(),
                |lhs, (o, rhs)| binary(lhs, o, rhs),
            );
            let sum = product.clone().foldl(
                op("+").or(op("-")).then(product).repeated(),
                |lhs, (o, rhs)| binary(lhs, o, rhs),
            );
            let comparison = sum.clone().foldl(
                choice((op("<="), op("<"), op(">="), op(">")))
                    .then(sum)
                    .repeated(),
                |lhs, (o, rhs)| binary(lhs, o, rhs),
            );
            let equality = comparison.clone().foldl(
                op("==").or(op("!=")).then(comparison).repeated(),
                |lhs, (o, rhs)| binary(lhs, o, rhs),
            );
            let and = equality.clone().foldl(
                op("&&").then(equality).repeated(),
                |lhs, (o, rhs)| binary(lhs, o, rhs),
            );

            and.clone()
                .foldl(op("||").then(and).repeated(), |lhs, (o, rhs)| {
                    binary(lhs, o, rhs)
                })
        });

        let debugger_stmt = kw("debugger").map(|offset| Sprout::leaf(NodeTag::Debugger, None, offset));

        let return_stmt = kw("return").then(expr.clone().or_not()).map(
            |(offset, value): (usize, Option<Sprout>)| {
                Sprout::branch(NodeTag::Return, offset, value.into_iter().collect())
            },
        );

        let while_stmt = kw("while").then(expr.clone()).then(block.clone()).map(
            |((offset, cond), body): ((usize, Sprout), Sprout)| {
                Sprout::branch(NodeTag::While, offset, vec![cond, body])
            },
        );

        let if_stmt = recursive(|if_stmt| {
            kw("if")
                .then(expr.clone())
                .then(block.clone())
                .then(kw("else").ignore_then(block.clone().or(if_stmt)).or_not())
                .map(
                    |(((offset, cond), then_branch), else_branch): (
                        ((usize, Sprout), Sprout),
                        Option<Sprout>,
                    )| {
                        let mut children = vec![cond, then_branch];
                        children.extend(else_branch);
                        Sprout::branch(NodeTag::If, offset, children)
                    },
                )
        });

        // `=` but not `==`
        let assign_op = just('=')
            .then_ignore(just('=').not())
            .padded_by(ws());
        let assign = identifier().then_ignore(assign_op).then(expr.clone()).map(
            |(target, value): (Sprout, Sprout)| {
                let offset = target.offset;
                Sprout::branch(NodeTag::Assign, offset, vec![target, value])
            },
        );

        choice((debugger_stmt, return_stmt, while_stmt, if_stmt, assign, expr))
            .then_ignore(sym(";").or_not())
    })
}

fn program<'a>() -> impl Parser<'a, &'a str, Sprout, Err<'a>> {
    ws().ignore_then(statement().repeated().collect::<Vec<_>>())
        .then_ignore(end())
        .map(|stmts| Sprout::branch(NodeTag::Program, 0, stmts))
}

/// Parse `src` into an [`Ast`] attributed to `path`.
pub fn parse<'a>(
    path: impl Into<PathBuf>,
    src: &'a str,
) -> Result<Ast, Vec<Rich<'a, char>>> {
    let root = program().parse(src).into_result()?;

    let mut line_starts = vec![0usize];
    line_starts.extend(
        src.bytes()
            .enumerate()
            .filter(|(_, b)| *b == b'\n')
            .map(|(i, _)| i + 1),
    );

    let mut ast = Ast::new(path.into());
    graft(&mut ast, &line_starts, root, None);
    Ok(ast)
}

fn graft(ast: &mut Ast, line_starts: &[usize], sprout: Sprout, parent: Option<NodeId>) {
    let line = line_starts.partition_point(|&start| start <= sprout.offset) as u32;
    let id = ast.push(sprout.tag, sprout.token, line, parent);
    for child in sprout.children {
        graft(ast, line_starts, child, Some(id));
    }
}

/// Render parse failures to stderr.
pub fn report(path: &str, src: &str, errors: &[Rich<char>]) {
    for e in errors {
        let span = *e.span();
        let _ = Report::build(ReportKind::Error, path, span.start)
            .with_message(e.to_string())
            .with_label(
                Label::new((path, span.start..span.end))
                    .with_message(e.reason().to_string())
                    .with_color(Color::Red),
            )
            .finish()
            .eprint((path, Source::from(src)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Ast {
        parse("(test)", src).expect("source must parse")
    }

    #[test]
    fn statements_carry_their_source_lines() {
        let ast = parse_ok("x = 1\ny = 2\n\nf = fn(a) {\n    debugger\n    return a\n}\n");
        let stmts = ast.children(ast.root());
        assert_eq!(stmts.len(), 3);
        assert_eq!(ast.tag(stmts[0]), NodeTag::Assign);
        assert_eq!(ast.line(stmts[0]), 1);
        assert_eq!(ast.line(stmts[1]), 2);
        assert_eq!(ast.line(stmts[2]), 4);

        let function = ast.children(stmts[2])[1];
        assert_eq!(ast.tag(function), NodeTag::Function);
        let body = *ast
            .children(function)
            .last()
            .expect("function body present");
        assert_eq!(ast.tag(body), NodeTag::Block);
        let body_stmts = ast.children(body);
        assert_eq!(ast.tag(body_stmts[0]), NodeTag::Debugger);
        assert_eq!(ast.line(body_stmts[0]), 5);
        assert_eq!(ast.tag(body_stmts[1]), NodeTag::Return);
        assert_eq!(ast.line(body_stmts[1]), 6);
    }

    #[test]
    fn parent_links_are_wired_bottom_up() {
        let ast = parse_ok("f = fn(a) { return a }\n");
        let assign = ast.children(ast.root())[0];
        let function = ast.children(assign)[1];
        let body = *ast.children(function).last().unwrap();
        let ret = ast.children(body)[0];

        assert_eq!(ast.parent(ret), Some(body));
        assert_eq!(ast.parent(body), Some(function));
        assert_eq!(ast.parent(function), Some(assign));
        assert_eq!(ast.parent(assign), Some(ast.root()));
        assert_eq!(ast.parent(ast.root()), None);
    }

    #[test]
    fn precedence_binds_product_tighter_than_sum() {
        let ast = parse_ok("r = 1 + 2 * 3");
        let assign = ast.children(ast.root())[0];
        let sum = ast.children(assign)[1];
        assert_eq!(ast.tag(sum), NodeTag::Binary);
        assert_eq!(ast.token(sum), Some("+"));
        let product = ast.children(sum)[1];
        assert_eq!(ast.token(product), Some("*"));
    }

    #[test]
    fn calls_and_indexing_chain_postfix() {
        let ast = parse_ok("v = f(1)[0]");
        let assign = ast.children(ast.root())[0];
        let index = ast.children(assign)[1];
        assert_eq!(ast.tag(index), NodeTag::Index);
        let call = ast.children(index)[0];
        assert_eq!(ast.tag(call), NodeTag::Call);
        assert_eq!(ast.token(ast.children(call)[0]), Some("f"));
    }

    #[test]
    fn comments_are_skipped() {
        let ast = parse_ok("# header\nx = 1 # trailing\n");
        let stmts = ast.children(ast.root());
        assert_eq!(stmts.len(), 1);
        assert_eq!(ast.line(stmts[0]), 2);
    }

    #[test]
    fn keywords_are_not_identifiers() {
        assert!(parse("(test)", "return = 1").is_err());
        assert!(parse("(test)", "x = while").is_err());
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(parse("(test)", "x = (").is_err());
        assert!(parse("(test)", "f = fn(a { }").is_err());
    }

    #[test]
    fn else_if_chains() {
        let ast = parse_ok("if a { b = 1 } else if c { d = 2 }\n");
        let if_node = ast.children(ast.root())[0];
        assert_eq!(ast.tag(if_node), NodeTag::If);
        let else_branch = ast.children(if_node)[2];
        assert_eq!(ast.tag(else_branch), NodeTag::If);
    }
}

//! Nom parser for the condition grammar.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, multispace0, multispace1},
    combinator::{all_consuming, map, map_res, opt, recognize, value},
    multi::many0,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use super::{CompareOp, Condition, ConditionError};

pub(super) fn parse(input: &str) -> Result<Condition, ConditionError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Condition::Literal(true));
    }

    all_consuming(or_expr)(trimmed)
        .map(|(_, condition)| condition)
        .map_err(|_| ConditionError {
            expression: input.to_string(),
        })
}

/// A keyword delimited by whitespace on both sides.
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    delimited(multispace1, tag(word), multispace1)
}

fn or_expr(input: &str) -> IResult<&str, Condition> {
    let (input, first) = and_expr(input)?;
    let (input, rest) = many0(preceded(keyword("or"), and_expr))(input)?;
    Ok((input, fold_binary(first, rest, Condition::Or)))
}

fn and_expr(input: &str) -> IResult<&str, Condition> {
    let (input, first) = not_expr(input)?;
    let (input, rest) = many0(preceded(keyword("and"), not_expr))(input)?;
    Ok((input, fold_binary(first, rest, Condition::And)))
}

fn fold_binary(
    first: Condition,
    rest: Vec<Condition>,
    combine: fn(Box<Condition>, Box<Condition>) -> Condition,
) -> Condition {
    rest.into_iter()
        .fold(first, |lhs, rhs| combine(Box::new(lhs), Box::new(rhs)))
}

fn not_expr(input: &str) -> IResult<&str, Condition> {
    alt((
        map(
            preceded(pair(tag("not"), multispace1), not_expr),
            |inner| Condition::Not(Box::new(inner)),
        ),
        atom,
    ))(input)
}

fn atom(input: &str) -> IResult<&str, Condition> {
    alt((parens, comparison, word))(input)
}

fn parens(input: &str) -> IResult<&str, Condition> {
    delimited(
        pair(char('('), multispace0),
        or_expr,
        pair(multispace0, char(')')),
    )(input)
}

fn comparison(input: &str) -> IResult<&str, Condition> {
    map(
        tuple((
            identifier,
            delimited(multispace0, compare_op, multispace0),
            integer,
        )),
        |(name, op, value)| Condition::Comparison {
            resource: name.to_string(),
            op,
            value,
        },
    )(input)
}

fn compare_op(input: &str) -> IResult<&str, CompareOp> {
    alt((
        value(CompareOp::Ge, tag(">=")),
        value(CompareOp::Le, tag("<=")),
        value(CompareOp::Eq, tag("==")),
        value(CompareOp::Ne, tag("!=")),
        value(CompareOp::Gt, tag(">")),
        value(CompareOp::Lt, tag("<")),
    ))(input)
}

/// A bare identifier: boolean literal or flag lookup. Operator keywords are
/// rejected so they never read as flags.
fn word(input: &str) -> IResult<&str, Condition> {
    let (rest, ident) = identifier(input)?;
    match ident {
        "true" => Ok((rest, Condition::Literal(true))),
        "false" => Ok((rest, Condition::Literal(false))),
        "and" | "or" | "not" => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Tag,
        ))),
        _ => Ok((rest, Condition::Flag(ident.to_string()))),
    }
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '.'),
    ))(input)
}

fn integer(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(char('-')), digit1)), |digits: &str| {
        digits.parse::<i64>()
    })(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_comparison_tree() {
        let condition = parse("player.level >= 5").unwrap();
        assert_eq!(
            condition,
            Condition::Comparison {
                resource: "player.level".to_string(),
                op: CompareOp::Ge,
                value: 5,
            }
        );
    }

    #[test]
    fn test_parse_precedence_tree() {
        let condition = parse("a or b and c").unwrap();
        match condition {
            Condition::Or(lhs, rhs) => {
                assert_eq!(*lhs, Condition::Flag("a".to_string()));
                assert!(matches!(*rhs, Condition::And(_, _)));
            }
            other => panic!("expected Or at the root, got {other:?}"),
        }
    }

    #[test]
    fn test_keywords_are_not_flags() {
        assert!(parse("and").is_err());
        assert!(parse("or").is_err());
        assert!(parse("not").is_err());
    }

    #[test]
    fn test_nested_not() {
        let condition = parse("not not ready").unwrap();
        assert_eq!(
            condition,
            Condition::Not(Box::new(Condition::Not(Box::new(Condition::Flag(
                "ready".to_string()
            )))))
        );
    }
}

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{map, recognize},
    multi::fold_many0,
    sequence::{delimited, preceded, terminated},
};

use super::condition::QueryCondition;

use anyhow::{Result, anyhow};

/// Parse a search-bar query. Blank input is an error; see [`parse_filter`].
pub fn parse_query(input: &str) -> Result<QueryCondition> {
    match query(input) {
        Ok((remaining, condition)) => {
            if remaining.trim().is_empty() {
                Ok(condition)
            } else {
                Err(anyhow!("Unexpected input: '{}'", remaining))
            }
        }
        Err(e) => Err(anyhow!("Parse error: {:?}", e)),
    }
}

/// Like [`parse_query`], but a blank query matches everything.
pub fn parse_filter(input: &str) -> Result<QueryCondition> {
    if input.trim().is_empty() {
        Ok(QueryCondition::match_all())
    } else {
        parse_query(input)
    }
}

fn query(input: &str) -> IResult<&str, QueryCondition> {
    or_expression(input)
}

fn or_expression(input: &str) -> IResult<&str, QueryCondition> {
    let (input, first) = and_expression(input)?;

    fold_many0(
        preceded(
            preceded(multispace0, tag("OR")),
            preceded(multispace1, and_expression),
        ),
        move || first.clone(),
        |acc, next| match acc {
            QueryCondition::Or { mut conditions } => {
                conditions.push(next);
                QueryCondition::Or { conditions }
            }
            _ => QueryCondition::Or {
                conditions: vec![acc, next],
            },
        },
    )
    .parse(input)
}

fn and_expression(input: &str) -> IResult<&str, QueryCondition> {
    let (input, first) = not_expression(input)?;

    fold_many0(
        preceded(
            preceded(multispace0, tag("AND")),
            preceded(multispace1, not_expression),
        ),
        move || first.clone(),
        |acc, next| match acc {
            QueryCondition::And { mut conditions } => {
                conditions.push(next);
                QueryCondition::And { conditions }
            }
            _ => QueryCondition::And {
                conditions: vec![acc, next],
            },
        },
    )
    .parse(input)
}

fn not_expression(input: &str) -> IResult<&str, QueryCondition> {
    alt((
        map(
            preceded(
                preceded(multispace0, terminated(tag("NOT"), multispace1)),
                primary_expression,
            ),
            |condition| QueryCondition::Not {
                condition: Box::new(condition),
            },
        ),
        primary_expression,
    ))
    .parse(input)
}

fn primary_expression(input: &str) -> IResult<&str, QueryCondition> {
    alt((
        preceded(multispace0, parenthesized_expression),
        preceded(multispace0, regex_expression),
        preceded(multispace0, field_expression),
        preceded(multispace0, quoted_literal),
        preceded(multispace0, unquoted_literal),
    ))
    .parse(input)
}

fn parenthesized_expression(input: &str) -> IResult<&str, QueryCondition> {
    delimited(
        char('('),
        preceded(multispace0, query),
        preceded(multispace0, char(')')),
    )
    .parse(input)
}

fn regex_expression(input: &str) -> IResult<&str, QueryCondition> {
    let (input, _) = char('/')(input)?;
    let (input, pattern) = regex_pattern(input)?;
    let (input, _) = char('/')(input)?;
    let (input, flags) = regex_flags(input)?;

    Ok((
        input,
        QueryCondition::Regex {
            pattern: pattern.to_string(),
            flags: flags.to_string(),
        },
    ))
}

fn regex_pattern(input: &str) -> IResult<&str, &str> {
    let mut end = 0;
    let mut escaped = false;

    for ch in input.chars() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '/' {
            break;
        }
        end += ch.len_utf8();
    }

    Ok((&input[end..], &input[..end]))
}

fn regex_flags(input: &str) -> IResult<&str, &str> {
    recognize(take_while(|c: char| {
        matches!(c, 'i' | 'm' | 's' | 'u' | 'x')
    }))
    .parse(input)
}

/// `service:checkout`, `level:"warn"`, `trace.id:'abc'`
fn field_expression(input: &str) -> IResult<&str, QueryCondition> {
    let (input, name) = take_while1(is_field_name_char)(input)?;
    let (input, _) = char(':')(input)?;
    let (input, value) = alt((
        double_quoted_string,
        single_quoted_string,
        map(take_while1(is_unquoted_char), |s: &str| s.to_string()),
    ))
    .parse(input)?;

    Ok((
        input,
        QueryCondition::Field {
            name: name.to_string(),
            value,
        },
    ))
}

fn is_field_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '-')
}

fn quoted_literal(input: &str) -> IResult<&str, QueryCondition> {
    map(alt((double_quoted_string, single_quoted_string)), |s| {
        QueryCondition::Literal {
            pattern: s,
            case_sensitive: false,
        }
    })
    .parse(input)
}

fn double_quoted_string(input: &str) -> IResult<&str, String> {
    let (input, _) = char('"')(input)?;
    let (input, content) = quoted_string_content('"')(input)?;
    let (input, _) = char('"')(input)?;
    Ok((input, content))
}

fn single_quoted_string(input: &str) -> IResult<&str, String> {
    let (input, _) = char('\'')(input)?;
    let (input, content) = quoted_string_content('\'')(input)?;
    let (input, _) = char('\'')(input)?;
    Ok((input, content))
}

fn quoted_string_content(quote: char) -> impl Fn(&str) -> IResult<&str, String> {
    move |input: &str| {
        let mut result = String::new();
        let mut chars = input.chars();
        let mut consumed = 0;

        while let Some(ch) = chars.next() {
            if ch == quote {
                break;
            }
            consumed += ch.len_utf8();

            if ch == '\\' {
                match chars.next() {
                    Some(next_ch) => {
                        consumed += next_ch.len_utf8();
                        match next_ch {
                            'n' => result.push('\n'),
                            't' => result.push('\t'),
                            '\\' => result.push('\\'),
                            ch if ch == quote => result.push(ch),
                            ch => {
                                result.push('\\');
                                result.push(ch);
                            }
                        }
                    }
                    None => result.push('\\'),
                }
            } else {
                result.push(ch);
            }
        }

        Ok((&input[consumed..], result))
    }
}

fn unquoted_literal(input: &str) -> IResult<&str, QueryCondition> {
    let (rest, word) = take_while1(is_unquoted_char)(input)?;

    if matches!(word, "AND" | "OR" | "NOT") {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Tag,
        )));
    }

    Ok((
        rest,
        QueryCondition::Literal {
            pattern: word.to_string(),
            case_sensitive: false,
        },
    ))
}

fn is_unquoted_char(c: char) -> bool {
    !matches!(c, ' ' | '\t' | '\n' | '\r' | '(' | ')' | '"' | '\'' | '/')
}

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Anything a query can be evaluated against.
///
/// `text` is the free-text body matched by literals and regexes; `field`
/// resolves `name:value` terms.
pub trait Searchable {
    fn text(&self) -> &str;
    fn field(&self, name: &str) -> Option<Cow<'_, str>>;
}

impl Searchable for str {
    fn text(&self) -> &str {
        self
    }

    fn field(&self, _name: &str) -> Option<Cow<'_, str>> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryCondition {
    Literal {
        pattern: String,
        #[serde(rename = "caseSensitive")]
        case_sensitive: bool,
    },
    Regex {
        pattern: String,
        flags: String,
    },
    Field {
        name: String,
        value: String,
    },
    Not {
        condition: Box<QueryCondition>,
    },
    #[serde(rename = "AND")]
    And {
        conditions: Vec<QueryCondition>,
    },
    #[serde(rename = "OR")]
    Or {
        conditions: Vec<QueryCondition>,
    },
}

impl QueryCondition {
    /// The condition every record satisfies.
    pub fn match_all() -> Self {
        QueryCondition::And { conditions: vec![] }
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self, QueryCondition::And { conditions } if conditions.is_empty())
    }

    pub fn evaluate<R: Searchable + ?Sized>(&self, record: &R) -> Result<bool, regex::Error> {
        match self {
            QueryCondition::Literal {
                pattern,
                case_sensitive,
            } => Ok(contains(record.text(), pattern, *case_sensitive)),
            QueryCondition::Regex { pattern, flags } => {
                let regex = super::regex_cache::get_or_compile_regex(pattern, flags)?;
                Ok(regex.is_match(record.text()))
            }
            QueryCondition::Field { name, value } => Ok(record
                .field(name)
                .is_some_and(|field| contains(&field, value, false))),
            QueryCondition::Not { condition } => Ok(!condition.evaluate(record)?),
            QueryCondition::And { conditions } => {
                for condition in conditions {
                    if !condition.evaluate(record)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            QueryCondition::Or { conditions } => {
                for condition in conditions {
                    if condition.evaluate(record)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Byte range of the first free-text match, used for highlighting.
    pub fn find_match(&self, text: &str) -> Option<(usize, usize)> {
        match self {
            QueryCondition::Literal {
                pattern,
                case_sensitive,
            } => {
                if pattern.is_empty() {
                    return None;
                }
                if *case_sensitive {
                    text.find(pattern.as_str()).map(|pos| (pos, pattern.len()))
                } else {
                    // Lowercasing can change byte lengths for some scripts; only
                    // report the match when the offsets still line up.
                    let lower_text = text.to_lowercase();
                    let lower_pattern = pattern.to_lowercase();
                    lower_text
                        .find(&lower_pattern)
                        .filter(|_| lower_text.len() == text.len())
                        .map(|pos| (pos, lower_pattern.len()))
                        .filter(|(pos, len)| text.is_char_boundary(pos + len))
                }
            }
            QueryCondition::Regex { pattern, flags } => {
                super::regex_cache::get_or_compile_regex(pattern, flags)
                    .ok()
                    .and_then(|regex| regex.find(text).map(|m| (m.start(), m.len())))
            }
            QueryCondition::Field { .. } | QueryCondition::Not { .. } => None,
            QueryCondition::And { conditions } | QueryCondition::Or { conditions } => {
                conditions.iter().find_map(|condition| condition.find_match(text))
            }
        }
    }
}

fn contains(haystack: &str, needle: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        haystack.contains(needle)
    } else {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    }
}

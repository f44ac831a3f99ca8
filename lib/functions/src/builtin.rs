//! The built-in functions of [SPARQL 1.1](https://www.w3.org/TR/sparql11-query/#SparqlOps).

use crate::value::TypedValue;
use crate::Numeric;
use itertools::{EitherOrBoth, Itertools};
use kgram_logical::BuiltinFunction;
use kgram_model::{Literal, NamedNode, Term, ThinError, ThinResult};
use regex::{Regex, RegexBuilder};
use std::borrow::Cow;
use std::str::FromStr;

pub(crate) fn evaluate(function: BuiltinFunction, args: &[Term]) -> ThinResult<Term> {
    match (function, args) {
        (BuiltinFunction::Str, [arg]) => Ok(Literal::new_simple_literal(lexical_form(arg)?).into()),
        (BuiltinFunction::Lang, [arg]) => {
            let literal = arg.as_literal().ok_or(ThinError::default())?;
            Ok(Literal::new_simple_literal(literal.language().unwrap_or_default()).into())
        }
        (BuiltinFunction::LangMatches, [tag, range]) => {
            let (tag, _) = simple_string(tag)?;
            let (range, _) = simple_string(range)?;
            Ok(Literal::from(lang_matches(tag, range)).into())
        }
        (BuiltinFunction::Datatype, [arg]) => {
            let literal = arg.as_literal().ok_or(ThinError::default())?;
            Ok(literal.datatype().into_owned().into())
        }
        (BuiltinFunction::Iri, [arg]) => match arg {
            Term::NamedNode(_) => Ok(arg.clone()),
            _ => {
                let (value, _) = simple_string(arg)?;
                NamedNode::new(value)
                    .map(Term::from)
                    .map_err(|_| ThinError::default())
            }
        },
        (BuiltinFunction::StrLen, [arg]) => {
            let (value, _) = string(arg)?;
            Ok(Literal::from(i64::try_from(value.chars().count())?).into())
        }
        (BuiltinFunction::SubStr, [source, start]) => substr(source, start, None),
        (BuiltinFunction::SubStr, [source, start, length]) => substr(source, start, Some(length)),
        (BuiltinFunction::UCase, [arg]) => {
            let (value, language) = string(arg)?;
            Ok(string_literal(value.to_uppercase(), language))
        }
        (BuiltinFunction::LCase, [arg]) => {
            let (value, language) = string(arg)?;
            Ok(string_literal(value.to_lowercase(), language))
        }
        (BuiltinFunction::StrStarts, [lhs, rhs]) => {
            let (lhs, rhs) = compatible_strings(lhs, rhs)?;
            Ok(Literal::from(lhs.starts_with(rhs)).into())
        }
        (BuiltinFunction::StrEnds, [lhs, rhs]) => {
            let (lhs, rhs) = compatible_strings(lhs, rhs)?;
            Ok(Literal::from(lhs.ends_with(rhs)).into())
        }
        (BuiltinFunction::Contains, [lhs, rhs]) => {
            let (lhs, rhs) = compatible_strings(lhs, rhs)?;
            Ok(Literal::from(lhs.contains(rhs)).into())
        }
        (BuiltinFunction::Concat, args) => concat(args),
        (BuiltinFunction::Regex, [text, pattern]) => regex(text, pattern, None),
        (BuiltinFunction::Regex, [text, pattern, flags]) => regex(text, pattern, Some(flags)),
        (BuiltinFunction::Abs, [arg]) => numeric(arg, |n| n.checked_abs()),
        (BuiltinFunction::Ceil, [arg]) => numeric(arg, |n| n.checked_ceil()),
        (BuiltinFunction::Floor, [arg]) => numeric(arg, |n| n.checked_floor()),
        (BuiltinFunction::Round, [arg]) => numeric(arg, |n| n.checked_round()),
        (BuiltinFunction::IsIri, [arg]) => Ok(Literal::from(arg.is_named_node()).into()),
        (BuiltinFunction::IsBlank, [arg]) => Ok(Literal::from(arg.is_blank_node()).into()),
        (BuiltinFunction::IsLiteral, [arg]) => Ok(Literal::from(arg.is_literal()).into()),
        (BuiltinFunction::IsNumeric, [arg]) => Ok(Literal::from(matches!(
            TypedValue::from_term(arg),
            TypedValue::Numeric(_)
        ))
        .into()),
        (BuiltinFunction::StrDt, [value, datatype]) => {
            let (value, _) = simple_string(value)?;
            let datatype = datatype.as_named_node().ok_or(ThinError::default())?;
            Ok(Literal::new_typed_literal(value, datatype.clone()).into())
        }
        (BuiltinFunction::StrLang, [value, language]) => {
            let (value, _) = simple_string(value)?;
            let (language, _) = simple_string(language)?;
            Literal::new_language_tagged_literal(value, language)
                .map(Term::from)
                .map_err(|_| ThinError::default())
        }
        _ => ThinError::expected(),
    }
}

/// The lexical form of an IRI or a literal.
pub(crate) fn lexical_form(term: &Term) -> ThinResult<&str> {
    match term {
        Term::NamedNode(node) => Ok(node.as_str()),
        Term::Literal(literal) => Ok(literal.value()),
        Term::BlankNode(_) | Term::Object(_) => ThinError::expected(),
    }
}

fn string(term: &Term) -> ThinResult<(&str, Option<&str>)> {
    TypedValue::from_term(term).as_string()
}

/// A string without a language tag.
fn simple_string(term: &Term) -> ThinResult<(&str, Option<&str>)> {
    match string(term)? {
        (value, None) => Ok((value, None)),
        _ => ThinError::expected(),
    }
}

/// [Argument compatibility](https://www.w3.org/TR/sparql11-query/#func-arg-compatibility)
fn compatible_strings<'a>(lhs: &'a Term, rhs: &'a Term) -> ThinResult<(&'a str, &'a str)> {
    let (lhs, lhs_language) = string(lhs)?;
    let (rhs, rhs_language) = string(rhs)?;
    match (lhs_language, rhs_language) {
        (_, None) => Ok((lhs, rhs)),
        (Some(lhs_language), Some(rhs_language)) if lhs_language == rhs_language => Ok((lhs, rhs)),
        _ => ThinError::expected(),
    }
}

fn string_literal(value: String, language: Option<&str>) -> Term {
    match language {
        Some(language) => Literal::new_language_tagged_literal_unchecked(value, language).into(),
        None => Literal::new_simple_literal(value).into(),
    }
}

fn integer(term: &Term) -> ThinResult<i64> {
    let literal = term.as_literal().ok_or(ThinError::default())?;
    match TypedValue::from_literal(literal) {
        TypedValue::Numeric(Numeric::Integer(_)) => Ok(i64::from_str(literal.value())?),
        _ => ThinError::expected(),
    }
}

fn numeric(
    term: &Term,
    op: impl FnOnce(Numeric) -> ThinResult<Numeric>,
) -> ThinResult<Term> {
    let value = TypedValue::from_term(term).as_numeric()?;
    Ok(op(value)?.into_literal().into())
}

fn lang_matches(tag: &str, range: &str) -> bool {
    if range == "*" {
        return !tag.is_empty();
    }
    !range
        .split('-')
        .zip_longest(tag.split('-'))
        .any(|parts| match parts {
            EitherOrBoth::Both(range, tag) => !range.eq_ignore_ascii_case(tag),
            EitherOrBoth::Left(_) => true,
            EitherOrBoth::Right(_) => false,
        })
}

/// Slices on characters, with a 1-based start.
fn substr(source: &Term, start: &Term, length: Option<&Term>) -> ThinResult<Term> {
    let (value, language) = string(source)?;
    let start = usize::try_from(integer(start)?)?;
    let length = length.map(integer).transpose()?.map(usize::try_from).transpose()?;

    let chars = value.chars().skip(start.checked_sub(1).ok_or(ThinError::default())?);
    let result: String = match length {
        Some(length) => chars.take(length).collect(),
        None => chars.collect(),
    };
    Ok(string_literal(result, language))
}

fn concat(args: &[Term]) -> ThinResult<Term> {
    let mut result = String::new();
    let mut language = None;
    for (index, arg) in args.iter().enumerate() {
        let (value, arg_language) = string(arg)?;
        result.push_str(value);
        language = match (index, language, arg_language) {
            (0, _, arg_language) => arg_language,
            (_, Some(language), Some(arg_language)) if language == arg_language => Some(language),
            _ => None,
        };
    }
    Ok(string_literal(result, language))
}

fn regex(text: &Term, pattern: &Term, flags: Option<&Term>) -> ThinResult<Term> {
    let (text, _) = string(text)?;
    let (pattern, _) = simple_string(pattern)?;
    let flags = flags.map(simple_string).transpose()?.map(|(flags, _)| flags);
    let regex = compile_pattern(pattern, flags).ok_or(ThinError::default())?;
    Ok(Literal::from(regex.is_match(text)).into())
}

fn compile_pattern(pattern: &str, flags: Option<&str>) -> Option<Regex> {
    const REGEX_SIZE_LIMIT: usize = 1_000_000;

    let mut pattern = Cow::Borrowed(pattern);
    let flags = flags.unwrap_or_default();
    if flags.contains('q') {
        pattern = regex::escape(&pattern).into();
    }
    let mut regex_builder = RegexBuilder::new(&pattern);
    regex_builder.size_limit(REGEX_SIZE_LIMIT);
    for flag in flags.chars() {
        match flag {
            's' => {
                regex_builder.dot_matches_new_line(true);
            }
            'm' => {
                regex_builder.multi_line(true);
            }
            'i' => {
                regex_builder.case_insensitive(true);
            }
            'x' => {
                regex_builder.ignore_whitespace(true);
            }
            'q' => (),
            _ => return None,
        }
    }
    regex_builder.build().ok()
}

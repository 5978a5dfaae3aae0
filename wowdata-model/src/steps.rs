//! Named verification and cleaning steps.
//!
//! A step is an operation plus an ordered argument list in which
//! [`Arg::Input`] stands for the value under test. Verify operations answer
//! pass/fail and never change the value; clean operations return the
//! normalized value. Both dispatch through a fixed operation table.

use regex_lite::Regex;
use std::sync::LazyLock;
use wowdata_types::Value;

/// Letters allowed in character names besides ASCII `a-zA-Z`.
const NAME_LETTERS: &str = "ŠŒŽšœžŸÀÁÂÃÄÅÆÇÈÉÊËÌÍÎÏÐÑÒÓÔÕÖØÙÚÛÜÝÞßàáâãäåæçèéêëìíîïðñòóôõöøùúûüýþÿАБВГҐДЂЃЕЀЁЄЖЗЅИЍІЇЙЈКЛЉМНЊОПРСТЋЌУЎФХЦЧЏШЩЪЫЬЭЮЯ";

/// Characters stripped by the trimming clean operations.
const TRIM_CHARS: &[char] = &[' ', '\t', '\n', '\r', '\0', '\u{0B}'];

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*(?:>|$)").expect("tag pattern is valid"));

/// A step argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Replaced by the value being verified or cleaned.
    Input,
    Literal(Value),
}

impl Arg {
    pub fn lit(value: impl Into<Value>) -> Self {
        Arg::Literal(value.into())
    }
}

/// Verification operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOp {
    Integer,
    PositiveInteger,
    NonNegativeInteger,
    Id,
    Float,
    PositiveFloat,
    NonNegativeFloat,
    String,
    /// `(input, min?, max?)`, byte length bounds.
    StringLength,
    /// `(input, list)`, membership by text rendering.
    StringAgainstMap,
    CharacterName,
    GuildName,
    FileName,
    FilePath,
    Key,
    /// `(input, max, chars?)`, no run longer than `max` of one character.
    MaxRepeatedChars,
    ImageString,
}

/// Cleaning operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanOp {
    Boolean,
    Integer,
    NonNegativeInteger,
    PositiveInteger,
    Id,
    Float,
    NonNegativeFloat,
    PositiveFloat,
    ItemName,
    GuildName,
    CharacterName,
    FileName,
    FilePath,
    Key,
    NoHtml,
    /// `(input, max)`, keep at most `max` characters.
    Truncate,
}

type VerifyFn = fn(&[Value]) -> bool;
type CleanFn = fn(&[Value]) -> Value;

impl VerifyOp {
    fn handler(self) -> VerifyFn {
        match self {
            VerifyOp::Integer => verify_integer,
            VerifyOp::PositiveInteger | VerifyOp::Id => verify_positive_integer,
            VerifyOp::NonNegativeInteger => verify_non_negative_integer,
            VerifyOp::Float => verify_float,
            VerifyOp::PositiveFloat => verify_positive_float,
            VerifyOp::NonNegativeFloat => verify_non_negative_float,
            VerifyOp::String => verify_string,
            VerifyOp::StringLength => verify_string_length,
            VerifyOp::StringAgainstMap => verify_string_against_map,
            VerifyOp::CharacterName => verify_character_name,
            VerifyOp::GuildName => verify_guild_name,
            VerifyOp::FileName => verify_file_name,
            VerifyOp::FilePath => verify_file_path,
            VerifyOp::Key => verify_key,
            VerifyOp::MaxRepeatedChars => verify_max_repeated_chars,
            VerifyOp::ImageString => verify_image_string,
        }
    }
}

impl CleanOp {
    fn handler(self) -> CleanFn {
        match self {
            CleanOp::Boolean => clean_boolean,
            CleanOp::Integer => clean_integer,
            CleanOp::NonNegativeInteger => clean_non_negative_integer,
            CleanOp::PositiveInteger | CleanOp::Id => clean_positive_integer,
            CleanOp::Float => clean_float,
            CleanOp::NonNegativeFloat => clean_non_negative_float,
            CleanOp::PositiveFloat => clean_positive_float,
            CleanOp::ItemName => clean_item_name,
            CleanOp::GuildName => clean_guild_name,
            CleanOp::CharacterName => clean_character_name,
            CleanOp::FileName => clean_file_name,
            CleanOp::FilePath => clean_file_path,
            CleanOp::Key => clean_key,
            CleanOp::NoHtml => clean_no_html,
            CleanOp::Truncate => clean_truncate,
        }
    }
}

/// One verification step with the feedback published when it fails.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyStep {
    pub op: VerifyOp,
    pub args: Vec<Arg>,
    pub feedback: String,
}

impl VerifyStep {
    /// A step whose only argument is the input.
    pub fn unary(op: VerifyOp, feedback: &str) -> Self {
        Self::with_args(op, vec![Arg::Input], feedback)
    }

    pub fn with_args(op: VerifyOp, args: Vec<Arg>, feedback: &str) -> Self {
        Self {
            op,
            args,
            feedback: feedback.to_string(),
        }
    }

    /// `StringLength` with optional bounds.
    pub fn length(min: Option<i64>, max: Option<i64>, feedback: &str) -> Self {
        let bound = |b: Option<i64>| b.map(Value::Int).unwrap_or(Value::Null);
        Self::with_args(
            VerifyOp::StringLength,
            vec![Arg::Input, Arg::Literal(bound(min)), Arg::Literal(bound(max))],
            feedback,
        )
    }

    /// `MaxRepeatedChars`, optionally restricted to the given characters.
    pub fn max_repeated(max: i64, chars: Option<&str>, feedback: &str) -> Self {
        let mut args = vec![Arg::Input, Arg::lit(max)];
        if let Some(chars) = chars {
            args.push(Arg::lit(chars));
        }
        Self::with_args(VerifyOp::MaxRepeatedChars, args, feedback)
    }

    /// Runs the step against `input`.
    pub fn passes(&self, input: &Value) -> bool {
        (self.op.handler())(&substitute(&self.args, input))
    }
}

/// One cleaning step.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanStep {
    pub op: CleanOp,
    pub args: Vec<Arg>,
}

impl CleanStep {
    pub fn unary(op: CleanOp) -> Self {
        Self::with_args(op, vec![Arg::Input])
    }

    pub fn with_args(op: CleanOp, args: Vec<Arg>) -> Self {
        Self { op, args }
    }

    /// Runs the step, producing the next value in the pipeline.
    pub fn apply(&self, input: &Value) -> Value {
        (self.op.handler())(&substitute(&self.args, input))
    }
}

fn substitute(args: &[Arg], input: &Value) -> Vec<Value> {
    args.iter()
        .map(|arg| match arg {
            Arg::Input => input.clone(),
            Arg::Literal(v) => v.clone(),
        })
        .collect()
}

fn arg(args: &[Value], index: usize) -> &Value {
    static NULL: Value = Value::Null;
    args.get(index).unwrap_or(&NULL)
}

fn text_arg(args: &[Value], index: usize) -> String {
    arg(args, index).to_text()
}

// ── Character classes ────────────────────────────────────────────

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn is_file_name_char(c: char) -> bool {
    is_key_char(c) || c == '.' || c == ' '
}

fn is_file_path_char(c: char) -> bool {
    is_file_name_char(c) || c == '/'
}

fn is_character_name_char(c: char) -> bool {
    c.is_ascii_alphabetic() || NAME_LETTERS.contains(c)
}

fn is_guild_name_char(c: char) -> bool {
    is_character_name_char(c) || c == ' '
}

fn only(text: &str, allowed: fn(char) -> bool) -> bool {
    text.chars().all(allowed)
}

fn strip(text: &str, allowed: fn(char) -> bool) -> String {
    text.chars().filter(|c| allowed(*c)).collect()
}

fn trimmed(value: &Value) -> String {
    value.to_text().trim_matches(TRIM_CHARS).to_string()
}

/// Uppercases the first letter of every word and lowercases the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word_start = true;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(c);
            word_start = true;
        }
    }
    out
}

// ── Verify operations ────────────────────────────────────────────

fn verify_integer(args: &[Value]) -> bool {
    let input = arg(args, 0);
    input.to_int().to_string() == input.to_text()
}

fn verify_positive_integer(args: &[Value]) -> bool {
    arg(args, 0).to_int() > 0
}

fn verify_non_negative_integer(args: &[Value]) -> bool {
    arg(args, 0).to_int() >= 0
}

fn verify_float(args: &[Value]) -> bool {
    let input = arg(args, 0);
    Value::Float(input.to_float()).to_text() == input.to_text()
}

fn verify_positive_float(args: &[Value]) -> bool {
    arg(args, 0).to_float() > 0.0
}

fn verify_non_negative_float(args: &[Value]) -> bool {
    arg(args, 0).to_float() >= 0.0
}

fn verify_string(args: &[Value]) -> bool {
    matches!(arg(args, 0), Value::Str(_))
}

fn verify_string_length(args: &[Value]) -> bool {
    let len = i64::try_from(text_arg(args, 0).len()).unwrap_or(i64::MAX);
    let min = arg(args, 1);
    let max = arg(args, 2);
    (min.is_null() || len >= min.to_int()) && (max.is_null() || len <= max.to_int())
}

fn verify_string_against_map(args: &[Value]) -> bool {
    let needle = text_arg(args, 0);
    match arg(args, 1) {
        Value::List(items) => items.iter().any(|item| item.to_text() == needle),
        Value::Map(map) => map.values().any(|item| item.to_text() == needle),
        _ => false,
    }
}

fn verify_character_name(args: &[Value]) -> bool {
    only(&text_arg(args, 0), is_character_name_char)
}

fn verify_guild_name(args: &[Value]) -> bool {
    only(&text_arg(args, 0), is_guild_name_char)
}

fn verify_file_name(args: &[Value]) -> bool {
    only(&text_arg(args, 0), is_file_name_char)
}

fn verify_file_path(args: &[Value]) -> bool {
    only(&text_arg(args, 0), is_file_path_char)
}

fn verify_key(args: &[Value]) -> bool {
    only(&text_arg(args, 0), is_key_char)
}

fn verify_max_repeated_chars(args: &[Value]) -> bool {
    let text = text_arg(args, 0);
    let max = usize::try_from(arg(args, 1).to_int().max(1)).unwrap_or(1);
    let watched = match arg(args, 2) {
        Value::Null => None,
        other => Some(other.to_text()),
    };
    let counts = |c: char| watched.as_deref().is_none_or(|set| set.contains(c));

    let mut previous = None;
    let mut run = 0usize;
    for c in text.chars() {
        if previous == Some(c) {
            run += 1;
        } else {
            previous = Some(c);
            run = 1;
        }
        if run > max && counts(c) {
            return false;
        }
    }
    true
}

fn verify_image_string(args: &[Value]) -> bool {
    arg(args, 0).as_bytes().is_some_and(infer::is_image)
}

// ── Clean operations ─────────────────────────────────────────────

fn clean_boolean(args: &[Value]) -> Value {
    Value::Bool(arg(args, 0).truthy())
}

fn clean_integer(args: &[Value]) -> Value {
    Value::Int(arg(args, 0).to_int())
}

fn clean_non_negative_integer(args: &[Value]) -> Value {
    Value::Int(arg(args, 0).to_int().max(0))
}

fn clean_positive_integer(args: &[Value]) -> Value {
    Value::Int(arg(args, 0).to_int().max(1))
}

fn clean_float(args: &[Value]) -> Value {
    Value::Float(arg(args, 0).to_float())
}

fn clean_non_negative_float(args: &[Value]) -> Value {
    Value::Float(arg(args, 0).to_float().max(0.0))
}

fn clean_positive_float(args: &[Value]) -> Value {
    let f = arg(args, 0).to_float();
    Value::Float(if f <= 0.0 { 1.0 } else { f })
}

fn clean_item_name(args: &[Value]) -> Value {
    Value::Str(trimmed(arg(args, 0)))
}

fn clean_guild_name(args: &[Value]) -> Value {
    Value::Str(strip(&trimmed(arg(args, 0)), is_guild_name_char))
}

fn clean_character_name(args: &[Value]) -> Value {
    let name = strip(&trimmed(arg(args, 0)), is_character_name_char);
    Value::Str(title_case(&name))
}

fn clean_file_name(args: &[Value]) -> Value {
    Value::Str(strip(&trimmed(arg(args, 0)), is_file_name_char))
}

fn clean_file_path(args: &[Value]) -> Value {
    Value::Str(strip(&trimmed(arg(args, 0)), is_file_path_char))
}

fn clean_key(args: &[Value]) -> Value {
    Value::Str(strip(&trimmed(arg(args, 0)), is_key_char))
}

fn clean_no_html(args: &[Value]) -> Value {
    Value::Str(HTML_TAG.replace_all(&trimmed(arg(args, 0)), "").into_owned())
}

fn clean_truncate(args: &[Value]) -> Value {
    let text = text_arg(args, 0);
    let max = usize::try_from(arg(args, 1).to_int().max(0)).unwrap_or(0);
    Value::Str(text.chars().take(max).collect())
}

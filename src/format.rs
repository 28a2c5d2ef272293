// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turning log arguments into text.
//!
//! A log call takes a slice of [`Arg`]s. Each argument renders according to its kind and the
//! renderings are concatenated with no separator:
//!
//! | kind                          | rendering                         |
//! |-------------------------------|-----------------------------------|
//! | integer / float               | `[42]`, `[1.5]`                   |
//! | text that parses as a number  | `[7]`                             |
//! | other text                    | verbatim                          |
//! | null                          | `[NULL]`                          |
//! | bool                          | `[TRUE]` / `[FALSE]`              |
//! | structured (JSON value)       | `[` pretty-printed JSON `]`       |
//! | [`LogString`] implementor     | `[` its `to_log_string(level)` `]`|
//! | [`ErrorValue`] implementor    | `Exception in f(l): msg` + trace  |
//! | anything [`Display`]          | its `Display` output              |
//!
//! ```
//! use logstack::{args, render, Level};
//!
//! assert_eq!(render(Level::INFO, args!["took ", 42, "ms ", None::<i32>, true]),
//!            "took [42]ms [NULL][TRUE]");
//! ```

use crate::level::Level;
use std::borrow::Cow;
use std::fmt::Display;
use std::panic::Location;

/**
Lets a type choose how it appears when passed as a log argument.

The result is wrapped in square brackets.
*/
pub trait LogString {
    fn to_log_string(&self, level: Level) -> String;
}

/// Where an error was raised.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.file, self.line)
    }
}

/**
A caught error, as far as logging is concerned.

Rendering an `ErrorValue` is the only rule that produces several lines: a header line
followed by the trace.
*/
pub trait ErrorValue {
    fn location(&self) -> SourceLocation;
    fn message(&self) -> String;
    fn trace(&self) -> String;
}

/**
An [`ErrorValue`] built from any [`std::error::Error`], capturing the call site and a backtrace.

```
use logstack::{args, render, CaughtError, Level};

let err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such widget");
let caught = CaughtError::new(&err);
let text = render(Level::ERROR, args![logstack::Arg::error(&caught)]);
assert!(text.starts_with("Exception in "));
assert!(text.contains("no such widget"));
```
*/
#[derive(Debug, Clone)]
pub struct CaughtError {
    location: SourceLocation,
    message: String,
    trace: String,
}

impl CaughtError {
    #[track_caller]
    pub fn new(error: &dyn std::error::Error) -> Self {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::from_message(message)
    }

    #[track_caller]
    pub fn from_message(message: impl Into<String>) -> Self {
        let caller = Location::caller();
        CaughtError {
            location: SourceLocation {
                file: caller.file().to_string(),
                line: caller.line(),
            },
            message: message.into(),
            trace: capture_trace(),
        }
    }

    /// Replaces the captured trace, for errors whose trace was recorded elsewhere.
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = trace.into();
        self
    }
}

impl ErrorValue for CaughtError {
    fn location(&self) -> SourceLocation {
        self.location.clone()
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn trace(&self) -> String {
        self.trace.clone()
    }
}

fn capture_trace() -> String {
    let backtrace = backtrace::Backtrace::new();
    let mut lines = Vec::new();
    for frame in backtrace.frames() {
        for symbol in frame.symbols() {
            let Some(name) = symbol.name() else { continue };
            let name = format!("{:#}", name);
            if name.starts_with("backtrace::") || name.contains("CaughtError::") {
                continue;
            }
            let line = match (symbol.filename(), symbol.lineno()) {
                (Some(file), Some(line)) => {
                    format!("#{} {}({}): {}()", lines.len(), file.display(), line, name)
                }
                _ => format!("#{} {}()", lines.len(), name),
            };
            lines.push(line);
        }
    }
    lines.push(format!("#{} {{main}}", lines.len()));
    lines.join("\n")
}

/**
One log argument.

Construct with `From` for plain values (numbers, text, bools, options, JSON values) or with
[`Arg::custom`], [`Arg::error`], [`Arg::display`] for borrowed trait objects. The [`args!`](crate::args)
macro does the `From` conversion for a whole list.
*/
pub enum Arg<'a> {
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(Cow<'a, str>),
    Null,
    Bool(bool),
    Structured(serde_json::Value),
    Custom(&'a dyn LogString),
    Error(&'a dyn ErrorValue),
    Display(&'a dyn Display),
}

impl<'a> Arg<'a> {
    pub fn custom(value: &'a dyn LogString) -> Self {
        Arg::Custom(value)
    }

    pub fn error(value: &'a dyn ErrorValue) -> Self {
        Arg::Error(value)
    }

    pub fn display(value: &'a dyn Display) -> Self {
        Arg::Display(value)
    }

    pub fn structured(value: impl Into<serde_json::Value>) -> Self {
        Arg::Structured(value.into())
    }

    fn render_into(&self, level: Level, out: &mut String) {
        match self {
            Arg::Int(value) => bracket(out, &value.to_string()),
            Arg::UInt(value) => bracket(out, &value.to_string()),
            Arg::Float(value) => bracket(out, &value.to_string()),
            Arg::Text(text) if is_numeric(text) => bracket(out, text),
            Arg::Text(text) => out.push_str(text),
            Arg::Null => out.push_str("[NULL]"),
            Arg::Bool(true) => out.push_str("[TRUE]"),
            Arg::Bool(false) => out.push_str("[FALSE]"),
            Arg::Structured(value) => {
                let dump = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
                bracket(out, &dump);
            }
            Arg::Custom(value) => bracket(out, &value.to_log_string(level)),
            Arg::Error(error) => {
                out.push_str(&format!(
                    "Exception in {}: {}\n{}",
                    error.location(),
                    error.message(),
                    error.trace()
                ));
            }
            Arg::Display(value) => out.push_str(&value.to_string()),
        }
    }
}

fn bracket(out: &mut String, inner: &str) {
    out.push('[');
    out.push_str(inner);
    out.push(']');
}

macro_rules! from_int {
    ($variant:ident, $wide:ty, $($t:ty),*) => {
        $(
            impl From<$t> for Arg<'_> {
                fn from(value: $t) -> Self {
                    Arg::$variant(value as $wide)
                }
            }
        )*
    };
}

from_int!(Int, i64, i8, i16, i32, i64, isize);
from_int!(UInt, u64, u8, u16, u32, u64, usize);

impl From<f32> for Arg<'_> {
    fn from(value: f32) -> Self {
        Arg::Float(value as f64)
    }
}

impl From<f64> for Arg<'_> {
    fn from(value: f64) -> Self {
        Arg::Float(value)
    }
}

impl From<bool> for Arg<'_> {
    fn from(value: bool) -> Self {
        Arg::Bool(value)
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(value: &'a str) -> Self {
        Arg::Text(Cow::Borrowed(value))
    }
}

impl<'a> From<&'a String> for Arg<'a> {
    fn from(value: &'a String) -> Self {
        Arg::Text(Cow::Borrowed(value.as_str()))
    }
}

impl From<String> for Arg<'_> {
    fn from(value: String) -> Self {
        Arg::Text(Cow::Owned(value))
    }
}

impl<'a> From<Cow<'a, str>> for Arg<'a> {
    fn from(value: Cow<'a, str>) -> Self {
        Arg::Text(value)
    }
}

impl From<serde_json::Value> for Arg<'_> {
    fn from(value: serde_json::Value) -> Self {
        Arg::Structured(value)
    }
}

impl<'a, T: Into<Arg<'a>>> From<Option<T>> for Arg<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Arg::Null, Into::into)
    }
}

impl std::fmt::Debug for Arg<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arg::Int(value) => f.debug_tuple("Int").field(value).finish(),
            Arg::UInt(value) => f.debug_tuple("UInt").field(value).finish(),
            Arg::Float(value) => f.debug_tuple("Float").field(value).finish(),
            Arg::Text(value) => f.debug_tuple("Text").field(value).finish(),
            Arg::Null => f.write_str("Null"),
            Arg::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            Arg::Structured(value) => f.debug_tuple("Structured").field(value).finish(),
            Arg::Custom(_) => f.write_str("Custom(..)"),
            Arg::Error(error) => f.debug_tuple("Error").field(&error.message()).finish(),
            Arg::Display(value) => f.debug_tuple("Display").field(&value.to_string()).finish(),
        }
    }
}

/*
Boilerplate notes for Arg:

Debug is hand-written because the borrowed trait objects are not Debug.
Clone would work (every payload is Clone or a shared reference) but nothing needs it.
PartialEq makes no sense for trait objects.
Default, Display: no.
*/

/**
Renders a full argument list into one string.

Line splitting and prefixing are the logger's job; the result may contain newlines.
*/
pub fn render(level: Level, args: &[Arg<'_>]) -> String {
    let mut out = String::new();
    for arg in args {
        arg.render_into(level, &mut out);
    }
    out
}

/**
Whether `text` reads as a decimal number: optional surrounding whitespace, optional sign,
digits with an optional fraction (or a bare fraction like `.5`), and an optional exponent.

Hex, `inf` and `NaN` are not numbers here.
*/
pub fn is_numeric(text: &str) -> bool {
    let bytes = text
        .trim_matches(|c: char| matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0B' | '\x0C'))
        .as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }
    if digits == 0 {
        return false;
    }
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }
    i == bytes.len()
}

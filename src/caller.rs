// SPDX-License-Identifier: MIT OR Apache-2.0

//! Finding the code that actually asked for a log line.
//!
//! Every line a [`Logger`](crate::Logger) writes starts with a prefix naming its caller:
//!
//! ```text
//! 14:03:59 [4242][6]: billing::Invoice::settle(): charged [3] cards
//! ```
//!
//! The call stack at the moment of logging is full of frames that are not interesting: the
//! logger itself, the stack that forwarded to it, the `log` crate bridge, the runtime, closures
//! that merely shim a call. [`CallerResolver`] captures the stack with the `backtrace` crate and
//! walks it outward, skipping everything a [`SkipSet`] excludes, and names the first frame left.
//!
//! # Custom prefixes
//!
//! A backtrace carries no receivers, so types that want to name themselves register for the
//! current thread with [`prefix_scope`]:
//!
//! ```
//! use logstack::{prefix_scope, Level, LogPrefix};
//! use std::rc::Rc;
//!
//! struct Session { user: String }
//!
//! impl LogPrefix for Session {
//!     fn to_log_prefix(&self, _level: Level) -> String {
//!         format!("Session({})", self.user)
//!     }
//! }
//!
//! let session = Rc::new(Session { user: "ada".to_string() });
//! let _scope = prefix_scope(session.clone());
//! // methods of `Session` that log now print `Session(ada)::method(): ...`
//! ```

use crate::level::Level;
use chrono::{DateTime, Local};
use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::marker::PhantomData;
use std::rc::Rc;

/**
Lets a type choose the leading segment of the prefix for lines logged from its methods.

Only takes effect while the value is registered with [`prefix_scope`].
*/
pub trait LogPrefix {
    fn to_log_prefix(&self, level: Level) -> String;
}

/**
One frame of a call stack, reduced to what prefix generation needs.

`owner` is the full path of the type for methods; free functions have no owner and keep their
module path in `module`.
*/
#[derive(Clone, Default)]
pub struct Frame {
    pub owner: Option<String>,
    pub module: Option<String>,
    pub function: Option<String>,
    pub receiver: Option<Rc<dyn LogPrefix>>,
}

impl Frame {
    pub fn method(owner: impl Into<String>, function: impl Into<String>) -> Self {
        Frame {
            owner: Some(owner.into()),
            function: Some(function.into()),
            ..Frame::default()
        }
    }

    pub fn free(module: impl Into<String>, function: impl Into<String>) -> Self {
        Frame {
            module: Some(module.into()),
            function: Some(function.into()),
            ..Frame::default()
        }
    }

    pub fn with_receiver(mut self, receiver: Rc<dyn LogPrefix>) -> Self {
        self.receiver = Some(receiver);
        self
    }

    /**
    Builds a frame from a demangled symbol name.

    ```
    use logstack::Frame;

    let frame = Frame::parse("shop::cart::Cart::checkout::{{closure}}").unwrap();
    assert_eq!(frame.owner.as_deref(), Some("shop::cart::Cart"));
    assert_eq!(frame.function.as_deref(), Some("checkout"));

    let frame = Frame::parse("<shop::Cart as core::fmt::Debug>::fmt").unwrap();
    assert_eq!(frame.owner.as_deref(), Some("shop::Cart"));

    let frame = Frame::parse("shop::main").unwrap();
    assert_eq!(frame.owner, None);
    assert_eq!(frame.module.as_deref(), Some("shop"));
    ```
    */
    pub fn parse(symbol: &str) -> Option<Frame> {
        let mut segments = split_path(symbol.trim());
        while let Some(last) = segments.last() {
            let noise = last.starts_with("{{closure")
                || last.starts_with("{closure")
                || last.starts_with("{shim")
                || last.starts_with('<') && segments.len() > 1
                || is_hash(last);
            if !noise {
                break;
            }
            segments.pop();
        }
        let function = segments.pop()?;
        let function = strip_generics(&function);
        if function.is_empty() {
            return None;
        }
        let Some(parent) = segments.last() else {
            return Some(Frame {
                function: Some(function),
                ..Frame::default()
            });
        };
        if let Some(qualified) = parent.strip_prefix('<').and_then(|p| p.strip_suffix('>')) {
            let self_type = split_top_level(qualified, " as ")
                .into_iter()
                .next()
                .unwrap_or_default();
            return Some(Frame::method(strip_generics(strip_pointer(&self_type)), function));
        }
        let parent_path = segments
            .iter()
            .map(|segment| strip_generics(segment))
            .collect::<Vec<_>>()
            .join("::");
        if strip_generics(parent).starts_with(|c: char| c.is_ascii_uppercase()) {
            Some(Frame::method(parent_path, function))
        } else {
            Some(Frame::free(parent_path, function))
        }
    }

    /// The crate this frame belongs to, taken from the first path segment.
    pub fn crate_name(&self) -> Option<&str> {
        let path = self.owner.as_deref().or(self.module.as_deref())?;
        path.split("::").next().filter(|name| !name.is_empty())
    }
}

impl Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("owner", &self.owner)
            .field("module", &self.module)
            .field("function", &self.function)
            .field("receiver", &self.receiver.is_some())
            .finish()
    }
}

fn is_hash(segment: &str) -> bool {
    segment.len() == 17
        && segment.starts_with('h')
        && segment[1..].bytes().all(|b| b.is_ascii_hexdigit())
}

/// `&T`, `&mut T`, `*const T` and `*mut T` all name `T`.
fn strip_pointer(self_type: &str) -> &str {
    let mut rest = self_type.trim();
    loop {
        let next = rest
            .strip_prefix('&')
            .or_else(|| rest.strip_prefix("*const "))
            .or_else(|| rest.strip_prefix("*mut "))
            .or_else(|| rest.strip_prefix("mut "))
            .map(str::trim_start);
        match next {
            Some(next) => rest = next,
            None => return rest,
        }
    }
}

/// Splits on `::` outside of angle brackets.
fn split_path(path: &str) -> Vec<String> {
    split_top_level(path, "::")
}

fn split_top_level(text: &str, separator: &str) -> Vec<String> {
    // separators are ASCII, so every split point is a char boundary
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;
    let bytes = text.as_bytes();
    while i < bytes.len() {
        match bytes[i] {
            b'<' | b'{' | b'(' | b'[' => depth += 1,
            b'>' | b'}' | b')' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if depth == 0 && bytes[i..].starts_with(separator.as_bytes()) {
            parts.push(text[start..i].to_string());
            i += separator.len();
            start = i;
            continue;
        }
        i += 1;
    }
    parts.push(text[start..].to_string());
    parts
}

fn strip_generics(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut depth = 0usize;
    for c in segment.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/**
Frames that never count as "the caller".

A frame is skipped when any of these hold:

* its owning type is one of `types` (any method of that type);
* it is a free function whose name is one of `functions`;
* its crate is one of `crates`;
* it has no symbol information, or a symbol with no Rust path.

The [`Default`] set covers this crate's own types, call-forwarding shims, and the runtime.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipSet {
    types: Vec<String>,
    functions: Vec<String>,
    crates: Vec<String>,
}

impl SkipSet {
    pub fn empty() -> Self {
        SkipSet {
            types: Vec::new(),
            functions: Vec::new(),
            crates: Vec::new(),
        }
    }

    pub fn with_type(mut self, path: impl AsRef<str>) -> Self {
        self.types.push(strip_generics(path.as_ref()));
        self
    }

    pub fn with_type_of<T: ?Sized>(self) -> Self {
        self.with_type(std::any::type_name::<T>())
    }

    pub fn with_function(mut self, name: impl Into<String>) -> Self {
        self.functions.push(name.into());
        self
    }

    pub fn with_crate(mut self, name: impl Into<String>) -> Self {
        self.crates.push(name.into());
        self
    }

    pub fn skips(&self, frame: &Frame) -> bool {
        if frame.owner.is_none() && frame.module.is_none() {
            // unsymbolized, or a foreign symbol such as the unwinder's
            return true;
        }
        if let Some(name) = frame.crate_name() {
            if self.crates.iter().any(|c| c == name) {
                return true;
            }
        }
        match (&frame.owner, &frame.function) {
            (Some(owner), _) => self.types.iter().any(|t| t == owner),
            (None, Some(function)) => self.functions.iter().any(|f| f == function),
            (None, None) => true,
        }
    }
}

impl Default for SkipSet {
    fn default() -> Self {
        let set = SkipSet::empty()
            .with_type_of::<crate::logger::Logger>()
            .with_type_of::<crate::stack::LoggerStack>()
            .with_type_of::<crate::facade::StackFacade>()
            .with_type_of::<CallerResolver>();
        let set = [
            "call",
            "call_mut",
            "call_once",
            "__rust_begin_short_backtrace",
            "__rust_end_short_backtrace",
            "begin_panic",
            "panic_fmt",
        ]
        .into_iter()
        .fold(set, SkipSet::with_function);
        ["std", "core", "alloc", "backtrace", "log", "test"]
            .into_iter()
            .fold(set, SkipSet::with_crate)
    }
}

type Registration = (u64, String, Rc<dyn LogPrefix>);

thread_local! {
    static RECEIVERS: RefCell<Vec<Registration>> = const { RefCell::new(Vec::new()) };
    static NEXT_SCOPE: Cell<u64> = const { Cell::new(0) };
}

/**
Registers `receiver` as the prefix source for frames whose owner is `T`, until the guard drops.

Scopes nest; the most recent live registration for a type wins. Guards may drop in any order:
each one removes only its own registration.
*/
#[must_use = "the prefix is unregistered when the guard drops"]
pub fn prefix_scope<T: LogPrefix + 'static>(receiver: Rc<T>) -> PrefixScope {
    let owner = strip_generics(std::any::type_name::<T>());
    let id = NEXT_SCOPE.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    });
    RECEIVERS.with(|receivers| {
        receivers
            .borrow_mut()
            .push((id, owner, receiver as Rc<dyn LogPrefix>));
    });
    PrefixScope {
        id,
        _not_send: PhantomData,
    }
}

/// Guard returned by [`prefix_scope`].
#[derive(Debug)]
pub struct PrefixScope {
    id: u64,
    _not_send: PhantomData<Rc<()>>,
}

impl Drop for PrefixScope {
    fn drop(&mut self) {
        RECEIVERS.with(|receivers| {
            receivers.borrow_mut().retain(|(id, _, _)| *id != self.id);
        });
    }
}

fn attach_receivers(frames: &mut [Frame]) {
    RECEIVERS.with(|receivers| {
        let receivers = receivers.borrow();
        if receivers.is_empty() {
            return;
        }
        for frame in frames.iter_mut() {
            let Some(owner) = &frame.owner else { continue };
            if let Some((_, _, receiver)) = receivers.iter().rev().find(|(_, t, _)| t == owner) {
                frame.receiver = Some(receiver.clone());
            }
        }
    });
}

/**
Captures call stacks and turns them into line prefixes.
*/
#[derive(Debug, Clone, Default)]
pub struct CallerResolver {
    skip: SkipSet,
}

impl CallerResolver {
    pub fn new(skip: SkipSet) -> Self {
        CallerResolver { skip }
    }

    pub fn skip_set(&self) -> &SkipSet {
        &self.skip
    }

    /**
    Captures the current thread's stack, innermost frame first.

    The walk stops after the first frame the skip set keeps, since nothing further out can
    affect the prefix. Inlined calls appear as their own frames. Registered [`prefix_scope`]
    receivers are attached.
    */
    pub fn capture(&self) -> Vec<Frame> {
        let mut frames = Vec::new();
        let mut found = false;
        backtrace::trace(|raw| {
            backtrace::resolve_frame(raw, |symbol| {
                if found {
                    return;
                }
                let frame = symbol
                    .name()
                    .and_then(|name| Frame::parse(&format!("{:#}", name)))
                    .unwrap_or_default();
                found = !self.skip.skips(&frame);
                frames.push(frame);
            });
            !found
        });
        attach_receivers(&mut frames);
        frames
    }

    /// The first frame the skip set does not exclude, walking outward.
    pub fn resolve<'f>(&self, frames: &'f [Frame]) -> Option<&'f Frame> {
        frames.iter().find(|frame| !self.skip.skips(frame))
    }

    /**
    The caller part of a prefix: `Owner::function(): `, `function(): `, `Owner: ` or nothing.

    ```
    use logstack::{CallerResolver, Frame, Level};

    let resolver = CallerResolver::default();
    let frames = [
        Frame::method("logstack::logger::Logger", "log"),
        Frame::method("shop::Cart", "checkout"),
    ];
    assert_eq!(resolver.caller_segment(&frames, Level::INFO), "shop::Cart::checkout(): ");
    ```
    */
    pub fn caller_segment(&self, frames: &[Frame], level: Level) -> String {
        let Some(frame) = self.resolve(frames) else {
            return String::new();
        };
        let lead = match &frame.receiver {
            Some(receiver) => Some(receiver.to_log_prefix(level)),
            None => frame.owner.clone(),
        }
        .filter(|lead| !lead.is_empty());
        match (lead, &frame.function) {
            (Some(lead), Some(function)) => format!("{lead}::{function}(): "),
            (None, Some(function)) => format!("{function}(): "),
            (Some(lead), None) => format!("{lead}: "),
            (None, None) => String::new(),
        }
    }

    /**
    The full line prefix for `frames`: `HH:MM:SS [pid][level]: ` followed by the caller segment.

    `level` is the message's level, not the logger's threshold; receivers see the same value.
    */
    pub fn resolve_prefix(&self, frames: &[Frame], level: Level, now: DateTime<Local>) -> String {
        format!(
            "{} [{}][{}]: {}",
            now.format("%H:%M:%S"),
            std::process::id(),
            level,
            self.caller_segment(frames, level)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct Marker {
        name: &'static str,
    }

    impl Marker {
        fn segment(&self, resolver: &CallerResolver) -> String {
            let frames = resolver.capture();
            resolver.caller_segment(&frames, Level::INFO)
        }
    }

    impl LogPrefix for Marker {
        fn to_log_prefix(&self, level: Level) -> String {
            format!("marker:{}@{}", self.name, level)
        }
    }

    fn logger_frame() -> Frame {
        Frame::method("logstack::logger::Logger", "log")
    }

    #[test]
    fn parse_method_and_free_function() {
        let frame = Frame::parse("app::jobs::Runner::tick").unwrap();
        assert_eq!(frame.owner.as_deref(), Some("app::jobs::Runner"));
        assert_eq!(frame.function.as_deref(), Some("tick"));

        let frame = Frame::parse("app::jobs::spawn_all").unwrap();
        assert_eq!(frame.owner, None);
        assert_eq!(frame.module.as_deref(), Some("app::jobs"));
        assert_eq!(frame.function.as_deref(), Some("spawn_all"));
        assert_eq!(frame.crate_name(), Some("app"));
    }

    #[test]
    fn parse_strips_noise() {
        let frame = Frame::parse("app::Runner<T>::tick::{{closure}}::{{closure}}").unwrap();
        assert_eq!(frame.owner.as_deref(), Some("app::Runner"));
        assert_eq!(frame.function.as_deref(), Some("tick"));

        let frame = Frame::parse("app::Runner::tick::h0123456789abcdef").unwrap();
        assert_eq!(frame.function.as_deref(), Some("tick"));

        let frame =
            Frame::parse("<alloc::boxed::Box<F,A> as core::ops::function::FnOnce<Args>>::call_once")
                .unwrap();
        assert_eq!(frame.owner.as_deref(), Some("alloc::boxed::Box"));
        assert_eq!(frame.function.as_deref(), Some("call_once"));
        assert_eq!(frame.crate_name(), Some("alloc"));
    }

    #[test]
    fn parse_sees_through_reference_receivers() {
        let frame = Frame::parse("<&app::Cart as core::fmt::Debug>::fmt").unwrap();
        assert_eq!(frame.owner.as_deref(), Some("app::Cart"));
        assert_eq!(frame.crate_name(), Some("app"));

        let frame = Frame::parse("<&mut app::Cart<T> as app::Checkout>::pay").unwrap();
        assert_eq!(frame.owner.as_deref(), Some("app::Cart"));
        assert_eq!(frame.function.as_deref(), Some("pay"));

        let skip = SkipSet::empty().with_type("app::Cart");
        assert!(skip.skips(&Frame::parse("<&&app::Cart as app::Checkout>::pay").unwrap()));
    }

    #[test]
    fn skips_any_number_of_internal_frames() {
        let resolver = CallerResolver::default();
        for depth in 0..6 {
            let mut frames = vec![Frame::default(); 2];
            frames.extend((0..depth).map(|_| logger_frame()));
            frames.push(Frame::method("logstack::stack::LoggerStack", "info"));
            frames.push(Frame::free("std::rt", "call_once"));
            frames.push(Frame::method("app::Worker", "run"));
            frames.push(Frame::free("app", "main"));
            let found = resolver.resolve(&frames).unwrap();
            assert_eq!(found.owner.as_deref(), Some("app::Worker"));
        }
    }

    #[test]
    fn skip_function_names_only_apply_to_free_functions() {
        let skip = SkipSet::empty().with_function("dispatch");
        assert!(skip.skips(&Frame::free("app", "dispatch")));
        assert!(!skip.skips(&Frame::method("app::Router", "dispatch")));
    }

    #[test]
    fn exhausted_stack_gives_empty_segment() {
        let resolver = CallerResolver::default();
        let frames = vec![logger_frame(), Frame::default()];
        assert!(resolver.resolve(&frames).is_none());
        assert_eq!(resolver.caller_segment(&frames, Level::INFO), "");
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 3).unwrap();
        assert_eq!(
            resolver.resolve_prefix(&frames, Level::ERROR, now),
            format!("07:05:03 [{}][3]: ", std::process::id())
        );
    }

    #[test]
    fn segment_shapes() {
        let resolver = CallerResolver::new(SkipSet::empty());
        assert_eq!(
            resolver.caller_segment(&[Frame::free("app", "main")], Level::INFO),
            "main(): "
        );
        let owner_only = Frame {
            owner: Some("app::Thing".to_string()),
            ..Frame::default()
        };
        assert_eq!(resolver.caller_segment(&[owner_only], Level::INFO), "app::Thing: ");
    }

    #[test]
    fn receiver_overrides_owner() {
        let resolver = CallerResolver::default();
        let marker: Rc<dyn LogPrefix> = Rc::new(Marker { name: "p" });
        let frames = [
            logger_frame(),
            Frame::method("app::Worker", "run").with_receiver(marker),
        ];
        assert_eq!(
            resolver.caller_segment(&frames, Level::NOTICE),
            "marker:p@5::run(): "
        );
    }

    #[test]
    fn live_capture_finds_the_method() {
        let resolver = CallerResolver::default();
        let marker = Marker { name: "live" };
        let segment = marker.segment(&resolver);
        assert!(
            segment.ends_with("Marker::segment(): "),
            "unexpected caller segment {segment:?}"
        );
    }

    #[test]
    fn live_capture_uses_registered_receiver() {
        let resolver = CallerResolver::default();
        let marker = Rc::new(Marker { name: "scoped" });
        {
            let _scope = prefix_scope(marker.clone());
            assert_eq!(marker.segment(&resolver), "marker:scoped@6::segment(): ");
        }
        assert!(marker.segment(&resolver).ends_with("Marker::segment(): "));
    }

    #[test]
    fn scopes_may_end_out_of_order() {
        let resolver = CallerResolver::default();
        let outer = Rc::new(Marker { name: "outer" });
        let inner = Rc::new(Marker { name: "inner" });
        let outer_scope = prefix_scope(outer.clone());
        let inner_scope = prefix_scope(inner.clone());
        assert_eq!(outer.segment(&resolver), "marker:inner@6::segment(): ");

        drop(outer_scope);
        assert_eq!(outer.segment(&resolver), "marker:inner@6::segment(): ");

        let again = prefix_scope(outer.clone());
        drop(inner_scope);
        assert_eq!(outer.segment(&resolver), "marker:outer@6::segment(): ");
        drop(again);
        assert!(outer.segment(&resolver).ends_with("Marker::segment(): "));
    }
}

//! The script environment: diagnostic builtins, print capture and `re`.

use super::{GroupedOutput, RuleModuleOutput};
use regex::Regex;
use rhai::{Array, Dynamic, Engine, EvalAltResult, ImmutableString, Module as RhaiModule};
use std::sync::{Arc, Mutex, PoisonError};

pub(crate) type RhaiResultOf<T> = Result<T, Box<EvalAltResult>>;

/// Collects diagnostics for the (rule, module) pair currently running.
#[derive(Debug, Default)]
pub(crate) struct Collector {
    current: Option<(String, String)>,
    grouped: GroupedOutput,
}

impl Collector {
    /// Starts a (rule, module) invocation. Its entry exists even if the rule
    /// reports nothing.
    pub fn enter(&mut self, rule: &str, module: &str) {
        self.current = Some((rule.to_string(), module.to_string()));
        self.entry();
    }

    pub fn leave(&mut self) {
        self.current = None;
    }

    fn entry(&mut self) -> Option<&mut RuleModuleOutput> {
        let (rule, module) = self.current.as_ref()?;
        Some(
            self.grouped
                .entry(rule.clone())
                .or_default()
                .entry(module.clone())
                .or_default(),
        )
    }

    pub fn error(&mut self, message: String) {
        if let Some(entry) = self.entry() {
            entry.errors.push(message);
        }
    }

    pub fn output(&mut self, message: String) {
        if let Some(entry) = self.entry() {
            entry.outputs.push(message);
        }
    }

    pub fn take(&mut self) -> GroupedOutput {
        std::mem::take(&mut self.grouped)
    }
}

pub(crate) type SharedCollector = Arc<Mutex<Collector>>;

pub(crate) fn with_collector<R>(collector: &SharedCollector, f: impl FnOnce(&mut Collector) -> R) -> R {
    let mut guard = collector.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}

/// Joins builtin arguments with a single space; strings are not quoted.
fn join(args: &[Dynamic]) -> String {
    args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Nesting limits for rule scripts. rhai's defaults reject a `for` inside a
/// `for` around an `if` with an interpolated string.
const MAX_EXPR_DEPTH: usize = 256;
const MAX_FUNCTION_EXPR_DEPTH: usize = 256;

/// A sandboxed engine: no `throw`, and the `re` module registered.
pub(crate) fn base_engine() -> Engine {
    let mut engine = Engine::new();
    engine.set_max_expr_depths(MAX_EXPR_DEPTH, MAX_FUNCTION_EXPR_DEPTH);
    engine.disable_symbol("throw");
    engine.register_static_module("re", regex_module().into());
    engine
}

/// An engine whose `error`, `fatal` and `print` report into `collector`.
pub(crate) fn lint_engine(collector: &SharedCollector) -> Engine {
    let mut engine = base_engine();

    macro_rules! register_arities {
        ($name:literal, $handler:expr, $( ($($arg:ident),+) ),+ $(,)?) => {
            $({
                let handler = $handler;
                engine.register_fn($name, move |$($arg: Dynamic),+| handler(join(&[$($arg),+])));
            })+
        };
    }

    let errors = Arc::clone(collector);
    let error = move |message: String| with_collector(&errors, |c| c.error(message));
    register_arities!(
        "error",
        error.clone(),
        (a),
        (a, b),
        (a, b, c),
        (a, b, c, d),
        (a, b, c, d, e),
        (a, b, c, d, e, f),
    );

    let fatal = |message: String| -> RhaiResultOf<()> { Err(message.into()) };
    register_arities!(
        "fatal",
        fatal,
        (a),
        (a, b),
        (a, b, c),
        (a, b, c, d),
        (a, b, c, d, e),
        (a, b, c, d, e, f),
    );

    let outputs = Arc::clone(collector);
    engine.on_print(move |text| with_collector(&outputs, |c| c.output(text.to_string())));

    engine
}

fn compile(pattern: &str) -> RhaiResultOf<Regex> {
    Regex::new(pattern).map_err(|err| format!("invalid regex '{}': {}", pattern, err).into())
}

/// `re::is_match`, `re::find`, `re::find_all`, `re::captures`,
/// `re::replace` and `re::split`.
fn regex_module() -> RhaiModule {
    let mut module = RhaiModule::new();

    module.set_native_fn(
        "is_match",
        |pattern: ImmutableString, text: ImmutableString| -> RhaiResultOf<bool> {
            Ok(compile(&pattern)?.is_match(text.as_str()))
        },
    );

    module.set_native_fn(
        "find",
        |pattern: ImmutableString, text: ImmutableString| -> RhaiResultOf<Dynamic> {
            Ok(compile(&pattern)?
                .find(text.as_str())
                .map_or(Dynamic::UNIT, |m| m.as_str().into()))
        },
    );

    module.set_native_fn(
        "find_all",
        |pattern: ImmutableString, text: ImmutableString| -> RhaiResultOf<Array> {
            Ok(compile(&pattern)?
                .find_iter(text.as_str())
                .map(|m| Dynamic::from(m.as_str().to_string()))
                .collect())
        },
    );

    module.set_native_fn(
        "captures",
        |pattern: ImmutableString, text: ImmutableString| -> RhaiResultOf<Dynamic> {
            let re = compile(&pattern)?;
            Ok(re.captures(text.as_str()).map_or(Dynamic::UNIT, |caps| {
                Dynamic::from_array(
                    caps.iter()
                        .map(|group| group.map_or(Dynamic::UNIT, |m| m.as_str().into()))
                        .collect(),
                )
            }))
        },
    );

    module.set_native_fn(
        "replace",
        |pattern: ImmutableString,
         text: ImmutableString,
         replacement: ImmutableString|
         -> RhaiResultOf<String> {
            Ok(compile(&pattern)?
                .replace_all(text.as_str(), replacement.as_str())
                .into_owned())
        },
    );

    module.set_native_fn(
        "split",
        |pattern: ImmutableString, text: ImmutableString| -> RhaiResultOf<Array> {
            Ok(compile(&pattern)?
                .split(text.as_str())
                .map(|part| Dynamic::from(part.to_string()))
                .collect())
        },
    );

    module
}

/// The message a script failure should be reported with.
///
/// Errors raised inside a rule come back wrapped in one layer per script
/// function call; `fatal` and other runtime errors report their bare value.
pub(crate) fn failure_message(err: &EvalAltResult) -> String {
    match err {
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _)
        | EvalAltResult::ErrorInModule(_, inner, _) => failure_message(inner),
        EvalAltResult::ErrorRuntime(value, _) => value.to_string(),
        other => other.to_string(),
    }
}

// ── Macro accessor ────────────────────────────────────────────────────────────
//
// Variable access and expression evaluation.  The only rule enforced here is
// the sigil convention on assignment: `#name` holds a number, `$name` a
// string; anything else is refused before the host sees it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    error::{HmError, Result},
    file::require_exists,
    host::{Host, RawEval},
};

pub mod script;

// ── Values ────────────────────────────────────────────────────────────────────

/// The two kinds of Hidemaru macro variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MacroValue {
    Num(i64),
    Str(String),
}

impl MacroValue {
    pub fn as_num(&self) -> Option<i64> {
        match self {
            Self::Num(n) => Some(*n),
            Self::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Num(_) => None,
            Self::Str(s) => Some(s),
        }
    }
}

impl From<i64> for MacroValue {
    fn from(n: i64) -> Self {
        Self::Num(n)
    }
}

impl From<i32> for MacroValue {
    fn from(n: i32) -> Self {
        Self::Num(n.into())
    }
}

impl From<&str> for MacroValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for MacroValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

/// Sigils that mark an assignable variable name.
const VAR_SIGILS: [char; 2] = ['#', '$'];

/// `true` if `name` follows the `#`/`$` naming convention.
pub fn is_assignable_name(name: &str) -> bool {
    name.starts_with(&VAR_SIGILS[..])
}

// ── Evaluation result ─────────────────────────────────────────────────────────

/// Results at or above this code are successes.
pub const SUCCESS_THRESHOLD: i32 = 1;

/// Failure raised by a macro evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct MacroError {
    pub message: String,
}

/// The outcome of `Macro::eval`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroResult {
    pub result: i32,
    pub message: String,
    /// `Some` exactly when `result` is below [`SUCCESS_THRESHOLD`].
    pub error: Option<MacroError>,
}

impl MacroResult {
    pub fn new(result: i32, message: String, error_message: String) -> Self {
        let error = (result < SUCCESS_THRESHOLD).then(|| MacroError {
            message: if error_message.is_empty() {
                format!("macro evaluation failed (result {result})")
            } else {
                error_message
            },
        });
        Self { result, message, error }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl From<RawEval> for MacroResult {
    fn from(raw: RawEval) -> Self {
        Self::new(raw.result, raw.message, raw.error_message)
    }
}

// ── Facades ───────────────────────────────────────────────────────────────────

/// Indexed access to macro variables.
pub struct Vars<'h, H: Host + ?Sized> {
    host: &'h H,
}

impl<'h, H: Host + ?Sized> Vars<'h, H> {
    pub(crate) fn new(host: &'h H) -> Self {
        Self { host }
    }

    /// Read a variable.
    pub fn get(&self, name: &str) -> Result<MacroValue> {
        self.host.get_var(name)
    }

    /// Assign a variable.
    ///
    /// Names without a `#` or `$` prefix are refused: a diagnostic goes to
    /// the host debug channel and `HmError::InvalidVarName` is returned.  The
    /// host assignment is not attempted.
    pub fn set(&self, name: &str, value: impl Into<MacroValue>) -> Result<()> {
        if !is_assignable_name(name) {
            log::warn!("refusing to assign macro variable without sigil: {name}");
            if let Err(e) = self
                .host
                .debug_info(&format!("macro variable cannot be assigned: {name}"))
            {
                log::debug!("debug channel unavailable: {e}");
            }
            return Err(HmError::InvalidVarName(name.to_owned()));
        }
        self.host.set_var(name, &value.into())
    }
}

/// Macro variables and evaluation.
pub struct Macro<'h, H: Host + ?Sized> {
    host: &'h H,
}

impl<'h, H: Host + ?Sized> Macro<'h, H> {
    pub(crate) fn new(host: &'h H) -> Self {
        Self { host }
    }

    pub fn var(&self) -> Vars<'h, H> {
        Vars::new(self.host)
    }

    /// Evaluate macro source text.  Host-level evaluation failures come back
    /// inside the result; only transport failures are `Err`.
    pub fn eval(&self, expression: &str) -> Result<MacroResult> {
        self.host.eval_macro(expression).map(MacroResult::from)
    }

    /// Run the macro file at `path` as a new macro.
    ///
    /// Fails with `HmError::FileNotFound` before any host call when the path
    /// does not exist.  While another macro is executing the host refuses,
    /// which shows up as result -1 with an error.
    pub fn exec_file(&self, path: impl AsRef<Path>) -> Result<MacroResult> {
        let path = path.as_ref();
        require_exists(path)?;
        self.host.exec_macro_file(path).map(MacroResult::from)
    }

    /// Whether a macro is running in the host right now.
    pub fn is_executing(&self) -> Result<bool> {
        self.host.is_macro_executing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::{Call, MemoryHost};

    #[test]
    fn error_present_iff_below_threshold() {
        for code in [-5, -1, 0] {
            let r = MacroResult::new(code, String::new(), "boom".into());
            assert_eq!(r.error, Some(MacroError { message: "boom".into() }));
            assert!(!r.is_ok());
        }
        for code in [1, 2, 100] {
            let r = MacroResult::new(code, "out".into(), "ignored".into());
            assert_eq!(r.error, None);
            assert_eq!(r.message, "out");
        }
    }

    #[test]
    fn empty_error_message_gets_a_default() {
        let r = MacroResult::new(0, String::new(), String::new());
        assert_eq!(
            r.error.map(|e| e.message),
            Some("macro evaluation failed (result 0)".to_owned())
        );
    }

    #[test]
    fn set_with_sigil_reaches_host() {
        let host = MemoryHost::new();
        let m = Macro::new(&host);
        m.var().set("#count", 3).expect("numeric");
        m.var().set("$name", "abc").expect("string");
        assert_eq!(m.var().get("#count").expect("get"), MacroValue::Num(3));
        assert_eq!(m.var().get("$name").expect("get"), MacroValue::Str("abc".into()));
    }

    #[test]
    fn set_without_sigil_fails_and_never_assigns() {
        let host = MemoryHost::new();
        let m = Macro::new(&host);

        let err = m.var().set("count", 3).expect_err("must refuse");
        assert!(matches!(err, HmError::InvalidVarName(ref n) if n == "count"));

        let calls = host.calls();
        assert!(!calls.iter().any(|c| matches!(c, Call::SetVar(_))));
        assert!(calls.iter().any(|c| matches!(c, Call::DebugInfo(t) if t.contains("count"))));
        assert_eq!(host.debug_log().len(), 1);
    }

    #[test]
    fn diagnostic_precedes_failure_even_if_debug_channel_errors() {
        let host = MemoryHost::new();
        host.fail_debug_info(true);
        let err = Macro::new(&host).var().set("x", "y").expect_err("must refuse");
        assert!(matches!(err, HmError::InvalidVarName(_)));
    }

    #[test]
    fn eval_wraps_host_result() {
        let host = MemoryHost::new();
        host.script_eval(RawEval { result: 0, message: String::new(), error_message: "syntax".into() });
        let r = Macro::new(&host).eval("bogus;").expect("transport ok");
        assert_eq!(r.result, 0);
        assert_eq!(r.error.map(|e| e.message), Some("syntax".to_owned()));

        // Unscripted evaluations succeed.
        let r = Macro::new(&host).eval("beep;").expect("transport ok");
        assert!(r.is_ok());
        assert_eq!(host.evaluated(), vec!["bogus;".to_owned(), "beep;".to_owned()]);
    }

    #[test]
    fn set_rejects_value_of_the_wrong_kind() {
        let host = MemoryHost::new();
        let vars = Macro::new(&host).var();

        assert!(matches!(vars.set("#count", "abc"), Err(HmError::Host(_))));
        assert!(matches!(vars.set("$name", 5), Err(HmError::Host(_))));
        assert_eq!(vars.get("#count").expect("get"), MacroValue::Num(0));
        assert_eq!(vars.get("$name").expect("get"), MacroValue::Str(String::new()));
    }

    #[test]
    fn exec_file_on_missing_path_makes_no_host_call() {
        let host = MemoryHost::new();
        host.set_executing(false);
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.mac");

        let err = Macro::new(&host).exec_file(&missing).expect_err("must fail");
        assert!(matches!(err, HmError::FileNotFound(ref p) if p == &missing));
        assert!(host.calls().is_empty());
    }

    #[test]
    fn exec_file_runs_an_existing_file() {
        let host = MemoryHost::new();
        host.set_executing(false);
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("hello.mac");
        std::fs::write(&path, "message \"hi\";\n").expect("write macro");

        host.script_eval(RawEval { result: 1, message: "done".into(), error_message: String::new() });
        let r = Macro::new(&host).exec_file(&path).expect("transport ok");
        assert!(r.is_ok());
        assert_eq!(r.message, "done");
        assert_eq!(host.calls(), vec![Call::ExecMacroFile(path)]);
    }

    #[test]
    fn exec_file_while_executing_carries_an_error() {
        let host = MemoryHost::new();
        let file = tempfile::NamedTempFile::new().expect("temp file");
        let r = Macro::new(&host).exec_file(file.path()).expect("transport ok");
        assert_eq!(r.result, -1);
        assert!(r.error.is_some());
    }

    #[test]
    fn untagged_value_json() {
        assert_eq!(serde_json::to_string(&MacroValue::Num(7)).expect("num"), "7");
        assert_eq!(serde_json::to_string(&MacroValue::from("a")).expect("str"), r#""a""#);
    }
}

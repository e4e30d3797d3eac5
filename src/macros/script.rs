// ── Macro source builders ─────────────────────────────────────────────────────
//
// The native host implements setters and variable access by evaluating small
// generated macros.  Building the text is pure string work, kept here so it
// can be tested on any platform.

use crate::macros::MacroValue;

/// Quote `text` as a verbatim macro string literal: `@"..."`, with embedded
/// double quotes doubled.
pub fn quote_str(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 3);
    out.push_str("@\"");
    for ch in text.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// `#name = 12;` or `$name = @"...";`.
///
/// Returns `None` when the value kind does not match the name's sigil.
pub fn assignment(name: &str, value: &MacroValue) -> Option<String> {
    match (name.chars().next(), value) {
        (Some('#'), MacroValue::Num(n)) => Some(format!("{name} = {n};\n")),
        (Some('$'), MacroValue::Str(s)) => Some(format!("{name} = {};\n", quote_str(s))),
        _ => None,
    }
}

/// Replace the whole document with `text` as one undo group.
pub fn replace_total_text(text: &str) -> String {
    format!(
        "begingroupundo;\nselectall;\ninsert {};\nendgroupundo;\n",
        quote_str(text)
    )
}

/// Replace the current simple selection, if there is one.
pub fn replace_selected_text(text: &str) -> String {
    format!("if (selecting) {{\ninsert {};\n}}\n", quote_str(text))
}

/// Replace the caret's line, then put the caret back at `(lineno, column)`.
pub fn replace_line_text(text: &str, lineno: i32, column: i32) -> String {
    format!(
        "begingroupundo;\nselectline;\ninsert {};\nmoveto2 {column}, {lineno};\nendgroupundo;\n",
        quote_str(text)
    )
}

/// Hand the value of `name` to an exported function of the DLL that hosts
/// this crate.
///
/// `dll_id` is what `Hidemaru_GetDllFuncCalledType(-1)` reported: `-1` for a
/// DLL bound by the `loaddll` statement, a positive handle for one bound by
/// the `loaddll()` function.  Returns `None` for a name without a sigil.
pub fn hand_var_to_dll(name: &str, dll_id: i32, num_export: &str, str_export: &str) -> Option<String> {
    let export = match name.chars().next()? {
        '#' => num_export,
        '$' => str_export,
        _ => return None,
    };
    let call = if dll_id > 0 {
        format!("dllfuncw({dll_id}, \"{export}\", {name})")
    } else {
        format!("dllfuncw(\"{export}\", {name})")
    };
    Some(format!("#_hmscript_ret = {call};\n"))
}

/// Call `SetBaseDir` of the output pane DLL at `dll_path` for the current
/// window.  The DLL expects the macro engine's own string marshalling, so it
/// is reached through `dllfunc` rather than bound directly.
pub fn pane_set_base_dir(dll_path: &str, dir: &str) -> String {
    format!(
        "#_hmscript_pane = loaddll({});\n\
         #_hmscript_ret = dllfunc(#_hmscript_pane, \"SetBaseDir\", hidemaruhandle(0), {});\n\
         freedll #_hmscript_pane;\n",
        quote_str(dll_path),
        quote_str(dir)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_dir_call_loads_and_frees_the_dll() {
        let src = pane_set_base_dir(r"C:\Hidemaru\HmOutputPane.dll", r"C:\work");
        assert!(src.starts_with(r#"#_hmscript_pane = loaddll(@"C:\Hidemaru\HmOutputPane.dll");"#));
        assert!(src.contains(r#""SetBaseDir", hidemaruhandle(0), @"C:\work");"#));
        assert!(src.ends_with("freedll #_hmscript_pane;\n"));
    }

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(quote_str(r#"say "hi""#), r#"@"say ""hi""""#);
        assert_eq!(quote_str(""), r#"@"""#);
    }

    #[test]
    fn backslashes_pass_through_verbatim() {
        assert_eq!(quote_str(r"C:\tmp\a.txt"), r#"@"C:\tmp\a.txt""#);
    }

    #[test]
    fn assignment_matches_sigil() {
        assert_eq!(assignment("#n", &MacroValue::Num(-4)).as_deref(), Some("#n = -4;\n"));
        assert_eq!(
            assignment("$s", &MacroValue::from("x\"y")).as_deref(),
            Some("$s = @\"x\"\"y\";\n")
        );
        assert_eq!(assignment("#n", &MacroValue::from("str")), None);
        assert_eq!(assignment("$s", &MacroValue::Num(1)), None);
        assert_eq!(assignment("plain", &MacroValue::Num(1)), None);
    }

    #[test]
    fn line_replacement_restores_caret() {
        let src = replace_line_text("abc", 12, 3);
        assert!(src.contains("selectline;"));
        assert!(src.contains("insert @\"abc\";"));
        assert!(src.contains("moveto2 3, 12;"));
    }

    #[test]
    fn selection_replacement_is_guarded() {
        assert!(replace_selected_text("z").starts_with("if (selecting) {"));
    }

    #[test]
    fn dll_call_uses_handle_only_when_positive() {
        assert_eq!(
            hand_var_to_dll("#a", 3, "pn", "ps").as_deref(),
            Some("#_hmscript_ret = dllfuncw(3, \"pn\", #a);\n")
        );
        assert_eq!(
            hand_var_to_dll("$b", -1, "pn", "ps").as_deref(),
            Some("#_hmscript_ret = dllfuncw(\"ps\", $b);\n")
        );
        assert_eq!(hand_var_to_dll("c", 3, "pn", "ps"), None);
    }
}

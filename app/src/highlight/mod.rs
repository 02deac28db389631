//! Nano-style syntax highlighting for text previews.
//!
//! Rule files (`*.nanorc`) declare a syntax name, filename-match regexes
//! and a list of colour rules. A colour rule is either a single regex or a
//! `start=`/`end=` pair colouring the run between the two matches (an
//! unmatched end extends to end-of-input). The pass inserts ANSI SGR
//! escapes so each character carries the last winning rule's colours.

use regex::{Regex, RegexBuilder};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone)]
enum RulePattern {
    Normal(String),
    Surround {
        start: String,
        end: String,
        end_icase: bool,
    },
}

#[derive(Debug, Clone)]
struct ColorRule {
    fg: i32,
    bg: i32,
    icase: bool,
    pattern: RulePattern,
}

#[derive(Debug, Clone)]
struct Syntax {
    name: String,
    file_patterns: Vec<String>,
    rules: Vec<ColorRule>,
}

/// All rule sets found in one rules directory.
#[derive(Debug, Default)]
pub struct SyntaxSet {
    syntaxes: Vec<Syntax>,
}

impl SyntaxSet {
    /// Load every `*.nanorc` file under `dir`. Unreadable files and rules
    /// the regex engine rejects are skipped; an unreadable directory yields
    /// an empty set.
    pub fn load_dir(dir: &Path) -> SyntaxSet {
        let mut set = SyntaxSet::default();
        let Ok(read) = fs::read_dir(dir) else {
            return set;
        };
        for dent in read.flatten() {
            let path = dent.path();
            if path.extension().and_then(|e| e.to_str()) == Some("nanorc") {
                if let Ok(raw) = fs::read_to_string(&path) {
                    if let Some(syntax) = parse_nanorc(&raw) {
                        set.syntaxes.push(syntax);
                    }
                }
            }
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.syntaxes.is_empty()
    }

    /// Name of the syntax that would be applied to `file_name`, if any.
    pub fn syntax_name(&self, file_name: &str) -> Option<&str> {
        self.find(file_name).map(|s| s.name.as_str())
    }

    /// Apply the rules matching `file_name` to `text`. Returns the text
    /// with SGR escapes inserted and the syntax name, or the input
    /// unchanged when no syntax matches. The cancel flag is polled between
    /// rules.
    pub fn highlight(
        &self,
        file_name: &str,
        text: &str,
        cancel: &AtomicBool,
    ) -> (String, Option<String>) {
        let Some(syntax) = self.find(file_name) else {
            return (text.to_string(), None);
        };

        let mut fg = vec![0i32; text.len()];
        let mut bg = vec![0i32; text.len()];

        for rule in &syntax.rules {
            if cancel.load(Ordering::Relaxed) {
                break;
            }
            match &rule.pattern {
                RulePattern::Normal(pat) => {
                    apply_normal(text, pat, rule.fg, rule.bg, rule.icase, &mut fg, &mut bg);
                }
                RulePattern::Surround {
                    start,
                    end,
                    end_icase,
                } => {
                    apply_surround(
                        text, start, end, rule.fg, rule.bg, rule.icase, *end_icase, &mut fg,
                        &mut bg,
                    );
                }
            }
        }

        (emit(text, &fg, &bg), Some(syntax.name.clone()))
    }

    fn find(&self, file_name: &str) -> Option<&Syntax> {
        // Last matching syntax wins, as in the original rule loader.
        let mut found = None;
        for syntax in &self.syntaxes {
            for pat in &syntax.file_patterns {
                if let Some(re) = build_regex(pat, true) {
                    if re.is_match(file_name) {
                        found = Some(syntax);
                        break;
                    }
                }
            }
        }
        found
    }
}

fn build_regex(pattern: &str, icase: bool) -> Option<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(icase)
        .multi_line(true)
        .build()
        .ok()
}

fn apply_normal(
    text: &str,
    pattern: &str,
    fg: i32,
    bg: i32,
    icase: bool,
    fg_buf: &mut [i32],
    bg_buf: &mut [i32],
) {
    let Some(re) = build_regex(pattern, icase) else {
        return;
    };
    for m in re.find_iter(text) {
        // Runs of bare newlines carry no visible glyphs to colour.
        if m.as_str().chars().all(|c| c == '\n') {
            continue;
        }
        for i in m.start()..m.end() {
            fg_buf[i] = fg;
            bg_buf[i] = bg;
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_surround(
    text: &str,
    start: &str,
    end: &str,
    fg: i32,
    bg: i32,
    start_icase: bool,
    end_icase: bool,
    fg_buf: &mut [i32],
    bg_buf: &mut [i32],
) {
    let (Some(re_start), Some(re_end)) =
        (build_regex(start, start_icase), build_regex(end, end_icase))
    else {
        return;
    };

    let mut pos = 0usize;
    while pos < text.len() {
        let Some(sm) = re_start.find_at(text, pos) else {
            break;
        };
        let begin = sm.start();
        let after_start = sm.end();
        if after_start > text.len() {
            break;
        }

        match re_end.find_at(text, after_start) {
            Some(em) => {
                let stop = em.end();
                for i in begin..stop {
                    fg_buf[i] = fg;
                    bg_buf[i] = bg;
                }
                pos = if stop > after_start { stop } else { after_start + 1 };
            }
            None => {
                for i in begin..text.len() {
                    fg_buf[i] = fg;
                    bg_buf[i] = bg;
                }
                break;
            }
        }
    }
}

/// Walk the text and emit SGR transitions at colour-change boundaries,
/// re-asserting the active colours after each newline so callers can slice
/// the output into lines.
fn emit(text: &str, fg: &[i32], bg: &[i32]) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    let mut cur_fg = 0i32;
    let mut cur_bg = 0i32;
    let mut prev_char: Option<char> = None;

    for (i, ch) in text.char_indices() {
        let mut colors = String::new();
        if cur_fg != fg[i] {
            cur_fg = fg[i];
            colors.push_str(&sgr_fg(cur_fg));
        }
        if cur_bg != bg[i] {
            cur_bg = bg[i];
            colors.push_str(&sgr_bg(cur_bg));
        }
        if prev_char == Some('\n') && colors.is_empty() && (cur_fg != 0 || cur_bg != 0) {
            colors.push_str(&sgr_fg(cur_fg));
            colors.push_str(&sgr_bg(cur_bg));
        }

        out.push_str(&colors);
        out.push(ch);
        prev_char = Some(ch);
    }
    out
}

fn sgr_fg(code: i32) -> String {
    if code == 0 {
        "\x1b[39m".to_string()
    } else {
        format!("\x1b[{}m", code)
    }
}

fn sgr_bg(code: i32) -> String {
    if code == 0 {
        "\x1b[49m".to_string()
    } else {
        format!("\x1b[{}m", code)
    }
}

/// Standard 30–37 / 90–97 foreground codes; backgrounds add 10. Unknown
/// names map to the default colour.
fn color_code(name: &str) -> i32 {
    match name {
        "black" => 30,
        "red" => 31,
        "green" => 32,
        "yellow" => 33,
        "blue" => 34,
        "magenta" => 35,
        "cyan" => 36,
        "white" => 37,
        "brightblack" => 90,
        "brightred" => 91,
        "brightgreen" => 92,
        "brightyellow" => 93,
        "brightblue" => 94,
        "brightmagenta" => 95,
        "brightcyan" => 96,
        "brightwhite" => 97,
        _ => 39,
    }
}

fn parse_nanorc(raw: &str) -> Option<Syntax> {
    let mut syntax = Syntax {
        name: String::new(),
        file_patterns: Vec::new(),
        rules: Vec::new(),
    };
    // start= rules wait here until their end= partner arrives.
    let mut pending_start: Option<(String, i32, i32, bool)> = None;

    for line in raw.lines() {
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let words = split_rule_line(line);
        if words.is_empty() {
            continue;
        }

        match words[0].as_str() {
            "syntax" => {
                if let Some(name) = words.get(1) {
                    syntax.name = unquote(name);
                }
                for w in words.iter().skip(2) {
                    syntax.file_patterns.push(unquote(w));
                }
            }
            "color" | "icolor" => {
                let icase = words[0] == "icolor";
                let Some(spec) = words.get(1) else { continue };
                let (fg_name, bg_name) = match spec.split_once(',') {
                    Some((f, b)) => (f, b),
                    None => (spec.as_str(), ""),
                };
                let fg = color_code(fg_name);
                let bg = if bg_name.is_empty() {
                    0
                } else {
                    color_code(bg_name) + 10
                };

                for w in words.iter().skip(2) {
                    if let Some(start) = w.strip_prefix("start=") {
                        pending_start = Some((unquote(start), fg, bg, icase));
                    } else if let Some(end) = w.strip_prefix("end=") {
                        if let Some((start, fg, bg, start_icase)) = pending_start.take() {
                            syntax.rules.push(ColorRule {
                                fg,
                                bg,
                                icase: start_icase,
                                pattern: RulePattern::Surround {
                                    start,
                                    end: unquote(end),
                                    end_icase: icase,
                                },
                            });
                        }
                    } else if w.starts_with('"') && w.ends_with('"') && w.len() >= 2 {
                        syntax.rules.push(ColorRule {
                            fg,
                            bg,
                            icase,
                            pattern: RulePattern::Normal(unquote(w)),
                        });
                    }
                }
            }
            // `magic`, `comment`, `tabgives` and friends don't affect the
            // preview pass.
            _ => {}
        }
    }

    if syntax.name.is_empty() && syntax.rules.is_empty() {
        None
    } else {
        Some(syntax)
    }
}

/// Split a rule line on spaces, keeping double-quoted spans (which may
/// contain spaces) intact.
fn split_rule_line(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let chars: Vec<char> = line.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '"' => {
                let prev = if i > 0 { chars[i - 1] } else { ' ' };
                let next = chars.get(i + 1).copied().unwrap_or(' ');
                if !in_quotes && (prev == ' ' || prev == '=') {
                    in_quotes = true;
                } else if in_quotes && (next == ' ' || i + 1 == chars.len()) {
                    in_quotes = false;
                }
                cur.push(c);
            }
            ' ' if !in_quotes => {
                if !cur.is_empty() {
                    words.push(std::mem::take(&mut cur));
                }
            }
            _ => cur.push(c),
        }
    }
    if !cur.is_empty() {
        words.push(cur);
    }
    words
}

/// Strip one level of surrounding double quotes if both are present.
fn unquote(s: &str) -> String {
    let begin = s.find('"');
    let end = s.rfind('"');
    match (begin, end) {
        (Some(b), Some(e)) if b != e => s[b + 1..e].to_string(),
        _ => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SH_RC: &str = r##"# shell syntax
syntax "sh" "\.sh$" "\.bash$"
color green "\b(case|do|done|elif|else|fi|for|if|then|while)\b"
color cyan "^#!.*"
color brightblack start="#" end="$"
"##;

    fn set_with(raw: &str) -> SyntaxSet {
        let mut set = SyntaxSet::default();
        set.syntaxes.push(parse_nanorc(raw).unwrap());
        set
    }

    #[test]
    fn parses_name_patterns_and_rules() {
        let syntax = parse_nanorc(SH_RC).unwrap();
        assert_eq!(syntax.name, "sh");
        assert_eq!(syntax.file_patterns, vec!["\\.sh$", "\\.bash$"]);
        assert_eq!(syntax.rules.len(), 3);
        assert!(matches!(
            syntax.rules[2].pattern,
            RulePattern::Surround { .. }
        ));
    }

    #[test]
    fn filename_selects_syntax() {
        let set = set_with(SH_RC);
        assert_eq!(set.syntax_name("deploy.sh"), Some("sh"));
        assert_eq!(set.syntax_name("deploy.py"), None);
    }

    #[test]
    fn keywords_get_colored() {
        let set = set_with(SH_RC);
        let cancel = AtomicBool::new(false);
        let (out, name) = set.highlight("run.sh", "if true\n", &cancel);
        assert_eq!(name.as_deref(), Some("sh"));
        assert!(out.contains("\x1b[32mif"));
        // Colour resets back to default after the keyword.
        assert!(out.contains("\x1b[39m"));
    }

    #[test]
    fn unmatched_syntax_returns_text_unchanged() {
        let set = set_with(SH_RC);
        let cancel = AtomicBool::new(false);
        let (out, name) = set.highlight("notes.txt", "if true\n", &cancel);
        assert_eq!(out, "if true\n");
        assert!(name.is_none());
    }

    #[test]
    fn surround_extends_to_end_of_input_when_unterminated() {
        let raw = "syntax \"c\" \"\\.c$\"\ncolor yellow start=\"/\\*\" end=\"\\*/\"\n";
        let set = set_with(raw);
        let cancel = AtomicBool::new(false);
        let (out, _) = set.highlight("a.c", "x /* comment", &cancel);
        assert!(out.contains("\x1b[33m/*"));
    }

    #[test]
    fn cancel_flag_stops_rule_application() {
        let set = set_with(SH_RC);
        let cancel = AtomicBool::new(true);
        let (out, name) = set.highlight("run.sh", "if true\n", &cancel);
        // Cancelled before any rule ran: text survives uncoloured.
        assert_eq!(name.as_deref(), Some("sh"));
        assert!(!out.contains("\x1b[32m"));
    }

    #[test]
    fn colors_reassert_after_newline() {
        let raw = "syntax \"x\" \"\\.x$\"\ncolor red \"(?s)a.*b\"\n";
        let set = set_with(raw);
        let cancel = AtomicBool::new(false);
        let (out, _) = set.highlight("t.x", "a\nzb", &cancel);
        // The first line opens red; the char after the newline restates it.
        let after_nl = out.split('\n').nth(1).unwrap();
        assert!(after_nl.starts_with("\x1b[31m"));
    }

    #[test]
    fn quoted_spans_keep_spaces() {
        let words = split_rule_line(r#"color green "a b" plain"#);
        assert_eq!(words, vec!["color", "green", "\"a b\"", "plain"]);
    }
}

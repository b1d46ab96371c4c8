//! Build constraints: file name suffixes and `//go:build` lines.
//!
//! Files are evaluated for the host platform with cgo disabled, matching
//! what a pure-Go build on this machine would compile.

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv",
    "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

pub fn host_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

pub fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        other => other,
    }
}

/// Whether a `.go` file takes part in the host build
pub fn file_matches(name: &str, source: &str) -> bool {
    name_matches(name) && header_matches(source)
}

/// `_<goos>`, `_<goarch>` and `_<goos>_<goarch>` suffixes
pub fn name_matches(name: &str) -> bool {
    let stem = name.strip_suffix(".go").unwrap_or(name);
    let stem = stem.strip_suffix("_test").unwrap_or(stem);
    let parts: Vec<&str> = stem.split('_').collect();
    // The first element is never a constraint: `linux.go` is unconstrained
    if parts.len() < 2 {
        return true;
    }
    let last = parts[parts.len() - 1];
    let prev = if parts.len() >= 3 { Some(parts[parts.len() - 2]) } else { None };

    if KNOWN_ARCH.contains(&last) {
        if let Some(os) = prev.filter(|p| KNOWN_OS.contains(p)) {
            return tag_true(os) && tag_true(last);
        }
        return tag_true(last);
    }
    if KNOWN_OS.contains(&last) {
        return tag_true(last);
    }
    true
}

/// Evaluate the `//go:build` line in the file header, if any
pub fn header_matches(source: &str) -> bool {
    for line in source.lines() {
        let line = line.trim();
        if line.starts_with("package ") || line == "package" {
            break;
        }
        if let Some(expr) = line.strip_prefix("//go:build") {
            return Expr::parse(expr).map(|e| e.eval()).unwrap_or(true);
        }
    }
    true
}

fn tag_true(tag: &str) -> bool {
    let os = host_os();
    tag == os
        || tag == host_arch()
        || tag == "gc"
        || (tag == "unix" && UNIX_OS.contains(&os))
        || (tag == "linux" && os == "android")
        || (tag == "darwin" && os == "ios")
        || tag.strip_prefix("go1.").is_some_and(|minor| minor.chars().all(|c| c.is_ascii_digit()))
}

#[derive(Debug)]
enum Expr {
    Tag(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    fn eval(&self) -> bool {
        match self {
            Expr::Tag(t) => tag_true(t),
            Expr::Not(e) => !e.eval(),
            Expr::And(a, b) => a.eval() && b.eval(),
            Expr::Or(a, b) => a.eval() || b.eval(),
        }
    }

    fn parse(text: &str) -> Option<Expr> {
        let tokens = lex(text)?;
        let mut parser = ExprParser { tokens, pos: 0 };
        let expr = parser.or()?;
        (parser.pos == parser.tokens.len()).then_some(expr)
    }
}

fn lex(text: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '(' | ')' | '!' => {
                tokens.push(c.to_string());
                chars.next();
            }
            '&' | '|' => {
                chars.next();
                if chars.next() != Some(c) {
                    return None;
                }
                tokens.push(format!("{c}{c}"));
            }
            c if c.is_alphanumeric() || c == '_' || c == '.' => {
                let mut tag = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '.' {
                        tag.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(tag);
            }
            _ => return None,
        }
    }
    Some(tokens)
}

struct ExprParser {
    tokens: Vec<String>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn or(&mut self) -> Option<Expr> {
        let mut left = self.and()?;
        while self.peek() == Some("||") {
            self.pos += 1;
            left = Expr::Or(Box::new(left), Box::new(self.and()?));
        }
        Some(left)
    }

    fn and(&mut self) -> Option<Expr> {
        let mut left = self.not()?;
        while self.peek() == Some("&&") {
            self.pos += 1;
            left = Expr::And(Box::new(left), Box::new(self.not()?));
        }
        Some(left)
    }

    fn not(&mut self) -> Option<Expr> {
        let token = self.peek()?.to_string();
        match token.as_str() {
            "!" => {
                self.pos += 1;
                Some(Expr::Not(Box::new(self.not()?)))
            }
            "(" => {
                self.pos += 1;
                let inner = self.or()?;
                if self.peek() != Some(")") {
                    return None;
                }
                self.pos += 1;
                Some(inner)
            }
            ")" | "&&" | "||" => None,
            tag => {
                self.pos += 1;
                Some(Expr::Tag(tag.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn other_os() -> &'static str {
        if host_os() == "plan9" {
            "windows"
        } else {
            "plan9"
        }
    }

    #[test]
    fn test_name_suffixes() {
        assert!(name_matches("file.go"));
        assert!(name_matches("linux.go"));
        assert!(name_matches(&format!("file_{}.go", host_os())));
        assert!(name_matches(&format!("file_{}_test.go", host_os())));
        assert!(!name_matches(&format!("file_{}.go", other_os())));
        assert!(!name_matches(&format!("file_{}_{}.go", other_os(), host_arch())));
    }

    #[test]
    fn test_build_line() {
        assert!(!header_matches("//go:build ignore\n\npackage main\n"));
        assert!(header_matches(&format!("//go:build {}\n\npackage x\n", host_os())));
        assert!(header_matches(&format!("//go:build !{}\npackage x\n", other_os())));
        assert!(header_matches(&format!(
            "// Copyright\n\n//go:build ({} || {}) && !ignore\n\npackage x\n",
            other_os(),
            host_os()
        )));
        assert!(!header_matches("//go:build cgo && ignore\npackage x\n"));
    }

    #[test]
    fn test_build_line_after_package_clause_is_ignored() {
        assert!(header_matches("package x\n\n//go:build ignore\n"));
    }
}

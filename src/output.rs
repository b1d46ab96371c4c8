//! Output templates.
//!
//! A small subset of Go's `text/template`, rendered against the JSON form
//! of a result:
//!
//! ```text
//! {{ .Name }} {{ .Path | RelPath }}:{{ .Line }}
//! {{ range .Relations }}{{ .Kind }} {{ .Path | BasePath }}\n{{ end }}
//! ```
//!
//! Supported actions are field access (`.`, `.A.B`), pipes into the
//! `RelPath` and `BasePath` (alias `Base`) helpers, function call form
//! (`RelPath .Path`), `range ... end`, and `{{-` / `-}}` whitespace
//! trimming. `\n`, `\t` and `\\` in literal text are unescaped so formats
//! can be typed on a command line.

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Func {
    RelPath,
    BasePath,
}

impl Func {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "RelPath" => Ok(Func::RelPath),
            "BasePath" | "Base" => Ok(Func::BasePath),
            other => bail!("function {:?} not defined", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operand {
    Dot,
    Field(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pipeline {
    operand: Operand,
    funcs: Vec<Func>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Text(String),
    Action(Pipeline),
    Range { over: Pipeline, body: Vec<Node> },
}

/// A parsed output template bound to the directory `RelPath` is relative to
#[derive(Debug, Clone)]
pub struct Template {
    nodes: Vec<Node>,
    base_dir: PathBuf,
}

impl Template {
    pub fn parse(source: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let nodes = parse_nodes(source).with_context(|| format!("Invalid template {:?}", source))?;
        Ok(Self {
            nodes,
            base_dir: base_dir.into(),
        })
    }

    /// Render against the serialized form of `value`
    pub fn render<T: Serialize>(&self, value: &T) -> Result<String> {
        let value = serde_json::to_value(value)?;
        let mut out = String::new();
        self.render_nodes(&self.nodes, &value, &mut out)?;
        Ok(out)
    }

    pub fn render_to<T: Serialize, W: Write>(&self, out: &mut W, value: &T) -> Result<()> {
        let text = self.render(value)?;
        out.write_all(text.as_bytes())?;
        Ok(())
    }

    fn render_nodes(&self, nodes: &[Node], dot: &Value, out: &mut String) -> Result<()> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Action(pipeline) => {
                    let value = self.eval(pipeline, dot)?;
                    out.push_str(&display(&value));
                }
                Node::Range { over, body } => match self.eval(over, dot)? {
                    Value::Array(items) => {
                        for item in &items {
                            self.render_nodes(body, item, out)?;
                        }
                    }
                    Value::Object(map) => {
                        for item in map.values() {
                            self.render_nodes(body, item, out)?;
                        }
                    }
                    Value::Null => {}
                    other => bail!("range can't iterate over {}", display(&other)),
                },
            }
        }
        Ok(())
    }

    fn eval(&self, pipeline: &Pipeline, dot: &Value) -> Result<Value> {
        let mut value = match &pipeline.operand {
            Operand::Dot => dot.clone(),
            Operand::Field(path) => {
                let mut current = dot;
                for name in path {
                    current = current
                        .get(name)
                        .ok_or_else(|| anyhow!("can't evaluate field {}", name))?;
                }
                current.clone()
            }
        };
        for func in &pipeline.funcs {
            let text = display(&value);
            value = Value::String(match func {
                Func::RelPath => rel_path(&self.base_dir, Path::new(&text)),
                Func::BasePath => base_name(&text),
            });
        }
        Ok(value)
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `path` relative to `base`, with `..` where they diverge. Relative
/// inputs are returned unchanged.
pub fn rel_path(base: &Path, path: &Path) -> String {
    if !path.is_absolute() || !base.is_absolute() {
        return path.display().to_string();
    }
    let base: Vec<Component<'_>> = base.components().collect();
    let target: Vec<Component<'_>> = path.components().collect();
    let common = base
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base.len() {
        rel.push("..");
    }
    for component in &target[common..] {
        rel.push(component.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        return ".".to_string();
    }
    rel.display().to_string()
}

fn base_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// Replace `\n`, `\t` and `\\` escapes typed on a command line
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('n') => {
                out.push('\n');
                chars.next();
            }
            Some('t') => {
                out.push('\t');
                chars.next();
            }
            Some('\\') => {
                out.push('\\');
                chars.next();
            }
            _ => out.push('\\'),
        }
    }
    out
}

enum Segment<'a> {
    Text(String),
    Action(&'a str),
}

fn lex(source: &str) -> Result<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let mut rest = source;
    let mut trim_next = false;
    while let Some(open) = rest.find("{{") {
        let mut text = &rest[..open];
        if trim_next {
            text = text.trim_start();
        }
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            bail!("unclosed action");
        };
        let mut action = &after[..close];
        if let Some(stripped) = action.strip_prefix('-') {
            text = text.trim_end();
            action = stripped;
        }
        trim_next = false;
        if let Some(stripped) = action.strip_suffix('-') {
            trim_next = true;
            action = stripped;
        }
        if !text.is_empty() {
            segments.push(Segment::Text(unescape(text)));
        }
        segments.push(Segment::Action(action.trim()));
        rest = &after[close + 2..];
    }
    let text = if trim_next { rest.trim_start() } else { rest };
    if !text.is_empty() {
        segments.push(Segment::Text(unescape(text)));
    }
    Ok(segments)
}

fn parse_nodes(source: &str) -> Result<Vec<Node>> {
    // Stack of open range bodies; the bottom entry is the template itself
    let mut stack: Vec<(Option<Pipeline>, Vec<Node>)> = vec![(None, Vec::new())];
    for segment in lex(source)? {
        match segment {
            Segment::Text(text) => push(&mut stack, Node::Text(text)),
            Segment::Action(action) => {
                let words = words(action);
                match words.first().map(String::as_str) {
                    Some("range") => {
                        let over = parse_pipeline(&words[1..])?;
                        stack.push((Some(over), Vec::new()));
                    }
                    Some("end") => {
                        if words.len() != 1 {
                            bail!("unexpected tokens after end");
                        }
                        match stack.pop() {
                            Some((Some(over), body)) if !stack.is_empty() => {
                                push(&mut stack, Node::Range { over, body });
                            }
                            _ => bail!("unexpected {{{{end}}}}"),
                        }
                    }
                    Some(_) => push(&mut stack, Node::Action(parse_pipeline(&words)?)),
                    None => bail!("missing value for command"),
                }
            }
        }
    }
    match stack.pop() {
        Some((None, nodes)) if stack.is_empty() => Ok(nodes),
        _ => bail!("unexpected EOF, missing {{{{end}}}}"),
    }
}

fn push(stack: &mut [(Option<Pipeline>, Vec<Node>)], node: Node) {
    if let Some((_, nodes)) = stack.last_mut() {
        nodes.push(node);
    }
}

fn words(action: &str) -> Vec<String> {
    action
        .replace('|', " | ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn parse_pipeline(words: &[String]) -> Result<Pipeline> {
    let mut commands = words.split(|w| w == "|");
    let first = commands.next().unwrap_or_default();
    let (operand, mut funcs) = match first {
        [operand] => (parse_operand(operand)?, Vec::new()),
        [func, operand] => (parse_operand(operand)?, vec![Func::parse(func)?]),
        [] => bail!("missing value for command"),
        _ => bail!("unsupported command {:?}", first.join(" ")),
    };
    for command in commands {
        match command {
            [func] => funcs.push(Func::parse(func)?),
            _ => bail!("pipe target must be a single function, got {:?}", command.join(" ")),
        }
    }
    Ok(Pipeline { operand, funcs })
}

fn parse_operand(word: &str) -> Result<Operand> {
    if word == "." {
        return Ok(Operand::Dot);
    }
    let Some(path) = word.strip_prefix('.') else {
        bail!("expected a field, got {:?}", word);
    };
    let fields: Vec<String> = path.split('.').map(str::to_string).collect();
    if fields.iter().any(|f| f.is_empty()) {
        bail!("malformed field {:?}", word);
    }
    Ok(Operand::Field(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(source: &str, value: Value) -> Result<String> {
        Template::parse(source, "/work")?.render(&value)
    }

    #[test]
    fn test_fields_and_pipes() -> Result<()> {
        let value = json!({"Name": "Run", "Path": "/work/cmd/run.go", "Line": 4});
        assert_eq!(
            render("{{ .Name }} {{ .Path | RelPath }}:{{ .Line }}", value.clone())?,
            "Run cmd/run.go:4"
        );
        assert_eq!(render("{{.Path|BasePath}}", value.clone())?, "run.go");
        assert_eq!(render("{{ RelPath .Path }}", value)?, "cmd/run.go");
        Ok(())
    }

    #[test]
    fn test_range_rebinds_dot() -> Result<()> {
        let value = json!({"Defs": [{"Name": "A"}, {"Name": "B"}]});
        assert_eq!(
            render("{{ range .Defs }}{{ .Name }}\\n{{ end }}", value)?,
            "A\nB\n"
        );
        Ok(())
    }

    #[test]
    fn test_trim_markers() -> Result<()> {
        let value = json!({"A": 1, "B": 2});
        assert_eq!(render("{{ .A }}  \n  {{- .B }}", value.clone())?, "12");
        assert_eq!(render("{{ .A -}}  x", value)?, "1x");
        Ok(())
    }

    #[test]
    fn test_unknown_field_fails_at_render() -> Result<()> {
        let template = Template::parse("{{ .Missing }}", "/work")?;
        assert!(template.render(&json!({"Name": "x"})).is_err());
        Ok(())
    }

    #[test]
    fn test_parse_errors() {
        assert!(Template::parse("{{ .Name | Upper }}", "/").is_err());
        assert!(Template::parse("{{ range .Defs }}", "/").is_err());
        assert!(Template::parse("{{ end }}", "/").is_err());
        assert!(Template::parse("{{ .Name ", "/").is_err());
    }

    #[test]
    fn test_rel_path_climbs_out_of_base() {
        assert_eq!(rel_path(Path::new("/work/a"), Path::new("/work/b/c.go")), "../b/c.go");
        assert_eq!(rel_path(Path::new("/work"), Path::new("/work")), ".");
        assert_eq!(rel_path(Path::new("/work"), Path::new("rel/x.go")), "rel/x.go");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("a\\nb\\tc\\\\d\\x"), "a\nb\tc\\d\\x");
    }
}

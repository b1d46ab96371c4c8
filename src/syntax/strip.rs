use super::ast::{Decl, File};

/// Which function bodies survive [`strip_bodies`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFilter {
    KeepAll,
    StripAll,
    /// Keep only bodies whose span covers the line
    KeepSpanning(usize),
}

/// Drop function bodies the caller will never look inside.
///
/// Checking a body is most of the cost of type checking a package, and a
/// query about one position only needs the body that contains it.
pub fn strip_bodies(file: &mut File, filter: BodyFilter) {
    if filter == BodyFilter::KeepAll {
        return;
    }
    for decl in &mut file.decls {
        let Decl::Func(func) = decl else {
            continue;
        };
        let keep = match (filter, &func.body) {
            (BodyFilter::KeepSpanning(line), Some(body)) => body.span.spans_line(line),
            _ => false,
        };
        if !keep {
            func.body = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lower;
    use spelunk_metal::GoParser;

    const SOURCE: &str = "package demo\n\nfunc a() {\n\tprintln(1)\n}\n\nfunc b() {\n\tprintln(2)\n}\n";

    fn bodies(filter: BodyFilter) -> Vec<bool> {
        let mut parser = GoParser::new().unwrap();
        let parsed = parser.parse("demo.go", SOURCE.to_string()).unwrap();
        let mut file = lower(&parsed);
        strip_bodies(&mut file, filter);
        file.decls
            .iter()
            .map(|d| matches!(d, Decl::Func(f) if f.body.is_some()))
            .collect()
    }

    #[test]
    fn test_strip_keeps_only_spanning_body() {
        assert_eq!(bodies(BodyFilter::KeepSpanning(8)), vec![false, true]);
        assert_eq!(bodies(BodyFilter::KeepSpanning(6)), vec![false, false]);
    }

    #[test]
    fn test_strip_all_and_keep_all() {
        assert_eq!(bodies(BodyFilter::StripAll), vec![false, false]);
        assert_eq!(bodies(BodyFilter::KeepAll), vec![true, true]);
    }
}

//! Lowering from the tree-sitter tree to the owned syntax tree.
//!
//! Lowering is lenient: nodes tree-sitter could not make sense of become
//! [`Expr::Bad`] or are dropped, so a file with a local syntax error still
//! yields every declaration around it. Callers that need strictness check
//! [`ParsedFile::has_errors`] themselves.

use spelunk_metal::{end_pos, is_identifier, start_pos, ParsedFile};
use tree_sitter::Node;

use super::ast::*;

pub fn lower(parsed: &ParsedFile) -> File {
    Lower {
        src: parsed.source.as_str(),
    }
    .file(parsed.root())
}

fn named<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| !c.is_extra())
        .collect()
}

/// Named children that are not attached to any grammar field
fn unfielded<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            if child.is_named() && !child.is_extra() && cursor.field_name().is_none() {
                out.push(child);
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    out
}

fn fields<'t>(node: Node<'t>, name: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(name, &mut cursor).collect()
}

fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| !c.is_named() && c.kind() == token);
    found
}

fn is_type_kind(kind: &str) -> bool {
    matches!(
        kind,
        "qualified_type"
            | "generic_type"
            | "pointer_type"
            | "array_type"
            | "implicit_length_array_type"
            | "slice_type"
            | "map_type"
            | "channel_type"
            | "function_type"
            | "struct_type"
            | "interface_type"
            | "parenthesized_type"
            | "negated_type"
            | "type_elem"
            | "constraint_elem"
            | "type_constraint"
    )
}

fn unquote(text: &str) -> String {
    text.trim_matches(|c| c == '"' || c == '`').to_string()
}

struct Lower<'a> {
    src: &'a str,
}

impl<'a> Lower<'a> {
    fn text(&self, node: Node<'_>) -> &'a str {
        node.utf8_text(self.src.as_bytes()).unwrap_or_default()
    }

    fn span(&self, node: Node<'_>) -> Span {
        Span {
            lo: node.start_byte(),
            hi: node.end_byte(),
            start: start_pos(node),
            end: end_pos(node),
        }
    }

    fn ident(&self, node: Node<'_>) -> Ident {
        Ident {
            name: self.text(node).to_string(),
            span: self.span(node),
        }
    }

    fn file(&self, root: Node<'_>) -> File {
        let mut package = Ident {
            name: String::new(),
            span: Span::default(),
        };
        let mut imports = Vec::new();
        let mut decls = Vec::new();

        for child in named(root) {
            match child.kind() {
                "package_clause" => {
                    if let Some(id) = named(child).first() {
                        package = self.ident(*id);
                    }
                }
                "import_declaration" => self.imports(child, &mut imports),
                "function_declaration" | "method_declaration" => {
                    decls.push(Decl::Func(self.func_decl(child)))
                }
                "var_declaration" | "const_declaration" | "type_declaration" => {
                    decls.push(Decl::Gen(self.gen_decl(child)))
                }
                _ => {}
            }
        }

        File {
            package,
            imports,
            decls,
        }
    }

    fn imports(&self, node: Node<'_>, out: &mut Vec<ImportSpec>) {
        for child in named(node) {
            match child.kind() {
                "import_spec" => {
                    let Some(path) = child.child_by_field_name("path") else {
                        continue;
                    };
                    out.push(ImportSpec {
                        name: child.child_by_field_name("name").map(|n| self.ident(n)),
                        path: unquote(self.text(path)),
                        path_span: self.span(path),
                    });
                }
                "import_spec_list" => self.imports(child, out),
                _ => {}
            }
        }
    }

    fn gen_decl(&self, node: Node<'_>) -> GenDecl {
        let tok = match node.kind() {
            "const_declaration" => DeclToken::Const,
            "var_declaration" => DeclToken::Var,
            _ => DeclToken::Type,
        };
        let mut specs = Vec::new();
        let mut previous = None;
        self.specs(node, tok, &mut specs, &mut previous);
        GenDecl {
            tok,
            specs,
            span: self.span(node),
        }
    }

    fn specs(
        &self,
        node: Node<'_>,
        tok: DeclToken,
        out: &mut Vec<Spec>,
        previous: &mut Option<(Option<Expr>, Vec<Expr>)>,
    ) {
        for child in named(node) {
            match child.kind() {
                "var_spec" | "const_spec" => out.push(Spec::Value(self.value_spec(child, tok, previous))),
                "type_spec" => out.push(Spec::Type(self.type_spec(child, false))),
                "type_alias" => out.push(Spec::Type(self.type_spec(child, true))),
                "var_spec_list" | "const_spec_list" | "type_spec_list" => {
                    self.specs(child, tok, out, previous)
                }
                _ => {}
            }
        }
    }

    fn value_spec(
        &self,
        node: Node<'_>,
        tok: DeclToken,
        previous: &mut Option<(Option<Expr>, Vec<Expr>)>,
    ) -> ValueSpec {
        let names = fields(node, "name").into_iter().map(|n| self.ident(n)).collect();
        let mut ty = node.child_by_field_name("type").map(|n| self.ty(n));
        let mut values = self.exprs(node.child_by_field_name("value"));
        let mut implicit = false;

        if tok == DeclToken::Const {
            if ty.is_none() && values.is_empty() {
                if let Some((prev_ty, prev_values)) = previous {
                    ty = prev_ty.clone();
                    values = prev_values.clone();
                    implicit = true;
                }
            } else {
                *previous = Some((ty.clone(), values.clone()));
            }
        }

        ValueSpec {
            names,
            ty,
            values,
            implicit,
            span: self.span(node),
        }
    }

    fn type_spec(&self, node: Node<'_>, alias: bool) -> TypeSpec {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.ident(n))
            .unwrap_or_else(|| Ident {
                name: String::new(),
                span: self.span(node),
            });
        let ty = node
            .child_by_field_name("type")
            .map(|n| self.ty(n))
            .unwrap_or(Expr::Bad(self.span(node)));
        TypeSpec {
            name,
            type_params: self.type_params(node.child_by_field_name("type_parameters")),
            alias,
            ty,
            span: self.span(node),
        }
    }

    fn type_params(&self, node: Option<Node<'_>>) -> Vec<Field> {
        let Some(node) = node else {
            return Vec::new();
        };
        named(node)
            .into_iter()
            .filter(|c| c.kind() == "type_parameter_declaration")
            .map(|decl| Field {
                names: fields(decl, "name").into_iter().map(|n| self.ident(n)).collect(),
                ty: decl
                    .child_by_field_name("type")
                    .map(|n| self.ty(n))
                    .unwrap_or(Expr::Bad(self.span(decl))),
                span: self.span(decl),
            })
            .collect()
    }

    fn func_decl(&self, node: Node<'_>) -> FuncDecl {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.ident(n))
            .unwrap_or_else(|| Ident {
                name: String::new(),
                span: self.span(node),
            });
        FuncDecl {
            recv: node.child_by_field_name("receiver").map(|r| self.params(r)),
            name,
            type_params: self.type_params(node.child_by_field_name("type_parameters")),
            ty: self.func_type(node),
            body: node.child_by_field_name("body").map(|b| self.block(b)),
            span: self.span(node),
        }
    }

    /// Signature of any node carrying `parameters` and `result` fields
    fn func_type(&self, node: Node<'_>) -> FuncType {
        let params_node = node.child_by_field_name("parameters");
        let result_node = node.child_by_field_name("result");
        let params = params_node.map(|p| self.params(p)).unwrap_or_default();
        let results = result_node.map(|r| self.results(r));

        let mut span = params_node.map(|p| self.span(p)).unwrap_or_else(|| self.span(node));
        if let Some(r) = result_node {
            span.hi = r.end_byte();
            span.end = end_pos(r);
        }
        FuncType {
            params,
            results,
            span,
        }
    }

    fn params(&self, node: Node<'_>) -> FieldList {
        let mut list = Vec::new();
        for child in named(node) {
            match child.kind() {
                "parameter_declaration" => {
                    let ty = child
                        .child_by_field_name("type")
                        .map(|n| self.ty(n))
                        .unwrap_or(Expr::Bad(self.span(child)));
                    list.push(Field {
                        names: fields(child, "name").into_iter().map(|n| self.ident(n)).collect(),
                        ty,
                        span: self.span(child),
                    });
                }
                "variadic_parameter_declaration" => {
                    let elem = child
                        .child_by_field_name("type")
                        .map(|n| self.ty(n))
                        .unwrap_or(Expr::Bad(self.span(child)));
                    list.push(Field {
                        names: fields(child, "name").into_iter().map(|n| self.ident(n)).collect(),
                        ty: Expr::Ellipsis(Some(Box::new(elem))),
                        span: self.span(child),
                    });
                }
                _ => {}
            }
        }
        FieldList {
            list,
            span: self.span(node),
        }
    }

    fn results(&self, node: Node<'_>) -> FieldList {
        if node.kind() == "parameter_list" {
            return self.params(node);
        }
        let span = self.span(node);
        FieldList {
            list: vec![Field {
                names: Vec::new(),
                ty: self.ty(node),
                span,
            }],
            span,
        }
    }

    fn struct_fields(&self, node: Node<'_>) -> Vec<Field> {
        let mut out = Vec::new();
        for list in named(node).into_iter().filter(|c| c.kind() == "field_declaration_list") {
            for decl in named(list).into_iter().filter(|c| c.kind() == "field_declaration") {
                let names: Vec<Ident> = fields(decl, "name").into_iter().map(|n| self.ident(n)).collect();
                let mut ty = decl
                    .child_by_field_name("type")
                    .map(|n| self.ty(n))
                    .unwrap_or(Expr::Bad(self.span(decl)));
                if names.is_empty() && has_token(decl, "*") {
                    ty = Expr::Star(Box::new(ty));
                }
                out.push(Field {
                    names,
                    ty,
                    span: self.span(decl),
                });
            }
        }
        out
    }

    fn interface_elems(&self, node: Node<'_>, out: &mut Vec<InterfaceElem>) {
        for child in named(node) {
            match child.kind() {
                "method_elem" | "method_spec" => {
                    let Some(name) = child.child_by_field_name("name") else {
                        continue;
                    };
                    out.push(InterfaceElem::Method {
                        name: self.ident(name),
                        ty: self.func_type(child),
                    });
                }
                "method_spec_list" => self.interface_elems(child, out),
                "interface_type_name" => {
                    if let Some(inner) = named(child).first() {
                        out.push(InterfaceElem::Embed(self.ty(*inner)));
                    }
                }
                kind if is_type_kind(kind) || is_identifier(kind) || kind == "struct_elem" => {
                    out.push(InterfaceElem::Embed(self.ty(child)))
                }
                _ => {}
            }
        }
    }

    fn ty(&self, node: Node<'_>) -> Expr {
        let first = || named(node).into_iter().next();
        match node.kind() {
            kind if is_identifier(kind) => Expr::Ident(self.ident(node)),
            "qualified_type" => match (node.child_by_field_name("package"), node.child_by_field_name("name")) {
                (Some(pkg), Some(name)) => Expr::Selector {
                    x: Box::new(Expr::Ident(self.ident(pkg))),
                    sel: self.ident(name),
                },
                _ => Expr::Bad(self.span(node)),
            },
            "generic_type" => {
                let base = node
                    .child_by_field_name("type")
                    .map(|n| self.ty(n))
                    .unwrap_or(Expr::Bad(self.span(node)));
                let indices = node
                    .child_by_field_name("type_arguments")
                    .map(|args| named(args).into_iter().map(|a| self.ty(a)).collect())
                    .unwrap_or_default();
                Expr::Index {
                    x: Box::new(base),
                    indices,
                }
            }
            "pointer_type" => match first() {
                Some(inner) => Expr::Star(Box::new(self.ty(inner))),
                None => Expr::Bad(self.span(node)),
            },
            "array_type" => Expr::ArrayType {
                len: node.child_by_field_name("length").map(|n| Box::new(self.expr(n))),
                elem: Box::new(self.field_ty(node, "element")),
            },
            "implicit_length_array_type" => Expr::ArrayType {
                len: Some(Box::new(Expr::Ellipsis(None))),
                elem: Box::new(self.field_ty(node, "element")),
            },
            "slice_type" => Expr::ArrayType {
                len: None,
                elem: Box::new(self.field_ty(node, "element")),
            },
            "map_type" => Expr::MapType {
                key: Box::new(self.field_ty(node, "key")),
                value: Box::new(self.field_ty(node, "value")),
            },
            "channel_type" => {
                let mut cursor = node.walk();
                let tokens: Vec<&str> = node
                    .children(&mut cursor)
                    .filter(|c| !c.is_named())
                    .map(|c| c.kind())
                    .collect();
                let dir = match tokens.as_slice() {
                    ["<-", "chan", ..] => ChanDir::Recv,
                    ["chan", "<-", ..] => ChanDir::Send,
                    _ => ChanDir::Both,
                };
                Expr::ChanType {
                    dir,
                    value: Box::new(self.field_ty(node, "value")),
                }
            }
            "function_type" => Expr::FuncType(self.func_type(node)),
            "struct_type" => Expr::StructType {
                fields: self.struct_fields(node),
                span: self.span(node),
            },
            "interface_type" => {
                let mut elems = Vec::new();
                self.interface_elems(node, &mut elems);
                Expr::InterfaceType {
                    elems,
                    span: self.span(node),
                }
            }
            "parenthesized_type" => match first() {
                Some(inner) => Expr::Paren(Box::new(self.ty(inner))),
                None => Expr::Bad(self.span(node)),
            },
            "negated_type" => match first() {
                Some(inner) => Expr::Tilde(Box::new(self.ty(inner))),
                None => Expr::Bad(self.span(node)),
            },
            "type_elem" | "constraint_elem" | "type_constraint" => {
                let mut terms: Vec<Expr> = named(node).into_iter().map(|n| self.ty(n)).collect();
                match terms.len() {
                    0 => Expr::Bad(self.span(node)),
                    1 => terms.remove(0),
                    _ => Expr::Union(terms),
                }
            }
            _ => self.expr(node),
        }
    }

    fn field_ty(&self, node: Node<'_>, field: &str) -> Expr {
        node.child_by_field_name(field)
            .map(|n| self.ty(n))
            .unwrap_or(Expr::Bad(self.span(node)))
    }

    fn field_expr(&self, node: Node<'_>, field: &str) -> Expr {
        node.child_by_field_name(field)
            .map(|n| self.expr(n))
            .unwrap_or(Expr::Bad(self.span(node)))
    }

    fn boxed(&self, node: Node<'_>, field: &str) -> Option<Box<Expr>> {
        node.child_by_field_name(field).map(|n| Box::new(self.expr(n)))
    }

    fn exprs(&self, node: Option<Node<'_>>) -> Vec<Expr> {
        match node {
            None => Vec::new(),
            Some(n) if n.kind() == "expression_list" => {
                named(n).into_iter().map(|e| self.expr(e)).collect()
            }
            Some(n) => vec![self.expr(n)],
        }
    }

    fn literal_elements(&self, node: Node<'_>) -> Vec<Expr> {
        named(node).into_iter().map(|e| self.expr(e)).collect()
    }

    fn expr(&self, node: Node<'_>) -> Expr {
        let span = self.span(node);
        let first = || named(node).into_iter().next();
        match node.kind() {
            kind if is_identifier(kind) => Expr::Ident(self.ident(node)),
            "nil" | "true" | "false" | "iota" => Expr::Ident(self.ident(node)),
            "int_literal" => self.lit(node, LitKind::Int),
            "float_literal" => self.lit(node, LitKind::Float),
            "imaginary_literal" => self.lit(node, LitKind::Imag),
            "rune_literal" => self.lit(node, LitKind::Char),
            "interpreted_string_literal" | "raw_string_literal" => self.lit(node, LitKind::String),
            "parenthesized_expression" => match first() {
                Some(inner) => Expr::Paren(Box::new(self.expr(inner))),
                None => Expr::Bad(span),
            },
            "selector_expression" => match node.child_by_field_name("field") {
                Some(field) => Expr::Selector {
                    x: Box::new(self.field_expr(node, "operand")),
                    sel: self.ident(field),
                },
                None => Expr::Bad(span),
            },
            "index_expression" => Expr::Index {
                x: Box::new(self.field_expr(node, "operand")),
                indices: fields(node, "index").into_iter().map(|i| self.expr(i)).collect(),
            },
            "slice_expression" => Expr::Slice {
                x: Box::new(self.field_expr(node, "operand")),
                lo: self.boxed(node, "start"),
                hi: self.boxed(node, "end"),
                max: self.boxed(node, "capacity"),
            },
            "type_assertion_expression" => Expr::TypeAssert {
                x: Box::new(self.field_expr(node, "operand")),
                ty: node.child_by_field_name("type").map(|t| Box::new(self.ty(t))),
            },
            "type_conversion_expression" => Expr::Call {
                fun: Box::new(self.field_ty(node, "type")),
                args: vec![self.field_expr(node, "operand")],
                ellipsis: false,
            },
            "call_expression" => {
                let mut fun = self.field_expr(node, "function");
                if let Some(targs) = node.child_by_field_name("type_arguments") {
                    fun = Expr::Index {
                        x: Box::new(fun),
                        indices: named(targs).into_iter().map(|a| self.ty(a)).collect(),
                    };
                }
                let mut args = Vec::new();
                let mut ellipsis = false;
                if let Some(list) = node.child_by_field_name("arguments") {
                    for arg in named(list) {
                        if arg.kind() == "variadic_argument" {
                            ellipsis = true;
                            if let Some(inner) = named(arg).first() {
                                args.push(self.expr(*inner));
                            }
                        } else {
                            args.push(self.expr(arg));
                        }
                    }
                }
                Expr::Call {
                    fun: Box::new(fun),
                    args,
                    ellipsis,
                }
            }
            "unary_expression" => {
                let operand = Box::new(self.field_expr(node, "operand"));
                let op = node
                    .child_by_field_name("operator")
                    .map(|o| self.text(o))
                    .unwrap_or_default();
                match op {
                    "*" => Expr::Star(operand),
                    "&" => Expr::Unary {
                        op: UnaryOp::Addr,
                        x: operand,
                    },
                    "<-" => Expr::Unary {
                        op: UnaryOp::Recv,
                        x: operand,
                    },
                    "!" => Expr::Unary {
                        op: UnaryOp::Not,
                        x: operand,
                    },
                    _ => Expr::Unary {
                        op: UnaryOp::Other,
                        x: operand,
                    },
                }
            }
            "binary_expression" => {
                let op = match node
                    .child_by_field_name("operator")
                    .map(|o| self.text(o))
                    .unwrap_or_default()
                {
                    "==" | "!=" | "<" | "<=" | ">" | ">=" => BinaryOp::Compare,
                    "&&" | "||" => BinaryOp::Logical,
                    "<<" | ">>" => BinaryOp::Shift,
                    _ => BinaryOp::Arith,
                };
                Expr::Binary {
                    op,
                    x: Box::new(self.field_expr(node, "left")),
                    y: Box::new(self.field_expr(node, "right")),
                }
            }
            "composite_literal" => Expr::CompositeLit {
                ty: node.child_by_field_name("type").map(|t| Box::new(self.ty(t))),
                elts: node
                    .child_by_field_name("body")
                    .map(|b| self.literal_elements(b))
                    .unwrap_or_default(),
                span,
            },
            "literal_value" => Expr::CompositeLit {
                ty: None,
                elts: self.literal_elements(node),
                span,
            },
            "literal_element" | "element" => match first() {
                Some(inner) => self.expr(inner),
                None => Expr::Bad(span),
            },
            "keyed_element" => {
                let (key, value) = match (node.child_by_field_name("key"), node.child_by_field_name("value")) {
                    (Some(k), Some(v)) => (self.expr(k), self.expr(v)),
                    _ => {
                        let parts = named(node);
                        match parts.as_slice() {
                            [k, v, ..] => (self.expr(*k), self.expr(*v)),
                            _ => return Expr::Bad(span),
                        }
                    }
                };
                Expr::KeyValue {
                    key: Box::new(key),
                    value: Box::new(value),
                }
            }
            "func_literal" => Expr::FuncLit {
                ty: self.func_type(node),
                body: node
                    .child_by_field_name("body")
                    .map(|b| self.block(b))
                    .unwrap_or(Block {
                        stmts: Vec::new(),
                        span,
                    }),
            },
            kind if is_type_kind(kind) => self.ty(node),
            _ => Expr::Bad(span),
        }
    }

    fn lit(&self, node: Node<'_>, kind: LitKind) -> Expr {
        Expr::BasicLit {
            kind,
            value: self.text(node).to_string(),
            span: self.span(node),
        }
    }

    fn block(&self, node: Node<'_>) -> Block {
        let mut stmts = Vec::new();
        for child in named(node) {
            self.push_stmt(child, &mut stmts);
        }
        Block {
            stmts,
            span: self.span(node),
        }
    }

    fn push_stmt(&self, node: Node<'_>, out: &mut Vec<Stmt>) {
        if node.kind() == "statement_list" {
            for child in named(node) {
                self.push_stmt(child, out);
            }
        } else if let Some(stmt) = self.stmt(node) {
            out.push(stmt);
        }
    }

    fn clause_body(&self, node: Node<'_>) -> Vec<Stmt> {
        let mut out = Vec::new();
        for child in unfielded(node) {
            self.push_stmt(child, &mut out);
        }
        out
    }

    fn boxed_stmt(&self, node: Node<'_>, field: &str) -> Option<Box<Stmt>> {
        node.child_by_field_name(field)
            .and_then(|n| self.stmt(n))
            .map(Box::new)
    }

    fn stmt(&self, node: Node<'_>) -> Option<Stmt> {
        let first = || named(node).into_iter().next();
        let stmt = match node.kind() {
            "expression_statement" => Stmt::Expr(self.expr(first()?)),
            "send_statement" => Stmt::Send {
                chan: self.field_expr(node, "channel"),
                value: self.field_expr(node, "value"),
            },
            "inc_statement" | "dec_statement" => Stmt::IncDec(self.expr(first()?)),
            "assignment_statement" => Stmt::Assign {
                lhs: self.exprs(node.child_by_field_name("left")),
                rhs: self.exprs(node.child_by_field_name("right")),
                define: false,
            },
            "short_var_declaration" => Stmt::Assign {
                lhs: self.exprs(node.child_by_field_name("left")),
                rhs: self.exprs(node.child_by_field_name("right")),
                define: true,
            },
            "receive_statement" => match node.child_by_field_name("left") {
                Some(left) => Stmt::Assign {
                    lhs: self.exprs(Some(left)),
                    rhs: vec![self.field_expr(node, "right")],
                    define: has_token(node, ":="),
                },
                None => Stmt::Expr(self.field_expr(node, "right")),
            },
            "labeled_statement" => {
                let label = node.child_by_field_name("label")?;
                let inner = unfielded(node)
                    .into_iter()
                    .find_map(|n| self.stmt(n))
                    .unwrap_or(Stmt::Empty);
                Stmt::Labeled {
                    label: self.ident(label),
                    stmt: Box::new(inner),
                }
            }
            "goto_statement" | "break_statement" | "continue_statement" => Stmt::Branch {
                label: first().map(|l| self.ident(l)),
            },
            "fallthrough_statement" => Stmt::Branch { label: None },
            "return_statement" => Stmt::Return(self.exprs(first())),
            "go_statement" => Stmt::Go(self.expr(first()?)),
            "defer_statement" => Stmt::Defer(self.expr(first()?)),
            "block" => Stmt::Block(self.block(node)),
            "if_statement" => Stmt::If {
                init: self.boxed_stmt(node, "initializer"),
                cond: self.field_expr(node, "condition"),
                then: self.block(node.child_by_field_name("consequence")?),
                els: self.boxed_stmt(node, "alternative"),
            },
            "for_statement" => {
                let body = self.block(node.child_by_field_name("body")?);
                match unfielded(node).into_iter().next() {
                    Some(clause) if clause.kind() == "for_clause" => Stmt::For {
                        init: self.boxed_stmt(clause, "initializer"),
                        cond: clause.child_by_field_name("condition").map(|c| self.expr(c)),
                        post: self.boxed_stmt(clause, "update"),
                        body,
                    },
                    Some(clause) if clause.kind() == "range_clause" => {
                        let mut left = self.exprs(clause.child_by_field_name("left")).into_iter();
                        Stmt::Range {
                            key: left.next(),
                            value: left.next(),
                            define: has_token(clause, ":="),
                            x: self.field_expr(clause, "right"),
                            body,
                        }
                    }
                    Some(cond) => Stmt::For {
                        init: None,
                        cond: Some(self.expr(cond)),
                        post: None,
                        body,
                    },
                    None => Stmt::For {
                        init: None,
                        cond: None,
                        post: None,
                        body,
                    },
                }
            }
            "expression_switch_statement" => Stmt::Switch {
                init: self.boxed_stmt(node, "initializer"),
                tag: node.child_by_field_name("value").map(|v| self.expr(v)),
                clauses: named(node)
                    .into_iter()
                    .filter(|c| matches!(c.kind(), "expression_case" | "default_case"))
                    .map(|c| CaseClause {
                        list: self.exprs(c.child_by_field_name("value")),
                        is_default: c.kind() == "default_case",
                        body: self.clause_body(c),
                    })
                    .collect(),
            },
            "type_switch_statement" => Stmt::TypeSwitch {
                init: self.boxed_stmt(node, "initializer"),
                bind: node
                    .child_by_field_name("alias")
                    .and_then(|a| if a.kind() == "expression_list" { named(a).into_iter().next() } else { Some(a) })
                    .map(|a| self.ident(a)),
                x: self.field_expr(node, "value"),
                clauses: named(node)
                    .into_iter()
                    .filter(|c| matches!(c.kind(), "type_case" | "default_case"))
                    .map(|c| CaseClause {
                        list: fields(c, "type").into_iter().map(|t| self.ty(t)).collect(),
                        is_default: c.kind() == "default_case",
                        body: self.clause_body(c),
                    })
                    .collect(),
            },
            "select_statement" => Stmt::Select {
                clauses: named(node)
                    .into_iter()
                    .filter(|c| matches!(c.kind(), "communication_case" | "default_case"))
                    .map(|c| CommClause {
                        comm: self.boxed_stmt(c, "communication"),
                        body: self.clause_body(c),
                    })
                    .collect(),
            },
            "var_declaration" | "const_declaration" | "type_declaration" => {
                Stmt::Decl(self.gen_decl(node))
            }
            "empty_statement" => Stmt::Empty,
            _ => match self.expr(node) {
                Expr::Bad(_) => return None,
                e => Stmt::Expr(e),
            },
        };
        Some(stmt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spelunk_metal::GoParser;

    fn lower_source(source: &str) -> File {
        let mut parser = GoParser::new().unwrap();
        let parsed = parser.parse("test.go", source.to_string()).unwrap();
        lower(&parsed)
    }

    #[test]
    fn test_lower_package_and_imports() {
        let file = lower_source(
            "package demo\n\nimport (\n\t\"fmt\"\n\tp \"example.com/x/pkg\"\n)\n",
        );
        assert_eq!(file.package.name, "demo");
        assert_eq!(file.imports.len(), 2);
        assert_eq!(file.imports[0].path, "fmt");
        assert!(file.imports[0].name.is_none());
        assert_eq!(file.imports[1].name.as_ref().map(|n| n.name.as_str()), Some("p"));
        assert_eq!(file.imports[1].path_span.start.line, 5);
    }

    #[test]
    fn test_lower_const_group_repeats_previous_spec() {
        let file = lower_source("package demo\n\nconst (\n\tA Kind = iota\n\tB\n\tC\n)\n");
        let Decl::Gen(decl) = &file.decls[0] else {
            panic!("expected a const declaration");
        };
        assert_eq!(decl.specs.len(), 3);
        let Spec::Value(b) = &decl.specs[1] else {
            panic!("expected a value spec");
        };
        assert!(b.implicit);
        assert!(b.ty.is_some());
        assert_eq!(b.names[0].name, "B");
    }

    #[test]
    fn test_lower_method_receiver_and_body() {
        let file = lower_source(
            "package demo\n\ntype T struct{ n int }\n\nfunc (t *T) Get() int {\n\treturn t.n\n}\n",
        );
        let func = file
            .decls
            .iter()
            .find_map(|d| match d {
                Decl::Func(f) => Some(f),
                _ => None,
            })
            .unwrap();
        assert_eq!(func.name.name, "Get");
        let recv = func.recv.as_ref().unwrap();
        assert_eq!(recv.list[0].names[0].name, "t");
        assert_eq!(recv.list[0].ty.base_ident().map(|i| i.name.as_str()), Some("T"));
        let body = func.body.as_ref().unwrap();
        assert!(matches!(body.stmts[0], Stmt::Return(_)));
        assert!(func.ty.results.is_some());
    }

    #[test]
    fn test_lower_struct_fields_and_embedding() {
        let file = lower_source("package demo\n\ntype S struct {\n\t*Base\n\tA, B string\n}\n");
        let Decl::Gen(decl) = &file.decls[0] else {
            panic!("expected a type declaration");
        };
        let Spec::Type(spec) = &decl.specs[0] else {
            panic!("expected a type spec");
        };
        let Expr::StructType { fields, .. } = &spec.ty else {
            panic!("expected a struct type");
        };
        assert!(fields[0].names.is_empty());
        assert!(matches!(fields[0].ty, Expr::Star(_)));
        assert_eq!(fields[1].names.len(), 2);
    }

    #[test]
    fn test_lower_keyed_composite_literal() {
        let file = lower_source(
            "package demo\n\nfunc f() {\n\ts := S{Name: \"x\"}\n\t_ = s\n}\n",
        );
        let Decl::Func(func) = &file.decls[0] else {
            panic!("expected a function");
        };
        let Stmt::Assign { rhs, define, .. } = &func.body.as_ref().unwrap().stmts[0] else {
            panic!("expected a short variable declaration");
        };
        assert!(*define);
        let Expr::CompositeLit { elts, ty, .. } = &rhs[0] else {
            panic!("expected a composite literal");
        };
        assert!(ty.is_some());
        let Expr::KeyValue { key, .. } = &elts[0] else {
            panic!("expected a keyed element");
        };
        assert!(matches!(key.as_ref(), Expr::Ident(id) if id.name == "Name"));
    }
}

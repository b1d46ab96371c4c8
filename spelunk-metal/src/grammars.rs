use tree_sitter::Language;

pub fn language_go() -> Language {
    tree_sitter_go::LANGUAGE.into()
}

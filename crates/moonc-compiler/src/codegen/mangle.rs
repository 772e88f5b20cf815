//! Assembly label mangling (§4.4 "Name mangling").
//!
//! Moon assembly labels can't contain `::`, and nothing stops two classes
//! from declaring methods with the same bare name, so every generated
//! label is prefixed with a kind tag (`func`, `if`, `while`) and a counter
//! that's monotonically increasing *per kind*, not per label — two
//! `if`-labels never collide even if they land in functions with the same
//! name. Function labels are cached by table name so every call site
//! referencing the same function agrees on the same label; `if`/`while`
//! labels are never cached, since each statement needs a fresh one.

use std::collections::HashMap;

pub struct Mangler {
    counters: HashMap<&'static str, u32>,
    func_labels: HashMap<String, String>,
}

impl Mangler {
    pub fn new() -> Self {
        Self {
            counters: HashMap::new(),
            func_labels: HashMap::new(),
        }
    }

    fn fresh(&mut self, kind: &'static str, scope_name: &str) -> String {
        let counter = self.counters.entry(kind).or_insert(0);
        *counter += 1;
        format!("{kind}{}{}", *counter, scope_name.replace("::", "_"))
    }

    /// `main` is never mangled: it's the program's single, fixed entry
    /// point and every other label on earth can collide with it freely
    /// since nothing ever calls it by a generated label.
    pub fn func_label(&mut self, table_name: &str) -> String {
        if table_name == "main" {
            return "main".to_string();
        }
        if let Some(existing) = self.func_labels.get(table_name) {
            return existing.clone();
        }
        let label = self.fresh("func", table_name);
        self.func_labels.insert(table_name.to_string(), label.clone());
        label
    }

    pub fn if_label(&mut self, enclosing_scope_name: &str) -> String {
        self.fresh("if", enclosing_scope_name)
    }

    pub fn while_label(&mut self, enclosing_scope_name: &str) -> String {
        self.fresh("while", enclosing_scope_name)
    }
}

impl Default for Mangler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mangles_method_tables_with_a_counter() {
        let mut m = Mangler::new();
        assert_eq!(m.func_label("Foo::bar"), "func1Foo_bar");
    }

    #[test]
    fn caches_repeated_lookups_of_the_same_function() {
        let mut m = Mangler::new();
        let first = m.func_label("Foo::bar");
        let _ = m.func_label("Other::baz");
        assert_eq!(m.func_label("Foo::bar"), first);
    }

    #[test]
    fn if_and_while_counters_are_independent_and_never_cached() {
        let mut m = Mangler::new();
        assert_eq!(m.if_label("main"), "if1main");
        assert_eq!(m.if_label("main"), "if2main");
        assert_eq!(m.while_label("main"), "while1main");
    }

    #[test]
    fn main_is_never_mangled() {
        let mut m = Mangler::new();
        assert_eq!(m.func_label("main"), "main");
        assert_eq!(m.func_label("main"), "main");
    }
}

//! # Guard conditions
//!
//! A guard condition decides whether a binding is eligible in the current context. The language
//! is deliberately small:
//!
//! * `name` is true when the flag `name` is set
//! * `!expr` negates
//! * `a && b` and `a || b` combine
//! * `var == value` compares a variable with a literal, optionally quoted
//!
//! There is no grouping. An expression is split on `||` first, then each part on `&&`, then
//! leading `!` is applied, so `a || b && !c` reads as `a || (b && (!c))`.
use crate::context::LookupContext;

/// A validated guard condition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Condition {
    text: String,
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() &&
        s.chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | ':' | '-'))
}

fn unquote(s: &str) -> &str {
    let s = s.trim();

    for q in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(q).and_then(|s| s.strip_suffix(q)) {
            return inner;
        }
    }

    s
}

fn check_term(term: &str) -> bool {
    let term = term.trim();

    if let Some(inner) = term.strip_prefix('!') {
        return check_term(inner);
    }

    match term.split_once("==") {
        Some((var, value)) => is_identifier(var.trim()) && !unquote(value).is_empty(),
        None => is_identifier(term),
    }
}

fn eval_term(term: &str, ctx: &LookupContext) -> bool {
    let term = term.trim();

    if let Some(inner) = term.strip_prefix('!') {
        return !eval_term(inner, ctx);
    }

    match term.split_once("==") {
        Some((var, value)) => ctx.variable(var.trim()) == Some(unquote(value)),
        None => {
            match term {
                "true" => true,
                "false" => false,
                flag => ctx.flag(flag),
            }
        },
    }
}

impl Condition {
    /// Validate a condition. Returns `None` when an operand is missing or isn't an identifier.
    pub fn parse(text: &str) -> Option<Self> {
        let valid = text
            .split("||")
            .all(|disjunct| disjunct.split("&&").all(check_term));

        if valid {
            Some(Condition { text: text.trim().to_string() })
        } else {
            None
        }
    }

    /// The original text of the condition.
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    /// Evaluate this condition against a context.
    pub fn evaluate(&self, ctx: &LookupContext) -> bool {
        self.text
            .split("||")
            .any(|disjunct| disjunct.split("&&").all(|term| eval_term(term, ctx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(text: &str, ctx: &LookupContext) -> bool {
        Condition::parse(text).expect("valid condition").evaluate(ctx)
    }

    #[test]
    fn test_flags() {
        let ctx = LookupContext::new().with_flag("editorFocus", true).with_flag("readonly", false);

        assert!(eval("editorFocus", &ctx));
        assert!(!eval("readonly", &ctx));
        assert!(!eval("unknownFlag", &ctx));
        assert!(eval("!readonly", &ctx));
        assert!(eval("!!editorFocus", &ctx));
        assert!(eval("true", &ctx));
        assert!(!eval("false", &ctx));
    }

    #[test]
    fn test_connectives() {
        let ctx = LookupContext::new().with_flag("a", true).with_flag("b", false);

        assert!(eval("a && !b", &ctx));
        assert!(!eval("a && b", &ctx));
        assert!(eval("a || b", &ctx));
        assert!(eval("b || a", &ctx));
        assert!(!eval("b || !a", &ctx));
    }

    #[test]
    fn test_precedence() {
        let ctx = LookupContext::new().with_flag("a", true).with_flag("b", false);

        // a || (b && b)
        assert!(eval("a || b && b", &ctx));

        // (b && b) || a
        assert!(eval("b && b || a", &ctx));

        // (a && b) || (b && a)
        assert!(!eval("a && b || b && a", &ctx));

        // The negation only applies to its own term.
        assert!(eval("!b && a", &ctx));
        assert!(!eval("!a || b", &ctx));
    }

    #[test]
    fn test_equality() {
        let ctx = LookupContext::new().with_variable("resourceLangId", "go");

        assert!(eval("resourceLangId == go", &ctx));
        assert!(eval("resourceLangId == 'go'", &ctx));
        assert!(eval("resourceLangId == \"go\"", &ctx));
        assert!(!eval("resourceLangId == rust", &ctx));
        assert!(!eval("missing == go", &ctx));
        assert!(eval("!resourceLangId == rust", &ctx));
        assert!(eval("resourceLangId == rust || resourceLangId == go", &ctx));
    }

    #[test]
    fn test_invalid() {
        assert_eq!(Condition::parse(""), None);
        assert_eq!(Condition::parse("a &&"), None);
        assert_eq!(Condition::parse("|| a"), None);
        assert_eq!(Condition::parse("!"), None);
        assert_eq!(Condition::parse("x =="), None);
        assert_eq!(Condition::parse("== y"), None);
        assert_eq!(Condition::parse("(a || b)"), None);
        assert_eq!(Condition::parse("a b"), None);
    }
}

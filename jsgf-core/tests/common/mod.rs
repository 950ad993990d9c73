use jsgf_core::{Expansion, Rule};

#[allow(dead_code)]
pub fn lit(text: &str) -> Expansion {
    Expansion::literal(text)
}

#[allow(dead_code)]
pub fn seq(children: Vec<Expansion>) -> Expansion {
    Expansion::sequence(children)
}

#[allow(dead_code)]
pub fn alt(children: Vec<Expansion>) -> Expansion {
    Expansion::alternatives(children)
}

#[allow(dead_code)]
pub fn opt(child: Expansion) -> Expansion {
    Expansion::optional(child)
}

#[allow(dead_code)]
pub fn star(child: Expansion) -> Expansion {
    Expansion::kleene_star(child)
}

#[allow(dead_code)]
pub fn plus(child: Expansion) -> Expansion {
    Expansion::repeat(child)
}

#[allow(dead_code)]
pub fn req(children: Vec<Expansion>) -> Expansion {
    Expansion::required(children)
}

#[allow(dead_code)]
pub fn rule_ref(name: &str) -> Expansion {
    Expansion::named_rule_ref(name)
}

#[allow(dead_code)]
pub fn dict() -> Expansion {
    Expansion::dictation()
}

#[allow(dead_code)]
pub fn public_rule(name: &str, expansion: Expansion) -> Rule {
    Rule::public(name, expansion).unwrap()
}

#[allow(dead_code)]
pub fn private_rule(name: &str, expansion: Expansion) -> Rule {
    Rule::private(name, expansion).unwrap()
}

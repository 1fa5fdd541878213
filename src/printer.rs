// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Readable rendering of terms.
//!
//! Terms are DAGs, so a naive s-expression dump can explode. A compound
//! subterm that occurs more than once is printed as a reference `[N]` and
//! expanded once in a trailing `where` section. Tseitin variables have no
//! declared names and are rendered `τ0`, `τ1`, ... in order of appearance.

use fxhash::{FxHashMap, FxHashSet};
use itertools::Itertools;

use crate::syntax::{Symbol, Term, TermPool};
use crate::term::subst::{fold, post_order};

#[derive(Debug, Clone)]
struct Image {
    /// Whether this renders as a single atom-like token.
    literal: bool,
    name: String,
    args: Vec<Image>,
}

/// Renders `t` as an indented s-expression. `resolve` supplies names for
/// declared symbols; a symbol without a name prints as `{?}`.
pub fn serialize(
    pool: &TermPool,
    t: Term,
    mut resolve: impl FnMut(Symbol) -> Option<String>,
) -> String {
    // a compound non-negation arg seen under two parents gets a label
    let mut seen: FxHashSet<Term> = FxHashSet::default();
    let mut labels: FxHashMap<Term, String> = FxHashMap::default();
    post_order(pool, t, |e| {
        for &a in pool.args(e) {
            if seen.contains(&a)
                && !pool.args(a).is_empty()
                && !matches!(pool.symbol(a), Symbol::Not(_))
            {
                if !labels.contains_key(&a) {
                    labels.insert(a, format!("[{}]", labels.len() + 1));
                }
            } else {
                seen.insert(a);
            }
        }
    });

    let mut taus: FxHashMap<Term, String> = FxHashMap::default();
    let mut refs: Vec<(String, Image)> = Vec::new();
    let image = fold(pool, t, |pool, e, args: &[Image]| {
        let symbol = pool.symbol(e);
        let name = match symbol {
            Symbol::BoolConst(b) => String::from(if b { "true" } else { "false" }),
            Symbol::IntConst(v) => v.to_string(),
            Symbol::Tseitin(inner) => match taus.get(&inner) {
                Some(n) => n.clone(),
                None => {
                    let n = format!("τ{}", taus.len());
                    taus.insert(inner, n.clone());
                    n
                }
            },
            _ => resolve(symbol).unwrap_or_else(|| String::from("{?}")),
        };
        if matches!(symbol, Symbol::Not(_)) && args[0].literal {
            return Image {
                literal: true,
                name: format!("({name} {})", args[0].name),
                args: Vec::new(),
            };
        }
        let image = Image {
            literal: args.is_empty(),
            name,
            args: args.to_vec(),
        };
        match labels.get(&e) {
            Some(label) => {
                refs.push((label.clone(), image));
                Image {
                    literal: true,
                    name: label.clone(),
                    args: Vec::new(),
                }
            }
            None => image,
        }
    });

    let mut lines = Vec::new();
    render(&image, 0, &mut lines);
    if !refs.is_empty() {
        lines.push(String::from("where"));
        for (label, img) in refs {
            lines.push(format!("\t{label}:"));
            render(&img, 2, &mut lines);
        }
    }
    lines.join("\n")
}

fn render(image: &Image, indent: usize, lines: &mut Vec<String>) {
    let tabs = "\t".repeat(indent);
    if image.args.is_empty() {
        lines.push(format!("{tabs}{}", image.name));
    } else if image.args.iter().all(|a| a.literal) {
        let parts = image.args.iter().map(|a| a.name.as_str()).join(" ");
        lines.push(format!("{tabs}({} {})", image.name, parts));
    } else {
        lines.push(format!("{tabs}({}", image.name));
        for a in &image.args {
            render(a, indent + 1, lines);
        }
        lines.last_mut().unwrap().push(')');
    }
}

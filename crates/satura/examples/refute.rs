//! Build a small problem programmatically, run saturation, and print the
//! derivation of the refutation.
//!
//! Run with `RUST_LOG=debug` to watch the loop select given clauses.

use satura::{
    saturate, Clause, ClauseRole, FunctionSymbol, Interner, Literal, PredicateSymbol,
    ProofOutcome, ProverConfig, TermBank,
};

fn main() {
    env_logger::init();

    let mut interner = Interner::new();
    let mut terms = TermBank::new();

    // {p(a)}, {~p(X) | q(X)}, {~q(a)}
    let p = PredicateSymbol::new(interner.intern_predicate("p", 1), 1);
    let q = PredicateSymbol::new(interner.intern_predicate("q", 1), 1);
    let a = terms.constant(FunctionSymbol::new(interner.intern_function("a", 0), 0));
    let x = terms.var(interner.intern_variable("X"));

    let clauses = vec![
        Clause::new(vec![Literal::positive(p, vec![a])], &terms),
        Clause::new(
            vec![Literal::negative(p, vec![x]), Literal::positive(q, vec![x])],
            &terms,
        ),
        Clause::with_role(
            vec![Literal::negative(q, vec![a])],
            ClauseRole::NegatedConjecture,
            &terms,
        ),
    ];

    let (outcome, prover) = saturate(clauses, ProverConfig::default(), interner, terms);
    let exit_code = outcome.exit_code();
    match outcome {
        ProofOutcome::Refutation { empty_clause_idx } => {
            println!("refutation found\n");
            for step in prover.extract_proof(empty_clause_idx) {
                println!(
                    "{:>4}  {:<24} {:?}  {}",
                    step.clause_idx,
                    step.rule_name,
                    step.premises,
                    step.conclusion.display(prover.terms(), prover.interner())
                );
            }
        }
        other => println!("no refutation: {:?}", other),
    }
    std::process::exit(exit_code);
}

//! A small catalogue of FpML business rules
//!
//! These rules sit on top of the engine the same way a full rule corpus
//! would: shared preconditions, plain rule bodies, and the scheme and
//! reference constructors.

use std::sync::Arc;

use crate::documents::NodeRef;
use crate::error::Result;
use crate::preconditions::Precondition;
use crate::rules::{
    broken_scheme_rule, reference_rule, scheme_rule, ElementSelector, Rule, RuleSet, RULE_VIOLATION,
};
use crate::schemes::ReleaseRegistry;

/// Interest rate stream elements
pub const INTEREST_RATE_STREAMS: [&str; 2] = ["swapStream", "capFloorStream"];

/// Elements whose `href` must point at a party
pub const PARTY_REFERENCES: [&str; 5] = [
    "partyReference",
    "payerPartyReference",
    "receiverPartyReference",
    "buyerPartyReference",
    "sellerPartyReference",
];

const CALCULATION: [&str; 2] = ["calculationPeriodAmount", "calculation"];

fn has_floating_calculation(stream: &NodeRef<'_>) -> bool {
    stream.descend(&CALCULATION).is_some_and(|calc| {
        calc.child("floatingRateCalculation").is_some()
            || calc.child("inflationRateCalculation").is_some()
    })
}

/// ird-1: a stream with resetDates must have a floating or inflation calculation
pub fn ird_1(streams: &Arc<Precondition>) -> Rule {
    Rule::new("ird-1", Arc::clone(streams), |index, reporter| {
        let mut ok = true;
        for name in INTEREST_RATE_STREAMS {
            for stream in index.elements_by_name(name) {
                if stream.child("resetDates").is_none() || has_floating_calculation(&stream) {
                    continue;
                }
                reporter.report(
                    RULE_VIOLATION,
                    &stream,
                    "resetDates is present but there is no floatingRateCalculation or inflationRateCalculation",
                    Some(name),
                );
                ok = false;
            }
        }
        ok
    })
}

/// ird-2: a floating or inflation calculation requires resetDates
pub fn ird_2(streams: &Arc<Precondition>) -> Rule {
    Rule::new("ird-2", Arc::clone(streams), |index, reporter| {
        let mut ok = true;
        for name in INTEREST_RATE_STREAMS {
            for stream in index.elements_by_name(name) {
                if !has_floating_calculation(&stream) || stream.child("resetDates").is_some() {
                    continue;
                }
                reporter.report(
                    RULE_VIOLATION,
                    &stream,
                    "A floating or inflation calculation is present but resetDates is missing",
                    Some(name),
                );
                ok = false;
            }
        }
        ok
    })
}

/// Build the standard rule set
pub fn rule_set(registry: &Arc<ReleaseRegistry>) -> Result<RuleSet> {
    let streams = Precondition::element_presence(INTEREST_RATE_STREAMS);
    let references = Precondition::element_presence(PARTY_REFERENCES);

    let mut rules = RuleSet::new("standard");
    rules.add(ird_1(&streams))?;
    rules.add(ird_2(&streams))?;
    rules.add(reference_rule(
        "ref-1",
        references,
        ElementSelector::names(PARTY_REFERENCES),
        ElementSelector::names(["party"]),
    ))?;
    rules.add(scheme_rule(
        "scheme-currency",
        Precondition::element_presence(["currency"]),
        Arc::clone(registry),
        ElementSelector::names(["currency"]),
        "currencyScheme",
    ))?;
    rules.add(broken_scheme_rule(
        "scheme-business-center",
        Precondition::element_presence(["businessCenter"]),
        Arc::clone(registry),
        ElementSelector::names(["businessCenter"]),
        "businessCenterScheme",
    ))?;
    Ok(rules)
}

use crate::dump_tests::diff_plan;
use crate::{FnId, PlanError, SlotId, StateId, Step, TokenId, TokenSet};

#[test]
fn valid_plan_verifies() {
    assert_eq!(diff_plan().verify(), Ok(()));
}

#[test]
fn no_roots() {
    let mut plan = diff_plan();
    plan.roots.clear();
    assert_eq!(plan.verify(), Err(PlanError::NoRoots));
}

#[test]
fn target_out_of_range() {
    let mut plan = diff_plan();
    plan.functions[0].states[0] = Step::Match {
        accept: TokenSet::single(TokenId(1)),
        bind: None,
        next: StateId(40),
    };
    let err = plan.verify().unwrap_err();
    assert_eq!(err.to_string(), "function `diff` state 0: target 40 out of range");
}

#[test]
fn slot_out_of_range() {
    let mut plan = diff_plan();
    plan.functions[0].states[0] = Step::Match {
        accept: TokenSet::single(TokenId(1)),
        bind: Some(SlotId(9)),
        next: StateId(1),
    };
    let err = plan.verify().unwrap_err();
    assert_eq!(err.to_string(), "function `diff` state 0: slot 9 out of range");
}

#[test]
fn undeclared_token() {
    let mut plan = diff_plan();
    plan.functions[0].states[2] = Step::Match {
        accept: TokenSet::single(TokenId(7)),
        bind: None,
        next: StateId(3),
    };
    let err = plan.verify().unwrap_err();
    assert_eq!(
        err,
        PlanError::UnknownToken {
            function: "diff".into(),
            state: 2,
            token: 7
        }
    );
}

#[test]
fn bad_callee() {
    let mut plan = diff_plan();
    plan.functions[0].states[5] = Step::Call {
        callee: FnId(3),
        ret: StateId(6),
    };
    let err = plan.verify().unwrap_err();
    assert_eq!(err.to_string(), "function `diff` state 5: function 3 out of range");
}

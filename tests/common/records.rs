//! Derived-record fixtures

use covenant::integrity::OptionRecord;
use covenant::DerivedRecord;

/// Index-encoded question whose answer index points past its options.
pub fn drafting_question(id: &str) -> DerivedRecord {
    DerivedRecord::indexed(
        id,
        "Which step in the drafting process may be skipped?",
        [
            "Submit the final contract to the membership",
            "The optional pre-draft review with counsel",
            "Deliver the executed copy within ten days",
        ],
        5,
    )
    .with_category("question")
    .with_citation("Article VII, Section 2")
    .with_field("difficulty", 3)
}

/// One record per defect kind, plus a valid one, in id order.
pub fn defective_collection() -> Vec<DerivedRecord> {
    vec![
        drafting_question("q-01"),
        DerivedRecord::indexed("q-02", "Valid question", ["Yes", "No"], 0)
            .with_category("question")
            .with_citation("Article VII")
            .with_field("difficulty", 1),
        DerivedRecord::flagged(
            "s-01",
            "Scenario with no marked answer",
            vec![OptionRecord::new("Grieve"), OptionRecord::new("Wait")],
        )
        .with_category("scenario")
        .with_citation("Article Article XI"),
        DerivedRecord::flagged(
            "s-02",
            "Scenario with two marked answers",
            vec![
                OptionRecord::correct("File within 30 days"),
                OptionRecord::correct("File within 60 days"),
            ],
        )
        .with_category("scenario")
        .with_citation("Article XL"),
    ]
}

//! Segmentation over whole agreements
//!
//! Exercises the builder, export and coverage audit together on texts with
//! known line positions.

mod common;

use common::{AgreementFixture, FixtureArticle};
use covenant::coverage;
use covenant::segment::numerals::canonical_numerals;
use covenant::segment::{flatten, AnomalyKind, NodeKind, RawLine, StructureBuilder};
use covenant::{ingest, SegmentConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

// === Scenario: table of contents repeats an Article heading ===

fn agreement_with_table_of_contents() -> AgreementFixture {
    AgreementFixture::new()
        .line("AGREEMENT BETWEEN THE COUNTY AND THE ASSOCIATION")
        .pad_to(50)
        .article(&FixtureArticle::new("VII", "Player Contracts").with_body_lines(0))
        .pad_to(2400)
        .article(
            &FixtureArticle::new("VII", "Player Contracts")
                .with_section("Definitions")
                .with_section("Time Limits"),
        )
        .article(&FixtureArticle::new("VIII", "Arbitration"))
}

#[test]
fn minimum_offset_skips_table_of_contents_heading() {
    let fixture = agreement_with_table_of_contents();
    assert_eq!(fixture.heading_lines("VII"), vec![50, 2400]);

    let seg = StructureBuilder::new()
        .with_min_offset(2000)
        .build(&RawLine::split(&fixture.text()));

    let article = seg.root.article("VII").unwrap();
    assert_eq!(article.start_line, 2400);
    assert_eq!(article.title, "Player Contracts");
    assert_eq!(article.children.len(), 2);
    assert_eq!(seg.articles().count(), 2);

    let before_offset: Vec<_> = seg
        .anomalies
        .iter()
        .filter(|a| a.kind == AnomalyKind::HeadingBeforeOffset)
        .map(|a| a.line)
        .collect();
    assert_eq!(before_offset, vec![50]);
    assert!(seg.root.body_lines.iter().any(|l| l == "ARTICLE VII"));
}

#[test]
fn without_offset_the_later_heading_is_the_duplicate() {
    let fixture = agreement_with_table_of_contents();
    let seg = StructureBuilder::new().build(&RawLine::split(&fixture.text()));

    assert_eq!(seg.root.article("VII").unwrap().start_line, 50);
    let duplicates: Vec<_> = seg
        .warnings()
        .filter(|a| a.kind == AnomalyKind::DuplicateNumeral)
        .map(|a| a.line)
        .collect();
    assert_eq!(duplicates, vec![2400]);
}

#[test]
fn offset_from_config_flows_through_ingest() {
    let fixture = agreement_with_table_of_contents();
    let config = SegmentConfig {
        min_offset: 2000,
        expected_numerals: vec!["VII".into(), "VIII".into()],
        ..Default::default()
    };
    let ingestion = ingest("county", &fixture.text(), &config).unwrap();

    assert!(ingestion.coverage.is_complete());
    let citations: Vec<_> = ingestion
        .rows
        .iter()
        .filter_map(|r| r.citation.as_deref())
        .collect();
    assert_eq!(
        citations,
        vec!["Article VII, Section 1", "Article VII, Section 2", "Article VIII"]
    );
}

// === Scenario: one Article of forty-two never made it into the text ===

#[test]
fn coverage_reports_the_single_missing_article() {
    let mut fixture = AgreementFixture::new();
    for numeral in canonical_numerals().iter().filter(|n| *n != "XXXVI") {
        fixture = fixture.article(&FixtureArticle::new(numeral.clone(), "Title"));
    }

    let seg = StructureBuilder::new().build(&RawLine::split(&fixture.text()));
    let report = coverage::audit(&seg.root, &canonical_numerals());

    assert_eq!(report.missing_numerals, vec!["XXXVI"]);
    assert_eq!(report.present_numerals.len(), 41);
    assert!((report.coverage_ratio - 0.976).abs() < 0.001);
}

// === Properties over randomized agreements ===

#[test]
fn segments_partition_every_line_exactly_once() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..50 {
        let fixture = AgreementFixture::random(&mut rng, 12);
        let seg = StructureBuilder::new().build(&RawLine::split(&fixture.text()));
        assert_eq!(seg.line_count, fixture.line_count());

        let segments = seg.segments();
        let mut cursor = 0;
        for segment in &segments {
            assert_eq!(segment.range.start, cursor, "gap or overlap at {}", cursor);
            assert!(segment.range.end > segment.range.start);
            cursor = segment.range.end;
        }
        assert_eq!(cursor, seg.line_count);
    }
}

#[test]
fn every_written_article_is_found_in_order() {
    let mut rng = StdRng::seed_from_u64(42);
    for articles in [1, 5, 20, 42] {
        let fixture = AgreementFixture::random(&mut rng, articles);
        let seg = StructureBuilder::new().build(&RawLine::split(&fixture.text()));

        let expected: Vec<String> = canonical_numerals().into_iter().take(articles).collect();
        let found: Vec<String> = seg
            .articles()
            .filter_map(|a| a.numeral.clone())
            .collect();
        assert_eq!(found, expected);

        let report = coverage::audit(&seg.root, &expected);
        assert!(report.is_complete());
        assert_eq!(report.coverage_ratio, 1.0);
    }
}

#[test]
fn exported_rows_are_leaves_in_document_order() {
    let mut rng = StdRng::seed_from_u64(7);
    let fixture = AgreementFixture::random(&mut rng, 10);
    let seg = StructureBuilder::new().build(&RawLine::split(&fixture.text()));
    let rows = flatten(&seg.root);

    let leaves = seg
        .root
        .children
        .iter()
        .map(|child| match child.kind {
            NodeKind::Article if !child.is_leaf() => child.children.len(),
            _ => 1,
        })
        .sum::<usize>();
    assert_eq!(rows.len(), leaves);
    assert!(rows.windows(2).all(|w| w[0].start_line < w[1].start_line));
}

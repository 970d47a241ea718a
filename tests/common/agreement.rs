//! Agreement text fixtures

use covenant::segment::numerals::ordinal_to_numeral;
use rand::rngs::StdRng;
use rand::Rng;

/// An Article to emit, with its Section headings
#[derive(Debug, Clone)]
pub struct FixtureArticle {
    pub numeral: String,
    pub title: String,
    pub sections: Vec<String>,
    pub body_lines: usize,
}

impl FixtureArticle {
    pub fn new(numeral: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            numeral: numeral.into(),
            title: title.into(),
            sections: Vec::new(),
            body_lines: 1,
        }
    }

    pub fn with_section(mut self, heading: impl Into<String>) -> Self {
        self.sections.push(heading.into());
        self
    }

    pub fn with_body_lines(mut self, n: usize) -> Self {
        self.body_lines = n;
        self
    }
}

/// Line-addressed agreement builder
///
/// Records the line index of every Article heading it writes, so tests can
/// assert on exact positions.
#[derive(Debug, Default)]
pub struct AgreementFixture {
    lines: Vec<String>,
    headings: Vec<(String, usize)>,
}

impl AgreementFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(mut self, text: impl Into<String>) -> Self {
        self.lines.push(text.into());
        self
    }

    /// Fill with prose until the next line written lands at `index`.
    pub fn pad_to(mut self, index: usize) -> Self {
        while self.lines.len() < index {
            let n = self.lines.len();
            self.lines.push(format!("front matter paragraph {}", n));
        }
        self
    }

    pub fn article(mut self, article: &FixtureArticle) -> Self {
        self.headings
            .push((article.numeral.clone(), self.lines.len()));
        self.lines.push(format!("ARTICLE {}", article.numeral));
        self.lines.push(article.title.clone());
        for i in 0..article.body_lines {
            self.lines
                .push(format!("Article {} paragraph {}.", article.numeral, i));
        }
        for (i, heading) in article.sections.iter().enumerate() {
            self.lines.push(format!("Section {}. {}", i + 1, heading));
            self.lines
                .push(format!("Text of {} section {}.", article.numeral, i + 1));
        }
        self
    }

    /// Line indexes at which `ARTICLE <numeral>` headings were written.
    pub fn heading_lines(&self, numeral: &str) -> Vec<usize> {
        self.headings
            .iter()
            .filter(|(n, _)| n == numeral)
            .map(|(_, line)| *line)
            .collect()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn text(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }

    /// A randomized but well-formed agreement with `articles` Articles.
    ///
    /// Blank lines, separators and an occasional stray Section heading are
    /// sprinkled in to exercise every structural path.
    pub fn random(rng: &mut StdRng, articles: usize) -> Self {
        let mut fixture = Self::new().line("COLLECTIVE BARGAINING AGREEMENT");
        if rng.gen_bool(0.3) {
            fixture = fixture.line("Section 1. Stray heading before any article.");
        }
        for ordinal in 1..=articles {
            let Some(numeral) = ordinal_to_numeral(ordinal) else {
                break;
            };
            let mut article = FixtureArticle::new(numeral, format!("Title {}", ordinal))
                .with_body_lines(rng.gen_range(0..3));
            for s in 0..rng.gen_range(0..4) {
                article = article.with_section(format!("Heading {}", s));
            }
            fixture = fixture.article(&article);
            match rng.gen_range(0..4) {
                0 => fixture = fixture.line(""),
                1 => fixture = fixture.line("-----"),
                _ => {}
            }
        }
        fixture
    }
}

//! Report content
//!
//! Content is a fixed list of records per section. The animation core only
//! cares about a record's `id` (block key) and its position (stagger
//! index); everything else is carried through for display.

use crate::error::{Result, UnveilError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use unveil_animation::StaggerConfig;
use unveil_layout::{BlockPlan, SectionKind, SectionPlan, TriggerMode};

const BLOCK_PADDING: f32 = 48.0;
const TITLE_LINE: f32 = 32.0;
const BODY_LINE: f32 = 28.0;
const TAG_ROW: f32 = 32.0;
const CHARS_PER_LINE: usize = 64;

/// How a record should be read
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Strength,
    Opportunity,
    Risk,
    #[default]
    Insight,
    Highlight,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Strength => "strength",
            Category::Opportunity => "opportunity",
            Category::Risk => "risk",
            Category::Insight => "insight",
            Category::Highlight => "highlight",
        })
    }
}

/// One piece of report content
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Category,
}

impl ContentRecord {
    pub fn new(id: &str, title: &str, description: &str, category: Category) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            tags: Vec::new(),
            category,
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Rough rendered height: padding, a title line, wrapped body lines and
    /// one row of tags
    pub fn estimated_height(&self) -> f32 {
        let chars = self.description.chars().count();
        let lines = chars.div_ceil(CHARS_PER_LINE).max(1);
        let tags = if self.tags.is_empty() { 0.0 } else { TAG_ROW };
        BLOCK_PADDING + TITLE_LINE + lines as f32 * BODY_LINE + tags
    }

    fn plan(&self) -> BlockPlan {
        BlockPlan::new(self.id.clone(), self.estimated_height())
    }
}

/// Content of one in-view section
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionContent {
    #[serde(default)]
    pub heading: Option<ContentRecord>,
    #[serde(default)]
    pub items: Vec<ContentRecord>,
    #[serde(default)]
    pub closing: Option<ContentRecord>,
}

impl SectionContent {
    pub fn is_empty(&self) -> bool {
        self.heading.is_none() && self.items.is_empty() && self.closing.is_none()
    }

    /// Every record in page order
    pub fn records(&self) -> impl Iterator<Item = &ContentRecord> {
        self.heading
            .iter()
            .chain(self.items.iter())
            .chain(self.closing.iter())
    }

    fn plan(&self, kind: SectionKind, stagger: StaggerConfig) -> SectionPlan {
        let mut plan = SectionPlan::new(kind, TriggerMode::OnFirstView)
            .with_items(self.items.iter().map(ContentRecord::plan).collect())
            .with_stagger(stagger);
        plan.heading = self.heading.as_ref().map(ContentRecord::plan);
        plan.closing = self.closing.as_ref().map(ContentRecord::plan);
        plan
    }
}

/// All content of a report page
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentCatalog {
    /// Above-the-fold parts, animated on mount in order
    #[serde(default)]
    pub hero: Vec<ContentRecord>,
    #[serde(default)]
    pub executive_summary: SectionContent,
    #[serde(default)]
    pub key_insights: SectionContent,
}

impl ContentCatalog {
    /// Parse and validate a TOML content file
    pub fn from_toml(input: &str) -> Result<Self> {
        let catalog: ContentCatalog = toml::from_str(input)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let catalog = Self::from_toml(&raw)?;
        tracing::debug!(path = %path.display(), records = catalog.len(), "content loaded");
        Ok(catalog)
    }

    /// Ids must be present and unique within a section, since they key blocks
    pub fn validate(&self) -> Result<()> {
        for kind in SectionKind::ALL {
            let mut seen: Vec<&str> = Vec::new();
            for record in self.records_in(kind) {
                if record.id.trim().is_empty() {
                    return Err(UnveilError::InvalidContent(format!(
                        "{kind}: record `{}` has an empty id",
                        record.title
                    )));
                }
                if seen.contains(&record.id.as_str()) {
                    return Err(UnveilError::InvalidContent(format!(
                        "{kind}: duplicate id `{}`",
                        record.id
                    )));
                }
                seen.push(&record.id);
            }
        }
        Ok(())
    }

    /// Records of one section in page order
    pub fn records_in(&self, kind: SectionKind) -> Box<dyn Iterator<Item = &ContentRecord> + '_> {
        match kind {
            SectionKind::Hero => Box::new(self.hero.iter()),
            SectionKind::ExecutiveSummary => Box::new(self.executive_summary.records()),
            SectionKind::KeyInsights => Box::new(self.key_insights.records()),
        }
    }

    /// Look a record up by block key (`section.id`)
    pub fn record(&self, key: &str) -> Option<&ContentRecord> {
        let (section, id) = key.split_once('.')?;
        let kind: SectionKind = section.parse().ok()?;
        self.records_in(kind).find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        SectionKind::ALL
            .iter()
            .map(|kind| self.records_in(*kind).count())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Section plans for the page, skipping sections without content
    pub fn plans(&self, stagger: StaggerConfig) -> Vec<SectionPlan> {
        let mut plans = Vec::with_capacity(3);
        if !self.hero.is_empty() {
            plans.push(
                SectionPlan::hero(self.hero.iter().map(ContentRecord::plan).collect())
                    .with_stagger(stagger),
            );
        }
        if !self.executive_summary.is_empty() {
            plans.push(
                self.executive_summary
                    .plan(SectionKind::ExecutiveSummary, stagger),
            );
        }
        if !self.key_insights.is_empty() {
            plans.push(self.key_insights.plan(SectionKind::KeyInsights, stagger));
        }
        plans
    }

    /// The Riedel Communications competitive analysis report
    pub fn builtin() -> Self {
        use Category::*;

        let hero = vec![
            ContentRecord::new("badge", "Strategic Intelligence Report", "", Highlight),
            ContentRecord::new(
                "title",
                "Riedel Communications Competitive Analysis",
                "",
                Highlight,
            ),
            ContentRecord::new(
                "subtitle",
                "Audience",
                "Comprehensive market intelligence and strategic opportunities for ProLabs' VP of Sales and Product Management",
                Highlight,
            ),
            ContentRecord::new("actions", "Explore", "", Highlight)
                .with_tags(&["View Analysis", "Opportunity Matrix"]),
            ContentRecord::new(
                "highlights",
                "Report Highlights",
                "Deep dive into Riedel's market dominance and vulnerabilities, a breakdown of the optical product portfolio, and strategic recommendations for ProLabs competitive advantage",
                Highlight,
            )
            .with_tags(&["Market Position", "Product Analysis", "Opportunities"]),
        ];

        let executive_summary = SectionContent {
            heading: Some(ContentRecord::new(
                "heading",
                "Executive Summary",
                "Key insights from our comprehensive analysis of Riedel Communications' market position, product strategy, and competitive landscape",
                Insight,
            )),
            items: vec![
                ContentRecord::new(
                    "market-leadership",
                    "Market Leadership",
                    "Riedel dominates live events and broadcast markets with integrated solutions",
                    Strength,
                )
                .with_tags(&["High Impact"]),
                ContentRecord::new(
                    "premium-pricing",
                    "Premium Pricing",
                    "Higher cost structure creates opportunity for ProLabs' competitive pricing",
                    Opportunity,
                )
                .with_tags(&["Medium Impact"]),
                ContentRecord::new(
                    "specialized-focus",
                    "Specialized Focus",
                    "Heavy focus on video SFPs leaves gaps in general networking applications",
                    Opportunity,
                )
                .with_tags(&["High Impact"]),
                ContentRecord::new(
                    "channel-strategy",
                    "Channel Strategy",
                    "Bundled solutions approach limits individual component sales",
                    Opportunity,
                )
                .with_tags(&["Medium Impact"]),
            ],
            closing: Some(
                ContentRecord::new(
                    "recommendation",
                    "Strategic Recommendation",
                    "ProLabs should leverage its cost-effective manufacturing and broad compatibility to target Riedel's underserved market segments, particularly in general networking applications and price-sensitive customer segments.",
                    Opportunity,
                )
                .with_tags(&["Cost Leadership", "Market Expansion", "Product Differentiation"]),
            ),
        };

        let key_insights = SectionContent {
            heading: Some(ContentRecord::new(
                "heading",
                "Key Market Insights",
                "Deep dive into Riedel's competitive positioning and strategic opportunities for ProLabs",
                Insight,
            )),
            items: vec![
                ContentRecord::new(
                    "market-share",
                    "Market Share Analysis",
                    "Detailed breakdown of Riedel's position in broadcast, live events, and enterprise markets",
                    Insight,
                )
                .with_tags(&["65% Live Events", "45% Broadcast", "25% Enterprise"]),
                ContentRecord::new(
                    "product-portfolio",
                    "Product Portfolio",
                    "Comprehensive analysis of MediorNet, Artist, Bolero, and optical product lines",
                    Insight,
                )
                .with_tags(&["12G-SDI SFPs", "CWDM Solutions", "Fiber Systems"]),
                ContentRecord::new(
                    "pricing-strategy",
                    "Pricing Strategy",
                    "Premium positioning creates opportunities for competitive alternatives",
                    Insight,
                )
                .with_tags(&["30-50% Premium", "Bundle Focus", "Limited Flexibility"]),
                ContentRecord::new(
                    "go-to-market",
                    "Go-to-Market",
                    "Channel strategy analysis and customer segment breakdown",
                    Insight,
                )
                .with_tags(&["Direct Sales", "Authorized Resellers", "OEM Partnerships"]),
            ],
            closing: Some(
                ContentRecord::new(
                    "call-to-action",
                    "Ready to Explore the Full Analysis?",
                    "Access detailed competitive intelligence, interactive opportunity matrix, and strategic recommendations tailored for ProLabs leadership.",
                    Highlight,
                )
                .with_tags(&["View Full Analysis", "Schedule Strategy Session"]),
            ),
        };

        Self {
            hero,
            executive_summary,
            key_insights,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_is_valid() {
        let catalog = ContentCatalog::builtin();
        catalog.validate().unwrap();
        assert_eq!(catalog.hero.len(), 5);
        assert_eq!(catalog.executive_summary.items.len(), 4);
        assert_eq!(catalog.key_insights.items.len(), 4);
        assert_eq!(catalog.len(), 17);
    }

    #[test]
    fn test_builtin_plans_match_page_shape() {
        let plans = ContentCatalog::builtin().plans(StaggerConfig::default());
        let kinds: Vec<_> = plans.iter().map(|p| p.kind).collect();
        assert_eq!(kinds, SectionKind::ALL.to_vec());
        assert_eq!(plans[0].trigger, TriggerMode::OnMount);
        assert!(plans[0].heading.is_none());
        assert_eq!(plans[1].trigger, TriggerMode::OnFirstView);
        assert_eq!(plans[2].items[2].id, "pricing-strategy");
        assert_eq!(plans[2].closing.as_ref().map(|c| c.id.as_str()), Some("call-to-action"));
    }

    #[test]
    fn test_record_lookup_by_key() {
        let catalog = ContentCatalog::builtin();
        let record = catalog.record("executive_summary.premium-pricing").unwrap();
        assert_eq!(record.category, Category::Opportunity);
        assert!(catalog.record("key_insights.missing").is_none());
        assert!(catalog.record("no-dot").is_none());
        assert!(catalog.record("footer.heading").is_none());
    }

    #[test]
    fn test_from_toml_with_empty_sections() {
        let catalog = ContentCatalog::from_toml(
            r#"
            [[key_insights.items]]
            id = "a"
            title = "First"

            [[key_insights.items]]
            id = "b"
            title = "Second"
            category = "risk"
            tags = ["x"]
            "#,
        )
        .unwrap();

        assert!(catalog.hero.is_empty());
        assert_eq!(catalog.key_insights.items[1].category, Category::Risk);
        let plans = catalog.plans(StaggerConfig::default());
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].kind, SectionKind::KeyInsights);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = ContentCatalog::from_toml(
            r#"
            [[hero]]
            id = "title"
            title = "One"

            [[hero]]
            id = "title"
            title = "Two"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, UnveilError::InvalidContent(_)));
    }

    #[test]
    fn test_estimated_height_grows_with_text() {
        let short = ContentRecord::new("a", "A", "short", Category::Insight);
        let long = ContentRecord::new("b", "B", &"word ".repeat(40), Category::Insight);
        assert_eq!(short.estimated_height(), 108.0);
        assert!(long.estimated_height() > short.estimated_height());
        assert_eq!(short.clone().with_tags(&["t"]).estimated_height(), 140.0);
    }
}

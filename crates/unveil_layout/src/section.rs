//! Page sections
//!
//! A section is a vertical band of the page made of an optional heading
//! block, a stagger group of cards and an optional closing block. Sections
//! are described by a [`SectionPlan`], laid out top to bottom, and own the
//! blocks they mount.

use crate::block::{BlockId, BlockSpec, ContentBlock, MountContext, TriggerMode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use unveil_animation::{AnimationPhase, StaggerConfig};
use unveil_core::Rect;

/// Horizontal padding between the viewport edge and the content column
const SIDE_PADDING: f32 = 32.0;
/// Widest the content column grows
const MAX_CONTAINER_WIDTH: f32 = 1216.0;

/// The sections a report page is built from, in page order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Hero,
    ExecutiveSummary,
    KeyInsights,
}

impl SectionKind {
    pub const ALL: [SectionKind; 3] = [
        SectionKind::Hero,
        SectionKind::ExecutiveSummary,
        SectionKind::KeyInsights,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SectionKind::Hero => "hero",
            SectionKind::ExecutiveSummary => "executive_summary",
            SectionKind::KeyInsights => "key_insights",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown section `{0}`")]
pub struct UnknownSection(pub String);

impl FromStr for SectionKind {
    type Err = UnknownSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "hero" => Ok(SectionKind::Hero),
            "executive_summary" | "summary" => Ok(SectionKind::ExecutiveSummary),
            "key_insights" | "insights" => Ok(SectionKind::KeyInsights),
            _ => Err(UnknownSection(s.to_string())),
        }
    }
}

/// One block to be mounted: its content id and laid-out height
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockPlan {
    pub id: String,
    pub height: f32,
}

impl BlockPlan {
    pub fn new(id: impl Into<String>, height: f32) -> Self {
        Self {
            id: id.into(),
            height,
        }
    }
}

/// Spacing rules for laying out a section
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionMetrics {
    /// Space above and below the section content
    pub padding_y: f32,
    /// Space between cards, horizontally and vertically
    pub gap: f32,
    /// Space between heading, card grid and closing block
    pub spacing: f32,
    /// Card columns on wide viewports
    pub columns: usize,
    /// Viewport width from which `columns` applies; narrower uses one
    pub column_breakpoint: f32,
}

impl SectionMetrics {
    /// Taller padding, single column
    pub fn hero() -> Self {
        Self {
            padding_y: 128.0,
            columns: 1,
            ..Default::default()
        }
    }

    fn columns_for(&self, width: f32) -> usize {
        if width >= self.column_breakpoint {
            self.columns.max(1)
        } else {
            1
        }
    }
}

impl Default for SectionMetrics {
    fn default() -> Self {
        Self {
            padding_y: 80.0,
            gap: 32.0,
            spacing: 64.0,
            columns: 2,
            column_breakpoint: 1024.0,
        }
    }
}

/// Declarative description of a section
#[derive(Clone, Debug, PartialEq)]
pub struct SectionPlan {
    pub kind: SectionKind,
    pub trigger: TriggerMode,
    pub heading: Option<BlockPlan>,
    pub items: Vec<BlockPlan>,
    pub closing: Option<BlockPlan>,
    pub stagger: StaggerConfig,
    pub metrics: SectionMetrics,
}

impl SectionPlan {
    pub fn new(kind: SectionKind, trigger: TriggerMode) -> Self {
        Self {
            kind,
            trigger,
            heading: None,
            items: Vec::new(),
            closing: None,
            stagger: StaggerConfig::default(),
            metrics: SectionMetrics::default(),
        }
    }

    /// Above-the-fold banner: every part animates on mount, one after another
    pub fn hero(parts: Vec<BlockPlan>) -> Self {
        Self {
            items: parts,
            metrics: SectionMetrics::hero(),
            ..Self::new(SectionKind::Hero, TriggerMode::OnMount)
        }
    }

    /// Heading, finding cards and the strategic recommendation
    pub fn executive_summary(findings: Vec<BlockPlan>) -> Self {
        Self::new(SectionKind::ExecutiveSummary, TriggerMode::OnFirstView)
            .with_heading(BlockPlan::new("heading", 140.0))
            .with_items(findings)
            .with_closing(BlockPlan::new("recommendation", 240.0))
    }

    /// Heading, insight cards and the call to action
    pub fn key_insights(insights: Vec<BlockPlan>) -> Self {
        Self::new(SectionKind::KeyInsights, TriggerMode::OnFirstView)
            .with_heading(BlockPlan::new("heading", 140.0))
            .with_items(insights)
            .with_closing(BlockPlan::new("call_to_action", 220.0))
    }

    pub fn with_heading(mut self, heading: BlockPlan) -> Self {
        self.heading = Some(heading);
        self
    }

    pub fn with_items(mut self, items: Vec<BlockPlan>) -> Self {
        self.items = items;
        self
    }

    pub fn with_closing(mut self, closing: BlockPlan) -> Self {
        self.closing = Some(closing);
        self
    }

    pub fn with_stagger(mut self, stagger: StaggerConfig) -> Self {
        self.stagger = stagger;
        self
    }

    pub fn with_metrics(mut self, metrics: SectionMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn block_count(&self) -> usize {
        self.heading.is_some() as usize + self.items.len() + self.closing.is_some() as usize
    }

    /// Place every block for a section starting at `origin_y` in a
    /// viewport `width` wide.
    pub fn layout(&self, origin_y: f32, width: f32) -> SectionLayout {
        let m = &self.metrics;
        let container = (width - 2.0 * SIDE_PADDING).clamp(0.0, MAX_CONTAINER_WIDTH);
        let x = ((width - container) / 2.0).max(0.0);

        let mut y = origin_y + m.padding_y;
        let mut placed_any = false;

        let heading = self.heading.as_ref().map(|plan| {
            let rect = Rect::new(x, y, container, plan.height);
            y += plan.height + m.spacing;
            placed_any = true;
            rect
        });

        let columns = m.columns_for(width);
        let column_width = (container - m.gap * (columns - 1) as f32) / columns as f32;
        let mut items = Vec::with_capacity(self.items.len());
        for (row_index, row) in self.items.chunks(columns).enumerate() {
            if row_index > 0 {
                y += m.gap;
            }
            let row_height = row.iter().map(|b| b.height).fold(0.0, f32::max);
            for (col, plan) in row.iter().enumerate() {
                let col_x = x + col as f32 * (column_width + m.gap);
                items.push(Rect::new(col_x, y, column_width, plan.height));
            }
            y += row_height;
        }
        if !self.items.is_empty() {
            y += m.spacing;
            placed_any = true;
        }

        let closing = self.closing.as_ref().map(|plan| {
            let rect = Rect::new(x, y, container, plan.height);
            y += plan.height + m.spacing;
            placed_any = true;
            rect
        });

        if placed_any {
            y -= m.spacing;
        }
        let height = y + m.padding_y - origin_y;

        SectionLayout {
            heading,
            items,
            closing,
            height,
        }
    }
}

/// Block regions produced by [`SectionPlan::layout`]
#[derive(Clone, Debug, PartialEq)]
pub struct SectionLayout {
    pub heading: Option<Rect>,
    pub items: Vec<Rect>,
    pub closing: Option<Rect>,
    pub height: f32,
}

/// Ordered blocks rendered together whose delays follow their index
pub struct StaggerGroup {
    config: StaggerConfig,
    blocks: Vec<ContentBlock>,
}

impl StaggerGroup {
    pub fn config(&self) -> &StaggerConfig {
        &self.config
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Delay of every block, in index order
    pub fn delays(&self) -> Vec<u32> {
        self.config.delays(self.blocks.len())
    }

    /// Page time each block started running, if it has
    pub fn start_times(&self) -> Vec<Option<u64>> {
        self.blocks
            .iter()
            .map(|b| b.entrance().started_at_ms())
            .collect()
    }

    pub fn settle_times(&self) -> Vec<Option<u64>> {
        self.blocks
            .iter()
            .map(|b| b.entrance().settled_at_ms())
            .collect()
    }
}

/// A mounted section and the blocks it owns
pub struct Section {
    plan: SectionPlan,
    origin_y: f32,
    height: f32,
    heading: Option<ContentBlock>,
    group: StaggerGroup,
    closing: Option<ContentBlock>,
}

impl Section {
    /// Lay out `plan` at `origin_y` and mount all of its blocks. Ids are
    /// drawn from `next_id`.
    pub fn mount(
        plan: SectionPlan,
        origin_y: f32,
        width: f32,
        next_id: &mut BlockId,
        ctx: MountContext<'_>,
    ) -> Self {
        let layout = plan.layout(origin_y, width);
        let kind = plan.kind;
        let mut mount_block = |block: &BlockPlan, index: usize, delay_ms: u32, region: Rect| {
            let id = *next_id;
            *next_id += 1;
            ContentBlock::mount(
                BlockSpec {
                    id,
                    key: format!("{}.{}", kind.name(), block.id),
                    index,
                    trigger_mode: plan.trigger,
                    delay_ms,
                    region,
                },
                ctx,
            )
        };

        let heading = plan
            .heading
            .as_ref()
            .zip(layout.heading)
            .map(|(block, region)| mount_block(block, 0, 0, region));

        let blocks = plan
            .items
            .iter()
            .zip(layout.items.iter().copied())
            .enumerate()
            .map(|(index, (block, region))| {
                mount_block(block, index, plan.stagger.delay_for_index(index), region)
            })
            .collect();

        let closing = plan
            .closing
            .as_ref()
            .zip(layout.closing)
            .map(|(block, region)| mount_block(block, 0, 0, region));

        tracing::debug!(section = %kind, origin_y, height = layout.height, blocks = plan.block_count(), "section mounted");

        let group = StaggerGroup {
            config: plan.stagger,
            blocks,
        };
        Self {
            plan,
            origin_y,
            height: layout.height,
            heading,
            group,
            closing,
        }
    }

    /// Recompute block regions after the section moved or the viewport
    /// width changed
    pub fn relayout(&mut self, origin_y: f32, width: f32) {
        let layout = self.plan.layout(origin_y, width);
        if let (Some(block), Some(region)) = (self.heading.as_mut(), layout.heading) {
            block.set_region(region);
        }
        for (block, region) in self.group.blocks.iter_mut().zip(layout.items) {
            block.set_region(region);
        }
        if let (Some(block), Some(region)) = (self.closing.as_mut(), layout.closing) {
            block.set_region(region);
        }
        self.origin_y = origin_y;
        self.height = layout.height;
    }

    pub fn kind(&self) -> SectionKind {
        self.plan.kind
    }

    pub fn plan(&self) -> &SectionPlan {
        &self.plan
    }

    pub fn origin_y(&self) -> f32 {
        self.origin_y
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn bottom(&self) -> f32 {
        self.origin_y + self.height
    }

    pub fn heading(&self) -> Option<&ContentBlock> {
        self.heading.as_ref()
    }

    pub fn group(&self) -> &StaggerGroup {
        &self.group
    }

    pub fn closing(&self) -> Option<&ContentBlock> {
        self.closing.as_ref()
    }

    /// Every block in page order
    pub fn blocks(&self) -> impl Iterator<Item = &ContentBlock> {
        self.heading
            .iter()
            .chain(self.group.blocks.iter())
            .chain(self.closing.iter())
    }

    pub fn block_by_id(&self, id: BlockId) -> Option<&ContentBlock> {
        self.blocks().find(|b| b.id() == id)
    }

    pub fn block(&self, key: &str) -> Option<&ContentBlock> {
        self.blocks().find(|b| b.key() == key)
    }

    /// True once every block has reached its resting pose
    pub fn is_settled(&self) -> bool {
        self.blocks().all(|b| b.phase() == AnimationPhase::Settled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::{ObserveOptions, VisibilityObserver};
    use unveil_animation::{EntranceConfig, EntranceScheduler};

    fn cards(n: usize) -> Vec<BlockPlan> {
        (0..n)
            .map(|i| BlockPlan::new(format!("card-{i}"), 180.0))
            .collect()
    }

    #[test]
    fn test_section_kind_parse() {
        assert_eq!("key-insights".parse::<SectionKind>(), Ok(SectionKind::KeyInsights));
        assert_eq!("Hero".parse::<SectionKind>(), Ok(SectionKind::Hero));
        assert_eq!(
            "footer".parse::<SectionKind>(),
            Err(UnknownSection("footer".to_string()))
        );
        for kind in SectionKind::ALL {
            assert_eq!(kind.name().parse::<SectionKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_layout_two_column_grid() {
        let plan = SectionPlan::key_insights(cards(4));
        let layout = plan.layout(1_000.0, 1280.0);

        let heading = layout.heading.unwrap();
        assert_eq!(heading.y(), 1_080.0);
        assert_eq!(heading.x(), 32.0);
        assert_eq!(heading.width(), 1216.0);

        // Rows of two: cards 0 and 1 side by side, 2 and 3 below
        let items = &layout.items;
        assert_eq!(items[0].y(), 1_080.0 + 140.0 + 64.0);
        assert_eq!(items[0].y(), items[1].y());
        assert!(items[1].x() > items[0].x());
        assert_eq!(items[2].y(), items[0].y() + 180.0 + 32.0);
        assert_eq!(items[0].width(), (1216.0 - 32.0) / 2.0);

        let closing = layout.closing.unwrap();
        assert_eq!(closing.y(), items[3].bottom() + 64.0);
        assert_eq!(1_000.0 + layout.height, closing.bottom() + 80.0);
    }

    #[test]
    fn test_layout_narrow_viewport_single_column() {
        let plan = SectionPlan::executive_summary(cards(3));
        let layout = plan.layout(0.0, 600.0);
        let xs: Vec<_> = layout.items.iter().map(|r| r.x()).collect();
        assert_eq!(xs, vec![32.0, 32.0, 32.0]);
        assert!(layout.items.windows(2).all(|w| w[1].y() > w[0].bottom()));
    }

    #[test]
    fn test_empty_plan_is_padding_only() {
        let plan = SectionPlan::new(SectionKind::Hero, TriggerMode::OnMount);
        assert_eq!(plan.layout(0.0, 1280.0).height, 160.0);
        assert_eq!(plan.block_count(), 0);
    }

    #[test]
    fn test_mount_assigns_keys_ids_and_delays() {
        let scheduler = EntranceScheduler::new();
        let observer = VisibilityObserver::default();
        let ctx = MountContext {
            scheduler: &scheduler,
            observer: &observer,
            entrance: EntranceConfig::default(),
            observe: ObserveOptions::default(),
        };
        let mut next_id = 1;
        let section = Section::mount(SectionPlan::key_insights(cards(4)), 0.0, 1280.0, &mut next_id, ctx);

        assert_eq!(next_id, 7);
        let keys: Vec<_> = section.blocks().map(|b| b.key().to_string()).collect();
        assert_eq!(keys[0], "key_insights.heading");
        assert_eq!(keys[1], "key_insights.card-0");
        assert_eq!(keys[5], "key_insights.call_to_action");

        assert_eq!(section.group().delays(), vec![0, 100, 200, 300]);
        let block_delays: Vec<_> = section.group().blocks().iter().map(|b| b.delay_ms()).collect();
        assert_eq!(block_delays, vec![0, 100, 200, 300]);
        assert_eq!(section.heading().map(|b| b.delay_ms()), Some(0));
        assert_eq!(observer.registered_count(), 6);
        assert!(section.block("key_insights.card-2").is_some());
    }

    #[test]
    fn test_relayout_moves_blocks() {
        let scheduler = EntranceScheduler::new();
        let observer = VisibilityObserver::default();
        let ctx = MountContext {
            scheduler: &scheduler,
            observer: &observer,
            entrance: EntranceConfig::default(),
            observe: ObserveOptions::default(),
        };
        let mut next_id = 1;
        let mut section =
            Section::mount(SectionPlan::executive_summary(cards(2)), 500.0, 1280.0, &mut next_id, ctx);
        let before = section.heading().unwrap().region();

        section.relayout(100.0, 1280.0);
        let after = section.heading().unwrap().region();
        assert_eq!(after.y(), before.y() - 400.0);
        assert_eq!(section.origin_y(), 100.0);
    }
}

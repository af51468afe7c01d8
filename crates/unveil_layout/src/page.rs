//! Report page
//!
//! The page owns the viewport, the entrance scheduler, the visibility
//! observer and its sections. It turns scroll, resize and unmount events
//! into observation passes and reports every block milestone (entered
//! view, started, settled) both as return values and through its event
//! dispatcher.

use crate::block::{BlockId, ContentBlock, MountContext, TriggerMode};
use crate::observer::{ObserveOptions, ObserverSupport, VisibilityObserver};
use crate::section::{Section, SectionKind, SectionPlan};
use crate::viewport::Viewport;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use unveil_animation::{
    AnimationPhase, DriverStatus, EntranceConfig, EntranceId, EntranceScheduler, MotionPolicy,
    Pose, ScheduledChange,
};
use unveil_core::{event_types, Event, EventData, EventDispatcher, EventType, Rect};

/// Everything a page needs besides its section plans
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageOptions {
    pub width: f32,
    pub height: f32,
    pub entrance: EntranceConfig,
    pub observe: ObserveOptions,
    pub policy: MotionPolicy,
    pub driver: DriverStatus,
    pub support: ObserverSupport,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            entrance: EntranceConfig::default(),
            observe: ObserveOptions::default(),
            policy: MotionPolicy::Animate,
            driver: DriverStatus::Available,
            support: ObserverSupport::Supported,
        }
    }
}

/// Kind of block milestone
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockChangeKind {
    EnteredView,
    Started,
    Settled,
}

impl BlockChangeKind {
    fn event_type(self) -> EventType {
        match self {
            BlockChangeKind::EnteredView => event_types::ENTERED_VIEW,
            BlockChangeKind::Started => event_types::ANIMATION_START,
            BlockChangeKind::Settled => event_types::ANIMATION_SETTLE,
        }
    }
}

/// A milestone reached by one block
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockChange {
    pub block: BlockId,
    pub key: String,
    pub kind: BlockChangeKind,
    /// Page time the milestone is scheduled for
    pub at_ms: u64,
}

/// Point-in-time view of one block
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockSnapshot {
    pub id: BlockId,
    pub key: String,
    pub section: SectionKind,
    pub index: usize,
    pub trigger_mode: TriggerMode,
    pub delay_ms: u32,
    pub phase: AnimationPhase,
    pub entered_view: bool,
    pub pose: Pose,
    pub region: Rect,
    pub started_at_ms: Option<u64>,
    pub settled_at_ms: Option<u64>,
}

/// Point-in-time view of the whole page
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub now_ms: u64,
    pub viewport: Viewport,
    pub blocks: Vec<BlockSnapshot>,
}

impl PageSnapshot {
    pub fn block(&self, key: &str) -> Option<&BlockSnapshot> {
        self.blocks.iter().find(|b| b.key == key)
    }
}

pub struct Page {
    viewport: Viewport,
    options: PageOptions,
    sections: IndexMap<SectionKind, Section>,
    entrances: SecondaryMap<EntranceId, BlockId>,
    dispatcher: EventDispatcher,
    pending: Vec<BlockChange>,
    next_block_id: BlockId,
    // Declared last so blocks release their registrations first
    observer: VisibilityObserver,
    scheduler: EntranceScheduler,
}

impl Page {
    /// Lay out and mount every section, then run the first observation
    /// pass so blocks already in view are triggered immediately.
    pub fn mount(options: PageOptions, plans: impl IntoIterator<Item = SectionPlan>) -> Self {
        let mut page = Self {
            viewport: Viewport::new(options.width, options.height),
            options,
            sections: IndexMap::new(),
            entrances: SecondaryMap::new(),
            dispatcher: EventDispatcher::new(),
            pending: Vec::new(),
            next_block_id: 1,
            observer: VisibilityObserver::new(options.support),
            scheduler: EntranceScheduler::with_policy(options.policy, options.driver),
        };

        let mut origin_y = 0.0;
        for plan in plans {
            if page.sections.contains_key(&plan.kind) {
                tracing::warn!(section = %plan.kind, "section planned twice; keeping the first");
                continue;
            }
            let ctx = MountContext {
                scheduler: &page.scheduler,
                observer: &page.observer,
                entrance: options.entrance,
                observe: options.observe,
            };
            let kind = plan.kind;
            let section = Section::mount(plan, origin_y, options.width, &mut page.next_block_id, ctx);
            origin_y = section.bottom();
            for block in section.blocks() {
                page.entrances.insert(block.entrance().id(), block.id());
            }
            page.sections.insert(kind, section);
        }
        page.viewport.set_content_height(origin_y);

        tracing::info!(
            sections = page.sections.len(),
            blocks = page.entrances.len(),
            content_height = origin_y,
            "page mounted"
        );
        page.observe();
        page
    }

    /// Apply a page event. Returns false for events the page ignores.
    pub fn handle_event(&mut self, event: &Event) -> bool {
        match (event.event_type, &event.data) {
            (event_types::SCROLL, EventData::Scroll { delta_y, .. }) => {
                self.scroll_by(*delta_y);
                true
            }
            (event_types::SCROLL_TO, EventData::ScrollTo { y }) => {
                self.scroll_to(*y);
                true
            }
            (event_types::RESIZE, EventData::Resize { width, height }) => {
                self.resize(*width, *height);
                true
            }
            (event_types::UNMOUNT, EventData::Section { name }) => match name.parse::<SectionKind>() {
                Ok(kind) => self.unmount_section(kind),
                Err(err) => {
                    tracing::warn!(%err, "unmount ignored");
                    false
                }
            },
            _ => {
                tracing::trace!(event_type = event.event_type, "event ignored");
                false
            }
        }
    }

    pub fn scroll_to(&mut self, y: f32) {
        if self.viewport.scroll_to(y) {
            self.observe();
        }
    }

    pub fn scroll_by(&mut self, delta_y: f32) {
        if self.viewport.scroll_by(delta_y) {
            self.observe();
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        tracing::debug!(width, height, "viewport resized");
        self.viewport.resize(width, height);
        self.relayout();
        self.observe();
    }

    /// Remove a section and every block in it. Pending entrances are
    /// cancelled and sections below move up.
    pub fn unmount_section(&mut self, kind: SectionKind) -> bool {
        let Some(section) = self.sections.shift_remove(&kind) else {
            tracing::debug!(section = %kind, "section not mounted");
            return false;
        };

        let removed: Vec<BlockId> = section.blocks().map(|b| b.id()).collect();
        for block in section.blocks() {
            self.entrances.remove(block.entrance().id());
            self.dispatcher.unregister_target(block.id());
        }
        self.pending.retain(|c| !removed.contains(&c.block));
        drop(section);
        tracing::info!(section = %kind, blocks = removed.len(), "section unmounted");

        self.relayout();
        self.observe();
        true
    }

    /// Advance the page clock and return every milestone since the last
    /// call, ordered by time.
    pub fn advance(&mut self, dt_ms: u64) -> Vec<BlockChange> {
        let changes = self.scheduler.advance(dt_ms);
        self.record(changes);
        std::mem::take(&mut self.pending)
    }

    /// Listen for a block milestone on every block
    pub fn on<F>(&mut self, event_type: EventType, handler: F)
    where
        F: Fn(&Event) + 'static,
    {
        self.dispatcher.register_any(event_type, handler);
    }

    /// Listen for a milestone on one block
    pub fn on_block<F>(&mut self, block: BlockId, event_type: EventType, handler: F)
    where
        F: Fn(&Event) + 'static,
    {
        self.dispatcher.register(block, event_type, handler);
    }

    pub fn snapshot(&self) -> PageSnapshot {
        let blocks = self
            .sections
            .values()
            .flat_map(|section| section.blocks().map(move |b| (section.kind(), b)))
            .map(|(section, b)| BlockSnapshot {
                id: b.id(),
                key: b.key().to_string(),
                section,
                index: b.index(),
                trigger_mode: b.trigger_mode(),
                delay_ms: b.delay_ms(),
                phase: b.phase(),
                entered_view: b.has_entered_view(),
                pose: b.pose(),
                region: b.region(),
                started_at_ms: b.entrance().started_at_ms(),
                settled_at_ms: b.entrance().settled_at_ms(),
            })
            .collect();

        PageSnapshot {
            now_ms: self.now_ms(),
            viewport: self.viewport,
            blocks,
        }
    }

    pub fn block(&self, key: &str) -> Option<&ContentBlock> {
        self.sections.values().find_map(|s| s.block(key))
    }

    pub fn block_by_id(&self, id: BlockId) -> Option<&ContentBlock> {
        self.sections.values().find_map(|s| s.block_by_id(id))
    }

    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.get(&kind)
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.values()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &ContentBlock> {
        self.sections.values().flat_map(|s| s.blocks())
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn options(&self) -> &PageOptions {
        &self.options
    }

    pub fn scheduler(&self) -> &EntranceScheduler {
        &self.scheduler
    }

    pub fn observer(&self) -> &VisibilityObserver {
        &self.observer
    }

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    /// True while a triggered block has yet to settle
    pub fn is_animating(&self) -> bool {
        self.scheduler.has_active_animations()
    }

    /// Stack sections from the top of the page again
    fn relayout(&mut self) {
        let width = self.viewport.width;
        let mut origin_y = 0.0;
        for section in self.sections.values_mut() {
            section.relayout(origin_y, width);
            origin_y = section.bottom();
        }
        self.viewport.set_content_height(origin_y);
    }

    /// One observation pass: trigger every block seen for the first time
    fn observe(&mut self) {
        let now = self.now_ms();
        for entered in self.observer.check(&self.viewport) {
            let Some(block) = self.block_by_id(entered.target) else {
                continue;
            };
            block.notify_entered();
            let key = block.key().to_string();
            self.emit(BlockChange {
                block: entered.target,
                key,
                kind: BlockChangeKind::EnteredView,
                at_ms: now,
            });
        }

        let changes = self.scheduler.drain_changes();
        self.record(changes);
    }

    fn record(&mut self, changes: Vec<ScheduledChange>) {
        for ScheduledChange { id, change } in changes {
            let Some(&block) = self.entrances.get(id) else {
                continue;
            };
            let kind = match change.phase {
                AnimationPhase::Running => BlockChangeKind::Started,
                AnimationPhase::Settled => BlockChangeKind::Settled,
                AnimationPhase::Pending => continue,
            };
            let Some(key) = self.block_by_id(block).map(|b| b.key().to_string()) else {
                continue;
            };
            self.emit(BlockChange {
                block,
                key,
                kind,
                at_ms: change.at_ms,
            });
        }
    }

    fn emit(&mut self, change: BlockChange) {
        let event = Event::new(
            change.kind.event_type(),
            change.block,
            EventData::Timing {
                at_ms: change.at_ms,
            },
            self.now_ms(),
        );
        self.dispatcher.dispatch(&event);
        self.pending.push(change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::BlockPlan;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn plans() -> Vec<SectionPlan> {
        let parts = ["badge", "title", "subtitle", "actions", "highlights"]
            .iter()
            .map(|id| BlockPlan::new(*id, 60.0))
            .collect();
        let cards = |prefix: &str| {
            (0..4)
                .map(|i| BlockPlan::new(format!("{prefix}-{i}"), 180.0))
                .collect::<Vec<_>>()
        };
        vec![
            SectionPlan::hero(parts),
            SectionPlan::executive_summary(cards("finding")),
            SectionPlan::key_insights(cards("insight")),
        ]
    }

    #[test]
    fn test_mount_stacks_sections() {
        let page = Page::mount(PageOptions::default(), plans());
        let origins: Vec<_> = page.sections().map(|s| s.origin_y()).collect();
        assert_eq!(origins[0], 0.0);
        assert!(origins.windows(2).all(|w| w[0] < w[1]));
        let last = page.sections().last().unwrap();
        assert_eq!(page.viewport().content_height, last.bottom());
    }

    #[test]
    fn test_hero_triggers_on_mount() {
        let mut page = Page::mount(PageOptions::default(), plans());
        assert_eq!(page.block("hero.badge").unwrap().phase(), AnimationPhase::Running);
        assert_eq!(page.block("hero.title").unwrap().phase(), AnimationPhase::Pending);

        let changes = page.advance(0);
        assert!(changes
            .iter()
            .any(|c| c.key == "hero.badge" && c.kind == BlockChangeKind::Started && c.at_ms == 0));
    }

    #[test]
    fn test_duplicate_section_plan_is_skipped() {
        let mut all = plans();
        all.push(SectionPlan::hero(vec![BlockPlan::new("extra", 10.0)]));
        let page = Page::mount(PageOptions::default(), all);
        assert_eq!(page.sections().count(), 3);
        assert!(page.block("hero.extra").is_none());
    }

    #[test]
    fn test_handle_event_scroll_and_unknown() {
        let mut page = Page::mount(PageOptions::default(), plans());
        assert!(page.handle_event(&Event::scroll(500.0, 0)));
        assert_eq!(page.viewport().scroll_y, 500.0);
        assert!(page.handle_event(&Event::scroll_to(0.0, 0)));
        assert_eq!(page.viewport().scroll_y, 0.0);
        assert!(!page.handle_event(&Event::unmount("footer", 0)));
        assert!(!page.handle_event(&Event::new(event_types::ANIMATION_START, 0, EventData::None, 0)));
    }

    #[test]
    fn test_dispatcher_reports_milestones() {
        let mut page = Page::mount(PageOptions::default(), plans());
        let settled = Rc::new(RefCell::new(Vec::new()));
        let sink = settled.clone();
        page.on(event_types::ANIMATION_SETTLE, move |event| {
            sink.borrow_mut().push(event.target);
        });

        page.advance(2_000);
        let badge = page.block("hero.badge").unwrap().id();
        assert!(settled.borrow().contains(&badge));
        assert_eq!(settled.borrow().len(), 5);
    }

    #[test]
    fn test_unmount_cancels_and_reflows() {
        let mut page = Page::mount(PageOptions::default(), plans());
        let insights_before = page.section(SectionKind::KeyInsights).unwrap().origin_y();
        let registered = page.observer().registered_count();

        assert!(page.unmount_section(SectionKind::ExecutiveSummary));
        assert!(!page.unmount_section(SectionKind::ExecutiveSummary));
        assert!(page.block("executive_summary.heading").is_none());
        assert!(page.observer().registered_count() < registered);

        let insights_after = page.section(SectionKind::KeyInsights).unwrap().origin_y();
        assert!(insights_after < insights_before);
    }

    #[test]
    fn test_snapshot_serializes_keys() {
        let page = Page::mount(PageOptions::default(), plans());
        let snapshot = page.snapshot();
        assert_eq!(snapshot.blocks.len(), page.blocks().count());
        let badge = snapshot.block("hero.badge").unwrap();
        assert_eq!(badge.section, SectionKind::Hero);
        assert_eq!(badge.trigger_mode, TriggerMode::OnMount);
        assert!(badge.entered_view);
    }

    #[test]
    fn test_on_block_only_hears_its_block() {
        let mut page = Page::mount(PageOptions::default(), plans());
        let title = page.block("hero.title").unwrap().id();
        let heard = Rc::new(RefCell::new(Vec::new()));

        let sink = heard.clone();
        page.on_block(title, event_types::ANIMATION_START, move |event| {
            if let EventData::Timing { at_ms } = event.data {
                sink.borrow_mut().push((event.target, at_ms));
            }
        });

        page.advance(1_000);
        assert_eq!(*heard.borrow(), vec![(title, 100)]);
    }

    #[test]
    fn test_on_block_released_with_its_section() {
        let mut page = Page::mount(PageOptions::default(), plans());
        let subtitle = page.block("hero.subtitle").unwrap().id();
        let heard = Rc::new(RefCell::new(0));

        let sink = heard.clone();
        page.on_block(subtitle, event_types::ANIMATION_START, move |_| {
            *sink.borrow_mut() += 1;
        });

        assert!(page.unmount_section(SectionKind::Hero));
        page.advance(1_000);
        assert_eq!(*heard.borrow(), 0);
    }
}

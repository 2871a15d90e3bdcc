//! Trigger wiring.
//!
//! The page load, mutations on the watched regions and the keyboard shortcut
//! each turn into a [`PassRequest`] on one `mpsc` queue. `flush` drains that
//! queue in arrival order, running one enlarge pass per request over the
//! whole body, and converts freshly delivered mutation batches into new
//! requests until the page settles or the per-flush pass bound is hit.

use crate::config::ControllerConfig;
use crate::events::HostEvent;
use crate::events::KeyEvent;
use crate::events::ReadyState;
use crate::page::Page;
use jfe_core::EnlargeError;
use jfe_core::EnlargeResult;
use jfe_dom::ObserveOptions;
use jfe_dom::ObserverId;
use jfe_enlarge::EnlargeReport;
use jfe_enlarge::ScriptClassifier;
use jfe_enlarge::TextEnlarger;
use std::sync::mpsc;

/// Result of [`TriggerController::install`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Installed {
    Active,
    /// The page is outside the activation rules; the controller stays idle.
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Uninstalled,
    Inactive,
    AwaitingLoad,
    Armed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Load,
    Mutation,
    Shortcut,
}

impl TriggerSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Mutation => "mutation",
            Self::Shortcut => "shortcut",
        }
    }
}

/// A page region whose mutations re-trigger a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    SupplementNav,
    ItemInfo,
}

impl Region {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SupplementNav => "supplement-nav",
            Self::ItemInfo => "item-info",
        }
    }
}

/// "Re-run enlargement at this size."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassRequest {
    pub source: TriggerSource,
    pub font_size_px: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassOutcome {
    pub request: PassRequest,
    pub report: EnlargeReport,
}

/// Passes run by one drain of the request queue.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlushSummary {
    pub passes: Vec<PassOutcome>,
    /// True when the pass bound stopped the drain with work still queued.
    pub capped: bool,
}

impl FlushSummary {
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn changed(&self) -> bool {
        self.passes.iter().any(|pass| pass.report.changed())
    }

    pub fn sources(&self) -> impl Iterator<Item = TriggerSource> + '_ {
        self.passes.iter().map(|pass| pass.request.source)
    }
}

#[derive(Debug, Clone, Copy)]
struct RegionWatch {
    region: Region,
    observer: ObserverId,
}

/// Drives the [`TextEnlarger`] from host events.
#[derive(Debug)]
pub struct TriggerController {
    config: ControllerConfig,
    enlarger: TextEnlarger,
    state: ControllerState,
    watches: Vec<RegionWatch>,
    requests: mpsc::Sender<PassRequest>,
    queue: mpsc::Receiver<PassRequest>,
}

impl TriggerController {
    pub fn new(config: ControllerConfig) -> EnlargeResult<Self> {
        config.validate()?;
        let enlarger = TextEnlarger::new(ScriptClassifier::new(config.classifier.clone()));
        let (requests, queue) = mpsc::channel();
        Ok(Self {
            config,
            enlarger,
            state: ControllerState::Uninstalled,
            watches: Vec::new(),
            requests,
            queue,
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn watched_regions(&self) -> impl Iterator<Item = Region> + '_ {
        self.watches.iter().map(|watch| watch.region)
    }

    /// Attaches to `page`. A page that has finished loading is enlarged
    /// right away; otherwise the first pass waits for [`HostEvent::Load`].
    /// Installing twice is a no-op.
    pub fn install(&mut self, page: &mut Page) -> EnlargeResult<Installed> {
        match self.state {
            ControllerState::Inactive => return Ok(Installed::Inactive),
            ControllerState::AwaitingLoad | ControllerState::Armed => {
                return Ok(Installed::Active);
            }
            ControllerState::Uninstalled => {}
        }

        if !self.config.activation.matches(&page.location) {
            tracing::debug!(url = page.location.as_str(), "page outside activation rules");
            self.state = ControllerState::Inactive;
            return Ok(Installed::Inactive);
        }

        self.state = ControllerState::AwaitingLoad;
        if page.ready_state == ReadyState::Complete {
            self.on_load(page)?;
        }
        Ok(Installed::Active)
    }

    /// Stops observing the page's regions and drops queued requests.
    pub fn uninstall(&mut self, page: &mut Page) {
        for watch in self.watches.drain(..) {
            page.document.disconnect(watch.observer);
        }
        let dropped = self.queue.try_iter().count();
        tracing::debug!(dropped, "controller uninstalled");
        self.state = ControllerState::Uninstalled;
    }

    /// Reacts to one host event, then flushes.
    pub fn handle(&mut self, page: &mut Page, event: HostEvent) -> EnlargeResult<FlushSummary> {
        match (self.state, event) {
            (ControllerState::Uninstalled | ControllerState::Inactive, _) => {
                return Ok(FlushSummary::default());
            }
            (ControllerState::AwaitingLoad, HostEvent::Load) => return self.on_load(page),
            (ControllerState::Armed, HostEvent::Load) => {
                tracing::trace!("load already handled");
            }
            (_, HostEvent::KeyDown(key)) => self.on_key_down(page, &key)?,
        }
        self.flush(page)
    }

    /// Drains queued requests and pending mutation batches, running one pass
    /// per request in arrival order.
    ///
    /// Passes converge because rewritten text already renders at the target
    /// size. `max_passes_per_flush` caps a host that keeps mutating anyway:
    /// once reached, the remaining requests and records are dropped with a
    /// warning and [`FlushSummary::capped`] is set.
    pub fn flush(&mut self, page: &mut Page) -> EnlargeResult<FlushSummary> {
        let mut summary = FlushSummary::default();
        if matches!(
            self.state,
            ControllerState::Uninstalled | ControllerState::Inactive
        ) {
            return Ok(summary);
        }

        loop {
            self.collect_mutations(page)?;
            let Ok(request) = self.queue.try_recv() else {
                break;
            };

            if summary.pass_count() >= self.config.max_passes_per_flush {
                let dropped = 1 + self.queue.try_iter().count();
                self.discard_mutations(page);
                tracing::warn!(
                    limit = self.config.max_passes_per_flush,
                    dropped,
                    "pass limit reached; dropping queued requests"
                );
                summary.capped = true;
                break;
            }

            let root = page.enlarge_root();
            let report =
                self.enlarger
                    .enlarge(&mut page.document, &page.styles, root, request.font_size_px)?;
            tracing::debug!(
                source = request.source.as_str(),
                font_size_px = request.font_size_px,
                changed = report.changed(),
                "pass complete"
            );
            summary.passes.push(PassOutcome { request, report });
        }

        Ok(summary)
    }

    /// Runs the load pass, then starts watching regions so the pass's own
    /// writes are not reported back.
    fn on_load(&mut self, page: &mut Page) -> EnlargeResult<FlushSummary> {
        self.submit(TriggerSource::Load, self.config.default_font_size_px)?;
        let summary = self.flush(page)?;
        self.arm(page)?;
        self.state = ControllerState::Armed;
        Ok(summary)
    }

    fn arm(&mut self, page: &mut Page) -> EnlargeResult<()> {
        let lesson = page.location.is_lesson();
        let review = page.location.is_review();
        let regions = [
            (
                Region::SupplementNav,
                lesson,
                self.config.regions.supplement_nav_id.as_str(),
                ObserveOptions::attributes().with_subtree(),
            ),
            (
                Region::ItemInfo,
                lesson || review,
                self.config.regions.item_info_id.as_str(),
                ObserveOptions::attributes(),
            ),
        ];

        for (region, wanted, element_id, options) in regions {
            if !wanted {
                continue;
            }
            let Some(target) = page.document.element_by_id(element_id) else {
                tracing::debug!(
                    region = region.as_str(),
                    element_id,
                    "region element missing; not observed"
                );
                continue;
            };
            let observer = page.document.observe(target, options)?;
            self.watches.push(RegionWatch { region, observer });
        }
        Ok(())
    }

    fn on_key_down(&self, page: &Page, key: &KeyEvent) -> EnlargeResult<()> {
        if !self.config.shortcut.matches(key) {
            return Ok(());
        }

        let typing = page.document.active_element().is_some_and(|focused| {
            self.enlarger
                .classifier()
                .is_free_text_entry(&page.document, focused)
        });
        if typing {
            tracing::debug!(key = key.key.as_str(), "shortcut ignored while typing");
            return Ok(());
        }

        self.submit(TriggerSource::Shortcut, self.config.shortcut_font_size_px())
    }

    /// Every non-empty batch becomes one request at the default size.
    fn collect_mutations(&self, page: &mut Page) -> EnlargeResult<()> {
        for watch in &self.watches {
            let records = page.document.take_records(watch.observer);
            if records.is_empty() {
                continue;
            }
            tracing::trace!(
                region = watch.region.as_str(),
                records = records.len(),
                "mutation batch delivered"
            );
            self.submit(TriggerSource::Mutation, self.config.default_font_size_px)?;
        }
        Ok(())
    }

    fn discard_mutations(&self, page: &mut Page) {
        for watch in &self.watches {
            page.document.take_records(watch.observer);
        }
    }

    fn submit(&self, source: TriggerSource, font_size_px: u32) -> EnlargeResult<()> {
        self.requests
            .send(PassRequest {
                source,
                font_size_px,
            })
            .map_err(|_| EnlargeError::QueueClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::ControllerState;
    use super::Installed;
    use super::Region;
    use super::TriggerController;
    use super::TriggerSource;
    use crate::config::ControllerConfig;
    use crate::events::HostEvent;
    use crate::events::KeyEvent;
    use crate::events::ReadyState;
    use crate::page::Page;

    const LESSON_URL: &str = "https://www.wanikani.com/lesson/session";
    const REVIEW_URL: &str = "https://www.wanikani.com/review/session";

    fn page(url: &str, html: &str) -> Page {
        match Page::from_markup(url, html, "") {
            Ok(page) => page.with_ready_state(ReadyState::Complete),
            Err(error) => panic!("page build failed: {error}"),
        }
    }

    fn controller() -> TriggerController {
        match TriggerController::new(ControllerConfig::default()) {
            Ok(controller) => controller,
            Err(error) => panic!("controller build failed: {error}"),
        }
    }

    fn body_markup(page: &Page) -> String {
        page.document
            .inner_html(page.enlarge_root())
            .unwrap_or_default()
    }

    #[test]
    fn loaded_page_is_enlarged_on_install() {
        let mut page = page(REVIEW_URL, "<body><p>日本</p></body>");
        let mut controller = controller();
        assert_eq!(controller.install(&mut page).ok(), Some(Installed::Active));
        assert_eq!(controller.state(), ControllerState::Armed);
        assert!(body_markup(&page).contains("font-size: 28px !important"));
    }

    #[test]
    fn loading_page_waits_for_load_event_and_fires_once() {
        let mut page = page(REVIEW_URL, "<body><p>日本</p></body>").with_ready_state(ReadyState::Loading);
        let mut controller = controller();
        assert_eq!(controller.install(&mut page).ok(), Some(Installed::Active));
        assert_eq!(controller.state(), ControllerState::AwaitingLoad);
        assert_eq!(body_markup(&page), "<p>日本</p>");

        let first = controller.handle(&mut page, HostEvent::Load);
        assert!(first.is_ok_and(|summary| summary.pass_count() == 1 && summary.changed()));

        let second = controller.handle(&mut page, HostEvent::Load);
        assert!(second.is_ok_and(|summary| summary.pass_count() == 0));
    }

    #[test]
    fn pages_outside_the_rules_stay_inactive() {
        let mut page = page("https://www.wanikani.com/settings", "<body><p>日本</p></body>");
        let mut controller = controller();
        assert_eq!(controller.install(&mut page).ok(), Some(Installed::Inactive));
        let summary = controller.handle(&mut page, HostEvent::KeyDown(KeyEvent::new("u")));
        assert!(summary.is_ok_and(|summary| summary.pass_count() == 0));
        assert_eq!(body_markup(&page), "<p>日本</p>");
    }

    #[test]
    fn regions_are_armed_by_page_kind() {
        let html = "<body><div id='supplement-nav'></div><div id='item-info'></div></body>";

        let mut lesson = page(LESSON_URL, html);
        let mut on_lesson = controller();
        assert!(on_lesson.install(&mut lesson).is_ok());
        assert_eq!(
            on_lesson.watched_regions().collect::<Vec<_>>(),
            vec![Region::SupplementNav, Region::ItemInfo]
        );

        let mut review = page(REVIEW_URL, html);
        let mut on_review = controller();
        assert!(on_review.install(&mut review).is_ok());
        assert_eq!(on_review.watched_regions().collect::<Vec<_>>(), vec![Region::ItemInfo]);

        let mut level = page("https://www.wanikani.com/level/1", html);
        let mut on_level = controller();
        assert!(on_level.install(&mut level).is_ok());
        assert_eq!(on_level.watched_regions().count(), 0);
    }

    #[test]
    fn missing_regions_are_skipped() {
        let mut page = page(LESSON_URL, "<body><div id='item-info'></div></body>");
        let mut controller = controller();
        assert_eq!(controller.install(&mut page).ok(), Some(Installed::Active));
        assert_eq!(controller.watched_regions().collect::<Vec<_>>(), vec![Region::ItemInfo]);
    }

    #[test]
    fn non_shortcut_keys_do_nothing() {
        let mut page = page(REVIEW_URL, "<body><p>abc</p></body>");
        let mut controller = controller();
        assert!(controller.install(&mut page).is_ok());
        let summary = controller.handle(&mut page, HostEvent::KeyDown(KeyEvent::new("y")));
        assert!(summary.is_ok_and(|summary| summary.pass_count() == 0));
    }

    #[test]
    fn shortcut_before_load_still_runs() {
        let mut page = page(REVIEW_URL, "<body><p>日本</p></body>").with_ready_state(ReadyState::Loading);
        let mut controller = controller();
        assert!(controller.install(&mut page).is_ok());
        let summary = controller.handle(&mut page, HostEvent::KeyDown(KeyEvent::new("u")));
        let Ok(summary) = summary else {
            panic!("flush failed");
        };
        assert_eq!(summary.sources().collect::<Vec<_>>(), vec![TriggerSource::Shortcut]);
        assert!(body_markup(&page).contains("font-size: 56px !important"));
    }

    #[test]
    fn uninstall_stops_observing() {
        let mut page = page(REVIEW_URL, "<body><div id='item-info'></div></body>");
        let mut controller = controller();
        assert!(controller.install(&mut page).is_ok());
        controller.uninstall(&mut page);
        assert_eq!(controller.state(), ControllerState::Uninstalled);
        assert_eq!(controller.watched_regions().count(), 0);

        let Some(item_info) = page.document.element_by_id("item-info") else {
            panic!("item-info missing");
        };
        assert!(page.document.set_attribute(item_info, "class", "x").is_ok());
        assert!(!page.document.has_pending_records());
    }
}

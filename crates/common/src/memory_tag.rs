//! A synchronous, in-memory ad tag.
//!
//! Used by hosts that have no real ad tag runtime (the `bebop-sim` binary)
//! and as the test double for the command queue. Jobs sit in the queue until
//! [`InMemoryAdTag::drain`] runs them, or run as soon as they are pushed once
//! the tag is marked loaded. Every external call is recorded as a
//! [`TagCall`].

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use error_stack::Report;
use serde::Serialize;

use crate::ad_tag::{AdSize, AdTag, GptSlot, Job, PubAdsService, RefreshOptions, SlotHandle};
use crate::error::BebopError;
use crate::targeting::{TargetingMap, TargetingValue};

/// One call made against the in-memory tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum TagCall {
    DefineSlot {
        ad_unit_path: String,
        sizes: Vec<AdSize>,
        div_id: String,
    },
    DefineOutOfPageSlot {
        ad_unit_path: String,
        div_id: String,
    },
    AddService {
        div_id: String,
        service: String,
    },
    Display {
        div_id: String,
    },
    Refresh {
        div_ids: Option<Vec<String>>,
        change_correlator: bool,
    },
    SetPageTargeting {
        key: String,
        value: TargetingValue,
    },
    SetSlotTargeting {
        div_id: String,
        key: String,
        value: TargetingValue,
    },
    ClearSlotTargeting {
        div_id: String,
    },
    Load,
}

type CallLog = Rc<RefCell<Vec<TagCall>>>;

/// Slot created by [`InMemoryAdTag`].
#[derive(Debug)]
pub struct InMemorySlot {
    div_id: String,
    targeting: RefCell<TargetingMap>,
    services: RefCell<Vec<String>>,
    log: CallLog,
}

impl InMemorySlot {
    /// Names of the services added to this slot.
    #[must_use]
    pub fn services(&self) -> Vec<String> {
        self.services.borrow().clone()
    }
}

impl GptSlot for InMemorySlot {
    fn slot_element_id(&self) -> String {
        self.div_id.clone()
    }

    fn add_service(&self, service: Rc<dyn PubAdsService>) {
        self.services.borrow_mut().push(service.name().to_string());
        self.log.borrow_mut().push(TagCall::AddService {
            div_id: self.div_id.clone(),
            service: service.name().to_string(),
        });
    }

    fn set_targeting(&self, key: &str, value: &TargetingValue) {
        self.targeting
            .borrow_mut()
            .insert(key.to_string(), value.clone());
        self.log.borrow_mut().push(TagCall::SetSlotTargeting {
            div_id: self.div_id.clone(),
            key: key.to_string(),
            value: value.clone(),
        });
    }

    fn clear_targeting(&self) {
        self.targeting.borrow_mut().clear();
        self.log.borrow_mut().push(TagCall::ClearSlotTargeting {
            div_id: self.div_id.clone(),
        });
    }

    fn targeting_map(&self) -> TargetingMap {
        self.targeting.borrow().clone()
    }
}

/// Page-level service of [`InMemoryAdTag`].
#[derive(Debug)]
pub struct InMemoryPubAds {
    targeting: RefCell<TargetingMap>,
    log: CallLog,
}

impl InMemoryPubAds {
    #[must_use]
    pub fn targeting_map(&self) -> TargetingMap {
        self.targeting.borrow().clone()
    }
}

impl PubAdsService for InMemoryPubAds {
    fn refresh(&self, slots: Option<&[SlotHandle]>, options: Option<&RefreshOptions>) {
        self.log.borrow_mut().push(TagCall::Refresh {
            div_ids: slots.map(|slots| slots.iter().map(|s| s.slot_element_id()).collect()),
            change_correlator: options.is_some_and(|o| o.change_correlator),
        });
    }

    fn set_targeting(&self, key: &str, value: &TargetingValue) {
        self.targeting
            .borrow_mut()
            .insert(key.to_string(), value.clone());
        self.log.borrow_mut().push(TagCall::SetPageTargeting {
            key: key.to_string(),
            value: value.clone(),
        });
    }
}

/// In-memory implementation of [`AdTag`].
pub struct InMemoryAdTag {
    queue: RefCell<VecDeque<Job>>,
    loaded: Cell<bool>,
    draining: Cell<bool>,
    refuse_slots: Cell<bool>,
    log: CallLog,
    pubads: Rc<InMemoryPubAds>,
    slots: RefCell<Vec<Rc<InMemorySlot>>>,
    failures: RefCell<Vec<Report<BebopError>>>,
}

impl Default for InMemoryAdTag {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAdTag {
    #[must_use]
    pub fn new() -> Self {
        let log = CallLog::default();
        Self {
            queue: RefCell::new(VecDeque::new()),
            loaded: Cell::new(false),
            draining: Cell::new(false),
            refuse_slots: Cell::new(false),
            pubads: Rc::new(InMemoryPubAds {
                targeting: RefCell::new(TargetingMap::new()),
                log: Rc::clone(&log),
            }),
            log,
            slots: RefCell::new(Vec::new()),
            failures: RefCell::new(Vec::new()),
        }
    }

    /// Marks the tag as loaded. A loaded tag drains its queue right away and
    /// runs every later job as soon as it is pushed.
    pub fn set_loaded(&self, loaded: bool) {
        self.loaded.set(loaded);
        if loaded {
            self.drain();
        }
    }

    /// Makes every later define call return no slot.
    pub fn refuse_slots(&self, refuse: bool) {
        self.refuse_slots.set(refuse);
    }

    /// Number of jobs waiting in the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Runs queued jobs in FIFO order until the queue is empty, including
    /// jobs pushed by the jobs themselves. Returns how many jobs ran.
    pub fn drain(&self) -> usize {
        if self.draining.replace(true) {
            return 0;
        }

        let mut ran = 0;
        loop {
            let Some(job) = self.queue.borrow_mut().pop_front() else {
                break;
            };
            ran += 1;
            if let Err(report) = job() {
                log::error!("command queue job failed: {report:?}");
                self.failures.borrow_mut().push(report);
            }
        }

        self.draining.set(false);
        log::debug!("drained {ran} command queue jobs");
        ran
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<TagCall> {
        self.log.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.log.borrow_mut().clear();
    }

    /// Removes and returns the failures reported by jobs so far.
    pub fn take_failures(&self) -> Vec<Report<BebopError>> {
        std::mem::take(&mut *self.failures.borrow_mut())
    }

    #[must_use]
    pub fn slot(&self, div_id: &str) -> Option<Rc<InMemorySlot>> {
        self.slots
            .borrow()
            .iter()
            .find(|slot| slot.div_id == div_id)
            .cloned()
    }

    #[must_use]
    pub fn page_targeting(&self) -> TargetingMap {
        self.pubads.targeting_map()
    }

    fn create_slot(&self, div_id: &str) -> Option<SlotHandle> {
        if self.refuse_slots.get() {
            return None;
        }
        let slot = Rc::new(InMemorySlot {
            div_id: div_id.to_string(),
            targeting: RefCell::new(TargetingMap::new()),
            services: RefCell::new(Vec::new()),
            log: Rc::clone(&self.log),
        });
        self.slots.borrow_mut().push(Rc::clone(&slot));
        Some(slot as SlotHandle)
    }
}

impl AdTag for InMemoryAdTag {
    fn push_command(&self, job: Job) {
        self.queue.borrow_mut().push_back(job);
        if self.loaded.get() {
            self.drain();
        }
    }

    fn define_slot(&self, ad_unit_path: &str, sizes: &[AdSize], div_id: &str) -> Option<SlotHandle> {
        self.log.borrow_mut().push(TagCall::DefineSlot {
            ad_unit_path: ad_unit_path.to_string(),
            sizes: sizes.to_vec(),
            div_id: div_id.to_string(),
        });
        self.create_slot(div_id)
    }

    fn define_out_of_page_slot(&self, ad_unit_path: &str, div_id: &str) -> Option<SlotHandle> {
        self.log.borrow_mut().push(TagCall::DefineOutOfPageSlot {
            ad_unit_path: ad_unit_path.to_string(),
            div_id: div_id.to_string(),
        });
        self.create_slot(div_id)
    }

    fn display(&self, div_id: &str) {
        self.log.borrow_mut().push(TagCall::Display {
            div_id: div_id.to_string(),
        });
    }

    fn pubads(&self) -> Rc<dyn PubAdsService> {
        Rc::clone(&self.pubads) as Rc<dyn PubAdsService>
    }

    fn load(&self) {
        self.log.borrow_mut().push(TagCall::Load);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_call(tag: &Rc<InMemoryAdTag>, div_id: &'static str) {
        let inner = Rc::clone(tag);
        tag.push_command(Box::new(move || {
            inner.display(div_id);
            Ok(())
        }));
    }

    #[test]
    fn jobs_wait_until_drained() {
        let tag = Rc::new(InMemoryAdTag::new());
        push_call(&tag, "a");
        push_call(&tag, "b");

        assert_eq!(tag.pending(), 2);
        assert!(tag.calls().is_empty(), "should not run jobs before drain");

        assert_eq!(tag.drain(), 2);
        assert_eq!(
            tag.calls(),
            vec![
                TagCall::Display { div_id: "a".into() },
                TagCall::Display { div_id: "b".into() },
            ]
        );
    }

    #[test]
    fn jobs_pushed_during_drain_run_in_the_same_drain() {
        let tag = Rc::new(InMemoryAdTag::new());
        let inner = Rc::clone(&tag);
        tag.push_command(Box::new(move || {
            push_call(&inner, "nested");
            inner.display("outer");
            Ok(())
        }));

        assert_eq!(tag.drain(), 2);
        assert_eq!(
            tag.calls(),
            vec![
                TagCall::Display {
                    div_id: "outer".into()
                },
                TagCall::Display {
                    div_id: "nested".into()
                },
            ],
            "should run the nested job after the current one"
        );
    }

    #[test]
    fn loaded_tag_runs_jobs_immediately() {
        let tag = Rc::new(InMemoryAdTag::new());
        push_call(&tag, "early");
        tag.set_loaded(true);
        assert_eq!(tag.pending(), 0, "should drain on load");

        push_call(&tag, "late");
        assert_eq!(tag.pending(), 0);
        assert_eq!(tag.calls().len(), 2);
    }

    #[test]
    fn failed_jobs_are_collected() {
        let tag = InMemoryAdTag::new();
        tag.push_command(Box::new(|| {
            Err(Report::new(BebopError::ExternalFailure {
                message: "boom".into(),
            }))
        }));
        tag.drain();

        let failures = tag.take_failures();
        assert_eq!(failures.len(), 1);
        assert!(tag.take_failures().is_empty());
    }

    #[test]
    fn slots_record_targeting_and_services() {
        let tag = InMemoryAdTag::new();
        let handle = tag
            .define_slot("/1/x", &[AdSize::new(300, 250)], "d1")
            .expect("should create a slot");
        handle.add_service(tag.pubads());
        handle.set_targeting("pos", &TargetingValue::from("top"));

        let slot = tag.slot("d1").expect("should find the slot");
        assert_eq!(slot.services(), vec!["publisher_ads".to_string()]);
        assert_eq!(slot.targeting_map().len(), 1);

        handle.clear_targeting();
        assert!(slot.targeting_map().is_empty());
    }

    #[test]
    fn refusing_tag_returns_no_slot() {
        let tag = InMemoryAdTag::new();
        tag.refuse_slots(true);
        assert!(tag.define_out_of_page_slot("/1/x", "d1").is_none());
        assert!(tag.slot("d1").is_none());
    }
}

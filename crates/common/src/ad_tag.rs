//! The external ad tag as seen by the library.
//!
//! The ad tag runtime (a Google Publisher Tag style `googletag` object) is
//! owned by the host page and may still be loading when the library starts
//! talking to it. Everything the library asks of it is therefore wrapped in
//! a [`Job`] and pushed onto the tag's command queue; the tag drains that
//! queue at its own pace.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::BebopResult;
use crate::targeting::{TargetingMap, TargetingValue};

/// Work deferred onto the ad tag's command queue.
///
/// A job that fails reports the failure to the queue owner; it is never
/// retried.
pub type Job = Box<dyn FnOnce() -> BebopResult<()>>;

/// Shared handle to a slot created and owned by the ad tag.
pub type SlotHandle = Rc<dyn GptSlot>;

/// Width and height of a creative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdSize {
    pub width: u32,
    pub height: u32,
}

impl AdSize {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for AdSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Options forwarded to `pubads().refresh()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshOptions {
    /// Whether a new correlator value is generated for the refreshed ads.
    #[serde(default)]
    pub change_correlator: bool,
}

/// The page-level ad service (`googletag.pubads()`).
pub trait PubAdsService {
    /// Service name, used in diagnostics.
    fn name(&self) -> &str {
        "publisher_ads"
    }

    /// Refreshes `slots`, or every slot when `None`.
    fn refresh(&self, slots: Option<&[SlotHandle]>, options: Option<&RefreshOptions>);

    /// Sets page-level targeting.
    fn set_targeting(&self, key: &str, value: &TargetingValue);
}

/// A slot object created by the ad tag.
pub trait GptSlot {
    /// Id of the element the slot renders into.
    fn slot_element_id(&self) -> String;

    fn add_service(&self, service: Rc<dyn PubAdsService>);

    fn set_targeting(&self, key: &str, value: &TargetingValue);

    /// Removes every slot-level targeting entry. There is no partial clear.
    fn clear_targeting(&self);

    /// Targeting as currently applied by the ad tag.
    fn targeting_map(&self) -> TargetingMap;
}

/// The ad tag runtime (`googletag`).
pub trait AdTag {
    /// Appends a job to the command queue (`googletag.cmd.push`).
    fn push_command(&self, job: Job);

    /// `googletag.defineSlot`. Returns `None` when the slot cannot be created.
    fn define_slot(&self, ad_unit_path: &str, sizes: &[AdSize], div_id: &str)
        -> Option<SlotHandle>;

    /// `googletag.defineOutOfPageSlot`.
    fn define_out_of_page_slot(&self, ad_unit_path: &str, div_id: &str) -> Option<SlotHandle>;

    fn display(&self, div_id: &str);

    fn pubads(&self) -> Rc<dyn PubAdsService>;

    /// Asks the host to load the tag library. Hosts that load it themselves
    /// can keep the default.
    fn load(&self) {}
}

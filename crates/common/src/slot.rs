//! Per-slot lifecycle.
//!
//! A slot starts out `Configured`. Defining it queues one define job and
//! moves it to `Pending`; when the ad tag runs that job and hands back a
//! handle the slot becomes `Defined` for the rest of the page's life. If the
//! tag creates no slot the job fails once and the slot goes back to
//! `Configured`, so a later `define_slot` queues a fresh attempt.
//! Whether a slot is active is never stored: it is worked out from the
//! current viewport width on every call.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ad_tag::{AdSize, SlotHandle};
use crate::error::BebopResult;
use crate::gpt::GptHandler;
use crate::logging::advisory;
use crate::raw::RawValue;
use crate::settings::{SlotDefinition, SlotSettings, SlotSizes, ViewportSettings};
use crate::targeting::{TargetingMap, TargetingValue};
use crate::viewport::Category;

enum SlotState {
    Configured,
    /// A define job is queued but has not run yet.
    Pending,
    Defined(SlotHandle),
}

struct SlotInner {
    handler: GptHandler,
    definition: SlotDefinition,
    state: RefCell<SlotState>,
    targeting: RefCell<TargetingMap>,
}

/// An ad slot on the page. Clones share the same slot.
#[derive(Clone)]
pub struct Slot {
    inner: Rc<SlotInner>,
}

impl Slot {
    /// Creates a slot and defines it straight away when it is active and not
    /// deferred until display.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::error::BebopError::InvalidState`] when the slot or
    /// page settings carry errors, and with whatever resolving the viewport
    /// category fails with.
    pub fn new(handler: GptHandler, settings: &SlotSettings) -> BebopResult<Self> {
        handler.settings().check()?;
        let definition = settings.validate()?;

        let slot = Self {
            inner: Rc::new(SlotInner {
                targeting: RefCell::new(definition.targeting.clone()),
                handler,
                definition,
                state: RefCell::new(SlotState::Configured),
            }),
        };

        let active = slot.is_active()?;
        if active && !slot.define_on_display() {
            slot.define_slot()?;
        }
        if !active {
            let category = slot.current_category()?;
            advisory!(
                "no sizes configured for category {} of slot {}",
                category.map_or_else(|| "none".to_string(), |c| c.to_string()),
                slot.gpt_div_id()
            );
        }
        Ok(slot)
    }

    fn viewport(&self) -> BebopResult<&ViewportSettings> {
        self.inner.handler.settings().viewport()
    }

    fn current_category(&self) -> BebopResult<Option<Category>> {
        self.viewport()?.view_category()
    }

    #[must_use]
    pub fn ad_unit_path(&self) -> &str {
        &self.inner.definition.ad_unit_path
    }

    #[must_use]
    pub fn gpt_div_id(&self) -> &str {
        &self.inner.definition.gpt_div_id
    }

    #[must_use]
    pub fn is_interstitial(&self) -> bool {
        self.inner.definition.interstitial
    }

    #[must_use]
    pub fn is_lazyload(&self) -> bool {
        self.inner.definition.lazyload
    }

    #[must_use]
    pub fn define_on_display(&self) -> bool {
        self.inner.definition.define_on_display
    }

    /// Every category the slot is configured for.
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        self.inner.definition.sizes.categories()
    }

    /// True when the slot is configured for the current viewport category.
    ///
    /// # Errors
    ///
    /// Fails when the viewport category cannot be resolved.
    pub fn is_active(&self) -> BebopResult<bool> {
        let Some(category) = self.current_category()? else {
            return Ok(false);
        };
        let sizes = &self.inner.definition.sizes;
        Ok(match sizes {
            SlotSizes::Interstitial(categories) => categories.contains(&category),
            SlotSizes::Standard(_) => !sizes.sizes_for(category).is_empty(),
        })
    }

    /// Sizes for the current viewport category. Always empty for
    /// interstitial slots.
    ///
    /// # Errors
    ///
    /// Fails when the viewport category cannot be resolved.
    pub fn sizes(&self) -> BebopResult<Vec<AdSize>> {
        if self.is_interstitial() {
            return Ok(Vec::new());
        }
        Ok(self
            .current_category()?
            .map(|category| self.inner.definition.sizes.sizes_for(category).to_vec())
            .unwrap_or_default())
    }

    /// True once the ad tag has created the slot.
    #[must_use]
    pub fn is_defined(&self) -> bool {
        matches!(*self.inner.state.borrow(), SlotState::Defined(_))
    }

    /// The handle created by the ad tag, once defined.
    #[must_use]
    pub fn handle(&self) -> Option<SlotHandle> {
        match &*self.inner.state.borrow() {
            SlotState::Defined(handle) => Some(Rc::clone(handle)),
            SlotState::Configured | SlotState::Pending => None,
        }
    }

    /// Queues creation of the slot on the ad tag. Does nothing, apart from
    /// a warning, when the slot is already defined or being defined.
    ///
    /// # Errors
    ///
    /// Fails when the sizes for the current category cannot be resolved.
    pub fn define_slot(&self) -> BebopResult<()> {
        if !matches!(*self.inner.state.borrow(), SlotState::Configured) {
            advisory!("slot {} is already defined", self.gpt_div_id());
            return Ok(());
        }

        let sizes = self.sizes()?;
        *self.inner.state.borrow_mut() = SlotState::Pending;
        let registered = Rc::clone(&self.inner);
        let register = Box::new(move |handle: BebopResult<SlotHandle>| {
            Slot { inner: registered }.register(handle)
        });

        let definition = &self.inner.definition;
        if definition.interstitial {
            log::debug!("defining out-of-page slot {}", definition.gpt_div_id);
            self.inner.handler.define_out_of_page_slot(
                definition.ad_unit_path.clone(),
                definition.gpt_div_id.clone(),
                register,
            );
        } else {
            log::debug!("defining slot {}", definition.gpt_div_id);
            self.inner.handler.define_slot(
                definition.ad_unit_path.clone(),
                sizes,
                definition.gpt_div_id.clone(),
                register,
            );
        }
        Ok(())
    }

    fn register(&self, handle: BebopResult<SlotHandle>) -> BebopResult<()> {
        let handle = match handle {
            Ok(handle) => handle,
            Err(report) => {
                *self.inner.state.borrow_mut() = SlotState::Configured;
                return Err(report);
            }
        };
        *self.inner.state.borrow_mut() = SlotState::Defined(Rc::clone(&handle));
        let targeting = self.inner.targeting.borrow().clone();
        for (key, value) in targeting {
            self.inner
                .handler
                .set_slot_targeting(Rc::clone(&handle), key, value);
        }
        Ok(())
    }

    /// Sets slot-level targeting. The value is validated before anything
    /// changes; a defined slot also gets the value on the ad tag.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::error::BebopError::TypeMismatch`] when `value` is
    /// not a string, a number or an array of strings and numbers.
    pub fn set_targeting(&self, key: &str, value: &RawValue) -> BebopResult<()> {
        let value = TargetingValue::try_from_raw(value)?;
        self.inner
            .targeting
            .borrow_mut()
            .insert(key.to_string(), value.clone());
        if let Some(handle) = self.handle() {
            self.inner
                .handler
                .set_slot_targeting(handle, key.to_string(), value);
        }
        Ok(())
    }

    /// Removes `key`, or all targeting when `key` is `None`.
    ///
    /// The ad tag only clears all slot targeting at once, so a defined slot
    /// gets one clear job followed by one set job per remaining entry.
    pub fn clear_targeting(&self, key: Option<&str>) {
        match key {
            None => self.inner.targeting.borrow_mut().clear(),
            Some(key) => {
                if self.inner.targeting.borrow_mut().shift_remove(key).is_none() {
                    advisory!(
                        "slot {} does not have a targeting key {}",
                        self.gpt_div_id(),
                        key
                    );
                    return;
                }
            }
        }

        if let Some(handle) = self.handle() {
            self.inner.handler.clear_slot_targeting(Rc::clone(&handle));
            let remaining = self.inner.targeting.borrow().clone();
            for (key, value) in remaining {
                self.inner
                    .handler
                    .set_slot_targeting(Rc::clone(&handle), key, value);
            }
        }
    }

    /// Targeting as applied by the ad tag once defined, and as held locally
    /// before that.
    #[must_use]
    pub fn targeting(&self) -> TargetingMap {
        match self.handle() {
            Some(handle) => handle.targeting_map(),
            None => self.inner.targeting.borrow().clone(),
        }
    }
}

impl std::fmt::Debug for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot")
            .field("gpt_div_id", &self.gpt_div_id())
            .field("defined", &self.is_defined())
            .finish_non_exhaustive()
    }
}
